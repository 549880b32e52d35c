use std::io;

use clap::Parser;

use restack::constants::{DEFAULT_DEBOUNCE, DEFAULT_MAINTENANCE_INTERVAL, DEFAULT_POLL_INTERVAL};
use restack::logging;

#[derive(Parser, Debug)]
#[command(
    name = "restack",
    version,
    about = "Keeps matching desktop windows pinned in a fixed front-to-back order"
)]
struct Cli {
    /// Title substring selecting windows to manage; repeatable, order sets
    /// the initial stacking priority (first = topmost).
    #[arg(long = "match", value_name = "SUBSTR", required = true)]
    matches: Vec<String>,

    /// Delay between a qualifying input event and the restack pass.
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_DEBOUNCE.as_millis() as u64)]
    debounce_ms: u64,

    /// Signal-channel poll interval of the foreground loop.
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_POLL_INTERVAL.as_millis() as u64)]
    poll_ms: u64,

    /// Interval of the liveness-pruning / promotion tick.
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_MAINTENANCE_INTERVAL.as_millis() as u64)]
    maintenance_ms: u64,

    /// Log restack decisions at debug level.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    run(cli)
}

#[cfg(windows)]
fn run(cli: Cli) -> io::Result<()> {
    use std::sync::mpsc;
    use std::time::Duration;

    use restack::drivers::win32::{Win32Desktop, Win32InputBackend};
    use restack::runner::{ControlFlow, Runner};
    use restack::watcher::InputWatcher;

    let desktop = Win32Desktop::new();
    let mut runner = Runner::new(
        desktop,
        cli.matches,
        Duration::from_millis(cli.debounce_ms),
        Duration::from_millis(cli.poll_ms),
        Duration::from_millis(cli.maintenance_ms),
    );

    let (sink, signals) = mpsc::channel();
    let mut watcher = InputWatcher::new();
    watcher
        .start(Win32InputBackend::new(), sink)
        .map_err(io::Error::other)?;

    tracing::info!("restack running; press Ctrl+C to exit");
    runner.run(&signals, || ControlFlow::Continue);

    watcher.stop();
    Ok(())
}

#[cfg(not(windows))]
fn run(cli: Cli) -> io::Result<()> {
    let _ = (cli.debounce_ms, cli.poll_ms, cli.maintenance_ms, cli.matches);
    Err(io::Error::other(
        "restack needs a Windows desktop session; no backend exists for this platform",
    ))
}
