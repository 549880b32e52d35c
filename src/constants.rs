//! Shared crate-wide constants.

use std::time::Duration;

/// Height (in physical pixels) of the title-bar band checked by the
/// dismiss-click filter. Pointer releases inside the band are assumed to be
/// aimed at window chrome (close/minimize buttons on custom-drawn title
/// bars) and never trigger a restack pass.
pub const DISMISS_BAND_HEIGHT: i32 = 40;

/// Width (in physical pixels) of the right-edge band checked by the
/// dismiss-click filter. Close buttons commonly occupy the rightmost
/// 45-50 px; the band is slightly wider to be forgiving about DPI scaling.
pub const DISMISS_BAND_WIDTH: i32 = 60;

/// Delay between a qualifying input signal and the restack pass it
/// schedules. Long enough for transient OS windows (IME candidate popups,
/// closing dialogs) to disappear before the z-order scan runs, short enough
/// that the reorder still reads as immediate.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

/// How long the foreground loop blocks waiting for input signals before
/// checking timers. Bounds the latency of a due debounce deadline.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Interval of the foreground maintenance tick (liveness pruning and
/// promotion of newly matching windows).
pub const DEFAULT_MAINTENANCE_INTERVAL: Duration = Duration::from_secs(1);

/// `WS_EX_TOOLWINDOW`: extended style bit marking floating tool palettes.
/// Kept here (rather than only in the Win32 backend) because the ownership
/// test in the portable core inspects the raw style bitmask.
pub const STYLE_TOOL_WINDOW: u32 = 0x0000_0080;

/// `WS_EX_APPWINDOW`: forces a taskbar entry. A same-process window carrying
/// this bit is an independent sibling, never an auxiliary.
pub const STYLE_APP_WINDOW: u32 = 0x0004_0000;

/// Bounded size of the display-title cache.
pub const TITLE_CACHE_CAPACITY: usize = 256;
