//! Background input listener.
//!
//! One long-lived thread polls the platform input backend, reduces raw
//! pointer/keyboard traffic to the two signals the foreground cares about,
//! and sends them over a channel. The thread holds no stack state; all
//! facade-dependent filtering happens on the foreground side (see
//! `reconciler`).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;

use crate::drivers::{InputBackend, KeyPress, PointerButton, RawInputEvent};

/// How long the listener thread blocks in the backend before rechecking the
/// stop flag. Bounds shutdown latency.
const LISTEN_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("input watcher already running")]
    AlreadyRunning,
}

/// Signal crossing from the listener thread to the foreground context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSignal {
    /// A pointer button was released at screen coordinates `(x, y)`.
    PointerReleased { x: i32, y: i32 },
    /// A confirmation-style key (space, enter, digit 1-9) was released.
    KeySignificant,
}

/// Keys that typically commit a dialog or IME candidate selection.
pub fn significant_key(key: KeyPress) -> bool {
    match key {
        KeyPress::Space | KeyPress::Enter => true,
        KeyPress::Char(ch) => ch.is_ascii_digit() && ch != '0',
        KeyPress::Other => false,
    }
}

/// Reduces a raw input event to the signal it carries, if any. Pointer
/// presses and insignificant keys are dropped here so the channel only ever
/// carries actionable traffic.
pub fn filter_event(event: RawInputEvent) -> Option<InputSignal> {
    match event {
        RawInputEvent::Pointer {
            x,
            y,
            button: PointerButton::Left | PointerButton::Right,
            pressed: false,
        } => Some(InputSignal::PointerReleased { x, y }),
        RawInputEvent::Pointer { .. } => None,
        RawInputEvent::KeyReleased(key) if significant_key(key) => {
            Some(InputSignal::KeySignificant)
        }
        RawInputEvent::KeyReleased(_) => None,
    }
}

/// Owns the listener thread. `stop` is idempotent and joins the thread, so
/// once it returns the backend has fully unregistered.
#[derive(Debug, Default)]
pub struct InputWatcher {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl InputWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Spawns the listener thread over the given backend, delivering
    /// filtered signals into `sink`.
    pub fn start<B: InputBackend + 'static>(
        &mut self,
        backend: B,
        sink: Sender<InputSignal>,
    ) -> Result<(), WatcherError> {
        if self.handle.is_some() {
            return Err(WatcherError::AlreadyRunning);
        }
        self.stop.store(false, Ordering::Release);
        let stop = Arc::clone(&self.stop);
        self.handle = Some(thread::spawn(move || listen_loop(backend, sink, stop)));
        tracing::debug!("input watcher started");
        Ok(())
    }

    /// Signals the listener thread to exit and blocks until it has. Safe to
    /// call repeatedly or when never started.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            tracing::debug!("input watcher stopped");
        }
    }
}

impl Drop for InputWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn listen_loop<B: InputBackend>(mut backend: B, sink: Sender<InputSignal>, stop: Arc<AtomicBool>) {
    while !stop.load(Ordering::Acquire) {
        match backend.poll(LISTEN_POLL) {
            Ok(Some(event)) => {
                if let Some(signal) = filter_event(event) {
                    // Receiver gone means the foreground is shutting down.
                    if sink.send(signal).is_err() {
                        break;
                    }
                }
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %err, "input backend failed; listener exiting");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::mpsc;

    #[test]
    fn significant_keys_are_commit_gestures() {
        assert!(significant_key(KeyPress::Space));
        assert!(significant_key(KeyPress::Enter));
        for ch in '1'..='9' {
            assert!(significant_key(KeyPress::Char(ch)));
        }
        assert!(!significant_key(KeyPress::Char('0')));
        assert!(!significant_key(KeyPress::Char('a')));
        assert!(!significant_key(KeyPress::Other));
    }

    #[test]
    fn presses_and_plain_keys_are_dropped() {
        assert_eq!(
            filter_event(RawInputEvent::Pointer {
                x: 5,
                y: 6,
                button: PointerButton::Left,
                pressed: true,
            }),
            None
        );
        assert_eq!(
            filter_event(RawInputEvent::Pointer {
                x: 5,
                y: 6,
                button: PointerButton::Other,
                pressed: false,
            }),
            None
        );
        assert_eq!(filter_event(RawInputEvent::KeyReleased(KeyPress::Char('x'))), None);
        assert_eq!(
            filter_event(RawInputEvent::Pointer {
                x: 5,
                y: 6,
                button: PointerButton::Right,
                pressed: false,
            }),
            Some(InputSignal::PointerReleased { x: 5, y: 6 })
        );
        assert_eq!(
            filter_event(RawInputEvent::KeyReleased(KeyPress::Enter)),
            Some(InputSignal::KeySignificant)
        );
    }

    struct Scripted {
        events: Vec<RawInputEvent>,
    }

    impl InputBackend for Scripted {
        fn poll(&mut self, _timeout: Duration) -> io::Result<Option<RawInputEvent>> {
            Ok(self.events.pop())
        }
    }

    #[test]
    fn watcher_delivers_signals_and_stop_is_idempotent() {
        let (sink, signals) = mpsc::channel();
        let mut watcher = InputWatcher::new();
        // stop before start is a no-op
        watcher.stop();
        assert!(!watcher.is_running());

        let backend = Scripted {
            events: vec![RawInputEvent::Pointer {
                x: 1,
                y: 2,
                button: PointerButton::Left,
                pressed: false,
            }],
        };
        watcher.start(backend, sink.clone()).unwrap();
        assert!(watcher.is_running());
        assert!(
            watcher
                .start(Scripted { events: Vec::new() }, sink)
                .is_err()
        );

        let signal = signals
            .recv_timeout(Duration::from_secs(2))
            .expect("signal should arrive");
        assert_eq!(signal, InputSignal::PointerReleased { x: 1, y: 2 });

        watcher.stop();
        assert!(!watcher.is_running());
        watcher.stop();
    }
}
