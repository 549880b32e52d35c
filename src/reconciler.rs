//! Foreground half of the reconciliation trigger.
//!
//! Raw signals from the listener thread are filtered against the current
//! stack and the desktop (which window was hit, who has focus), and
//! qualifying ones arm a single coalescing debounce deadline. The runner
//! polls the deadline and fires one discovery + restack pass per burst.

use std::time::{Duration, Instant};

use crate::constants::{DISMISS_BAND_HEIGHT, DISMISS_BAND_WIDTH};
use crate::drivers::{Bounds, Desktop};
use crate::stack::StackEngine;
use crate::watcher::InputSignal;

#[derive(Debug)]
pub struct Reconciler {
    debounce: Duration,
    deadline: Option<Instant>,
}

impl Reconciler {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            deadline: None,
        }
    }

    /// Whether a pass is scheduled but not yet due.
    pub fn pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Schedules a pass after the debounce window. Re-arming during a burst
    /// pushes the deadline out, so only the last signal of the burst decides
    /// when the single coalesced pass runs.
    pub fn request(&mut self) {
        self.request_at(Instant::now());
    }

    fn request_at(&mut self, now: Instant) {
        self.deadline = Some(now + self.debounce);
    }

    /// Consumes the deadline when due. The runner calls this every tick.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Applies the trigger policy to one signal.
    pub fn observe<D: Desktop>(&mut self, signal: InputSignal, stack: &StackEngine, desktop: &mut D) {
        self.observe_at(signal, stack, desktop, Instant::now());
    }

    pub fn observe_at<D: Desktop>(
        &mut self,
        signal: InputSignal,
        stack: &StackEngine,
        desktop: &mut D,
        now: Instant,
    ) {
        match signal {
            InputSignal::PointerReleased { x, y } => {
                let Some(hit) = desktop.window_at_point(x, y) else {
                    return;
                };
                let root = desktop.root_ancestor_of(hit);
                if let Some(rect) = desktop.bounding_rect(root)
                    && in_dismiss_band(rect, x, y)
                {
                    // Most likely a close-button click; reordering now would
                    // fight the window that is about to disappear.
                    tracing::debug!(id = root.as_raw(), "release in dismiss band; ignored");
                    return;
                }
                if stack.rank_of(root).is_some() {
                    tracing::debug!(id = root.as_raw(), "release on managed window; restack scheduled");
                    self.request_at(now);
                }
            }
            InputSignal::KeySignificant => {
                let Some(focused) = desktop.focused_window() else {
                    return;
                };
                // Rank 1 is already on top; anything below it being typed
                // into means the OS probably raised something out of order.
                match stack.display_rank(focused) {
                    Some(rank) if rank > 1 => {
                        tracing::debug!(
                            id = focused.as_raw(),
                            rank,
                            "commit key in lower-ranked window; restack scheduled"
                        );
                        self.request_at(now);
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Whether `(x, y)` falls in the top-right band of `rect` where close
/// buttons live on custom-drawn title bars.
pub fn in_dismiss_band(rect: Bounds, x: i32, y: i32) -> bool {
    let rel_x = x - rect.left;
    let rel_y = y - rect.top;
    if rel_y < 0 || rel_y > DISMISS_BAND_HEIGHT {
        return false;
    }
    rel_x > rect.width() - DISMISS_BAND_WIDTH && rel_x < rect.width()
}
