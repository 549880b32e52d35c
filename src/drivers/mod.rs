//! Seams between the portable core and the host desktop.
//!
//! The core never talks to the OS directly; it sees three narrow query/
//! mutation traits plus a raw input event source. Tests swap in in-memory
//! fakes, the Win32 backend provides the real thing.

#[cfg(windows)]
pub mod win32;

use std::io;
use std::time::Duration;

use crate::stack::WindowId;

/// Window bounding box in screen coordinates (left/top inclusive,
/// right/bottom exclusive, matching the platform convention).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }
}

/// Read-only questions about top-level windows.
pub trait WindowQuery {
    /// All live top-level windows as `(id, title)` in enumeration order.
    /// With `filter_tool_windows` the listing is what a user-facing window
    /// list would show (titled, visible, unowned, no tool windows); without
    /// it the listing also includes the owned/tool/untitled windows that
    /// auxiliary discovery needs to see.
    fn list_top_level(&mut self, filter_tool_windows: bool) -> Vec<(WindowId, String)>;
    fn is_live(&mut self, id: WindowId) -> bool;
    fn is_visible(&mut self, id: WindowId) -> bool;
    fn is_minimized(&mut self, id: WindowId) -> bool;
    fn process_id(&mut self, id: WindowId) -> Option<u32>;
    /// Whether the window has an explicit owner window.
    fn is_owned(&mut self, id: WindowId) -> bool;
    /// Raw extended style bitmask (see `constants::STYLE_*`).
    fn extended_style(&mut self, id: WindowId) -> u32;
    /// The window currently holding OS input focus.
    fn focused_window(&mut self) -> Option<WindowId>;
}

/// Where to insert a window in the z-order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZPlacement {
    /// Above every other managed window, without pinning it always-on-top.
    Top,
    /// Directly below the given window.
    After(WindowId),
}

/// The single z-order mutation the core performs. Best effort: OS-level
/// failures are absorbed by the backend and corrected by the next pass.
pub trait ZOrder {
    fn set_z_order(&mut self, id: WindowId, placement: ZPlacement, force_show: bool);
}

/// Pointer-to-window resolution used by the trigger filter.
pub trait HitTest {
    fn window_at_point(&mut self, x: i32, y: i32) -> Option<WindowId>;
    fn root_ancestor_of(&mut self, id: WindowId) -> WindowId;
    fn bounding_rect(&mut self, id: WindowId) -> Option<Bounds>;
}

/// Convenience bound for code needing the full desktop surface.
pub trait Desktop: WindowQuery + ZOrder + HitTest {}

impl<T: WindowQuery + ZOrder + HitTest> Desktop for T {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Right,
    Other,
}

/// Key identity as delivered by the platform listener: symbolic for the
/// confirmation keys the filter cares about, literal for character keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPress {
    Space,
    Enter,
    Char(char),
    Other,
}

/// Raw event delivered by the background input listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawInputEvent {
    Pointer {
        x: i32,
        y: i32,
        button: PointerButton,
        pressed: bool,
    },
    KeyReleased(KeyPress),
}

/// Source of raw pointer/keyboard events. `poll` is only ever called from
/// the watcher's listener thread, so backends may keep thread-affine state
/// (message loops, hook registrations) behind it.
pub trait InputBackend: Send {
    fn poll(&mut self, timeout: Duration) -> io::Result<Option<RawInputEvent>>;
}

impl<T: WindowQuery + ?Sized> WindowQuery for &mut T {
    fn list_top_level(&mut self, filter_tool_windows: bool) -> Vec<(WindowId, String)> {
        (**self).list_top_level(filter_tool_windows)
    }

    fn is_live(&mut self, id: WindowId) -> bool {
        (**self).is_live(id)
    }

    fn is_visible(&mut self, id: WindowId) -> bool {
        (**self).is_visible(id)
    }

    fn is_minimized(&mut self, id: WindowId) -> bool {
        (**self).is_minimized(id)
    }

    fn process_id(&mut self, id: WindowId) -> Option<u32> {
        (**self).process_id(id)
    }

    fn is_owned(&mut self, id: WindowId) -> bool {
        (**self).is_owned(id)
    }

    fn extended_style(&mut self, id: WindowId) -> u32 {
        (**self).extended_style(id)
    }

    fn focused_window(&mut self) -> Option<WindowId> {
        (**self).focused_window()
    }
}

impl<T: ZOrder + ?Sized> ZOrder for &mut T {
    fn set_z_order(&mut self, id: WindowId, placement: ZPlacement, force_show: bool) {
        (**self).set_z_order(id, placement, force_show)
    }
}

impl<T: HitTest + ?Sized> HitTest for &mut T {
    fn window_at_point(&mut self, x: i32, y: i32) -> Option<WindowId> {
        (**self).window_at_point(x, y)
    }

    fn root_ancestor_of(&mut self, id: WindowId) -> WindowId {
        (**self).root_ancestor_of(id)
    }

    fn bounding_rect(&mut self, id: WindowId) -> Option<Bounds> {
        (**self).bounding_rect(id)
    }
}
