//! In-memory desktop double shared by the integration tests.
//!
//! Windows are held in enumeration order; every `set_z_order` call is
//! recorded so tests can assert on the exact placement chain a pass emits.
#![allow(dead_code)]

use std::collections::HashMap;

use restack::drivers::{Bounds, HitTest, WindowQuery, ZOrder, ZPlacement};
use restack::stack::WindowId;

pub fn id(raw: u64) -> WindowId {
    WindowId::from_raw(raw)
}

#[derive(Debug, Clone)]
pub struct FakeWindow {
    pub title: String,
    pub live: bool,
    pub visible: bool,
    pub minimized: bool,
    pub pid: u32,
    pub owned: bool,
    pub style: u32,
    pub rect: Bounds,
}

impl FakeWindow {
    fn new(title: &str, pid: u32) -> Self {
        Self {
            title: title.to_string(),
            live: true,
            visible: true,
            minimized: false,
            pid,
            owned: false,
            style: 0,
            rect: Bounds {
                left: 0,
                top: 0,
                right: 800,
                bottom: 600,
            },
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeDesktop {
    order: Vec<WindowId>,
    windows: HashMap<WindowId, FakeWindow>,
    pub focused: Option<WindowId>,
    pub placements: Vec<(WindowId, ZPlacement, bool)>,
}

impl FakeDesktop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, raw: u64, title: &str, pid: u32) -> WindowId {
        let id = id(raw);
        self.order.push(id);
        self.windows.insert(id, FakeWindow::new(title, pid));
        id
    }

    /// Adds a window carrying an explicit owner, the shape a native dialog
    /// takes.
    pub fn add_owned(&mut self, raw: u64, title: &str, pid: u32) -> WindowId {
        let id = self.add(raw, title, pid);
        self.window_mut(raw).owned = true;
        id
    }

    pub fn window_mut(&mut self, raw: u64) -> &mut FakeWindow {
        self.windows
            .get_mut(&id(raw))
            .unwrap_or_else(|| panic!("no fake window {raw}"))
    }

    /// Destroys the window, as if its process closed it.
    pub fn close(&mut self, raw: u64) {
        self.window_mut(raw).live = false;
        self.window_mut(raw).visible = false;
    }

    pub fn placed_ids(&self) -> Vec<u64> {
        self.placements
            .iter()
            .map(|(placed, _, _)| placed.as_raw())
            .collect()
    }
}

impl WindowQuery for FakeDesktop {
    fn list_top_level(&mut self, filter_tool_windows: bool) -> Vec<(WindowId, String)> {
        self.order
            .iter()
            .filter_map(|id| self.windows.get(id).map(|win| (*id, win)))
            .filter(|(_, win)| win.live && win.visible)
            .filter(|(_, win)| {
                !filter_tool_windows
                    || (!win.title.is_empty()
                        && !win.owned
                        && win.style & restack::constants::STYLE_TOOL_WINDOW == 0)
            })
            .map(|(id, win)| (id, win.title.clone()))
            .collect()
    }

    fn is_live(&mut self, id: WindowId) -> bool {
        self.windows.get(&id).is_some_and(|win| win.live)
    }

    fn is_visible(&mut self, id: WindowId) -> bool {
        self.windows.get(&id).is_some_and(|win| win.visible)
    }

    fn is_minimized(&mut self, id: WindowId) -> bool {
        self.windows.get(&id).is_some_and(|win| win.minimized)
    }

    fn process_id(&mut self, id: WindowId) -> Option<u32> {
        self.windows.get(&id).map(|win| win.pid)
    }

    fn is_owned(&mut self, id: WindowId) -> bool {
        self.windows.get(&id).is_some_and(|win| win.owned)
    }

    fn extended_style(&mut self, id: WindowId) -> u32 {
        self.windows.get(&id).map(|win| win.style).unwrap_or(0)
    }

    fn focused_window(&mut self) -> Option<WindowId> {
        self.focused
    }
}

impl ZOrder for FakeDesktop {
    fn set_z_order(&mut self, id: WindowId, placement: ZPlacement, force_show: bool) {
        self.placements.push((id, placement, force_show));
    }
}

impl HitTest for FakeDesktop {
    fn window_at_point(&mut self, x: i32, y: i32) -> Option<WindowId> {
        self.order.iter().copied().find(|id| {
            self.windows.get(id).is_some_and(|win| {
                win.live
                    && win.visible
                    && x >= win.rect.left
                    && x < win.rect.right
                    && y >= win.rect.top
                    && y < win.rect.bottom
            })
        })
    }

    fn root_ancestor_of(&mut self, id: WindowId) -> WindowId {
        id
    }

    fn bounding_rect(&mut self, id: WindowId) -> Option<Bounds> {
        self.windows.get(&id).map(|win| win.rect)
    }
}
