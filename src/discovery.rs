//! Discovery of auxiliary windows spawned by managed primaries.
//!
//! Each scan diffs the full unfiltered top-level listing against the set of
//! ids seen so far; anything new is tested against the managed primaries in
//! stack order and attached to the first one that claims it.

use std::collections::HashSet;

use crate::constants::{STYLE_APP_WINDOW, STYLE_TOOL_WINDOW};
use crate::drivers::WindowQuery;
use crate::stack::{StackEngine, WindowId};

/// Tracks which top-level windows have been seen before. Process-lifetime
/// state, reset only at startup.
#[derive(Debug, Default)]
pub struct WindowScanner {
    known: HashSet<WindowId>,
}

impl WindowScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// One discovery tick. `exclude` is the manager's own window, if it has
    /// one; it is never attached. Returns how many auxiliaries were attached.
    pub fn scan<Q: WindowQuery>(
        &mut self,
        desktop: &mut Q,
        stack: &mut StackEngine,
        exclude: Option<WindowId>,
    ) -> usize {
        let live = desktop.list_top_level(false);
        let live_ids: HashSet<WindowId> = live.iter().map(|(id, _)| *id).collect();
        let fresh: Vec<(WindowId, String)> = live
            .into_iter()
            .filter(|(id, _)| !self.known.contains(id))
            .collect();
        // Track churn unconditionally so a window that closes and reopens
        // with the same handle counts as new again.
        self.known = live_ids;

        if fresh.is_empty() || !stack.has_primaries() {
            return 0;
        }

        let primaries = stack.primary_ids();
        let mut attached = 0;
        for (id, title) in fresh {
            if stack.contains(id) || Some(id) == exclude {
                continue;
            }
            // First match wins: never attach one child to two primaries.
            for &parent in &primaries {
                if is_auxiliary_of(desktop, parent, id) {
                    if stack.insert_auxiliary(id, title, parent) {
                        attached += 1;
                    }
                    break;
                }
            }
        }
        attached
    }
}

/// Ownership test: `child` counts as an auxiliary of `parent` when the OS
/// reports an explicit owner and both share a process, or when a
/// same-process window carries the floating tool-window style. A window
/// pinned to the taskbar (`WS_EX_APPWINDOW`) is an independent sibling even
/// when same-process, so it is never claimed.
pub fn is_auxiliary_of<Q: WindowQuery>(desktop: &mut Q, parent: WindowId, child: WindowId) -> bool {
    if parent == child {
        return false;
    }
    let (Some(parent_pid), Some(child_pid)) =
        (desktop.process_id(parent), desktop.process_id(child))
    else {
        return false;
    };
    if parent_pid != child_pid {
        return false;
    }
    let style = desktop.extended_style(child);
    if style & STYLE_APP_WINDOW != 0 {
        return false;
    }
    desktop.is_owned(child) || style & STYLE_TOOL_WINDOW != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{Bounds, HitTest, ZOrder, ZPlacement};

    #[derive(Debug, Clone)]
    struct Win {
        id: WindowId,
        title: String,
        pid: u32,
        owned: bool,
        style: u32,
    }

    #[derive(Debug, Default)]
    struct Fake {
        windows: Vec<Win>,
    }

    impl Fake {
        fn push(&mut self, raw: u64, title: &str, pid: u32, owned: bool, style: u32) {
            self.windows.push(Win {
                id: WindowId::from_raw(raw),
                title: title.to_string(),
                pid,
                owned,
                style,
            });
        }

        fn get(&self, id: WindowId) -> Option<&Win> {
            self.windows.iter().find(|win| win.id == id)
        }
    }

    impl WindowQuery for Fake {
        fn list_top_level(&mut self, _filter_tool_windows: bool) -> Vec<(WindowId, String)> {
            self.windows
                .iter()
                .map(|win| (win.id, win.title.clone()))
                .collect()
        }

        fn is_live(&mut self, id: WindowId) -> bool {
            self.get(id).is_some()
        }

        fn is_visible(&mut self, id: WindowId) -> bool {
            self.get(id).is_some()
        }

        fn is_minimized(&mut self, _id: WindowId) -> bool {
            false
        }

        fn process_id(&mut self, id: WindowId) -> Option<u32> {
            self.get(id).map(|win| win.pid)
        }

        fn is_owned(&mut self, id: WindowId) -> bool {
            self.get(id).is_some_and(|win| win.owned)
        }

        fn extended_style(&mut self, id: WindowId) -> u32 {
            self.get(id).map(|win| win.style).unwrap_or(0)
        }

        fn focused_window(&mut self) -> Option<WindowId> {
            None
        }
    }

    impl ZOrder for Fake {
        fn set_z_order(&mut self, _id: WindowId, _placement: ZPlacement, _force_show: bool) {}
    }

    impl HitTest for Fake {
        fn window_at_point(&mut self, _x: i32, _y: i32) -> Option<WindowId> {
            None
        }

        fn root_ancestor_of(&mut self, id: WindowId) -> WindowId {
            id
        }

        fn bounding_rect(&mut self, _id: WindowId) -> Option<Bounds> {
            None
        }
    }

    fn id(raw: u64) -> WindowId {
        WindowId::from_raw(raw)
    }

    #[test]
    fn attaches_new_owned_window_to_its_primary() {
        let mut fake = Fake::default();
        fake.push(1, "editor", 100, false, 0);
        let mut stack = StackEngine::new();
        stack.add_primary(id(1), "editor");

        let mut scanner = WindowScanner::new();
        // first scan records the baseline
        assert_eq!(scanner.scan(&mut fake, &mut stack, None), 0);

        fake.push(10, "find dialog", 100, true, 0);
        assert_eq!(scanner.scan(&mut fake, &mut stack, None), 1);
        assert!(stack.contains(id(10)));
        assert_eq!(stack.display_rank(id(10)), Some(1));

        // already attached: later scans leave it alone
        assert_eq!(scanner.scan(&mut fake, &mut stack, None), 0);
    }

    #[test]
    fn first_primary_in_stack_order_wins() {
        let mut fake = Fake::default();
        fake.push(1, "p1", 100, false, 0);
        fake.push(2, "p2", 100, false, 0);
        let mut stack = StackEngine::new();
        stack.add_primary(id(1), "p1");
        stack.add_primary(id(2), "p2");

        let mut scanner = WindowScanner::new();
        scanner.scan(&mut fake, &mut stack, None);

        // same process, tool style: satisfies the test for both primaries
        fake.push(30, "palette", 100, false, STYLE_TOOL_WINDOW);
        assert_eq!(scanner.scan(&mut fake, &mut stack, None), 1);

        let order: Vec<u64> = stack.entries().iter().map(|e| e.id.as_raw()).collect();
        assert_eq!(order, vec![30, 1, 2]);
    }

    #[test]
    fn churn_is_tracked_even_without_primaries() {
        let mut fake = Fake::default();
        fake.push(5, "loner", 100, true, 0);
        let mut stack = StackEngine::new();
        let mut scanner = WindowScanner::new();
        assert_eq!(scanner.scan(&mut fake, &mut stack, None), 0);

        // promoting later must not resurrect the already-seen window
        stack.add_primary(id(5), "loner");
        fake.push(6, "late dialog", 100, true, 0);
        assert_eq!(scanner.scan(&mut fake, &mut stack, None), 1);
        assert!(stack.contains(id(6)));
    }

    #[test]
    fn excluded_window_is_never_attached() {
        let mut fake = Fake::default();
        fake.push(1, "p", 100, false, 0);
        let mut stack = StackEngine::new();
        stack.add_primary(id(1), "p");

        let mut scanner = WindowScanner::new();
        scanner.scan(&mut fake, &mut stack, Some(id(7)));

        // same process and tool-styled, so it would otherwise qualify
        fake.push(7, "window list", 100, false, STYLE_TOOL_WINDOW);
        assert_eq!(scanner.scan(&mut fake, &mut stack, Some(id(7))), 0);
        assert!(!stack.contains(id(7)));
    }

    #[test]
    fn ownership_test_rejects_siblings() {
        let mut fake = Fake::default();
        fake.push(1, "p", 100, false, 0);
        fake.push(2, "other process", 200, true, 0);
        fake.push(3, "taskbar sibling", 100, false, STYLE_TOOL_WINDOW | STYLE_APP_WINDOW);
        fake.push(4, "plain same-process", 100, false, 0);
        fake.push(5, "tool palette", 100, false, STYLE_TOOL_WINDOW);

        assert!(!is_auxiliary_of(&mut fake, id(1), id(1)));
        assert!(!is_auxiliary_of(&mut fake, id(1), id(2)));
        assert!(!is_auxiliary_of(&mut fake, id(1), id(3)));
        assert!(!is_auxiliary_of(&mut fake, id(1), id(4)));
        assert!(is_auxiliary_of(&mut fake, id(1), id(5)));
    }
}
