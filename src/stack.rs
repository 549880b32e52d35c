//! The ordered window stack and its projection onto the OS z-order.
//!
//! The stack is a flat sequence of entries that decomposes, left to right,
//! into contiguous groups: zero or more auxiliary windows immediately
//! followed by the primary window that owns them. Group membership is
//! positional — an auxiliary belongs to the nearest primary after it — so
//! reordering a group is a contiguous block rotation rather than a tree
//! edit.

use crate::drivers::{WindowQuery, ZOrder, ZPlacement};

/// Opaque platform window handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowId(u64);

impl WindowId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    /// Explicitly promoted by the user; carries a rank.
    Primary,
    /// Discovered as spawned by a primary (dialog, tool palette, IME popup);
    /// rides along with its owner's group and never holds its own rank.
    Auxiliary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

#[derive(Debug, Clone)]
pub struct WindowEntry {
    pub id: WindowId,
    pub title: String,
    pub kind: WindowKind,
    /// Dense 1..N position among primaries, in stack order. `None` for
    /// auxiliaries; their displayed rank is derived from the owning primary.
    pub rank: Option<u32>,
}

/// Ordered set of managed windows plus the operations the UI and the
/// reconciliation passes need. All mutation happens on the foreground
/// context; background listeners only ever see immutable signals.
#[derive(Debug, Default)]
pub struct StackEngine {
    entries: Vec<WindowEntry>,
}

impl StackEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[WindowEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: WindowId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    /// Ids of primary entries, in stack order.
    pub fn primary_ids(&self) -> Vec<WindowId> {
        self.entries
            .iter()
            .filter(|entry| entry.kind == WindowKind::Primary)
            .map(|entry| entry.id)
            .collect()
    }

    pub fn has_primaries(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.kind == WindowKind::Primary)
    }

    /// Rank of a primary entry. `None` for auxiliaries and unknown ids.
    pub fn rank_of(&self, id: WindowId) -> Option<u32> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .and_then(|entry| entry.rank)
    }

    /// Rank shown for any managed entry: a primary's own rank, or for an
    /// auxiliary the rank of the nearest primary after it.
    pub fn display_rank(&self, id: WindowId) -> Option<u32> {
        let idx = self.position(id)?;
        self.entries[idx..]
            .iter()
            .find(|entry| entry.kind == WindowKind::Primary)
            .and_then(|entry| entry.rank)
    }

    /// Appends a new primary at the end of the stack. Returns `false` when
    /// the id is already managed (as either kind).
    pub fn add_primary(&mut self, id: WindowId, title: impl Into<String>) -> bool {
        if self.contains(id) {
            return false;
        }
        let title = title.into();
        tracing::debug!(id = id.as_raw(), title = %title, "promoting window");
        self.entries.push(WindowEntry {
            id,
            title,
            kind: WindowKind::Primary,
            rank: None,
        });
        self.recompute_ranks();
        true
    }

    /// Inserts a discovered auxiliary immediately before its owning primary,
    /// making it the auxiliary placed closest to that primary. Returns
    /// `false` when the child id is already managed or the parent is not a
    /// managed primary.
    pub fn insert_auxiliary(
        &mut self,
        child: WindowId,
        title: impl Into<String>,
        parent: WindowId,
    ) -> bool {
        if self.contains(child) {
            return false;
        }
        let Some(parent_idx) = self
            .entries
            .iter()
            .position(|entry| entry.id == parent && entry.kind == WindowKind::Primary)
        else {
            return false;
        };
        let title = title.into();
        tracing::debug!(
            child = child.as_raw(),
            parent = parent.as_raw(),
            title = %title,
            "attaching auxiliary window"
        );
        self.entries.insert(
            parent_idx,
            WindowEntry {
                id: child,
                title,
                kind: WindowKind::Auxiliary,
                rank: None,
            },
        );
        true
    }

    /// Removes the entry with the given id wherever it occurs. Removal is
    /// idempotent: unknown ids are a no-op that still reports success.
    pub fn remove(&mut self, id: WindowId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        if self.entries.len() != before {
            tracing::debug!(id = id.as_raw(), "removed window from stack");
        }
        // Removing the last primary can strand a trailing auxiliary run with
        // no owner; drop it so every auxiliary still precedes a primary.
        while matches!(self.entries.last(), Some(last) if last.kind == WindowKind::Auxiliary) {
            if let Some(orphan) = self.entries.pop() {
                tracing::debug!(id = orphan.id.as_raw(), "dropping orphaned auxiliary");
            }
        }
        self.recompute_ranks();
        true
    }

    /// Moves the whole group containing `id` one slot up or down. Fails at
    /// the boundary (first group up, last group down) leaving the stack
    /// unchanged.
    pub fn move_group(&mut self, id: WindowId, direction: MoveDirection) -> bool {
        let Some(idx) = self.position(id) else {
            return false;
        };
        let (start, end) = self.group_range(idx);
        let moved = match direction {
            MoveDirection::Up => {
                if start == 0 {
                    return false;
                }
                // The entry just before this group is the previous group's
                // primary; walk back over its auxiliary run.
                let (prev_start, _) = self.group_range(start - 1);
                self.entries[prev_start..end].rotate_left(start - prev_start);
                true
            }
            MoveDirection::Down => {
                let Some(next_primary) = self.entries[end..]
                    .iter()
                    .position(|entry| entry.kind == WindowKind::Primary)
                else {
                    return false;
                };
                let next_end = end + next_primary + 1;
                self.entries[start..next_end].rotate_left(end - start);
                true
            }
        };
        if moved {
            tracing::debug!(id = id.as_raw(), ?direction, "moved group");
            self.recompute_ranks();
        }
        moved
    }

    /// `[start, end)` of the group containing the entry at `idx`: the run of
    /// auxiliaries leading up to (and including) the first primary at or
    /// after `idx`.
    fn group_range(&self, idx: usize) -> (usize, usize) {
        let primary = self.entries[idx..]
            .iter()
            .position(|entry| entry.kind == WindowKind::Primary)
            .map(|offset| idx + offset)
            .unwrap_or(self.entries.len().saturating_sub(1));
        let mut start = primary;
        while start > 0 && self.entries[start - 1].kind == WindowKind::Auxiliary {
            start -= 1;
        }
        (start, primary + 1)
    }

    /// Drops every entry the desktop reports as no longer live. Returns
    /// whether anything was removed.
    pub fn prune_dead<Q: WindowQuery>(&mut self, desktop: &mut Q) -> bool {
        let dead: Vec<WindowId> = self
            .entries
            .iter()
            .filter(|entry| !desktop.is_live(entry.id))
            .map(|entry| entry.id)
            .collect();
        for id in &dead {
            tracing::info!(id = id.as_raw(), "pruning dead window");
            self.remove(*id);
        }
        !dead.is_empty()
    }

    /// Projects the stack onto the OS z-order as one linear chain: the first
    /// participating entry goes to the top, every later one is placed
    /// directly after the previous participant. Dead, hidden and (for
    /// primaries) minimized entries are skipped without breaking the chain.
    /// Returns `false` only when the stack is empty.
    pub fn apply_order<D: WindowQuery + ZOrder>(&self, desktop: &mut D) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        tracing::debug!("applying stack order");
        let mut previous: Option<WindowId> = None;
        for entry in &self.entries {
            if !desktop.is_live(entry.id) {
                tracing::debug!(id = entry.id.as_raw(), title = %entry.title, "skip: gone");
                continue;
            }
            let visible = desktop.is_visible(entry.id);
            let force_show = match entry.kind {
                WindowKind::Auxiliary => {
                    // A dormant auxiliary (closed dialog, idle IME popup) is
                    // left alone; showing it would resurrect UI the OS chose
                    // to hide.
                    if !visible {
                        tracing::debug!(id = entry.id.as_raw(), title = %entry.title, "skip: auxiliary hidden");
                        continue;
                    }
                    false
                }
                WindowKind::Primary => {
                    if desktop.is_minimized(entry.id) || !visible {
                        tracing::debug!(id = entry.id.as_raw(), title = %entry.title, "skip: minimized or hidden");
                        continue;
                    }
                    true
                }
            };
            match previous {
                None => {
                    tracing::debug!(id = entry.id.as_raw(), title = %entry.title, "place: top");
                    desktop.set_z_order(entry.id, ZPlacement::Top, force_show);
                }
                Some(prev) => {
                    tracing::debug!(id = entry.id.as_raw(), title = %entry.title, "place: follow");
                    desktop.set_z_order(entry.id, ZPlacement::After(prev), force_show);
                }
            }
            previous = Some(entry.id);
        }
        true
    }

    /// Reassigns 1,2,3,... to primaries in stack order; auxiliary ranks are
    /// never touched.
    fn recompute_ranks(&mut self) {
        let mut next = 1u32;
        for entry in &mut self.entries {
            if entry.kind == WindowKind::Primary {
                entry.rank = Some(next);
                next += 1;
            }
        }
    }
}
