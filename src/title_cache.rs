//! Bounded id -> display-title cache.
//!
//! Lives outside the stack engine: list UIs read titles through it and it is
//! explicitly invalidated when a window leaves management, so a recycled
//! platform handle can never show a stale title.

use std::collections::HashMap;
use std::collections::VecDeque;

use crate::constants::TITLE_CACHE_CAPACITY;
use crate::stack::WindowId;

#[derive(Debug)]
pub struct TitleCache {
    capacity: usize,
    titles: HashMap<WindowId, String>,
    order: VecDeque<WindowId>,
}

impl Default for TitleCache {
    fn default() -> Self {
        Self::with_capacity(TITLE_CACHE_CAPACITY)
    }
}

impl TitleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            titles: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn get(&self, id: WindowId) -> Option<&str> {
        self.titles.get(&id).map(String::as_str)
    }

    /// Inserts or refreshes a title, evicting the oldest entry at capacity.
    pub fn insert(&mut self, id: WindowId, title: impl Into<String>) {
        if self.titles.insert(id, title.into()).is_none() {
            self.order.push_back(id);
            while self.titles.len() > self.capacity {
                if let Some(oldest) = self.order.pop_front() {
                    self.titles.remove(&oldest);
                }
            }
        }
    }

    pub fn invalidate(&mut self, id: WindowId) {
        if self.titles.remove(&id).is_some() {
            self.order.retain(|cached| *cached != id);
        }
    }
}
