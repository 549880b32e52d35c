//! Foreground loop tying the pieces together.
//!
//! Single-threaded by design: the stack, the scanner and every desktop
//! mutation live here, so a restack pass can never overlap a maintenance
//! tick. The background listener only reaches this context through the
//! signal channel.

use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use crate::discovery::WindowScanner;
use crate::drivers::Desktop;
use crate::reconciler::Reconciler;
use crate::stack::{StackEngine, WindowId};
use crate::title_cache::TitleCache;
use crate::watcher::InputSignal;

pub enum ControlFlow {
    Continue,
    Quit,
}

pub struct Runner<D> {
    desktop: D,
    stack: StackEngine,
    scanner: WindowScanner,
    reconciler: Reconciler,
    titles: TitleCache,
    /// Title substrings promoted automatically; order = stacking priority.
    patterns: Vec<String>,
    /// Our own window, if the embedding UI has one; never promoted.
    self_id: Option<WindowId>,
    poll_interval: Duration,
    maintenance_interval: Duration,
    next_maintenance: Instant,
}

impl<D: Desktop> Runner<D> {
    pub fn new(
        desktop: D,
        patterns: Vec<String>,
        debounce: Duration,
        poll_interval: Duration,
        maintenance_interval: Duration,
    ) -> Self {
        Self {
            desktop,
            stack: StackEngine::new(),
            scanner: WindowScanner::new(),
            reconciler: Reconciler::new(debounce),
            titles: TitleCache::new(),
            patterns,
            self_id: None,
            poll_interval,
            maintenance_interval,
            next_maintenance: Instant::now(),
        }
    }

    pub fn set_self_window(&mut self, id: WindowId) {
        self.self_id = Some(id);
    }

    pub fn stack(&self) -> &StackEngine {
        &self.stack
    }

    /// Direct access for an embedding UI (promote/demote/move calls).
    pub fn stack_mut(&mut self) -> &mut StackEngine {
        &mut self.stack
    }

    pub fn titles(&self) -> &TitleCache {
        &self.titles
    }

    pub fn desktop_mut(&mut self) -> &mut D {
        &mut self.desktop
    }

    /// Drains the signal channel and runs timers until `handler` quits.
    pub fn run<F>(&mut self, signals: &Receiver<InputSignal>, mut handler: F)
    where
        F: FnMut() -> ControlFlow,
    {
        self.maintain();
        self.reconcile();
        loop {
            if let ControlFlow::Quit = handler() {
                break;
            }
            match signals.recv_timeout(self.poll_interval) {
                Ok(signal) => {
                    self.observe(signal);
                    // Drain the burst so a drag or key repeat collapses into
                    // one armed deadline instead of one wakeup per event.
                    loop {
                        match signals.try_recv() {
                            Ok(signal) => self.observe(signal),
                            Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    // Listener gone; timers still have to run.
                    thread::sleep(self.poll_interval);
                }
            }
            self.tick(Instant::now());
        }
    }

    pub fn observe(&mut self, signal: InputSignal) {
        self.reconciler
            .observe(signal, &self.stack, &mut self.desktop);
    }

    /// One timer check: fires a due restack pass and the maintenance tick.
    pub fn tick(&mut self, now: Instant) {
        if self.reconciler.take_due(now) {
            self.reconcile();
        }
        if now >= self.next_maintenance {
            self.next_maintenance = now + self.maintenance_interval;
            self.maintain();
        }
    }

    /// Discovery followed by z-order projection.
    pub fn reconcile(&mut self) {
        self.scanner
            .scan(&mut self.desktop, &mut self.stack, self.self_id);
        self.stack.apply_order(&mut self.desktop);
    }

    /// Liveness pruning plus promotion of newly matching windows.
    pub fn maintain(&mut self) {
        let before: Vec<WindowId> = self.stack.entries().iter().map(|entry| entry.id).collect();
        if self.stack.prune_dead(&mut self.desktop) {
            for id in before {
                if !self.stack.contains(id) {
                    self.titles.invalidate(id);
                }
            }
        }
        self.promote_matches();
    }

    fn promote_matches(&mut self) {
        if self.patterns.is_empty() {
            return;
        }
        let listing = self.desktop.list_top_level(true);
        // Outer loop over patterns so the CLI's argument order decides the
        // initial priority of freshly promoted windows.
        for pattern_idx in 0..self.patterns.len() {
            for (id, title) in &listing {
                if Some(*id) == self.self_id {
                    continue;
                }
                if !title.contains(&self.patterns[pattern_idx]) {
                    continue;
                }
                if self.stack.add_primary(*id, title.clone()) {
                    tracing::info!(id = id.as_raw(), title = %title, "promoted matching window");
                    self.titles.insert(*id, title.clone());
                }
            }
        }
    }
}
