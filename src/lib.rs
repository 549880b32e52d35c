//! Keeps a user-chosen set of top-level windows in a fixed front-to-back
//! order, re-applying the order whenever input activity suggests the OS
//! shuffled them (a raised dialog, an IME commit, a click on a lower
//! window).
//!
//! The portable core is the [`stack::StackEngine`] plus the discovery /
//! trigger machinery around it; everything OS-specific sits behind the
//! traits in [`drivers`].

pub mod constants;
pub mod discovery;
pub mod drivers;
pub mod logging;
pub mod reconciler;
pub mod runner;
pub mod stack;
pub mod title_cache;
pub mod watcher;
