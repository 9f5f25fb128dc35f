//! Fine-grained reactive signals for transpiled JSX.
//!
//! Transpiled components pass reactive props as thunks and getters; those
//! read values held here:
//! - [`Signal`]: a writable cell
//! - [`Computed`]: a lazily evaluated, memoized derivation
//! - [`Effect`]: a side effect re-run when something it read changes
//!
//! Dependencies are tracked automatically while a computed or effect body
//! runs, and are re-collected on every run, so branches that stop reading a
//! signal also stop depending on it.
//!
//! # Example
//!
//! ```
//! use jsx_signals::{batch, computed, effect, signal};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let first = signal("Ada".to_string());
//! let last = signal("Lovelace".to_string());
//! let full = computed({
//!     let (first, last) = (first.clone(), last.clone());
//!     move || format!("{} {}", first.get(), last.get())
//! });
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let _printer = effect({
//!     let (full, log) = (full.clone(), log.clone());
//!     move || log.borrow_mut().push(full.get().unwrap_or_default())
//! })
//! .unwrap();
//!
//! batch(|| {
//!     first.set("Grace".to_string())?;
//!     last.set("Hopper".to_string())
//! })
//! .unwrap();
//!
//! assert_eq!(*log.borrow(), ["Ada Lovelace", "Grace Hopper"]);
//! ```
//!
//! The graph is per thread; handles are neither `Send` nor `Sync`.

mod batch;
mod computed;
mod effect;
mod error;
mod runtime;
mod signal;

pub use batch::{batch, is_batching, untrack};
pub use computed::{computed, try_computed, Computed};
pub use effect::{effect, try_effect, Effect};
pub use error::SignalError;
pub use runtime::NodeId;
pub use signal::{signal, Signal};

/// Returns the number of live reactive nodes on this thread.
pub fn node_count() -> usize {
    runtime::with_runtime(|rt| rt.node_count())
}
