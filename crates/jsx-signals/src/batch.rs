//! Grouping writes and reading without tracking.

use crate::runtime::{with_runtime, Runtime};
use crate::SignalError;

/// Runs `f` with effect execution deferred until it returns.
///
/// Batches nest; queued effects run once, when the outermost batch ends, and
/// each effect runs at most once for all writes made inside. The batch ends
/// even if `f` fails or panics. A failure from `f` wins over a failure from
/// the flush.
///
/// ```
/// use jsx_signals::{batch, effect, signal};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let (a, b) = (signal(1), signal(2));
/// let runs = Rc::new(Cell::new(0));
/// let _sum = effect({
///     let (a, b, runs) = (a.clone(), b.clone(), runs.clone());
///     move || {
///         let _ = a.get() + b.get();
///         runs.set(runs.get() + 1);
///     }
/// })
/// .unwrap();
///
/// batch(|| {
///     a.set(10)?;
///     b.set(20)
/// })
/// .unwrap();
/// assert_eq!(runs.get(), 2);
/// ```
pub fn batch<R>(f: impl FnOnce() -> Result<R, SignalError>) -> Result<R, SignalError> {
    struct BatchGuard;

    impl Drop for BatchGuard {
        fn drop(&mut self) {
            with_runtime(Runtime::end_batch);
        }
    }

    with_runtime(Runtime::begin_batch);
    let result = {
        let _guard = BatchGuard;
        f()
    };
    let flushed = with_runtime(Runtime::flush);
    let value = result?;
    flushed?;
    Ok(value)
}

/// Runs `f` without registering any reads as dependencies.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    with_runtime(|rt| rt.untracked(f))
}

/// Returns true while inside [`batch`].
pub fn is_batching() -> bool {
    with_runtime(Runtime::is_batching)
}
