//! Side effects that re-run when their dependencies change.

use crate::runtime::{try_with_runtime, with_runtime, Computation, NodeId, NodeKind};
use crate::SignalError;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type EffectFn = Box<dyn FnMut() -> Result<(), SignalError>>;

struct EffectInner {
    id: NodeId,
    body: RefCell<EffectFn>,
}

impl Computation for EffectInner {
    fn run(&self) -> Result<bool, SignalError> {
        // An effect that re-enters itself (through a nested flush) is
        // already running.
        let Ok(mut body) = self.body.try_borrow_mut() else {
            return Err(SignalError::CircularDependency { node: self.id });
        };
        with_runtime(|rt| rt.evaluate(self.id, || (*body)()))?;
        Ok(false)
    }
}

impl Drop for EffectInner {
    fn drop(&mut self) {
        let id = self.id;
        try_with_runtime(|rt| rt.dispose(id));
    }
}

/// Handle to a running effect.
///
/// The effect stays subscribed for as long as the handle lives. Dropping the
/// handle (or calling [`Effect::dispose`]) stops it.
#[must_use = "dropping an Effect disposes it immediately"]
pub struct Effect {
    inner: Rc<EffectInner>,
}

/// Runs `f` now and again whenever a signal or computed it read changes.
///
/// ```
/// use jsx_signals::{effect, signal};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let name = signal("a");
/// let seen = Rc::new(Cell::new(0));
/// let _watch = effect({
///     let (name, seen) = (name.clone(), seen.clone());
///     move || {
///         name.get();
///         seen.set(seen.get() + 1);
///     }
/// })
/// .unwrap();
/// name.set("b").unwrap();
/// assert_eq!(seen.get(), 2);
/// ```
pub fn effect(mut f: impl FnMut() + 'static) -> Result<Effect, SignalError> {
    Effect::new(move || {
        f();
        Ok(())
    })
}

/// Like [`effect`] but the body may fail.
///
/// A failure is returned from whichever call triggered the run: the creating
/// call, the write, or the end of the batch.
pub fn try_effect(
    f: impl FnMut() -> Result<(), SignalError> + 'static,
) -> Result<Effect, SignalError> {
    Effect::new(f)
}

impl Effect {
    fn new(f: impl FnMut() -> Result<(), SignalError> + 'static) -> Result<Self, SignalError> {
        let id = with_runtime(|rt| rt.create_node(NodeKind::Effect));
        let inner = Rc::new(EffectInner {
            id,
            body: RefCell::new(Box::new(f)),
        });
        let weak: Weak<dyn Computation> = Rc::downgrade(&inner) as Weak<dyn Computation>;
        with_runtime(|rt| rt.set_computation(id, weak));

        let effect = Self { inner };
        with_runtime(|rt| {
            rt.update_if_necessary(id)?;
            rt.flush()
        })?;
        Ok(effect)
    }

    /// Returns the graph node backing this effect.
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Unsubscribes the effect. It never runs again.
    pub fn dispose(&self) {
        with_runtime(|rt| rt.dispose(self.inner.id));
    }

    /// Returns true once the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        !with_runtime(|rt| rt.contains(self.inner.id))
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.inner.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal;
    use std::cell::Cell;

    #[test]
    fn test_runs_once_on_creation() {
        let runs = Rc::new(Cell::new(0));
        let _e = effect({
            let runs = runs.clone();
            move || runs.set(runs.get() + 1)
        })
        .unwrap();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let s = signal(0);
        let runs = Rc::new(Cell::new(0));
        let e = effect({
            let (s, runs) = (s.clone(), runs.clone());
            move || {
                s.get();
                runs.set(runs.get() + 1);
            }
        })
        .unwrap();
        assert_eq!(s.observer_count(), 1);
        drop(e);
        assert_eq!(s.observer_count(), 0);
        s.set(1).unwrap();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_creation_error_is_returned() {
        let result = try_effect(|| Err(SignalError::evaluation("nope")));
        assert_eq!(result.unwrap_err(), SignalError::evaluation("nope"));
    }
}
