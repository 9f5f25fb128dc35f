//! Lazily evaluated derived values.

use crate::runtime::{try_with_runtime, with_runtime, Computation, NodeId, NodeKind, State};
use crate::SignalError;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type ComputeFn<T> = Box<dyn Fn() -> Result<T, SignalError>>;

struct ComputedInner<T> {
    id: NodeId,
    value: RefCell<Option<T>>,
    compute: ComputeFn<T>,
}

impl<T: PartialEq + 'static> Computation for ComputedInner<T> {
    fn run(&self) -> Result<bool, SignalError> {
        let next = with_runtime(|rt| rt.evaluate(self.id, || (self.compute)()))?;
        let mut value = self.value.borrow_mut();
        if value.as_ref() == Some(&next) {
            return Ok(false);
        }
        *value = Some(next);
        Ok(true)
    }
}

impl<T> Drop for ComputedInner<T> {
    fn drop(&mut self) {
        let id = self.id;
        try_with_runtime(|rt| rt.dispose(id));
    }
}

/// A memoized value derived from other signals and computeds.
///
/// The body does not run until the first read. After that it re-runs only
/// when a read finds that one of the sources it used last time has changed.
pub struct Computed<T> {
    inner: Rc<ComputedInner<T>>,
}

/// Creates a computed from an infallible body.
///
/// ```
/// use jsx_signals::{computed, signal};
///
/// let a = signal(2);
/// let doubled = computed({
///     let a = a.clone();
///     move || a.get() * 2
/// });
/// assert_eq!(doubled.get().unwrap(), 4);
/// ```
pub fn computed<T: PartialEq + Clone + 'static>(f: impl Fn() -> T + 'static) -> Computed<T> {
    Computed::new(move || Ok(f()))
}

/// Creates a computed whose body may fail.
///
/// A failure is returned to the reader and the computed stays dirty, so the
/// next read evaluates it again.
pub fn try_computed<T: PartialEq + Clone + 'static>(
    f: impl Fn() -> Result<T, SignalError> + 'static,
) -> Computed<T> {
    Computed::new(f)
}

impl<T: PartialEq + Clone + 'static> Computed<T> {
    fn new(f: impl Fn() -> Result<T, SignalError> + 'static) -> Self {
        let id = with_runtime(|rt| rt.create_node(NodeKind::Computed));
        let inner = Rc::new(ComputedInner {
            id,
            value: RefCell::new(None),
            compute: Box::new(f),
        });
        let weak: Weak<dyn Computation> = Rc::downgrade(&inner) as Weak<dyn Computation>;
        with_runtime(|rt| rt.set_computation(id, weak));
        Self { inner }
    }

    /// Returns the graph node backing this computed.
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Returns the up-to-date value and registers a dependency.
    ///
    /// Fails with [`SignalError::CircularDependency`] when read from inside
    /// its own (possibly transitive) evaluation.
    pub fn get(&self) -> Result<T, SignalError> {
        let value = with_runtime(|rt| {
            rt.update_if_necessary(self.inner.id)?;
            rt.track(self.inner.id);
            Ok::<_, SignalError>(self.cached())
        })?;
        with_runtime(|rt| rt.flush())?;
        value.ok_or(SignalError::Disposed {
            node: self.inner.id,
        })
    }

    /// Returns the up-to-date value without registering a dependency.
    pub fn peek(&self) -> Result<T, SignalError> {
        with_runtime(|rt| rt.update_if_necessary(self.inner.id))?;
        with_runtime(|rt| rt.flush())?;
        self.cached().ok_or(SignalError::Disposed {
            node: self.inner.id,
        })
    }

    /// Returns true when the next read will re-run or re-check the body.
    pub fn is_dirty(&self) -> bool {
        with_runtime(|rt| rt.state(self.inner.id)).is_some_and(|state| state != State::Clean)
    }

    /// Removes this computed from the graph. Later reads fail with
    /// [`SignalError::Disposed`].
    pub fn dispose(&self) {
        with_runtime(|rt| rt.dispose(self.inner.id));
    }

    /// Returns true once [`Computed::dispose`] has been called.
    pub fn is_disposed(&self) -> bool {
        !with_runtime(|rt| rt.contains(self.inner.id))
    }

    fn cached(&self) -> Option<T> {
        self.inner.value.borrow().clone()
    }
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("id", &self.inner.id)
            .field("cached", &*self.inner.value.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal;
    use std::cell::Cell;

    #[test]
    fn test_not_evaluated_before_first_read() {
        let runs = Rc::new(Cell::new(0));
        let c = computed({
            let runs = runs.clone();
            move || {
                runs.set(runs.get() + 1);
                1
            }
        });
        assert_eq!(runs.get(), 0);
        assert!(c.is_dirty());
        assert_eq!(c.get().unwrap(), 1);
        assert_eq!(c.get().unwrap(), 1);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_disposed_read_fails() {
        let c = computed(|| 1);
        c.dispose();
        assert!(c.is_disposed());
        assert!(matches!(c.get(), Err(SignalError::Disposed { .. })));
    }

    #[test]
    fn test_peek_does_not_track() {
        let s = signal(1);
        let inner = computed({
            let s = s.clone();
            move || s.get()
        });
        let outer = computed({
            let inner = inner.clone();
            move || inner.peek().unwrap_or_default()
        });
        assert_eq!(outer.get().unwrap(), 1);
        s.set(2).unwrap();
        // outer never subscribed to inner
        assert_eq!(outer.get().unwrap(), 1);
        assert_eq!(inner.get().unwrap(), 2);
    }
}
