//! Writable reactive cells.

use crate::runtime::{try_with_runtime, with_runtime, NodeId, NodeKind};
use crate::SignalError;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

struct SignalInner<T> {
    id: NodeId,
    value: RefCell<T>,
}

impl<T> Drop for SignalInner<T> {
    fn drop(&mut self) {
        let id = self.id;
        try_with_runtime(|rt| rt.dispose(id));
    }
}

/// A mutable reactive cell.
///
/// Cloning a `Signal` yields another handle to the same cell. The cell is
/// removed from the graph when the last handle is dropped.
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

/// Creates a signal holding `initial`.
///
/// ```
/// use jsx_signals::signal;
///
/// let count = signal(1);
/// count.set(2).unwrap();
/// assert_eq!(count.get(), 2);
/// ```
pub fn signal<T: 'static>(initial: T) -> Signal<T> {
    Signal::new(initial)
}

impl<T: 'static> Signal<T> {
    /// Creates a signal holding `initial`.
    pub fn new(initial: T) -> Self {
        let id = with_runtime(|rt| rt.create_node(NodeKind::Signal));
        Self {
            inner: Rc::new(SignalInner {
                id,
                value: RefCell::new(initial),
            }),
        }
    }

    /// Returns the graph node backing this signal.
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Reads the value and registers the current evaluation as a dependent.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        with_runtime(|rt| rt.track(self.inner.id));
        self.inner.value.borrow().clone()
    }

    /// Reads the value without registering a dependency.
    pub fn peek(&self) -> T
    where
        T: Clone,
    {
        self.inner.value.borrow().clone()
    }

    /// Borrows the value for `f`, registering a dependency.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        with_runtime(|rt| rt.track(self.inner.id));
        f(&self.inner.value.borrow())
    }

    /// Stores `value` and notifies dependents.
    ///
    /// Writing a value equal to the current one is a no-op. Effects scheduled
    /// by the write run before this returns unless a batch or an evaluation
    /// is in progress; their first failure is returned.
    pub fn set(&self, value: T) -> Result<(), SignalError>
    where
        T: PartialEq,
    {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return Ok(());
            }
            *current = value;
        }
        with_runtime(|rt| {
            rt.notify_write(self.inner.id);
            rt.flush()
        })
    }

    /// Replaces the value with `f(&current)`.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> Result<(), SignalError>
    where
        T: PartialEq,
    {
        let next = f(&self.inner.value.borrow());
        self.set(next)
    }

    /// Returns how many times the value has changed.
    pub fn version(&self) -> u64 {
        with_runtime(|rt| rt.version(self.inner.id)).unwrap_or_default()
    }

    /// Returns the number of computeds and effects currently depending on
    /// this signal.
    pub fn observer_count(&self) -> usize {
        with_runtime(|rt| rt.observer_count(self.inner.id))
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_bumps_version() {
        let s = signal(String::from("a"));
        assert_eq!(s.version(), 0);
        s.set("b".to_string()).unwrap();
        assert_eq!(s.version(), 1);
        assert_eq!(s.get(), "b");
    }

    #[test]
    fn test_equal_set_is_noop() {
        let s = signal(5);
        s.set(5).unwrap();
        assert_eq!(s.version(), 0);
    }

    #[test]
    fn test_update_and_with() {
        let s = signal(vec![1, 2]);
        s.update(|v| {
            let mut v = v.clone();
            v.push(3);
            v
        })
        .unwrap();
        assert_eq!(s.with(|v| v.len()), 3);
    }
}
