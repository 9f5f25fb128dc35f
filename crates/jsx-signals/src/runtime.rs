//! The per-thread reactive graph.
//!
//! Every signal, computed and effect owns one node in an arena. Nodes are
//! addressed by generational [`NodeId`]s, so edges never keep values alive:
//! dropping (or disposing) the handle that owns a node removes the node and
//! all of its edges.
//!
//! Propagation uses three states. A write marks direct observers `Dirty` and
//! their transitive observers `Check`. Reads pull: a `Check` node first brings
//! its computed sources up to date and only re-runs if one of them actually
//! changed. Effects are queued when they leave `Clean` and run at the flush
//! point (the end of the outermost batch, evaluation or write).

use crate::SignalError;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Weak;
use tracing::{debug, trace};

/// Upper bound on effect runs in a single flush.
pub(crate) const MAX_FLUSH_RUNS: usize = 100_000;

thread_local! {
    static RUNTIME: Runtime = Runtime::new();
}

/// Runs `f` with this thread's runtime.
pub(crate) fn with_runtime<R>(f: impl FnOnce(&Runtime) -> R) -> R {
    RUNTIME.with(f)
}

/// Like [`with_runtime`] but silently skips when the runtime is already torn
/// down (handles dropped during thread exit).
pub(crate) fn try_with_runtime(f: impl FnOnce(&Runtime)) {
    let _ = RUNTIME.try_with(f);
}

/// Identifies a node in the reactive graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Signal,
    Computed,
    Effect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum State {
    Clean,
    /// A transitive source may have changed.
    Check,
    /// A direct source changed.
    Dirty,
}

/// A node that re-runs a tracked body.
pub(crate) trait Computation {
    /// Re-runs the body inside a tracking frame; returns whether the
    /// observable value changed.
    fn run(&self) -> Result<bool, SignalError>;
}

struct Node {
    kind: NodeKind,
    state: State,
    /// The last evaluation failed; the node stays dirty and keeps forwarding
    /// notifications so its observers learn about retries.
    errored: bool,
    evaluating: bool,
    version: u64,
    sources: Vec<NodeId>,
    observers: Vec<NodeId>,
    computation: Option<Weak<dyn Computation>>,
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

#[derive(Default)]
struct Arena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl Arena {
    fn insert(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn remove(&mut self, id: NodeId) -> Option<Node> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?;
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(node)
    }

    fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}

/// One active tracking scope. `observer` is `None` inside `untrack`.
struct Frame {
    observer: Option<NodeId>,
    sources: Vec<NodeId>,
}

pub(crate) struct Runtime {
    arena: RefCell<Arena>,
    frames: RefCell<Vec<Frame>>,
    pending: RefCell<VecDeque<NodeId>>,
    batch_depth: Cell<usize>,
    evaluation_depth: Cell<usize>,
    flushing: Cell<bool>,
}

impl Runtime {
    fn new() -> Self {
        Self {
            arena: RefCell::new(Arena::default()),
            frames: RefCell::new(Vec::new()),
            pending: RefCell::new(VecDeque::new()),
            batch_depth: Cell::new(0),
            evaluation_depth: Cell::new(0),
            flushing: Cell::new(false),
        }
    }

    // ---------------------------------------------------------------------
    // Nodes
    // ---------------------------------------------------------------------

    pub(crate) fn create_node(&self, kind: NodeKind) -> NodeId {
        let state = match kind {
            NodeKind::Signal => State::Clean,
            // never evaluated yet
            NodeKind::Computed | NodeKind::Effect => State::Dirty,
        };
        self.arena.borrow_mut().insert(Node {
            kind,
            state,
            errored: false,
            evaluating: false,
            version: 0,
            sources: Vec::new(),
            observers: Vec::new(),
            computation: None,
        })
    }

    pub(crate) fn set_computation(&self, id: NodeId, computation: Weak<dyn Computation>) {
        if let Some(node) = self.arena.borrow_mut().get_mut(id) {
            node.computation = Some(computation);
        }
    }

    /// Removes a node and every edge that points at it.
    pub(crate) fn dispose(&self, id: NodeId) {
        let Ok(mut arena) = self.arena.try_borrow_mut() else {
            return;
        };
        let Some(node) = arena.remove(id) else {
            return;
        };
        for source in &node.sources {
            if let Some(source) = arena.get_mut(*source) {
                source.observers.retain(|o| *o != id);
            }
        }
        for observer in &node.observers {
            if let Some(observer) = arena.get_mut(*observer) {
                observer.sources.retain(|s| *s != id);
            }
        }
        drop(arena);
        if let Ok(mut pending) = self.pending.try_borrow_mut() {
            pending.retain(|p| *p != id);
        }
        debug!(%id, kind = ?node.kind, "disposed reactive node");
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.arena.borrow().get(id).is_some()
    }

    pub(crate) fn version(&self, id: NodeId) -> Option<u64> {
        self.arena.borrow().get(id).map(|n| n.version)
    }

    pub(crate) fn state(&self, id: NodeId) -> Option<State> {
        self.arena.borrow().get(id).map(|n| n.state)
    }

    pub(crate) fn observer_count(&self, id: NodeId) -> usize {
        self.arena
            .borrow()
            .get(id)
            .map_or(0, |n| n.observers.len())
    }

    pub(crate) fn node_count(&self) -> usize {
        self.arena.borrow().len()
    }

    // ---------------------------------------------------------------------
    // Tracking
    // ---------------------------------------------------------------------

    /// Records a read of `source` by the innermost tracking frame.
    pub(crate) fn track(&self, source: NodeId) {
        let mut frames = self.frames.borrow_mut();
        if let Some(Frame {
            observer: Some(_),
            sources,
        }) = frames.last_mut()
        {
            if !sources.contains(&source) {
                sources.push(source);
            }
        }
    }

    /// Runs `f` as the tracked body of `id`, then replaces the node's
    /// dependency set with exactly the sources `f` read.
    pub(crate) fn evaluate<R>(&self, id: NodeId, f: impl FnOnce() -> R) -> R {
        struct EvalGuard<'a> {
            runtime: &'a Runtime,
            id: NodeId,
            armed: bool,
        }

        impl Drop for EvalGuard<'_> {
            fn drop(&mut self) {
                // unwinding out of `f`; edges from the aborted run are dropped
                if self.armed {
                    self.runtime.finish_evaluation(self.id);
                }
            }
        }

        if let Some(node) = self.arena.borrow_mut().get_mut(id) {
            node.evaluating = true;
        }
        self.evaluation_depth.set(self.evaluation_depth.get() + 1);
        self.frames.borrow_mut().push(Frame {
            observer: Some(id),
            sources: Vec::new(),
        });
        trace!(%id, "evaluating");

        let mut guard = EvalGuard {
            runtime: self,
            id,
            armed: true,
        };
        let result = f();
        guard.armed = false;

        let sources = self.finish_evaluation(id);
        self.install_sources(id, sources);
        result
    }

    fn finish_evaluation(&self, id: NodeId) -> Vec<NodeId> {
        let frame = self.frames.borrow_mut().pop();
        if let Some(node) = self.arena.borrow_mut().get_mut(id) {
            node.evaluating = false;
        }
        self.evaluation_depth
            .set(self.evaluation_depth.get().saturating_sub(1));
        frame.map(|f| f.sources).unwrap_or_default()
    }

    /// Runs `f` with tracking suspended.
    pub(crate) fn untracked<R>(&self, f: impl FnOnce() -> R) -> R {
        struct UntrackGuard<'a>(&'a Runtime);

        impl Drop for UntrackGuard<'_> {
            fn drop(&mut self) {
                self.0.frames.borrow_mut().pop();
            }
        }

        self.frames.borrow_mut().push(Frame {
            observer: None,
            sources: Vec::new(),
        });
        let _guard = UntrackGuard(self);
        f()
    }

    fn install_sources(&self, id: NodeId, sources: Vec<NodeId>) {
        let mut arena = self.arena.borrow_mut();
        let Some(node) = arena.get_mut(id) else {
            return;
        };
        let previous = std::mem::replace(&mut node.sources, sources.clone());

        for stale in previous.iter().filter(|s| !sources.contains(s)) {
            if let Some(source) = arena.get_mut(*stale) {
                source.observers.retain(|o| *o != id);
            }
        }
        for added in sources.iter().filter(|s| !previous.contains(s)) {
            if let Some(source) = arena.get_mut(*added) {
                source.observers.push(id);
            }
        }
    }

    // ---------------------------------------------------------------------
    // Propagation
    // ---------------------------------------------------------------------

    /// Called after a signal's value changed.
    pub(crate) fn notify_write(&self, id: NodeId) {
        let observers = {
            let mut arena = self.arena.borrow_mut();
            let Some(node) = arena.get_mut(id) else {
                return;
            };
            node.version += 1;
            node.observers.clone()
        };
        for observer in observers {
            self.mark(observer, State::Dirty);
        }
    }

    fn mark(&self, id: NodeId, state: State) {
        let mut stack = vec![(id, state)];
        while let Some((id, state)) = stack.pop() {
            let mut arena = self.arena.borrow_mut();
            let Some(node) = arena.get_mut(id) else {
                continue;
            };
            if node.state >= state && !node.errored {
                continue;
            }
            let propagate = node.state == State::Clean || node.errored;
            node.state = node.state.max(state);
            if !propagate {
                continue;
            }
            stack.extend(node.observers.iter().map(|o| (*o, State::Check)));
            if node.kind == NodeKind::Effect {
                drop(arena);
                let mut pending = self.pending.borrow_mut();
                if !pending.contains(&id) {
                    pending.push_back(id);
                }
            }
        }
    }

    /// Brings `id` up to date, re-running it only if a source changed.
    pub(crate) fn update_if_necessary(&self, id: NodeId) -> Result<(), SignalError> {
        let (state, sources) = {
            let arena = self.arena.borrow();
            let node = arena.get(id).ok_or(SignalError::Disposed { node: id })?;
            if node.evaluating {
                return Err(SignalError::CircularDependency { node: id });
            }
            (node.state, node.sources.clone())
        };

        if state == State::Check {
            for source in sources {
                let is_computed = self
                    .arena
                    .borrow()
                    .get(source)
                    .is_some_and(|n| n.kind == NodeKind::Computed);
                if is_computed {
                    if let Err(error) = self.update_if_necessary(source) {
                        self.mark_failed(id);
                        return Err(error);
                    }
                }
                if self.state(id) == Some(State::Dirty) {
                    break;
                }
            }
        }

        if self.state(id) != Some(State::Dirty) {
            self.set_state(id, State::Clean);
            return Ok(());
        }

        let computation = self
            .arena
            .borrow()
            .get(id)
            .and_then(|n| n.computation.clone())
            .and_then(|weak| weak.upgrade());
        let Some(computation) = computation else {
            self.set_state(id, State::Clean);
            return Ok(());
        };

        let result = computation.run();
        drop(computation);

        match result {
            Ok(changed) => {
                let observers = {
                    let mut arena = self.arena.borrow_mut();
                    let Some(node) = arena.get_mut(id) else {
                        return Ok(());
                    };
                    node.state = State::Clean;
                    node.errored = false;
                    if changed {
                        node.version += 1;
                        node.observers.clone()
                    } else {
                        Vec::new()
                    }
                };
                for observer in observers {
                    self.mark(observer, State::Dirty);
                }
                Ok(())
            }
            Err(error) => {
                self.mark_failed(id);
                debug!(%id, %error, "evaluation failed; node stays dirty");
                Err(error)
            }
        }
    }

    /// Leaves `id` dirty so the next read or write re-runs it.
    fn mark_failed(&self, id: NodeId) {
        if let Some(node) = self.arena.borrow_mut().get_mut(id) {
            node.state = State::Dirty;
            node.errored = true;
        }
    }

    fn set_state(&self, id: NodeId, state: State) {
        if let Some(node) = self.arena.borrow_mut().get_mut(id) {
            node.state = state;
        }
    }

    // ---------------------------------------------------------------------
    // Batching and flushing
    // ---------------------------------------------------------------------

    pub(crate) fn begin_batch(&self) {
        self.batch_depth.set(self.batch_depth.get() + 1);
    }

    pub(crate) fn end_batch(&self) {
        self.batch_depth
            .set(self.batch_depth.get().saturating_sub(1));
    }

    pub(crate) fn is_batching(&self) -> bool {
        self.batch_depth.get() > 0
    }

    fn should_flush(&self) -> bool {
        self.batch_depth.get() == 0
            && self.evaluation_depth.get() == 0
            && !self.flushing.get()
            && !self.pending.borrow().is_empty()
    }

    /// Runs queued effects if no batch, evaluation or flush is in progress.
    ///
    /// Every queued effect runs even if an earlier one fails; the first
    /// failure is returned.
    pub(crate) fn flush(&self) -> Result<(), SignalError> {
        struct FlushGuard<'a>(&'a Runtime);

        impl Drop for FlushGuard<'_> {
            fn drop(&mut self) {
                self.0.flushing.set(false);
            }
        }

        if !self.should_flush() {
            return Ok(());
        }
        self.flushing.set(true);
        let _guard = FlushGuard(self);

        let mut first_error = None;
        let mut runs = 0usize;
        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some(id) = next else {
                break;
            };
            if !self.contains(id) {
                continue;
            }
            runs += 1;
            if runs > MAX_FLUSH_RUNS {
                self.pending.borrow_mut().clear();
                return Err(SignalError::RunawayFlush {
                    limit: MAX_FLUSH_RUNS,
                });
            }
            if let Err(error) = self.update_if_necessary(id) {
                first_error.get_or_insert(error);
            }
        }
        debug!(runs, "flushed effects");

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
