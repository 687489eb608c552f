#![forbid(unsafe_code)]

//! Derived values with automatic dependency tracking.
//!
//! A [`Computed`] records every [`Observable`](crate::Observable) and
//! `Computed` it reads while evaluating. When any of those sources changes,
//! the computed is marked dirty and re-evaluates on its next read; the
//! dependency set is rebuilt on every evaluation, so branches that stop
//! reading a source also stop depending on it.
//!
//! Sources are held weakly: a computed stays subscribed to a cell only while
//! something else (usually its own closure) keeps that cell alive.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::graph::{self, Dependent, Dependents, NodeId, Source, Subscribers};
use crate::observable::Subscription;

/// Options accepted by [`Computed::with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputedOptions {
    /// When `false`, the computed evaluates once during construction.
    /// When `true` (the default), evaluation waits for the first read.
    pub defer_evaluation: bool,
}

impl Default for ComputedOptions {
    fn default() -> Self {
        Self {
            defer_evaluation: true,
        }
    }
}

/// A lazily evaluated, cached derived value.
///
/// Cloning a `Computed` yields another handle to the same node.
///
/// # Example
///
/// ```rust
/// use verdict_reactive::{Computed, Observable};
///
/// let width = Observable::new(3);
/// let area = {
///     let width = width.clone();
///     Computed::new(move || width.get() * width.get())
/// };
/// assert_eq!(area.get(), 9);
/// width.set(4);
/// assert_eq!(area.get(), 16);
/// ```
pub struct Computed<T> {
    inner: Rc<ComputedInner<T>>,
}

struct ComputedInner<T> {
    id: NodeId,
    evaluate: Box<dyn Fn() -> T>,
    value: RefCell<Option<T>>,
    dirty: Cell<bool>,
    evaluating: Cell<bool>,
    disposed: Cell<bool>,
    version: Cell<u64>,
    sources: RefCell<Vec<(NodeId, Weak<dyn Source>)>>,
    dependents: Dependents,
    subscribers: Subscribers,
    self_weak: Weak<ComputedInner<T>>,
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
            .field("value", &*self.inner.value.borrow())
            .field("dirty", &self.inner.dirty.get())
            .finish_non_exhaustive()
    }
}

impl<T: 'static> Computed<T> {
    /// Create a lazy computed. `evaluate` first runs on the first read.
    #[must_use]
    pub fn new(evaluate: impl Fn() -> T + 'static) -> Self {
        Self::with_options(evaluate, ComputedOptions::default())
    }

    /// Create a computed with explicit options.
    #[must_use]
    pub fn with_options(evaluate: impl Fn() -> T + 'static, options: ComputedOptions) -> Self {
        let inner = Rc::new_cyclic(|self_weak| ComputedInner {
            id: graph::next_node_id(),
            evaluate: Box::new(evaluate),
            value: RefCell::new(None),
            dirty: Cell::new(true),
            evaluating: Cell::new(false),
            disposed: Cell::new(false),
            version: Cell::new(0),
            sources: RefCell::new(Vec::new()),
            dependents: Dependents::default(),
            subscribers: Subscribers::default(),
            self_weak: self_weak.clone(),
        });
        if !options.defer_evaluation {
            inner.ensure_fresh();
        }
        Self { inner }
    }

    /// Graph identifier of this node.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Number of evaluations performed so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Whether the next read will re-evaluate.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.get()
    }

    /// Number of sources read during the last evaluation.
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.inner.sources.borrow().len()
    }

    /// Borrow the current value, registering a dependency.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        graph::track(self.as_source());
        self.with_untracked(f)
    }

    /// Borrow the current value without registering a dependency.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.ensure_fresh();
        let value = self.inner.value.borrow();
        f(value.as_ref().expect("computed value is present after evaluation"))
    }

    /// Detach from every source. The last value stays readable but is never
    /// recomputed again.
    pub fn dispose(&self) {
        let inner = &self.inner;
        if inner.disposed.replace(true) {
            return;
        }
        for (_, source) in inner.sources.take() {
            if let Some(source) = source.upgrade() {
                source.detach(inner.id);
            }
        }
        tracing::trace!(node = inner.id, "computed disposed");
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// A handle that does not keep this node alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakComputed<T> {
        WeakComputed {
            id: self.inner.id,
            inner: Rc::downgrade(&self.inner),
        }
    }

    fn as_source(&self) -> Rc<dyn Source> {
        let inner: Rc<ComputedInner<T>> = Rc::clone(&self.inner);
        inner
    }
}

impl<T: Clone + 'static> Computed<T> {
    /// Read the current value, registering a dependency.
    #[must_use]
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    /// Read the current value without registering a dependency.
    #[must_use]
    pub fn peek(&self) -> T {
        self.with_untracked(T::clone)
    }
}

impl<T: Clone + PartialEq + 'static> Computed<T> {
    /// Register a callback invoked whenever the value changes.
    ///
    /// The computed is evaluated immediately so changes are detected
    /// against the value current at subscription time. Re-evaluations that
    /// produce an equal value do not invoke the callback.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let last = RefCell::new(Some(self.peek()));
        let node: Weak<ComputedInner<T>> = Rc::downgrade(&self.inner);
        let slot = self.inner.subscribers.add(move || {
            let Some(node) = node.upgrade() else {
                return;
            };
            let current = graph::untracked(|| {
                node.ensure_fresh();
                node.value.borrow().clone()
            });
            let Some(current) = current else {
                return;
            };
            if last.borrow().as_ref() == Some(&current) {
                return;
            }
            *last.borrow_mut() = Some(current.clone());
            callback(&current);
        });
        Subscription::new(slot)
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }
}

/// Non-owning handle to a [`Computed`].
pub struct WeakComputed<T> {
    id: NodeId,
    inner: Weak<ComputedInner<T>>,
}

impl<T> WeakComputed<T> {
    /// Graph identifier of the node, valid even after it is dropped.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn upgrade(&self) -> Option<Computed<T>> {
        self.inner.upgrade().map(|inner| Computed { inner })
    }
}

impl<T> Clone for WeakComputed<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for WeakComputed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakComputed")
            .field("id", &self.id)
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

/// Clears the evaluating flag even if the evaluation unwinds.
struct EvaluatingGuard<'a>(&'a Cell<bool>);

impl Drop for EvaluatingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<T: 'static> ComputedInner<T> {
    fn ensure_fresh(&self) {
        if self.disposed.get() {
            if self.value.borrow().is_none() {
                let value = graph::untracked(|| (self.evaluate)());
                *self.value.borrow_mut() = Some(value);
            }
            return;
        }
        if !self.dirty.get() {
            return;
        }
        if self.evaluating.get() {
            panic!(
                "reactive cycle: computed {} was read during its own evaluation",
                self.id
            );
        }
        self.evaluating.set(true);
        let guard = EvaluatingGuard(&self.evaluating);
        let (value, sources) = graph::collect_sources(|| (self.evaluate)());
        drop(guard);

        let previous = self.sources.replace(Vec::new());
        for (id, source) in &previous {
            if sources.iter().any(|next| next.node_id() == *id) {
                continue;
            }
            if let Some(source) = source.upgrade() {
                source.detach(self.id);
            }
        }
        let me: Weak<dyn Dependent> = self.self_weak.clone();
        for source in &sources {
            source.attach(self.id, me.clone());
        }
        *self.sources.borrow_mut() = sources
            .iter()
            .map(|source| (source.node_id(), Rc::downgrade(source)))
            .collect();
        *self.value.borrow_mut() = Some(value);
        self.dirty.set(false);
        self.version.set(self.version.get() + 1);
        tracing::trace!(
            node = self.id,
            version = self.version.get(),
            sources = self.sources.borrow().len(),
            "computed evaluated"
        );
    }
}

impl<T: 'static> Dependent for ComputedInner<T> {
    fn invalidate(&self) {
        if self.dirty.get() || self.disposed.get() {
            return;
        }
        self.dirty.set(true);
        self.dependents.notify();
        self.subscribers.schedule_all();
    }
}

impl<T: 'static> Source for ComputedInner<T> {
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn attach(&self, id: NodeId, dependent: Weak<dyn Dependent>) {
        self.dependents.attach(id, dependent);
    }

    fn detach(&self, id: NodeId) {
        self.dependents.detach(id);
    }
}

impl<T> Drop for ComputedInner<T> {
    fn drop(&mut self) {
        for (_, source) in self.sources.get_mut().drain(..) {
            if let Some(source) = source.upgrade() {
                source.detach(self.id);
            }
        }
    }
}
