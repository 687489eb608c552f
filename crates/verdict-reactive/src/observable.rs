#![forbid(unsafe_code)]

//! Shared, version-tracked value cells.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::graph::{self, Dependent, Dependents, NodeId, Source, Subscribers};

/// A shared, single-threaded, version-tracked value.
///
/// Reading an observable with [`get`](Self::get) or [`with`](Self::with)
/// inside a [`Computed`](crate::Computed) evaluation registers it as a
/// dependency of that computed. [`peek`](Self::peek) reads without tracking.
///
/// Cloning an `Observable` yields another handle to the same cell.
///
/// # Example
///
/// ```rust
/// use verdict_reactive::Observable;
///
/// let count = Observable::new(1);
/// let copy = count.clone();
/// copy.set(2);
/// assert_eq!(count.get(), 2);
/// assert_eq!(count.version(), 1);
/// ```
pub struct Observable<T> {
    inner: Rc<ObservableInner<T>>,
}

struct ObservableInner<T> {
    id: NodeId,
    value: RefCell<T>,
    version: Cell<u64>,
    dependents: Dependents,
    subscribers: Subscribers,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

impl<T: Default + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: 'static> Observable<T> {
    /// Create a new observable holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(ObservableInner {
                id: graph::next_node_id(),
                value: RefCell::new(value),
                version: Cell::new(0),
                dependents: Dependents::default(),
                subscribers: Subscribers::default(),
            }),
        }
    }

    /// Graph identifier of this cell. Stable for the cell's lifetime.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Number of changes applied so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Borrow the current value, registering a dependency.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        graph::track(self.as_source());
        f(&self.inner.value.borrow())
    }

    /// Borrow the current value without registering a dependency.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value unconditionally, notifying dependents and
    /// subscribers. Returns the previous value.
    pub fn replace(&self, value: T) -> T {
        let previous = self.inner.value.replace(value);
        self.changed();
        previous
    }

    /// Mutate the value in place. Always counts as a change.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.inner.value.borrow_mut());
        self.changed();
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    /// Number of computeds currently depending on this cell.
    #[must_use]
    pub fn dependent_count(&self) -> usize {
        self.inner.dependents.len()
    }

    /// A handle that does not keep this cell alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakObservable<T> {
        WeakObservable {
            id: self.inner.id,
            inner: Rc::downgrade(&self.inner),
        }
    }

    fn as_source(&self) -> Rc<dyn Source> {
        let inner: Rc<ObservableInner<T>> = Rc::clone(&self.inner);
        inner
    }

    fn changed(&self) {
        let inner = &self.inner;
        inner.version.set(inner.version.get() + 1);
        tracing::trace!(node = inner.id, version = inner.version.get(), "observable changed");
        inner.dependents.notify();
        inner.subscribers.schedule_all();
        graph::flush();
    }
}

impl<T: Clone + 'static> Observable<T> {
    /// Read the current value, registering a dependency.
    #[must_use]
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    /// Read the current value without registering a dependency.
    #[must_use]
    pub fn peek(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Register a callback invoked with the new value after every change.
    ///
    /// Callbacks run once the change has finished propagating (or when the
    /// enclosing [`BatchScope`](crate::BatchScope) closes), in registration
    /// order. The callback receives a snapshot, so it may write back to
    /// this cell. Dropping the returned [`Subscription`] unsubscribes.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let cell: Weak<ObservableInner<T>> = Rc::downgrade(&self.inner);
        let slot = self.inner.subscribers.add(move || {
            let Some(cell) = cell.upgrade() else {
                return;
            };
            let snapshot = cell.value.borrow().clone();
            callback(&snapshot);
        });
        Subscription::new(slot)
    }
}

impl<T: PartialEq + 'static> Observable<T> {
    /// Store `value`. Storing a value equal to the current one is a no-op:
    /// no version bump and no notifications.
    pub fn set(&self, value: T) {
        if *self.inner.value.borrow() == value {
            return;
        }
        self.replace(value);
    }
}

impl<T: 'static> Source for ObservableInner<T> {
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

/// Non-owning handle to an [`Observable`].
pub struct WeakObservable<T> {
    id: NodeId,
    inner: Weak<ObservableInner<T>>,
}

impl<T> WeakObservable<T> {
    /// Graph identifier of the cell, valid even after it is dropped.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn upgrade(&self) -> Option<Observable<T>> {
        self.inner.upgrade().map(|inner| Observable { inner })
    }
}

impl<T> Clone for WeakObservable<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for WeakObservable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakObservable")
            .field("id", &self.id)
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

/// RAII guard for a subscriber callback. Dropping it unsubscribes.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    _slot: Rc<graph::SubscriberSlot>,
}

impl Subscription {
    pub(crate) fn new(slot: Rc<graph::SubscriberSlot>) -> Self {
        Self { _slot: slot }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
