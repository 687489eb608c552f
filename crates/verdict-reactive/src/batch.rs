#![forbid(unsafe_code)]

//! Deferred subscriber notification.

use crate::graph;

/// While a `BatchScope` is alive, subscriber callbacks are queued instead
/// of run. Dirty marking still happens immediately, so reads inside the
/// batch are never stale. Scopes nest; callbacks run when the outermost
/// scope is dropped, each subscription at most once.
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use verdict_reactive::{BatchScope, Observable};
///
/// let cell = Observable::new(0);
/// let calls = Rc::new(Cell::new(0));
/// let _sub = {
///     let calls = Rc::clone(&calls);
///     cell.subscribe(move |_| calls.set(calls.get() + 1))
/// };
/// {
///     let _batch = BatchScope::new();
///     cell.set(1);
///     cell.set(2);
/// }
/// assert_eq!(calls.get(), 1);
/// ```
#[must_use = "the batch ends when the scope is dropped"]
pub struct BatchScope {
    _private: (),
}

impl BatchScope {
    /// Open a batch on the current thread.
    pub fn new() -> Self {
        graph::enter_batch();
        Self { _private: () }
    }
}

impl Default for BatchScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BatchScope {
    fn drop(&mut self) {
        graph::exit_batch();
    }
}

impl std::fmt::Debug for BatchScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BatchScope")
    }
}

/// Run `f` inside a [`BatchScope`].
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    let _scope = BatchScope::new();
    f()
}
