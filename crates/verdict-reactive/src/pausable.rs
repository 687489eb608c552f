#![forbid(unsafe_code)]

//! Derived values whose recomputation can be frozen.
//!
//! While running, a [`PausableComputed`] behaves like a plain
//! [`Computed`] and caches every value it produces. While paused it depends
//! only on its pause switch, so changes to the evaluated sources are not
//! observed until it is resumed or [`refresh`](PausableComputed::refresh)ed.
//!
//! Writing `true` to a shared switch directly captures the value at that
//! moment, the same as [`set_paused`](PausableComputed::set_paused).

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::batch::BatchScope;
use crate::computed::{Computed, ComputedOptions};
use crate::graph::{self, NodeId};
use crate::observable::{Observable, Subscription};

/// Where a [`PausableComputed`] reads its paused flag from.
#[derive(Clone, Debug)]
pub enum PauseSource {
    /// A private switch with the given initial state.
    Fixed(bool),
    /// A switch shared with other pausable cells.
    Shared(Observable<bool>),
}

impl Default for PauseSource {
    fn default() -> Self {
        Self::Fixed(false)
    }
}

impl From<bool> for PauseSource {
    fn from(paused: bool) -> Self {
        Self::Fixed(paused)
    }
}

impl From<Observable<bool>> for PauseSource {
    fn from(switch: Observable<bool>) -> Self {
        Self::Shared(switch)
    }
}

impl From<&Observable<bool>> for PauseSource {
    fn from(switch: &Observable<bool>) -> Self {
        Self::Shared(switch.clone())
    }
}

impl PauseSource {
    fn into_switch(self) -> Observable<bool> {
        match self {
            Self::Fixed(paused) => Observable::new(paused),
            Self::Shared(switch) => switch,
        }
    }
}

/// A derived value that can be paused.
///
/// # Example
///
/// ```rust
/// use verdict_reactive::{Observable, PausableComputed};
///
/// let text = Observable::new(String::from("a"));
/// let upper = {
///     let text = text.clone();
///     PausableComputed::new(move || text.get().to_uppercase(), false)
/// };
/// assert_eq!(upper.get(), "A");
///
/// upper.set_paused(true);
/// text.set(String::from("b"));
/// assert_eq!(upper.get(), "A");
///
/// upper.refresh();
/// assert_eq!(upper.get(), "B");
/// assert!(upper.is_paused());
/// ```
pub struct PausableComputed<T> {
    computed: Computed<T>,
    switch: Observable<bool>,
    refreshes: Observable<u64>,
    evaluate: Rc<dyn Fn() -> T>,
    cache: Rc<RefCell<Option<T>>>,
    // Set by `set_paused` once it has captured the value itself.
    captured: Rc<Cell<bool>>,
    _switch_watch: Rc<Subscription>,
}

impl<T> Clone for PausableComputed<T> {
    fn clone(&self) -> Self {
        Self {
            computed: self.computed.clone(),
            switch: self.switch.clone(),
            refreshes: self.refreshes.clone(),
            evaluate: Rc::clone(&self.evaluate),
            cache: Rc::clone(&self.cache),
            captured: Rc::clone(&self.captured),
            _switch_watch: Rc::clone(&self._switch_watch),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for PausableComputed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PausableComputed")
            .field("id", &self.computed.id())
            .field("paused", &self.switch.peek())
            .field("cache", &*self.cache.borrow())
            .finish()
    }
}

impl<T: Clone + 'static> PausableComputed<T> {
    /// Create a lazy pausable computed.
    #[must_use]
    pub fn new(evaluate: impl Fn() -> T + 'static, paused: impl Into<PauseSource>) -> Self {
        Self::with_options(evaluate, ComputedOptions::default(), paused)
    }

    /// Create a pausable computed with explicit options.
    #[must_use]
    pub fn with_options(
        evaluate: impl Fn() -> T + 'static,
        options: ComputedOptions,
        paused: impl Into<PauseSource>,
    ) -> Self {
        let evaluate: Rc<dyn Fn() -> T> = Rc::new(evaluate);
        let switch = paused.into().into_switch();
        let refreshes = Observable::new(0_u64);
        let cache: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));

        let computed = {
            let evaluate = Rc::clone(&evaluate);
            let switch = switch.clone();
            let refreshes = refreshes.clone();
            let cache = Rc::clone(&cache);
            Computed::with_options(
                move || {
                    if switch.get() {
                        refreshes.with(|_| ());
                        let cached = cache.borrow().clone();
                        if let Some(value) = cached {
                            return value;
                        }
                        let value = graph::untracked(|| evaluate());
                        *cache.borrow_mut() = Some(value.clone());
                        return value;
                    }
                    let value = evaluate();
                    *cache.borrow_mut() = Some(value.clone());
                    value
                },
                options,
            )
        };

        let captured = Rc::new(Cell::new(false));
        let switch_watch = {
            let evaluate = Rc::clone(&evaluate);
            let refreshes = refreshes.clone();
            let cache = Rc::clone(&cache);
            let captured = Rc::clone(&captured);
            switch.subscribe(move |paused| {
                let already_captured = captured.replace(false);
                if !*paused || already_captured {
                    return;
                }
                let value = graph::untracked(|| evaluate());
                *cache.borrow_mut() = Some(value);
                refreshes.update(|count| *count += 1);
            })
        };

        Self {
            computed,
            switch,
            refreshes,
            evaluate,
            cache,
            captured,
            _switch_watch: Rc::new(switch_watch),
        }
    }

    /// Current value, registering a dependency.
    #[must_use]
    pub fn get(&self) -> T {
        self.computed.get()
    }

    /// Current value without registering a dependency.
    #[must_use]
    pub fn peek(&self) -> T {
        self.computed.peek()
    }

    /// Whether recomputation is frozen. Tracked.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.switch.get()
    }

    /// Pause or resume.
    ///
    /// Pausing a running cell evaluates it first, so the frozen value is
    /// current as of the moment of pausing. Pausing an already paused cell
    /// does nothing. Resuming makes the next read re-evaluate with tracking.
    pub fn set_paused(&self, paused: bool) {
        if paused == self.switch.peek() {
            return;
        }
        if paused {
            let _ = self.peek();
            self.captured.set(true);
        }
        tracing::trace!(node = self.computed.id(), paused, "pause switch changed");
        self.switch.set(paused);
    }

    /// Recompute once while staying paused. Does nothing when running.
    pub fn refresh(&self) {
        if !self.switch.peek() {
            return;
        }
        let _batch = BatchScope::new();
        let value = graph::untracked(|| (self.evaluate)());
        *self.cache.borrow_mut() = Some(value);
        self.refreshes.update(|count| *count += 1);
        tracing::trace!(node = self.computed.id(), "paused value refreshed");
    }

    /// The observable switch driving this cell. Shared switches are
    /// returned as-is, so writing to it affects every cell sharing it.
    #[must_use]
    pub fn pause_switch(&self) -> Observable<bool> {
        self.switch.clone()
    }

    /// Graph identifier of the underlying computed.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.computed.id()
    }

    /// Detach from all sources. See [`Computed::dispose`].
    pub fn dispose(&self) {
        self.computed.dispose();
    }
}

impl<T: Clone + PartialEq + 'static> PausableComputed<T> {
    /// Register a callback invoked whenever the visible value changes.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.computed.subscribe(callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn doubled(source: &Observable<i32>, paused: impl Into<PauseSource>) -> PausableComputed<i32> {
        let source = source.clone();
        PausableComputed::new(move || source.get() * 2, paused)
    }

    #[test]
    fn running_cell_tracks_sources() {
        let source = Observable::new(1);
        let cell = doubled(&source, false);
        assert_eq!(cell.get(), 2);
        source.set(4);
        assert_eq!(cell.get(), 8);
    }

    #[test]
    fn pausing_freezes_the_value_at_the_moment_of_pausing() {
        let source = Observable::new(1);
        let cell = doubled(&source, false);
        source.set(3);
        cell.set_paused(true);
        source.set(10);
        assert_eq!(cell.get(), 6);
        assert_eq!(source.dependent_count(), 0);
    }

    #[test]
    fn resuming_reflects_current_sources() {
        let source = Observable::new(1);
        let cell = doubled(&source, false);
        cell.set_paused(true);
        source.set(5);
        cell.set_paused(false);
        assert_eq!(cell.get(), 10);
    }

    #[test]
    fn refresh_updates_once_and_stays_paused() {
        let runs = Rc::new(Cell::new(0));
        let source = Observable::new(1);
        let cell = {
            let (source, runs) = (source.clone(), Rc::clone(&runs));
            PausableComputed::new(
                move || {
                    runs.set(runs.get() + 1);
                    source.get()
                },
                true,
            )
        };
        assert_eq!(cell.get(), 1);
        source.set(2);
        let before = runs.get();
        cell.refresh();
        assert_eq!(runs.get(), before + 1);
        assert_eq!(cell.get(), 2);
        assert!(cell.is_paused());
        source.set(3);
        assert_eq!(cell.get(), 2);
    }

    #[test]
    fn refresh_is_noop_when_running() {
        let source = Observable::new(1);
        let cell = doubled(&source, false);
        assert_eq!(cell.get(), 2);
        cell.refresh();
        assert!(!cell.is_paused());
        assert_eq!(cell.get(), 2);
    }

    #[test]
    fn shared_switch_pauses_every_cell() {
        let switch = Observable::new(false);
        let source = Observable::new(1);
        let a = doubled(&source, &switch);
        let b = doubled(&source, &switch);
        assert_eq!((a.get(), b.get()), (2, 2));
        switch.set(true);
        source.set(7);
        assert_eq!((a.get(), b.get()), (2, 2));
        switch.set(false);
        assert_eq!((a.get(), b.get()), (14, 14));
    }

    #[test]
    fn writing_a_shared_switch_captures_unread_changes() {
        let switch = Observable::new(false);
        let source = Observable::new(1);
        let cell = doubled(&source, &switch);
        assert_eq!(cell.get(), 2);
        source.set(5);
        switch.set(true);
        source.set(9);
        assert_eq!(cell.get(), 10);
        switch.set(false);
        assert_eq!(cell.get(), 18);
    }

    #[test]
    fn set_paused_evaluates_once_when_pausing() {
        let runs = Rc::new(Cell::new(0));
        let source = Observable::new(1);
        let cell = {
            let (source, runs) = (source.clone(), Rc::clone(&runs));
            PausableComputed::new(
                move || {
                    runs.set(runs.get() + 1);
                    source.get()
                },
                false,
            )
        };
        assert_eq!(cell.get(), 1);
        source.set(2);
        cell.set_paused(true);
        assert_eq!(cell.get(), 2);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn debug_shows_the_pause_state() {
        let source = Observable::new(1);
        let cell = doubled(&source, true);
        assert!(format!("{cell:?}").contains("paused: true"));
    }

    #[test]
    fn paused_from_the_start_evaluates_once() {
        let source = Observable::new(4);
        let cell = doubled(&source, true);
        assert_eq!(cell.get(), 8);
        source.set(5);
        assert_eq!(cell.get(), 8);
    }

    #[test]
    fn subscribers_see_resume_but_not_paused_changes() {
        let source = Observable::new(1);
        let cell = doubled(&source, false);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _sub = {
            let seen = Rc::clone(&seen);
            cell.subscribe(move |v| seen.borrow_mut().push(*v))
        };
        cell.set_paused(true);
        source.set(2);
        source.set(3);
        cell.refresh();
        cell.set_paused(false);
        source.set(4);
        assert_eq!(*seen.borrow(), vec![6, 8]);
    }
}
