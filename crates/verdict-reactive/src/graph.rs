#![forbid(unsafe_code)]

//! Thread-local dependency graph plumbing shared by [`Observable`] and
//! [`Computed`].
//!
//! Sources hold weak back-references to their dependents; dependents hold
//! strong references to the sources read during their last evaluation. A
//! change marks dependents dirty synchronously (push) and values are
//! recomputed on the next read (pull). Subscriber callbacks are queued and
//! run once propagation settles, so they never observe a half-updated graph.
//!
//! [`Observable`]: crate::Observable
//! [`Computed`]: crate::Computed

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of a node in the reactive graph. Unique process-wide.
pub type NodeId = u64;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_node_id() -> NodeId {
    NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Something that can be read inside a computed evaluation.
pub(crate) trait Source {
    fn node_id(&self) -> NodeId;
    fn attach(&self, id: NodeId, dependent: Weak<dyn Dependent>);
    fn detach(&self, id: NodeId);
}

/// Something that must be told when one of its sources changed.
pub(crate) trait Dependent {
    fn invalidate(&self);
}

/// Weak list of dependents, cleaned up lazily during notification.
#[derive(Default)]
pub(crate) struct Dependents {
    entries: RefCell<Vec<(NodeId, Weak<dyn Dependent>)>>,
}

impl Dependents {
    pub(crate) fn attach(&self, id: NodeId, dependent: Weak<dyn Dependent>) {
        let mut entries = self.entries.borrow_mut();
        if !entries.iter().any(|(existing, _)| *existing == id) {
            entries.push((id, dependent));
        }
    }

    pub(crate) fn detach(&self, id: NodeId) {
        self.entries.borrow_mut().retain(|(existing, _)| *existing != id);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub(crate) fn notify(&self) {
        let live: Vec<Rc<dyn Dependent>> = {
            let mut entries = self.entries.borrow_mut();
            entries.retain(|(_, weak)| weak.strong_count() > 0);
            entries.iter().filter_map(|(_, weak)| weak.upgrade()).collect()
        };
        for dependent in live {
            dependent.invalidate();
        }
    }
}

/// A subscriber callback slot. The owning [`Subscription`] keeps it alive;
/// cells only hold a weak pointer. `run` reads the cell and invokes the
/// user callback.
///
/// [`Subscription`]: crate::Subscription
pub(crate) struct SubscriberSlot {
    pub(crate) id: u64,
    pub(crate) run: Box<dyn Fn()>,
}

/// Ordered, weak list of subscriber slots.
#[derive(Default)]
pub(crate) struct Subscribers {
    slots: RefCell<Vec<Weak<SubscriberSlot>>>,
}

impl Subscribers {
    pub(crate) fn add(&self, run: impl Fn() + 'static) -> Rc<SubscriberSlot> {
        let slot = Rc::new(SubscriberSlot {
            id: next_node_id(),
            run: Box::new(run),
        });
        self.slots.borrow_mut().push(Rc::downgrade(&slot));
        slot
    }

    pub(crate) fn len(&self) -> usize {
        self.slots
            .borrow()
            .iter()
            .filter(|slot| slot.strong_count() > 0)
            .count()
    }

    /// Queue every live slot for the next flush.
    pub(crate) fn schedule_all(&self) {
        let live: Vec<Rc<SubscriberSlot>> = {
            let mut slots = self.slots.borrow_mut();
            slots.retain(|slot| slot.strong_count() > 0);
            slots.iter().filter_map(Weak::upgrade).collect()
        };
        for slot in live {
            let weak = Rc::downgrade(&slot);
            schedule(slot.id, move || {
                if let Some(slot) = weak.upgrade() {
                    (slot.run)();
                }
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Dependency tracking
// ---------------------------------------------------------------------------

struct Frame {
    ignore: bool,
    sources: Vec<Rc<dyn Source>>,
}

thread_local! {
    static FRAMES: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
    static BATCH_DEPTH: Cell<usize> = const { Cell::new(0) };
    static FLUSHING: Cell<bool> = const { Cell::new(false) };
    static PENDING: RefCell<Vec<PendingEffect>> = const { RefCell::new(Vec::new()) };
}

/// Pops the tracking frame even if the evaluation unwinds.
struct FrameGuard;

impl Drop for FrameGuard {
    fn drop(&mut self) {
        FRAMES.with(|frames| {
            frames.borrow_mut().pop();
        });
    }
}

/// Record `source` as a dependency of the computed currently evaluating.
pub(crate) fn track(source: Rc<dyn Source>) {
    FRAMES.with(|frames| {
        let mut frames = frames.borrow_mut();
        let Some(frame) = frames.last_mut() else {
            return;
        };
        if frame.ignore {
            return;
        }
        let id = source.node_id();
        if !frame.sources.iter().any(|existing| existing.node_id() == id) {
            frame.sources.push(source);
        }
    });
}

/// Run `f`, collecting every source it reads.
pub(crate) fn collect_sources<R>(f: impl FnOnce() -> R) -> (R, Vec<Rc<dyn Source>>) {
    FRAMES.with(|frames| {
        frames.borrow_mut().push(Frame {
            ignore: false,
            sources: Vec::new(),
        });
    });
    let guard = FrameGuard;
    let value = f();
    let sources = FRAMES.with(|frames| {
        frames
            .borrow_mut()
            .last_mut()
            .map(|frame| std::mem::take(&mut frame.sources))
            .unwrap_or_default()
    });
    drop(guard);
    (value, sources)
}

/// Run `f` without registering any dependency on the enclosing computed.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    FRAMES.with(|frames| {
        frames.borrow_mut().push(Frame {
            ignore: true,
            sources: Vec::new(),
        });
    });
    let _guard = FrameGuard;
    f()
}

// ---------------------------------------------------------------------------
// Deferred subscriber callbacks
// ---------------------------------------------------------------------------

struct PendingEffect {
    key: u64,
    run: Box<dyn FnOnce()>,
}

/// Queue a subscriber callback. A slot already queued in this settling is
/// not queued twice.
pub(crate) fn schedule(key: u64, run: impl FnOnce() + 'static) {
    PENDING.with(|pending| {
        let mut pending = pending.borrow_mut();
        if pending.iter().any(|effect| effect.key == key) {
            return;
        }
        pending.push(PendingEffect {
            key,
            run: Box::new(run),
        });
    });
}

/// Run queued callbacks unless a batch is open or a flush is in progress.
pub(crate) fn flush() {
    if BATCH_DEPTH.with(Cell::get) > 0 || FLUSHING.with(Cell::get) {
        return;
    }
    FLUSHING.with(|flag| flag.set(true));
    let _reset = FlushGuard;
    loop {
        let effects = PENDING.with(|pending| std::mem::take(&mut *pending.borrow_mut()));
        if effects.is_empty() {
            break;
        }
        tracing::trace!(count = effects.len(), "running subscriber callbacks");
        for effect in effects {
            (effect.run)();
        }
    }
}

struct FlushGuard;

impl Drop for FlushGuard {
    fn drop(&mut self) {
        FLUSHING.with(|flag| flag.set(false));
    }
}

pub(crate) fn enter_batch() {
    BATCH_DEPTH.with(|depth| depth.set(depth.get() + 1));
}

pub(crate) fn exit_batch() {
    let remaining = BATCH_DEPTH.with(|depth| {
        let next = depth.get().saturating_sub(1);
        depth.set(next);
        next
    });
    if remaining == 0 {
        flush();
    }
}
