#![forbid(unsafe_code)]

//! Single-threaded reactive cells for verdict.
//!
//! # Primitives
//!
//! - [`Observable`]: a shared, version-tracked value cell.
//! - [`Computed`]: a lazily evaluated value derived from other cells, with
//!   automatic dependency tracking.
//! - [`PausableComputed`]: a computed whose recomputation can be frozen and
//!   refreshed on demand.
//! - [`Subscription`]: RAII guard for change callbacks.
//! - [`BatchScope`] / [`batch`]: defer callbacks until a group of writes
//!   has settled.
//!
//! # Invariants
//!
//! 1. An observable's version increments exactly once per applied change.
//! 2. `Observable::set` with a value equal to the current one is a no-op.
//! 3. Subscribers are notified in registration order, after dirty marking
//!    has reached every dependent.
//! 4. A dropped [`Subscription`] is never invoked again.
//! 5. `Computed::get` never returns a stale value, and a computed evaluates
//!    at most once per settling of its sources.
//! 6. Reading a computed from inside its own evaluation panics.
//! 7. A computed holds its sources weakly; only handles and closures keep
//!    cells alive.
//!
//! All state is thread-local; none of these types are `Send`.

mod graph;

pub mod batch;
pub mod computed;
pub mod observable;
pub mod pausable;

pub use batch::{BatchScope, batch};
pub use computed::{Computed, ComputedOptions, WeakComputed};
pub use graph::{NodeId, untracked};
pub use observable::{Observable, Subscription, WeakObservable};
pub use pausable::{PausableComputed, PauseSource};
