#![forbid(unsafe_code)]

//! Reactive validation states for properties and composite models.
//!
//! A [`ValidationContext`] maps reactive cells and models to their
//! validation states. Property states combine the required check, entry
//! failures and ordered rules into a [`ValidationResult`]; model states
//! aggregate their applicable children. Every reader is dependency tracked,
//! so a [`Computed`] built over these states stays current by itself.
//!
//! # Example
//!
//! ```rust
//! use verdict_core::{LocaleConfig, Value};
//! use verdict_reactive::{Computed, Observable};
//! use verdict_state::{ValidationContext, ValidationState};
//!
//! let ctx = ValidationContext::new(LocaleConfig::default())?;
//! let quantity = Observable::new(Value::from("0"));
//! let state = ctx
//!     .validatable_property(&quantity)
//!     .name("Quantity")
//!     .integer()
//!     .range(1, 100)
//!     .end();
//!
//! let banner = {
//!     let state = state.clone();
//!     Computed::new(move || state.message())
//! };
//! quantity.set(Value::Integer(0));
//! assert_eq!(banner.get(), "Quantity must be between 1 and 100.");
//! quantity.set(Value::Integer(42));
//! assert_eq!(banner.get(), "");
//! # Ok::<(), verdict_core::ConfigError>(())
//! ```
//!
//! [`ValidationResult`]: verdict_core::ValidationResult
//! [`Computed`]: verdict_reactive::Computed

pub mod context;
pub mod discovery;
pub mod entry;
pub mod model;
pub mod property;
pub mod state;

pub use context::{Entity, EntityKey, ValidationContext, ValueCell, WeakContext, WeakValueCell};
pub use discovery::{Discovery, Member, Model, ModelList, find_validation_states};
pub use entry::{CheckedEntry, TextEntry};
pub use model::{ModelSettings, ModelValidationState};
pub use property::{BoundEntry, PropertySettings, PropertyValidationState};
pub use state::{StateHandle, StatusFlags, SummaryEntry, UNNAMED, ValidationState};
