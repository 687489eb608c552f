#![forbid(unsafe_code)]

//! verdict public facade crate.
//!
//! Re-exports the reactive cells, the leaf validation types and the
//! property/model validation states, and offers a prelude for day-to-day
//! use.
//!
//! ```rust
//! use verdict::prelude::*;
//!
//! fn main() -> verdict::Result<()> {
//!     let ctx = ValidationContext::new(LocaleConfig::default())?;
//!     let email = Observable::new(Value::Null);
//!     let state = ctx
//!         .validatable_property(&email)
//!         .name("Email")
//!         .required(true)
//!         .email()
//!         .end();
//!
//!     let entry = state.text_entry()?;
//!     entry.key_up("someone@example");
//!     assert_eq!(state.message(), "Email is not a valid entry.");
//!     entry.key_up("Someone@Example.com");
//!     assert!(state.passed());
//!     Ok(())
//! }
//! ```

use std::fmt;

// --- Reactive re-exports ----------------------------------------------------

pub use verdict_reactive::{
    BatchScope, Computed, ComputedOptions, Observable, PausableComputed, PauseSource,
    Subscription, WeakComputed, WeakObservable, batch, untracked,
};

// --- Core re-exports --------------------------------------------------------

pub use verdict_core::{
    ConfigError, Converter, ConverterSet, Dynamic, LocaleConfig, NumericHelper, NumericSettings,
    ResultState, ValidationResult, Value,
};

// --- State re-exports -------------------------------------------------------

pub use verdict_state::{
    CheckedEntry, Discovery, Entity, EntityKey, Member, Model, ModelList, ModelSettings,
    ModelValidationState, PropertySettings, PropertyValidationState, StateHandle, StatusFlags,
    SummaryEntry, TextEntry, ValidationContext, ValidationState, ValueCell, WeakValueCell,
};

// --- Errors -----------------------------------------------------------------

/// Top-level error type for verdict setups.
#[derive(Debug)]
pub enum Error {
    /// Validation was configured in a way that cannot work.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "configuration error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Standard result type for verdict APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude ----------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Computed, Discovery, Dynamic, EntityKey, Error, LocaleConfig, Member, Model,
        ModelSettings, Observable, Result, ValidationContext, ValidationResult, ValidationState,
        Value,
    };

    pub use crate::{core, reactive, rules, state};
}

pub use verdict_core as core;
pub use verdict_core::rules;
pub use verdict_reactive as reactive;
pub use verdict_state as state;
