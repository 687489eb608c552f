#![forbid(unsafe_code)]

//! The interface shared by property and model validation states.

use std::fmt;

use verdict_core::ValidationResult;

use crate::model::ModelValidationState;
use crate::property::PropertyValidationState;

/// Name reported by states that have none configured.
pub const UNNAMED: &str = "(?)";

/// Reactive view of one validation state.
///
/// Every reader registers a dependency when called inside a
/// [`Computed`](verdict_reactive::Computed) evaluation.
pub trait ValidationState {
    fn result(&self) -> ValidationResult;

    fn failed(&self) -> bool {
        self.result().is_failed()
    }

    fn passed(&self) -> bool {
        self.result().is_passed()
    }

    fn pending(&self) -> bool {
        self.result().is_pending()
    }

    /// The failure message with `{name}` filled in.
    fn message(&self) -> String;

    fn touched(&self) -> bool;

    fn set_touched(&self, touched: bool);

    /// Whether this state currently takes part in validation.
    fn is_applicable(&self) -> bool;

    /// Configured name, or [`UNNAMED`].
    fn display_name(&self) -> String;
}

/// A registered validation state of either kind. Compared by identity.
#[derive(Clone)]
pub enum StateHandle {
    Property(PropertyValidationState),
    Model(ModelValidationState),
}

impl StateHandle {
    #[must_use]
    pub fn as_property(&self) -> Option<&PropertyValidationState> {
        match self {
            Self::Property(state) => Some(state),
            Self::Model(_) => None,
        }
    }

    #[must_use]
    pub fn as_model(&self) -> Option<&ModelValidationState> {
        match self {
            Self::Property(_) => None,
            Self::Model(state) => Some(state),
        }
    }

    fn as_state(&self) -> &dyn ValidationState {
        match self {
            Self::Property(state) => state,
            Self::Model(state) => state,
        }
    }
}

impl ValidationState for StateHandle {
    fn result(&self) -> ValidationResult {
        self.as_state().result()
    }

    fn failed(&self) -> bool {
        self.as_state().failed()
    }

    fn passed(&self) -> bool {
        self.as_state().passed()
    }

    fn pending(&self) -> bool {
        self.as_state().pending()
    }

    fn message(&self) -> String {
        self.as_state().message()
    }

    fn touched(&self) -> bool {
        self.as_state().touched()
    }

    fn set_touched(&self, touched: bool) {
        self.as_state().set_touched(touched);
    }

    fn is_applicable(&self) -> bool {
        self.as_state().is_applicable()
    }

    fn display_name(&self) -> String {
        self.as_state().display_name()
    }
}

impl PartialEq for StateHandle {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Property(a), Self::Property(b)) => a.ptr_eq(b),
            (Self::Model(a), Self::Model(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Eq for StateHandle {}

impl fmt::Debug for StateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property(state) => f.debug_tuple("Property").field(state).finish(),
            Self::Model(state) => f.debug_tuple("Model").field(state).finish(),
        }
    }
}

impl From<PropertyValidationState> for StateHandle {
    fn from(state: PropertyValidationState) -> Self {
        Self::Property(state)
    }
}

impl From<ModelValidationState> for StateHandle {
    fn from(state: ModelValidationState) -> Self {
        Self::Model(state)
    }
}

/// One failing child captured by a model summary.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SummaryEntry {
    pub name: String,
    pub message: String,
}

/// Snapshot of a property's display flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusFlags {
    pub failed: bool,
    pub focused: bool,
    pub passed: bool,
    pub pending: bool,
    pub touched: bool,
    pub untouched: bool,
}
