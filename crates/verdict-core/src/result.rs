#![forbid(unsafe_code)]

//! The tri-state outcome of validating a value.

use std::fmt;

/// Which of the three outcomes a [`ValidationResult`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResultState {
    Failed,
    Passed,
    Pending,
}

/// An immutable validation outcome with an optional message.
///
/// Exactly one of [`is_failed`](Self::is_failed),
/// [`is_passed`](Self::is_passed) and [`is_pending`](Self::is_pending) is
/// true for any result.
///
/// ```rust
/// use verdict_core::ValidationResult;
///
/// let result = ValidationResult::failed("{name} is required.");
/// assert!(result.is_failed());
/// assert_eq!(result.message(), "{name} is required.");
/// assert!(ValidationResult::PASSED.is_passed());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValidationResult {
    state: ResultState,
    message: String,
}

impl ValidationResult {
    /// The shared passed result, with an empty message.
    pub const PASSED: Self = Self {
        state: ResultState::Passed,
        message: String::new(),
    };

    /// The shared pending result, with an empty message.
    pub const PENDING: Self = Self {
        state: ResultState::Pending,
        message: String::new(),
    };

    #[must_use]
    pub fn new(state: ResultState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
        }
    }

    /// A failure carrying `message`.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(ResultState::Failed, message)
    }

    #[must_use]
    pub fn passed() -> Self {
        Self::PASSED
    }

    #[must_use]
    pub fn pending() -> Self {
        Self::PENDING
    }

    #[must_use]
    pub fn state(&self) -> ResultState {
        self.state
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn into_message(self) -> String {
        self.message
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.state == ResultState::Failed
    }

    #[must_use]
    pub fn is_passed(&self) -> bool {
        self.state == ResultState::Passed
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state == ResultState::Pending
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::PASSED
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.state {
            ResultState::Failed => "failed",
            ResultState::Passed => "passed",
            ResultState::Pending => "pending",
        };
        if self.message.is_empty() {
            f.write_str(label)
        } else {
            write!(f, "{label}: {}", self.message)
        }
    }
}
