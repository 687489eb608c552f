#![forbid(unsafe_code)]

//! Setup-time configuration errors.

use std::fmt;

/// A validation setup that cannot work.
///
/// These describe programming errors caught while wiring validation up.
/// Failing user input is never reported through this type; it is a
/// [`ValidationResult`](crate::ValidationResult).
#[derive(Debug)]
pub enum ConfigError {
    /// A pattern rule was given an invalid regular expression.
    InvalidPattern {
        /// The rejected pattern text.
        pattern: String,
        /// Why the regex engine rejected it.
        source: regex::Error,
    },
    /// Numeric settings whose separators cannot be told apart.
    InvalidSeparators {
        /// Decimal separator as configured.
        decimal: char,
        /// Thousands separator as configured.
        thousands: char,
    },
    /// User entry was attached to a cell that cannot be written.
    ReadOnlyCell {
        /// Property name, or `"(?)"` when none is configured.
        name: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPattern { pattern, source } => {
                write!(f, "invalid pattern {pattern:?}: {source}")
            }
            ConfigError::InvalidSeparators { decimal, thousands } => write!(
                f,
                "decimal separator {decimal:?} and thousands separator {thousands:?} must differ and must not be digits"
            ),
            ConfigError::ReadOnlyCell { name } => {
                write!(f, "property {name} observes a computed value and cannot accept entry")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPattern { source, .. } => Some(source),
            ConfigError::InvalidSeparators { .. } => None,
            ConfigError::ReadOnlyCell { .. } => None,
        }
    }
}
