#![forbid(unsafe_code)]

use regex::Regex;

use super::{Rule, RuleSettings};
use crate::error::ConfigError;
use crate::result::ValidationResult;
use crate::value::Value;

const EXPRESSION_MESSAGE: &str = "{name} is not in the expected format.";

/// Passes when the value's text form matches a regular expression.
///
/// `Null` never matches. Other values are matched against their
/// [`Display`](std::fmt::Display) form.
#[derive(Debug, Clone)]
pub struct Expression {
    pattern: Regex,
    settings: RuleSettings,
}

impl Expression {
    /// Compile `pattern`.
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let compiled = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self::from_regex(compiled))
    }

    #[must_use]
    pub fn from_regex(pattern: Regex) -> Self {
        Self {
            pattern,
            settings: RuleSettings::new(EXPRESSION_MESSAGE),
        }
    }

    #[must_use]
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }
}

impl Rule for Expression {
    fn test(&self, value: &Value) -> ValidationResult {
        let matched = match value {
            Value::Null => false,
            Value::Text(text) => self.pattern.is_match(text),
            other => self.pattern.is_match(&other.to_string()),
        };
        if matched {
            return ValidationResult::PASSED;
        }
        self.settings
            .fail_with_value(&self.settings.failure_message_format, value)
    }

    fn settings(&self) -> &RuleSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut RuleSettings {
        &mut self.settings
    }
}
