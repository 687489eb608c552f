#![forbid(unsafe_code)]

use std::fmt;
use std::rc::Rc;

use super::{Rule, RuleSettings};
use crate::result::ValidationResult;
use crate::value::Value;

/// A rule backed by a user-supplied function.
///
/// When a failure message template is configured (for example through
/// [`Rule::with_message`]), it replaces the message of failed results.
#[derive(Clone)]
pub struct Custom {
    test: Rc<dyn Fn(&Value) -> ValidationResult>,
    settings: RuleSettings,
}

impl Custom {
    #[must_use]
    pub fn new(test: impl Fn(&Value) -> ValidationResult + 'static) -> Self {
        Self {
            test: Rc::new(test),
            settings: RuleSettings::default(),
        }
    }

    /// Fails with `message` when `predicate` returns `false`.
    #[must_use]
    pub fn predicate(
        predicate: impl Fn(&Value) -> bool + 'static,
        message: impl Into<String>,
    ) -> Self {
        Self {
            test: Rc::new(move |value| {
                if predicate(value) {
                    ValidationResult::PASSED
                } else {
                    ValidationResult::failed("")
                }
            }),
            settings: RuleSettings::new(message),
        }
    }
}

impl fmt::Debug for Custom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Custom")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Rule for Custom {
    fn test(&self, value: &Value) -> ValidationResult {
        let result = (self.test)(value);
        if result.is_failed() && !self.settings.failure_message_format.is_empty() {
            return self
                .settings
                .fail_with_value(&self.settings.failure_message_format, value);
        }
        result
    }

    fn settings(&self) -> &RuleSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut RuleSettings {
        &mut self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_result_is_returned() {
        let rule = Custom::new(|value| {
            if value.as_f64().is_some_and(|n| n > 0.0) {
                ValidationResult::PASSED
            } else {
                ValidationResult::PENDING
            }
        });
        assert!(rule.test(&Value::Integer(1)).is_passed());
        assert!(rule.test(&Value::Integer(-1)).is_pending());
    }

    #[test]
    fn predicate_uses_its_message() {
        let rule = Custom::predicate(|value| value.as_str() != Some("x"), "{value} is taken");
        assert_eq!(rule.test(&Value::from("x")).message(), "x is taken");
    }

    #[test]
    fn configured_message_overrides_failures() {
        let rule = Custom::new(|_| ValidationResult::failed("raw")).with_message("nope");
        assert_eq!(rule.test(&Value::Null).message(), "nope");
    }
}
