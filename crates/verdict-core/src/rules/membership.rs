#![forbid(unsafe_code)]

use super::{Rule, RuleSettings};
use crate::result::ValidationResult;
use crate::value::{Dynamic, Value};

const ONE_OF_MESSAGE: &str = "{name} must be one of the permitted values.";
const MATCHES_MESSAGE: &str = "{name} does not have the expected value.";
const NONE_OF_MESSAGE: &str = "{name} cannot be {value}.";

/// Passes when the value strictly equals one of the permitted values.
#[derive(Debug, Clone)]
pub struct OneOf {
    permitted: Dynamic<Vec<Value>>,
    settings: RuleSettings,
}

impl OneOf {
    #[must_use]
    pub fn new(permitted: impl Into<Dynamic<Vec<Value>>>) -> Self {
        Self {
            permitted: permitted.into(),
            settings: RuleSettings::new(ONE_OF_MESSAGE),
        }
    }

    /// Passes only for `expected`.
    #[must_use]
    pub fn matches(expected: impl Into<Dynamic<Value>>) -> Self {
        let expected: Dynamic<Value> = expected.into();
        Self {
            permitted: expected.map(|value| vec![value]),
            settings: RuleSettings::new(MATCHES_MESSAGE),
        }
    }
}

impl Rule for OneOf {
    fn test(&self, value: &Value) -> ValidationResult {
        if self.permitted.get().iter().any(|permitted| permitted == value) {
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

/// Fails when the value strictly equals one of the forbidden values.
#[derive(Debug, Clone)]
pub struct NoneOf {
    forbidden: Dynamic<Vec<Value>>,
    settings: RuleSettings,
}

impl NoneOf {
    #[must_use]
    pub fn new(forbidden: impl Into<Dynamic<Vec<Value>>>) -> Self {
        Self {
            forbidden: forbidden.into(),
            settings: RuleSettings::new(NONE_OF_MESSAGE),
        }
    }

    /// Fails only for `forbidden`.
    #[must_use]
    pub fn not(forbidden: impl Into<Dynamic<Value>>) -> Self {
        let forbidden: Dynamic<Value> = forbidden.into();
        Self {
            forbidden: forbidden.map(|value| vec![value]),
            settings: RuleSettings::new(NONE_OF_MESSAGE),
        }
    }
}

impl Rule for NoneOf {
    fn test(&self, value: &Value) -> ValidationResult {
        if self.forbidden.get().iter().any(|forbidden| forbidden == value) {
            return self
                .settings
                .fail_with_value(&self.settings.failure_message_format, value);
        }
        ValidationResult::PASSED
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
    fn one_of_uses_strict_equality() {
        let rule = OneOf::new(["a", "b"]);
        assert!(rule.test(&Value::from("a")).is_passed());
        assert!(rule.test(&Value::from("c")).is_failed());

        let numbers = OneOf::new([1, 2]);
        assert!(numbers.test(&Value::Float(2.0)).is_passed());
        assert!(numbers.test(&Value::from("2")).is_failed());
    }

    #[test]
    fn none_of_reports_the_value() {
        let rule = NoneOf::new(["admin", "root"]);
        assert!(rule.test(&Value::from("alice")).is_passed());
        assert_eq!(
            rule.test(&Value::from("root")).message(),
            "{name} cannot be root."
        );
    }

    #[test]
    fn single_value_wrappers() {
        assert!(OneOf::matches(true).test(&Value::Bool(true)).is_passed());
        assert!(OneOf::matches(true).test(&Value::Bool(false)).is_failed());
        assert!(NoneOf::not(0).test(&Value::Integer(0)).is_failed());
        assert!(NoneOf::not(0).test(&Value::Null).is_passed());
    }

    #[test]
    fn permitted_values_are_read_at_test_time() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let allowed = Rc::new(RefCell::new(vec![Value::from("x")]));
        let rule = {
            let allowed = Rc::clone(&allowed);
            OneOf::new(Dynamic::computed(move || allowed.borrow().clone()))
        };
        assert!(rule.test(&Value::from("y")).is_failed());
        allowed.borrow_mut().push(Value::from("y"));
        assert!(rule.test(&Value::from("y")).is_passed());
    }
}
