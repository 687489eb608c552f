#![forbid(unsafe_code)]

use super::{Range, Rule, RuleSettings};
use crate::result::ValidationResult;
use crate::value::{Dynamic, Value};

const STRING_MESSAGE: &str = "{name} must be between {minimum} and {maximum} characters long.";
const STRING_MINIMUM_MESSAGE: &str = "{name} must be at least {minimum} characters long.";
const STRING_MAXIMUM_MESSAGE: &str = "{name} must be at most {maximum} characters long.";

const ARRAY_MESSAGE: &str = "{name} must have between {minimum} and {maximum} items.";
const ARRAY_MINIMUM_MESSAGE: &str = "{name} must have at least {minimum} items.";
const ARRAY_MAXIMUM_MESSAGE: &str = "{name} must have at most {maximum} items.";

/// A [`Range`] over the value's length: characters for text, items for
/// lists. Values without a length fail any bound.
#[derive(Debug, Clone)]
pub struct Length {
    range: Range,
}

impl Length {
    /// Text length between `shortest` and `longest` characters.
    #[must_use]
    pub fn string(shortest: impl Into<Dynamic<Value>>, longest: impl Into<Dynamic<Value>>) -> Self {
        Self::with_messages(
            shortest.into(),
            longest.into(),
            STRING_MESSAGE,
            STRING_MINIMUM_MESSAGE,
            STRING_MAXIMUM_MESSAGE,
        )
    }

    #[must_use]
    pub fn string_at_least(shortest: impl Into<Dynamic<Value>>) -> Self {
        Self::string(shortest, Dynamic::absent())
    }

    #[must_use]
    pub fn string_at_most(longest: impl Into<Dynamic<Value>>) -> Self {
        Self::string(Dynamic::absent(), longest)
    }

    /// List length between `fewest` and `most` items.
    #[must_use]
    pub fn array(fewest: impl Into<Dynamic<Value>>, most: impl Into<Dynamic<Value>>) -> Self {
        Self::with_messages(
            fewest.into(),
            most.into(),
            ARRAY_MESSAGE,
            ARRAY_MINIMUM_MESSAGE,
            ARRAY_MAXIMUM_MESSAGE,
        )
    }

    #[must_use]
    pub fn array_at_least(fewest: impl Into<Dynamic<Value>>) -> Self {
        Self::array(fewest, Dynamic::absent())
    }

    #[must_use]
    pub fn array_at_most(most: impl Into<Dynamic<Value>>) -> Self {
        Self::array(Dynamic::absent(), most)
    }

    fn with_messages(
        minimum: Dynamic<Value>,
        maximum: Dynamic<Value>,
        message: &str,
        minimum_only: &str,
        maximum_only: &str,
    ) -> Self {
        let settings = RuleSettings::new(message).with_bound_messages(minimum_only, maximum_only);
        Self {
            range: Range::with_settings(minimum, maximum, settings),
        }
    }
}

impl Rule for Length {
    fn test(&self, value: &Value) -> ValidationResult {
        let length = value.length().map_or(Value::Null, |len| Value::Integer(len as i64));
        self.range.test(&length)
    }

    fn settings(&self) -> &RuleSettings {
        self.range.settings()
    }

    fn settings_mut(&mut self) -> &mut RuleSettings {
        self.range.settings_mut()
    }
}
