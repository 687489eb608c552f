#![forbid(unsafe_code)]

use std::cmp::Ordering;

use super::{Rule, RuleSettings};
use crate::formatting::replace_placeholders;
use crate::result::ValidationResult;
use crate::value::{Dynamic, Value};

const RANGE_MESSAGE: &str = "{name} must be between {minimum} and {maximum}.";
const RANGE_MINIMUM_MESSAGE: &str = "{name} must be at least {minimum}.";
const RANGE_MAXIMUM_MESSAGE: &str = "{name} must be at most {maximum}.";

const DURING_MESSAGE: &str = "{name} must be between {minimum} and {maximum}.";
const DURING_MINIMUM_MESSAGE: &str = "{name} must be on or after {minimum}.";
const DURING_MAXIMUM_MESSAGE: &str = "{name} must be on or before {maximum}.";

/// Passes when the value lies within inclusive bounds.
///
/// An absent (`Null`) bound is not checked; with both bounds absent every
/// value passes. An absent value, or one that cannot be compared with a
/// bound, lies outside the range.
#[derive(Debug, Clone)]
pub struct Range {
    minimum: Dynamic<Value>,
    maximum: Dynamic<Value>,
    settings: RuleSettings,
}

impl Range {
    #[must_use]
    pub fn new(minimum: impl Into<Dynamic<Value>>, maximum: impl Into<Dynamic<Value>>) -> Self {
        Self::with_settings(
            minimum.into(),
            maximum.into(),
            RuleSettings::new(RANGE_MESSAGE)
                .with_bound_messages(RANGE_MINIMUM_MESSAGE, RANGE_MAXIMUM_MESSAGE),
        )
    }

    #[must_use]
    pub fn at_least(minimum: impl Into<Dynamic<Value>>) -> Self {
        Self::new(minimum, Dynamic::absent())
    }

    #[must_use]
    pub fn at_most(maximum: impl Into<Dynamic<Value>>) -> Self {
        Self::new(Dynamic::absent(), maximum)
    }

    /// A range of dates, with date-oriented messages.
    #[must_use]
    pub fn during(earliest: impl Into<Dynamic<Value>>, latest: impl Into<Dynamic<Value>>) -> Self {
        Self::with_settings(
            earliest.into(),
            latest.into(),
            RuleSettings::new(DURING_MESSAGE)
                .with_bound_messages(DURING_MINIMUM_MESSAGE, DURING_MAXIMUM_MESSAGE),
        )
    }

    #[must_use]
    pub fn earliest(earliest: impl Into<Dynamic<Value>>) -> Self {
        Self::during(earliest, Dynamic::absent())
    }

    #[must_use]
    pub fn latest(latest: impl Into<Dynamic<Value>>) -> Self {
        Self::during(Dynamic::absent(), latest)
    }

    pub(crate) fn with_settings(
        minimum: Dynamic<Value>,
        maximum: Dynamic<Value>,
        settings: RuleSettings,
    ) -> Self {
        Self {
            minimum,
            maximum,
            settings,
        }
    }

    #[must_use]
    pub fn minimum(&self) -> Value {
        self.minimum.get()
    }

    #[must_use]
    pub fn maximum(&self) -> Value {
        self.maximum.get()
    }
}

impl Rule for Range {
    fn test(&self, value: &Value) -> ValidationResult {
        let minimum = self.minimum.get();
        let maximum = self.maximum.get();
        let have_minimum = !minimum.is_null();
        let have_maximum = !maximum.is_null();
        if !have_minimum && !have_maximum {
            return ValidationResult::PASSED;
        }

        let settings = &self.settings;
        let mut template = &settings.failure_message_format;
        let inside = if value.is_null() {
            false
        } else {
            let mut inside = true;
            if have_maximum {
                inside = matches!(
                    value.compare(&maximum),
                    Some(Ordering::Less | Ordering::Equal)
                );
            } else {
                template = &settings.failure_message_format_for_minimum_only;
            }
            if have_minimum {
                inside = inside
                    && matches!(
                        value.compare(&minimum),
                        Some(Ordering::Greater | Ordering::Equal)
                    );
            } else {
                template = &settings.failure_message_format_for_maximum_only;
            }
            inside
        };
        if inside {
            return ValidationResult::PASSED;
        }

        let minimum = settings.format_value(&minimum);
        let maximum = settings.format_value(&maximum);
        let value = settings.format_value(value);
        let message = replace_placeholders(
            template,
            &[("maximum", &maximum), ("minimum", &minimum), ("value", &value)],
        );
        tracing::trace!(%message, "range rule failed");
        ValidationResult::failed(message)
    }

    fn settings(&self) -> &RuleSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut RuleSettings {
        &mut self.settings
    }
}
