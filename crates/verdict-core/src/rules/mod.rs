#![forbid(unsafe_code)]

//! Rules: small predicates over a [`Value`] that produce a
//! [`ValidationResult`].
//!
//! Every rule carries [`RuleSettings`] holding its failure message
//! templates and the formatter used to render `{value}`, `{minimum}` and
//! `{maximum}` into them. Templates may also mention `{name}`, which rules
//! leave in place for the owning property to fill in.
//!
//! # Example
//!
//! ```rust
//! use verdict_core::rules::{Range, Rule};
//!
//! let rule = Range::new(1, 100).with_message("{value} is not between {minimum} and {maximum}");
//! assert!(rule.test(&42.into()).is_passed());
//! assert_eq!(rule.test(&0.into()).message(), "0 is not between 1 and 100");
//! ```

mod custom;
mod expression;
mod length;
mod membership;
mod range;

use std::fmt;
use std::rc::Rc;

pub use custom::Custom;
pub use expression::Expression;
pub use length::Length;
pub use membership::{NoneOf, OneOf};
pub use range::Range;

use crate::converters::{Converter, PassThrough};
use crate::formatting::replace_placeholders;
use crate::result::ValidationResult;
use crate::value::Value;

/// Message templates and value formatting shared by all rules.
#[derive(Clone)]
pub struct RuleSettings {
    /// Template used when the value fails.
    pub failure_message_format: String,
    /// Template for a range with only a minimum.
    pub failure_message_format_for_minimum_only: String,
    /// Template for a range with only a maximum.
    pub failure_message_format_for_maximum_only: String,
    /// Format hint handed to `value_formatter`.
    pub value_format: Option<String>,
    /// Renders values substituted into messages.
    pub value_formatter: Rc<dyn Converter>,
}

impl RuleSettings {
    /// Settings with a single failure template and pass-through formatting.
    #[must_use]
    pub fn new(failure_message_format: impl Into<String>) -> Self {
        Self {
            failure_message_format: failure_message_format.into(),
            failure_message_format_for_minimum_only: String::new(),
            failure_message_format_for_maximum_only: String::new(),
            value_format: None,
            value_formatter: Rc::new(PassThrough),
        }
    }

    pub(crate) fn with_bound_messages(
        mut self,
        minimum_only: impl Into<String>,
        maximum_only: impl Into<String>,
    ) -> Self {
        self.failure_message_format_for_minimum_only = minimum_only.into();
        self.failure_message_format_for_maximum_only = maximum_only.into();
        self
    }

    /// Render `value` for a message.
    #[must_use]
    pub fn format_value(&self, value: &Value) -> String {
        self.value_formatter
            .format(value, self.value_format.as_deref())
    }

    /// A failed result whose message is `template` with `{value}`
    /// substituted.
    #[must_use]
    pub fn fail_with_value(&self, template: &str, value: &Value) -> ValidationResult {
        let formatted = self.format_value(value);
        ValidationResult::failed(replace_placeholders(template, &[("value", &formatted)]))
    }
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self::new("")
    }
}

impl fmt::Debug for RuleSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSettings")
            .field("failure_message_format", &self.failure_message_format)
            .field(
                "failure_message_format_for_minimum_only",
                &self.failure_message_format_for_minimum_only,
            )
            .field(
                "failure_message_format_for_maximum_only",
                &self.failure_message_format_for_maximum_only,
            )
            .field("value_format", &self.value_format)
            .field("value_formatter", &self.value_formatter.name())
            .finish()
    }
}

/// A validation rule.
///
/// `test` must depend only on `value` and the rule's bounds as they read at
/// call time. Bounds given as [`Dynamic::Computed`](crate::Dynamic) are
/// re-read on every call.
pub trait Rule {
    fn test(&self, value: &Value) -> ValidationResult;

    fn settings(&self) -> &RuleSettings;

    fn settings_mut(&mut self) -> &mut RuleSettings;

    /// Replace the failure message template.
    #[must_use]
    fn with_message(mut self, format: impl Into<String>) -> Self
    where
        Self: Sized,
    {
        self.settings_mut().failure_message_format = format.into();
        self
    }

    /// Replace the template used when only a minimum is set.
    #[must_use]
    fn with_minimum_only_message(mut self, format: impl Into<String>) -> Self
    where
        Self: Sized,
    {
        self.settings_mut().failure_message_format_for_minimum_only = format.into();
        self
    }

    /// Replace the template used when only a maximum is set.
    #[must_use]
    fn with_maximum_only_message(mut self, format: impl Into<String>) -> Self
    where
        Self: Sized,
    {
        self.settings_mut().failure_message_format_for_maximum_only = format.into();
        self
    }

    #[must_use]
    fn with_value_format(mut self, format: impl Into<String>) -> Self
    where
        Self: Sized,
    {
        self.settings_mut().value_format = Some(format.into());
        self
    }

    #[must_use]
    fn with_value_formatter(mut self, formatter: Rc<dyn Converter>) -> Self
    where
        Self: Sized,
    {
        self.settings_mut().value_formatter = formatter;
        self
    }
}

impl fmt::Debug for dyn Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("settings", self.settings())
            .finish_non_exhaustive()
    }
}
