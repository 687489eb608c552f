#![forbid(unsafe_code)]

//! Validation state for a single reactive cell.
//!
//! # Evaluation order
//!
//! 1. A failed bound entry (text that could not be parsed) wins outright.
//! 2. A missing value fails when required, and otherwise reports the bound
//!    entry result without running any rule.
//! 3. Rules run in the order they were attached; the first failed or
//!    pending result is returned.
//!
//! Settings are reconfigured through the fluent methods on
//! [`PropertyValidationState`]. Every change bumps an internal version that
//! the derived values depend on, so reconfiguring after the first
//! evaluation is picked up on the next read.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use verdict_core::formatting::replace_placeholders;
use verdict_core::rules::{Custom, Expression, Length, NoneOf, OneOf, Range, Rule};
use verdict_core::{
    ConfigError, Converter, ConverterSet, Dynamic, PassThrough, ValidationResult, Value,
};
use verdict_reactive::{BatchScope, Computed, Observable, PausableComputed};

use crate::context::{ValueCell, WeakValueCell};
use crate::entry::{CheckedEntry, TextEntry};
use crate::state::{StatusFlags, UNNAMED, ValidationState};

const MISSING_MESSAGE: &str = "{name} is required.";
const INVALID_ENTRY_MESSAGE: &str = "{name} is not a valid entry.";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Options for a [`PropertyValidationState`].
pub struct PropertySettings {
    pub applicable: Dynamic<bool>,
    pub required: Dynamic<bool>,
    /// Substituted for `{name}` in messages. Left unsubstituted when `None`.
    pub name: Option<Dynamic<String>>,
    pub rules: Vec<Box<dyn Rule>>,
    pub converter: Rc<dyn Converter>,
    pub missing_test: Rc<dyn Fn(&Value) -> bool>,
    pub missing_failure_message: String,
    pub invalid_entry_failure_message: String,
    /// Format hint used when rendering the value for display and messages.
    pub value_format: Option<String>,
    /// Format hint used when rendering the value back into an input.
    pub entry_format: Option<String>,
}

impl Default for PropertySettings {
    fn default() -> Self {
        Self {
            applicable: Dynamic::Fixed(true),
            required: Dynamic::Fixed(false),
            name: None,
            rules: Vec::new(),
            converter: Rc::new(PassThrough),
            missing_test: Rc::new(Value::is_missing),
            missing_failure_message: MISSING_MESSAGE.to_string(),
            invalid_entry_failure_message: INVALID_ENTRY_MESSAGE.to_string(),
            value_format: None,
            entry_format: None,
        }
    }
}

impl fmt::Debug for PropertySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertySettings")
            .field("applicable", &self.applicable)
            .field("required", &self.required)
            .field("name", &self.name)
            .field("rules", &self.rules)
            .field("converter", &self.converter.name())
            .field("missing_failure_message", &self.missing_failure_message)
            .field(
                "invalid_entry_failure_message",
                &self.invalid_entry_failure_message,
            )
            .field("value_format", &self.value_format)
            .field("entry_format", &self.entry_format)
            .finish_non_exhaustive()
    }
}

impl PropertySettings {
    fn name_text(&self) -> Option<String> {
        self.name.as_ref().map(Dynamic::get)
    }
}

// ---------------------------------------------------------------------------
// Bound entry
// ---------------------------------------------------------------------------

/// Entry-level state written by input adapters.
#[derive(Clone, Debug)]
pub struct BoundEntry {
    focused: Observable<bool>,
    result: Observable<ValidationResult>,
    textual_input: Rc<Cell<bool>>,
}

impl BoundEntry {
    fn new() -> Self {
        Self {
            focused: Observable::new(false),
            result: Observable::new(ValidationResult::PASSED),
            textual_input: Rc::new(Cell::new(false)),
        }
    }

    #[must_use]
    pub fn focused(&self) -> &Observable<bool> {
        &self.focused
    }

    /// Outcome of interpreting the last entry.
    #[must_use]
    pub fn result(&self) -> &Observable<ValidationResult> {
        &self.result
    }

    /// Whether a text input is attached.
    #[must_use]
    pub fn is_textual_input(&self) -> bool {
        self.textual_input.get()
    }

    pub(crate) fn mark_textual_input(&self) {
        self.textual_input.set(true);
    }
}

// ---------------------------------------------------------------------------
// PropertyValidationState
// ---------------------------------------------------------------------------

/// Validation state of one reactive cell.
///
/// Handles are cheap to clone and compare by identity with
/// [`ptr_eq`](Self::ptr_eq). Create them through
/// [`ValidationContext::validatable_property`](crate::ValidationContext::validatable_property).
#[derive(Clone)]
pub struct PropertyValidationState {
    inner: Rc<PropertyInner>,
}

struct PropertyInner {
    cell: WeakValueCell,
    settings: Rc<RefCell<PropertySettings>>,
    settings_version: Observable<u64>,
    converters: ConverterSet,
    touched: Observable<bool>,
    bound_entry: BoundEntry,
    result: Computed<ValidationResult>,
    failed: Computed<bool>,
    passed: Computed<bool>,
    pending: Computed<bool>,
    message: PausableComputed<String>,
    show_message: PausableComputed<bool>,
}

impl fmt::Debug for PropertyValidationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = &self.inner;
        f.debug_struct("PropertyValidationState")
            .field("cell", &inner.cell.upgrade().map(|cell| cell.peek()))
            .field("name", &inner.settings.borrow().name_text())
            .field("touched", &inner.touched.peek())
            .field("result", &inner.result.peek())
            .finish()
    }
}

impl PropertyValidationState {
    pub(crate) fn new(cell: ValueCell, settings: PropertySettings, converters: ConverterSet) -> Self {
        let cell = cell.downgrade();
        let settings = Rc::new(RefCell::new(settings));
        let settings_version = Observable::new(0_u64);
        let touched = Observable::new(false);
        let bound_entry = BoundEntry::new();

        let result = {
            let cell = cell.clone();
            let settings = Rc::clone(&settings);
            let version = settings_version.clone();
            let entry_result = bound_entry.result.clone();
            Computed::new(move || {
                version.with(|_| ());
                let value = cell.upgrade().map_or(Value::Null, |cell| cell.get());
                evaluate_result(&value, &settings.borrow(), entry_result.get())
            })
        };
        let failed = {
            let result = result.clone();
            Computed::new(move || result.with(ValidationResult::is_failed))
        };
        let passed = {
            let result = result.clone();
            Computed::new(move || result.with(ValidationResult::is_passed))
        };
        let pending = {
            let result = result.clone();
            Computed::new(move || result.with(ValidationResult::is_pending))
        };
        let message = {
            let result = result.clone();
            let settings = Rc::clone(&settings);
            let version = settings_version.clone();
            PausableComputed::new(
                move || {
                    version.with(|_| ());
                    let name = settings.borrow().name.clone();
                    let result = result.get();
                    match name {
                        Some(name) => {
                            replace_placeholders(result.message(), &[("name", &name.get())])
                        }
                        None => result.into_message(),
                    }
                },
                false,
            )
        };
        let show_message = {
            let result = result.clone();
            let settings = Rc::clone(&settings);
            let version = settings_version.clone();
            let touched = touched.clone();
            PausableComputed::new(
                move || {
                    version.with(|_| ());
                    let applicable = settings.borrow().applicable.clone();
                    applicable.get() && touched.get() && result.with(ValidationResult::is_failed)
                },
                false,
            )
        };

        Self {
            inner: Rc::new(PropertyInner {
                cell,
                settings,
                settings_version,
                converters,
                touched,
                bound_entry,
                result,
                failed,
                passed,
                pending,
                message,
                show_message,
            }),
        }
    }

    /// Whether two handles refer to the same state.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn configure(self, f: impl FnOnce(&mut PropertySettings)) -> Self {
        f(&mut self.inner.settings.borrow_mut());
        self.inner.settings_version.update(|version| *version += 1);
        self
    }

    // -- fluent configuration ----------------------------------------------

    #[must_use]
    pub fn applicable(self, applicable: impl Into<Dynamic<bool>>) -> Self {
        let applicable = applicable.into();
        self.configure(|settings| settings.applicable = applicable)
    }

    #[must_use]
    pub fn required(self, required: impl Into<Dynamic<bool>>) -> Self {
        let required = required.into();
        self.configure(|settings| settings.required = required)
    }

    #[must_use]
    pub fn name(self, name: impl Into<Dynamic<String>>) -> Self {
        let name = name.into();
        self.configure(|settings| settings.name = Some(name))
    }

    #[must_use]
    pub fn value_format(self, format: impl Into<String>) -> Self {
        let format = format.into();
        self.configure(|settings| settings.value_format = Some(format))
    }

    #[must_use]
    pub fn entry_format(self, format: impl Into<String>) -> Self {
        let format = format.into();
        self.configure(|settings| settings.entry_format = Some(format))
    }

    /// Replace the emptiness test used for the required check.
    #[must_use]
    pub fn missing_test(self, test: impl Fn(&Value) -> bool + 'static) -> Self {
        self.configure(|settings| settings.missing_test = Rc::new(test))
    }

    #[must_use]
    pub fn missing_failure_message(self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.configure(|settings| settings.missing_failure_message = message)
    }

    #[must_use]
    pub fn invalid_entry_failure_message(self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.configure(|settings| settings.invalid_entry_failure_message = message)
    }

    #[must_use]
    pub fn converter(self, converter: Rc<dyn Converter>) -> Self {
        self.configure(|settings| settings.converter = converter)
    }

    /// Plain text entry.
    #[must_use]
    pub fn string(self) -> Self {
        let converter = Rc::clone(&self.inner.converters.pass_through);
        self.converter(converter)
    }

    #[must_use]
    pub fn date(self) -> Self {
        let converter = Rc::clone(&self.inner.converters.date);
        self.converter(converter)
    }

    #[must_use]
    pub fn email(self) -> Self {
        let converter = Rc::clone(&self.inner.converters.email);
        self.converter(converter)
    }

    #[must_use]
    pub fn number(self) -> Self {
        let converter = Rc::clone(&self.inner.converters.number);
        self.converter(converter)
    }

    /// Whole numbers, displayed with thousands separators.
    #[must_use]
    pub fn integer(self) -> Self {
        let converter = Rc::clone(&self.inner.converters.integer);
        self.numeric(converter, ",", None)
    }

    #[must_use]
    pub fn float(self) -> Self {
        let converter = Rc::clone(&self.inner.converters.float);
        self.numeric(converter, ",.", None)
    }

    #[must_use]
    pub fn currency_major(self) -> Self {
        let converter = Rc::clone(&self.inner.converters.currency_major);
        self.numeric(converter, "C,", None)
    }

    /// Currency with minor units: shown as `£1,234.50`, entered as `1234.50`.
    #[must_use]
    pub fn currency_major_minor(self) -> Self {
        let converter = Rc::clone(&self.inner.converters.currency_major_minor);
        self.numeric(converter, "C,.c", Some(".c"))
    }

    fn numeric(
        self,
        converter: Rc<dyn Converter>,
        value_format: &str,
        entry_format: Option<&str>,
    ) -> Self {
        self.configure(|settings| {
            settings.converter = converter;
            settings.value_format = Some(value_format.to_string());
            settings.entry_format = entry_format.map(str::to_string);
        })
    }

    // -- rules ---------------------------------------------------------------

    /// Append a rule. Rules run in the order they are added.
    #[must_use]
    pub fn add_rule(self, rule: impl Rule + 'static) -> Self {
        self.configure(|settings| settings.rules.push(Box::new(rule)))
    }

    /// Append a rule backed by `test`.
    #[must_use]
    pub fn rule(self, test: impl Fn(&Value) -> ValidationResult + 'static) -> Self {
        self.add_rule(Custom::new(test))
    }

    /// Replace the failure template of the most recently added rule.
    #[must_use]
    pub fn rule_message(self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.configure(|settings| {
            if let Some(rule) = settings.rules.last_mut() {
                rule.settings_mut().failure_message_format = message;
            }
        })
    }

    #[must_use]
    pub fn range(
        self,
        minimum: impl Into<Dynamic<Value>>,
        maximum: impl Into<Dynamic<Value>>,
    ) -> Self {
        self.add_rule(Range::new(minimum, maximum))
    }

    #[must_use]
    pub fn minimum(self, minimum: impl Into<Dynamic<Value>>) -> Self {
        self.add_rule(Range::at_least(minimum))
    }

    #[must_use]
    pub fn maximum(self, maximum: impl Into<Dynamic<Value>>) -> Self {
        self.add_rule(Range::at_most(maximum))
    }

    #[must_use]
    pub fn during(
        self,
        earliest: impl Into<Dynamic<Value>>,
        latest: impl Into<Dynamic<Value>>,
    ) -> Self {
        self.add_rule(Range::during(earliest, latest))
    }

    #[must_use]
    pub fn earliest(self, earliest: impl Into<Dynamic<Value>>) -> Self {
        self.add_rule(Range::earliest(earliest))
    }

    #[must_use]
    pub fn latest(self, latest: impl Into<Dynamic<Value>>) -> Self {
        self.add_rule(Range::latest(latest))
    }

    /// Bound the character count of text.
    #[must_use]
    pub fn length(
        self,
        shortest: impl Into<Dynamic<Value>>,
        longest: impl Into<Dynamic<Value>>,
    ) -> Self {
        self.add_rule(Length::string(shortest, longest))
    }

    #[must_use]
    pub fn minimum_length(self, shortest: impl Into<Dynamic<Value>>) -> Self {
        self.add_rule(Length::string_at_least(shortest))
    }

    #[must_use]
    pub fn maximum_length(self, longest: impl Into<Dynamic<Value>>) -> Self {
        self.add_rule(Length::string_at_most(longest))
    }

    /// Bound the item count of a list.
    #[must_use]
    pub fn number_of_items(
        self,
        fewest: impl Into<Dynamic<Value>>,
        most: impl Into<Dynamic<Value>>,
    ) -> Self {
        self.add_rule(Length::array(fewest, most))
    }

    #[must_use]
    pub fn minimum_number_of_items(self, fewest: impl Into<Dynamic<Value>>) -> Self {
        self.add_rule(Length::array_at_least(fewest))
    }

    #[must_use]
    pub fn maximum_number_of_items(self, most: impl Into<Dynamic<Value>>) -> Self {
        self.add_rule(Length::array_at_most(most))
    }

    #[must_use]
    pub fn one_of(self, permitted: impl Into<Dynamic<Vec<Value>>>) -> Self {
        self.add_rule(OneOf::new(permitted))
    }

    #[must_use]
    pub fn none_of(self, forbidden: impl Into<Dynamic<Vec<Value>>>) -> Self {
        self.add_rule(NoneOf::new(forbidden))
    }

    #[must_use]
    pub fn matches(self, expected: impl Into<Dynamic<Value>>) -> Self {
        self.add_rule(OneOf::matches(expected))
    }

    #[must_use]
    pub fn not(self, forbidden: impl Into<Dynamic<Value>>) -> Self {
        self.add_rule(NoneOf::not(forbidden))
    }

    /// Append a regular expression rule.
    pub fn expression(self, pattern: &str) -> Result<Self, ConfigError> {
        Ok(self.add_rule(Expression::new(pattern)?))
    }

    /// Finish configuration: every rule renders values in messages with this
    /// property's converter and value format.
    #[must_use]
    pub fn end(self) -> Self {
        self.configure(|settings| {
            let format = settings.value_format.clone();
            let formatter = Rc::clone(&settings.converter);
            for rule in &mut settings.rules {
                let rule_settings = rule.settings_mut();
                rule_settings.value_format = format.clone();
                rule_settings.value_formatter = Rc::clone(&formatter);
            }
        })
    }

    // -- readers -------------------------------------------------------------

    /// The validated cell's current value, or [`Value::Null`] once the
    /// cell has been dropped. Tracked.
    #[must_use]
    pub fn value(&self) -> Value {
        self.inner.cell.upgrade().map_or(Value::Null, |cell| cell.get())
    }

    /// The validated cell, while it still exists.
    #[must_use]
    pub fn cell(&self) -> Option<ValueCell> {
        self.inner.cell.upgrade()
    }

    pub(crate) fn cell_alive(&self) -> bool {
        self.inner.cell.is_alive()
    }

    /// The value rendered with the converter and value format. Tracked.
    #[must_use]
    pub fn formatted_value(&self) -> String {
        self.inner.settings_version.with(|_| ());
        let value = self.value();
        let settings = self.inner.settings.borrow();
        settings
            .converter
            .format(&value, settings.value_format.as_deref())
    }

    /// Whether the failure message should be displayed.
    #[must_use]
    pub fn show_message(&self) -> bool {
        self.inner.show_message.get()
    }

    #[must_use]
    pub fn is_focused(&self) -> bool {
        self.inner.bound_entry.focused.get()
    }

    #[must_use]
    pub fn bound_entry(&self) -> &BoundEntry {
        &self.inner.bound_entry
    }

    /// Snapshot of the display flags. Tracked.
    #[must_use]
    pub fn status(&self) -> StatusFlags {
        let touched = self.inner.touched.get();
        StatusFlags {
            failed: self.inner.failed.get(),
            focused: self.inner.bound_entry.focused.get(),
            passed: self.inner.passed.get(),
            pending: self.inner.pending.get(),
            touched,
            untouched: !touched,
        }
    }

    /// Read the settings. Untracked.
    pub fn with_settings<R>(&self, f: impl FnOnce(&PropertySettings) -> R) -> R {
        f(&self.inner.settings.borrow())
    }

    // -- message pausing ------------------------------------------------------

    /// Freeze `message` and `show_message` at their current values.
    pub fn pause_messages(&self) {
        let _batch = BatchScope::new();
        self.inner.message.set_paused(true);
        self.inner.show_message.set_paused(true);
    }

    pub fn resume_messages(&self) {
        let _batch = BatchScope::new();
        self.inner.message.set_paused(false);
        self.inner.show_message.set_paused(false);
    }

    #[must_use]
    pub fn messages_paused(&self) -> bool {
        self.inner.message.is_paused()
    }

    // -- entry adapters -------------------------------------------------------

    /// Attach a text input.
    pub fn text_entry(&self) -> Result<TextEntry, ConfigError> {
        let cell = self.writable_cell()?;
        self.inner.bound_entry.mark_textual_input();
        Ok(TextEntry::new(self.clone(), cell))
    }

    /// Attach a checkbox.
    pub fn checked_entry(&self) -> Result<CheckedEntry, ConfigError> {
        let cell = self.writable_cell()?;
        Ok(CheckedEntry::new(self.clone(), cell))
    }

    fn writable_cell(&self) -> Result<Observable<Value>, ConfigError> {
        self.inner
            .cell
            .upgrade()
            .and_then(|cell| cell.writable().cloned())
            .ok_or_else(|| ConfigError::ReadOnlyCell {
                name: ValidationState::display_name(self),
            })
    }

    pub(crate) fn has_name(&self) -> bool {
        self.inner.settings.borrow().name.is_some()
    }
}

impl ValidationState for PropertyValidationState {
    fn result(&self) -> ValidationResult {
        self.inner.result.get()
    }

    fn failed(&self) -> bool {
        self.inner.failed.get()
    }

    fn passed(&self) -> bool {
        self.inner.passed.get()
    }

    fn pending(&self) -> bool {
        self.inner.pending.get()
    }

    fn message(&self) -> String {
        self.inner.message.get()
    }

    fn touched(&self) -> bool {
        self.inner.touched.get()
    }

    fn set_touched(&self, touched: bool) {
        self.inner.touched.set(touched);
    }

    fn is_applicable(&self) -> bool {
        self.inner.settings_version.with(|_| ());
        let applicable = self.inner.settings.borrow().applicable.clone();
        applicable.get()
    }

    fn display_name(&self) -> String {
        self.inner.settings_version.with(|_| ());
        let name = self.inner.settings.borrow().name.clone();
        name.map_or_else(|| UNNAMED.to_string(), |name| name.get())
    }
}

fn evaluate_result(
    value: &Value,
    settings: &PropertySettings,
    entry: ValidationResult,
) -> ValidationResult {
    if entry.is_failed() {
        return entry;
    }

    if (settings.missing_test)(value) {
        if settings.required.get() {
            return ValidationResult::failed(settings.missing_failure_message.clone());
        }
        return entry;
    }

    for rule in &settings.rules {
        let result = rule.test(value);
        if !result.is_passed() {
            tracing::trace!(%result, "rule did not pass");
            return result;
        }
    }
    ValidationResult::PASSED
}
