#![forbid(unsafe_code)]

//! Input adapters: turn focus, key and blur events into state changes.
//!
//! An adapter never touches a widget. It returns the text an input should
//! show, and the caller puts it on screen.

use verdict_core::{ValidationResult, Value};
use verdict_reactive::{BatchScope, Observable};

use crate::property::PropertyValidationState;
use crate::state::ValidationState;

/// Adapter for a free-text input bound to a property.
///
/// ```rust
/// use verdict_core::{LocaleConfig, Value};
/// use verdict_reactive::Observable;
/// use verdict_state::{ValidationContext, ValidationState};
///
/// let ctx = ValidationContext::new(LocaleConfig::default())?;
/// let amount = Observable::new(Value::Null);
/// let state = ctx.validatable_property(&amount).name("Amount").integer().end();
/// let entry = state.text_entry()?;
///
/// entry.focus();
/// entry.key_up(" 1234 ");
/// assert_eq!(amount.peek(), Value::Integer(1234));
/// assert_eq!(entry.blur().as_deref(), Some("1234"));
/// assert!(state.touched());
/// # Ok::<(), verdict_core::ConfigError>(())
/// ```
#[derive(Clone, Debug)]
pub struct TextEntry {
    state: PropertyValidationState,
    cell: Observable<Value>,
}

impl TextEntry {
    pub(crate) fn new(state: PropertyValidationState, cell: Observable<Value>) -> Self {
        Self { state, cell }
    }

    #[must_use]
    pub fn state(&self) -> &PropertyValidationState {
        &self.state
    }

    /// Use `name` for messages unless the property already has a name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        if !self.state.has_name() {
            self.state = self.state.name(name.into());
        }
        self
    }

    /// The input gained focus: messages freeze until [`blur`](Self::blur).
    pub fn focus(&self) {
        let _batch = BatchScope::new();
        self.state.bound_entry().focused().set(true);
        self.state.pause_messages();
    }

    /// The input's text changed.
    ///
    /// Blank text clears the cell; it is an entry failure only when the
    /// property is required. Anything else goes through the converter, and
    /// text it rejects clears the cell and records an invalid entry.
    pub fn key_up(&self, raw: &str) {
        let entered = raw.trim();
        let (value, result) = self.state.with_settings(|settings| {
            if entered.is_empty() {
                let result = if settings.required.get() {
                    ValidationResult::failed(settings.missing_failure_message.clone())
                } else {
                    ValidationResult::PASSED
                };
                return (Value::Null, result);
            }
            match settings.converter.parse(entered) {
                Some(value) => (value, ValidationResult::PASSED),
                None => (
                    Value::Null,
                    ValidationResult::failed(settings.invalid_entry_failure_message.clone()),
                ),
            }
        });
        tracing::trace!(entered, %result, "text entry interpreted");

        let _batch = BatchScope::new();
        self.cell.set(value);
        self.state.bound_entry().result().set(result);
    }

    /// The input lost focus.
    ///
    /// Marks the property touched and releases its messages. Returns the
    /// value re-rendered with the entry format when the entry was valid, or
    /// `None` when the input should keep what the user typed.
    pub fn blur(&self) -> Option<String> {
        release_focus(&self.state);
        if self.state.bound_entry().result().peek().is_failed() {
            return None;
        }
        Some(self.render(&self.cell.peek()))
    }

    /// Text to show after the cell changed from elsewhere, or `None` while
    /// the input has focus. Reads the cell with tracking, so it can drive a
    /// subscription. Clears any entry failure, since the typed text is
    /// being replaced.
    pub fn display_text(&self) -> Option<String> {
        let value = self.cell.get();
        if self.state.bound_entry().focused().peek() {
            return None;
        }
        self.state
            .bound_entry()
            .result()
            .set(ValidationResult::PASSED);
        Some(self.render(&value))
    }

    fn render(&self, value: &Value) -> String {
        self.state.with_settings(|settings| {
            settings
                .converter
                .format(value, settings.entry_format.as_deref())
        })
    }
}

/// Adapter for a checkbox bound to a property.
#[derive(Clone, Debug)]
pub struct CheckedEntry {
    state: PropertyValidationState,
    cell: Observable<Value>,
}

impl CheckedEntry {
    pub(crate) fn new(state: PropertyValidationState, cell: Observable<Value>) -> Self {
        Self { state, cell }
    }

    #[must_use]
    pub fn state(&self) -> &PropertyValidationState {
        &self.state
    }

    /// Use `name` for messages unless the property already has a name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        if !self.state.has_name() {
            self.state = self.state.name(name.into());
        }
        self
    }

    pub fn set_checked(&self, checked: bool) {
        self.cell.set(Value::Bool(checked));
    }

    #[must_use]
    pub fn is_checked(&self) -> bool {
        self.cell.peek().as_bool().unwrap_or(false)
    }

    pub fn blur(&self) {
        release_focus(&self.state);
    }
}

fn release_focus(state: &PropertyValidationState) {
    let _batch = BatchScope::new();
    state.set_touched(true);
    state.bound_entry().focused().set(false);
    state.resume_messages();
}
