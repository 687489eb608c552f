#![forbid(unsafe_code)]

//! Aggregate validation state for a composite model.
//!
//! A model state holds an explicit, ordered list of child states and
//! derives its outcome from the applicable ones: failed if any fails,
//! otherwise pending if any is pending, otherwise passed. The outcome is a
//! [`PausableComputed`], so a whole subtree can be frozen during bulk
//! edits. The failure summary is a snapshot taken on request.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use verdict_core::formatting::replace_placeholders;
use verdict_core::{Dynamic, ValidationResult};
use verdict_reactive::{
    BatchScope, Computed, Observable, PausableComputed, PauseSource, untracked,
};

use crate::context::{EntityKey, WeakContext};
use crate::discovery::{Discovery, Model};
use crate::state::{StateHandle, SummaryEntry, UNNAMED, ValidationState};

const FAILURE_MESSAGE: &str = "{name} is not valid.";

/// Options for a [`ModelValidationState`].
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub applicable: Dynamic<bool>,
    pub name: Dynamic<String>,
    /// Message of the failed result. `{name}` is filled in by `message`.
    pub failure_message_format: String,
    /// Initial pause state, or a switch shared with other cells.
    pub paused: PauseSource,
    /// Members to validate as soon as the state is created.
    pub discovery: Option<Discovery>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            applicable: Dynamic::Fixed(true),
            name: Dynamic::Fixed(UNNAMED.to_string()),
            failure_message_format: FAILURE_MESSAGE.to_string(),
            paused: PauseSource::default(),
            discovery: None,
        }
    }
}

/// Validation state aggregating child states.
///
/// ```rust
/// use verdict_core::{LocaleConfig, Value};
/// use verdict_reactive::Observable;
/// use verdict_state::{
///     Discovery, EntityKey, Member, Model, ModelSettings, ValidationContext, ValidationState,
/// };
///
/// struct Login {
///     key: EntityKey,
///     user: Observable<Value>,
///     password: Observable<Value>,
/// }
///
/// impl Model for Login {
///     fn model_key(&self) -> EntityKey {
///         self.key
///     }
///
///     fn members(&self) -> Vec<Member<'_>> {
///         vec![Member::property(&self.user), Member::property(&self.password)]
///     }
/// }
///
/// let ctx = ValidationContext::new(LocaleConfig::default())?;
/// let login = Login {
///     key: EntityKey::new_model(),
///     user: Observable::new(Value::Null),
///     password: Observable::new(Value::Null),
/// };
/// let _user = ctx.validatable_property(&login.user).name("User").required(true);
/// let _password = ctx.validatable_property(&login.password).name("Password").required(true);
/// let form = ctx
///     .validatable_model(&login, ModelSettings::default())
///     .validate_my_properties(&login);
///
/// assert!(form.failed());
/// form.update_summary(false);
/// assert_eq!(form.summary().len(), 2);
///
/// login.user.set(Value::from("ada"));
/// login.password.set(Value::from("secret"));
/// assert!(form.passed());
/// # Ok::<(), verdict_core::ConfigError>(())
/// ```
#[derive(Clone)]
pub struct ModelValidationState {
    inner: Rc<ModelInner>,
}

struct ModelInner {
    key: EntityKey,
    settings: Rc<RefCell<ModelSettings>>,
    settings_version: Observable<u64>,
    states: Observable<Vec<StateHandle>>,
    summary: Observable<Vec<SummaryEntry>>,
    failed_states: Computed<Vec<StateHandle>>,
    pending_states: Computed<Vec<StateHandle>>,
    result: PausableComputed<ValidationResult>,
    failed: Computed<bool>,
    passed: Computed<bool>,
    pending: Computed<bool>,
    message: Computed<String>,
    touched: Computed<bool>,
    context: WeakContext,
}

impl fmt::Debug for ModelValidationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = &self.inner;
        f.debug_struct("ModelValidationState")
            .field("key", &inner.key)
            .field("name", &inner.settings.borrow().name.get())
            .field("states", &inner.states.with_untracked(Vec::len))
            .field("paused", &inner.result.pause_switch().peek())
            .finish()
    }
}

impl ModelValidationState {
    pub(crate) fn new(key: EntityKey, settings: ModelSettings, context: WeakContext) -> Self {
        let paused = settings.paused.clone();
        let settings = Rc::new(RefCell::new(settings));
        let settings_version = Observable::new(0_u64);
        let states: Observable<Vec<StateHandle>> = Observable::new(Vec::new());

        let failed_states = {
            let states = states.clone();
            Computed::new(move || {
                states
                    .get()
                    .into_iter()
                    .filter(|state| state.is_applicable() && state.failed())
                    .collect::<Vec<_>>()
            })
        };
        let pending_states = {
            let states = states.clone();
            Computed::new(move || {
                states
                    .get()
                    .into_iter()
                    .filter(|state| state.is_applicable() && state.pending())
                    .collect::<Vec<_>>()
            })
        };
        let result = {
            let failed_states = failed_states.clone();
            let pending_states = pending_states.clone();
            let settings = Rc::clone(&settings);
            let version = settings_version.clone();
            PausableComputed::new(
                move || {
                    version.with(|_| ());
                    if !failed_states.with(Vec::is_empty) {
                        let format = settings.borrow().failure_message_format.clone();
                        return ValidationResult::failed(format);
                    }
                    if !pending_states.with(Vec::is_empty) {
                        return ValidationResult::PENDING;
                    }
                    ValidationResult::PASSED
                },
                paused,
            )
        };
        let failed = {
            let result = result.clone();
            Computed::new(move || result.get().is_failed())
        };
        let passed = {
            let result = result.clone();
            Computed::new(move || result.get().is_passed())
        };
        let pending = {
            let result = result.clone();
            Computed::new(move || result.get().is_pending())
        };
        let message = {
            let result = result.clone();
            let settings = Rc::clone(&settings);
            let version = settings_version.clone();
            Computed::new(move || {
                version.with(|_| ());
                let name = settings.borrow().name.clone();
                replace_placeholders(result.get().message(), &[("name", &name.get())])
            })
        };
        let touched = {
            let states = states.clone();
            Computed::new(move || states.get().iter().any(ValidationState::touched))
        };

        Self {
            inner: Rc::new(ModelInner {
                key,
                settings,
                settings_version,
                states,
                summary: Observable::new(Vec::new()),
                failed_states,
                pending_states,
                result,
                failed,
                passed,
                pending,
                message,
                touched,
                context,
            }),
        }
    }

    /// Whether two handles refer to the same state.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Registry key of the model this state validates.
    #[must_use]
    pub fn key(&self) -> EntityKey {
        self.inner.key
    }

    fn configure(self, f: impl FnOnce(&mut ModelSettings)) -> Self {
        f(&mut self.inner.settings.borrow_mut());
        self.inner.settings_version.update(|version| *version += 1);
        self
    }

    #[must_use]
    pub fn applicable(self, applicable: impl Into<Dynamic<bool>>) -> Self {
        let applicable = applicable.into();
        self.configure(|settings| settings.applicable = applicable)
    }

    #[must_use]
    pub fn name(self, name: impl Into<Dynamic<String>>) -> Self {
        let name = name.into();
        self.configure(|settings| settings.name = name)
    }

    #[must_use]
    pub fn failure_message_format(self, format: impl Into<String>) -> Self {
        let format = format.into();
        self.configure(|settings| settings.failure_message_format = format)
    }

    // -- membership -----------------------------------------------------------

    /// Child states, in order. Tracked.
    #[must_use]
    pub fn validation_states(&self) -> Vec<StateHandle> {
        self.inner.states.get()
    }

    /// Append states not already present.
    #[must_use]
    pub fn add_validation_states(self, states: impl IntoIterator<Item = StateHandle>) -> Self {
        let mut current = self.inner.states.peek();
        let before = current.len();
        for state in states {
            if !current.contains(&state) {
                current.push(state);
            }
        }
        let added = current.len() - before;
        if added > 0 {
            tracing::debug!(model = ?self.inner.key, added, "validation states added");
            self.inner.states.set(current);
        }
        self
    }

    #[must_use]
    pub fn remove_validation_states(self, states: &[StateHandle]) -> Self {
        let mut current = self.inner.states.peek();
        let before = current.len();
        current.retain(|state| !states.contains(state));
        let removed = before - current.len();
        if removed > 0 {
            tracing::debug!(model = ?self.inner.key, removed, "validation states removed");
            self.inner.states.set(current);
        }
        self
    }

    /// Stop validating `sub_model`: removes its own state and every state
    /// it validates.
    #[must_use]
    pub fn stop_validating_sub_model(self, sub_model: &ModelValidationState) -> Self {
        let mut removed = sub_model.inner.states.peek();
        removed.push(StateHandle::Model(sub_model.clone()));
        self.remove_validation_states(&removed)
    }

    /// Failed applicable children. Tracked.
    #[must_use]
    pub fn failed_states(&self) -> Vec<StateHandle> {
        self.inner.failed_states.get()
    }

    /// Pending applicable children. Tracked.
    #[must_use]
    pub fn pending_states(&self) -> Vec<StateHandle> {
        self.inner.pending_states.get()
    }

    // -- discovery ------------------------------------------------------------

    /// Add the members of `model` selected by `discovery`.
    #[must_use]
    pub fn discover(self, model: &dyn Model, discovery: Discovery) -> Self {
        let Some(ctx) = self.inner.context.upgrade() else {
            tracing::warn!(model = ?self.inner.key, "validation context dropped; nothing discovered");
            return self;
        };
        let found = discovery.find(&ctx, model);
        self.add_validation_states(found)
    }

    #[must_use]
    pub fn validate_my_properties(self, model: &dyn Model) -> Self {
        self.discover(model, Discovery::MyProperties)
    }

    #[must_use]
    pub fn validate_my_sub_models(self, model: &dyn Model) -> Self {
        self.discover(model, Discovery::MySubModels)
    }

    #[must_use]
    pub fn validate_my_properties_and_sub_models(self, model: &dyn Model) -> Self {
        self.discover(model, Discovery::MyPropertiesAndSubModels)
    }

    #[must_use]
    pub fn validate_all_properties(self, model: &dyn Model) -> Self {
        self.discover(model, Discovery::AllProperties)
    }

    #[must_use]
    pub fn validate_all(self, model: &dyn Model) -> Self {
        self.discover(model, Discovery::All)
    }

    // -- summary --------------------------------------------------------------

    /// Failing children captured by the last [`update_summary`](Self::update_summary).
    /// Tracked.
    #[must_use]
    pub fn summary(&self) -> Vec<SummaryEntry> {
        self.inner.summary.get()
    }

    /// Snapshot the failed applicable children into the summary. With
    /// `include_sub_models`, child models update theirs the same way.
    pub fn update_summary(&self, include_sub_models: bool) -> &Self {
        let (entries, children) = untracked(|| {
            let entries: Vec<SummaryEntry> = self
                .inner
                .failed_states
                .get()
                .iter()
                .map(|state| SummaryEntry {
                    name: state.display_name(),
                    message: state.message(),
                })
                .collect();
            (entries, self.inner.states.get())
        });
        tracing::debug!(model = ?self.inner.key, failures = entries.len(), "summary updated");

        let _batch = BatchScope::new();
        self.inner.summary.set(entries);
        if include_sub_models {
            for child in children.iter().filter_map(StateHandle::as_model) {
                child.update_summary(true);
            }
        }
        self
    }

    /// Empty the summary, and with `include_sub_models` every child
    /// model's summary.
    pub fn clear_summary(&self, include_sub_models: bool) -> &Self {
        let _batch = BatchScope::new();
        self.inner.summary.set(Vec::new());
        if include_sub_models {
            for child in self.inner.states.peek().iter().filter_map(StateHandle::as_model) {
                child.clear_summary(true);
            }
        }
        self
    }

    // -- pausing --------------------------------------------------------------

    /// Whether the aggregate result is frozen. Tracked.
    #[must_use]
    pub fn paused(&self) -> bool {
        self.inner.result.is_paused()
    }

    pub fn set_paused(&self, paused: bool) {
        self.inner.result.set_paused(paused);
    }

    /// Recompute the frozen result once without resuming.
    pub fn refresh(&self) {
        self.inner.result.refresh();
    }
}

impl ValidationState for ModelValidationState {
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

    /// Writes `touched` to every child.
    fn set_touched(&self, touched: bool) {
        let _batch = BatchScope::new();
        for state in self.inner.states.peek() {
            state.set_touched(touched);
        }
    }

    fn is_applicable(&self) -> bool {
        self.inner.settings_version.with(|_| ());
        let applicable = self.inner.settings.borrow().applicable.clone();
        applicable.get()
    }

    fn display_name(&self) -> String {
        self.inner.settings_version.with(|_| ());
        let name = self.inner.settings.borrow().name.clone();
        name.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ValidationContext;
    use crate::discovery::Member;
    use verdict_core::{LocaleConfig, Value};
    use verdict_reactive::Observable;

    struct Pair {
        key: EntityKey,
        first: Observable<Value>,
        second: Observable<Value>,
    }

    impl Pair {
        fn new() -> Self {
            Self {
                key: EntityKey::new_model(),
                first: Observable::new(Value::Null),
                second: Observable::new(Value::Null),
            }
        }
    }

    impl Model for Pair {
        fn model_key(&self) -> EntityKey {
            self.key
        }

        fn members(&self) -> Vec<Member<'_>> {
            vec![Member::property(&self.first), Member::property(&self.second)]
        }
    }

    fn context() -> ValidationContext {
        ValidationContext::new(LocaleConfig::default()).expect("default locale is valid")
    }

    #[test]
    fn empty_model_passes() {
        let ctx = context();
        let pair = Pair::new();
        let state = ctx.validatable_model(&pair, ModelSettings::default());
        assert!(state.passed());
        assert!(!state.touched());
        assert_eq!(state.display_name(), UNNAMED);
    }

    #[test]
    fn failure_outranks_pending() {
        let ctx = context();
        let pair = Pair::new();
        let _first = ctx.validatable_property(&pair.first).required(true);
        let _second = ctx
            .validatable_property(&pair.second)
            .rule(|_| ValidationResult::PENDING);
        pair.second.set(Value::from("x"));
        let state = ctx
            .validatable_model(&pair, ModelSettings::default())
            .name("Pair")
            .validate_my_properties(&pair);
        assert!(state.failed());
        assert!(!state.pending());
        assert_eq!(state.message(), "Pair is not valid.");
        assert_eq!(state.pending_states().len(), 1);

        pair.first.set(Value::from("y"));
        assert!(state.pending());
        assert_eq!(state.result(), ValidationResult::PENDING);
    }

    #[test]
    fn inapplicable_children_are_ignored() {
        let ctx = context();
        let pair = Pair::new();
        let first = ctx
            .validatable_property(&pair.first)
            .required(true)
            .applicable(false);
        let state = ctx
            .validatable_model(&pair, ModelSettings::default())
            .validate_my_properties(&pair);
        assert!(first.failed());
        assert!(state.passed());
        assert!(state.failed_states().is_empty());
    }

    #[test]
    fn touched_reads_any_and_writes_all() {
        let ctx = context();
        let pair = Pair::new();
        let first = ctx.validatable_property(&pair.first);
        let second = ctx.validatable_property(&pair.second);
        let state = ctx
            .validatable_model(&pair, ModelSettings::default())
            .validate_my_properties(&pair);
        second.set_touched(true);
        assert!(state.touched());
        state.set_touched(true);
        assert!(first.touched() && second.touched());
        state.set_touched(false);
        assert!(!first.touched() && !second.touched() && !state.touched());
    }

    #[test]
    fn duplicates_are_ignored_and_removal_works() {
        let ctx = context();
        let pair = Pair::new();
        let first: StateHandle = ctx.validatable_property(&pair.first).into();
        let state = ctx
            .validatable_model(&pair, ModelSettings::default())
            .validate_my_properties(&pair)
            .validate_my_properties(&pair)
            .add_validation_states([first.clone()]);
        assert_eq!(state.validation_states(), vec![first.clone()]);
        let state = state.remove_validation_states(&[first]);
        assert!(state.validation_states().is_empty());
    }

    #[test]
    fn summary_is_a_snapshot() {
        let ctx = context();
        let pair = Pair::new();
        let _first = ctx
            .validatable_property(&pair.first)
            .name("First")
            .required(true);
        let state = ctx
            .validatable_model(&pair, ModelSettings::default())
            .validate_my_properties(&pair);
        assert!(state.summary().is_empty());
        state.update_summary(false);
        assert_eq!(
            state.summary(),
            vec![SummaryEntry {
                name: "First".into(),
                message: "First is required.".into(),
            }]
        );
        pair.first.set(Value::from("ok"));
        assert_eq!(state.summary().len(), 1);
        state.clear_summary(false);
        assert!(state.summary().is_empty());
    }

    #[test]
    fn paused_model_holds_its_result() {
        let ctx = context();
        let pair = Pair::new();
        let _first = ctx.validatable_property(&pair.first).required(true);
        let state = ctx
            .validatable_model(
                &pair,
                ModelSettings {
                    discovery: Some(Discovery::MyProperties),
                    ..ModelSettings::default()
                },
            );
        assert!(state.failed());
        state.set_paused(true);
        pair.first.set(Value::from("filled"));
        assert!(state.failed());
        state.refresh();
        assert!(state.passed());
        assert!(state.paused());
        pair.first.set(Value::Null);
        assert!(state.passed());
        state.set_paused(false);
        assert!(state.failed());
    }

    #[test]
    fn shared_pause_switch() {
        let ctx = context();
        let switch = Observable::new(false);
        let a = Pair::new();
        let b = Pair::new();
        let _a_first = ctx.validatable_property(&a.first).required(true);
        let _b_first = ctx.validatable_property(&b.first).required(true);
        let settings = || ModelSettings {
            paused: PauseSource::from(&switch),
            discovery: Some(Discovery::MyProperties),
            ..ModelSettings::default()
        };
        let state_a = ctx.validatable_model(&a, settings());
        let state_b = ctx.validatable_model(&b, settings());
        assert!(state_a.failed() && state_b.failed());

        switch.set(true);
        a.first.set(Value::from("1"));
        b.first.set(Value::from("2"));
        assert!(state_a.failed() && state_b.failed());
        switch.set(false);
        assert!(state_a.passed() && state_b.passed());
    }

    #[test]
    fn shared_switch_freezes_changes_made_before_it_flips() {
        let ctx = context();
        let switch = Observable::new(false);
        let pair = Pair::new();
        let _first = ctx.validatable_property(&pair.first).required(true);
        let state = ctx.validatable_model(
            &pair,
            ModelSettings {
                paused: PauseSource::from(&switch),
                discovery: Some(Discovery::MyProperties),
                ..ModelSettings::default()
            },
        );
        assert!(state.failed());

        pair.first.set(Value::from("filled"));
        switch.set(true);
        pair.first.set(Value::Null);
        assert!(state.passed());
        switch.set(false);
        assert!(state.failed());
    }
}
