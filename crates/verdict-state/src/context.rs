#![forbid(unsafe_code)]

//! The validation context: the side table from validated entities to their
//! validation states, and the converters those states share.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use verdict_core::{ConfigError, ConverterSet, LocaleConfig, Value};
use verdict_reactive::{Computed, NodeId, Observable, WeakComputed, WeakObservable};

use crate::discovery::{Model, find_validation_states};
use crate::model::{ModelSettings, ModelValidationState};
use crate::property::{PropertySettings, PropertyValidationState};
use crate::state::StateHandle;

static NEXT_MODEL_ID: AtomicU64 = AtomicU64::new(1);

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Identity of something that can carry a validation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKey {
    /// A reactive cell, by graph node id.
    Cell(NodeId),
    /// A composite model.
    Model(u64),
}

impl EntityKey {
    /// Allocate a fresh key for a model.
    #[must_use]
    pub fn new_model() -> Self {
        Self::Model(NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Anything with an [`EntityKey`].
pub trait Entity {
    fn entity_key(&self) -> EntityKey;
}

impl Entity for EntityKey {
    fn entity_key(&self) -> EntityKey {
        *self
    }
}

impl<T: 'static> Entity for Observable<T> {
    fn entity_key(&self) -> EntityKey {
        EntityKey::Cell(self.id())
    }
}

impl<T: 'static> Entity for Computed<T> {
    fn entity_key(&self) -> EntityKey {
        EntityKey::Cell(self.id())
    }
}

/// The reactive cell a property validates.
#[derive(Clone, Debug)]
pub enum ValueCell {
    /// Writable; accepts user entry.
    Observable(Observable<Value>),
    /// Derived; validated but never written.
    Computed(Computed<Value>),
}

impl ValueCell {
    /// Current value, registering a dependency.
    #[must_use]
    pub fn get(&self) -> Value {
        match self {
            Self::Observable(cell) => cell.get(),
            Self::Computed(cell) => cell.get(),
        }
    }

    #[must_use]
    pub fn peek(&self) -> Value {
        match self {
            Self::Observable(cell) => cell.peek(),
            Self::Computed(cell) => cell.peek(),
        }
    }

    /// The writable cell, if there is one.
    #[must_use]
    pub fn writable(&self) -> Option<&Observable<Value>> {
        match self {
            Self::Observable(cell) => Some(cell),
            Self::Computed(_) => None,
        }
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakValueCell {
        match self {
            Self::Observable(cell) => WeakValueCell::Observable(cell.downgrade()),
            Self::Computed(cell) => WeakValueCell::Computed(cell.downgrade()),
        }
    }
}

/// Non-owning handle to a [`ValueCell`]. Validation states refer to their
/// cells through this, so validating a cell never extends its lifetime.
#[derive(Clone, Debug)]
pub enum WeakValueCell {
    Observable(WeakObservable<Value>),
    Computed(WeakComputed<Value>),
}

impl WeakValueCell {
    #[must_use]
    pub fn upgrade(&self) -> Option<ValueCell> {
        match self {
            Self::Observable(cell) => cell.upgrade().map(ValueCell::Observable),
            Self::Computed(cell) => cell.upgrade().map(ValueCell::Computed),
        }
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.upgrade().is_some()
    }
}

impl Entity for WeakValueCell {
    fn entity_key(&self) -> EntityKey {
        match self {
            Self::Observable(cell) => EntityKey::Cell(cell.id()),
            Self::Computed(cell) => EntityKey::Cell(cell.id()),
        }
    }
}

impl Entity for ValueCell {
    fn entity_key(&self) -> EntityKey {
        match self {
            Self::Observable(cell) => cell.entity_key(),
            Self::Computed(cell) => cell.entity_key(),
        }
    }
}

impl From<Observable<Value>> for ValueCell {
    fn from(cell: Observable<Value>) -> Self {
        Self::Observable(cell)
    }
}

impl From<&Observable<Value>> for ValueCell {
    fn from(cell: &Observable<Value>) -> Self {
        Self::Observable(cell.clone())
    }
}

impl From<Computed<Value>> for ValueCell {
    fn from(cell: Computed<Value>) -> Self {
        Self::Computed(cell)
    }
}

impl From<&Computed<Value>> for ValueCell {
    fn from(cell: &Computed<Value>) -> Self {
        Self::Computed(cell.clone())
    }
}

// ---------------------------------------------------------------------------
// ValidationContext
// ---------------------------------------------------------------------------

/// Owns the entity → state table and the converters states are built with.
///
/// Cloning yields another handle to the same table. Registering a state for
/// an entity that already has one replaces it. Property states whose cell
/// has been dropped are released the next time the table is modified or
/// counted; model states stay registered until [`release`](Self::release)d.
///
/// # Example
///
/// ```rust
/// use verdict_core::{LocaleConfig, Value};
/// use verdict_reactive::Observable;
/// use verdict_state::{ValidationContext, ValidationState};
///
/// let ctx = ValidationContext::new(LocaleConfig::default())?;
/// let age = Observable::new(Value::Null);
/// let state = ctx
///     .validatable_property(&age)
///     .name("Age")
///     .required(true)
///     .integer()
///     .range(18, 130)
///     .missing_failure_message("{name} is required.")
///     .end();
///
/// assert_eq!(state.message(), "Age is required.");
/// age.set(Value::Integer(30));
/// assert!(state.passed());
/// assert!(ctx.has_validation_state(&age));
/// # Ok::<(), verdict_core::ConfigError>(())
/// ```
#[derive(Clone)]
pub struct ValidationContext {
    inner: Rc<ContextInner>,
}

struct ContextInner {
    states: RefCell<HashMap<EntityKey, StateHandle>>,
    converters: ConverterSet,
    locale: LocaleConfig,
}

/// Non-owning handle to a [`ValidationContext`].
#[derive(Clone, Default)]
pub struct WeakContext {
    inner: Weak<ContextInner>,
}

impl WeakContext {
    #[must_use]
    pub fn upgrade(&self) -> Option<ValidationContext> {
        self.inner.upgrade().map(|inner| ValidationContext { inner })
    }
}

impl fmt::Debug for WeakContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakContext")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl fmt::Debug for ValidationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationContext")
            .field("locale", &self.inner.locale.locale)
            .field("states", &self.inner.states.borrow().len())
            .finish()
    }
}

impl ValidationContext {
    /// Create a context whose converters follow `locale`.
    pub fn new(locale: LocaleConfig) -> Result<Self, ConfigError> {
        let converters = ConverterSet::new(&locale)?;
        tracing::debug!(locale = %locale.locale, "validation context created");
        Ok(Self {
            inner: Rc::new(ContextInner {
                states: RefCell::new(HashMap::new()),
                converters,
                locale,
            }),
        })
    }

    /// Create a context for the locale detected from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(LocaleConfig::from_env())
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakContext {
        WeakContext {
            inner: Rc::downgrade(&self.inner),
        }
    }

    #[must_use]
    pub fn converters(&self) -> &ConverterSet {
        &self.inner.converters
    }

    #[must_use]
    pub fn locale(&self) -> &LocaleConfig {
        &self.inner.locale
    }

    /// Make `cell` validatable with default settings.
    pub fn validatable_property(&self, cell: impl Into<ValueCell>) -> PropertyValidationState {
        self.validatable_property_with(cell, PropertySettings::default())
    }

    /// Make `cell` validatable with `settings`.
    pub fn validatable_property_with(
        &self,
        cell: impl Into<ValueCell>,
        settings: PropertySettings,
    ) -> PropertyValidationState {
        let cell = cell.into();
        let key = cell.entity_key();
        let state = PropertyValidationState::new(cell, settings, self.inner.converters.clone());
        self.set_validation_state(&key, state.clone().into());
        state
    }

    /// Make `model` validatable. A discovery mode in `settings` is applied
    /// immediately.
    pub fn validatable_model(
        &self,
        model: &dyn Model,
        settings: ModelSettings,
    ) -> ModelValidationState {
        let key = model.model_key();
        let discovery = settings.discovery;
        let state = ModelValidationState::new(key, settings, self.downgrade());
        self.set_validation_state(&key, state.clone().into());
        match discovery {
            Some(discovery) => state.discover(model, discovery),
            None => state,
        }
    }

    #[must_use]
    pub fn get_validation_state(&self, entity: &dyn Entity) -> Option<StateHandle> {
        self.inner.states.borrow().get(&entity.entity_key()).cloned()
    }

    #[must_use]
    pub fn has_validation_state(&self, entity: &dyn Entity) -> bool {
        self.inner.states.borrow().contains_key(&entity.entity_key())
    }

    /// The property state registered for `entity`, if it is one.
    #[must_use]
    pub fn property_state(&self, entity: &dyn Entity) -> Option<PropertyValidationState> {
        self.get_validation_state(entity)
            .and_then(|state| state.as_property().cloned())
    }

    /// The model state registered for `entity`, if it is one.
    #[must_use]
    pub fn model_state(&self, entity: &dyn Entity) -> Option<ModelValidationState> {
        self.get_validation_state(entity)
            .and_then(|state| state.as_model().cloned())
    }

    /// Register `state` for `entity`, replacing any earlier registration.
    pub fn set_validation_state(&self, entity: &dyn Entity, state: StateHandle) {
        self.prune();
        let key = entity.entity_key();
        let previous = self.inner.states.borrow_mut().insert(key, state);
        if previous.is_some() {
            tracing::warn!(?key, "validation state replaced");
        } else {
            tracing::debug!(?key, "validation state registered");
        }
    }

    /// Drop the registration for `entity`.
    pub fn release(&self, entity: &dyn Entity) -> Option<StateHandle> {
        let key = entity.entity_key();
        let removed = self.inner.states.borrow_mut().remove(&key);
        if removed.is_some() {
            tracing::debug!(?key, "validation state released");
        }
        removed
    }

    /// Number of registered states.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prune();
        self.inner.states.borrow().len()
    }

    /// Release property states whose cell no longer exists. Returns how
    /// many were released.
    pub fn prune(&self) -> usize {
        let mut states = self.inner.states.borrow_mut();
        let before = states.len();
        states.retain(|_, state| {
            state
                .as_property()
                .is_none_or(PropertyValidationState::cell_alive)
        });
        let released = before - states.len();
        if released > 0 {
            tracing::debug!(released, "validation states of dropped cells released");
        }
        released
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// See [`find_validation_states`].
    #[must_use]
    pub fn find_validation_states(
        &self,
        model: &dyn Model,
        include_sub_models: bool,
        recurse: bool,
    ) -> Vec<StateHandle> {
        find_validation_states(self, model, include_sub_models, recurse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ValidationState;

    fn context() -> ValidationContext {
        ValidationContext::new(LocaleConfig::default()).expect("default locale is valid")
    }

    #[test]
    fn registration_is_keyed_by_cell() {
        let ctx = context();
        let a = Observable::new(Value::Null);
        let b = Observable::new(Value::Null);
        let state = ctx.validatable_property(&a);
        assert!(ctx.has_validation_state(&a));
        assert!(!ctx.has_validation_state(&b));
        assert_eq!(
            ctx.get_validation_state(&a),
            Some(StateHandle::Property(state))
        );
    }

    #[test]
    fn last_registration_wins() {
        let ctx = context();
        let cell = Observable::new(Value::Null);
        let first = ctx.validatable_property(&cell);
        let second = ctx.validatable_property(&cell);
        let registered = ctx.property_state(&cell).expect("registered");
        assert!(registered.ptr_eq(&second));
        assert!(!registered.ptr_eq(&first));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn release_forgets_the_entity() {
        let ctx = context();
        let cell = Observable::new(Value::Null);
        let _state = ctx.validatable_property(&cell);
        assert!(ctx.release(&cell).is_some());
        assert!(ctx.is_empty());
        assert!(ctx.release(&cell).is_none());
    }

    #[test]
    fn dropping_a_cell_releases_its_state() {
        struct DropFlag(Rc<std::cell::Cell<bool>>);

        impl Drop for DropFlag {
            fn drop(&mut self) {
                self.0.set(true);
            }
        }

        let ctx = context();
        let dropped = Rc::new(std::cell::Cell::new(false));
        let kept = Observable::new(Value::Null);
        let _kept_state = ctx.validatable_property(&kept).required(true);
        let state = {
            let flag = DropFlag(Rc::clone(&dropped));
            let derived = Computed::new(move || {
                let _ = &flag;
                Value::Integer(1)
            });
            let state = ctx.validatable_property(&derived).minimum(2).end();
            assert!(state.failed());
            assert_eq!(ctx.len(), 2);
            state
        };

        assert!(dropped.get());
        assert!(state.cell().is_none());
        assert_eq!(state.value(), Value::Null);
        assert_eq!(ctx.len(), 1);
        assert!(ctx.has_validation_state(&kept));
    }

    #[test]
    fn model_keys_are_unique() {
        assert_ne!(EntityKey::new_model(), EntityKey::new_model());
    }

    #[test]
    fn weak_context_does_not_keep_the_table_alive() {
        let weak = context().downgrade();
        assert!(weak.upgrade().is_none());
    }
}
