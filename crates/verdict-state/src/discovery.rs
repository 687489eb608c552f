#![forbid(unsafe_code)]

//! Discovery of the validation states inside a composite model.
//!
//! A composite declares its members through [`Model::members`]: plain
//! properties by the key of their cell, and nested composites by reference.
//! [`find_validation_states`] walks those declarations and resolves each
//! member against a [`ValidationContext`].

use std::slice;

use crate::context::{Entity, EntityKey, ValidationContext};
use crate::state::StateHandle;

/// A composite whose members can be validated.
///
/// ```rust
/// use verdict_core::Value;
/// use verdict_reactive::Observable;
/// use verdict_state::{EntityKey, Member, Model};
///
/// struct Address {
///     key: EntityKey,
///     street: Observable<Value>,
///     town: Observable<Value>,
/// }
///
/// impl Model for Address {
///     fn model_key(&self) -> EntityKey {
///         self.key
///     }
///
///     fn members(&self) -> Vec<Member<'_>> {
///         vec![Member::property(&self.street), Member::property(&self.town)]
///     }
/// }
/// ```
pub trait Model {
    /// Key under which this model's own state is registered.
    fn model_key(&self) -> EntityKey;

    /// Declared members, in a stable order.
    fn members(&self) -> Vec<Member<'_>>;
}

/// One declared member of a [`Model`].
pub enum Member<'a> {
    /// A scalar property, identified by its cell.
    Property(EntityKey),
    /// A nested composite. `key` is where its own state would be
    /// registered, if anywhere.
    Composite {
        key: Option<EntityKey>,
        model: &'a dyn Model,
    },
}

impl<'a> Member<'a> {
    #[must_use]
    pub fn property(entity: &dyn Entity) -> Self {
        Self::Property(entity.entity_key())
    }

    /// A nested model whose own state is registered under its model key.
    #[must_use]
    pub fn composite(model: &'a dyn Model) -> Self {
        Self::Composite {
            key: Some(model.model_key()),
            model,
        }
    }
}

/// An ordered collection of sub-models that is itself a model.
#[derive(Debug, Clone)]
pub struct ModelList<M> {
    key: EntityKey,
    items: Vec<M>,
}

impl<M> Default for ModelList<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> ModelList<M> {
    #[must_use]
    pub fn new() -> Self {
        Self::from_items(Vec::new())
    }

    #[must_use]
    pub fn from_items(items: Vec<M>) -> Self {
        Self {
            key: EntityKey::new_model(),
            items,
        }
    }

    pub fn push(&mut self, item: M) {
        self.items.push(item);
    }

    pub fn remove(&mut self, index: usize) -> M {
        self.items.remove(index)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&M> {
        self.items.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, M> {
        self.items.iter()
    }
}

impl<'a, M> IntoIterator for &'a ModelList<M> {
    type Item = &'a M;
    type IntoIter = slice::Iter<'a, M>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<M: Model> Model for ModelList<M> {
    fn model_key(&self) -> EntityKey {
        self.key
    }

    fn members(&self) -> Vec<Member<'_>> {
        self.items
            .iter()
            .map(|item| Member::composite(item))
            .collect()
    }
}

/// Which members a model state validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discovery {
    /// Direct properties only.
    MyProperties,
    /// Direct sub-models' own states only.
    MySubModels,
    /// Direct properties and direct sub-models' own states.
    MyPropertiesAndSubModels,
    /// Properties at every depth, flattened.
    AllProperties,
    /// Properties and sub-model states at every depth, flattened.
    All,
}

impl Discovery {
    /// Resolve the members of `model` this mode selects.
    #[must_use]
    pub fn find(self, ctx: &ValidationContext, model: &dyn Model) -> Vec<StateHandle> {
        match self {
            Self::MyProperties => find_validation_states(ctx, model, false, false),
            Self::MySubModels => find_sub_model_states(ctx, model),
            Self::MyPropertiesAndSubModels => find_validation_states(ctx, model, true, false),
            Self::AllProperties => find_validation_states(ctx, model, false, true),
            Self::All => find_validation_states(ctx, model, true, true),
        }
    }
}

/// Collect the registered states of `model`'s members.
///
/// Property members contribute their state when one is registered.
/// Composite members contribute their own state only when
/// `include_sub_models` is set, and are descended into when `recurse` is
/// set, whether or not they have a state of their own.
#[must_use]
pub fn find_validation_states(
    ctx: &ValidationContext,
    model: &dyn Model,
    include_sub_models: bool,
    recurse: bool,
) -> Vec<StateHandle> {
    let mut found = Vec::new();
    collect(ctx, model, include_sub_models, recurse, &mut found);
    tracing::debug!(
        found = found.len(),
        include_sub_models,
        recurse,
        "validation states discovered"
    );
    found
}

fn collect(
    ctx: &ValidationContext,
    model: &dyn Model,
    include_sub_models: bool,
    recurse: bool,
    found: &mut Vec<StateHandle>,
) {
    for member in model.members() {
        match member {
            Member::Property(key) => found.extend(ctx.get_validation_state(&key)),
            Member::Composite { key, model } => {
                if include_sub_models {
                    found.extend(key.and_then(|key| ctx.get_validation_state(&key)));
                }
                if recurse {
                    collect(ctx, model, include_sub_models, recurse, found);
                }
            }
        }
    }
}

fn find_sub_model_states(ctx: &ValidationContext, model: &dyn Model) -> Vec<StateHandle> {
    model
        .members()
        .into_iter()
        .filter_map(|member| match member {
            Member::Composite { key: Some(key), .. } => ctx.get_validation_state(&key),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelSettings;
    use verdict_core::{LocaleConfig, Value};
    use verdict_reactive::Observable;

    struct Leaf {
        key: EntityKey,
        value: Observable<Value>,
        ignored: Observable<Value>,
    }

    impl Leaf {
        fn new() -> Self {
            Self {
                key: EntityKey::new_model(),
                value: Observable::new(Value::Null),
                ignored: Observable::new(Value::Null),
            }
        }
    }

    impl Model for Leaf {
        fn model_key(&self) -> EntityKey {
            self.key
        }

        fn members(&self) -> Vec<Member<'_>> {
            vec![Member::property(&self.value), Member::property(&self.ignored)]
        }
    }

    struct Root {
        key: EntityKey,
        title: Observable<Value>,
        validated: Leaf,
        unvalidated: Leaf,
    }

    impl Model for Root {
        fn model_key(&self) -> EntityKey {
            self.key
        }

        fn members(&self) -> Vec<Member<'_>> {
            vec![
                Member::property(&self.title),
                Member::composite(&self.validated),
                Member::composite(&self.unvalidated),
            ]
        }
    }

    struct Fixture {
        ctx: ValidationContext,
        root: Root,
        title: StateHandle,
        validated_value: StateHandle,
        unvalidated_value: StateHandle,
        validated_model: StateHandle,
    }

    fn fixture() -> Fixture {
        let ctx = ValidationContext::new(LocaleConfig::default()).expect("default locale");
        let root = Root {
            key: EntityKey::new_model(),
            title: Observable::new(Value::Null),
            validated: Leaf::new(),
            unvalidated: Leaf::new(),
        };
        let title = ctx.validatable_property(&root.title).into();
        let validated_value = ctx.validatable_property(&root.validated.value).into();
        let unvalidated_value = ctx.validatable_property(&root.unvalidated.value).into();
        let validated_model = ctx
            .validatable_model(&root.validated, ModelSettings::default())
            .into();
        Fixture {
            ctx,
            root,
            title,
            validated_value,
            unvalidated_value,
            validated_model,
        }
    }

    #[test]
    fn my_properties() {
        let f = fixture();
        let found = find_validation_states(&f.ctx, &f.root, false, false);
        assert_eq!(found, vec![f.title.clone()]);
    }

    #[test]
    fn my_properties_and_sub_models() {
        let f = fixture();
        let found = find_validation_states(&f.ctx, &f.root, true, false);
        assert_eq!(found, vec![f.title.clone(), f.validated_model.clone()]);
    }

    #[test]
    fn all_properties_descends_into_unvalidated_composites() {
        let f = fixture();
        let found = find_validation_states(&f.ctx, &f.root, false, true);
        assert_eq!(
            found,
            vec![
                f.title.clone(),
                f.validated_value.clone(),
                f.unvalidated_value.clone()
            ]
        );
    }

    #[test]
    fn all_flattens_everything() {
        let f = fixture();
        let found = Discovery::All.find(&f.ctx, &f.root);
        assert_eq!(
            found,
            vec![
                f.title.clone(),
                f.validated_model.clone(),
                f.validated_value.clone(),
                f.unvalidated_value.clone()
            ]
        );
    }

    #[test]
    fn my_sub_models() {
        let f = fixture();
        let found = Discovery::MySubModels.find(&f.ctx, &f.root);
        assert_eq!(found, vec![f.validated_model.clone()]);
    }

    #[test]
    fn model_list_members_are_composites() {
        let ctx = ValidationContext::new(LocaleConfig::default()).expect("default locale");
        let list = ModelList::from_items(vec![Leaf::new(), Leaf::new()]);
        let first = ctx.validatable_model(&list.items[0], ModelSettings::default());
        let second_value = ctx.validatable_property(&list.items[1].value);
        assert_eq!(
            find_validation_states(&ctx, &list, true, false),
            vec![StateHandle::from(first)]
        );
        assert_eq!(
            find_validation_states(&ctx, &list, false, true),
            vec![StateHandle::from(second_value)]
        );
        assert_eq!(list.len(), 2);
    }
}
