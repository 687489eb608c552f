//! Property tests: model aggregation agrees with a direct computation over
//! its children.

use proptest::prelude::*;
use verdict_core::{LocaleConfig, ResultState, ValidationResult, Value};
use verdict_reactive::Observable;
use verdict_state::{
    EntityKey, Member, Model, ModelSettings, PropertyValidationState, ValidationContext,
    ValidationState,
};

struct Flat {
    key: EntityKey,
    cells: Vec<Observable<Value>>,
}

impl Model for Flat {
    fn model_key(&self) -> EntityKey {
        self.key
    }

    fn members(&self) -> Vec<Member<'_>> {
        self.cells.iter().map(|cell| Member::property(cell)).collect()
    }
}

fn outcome() -> impl Strategy<Value = ResultState> {
    prop_oneof![
        Just(ResultState::Failed),
        Just(ResultState::Passed),
        Just(ResultState::Pending),
    ]
}

fn result_for(state: ResultState) -> ValidationResult {
    ValidationResult::new(state, if state == ResultState::Failed { "bad" } else { "" })
}

fn expected(children: &[(bool, ResultState)]) -> ResultState {
    let applicable = || children.iter().filter(|(applicable, _)| *applicable);
    if applicable().any(|(_, state)| *state == ResultState::Failed) {
        ResultState::Failed
    } else if applicable().any(|(_, state)| *state == ResultState::Pending) {
        ResultState::Pending
    } else {
        ResultState::Passed
    }
}

proptest! {
    #[test]
    fn aggregate_matches_reference(
        initial in proptest::collection::vec((any::<bool>(), outcome()), 0..8),
        changes in proptest::collection::vec((any::<prop::sample::Index>(), outcome()), 0..8),
    ) {
        let ctx = ValidationContext::new(LocaleConfig::default()).expect("default locale");
        let model = Flat {
            key: EntityKey::new_model(),
            cells: initial.iter().map(|_| Observable::new(Value::Integer(1))).collect(),
        };
        let outcomes: Vec<Observable<ValidationResult>> = initial
            .iter()
            .map(|(_, state)| Observable::new(result_for(*state)))
            .collect();
        let _states: Vec<PropertyValidationState> = initial
            .iter()
            .zip(&model.cells)
            .zip(&outcomes)
            .map(|(((applicable, _), cell), outcome)| {
                let outcome = outcome.clone();
                ctx.validatable_property(cell)
                    .applicable(*applicable)
                    .rule(move |_| outcome.get())
            })
            .collect();
        let state = ctx
            .validatable_model(&model, ModelSettings::default())
            .validate_my_properties(&model);

        let mut children = initial.clone();
        prop_assert_eq!(state.result().state(), expected(&children));
        prop_assert_eq!(
            state.failed_states().len(),
            children.iter().filter(|(a, s)| *a && *s == ResultState::Failed).count()
        );

        if children.is_empty() {
            return Ok(());
        }
        for (index, next) in changes {
            let index = index.index(children.len());
            children[index].1 = next;
            outcomes[index].set(result_for(next));
            prop_assert_eq!(state.result().state(), expected(&children));
        }
    }

    #[test]
    fn touched_is_any_child_touched(touches in proptest::collection::vec(any::<bool>(), 1..8)) {
        let ctx = ValidationContext::new(LocaleConfig::default()).expect("default locale");
        let model = Flat {
            key: EntityKey::new_model(),
            cells: touches.iter().map(|_| Observable::new(Value::Null)).collect(),
        };
        let states: Vec<PropertyValidationState> = model
            .cells
            .iter()
            .map(|cell| ctx.validatable_property(cell))
            .collect();
        let state = ctx
            .validatable_model(&model, ModelSettings::default())
            .validate_my_properties(&model);
        for (child, touched) in states.iter().zip(&touches) {
            child.set_touched(*touched);
        }
        prop_assert_eq!(state.touched(), touches.iter().any(|t| *t));
        state.set_touched(true);
        prop_assert!(states.iter().all(ValidationState::touched));
    }
}
