#![forbid(unsafe_code)]

//! End-to-end scenarios: properties, entry, nested models and summaries.

use std::cell::Cell;
use std::rc::Rc;

use tracing_subscriber::EnvFilter;
use verdict_core::rules::{OneOf, Rule};
use verdict_core::{LocaleConfig, ValidationResult, Value};
use verdict_reactive::{Computed, Observable};
use verdict_state::{
    Discovery, EntityKey, Member, Model, ModelList, ModelSettings, StateHandle, SummaryEntry,
    ValidationContext, ValidationState,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(filter)
        .try_init();
}

fn context() -> ValidationContext {
    init_tracing();
    ValidationContext::new(LocaleConfig::default()).expect("default locale is valid")
}

// ============================================================================
// Fixtures
// ============================================================================

struct Address {
    key: EntityKey,
    street: Observable<Value>,
    postcode: Observable<Value>,
}

impl Address {
    fn new() -> Self {
        Self {
            key: EntityKey::new_model(),
            street: Observable::new(Value::Null),
            postcode: Observable::new(Value::Null),
        }
    }
}

impl Model for Address {
    fn model_key(&self) -> EntityKey {
        self.key
    }

    fn members(&self) -> Vec<Member<'_>> {
        vec![
            Member::property(&self.street),
            Member::property(&self.postcode),
        ]
    }
}

struct Order {
    key: EntityKey,
    customer: Observable<Value>,
    quantity: Observable<Value>,
    delivery: Address,
    extras: ModelList<Address>,
}

impl Order {
    fn new() -> Self {
        Self {
            key: EntityKey::new_model(),
            customer: Observable::new(Value::Null),
            quantity: Observable::new(Value::Null),
            delivery: Address::new(),
            extras: ModelList::new(),
        }
    }
}

impl Model for Order {
    fn model_key(&self) -> EntityKey {
        self.key
    }

    fn members(&self) -> Vec<Member<'_>> {
        vec![
            Member::property(&self.customer),
            Member::property(&self.quantity),
            Member::composite(&self.delivery),
            Member::composite(&self.extras),
        ]
    }
}

fn validate_address(ctx: &ValidationContext, address: &Address, name: &str) {
    let _street = ctx
        .validatable_property(&address.street)
        .name("Street")
        .required(true);
    let _postcode = ctx
        .validatable_property(&address.postcode)
        .name("Postcode")
        .required(true)
        .expression(r"^[A-Z]{1,2}\d")
        .expect("valid pattern")
        .rule_message("{name} does not look like a postcode.")
        .end();
    let _model = ctx.validatable_model(
        address,
        ModelSettings {
            name: name.into(),
            discovery: Some(Discovery::MyProperties),
            ..ModelSettings::default()
        },
    );
}

// ============================================================================
// Property scenarios
// ============================================================================

#[test]
fn required_integer_in_range() {
    let ctx = context();
    let quantity = Observable::new(Value::from(""));
    let state = ctx
        .validatable_property(&quantity)
        .name("Quantity")
        .required(true)
        .missing_test(|value| value.as_str() == Some("") || value.is_null())
        .integer()
        .range(1, 100)
        .rule_message("{name}: {value} is not between {minimum} and {maximum}")
        .end();
    assert!(state.failed());
    assert_eq!(state.message(), "Quantity is required.");

    let entry = state.text_entry().expect("writable");
    entry.key_up("42");
    assert_eq!(quantity.peek(), Value::Integer(42));
    assert!(state.passed());

    entry.key_up("0");
    assert!(state.failed());
    assert_eq!(state.message(), "Quantity: 0 is not between 1 and 100");
}

#[test]
fn one_of_membership() {
    let rule = OneOf::new(["a", "b"]);
    assert!(rule.test(&Value::from("c")).is_failed());
    assert!(rule.test(&Value::from("a")).is_passed());
}

#[test]
fn dynamic_bounds_follow_other_cells() {
    let ctx = context();
    let start = Observable::new(Value::Integer(10));
    let end = Observable::new(Value::Integer(5));
    let state = {
        let start = start.clone();
        ctx.validatable_property(&end)
            .name("End")
            .minimum(verdict_core::Dynamic::computed(move || start.get()))
            .end()
    };
    assert_eq!(state.message(), "End must be at least 10.");
    start.set(Value::Integer(1));
    assert!(state.passed());
}

#[test]
fn derived_cells_are_validated_without_entry() {
    let ctx = context();
    let net = Observable::new(Value::Float(80.0));
    let gross = {
        let net = net.clone();
        Computed::new(move || Value::from(net.get().as_f64().unwrap_or_default() * 1.2))
    };
    let state = ctx
        .validatable_property(&gross)
        .name("Gross")
        .currency_major_minor()
        .maximum(100)
        .end();
    assert!(state.passed());
    net.set(Value::Float(90.0));
    assert_eq!(state.message(), "Gross must be at most £100.00.");
    assert!(state.text_entry().is_err());
}

#[test]
fn recomputes_once_per_change() {
    let ctx = context();
    let cell = Observable::new(Value::Integer(1));
    let evaluations = Rc::new(Cell::new(0));
    let state = {
        let evaluations = Rc::clone(&evaluations);
        ctx.validatable_property(&cell)
            .rule(move |_| {
                evaluations.set(evaluations.get() + 1);
                ValidationResult::PASSED
            })
            .end()
    };
    let _ = (state.result(), state.message(), state.passed(), state.failed());
    assert_eq!(evaluations.get(), 1);
    cell.set(Value::Integer(2));
    let _ = (state.result(), state.message(), state.passed(), state.failed());
    assert_eq!(evaluations.get(), 2);
}

// ============================================================================
// Model scenarios
// ============================================================================

#[test]
fn failed_pending_and_inapplicable_children() {
    let ctx = context();
    let order = Order::new();
    let _customer = ctx
        .validatable_property(&order.customer)
        .name("Customer")
        .required(true);
    let _quantity = ctx
        .validatable_property(&order.quantity)
        .name("Quantity")
        .rule(|_| ValidationResult::PENDING);
    order.quantity.set(Value::Integer(3));
    let _street = ctx
        .validatable_property(&order.delivery.street)
        .name("Street")
        .required(true)
        .applicable(false);

    let state = ctx
        .validatable_model(&order, ModelSettings::default())
        .validate_all_properties(&order);
    assert_eq!(state.validation_states().len(), 3);
    assert!(state.failed());
    assert!(!state.pending());

    state.update_summary(false);
    assert_eq!(
        state.summary(),
        vec![SummaryEntry {
            name: "Customer".into(),
            message: "Customer is required.".into(),
        }]
    );
}

#[test]
fn nested_models_aggregate_and_summarize() {
    let ctx = context();
    let order = Order::new();
    let _customer = ctx
        .validatable_property(&order.customer)
        .name("Customer")
        .required(true);
    validate_address(&ctx, &order.delivery, "Delivery address");

    let state = ctx
        .validatable_model(&order, ModelSettings::default())
        .name("Order")
        .validate_my_properties_and_sub_models(&order);
    let delivery = ctx.model_state(&order.delivery.key).expect("registered");
    assert_eq!(state.validation_states().len(), 2);

    order.customer.set(Value::from("Ada"));
    assert!(state.failed());
    state.update_summary(true);
    assert_eq!(
        state.summary(),
        vec![SummaryEntry {
            name: "Delivery address".into(),
            message: "Delivery address is not valid.".into(),
        }]
    );
    assert_eq!(delivery.summary().len(), 2);

    order.delivery.street.set(Value::from("1 High Street"));
    order.delivery.postcode.set(Value::from("12345"));
    assert!(state.failed());
    delivery.update_summary(false);
    assert_eq!(
        delivery.summary()[0].message,
        "Postcode does not look like a postcode."
    );

    order.delivery.postcode.set(Value::from("SW1A 1AA"));
    assert!(state.passed());
    state.clear_summary(true);
    assert!(state.summary().is_empty() && delivery.summary().is_empty());
}

#[test]
fn touching_a_model_reaches_nested_properties() {
    let ctx = context();
    let order = Order::new();
    validate_address(&ctx, &order.delivery, "Delivery");
    let state = ctx
        .validatable_model(&order, ModelSettings::default())
        .validate_my_sub_models(&order);
    let street = ctx.property_state(&order.delivery.street).expect("registered");

    assert!(!state.touched());
    state.set_touched(true);
    assert!(street.touched());
    assert!(street.show_message());
}

#[test]
fn sub_models_can_be_detached() {
    let ctx = context();
    let mut order = Order::new();
    order.extras.push(Address::new());
    order.extras.push(Address::new());
    for (index, address) in order.extras.iter().enumerate() {
        validate_address(&ctx, address, &format!("Extra {index}"));
    }

    let state = ctx
        .validatable_model(&order, ModelSettings::default())
        .validate_all(&order);
    let first = ctx
        .model_state(&order.extras.get(0).expect("pushed").key)
        .expect("registered");
    // two address models plus two properties each
    assert_eq!(state.validation_states().len(), 6);
    assert!(state.failed());

    let state = state.stop_validating_sub_model(&first);
    assert_eq!(state.validation_states().len(), 3);
    assert!(!state
        .validation_states()
        .contains(&StateHandle::Model(first.clone())));
}

#[test]
fn inapplicable_sub_model_is_ignored() {
    let ctx = context();
    let order = Order::new();
    validate_address(&ctx, &order.delivery, "Delivery");
    let delivery = ctx.model_state(&order.delivery.key).expect("registered");
    let same_as_billing = Observable::new(true);
    let _delivery = {
        let same_as_billing = same_as_billing.clone();
        delivery.applicable(verdict_core::Dynamic::computed(move || !same_as_billing.get()))
    };
    let state = ctx
        .validatable_model(&order, ModelSettings::default())
        .validate_my_sub_models(&order);
    assert!(state.passed());
    same_as_billing.set(false);
    assert!(state.failed());
}

#[test]
fn aggregate_drives_a_derived_flag() {
    let ctx = context();
    let order = Order::new();
    let _customer = ctx.validatable_property(&order.customer).required(true);
    let state = ctx
        .validatable_model(&order, ModelSettings::default())
        .validate_my_properties(&order);
    let can_submit = {
        let state = state.clone();
        Computed::new(move || state.passed() && !state.pending())
    };
    assert!(!can_submit.get());
    order.customer.set(Value::from("Ada"));
    assert!(can_submit.get());
}
