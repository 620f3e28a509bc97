//! Comparing values across registered types.

use std::cmp::Ordering;

use pretty_assertions::assert_eq;
use quill::registry::SyntaxRegistration;
use quill::types::{Data, Relation, Value};

use crate::common::runtime;

fn value(runtime: &quill::Runtime, ty: &str, data: Data) -> Value {
    let id = runtime.catalog().read().types().type_id(ty).unwrap();
    Value::new(id, data)
}

#[test]
fn number_and_text_compare_through_the_converter() {
    let runtime = runtime();
    let five = value(&runtime, "number", Data::Integer(5));
    let text = value(&runtime, "text", Data::text("5"));
    let other = value(&runtime, "text", Data::text("6"));

    assert_eq!(runtime.compare(Some(&five), Some(&text)), Relation::Equal);
    assert_eq!(runtime.compare(Some(&text), Some(&five)), Relation::Equal);
    assert_eq!(runtime.compare(Some(&five), Some(&other)), Relation::NotEqual);
}

#[test]
fn missing_operands_are_not_equal() {
    let runtime = runtime();
    let five = value(&runtime, "number", Data::Integer(5));
    assert_eq!(runtime.compare(None, Some(&five)), Relation::NotEqual);
    assert_eq!(runtime.compare(Some(&five), None), Relation::NotEqual);
    assert_eq!(runtime.compare(None, None), Relation::NotEqual);
}

#[test]
fn same_type_falls_back_to_equality() {
    let runtime = runtime();
    let a = value(&runtime, "number", Data::Integer(3));
    let b = value(&runtime, "number", Data::Integer(3));
    let c = value(&runtime, "number", Data::Integer(4));
    assert_eq!(runtime.compare(Some(&a), Some(&b)), Relation::Equal);
    assert_eq!(runtime.compare(Some(&a), Some(&c)), Relation::NotEqual);

    // Equality alone does not order.
    let state = runtime.catalog().read();
    assert_eq!(state.types().ordering(&a, &c), None);
}

#[test]
fn registered_comparator_orders_and_inverts() {
    let runtime = runtime();
    let mut registration = SyntaxRegistration::new("ordering");
    registration.add_comparator("number", "text", true, |n, t| {
        let parsed = t.as_text().and_then(|t| t.parse::<i64>().ok());
        match (n.as_integer(), parsed) {
            (Some(n), Some(t)) => Relation::from_ordering(n.cmp(&t)),
            _ => Relation::NotEqual,
        }
    });
    assert!(runtime.register(registration).unwrap().is_empty());

    let two = value(&runtime, "number", Data::Integer(2));
    let ten = value(&runtime, "text", Data::text("10"));
    let forward = runtime.compare(Some(&two), Some(&ten));
    let backward = runtime.compare(Some(&ten), Some(&two));
    assert_eq!(forward, Relation::Smaller);
    assert_eq!(forward.inverse(), backward);

    let state = runtime.catalog().read();
    assert_eq!(state.types().ordering(&two, &ten), Some(Ordering::Less));
}

#[test]
fn late_converters_are_picked_up() {
    let runtime = runtime();
    let mut first = SyntaxRegistration::new("labels");
    first.add_type("label", "label¦s");
    runtime.register(first).unwrap();

    let label = value(&runtime, "label", Data::text("x"));
    let text = value(&runtime, "text", Data::text("x"));
    assert_eq!(runtime.compare(Some(&label), Some(&text)), Relation::NotEqual);

    let mut second = SyntaxRegistration::new("labels");
    second.add_converter("label", "text", |v| v.as_text().map(Data::text));
    runtime.register(second).unwrap();
    assert_eq!(runtime.compare(Some(&label), Some(&text)), Relation::Equal);
}
