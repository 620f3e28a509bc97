use super::*;
use crate::{ConverterFn, ConverterOptions, Data, TypeDecl};
use pretty_assertions::assert_eq;

struct Fixture {
    types: TypeRegistry,
    converters: ConverterRegistry,
    comparators: ComparatorRegistry,
    number: TypeId,
    text: TypeId,
    boolean: TypeId,
}

impl Fixture {
    fn new() -> Self {
        let mut types = TypeRegistry::new();
        let number = types.register(TypeDecl::new("number", "number¦s")).unwrap();
        let text = types.register(TypeDecl::new("text", "text¦s")).unwrap();
        let boolean = types.register(TypeDecl::new("boolean", "boolean¦s")).unwrap();
        Fixture {
            types,
            converters: ConverterRegistry::new(),
            comparators: ComparatorRegistry::new(),
            number,
            text,
            boolean,
        }
    }

    fn number(&self, n: i64) -> Value {
        Value::new(self.number, Data::Integer(n))
    }

    fn text(&self, s: &str) -> Value {
        Value::new(self.text, Data::text(s))
    }

    fn add_number_comparator(&mut self) {
        let entry = ComparatorEntry::new(self.number, self.number, numeric(), true);
        self.comparators.add(entry, &self.types).unwrap();
    }

    fn add_converter(&mut self, from: TypeId, to: TypeId, function: ConverterFn) {
        self.converters
            .add(
                ConverterEntry::new(from, to, function, ConverterOptions::empty()),
                &self.types,
            )
            .unwrap();
    }

    fn resolve(&self, first: TypeId, second: TypeId) -> Option<Arc<Comparator>> {
        self.comparators
            .resolve(first, second, &self.types, &self.converters)
    }

    fn compare(&self, a: &Value, b: &Value) -> Relation {
        self.resolve(a.ty(), b.ty())
            .map_or(Relation::NotEqual, |c| c.apply(a, b))
    }
}

fn numeric() -> CompareFn {
    Arc::new(|a: &Value, b: &Value| match (a.as_integer(), b.as_integer()) {
        (Some(a), Some(b)) => Relation::from(a.cmp(&b)),
        _ => Relation::NotEqual,
    })
}

fn parse_number() -> ConverterFn {
    Arc::new(|v: &Value| v.as_text()?.trim().parse::<i64>().ok().map(Data::Integer))
}

#[test]
fn perfect_match_uses_registered_comparator() {
    let mut fx = Fixture::new();
    fx.add_number_comparator();

    let comparator = fx.resolve(fx.number, fx.number).unwrap();
    assert!(!comparator.is_derived());
    assert!(comparator.supports_ordering());
    assert_eq!(fx.compare(&fx.number(1), &fx.number(2)), Relation::Smaller);
    assert_eq!(fx.compare(&fx.number(2), &fx.number(2)), Relation::Equal);
}

#[test]
fn reversed_declaration_is_inverted() {
    let mut fx = Fixture::new();
    // number on the left, text on the right: "length of text vs number"
    let entry = ComparatorEntry::new(
        fx.number,
        fx.text,
        Arc::new(|n: &Value, t: &Value| {
            let len = t.as_text().map_or(0, str::len);
            Relation::from(n.as_integer().unwrap_or(0).cmp(&i64::try_from(len).unwrap_or(0)))
        }),
        true,
    );
    fx.comparators.add(entry, &fx.types).unwrap();

    let comparator = fx.resolve(fx.text, fx.number).unwrap();
    assert!(matches!(*comparator, Comparator::Inverse(_)));
    // "abc" (3) vs 5 => smaller, seen from the text side
    assert_eq!(fx.compare(&fx.text("abc"), &fx.number(5)), Relation::Smaller);
    assert_eq!(fx.compare(&fx.number(5), &fx.text("abc")), Relation::Greater);
}

#[test]
fn same_type_without_comparator_uses_equality() {
    let fx = Fixture::new();
    let comparator = fx.resolve(fx.text, fx.text).unwrap();
    assert!(matches!(*comparator, Comparator::Equality));
    assert!(!comparator.supports_ordering());
    assert_eq!(fx.compare(&fx.text("a"), &fx.text("a")), Relation::Equal);
    assert_eq!(fx.compare(&fx.text("a"), &fx.text("b")), Relation::NotEqual);
}

#[test]
fn universal_type_gets_no_equality_fallback() {
    let fx = Fixture::new();
    assert!(fx.resolve(TypeId::OBJECT, TypeId::OBJECT).is_none());
}

#[test]
fn unrelated_types_resolve_to_none() {
    let fx = Fixture::new();
    assert!(fx.resolve(fx.number, fx.boolean).is_none());
    assert_eq!(
        fx.compare(&fx.number(1), &Value::new(fx.boolean, Data::Boolean(true))),
        Relation::NotEqual
    );
}

#[test]
fn single_conversion_of_second_operand() {
    let mut fx = Fixture::new();
    fx.add_number_comparator();
    fx.add_converter(fx.text, fx.number, parse_number());

    let comparator = fx.resolve(fx.number, fx.text).unwrap();
    assert_eq!(comparator.conversion_count(), 1);
    assert!(comparator.supports_ordering());
    assert_eq!(fx.compare(&fx.number(3), &fx.text("7")), Relation::Smaller);
    assert_eq!(fx.compare(&fx.number(7), &fx.text("7")), Relation::Equal);
}

#[test]
fn single_conversion_of_first_operand() {
    let mut fx = Fixture::new();
    fx.add_number_comparator();
    fx.add_converter(fx.text, fx.number, parse_number());

    let comparator = fx.resolve(fx.text, fx.number).unwrap();
    assert_eq!(comparator.conversion_count(), 1);
    assert_eq!(fx.compare(&fx.text("9"), &fx.number(7)), Relation::Greater);
}

#[test]
fn failed_conversion_at_apply_time_is_not_equal() {
    let mut fx = Fixture::new();
    fx.add_number_comparator();
    fx.add_converter(fx.text, fx.number, parse_number());

    // Resolution succeeds on types, but "seven" does not parse.
    assert!(fx.resolve(fx.number, fx.text).is_some());
    assert_eq!(fx.compare(&fx.number(7), &fx.text("seven")), Relation::NotEqual);
    assert_eq!(fx.compare(&fx.text("seven"), &fx.number(7)), Relation::NotEqual);
}

#[test]
fn conversion_into_other_operand_type_uses_equality() {
    let mut fx = Fixture::new();
    fx.add_converter(
        fx.number,
        fx.text,
        Arc::new(|v: &Value| Some(Data::text(v.data().to_string()))),
    );

    let comparator = fx.resolve(fx.number, fx.text).unwrap();
    assert!(comparator.is_derived());
    assert!(!comparator.supports_ordering());
    assert_eq!(fx.compare(&fx.number(5), &fx.text("5")), Relation::Equal);
    assert_eq!(fx.compare(&fx.text("5"), &fx.number(5)), Relation::Equal);
    assert_eq!(fx.compare(&fx.number(5), &fx.text("6")), Relation::NotEqual);
}

#[test]
fn double_conversion_converts_both_operands() {
    let mut fx = Fixture::new();
    fx.add_number_comparator();
    // boolean -> number and text -> number; no comparator touches either.
    fx.add_converter(
        fx.boolean,
        fx.number,
        Arc::new(|v: &Value| v.as_bool().map(|b| Data::Integer(i64::from(b)))),
    );
    fx.add_converter(fx.text, fx.number, parse_number());

    let comparator = fx.resolve(fx.boolean, fx.text).unwrap();
    assert_eq!(comparator.conversion_count(), 2);
    assert!(comparator.supports_ordering());
    let yes = Value::new(fx.boolean, Data::Boolean(true));
    assert_eq!(fx.compare(&yes, &fx.text("1")), Relation::Equal);
    assert_eq!(fx.compare(&yes, &fx.text("4")), Relation::Smaller);
    assert_eq!(fx.compare(&fx.text("4"), &yes), Relation::Greater);
}

#[test]
fn double_conversion_wins_over_converted_equality() {
    let mut fx = Fixture::new();
    fx.add_number_comparator();
    fx.add_converter(
        fx.boolean,
        fx.number,
        Arc::new(|v: &Value| v.as_bool().map(|b| Data::Integer(i64::from(b)))),
    );
    fx.add_converter(fx.text, fx.number, parse_number());
    // Also a direct path from one operand into the other's type.
    fx.add_converter(
        fx.boolean,
        fx.text,
        Arc::new(|v: &Value| v.as_bool().map(|b| Data::text(b.to_string()))),
    );

    let comparator = fx.resolve(fx.boolean, fx.text).unwrap();
    assert_eq!(comparator.conversion_count(), 2);
    assert!(comparator.supports_ordering());
    let yes = Value::new(fx.boolean, Data::Boolean(true));
    assert_eq!(fx.compare(&yes, &fx.text("4")), Relation::Smaller);
    assert_eq!(fx.compare(&fx.text("4"), &yes), Relation::Greater);
}

#[test]
fn results_are_memoized_including_misses() {
    let mut fx = Fixture::new();
    fx.add_number_comparator();
    assert_eq!(fx.comparators.cached_pairs(), 0);

    let first = fx.resolve(fx.number, fx.number).unwrap();
    let again = fx.resolve(fx.number, fx.number).unwrap();
    assert!(Arc::ptr_eq(&first, &again));

    assert!(fx.resolve(fx.number, fx.boolean).is_none());
    assert_eq!(fx.comparators.cached_pairs(), 2);
}

#[test]
fn adding_comparator_clears_memo() {
    let mut fx = Fixture::new();
    assert!(fx.resolve(fx.number, fx.boolean).is_none());
    assert_eq!(fx.comparators.cached_pairs(), 1);

    let entry = ComparatorEntry::new(
        fx.number,
        fx.boolean,
        Arc::new(|_: &Value, _: &Value| Relation::Equal),
        false,
    );
    fx.comparators.add(entry, &fx.types).unwrap();
    assert_eq!(fx.comparators.cached_pairs(), 0);
    assert!(fx.resolve(fx.number, fx.boolean).is_some());
}

#[test]
fn rejects_object_object_and_duplicates() {
    let mut fx = Fixture::new();
    let any = ComparatorEntry::new(TypeId::OBJECT, TypeId::OBJECT, numeric(), true);
    assert_eq!(fx.comparators.add(any, &fx.types).unwrap_err().code, ErrorCode::E2005);

    fx.add_number_comparator();
    let dup = ComparatorEntry::new(fx.number, fx.number, numeric(), false);
    assert_eq!(fx.comparators.add(dup, &fx.types).unwrap_err().code, ErrorCode::E2004);
    assert_eq!(fx.comparators.len(), 1);
}

#[test]
fn relation_inverse_and_queries() {
    assert_eq!(Relation::Smaller.inverse(), Relation::Greater);
    assert_eq!(Relation::Greater.inverse(), Relation::Smaller);
    assert_eq!(Relation::Equal.inverse(), Relation::Equal);
    assert_eq!(Relation::NotEqual.inverse(), Relation::NotEqual);

    assert!(Relation::Smaller.is(Relation::NotEqual));
    assert!(!Relation::Equal.is(Relation::NotEqual));
    assert!(Relation::Equal.is_equal());
    assert_eq!(Relation::get(false), Relation::NotEqual);
    assert_eq!(Relation::NotEqual.to_ordering(), None);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn swapped_operands_give_inverse_relation(a in -1000i64..1000, b in -1000i64..1000) {
            let mut fx = Fixture::new();
            fx.add_number_comparator();
            fx.add_converter(fx.text, fx.number, parse_number());

            let forward = fx.compare(&fx.number(a), &fx.text(&b.to_string()));
            let backward = fx.compare(&fx.text(&b.to_string()), &fx.number(a));
            prop_assert_eq!(forward, backward.inverse());
            prop_assert_eq!(forward, Relation::from(a.cmp(&b)));
        }

        #[test]
        fn memoized_resolution_is_stable(a in -50i64..50, b in -50i64..50) {
            let mut fx = Fixture::new();
            fx.add_number_comparator();
            let first = fx.compare(&fx.number(a), &fx.number(b));
            let second = fx.compare(&fx.number(a), &fx.number(b));
            prop_assert_eq!(first, second);
            prop_assert_eq!(fx.comparators.cached_pairs(), 1);
        }
    }
}
