use proptest::prelude::*;
use tuple_core::signature::resolve_type;
use tuple_core::{Direction, FnFunction, FnOperator, FnPredicate, Signature, TypeExpr, Value, ValueType};

fn arb_value_type() -> impl Strategy<Value = ValueType> {
    prop_oneof![Just(ValueType::Any),
                Just(ValueType::Unknown),
                Just(ValueType::Null),
                Just(ValueType::Bool),
                Just(ValueType::Number),
                Just(ValueType::Short),
                Just(ValueType::Int),
                Just(ValueType::Long),
                Just(ValueType::Double),
                Just(ValueType::Text),
                Just(ValueType::Tuple),
                Just(ValueType::ArrayTuple),
                Just(ValueType::MapTuple),
                (1usize..5).prop_map(ValueType::Fixed)]
}

fn arb_type_expr() -> impl Strategy<Value = TypeExpr> {
    let leaf = arb_value_type().prop_map(TypeExpr::Class);
    leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![inner.clone().prop_map(TypeExpr::bag_of),
                        prop::collection::vec(inner, 0..4).prop_map(TypeExpr::fixed)]
        })
}

#[test]
fn two_argument_operator_has_two_input_classes() {
    let sum = FnOperator::new("sum", |a: i64, b: i64| a + b);
    let sig = Signature::input_of(&sum).unwrap();
    assert_eq!(sig.num_classes(), Some(2));
    assert_eq!(sig.classes(), vec![ValueType::Long, ValueType::Long]);
    assert!(sig.assignable(&[ValueType::Long, ValueType::Long]).is_valid());
    assert!(!sig.assignable(&[ValueType::Long]).is_valid());
}

#[test]
fn bag_tuple_input_is_variadic() {
    let total = FnFunction::new("total", |xs: Vec<i64>| xs.iter().sum::<i64>());
    let sig = Signature::input_of(&total).unwrap();
    assert_eq!(sig.num_classes(), None);
    assert!(sig.is_variadic());
    for n in 0..5 {
        assert!(sig.assignable(&vec![ValueType::Long; n]).is_valid(), "{n} longs");
    }
    assert!(!sig.assignable(&[ValueType::Text]).is_valid());
    assert!(!sig.assignable(&[ValueType::Long, ValueType::Text]).is_valid());
}

#[test]
fn unresolvable_function_type_is_permissive() {
    let raw = FnFunction::new("raw", |v: Value| v);
    let sig = Signature::input_of(&raw).unwrap();
    assert!(sig.is_unknown());
    assert!(matches!(sig, Signature::Singleton(_)));
    for t in [ValueType::Long, ValueType::Text, ValueType::MapTuple, ValueType::Null] {
        assert!(sig.assignable(&[t]).is_valid());
    }
}

#[test]
fn predicate_output_is_bool() {
    let even = FnPredicate::new("even", |n: i64| n % 2 == 0);
    assert_eq!(resolve_type(&even, Direction::Output).unwrap(), TypeExpr::Class(ValueType::Bool));
    assert_eq!(Signature::output_of(&even).unwrap().classes(), vec![ValueType::Bool]);
}

#[test]
fn mismatch_messages_name_the_argument() {
    let sum = FnOperator::new("sum", |a: i64, b: i64| a + b);
    let sig = Signature::input_of(&sum).unwrap();
    let result = sig.assignable(&[ValueType::Long, ValueType::Text]);
    assert_eq!(result.len(), 1);
    assert!(result.error_string().contains("argument 1 of type Text"));
}

proptest! {
    #[test]
    fn assignable_never_panics(expr in arb_type_expr(),
                               direction in prop_oneof![Just(Direction::Input), Just(Direction::Output)],
                               candidates in prop::collection::vec(arb_value_type(), 0..6)) {
        let sig = Signature::from_expr("Generated", direction, &expr);
        let result = sig.assignable(&candidates);
        prop_assert_eq!(result.is_valid(), result.len() == 0);
        let _ = sig.to_string();
    }

    #[test]
    fn any_accepts_every_single_argument(t in arb_value_type()) {
        let sig = Signature::from_expr("Generated", Direction::Input, &TypeExpr::Class(ValueType::Any));
        prop_assert!(sig.assignable(&[t]).is_valid());
    }
}
