use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use proptest::prelude::*;
use serde_json::json;
use tupleflow::ops::{Increment, IsPositive, Product, Square, Sum, Total};
use tupleflow::tuple::Tuple as _;
use tupleflow::{default_registry, load_pipeline, BinaryOperator, BinaryOperatorComposite, ConfigError, EvalError,
                FnFunction, FnPredicate, Function, MapTuple, Predicate, PredicateComposite, Signature,
                TupleBinaryOperatorComposite, TupleFunctionComposite, TuplePredicateComposite, Unit, UnitSpec, Value,
                ValueType};

#[test]
fn builtin_operator_has_two_input_classes() {
    let sum = Sum::of(ValueType::Long);
    let sig = Signature::input_of(&sum).unwrap();
    assert_eq!(sig.num_classes(), Some(2));
    assert_eq!(sig.classes(), vec![ValueType::Long, ValueType::Long]);
    assert!(!sig.assignable(&[ValueType::Long]).is_valid());
}

#[test]
fn bag_input_accepts_any_count_of_matching_classes() {
    let total = Total::of(ValueType::Long);
    let sig = Signature::input_of(&total).unwrap();
    assert_eq!(sig.num_classes(), None);
    assert!(sig.assignable(&[ValueType::Long; 4]).is_valid());
    assert!(sig.assignable(&[]).is_valid());
    assert!(!sig.assignable(&[ValueType::Text]).is_valid());
}

#[test]
fn open_generic_accepts_any_single_class() {
    let identity = FnFunction::new("identity", |v: Value| v);
    let sig = Signature::input_of(&identity).unwrap();
    assert!(sig.is_unknown());
    for t in [ValueType::Bool, ValueType::Double, ValueType::Fixed(3)] {
        assert!(sig.assignable(&[t]).is_valid());
    }
}

#[test]
fn builtin_operators_fold_in_insertion_order() {
    let sum_then_product = BinaryOperatorComposite::default().then(Sum::default()).then(Product::default());
    let product_then_sum = BinaryOperatorComposite::default().then(Product::default()).then(Sum::default());
    assert_eq!(sum_then_product.apply(Value::Long(5), Value::Long(10)), Ok(Value::Long(150)));
    assert_eq!(product_then_sum.apply(Value::Long(5), Value::Long(10)), Ok(Value::Long(60)));
}

#[test]
fn tuple_predicate_composite_short_circuits() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let composite = TuplePredicateComposite::builder().select(["qty"])
                                                      .test(IsPositive)
                                                      .select(["qty"])
                                                      .test(FnPredicate::new("counted", move |_: Value| {
                                                                counter.fetch_add(1, Ordering::SeqCst);
                                                                true
                                                            }))
                                                      .build();
    let negative: Value = MapTuple::new().with("qty", -2i64).into();
    assert_eq!(composite.test(&negative), Ok(false));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let positive: Value = MapTuple::new().with("qty", 2i64).into();
    assert_eq!(composite.test(&positive), Ok(true));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn tuple_function_pipeline_with_builtins() {
    let pipeline = TupleFunctionComposite::builder().select(["n"])
                                                    .execute(Square::default())
                                                    .project(["sq"])
                                                    .select(["sq"])
                                                    .execute(Increment::default())
                                                    .project(["next"])
                                                    .build();
    let out = pipeline.apply(MapTuple::new().with("n", 4i64).into()).unwrap();
    let record = out.as_tuple().unwrap();
    assert_eq!(record.get(&"sq".into()), Ok(&Value::Long(16)));
    assert_eq!(record.get(&"next".into()), Ok(&Value::Long(17)));
}

#[test]
fn tuple_operator_composite_folds_selected_fields() {
    let fold = TupleBinaryOperatorComposite::builder().select(["x"])
                                                      .execute(Sum::default())
                                                      .project(["x"])
                                                      .build();
    let state: Value = MapTuple::new().with("x", 1i64).into();
    let element: Value = MapTuple::new().with("x", 2i64).into();
    let out = fold.apply(state, element).unwrap();
    assert_eq!(out.as_tuple().unwrap().get(&"x".into()), Ok(&Value::Long(3)));
}

#[test]
fn missing_projection_is_reported_on_apply() {
    let json = json!({
        "class": "TupleAdaptedFunction",
        "selection": ["n"],
        "function": {"class": "Square"}
    });
    let f = load_pipeline(&json).unwrap().into_function().unwrap();
    assert_eq!(f.apply(MapTuple::new().with("n", 2i64).into()),
               Err(EvalError::Config(ConfigError::MissingProjection)));
}

#[test]
fn json_pipeline_end_to_end() {
    let pipeline = json!({
        "class": "TupleFunctionComposite",
        "components": [
            {"class": "TupleAdaptedFunction", "selection": ["price"], "function": {"class": "Square"}, "projection": ["area"]},
            {"class": "TupleAdaptedFunction", "selection": ["area"], "function": {"class": "ToText"}, "projection": ["label"]}
        ]
    });
    let f = load_pipeline(&pipeline).unwrap().into_function().unwrap();
    let out = f.apply(MapTuple::new().with("price", 3i64).into()).unwrap();
    assert_eq!(out.to_json(), json!({"price": 3, "area": 9, "label": "9"}));
}

#[test]
fn rebuilt_pipeline_keeps_its_fingerprint() {
    let pipeline = TupleFunctionComposite::builder().select(["n"])
                                                    .execute(Increment::of(ValueType::Long))
                                                    .project(["n"])
                                                    .build();
    let spec = pipeline.to_spec().unwrap();
    let rebuilt = default_registry().build(&UnitSpec::decode(&spec.to_json()).unwrap()).unwrap();
    assert_eq!(rebuilt.to_spec().unwrap().fingerprint(), spec.fingerprint());
}

#[test]
fn predicate_composite_of_builtins_validates_input() {
    let composite = PredicateComposite::default().and(IsPositive).and(IsPositive);
    let sig = Signature::input_of(&composite).unwrap();
    assert!(sig.assignable(&[ValueType::Long]).is_valid());
}

fn value_type() -> impl Strategy<Value = ValueType> {
    prop_oneof![Just(ValueType::Any),
                Just(ValueType::Unknown),
                Just(ValueType::Null),
                Just(ValueType::Long),
                Just(ValueType::Text),
                Just(ValueType::MapTuple),
                (1usize..4).prop_map(ValueType::Fixed)]
}

proptest! {
    #[test]
    fn validation_reports_errors_without_panicking(candidates in prop::collection::vec(value_type(), 0..5)) {
        let sum = Sum::default();
        let total = Total::default();
        let identity = FnFunction::new("identity", |v: Value| v);
        for sig in [Signature::input_of(&sum), Signature::input_of(&total), Signature::output_of(&identity)] {
            let result = sig.unwrap().assignable(&candidates);
            prop_assert_eq!(result.is_valid(), result.is_empty());
        }
    }
}
