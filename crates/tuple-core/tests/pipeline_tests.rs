use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::json;
use tuple_core::tuple::Tuple as _;
use tuple_core::IntoValue as _;
use tuple_core::{refs, AdaptedFunction, BiFunction, BinaryOperator, BinaryOperatorComposite, ConfigError, EvalError, FnBiFunction,
                 FnFunction, FnOperator, FnPredicate, Function, MapTuple, Predicate, PredicateComposite, Record,
                 Registry, TupleFunctionComposite, TupleInputAdapter, TupleOutputAdapter, Unit, UnitSpec, Value};

#[test]
fn fold_follows_insertion_order() {
    let sum = FnOperator::new("sum", |a: i64, b: i64| a + b);
    let product = FnOperator::new("product", |a: i64, b: i64| a * b);
    let forward = BinaryOperatorComposite::default().then(sum.clone()).then(product.clone());
    let reversed = BinaryOperatorComposite::default().then(product).then(sum);
    assert_eq!(forward.apply(Value::Long(5), Value::Long(10)), Ok(Value::Long(150)));
    assert_eq!(reversed.apply(Value::Long(5), Value::Long(10)), Ok(Value::Long(60)));
}

#[test]
fn and_stops_at_first_false() {
    let counters: Vec<Arc<AtomicUsize>> = (0..3).map(|_| Arc::new(AtomicUsize::new(0))).collect();
    let results = [true, false, true];
    let mut composite = PredicateComposite::default();
    for (counter, result) in counters.iter().zip(results) {
        let counter = counter.clone();
        composite = composite.and(FnPredicate::new("counted", move |_: Value| {
                                                       counter.fetch_add(1, Ordering::SeqCst);
                                                       result
                                                   }));
    }
    assert_eq!(composite.test(&Value::Null), Ok(false));
    let calls: Vec<usize> = counters.iter().map(|c| c.load(Ordering::SeqCst)).collect();
    assert_eq!(calls, vec![1, 1, 0]);
}

#[test]
fn tuple_fields_round_trip() {
    let target: Value = MapTuple::new().with("C", "keep").into();
    let written = TupleOutputAdapter::new(refs(["A", "B"])).apply(target, (1i64, "y".to_string()).into_value())
                                                          .unwrap();
    let read = TupleInputAdapter::new(refs(["A", "B"])).apply(written.clone()).unwrap();
    assert_eq!(read.as_tuple().map(|t| t.len()), Some(2));
    assert_eq!(read.as_tuple().unwrap().values().cloned().collect::<Vec<_>>(),
               vec![Value::Long(1), Value::Text("y".into())]);

    let single = TupleOutputAdapter::new(refs(["A"])).apply(written, Value::Long(7)).unwrap();
    assert_eq!(TupleInputAdapter::new(refs(["A"])).apply(single), Ok(Value::Long(7)));
}

#[test]
fn adapted_function_increments_context_field() {
    let count = FnFunction::new("count", |co: Record| co.get(&"count".into()).cloned().unwrap_or(Value::Null));
    let with_count = FnBiFunction::new("withCount", |co: Record, o: i64| {
        let mut co = co;
        let _ = co.put(&"count".into(), Value::Long(o));
        co
    });
    let f: AdaptedFunction = AdaptedFunction::new(Some(Arc::new(count)),
                                                  Some(Arc::new(with_count)),
                                                  Some(Arc::new(FnFunction::new("inc", |n: i64| n + 1))));
    let co: Value = MapTuple::new().with("count", 41i64).with("label", "answer").into();
    let out = f.apply(co).unwrap();
    let expected: Value = MapTuple::new().with("count", 42i64).with("label", "answer").into();
    assert_eq!(out, expected);
}

#[test]
fn unset_selection_or_projection_fails_on_apply() {
    let tuple: Value = MapTuple::new().with("a", 1i64).into();
    assert_eq!(TupleInputAdapter::default().apply(tuple.clone()),
               Err(EvalError::Config(ConfigError::MissingSelection)));
    assert_eq!(TupleOutputAdapter::default().apply(tuple, Value::Long(2)),
               Err(EvalError::Config(ConfigError::MissingProjection)));
}

#[test]
fn registry_rebuilds_pipeline_from_json() {
    let pipeline = TupleFunctionComposite::builder().select(["a"])
                                                    .execute(TupleFunctionComposite::default())
                                                    .project(["b"])
                                                    .build();
    let json = pipeline.to_spec().unwrap().to_json();
    assert_eq!(json["class"], json!("tuple_core::TupleFunctionComposite"));
    assert_eq!(json["components"][0]["selection"], json!(["a"]));

    let rebuilt = Registry::with_core().build_function(&UnitSpec::decode(&json).unwrap()).unwrap();
    let out = rebuilt.apply(MapTuple::new().with("a", 3i64).into()).unwrap();
    assert_eq!(out.as_tuple().unwrap().get(&"b".into()), Ok(&Value::Long(3)));
}

#[test]
fn short_names_resolve_in_json() {
    let json = json!({"class": "PredicateComposite", "components": []});
    let p = Registry::with_core().build_json(&json).unwrap().into_predicate().unwrap();
    assert_eq!(p.test(&Value::Null), Ok(true));
}
