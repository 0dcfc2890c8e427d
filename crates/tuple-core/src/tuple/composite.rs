//! Composites de unidades adaptadas a tupla y sus builders.
//!
//! Cada etapa es `select(...)` → `execute(core)`/`test(core)` →
//! `project(...)`. Las etapas son independientes: la proyección de una etapa
//! puede alimentar la selección de la siguiente por un campo compartido.
//!
//! ```ignore
//! let pipeline = TupleFunctionComposite::builder().select(["a"])
//!                                                 .execute(Increment::default())
//!                                                 .project(["b"])
//!                                                 .select(["a", "b"])
//!                                                 .execute(Total::default())
//!                                                 .project(["c"])
//!                                                 .build();
//! ```

use std::sync::Arc;

use super::{refs, FieldRef, TupleAdaptedBinaryOperator, TupleAdaptedFunction, TupleAdaptedPredicate};
use crate::composite::{BinaryOperatorComposite, FunctionComposite, PredicateComposite};
use crate::errors::{ConfigError, EvalError};
use crate::registry::{AnyUnit, FromSpec, Registry, UnitSpec};
use crate::signature::Declaration;
use crate::types::Value;
use crate::unit::{BinaryOperator, Function, InputValidator, OutputValidator, Predicate, Unit, UnitKind};

// -------------------------------------------------------------
// TuplePredicateComposite
// -------------------------------------------------------------

/// AND de predicados adaptados a tupla.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TuplePredicateComposite(PredicateComposite);

impl TuplePredicateComposite {
    pub fn builder() -> TuplePredicateBuilder {
        TuplePredicateBuilder::default()
    }

    pub fn inner(&self) -> &PredicateComposite {
        &self.0
    }
}

impl Unit for TuplePredicateComposite {
    fn kind(&self) -> UnitKind {
        UnitKind::Predicate
    }

    fn declaration(&self) -> Result<Declaration, ConfigError> {
        self.0.declaration_as("TuplePredicateComposite")
    }

    fn input_validator(&self) -> Option<&dyn InputValidator> {
        self.0.input_validator()
    }

    fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        self.0.spec_fields(UnitSpec::of(Self::TAG))
    }
}

impl Predicate for TuplePredicateComposite {
    fn test(&self, input: &Value) -> Result<bool, EvalError> {
        self.0.test(input)
    }
}

impl FromSpec for TuplePredicateComposite {
    const TAG: &'static str = "tuple_core::TuplePredicateComposite";

    fn from_spec(spec: &UnitSpec, registry: &Registry) -> Result<Self, ConfigError> {
        PredicateComposite::from_spec(spec, registry).map(Self)
    }

    fn into_unit(self) -> AnyUnit {
        AnyUnit::Predicate(Arc::new(self))
    }
}

#[derive(Debug, Default)]
pub struct TuplePredicateBuilder {
    composite: PredicateComposite,
}

impl TuplePredicateBuilder {
    pub fn select<R: Into<FieldRef>>(self, fields: impl IntoIterator<Item = R>) -> SelectedPredicate {
        SelectedPredicate { builder: self,
                            selection: refs(fields) }
    }

    /// Modo permisivo del composite resultante.
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.composite = self.composite.lenient(lenient);
        self
    }

    pub fn build(self) -> TuplePredicateComposite {
        TuplePredicateComposite(self.composite)
    }
}

/// Etapa con selección pendiente de predicado.
#[derive(Debug)]
pub struct SelectedPredicate {
    builder: TuplePredicateBuilder,
    selection: Vec<FieldRef>,
}

impl SelectedPredicate {
    pub fn test<P: Predicate + 'static>(self, predicate: P) -> TuplePredicateBuilder {
        self.test_shared(Arc::new(predicate))
    }

    pub fn test_shared(mut self, predicate: Arc<dyn Predicate>) -> TuplePredicateBuilder {
        self.builder.composite.push(Arc::new(TupleAdaptedPredicate::new(self.selection, predicate)));
        self.builder
    }
}

// -------------------------------------------------------------
// TupleFunctionComposite
// -------------------------------------------------------------

/// Tubería de funciones adaptadas a tupla; cada etapa proyecta sobre la
/// tupla que recibe la siguiente.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TupleFunctionComposite(FunctionComposite);

impl TupleFunctionComposite {
    pub fn builder() -> TupleFunctionBuilder {
        TupleFunctionBuilder::default()
    }

    pub fn inner(&self) -> &FunctionComposite {
        &self.0
    }
}

impl Unit for TupleFunctionComposite {
    fn kind(&self) -> UnitKind {
        UnitKind::Function
    }

    fn declaration(&self) -> Result<Declaration, ConfigError> {
        self.0.declaration_as("TupleFunctionComposite")
    }

    fn input_validator(&self) -> Option<&dyn InputValidator> {
        self.0.input_validator()
    }

    fn output_validator(&self) -> Option<&dyn OutputValidator> {
        self.0.output_validator()
    }

    fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        self.0.spec_fields(UnitSpec::of(Self::TAG))
    }
}

impl Function for TupleFunctionComposite {
    fn apply(&self, input: Value) -> Result<Value, EvalError> {
        self.0.apply(input)
    }
}

impl FromSpec for TupleFunctionComposite {
    const TAG: &'static str = "tuple_core::TupleFunctionComposite";

    fn from_spec(spec: &UnitSpec, registry: &Registry) -> Result<Self, ConfigError> {
        FunctionComposite::from_spec(spec, registry).map(Self)
    }

    fn into_unit(self) -> AnyUnit {
        AnyUnit::Function(Arc::new(self))
    }
}

#[derive(Debug, Default)]
pub struct TupleFunctionBuilder {
    composite: FunctionComposite,
}

impl TupleFunctionBuilder {
    pub fn select<R: Into<FieldRef>>(self, fields: impl IntoIterator<Item = R>) -> SelectedFunction {
        SelectedFunction { builder: self,
                           selection: refs(fields) }
    }

    pub fn build(self) -> TupleFunctionComposite {
        TupleFunctionComposite(self.composite)
    }
}

#[derive(Debug)]
pub struct SelectedFunction {
    builder: TupleFunctionBuilder,
    selection: Vec<FieldRef>,
}

impl SelectedFunction {
    pub fn execute<F: Function + 'static>(self, function: F) -> ExecutedFunction {
        self.execute_shared(Arc::new(function))
    }

    pub fn execute_shared(self, function: Arc<dyn Function>) -> ExecutedFunction {
        ExecutedFunction { builder: self.builder,
                           selection: self.selection,
                           function }
    }
}

/// Etapa con función pendiente de proyección.
#[derive(Debug)]
pub struct ExecutedFunction {
    builder: TupleFunctionBuilder,
    selection: Vec<FieldRef>,
    function: Arc<dyn Function>,
}

impl ExecutedFunction {
    pub fn project<R: Into<FieldRef>>(self, fields: impl IntoIterator<Item = R>) -> TupleFunctionBuilder {
        let mut builder = self.builder;
        builder.composite
               .push(Arc::new(TupleAdaptedFunction::new(self.selection, self.function, refs(fields))));
        builder
    }
}

// -------------------------------------------------------------
// TupleBinaryOperatorComposite
// -------------------------------------------------------------

/// Plegado de operadores adaptados a tupla sobre un estado tupla.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TupleBinaryOperatorComposite(BinaryOperatorComposite);

impl TupleBinaryOperatorComposite {
    pub fn builder() -> TupleBinaryOperatorBuilder {
        TupleBinaryOperatorBuilder::default()
    }

    pub fn inner(&self) -> &BinaryOperatorComposite {
        &self.0
    }
}

impl Unit for TupleBinaryOperatorComposite {
    fn kind(&self) -> UnitKind {
        UnitKind::BinaryOperator
    }

    fn declaration(&self) -> Result<Declaration, ConfigError> {
        self.0.declaration_as("TupleBinaryOperatorComposite")
    }

    fn input_validator(&self) -> Option<&dyn InputValidator> {
        self.0.input_validator()
    }

    fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        self.0.spec_fields(UnitSpec::of(Self::TAG))
    }
}

impl BinaryOperator for TupleBinaryOperatorComposite {
    fn apply(&self, state: Value, input: Value) -> Result<Value, EvalError> {
        self.0.apply(state, input)
    }
}

impl FromSpec for TupleBinaryOperatorComposite {
    const TAG: &'static str = "tuple_core::TupleBinaryOperatorComposite";

    fn from_spec(spec: &UnitSpec, registry: &Registry) -> Result<Self, ConfigError> {
        BinaryOperatorComposite::from_spec(spec, registry).map(Self)
    }

    fn into_unit(self) -> AnyUnit {
        AnyUnit::BinaryOperator(Arc::new(self))
    }
}

#[derive(Debug, Default)]
pub struct TupleBinaryOperatorBuilder {
    composite: BinaryOperatorComposite,
}

impl TupleBinaryOperatorBuilder {
    pub fn select<R: Into<FieldRef>>(self, fields: impl IntoIterator<Item = R>) -> SelectedOperator {
        SelectedOperator { builder: self,
                           selection: refs(fields) }
    }

    pub fn build(self) -> TupleBinaryOperatorComposite {
        TupleBinaryOperatorComposite(self.composite)
    }
}

#[derive(Debug)]
pub struct SelectedOperator {
    builder: TupleBinaryOperatorBuilder,
    selection: Vec<FieldRef>,
}

impl SelectedOperator {
    pub fn execute<O: BinaryOperator + 'static>(self, operator: O) -> ExecutedOperator {
        self.execute_shared(Arc::new(operator))
    }

    pub fn execute_shared(self, operator: Arc<dyn BinaryOperator>) -> ExecutedOperator {
        ExecutedOperator { builder: self.builder,
                           selection: self.selection,
                           operator }
    }
}

#[derive(Debug)]
pub struct ExecutedOperator {
    builder: TupleBinaryOperatorBuilder,
    selection: Vec<FieldRef>,
    operator: Arc<dyn BinaryOperator>,
}

impl ExecutedOperator {
    pub fn project<R: Into<FieldRef>>(self, fields: impl IntoIterator<Item = R>) -> TupleBinaryOperatorBuilder {
        let mut builder = self.builder;
        builder.composite
               .push(Arc::new(TupleAdaptedBinaryOperator::new(self.selection, self.operator, refs(fields))));
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::Signature;
    use crate::tuple::{MapTuple, Tuple};
    use crate::types::ValueType;
    use crate::unit::{FnFunction, FnOperator, FnPredicate};

    fn field(value: &Value, name: &str) -> Value {
        value.as_tuple().and_then(|t| t.get(&name.into()).ok()).cloned().unwrap_or(Value::Null)
    }

    #[test]
    fn stages_feed_each_other_through_shared_fields() {
        let pipeline = TupleFunctionComposite::builder().select(["a"])
                                                        .execute(FnFunction::new("inc", |n: i64| n + 1))
                                                        .project(["b"])
                                                        .select(["a", "b"])
                                                        .execute(FnFunction::new("add", |(x, y): (i64, i64)| x + y))
                                                        .project(["c"])
                                                        .build();
        let out = pipeline.apply(MapTuple::new().with("a", 2i64).into()).unwrap();
        assert_eq!(field(&out, "b"), Value::Long(3));
        assert_eq!(field(&out, "c"), Value::Long(5));
        assert_eq!(pipeline.inner().components().len(), 2);
    }

    #[test]
    fn predicate_builder_ands_stages() {
        let p = TuplePredicateComposite::builder().select(["n"])
                                                  .test(FnPredicate::new("pos", |n: i64| n > 0))
                                                  .select(["s"])
                                                  .test(FnPredicate::new("short", |s: String| s.len() < 4))
                                                  .build();
        assert_eq!(p.test(&MapTuple::new().with("n", 1i64).with("s", "abc").into()), Ok(true));
        assert_eq!(p.test(&MapTuple::new().with("n", 1i64).with("s", "abcd").into()), Ok(false));
        assert_eq!(p.test(&MapTuple::new().with("n", -1i64).into()), Ok(false));
    }

    #[test]
    fn operator_builder_folds_into_state() {
        let op = TupleBinaryOperatorComposite::builder().select(["total"])
                                                        .execute(FnOperator::new("sum", |a: i64, b: i64| a + b))
                                                        .project(["total"])
                                                        .build();
        let state: Value = MapTuple::new().with("total", 1i64).into();
        let out = [2i64, 3]
            .into_iter()
            .try_fold(state, |acc, n| op.apply(acc, MapTuple::new().with("total", n).into()))
            .unwrap();
        assert_eq!(field(&out, "total"), Value::Long(6));
    }

    #[test]
    fn composite_validates_against_first_stage_selection() {
        let p = TuplePredicateComposite::builder().select(["n"])
                                                  .test(FnPredicate::new("pos", |n: i64| n > 0))
                                                  .build();
        let sig = Signature::input_of(&p).unwrap();
        assert!(sig.assignable(&[ValueType::Long]).is_valid());
        assert!(!sig.assignable(&[ValueType::Text]).is_valid());
    }

    #[test]
    fn rebuilds_from_spec() {
        let f = TupleFunctionComposite::builder().select(["a"])
                                                 .execute(crate::composite::FunctionComposite::default())
                                                 .project(["a"])
                                                 .build();
        let spec = f.to_spec().unwrap();
        assert_eq!(spec.class, TupleFunctionComposite::TAG);
        let rebuilt = Registry::with_core().build_function(&spec).unwrap();
        let original: Arc<dyn Function> = Arc::new(f);
        assert!(*rebuilt == *original);
    }
}
