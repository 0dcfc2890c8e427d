use std::sync::Arc;

use log::debug;

use super::Composite;
use crate::config::CoreConfig;
use crate::errors::{ConfigError, EvalError};
use crate::registry::{AnyUnit, FromSpec, Registry, UnitSpec};
use crate::signature::{resolve_shape, resolve_type, Declaration, Direction, Signature};
use crate::tuple::TupleAdaptedPredicate;
use crate::types::{TypeVar, Value, ValueType};
use crate::unit::{BinaryOperator, DynEq, Function, InputValidator, OutputValidator, Predicate, Unit, UnitKind};
use crate::validation::ValidationResult;

/// Une los resultados de `assignable` de cada unidad. Una unidad cuya firma
/// no se puede resolver aporta el error de configuración como mensaje.
fn assignable_all<'a, U, I>(units: I, direction: Direction, candidates: &[ValueType]) -> ValidationResult
    where U: Unit + ?Sized + 'a,
          I: IntoIterator<Item = &'a U>
{
    let mut result = ValidationResult::new();
    for unit in units {
        match Signature::of(unit, direction) {
            Ok(sig) => result.add(&sig.assignable(candidates)),
            Err(e) => result.add_error(e.to_string()),
        }
    }
    result
}

// -------------------------------------------------------------
// PredicateComposite
// -------------------------------------------------------------

/// AND con cortocircuito. Vacío ⇒ `true`.
///
/// Si un componente adaptado a tupla con selección de un solo campo falla
/// con `Cast` porque recibió un escalar, y el modo permisivo está activo, se
/// reintenta con su predicado interno sobre el valor crudo.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PredicateComposite {
    components: Composite<Arc<dyn Predicate>>,
    lenient: Option<bool>,
}

impl PredicateComposite {
    pub fn new(components: Vec<Arc<dyn Predicate>>) -> Self {
        Self { components: Composite::new(components),
               lenient: None }
    }

    pub fn with(mut self, predicate: Arc<dyn Predicate>) -> Self {
        self.components.push(predicate);
        self
    }

    pub fn and<P: Predicate + 'static>(self, predicate: P) -> Self {
        self.with(Arc::new(predicate))
    }

    /// Fija el modo permisivo para este composite (por defecto, el global).
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = Some(lenient);
        self
    }

    pub fn is_lenient(&self) -> bool {
        self.lenient.unwrap_or(CoreConfig::global().lenient_scalar_unwrap)
    }

    pub fn components(&self) -> &Composite<Arc<dyn Predicate>> {
        &self.components
    }

    pub(crate) fn push(&mut self, predicate: Arc<dyn Predicate>) {
        self.components.push(predicate);
    }

    fn retry_unwrapped(&self, component: &Arc<dyn Predicate>, input: &Value) -> Option<Result<bool, EvalError>> {
        if input.is_tuple() || !self.is_lenient() {
            return None;
        }
        let adapted = DynEq::as_any(component.as_ref()).downcast_ref::<TupleAdaptedPredicate>()?;
        if adapted.selection().map(<[_]>::len) != Some(1) {
            return None;
        }
        debug!("retrying tuple-adapted predicate on raw {} value", input.value_type());
        Some(adapted.predicate().map_or(Ok(true), |p| p.test(input)))
    }

    pub(crate) fn declaration_as(&self, owner: &str) -> Result<Declaration, ConfigError> {
        let first = self.components.first().map(|p| resolve_type(p.as_ref(), Direction::Input)).transpose()?;
        let t = TypeVar::new(owner, "T");
        let contract = vec![Some(t.expr())];
        Ok(Declaration::new(UnitKind::Predicate).generic(owner, vec![t], vec![first])
                                                .implements(contract))
    }

    pub(crate) fn spec_fields(&self, spec: UnitSpec) -> Result<UnitSpec, ConfigError> {
        spec.with_units("components", self.components.iter().map(|c| c.as_ref()))?
            .with("lenient", self.lenient)
    }
}

impl Unit for PredicateComposite {
    fn kind(&self) -> UnitKind {
        UnitKind::Predicate
    }

    fn declaration(&self) -> Result<Declaration, ConfigError> {
        self.declaration_as("PredicateComposite")
    }

    fn input_validator(&self) -> Option<&dyn InputValidator> {
        Some(self)
    }

    fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        self.spec_fields(UnitSpec::of(Self::TAG))
    }
}

impl Predicate for PredicateComposite {
    fn test(&self, input: &Value) -> Result<bool, EvalError> {
        for component in &self.components {
            let passed = match component.test(input) {
                Ok(passed) => passed,
                Err(e) if e.is_cast() => match self.retry_unwrapped(component, input) {
                    Some(retried) => retried?,
                    None => return Err(e),
                },
                Err(e) => return Err(e),
            };
            if !passed {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl InputValidator for PredicateComposite {
    fn is_input_valid(&self, candidates: &[ValueType]) -> ValidationResult {
        assignable_all(self.components.iter().map(|c| c.as_ref()), Direction::Input, candidates)
    }
}

impl FromSpec for PredicateComposite {
    const TAG: &'static str = "tuple_core::PredicateComposite";

    fn from_spec(spec: &UnitSpec, registry: &Registry) -> Result<Self, ConfigError> {
        let mut composite = Self::new(registry.list_field(spec, "components", Registry::build_predicate)?);
        composite.lenient = spec.field("lenient")?;
        Ok(composite)
    }

    fn into_unit(self) -> AnyUnit {
        AnyUnit::Predicate(Arc::new(self))
    }
}

// -------------------------------------------------------------
// FunctionComposite
// -------------------------------------------------------------

/// Tubería de funciones. Vacía ⇒ identidad.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FunctionComposite {
    components: Composite<Arc<dyn Function>>,
}

impl FunctionComposite {
    pub fn new(components: Vec<Arc<dyn Function>>) -> Self {
        Self { components: Composite::new(components) }
    }

    pub fn with(mut self, function: Arc<dyn Function>) -> Self {
        self.components.push(function);
        self
    }

    pub fn then<F: Function + 'static>(self, function: F) -> Self {
        self.with(Arc::new(function))
    }

    pub fn components(&self) -> &Composite<Arc<dyn Function>> {
        &self.components
    }

    pub(crate) fn push(&mut self, function: Arc<dyn Function>) {
        self.components.push(function);
    }

    /// Comprueba, antes de ejecutar, que la salida de cada componente encaja
    /// en la entrada del siguiente.
    pub fn validate_chain(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        for (i, pair) in self.components.components().windows(2).enumerate() {
            let link = Signature::output_of(pair[0].as_ref()).and_then(|out| {
                                                                 Signature::input_of(pair[1].as_ref()).map(|inp| inp.accepts(&out))
                                                             });
            match link {
                Ok(r) => {
                    for e in r.errors() {
                        result.add_error(format!("component {} -> {}: {e}", i, i + 1));
                    }
                }
                Err(e) => result.add_error(format!("component {} -> {}: {e}", i, i + 1)),
            }
        }
        result
    }

    pub(crate) fn declaration_as(&self, owner: &str) -> Result<Declaration, ConfigError> {
        let first = self.components.first().map(|f| resolve_type(f.as_ref(), Direction::Input)).transpose()?;
        let last = self.components.last().map(|f| resolve_type(f.as_ref(), Direction::Output)).transpose()?;
        let t = TypeVar::new(owner, "T");
        let r = TypeVar::new(owner, "R");
        let contract = vec![Some(t.expr()), Some(r.expr())];
        Ok(Declaration::new(UnitKind::Function).generic(owner, vec![t, r], vec![first, last])
                                               .implements(contract))
    }

    pub(crate) fn spec_fields(&self, spec: UnitSpec) -> Result<UnitSpec, ConfigError> {
        spec.with_units("components", self.components.iter().map(|c| c.as_ref()))
    }
}

impl Unit for FunctionComposite {
    fn kind(&self) -> UnitKind {
        UnitKind::Function
    }

    fn declaration(&self) -> Result<Declaration, ConfigError> {
        self.declaration_as("FunctionComposite")
    }

    fn input_validator(&self) -> Option<&dyn InputValidator> {
        Some(self)
    }

    fn output_validator(&self) -> Option<&dyn OutputValidator> {
        Some(self)
    }

    fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        self.spec_fields(UnitSpec::of(Self::TAG))
    }
}

impl Function for FunctionComposite {
    fn apply(&self, input: Value) -> Result<Value, EvalError> {
        self.components.iter().try_fold(input, |value, f| f.apply(value))
    }
}

impl InputValidator for FunctionComposite {
    fn is_input_valid(&self, candidates: &[ValueType]) -> ValidationResult {
        assignable_all(self.components.first().map(|c| c.as_ref()), Direction::Input, candidates)
    }
}

impl OutputValidator for FunctionComposite {
    fn is_output_valid(&self, candidates: &[ValueType]) -> ValidationResult {
        assignable_all(self.components.last().map(|c| c.as_ref()), Direction::Output, candidates)
    }
}

impl FromSpec for FunctionComposite {
    const TAG: &'static str = "tuple_core::FunctionComposite";

    fn from_spec(spec: &UnitSpec, registry: &Registry) -> Result<Self, ConfigError> {
        Ok(Self::new(registry.list_field(spec, "components", Registry::build_function)?))
    }

    fn into_unit(self) -> AnyUnit {
        AnyUnit::Function(Arc::new(self))
    }
}

// -------------------------------------------------------------
// BinaryOperatorComposite
// -------------------------------------------------------------

/// Plegado: cada componente recibe `(acumulado, input)`. Vacío ⇒ devuelve el
/// estado tal cual.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BinaryOperatorComposite {
    components: Composite<Arc<dyn BinaryOperator>>,
}

impl BinaryOperatorComposite {
    pub fn new(components: Vec<Arc<dyn BinaryOperator>>) -> Self {
        Self { components: Composite::new(components) }
    }

    pub fn with(mut self, operator: Arc<dyn BinaryOperator>) -> Self {
        self.components.push(operator);
        self
    }

    pub fn then<O: BinaryOperator + 'static>(self, operator: O) -> Self {
        self.with(Arc::new(operator))
    }

    pub fn components(&self) -> &Composite<Arc<dyn BinaryOperator>> {
        &self.components
    }

    pub(crate) fn push(&mut self, operator: Arc<dyn BinaryOperator>) {
        self.components.push(operator);
    }

    pub(crate) fn declaration_as(&self, owner: &str) -> Result<Declaration, ConfigError> {
        let first = self.components
                        .first()
                        .map(|op| resolve_shape(op.as_ref()).map(|s| s.output()))
                        .transpose()?;
        let t = TypeVar::new(owner, "T");
        let contract = vec![Some(t.expr())];
        Ok(Declaration::new(UnitKind::BinaryOperator).generic(owner, vec![t], vec![first])
                                                     .implements(contract))
    }

    pub(crate) fn spec_fields(&self, spec: UnitSpec) -> Result<UnitSpec, ConfigError> {
        spec.with_units("components", self.components.iter().map(|c| c.as_ref()))
    }
}

impl Unit for BinaryOperatorComposite {
    fn kind(&self) -> UnitKind {
        UnitKind::BinaryOperator
    }

    fn declaration(&self) -> Result<Declaration, ConfigError> {
        self.declaration_as("BinaryOperatorComposite")
    }

    fn input_validator(&self) -> Option<&dyn InputValidator> {
        Some(self)
    }

    fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        self.spec_fields(UnitSpec::of(Self::TAG))
    }
}

impl BinaryOperator for BinaryOperatorComposite {
    fn apply(&self, state: Value, input: Value) -> Result<Value, EvalError> {
        self.components.iter().try_fold(state, |acc, op| op.apply(acc, input.clone()))
    }
}

impl InputValidator for BinaryOperatorComposite {
    fn is_input_valid(&self, candidates: &[ValueType]) -> ValidationResult {
        assignable_all(self.components.iter().map(|c| c.as_ref()), Direction::Input, candidates)
    }
}

impl FromSpec for BinaryOperatorComposite {
    const TAG: &'static str = "tuple_core::BinaryOperatorComposite";

    fn from_spec(spec: &UnitSpec, registry: &Registry) -> Result<Self, ConfigError> {
        Ok(Self::new(registry.list_field(spec, "components", Registry::build_operator)?))
    }

    fn into_unit(self) -> AnyUnit {
        AnyUnit::BinaryOperator(Arc::new(self))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::tuple::{refs, MapTuple};
    use crate::unit::{FnFunction, FnOperator, FnPredicate};

    fn counting(name: &'static str, result: bool, counter: Arc<AtomicUsize>) -> FnPredicate<Value> {
        FnPredicate::new(name, move |_: Value| {
            counter.fetch_add(1, Ordering::SeqCst);
            result
        })
    }

    #[test]
    fn and_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let third = Arc::new(AtomicUsize::new(0));
        let p = PredicateComposite::default().and(counting("p1", true, calls.clone()))
                                             .and(counting("p2", false, calls.clone()))
                                             .and(counting("p3", true, third.clone()));
        assert_eq!(p.test(&Value::Long(1)), Ok(false));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(third.load(Ordering::SeqCst), 0);
        assert_eq!(PredicateComposite::default().test(&Value::Null), Ok(true));
    }

    #[test]
    fn cast_failure_propagates_for_plain_predicates() {
        let p = PredicateComposite::default().and(FnPredicate::new("pos", |n: i64| n > 0));
        assert!(p.test(&Value::Text("x".into())).unwrap_err().is_cast());
    }

    #[test]
    fn lenient_retry_unwraps_single_field_selection() {
        let inner: Arc<dyn Predicate> = Arc::new(FnPredicate::new("pos", |n: i64| n > 0));
        let adapted = TupleAdaptedPredicate::new(refs(["a"]), inner);
        let p = PredicateComposite::default().and(adapted.clone()).lenient(true);
        assert_eq!(p.test(&Value::Long(5)), Ok(true));
        assert_eq!(p.test(&Value::Long(-5)), Ok(false));
        assert_eq!(p.test(&MapTuple::new().with("a", 3i64).into()), Ok(true));

        let strict = PredicateComposite::default().and(adapted).lenient(false);
        assert!(strict.test(&Value::Long(5)).unwrap_err().is_cast());
    }

    #[test]
    fn pipes_functions_in_order() {
        let f = FunctionComposite::default().then(FnFunction::new("inc", |n: i64| n + 1))
                                            .then(FnFunction::new("double", |n: i64| n * 2));
        assert_eq!(f.apply(Value::Long(3)), Ok(Value::Long(8)));
        assert_eq!(FunctionComposite::default().apply(Value::Long(3)), Ok(Value::Long(3)));
    }

    #[test]
    fn chain_validation_reports_broken_links() {
        let ok = FunctionComposite::default().then(FnFunction::new("len", |s: String| s.len() as i64))
                                             .then(FnFunction::new("inc", |n: i64| n + 1));
        assert!(ok.validate_chain().is_valid());

        let broken = FunctionComposite::default().then(FnFunction::new("inc", |n: i64| n + 1))
                                                 .then(FnFunction::new("shout", |s: String| s.to_uppercase()));
        let r = broken.validate_chain();
        assert_eq!(r.errors().collect::<Vec<_>>(),
                   vec!["component 0 -> 1: argument 0 of type Long is not assignable to Text"]);
    }

    #[test]
    fn composite_signature_spans_first_input_and_last_output() {
        let f = FunctionComposite::default().then(FnFunction::new("len", |s: String| s.len() as i64))
                                            .then(FnFunction::new("even", |n: i64| n % 2 == 0));
        assert_eq!(Signature::input_of(&f).unwrap().classes(), vec![ValueType::Text]);
        assert_eq!(Signature::output_of(&f).unwrap().classes(), vec![ValueType::Bool]);
        assert!(!Signature::input_of(&f).unwrap().assignable(&[ValueType::Long]).is_valid());
    }

    #[test]
    fn fold_order_matters() {
        let sum = FnOperator::new("sum", |a: i64, b: i64| a + b);
        let product = FnOperator::new("product", |a: i64, b: i64| a * b);
        let forward = BinaryOperatorComposite::default().then(sum.clone()).then(product.clone());
        let reverse = BinaryOperatorComposite::default().then(product).then(sum);
        assert_eq!(forward.apply(Value::Long(5), Value::Long(10)), Ok(Value::Long(150)));
        assert_eq!(reverse.apply(Value::Long(5), Value::Long(10)), Ok(Value::Long(60)));
    }

    #[test]
    fn equality_requires_same_components() {
        let f: Arc<dyn Function> = Arc::new(FnFunction::new("inc", |n: i64| n + 1));
        let a = FunctionComposite::new(vec![f.clone()]);
        assert_eq!(a, FunctionComposite::new(vec![f.clone()]));
        assert_ne!(a, FunctionComposite::new(vec![f.clone(), f]));
    }
}
