use std::fmt;
use std::sync::Arc;

use super::{Adapted, InputAdapted};
use crate::errors::{ConfigError, EvalError};
use crate::registry::{AnyUnit, FromSpec, Registry, UnitSpec};
use crate::signature::{resolve_shape, resolve_type, Declaration, Direction};
use crate::types::{TypeExpr, TypeVar, Value};
use crate::unit::{BiFunction, BinaryOperator, Function, Predicate, Unit, UnitKind};

fn input_of<U: Unit + ?Sized>(unit: Option<&U>) -> Result<Option<TypeExpr>, ConfigError> {
    unit.map(|u| resolve_type(u, Direction::Input)).transpose()
}

fn output_of<U: Unit + ?Sized>(unit: Option<&U>) -> Result<Option<TypeExpr>, ConfigError> {
    unit.map(|u| resolve_type(u, Direction::Output)).transpose()
}

fn operand_of<U: Unit + ?Sized>(unit: Option<&U>) -> Result<Option<TypeExpr>, ConfigError> {
    unit.map(|u| resolve_shape(u).map(|s| s.params[0].clone())).transpose()
}

fn vars(owner: &str, names: &[&str]) -> Vec<TypeVar> {
    names.iter().map(|n| TypeVar::new(owner, *n)).collect()
}

// -------------------------------------------------------------
// AdaptedPredicate
// -------------------------------------------------------------

/// Predicado core evaluado sobre la entrada adaptada. Sin predicado el
/// resultado es `true` (paso vacuo).
pub struct AdaptedPredicate<A: ?Sized = dyn Function> {
    input: InputAdapted<A>,
    predicate: Option<Arc<dyn Predicate>>,
}

impl<A: ?Sized + Function> AdaptedPredicate<A> {
    pub fn new(input_adapter: Option<Arc<A>>, predicate: Option<Arc<dyn Predicate>>) -> Self {
        Self { input: InputAdapted::new(input_adapter),
               predicate }
    }

    pub fn input_adapter(&self) -> Option<&Arc<A>> {
        self.input.input_adapter()
    }

    pub fn predicate(&self) -> Option<&Arc<dyn Predicate>> {
        self.predicate.as_ref()
    }

    pub(crate) fn declaration_as(&self, owner: &str) -> Result<Declaration, ConfigError> {
        let adapter = self.input_adapter().map(Arc::as_ref);
        let core = self.predicate.as_deref();
        let ai = input_of(core)?;
        let i = match adapter {
            Some(_) => input_of(adapter)?,
            None => ai.clone(),
        };
        let params = vars(owner, &["I", "AI"]);
        let bound_input = params[0].expr();
        Ok(Declaration::new(UnitKind::Predicate).generic(owner, params, vec![i, ai])
                                                .implements(vec![Some(bound_input)]))
    }

    pub(crate) fn spec_fields(&self, spec: UnitSpec) -> Result<UnitSpec, ConfigError> {
        spec.with_unit("inputAdapter", self.input_adapter().map(Arc::as_ref))?
            .with_unit("predicate", self.predicate.as_deref())
    }
}

impl<A: ?Sized> Default for AdaptedPredicate<A> {
    fn default() -> Self {
        Self { input: InputAdapted::default(),
               predicate: None }
    }
}

impl<A: ?Sized> Clone for AdaptedPredicate<A> {
    fn clone(&self) -> Self {
        Self { input: self.input.clone(),
               predicate: self.predicate.clone() }
    }
}

impl<A: ?Sized + PartialEq> PartialEq for AdaptedPredicate<A> {
    fn eq(&self, other: &Self) -> bool {
        self.input == other.input && self.predicate == other.predicate
    }
}

impl<A: ?Sized + fmt::Debug> fmt::Debug for AdaptedPredicate<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptedPredicate")
         .field("input", &self.input)
         .field("predicate", &self.predicate)
         .finish()
    }
}

impl<A: ?Sized + Function + PartialEq + 'static> Unit for AdaptedPredicate<A> {
    fn kind(&self) -> UnitKind {
        UnitKind::Predicate
    }

    fn declaration(&self) -> Result<Declaration, ConfigError> {
        self.declaration_as("AdaptedPredicate")
    }

    fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        self.spec_fields(UnitSpec::of(<AdaptedPredicate as FromSpec>::TAG))
    }
}

impl<A: ?Sized + Function + PartialEq + 'static> Predicate for AdaptedPredicate<A> {
    fn test(&self, input: &Value) -> Result<bool, EvalError> {
        match &self.predicate {
            None => Ok(true),
            Some(p) => p.test(&self.input.adapt_input(input.clone())?),
        }
    }
}

impl FromSpec for AdaptedPredicate {
    const TAG: &'static str = "tuple_core::AdaptedPredicate";

    fn from_spec(spec: &UnitSpec, registry: &Registry) -> Result<Self, ConfigError> {
        Ok(Self::new(registry.optional_field(spec, "inputAdapter", Registry::build_function)?,
                     registry.optional_field(spec, "predicate", Registry::build_predicate)?))
    }

    fn into_unit(self) -> AnyUnit {
        AnyUnit::Predicate(Arc::new(self))
    }
}

// -------------------------------------------------------------
// AdaptedFunction
// -------------------------------------------------------------

/// `adapt_output(function(adapt_input(x)), x)`: el contexto de la mezcla de
/// salida es la entrada original.
pub struct AdaptedFunction<A: ?Sized = dyn Function, B: ?Sized = dyn BiFunction> {
    adapted: Adapted<A, B>,
    function: Option<Arc<dyn Function>>,
}

impl<A: ?Sized + Function, B: ?Sized + BiFunction> AdaptedFunction<A, B> {
    pub fn new(input_adapter: Option<Arc<A>>, output_adapter: Option<Arc<B>>, function: Option<Arc<dyn Function>>) -> Self {
        Self { adapted: Adapted::new(input_adapter, output_adapter),
               function }
    }

    pub fn input_adapter(&self) -> Option<&Arc<A>> {
        self.adapted.input_adapter()
    }

    pub fn output_adapter(&self) -> Option<&Arc<B>> {
        self.adapted.output_adapter()
    }

    pub fn function(&self) -> Option<&Arc<dyn Function>> {
        self.function.as_ref()
    }

    pub(crate) fn declaration_as(&self, owner: &str) -> Result<Declaration, ConfigError> {
        let input_adapter = self.input_adapter().map(Arc::as_ref);
        let output_adapter = self.output_adapter().map(Arc::as_ref);
        let core = self.function.as_deref();

        let core_in = input_of(core)?;
        let ao = output_of(core)?;
        let (i, ai) = match input_adapter {
            Some(_) => (input_of(input_adapter)?, output_of(input_adapter)?),
            None => (core_in.clone(), core_in),
        };
        let o = match output_adapter {
            Some(_) => output_of(output_adapter)?,
            None => ao.clone(),
        };
        let params = vars(owner, &["I", "AI", "AO", "O"]);
        let contract = vec![Some(params[0].expr()), Some(params[3].expr())];
        Ok(Declaration::new(UnitKind::Function).generic(owner, params, vec![i, ai, ao, o])
                                               .implements(contract))
    }

    pub(crate) fn spec_fields(&self, spec: UnitSpec) -> Result<UnitSpec, ConfigError> {
        spec.with_unit("inputAdapter", self.input_adapter().map(Arc::as_ref))?
            .with_unit("outputAdapter", self.output_adapter().map(Arc::as_ref))?
            .with_unit("function", self.function.as_deref())
    }
}

impl<A: ?Sized, B: ?Sized> Default for AdaptedFunction<A, B> {
    fn default() -> Self {
        Self { adapted: Adapted::default(),
               function: None }
    }
}

impl<A: ?Sized, B: ?Sized> Clone for AdaptedFunction<A, B> {
    fn clone(&self) -> Self {
        Self { adapted: self.adapted.clone(),
               function: self.function.clone() }
    }
}

impl<A: ?Sized + PartialEq, B: ?Sized + PartialEq> PartialEq for AdaptedFunction<A, B> {
    fn eq(&self, other: &Self) -> bool {
        self.adapted == other.adapted && self.function == other.function
    }
}

impl<A: ?Sized + fmt::Debug, B: ?Sized + fmt::Debug> fmt::Debug for AdaptedFunction<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptedFunction")
         .field("adapted", &self.adapted)
         .field("function", &self.function)
         .finish()
    }
}

impl<A, B> Unit for AdaptedFunction<A, B>
    where A: ?Sized + Function + PartialEq + 'static,
          B: ?Sized + BiFunction + PartialEq + 'static
{
    fn kind(&self) -> UnitKind {
        UnitKind::Function
    }

    fn declaration(&self) -> Result<Declaration, ConfigError> {
        self.declaration_as("AdaptedFunction")
    }

    fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        self.spec_fields(UnitSpec::of(<AdaptedFunction as FromSpec>::TAG))
    }
}

impl<A, B> Function for AdaptedFunction<A, B>
    where A: ?Sized + Function + PartialEq + 'static,
          B: ?Sized + BiFunction + PartialEq + 'static
{
    fn apply(&self, input: Value) -> Result<Value, EvalError> {
        let function = self.function.as_ref().ok_or(ConfigError::MissingFunction)?;
        let output = function.apply(self.adapted.adapt_input(input.clone())?)?;
        self.adapted.adapt_output(output, input)
    }
}

impl FromSpec for AdaptedFunction {
    const TAG: &'static str = "tuple_core::AdaptedFunction";

    fn from_spec(spec: &UnitSpec, registry: &Registry) -> Result<Self, ConfigError> {
        Ok(Self::new(registry.optional_field(spec, "inputAdapter", Registry::build_function)?,
                     registry.optional_field(spec, "outputAdapter", Registry::build_bifunction)?,
                     registry.optional_field(spec, "function", Registry::build_function)?))
    }

    fn into_unit(self) -> AnyUnit {
        AnyUnit::Function(Arc::new(self))
    }
}

// -------------------------------------------------------------
// AdaptedBinaryOperator
// -------------------------------------------------------------

/// `adapt_output(op(adapt_input(state), adapt_input(input)), state)`. El
/// contexto de salida es el estado previo a la adaptación. Sin operador la
/// evaluación falla: no hay identidad por defecto.
pub struct AdaptedBinaryOperator<A: ?Sized = dyn Function, B: ?Sized = dyn BiFunction> {
    adapted: Adapted<A, B>,
    operator: Option<Arc<dyn BinaryOperator>>,
}

impl<A: ?Sized + Function, B: ?Sized + BiFunction> AdaptedBinaryOperator<A, B> {
    pub fn new(input_adapter: Option<Arc<A>>,
               output_adapter: Option<Arc<B>>,
               operator: Option<Arc<dyn BinaryOperator>>)
               -> Self {
        Self { adapted: Adapted::new(input_adapter, output_adapter),
               operator }
    }

    pub fn input_adapter(&self) -> Option<&Arc<A>> {
        self.adapted.input_adapter()
    }

    pub fn output_adapter(&self) -> Option<&Arc<B>> {
        self.adapted.output_adapter()
    }

    pub fn operator(&self) -> Option<&Arc<dyn BinaryOperator>> {
        self.operator.as_ref()
    }

    pub(crate) fn declaration_as(&self, owner: &str) -> Result<Declaration, ConfigError> {
        let input_adapter = self.input_adapter().map(Arc::as_ref);
        let at = operand_of(self.operator.as_deref())?;
        let t = match input_adapter {
            Some(_) => input_of(input_adapter)?,
            None => at.clone(),
        };
        let params = vars(owner, &["T", "AT"]);
        let contract = vec![Some(params[0].expr())];
        Ok(Declaration::new(UnitKind::BinaryOperator).generic(owner, params, vec![t, at])
                                                     .implements(contract))
    }

    pub(crate) fn spec_fields(&self, spec: UnitSpec) -> Result<UnitSpec, ConfigError> {
        spec.with_unit("inputAdapter", self.input_adapter().map(Arc::as_ref))?
            .with_unit("outputAdapter", self.output_adapter().map(Arc::as_ref))?
            .with_unit("operator", self.operator.as_deref())
    }
}

impl<A: ?Sized, B: ?Sized> Default for AdaptedBinaryOperator<A, B> {
    fn default() -> Self {
        Self { adapted: Adapted::default(),
               operator: None }
    }
}

impl<A: ?Sized, B: ?Sized> Clone for AdaptedBinaryOperator<A, B> {
    fn clone(&self) -> Self {
        Self { adapted: self.adapted.clone(),
               operator: self.operator.clone() }
    }
}

impl<A: ?Sized + PartialEq, B: ?Sized + PartialEq> PartialEq for AdaptedBinaryOperator<A, B> {
    fn eq(&self, other: &Self) -> bool {
        self.adapted == other.adapted && self.operator == other.operator
    }
}

impl<A: ?Sized + fmt::Debug, B: ?Sized + fmt::Debug> fmt::Debug for AdaptedBinaryOperator<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptedBinaryOperator")
         .field("adapted", &self.adapted)
         .field("operator", &self.operator)
         .finish()
    }
}

impl<A, B> Unit for AdaptedBinaryOperator<A, B>
    where A: ?Sized + Function + PartialEq + 'static,
          B: ?Sized + BiFunction + PartialEq + 'static
{
    fn kind(&self) -> UnitKind {
        UnitKind::BinaryOperator
    }

    fn declaration(&self) -> Result<Declaration, ConfigError> {
        self.declaration_as("AdaptedBinaryOperator")
    }

    fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        self.spec_fields(UnitSpec::of(<AdaptedBinaryOperator as FromSpec>::TAG))
    }
}

impl<A, B> BinaryOperator for AdaptedBinaryOperator<A, B>
    where A: ?Sized + Function + PartialEq + 'static,
          B: ?Sized + BiFunction + PartialEq + 'static
{
    fn apply(&self, state: Value, input: Value) -> Result<Value, EvalError> {
        let operator = self.operator.as_ref().ok_or(ConfigError::MissingOperator)?;
        let adapted_state = self.adapted.adapt_input(state.clone())?;
        let adapted_input = self.adapted.adapt_input(input)?;
        let output = operator.apply(adapted_state, adapted_input)?;
        self.adapted.adapt_output(output, state)
    }
}

impl FromSpec for AdaptedBinaryOperator {
    const TAG: &'static str = "tuple_core::AdaptedBinaryOperator";

    fn from_spec(spec: &UnitSpec, registry: &Registry) -> Result<Self, ConfigError> {
        Ok(Self::new(registry.optional_field(spec, "inputAdapter", Registry::build_function)?,
                     registry.optional_field(spec, "outputAdapter", Registry::build_bifunction)?,
                     registry.optional_field(spec, "operator", Registry::build_operator)?))
    }

    fn into_unit(self) -> AnyUnit {
        AnyUnit::BinaryOperator(Arc::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::Signature;
    use crate::types::{IntoValue, ValueType};
    use crate::unit::{FnBiFunction, FnFunction, FnOperator, FnPredicate};

    fn f<U: Function + 'static>(u: U) -> Option<Arc<dyn Function>> {
        Some(Arc::new(u))
    }

    #[test]
    fn predicate_without_core_passes() {
        let p: AdaptedPredicate = AdaptedPredicate::default();
        assert_eq!(p.test(&Value::Text("anything".into())), Ok(true));
    }

    #[test]
    fn predicate_tests_adapted_input() {
        let p: AdaptedPredicate = AdaptedPredicate::new(f(FnFunction::new("len", |s: String| s.len() as i64)),
                                                        Some(Arc::new(FnPredicate::new("gt2", |n: i64| n > 2))));
        assert_eq!(p.test(&Value::Text("abc".into())), Ok(true));
        assert_eq!(p.test(&Value::Text("ab".into())), Ok(false));
        let sig = Signature::input_of(&p).unwrap();
        assert_eq!(sig.classes(), vec![ValueType::Text]);
    }

    #[test]
    fn function_merges_output_into_original_input() {
        let double: AdaptedFunction = AdaptedFunction::new(None,
                                                           Some(Arc::new(FnBiFunction::new("pair", |ctx: i64, o: i64| (ctx, o)))),
                                                           f(FnFunction::new("double", |n: i64| n * 2)));
        assert_eq!(double.apply(Value::Long(4)), Ok((4i64, 8i64).into_value()));
        let sig = Signature::output_of(&double).unwrap();
        assert_eq!(sig.num_classes(), Some(2));
    }

    #[test]
    fn function_without_core_is_a_config_error() {
        let empty: AdaptedFunction = AdaptedFunction::default();
        assert_eq!(empty.apply(Value::Null), Err(EvalError::Config(ConfigError::MissingFunction)));
    }

    #[test]
    fn operator_uses_pre_adaptation_state_as_context() {
        let op: AdaptedBinaryOperator =
            AdaptedBinaryOperator::new(f(FnFunction::new("len", |s: String| s.len() as i64)),
                                       Some(Arc::new(FnBiFunction::new("tag", |ctx: String, o: i64| format!("{ctx}={o}")))),
                                       Some(Arc::new(FnOperator::new("sum", |a: i64, b: i64| a + b))));
        assert_eq!(op.apply(Value::Text("ab".into()), Value::Text("xyz".into())),
                   Ok(Value::Text("ab=5".into())));
    }

    #[test]
    fn operator_without_core_fails() {
        let op: AdaptedBinaryOperator = AdaptedBinaryOperator::default();
        assert_eq!(op.apply(Value::Long(1), Value::Long(2)), Err(EvalError::Config(ConfigError::MissingOperator)));
    }

    #[test]
    fn equality_is_structural() {
        let core: Arc<dyn Predicate> = Arc::new(FnPredicate::new("t", |_: Value| true));
        let a: AdaptedPredicate = AdaptedPredicate::new(None, Some(core.clone()));
        let b: AdaptedPredicate = AdaptedPredicate::new(None, Some(core));
        assert_eq!(a, b);
        assert_ne!(a, AdaptedPredicate::default());
    }
}
