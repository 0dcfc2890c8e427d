//! Unidades adaptadas a tupla: una unidad core entre un `TupleInputAdapter`
//! (selección) y, para funciones y operadores, un `TupleOutputAdapter`
//! (proyección).
//!
//! Validan la entrada contra la selección: se esperan tantas clases
//! candidatas como campos seleccionados, y deben encajar en la entrada de la
//! unidad core.

use std::sync::Arc;

use super::{FieldRef, TupleInputAdapter, TupleOutputAdapter};
use crate::adapted::{AdaptedBinaryOperator, AdaptedFunction, AdaptedPredicate};
use crate::errors::{ConfigError, EvalError};
use crate::registry::{AnyUnit, FromSpec, Registry, UnitSpec};
use crate::signature::{resolve_shape, Declaration, Direction, Signature};
use crate::types::{Value, ValueType};
use crate::unit::{BinaryOperator, Function, InputValidator, Predicate, Unit, UnitKind};
use crate::validation::ValidationResult;

fn input_adapter(selection: Option<Vec<FieldRef>>) -> Arc<TupleInputAdapter> {
    let mut adapter = TupleInputAdapter::default();
    if let Some(selection) = selection {
        adapter.set_selection(selection);
    }
    Arc::new(adapter)
}

fn output_adapter(projection: Option<Vec<FieldRef>>) -> Arc<TupleOutputAdapter> {
    let mut adapter = TupleOutputAdapter::default();
    if let Some(projection) = projection {
        adapter.set_projection(projection);
    }
    Arc::new(adapter)
}

/// Valida las clases de los campos seleccionados contra la entrada `core`.
fn validate_selection(selection: Option<&[FieldRef]>,
                      core: Option<Result<Signature<'_>, ConfigError>>,
                      candidates: &[ValueType])
                      -> ValidationResult {
    let Some(selection) = selection else {
        return ValidationResult::with_error(ConfigError::MissingSelection.to_string());
    };
    if selection.len() != candidates.len() {
        return ValidationResult::with_error(format!("selection of {} field(s) but {} candidate(s) were given",
                                                    selection.len(),
                                                    candidates.len()));
    }
    let sig = match core {
        None => return ValidationResult::new(),
        Some(Err(e)) => return ValidationResult::with_error(e.to_string()),
        Some(Ok(sig)) => sig,
    };
    match (&sig, candidates) {
        // un campo: el valor seleccionado es el argumento completo
        (Signature::Tuple(_), [single]) => {
            sig.accepts(&Signature::from_expr("selection", Direction::Input, &(*single).into()))
        }
        // varios campos: la unidad recibe la proyección
        (Signature::Singleton(_), c) if c.len() != 1 => sig.check(&[ValueType::ArrayTuple]),
        _ => sig.assignable(candidates),
    }
}

// -------------------------------------------------------------
// TupleAdaptedPredicate
// -------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TupleAdaptedPredicate(AdaptedPredicate<TupleInputAdapter>);

impl TupleAdaptedPredicate {
    pub fn new(selection: Vec<FieldRef>, predicate: Arc<dyn Predicate>) -> Self {
        Self(AdaptedPredicate::new(Some(input_adapter(Some(selection))), Some(predicate)))
    }

    pub fn selection(&self) -> Option<&[FieldRef]> {
        self.0.input_adapter().and_then(|a| a.selection())
    }

    pub fn predicate(&self) -> Option<&Arc<dyn Predicate>> {
        self.0.predicate()
    }
}

impl Default for TupleAdaptedPredicate {
    fn default() -> Self {
        Self(AdaptedPredicate::new(Some(input_adapter(None)), None))
    }
}

impl Unit for TupleAdaptedPredicate {
    fn kind(&self) -> UnitKind {
        UnitKind::Predicate
    }

    fn declaration(&self) -> Result<Declaration, ConfigError> {
        self.0.declaration_as("TupleAdaptedPredicate")
    }

    fn input_validator(&self) -> Option<&dyn InputValidator> {
        Some(self)
    }

    fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        UnitSpec::of(Self::TAG).with("selection", self.selection())?
                               .with_unit("predicate", self.predicate().map(Arc::as_ref))
    }
}

impl Predicate for TupleAdaptedPredicate {
    fn test(&self, input: &Value) -> Result<bool, EvalError> {
        self.0.test(input)
    }
}

impl InputValidator for TupleAdaptedPredicate {
    fn is_input_valid(&self, candidates: &[ValueType]) -> ValidationResult {
        let core = self.predicate().map(|p| Signature::input_of(p.as_ref()));
        validate_selection(self.selection(), core, candidates)
    }
}

impl FromSpec for TupleAdaptedPredicate {
    const TAG: &'static str = "tuple_core::TupleAdaptedPredicate";

    fn from_spec(spec: &UnitSpec, registry: &Registry) -> Result<Self, ConfigError> {
        let predicate = registry.optional_field(spec, "predicate", Registry::build_predicate)?;
        Ok(Self(AdaptedPredicate::new(Some(input_adapter(spec.field("selection")?)), predicate)))
    }

    fn into_unit(self) -> AnyUnit {
        AnyUnit::Predicate(Arc::new(self))
    }
}

// -------------------------------------------------------------
// TupleAdaptedFunction
// -------------------------------------------------------------

/// `select → function → project`, con la tupla de entrada como estado sobre
/// el que se proyecta.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleAdaptedFunction(AdaptedFunction<TupleInputAdapter, TupleOutputAdapter>);

impl TupleAdaptedFunction {
    pub fn new(selection: Vec<FieldRef>, function: Arc<dyn Function>, projection: Vec<FieldRef>) -> Self {
        Self(AdaptedFunction::new(Some(input_adapter(Some(selection))),
                                  Some(output_adapter(Some(projection))),
                                  Some(function)))
    }

    pub fn selection(&self) -> Option<&[FieldRef]> {
        self.0.input_adapter().and_then(|a| a.selection())
    }

    pub fn projection(&self) -> Option<&[FieldRef]> {
        self.0.output_adapter().and_then(|a| a.projection())
    }

    pub fn function(&self) -> Option<&Arc<dyn Function>> {
        self.0.function()
    }
}

impl Default for TupleAdaptedFunction {
    fn default() -> Self {
        Self(AdaptedFunction::new(Some(input_adapter(None)), Some(output_adapter(None)), None))
    }
}

impl Unit for TupleAdaptedFunction {
    fn kind(&self) -> UnitKind {
        UnitKind::Function
    }

    fn declaration(&self) -> Result<Declaration, ConfigError> {
        self.0.declaration_as("TupleAdaptedFunction")
    }

    fn input_validator(&self) -> Option<&dyn InputValidator> {
        Some(self)
    }

    fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        UnitSpec::of(Self::TAG).with("selection", self.selection())?
                               .with_unit("function", self.function().map(Arc::as_ref))?
                               .with("projection", self.projection())
    }
}

impl Function for TupleAdaptedFunction {
    fn apply(&self, input: Value) -> Result<Value, EvalError> {
        self.0.apply(input)
    }
}

impl InputValidator for TupleAdaptedFunction {
    fn is_input_valid(&self, candidates: &[ValueType]) -> ValidationResult {
        let core = self.function().map(|f| Signature::input_of(f.as_ref()));
        validate_selection(self.selection(), core, candidates)
    }
}

impl FromSpec for TupleAdaptedFunction {
    const TAG: &'static str = "tuple_core::TupleAdaptedFunction";

    fn from_spec(spec: &UnitSpec, registry: &Registry) -> Result<Self, ConfigError> {
        let function = registry.optional_field(spec, "function", Registry::build_function)?;
        Ok(Self(AdaptedFunction::new(Some(input_adapter(spec.field("selection")?)),
                                     Some(output_adapter(spec.field("projection")?)),
                                     function)))
    }

    fn into_unit(self) -> AnyUnit {
        AnyUnit::Function(Arc::new(self))
    }
}

// -------------------------------------------------------------
// TupleAdaptedBinaryOperator
// -------------------------------------------------------------

/// Selecciona los mismos campos del estado y del input, aplica el operador
/// y proyecta el resultado sobre el estado.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleAdaptedBinaryOperator(AdaptedBinaryOperator<TupleInputAdapter, TupleOutputAdapter>);

impl TupleAdaptedBinaryOperator {
    pub fn new(selection: Vec<FieldRef>, operator: Arc<dyn BinaryOperator>, projection: Vec<FieldRef>) -> Self {
        Self(AdaptedBinaryOperator::new(Some(input_adapter(Some(selection))),
                                        Some(output_adapter(Some(projection))),
                                        Some(operator)))
    }

    pub fn selection(&self) -> Option<&[FieldRef]> {
        self.0.input_adapter().and_then(|a| a.selection())
    }

    pub fn projection(&self) -> Option<&[FieldRef]> {
        self.0.output_adapter().and_then(|a| a.projection())
    }

    pub fn operator(&self) -> Option<&Arc<dyn BinaryOperator>> {
        self.0.operator()
    }
}

impl Default for TupleAdaptedBinaryOperator {
    fn default() -> Self {
        Self(AdaptedBinaryOperator::new(Some(input_adapter(None)), Some(output_adapter(None)), None))
    }
}

impl Unit for TupleAdaptedBinaryOperator {
    fn kind(&self) -> UnitKind {
        UnitKind::BinaryOperator
    }

    fn declaration(&self) -> Result<Declaration, ConfigError> {
        self.0.declaration_as("TupleAdaptedBinaryOperator")
    }

    fn input_validator(&self) -> Option<&dyn InputValidator> {
        Some(self)
    }

    fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        UnitSpec::of(Self::TAG).with("selection", self.selection())?
                               .with_unit("operator", self.operator().map(Arc::as_ref))?
                               .with("projection", self.projection())
    }
}

impl BinaryOperator for TupleAdaptedBinaryOperator {
    fn apply(&self, state: Value, input: Value) -> Result<Value, EvalError> {
        self.0.apply(state, input)
    }
}

impl InputValidator for TupleAdaptedBinaryOperator {
    fn is_input_valid(&self, candidates: &[ValueType]) -> ValidationResult {
        let core = self.operator().map(|op| {
                                      resolve_shape(op.as_ref()).map(|s| {
                                                                    Signature::from_expr(&s.owner, Direction::Input, &s.params[0])
                                                                })
                                  });
        validate_selection(self.selection(), core, candidates)
    }
}

impl FromSpec for TupleAdaptedBinaryOperator {
    const TAG: &'static str = "tuple_core::TupleAdaptedBinaryOperator";

    fn from_spec(spec: &UnitSpec, registry: &Registry) -> Result<Self, ConfigError> {
        let operator = registry.optional_field(spec, "operator", Registry::build_operator)?;
        Ok(Self(AdaptedBinaryOperator::new(Some(input_adapter(spec.field("selection")?)),
                                           Some(output_adapter(spec.field("projection")?)),
                                           operator)))
    }

    fn into_unit(self) -> AnyUnit {
        AnyUnit::BinaryOperator(Arc::new(self))
    }
}
