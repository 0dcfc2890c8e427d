//! Selección y proyección de campos de tupla.
//!
//! - `TupleInputAdapter` (función `Tuple → FI`): un campo seleccionado se
//!   devuelve como escalar; varios construyen una proyección posicional de
//!   sólo lectura (claves `0..n-1`).
//! - `TupleOutputAdapter` (bi-función `(estado, salida) → estado`): un campo
//!   recibe la salida tal cual; varios reparten los valores de la salida en
//!   orden.
//! - `ReverseTupleOutputAdapter`: igual, con argumentos `(salida, estado)`.
//!
//! Selección/proyección sin configurar (`None`) es un error de configuración
//! al evaluar. Una selección vacía es válida y produce una tupla vacía.

use std::sync::Arc;

use super::{ArrayTuple, FieldRef, Record, Tuple};
use crate::errors::{ConfigError, EvalError, TupleError};
use crate::registry::{AnyUnit, FromSpec, Registry, UnitSpec};
use crate::signature::Declaration;
use crate::types::{TypeExpr, Value, ValueType};
use crate::unit::{BiFunction, Function, Unit, UnitKind};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TupleInputAdapter {
    selection: Option<Vec<FieldRef>>,
}

impl TupleInputAdapter {
    pub fn new(selection: Vec<FieldRef>) -> Self {
        Self { selection: Some(selection) }
    }

    pub fn selection(&self) -> Option<&[FieldRef]> {
        self.selection.as_deref()
    }

    pub fn set_selection(&mut self, selection: Vec<FieldRef>) {
        self.selection = Some(selection);
    }

    /// Extrae la selección de `record` sin consumirlo.
    pub fn select(&self, record: &Record) -> Result<Value, EvalError> {
        let selection = self.selection.as_ref().ok_or(ConfigError::MissingSelection)?;
        if let [single] = selection.as_slice() {
            return Ok(record.get(single)?.clone());
        }
        let values = selection.iter().map(|r| record.get(r).cloned()).collect::<Result<Vec<_>, TupleError>>()?;
        Ok(Value::Tuple(Record::Array(ArrayTuple::projection(values))))
    }
}

impl Unit for TupleInputAdapter {
    fn kind(&self) -> UnitKind {
        UnitKind::Function
    }

    fn declaration(&self) -> Result<Declaration, ConfigError> {
        let output = match self.selection() {
            Some([_]) => None,
            Some(_) => Some(TypeExpr::Class(ValueType::ArrayTuple)),
            None => None,
        };
        Ok(Declaration::new(UnitKind::Function).generic("TupleInputAdapter", vec![], vec![])
                                               .implements(vec![Some(ValueType::Tuple.into()), output]))
    }

    fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        UnitSpec::of(Self::TAG).with("selection", &self.selection)
    }
}

impl Function for TupleInputAdapter {
    fn apply(&self, input: Value) -> Result<Value, EvalError> {
        if self.selection.is_none() {
            return Err(ConfigError::MissingSelection.into());
        }
        match input.as_tuple() {
            Some(record) => self.select(record),
            None => Err(EvalError::cast(ValueType::Tuple, input.value_type())),
        }
    }
}

impl FromSpec for TupleInputAdapter {
    const TAG: &'static str = "tuple_core::TupleInputAdapter";

    fn from_spec(spec: &UnitSpec, _registry: &Registry) -> Result<Self, ConfigError> {
        Ok(Self { selection: spec.field("selection")? })
    }

    fn into_unit(self) -> AnyUnit {
        AnyUnit::Function(Arc::new(self))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TupleOutputAdapter {
    projection: Option<Vec<FieldRef>>,
}

impl TupleOutputAdapter {
    pub fn new(projection: Vec<FieldRef>) -> Self {
        Self { projection: Some(projection) }
    }

    pub fn projection(&self) -> Option<&[FieldRef]> {
        self.projection.as_deref()
    }

    pub fn set_projection(&mut self, projection: Vec<FieldRef>) {
        self.projection = Some(projection);
    }

    /// Escribe `output` en `state` según la proyección y devuelve el estado.
    pub fn project(&self, state: Value, output: Value) -> Result<Value, EvalError> {
        let projection = self.projection.as_ref().ok_or(ConfigError::MissingProjection)?;
        let mut record = state.into_tuple()?;
        if let [single] = projection.as_slice() {
            record.put(single, output)?;
            return Ok(Value::Tuple(record));
        }
        let values = output.into_tuple()?.into_values();
        if values.len() > projection.len() {
            return Err(TupleError::ProjectionOverflow(projection.len()).into());
        }
        for (field, value) in projection.iter().zip(values) {
            record.put(field, value)?;
        }
        Ok(Value::Tuple(record))
    }

    fn declaration_for(&self, owner: &str, reversed: bool) -> Declaration {
        let tuple = Some(TypeExpr::Class(ValueType::Tuple));
        let args = if reversed {
            vec![None, tuple.clone(), tuple]
        } else {
            vec![tuple.clone(), None, tuple]
        };
        Declaration::new(UnitKind::BiFunction).generic(owner, vec![], vec![]).implements(args)
    }
}

impl Unit for TupleOutputAdapter {
    fn kind(&self) -> UnitKind {
        UnitKind::BiFunction
    }

    fn declaration(&self) -> Result<Declaration, ConfigError> {
        Ok(self.declaration_for("TupleOutputAdapter", false))
    }

    fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        UnitSpec::of(Self::TAG).with("projection", &self.projection)
    }
}

impl BiFunction for TupleOutputAdapter {
    fn apply(&self, state: Value, output: Value) -> Result<Value, EvalError> {
        self.project(state, output)
    }
}

impl FromSpec for TupleOutputAdapter {
    const TAG: &'static str = "tuple_core::TupleOutputAdapter";

    fn from_spec(spec: &UnitSpec, _registry: &Registry) -> Result<Self, ConfigError> {
        Ok(Self { projection: spec.field("projection")? })
    }

    fn into_unit(self) -> AnyUnit {
        AnyUnit::BiFunction(Arc::new(self))
    }
}

/// `TupleOutputAdapter` con los argumentos invertidos: `(salida, estado)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReverseTupleOutputAdapter {
    inner: TupleOutputAdapter,
}

impl ReverseTupleOutputAdapter {
    pub fn new(projection: Vec<FieldRef>) -> Self {
        Self { inner: TupleOutputAdapter::new(projection) }
    }

    pub fn projection(&self) -> Option<&[FieldRef]> {
        self.inner.projection()
    }
}

impl Unit for ReverseTupleOutputAdapter {
    fn kind(&self) -> UnitKind {
        UnitKind::BiFunction
    }

    fn declaration(&self) -> Result<Declaration, ConfigError> {
        Ok(self.inner.declaration_for("ReverseTupleOutputAdapter", true))
    }

    fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        UnitSpec::of(Self::TAG).with("projection", &self.inner.projection)
    }
}

impl BiFunction for ReverseTupleOutputAdapter {
    fn apply(&self, output: Value, state: Value) -> Result<Value, EvalError> {
        self.inner.project(state, output)
    }
}

impl FromSpec for ReverseTupleOutputAdapter {
    const TAG: &'static str = "tuple_core::ReverseTupleOutputAdapter";

    fn from_spec(spec: &UnitSpec, _registry: &Registry) -> Result<Self, ConfigError> {
        Ok(Self { inner: TupleOutputAdapter { projection: spec.field("projection")? } })
    }

    fn into_unit(self) -> AnyUnit {
        AnyUnit::BiFunction(Arc::new(self))
    }
}
