//! Abstracción de tupla (registro indexado por referencia) y capa de
//! adaptación sobre tuplas.
//!
//! - `Tuple`: contrato `get`/`put`/`values`.
//! - `ArrayTuple` (posicional, aridad libre), `FixedTuple` (posicional,
//!   aridad fija) y `MapTuple` (por nombre, orden de inserción).
//! - `Record`: la tupla concreta que viaja dentro de `Value::Tuple`.
//! - `adapters`: selección/proyección de campos (`TupleInputAdapter`,
//!   `TupleOutputAdapter`, `ReverseTupleOutputAdapter`).
//! - `adapted`: predicados/funciones/operadores adaptados a tuplas.
//! - `composite`: builders `select → execute → project`.

pub mod adapted;
pub mod adapters;
pub mod composite;

pub use adapted::{TupleAdaptedBinaryOperator, TupleAdaptedFunction, TupleAdaptedPredicate};
pub use adapters::{ReverseTupleOutputAdapter, TupleInputAdapter, TupleOutputAdapter};
pub use composite::{TupleBinaryOperatorComposite, TupleFunctionComposite, TuplePredicateComposite};

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::TupleError;
use crate::types::{Value, ValueType};

static NULL_VALUE: Value = Value::Null;

/// Referencia a un campo: posición o nombre.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldRef {
    Index(usize),
    Name(String),
}

impl From<usize> for FieldRef {
    fn from(i: usize) -> Self {
        FieldRef::Index(i)
    }
}

impl From<&str> for FieldRef {
    fn from(s: &str) -> Self {
        FieldRef::Name(s.to_string())
    }
}

impl From<String> for FieldRef {
    fn from(s: String) -> Self {
        FieldRef::Name(s)
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRef::Index(i) => write!(f, "{i}"),
            FieldRef::Name(n) => f.write_str(n),
        }
    }
}

/// Convierte una lista de referencias (`["a", "b"]`, `[0, 1]`...).
pub fn refs<R: Into<FieldRef>>(items: impl IntoIterator<Item = R>) -> Vec<FieldRef> {
    items.into_iter().map(Into::into).collect()
}

/// Contrato de registro indexado por referencia.
pub trait Tuple {
    fn get(&self, field: &FieldRef) -> Result<&Value, TupleError>;
    fn put(&mut self, field: &FieldRef, value: Value) -> Result<(), TupleError>;
    fn values(&self) -> Box<dyn Iterator<Item = &Value> + '_>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn unsupported(field: &FieldRef, backing: &'static str) -> TupleError {
    TupleError::UnsupportedRef { field: field.to_string(),
                                 backing }
}

/// Tupla posicional de aridad libre. `put` más allá del final la extiende
/// (rellenando con `Null`). Una proyección de sólo lectura rechaza `put`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArrayTuple {
    values: Vec<Value>,
    read_only: bool,
}

impl ArrayTuple {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: Vec<Value>) -> Self {
        Self { values,
               read_only: false }
    }

    /// Proyección inmutable (resultado de una selección múltiple).
    pub fn projection(values: Vec<Value>) -> Self {
        Self { values,
               read_only: true }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }
}

impl FromIterator<Value> for ArrayTuple {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::from_values(iter.into_iter().collect())
    }
}

impl Tuple for ArrayTuple {
    fn get(&self, field: &FieldRef) -> Result<&Value, TupleError> {
        match field {
            FieldRef::Index(i) => self.values.get(*i).ok_or(TupleError::OutOfBounds { index: *i,
                                                                                     len: self.values.len() }),
            FieldRef::Name(_) => Err(unsupported(field, "array")),
        }
    }

    fn put(&mut self, field: &FieldRef, value: Value) -> Result<(), TupleError> {
        if self.read_only {
            return Err(TupleError::ReadOnly);
        }
        match field {
            FieldRef::Index(i) => {
                if *i >= self.values.len() {
                    self.values.resize(*i + 1, Value::Null);
                }
                self.values[*i] = value;
                Ok(())
            }
            FieldRef::Name(_) => Err(unsupported(field, "array")),
        }
    }

    fn values(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        Box::new(self.values.iter())
    }

    fn len(&self) -> usize {
        self.values.len()
    }
}

/// Tupla posicional con aridad fija desde su construcción.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedTuple {
    values: Vec<Value>,
}

impl FixedTuple {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Tupla de `arity` campos inicializados a `Null`.
    pub fn with_arity(arity: usize) -> Self {
        Self { values: vec![Value::Null; arity] }
    }

    pub fn arity(&self) -> usize {
        self.values.len()
    }
}

impl Tuple for FixedTuple {
    fn get(&self, field: &FieldRef) -> Result<&Value, TupleError> {
        match field {
            FieldRef::Index(i) => self.values.get(*i).ok_or(TupleError::OutOfBounds { index: *i,
                                                                                     len: self.values.len() }),
            FieldRef::Name(_) => Err(unsupported(field, "fixed")),
        }
    }

    fn put(&mut self, field: &FieldRef, value: Value) -> Result<(), TupleError> {
        match field {
            FieldRef::Index(i) => {
                let len = self.values.len();
                let slot = self.values.get_mut(*i).ok_or(TupleError::OutOfBounds { index: *i, len })?;
                *slot = value;
                Ok(())
            }
            FieldRef::Name(_) => Err(unsupported(field, "fixed")),
        }
    }

    fn values(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        Box::new(self.values.iter())
    }

    fn len(&self) -> usize {
        self.values.len()
    }
}

/// Tupla indexada por nombre. Un campo ausente se lee como `Null`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapTuple {
    values: IndexMap<String, Value>,
}

impl MapTuple {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Tuple for MapTuple {
    fn get(&self, field: &FieldRef) -> Result<&Value, TupleError> {
        match field {
            FieldRef::Name(n) => Ok(self.values.get(n).unwrap_or(&NULL_VALUE)),
            FieldRef::Index(_) => Err(unsupported(field, "map")),
        }
    }

    fn put(&mut self, field: &FieldRef, value: Value) -> Result<(), TupleError> {
        match field {
            FieldRef::Name(n) => {
                self.values.insert(n.clone(), value);
                Ok(())
            }
            FieldRef::Index(_) => Err(unsupported(field, "map")),
        }
    }

    fn values(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        Box::new(self.values.values())
    }

    fn len(&self) -> usize {
        self.values.len()
    }
}

/// Tupla concreta transportada por `Value::Tuple`.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Array(ArrayTuple),
    Fixed(FixedTuple),
    Map(MapTuple),
}

impl Record {
    pub fn value_type(&self) -> ValueType {
        match self {
            Record::Array(_) => ValueType::ArrayTuple,
            Record::Fixed(t) => ValueType::Fixed(t.arity()),
            Record::Map(_) => ValueType::MapTuple,
        }
    }

    pub fn into_values(self) -> Vec<Value> {
        match self {
            Record::Array(t) => t.values,
            Record::Fixed(t) => t.values,
            Record::Map(t) => t.values.into_values().collect(),
        }
    }

    fn inner(&self) -> &dyn Tuple {
        match self {
            Record::Array(t) => t,
            Record::Fixed(t) => t,
            Record::Map(t) => t,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Tuple {
        match self {
            Record::Array(t) => t,
            Record::Fixed(t) => t,
            Record::Map(t) => t,
        }
    }
}

impl Tuple for Record {
    fn get(&self, field: &FieldRef) -> Result<&Value, TupleError> {
        self.inner().get(field)
    }

    fn put(&mut self, field: &FieldRef, value: Value) -> Result<(), TupleError> {
        self.inner_mut().put(field, value)
    }

    fn values(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        self.inner().values()
    }

    fn len(&self) -> usize {
        self.inner().len()
    }
}

impl From<ArrayTuple> for Record {
    fn from(t: ArrayTuple) -> Self {
        Record::Array(t)
    }
}

impl From<FixedTuple> for Record {
    fn from(t: FixedTuple) -> Self {
        Record::Fixed(t)
    }
}

impl From<MapTuple> for Record {
    fn from(t: MapTuple) -> Self {
        Record::Map(t)
    }
}

impl From<MapTuple> for Value {
    fn from(t: MapTuple) -> Self {
        Value::Tuple(Record::Map(t))
    }
}

impl From<ArrayTuple> for Value {
    fn from(t: ArrayTuple) -> Self {
        Value::Tuple(Record::Array(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_tuple_grows_on_put() {
        let mut t = ArrayTuple::new();
        t.put(&FieldRef::Index(2), Value::Long(7)).unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t.get(&0.into()), Ok(&Value::Null));
        assert_eq!(t.get(&2.into()), Ok(&Value::Long(7)));
        assert_eq!(t.get(&5.into()), Err(TupleError::OutOfBounds { index: 5, len: 3 }));
    }

    #[test]
    fn projection_is_read_only() {
        let mut t = ArrayTuple::projection(vec![Value::Long(1)]);
        assert_eq!(t.put(&0.into(), Value::Long(2)), Err(TupleError::ReadOnly));
        assert!(t.is_read_only());
    }

    #[test]
    fn fixed_tuple_rejects_out_of_range_put() {
        let mut t = FixedTuple::with_arity(2);
        assert!(t.put(&1.into(), Value::Bool(true)).is_ok());
        assert_eq!(t.put(&2.into(), Value::Bool(true)), Err(TupleError::OutOfBounds { index: 2, len: 2 }));
        assert_eq!(Record::from(t).value_type(), ValueType::Fixed(2));
    }

    #[test]
    fn map_tuple_reads_missing_as_null_and_keeps_order() {
        let t = MapTuple::new().with("b", 2i64).with("a", 1i64);
        assert_eq!(t.get(&"zzz".into()), Ok(&Value::Null));
        let vals: Vec<&Value> = t.values().collect();
        assert_eq!(vals, vec![&Value::Long(2), &Value::Long(1)]);
        assert!(matches!(t.get(&0.into()), Err(TupleError::UnsupportedRef { backing: "map", .. })));
    }

    #[test]
    fn field_refs_deserialize_untagged() {
        let r: Vec<FieldRef> = serde_json::from_str(r#"["a", 1]"#).unwrap();
        assert_eq!(r, vec![FieldRef::Name("a".into()), FieldRef::Index(1)]);
        assert_eq!(refs(["x", "y"]), vec![FieldRef::from("x"), FieldRef::from("y")]);
    }
}
