//! Valor dinámico y capa tipada.
//!
//! `Value` es la representación neutra que consumen predicados, funciones y
//! operadores. Los traits `Typed`, `FromValue` e `IntoValue` permiten escribir
//! unidades con tipos Rust concretos: la conversión es explícita y falla con
//! `EvalError::Cast` en el punto de uso.

use serde_json::Value as Json;

use super::{TypeExpr, ValueType};
use crate::errors::EvalError;
use crate::tuple::{ArrayTuple, FixedTuple, MapTuple, Record, Tuple};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Short(i16),
    Int(i32),
    Long(i64),
    Double(f64),
    Text(String),
    Tuple(Record),
}

impl Value {
    /// Clase en runtime del valor.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::Short(_) => ValueType::Short,
            Value::Int(_) => ValueType::Int,
            Value::Long(_) => ValueType::Long,
            Value::Double(_) => ValueType::Double,
            Value::Text(_) => ValueType::Text,
            Value::Tuple(r) => r.value_type(),
        }
    }

    pub fn is_tuple(&self) -> bool {
        matches!(self, Value::Tuple(_))
    }

    pub fn as_tuple(&self) -> Option<&Record> {
        match self {
            Value::Tuple(r) => Some(r),
            _ => None,
        }
    }

    /// Consume el valor esperando una tupla.
    pub fn into_tuple(self) -> Result<Record, EvalError> {
        match self {
            Value::Tuple(r) => Ok(r),
            other => Err(EvalError::cast(ValueType::Tuple, other.value_type())),
        }
    }

    pub fn from_json(json: &Json) -> Value {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Long(i),
                None => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::Text(s.clone()),
            Json::Array(items) => Value::Tuple(Record::Array(items.iter().map(Value::from_json).collect())),
            Json::Object(map) => {
                let mut t = MapTuple::new();
                for (k, v) in map {
                    t.insert(k.clone(), Value::from_json(v));
                }
                Value::Tuple(Record::Map(t))
            }
        }
    }

    pub fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Short(v) => Json::from(*v),
            Value::Int(v) => Json::from(*v),
            Value::Long(v) => Json::from(*v),
            Value::Double(v) => serde_json::Number::from_f64(*v).map(Json::Number).unwrap_or(Json::Null),
            Value::Text(s) => Json::String(s.clone()),
            Value::Tuple(Record::Map(m)) => {
                Json::Object(m.entries().map(|(k, v)| (k.to_string(), v.to_json())).collect())
            }
            Value::Tuple(r) => Json::Array(r.values().map(Value::to_json).collect()),
        }
    }
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        Value::from_json(&json)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Tuple(r)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

/// Tipo Rust con una expresión de tipo conocida. `None` significa "genérico
/// sin declarar" (el motor de firmas lo trata como desconocido).
pub trait Typed {
    fn type_expr() -> Option<TypeExpr>;
}

pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, EvalError>;
}

pub trait IntoValue {
    fn into_value(self) -> Value;
}

macro_rules! scalar_value {
    ($ty:ty, $vt:ident, $variant:ident $(, $wider:ident)*) => {
        impl Typed for $ty {
            fn type_expr() -> Option<TypeExpr> { Some(TypeExpr::Class(ValueType::$vt)) }
        }
        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self, EvalError> {
                match value {
                    Value::$variant(v) => Ok(v),
                    $(Value::$wider(v) => Ok(v.into()),)*
                    other => Err(EvalError::cast(ValueType::$vt, other.value_type())),
                }
            }
        }
        impl IntoValue for $ty {
            fn into_value(self) -> Value { Value::$variant(self) }
        }
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self { Value::$variant(v) }
        }
    };
}

scalar_value!(bool, Bool, Bool);
scalar_value!(i16, Short, Short);
scalar_value!(i32, Int, Int, Short);
scalar_value!(i64, Long, Long, Short, Int);
scalar_value!(f64, Double, Double, Short, Int);
scalar_value!(String, Text, Text);

impl Typed for Value {
    fn type_expr() -> Option<TypeExpr> {
        None
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, EvalError> {
        Ok(value)
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl Typed for Record {
    fn type_expr() -> Option<TypeExpr> {
        Some(TypeExpr::Class(ValueType::Tuple))
    }
}

impl FromValue for Record {
    fn from_value(value: Value) -> Result<Self, EvalError> {
        value.into_tuple()
    }
}

impl IntoValue for Record {
    fn into_value(self) -> Value {
        Value::Tuple(self)
    }
}

fn element_expr<T: Typed>() -> TypeExpr {
    T::type_expr().unwrap_or(TypeExpr::Class(ValueType::Unknown))
}

// Vec<T> es una tupla "bolsa": cualquier aridad, un único tipo de campo.
impl<T: Typed> Typed for Vec<T> {
    fn type_expr() -> Option<TypeExpr> {
        Some(TypeExpr::bag_of(element_expr::<T>()))
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, EvalError> {
        value.into_tuple()?.into_values().into_iter().map(T::from_value).collect()
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::Tuple(Record::Array(ArrayTuple::from_values(self.into_iter().map(IntoValue::into_value).collect())))
    }
}

macro_rules! fixed_tuple_value {
    ($n:expr; $($name:ident / $var:ident),+) => {
        impl<$($name: Typed),+> Typed for ($($name,)+) {
            fn type_expr() -> Option<TypeExpr> {
                Some(TypeExpr::fixed(vec![$(element_expr::<$name>()),+]))
            }
        }
        impl<$($name: FromValue),+> FromValue for ($($name,)+) {
            fn from_value(value: Value) -> Result<Self, EvalError> {
                let record = value.into_tuple()?;
                if record.len() != $n {
                    return Err(EvalError::cast(ValueType::Fixed($n), record.value_type()));
                }
                let mut values = record.into_values().into_iter();
                Ok(($($name::from_value(values.next().unwrap_or_default())?,)+))
            }
        }
        impl<$($name: IntoValue),+> IntoValue for ($($name,)+) {
            fn into_value(self) -> Value {
                let ($($var,)+) = self;
                Value::Tuple(Record::Fixed(FixedTuple::new(vec![$($var.into_value()),+])))
            }
        }
    };
}

fixed_tuple_value!(1; A / a);
fixed_tuple_value!(2; A / a, B / b);
fixed_tuple_value!(3; A / a, B / b, C / c);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_conversion_builds_tuples() {
        let v = Value::from_json(&json!({"a": 1, "b": [1.5, "x"], "c": null}));
        assert_eq!(v.value_type(), ValueType::MapTuple);
        let back = v.to_json();
        assert_eq!(back, json!({"a": 1, "b": [1.5, "x"], "c": null}));
    }

    #[test]
    fn widening_conversions_only() {
        assert_eq!(i64::from_value(Value::Short(3)), Ok(3));
        assert_eq!(i32::from_value(Value::Short(3)), Ok(3));
        assert!(i16::from_value(Value::Long(3)).is_err());
        let err = i64::from_value(Value::Text("3".into())).unwrap_err();
        assert_eq!(err, EvalError::cast("Long", ValueType::Text));
    }

    #[test]
    fn typed_expressions_for_tuples() {
        assert_eq!(<Vec<i64>>::type_expr(), Some(TypeExpr::bag_of(ValueType::Long.into())));
        assert_eq!(<(i64, String)>::type_expr(),
                   Some(TypeExpr::fixed(vec![ValueType::Long.into(), ValueType::Text.into()])));
        assert_eq!(<Vec<Value>>::type_expr(), Some(TypeExpr::bag_of(ValueType::Unknown.into())));
        assert_eq!(Value::type_expr(), None);
    }

    #[test]
    fn fixed_tuple_conversion_checks_arity() {
        let v = (1i64, 2i64).into_value();
        assert_eq!(v.value_type(), ValueType::Fixed(2));
        assert_eq!(<(i64, i64)>::from_value(v.clone()), Ok((1, 2)));
        let err = <(i64,)>::from_value(v).unwrap_err();
        assert_eq!(err, EvalError::cast("Tuple1", ValueType::Fixed(2)));
    }

    #[test]
    fn bag_conversion_reads_any_tuple() {
        let v = Value::from_json(&json!([1, 2, 3]));
        assert_eq!(<Vec<i64>>::from_value(v), Ok(vec![1, 2, 3]));
    }
}
