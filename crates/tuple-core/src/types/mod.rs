//! Modelo de tipos en runtime.
//!
//! - `ValueType`: la "clase" concreta de un valor (o de un parámetro
//!   declarado), con su relación de subtipado.
//! - `Value`: valor dinámico que circula por los pipelines.
//! - `TypeExpr` / `TypeVar`: expresiones de tipo genéricas usadas por las
//!   declaraciones de las unidades y resueltas por el motor de firmas.
//! - `Typed` / `FromValue` / `IntoValue`: capa tipada sobre `Value`.

mod expr;
mod value;

pub use expr::{TypeExpr, TypeVar, VarKey};
pub use value::{FromValue, IntoValue, Typed, Value};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Tipo concreto en runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Supertipo de todo (equivalente a `Object`).
    Any,
    /// Centinela para parámetros genéricos no resolubles. Acepta cualquier cosa.
    Unknown,
    Null,
    Bool,
    /// Supertipo abstracto de los numéricos.
    Number,
    Short,
    Int,
    Long,
    Double,
    Text,
    /// Contrato de tupla (cualquier registro).
    Tuple,
    /// Tupla posicional de aridad libre.
    ArrayTuple,
    /// Tupla indexada por nombre.
    MapTuple,
    /// Tupla posicional de aridad fija. `Fixed(1)` es el marcador de tupla de
    /// un único campo.
    Fixed(usize),
}

impl ValueType {
    /// `true` si un valor de tipo `other` puede usarse donde se declara `self`.
    pub fn is_assignable_from(&self, other: &ValueType) -> bool {
        use ValueType::*;
        match (self, other) {
            (Unknown, _) | (_, Unknown) => true,
            (Any, _) | (_, Null) => true,
            (a, b) if a == b => true,
            (Number, Short | Int | Long | Double) => true,
            (Tuple, ArrayTuple | MapTuple | Fixed(_)) => true,
            (ArrayTuple, Fixed(_)) => true,
            _ => false,
        }
    }

    /// Implementa el contrato de tupla.
    pub fn is_tuple(&self) -> bool {
        matches!(self, ValueType::Tuple | ValueType::ArrayTuple | ValueType::MapTuple | ValueType::Fixed(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Number | ValueType::Short | ValueType::Int | ValueType::Long | ValueType::Double)
    }

    /// Marcador canónico de tupla de aridad fija 1.
    pub fn is_single_field_marker(&self) -> bool {
        *self == ValueType::Fixed(1)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Unknown => f.write_str("UnknownGenericType"),
            ValueType::Fixed(n) => write!(f, "Tuple{n}"),
            other => write!(f, "{other:?}"),
        }
    }
}

impl FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = match s.trim() {
            "Any" | "Object" => ValueType::Any,
            "Unknown" | "UnknownGenericType" => ValueType::Unknown,
            "Null" => ValueType::Null,
            "Bool" | "Boolean" => ValueType::Bool,
            "Number" => ValueType::Number,
            "Short" => ValueType::Short,
            "Int" | "Integer" => ValueType::Int,
            "Long" => ValueType::Long,
            "Double" => ValueType::Double,
            "Text" | "String" => ValueType::Text,
            "Tuple" => ValueType::Tuple,
            "ArrayTuple" => ValueType::ArrayTuple,
            "MapTuple" => ValueType::MapTuple,
            other => match other.strip_prefix("Tuple").map(str::parse::<usize>) {
                Some(Ok(n)) if n > 0 => ValueType::Fixed(n),
                _ => return Err(format!("unknown value type: {other}")),
            },
        };
        Ok(t)
    }
}

#[cfg(test)]
mod tests {
    use super::ValueType::*;
    use super::*;

    #[test]
    fn numeric_lattice() {
        assert!(Number.is_assignable_from(&Long));
        assert!(Number.is_assignable_from(&Short));
        assert!(!Long.is_assignable_from(&Number));
        assert!(!Long.is_assignable_from(&Int));
        assert!(Any.is_assignable_from(&Text));
    }

    #[test]
    fn tuple_lattice() {
        assert!(Tuple.is_assignable_from(&MapTuple));
        assert!(Tuple.is_assignable_from(&Fixed(3)));
        assert!(ArrayTuple.is_assignable_from(&Fixed(2)));
        assert!(!Fixed(2).is_assignable_from(&ArrayTuple));
        assert!(!Fixed(2).is_assignable_from(&Fixed(3)));
    }

    #[test]
    fn null_and_unknown_are_permissive() {
        assert!(Long.is_assignable_from(&Null));
        assert!(Unknown.is_assignable_from(&Text));
        assert!(Text.is_assignable_from(&Unknown));
    }

    #[test]
    fn parse_and_display_roundtrip_names() {
        assert_eq!("Tuple2".parse::<ValueType>(), Ok(Fixed(2)));
        assert_eq!("Integer".parse::<ValueType>(), Ok(Int));
        assert!("Tuple0".parse::<ValueType>().is_err());
        assert_eq!(Fixed(1).to_string(), "Tuple1");
        assert_eq!(Unknown.to_string(), "UnknownGenericType");
        assert_eq!(Long.to_string(), "Long");
    }
}
