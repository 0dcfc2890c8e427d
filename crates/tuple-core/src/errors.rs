//! Errores del core.
//!
//! Dos familias bien separadas:
//! - `ConfigError`: configuración inválida, se reporta en el punto de uso y
//!   no es recuperable por el pipeline (adaptador sin selección, operador sin
//!   core, tag desconocido, declaración de tipos mal formada...).
//! - `EvalError`: fallos durante `test`/`apply`. Incluye los "cast" tardíos:
//!   el core no valida tipos antes de evaluar, el caller debe usar
//!   `Signature::assignable` si necesita esa garantía.
//!
//! Las incompatibilidades estructurales de tipos NO son errores: se acumulan
//! en `ValidationResult`.

use thiserror::Error;

use crate::types::ValueType;
use crate::unit::UnitKind;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("tuple input adapter has no selection")] MissingSelection,
    #[error("tuple output adapter has no projection")] MissingProjection,
    #[error("adapted function has no core function")] MissingFunction,
    #[error("binary operator has no core operator")] MissingOperator,
    #[error("{owner} claims to be a {kind} but does not declare its {kind} contract")]
    NotAFunctionalKind { owner: String, kind: UnitKind },
    #[error("{owner} declares {found} type argument(s) for {expected} parameter(s)")]
    MalformedDeclaration { owner: String, expected: usize, found: usize },
    #[error("unknown unit class: {0}")] UnknownTag(String),
    #[error("ambiguous unit class {tag}: candidates {candidates:?}")]
    AmbiguousTag { tag: String, candidates: Vec<String> },
    #[error("unit {tag} is a {found}, expected a {expected}")]
    KindMismatch { tag: String, expected: UnitKind, found: UnitKind },
    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },
    #[error("{0} cannot be described as a unit spec")] NotSerializable(String),
}

impl ConfigError {
    pub(crate) fn invalid_field(field: &str, reason: impl ToString) -> Self {
        ConfigError::InvalidField { field: field.to_string(),
                                    reason: reason.to_string() }
    }
}

/// Errores al operar sobre tuplas.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TupleError {
    #[error("index {index} out of bounds for tuple of {len} field(s)")]
    OutOfBounds { index: usize, len: usize },
    #[error("field reference `{field}` is not supported by a {backing} tuple")]
    UnsupportedRef { field: String, backing: &'static str },
    #[error("tuple projection is read-only")] ReadOnly,
    #[error("output has more values than the {0} projected field(s)")] ProjectionOverflow(usize),
}

/// Errores de evaluación de predicados, funciones y operadores.
#[derive(Debug, Error, PartialEq, Clone)]
pub enum EvalError {
    #[error("cannot cast value of type {found} to {expected}")]
    Cast { expected: String, found: ValueType },
    #[error(transparent)] Tuple(#[from] TupleError),
    #[error(transparent)] Config(#[from] ConfigError),
    #[error("arithmetic overflow: {0}")] Overflow(String),
}

impl EvalError {
    pub fn cast(expected: impl ToString, found: ValueType) -> Self {
        EvalError::Cast { expected: expected.to_string(),
                          found }
    }

    pub fn is_cast(&self) -> bool {
        matches!(self, EvalError::Cast { .. })
    }
}
