//! Contratos de las unidades de comportamiento.
//!
//! Una unidad es un predicado, una función, un operador binario o una
//! bi-función que opera sobre `Value`. Toda unidad se auto-describe con
//! `Unit::declaration()` (ver `signature`) y sabe volcarse a un `UnitSpec`
//! para el registro polimórfico.
//!
//! Las unidades se comparan estructuralmente a través de `DynEq`: misma clase
//! concreta y `PartialEq` sobre sus campos.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::errors::{ConfigError, EvalError};
use crate::registry::UnitSpec;
use crate::signature::Declaration;
use crate::types::{FromValue, IntoValue, TypeExpr, TypeVar, Typed, Value, ValueType};
use crate::validation::ValidationResult;

/// Contrato funcional canónico que implementa una unidad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    Predicate,
    Function,
    BinaryOperator,
    BiFunction,
}

/// Forma del único método abstracto del contrato canónico, expresada con sus
/// variables de tipo.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodShape {
    pub params: Vec<TypeExpr>,
    pub ret: TypeExpr,
}

impl UnitKind {
    pub fn canonical_name(&self) -> &'static str {
        match self {
            UnitKind::Predicate => "Predicate",
            UnitKind::Function => "Function",
            UnitKind::BinaryOperator => "BinaryOperator",
            UnitKind::BiFunction => "BiFunction",
        }
    }

    /// Variables de tipo declaradas por el contrato, en orden.
    pub fn type_params(&self) -> Vec<TypeVar> {
        let owner = self.canonical_name();
        let names: &[&str] = match self {
            UnitKind::Predicate | UnitKind::BinaryOperator => &["T"],
            UnitKind::Function => &["T", "R"],
            UnitKind::BiFunction => &["T", "U", "R"],
        };
        names.iter().map(|n| TypeVar::new(owner, *n)).collect()
    }

    pub fn method_shape(&self) -> MethodShape {
        let vars: Vec<TypeExpr> = self.type_params().iter().map(TypeVar::expr).collect();
        match self {
            UnitKind::Predicate => MethodShape { params: vec![vars[0].clone()],
                                                 ret: TypeExpr::Class(ValueType::Bool) },
            UnitKind::Function => MethodShape { params: vec![vars[0].clone()],
                                                ret: vars[1].clone() },
            UnitKind::BinaryOperator => MethodShape { params: vec![vars[0].clone(), vars[0].clone()],
                                                      ret: vars[0].clone() },
            UnitKind::BiFunction => MethodShape { params: vec![vars[0].clone(), vars[1].clone()],
                                                  ret: vars[2].clone() },
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Igualdad sobre trait objects: compara la clase concreta y luego los campos.
pub trait DynEq: Any {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn Any) -> bool;
}

impl<T: Any + PartialEq> DynEq for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<T>().is_some_and(|o| self == o)
    }
}

/// Capacidad de validación de entrada auto-descrita. `Signature::assignable`
/// la prefiere sobre el chequeo estructural.
pub trait InputValidator {
    fn is_input_valid(&self, candidates: &[ValueType]) -> ValidationResult;
}

pub trait OutputValidator {
    fn is_output_valid(&self, candidates: &[ValueType]) -> ValidationResult;
}

/// Parte común de toda unidad.
pub trait Unit: DynEq + fmt::Debug + Send + Sync {
    fn kind(&self) -> UnitKind;

    /// Cadena de declaraciones genéricas hasta el contrato canónico.
    fn declaration(&self) -> Result<Declaration, ConfigError>;

    fn input_validator(&self) -> Option<&dyn InputValidator> {
        None
    }

    fn output_validator(&self) -> Option<&dyn OutputValidator> {
        None
    }

    /// Par `(tag, campos)` que permite reconstruir la unidad.
    fn to_spec(&self) -> Result<UnitSpec, ConfigError>;
}

pub trait Predicate: Unit {
    fn test(&self, input: &Value) -> Result<bool, EvalError>;
}

pub trait Function: Unit {
    fn apply(&self, input: Value) -> Result<Value, EvalError>;
}

pub trait BinaryOperator: Unit {
    fn apply(&self, state: Value, input: Value) -> Result<Value, EvalError>;
}

pub trait BiFunction: Unit {
    fn apply(&self, first: Value, second: Value) -> Result<Value, EvalError>;
}

macro_rules! dyn_unit_eq {
    ($($t:ident),+) => {
        $(
            impl PartialEq for dyn $t {
                fn eq(&self, other: &Self) -> bool {
                    DynEq::dyn_eq(self, DynEq::as_any(other))
                }
            }
        )+
    };
}

dyn_unit_eq!(Predicate, Function, BinaryOperator, BiFunction);

// ---------------------------------------------------------------------------
// Unidades construidas desde closures. Su declaración se deriva de los tipos
// Rust; se comparan por identidad del closure y no son serializables.
// ---------------------------------------------------------------------------

type PredicateFn<I> = dyn Fn(I) -> Result<bool, EvalError> + Send + Sync;
type FunctionFn<I, O> = dyn Fn(I) -> Result<O, EvalError> + Send + Sync;
type OperatorFn<T> = dyn Fn(T, T) -> Result<T, EvalError> + Send + Sync;
type BiFunctionFn<A, B, O> = dyn Fn(A, B) -> Result<O, EvalError> + Send + Sync;

pub struct FnPredicate<I> {
    name: String,
    f: Arc<PredicateFn<I>>,
}

impl<I: FromValue + Typed + 'static> FnPredicate<I> {
    pub fn new(name: impl Into<String>, f: impl Fn(I) -> bool + Send + Sync + 'static) -> Self {
        Self { name: name.into(),
               f: Arc::new(move |i| Ok(f(i))) }
    }

    pub fn try_new(name: impl Into<String>, f: impl Fn(I) -> Result<bool, EvalError> + Send + Sync + 'static) -> Self {
        Self { name: name.into(),
               f: Arc::new(f) }
    }
}

impl<I> Clone for FnPredicate<I> {
    fn clone(&self) -> Self {
        Self { name: self.name.clone(),
               f: Arc::clone(&self.f) }
    }
}

impl<I> PartialEq for FnPredicate<I> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.f, &other.f)
    }
}

impl<I> fmt::Debug for FnPredicate<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPredicate").field("name", &self.name).finish()
    }
}

impl<I: FromValue + Typed + 'static> Unit for FnPredicate<I> {
    fn kind(&self) -> UnitKind {
        UnitKind::Predicate
    }

    fn declaration(&self) -> Result<Declaration, ConfigError> {
        Ok(Declaration::new(UnitKind::Predicate).generic(self.name.clone(), vec![], vec![])
                                                .implements(vec![I::type_expr()]))
    }

    fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        Err(ConfigError::NotSerializable(self.name.clone()))
    }
}

impl<I: FromValue + Typed + 'static> Predicate for FnPredicate<I> {
    fn test(&self, input: &Value) -> Result<bool, EvalError> {
        (self.f)(I::from_value(input.clone())?)
    }
}

pub struct FnFunction<I, O> {
    name: String,
    f: Arc<FunctionFn<I, O>>,
    _marker: PhantomData<fn(I) -> O>,
}

impl<I, O> FnFunction<I, O>
    where I: FromValue + Typed + 'static,
          O: IntoValue + Typed + 'static
{
    pub fn new(name: impl Into<String>, f: impl Fn(I) -> O + Send + Sync + 'static) -> Self {
        Self { name: name.into(),
               f: Arc::new(move |i| Ok(f(i))),
               _marker: PhantomData }
    }

    pub fn try_new(name: impl Into<String>, f: impl Fn(I) -> Result<O, EvalError> + Send + Sync + 'static) -> Self {
        Self { name: name.into(),
               f: Arc::new(f),
               _marker: PhantomData }
    }
}

impl<I, O> Clone for FnFunction<I, O> {
    fn clone(&self) -> Self {
        Self { name: self.name.clone(),
               f: Arc::clone(&self.f),
               _marker: PhantomData }
    }
}

impl<I, O> PartialEq for FnFunction<I, O> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.f, &other.f)
    }
}

impl<I, O> fmt::Debug for FnFunction<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFunction").field("name", &self.name).finish()
    }
}

impl<I, O> Unit for FnFunction<I, O>
    where I: FromValue + Typed + 'static,
          O: IntoValue + Typed + 'static
{
    fn kind(&self) -> UnitKind {
        UnitKind::Function
    }

    fn declaration(&self) -> Result<Declaration, ConfigError> {
        Ok(Declaration::new(UnitKind::Function).generic(self.name.clone(), vec![], vec![])
                                               .implements(vec![I::type_expr(), O::type_expr()]))
    }

    fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        Err(ConfigError::NotSerializable(self.name.clone()))
    }
}

impl<I, O> Function for FnFunction<I, O>
    where I: FromValue + Typed + 'static,
          O: IntoValue + Typed + 'static
{
    fn apply(&self, input: Value) -> Result<Value, EvalError> {
        Ok((self.f)(I::from_value(input)?)?.into_value())
    }
}

pub struct FnOperator<T> {
    name: String,
    f: Arc<OperatorFn<T>>,
}

impl<T: FromValue + IntoValue + Typed + 'static> FnOperator<T> {
    pub fn new(name: impl Into<String>, f: impl Fn(T, T) -> T + Send + Sync + 'static) -> Self {
        Self { name: name.into(),
               f: Arc::new(move |a, b| Ok(f(a, b))) }
    }

    pub fn try_new(name: impl Into<String>, f: impl Fn(T, T) -> Result<T, EvalError> + Send + Sync + 'static) -> Self {
        Self { name: name.into(),
               f: Arc::new(f) }
    }
}

impl<T> Clone for FnOperator<T> {
    fn clone(&self) -> Self {
        Self { name: self.name.clone(),
               f: Arc::clone(&self.f) }
    }
}

impl<T> PartialEq for FnOperator<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.f, &other.f)
    }
}

impl<T> fmt::Debug for FnOperator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnOperator").field("name", &self.name).finish()
    }
}

impl<T: FromValue + IntoValue + Typed + 'static> Unit for FnOperator<T> {
    fn kind(&self) -> UnitKind {
        UnitKind::BinaryOperator
    }

    fn declaration(&self) -> Result<Declaration, ConfigError> {
        Ok(Declaration::new(UnitKind::BinaryOperator).generic(self.name.clone(), vec![], vec![])
                                                     .implements(vec![T::type_expr()]))
    }

    fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        Err(ConfigError::NotSerializable(self.name.clone()))
    }
}

impl<T: FromValue + IntoValue + Typed + 'static> BinaryOperator for FnOperator<T> {
    fn apply(&self, state: Value, input: Value) -> Result<Value, EvalError> {
        Ok((self.f)(T::from_value(state)?, T::from_value(input)?)?.into_value())
    }
}

pub struct FnBiFunction<A, B, O> {
    name: String,
    f: Arc<BiFunctionFn<A, B, O>>,
    _marker: PhantomData<fn(A, B) -> O>,
}

impl<A, B, O> FnBiFunction<A, B, O>
    where A: FromValue + Typed + 'static,
          B: FromValue + Typed + 'static,
          O: IntoValue + Typed + 'static
{
    pub fn new(name: impl Into<String>, f: impl Fn(A, B) -> O + Send + Sync + 'static) -> Self {
        Self { name: name.into(),
               f: Arc::new(move |a, b| Ok(f(a, b))),
               _marker: PhantomData }
    }

    pub fn try_new(name: impl Into<String>, f: impl Fn(A, B) -> Result<O, EvalError> + Send + Sync + 'static) -> Self {
        Self { name: name.into(),
               f: Arc::new(f),
               _marker: PhantomData }
    }
}

impl<A, B, O> Clone for FnBiFunction<A, B, O> {
    fn clone(&self) -> Self {
        Self { name: self.name.clone(),
               f: Arc::clone(&self.f),
               _marker: PhantomData }
    }
}

impl<A, B, O> PartialEq for FnBiFunction<A, B, O> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.f, &other.f)
    }
}

impl<A, B, O> fmt::Debug for FnBiFunction<A, B, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnBiFunction").field("name", &self.name).finish()
    }
}

impl<A, B, O> Unit for FnBiFunction<A, B, O>
    where A: FromValue + Typed + 'static,
          B: FromValue + Typed + 'static,
          O: IntoValue + Typed + 'static
{
    fn kind(&self) -> UnitKind {
        UnitKind::BiFunction
    }

    fn declaration(&self) -> Result<Declaration, ConfigError> {
        Ok(Declaration::new(UnitKind::BiFunction).generic(self.name.clone(), vec![], vec![])
                                                 .implements(vec![A::type_expr(),
                                                                  B::type_expr(),
                                                                  O::type_expr()]))
    }

    fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        Err(ConfigError::NotSerializable(self.name.clone()))
    }
}

impl<A, B, O> BiFunction for FnBiFunction<A, B, O>
    where A: FromValue + Typed + 'static,
          B: FromValue + Typed + 'static,
          O: IntoValue + Typed + 'static
{
    fn apply(&self, first: Value, second: Value) -> Result<Value, EvalError> {
        Ok((self.f)(A::from_value(first)?, B::from_value(second)?)?.into_value())
    }
}
