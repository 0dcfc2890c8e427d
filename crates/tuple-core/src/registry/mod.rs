//! Construcción polimórfica de unidades a partir de `(tag, campos)`.
//!
//! Un `UnitSpec` es el par `class` + mapa de campos (en JSON la clase viaja
//! en la propiedad `class`). El `Registry` asocia tags completos
//! (`tuple_core::PredicateComposite`) y nombres cortos únicos
//! (`PredicateComposite`) a constructores.

mod spec;

pub use spec::UnitSpec;

use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, warn};
use serde_json::Value as Json;

use crate::errors::ConfigError;
use crate::signature::Signature;
use crate::unit::{BiFunction, BinaryOperator, Function, Predicate, UnitKind};

/// Unidad construida, etiquetada por su contrato.
#[derive(Debug, Clone)]
pub enum AnyUnit {
    Predicate(Arc<dyn Predicate>),
    Function(Arc<dyn Function>),
    BinaryOperator(Arc<dyn BinaryOperator>),
    BiFunction(Arc<dyn BiFunction>),
}

impl AnyUnit {
    pub fn kind(&self) -> UnitKind {
        match self {
            AnyUnit::Predicate(_) => UnitKind::Predicate,
            AnyUnit::Function(_) => UnitKind::Function,
            AnyUnit::BinaryOperator(_) => UnitKind::BinaryOperator,
            AnyUnit::BiFunction(_) => UnitKind::BiFunction,
        }
    }

    pub fn into_predicate(self) -> Option<Arc<dyn Predicate>> {
        match self {
            AnyUnit::Predicate(p) => Some(p),
            _ => None,
        }
    }

    pub fn into_function(self) -> Option<Arc<dyn Function>> {
        match self {
            AnyUnit::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn into_operator(self) -> Option<Arc<dyn BinaryOperator>> {
        match self {
            AnyUnit::BinaryOperator(o) => Some(o),
            _ => None,
        }
    }

    pub fn into_bifunction(self) -> Option<Arc<dyn BiFunction>> {
        match self {
            AnyUnit::BiFunction(b) => Some(b),
            _ => None,
        }
    }

    pub fn input_signature(&self) -> Result<Signature<'_>, ConfigError> {
        match self {
            AnyUnit::Predicate(u) => Signature::input_of(u.as_ref()),
            AnyUnit::Function(u) => Signature::input_of(u.as_ref()),
            AnyUnit::BinaryOperator(u) => Signature::input_of(u.as_ref()),
            AnyUnit::BiFunction(u) => Signature::input_of(u.as_ref()),
        }
    }

    pub fn output_signature(&self) -> Result<Signature<'_>, ConfigError> {
        match self {
            AnyUnit::Predicate(u) => Signature::output_of(u.as_ref()),
            AnyUnit::Function(u) => Signature::output_of(u.as_ref()),
            AnyUnit::BinaryOperator(u) => Signature::output_of(u.as_ref()),
            AnyUnit::BiFunction(u) => Signature::output_of(u.as_ref()),
        }
    }

    pub fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        match self {
            AnyUnit::Predicate(u) => u.to_spec(),
            AnyUnit::Function(u) => u.to_spec(),
            AnyUnit::BinaryOperator(u) => u.to_spec(),
            AnyUnit::BiFunction(u) => u.to_spec(),
        }
    }
}

impl PartialEq for AnyUnit {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AnyUnit::Predicate(a), AnyUnit::Predicate(b)) => a == b,
            (AnyUnit::Function(a), AnyUnit::Function(b)) => a == b,
            (AnyUnit::BinaryOperator(a), AnyUnit::BinaryOperator(b)) => a == b,
            (AnyUnit::BiFunction(a), AnyUnit::BiFunction(b)) => a == b,
            _ => false,
        }
    }
}

/// Tipo reconstruible desde un `UnitSpec`.
pub trait FromSpec: Sized {
    /// Tag completo (`crate::Tipo`).
    const TAG: &'static str;

    fn from_spec(spec: &UnitSpec, registry: &Registry) -> Result<Self, ConfigError>;

    fn into_unit(self) -> AnyUnit;
}

pub type Constructor = fn(&UnitSpec, &Registry) -> Result<AnyUnit, ConfigError>;

/// Nombre corto de un tag: el último segmento tras `::`.
pub fn short_name(tag: &str) -> &str {
    tag.rsplit("::").next().unwrap_or(tag)
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    by_tag: IndexMap<String, Constructor>,
    by_short: IndexMap<String, Vec<String>>,
}

impl Registry {
    /// Registro vacío.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registro con todas las unidades del core.
    pub fn with_core() -> Self {
        use crate::adapted::{AdaptedBinaryOperator, AdaptedFunction, AdaptedPredicate};
        use crate::composite::{BinaryOperatorComposite, FunctionComposite, PredicateComposite};
        use crate::tuple::{ReverseTupleOutputAdapter, TupleAdaptedBinaryOperator, TupleAdaptedFunction,
                           TupleAdaptedPredicate, TupleBinaryOperatorComposite, TupleFunctionComposite,
                           TupleInputAdapter, TupleOutputAdapter, TuplePredicateComposite};

        let mut r = Self::new();
        r.register::<PredicateComposite>();
        r.register::<FunctionComposite>();
        r.register::<BinaryOperatorComposite>();
        r.register::<AdaptedPredicate>();
        r.register::<AdaptedFunction>();
        r.register::<AdaptedBinaryOperator>();
        r.register::<TupleInputAdapter>();
        r.register::<TupleOutputAdapter>();
        r.register::<ReverseTupleOutputAdapter>();
        r.register::<TupleAdaptedPredicate>();
        r.register::<TupleAdaptedFunction>();
        r.register::<TupleAdaptedBinaryOperator>();
        r.register::<TuplePredicateComposite>();
        r.register::<TupleFunctionComposite>();
        r.register::<TupleBinaryOperatorComposite>();
        r
    }

    pub fn register<T: FromSpec>(&mut self) {
        self.register_tag(T::TAG, |spec, registry| T::from_spec(spec, registry).map(T::into_unit));
    }

    /// Registra un constructor bajo `tag`. Re-registrar un tag lo reemplaza.
    pub fn register_tag(&mut self, tag: &str, ctor: Constructor) {
        if self.by_tag.insert(tag.to_string(), ctor).is_some() {
            debug!("unit class {tag} re-registered");
            return;
        }
        self.by_short.entry(short_name(tag).to_string()).or_default().push(tag.to_string());
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.by_tag.keys().map(String::as_str)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.resolve(tag).is_ok()
    }

    /// Tag completo para `tag` (completo o corto).
    pub fn resolve(&self, tag: &str) -> Result<&str, ConfigError> {
        if let Some((full, _)) = self.by_tag.get_key_value(tag) {
            return Ok(full.as_str());
        }
        match self.by_short.get(tag).map(Vec::as_slice) {
            Some([only]) => Ok(only.as_str()),
            Some(candidates) if !candidates.is_empty() => {
                warn!("unit class {tag} is ambiguous: {candidates:?}");
                Err(ConfigError::AmbiguousTag { tag: tag.to_string(),
                                                candidates: candidates.to_vec() })
            }
            _ => Err(ConfigError::UnknownTag(tag.to_string())),
        }
    }

    pub fn build(&self, spec: &UnitSpec) -> Result<AnyUnit, ConfigError> {
        let full = self.resolve(&spec.class)?;
        let ctor = self.by_tag.get(full).ok_or_else(|| ConfigError::UnknownTag(spec.class.clone()))?;
        ctor(spec, self)
    }

    pub fn build_json(&self, json: &Json) -> Result<AnyUnit, ConfigError> {
        self.build(&UnitSpec::decode(json)?)
    }

    pub fn build_predicate(&self, spec: &UnitSpec) -> Result<Arc<dyn Predicate>, ConfigError> {
        let unit = self.build(spec)?;
        let found = unit.kind();
        unit.into_predicate().ok_or_else(|| mismatch(spec, UnitKind::Predicate, found))
    }

    pub fn build_function(&self, spec: &UnitSpec) -> Result<Arc<dyn Function>, ConfigError> {
        let unit = self.build(spec)?;
        let found = unit.kind();
        unit.into_function().ok_or_else(|| mismatch(spec, UnitKind::Function, found))
    }

    pub fn build_operator(&self, spec: &UnitSpec) -> Result<Arc<dyn BinaryOperator>, ConfigError> {
        let unit = self.build(spec)?;
        let found = unit.kind();
        unit.into_operator().ok_or_else(|| mismatch(spec, UnitKind::BinaryOperator, found))
    }

    pub fn build_bifunction(&self, spec: &UnitSpec) -> Result<Arc<dyn BiFunction>, ConfigError> {
        let unit = self.build(spec)?;
        let found = unit.kind();
        unit.into_bifunction().ok_or_else(|| mismatch(spec, UnitKind::BiFunction, found))
    }

    /// Construye el campo unidad `name` si está presente.
    pub fn optional_field<T>(&self,
                             spec: &UnitSpec,
                             name: &str,
                             build: impl Fn(&Self, &UnitSpec) -> Result<T, ConfigError>)
                             -> Result<Option<T>, ConfigError> {
        spec.unit(name)?.map(|s| build(self, &s)).transpose()
    }

    /// Construye la lista de unidades del campo `name` (vacía si falta).
    pub fn list_field<T>(&self,
                         spec: &UnitSpec,
                         name: &str,
                         build: impl Fn(&Self, &UnitSpec) -> Result<T, ConfigError>)
                         -> Result<Vec<T>, ConfigError> {
        spec.units(name)?.iter().map(|s| build(self, s)).collect()
    }
}

fn mismatch(spec: &UnitSpec, expected: UnitKind, found: UnitKind) -> ConfigError {
    ConfigError::KindMismatch { tag: spec.class.clone(),
                                expected,
                                found }
}
