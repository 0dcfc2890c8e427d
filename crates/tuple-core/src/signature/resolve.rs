//! Recuperación de los tipos concretos de una unidad a partir de su
//! `Declaration`.
//!
//! Pasos:
//! 1. Mapa de sustitución variable → tipo, desde el nivel concreto hasta el
//!    contrato canónico.
//! 2. Si la unidad envuelve otra del mismo contrato, se mezclan las ligaduras
//!    compatibles de la unidad envuelta.
//! 3. Forma del método canónico (parámetros y retorno).
//! 4. Resolución recursiva de cada tipo por el mapa, con límite de saltos.
//! 5. Variable sin resolver: primera cota declarada (o `Any`), salvo que
//!    pertenezca al contrato `Function`, en cuyo caso queda como tipo
//!    desconocido.

use std::collections::HashMap;

use log::{debug, warn};

use super::Declaration;
use crate::config::CoreConfig;
use crate::errors::ConfigError;
use crate::types::{TypeExpr, ValueType, VarKey};
use crate::unit::{Unit, UnitKind};

/// Lado de la firma que se resuelve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// Parámetros y retorno del método canónico ya resueltos.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedShape {
    pub owner: String,
    pub params: Vec<TypeExpr>,
    pub ret: TypeExpr,
}

impl ResolvedShape {
    /// Tipo de entrada: el único parámetro, o una tupla fija de los
    /// parámetros cuando el método recibe varios.
    pub fn input(&self) -> TypeExpr {
        match self.params.as_slice() {
            [single] => single.clone(),
            many => TypeExpr::fixed(many.to_vec()),
        }
    }

    pub fn output(&self) -> TypeExpr {
        self.ret.clone()
    }

    pub fn get(&self, direction: Direction) -> TypeExpr {
        match direction {
            Direction::Input => self.input(),
            Direction::Output => self.output(),
        }
    }
}

/// Resuelve la forma canónica de `unit`.
pub fn resolve_shape<U: Unit + ?Sized>(unit: &U) -> Result<ResolvedShape, ConfigError> {
    let decl = unit.declaration()?;
    if decl.kind() != unit.kind() {
        return Err(ConfigError::NotAFunctionalKind { owner: decl.owner().to_string(),
                                                     kind: unit.kind() });
    }
    resolve_declaration(&decl, CoreConfig::global().max_resolution_depth)
}

/// Tipo declarado de entrada o salida de `unit`.
pub fn resolve_type<U: Unit + ?Sized>(unit: &U, direction: Direction) -> Result<TypeExpr, ConfigError> {
    Ok(resolve_shape(unit)?.get(direction))
}

pub fn resolve_declaration(decl: &Declaration, max_depth: usize) -> Result<ResolvedShape, ConfigError> {
    let resolver = Resolver::for_declaration(decl, max_depth)?;
    let shape = decl.kind().method_shape();
    let settle = |e: &TypeExpr| resolver.settle(resolver.resolve(e, 0), 0);
    Ok(ResolvedShape { owner: decl.owner().to_string(),
                       params: shape.params.iter().map(settle).collect(),
                       ret: settle(&shape.ret) })
}

struct Resolver {
    map: HashMap<VarKey, TypeExpr>,
    max_depth: usize,
}

impl Resolver {
    fn for_declaration(decl: &Declaration, max_depth: usize) -> Result<Self, ConfigError> {
        let canonical = decl.canonical().ok_or_else(|| ConfigError::NotAFunctionalKind { owner: decl.owner().to_string(),
                                                                                        kind: decl.kind() })?;
        let mut map = HashMap::new();
        for level in decl.levels().iter().chain(std::iter::once(canonical)) {
            if level.params.len() != level.args.len() {
                return Err(ConfigError::MalformedDeclaration { owner: level.owner.clone(),
                                                               expected: level.params.len(),
                                                               found: level.args.len() });
            }
            for (param, arg) in level.params.iter().zip(&level.args) {
                if let Some(arg) = arg {
                    map.insert(param.key(), arg.clone());
                }
            }
        }
        let mut resolver = Self { map, max_depth };
        if let Some(inner) = decl.wrapped() {
            resolver.merge_wrapped(decl.kind(), inner)?;
        }
        Ok(resolver)
    }

    /// Toma de la unidad envuelta las ligaduras del contrato cuando la
    /// ligadura externa sigue abierta o es un supertipo de la interna.
    ///
    /// Una variable interna abierta solo se toma si tiene cotas y la externa
    /// también está abierta; la cota se aplica después en `settle`.
    fn merge_wrapped(&mut self, kind: UnitKind, inner: &Declaration) -> Result<(), ConfigError> {
        if inner.kind() != kind {
            debug!("{} wraps a {} but is a {}; wrapped bindings ignored", inner.owner(), inner.kind(), kind);
            return Ok(());
        }
        let inner_resolver = Resolver::for_declaration(inner, self.max_depth)?;
        for param in kind.type_params() {
            let inner_binding = inner_resolver.resolve(&param.expr(), 0);
            let outer_binding = self.resolve(&param.expr(), 0);
            let compatible = match (&inner_binding, outer_binding.raw_class()) {
                (TypeExpr::Var(var), None) if !var.bounds.is_empty() => {
                    let inner_class = inner_resolver.settle(inner_binding.clone(), 0).raw_class();
                    let outer_class = self.settle(outer_binding.clone(), 0).raw_class();
                    match (outer_class, inner_class) {
                        (Some(o), Some(i)) => o.is_assignable_from(&i),
                        _ => false,
                    }
                }
                (TypeExpr::Var(_), _) => false,
                (_, None) => true,
                (_, Some(outer_class)) => inner_binding.raw_class()
                                                       .is_some_and(|inner_class| outer_class.is_assignable_from(&inner_class)),
            };
            if compatible {
                debug!("{}.{} bound to {} from wrapped {}", param.owner, param.name, inner_binding, inner.owner());
                self.map.insert(param.key(), inner_binding);
            }
        }
        Ok(())
    }

    fn resolve(&self, expr: &TypeExpr, depth: usize) -> TypeExpr {
        if depth > self.max_depth {
            warn!("type resolution exceeded {} steps at {expr}; using UnknownGenericType", self.max_depth);
            return TypeExpr::Class(ValueType::Unknown);
        }
        match expr {
            TypeExpr::Class(_) => expr.clone(),
            TypeExpr::Var(var) => match self.map.get(&var.key()) {
                Some(next) => self.resolve(next, depth + 1),
                None => expr.clone(),
            },
            TypeExpr::Generic { raw, args } => {
                TypeExpr::Generic { raw: *raw,
                                    args: args.iter().map(|a| self.resolve(a, depth + 1)).collect() }
            }
        }
    }

    fn settle(&self, expr: TypeExpr, depth: usize) -> TypeExpr {
        if depth > self.max_depth {
            warn!("bound fallback exceeded {} steps; using UnknownGenericType", self.max_depth);
            return TypeExpr::Class(ValueType::Unknown);
        }
        match expr {
            TypeExpr::Var(var) if var.owner == UnitKind::Function.canonical_name() => {
                debug!("{}.{} left unresolved", var.owner, var.name);
                TypeExpr::Class(ValueType::Unknown)
            }
            TypeExpr::Var(var) => match var.bounds.first() {
                Some(bound) => {
                    debug!("{}.{} unresolved; falling back to bound {bound}", var.owner, var.name);
                    self.settle(self.resolve(bound, depth + 1), depth + 1)
                }
                None => TypeExpr::Class(ValueType::Any),
            },
            TypeExpr::Generic { raw, args } => {
                TypeExpr::Generic { raw,
                                    args: args.into_iter().map(|a| self.settle(a, depth + 1)).collect() }
            }
            other => other,
        }
    }
}
