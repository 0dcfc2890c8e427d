//! Modelo de firmas: tipos de entrada/salida recuperados de una unidad.
//!
//! `Signature::input_of(&unit)` / `Signature::output_of(&unit)` resuelven la
//! declaración de la unidad (ver `resolve`) y construyen:
//! - `SingletonSignature`: un único tipo (o `UnknownGenericType`).
//! - `TupleSignature`: tipo tupla con argumentos posicionales. La aridad es
//!   `None` (bolsa) cuando la tupla tiene un único argumento y no es el
//!   marcador `Tuple1`.
//!
//! `assignable` nunca falla: los desajustes se devuelven como entradas de
//! `ValidationResult`. Si la unidad implementa un validador propio, se le
//! delega la comprobación.

mod declaration;
mod resolve;

pub use declaration::{Declaration, TypeLevel};
pub use resolve::{resolve_declaration, resolve_shape, resolve_type, Direction, ResolvedShape};

use std::fmt;

use crate::errors::ConfigError;
use crate::types::{TypeExpr, ValueType};
use crate::unit::{InputValidator, OutputValidator, Unit};
use crate::validation::ValidationResult;

/// Validador auto-descrito de la unidad de origen.
#[derive(Clone, Copy)]
enum Validator<'a> {
    Input(&'a dyn InputValidator),
    Output(&'a dyn OutputValidator),
}

impl Validator<'_> {
    fn validate(&self, candidates: &[ValueType]) -> ValidationResult {
        match self {
            Validator::Input(v) => v.is_input_valid(candidates),
            Validator::Output(v) => v.is_output_valid(candidates),
        }
    }
}

impl fmt::Debug for Validator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validator::Input(_) => f.write_str("InputValidator"),
            Validator::Output(_) => f.write_str("OutputValidator"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SingletonSignature<'a> {
    owner: String,
    direction: Direction,
    class: ValueType,
    validator: Option<Validator<'a>>,
}

#[derive(Debug, Clone)]
pub struct TupleSignature<'a> {
    owner: String,
    direction: Direction,
    raw: ValueType,
    classes: Vec<ValueType>,
    num_classes: Option<usize>,
    children: Vec<Signature<'a>>,
    validator: Option<Validator<'a>>,
}

#[derive(Debug, Clone)]
pub enum Signature<'a> {
    Singleton(SingletonSignature<'a>),
    Tuple(TupleSignature<'a>),
}

impl<'a> Signature<'a> {
    pub fn input_of<U: Unit + ?Sized>(unit: &'a U) -> Result<Self, ConfigError> {
        let shape = resolve_shape(unit)?;
        let sig = Self::from_expr(&shape.owner, Direction::Input, &shape.input());
        Ok(sig.with_validator(unit.input_validator().map(Validator::Input)))
    }

    pub fn output_of<U: Unit + ?Sized>(unit: &'a U) -> Result<Self, ConfigError> {
        let shape = resolve_shape(unit)?;
        let sig = Self::from_expr(&shape.owner, Direction::Output, &shape.output());
        Ok(sig.with_validator(unit.output_validator().map(Validator::Output)))
    }

    pub fn of<U: Unit + ?Sized>(unit: &'a U, direction: Direction) -> Result<Self, ConfigError> {
        match direction {
            Direction::Input => Self::input_of(unit),
            Direction::Output => Self::output_of(unit),
        }
    }

    /// Firma puramente estructural de una expresión ya resuelta.
    pub fn from_expr(owner: &str, direction: Direction, expr: &TypeExpr) -> Self {
        match expr {
            TypeExpr::Generic { raw, args } if raw.is_tuple() && !args.is_empty() => {
                let children: Vec<Signature<'a>> = args.iter().map(|a| Self::from_expr(owner, direction, a)).collect();
                let num_classes = if args.len() == 1 && !raw.is_single_field_marker() {
                    None
                } else {
                    Some(args.len())
                };
                Signature::Tuple(TupleSignature { owner: owner.to_string(),
                                                  direction,
                                                  raw: *raw,
                                                  classes: children.iter().map(Signature::raw_class).collect(),
                                                  num_classes,
                                                  children,
                                                  validator: None })
            }
            other => Signature::Singleton(SingletonSignature { owner: owner.to_string(),
                                                               direction,
                                                               class: other.raw_class().unwrap_or(ValueType::Unknown),
                                                               validator: None }),
        }
    }

    fn with_validator(mut self, validator: Option<Validator<'a>>) -> Self {
        match &mut self {
            Signature::Singleton(s) => s.validator = validator,
            Signature::Tuple(t) => t.validator = validator,
        }
        self
    }

    fn validator(&self) -> Option<Validator<'a>> {
        match self {
            Signature::Singleton(s) => s.validator,
            Signature::Tuple(t) => t.validator,
        }
    }

    /// Clases recuperadas, en orden.
    pub fn classes(&self) -> Vec<ValueType> {
        match self {
            Signature::Singleton(s) => vec![s.class],
            Signature::Tuple(t) => t.classes.clone(),
        }
    }

    /// Aridad; `None` para una tupla bolsa.
    pub fn num_classes(&self) -> Option<usize> {
        match self {
            Signature::Singleton(_) => Some(1),
            Signature::Tuple(t) => t.num_classes,
        }
    }

    /// Clase del valor completo (la clase cruda de la tupla si lo es).
    pub fn raw_class(&self) -> ValueType {
        match self {
            Signature::Singleton(s) => s.class,
            Signature::Tuple(t) => t.raw,
        }
    }

    pub fn owner(&self) -> &str {
        match self {
            Signature::Singleton(s) => &s.owner,
            Signature::Tuple(t) => &t.owner,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Signature::Singleton(s) => s.direction,
            Signature::Tuple(t) => t.direction,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Signature::Singleton(s) if s.class == ValueType::Unknown)
    }

    pub fn is_variadic(&self) -> bool {
        self.num_classes().is_none()
    }

    pub fn children(&self) -> &[Signature<'a>] {
        match self {
            Signature::Singleton(_) => &[],
            Signature::Tuple(t) => &t.children,
        }
    }

    /// Comprueba si una llamada con argumentos de las clases `candidates`
    /// es compatible. Delega en el validador de la unidad si existe.
    pub fn assignable(&self, candidates: &[ValueType]) -> ValidationResult {
        match self.validator() {
            Some(v) => v.validate(candidates),
            None => self.check(candidates),
        }
    }

    /// Chequeo estructural, sin validadores.
    pub fn check(&self, candidates: &[ValueType]) -> ValidationResult {
        match self {
            Signature::Singleton(s) => s.check(candidates),
            Signature::Tuple(t) => t.check(candidates),
        }
    }

    /// `true` si el valor producido según `produced` puede alimentar esta
    /// firma. Una bolsa que alimenta una tupla fija se acepta si su tipo de
    /// campo encaja en cada posición.
    pub fn accepts(&self, produced: &Signature<'_>) -> ValidationResult {
        if produced.is_unknown() {
            return ValidationResult::new();
        }
        match (self, produced) {
            (Signature::Singleton(s), p) => s.check(&[p.raw_class()]),
            (Signature::Tuple(t), Signature::Tuple(p)) => {
                let args = match (p.num_classes, t.num_classes) {
                    (None, Some(n)) => vec![p.classes[0]; n],
                    _ => p.classes.clone(),
                };
                t.check(&args)
            }
            (Signature::Tuple(t), Signature::Singleton(p)) => {
                if t.raw.is_assignable_from(&p.class) {
                    ValidationResult::new()
                } else {
                    ValidationResult::with_error(not_assignable(0, p.class, t.raw))
                }
            }
        }
    }
}

impl fmt::Display for Signature<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signature::Singleton(s) => write!(f, "{}", s.class),
            Signature::Tuple(t) => {
                let inner: Vec<String> = t.children.iter().map(ToString::to_string).collect();
                match t.num_classes {
                    None => write!(f, "{}<{}...>", t.raw, inner.join(", ")),
                    Some(_) => write!(f, "{}<{}>", t.raw, inner.join(", ")),
                }
            }
        }
    }
}

fn arity_error(owner: &str, expected: usize, found: usize) -> String {
    format!("{owner} expects {expected} argument(s) but {found} were given")
}

fn not_assignable(index: usize, found: ValueType, expected: ValueType) -> String {
    format!("argument {index} of type {found} is not assignable to {expected}")
}

impl SingletonSignature<'_> {
    pub fn class(&self) -> ValueType {
        self.class
    }

    fn check(&self, candidates: &[ValueType]) -> ValidationResult {
        let mut result = ValidationResult::new();
        if self.class == ValueType::Unknown {
            return result;
        }
        if candidates.len() != 1 {
            result.add_error(arity_error(&self.owner, 1, candidates.len()));
            return result;
        }
        if !self.class.is_assignable_from(&candidates[0]) {
            result.add_error(not_assignable(0, candidates[0], self.class));
        }
        result
    }
}

impl TupleSignature<'_> {
    pub fn classes(&self) -> &[ValueType] {
        &self.classes
    }

    pub fn num_classes(&self) -> Option<usize> {
        self.num_classes
    }

    fn check(&self, candidates: &[ValueType]) -> ValidationResult {
        let mut result = ValidationResult::new();
        match self.num_classes {
            Some(n) => {
                if candidates.len() != n {
                    result.add_error(arity_error(&self.owner, n, candidates.len()));
                    return result;
                }
                for (i, (declared, found)) in self.classes.iter().zip(candidates).enumerate() {
                    if !declared.is_assignable_from(found) {
                        result.add_error(not_assignable(i, *found, *declared));
                    }
                }
            }
            None => {
                let declared = self.classes[0];
                for (i, found) in candidates.iter().enumerate() {
                    if !declared.is_assignable_from(found) {
                        result.add_error(not_assignable(i, *found, declared));
                    }
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueType::*;

    fn sig(expr: TypeExpr) -> Signature<'static> {
        Signature::from_expr("Test", Direction::Input, &expr)
    }

    #[test]
    fn bag_versus_fixed_single_field() {
        let bag = sig(TypeExpr::bag_of(Long.into()));
        assert_eq!(bag.num_classes(), None);
        assert!(bag.assignable(&[Long, Long, Long]).is_valid());
        assert!(bag.assignable(&[]).is_valid());
        assert!(!bag.assignable(&[Long, Text]).is_valid());

        let one = sig(TypeExpr::fixed(vec![Long.into()]));
        assert_eq!(one.num_classes(), Some(1));
        assert!(!one.assignable(&[Long, Long]).is_valid());
    }

    #[test]
    fn fixed_tuple_checks_each_position() {
        let s = sig(TypeExpr::fixed(vec![Number.into(), Text.into()]));
        assert_eq!(s.classes(), vec![Number, Text]);
        assert!(s.assignable(&[Int, Text]).is_valid());
        let r = s.assignable(&[Text, Text]);
        assert_eq!(r.errors().collect::<Vec<_>>(), vec!["argument 0 of type Text is not assignable to Number"]);
        let r = s.assignable(&[Int]);
        assert_eq!(r.errors().collect::<Vec<_>>(), vec!["Test expects 2 argument(s) but 1 were given"]);
    }

    #[test]
    fn unknown_accepts_anything() {
        let s = sig(Unknown.into());
        assert!(s.is_unknown());
        assert!(s.assignable(&[Text]).is_valid());
        assert!(s.assignable(&[]).is_valid());
    }

    #[test]
    fn tuple_without_args_is_a_singleton() {
        let s = sig(TypeExpr::generic(ArrayTuple, vec![]));
        assert!(matches!(s, Signature::Singleton(_)));
        assert!(s.assignable(&[Fixed(3)]).is_valid());
    }

    #[test]
    fn nested_tuples_keep_children() {
        let inner = TypeExpr::fixed(vec![Long.into(), Long.into()]);
        let s = sig(TypeExpr::bag_of(inner));
        assert_eq!(s.classes(), vec![Fixed(2)]);
        assert_eq!(s.children()[0].num_classes(), Some(2));
        assert_eq!(s.to_string(), "ArrayTuple<Tuple2<Long, Long>...>");
    }

    #[test]
    fn accepts_compares_produced_against_expected() {
        let bag = sig(TypeExpr::bag_of(Long.into()));
        let pair = sig(TypeExpr::fixed(vec![Number.into(), Number.into()]));
        assert!(pair.accepts(&bag).is_valid());
        assert!(!bag.accepts(&sig(TypeExpr::fixed(vec![Text.into()]))).is_valid());
        assert!(sig(Long.into()).accepts(&sig(Unknown.into())).is_valid());
        assert!(!sig(Long.into()).accepts(&sig(Text.into())).is_valid());
    }
}
