use std::fmt;

use super::ValueType;

/// Clave de una variable de tipo: (tipo que la declara, nombre).
pub type VarKey = (String, String);

/// Variable de tipo declarada por un tipo genérico (`owner`), con sus cotas
/// en orden de declaración.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeVar {
    pub owner: String,
    pub name: String,
    pub bounds: Vec<TypeExpr>,
}

impl TypeVar {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self { owner: owner.into(),
               name: name.into(),
               bounds: vec![] }
    }

    pub fn bounded(owner: impl Into<String>, name: impl Into<String>, bound: TypeExpr) -> Self {
        Self { owner: owner.into(),
               name: name.into(),
               bounds: vec![bound] }
    }

    pub fn key(&self) -> VarKey {
        (self.owner.clone(), self.name.clone())
    }

    pub fn expr(&self) -> TypeExpr {
        TypeExpr::Var(self.clone())
    }
}

/// Expresión de tipo: clase concreta, variable o tipo parametrizado.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    Class(ValueType),
    Var(TypeVar),
    Generic { raw: ValueType, args: Vec<TypeExpr> },
}

impl TypeExpr {
    pub fn class(t: ValueType) -> Self {
        TypeExpr::Class(t)
    }

    pub fn generic(raw: ValueType, args: Vec<TypeExpr>) -> Self {
        TypeExpr::Generic { raw, args }
    }

    /// Tupla "bolsa" de aridad libre con un único tipo de campo.
    pub fn bag_of(element: TypeExpr) -> Self {
        TypeExpr::Generic { raw: ValueType::ArrayTuple,
                            args: vec![element] }
    }

    /// Tupla posicional de aridad fija.
    pub fn fixed(fields: Vec<TypeExpr>) -> Self {
        TypeExpr::Generic { raw: ValueType::Fixed(fields.len()),
                            args: fields }
    }

    /// Clase cruda, si la expresión no es una variable.
    pub fn raw_class(&self) -> Option<ValueType> {
        match self {
            TypeExpr::Class(c) => Some(*c),
            TypeExpr::Generic { raw, .. } => Some(*raw),
            TypeExpr::Var(_) => None,
        }
    }

    pub fn is_var(&self) -> bool {
        matches!(self, TypeExpr::Var(_))
    }
}

impl From<ValueType> for TypeExpr {
    fn from(t: ValueType) -> Self {
        TypeExpr::Class(t)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Class(c) => write!(f, "{c}"),
            TypeExpr::Var(v) => write!(f, "{}.{}", v.owner, v.name),
            TypeExpr::Generic { raw, args } => {
                let inner: Vec<String> = args.iter().map(ToString::to_string).collect();
                write!(f, "{raw}<{}>", inner.join(", "))
            }
        }
    }
}
