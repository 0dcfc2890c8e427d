use crate::types::{TypeExpr, TypeVar};
use crate::unit::UnitKind;

/// Un nivel de la cadena genérica: el tipo `owner`, las variables que declara
/// y los argumentos que el nivel inferior le liga (`None` = sin ligar).
#[derive(Debug, Clone, PartialEq)]
pub struct TypeLevel {
    pub owner: String,
    pub params: Vec<TypeVar>,
    pub args: Vec<Option<TypeExpr>>,
}

/// Auto-descripción de una unidad: niveles genéricos desde la clase concreta
/// hasta el contrato canónico, y opcionalmente la declaración de la unidad
/// envuelta (operador que delega en otro operador).
///
/// ```ignore
/// // Sum<N: Number> implements BinaryOperator<N>, instanciado con N = Long
/// Declaration::new(UnitKind::BinaryOperator)
///     .generic("Sum", vec![n.clone()], vec![Some(ValueType::Long.into())])
///     .implements(vec![Some(n.expr())])
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    kind: UnitKind,
    levels: Vec<TypeLevel>,
    canonical: Option<TypeLevel>,
    wrapped: Option<Box<Declaration>>,
}

impl Declaration {
    pub fn new(kind: UnitKind) -> Self {
        Self { kind,
               levels: vec![],
               canonical: None,
               wrapped: None }
    }

    /// Añade un nivel genérico (del más concreto al más abstracto).
    pub fn generic(mut self, owner: impl Into<String>, params: Vec<TypeVar>, args: Vec<Option<TypeExpr>>) -> Self {
        self.levels.push(TypeLevel { owner: owner.into(),
                                     params,
                                     args });
        self
    }

    /// Liga las variables del contrato canónico.
    pub fn implements(mut self, args: Vec<Option<TypeExpr>>) -> Self {
        self.canonical = Some(TypeLevel { owner: self.kind.canonical_name().to_string(),
                                          params: self.kind.type_params(),
                                          args });
        self
    }

    /// Atajo para contratos con todos los argumentos concretos.
    pub fn implements_all(self, args: Vec<TypeExpr>) -> Self {
        self.implements(args.into_iter().map(Some).collect())
    }

    pub fn wrapping(mut self, inner: Declaration) -> Self {
        self.wrapped = Some(Box::new(inner));
        self
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Nombre del tipo más concreto declarado.
    pub fn owner(&self) -> &str {
        self.levels.first().map(|l| l.owner.as_str()).unwrap_or_else(|| self.kind.canonical_name())
    }

    pub fn levels(&self) -> &[TypeLevel] {
        &self.levels
    }

    pub fn canonical(&self) -> Option<&TypeLevel> {
        self.canonical.as_ref()
    }

    pub fn wrapped(&self) -> Option<&Declaration> {
        self.wrapped.as_deref()
    }
}
