//! Predicados incluidos.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tuple_core::signature::Declaration;
use tuple_core::{AnyUnit, ConfigError, EvalError, FromSpec, Predicate, Registry, TypeVar, Unit, UnitKind, UnitSpec,
                 Value, ValueType};

use crate::numeric::{self, number_var};

fn number_predicate(owner: &str) -> Declaration {
    let n = number_var(owner);
    let contract = vec![Some(n.expr())];
    Declaration::new(UnitKind::Predicate).generic(owner, vec![n], vec![None])
                                         .implements(contract)
}

/// `n > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IsPositive;

impl Unit for IsPositive {
    fn kind(&self) -> UnitKind {
        UnitKind::Predicate
    }

    fn declaration(&self) -> Result<Declaration, ConfigError> {
        Ok(number_predicate("IsPositive"))
    }

    fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        Ok(UnitSpec::of(Self::TAG))
    }
}

impl Predicate for IsPositive {
    fn test(&self, input: &Value) -> Result<bool, EvalError> {
        Ok(numeric::compare(input, &Value::Short(0))? == Some(Ordering::Greater))
    }
}

impl FromSpec for IsPositive {
    const TAG: &'static str = "tuple_ops::IsPositive";

    fn from_spec(_spec: &UnitSpec, _registry: &Registry) -> Result<Self, ConfigError> {
        Ok(IsPositive)
    }

    fn into_unit(self) -> AnyUnit {
        AnyUnit::Predicate(Arc::new(self))
    }
}

/// `n > threshold`, comparando como `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GreaterThan {
    pub threshold: f64,
}

impl GreaterThan {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Unit for GreaterThan {
    fn kind(&self) -> UnitKind {
        UnitKind::Predicate
    }

    fn declaration(&self) -> Result<Declaration, ConfigError> {
        Ok(number_predicate("GreaterThan"))
    }

    fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        UnitSpec::of(Self::TAG).with("threshold", self.threshold)
    }
}

impl Predicate for GreaterThan {
    fn test(&self, input: &Value) -> Result<bool, EvalError> {
        Ok(numeric::to_f64(input)? > self.threshold)
    }
}

impl FromSpec for GreaterThan {
    const TAG: &'static str = "tuple_ops::GreaterThan";

    fn from_spec(spec: &UnitSpec, _registry: &Registry) -> Result<Self, ConfigError> {
        Ok(Self { threshold: spec.field("threshold")?.unwrap_or_default() })
    }

    fn into_unit(self) -> AnyUnit {
        AnyUnit::Predicate(Arc::new(self))
    }
}

/// Igualdad con un valor fijo, comparando la forma JSON de ambos.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Equals {
    pub expected: Json,
}

impl Equals {
    pub fn new(expected: impl Into<Json>) -> Self {
        Self { expected: expected.into() }
    }
}

impl Unit for Equals {
    fn kind(&self) -> UnitKind {
        UnitKind::Predicate
    }

    fn declaration(&self) -> Result<Declaration, ConfigError> {
        Ok(Declaration::new(UnitKind::Predicate).generic("Equals", vec![], vec![])
                                                .implements_all(vec![ValueType::Any.into()]))
    }

    fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        UnitSpec::of(Self::TAG).with("expected", &self.expected)
    }
}

impl Predicate for Equals {
    fn test(&self, input: &Value) -> Result<bool, EvalError> {
        Ok(input.to_json() == self.expected)
    }
}

impl FromSpec for Equals {
    const TAG: &'static str = "tuple_ops::Equals";

    fn from_spec(spec: &UnitSpec, _registry: &Registry) -> Result<Self, ConfigError> {
        Ok(Self { expected: spec.field("expected")?.unwrap_or(Json::Null) })
    }

    fn into_unit(self) -> AnyUnit {
        AnyUnit::Predicate(Arc::new(self))
    }
}

/// Negación. Sin predicado interno niega el paso vacuo y devuelve `false`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Not {
    predicate: Option<Arc<dyn Predicate>>,
}

impl Not {
    pub fn new<P: Predicate + 'static>(predicate: P) -> Self {
        Self { predicate: Some(Arc::new(predicate)) }
    }

    pub fn predicate(&self) -> Option<&Arc<dyn Predicate>> {
        self.predicate.as_ref()
    }
}

impl Unit for Not {
    fn kind(&self) -> UnitKind {
        UnitKind::Predicate
    }

    fn declaration(&self) -> Result<Declaration, ConfigError> {
        let t = TypeVar::new("Not", "T");
        let contract = vec![Some(t.expr())];
        let decl = Declaration::new(UnitKind::Predicate).generic("Not", vec![t], vec![None])
                                                        .implements(contract);
        match &self.predicate {
            Some(p) => Ok(decl.wrapping(p.declaration()?)),
            None => Ok(decl),
        }
    }

    fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        UnitSpec::of(Self::TAG).with_unit("predicate", self.predicate.as_deref())
    }
}

impl Predicate for Not {
    fn test(&self, input: &Value) -> Result<bool, EvalError> {
        match &self.predicate {
            None => Ok(false),
            Some(p) => Ok(!p.test(input)?),
        }
    }
}

impl FromSpec for Not {
    const TAG: &'static str = "tuple_ops::Not";

    fn from_spec(spec: &UnitSpec, registry: &Registry) -> Result<Self, ConfigError> {
        Ok(Self { predicate: registry.optional_field(spec, "predicate", Registry::build_predicate)? })
    }

    fn into_unit(self) -> AnyUnit {
        AnyUnit::Predicate(Arc::new(self))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tuple_core::{FnPredicate, Signature};

    use super::*;

    #[test]
    fn numeric_predicates() {
        assert_eq!(IsPositive.test(&Value::Short(1)), Ok(true));
        assert_eq!(IsPositive.test(&Value::Double(-0.5)), Ok(false));
        assert!(IsPositive.test(&Value::Text("1".into())).unwrap_err().is_cast());
        assert_eq!(GreaterThan::new(2.5).test(&Value::Long(3)), Ok(true));
        assert_eq!(GreaterThan::new(2.5).test(&Value::Int(2)), Ok(false));
        let sig = Signature::input_of(&IsPositive).unwrap();
        assert_eq!(sig.classes(), vec![ValueType::Number]);
    }

    #[test]
    fn equals_compares_json_forms() {
        let eq = Equals::new(json!("abc"));
        assert_eq!(eq.test(&Value::Text("abc".into())), Ok(true));
        assert_eq!(eq.test(&Value::Long(1)), Ok(false));
        assert_eq!(Equals::new(json!([1, 2])).test(&Value::from_json(&json!([1, 2]))), Ok(true));
    }

    #[test]
    fn not_negates_and_inherits_input_type() {
        let not = Not::new(FnPredicate::new("even", |n: i64| n % 2 == 0));
        assert_eq!(not.test(&Value::Long(3)), Ok(true));
        assert_eq!(not.test(&Value::Long(4)), Ok(false));
        assert_eq!(Signature::input_of(&not).unwrap().classes(), vec![ValueType::Long]);
        assert_eq!(Not::default().test(&Value::Null), Ok(false));
    }

    #[test]
    fn greater_than_spec() {
        let spec = GreaterThan::new(1.5).to_spec().unwrap();
        assert_eq!(spec.to_json(), json!({"class": "tuple_ops::GreaterThan", "threshold": 1.5}));
        assert_eq!(GreaterThan::from_spec(&spec, &Registry::new()), Ok(GreaterThan::new(1.5)));
    }
}
