//! Funciones incluidas.
//!
//! - `Increment`, `Negate`, `Square`: `Function<N, N>` con `N: Number`.
//! - `ToText`: `Function<Any, Text>`.
//! - `Total`: suma de una tupla bolsa (`ArrayTuple<N...> → N`).
//! - `Difference`: `Tuple2<N, N> → N`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tuple_core::signature::Declaration;
use tuple_core::tuple::Tuple;
use tuple_core::{AnyUnit, ConfigError, EvalError, FromSpec, Function, OverflowPolicy, Registry, TypeExpr, Unit,
                 UnitKind, UnitSpec, Value, ValueType};

use crate::numeric::{self, check_operand, number_var, policy};

/// `Owner<N: Number> implements Function<input(N), output(N)>`.
fn numeric_function(owner: &str,
                    operand: Option<ValueType>,
                    input: impl FnOnce(TypeExpr) -> TypeExpr,
                    output: impl FnOnce(TypeExpr) -> TypeExpr)
                    -> Declaration {
    let n = number_var(owner);
    let contract = vec![Some(input(n.expr())), Some(output(n.expr()))];
    Declaration::new(UnitKind::Function).generic(owner, vec![n], vec![operand.map(Into::into)])
                                        .implements(contract)
}

fn same(n: TypeExpr) -> TypeExpr {
    n
}

/// Función `N → N` con operando y política de desbordamiento opcionales.
macro_rules! unary_numeric {
    ($(#[$meta:meta])* $name:ident, $tag:literal, |$v:ident, $policy:ident| $body:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
        pub struct $name {
            pub operand: Option<ValueType>,
            pub overflow: Option<OverflowPolicy>,
        }

        impl $name {
            pub fn of(operand: ValueType) -> Self {
                Self { operand: Some(operand), ..Self::default() }
            }

            pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
                self.overflow = Some(overflow);
                self
            }
        }

        impl Unit for $name {
            fn kind(&self) -> UnitKind {
                UnitKind::Function
            }

            fn declaration(&self) -> Result<Declaration, ConfigError> {
                Ok(numeric_function(stringify!($name), self.operand, same, same))
            }

            fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
                UnitSpec::of(Self::TAG).with("operand", self.operand)?
                                       .with("overflow", self.overflow)
            }
        }

        impl Function for $name {
            fn apply(&self, input: Value) -> Result<Value, EvalError> {
                check_operand(self.operand, &input)?;
                let $v = &input;
                let $policy = policy(self.overflow);
                $body
            }
        }

        impl FromSpec for $name {
            const TAG: &'static str = $tag;

            fn from_spec(spec: &UnitSpec, _registry: &Registry) -> Result<Self, ConfigError> {
                Ok(Self { operand: spec.field("operand")?,
                          overflow: spec.field("overflow")? })
            }

            fn into_unit(self) -> AnyUnit {
                AnyUnit::Function(Arc::new(self))
            }
        }
    };
}

unary_numeric!(
    /// `n + 1`, conservando el ancho de `n`.
    Increment, "tuple_ops::Increment", |v, p| numeric::add(v, &Value::Short(1), p)
);
unary_numeric!(Negate, "tuple_ops::Negate", |v, p| numeric::neg(v, p));
unary_numeric!(Square, "tuple_ops::Square", |v, p| numeric::mul(v, v, p));

/// Representación textual: los textos pasan tal cual, el resto se escribe
/// como JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ToText;

impl Unit for ToText {
    fn kind(&self) -> UnitKind {
        UnitKind::Function
    }

    fn declaration(&self) -> Result<Declaration, ConfigError> {
        Ok(Declaration::new(UnitKind::Function).generic("ToText", vec![], vec![])
                                               .implements_all(vec![ValueType::Any.into(), ValueType::Text.into()]))
    }

    fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        Ok(UnitSpec::of(Self::TAG))
    }
}

impl Function for ToText {
    fn apply(&self, input: Value) -> Result<Value, EvalError> {
        Ok(match input {
            Value::Text(s) => Value::Text(s),
            other => Value::Text(other.to_json().to_string()),
        })
    }
}

impl FromSpec for ToText {
    const TAG: &'static str = "tuple_ops::ToText";

    fn from_spec(_spec: &UnitSpec, _registry: &Registry) -> Result<Self, ConfigError> {
        Ok(ToText)
    }

    fn into_unit(self) -> AnyUnit {
        AnyUnit::Function(Arc::new(self))
    }
}

/// Suma todos los campos de una tupla. Vacía ⇒ `Long(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Total {
    pub operand: Option<ValueType>,
    pub overflow: Option<OverflowPolicy>,
}

impl Total {
    pub fn of(operand: ValueType) -> Self {
        Self { operand: Some(operand),
               ..Self::default() }
    }
}

impl Unit for Total {
    fn kind(&self) -> UnitKind {
        UnitKind::Function
    }

    fn declaration(&self) -> Result<Declaration, ConfigError> {
        Ok(numeric_function("Total", self.operand, TypeExpr::bag_of, same))
    }

    fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        UnitSpec::of(Self::TAG).with("operand", self.operand)?
                               .with("overflow", self.overflow)
    }
}

impl Function for Total {
    fn apply(&self, input: Value) -> Result<Value, EvalError> {
        let record = input.into_tuple()?;
        let policy = policy(self.overflow);
        let mut values = record.values();
        let Some(first) = values.next() else {
            return Ok(Value::Long(0));
        };
        check_operand(self.operand, first)?;
        values.try_fold(first.clone(), |acc, v| {
                  check_operand(self.operand, v)?;
                  numeric::add(&acc, v, policy)
              })
    }
}

impl FromSpec for Total {
    const TAG: &'static str = "tuple_ops::Total";

    fn from_spec(spec: &UnitSpec, _registry: &Registry) -> Result<Self, ConfigError> {
        Ok(Self { operand: spec.field("operand")?,
                  overflow: spec.field("overflow")? })
    }

    fn into_unit(self) -> AnyUnit {
        AnyUnit::Function(Arc::new(self))
    }
}

/// `a - b` sobre un par posicional `(a, b)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Difference {
    pub operand: Option<ValueType>,
    pub overflow: Option<OverflowPolicy>,
}

impl Difference {
    pub fn of(operand: ValueType) -> Self {
        Self { operand: Some(operand),
               ..Self::default() }
    }
}

impl Unit for Difference {
    fn kind(&self) -> UnitKind {
        UnitKind::Function
    }

    fn declaration(&self) -> Result<Declaration, ConfigError> {
        Ok(numeric_function("Difference", self.operand, |n| TypeExpr::fixed(vec![n.clone(), n]), same))
    }

    fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        UnitSpec::of(Self::TAG).with("operand", self.operand)?
                               .with("overflow", self.overflow)
    }
}

impl Function for Difference {
    fn apply(&self, input: Value) -> Result<Value, EvalError> {
        let record = input.into_tuple()?;
        if record.len() != 2 {
            return Err(EvalError::cast(ValueType::Fixed(2), record.value_type()));
        }
        let mut values = record.values();
        let (Some(a), Some(b)) = (values.next(), values.next()) else {
            return Err(EvalError::cast(ValueType::Fixed(2), record.value_type()));
        };
        check_operand(self.operand, a)?;
        check_operand(self.operand, b)?;
        numeric::sub(a, b, policy(self.overflow))
    }
}

impl FromSpec for Difference {
    const TAG: &'static str = "tuple_ops::Difference";

    fn from_spec(spec: &UnitSpec, _registry: &Registry) -> Result<Self, ConfigError> {
        Ok(Self { operand: spec.field("operand")?,
                  overflow: spec.field("overflow")? })
    }

    fn into_unit(self) -> AnyUnit {
        AnyUnit::Function(Arc::new(self))
    }
}

#[cfg(test)]
mod tests {
    use tuple_core::{IntoValue, Signature};

    use super::*;

    #[test]
    fn increment_keeps_width() {
        assert_eq!(Increment::default().apply(Value::Short(1)), Ok(Value::Short(2)));
        assert_eq!(Increment::default().apply(Value::Double(0.5)), Ok(Value::Double(1.5)));
        let clamped = Increment::default().with_overflow(OverflowPolicy::Clamp);
        assert_eq!(clamped.apply(Value::Int(i32::MAX)), Ok(Value::Int(i32::MAX)));
    }

    #[test]
    fn negate_and_square() {
        assert_eq!(Negate::default().apply(Value::Long(4)), Ok(Value::Long(-4)));
        assert_eq!(Square::default().apply(Value::Int(-3)), Ok(Value::Int(9)));
        assert!(Square::default().apply(Value::Text("3".into())).unwrap_err().is_cast());
    }

    #[test]
    fn to_text_renders_json_for_non_text() {
        assert_eq!(ToText.apply(Value::Text("x".into())), Ok(Value::Text("x".into())));
        assert_eq!(ToText.apply(Value::Long(12)), Ok(Value::Text("12".into())));
        assert_eq!(ToText.apply(vec![1i64, 2].into_value()), Ok(Value::Text("[1,2]".into())));
    }

    #[test]
    fn total_is_variadic_over_numbers() {
        let total = Total::default();
        let sig = Signature::input_of(&total).unwrap();
        assert!(sig.is_variadic());
        assert!(sig.assignable(&[ValueType::Long, ValueType::Int, ValueType::Double]).is_valid());
        assert!(!sig.assignable(&[ValueType::Text]).is_valid());
        assert_eq!(Total::default().apply(vec![1i64, 2, 3].into_value()), Ok(Value::Long(6)));
        assert_eq!(Total::default().apply(Vec::<i64>::new().into_value()), Ok(Value::Long(0)));
    }

    #[test]
    fn difference_takes_a_pair() {
        let difference = Difference::of(ValueType::Long);
        let sig = Signature::input_of(&difference).unwrap();
        assert_eq!(sig.num_classes(), Some(2));
        assert_eq!(Difference::default().apply((10i64, 4i64).into_value()), Ok(Value::Long(6)));
        assert!(Difference::default().apply(vec![1i64].into_value()).unwrap_err().is_cast());
    }
}
