//! Operadores binarios numéricos y `Flip`.
//!
//! `Sum`, `Product`, `Max` y `Min` se declaran como `Op<N: Number>
//! implements BinaryOperator<N>`. Sin `operand` la variable `N` queda sin
//! ligar y la firma cae a su cota (`Number`), con aridad de entrada 2.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tuple_core::signature::Declaration;
use tuple_core::{AnyUnit, BinaryOperator, ConfigError, EvalError, FromSpec, OverflowPolicy, Registry, Unit,
                 UnitKind, UnitSpec, Value, ValueType};

use crate::numeric::{self, check_operand, number_var, policy};

fn operator_declaration(owner: &str, operand: Option<ValueType>) -> Declaration {
    let n = number_var(owner);
    let contract = vec![Some(n.expr())];
    Declaration::new(UnitKind::BinaryOperator).generic(owner, vec![n], vec![operand.map(Into::into)])
                                              .implements(contract)
}

/// Operador aritmético con política de desbordamiento propia (o la global).
macro_rules! arithmetic_operator {
    ($(#[$meta:meta])* $name:ident, $tag:literal, $op:path) => {
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
                UnitKind::BinaryOperator
            }

            fn declaration(&self) -> Result<Declaration, ConfigError> {
                Ok(operator_declaration(stringify!($name), self.operand))
            }

            fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
                UnitSpec::of(Self::TAG).with("operand", self.operand)?
                                       .with("overflow", self.overflow)
            }
        }

        impl BinaryOperator for $name {
            fn apply(&self, state: Value, input: Value) -> Result<Value, EvalError> {
                check_operand(self.operand, &state)?;
                check_operand(self.operand, &input)?;
                $op(&state, &input, policy(self.overflow))
            }
        }

        impl FromSpec for $name {
            const TAG: &'static str = $tag;

            fn from_spec(spec: &UnitSpec, _registry: &Registry) -> Result<Self, ConfigError> {
                Ok(Self { operand: spec.field("operand")?,
                          overflow: spec.field("overflow")? })
            }

            fn into_unit(self) -> AnyUnit {
                AnyUnit::BinaryOperator(Arc::new(self))
            }
        }
    };
}

/// Operador de comparación: devuelve uno de sus argumentos sin modificarlo.
macro_rules! extremum_operator {
    ($(#[$meta:meta])* $name:ident, $tag:literal, $op:path) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
        pub struct $name {
            pub operand: Option<ValueType>,
        }

        impl $name {
            pub fn of(operand: ValueType) -> Self {
                Self { operand: Some(operand) }
            }
        }

        impl Unit for $name {
            fn kind(&self) -> UnitKind {
                UnitKind::BinaryOperator
            }

            fn declaration(&self) -> Result<Declaration, ConfigError> {
                Ok(operator_declaration(stringify!($name), self.operand))
            }

            fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
                UnitSpec::of(Self::TAG).with("operand", self.operand)
            }
        }

        impl BinaryOperator for $name {
            fn apply(&self, state: Value, input: Value) -> Result<Value, EvalError> {
                check_operand(self.operand, &state)?;
                check_operand(self.operand, &input)?;
                $op(&state, &input)
            }
        }

        impl FromSpec for $name {
            const TAG: &'static str = $tag;

            fn from_spec(spec: &UnitSpec, _registry: &Registry) -> Result<Self, ConfigError> {
                Ok(Self { operand: spec.field("operand")? })
            }

            fn into_unit(self) -> AnyUnit {
                AnyUnit::BinaryOperator(Arc::new(self))
            }
        }
    };
}

arithmetic_operator!(
    /// `state + input`.
    Sum, "tuple_ops::Sum", numeric::add
);
arithmetic_operator!(
    /// `state * input`.
    Product, "tuple_ops::Product", numeric::mul
);
extremum_operator!(Max, "tuple_ops::Max", numeric::max);
extremum_operator!(Min, "tuple_ops::Min", numeric::min);

/// Aplica el operador envuelto con los argumentos invertidos:
/// `flip(op)(state, input) = op(input, state)`.
///
/// Su propio `T` queda abierto; la firma se completa con las ligaduras del
/// operador envuelto.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Flip {
    operator: Option<Arc<dyn BinaryOperator>>,
}

impl Flip {
    pub fn new<O: BinaryOperator + 'static>(operator: O) -> Self {
        Self { operator: Some(Arc::new(operator)) }
    }

    pub fn shared(operator: Arc<dyn BinaryOperator>) -> Self {
        Self { operator: Some(operator) }
    }

    pub fn operator(&self) -> Option<&Arc<dyn BinaryOperator>> {
        self.operator.as_ref()
    }
}

impl Unit for Flip {
    fn kind(&self) -> UnitKind {
        UnitKind::BinaryOperator
    }

    fn declaration(&self) -> Result<Declaration, ConfigError> {
        let t = tuple_core::TypeVar::new("Flip", "T");
        let contract = vec![Some(t.expr())];
        let decl = Declaration::new(UnitKind::BinaryOperator).generic("Flip", vec![t], vec![None])
                                                             .implements(contract);
        match &self.operator {
            Some(op) => Ok(decl.wrapping(op.declaration()?)),
            None => Ok(decl),
        }
    }

    fn to_spec(&self) -> Result<UnitSpec, ConfigError> {
        UnitSpec::of(Self::TAG).with_unit("operator", self.operator.as_deref())
    }
}

impl BinaryOperator for Flip {
    fn apply(&self, state: Value, input: Value) -> Result<Value, EvalError> {
        let operator = self.operator.as_ref().ok_or(ConfigError::MissingOperator)?;
        operator.apply(input, state)
    }
}

impl FromSpec for Flip {
    const TAG: &'static str = "tuple_ops::Flip";

    fn from_spec(spec: &UnitSpec, registry: &Registry) -> Result<Self, ConfigError> {
        Ok(Self { operator: registry.optional_field(spec, "operator", Registry::build_operator)? })
    }

    fn into_unit(self) -> AnyUnit {
        AnyUnit::BinaryOperator(Arc::new(self))
    }
}

#[cfg(test)]
mod tests {
    use tuple_core::{FnOperator, Signature};

    use super::*;

    #[test]
    fn sum_signature_has_two_number_classes() {
        let open = Sum::default();
        let sig = Signature::input_of(&open).unwrap();
        assert_eq!(sig.num_classes(), Some(2));
        assert_eq!(sig.classes(), vec![ValueType::Number, ValueType::Number]);
        let short = Sum::of(ValueType::Short);
        let sig = Signature::input_of(&short).unwrap();
        assert_eq!(sig.classes(), vec![ValueType::Short, ValueType::Short]);
        assert!(!sig.assignable(&[ValueType::Long, ValueType::Short]).is_valid());
    }

    #[test]
    fn arithmetic_honours_operand_and_overflow() {
        let sum = Sum::of(ValueType::Short).with_overflow(OverflowPolicy::Wrap);
        assert_eq!(sum.apply(Value::Short(i16::MAX), Value::Short(1)), Ok(Value::Short(i16::MIN)));
        assert!(sum.apply(Value::Long(1), Value::Short(1)).unwrap_err().is_cast());
        let product = Product::default().with_overflow(OverflowPolicy::Clamp);
        assert_eq!(product.apply(Value::Int(i32::MAX), Value::Int(2)), Ok(Value::Int(i32::MAX)));
    }

    #[test]
    fn extremes() {
        assert_eq!(Max::default().apply(Value::Long(3), Value::Long(9)), Ok(Value::Long(9)));
        assert_eq!(Min::default().apply(Value::Long(3), Value::Long(9)), Ok(Value::Long(3)));
    }

    #[test]
    fn flip_swaps_arguments_and_borrows_wrapped_types() {
        let minus = FnOperator::new("minus", |a: i64, b: i64| a - b);
        let flip = Flip::new(minus);
        assert_eq!(flip.apply(Value::Long(10), Value::Long(3)), Ok(Value::Long(-7)));
        let sig = Signature::input_of(&flip).unwrap();
        assert_eq!(sig.classes(), vec![ValueType::Long, ValueType::Long]);
        assert_eq!(Flip::default().apply(Value::Long(1), Value::Long(2)),
                   Err(EvalError::Config(ConfigError::MissingOperator)));
    }

    #[test]
    fn flip_keeps_bound_of_open_wrapped_operator() {
        // la N abierta de Sum llega a Flip.T con su cota Number
        let flip = Flip::new(Sum::default());
        let sig = Signature::input_of(&flip).unwrap();
        assert_eq!(sig.classes(), vec![ValueType::Number, ValueType::Number]);
        assert!(!sig.assignable(&[ValueType::Text, ValueType::Text]).is_valid());
        assert!(sig.assignable(&[ValueType::Long, ValueType::Long]).is_valid());
        assert!(flip.apply(Value::Text("a".into()), Value::Text("b".into())).unwrap_err().is_cast());

        let flip = Flip::new(Sum::of(ValueType::Int));
        let sig = Signature::input_of(&flip).unwrap();
        assert_eq!(sig.classes(), vec![ValueType::Int, ValueType::Int]);
    }

    #[test]
    fn spec_skips_unset_fields() {
        let spec = Sum::of(ValueType::Long).to_spec().unwrap();
        assert_eq!(spec.to_json(), serde_json::json!({"class": "tuple_ops::Sum", "operand": "Long"}));
        let back = Sum::from_spec(&spec, &Registry::new()).unwrap();
        assert_eq!(back, Sum::of(ValueType::Long));
    }
}
