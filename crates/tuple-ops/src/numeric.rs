//! Aritmética sobre `Value` numéricos.
//!
//! Promoción: el resultado toma el ancho mayor de los operandos
//! (`Short < Int < Long`), y `Double` si alguno lo es. El desbordamiento de
//! enteros se trata según `OverflowPolicy` en el ancho del resultado.

use std::cmp::Ordering;

use tuple_core::{CoreConfig, EvalError, OverflowPolicy, TypeExpr, TypeVar, Value, ValueType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Width {
    Short,
    Int,
    Long,
}

impl Width {
    fn bounds(self) -> (i128, i128) {
        match self {
            Width::Short => (i16::MIN as i128, i16::MAX as i128),
            Width::Int => (i32::MIN as i128, i32::MAX as i128),
            Width::Long => (i64::MIN as i128, i64::MAX as i128),
        }
    }

    fn value(self, n: i128) -> Value {
        match self {
            Width::Short => Value::Short(n as i16),
            Width::Int => Value::Int(n as i32),
            Width::Long => Value::Long(n as i64),
        }
    }

    fn value_type(self) -> ValueType {
        match self {
            Width::Short => ValueType::Short,
            Width::Int => ValueType::Int,
            Width::Long => ValueType::Long,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i128, Width),
    Double(f64),
}

impl Num {
    fn of(value: &Value) -> Result<Self, EvalError> {
        match value {
            Value::Short(n) => Ok(Num::Int(*n as i128, Width::Short)),
            Value::Int(n) => Ok(Num::Int(*n as i128, Width::Int)),
            Value::Long(n) => Ok(Num::Int(*n as i128, Width::Long)),
            Value::Double(d) => Ok(Num::Double(*d)),
            other => Err(EvalError::cast(ValueType::Number, other.value_type())),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Num::Int(n, _) => n as f64,
            Num::Double(d) => d,
        }
    }
}

/// Ajusta `n` al ancho `width` según la política.
fn fit(n: i128, width: Width, policy: OverflowPolicy) -> Result<Value, EvalError> {
    let (min, max) = width.bounds();
    if (min..=max).contains(&n) {
        return Ok(width.value(n));
    }
    match policy {
        OverflowPolicy::Clamp => Ok(width.value(n.clamp(min, max))),
        // `as` trunca en complemento a dos
        OverflowPolicy::Wrap => Ok(width.value(n)),
        OverflowPolicy::Error => Err(EvalError::Overflow(format!("{n} does not fit in {}", width.value_type()))),
    }
}

fn binary(a: &Value,
          b: &Value,
          policy: OverflowPolicy,
          int: fn(i128, i128) -> i128,
          double: fn(f64, f64) -> f64)
          -> Result<Value, EvalError> {
    match (Num::of(a)?, Num::of(b)?) {
        (Num::Int(x, wx), Num::Int(y, wy)) => fit(int(x, y), wx.max(wy), policy),
        (x, y) => Ok(Value::Double(double(x.as_f64(), y.as_f64()))),
    }
}

pub fn add(a: &Value, b: &Value, policy: OverflowPolicy) -> Result<Value, EvalError> {
    binary(a, b, policy, |x, y| x + y, |x, y| x + y)
}

pub fn sub(a: &Value, b: &Value, policy: OverflowPolicy) -> Result<Value, EvalError> {
    binary(a, b, policy, |x, y| x - y, |x, y| x - y)
}

pub fn mul(a: &Value, b: &Value, policy: OverflowPolicy) -> Result<Value, EvalError> {
    // i64 * i64 cabe en i128
    binary(a, b, policy, |x, y| x * y, |x, y| x * y)
}

pub fn neg(a: &Value, policy: OverflowPolicy) -> Result<Value, EvalError> {
    match Num::of(a)? {
        Num::Int(x, w) => fit(-x, w, policy),
        Num::Double(d) => Ok(Value::Double(-d)),
    }
}

/// Orden numérico entre valores de cualquier ancho. `NaN` no es comparable.
pub fn compare(a: &Value, b: &Value) -> Result<Option<Ordering>, EvalError> {
    match (Num::of(a)?, Num::of(b)?) {
        (Num::Int(x, _), Num::Int(y, _)) => Ok(Some(x.cmp(&y))),
        (x, y) => Ok(x.as_f64().partial_cmp(&y.as_f64())),
    }
}

pub fn to_f64(a: &Value) -> Result<f64, EvalError> {
    Num::of(a).map(Num::as_f64)
}

/// El mayor de los dos; ante empate o `NaN` se queda con `a`.
pub fn max(a: &Value, b: &Value) -> Result<Value, EvalError> {
    Ok(match compare(a, b)? {
        Some(Ordering::Less) => b.clone(),
        _ => a.clone(),
    })
}

pub fn min(a: &Value, b: &Value) -> Result<Value, EvalError> {
    Ok(match compare(a, b)? {
        Some(Ordering::Greater) => b.clone(),
        _ => a.clone(),
    })
}

/// Política efectiva: la de la unidad o, si no la fija, la global.
pub(crate) fn policy(overflow: Option<OverflowPolicy>) -> OverflowPolicy {
    overflow.unwrap_or(CoreConfig::global().overflow)
}

/// Variable `N: Number` de una unidad numérica.
pub(crate) fn number_var(owner: &str) -> TypeVar {
    TypeVar::bounded(owner, "N", TypeExpr::Class(ValueType::Number))
}

/// Rechaza valores que no encajan en el operando declarado por la unidad.
pub(crate) fn check_operand(operand: Option<ValueType>, value: &Value) -> Result<(), EvalError> {
    match operand {
        Some(t) if !t.is_assignable_from(&value.value_type()) => Err(EvalError::cast(t, value.value_type())),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotes_to_wider_operand() {
        assert_eq!(add(&Value::Short(1), &Value::Int(2), OverflowPolicy::Clamp), Ok(Value::Int(3)));
        assert_eq!(add(&Value::Long(1), &Value::Double(0.5), OverflowPolicy::Clamp), Ok(Value::Double(1.5)));
        assert_eq!(mul(&Value::Short(3), &Value::Short(4), OverflowPolicy::Clamp), Ok(Value::Short(12)));
    }

    #[test]
    fn overflow_policies() {
        let a = Value::Short(i16::MAX);
        let one = Value::Short(1);
        assert_eq!(add(&a, &one, OverflowPolicy::Clamp), Ok(Value::Short(i16::MAX)));
        assert_eq!(add(&a, &one, OverflowPolicy::Wrap), Ok(Value::Short(i16::MIN)));
        assert!(matches!(add(&a, &one, OverflowPolicy::Error), Err(EvalError::Overflow(_))));
        assert_eq!(neg(&Value::Long(i64::MIN), OverflowPolicy::Clamp), Ok(Value::Long(i64::MAX)));
        assert_eq!(mul(&Value::Long(i64::MAX), &Value::Long(2), OverflowPolicy::Clamp), Ok(Value::Long(i64::MAX)));
    }

    #[test]
    fn non_numeric_is_a_cast_error() {
        let err = add(&Value::Text("1".into()), &Value::Long(1), OverflowPolicy::Clamp).unwrap_err();
        assert_eq!(err, EvalError::cast(ValueType::Number, ValueType::Text));
    }

    #[test]
    fn extremes_compare_across_widths() {
        assert_eq!(max(&Value::Short(3), &Value::Long(7)), Ok(Value::Long(7)));
        assert_eq!(min(&Value::Double(2.5), &Value::Int(2)), Ok(Value::Int(2)));
        assert_eq!(compare(&Value::Double(f64::NAN), &Value::Int(1)), Ok(None));
    }
}
