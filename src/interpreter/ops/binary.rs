//! Binary arithmetic and bitwise operators
//!
//! Ints are computed in 64 bits first; a result that does not fit is redone
//! with arbitrary precision. `bool` operands behave as `0`/`1`.

use crate::interpreter::constants::{MAX_INT_BITS, MAX_SEQUENCE_ITEMS};
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::Value;
use crate::parser::ast::{BinOp, SourceLocation};
use num_bigint::{BigInt, Sign};
use num_integer::Integer;
use num_traits::{ToPrimitive, Zero};
use std::rc::Rc;

impl Interpreter<'_> {
    /// Apply `left op right`
    pub(crate) fn binary_operation(
        &mut self,
        op: BinOp,
        left: &Value,
        right: &Value,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if let Some(result) = sequence_operation(op, left, right, location)? {
            return Ok(result);
        }

        if op == BinOp::Mod {
            if let Value::Str(template) = left {
                return self.percent_format(template, right, location).map(Value::from);
            }
        }

        if let (Some(a), Some(b)) = (left.as_int(), right.as_int()) {
            if let Some(result) = int_operation(op, a, b, left, right, location)? {
                return Ok(result);
            }
        }

        if let (Some(a), Some(b)) = (left.as_bigint(), right.as_bigint()) {
            return big_int_operation(op, &a, &b, location);
        }

        if left.is_number() && right.is_number() && !is_bitwise(op) {
            let a = float_operand(left, location)?;
            let b = float_operand(right, location)?;
            return float_operation(op, a, b, location).map(Value::Float);
        }

        Err(unsupported(op, left, right, location))
    }
}

fn is_bitwise(op: BinOp) -> bool {
    matches!(
        op,
        BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor | BinOp::Shl | BinOp::Shr
    )
}

fn unsupported(op: BinOp, left: &Value, right: &Value, location: SourceLocation) -> RuntimeError {
    RuntimeError::type_error(
        format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ),
        location,
    )
}

/// Concatenation and repetition of str, list and tuple
fn sequence_operation(
    op: BinOp,
    left: &Value,
    right: &Value,
    location: SourceLocation,
) -> Result<Option<Value>, RuntimeError> {
    let result = match (op, left, right) {
        (BinOp::Add, Value::Str(a), Value::Str(b)) => Value::from(format!("{}{}", a, b)),
        (BinOp::Add, Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Value::new_list(items)
        }
        (BinOp::Add, Value::Tuple(a), Value::Tuple(b)) => {
            Value::new_tuple(a.iter().chain(b.iter()).cloned().collect())
        }
        (BinOp::Add, Value::Str(_) | Value::List(_) | Value::Tuple(_), other) => {
            return Err(RuntimeError::type_error(
                format!(
                    "can only concatenate {} (not \"{}\") to {}",
                    left.type_name(),
                    other.type_name(),
                    left.type_name()
                ),
                location,
            ));
        }
        (BinOp::Mul, sequence, count) | (BinOp::Mul, count, sequence)
            if is_sequence(sequence) && count.is_int() =>
        {
            let times = match (count.as_int(), count) {
                (Some(n), _) => usize::try_from(n).unwrap_or(0),
                (None, Value::Long(n)) if n.sign() == Sign::Minus => 0,
                (None, _) => {
                    return Err(RuntimeError::overflow(
                        "cannot fit 'int' into an index-sized integer",
                        location,
                    ))
                }
            };
            repeat(sequence, times, location)?
        }
        (BinOp::Mul, sequence, other) | (BinOp::Mul, other, sequence) if is_sequence(sequence) => {
            return Err(RuntimeError::type_error(
                format!(
                    "can't multiply sequence by non-int of type '{}'",
                    other.type_name()
                ),
                location,
            ));
        }
        _ => return Ok(None),
    };
    Ok(Some(result))
}

fn is_sequence(value: &Value) -> bool {
    matches!(value, Value::Str(_) | Value::List(_) | Value::Tuple(_))
}

fn repeat(sequence: &Value, times: usize, location: SourceLocation) -> Result<Value, RuntimeError> {
    let len = match sequence {
        Value::Str(s) => s.len(),
        Value::List(items) => items.borrow().len(),
        Value::Tuple(items) => items.len(),
        _ => 0,
    };
    if len
        .checked_mul(times)
        .map_or(true, |total| total > MAX_SEQUENCE_ITEMS)
    {
        return Err(RuntimeError::out_of_memory(location));
    }

    Ok(match sequence {
        Value::Str(s) => Value::from(s.repeat(times)),
        Value::List(items) => {
            let items = items.borrow();
            Value::new_list(items.iter().cloned().cycle().take(items.len() * times).collect())
        }
        Value::Tuple(items) => Value::Tuple(Rc::new(
            items.iter().cloned().cycle().take(items.len() * times).collect(),
        )),
        other => other.clone(),
    })
}

/// `a op b` on 64-bit ints; `None` when the result needs a big int
fn int_operation(
    op: BinOp,
    a: i64,
    b: i64,
    left: &Value,
    right: &Value,
    location: SourceLocation,
) -> Result<Option<Value>, RuntimeError> {
    let result = match op {
        BinOp::Add => a.checked_add(b),
        BinOp::Sub => a.checked_sub(b),
        BinOp::Mul => a.checked_mul(b),
        BinOp::Div => {
            if b == 0 {
                return Err(RuntimeError::zero_division("division by zero", location));
            }
            return Ok(Some(Value::Float(a as f64 / b as f64)));
        }
        BinOp::FloorDiv => {
            if b == 0 {
                return Err(RuntimeError::zero_division(
                    "integer division or modulo by zero",
                    location,
                ));
            }
            floor_div(a, b)
        }
        BinOp::Mod => {
            if b == 0 {
                return Err(RuntimeError::zero_division(
                    "integer division or modulo by zero",
                    location,
                ));
            }
            Some(floor_mod(a, b))
        }
        BinOp::Pow => {
            if b < 0 {
                if a == 0 {
                    return Err(RuntimeError::zero_division(
                        "0.0 cannot be raised to a negative power",
                        location,
                    ));
                }
                return Ok(Some(Value::Float((a as f64).powf(b as f64))));
            }
            u32::try_from(b).ok().and_then(|exponent| a.checked_pow(exponent))
        }
        BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor => {
            let value = match op {
                BinOp::BitAnd => a & b,
                BinOp::BitOr => a | b,
                _ => a ^ b,
            };
            // bool op bool stays a bool
            if matches!((left, right), (Value::Bool(_), Value::Bool(_))) {
                return Ok(Some(Value::Bool(value != 0)));
            }
            Some(value)
        }
        BinOp::Shl => {
            if b < 0 {
                return Err(RuntimeError::value_error("negative shift count", location));
            }
            if a == 0 {
                Some(0)
            } else {
                u32::try_from(b)
                    .ok()
                    .filter(|shift| *shift < 64)
                    .and_then(|shift| {
                        let shifted = a << shift;
                        (shifted >> shift == a).then_some(shifted)
                    })
            }
        }
        BinOp::Shr => {
            if b < 0 {
                return Err(RuntimeError::value_error("negative shift count", location));
            }
            Some(a >> b.min(63))
        }
    };
    Ok(result.map(Value::Int))
}

/// `a op b` on arbitrary-precision ints
fn big_int_operation(
    op: BinOp,
    a: &BigInt,
    b: &BigInt,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let divisor_is_zero = || {
        if b.is_zero() {
            Err(RuntimeError::zero_division(
                "integer division or modulo by zero",
                location,
            ))
        } else {
            Ok(())
        }
    };

    let result = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => {
            check_int_size(a.bits() + b.bits(), location)?;
            a * b
        }
        BinOp::Div => {
            if b.is_zero() {
                return Err(RuntimeError::zero_division("division by zero", location));
            }
            return true_divide(a, b, location).map(Value::Float);
        }
        BinOp::FloorDiv => {
            divisor_is_zero()?;
            a.div_floor(b)
        }
        BinOp::Mod => {
            divisor_is_zero()?;
            a.mod_floor(b)
        }
        BinOp::Pow => return big_int_power(a, b, location),
        BinOp::BitAnd => a & b,
        BinOp::BitOr => a | b,
        BinOp::BitXor => a ^ b,
        BinOp::Shl => {
            if b.sign() == Sign::Minus {
                return Err(RuntimeError::value_error("negative shift count", location));
            }
            if a.is_zero() {
                return Ok(Value::Int(0));
            }
            let shift = b.to_u64().unwrap_or(u64::MAX);
            check_int_size(a.bits().saturating_add(shift), location)?;
            a << shift as usize
        }
        BinOp::Shr => {
            if b.sign() == Sign::Minus {
                return Err(RuntimeError::value_error("negative shift count", location));
            }
            match b.to_u64().filter(|shift| *shift < a.bits()) {
                Some(shift) => a >> shift as usize,
                None if a.sign() == Sign::Minus => BigInt::from(-1),
                None => BigInt::zero(),
            }
        }
    };
    Ok(Value::from_bigint(result))
}

fn big_int_power(a: &BigInt, b: &BigInt, location: SourceLocation) -> Result<Value, RuntimeError> {
    if b.sign() == Sign::Minus {
        if a.is_zero() {
            return Err(RuntimeError::zero_division(
                "0.0 cannot be raised to a negative power",
                location,
            ));
        }
        let base = float_operand(&Value::from_bigint(a.clone()), location)?;
        let exponent = b.to_f64().unwrap_or(f64::NEG_INFINITY);
        return Ok(Value::Float(base.powf(exponent)));
    }

    // 0, 1 and -1 stay small for any exponent
    if a.bits() <= 1 {
        let value = match a.to_i64() {
            Some(0) => i64::from(b.is_zero()),
            Some(-1) if b.is_even() => 1,
            Some(n) => n,
            None => 0,
        };
        return Ok(Value::Int(value));
    }

    let exponent = b
        .to_u64()
        .filter(|e| (a.bits() - 1).saturating_mul(*e) <= MAX_INT_BITS)
        .and_then(|e| u32::try_from(e).ok())
        .ok_or_else(|| RuntimeError::out_of_memory(location))?;
    Ok(Value::from_bigint(a.pow(exponent)))
}

/// `a / b` as a float, rounding both operands into float range first
fn true_divide(a: &BigInt, b: &BigInt, location: SourceLocation) -> Result<f64, RuntimeError> {
    let shift = a.bits().max(b.bits()).saturating_sub(1000) as usize;
    match ((a >> shift).to_f64(), (b >> shift).to_f64()) {
        (Some(x), Some(y)) if y != 0.0 && (x / y).is_finite() => Ok(x / y),
        _ => Err(RuntimeError::overflow(
            "integer division result too large for a float",
            location,
        )),
    }
}

fn check_int_size(bits: u64, location: SourceLocation) -> Result<(), RuntimeError> {
    if bits > MAX_INT_BITS {
        return Err(RuntimeError::out_of_memory(location));
    }
    Ok(())
}

/// Float view of a number operand; ints beyond float range raise `OverflowError`
pub(crate) fn float_operand(value: &Value, location: SourceLocation) -> Result<f64, RuntimeError> {
    match value.as_f64() {
        Some(x) if matches!(value, Value::Long(_)) && !x.is_finite() => Err(
            RuntimeError::overflow("int too large to convert to float", location),
        ),
        Some(x) => Ok(x),
        None => Err(RuntimeError::type_error(
            format!("must be real number, not {}", value.type_name()),
            location,
        )),
    }
}

/// Python `//`: rounds toward negative infinity
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let quotient = a.checked_div(b)?;
    if (a % b != 0) && ((a < 0) != (b < 0)) {
        quotient.checked_sub(1)
    } else {
        Some(quotient)
    }
}

/// Python `%`: the result takes the sign of the divisor
fn floor_mod(a: i64, b: i64) -> i64 {
    // i64::MIN % -1 overflows in Rust but is 0 mathematically
    let remainder = a.checked_rem(b).unwrap_or(0);
    if remainder != 0 && ((remainder < 0) != (b < 0)) {
        remainder + b
    } else {
        remainder
    }
}

fn float_operation(op: BinOp, a: f64, b: f64, location: SourceLocation) -> Result<f64, RuntimeError> {
    Ok(match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => {
            if b == 0.0 {
                return Err(RuntimeError::zero_division("float division by zero", location));
            }
            a / b
        }
        BinOp::FloorDiv => {
            if b == 0.0 {
                return Err(RuntimeError::zero_division(
                    "float floor division by zero",
                    location,
                ));
            }
            (a / b).floor()
        }
        BinOp::Mod => {
            if b == 0.0 {
                return Err(RuntimeError::zero_division("float modulo", location));
            }
            let remainder = a % b;
            if remainder != 0.0 && ((remainder < 0.0) != (b < 0.0)) {
                remainder + b
            } else {
                remainder
            }
        }
        BinOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(RuntimeError::zero_division(
                    "0.0 cannot be raised to a negative power",
                    location,
                ));
            }
            a.powf(b)
        }
        // Bitwise operators never reach here
        BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor | BinOp::Shl | BinOp::Shr => f64::NAN,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::errors::ExceptionKind;

    #[test]
    fn test_floor_semantics() {
        assert_eq!(floor_div(7, 2), Some(3));
        assert_eq!(floor_div(-7, 2), Some(-4));
        assert_eq!(floor_div(7, -2), Some(-4));
        assert_eq!(floor_div(i64::MIN, -1), None);
        assert_eq!(floor_mod(-7, 3), 2);
        assert_eq!(floor_mod(7, -3), -2);
        assert_eq!(floor_mod(i64::MIN, -1), 0);
    }

    #[test]
    fn test_int_overflow_defers_to_big_ints() {
        let loc = SourceLocation::default();
        let max = Value::Int(i64::MAX);
        let result = int_operation(BinOp::Add, i64::MAX, 1, &max, &Value::Int(1), loc).unwrap();
        assert!(result.is_none());

        let big = BigInt::from(i64::MAX) + BigInt::from(1);
        let sum = big_int_operation(BinOp::Add, &big, &BigInt::from(1), loc).unwrap();
        assert_eq!(sum.repr().unwrap(), "9223372036854775809");
        let back = big_int_operation(BinOp::Sub, &big, &BigInt::from(1), loc).unwrap();
        assert!(matches!(back, Value::Int(i64::MAX)));
        let quotient = big_int_operation(BinOp::FloorDiv, &-big, &BigInt::from(-1), loc).unwrap();
        assert_eq!(quotient.repr().unwrap(), "9223372036854775808");
    }

    #[test]
    fn test_big_int_power_and_shifts() {
        let loc = SourceLocation::default();
        let two = BigInt::from(2);
        let power = big_int_operation(BinOp::Pow, &two, &BigInt::from(100), loc).unwrap();
        assert_eq!(power.repr().unwrap(), "1267650600228229401496703205376");
        let minus_one = big_int_operation(BinOp::Pow, &BigInt::from(-1), &BigInt::from(u64::MAX), loc).unwrap();
        assert!(matches!(minus_one, Value::Int(-1)));
        let err = big_int_operation(BinOp::Pow, &two, &BigInt::from(u64::MAX), loc).unwrap_err();
        assert_eq!(err.exception().unwrap().kind, ExceptionKind::MemoryError);
        let shifted = big_int_operation(BinOp::Shr, &BigInt::from(-5), &BigInt::from(1000), loc).unwrap();
        assert!(matches!(shifted, Value::Int(-1)));
    }

    #[test]
    fn test_zero_division_messages() {
        let loc = SourceLocation::default();
        let one = Value::Int(1);
        let zero = Value::Int(0);
        let err = int_operation(BinOp::Div, 1, 0, &one, &zero, loc).unwrap_err();
        assert_eq!(err.to_string(), "division by zero");
        let err = int_operation(BinOp::Mod, 1, 0, &one, &zero, loc).unwrap_err();
        assert_eq!(err.to_string(), "integer division or modulo by zero");
        let err = float_operation(BinOp::Div, 1.0, 0.0, loc).unwrap_err();
        assert_eq!(err.to_string(), "float division by zero");
    }

    #[test]
    fn test_sequence_errors() {
        let loc = SourceLocation::default();
        let err = sequence_operation(BinOp::Add, &Value::from("a"), &Value::Int(1), loc).unwrap_err();
        assert_eq!(err.to_string(), "can only concatenate str (not \"int\") to str");

        let repeated = sequence_operation(BinOp::Mul, &Value::Int(3), &Value::from("ab"), loc)
            .unwrap()
            .unwrap();
        assert_eq!(repeated.to_str().unwrap(), "ababab");

        let err = sequence_operation(BinOp::Mul, &Value::from("x"), &Value::Int(100_000_000_000), loc)
            .unwrap_err();
        assert_eq!(err.exception().unwrap().kind, ExceptionKind::MemoryError);
    }
}
