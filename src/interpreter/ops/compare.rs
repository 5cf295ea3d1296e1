//! Comparison operators and ordering
//!
//! Ordering follows Python: numbers compare by value, strings by code point,
//! lists and tuples lexicographically. Ordering values of unrelated types is
//! a `TypeError`; equality never is.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::{range_len, Value};
use crate::parser::ast::{CmpOp, SourceLocation};
use std::cmp::Ordering;

impl Interpreter<'_> {
    /// Evaluate one link of a comparison chain
    pub(crate) fn compare(
        &self,
        op: CmpOp,
        left: &Value,
        right: &Value,
        location: SourceLocation,
    ) -> Result<bool, RuntimeError> {
        Ok(match op {
            CmpOp::Eq => left.py_eq(right),
            CmpOp::NotEq => !left.py_eq(right),
            CmpOp::Is => left.is_same(right),
            CmpOp::IsNot => !left.is_same(right),
            CmpOp::In => contains(right, left, location)?,
            CmpOp::NotIn => !contains(right, left, location)?,
            CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge => {
                match order(left, right, op.symbol(), location)? {
                    // NaN compares false with everything
                    None => false,
                    Some(ordering) => match op {
                        CmpOp::Lt => ordering == Ordering::Less,
                        CmpOp::Le => ordering != Ordering::Greater,
                        CmpOp::Gt => ordering == Ordering::Greater,
                        _ => ordering != Ordering::Less,
                    },
                }
            }
        })
    }
}

/// Order two values for `symbol` (`<`, `<=`, ...); `None` when unordered
pub(crate) fn order(
    left: &Value,
    right: &Value,
    symbol: &str,
    location: SourceLocation,
) -> Result<Option<Ordering>, RuntimeError> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        (a, b) if a.is_number() && b.is_number() => match (a.as_int(), b.as_int()) {
            (Some(x), Some(y)) => Ok(Some(x.cmp(&y))),
            _ if a.is_int() && b.is_int() => Ok(a.as_bigint().zip(b.as_bigint()).map(|(x, y)| x.cmp(&y))),
            _ => Ok(a.as_f64().zip(b.as_f64()).and_then(|(x, y)| x.partial_cmp(&y))),
        },
        (Value::List(a), Value::List(b)) => {
            order_sequences(&a.borrow(), &b.borrow(), symbol, location)
        }
        (Value::Tuple(a), Value::Tuple(b)) => order_sequences(a, b, symbol, location),
        _ => Err(RuntimeError::type_error(
            format!(
                "'{}' not supported between instances of '{}' and '{}'",
                symbol,
                left.type_name(),
                right.type_name()
            ),
            location,
        )),
    }
}

/// Lexicographic order: the first unequal pair decides, then length
fn order_sequences(
    a: &[Value],
    b: &[Value],
    symbol: &str,
    location: SourceLocation,
) -> Result<Option<Ordering>, RuntimeError> {
    for (x, y) in a.iter().zip(b) {
        if !x.py_eq(y) {
            return order(x, y, symbol, location);
        }
    }
    Ok(Some(a.len().cmp(&b.len())))
}

/// `item in container`
pub(crate) fn contains(
    container: &Value,
    item: &Value,
    location: SourceLocation,
) -> Result<bool, RuntimeError> {
    match container {
        Value::Str(text) => match item {
            Value::Str(needle) => Ok(text.contains(&**needle)),
            other => Err(RuntimeError::type_error(
                format!(
                    "'in <string>' requires string as left operand, not {}",
                    other.type_name()
                ),
                location,
            )),
        },
        Value::List(items) => Ok(items.borrow().iter().any(|x| x.py_eq(item))),
        Value::Tuple(items) => Ok(items.iter().any(|x| x.py_eq(item))),
        Value::Dict(dict) => {
            if !item.is_hashable() {
                return Err(RuntimeError::type_error(
                    format!("unhashable type: '{}'", item.type_name()),
                    location,
                ));
            }
            Ok(dict.borrow().contains_key(item))
        }
        Value::Range { start, step, .. } => {
            let Some(n) = item.as_int().or_else(|| match item {
                Value::Float(x) if x.fract() == 0.0 => Some(*x as i64),
                _ => None,
            }) else {
                return Ok(false);
            };
            let offset = i128::from(n) - i128::from(*start);
            if offset % i128::from(*step) != 0 {
                return Ok(false);
            }
            let index = offset / i128::from(*step);
            Ok(index >= 0 && index < range_len(container) as i128)
        }
        other => Err(RuntimeError::type_error(
            format!("argument of type '{}' is not iterable", other.type_name()),
            location,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_numeric_order() {
        let loc = SourceLocation::default();
        assert_eq!(
            order(&Value::Int(1), &Value::Float(1.5), "<", loc).unwrap(),
            Some(Ordering::Less)
        );
        assert_eq!(order(&Value::Float(f64::NAN), &Value::Int(1), "<", loc).unwrap(), None);

        let huge = Value::from_bigint(num_bigint::BigInt::from(i64::MAX) * num_bigint::BigInt::from(4));
        assert_eq!(
            order(&Value::Int(i64::MAX), &huge, "<", loc).unwrap(),
            Some(Ordering::Less)
        );
        assert_eq!(
            order(&huge, &Value::Float(1e300), ">", loc).unwrap(),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn test_sequence_order() {
        let loc = SourceLocation::default();
        let a = Value::new_list(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::new_list(vec![Value::Int(1), Value::Int(3)]);
        let c = Value::new_list(vec![Value::Int(1)]);
        assert_eq!(order(&a, &b, "<", loc).unwrap(), Some(Ordering::Less));
        assert_eq!(order(&c, &a, "<", loc).unwrap(), Some(Ordering::Less));
    }

    #[test]
    fn test_unorderable_types() {
        let err = order(&Value::Int(1), &Value::from("a"), "<", SourceLocation::default())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "'<' not supported between instances of 'int' and 'str'"
        );
    }

    #[test]
    fn test_range_membership() {
        let loc = SourceLocation::default();
        let range = Value::Range { start: 0, stop: 10, step: 3 };
        assert!(contains(&range, &Value::Int(9), loc).unwrap());
        assert!(!contains(&range, &Value::Int(10), loc).unwrap());
        assert!(!contains(&range, &Value::Int(-3), loc).unwrap());
        assert!(contains(&Value::from("hello"), &Value::from("ell"), loc).unwrap());
    }
}
