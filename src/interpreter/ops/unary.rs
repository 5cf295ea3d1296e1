use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::Value;
use crate::parser::ast::{SourceLocation, UnOp};
use num_bigint::BigInt;

impl Interpreter<'_> {
    /// Apply a unary operator
    pub(crate) fn unary_operation(
        &self,
        op: UnOp,
        operand: &Value,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if op == UnOp::Not {
            return Ok(Value::Bool(!operand.is_truthy()));
        }

        let symbol = match op {
            UnOp::Neg => "-",
            UnOp::Pos => "+",
            UnOp::Invert => "~",
            UnOp::Not => "not",
        };
        let bad_operand = || {
            RuntimeError::type_error(
                format!("bad operand type for unary {}: '{}'", symbol, operand.type_name()),
                location,
            )
        };

        match (op, operand) {
            (UnOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
            (UnOp::Pos, Value::Float(x)) => Ok(Value::Float(*x)),
            (UnOp::Invert, Value::Float(_)) => Err(bad_operand()),
            (UnOp::Neg, Value::Long(n)) => Ok(Value::from_bigint(-&**n)),
            (UnOp::Invert, Value::Long(n)) => Ok(Value::from_bigint(!&**n)),
            (_, Value::Long(_)) => Ok(operand.clone()),
            (_, value) => {
                let n = value.as_int().ok_or_else(bad_operand)?;
                match op {
                    UnOp::Neg => Ok(n
                        .checked_neg()
                        .map(Value::Int)
                        .unwrap_or_else(|| Value::from_bigint(-BigInt::from(n)))),
                    UnOp::Invert => Ok(Value::Int(!n)),
                    _ => Ok(Value::Int(n)),
                }
            }
        }
    }
}
