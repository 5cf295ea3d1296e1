//! Expression evaluation implementation
//!
//! This module handles evaluation of every expression form:
//!
//! - Literals, names, list/tuple/dict displays
//! - Binary, unary, boolean (short-circuit) and chained comparison operators
//! - Conditional expressions
//! - Calls, attribute access and subscripts
//! - List comprehensions
//! - f-strings
//!
//! Operators themselves live in `ops`; this module only walks the tree.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::{ExceptionKind, RuntimeError};
use crate::memory::stack::Namespace;
use crate::memory::value::{Dict, ReprError, Value};
use crate::parser::ast::*;

impl Interpreter<'_> {
    /// Evaluate an expression and return its value
    pub(crate) fn evaluate_expression(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::None(_) => Ok(Value::None),
            Expr::Bool(b, _) => Ok(Value::Bool(*b)),
            Expr::Int(n, _) => Ok(Value::Int(*n)),
            Expr::BigInt(n, _) => Ok(Value::Long(n.clone())),
            Expr::Float(x, _) => Ok(Value::Float(*x)),
            Expr::Str(s, _) => Ok(Value::from(s.as_str())),

            Expr::Name(name, location) => self.lookup_name(name, *location),

            Expr::List(items, _) => Ok(Value::new_list(self.evaluate_all(items)?)),

            Expr::Tuple(items, _) => Ok(Value::new_tuple(self.evaluate_all(items)?)),

            Expr::Dict(entries, location) => {
                let mut dict = Dict::new();
                for (key, value) in entries {
                    let key = self.evaluate_expression(key)?;
                    let value = self.evaluate_expression(value)?;
                    if !key.is_hashable() {
                        return Err(RuntimeError::type_error(
                            format!("unhashable type: '{}'", key.type_name()),
                            *location,
                        ));
                    }
                    dict.insert(key, value);
                }
                Ok(Value::new_dict(dict))
            }

            Expr::FString { parts, location } => self.evaluate_fstring(parts, *location),

            Expr::ListComp {
                element, clauses, ..
            } => self.evaluate_list_comprehension(element, clauses),

            Expr::BinaryOp {
                op,
                left,
                right,
                location,
            } => {
                let left = self.evaluate_expression(left)?;
                let right = self.evaluate_expression(right)?;
                self.binary_operation(*op, &left, &right, *location)
            }

            Expr::UnaryOp {
                op,
                operand,
                location,
            } => {
                let operand = self.evaluate_expression(operand)?;
                self.unary_operation(*op, &operand, *location)
            }

            Expr::BoolOp {
                op, left, right, ..
            } => {
                let left = self.evaluate_expression(left)?;
                // `and`/`or` yield an operand, not a bool
                match (op, left.is_truthy()) {
                    (BoolOp::And, false) | (BoolOp::Or, true) => Ok(left),
                    _ => self.evaluate_expression(right),
                }
            }

            Expr::Compare {
                left,
                comparisons,
                location,
            } => {
                let mut left = self.evaluate_expression(left)?;
                for (op, right) in comparisons {
                    let right = self.evaluate_expression(right)?;
                    if !self.compare(*op, &left, &right, *location)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }

            Expr::IfExp {
                condition,
                body,
                orelse,
                ..
            } => {
                if self.evaluate_expression(condition)?.is_truthy() {
                    self.evaluate_expression(body)
                } else {
                    self.evaluate_expression(orelse)
                }
            }

            Expr::Call {
                func,
                args,
                kwargs,
                location,
            } => {
                let callee = self.evaluate_expression(func)?;
                let args = self.evaluate_all(args)?;
                let kwargs = kwargs
                    .iter()
                    .map(|(name, value)| Ok((name.clone(), self.evaluate_expression(value)?)))
                    .collect::<Result<Vec<_>, RuntimeError>>()?;
                self.call_value(&callee, args, kwargs, *location)
            }

            Expr::Attribute {
                object,
                name,
                location,
            } => {
                let object = self.evaluate_expression(object)?;
                self.get_attribute(&object, name, *location)
            }

            Expr::Subscript {
                object,
                index,
                location,
            } => {
                let container = self.evaluate_expression(object)?;
                let index = self.evaluate_index(index)?;
                self.get_item(&container, &index, *location)
            }

            Expr::Slice { location, .. } => Err(RuntimeError::raise(
                ExceptionKind::TypeError,
                "slice expressions are only valid inside a subscript",
                *location,
            )),
        }
    }

    fn evaluate_all(&mut self, exprs: &[Expr]) -> Result<Vec<Value>, RuntimeError> {
        exprs
            .iter()
            .map(|expr| self.evaluate_expression(expr))
            .collect()
    }

    fn evaluate_fstring(
        &mut self,
        parts: &[FStringPart],
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let mut out = String::new();
        for part in parts {
            match part {
                FStringPart::Literal(text) => out.push_str(text),
                FStringPart::Field {
                    expr,
                    conversion,
                    spec,
                } => {
                    let value = self.evaluate_expression(expr)?;
                    let value = match conversion {
                        Some('r') | Some('a') => Value::from(self.repr_of(&value, location)?),
                        Some('s') => Value::from(self.str_of(&value, location)?),
                        _ => value,
                    };
                    out.push_str(&self.format_value(&value, spec.as_deref().unwrap_or(""), location)?);
                }
            }
        }
        Ok(Value::from(out))
    }

    /// `[element for target in iter if cond ...]`
    ///
    /// Comprehension targets bind in a scope of their own, so they neither
    /// leak into nor clobber the enclosing function's locals. The outermost
    /// iterable is evaluated in the enclosing scope.
    fn evaluate_list_comprehension(
        &mut self,
        element: &Expr,
        clauses: &[CompClause],
    ) -> Result<Value, RuntimeError> {
        let Some(first) = clauses.first() else {
            return Ok(Value::new_list(Vec::new()));
        };
        let outermost = self.evaluate_expression(&first.iter)?;

        self.comprehension_scopes.push(Namespace::default());
        let mut results = Vec::new();
        let outcome = self.run_comprehension_clause(element, clauses, Some(outermost), &mut results);
        self.comprehension_scopes.pop();

        outcome.map(|_| Value::new_list(results))
    }

    fn run_comprehension_clause(
        &mut self,
        element: &Expr,
        clauses: &[CompClause],
        iterable: Option<Value>,
        results: &mut Vec<Value>,
    ) -> Result<(), RuntimeError> {
        let Some((clause, rest)) = clauses.split_first() else {
            results.push(self.evaluate_expression(element)?);
            return Ok(());
        };

        let iterable = match iterable {
            Some(value) => value,
            None => self.evaluate_expression(&clause.iter)?,
        };

        'items: for item in self.iterate(&iterable, clause.iter.location())? {
            self.bind_comprehension_target(&clause.target, item)?;
            for condition in &clause.conditions {
                if !self.evaluate_expression(condition)?.is_truthy() {
                    continue 'items;
                }
            }
            self.run_comprehension_clause(element, rest, None, results)?;
        }
        Ok(())
    }

    fn bind_comprehension_target(&mut self, target: &Target, value: Value) -> Result<(), RuntimeError> {
        match target {
            Target::Name(name, _) => {
                if let Some(scope) = self.comprehension_scopes.last_mut() {
                    scope.insert(name.clone(), value);
                }
                Ok(())
            }
            Target::Tuple(targets, location) => {
                let values = self.unpack(&value, targets.len(), *location)?;
                for (target, value) in targets.iter().zip(values) {
                    self.bind_comprehension_target(target, value)?;
                }
                Ok(())
            }
            Target::Subscript { .. } => self.assign_target(target, value),
        }
    }

    /// `repr(value)`, with repr failures raised as Python exceptions
    pub(crate) fn repr_of(&self, value: &Value, location: SourceLocation) -> Result<String, RuntimeError> {
        value.repr().map_err(|err| repr_failure(err, location))
    }

    /// `str(value)`, with repr failures raised as Python exceptions
    pub(crate) fn str_of(&self, value: &Value, location: SourceLocation) -> Result<String, RuntimeError> {
        value.to_str().map_err(|err| repr_failure(err, location))
    }
}

fn repr_failure(err: ReprError, location: SourceLocation) -> RuntimeError {
    let kind = match err {
        ReprError::RecursionLimit => ExceptionKind::RecursionError,
        ReprError::IntTooLong { .. } => ExceptionKind::ValueError,
    };
    RuntimeError::raise(kind, err.to_string(), location)
}
