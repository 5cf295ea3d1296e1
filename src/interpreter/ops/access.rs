//! Subscripts, slices and attribute access
//!
//! Index normalization follows Python: negative indices count from the end,
//! slice bounds are clamped to the sequence, and a slice step of zero is an
//! error.

use crate::interpreter::builtins::module_attribute;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::{ExceptionKind, RuntimeError};
use crate::interpreter::methods::has_method;
use crate::memory::value::{range_len, BoundMethod, Value};
use crate::parser::ast::{Expr, SourceLocation};
use num_bigint::Sign;
use std::rc::Rc;

/// An evaluated subscript index
#[derive(Debug)]
pub(crate) enum Index {
    Item(Value),
    Slice {
        lower: Option<i64>,
        upper: Option<i64>,
        step: Option<i64>,
    },
}

/// Slice bounds resolved against a sequence length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SliceRange {
    start: i64,
    stop: i64,
    step: i64,
}

impl SliceRange {
    fn resolve(
        lower: Option<i64>,
        upper: Option<i64>,
        step: Option<i64>,
        len: usize,
        location: SourceLocation,
    ) -> Result<Self, RuntimeError> {
        let step = step.unwrap_or(1);
        if step == 0 {
            return Err(RuntimeError::value_error("slice step cannot be zero", location));
        }
        let len = len as i64;
        let clamp = |bound: i64| {
            if bound < 0 {
                let bound = bound + len;
                if bound < 0 {
                    if step < 0 {
                        -1
                    } else {
                        0
                    }
                } else {
                    bound
                }
            } else if bound >= len {
                if step < 0 {
                    len - 1
                } else {
                    len
                }
            } else {
                bound
            }
        };

        let start = match lower {
            Some(bound) => clamp(bound),
            None if step < 0 => len - 1,
            None => 0,
        };
        let stop = match upper {
            Some(bound) => clamp(bound),
            None if step < 0 => -1,
            None => len,
        };
        Ok(Self { start, stop, step })
    }

    /// Selected indices, in slice order
    fn indices(self) -> impl Iterator<Item = usize> {
        let SliceRange { start, stop, step } = self;
        let mut next = start;
        std::iter::from_fn(move || {
            let inside = if step > 0 { next < stop } else { next > stop };
            if !inside {
                return None;
            }
            let current = next;
            next += step;
            Some(current as usize)
        })
    }

    fn len(self) -> usize {
        self.indices().count()
    }
}

/// Resolve a (possibly negative) index into `0..len`
fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let index = if index < 0 { index + len } else { index };
    (0..len).contains(&index).then_some(index as usize)
}

impl Interpreter<'_> {
    /// Evaluate the index part of a subscript, which may be a slice
    pub(crate) fn evaluate_index(&mut self, index: &Expr) -> Result<Index, RuntimeError> {
        let Expr::Slice {
            lower,
            upper,
            step,
            location,
        } = index
        else {
            return Ok(Index::Item(self.evaluate_expression(index)?));
        };

        let mut bound = |expr: &Option<Box<Expr>>| -> Result<Option<i64>, RuntimeError> {
            let Some(expr) = expr else {
                return Ok(None);
            };
            match self.evaluate_expression(expr)? {
                Value::None => Ok(None),
                // Out-of-range bounds clamp like any other
                Value::Long(n) if n.sign() == Sign::Minus => Ok(Some(i64::MIN)),
                Value::Long(_) => Ok(Some(i64::MAX)),
                value => value.as_int().map(Some).ok_or_else(|| {
                    RuntimeError::type_error(
                        "slice indices must be integers or None or have an __index__ method",
                        *location,
                    )
                }),
            }
        };
        Ok(Index::Slice {
            lower: bound(lower)?,
            upper: bound(upper)?,
            step: bound(step)?,
        })
    }

    /// `container[index]`
    pub(crate) fn get_item(
        &self,
        container: &Value,
        index: &Index,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let key = match index {
            Index::Item(key) => key,
            Index::Slice { lower, upper, step } => {
                return get_slice(container, *lower, *upper, *step, location)
            }
        };

        match container {
            Value::List(items) => {
                let items = items.borrow();
                let i = sequence_index(key, items.len(), "list", location)?;
                Ok(items[i].clone())
            }
            Value::Tuple(items) => {
                let i = sequence_index(key, items.len(), "tuple", location)?;
                Ok(items[i].clone())
            }
            Value::Str(text) => {
                let Some(n) = key.as_int() else {
                    if let Value::Long(_) = key {
                        return Err(index_type_error("string", key, location));
                    }
                    return Err(RuntimeError::type_error(
                        format!("string indices must be integers, not '{}'", key.type_name()),
                        location,
                    ));
                };
                let count = text.chars().count();
                let i = normalize_index(n, count)
                    .ok_or_else(|| RuntimeError::index_error("string index out of range", location))?;
                Ok(Value::from(
                    text.chars().nth(i).map(String::from).unwrap_or_default(),
                ))
            }
            Value::Range { start, step, .. } => {
                let i = sequence_index(key, range_len(container), "range", location)?;
                Ok(Value::Int(start + step * i as i64))
            }
            Value::Dict(dict) => {
                check_hashable(key, location)?;
                dict.borrow()
                    .get(key)
                    .cloned()
                    .ok_or_else(|| RuntimeError::key_error(key.clone(), location))
            }
            other => Err(RuntimeError::type_error(
                format!("'{}' object is not subscriptable", other.type_name()),
                location,
            )),
        }
    }

    /// `container[index] = value`
    pub(crate) fn set_item(
        &mut self,
        container: &Value,
        index: Index,
        value: Value,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        match (container, index) {
            (Value::List(items), Index::Item(key)) => {
                let len = items.borrow().len();
                let i = match key.as_int() {
                    Some(n) => normalize_index(n, len).ok_or_else(|| {
                        RuntimeError::index_error("list assignment index out of range", location)
                    })?,
                    None => return Err(index_type_error("list", &key, location)),
                };
                items.borrow_mut()[i] = value;
                Ok(())
            }
            (Value::List(items), Index::Slice { lower, upper, step }) => {
                let replacement = self.collect_iterable(&value, location).map_err(|_| {
                    RuntimeError::type_error("can only assign an iterable", location)
                })?;
                let len = items.borrow().len();
                let range = SliceRange::resolve(lower, upper, step, len, location)?;

                let mut items = items.borrow_mut();
                if range.step == 1 {
                    let start = range.start as usize;
                    let stop = (range.stop.max(range.start)) as usize;
                    items.splice(start..stop, replacement);
                    return Ok(());
                }
                if replacement.len() != range.len() {
                    return Err(RuntimeError::value_error(
                        format!(
                            "attempt to assign sequence of size {} to extended slice of size {}",
                            replacement.len(),
                            range.len()
                        ),
                        location,
                    ));
                }
                for (i, item) in range.indices().zip(replacement) {
                    items[i] = item;
                }
                Ok(())
            }
            (Value::Dict(dict), Index::Item(key)) => {
                check_hashable(&key, location)?;
                dict.borrow_mut().insert(key, value);
                Ok(())
            }
            (other, _) => Err(RuntimeError::type_error(
                format!("'{}' object does not support item assignment", other.type_name()),
                location,
            )),
        }
    }

    /// `del container[index]`
    pub(crate) fn delete_item(
        &mut self,
        container: &Value,
        index: &Index,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        match (container, index) {
            (Value::List(items), Index::Item(key)) => {
                let len = items.borrow().len();
                let i = match key.as_int() {
                    Some(n) => normalize_index(n, len).ok_or_else(|| {
                        RuntimeError::index_error("list assignment index out of range", location)
                    })?,
                    None => return Err(index_type_error("list", key, location)),
                };
                items.borrow_mut().remove(i);
                Ok(())
            }
            (Value::List(items), Index::Slice { lower, upper, step }) => {
                let len = items.borrow().len();
                let range = SliceRange::resolve(*lower, *upper, *step, len, location)?;
                let mut doomed: Vec<usize> = range.indices().collect();
                doomed.sort_unstable();
                let mut items = items.borrow_mut();
                for i in doomed.into_iter().rev() {
                    items.remove(i);
                }
                Ok(())
            }
            (Value::Dict(dict), Index::Item(key)) => {
                check_hashable(key, location)?;
                dict.borrow_mut()
                    .remove(key)
                    .map(|_| ())
                    .ok_or_else(|| RuntimeError::key_error(key.clone(), location))
            }
            (other, _) => Err(RuntimeError::type_error(
                format!("'{}' object doesn't support item deletion", other.type_name()),
                location,
            )),
        }
    }

    /// `object.name`
    pub(crate) fn get_attribute(
        &self,
        object: &Value,
        name: &str,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if let Value::Module(module) = object {
            return module_attribute(*module, name).ok_or_else(|| {
                RuntimeError::raise(
                    ExceptionKind::AttributeError,
                    format!("module '{}' has no attribute '{}'", module.name(), name),
                    location,
                )
            });
        }

        if let Value::Exception(exception) = object {
            if name == "args" {
                return Ok(Value::new_tuple(exception.args.clone()));
            }
        }

        if has_method(object, name) {
            return Ok(Value::Method(Rc::new(BoundMethod {
                receiver: object.clone(),
                name: name.to_string(),
            })));
        }

        Err(RuntimeError::raise(
            ExceptionKind::AttributeError,
            format!("'{}' object has no attribute '{}'", object.type_name(), name),
            location,
        ))
    }
}

fn check_hashable(key: &Value, location: SourceLocation) -> Result<(), RuntimeError> {
    if key.is_hashable() {
        Ok(())
    } else {
        Err(RuntimeError::type_error(
            format!("unhashable type: '{}'", key.type_name()),
            location,
        ))
    }
}

fn index_type_error(kind: &str, key: &Value, location: SourceLocation) -> RuntimeError {
    if let Value::Long(_) = key {
        return RuntimeError::index_error("cannot fit 'int' into an index-sized integer", location);
    }
    RuntimeError::type_error(
        format!(
            "{} indices must be integers or slices, not {}",
            kind,
            key.type_name()
        ),
        location,
    )
}

/// Validate an integer index into a sequence of `len` items
fn sequence_index(
    key: &Value,
    len: usize,
    kind: &str,
    location: SourceLocation,
) -> Result<usize, RuntimeError> {
    let n = key
        .as_int()
        .ok_or_else(|| index_type_error(kind, key, location))?;
    let message = match kind {
        "range" => "range object index out of range".to_string(),
        _ => format!("{} index out of range", kind),
    };
    normalize_index(n, len).ok_or_else(|| RuntimeError::index_error(message, location))
}

fn get_slice(
    container: &Value,
    lower: Option<i64>,
    upper: Option<i64>,
    step: Option<i64>,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    match container {
        Value::List(items) => {
            let items = items.borrow();
            let range = SliceRange::resolve(lower, upper, step, items.len(), location)?;
            Ok(Value::new_list(
                range.indices().map(|i| items[i].clone()).collect(),
            ))
        }
        Value::Tuple(items) => {
            let range = SliceRange::resolve(lower, upper, step, items.len(), location)?;
            Ok(Value::new_tuple(
                range.indices().map(|i| items[i].clone()).collect(),
            ))
        }
        Value::Str(text) => {
            let chars: Vec<char> = text.chars().collect();
            let range = SliceRange::resolve(lower, upper, step, chars.len(), location)?;
            Ok(Value::from(range.indices().map(|i| chars[i]).collect::<String>()))
        }
        Value::Range {
            start,
            step: range_step,
            ..
        } => {
            let range = SliceRange::resolve(lower, upper, step, range_len(container), location)?;
            Ok(Value::Range {
                start: start + range.start * range_step,
                stop: start + range.stop * range_step,
                step: range.step * range_step,
            })
        }
        other => Err(RuntimeError::type_error(
            format!("'{}' object is not subscriptable", other.type_name()),
            location,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slice(lower: Option<i64>, upper: Option<i64>, step: Option<i64>, len: usize) -> Vec<usize> {
        SliceRange::resolve(lower, upper, step, len, SourceLocation::default())
            .unwrap()
            .indices()
            .collect()
    }

    #[test]
    fn test_slice_bounds() {
        assert_eq!(slice(Some(1), Some(3), None, 5), vec![1, 2]);
        assert_eq!(slice(None, None, Some(-1), 3), vec![2, 1, 0]);
        assert_eq!(slice(Some(-2), None, None, 5), vec![3, 4]);
        assert_eq!(slice(Some(10), None, None, 5), Vec::<usize>::new());
        assert_eq!(slice(None, None, Some(2), 5), vec![0, 2, 4]);
        assert_eq!(slice(Some(-100), Some(100), None, 2), vec![0, 1]);
    }

    #[test]
    fn test_zero_step_rejected() {
        let err = SliceRange::resolve(None, None, Some(0), 3, SourceLocation::default()).unwrap_err();
        assert_eq!(err.to_string(), "slice step cannot be zero");
    }

    #[test]
    fn test_normalize_index() {
        assert_eq!(normalize_index(-1, 3), Some(2));
        assert_eq!(normalize_index(3, 3), None);
        assert_eq!(normalize_index(-4, 3), None);
    }

    #[test]
    fn test_range_slice() {
        let range = Value::Range { start: 0, stop: 10, step: 1 };
        let sliced = get_slice(&range, Some(2), Some(8), Some(3), SourceLocation::default()).unwrap();
        assert!(sliced.py_eq(&Value::Range { start: 2, stop: 8, step: 3 }));
    }
}
