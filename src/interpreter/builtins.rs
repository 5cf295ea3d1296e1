//! Built-in function implementations
//!
//! This module provides the functions and native modules available to
//! traced programs without an import (or through `import sys` / `import math`).
//!
//! # Supported Built-ins
//!
//! - I/O: `print(*args, sep=' ', end='\n', file=sys.stdout)`
//! - conversions: `str`, `repr`, `int`, `float`, `bool`, `list`, `tuple`, `dict`
//! - sequences: `len`, `range`, `sorted`, `reversed`, `enumerate`, `zip`
//! - numbers: `abs`, `min`, `max`, `sum`, `round`, `chr`, `ord`
//! - predicates: `any`, `all`, `isinstance`
//! - every built-in exception class (`ValueError`, `KeyError`, ...)
//!
//! # Implementation Notes
//!
//! - `reversed`, `enumerate` and `zip` return lists rather than lazy iterators
//! - `sys.stdout` / `sys.stderr` are [`Stream`] values writing into the run's
//!   [`OutputCapture`](crate::snapshot::OutputCapture)
//! - Sorting is a stable merge sort that surfaces comparison errors instead
//!   of panicking on an inconsistent order

use crate::interpreter::constants::INT_MAX_STR_DIGITS;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::{ExceptionKind, RuntimeError};
use crate::interpreter::ops::binary::float_operand;
use crate::interpreter::ops::compare::order;
use crate::memory::value::{range_len, Dict, Module, Stream, Value};
use crate::parser::ast::{BinOp, SourceLocation};
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{FromPrimitive, Signed, Zero};
use std::cmp::Ordering;
use std::f64::consts;

/// Built-in functions and classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Print,
    Len,
    Range,
    Str,
    Repr,
    Int,
    Float,
    Bool,
    List,
    Tuple,
    Dict,
    Abs,
    Min,
    Max,
    Sum,
    Sorted,
    Reversed,
    Enumerate,
    Zip,
    Round,
    Chr,
    Ord,
    Any,
    All,
    Isinstance,
    // `math` module functions
    Sqrt,
    Floor,
    Ceil,
    Fabs,
}

impl Builtin {
    /// Functions reachable by bare name
    const GLOBAL: [Builtin; 25] = [
        Builtin::Print,
        Builtin::Len,
        Builtin::Range,
        Builtin::Str,
        Builtin::Repr,
        Builtin::Int,
        Builtin::Float,
        Builtin::Bool,
        Builtin::List,
        Builtin::Tuple,
        Builtin::Dict,
        Builtin::Abs,
        Builtin::Min,
        Builtin::Max,
        Builtin::Sum,
        Builtin::Sorted,
        Builtin::Reversed,
        Builtin::Enumerate,
        Builtin::Zip,
        Builtin::Round,
        Builtin::Chr,
        Builtin::Ord,
        Builtin::Any,
        Builtin::All,
        Builtin::Isinstance,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::Len => "len",
            Builtin::Range => "range",
            Builtin::Str => "str",
            Builtin::Repr => "repr",
            Builtin::Int => "int",
            Builtin::Float => "float",
            Builtin::Bool => "bool",
            Builtin::List => "list",
            Builtin::Tuple => "tuple",
            Builtin::Dict => "dict",
            Builtin::Abs => "abs",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Sum => "sum",
            Builtin::Sorted => "sorted",
            Builtin::Reversed => "reversed",
            Builtin::Enumerate => "enumerate",
            Builtin::Zip => "zip",
            Builtin::Round => "round",
            Builtin::Chr => "chr",
            Builtin::Ord => "ord",
            Builtin::Any => "any",
            Builtin::All => "all",
            Builtin::Isinstance => "isinstance",
            Builtin::Sqrt => "sqrt",
            Builtin::Floor => "floor",
            Builtin::Ceil => "ceil",
            Builtin::Fabs => "fabs",
        }
    }

    /// Whether this built-in is a type (`int`, `list`, ...) rather than a function
    pub fn is_class(self) -> bool {
        matches!(
            self,
            Builtin::Str
                | Builtin::Int
                | Builtin::Float
                | Builtin::Bool
                | Builtin::List
                | Builtin::Tuple
                | Builtin::Dict
                | Builtin::Range
        )
    }

    /// Whether `value` is an instance of this built-in class
    fn is_instance(self, value: &Value) -> bool {
        match (self, value) {
            (Builtin::Int, Value::Int(_) | Value::Bool(_) | Value::Long(_)) => true,
            (Builtin::Bool, Value::Bool(_)) => true,
            (Builtin::Float, Value::Float(_)) => true,
            (Builtin::Str, Value::Str(_)) => true,
            (Builtin::List, Value::List(_)) => true,
            (Builtin::Tuple, Value::Tuple(_)) => true,
            (Builtin::Dict, Value::Dict(_)) => true,
            (Builtin::Range, Value::Range { .. }) => true,
            _ => false,
        }
    }
}

/// Resolve a name in the builtins namespace
pub fn lookup(name: &str) -> Option<Value> {
    Builtin::GLOBAL
        .into_iter()
        .find(|builtin| builtin.name() == name)
        .map(Value::Builtin)
        .or_else(|| ExceptionKind::from_name(name).map(Value::ExceptionType))
}

/// Resolve `module.name`
pub fn module_attribute(module: Module, name: &str) -> Option<Value> {
    match module {
        Module::Builtins => lookup(name),
        Module::Sys => match name {
            "stdout" => Some(Value::Stream(Stream::Stdout)),
            "stderr" => Some(Value::Stream(Stream::Stderr)),
            "maxsize" => Some(Value::Int(i64::MAX)),
            _ => None,
        },
        Module::Math => match name {
            "pi" => Some(Value::Float(consts::PI)),
            "e" => Some(Value::Float(consts::E)),
            "tau" => Some(Value::Float(consts::TAU)),
            "inf" => Some(Value::Float(f64::INFINITY)),
            "nan" => Some(Value::Float(f64::NAN)),
            "sqrt" => Some(Value::Builtin(Builtin::Sqrt)),
            "floor" => Some(Value::Builtin(Builtin::Floor)),
            "ceil" => Some(Value::Builtin(Builtin::Ceil)),
            "fabs" => Some(Value::Builtin(Builtin::Fabs)),
            _ => None,
        },
    }
}

/// Remove and return a keyword argument
pub(crate) fn take_kwarg(kwargs: &mut Vec<(String, Value)>, name: &str) -> Option<Value> {
    let index = kwargs.iter().position(|(key, _)| key == name)?;
    Some(kwargs.remove(index).1)
}

/// Fail on keyword arguments left over after the accepted ones were taken
pub(crate) fn reject_kwargs(
    function: &str,
    kwargs: &[(String, Value)],
    location: SourceLocation,
) -> Result<(), RuntimeError> {
    match kwargs.first() {
        None => Ok(()),
        Some((key, _)) => Err(RuntimeError::type_error(
            format!("'{}' is an invalid keyword argument for {}()", key, function),
            location,
        )),
    }
}

/// Check a positional argument count against `min..=max`
pub(crate) fn check_arity(
    function: &str,
    args: &[Value],
    min: usize,
    max: usize,
    location: SourceLocation,
) -> Result<(), RuntimeError> {
    let given = args.len();
    if (min..=max).contains(&given) {
        return Ok(());
    }
    let plural = |n: usize| if n == 1 { "" } else { "s" };
    let message = match (min, max) {
        (0, 0) => format!("{}() takes no arguments ({} given)", function, given),
        (1, 1) => format!("{}() takes exactly one argument ({} given)", function, given),
        _ if given < min => format!(
            "{} expected at least {} argument{}, got {}",
            function,
            min,
            plural(min),
            given
        ),
        _ => format!(
            "{} expected at most {} argument{}, got {}",
            function,
            max,
            plural(max),
            given
        ),
    };
    Err(RuntimeError::type_error(message, location))
}

/// An integer argument (`bool` included)
pub(crate) fn int_argument(value: &Value, location: SourceLocation) -> Result<i64, RuntimeError> {
    if let Value::Long(_) = value {
        return Err(RuntimeError::overflow(
            "Python int too large to convert to C ssize_t",
            location,
        ));
    }
    value.as_int().ok_or_else(|| {
        RuntimeError::type_error(
            format!(
                "'{}' object cannot be interpreted as an integer",
                value.type_name()
            ),
            location,
        )
    })
}

/// Convert a float to an int the way `int()` does
fn float_to_int(x: f64, location: SourceLocation) -> Result<Value, RuntimeError> {
    if x.is_nan() {
        return Err(RuntimeError::value_error(
            "cannot convert float NaN to integer",
            location,
        ));
    }
    if x.is_infinite() {
        return Err(RuntimeError::raise(
            ExceptionKind::OverflowError,
            "cannot convert float infinity to integer",
            location,
        ));
    }
    let truncated = x.trunc();
    if truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
        return Ok(Value::Int(truncated as i64));
    }
    BigInt::from_f64(truncated)
        .map(Value::from_bigint)
        .ok_or_else(|| RuntimeError::value_error("cannot convert float NaN to integer", location))
}

/// Round half to even at `ndigits` decimal places
fn round_float(x: f64, ndigits: i64) -> f64 {
    if !x.is_finite() {
        return x;
    }
    if ndigits >= 0 {
        if ndigits > 17 {
            return x;
        }
        // Decimal formatting rounds the exact binary value, as CPython does
        format!("{:.*}", ndigits as usize, x).parse().unwrap_or(x)
    } else {
        let factor = 10f64.powi((-ndigits).min(308) as i32);
        (x / factor).round_ties_even() * factor
    }
}

/// Round an integer to a multiple of `10^-ndigits`, half to even
fn round_int(n: &BigInt, ndigits: i64) -> BigInt {
    if ndigits >= 0 {
        return n.clone();
    }
    // 10^p has more than 3p bits, so it dwarfs n past that point
    let power = ndigits.unsigned_abs();
    if power.saturating_mul(3) > n.bits() + 3 {
        return BigInt::zero();
    }
    let unit = BigInt::from(10u32).pow(power as u32);
    let remainder = n.mod_floor(&unit);
    let base = n - &remainder;
    let round_up = match (&remainder * 2u32).cmp(&unit) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => (&base / &unit).is_odd(),
    };
    if round_up {
        base + unit
    } else {
        base
    }
}

/// Stable merge sort with a fallible `less` comparison
fn merge_sort<T>(
    mut items: Vec<T>,
    less: &mut impl FnMut(&T, &T) -> Result<bool, RuntimeError>,
) -> Result<Vec<T>, RuntimeError> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, less)?;
    let right = merge_sort(right, less)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
        // Ties take from the left run, keeping the sort stable
        let next = if less(r, l)? { right.next() } else { left.next() };
        merged.extend(next);
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

impl Interpreter<'_> {
    /// Sort `items` as `sorted(items, key=key, reverse=reverse)` does
    pub(crate) fn sort_values(
        &mut self,
        items: Vec<Value>,
        key: Option<&Value>,
        reverse: bool,
        location: SourceLocation,
    ) -> Result<Vec<Value>, RuntimeError> {
        let keys = match key {
            Some(function) if !matches!(function, Value::None) => items
                .iter()
                .map(|item| self.call_value(function, vec![item.clone()], Vec::new(), location))
                .collect::<Result<Vec<_>, _>>()?,
            _ => items.clone(),
        };

        let mut pairs: Vec<(Value, Value)> = keys.into_iter().zip(items).collect();
        // Reversing around a stable sort keeps equal items in original order
        if reverse {
            pairs.reverse();
        }
        let mut sorted = merge_sort(pairs, &mut |a: &(Value, Value), b: &(Value, Value)| {
            Ok(order(&a.0, &b.0, "<", location)? == Some(Ordering::Less))
        })?;
        if reverse {
            sorted.reverse();
        }
        Ok(sorted.into_iter().map(|(_, item)| item).collect())
    }

    /// Key/value pairs of a mapping or an iterable of pairs, for `dict()` and `dict.update`
    pub(crate) fn dict_entries(
        &self,
        source: &Value,
        location: SourceLocation,
    ) -> Result<Vec<(Value, Value)>, RuntimeError> {
        if let Value::Dict(dict) = source {
            return Ok(dict.borrow().iter().cloned().collect());
        }

        let mut entries = Vec::new();
        for (index, item) in self.iterate(source, location)?.enumerate() {
            let pair = match &item {
                Value::List(_) | Value::Tuple(_) | Value::Str(_) => self.collect_iterable(&item, location)?,
                _ => {
                    return Err(RuntimeError::type_error(
                        format!(
                            "cannot convert dictionary update sequence element #{} to a sequence",
                            index
                        ),
                        location,
                    ))
                }
            };
            let [key, value] = <[Value; 2]>::try_from(pair).map_err(|pair| {
                RuntimeError::value_error(
                    format!(
                        "dictionary update sequence element #{} has length {}; 2 is required",
                        index,
                        pair.len()
                    ),
                    location,
                )
            })?;
            if !key.is_hashable() {
                return Err(RuntimeError::type_error(
                    format!("unhashable type: '{}'", key.type_name()),
                    location,
                ));
            }
            entries.push((key, value));
        }
        Ok(entries)
    }

    /// Call a built-in function
    pub(crate) fn call_builtin(
        &mut self,
        builtin: Builtin,
        mut args: Vec<Value>,
        mut kwargs: Vec<(String, Value)>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let name = builtin.name();

        match builtin {
            Builtin::Print => return self.builtin_print(args, kwargs, location),
            Builtin::Min | Builtin::Max => return self.builtin_extremum(builtin, args, kwargs, location),
            Builtin::Dict => {
                check_arity(name, &args, 0, 1, location)?;
                let mut dict = Dict::new();
                if let Some(source) = args.first() {
                    for (key, value) in self.dict_entries(source, location)? {
                        dict.insert(key, value);
                    }
                }
                for (key, value) in kwargs {
                    dict.insert(Value::from(key), value);
                }
                return Ok(Value::new_dict(dict));
            }
            Builtin::Sorted => {
                check_arity(name, &args, 1, 1, location)?;
                let key = take_kwarg(&mut kwargs, "key");
                let reverse = take_kwarg(&mut kwargs, "reverse").is_some_and(|r| r.is_truthy());
                reject_kwargs(name, &kwargs, location)?;
                let items = self.collect_iterable(&args[0], location)?;
                let sorted = self.sort_values(items, key.as_ref(), reverse, location)?;
                return Ok(Value::new_list(sorted));
            }
            Builtin::Enumerate => {
                let start = take_kwarg(&mut kwargs, "start");
                reject_kwargs(name, &kwargs, location)?;
                check_arity(name, &args, 1, 2, location)?;
                let start = match args.get(1).or(start.as_ref()) {
                    Some(value) => int_argument(value, location)?,
                    None => 0,
                };
                let items = self.collect_iterable(&args[0], location)?;
                let mut pairs = Vec::with_capacity(items.len());
                for (offset, item) in items.into_iter().enumerate() {
                    let index = match start.checked_add(offset as i64) {
                        Some(index) => Value::Int(index),
                        None => Value::from_bigint(BigInt::from(start) + offset),
                    };
                    pairs.push(Value::new_tuple(vec![index, item]));
                }
                return Ok(Value::new_list(pairs));
            }
            Builtin::Sum => {
                let start = take_kwarg(&mut kwargs, "start");
                reject_kwargs(name, &kwargs, location)?;
                check_arity(name, &args, 1, 2, location)?;
                let mut total = args.get(1).cloned().or(start).unwrap_or(Value::Int(0));
                if matches!(total, Value::Str(_)) {
                    return Err(RuntimeError::type_error(
                        "sum() can't sum strings [use ''.join(seq) instead]",
                        location,
                    ));
                }
                for item in self.collect_iterable(&args[0], location)? {
                    total = self.binary_operation(BinOp::Add, &total, &item, location)?;
                }
                return Ok(total);
            }
            _ => {}
        }

        if !kwargs.is_empty() {
            return Err(RuntimeError::type_error(
                format!("{}() takes no keyword arguments", name),
                location,
            ));
        }

        match builtin {
            Builtin::Len => {
                check_arity(name, &args, 1, 1, location)?;
                let len = match &args[0] {
                    Value::Str(s) => s.chars().count(),
                    Value::List(items) => items.borrow().len(),
                    Value::Tuple(items) => items.len(),
                    Value::Dict(dict) => dict.borrow().len(),
                    range @ Value::Range { .. } => range_len(range),
                    other => {
                        return Err(RuntimeError::type_error(
                            format!("object of type '{}' has no len()", other.type_name()),
                            location,
                        ))
                    }
                };
                Ok(Value::Int(len as i64))
            }

            Builtin::Range => {
                check_arity(name, &args, 1, 3, location)?;
                let bounds = args
                    .iter()
                    .map(|arg| int_argument(arg, location))
                    .collect::<Result<Vec<_>, _>>()?;
                let (start, stop, step) = match bounds.as_slice() {
                    [stop] => (0, *stop, 1),
                    [start, stop] => (*start, *stop, 1),
                    [start, stop, step, ..] => (*start, *stop, *step),
                    [] => (0, 0, 1),
                };
                if step == 0 {
                    return Err(RuntimeError::value_error(
                        "range() arg 3 must not be zero",
                        location,
                    ));
                }
                Ok(Value::Range { start, stop, step })
            }

            Builtin::Str => {
                check_arity(name, &args, 0, 1, location)?;
                match args.first() {
                    Some(value) => Ok(Value::from(self.str_of(value, location)?)),
                    None => Ok(Value::from("")),
                }
            }

            Builtin::Repr => {
                check_arity(name, &args, 1, 1, location)?;
                Ok(Value::from(self.repr_of(&args[0], location)?))
            }

            Builtin::Int => {
                check_arity(name, &args, 0, 2, location)?;
                let Some(value) = args.first() else {
                    return Ok(Value::Int(0));
                };
                if let Some(base) = args.get(1) {
                    let base = int_argument(base, location)?;
                    let Value::Str(text) = value else {
                        return Err(RuntimeError::type_error(
                            "int() can't convert non-string with explicit base",
                            location,
                        ));
                    };
                    return parse_int(text, base, location);
                }
                match value {
                    Value::Float(x) => float_to_int(*x, location),
                    Value::Str(text) => parse_int(text, 10, location),
                    other => other.as_bigint().map(Value::from_bigint).ok_or_else(|| {
                        RuntimeError::type_error(
                            format!(
                                "int() argument must be a string, a bytes-like object or a real number, not '{}'",
                                other.type_name()
                            ),
                            location,
                        )
                    }),
                }
            }

            Builtin::Float => {
                check_arity(name, &args, 0, 1, location)?;
                match args.first() {
                    None => Ok(Value::Float(0.0)),
                    Some(Value::Str(text)) => parse_float(text, location).map(Value::Float),
                    Some(other @ Value::Long(_)) => float_operand(other, location).map(Value::Float),
                    Some(other) => other.as_f64().map(Value::Float).ok_or_else(|| {
                        RuntimeError::type_error(
                            format!(
                                "float() argument must be a string or a real number, not '{}'",
                                other.type_name()
                            ),
                            location,
                        )
                    }),
                }
            }

            Builtin::Bool => {
                check_arity(name, &args, 0, 1, location)?;
                Ok(Value::Bool(args.first().is_some_and(Value::is_truthy)))
            }

            Builtin::List => {
                check_arity(name, &args, 0, 1, location)?;
                match args.first() {
                    Some(value) => Ok(Value::new_list(self.collect_iterable(value, location)?)),
                    None => Ok(Value::new_list(Vec::new())),
                }
            }

            Builtin::Tuple => {
                check_arity(name, &args, 0, 1, location)?;
                match args.first() {
                    Some(Value::Tuple(items)) => Ok(Value::Tuple(items.clone())),
                    Some(value) => Ok(Value::new_tuple(self.collect_iterable(value, location)?)),
                    None => Ok(Value::new_tuple(Vec::new())),
                }
            }

            Builtin::Abs => {
                check_arity(name, &args, 1, 1, location)?;
                match &args[0] {
                    Value::Float(x) => Ok(Value::Float(x.abs())),
                    other => other
                        .as_bigint()
                        .map(|n| Value::from_bigint(n.abs()))
                        .ok_or_else(|| {
                            RuntimeError::type_error(
                                format!("bad operand type for abs(): '{}'", other.type_name()),
                                location,
                            )
                        }),
                }
            }

            Builtin::Reversed => {
                check_arity(name, &args, 1, 1, location)?;
                let items = match &args[0] {
                    value @ (Value::List(_)
                    | Value::Tuple(_)
                    | Value::Str(_)
                    | Value::Range { .. }
                    | Value::Dict(_)) => self.collect_iterable(value, location)?,
                    other => {
                        return Err(RuntimeError::type_error(
                            format!("'{}' object is not reversible", other.type_name()),
                            location,
                        ))
                    }
                };
                Ok(Value::new_list(items.into_iter().rev().collect()))
            }

            Builtin::Zip => {
                let mut columns = args
                    .iter()
                    .map(|arg| self.collect_iterable(arg, location).map(Vec::into_iter))
                    .collect::<Result<Vec<_>, _>>()?;
                let mut rows = Vec::new();
                if columns.is_empty() {
                    return Ok(Value::new_list(rows));
                }
                'rows: loop {
                    let mut row = Vec::with_capacity(columns.len());
                    for column in columns.iter_mut() {
                        match column.next() {
                            Some(item) => row.push(item),
                            None => break 'rows,
                        }
                    }
                    rows.push(Value::new_tuple(row));
                }
                Ok(Value::new_list(rows))
            }

            Builtin::Round => {
                check_arity(name, &args, 1, 2, location)?;
                let ndigits = match args.get(1) {
                    None | Some(Value::None) => None,
                    Some(value) => Some(int_argument(value, location)?),
                };
                match (&args[0], ndigits) {
                    (Value::Float(x), None) => float_to_int(x.round_ties_even(), location),
                    (Value::Float(x), Some(n)) => Ok(Value::Float(round_float(*x, n))),
                    (value, ndigits) => {
                        let n = value.as_bigint().ok_or_else(|| {
                            RuntimeError::type_error(
                                format!(
                                    "type {} doesn't define __round__ method",
                                    value.type_name()
                                ),
                                location,
                            )
                        })?;
                        Ok(Value::from_bigint(round_int(&n, ndigits.unwrap_or(0))))
                    }
                }
            }

            Builtin::Chr => {
                check_arity(name, &args, 1, 1, location)?;
                let code = int_argument(&args[0], location)?;
                u32::try_from(code)
                    .ok()
                    .and_then(char::from_u32)
                    .map(|c| Value::from(c.to_string()))
                    .ok_or_else(|| {
                        RuntimeError::value_error("chr() arg not in range(0x110000)", location)
                    })
            }

            Builtin::Ord => {
                check_arity(name, &args, 1, 1, location)?;
                let Value::Str(text) = &args[0] else {
                    return Err(RuntimeError::type_error(
                        format!(
                            "ord() expected string of length 1, but {} found",
                            args[0].type_name()
                        ),
                        location,
                    ));
                };
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Int(i64::from(u32::from(c)))),
                    _ => Err(RuntimeError::type_error(
                        format!(
                            "ord() expected a character, but string of length {} found",
                            text.chars().count()
                        ),
                        location,
                    )),
                }
            }

            Builtin::Any | Builtin::All => {
                check_arity(name, &args, 1, 1, location)?;
                let want = builtin == Builtin::Any;
                let found = self
                    .iterate(&args[0], location)?
                    .any(|item| item.is_truthy() == want);
                Ok(Value::Bool(if want { found } else { !found }))
            }

            Builtin::Isinstance => {
                check_arity(name, &args, 2, 2, location)?;
                isinstance(&args[0], &args[1], location).map(Value::Bool)
            }

            Builtin::Sqrt | Builtin::Floor | Builtin::Ceil | Builtin::Fabs => {
                check_arity(name, &args, 1, 1, location)?;
                let value = args.swap_remove(0);
                math_function(builtin, &value, location)
            }

            // Handled before the keyword check
            Builtin::Print
            | Builtin::Min
            | Builtin::Max
            | Builtin::Dict
            | Builtin::Sorted
            | Builtin::Enumerate
            | Builtin::Sum => Ok(Value::None),
        }
    }

    fn builtin_print(
        &mut self,
        args: Vec<Value>,
        mut kwargs: Vec<(String, Value)>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let text_option = |name: &str, value: Option<Value>, default: &str| match value {
            None | Some(Value::None) => Ok(default.to_string()),
            Some(Value::Str(s)) => Ok(s.to_string()),
            Some(other) => Err(RuntimeError::type_error(
                format!("{} must be None or a string, not {}", name, other.type_name()),
                location,
            )),
        };
        let sep = text_option("sep", take_kwarg(&mut kwargs, "sep"), " ")?;
        let end = text_option("end", take_kwarg(&mut kwargs, "end"), "\n")?;
        let stream = match take_kwarg(&mut kwargs, "file") {
            None | Some(Value::None) => Stream::Stdout,
            Some(Value::Stream(stream)) => stream,
            Some(other) => {
                return Err(RuntimeError::raise(
                    ExceptionKind::AttributeError,
                    format!("'{}' object has no attribute 'write'", other.type_name()),
                    location,
                ))
            }
        };
        take_kwarg(&mut kwargs, "flush");
        reject_kwargs("print", &kwargs, location)?;

        let mut text = args
            .iter()
            .map(|arg| self.str_of(arg, location))
            .collect::<Result<Vec<_>, _>>()?
            .join(&sep);
        text.push_str(&end);
        self.output.write(stream, &text);
        Ok(Value::None)
    }

    fn builtin_extremum(
        &mut self,
        builtin: Builtin,
        args: Vec<Value>,
        mut kwargs: Vec<(String, Value)>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let name = builtin.name();
        let key = take_kwarg(&mut kwargs, "key").filter(|k| !matches!(k, Value::None));
        let default = take_kwarg(&mut kwargs, "default");
        reject_kwargs(name, &kwargs, location)?;
        check_arity(name, &args, 1, usize::MAX, location)?;

        let items = if args.len() == 1 {
            self.collect_iterable(&args[0], location)?
        } else {
            if default.is_some() {
                return Err(RuntimeError::type_error(
                    format!(
                        "Cannot specify a default for {}() with multiple positional arguments",
                        name
                    ),
                    location,
                ));
            }
            args
        };

        let (symbol, wanted) = match builtin {
            Builtin::Min => ("<", Ordering::Less),
            _ => (">", Ordering::Greater),
        };

        let mut best: Option<(Value, Value)> = None;
        for item in items {
            let item_key = match &key {
                Some(function) => self.call_value(function, vec![item.clone()], Vec::new(), location)?,
                None => item.clone(),
            };
            let replace = match &best {
                None => true,
                Some((best_key, _)) => order(&item_key, best_key, symbol, location)? == Some(wanted),
            };
            if replace {
                best = Some((item_key, item));
            }
        }

        match (best, default) {
            (Some((_, item)), _) => Ok(item),
            (None, Some(default)) => Ok(default),
            (None, None) => Err(RuntimeError::value_error(
                format!("{}() iterable argument is empty", name),
                location,
            )),
        }
    }
}

fn parse_int(text: &str, base: i64, location: SourceLocation) -> Result<Value, RuntimeError> {
    let invalid = || {
        RuntimeError::value_error(
            format!(
                "invalid literal for int() with base {}: {}",
                base,
                crate::memory::value::string_repr(text)
            ),
            location,
        )
    };
    if !(2..=36).contains(&base) {
        return Err(RuntimeError::value_error(
            "int() base must be >= 2 and <= 36, or 0",
            location,
        ));
    }

    let trimmed = text.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits = match base {
        16 => digits.trim_start_matches("0x").trim_start_matches("0X"),
        8 => digits.trim_start_matches("0o").trim_start_matches("0O"),
        2 => digits.trim_start_matches("0b").trim_start_matches("0B"),
        _ => digits,
    };
    if digits.is_empty()
        || digits.starts_with('_')
        || digits.ends_with('_')
        || digits.contains("__")
        || !digits.chars().all(|c| c == '_' || c.is_digit(base as u32))
    {
        return Err(invalid());
    }

    let cleaned = digits.replace('_', "");
    if base == 10 && cleaned.len() > INT_MAX_STR_DIGITS {
        return Err(RuntimeError::value_error(
            format!(
                "Exceeds the limit ({} digits) for integer string conversion: value has {} digits; use sys.set_int_max_str_digits() to increase the limit",
                INT_MAX_STR_DIGITS,
                cleaned.len()
            ),
            location,
        ));
    }
    let magnitude = BigInt::parse_bytes(cleaned.as_bytes(), base as u32).ok_or_else(invalid)?;
    Ok(Value::from_bigint(if negative { -magnitude } else { magnitude }))
}

fn parse_float(text: &str, location: SourceLocation) -> Result<f64, RuntimeError> {
    let trimmed = text.trim();
    let lowered = trimmed.to_ascii_lowercase();
    let unsigned = lowered.trim_start_matches(['+', '-']);
    let negative = lowered.starts_with('-');
    let special = match unsigned {
        "inf" | "infinity" => Some(f64::INFINITY),
        "nan" => Some(f64::NAN),
        _ => None,
    };
    if let Some(x) = special {
        return Ok(if negative { -x } else { x });
    }
    trimmed
        .replace('_', "")
        .parse::<f64>()
        .ok()
        .filter(|_| !trimmed.is_empty() && !trimmed.contains("__"))
        .ok_or_else(|| {
            RuntimeError::value_error(
                format!(
                    "could not convert string to float: {}",
                    crate::memory::value::string_repr(text)
                ),
                location,
            )
        })
}

fn isinstance(value: &Value, class: &Value, location: SourceLocation) -> Result<bool, RuntimeError> {
    match class {
        Value::Builtin(builtin) if builtin.is_class() => Ok(builtin.is_instance(value)),
        Value::ExceptionType(kind) => Ok(matches!(
            value,
            Value::Exception(exception) if exception.kind.is_subclass_of(*kind)
        )),
        Value::Tuple(classes) => {
            for class in classes.iter() {
                if isinstance(value, class, location)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        _ => Err(RuntimeError::type_error(
            "isinstance() arg 2 must be a type, a tuple of types, or a union",
            location,
        )),
    }
}

fn math_function(builtin: Builtin, value: &Value, location: SourceLocation) -> Result<Value, RuntimeError> {
    if matches!(builtin, Builtin::Floor | Builtin::Ceil) && value.is_int() {
        return Ok(value.as_bigint().map(Value::from_bigint).unwrap_or(Value::Int(0)));
    }
    let x = float_operand(value, location)?;

    match builtin {
        Builtin::Sqrt => {
            if x < 0.0 {
                return Err(RuntimeError::value_error("math domain error", location));
            }
            Ok(Value::Float(x.sqrt()))
        }
        Builtin::Floor => float_to_int(x.floor(), location),
        Builtin::Ceil => float_to_int(x.ceil(), location),
        _ => Ok(Value::Float(x.abs())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert!(matches!(lookup("len"), Some(Value::Builtin(Builtin::Len))));
        assert!(matches!(
            lookup("KeyError"),
            Some(Value::ExceptionType(ExceptionKind::KeyError))
        ));
        // math functions are only reachable through the module
        assert!(lookup("sqrt").is_none());
        assert!(module_attribute(Module::Math, "sqrt").is_some());
        assert!(module_attribute(Module::Sys, "argv").is_none());
    }

    #[test]
    fn test_rounding() {
        let round = |n: i64, ndigits| round_int(&BigInt::from(n), ndigits);
        assert_eq!(round(25, -1), BigInt::from(20));
        assert_eq!(round(35, -1), BigInt::from(40));
        assert_eq!(round(-25, -1), BigInt::from(-20));
        assert_eq!(round(149, -2), BigInt::from(100));
        assert_eq!(round(i64::MAX, -400), BigInt::zero());
        assert_eq!(round_float(2.675, 2), 2.67);
        assert_eq!(round_float(1234.5, -2), 1200.0);
    }

    #[test]
    fn test_parse_int() {
        let loc = SourceLocation::default();
        assert_eq!(parse_int(" 42 ", 10, loc).unwrap().as_int(), Some(42));
        assert_eq!(parse_int("-1_000", 10, loc).unwrap().as_int(), Some(-1000));
        assert_eq!(parse_int("ff", 16, loc).unwrap().as_int(), Some(255));
        assert_eq!(parse_int("0b101", 2, loc).unwrap().as_int(), Some(5));
        let big = parse_int("-99999999999999999999", 10, loc).unwrap();
        assert_eq!(big.repr().unwrap(), "-99999999999999999999");
        let err = parse_int("abc", 10, loc).unwrap_err();
        assert_eq!(err.to_string(), "invalid literal for int() with base 10: 'abc'");
    }

    #[test]
    fn test_parse_float() {
        let loc = SourceLocation::default();
        assert_eq!(parse_float("2.5", loc).unwrap(), 2.5);
        assert!(parse_float("-inf", loc).unwrap().is_infinite());
        assert!(parse_float("x", loc).is_err());
    }

    #[test]
    fn test_merge_sort_is_stable() {
        let items = vec![(1, 'a'), (0, 'b'), (1, 'c'), (0, 'd')];
        let sorted = merge_sort(items, &mut |a: &(i32, char), b: &(i32, char)| Ok(a.0 < b.0)).unwrap();
        assert_eq!(sorted, vec![(0, 'b'), (0, 'd'), (1, 'a'), (1, 'c')]);
    }

    #[test]
    fn test_arity_messages() {
        let loc = SourceLocation::default();
        let err = check_arity("len", &[], 1, 1, loc).unwrap_err();
        assert_eq!(err.to_string(), "len() takes exactly one argument (0 given)");
        let err = check_arity("range", &vec![Value::Int(1); 4], 1, 3, loc).unwrap_err();
        assert_eq!(err.to_string(), "range expected at most 3 arguments, got 4");
    }
}
