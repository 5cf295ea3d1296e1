//! Runtime value representation
//!
//! This module defines the [`Value`] enum, which represents all possible runtime
//! values of the Python subset. Mutable containers (lists, dicts) are shared
//! through `Rc<RefCell<..>>`, so aliasing behaves as in Python: two names bound
//! to the same list observe each other's mutations.
//!
//! # Value Types
//!
//! - scalars: [`Value::None`], [`Value::Bool`], [`Value::Int`] (64-bit) and
//!   [`Value::Long`] (arbitrary precision), [`Value::Float`], [`Value::Str`]
//! - containers: [`Value::List`], [`Value::Tuple`], [`Value::Dict`], [`Value::Range`]
//! - callables: [`Value::Function`] (user `def`), [`Value::Builtin`],
//!   [`Value::Method`] (a built-in method bound to its receiver),
//!   [`Value::ExceptionType`]
//! - runtime objects: [`Value::Module`], [`Value::Stream`], [`Value::Exception`]
//!
//! # Representations
//!
//! [`Value::repr`] and [`Value::to_str`] follow CPython's `repr()`/`str()`
//! output, minus memory addresses. Both are fallible: nesting deeper than
//! [`MAX_REPR_DEPTH`] fails with a [`ReprError`] instead of overflowing the
//! native stack. Self-containing containers render as `[...]` / `{...}`.

use crate::interpreter::builtins::Builtin;
use crate::interpreter::constants::{INT_MAX_STR_DIGITS, MAX_REPR_DEPTH};
use crate::interpreter::errors::ExceptionKind;
use crate::parser::ast::FunctionDef;
use num_bigint::{BigInt, Sign};
use num_traits::ToPrimitive;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Failure to produce a textual representation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReprError {
    #[error("maximum recursion depth exceeded while getting the repr of an object")]
    RecursionLimit,
    #[error("Exceeds the limit ({limit} digits) for integer string conversion; use sys.set_int_max_str_digits() to increase the limit")]
    IntTooLong { limit: usize },
}

/// Runtime values in the interpreter
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    /// An int outside the `i64` range; values that fit are always `Int`
    Long(Rc<BigInt>),
    Float(f64),
    Str(Rc<str>),
    List(Rc<RefCell<Vec<Value>>>),
    Tuple(Rc<Vec<Value>>),
    Dict(Rc<RefCell<Dict>>),
    Range { start: i64, stop: i64, step: i64 },
    Function(Rc<Function>),
    Builtin(Builtin),
    Method(Rc<BoundMethod>),
    ExceptionType(ExceptionKind),
    Exception(Rc<ExceptionValue>),
    Module(Module),
    Stream(Stream),
}

/// A user-defined function: its definition plus defaults evaluated at `def` time
#[derive(Debug)]
pub struct Function {
    pub def: Rc<FunctionDef>,
    pub defaults: Vec<Value>,
}

/// A built-in method looked up on a receiver, e.g. `items.append`
#[derive(Debug)]
pub struct BoundMethod {
    pub receiver: Value,
    pub name: String,
}

/// Native modules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Module {
    Builtins,
    Sys,
    Math,
}

impl Module {
    pub fn name(self) -> &'static str {
        match self {
            Module::Builtins => "builtins",
            Module::Sys => "sys",
            Module::Math => "math",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sys" => Some(Module::Sys),
            "math" => Some(Module::Math),
            "builtins" => Some(Module::Builtins),
            _ => None,
        }
    }
}

/// The program's output streams (`sys.stdout`, `sys.stderr`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// A raised (or constructed) exception instance
#[derive(Debug, Clone)]
pub struct ExceptionValue {
    pub kind: ExceptionKind,
    pub args: Vec<Value>,
}

impl ExceptionValue {
    pub fn new(kind: ExceptionKind, args: Vec<Value>) -> Self {
        Self { kind, args }
    }

    /// `str(exc)`: empty without arguments, the argument's `str` with one
    /// (its repr for `KeyError`), the tuple repr with several.
    pub fn message(&self) -> String {
        let text = match self.args.as_slice() {
            [] => Ok(String::new()),
            [arg] if self.kind == ExceptionKind::KeyError => arg.repr(),
            [arg] => arg.to_str(),
            args => Value::Tuple(Rc::new(args.to_vec())).repr(),
        };
        text.unwrap_or_else(|err| format!("<exception str() failed: {}>", err))
    }
}

impl fmt::Display for ExceptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Insertion-ordered dictionary.
///
/// Keys are compared with Python equality, so `1`, `1.0` and `True` are the
/// same key. Lookups are linear; traced programs keep dicts small.
#[derive(Debug, Clone, Default)]
pub struct Dict {
    entries: Vec<(Value, Value)>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &Value) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k.py_eq(key))
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.position(key).is_some()
    }

    /// Insert or overwrite; an existing key keeps its original position
    pub fn insert(&mut self, key: Value, value: Value) {
        match self.position(&key) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        self.position(key).map(|i| self.entries.remove(i).1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Value, Value)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> Vec<Value> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.entries.iter().map(|(_, v)| v.clone()).collect()
    }

    pub fn pop_last(&mut self) -> Option<(Value, Value)> {
        self.entries.pop()
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl Value {
    pub fn new_list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn new_tuple(items: Vec<Value>) -> Self {
        Value::Tuple(Rc::new(items))
    }

    pub fn new_dict(dict: Dict) -> Self {
        Value::Dict(Rc::new(RefCell::new(dict)))
    }

    /// Python type name, as used in `TypeError` messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) | Value::Long(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Range { .. } => "range",
            Value::Function(_) => "function",
            Value::Builtin(b) if b.is_class() => "type",
            Value::Builtin(_) | Value::Method(_) => "builtin_function_or_method",
            Value::ExceptionType(_) => "type",
            Value::Exception(e) => e.kind.name(),
            Value::Module(_) => "module",
            Value::Stream(_) => "TextIOWrapper",
        }
    }

    /// Python truthiness
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Tuple(items) => !items.is_empty(),
            Value::Dict(dict) => !dict.borrow().is_empty(),
            Value::Range { .. } => range_len(self) > 0,
            _ => true,
        }
    }

    /// Numeric view used by arithmetic and comparisons (`bool` counts as int)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(f64::from(u8::from(*b))),
            Value::Int(n) => Some(*n as f64),
            Value::Long(n) => Some(n.to_f64().unwrap_or(match n.sign() {
                Sign::Minus => f64::NEG_INFINITY,
                _ => f64::INFINITY,
            })),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Integer view (`bool` counts as int)
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Arbitrary-precision integer view (`bool` counts as int)
    pub fn as_bigint(&self) -> Option<BigInt> {
        match self {
            Value::Bool(b) => Some(BigInt::from(u8::from(*b))),
            Value::Int(n) => Some(BigInt::from(*n)),
            Value::Long(n) => Some(BigInt::clone(n)),
            _ => None,
        }
    }

    /// An int value, kept inline when it fits in 64 bits
    pub fn from_bigint(n: BigInt) -> Self {
        match n.to_i64() {
            Some(small) => Value::Int(small),
            None => Value::Long(Rc::new(n)),
        }
    }

    /// Whether the value is an int (`bool` included)
    pub fn is_int(&self) -> bool {
        matches!(self, Value::Bool(_) | Value::Int(_) | Value::Long(_))
    }

    pub fn is_number(&self) -> bool {
        self.is_int() || matches!(self, Value::Float(_))
    }

    /// Whether the value may be used as a dict key
    pub fn is_hashable(&self) -> bool {
        match self {
            Value::List(_) | Value::Dict(_) => false,
            Value::Tuple(items) => items.iter().all(Value::is_hashable),
            _ => true,
        }
    }

    /// Python `==`
    pub fn py_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (a, b) if a.is_number() && b.is_number() => match (a.as_bigint(), b.as_bigint()) {
                (Some(x), Some(y)) => x == y,
                _ => a.as_f64() == b.as_f64(),
            },
            (Value::List(a), Value::List(b)) => {
                Rc::ptr_eq(a, b) || sequences_equal(&a.borrow(), &b.borrow())
            }
            (Value::Tuple(a), Value::Tuple(b)) => Rc::ptr_eq(a, b) || sequences_equal(a, b),
            (Value::Dict(a), Value::Dict(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|other| v.py_eq(other)))
            }
            (
                Value::Range {
                    start: a0,
                    stop: a1,
                    step: a2,
                },
                Value::Range {
                    start: b0,
                    stop: b1,
                    step: b2,
                },
            ) => (a0, a1, a2) == (b0, b1, b2),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::Method(a), Value::Method(b)) => Rc::ptr_eq(a, b),
            (Value::ExceptionType(a), Value::ExceptionType(b)) => a == b,
            (Value::Exception(a), Value::Exception(b)) => Rc::ptr_eq(a, b),
            (Value::Module(a), Value::Module(b)) => a == b,
            (Value::Stream(a), Value::Stream(b)) => a == b,
            _ => false,
        }
    }

    /// Python `is`: identity for shared objects, equality for immediates
    pub fn is_same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Dict(a), Value::Dict(b)) => Rc::ptr_eq(a, b),
            (Value::Tuple(a), Value::Tuple(b)) => Rc::ptr_eq(a, b),
            (Value::Str(a), Value::Str(b)) => Rc::ptr_eq(a, b) || a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => Rc::ptr_eq(a, b) || a == b,
            (Value::None, Value::None) => true,
            (Value::Bool(_) | Value::Int(_) | Value::Long(_), _)
            | (_, Value::Bool(_) | Value::Int(_) | Value::Long(_)) => false,
            _ => self.py_eq(other),
        }
    }

    /// `repr(value)`
    pub fn repr(&self) -> Result<String, ReprError> {
        let mut out = String::new();
        self.write_repr(&mut out, &mut ReprGuard::default())?;
        Ok(out)
    }

    /// `str(value)`
    pub fn to_str(&self) -> Result<String, ReprError> {
        match self {
            Value::Str(s) => Ok(s.to_string()),
            Value::Exception(e) => Ok(e.message()),
            _ => self.repr(),
        }
    }

    fn write_repr(&self, out: &mut String, guard: &mut ReprGuard) -> Result<(), ReprError> {
        match self {
            Value::None => out.push_str("None"),
            Value::Bool(true) => out.push_str("True"),
            Value::Bool(false) => out.push_str("False"),
            Value::Int(n) => out.push_str(&n.to_string()),
            Value::Long(n) => out.push_str(&int_repr(n)?),
            Value::Float(x) => out.push_str(&float_repr(*x)),
            Value::Str(s) => out.push_str(&string_repr(s)),
            Value::List(items) => {
                let id = Rc::as_ptr(items) as *const () as usize;
                if guard.active.contains(&id) {
                    out.push_str("[...]");
                    return Ok(());
                }
                guard.enter(id)?;
                out.push('[');
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write_repr(out, guard)?;
                }
                out.push(']');
                guard.leave();
            }
            Value::Tuple(items) => {
                guard.enter(0)?;
                out.push('(');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write_repr(out, guard)?;
                }
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
                guard.leave();
            }
            Value::Dict(dict) => {
                let id = Rc::as_ptr(dict) as *const () as usize;
                if guard.active.contains(&id) {
                    out.push_str("{...}");
                    return Ok(());
                }
                guard.enter(id)?;
                out.push('{');
                for (i, (key, value)) in dict.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    key.write_repr(out, guard)?;
                    out.push_str(": ");
                    value.write_repr(out, guard)?;
                }
                out.push('}');
                guard.leave();
            }
            Value::Range { start, stop, step } => {
                if *step == 1 {
                    out.push_str(&format!("range({}, {})", start, stop));
                } else {
                    out.push_str(&format!("range({}, {}, {})", start, stop, step));
                }
            }
            Value::Function(function) => {
                out.push_str(&format!("<function {}>", function.def.name));
            }
            Value::Builtin(builtin) if builtin.is_class() => {
                out.push_str(&format!("<class '{}'>", builtin.name()));
            }
            Value::Builtin(builtin) => {
                out.push_str(&format!("<built-in function {}>", builtin.name()));
            }
            Value::Method(method) => {
                out.push_str(&format!(
                    "<built-in method {} of {} object>",
                    method.name,
                    method.receiver.type_name()
                ));
            }
            Value::ExceptionType(kind) => {
                out.push_str(&format!("<class '{}'>", kind.name()));
            }
            Value::Exception(exception) => {
                out.push_str(exception.kind.name());
                out.push('(');
                guard.enter(0)?;
                for (i, arg) in exception.args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    arg.write_repr(out, guard)?;
                }
                guard.leave();
                out.push(')');
            }
            Value::Module(module) => {
                out.push_str(&format!("<module '{}' (built-in)>", module.name()));
            }
            Value::Stream(stream) => {
                let name = match stream {
                    Stream::Stdout => "<stdout>",
                    Stream::Stderr => "<stderr>",
                };
                out.push_str(&format!(
                    "<_io.TextIOWrapper name='{}' mode='w' encoding='utf-8'>",
                    name
                ));
            }
        }
        Ok(())
    }
}

/// Containers currently being rendered, innermost last
#[derive(Default)]
struct ReprGuard {
    active: Vec<usize>,
}

impl ReprGuard {
    fn enter(&mut self, id: usize) -> Result<(), ReprError> {
        if self.active.len() >= MAX_REPR_DEPTH {
            return Err(ReprError::RecursionLimit);
        }
        self.active.push(id);
        Ok(())
    }

    fn leave(&mut self) {
        self.active.pop();
    }
}

fn sequences_equal(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.py_eq(y))
}

/// Number of elements a range value yields
pub fn range_len(value: &Value) -> usize {
    match value {
        Value::Range { start, stop, step } => {
            let (start, stop, step) = (*start as i128, *stop as i128, *step as i128);
            let span = if step > 0 {
                stop - start
            } else {
                start - stop
            };
            if span <= 0 {
                0
            } else {
                ((span + step.abs() - 1) / step.abs()) as usize
            }
        }
        _ => 0,
    }
}

/// Decimal digits of a big int, refused past [`INT_MAX_STR_DIGITS`]
fn int_repr(n: &BigInt) -> Result<String, ReprError> {
    let too_long = ReprError::IntTooLong {
        limit: INT_MAX_STR_DIGITS,
    };
    // 2^14287 already has more than 4300 digits
    if n.bits() > 14_287 {
        return Err(too_long);
    }
    let text = n.to_string();
    if text.trim_start_matches('-').len() > INT_MAX_STR_DIGITS {
        return Err(too_long);
    }
    Ok(text)
}

/// CPython float repr: shortest round-trip digits, scientific notation
/// outside `1e-4 <= |x| < 1e16`.
pub fn float_repr(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = x.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        // Rust renders `1e16` / `1.5e-5`; Python wants `1e+16` / `1.5e-05`
        let formatted = format!("{:e}", x);
        let (mantissa, exponent) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
        let (sign, digits) = match exponent.strip_prefix('-') {
            Some(digits) => ('-', digits),
            None => ('+', exponent),
        };
        return format!("{}e{}{:0>2}", mantissa, sign, digits);
    }

    let formatted = format!("{}", x);
    if formatted.contains('.') {
        formatted
    } else {
        format!("{}.0", formatted)
    }
}

/// CPython str repr: single quotes unless the text contains `'` but no `"`
pub fn string_repr(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_reprs() {
        assert_eq!(Value::None.repr().unwrap(), "None");
        assert_eq!(Value::Bool(true).repr().unwrap(), "True");
        assert_eq!(Value::Int(-42).repr().unwrap(), "-42");
        assert_eq!(Value::from("it's").repr().unwrap(), "\"it's\"");
        assert_eq!(Value::from("a\nb").repr().unwrap(), "'a\\nb'");
        assert_eq!(Value::from("plain").to_str().unwrap(), "plain");
    }

    #[test]
    fn test_float_repr() {
        assert_eq!(float_repr(3.0), "3.0");
        assert_eq!(float_repr(0.1), "0.1");
        assert_eq!(float_repr(-0.0), "-0.0");
        assert_eq!(float_repr(2.5e-5), "2.5e-05");
        assert_eq!(float_repr(1e16), "1e+16");
        assert_eq!(float_repr(1e15), "1000000000000000.0");
        assert_eq!(float_repr(f64::INFINITY), "inf");
    }

    #[test]
    fn test_container_reprs() {
        let list = Value::new_list(vec![Value::Int(1), Value::from("a")]);
        assert_eq!(list.repr().unwrap(), "[1, 'a']");

        let single = Value::new_tuple(vec![Value::Int(1)]);
        assert_eq!(single.repr().unwrap(), "(1,)");

        let mut dict = Dict::new();
        dict.insert(Value::from("k"), Value::None);
        assert_eq!(Value::new_dict(dict).repr().unwrap(), "{'k': None}");
    }

    #[test]
    fn test_self_containing_list() {
        let list = Value::new_list(vec![Value::Int(1)]);
        if let Value::List(items) = &list {
            items.borrow_mut().push(list.clone());
        }
        assert_eq!(list.repr().unwrap(), "[1, [...]]");
    }

    #[test]
    fn test_deep_nesting_fails() {
        // traces run on a large-stack thread; so does this
        let outcome = std::thread::Builder::new()
            .stack_size(crate::interpreter::constants::TRACE_STACK_SIZE)
            .spawn(|| {
                let mut value = Value::new_list(Vec::new());
                for _ in 0..(MAX_REPR_DEPTH + 10) {
                    value = Value::new_list(vec![value]);
                }
                value.repr()
            })
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(outcome, Err(ReprError::RecursionLimit));
    }

    #[test]
    fn test_huge_int_repr_refused() {
        let small = Value::from_bigint(BigInt::from(10).pow(40));
        assert_eq!(small.repr().unwrap().len(), 41);

        let huge = Value::from_bigint(BigInt::from(10).pow(5000));
        assert_eq!(
            huge.repr(),
            Err(ReprError::IntTooLong {
                limit: INT_MAX_STR_DIGITS
            })
        );
    }

    #[test]
    fn test_numeric_equality_and_dict_keys() {
        assert!(Value::Int(1).py_eq(&Value::Float(1.0)));
        assert!(Value::Bool(true).py_eq(&Value::Int(1)));
        assert!(!Value::Int(1).py_eq(&Value::from("1")));

        let mut dict = Dict::new();
        dict.insert(Value::Int(1), Value::from("one"));
        dict.insert(Value::Float(1.0), Value::from("uno"));
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.get(&Value::Bool(true)).unwrap().to_str().unwrap(), "uno");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::new_list(Vec::new()).is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(!Value::Range { start: 3, stop: 3, step: 1 }.is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
    }

    #[test]
    fn test_range_len() {
        assert_eq!(range_len(&Value::Range { start: 0, stop: 10, step: 3 }), 4);
        assert_eq!(range_len(&Value::Range { start: 10, stop: 0, step: -2 }), 5);
        assert_eq!(range_len(&Value::Range { start: 5, stop: 0, step: 1 }), 0);
    }

    #[test]
    fn test_exception_message() {
        let err = ExceptionValue::new(ExceptionKind::ValueError, vec![Value::from("bad")]);
        assert_eq!(err.message(), "bad");
        assert_eq!(Value::Exception(Rc::new(err)).repr().unwrap(), "ValueError('bad')");
        let key = ExceptionValue::new(ExceptionKind::KeyError, vec![Value::from("k")]);
        assert_eq!(key.message(), "'k'");
    }
}
