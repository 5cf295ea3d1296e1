//! Runtime error types for the interpreter
//!
//! This module defines [`RuntimeError`], which represents everything that can
//! unwind out of executing code (as opposed to parse errors):
//!
//! - [`RuntimeError::Exception`]: a raised Python exception. User code can
//!   catch it with `try`/`except`.
//! - [`RuntimeError::StepLimit`]: the line hook's step ceiling was reached.
//!   It is not an exception: `except` clauses never match it and `finally`
//!   blocks do not run while it unwinds.
//!
//! [`ExceptionKind`] is the built-in exception class hierarchy.

use crate::memory::value::{ExceptionValue, Value};
use crate::parser::ast::SourceLocation;
use std::rc::Rc;
use thiserror::Error;

/// Built-in exception classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionKind {
    Exception,
    ArithmeticError,
    ZeroDivisionError,
    OverflowError,
    MemoryError,
    LookupError,
    IndexError,
    KeyError,
    ValueError,
    TypeError,
    NameError,
    UnboundLocalError,
    AttributeError,
    AssertionError,
    RuntimeError,
    RecursionError,
    NotImplementedError,
    ImportError,
    ModuleNotFoundError,
    StopIteration,
}

impl ExceptionKind {
    pub const ALL: [ExceptionKind; 20] = [
        ExceptionKind::Exception,
        ExceptionKind::ArithmeticError,
        ExceptionKind::ZeroDivisionError,
        ExceptionKind::OverflowError,
        ExceptionKind::MemoryError,
        ExceptionKind::LookupError,
        ExceptionKind::IndexError,
        ExceptionKind::KeyError,
        ExceptionKind::ValueError,
        ExceptionKind::TypeError,
        ExceptionKind::NameError,
        ExceptionKind::UnboundLocalError,
        ExceptionKind::AttributeError,
        ExceptionKind::AssertionError,
        ExceptionKind::RuntimeError,
        ExceptionKind::RecursionError,
        ExceptionKind::NotImplementedError,
        ExceptionKind::ImportError,
        ExceptionKind::ModuleNotFoundError,
        ExceptionKind::StopIteration,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ExceptionKind::Exception => "Exception",
            ExceptionKind::ArithmeticError => "ArithmeticError",
            ExceptionKind::ZeroDivisionError => "ZeroDivisionError",
            ExceptionKind::OverflowError => "OverflowError",
            ExceptionKind::MemoryError => "MemoryError",
            ExceptionKind::LookupError => "LookupError",
            ExceptionKind::IndexError => "IndexError",
            ExceptionKind::KeyError => "KeyError",
            ExceptionKind::ValueError => "ValueError",
            ExceptionKind::TypeError => "TypeError",
            ExceptionKind::NameError => "NameError",
            ExceptionKind::UnboundLocalError => "UnboundLocalError",
            ExceptionKind::AttributeError => "AttributeError",
            ExceptionKind::AssertionError => "AssertionError",
            ExceptionKind::RuntimeError => "RuntimeError",
            ExceptionKind::RecursionError => "RecursionError",
            ExceptionKind::NotImplementedError => "NotImplementedError",
            ExceptionKind::ImportError => "ImportError",
            ExceptionKind::ModuleNotFoundError => "ModuleNotFoundError",
            ExceptionKind::StopIteration => "StopIteration",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Direct base class, `None` for `Exception` itself
    pub fn parent(self) -> Option<Self> {
        match self {
            ExceptionKind::Exception => None,
            ExceptionKind::ZeroDivisionError | ExceptionKind::OverflowError => {
                Some(ExceptionKind::ArithmeticError)
            }
            ExceptionKind::IndexError | ExceptionKind::KeyError => Some(ExceptionKind::LookupError),
            ExceptionKind::UnboundLocalError => Some(ExceptionKind::NameError),
            ExceptionKind::RecursionError | ExceptionKind::NotImplementedError => {
                Some(ExceptionKind::RuntimeError)
            }
            ExceptionKind::ModuleNotFoundError => Some(ExceptionKind::ImportError),
            _ => Some(ExceptionKind::Exception),
        }
    }

    /// Whether `self` is `other` or derives from it
    pub fn is_subclass_of(self, other: ExceptionKind) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == other {
                return true;
            }
            current = kind.parent();
        }
        false
    }
}

/// Anything that unwinds out of executing code
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    /// A raised exception; displays as `str(exc)`
    #[error("{exception}")]
    Exception {
        exception: Rc<ExceptionValue>,
        location: SourceLocation,
    },

    /// The step ceiling was reached
    #[error("Step limit {limit} reached.")]
    StepLimit { limit: usize },
}

impl RuntimeError {
    /// Raise a new exception of `kind` with a single message argument
    pub fn raise(kind: ExceptionKind, message: impl Into<String>, location: SourceLocation) -> Self {
        let message: String = message.into();
        RuntimeError::Exception {
            exception: Rc::new(ExceptionValue::new(kind, vec![Value::from(message)])),
            location,
        }
    }

    /// `KeyError` carries the key itself so `str(exc)` is the key's repr
    pub fn key_error(key: Value, location: SourceLocation) -> Self {
        RuntimeError::Exception {
            exception: Rc::new(ExceptionValue::new(ExceptionKind::KeyError, vec![key])),
            location,
        }
    }

    pub fn type_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::raise(ExceptionKind::TypeError, message, location)
    }

    pub fn value_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::raise(ExceptionKind::ValueError, message, location)
    }

    pub fn index_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::raise(ExceptionKind::IndexError, message, location)
    }

    pub fn zero_division(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::raise(ExceptionKind::ZeroDivisionError, message, location)
    }

    pub fn overflow(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::raise(ExceptionKind::OverflowError, message, location)
    }

    /// A bare `MemoryError` for results too large to build
    pub fn out_of_memory(location: SourceLocation) -> Self {
        RuntimeError::Exception {
            exception: Rc::new(ExceptionValue::new(ExceptionKind::MemoryError, Vec::new())),
            location,
        }
    }

    /// The raised exception, if this is a catchable error
    pub fn exception(&self) -> Option<&Rc<ExceptionValue>> {
        match self {
            RuntimeError::Exception { exception, .. } => Some(exception),
            RuntimeError::StepLimit { .. } => None,
        }
    }

    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            RuntimeError::Exception { location, .. } => Some(*location),
            RuntimeError::StepLimit { .. } => None,
        }
    }
}
