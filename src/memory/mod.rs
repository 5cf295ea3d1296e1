//! Memory model for the interpreter
//!
//! This module provides the core runtime abstractions:
//! - [`value`]: Runtime value representation (scalars, shared containers,
//!   callables, exceptions) with CPython-style `repr`/`str`
//! - [`stack`]: Call stack with frames and local namespaces
//!
//! # Sharing
//!
//! Lists and dicts are reference-counted and interior-mutable, so assignment
//! copies a reference, not the container:
//! ```text
//! a = [1]; b = a; b.append(2)   →   a == [1, 2]
//! ```

pub mod stack;
pub mod value;
