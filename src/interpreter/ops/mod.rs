//! Operators on runtime values
//!
//! Each submodule adds `impl Interpreter` methods (or free helpers) for one
//! family of operations:
//! - [`binary`]: arithmetic, bitwise, concatenation, repetition
//! - [`unary`]: `-x`, `+x`, `~x`, `not x`
//! - [`compare`]: comparison chains, ordering, membership
//! - [`access`]: subscripts, slices, attributes

pub mod access;
pub mod binary;
pub mod compare;
pub mod unary;
