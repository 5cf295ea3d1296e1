//! Python-subset source parser
//!
//! This module transforms source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (source text → tokens, with INDENT/DEDENT)
//! - [`parse`]: Parser core, blocks and the [`compile`] entry point
//! - `statements` / `expressions`: `impl Parser` blocks per grammar area
//! - [`scope`]: which names a function body binds locally
//! - [`ast`]: AST node definitions
//!
//! # Supported Subset
//!
//! - Statements: assignment (chained, tuple, subscript, augmented), `if`,
//!   `while`, `for`, `def`, `try`, `raise`, `assert`, `del`, `global`, imports
//! - Expressions: arithmetic, bitwise, boolean, chained comparisons,
//!   conditional expressions, calls with keywords, slices, list
//!   comprehensions, f-strings
//! - No classes, lambdas, generators, decorators or `with`
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser.
//! No external parser generator dependencies.

pub mod ast;
mod expressions;
pub mod lexer;
pub mod parse;
pub mod scope;
mod statements;

pub use parse::{compile, ParseError, Parser};
