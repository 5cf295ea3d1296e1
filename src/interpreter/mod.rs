//! Python-subset interpreter execution engine
//!
//! This module provides the core execution logic:
//! - [`engine`]: Main interpreter, name resolution, calls, the line hook
//! - [`errors`]: Runtime error types and the exception hierarchy
//! - [`builtins`]: Built-in functions and the `sys` / `math` modules
//! - [`constants`]: Limits shared with the tracer
//!
//! # Execution Model
//!
//! The interpreter walks the AST and executes statements one at a time.
//! Before each statement (and each loop or branch header) it raises a line
//! event; an installed [`LineHook`](engine::LineHook) sees the line, the
//! enclosing function and its locals, and may stop the run.
//!
//! Statement and expression evaluation are split across internal modules
//! that each add `impl Interpreter` blocks: `statements`, `loops`,
//! `expressions`, `methods`, `format`, and the operators in `ops`.

pub mod builtins;
pub mod constants;
pub mod engine;
pub mod errors;

mod expressions;
mod format;
mod loops;
mod methods;
mod ops;
mod statements;
