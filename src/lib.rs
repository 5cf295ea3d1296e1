//! # Introduction
//!
//! pyviz runs a program written in a Python subset one statement at a time,
//! recording the line reached and the local variables visible before each
//! step. The recorded timeline is then browsed forward and backward in a
//! terminal UI built with [ratatui](https://docs.rs/ratatui), or exported as
//! a self-contained HTML page.
//!
//! ## Execution pipeline
//!
//! ```text
//! Source → Lexer → Parser → AST → Interpreter ⇄ Tracer → Trace → Viewer
//! ```
//!
//! 1. [`parser`] — tokenises the source and builds an AST tagged with the
//!    `<user_code>` filename.
//! 2. [`interpreter`] — walks the AST and raises a line event before each
//!    statement through the [`interpreter::engine::LineHook`] seam.
//! 3. [`memory`] — runtime values ([`memory::value::Value`]) and the call
//!    [`memory::stack::Stack`].
//! 4. [`tracer`] — records a [`snapshot::StepRecord`] per line event, enforces
//!    the step ceiling and folds output and errors into a [`snapshot::Trace`].
//! 5. [`viewer`] — the navigation contract shared by the front ends, plus the
//!    HTML export.
//! 6. [`ui`] — ratatui-based terminal viewer; not part of the stable library API.
//!
//! ## Example
//!
//! ```
//! let trace = pyviz::tracer::trace("x = 1\nprint(x + 1)\n");
//! assert_eq!(trace.steps.len(), 2);
//! assert_eq!(trace.output, "2");
//! ```

pub mod interpreter;
pub mod memory;
pub mod parser;
pub mod snapshot;
pub mod tracer;
pub mod ui;
pub mod viewer;
