//! TUI pane rendering modules
//!
//! Stateless render functions for each region of the terminal viewer.
//!
//! # Pane Modules
//!
//! - [`source`]: Source listing with syntax highlighting and the current line
//! - [`locals`]: `name = repr` lines for the current step
//! - [`output`]: Tail of the combined program output
//! - [`status`]: Title bar with key help and the step counter
//!
//! Each pane module exports a primary `render_*` function taking the frame,
//! its area, and the borrowed data it displays.

pub mod locals;
pub mod output;
pub mod source;
pub mod status;

pub use locals::render_locals_pane;
pub use output::render_output_pane;
pub use source::render_source_pane;
pub use status::render_title_bar;
