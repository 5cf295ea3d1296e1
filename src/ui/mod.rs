//! Terminal user interface built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI is organized into three layers:
//!
//! - **[`app`]** — viewer state over a [`Session`], keyboard event loop, auto-play
//! - **[`panes`]** — stateless render functions for each visible region (title bar,
//!   source, locals, output)
//! - **[`theme`]** — centralized color palette used by all panes
//!
//! The entry point for consumers is [`TerminalViewer`], the [`Frontend`] that
//! takes over the terminal until the user quits. [`App`] renders into any
//! ratatui backend, which is how the tests drive it.
//!
//! [`Session`]: crate::viewer::Session
//! [`Frontend`]: crate::viewer::Frontend

pub mod app;
pub mod panes;
pub mod theme;

pub use app::{App, TerminalViewer};
