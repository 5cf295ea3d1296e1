//! Timeline viewer contract
//!
//! A [`Session`] holds one immutable [`Trace`], the source it was produced
//! from, and a cursor over its steps. Front ends implement [`Frontend`] and
//! drive the session with [`Navigation`] commands:
//! - the terminal viewer in [`crate::ui`]
//! - the static browser page in [`html`]
//!
//! Navigation never fails: on an empty trace every command except `quit`
//! is a no-op and front ends render a `<no steps>` placeholder.

pub mod html;

use crate::snapshot::{StepRecord, Trace};

/// Lines above the code window in the terminal viewer (title and key help)
pub const HEADER_LINES: usize = 2;

/// Smallest terminal the terminal viewer draws into
pub const MIN_WIDTH: u16 = 40;
pub const MIN_HEIGHT: u16 = 8;

/// Cursor movement requested by a front end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Next,
    Prev,
    First,
    Last,
    Quit,
}

/// A front end presenting a session until the user quits
pub trait Frontend {
    type Error;

    fn present(&mut self, session: &mut Session) -> Result<(), Self::Error>;
}

/// One trace being browsed
#[derive(Debug, Clone)]
pub struct Session {
    trace: Trace,
    source: String,
    /// Index of the current step; meaningless when the trace is empty
    cursor: usize,
    quit: bool,
}

impl Session {
    pub fn new(trace: Trace, source: impl Into<String>) -> Self {
        Self {
            trace,
            source: source.into(),
            cursor: 0,
            quit: false,
        }
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn source_lines(&self) -> Vec<&str> {
        self.source.lines().collect()
    }

    pub fn output(&self) -> &str {
        &self.trace.output
    }

    pub fn len(&self) -> usize {
        self.trace.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trace.steps.is_empty()
    }

    /// Index of the current step, `None` on an empty trace
    pub fn position(&self) -> Option<usize> {
        (!self.is_empty()).then_some(self.cursor)
    }

    pub fn current(&self) -> Option<&StepRecord> {
        self.trace.steps.get(self.cursor)
    }

    /// Source line of the current step
    pub fn current_line(&self) -> Option<usize> {
        self.current().map(|step| step.line)
    }

    pub fn is_at_start(&self) -> bool {
        self.cursor == 0
    }

    pub fn is_at_end(&self) -> bool {
        self.cursor + 1 >= self.len()
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Apply one navigation command; returns whether the cursor moved
    pub fn navigate(&mut self, command: Navigation) -> bool {
        if command == Navigation::Quit {
            self.quit = true;
            return false;
        }
        if self.is_empty() {
            return false;
        }

        let last = self.len() - 1;
        let target = match command {
            Navigation::Next => (self.cursor + 1).min(last),
            Navigation::Prev => self.cursor.saturating_sub(1),
            Navigation::First => 0,
            Navigation::Last => last,
            Navigation::Quit => self.cursor,
        };
        let moved = target != self.cursor;
        self.cursor = target;
        moved
    }

    /// Jump to step `index`, clamped to the trace
    pub fn seek(&mut self, index: usize) {
        if !self.is_empty() {
            self.cursor = index.min(self.len() - 1);
        }
    }
}

/// Height of the code window for a terminal `height` rows tall, 0 when
/// nothing fits
pub fn compute_code_height(height: usize, header_lines: usize) -> usize {
    let available = match height.checked_sub(header_lines + 2) {
        Some(available) if available >= 1 => available,
        _ => return 0,
    };
    let min_height = available.min(6);
    let ideal = (height - header_lines - 1) * 55 / 100;
    ideal.clamp(min_height, available)
}

/// Visible region of the source in the terminal viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceWindow {
    /// 0-based index of the topmost visible line
    pub top: usize,
}

impl SourceWindow {
    /// Move the window minimally so `line` (1-based) is visible in a window
    /// `height` lines tall, then clamp to the source
    pub fn follow(&mut self, line: Option<usize>, height: usize, total_lines: usize) {
        let Some(line) = line else {
            return;
        };
        let mut top = self.top;
        if line < top + 1 {
            top = line.saturating_sub(1);
        } else if line > top + height {
            top = line - height;
        }
        self.top = top.min(total_lines.saturating_sub(height));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Outcome;
    use std::collections::BTreeMap;

    fn session(lines: &[usize]) -> Session {
        let steps = lines
            .iter()
            .map(|&line| StepRecord {
                line,
                function: "<module>".to_string(),
                locals: BTreeMap::new(),
            })
            .collect();
        let trace = Trace {
            steps,
            output: String::new(),
            outcome: Outcome::Completed,
        };
        Session::new(trace, "a = 1\nb = 2\nc = 3\n")
    }

    #[test]
    fn test_navigation_clamps() {
        let mut s = session(&[1, 2, 3]);
        assert_eq!(s.position(), Some(0));
        assert!(!s.navigate(Navigation::Prev));
        assert!(s.navigate(Navigation::Next));
        assert!(s.navigate(Navigation::Next));
        assert!(!s.navigate(Navigation::Next));
        assert_eq!(s.current_line(), Some(3));
        assert!(s.is_at_end());
        s.navigate(Navigation::First);
        assert!(s.is_at_start());
        s.navigate(Navigation::Last);
        assert_eq!(s.position(), Some(2));
    }

    #[test]
    fn test_empty_session() {
        let mut s = session(&[]);
        assert_eq!(s.position(), None);
        assert!(s.current().is_none());
        assert!(!s.navigate(Navigation::Next));
        assert!(!s.navigate(Navigation::Last));
        s.seek(5);
        assert_eq!(s.position(), None);
        s.navigate(Navigation::Quit);
        assert!(s.should_quit());
    }

    #[test]
    fn test_seek() {
        let mut s = session(&[1, 2, 3]);
        s.seek(10);
        assert_eq!(s.position(), Some(2));
        s.seek(1);
        assert_eq!(s.current_line(), Some(2));
    }

    #[test]
    fn test_compute_code_height() {
        assert_eq!(compute_code_height(3, 2), 0);
        assert_eq!(compute_code_height(5, 2), 1);
        // available 6, ideal floor(7 * 0.55) = 3, raised to the minimum
        assert_eq!(compute_code_height(10, 2), 6);
        // available 36, ideal floor(37 * 0.55) = 20
        assert_eq!(compute_code_height(40, 2), 20);
        assert_eq!(compute_code_height(24, 2), 11);
    }

    #[test]
    fn test_window_adjusts_minimally() {
        let mut window = SourceWindow::default();
        window.follow(Some(3), 5, 30);
        assert_eq!(window.top, 0);
        window.follow(Some(8), 5, 30);
        assert_eq!(window.top, 3);
        window.follow(Some(6), 5, 30);
        assert_eq!(window.top, 3);
        window.follow(Some(2), 5, 30);
        assert_eq!(window.top, 1);
        window.follow(Some(30), 5, 30);
        assert_eq!(window.top, 25);
        window.follow(None, 5, 30);
        assert_eq!(window.top, 25);
    }

    #[test]
    fn test_window_clamps_to_short_source() {
        let mut window = SourceWindow { top: 7 };
        window.follow(Some(2), 10, 4);
        assert_eq!(window.top, 0);
    }
}
