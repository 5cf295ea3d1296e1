//! Output pane rendering

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// The last `height` lines of `output`, or `<no output>`
pub fn output_tail(output: &str, height: usize) -> Vec<&str> {
    if output.is_empty() {
        return vec!["<no output>"];
    }
    let lines: Vec<&str> = output.lines().collect();
    let start = lines.len().saturating_sub(height);
    lines[start..].to_vec()
}

/// Render the output pane.
///
/// The whole trace output is shown at every step; it is the program's
/// output as a whole, not per step.
pub fn render_output_pane(frame: &mut Frame, area: Rect, output: &str, is_error: bool) {
    let block = Block::default()
        .title(Span::styled(
            " Output ",
            Style::default()
                .fg(DEFAULT_THEME.primary)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::TOP)
        .border_style(Style::default().fg(DEFAULT_THEME.border_normal));

    let height = area.height.saturating_sub(1) as usize;
    let style = if output.is_empty() {
        Style::default().fg(DEFAULT_THEME.comment)
    } else {
        Style::default().fg(DEFAULT_THEME.fg)
    };
    let tail = output_tail(output, height);
    let last = tail.len().saturating_sub(1);

    let lines: Vec<Line> = tail
        .into_iter()
        .enumerate()
        .map(|(idx, line)| {
            // The error message, when there is one, is the last line
            let line_style = if is_error && idx == last {
                Style::default().fg(DEFAULT_THEME.error)
            } else {
                style
            };
            Line::from(Span::styled(line.to_string(), line_style))
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_tail() {
        assert_eq!(output_tail("", 5), vec!["<no output>"]);
        assert_eq!(output_tail("a\nb\nc", 2), vec!["b", "c"]);
        assert_eq!(output_tail("a\nb", 10), vec!["a", "b"]);
        assert!(output_tail("a\nb", 0).is_empty());
    }
}
