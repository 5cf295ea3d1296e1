//! Title bar rendering with keybindings and state indicators

use crate::snapshot::Outcome;
use crate::ui::theme::DEFAULT_THEME;
use crate::viewer::Session;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

pub const TITLE: &str = "Python Code Visualizer";

/// `Step k/N`, or `Step 0/0` for an empty trace
pub fn step_counter(session: &Session) -> String {
    match session.position() {
        Some(position) => format!("Step {}/{}", position + 1, session.len()),
        None => "Step 0/0".to_string(),
    }
}

/// Render the two header rows: title and step counter, then key help
pub fn render_title_bar(
    frame: &mut Frame,
    area: Rect,
    session: &Session,
    message: &str,
    is_playing: bool,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    let bar_style = Style::default().bg(DEFAULT_THEME.current_line_bg);
    let counter_bg = if session.trace().outcome == Outcome::Completed {
        DEFAULT_THEME.primary
    } else {
        DEFAULT_THEME.error
    };

    let counter = step_counter(session);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(counter.chars().count() as u16 + 2),
        ])
        .split(rows[0]);

    let title = Paragraph::new(Line::from(Span::styled(
        format!(" {} ", TITLE),
        Style::default()
            .fg(DEFAULT_THEME.fg)
            .add_modifier(Modifier::BOLD),
    )))
    .style(bar_style);
    frame.render_widget(title, columns[0]);

    let counter = Paragraph::new(Line::from(Span::styled(
        format!(" {} ", counter),
        Style::default()
            .bg(counter_bg)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Right)
    .style(bar_style);
    frame.render_widget(counter, columns[1]);

    // Keybinds with visual grouping
    let key_style = Style::default().bg(DEFAULT_THEME.comment).fg(Color::Black);
    let desc_style = Style::default().fg(DEFAULT_THEME.fg);
    let sep_style = Style::default().fg(DEFAULT_THEME.comment);

    let mut spans = vec![
        Span::styled(" n/→ ", key_style),
        Span::styled(" next ", desc_style),
        Span::styled("│", sep_style),
        Span::styled(" p/← ", key_style),
        Span::styled(" prev ", desc_style),
        Span::styled("│", sep_style),
        Span::styled(" ⌫ / ↵ ", key_style),
        Span::styled(" start/end ", desc_style),
        Span::styled("│", sep_style),
        Span::styled(" ⎵ ", key_style),
        Span::styled(" play ", desc_style),
        Span::styled("│", sep_style),
        Span::styled(" q ", key_style),
        Span::styled(" quit ", desc_style),
    ];

    let indicator = if is_playing {
        Some((" ▶ PLAYING ", DEFAULT_THEME.secondary))
    } else if session.is_empty() {
        None
    } else if session.is_at_end() {
        Some((" END ", DEFAULT_THEME.error))
    } else if session.is_at_start() {
        Some((" START ", DEFAULT_THEME.success))
    } else {
        None
    };
    if let Some((label, color)) = indicator {
        spans.push(Span::styled("│", sep_style));
        spans.push(Span::styled(
            label,
            Style::default()
                .bg(color)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ));
    }
    if !message.is_empty() {
        spans.push(Span::styled(format!("  {}", message), sep_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), rows[1]);
}
