//! Locals pane rendering
//!
//! One `name = repr` line per local of the current step, in name order.
//! Reprs that failed render as their `<repr error: ...>` placeholder in the
//! error color.

use crate::snapshot::StepRecord;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Lines shown for `step`: the locals, or a placeholder
pub fn locals_lines(step: Option<&StepRecord>) -> Vec<Line<'static>> {
    let placeholder = |text: &'static str| {
        vec![Line::from(Span::styled(
            text,
            Style::default().fg(DEFAULT_THEME.comment),
        ))]
    };

    let Some(step) = step else {
        return placeholder("<no steps>");
    };
    if step.locals.is_empty() {
        return placeholder("<no locals>");
    }

    step.locals
        .iter()
        .map(|(name, value)| {
            let value_style = if value.repr.is_ok() {
                Style::default().fg(DEFAULT_THEME.fg)
            } else {
                Style::default().fg(DEFAULT_THEME.error)
            };
            Line::from(vec![
                Span::styled(name.clone(), Style::default().fg(DEFAULT_THEME.name)),
                Span::styled(" = ", Style::default().fg(DEFAULT_THEME.comment)),
                Span::styled(value.text(), value_style),
            ])
        })
        .collect()
}

/// Render the locals pane
pub fn render_locals_pane(frame: &mut Frame, area: Rect, step: Option<&StepRecord>) {
    let title = match step {
        Some(step) => format!(" Locals ({}) ", step.function),
        None => " Locals ".to_string(),
    };
    let block = Block::default()
        .title(Span::styled(
            title,
            Style::default()
                .fg(DEFAULT_THEME.primary)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::TOP)
        .border_style(Style::default().fg(DEFAULT_THEME.border_normal));

    frame.render_widget(Paragraph::new(locals_lines(step)).block(block), area);
}
