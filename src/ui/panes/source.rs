//! Source code pane rendering with syntax highlighting
//!
//! This module renders the code window of the terminal viewer: the slice of
//! the source starting at the window's top line, with line numbers and the
//! current step's line highlighted.
//!
//! # Rendering
//!
//! The pane uses a simple character-by-character tokenizer to apply syntax
//! highlighting styles without requiring the full lexer, so lines that do
//! not tokenize (the source of a syntax error, for instance) still render.

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Simple syntax highlighting for Python source
pub fn highlight_source_code(line: &str) -> Line<'static> {
    let mut spans = Vec::new();
    let mut current_word = String::new();

    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        // Comments run to the end of the line
        if c == '#' {
            flush_word(&mut spans, &mut current_word, false);
            spans.push(Span::styled(
                chars[i..].iter().collect::<String>(),
                Style::default().fg(DEFAULT_THEME.comment),
            ));
            break;
        }

        if c == '"' || c == '\'' {
            // String prefixes (r, f, ...) are styled with their literal
            let mut literal = String::new();
            if is_string_prefix(&current_word) {
                literal = std::mem::take(&mut current_word);
            } else {
                flush_word(&mut spans, &mut current_word, false);
            }

            let end = string_end(&chars, i);
            literal.extend(&chars[i..end]);
            spans.push(Span::styled(
                literal,
                Style::default().fg(DEFAULT_THEME.string),
            ));
            i = end;
            continue;
        }

        if !c.is_alphanumeric() && c != '_' {
            if !current_word.is_empty() {
                let is_call = c == '(';
                flush_word(&mut spans, &mut current_word, is_call);
            }

            let style = match c {
                '(' | ')' | '[' | ']' | '{' | '}' => Style::default().fg(DEFAULT_THEME.primary),
                _ => Style::default().fg(DEFAULT_THEME.fg),
            };
            spans.push(Span::styled(c.to_string(), style));
            i += 1;
            continue;
        }

        current_word.push(c);
        i += 1;
    }

    flush_word(&mut spans, &mut current_word, false);
    Line::from(spans)
}

/// Index just past the string literal opening at `start`, or the line end
fn string_end(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let triple = chars.len() >= start + 3 && chars[start + 1] == quote && chars[start + 2] == quote;

    let mut end = if triple { start + 3 } else { start + 1 };
    while end < chars.len() {
        if chars[end] == '\\' {
            end += 2;
            continue;
        }
        if chars[end] == quote {
            if !triple {
                return end + 1;
            }
            if chars.len() >= end + 3 && chars[end + 1] == quote && chars[end + 2] == quote {
                return end + 3;
            }
        }
        end += 1;
    }
    chars.len()
}

fn is_string_prefix(word: &str) -> bool {
    !word.is_empty()
        && word.len() <= 2
        && word.chars().all(|c| matches!(c.to_ascii_lowercase(), 'r' | 'f' | 'b' | 'u'))
}

fn flush_word(spans: &mut Vec<Span<'static>>, word: &mut String, is_call: bool) {
    if word.is_empty() {
        return;
    }
    let style = get_keyword_style(word, is_call);
    spans.push(Span::styled(std::mem::take(word), style));
}

fn get_keyword_style(word: &str, is_function: bool) -> Style {
    match word {
        "def" | "return" | "if" | "elif" | "else" | "while" | "for" | "in" | "not" | "and"
        | "or" | "is" | "try" | "except" | "finally" | "raise" | "import" | "from" | "as"
        | "global" | "del" | "pass" | "break" | "continue" | "assert" => Style::default()
            .fg(DEFAULT_THEME.keyword)
            .add_modifier(Modifier::BOLD),
        "None" | "True" | "False" => Style::default().fg(DEFAULT_THEME.number),
        _ if word.starts_with(|c: char| c.is_ascii_digit()) => {
            Style::default().fg(DEFAULT_THEME.number)
        }
        _ => {
            if is_function {
                Style::default().fg(DEFAULT_THEME.function)
            } else {
                Style::default().fg(DEFAULT_THEME.fg)
            }
        }
    }
}

/// Render the code window: `height` lines starting at 0-based `top`
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    lines: &[&str],
    current_line: Option<usize>,
    top: usize,
) {
    let visible_lines: Vec<Line> = lines
        .iter()
        .enumerate()
        .skip(top)
        .take(area.height as usize)
        .map(|(idx, line)| {
            let line_num = idx + 1;
            let is_current = Some(line_num) == current_line;
            let line_num_str = format!("{:>4} ", line_num);

            let mut content_line = highlight_source_code(line);
            let num_style = if is_current {
                for span in &mut content_line.spans {
                    span.style = span
                        .style
                        .patch(Style::default().bg(DEFAULT_THEME.current_line_bg))
                        .add_modifier(Modifier::REVERSED);
                }
                Style::default()
                    .fg(DEFAULT_THEME.secondary)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                Style::default().fg(DEFAULT_THEME.comment)
            };

            let mut final_spans = vec![Span::styled(line_num_str, num_style)];
            final_spans.extend(content_line.spans);
            Line::from(final_spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(visible_lines), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(line: &Line) -> Vec<String> {
        line.spans.iter().map(|s| s.content.to_string()).collect()
    }

    #[test]
    fn test_highlight_keeps_text() {
        let source = "for i in range(3):  # loop";
        let line = highlight_source_code(source);
        assert_eq!(texts(&line).concat(), source);
        assert_eq!(line.spans.last().map(|s| s.style.fg), Some(Some(DEFAULT_THEME.comment)));
    }

    #[test]
    fn test_highlight_string_literals() {
        let line = highlight_source_code("s = f'a # b' + \"c\"");
        let parts = texts(&line);
        assert!(parts.contains(&"f'a # b'".to_string()));
        assert!(parts.contains(&"\"c\"".to_string()));
        assert_eq!(parts.concat(), "s = f'a # b' + \"c\"");
    }

    #[test]
    fn test_highlight_triple_quotes_and_unicode() {
        let source = "x = '''é'''";
        assert_eq!(texts(&highlight_source_code(source)).concat(), source);
        let unterminated = "y = 'abc";
        assert_eq!(texts(&highlight_source_code(unterminated)).concat(), unterminated);
    }

    #[test]
    fn test_keyword_styles() {
        assert!(get_keyword_style("def", false).add_modifier.contains(Modifier::BOLD));
        assert_eq!(get_keyword_style("print", true).fg, Some(DEFAULT_THEME.function));
        assert_eq!(get_keyword_style("42", false).fg, Some(DEFAULT_THEME.number));
    }
}
