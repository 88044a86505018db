//! Source code pane rendering with syntax highlighting
//!
//! Shows the Kaleidoscope program being stepped through. The line holding the
//! current unit is marked; a unit that failed is painted in the error color.
//!
//! Highlighting is a small character scanner, separate from the real lexer, so
//! that a line renders even when it would not tokenize.

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Simple syntax highlighting for Kaleidoscope source
fn highlight_source_code(line: &str) -> Line<'_> {
    let mut spans = Vec::new();
    let chars: Vec<(usize, char)> = line.char_indices().collect();
    let mut i = 0;

    while i < chars.len() {
        let (start, c) = chars[i];

        if c == '#' {
            spans.push(Span::styled(
                &line[start..],
                Style::default().fg(DEFAULT_THEME.comment),
            ));
            break;
        }

        if c.is_ascii_digit() || c == '.' {
            let mut end = i;
            while end < chars.len() && (chars[end].1.is_ascii_digit() || chars[end].1 == '.') {
                end += 1;
            }
            let stop = chars.get(end).map_or(line.len(), |&(pos, _)| pos);
            spans.push(Span::styled(
                &line[start..stop],
                Style::default().fg(DEFAULT_THEME.number),
            ));
            i = end;
            continue;
        }

        if c.is_alphabetic() {
            let mut end = i;
            while end < chars.len() && chars[end].1.is_alphanumeric() {
                end += 1;
            }
            let stop = chars.get(end).map_or(line.len(), |&(pos, _)| pos);
            let is_call = chars.get(end).is_some_and(|&(_, next)| next == '(');
            spans.push(Span::styled(
                &line[start..stop],
                get_keyword_style(&line[start..stop], is_call),
            ));
            i = end;
            continue;
        }

        let style = match c {
            '(' | ')' => Style::default().fg(DEFAULT_THEME.primary),
            _ => Style::default().fg(DEFAULT_THEME.fg),
        };
        let stop = chars.get(i + 1).map_or(line.len(), |&(pos, _)| pos);
        spans.push(Span::styled(&line[start..stop], style));
        i += 1;
    }

    Line::from(spans)
}

fn get_keyword_style(word: &str, is_function: bool) -> Style {
    match word {
        "def" | "extern" => Style::default()
            .fg(DEFAULT_THEME.keyword)
            .add_modifier(Modifier::BOLD),
        _ if is_function => Style::default().fg(DEFAULT_THEME.function),
        _ => Style::default().fg(DEFAULT_THEME.fg),
    }
}

/// Scroll state for the source pane
#[derive(Debug, Default)]
pub struct SourceScrollState {
    pub offset: usize,
    /// Visual row the current line is pinned to, set on first render
    pub target_line_row: Option<usize>,
}

/// Render the source code pane
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    source_code: &str,
    current_line: usize,
    is_error: bool,
    is_focused: bool,
    scroll_state: &mut SourceScrollState,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(" Source Code ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let lines: Vec<&str> = source_code.lines().collect();
    let total_lines = lines.len();

    let visible_height = area.height.saturating_sub(2).max(1) as usize; // Account for borders (2), min 1

    let target_row = scroll_state
        .target_line_row
        .unwrap_or(visible_height / 2)
        .min(visible_height.saturating_sub(1));
    scroll_state.target_line_row = Some(target_row);

    // Keep the current line at the target visual row
    if current_line > 0 && current_line <= total_lines {
        let target_line_idx = current_line - 1;
        scroll_state.offset = target_line_idx.saturating_sub(target_row);

        if total_lines > visible_height {
            let max_scroll = total_lines - visible_height;
            scroll_state.offset = scroll_state.offset.min(max_scroll);
        } else {
            scroll_state.offset = 0;
        }
    }

    let visible_lines: Vec<Line> = lines
        .iter()
        .enumerate()
        .skip(scroll_state.offset)
        .take(visible_height)
        .map(|(idx, line)| {
            let line_num = idx + 1;
            let is_current = line_num == current_line;
            let line_num_str = format!("{:4} ", line_num);

            let (num_style, content_base_style) = if is_current && is_error {
                (
                    Style::default()
                        .fg(DEFAULT_THEME.error)
                        .add_modifier(Modifier::BOLD),
                    Style::default()
                        .bg(DEFAULT_THEME.error)
                        .fg(ratatui::style::Color::White)
                        .add_modifier(Modifier::BOLD),
                )
            } else if is_current {
                (
                    Style::default()
                        .fg(DEFAULT_THEME.secondary)
                        .add_modifier(Modifier::BOLD),
                    Style::default().bg(DEFAULT_THEME.current_line_bg),
                )
            } else {
                (Style::default().fg(DEFAULT_THEME.comment), Style::default())
            };

            let mut content_line = highlight_source_code(line);

            if is_current && is_error {
                for span in &mut content_line.spans {
                    span.style = content_base_style;
                }
            } else if is_current {
                for span in &mut content_line.spans {
                    span.style = span.style.patch(content_base_style);
                }
            }

            let mut final_spans = vec![Span::styled(line_num_str, num_style)];
            final_spans.extend(content_line.spans);

            Line::from(final_spans)
        })
        .collect();

    let paragraph = Paragraph::new(visible_lines).block(block);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pieces(line: &str) -> Vec<String> {
        highlight_source_code(line)
            .spans
            .iter()
            .map(|span| span.content.to_string())
            .collect()
    }

    #[test]
    fn test_highlight_splits_tokens() {
        assert_eq!(
            pieces("def foo(x) x*2.5"),
            vec!["def", " ", "foo", "(", "x", ")", " ", "x", "*", "2.5"]
        );
    }

    #[test]
    fn test_highlight_comment_runs_to_end() {
        let line = highlight_source_code("1 # def foo");
        let last = line.spans.last().unwrap();
        assert_eq!(last.content, "# def foo");
        assert_eq!(last.style.fg, Some(DEFAULT_THEME.comment));
    }

    #[test]
    fn test_keyword_and_call_styles() {
        let line = highlight_source_code("extern sin(a); sin (a)");
        assert_eq!(line.spans[0].style.fg, Some(DEFAULT_THEME.keyword));
        assert_eq!(line.spans[2].content, "sin");
        assert_eq!(line.spans[2].style.fg, Some(DEFAULT_THEME.function));

        // Only a directly following '(' marks a call.
        let spaced = line.spans.iter().rev().find(|s| s.content == "sin").unwrap();
        assert_eq!(spaced.style.fg, Some(DEFAULT_THEME.fg));
    }
}
