//! IR module pane rendering

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Padding, Paragraph},
    Frame,
};

const DELIMITERS: &[char] = &[' ', '(', ')', ',', '='];

fn segment_style(segment: &str) -> Style {
    match segment {
        "define" | "declare" | "source_filename" => Style::default()
            .fg(DEFAULT_THEME.keyword)
            .add_modifier(Modifier::BOLD),
        "fadd" | "fsub" | "fmul" | "call" | "ret" | "double" => {
            Style::default().fg(DEFAULT_THEME.keyword)
        }
        s if s.starts_with('%') => Style::default().fg(DEFAULT_THEME.register),
        s if s.starts_with('@') => Style::default().fg(DEFAULT_THEME.function),
        s if s.ends_with(':') => Style::default().fg(DEFAULT_THEME.primary),
        s if s.starts_with(|c: char| c.is_ascii_digit() || c == '-') => {
            Style::default().fg(DEFAULT_THEME.number)
        }
        _ => Style::default().fg(DEFAULT_THEME.fg),
    }
}

/// Highlight one line of printed IR
fn highlight_ir(line: &str) -> Line<'_> {
    if line.starts_with(';') {
        return Line::from(Span::styled(line, Style::default().fg(DEFAULT_THEME.comment)));
    }

    let mut spans = Vec::new();
    let mut rest = line;
    while !rest.is_empty() {
        let split = rest.find(DELIMITERS).unwrap_or(rest.len());
        if split == 0 {
            let (delim, tail) = rest.split_at(1);
            spans.push(Span::styled(delim, Style::default().fg(DEFAULT_THEME.fg)));
            rest = tail;
        } else {
            let (word, tail) = rest.split_at(split);
            spans.push(Span::styled(word, segment_style(word)));
            rest = tail;
        }
    }
    Line::from(spans)
}

/// Render the module pane
pub fn render_module_pane(
    frame: &mut Frame,
    area: Rect,
    module_ir: &str,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(" Module IR ")
        .borders(Borders::ALL)
        .border_style(border_style)
        .padding(Padding::new(1, 0, 0, 0));

    let lines: Vec<&str> = module_ir.lines().collect();
    let visible_height = area.height.saturating_sub(2).max(1) as usize;

    if lines.len() > visible_height {
        *scroll_offset = (*scroll_offset).min(lines.len() - visible_height);
    } else {
        *scroll_offset = 0;
    }

    let visible: Vec<Line> = lines
        .iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .map(|line| highlight_ir(line))
        .collect();

    frame.render_widget(Paragraph::new(visible).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_instruction() {
        let line = highlight_ir("  %addtmp = fadd double %x, 1.000000e+00");
        let styled: Vec<(&str, Style)> = line
            .spans
            .iter()
            .filter(|s| !s.content.trim().is_empty() && s.content != "," && s.content != "=")
            .map(|s| (&*s.content, s.style))
            .collect();

        assert_eq!(styled[0], ("%addtmp", segment_style("%addtmp")));
        assert_eq!(styled[1].0, "fadd");
        assert_eq!(styled[3].1.fg, Some(DEFAULT_THEME.register));
        assert_eq!(styled[4].1.fg, Some(DEFAULT_THEME.number));
    }

    #[test]
    fn test_header_is_comment() {
        let line = highlight_ir("; ModuleID = 'my cool jit'");
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].style.fg, Some(DEFAULT_THEME.comment));
    }

    #[test]
    fn test_function_names() {
        let line = highlight_ir("declare double @sin(double)");
        let sin = line.spans.iter().find(|s| s.content == "@sin").unwrap();
        assert_eq!(sin.style.fg, Some(DEFAULT_THEME.function));
    }
}
