//! Transcript pane rendering

use crate::snapshot::Transcript;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Borders, List, ListItem, Padding, Paragraph},
    Frame,
};

fn line_style(line: &str) -> Style {
    if line.starts_with("Error:") {
        Style::default().fg(DEFAULT_THEME.error)
    } else if line.starts_with("Read ") || line == "Parsed an extern" {
        Style::default().fg(DEFAULT_THEME.success)
    } else {
        Style::default().fg(DEFAULT_THEME.fg)
    }
}

/// Render the transcript pane, showing only the first `visible_len` lines
pub fn render_transcript_pane(
    frame: &mut Frame,
    area: Rect,
    transcript: &Transcript,
    visible_len: usize,
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
        .title(" Transcript ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let lines = transcript.get_output(visible_len);

    if lines.is_empty() {
        let paragraph = Paragraph::new("(no output)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
    } else {
        let block = block.padding(Padding::new(1, 0, 0, 0));
        let all_items: Vec<ListItem> = lines
            .iter()
            .map(|line| ListItem::new(line.as_str()).style(line_style(line)))
            .collect();

        let total_items = all_items.len();
        let visible_height = area.height.saturating_sub(2).max(1) as usize; // Account for borders, min 1

        // Clamp scroll offset only if content exceeds visible area
        if total_items > visible_height {
            let max_scroll = total_items - visible_height;
            *scroll_offset = (*scroll_offset).min(max_scroll);
        } else {
            *scroll_offset = 0;
        }

        let visible_items: Vec<ListItem> = all_items
            .into_iter()
            .skip(*scroll_offset)
            .take(visible_height)
            .collect();

        frame.render_widget(List::new(visible_items).block(block), area);
    }
}
