use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{
    Block, Borders, List, ListItem, ListState, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
};

use crate::viewmodel::ListModel;

use super::truncate;

/// Summary lines above a selectable list with a scrollbar
pub fn render_list(f: &mut Frame, area: Rect, title: &str, model: &dyn ListModel) {
    let summary = model.summary();
    let rows = model.rows();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(summary.len() as u16), Constraint::Min(1)])
        .split(area);

    if !summary.is_empty() {
        f.render_widget(Paragraph::new(summary.join("\n")), chunks[0]);
    }

    let block = Block::default().borders(Borders::ALL).title(format!("{} ({})", title, rows.len()));
    if rows.is_empty() {
        f.render_widget(Paragraph::new(model.empty_text()).block(block), chunks[1]);
        return;
    }

    // 2 for borders, 2 for the highlight symbol
    let max_width = chunks[1].width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = rows.iter().map(|row| ListItem::new(truncate(row, max_width))).collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(model.selected().min(rows.len() - 1)));
    f.render_stateful_widget(list, chunks[1], &mut state);

    let visible = chunks[1].height.saturating_sub(2) as usize;
    if rows.len() > visible {
        let mut scrollbar_state = ScrollbarState::new(rows.len()).position(model.selected());
        f.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            chunks[1],
            &mut scrollbar_state,
        );
    }
}
