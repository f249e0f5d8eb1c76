use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use super::popup_area;

pub fn render_confirm_delete(f: &mut Frame, area: Rect, label: &str) {
    let popup_area = popup_area(area, 50, 35);
    f.render_widget(Clear, popup_area);

    let lines = vec![
        Line::from("Delete this entry?"),
        Line::from(""),
        Line::from(label.trim().to_string()),
        Line::from(""),
        Line::from("y / Enter: Delete    n / Esc: Keep"),
    ];
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Confirm Delete")
                .title_alignment(Alignment::Center),
        )
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);
    f.render_widget(paragraph, popup_area);
}
