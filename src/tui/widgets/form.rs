use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::navigation::Screen;
use crate::viewmodel::{FieldKind, FieldView};

use super::truncate;

/// Fields, inline errors and trailing links; `focus` counts fields then links
pub fn render_form(
    f: &mut Frame,
    area: Rect,
    title: &str,
    fields: &[FieldView],
    links: &[(&'static str, Screen)],
    focus: usize,
) {
    let max_width = area.width.saturating_sub(2) as usize;
    let mut lines = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        let focused = index == focus;
        let style = if focused {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(truncate(&field_line(field, focused), max_width), style)));
        if let Some(error) = &field.error {
            lines.push(Line::from(Span::styled(
                truncate(&format!("    {}", error), max_width),
                Style::default().fg(Color::Red),
            )));
        }
    }

    if !links.is_empty() {
        lines.push(Line::from(""));
        for (index, (label, _)) in links.iter().enumerate() {
            let focused = fields.len() + index == focus;
            let marker = if focused { "> " } else { "  " };
            let style = if focused {
                Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default().add_modifier(Modifier::UNDERLINED)
            };
            lines.push(Line::from(vec![Span::raw(marker), Span::styled(*label, style)]));
        }
    }

    let paragraph = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title.to_string()));
    f.render_widget(paragraph, area);
}

/// One form row as text
pub fn field_line(field: &FieldView, focused: bool) -> String {
    let marker = if focused { "> " } else { "  " };
    let value = match &field.kind {
        FieldKind::Text => field.value.clone(),
        FieldKind::Secret => "*".repeat(field.value.chars().count()),
        FieldKind::Toggle => {
            if field.value == "true" {
                "[x]".to_string()
            } else {
                "[ ]".to_string()
            }
        }
        FieldKind::Choice { .. } => format!("< {} >", field.value),
    };
    let cursor = if focused && matches!(field.kind, FieldKind::Text | FieldKind::Secret) {
        "_"
    } else {
        ""
    };
    format!("{}{}: {}{}", marker, field.label, value, cursor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_are_masked() {
        let field = FieldView::secret("Password", "hunter2", &None);
        assert_eq!(field_line(&field, false), "  Password: *******");
        assert_eq!(field_line(&field, true), "> Password: *******_");
    }

    #[test]
    fn toggles_and_choices_render_as_controls() {
        assert_eq!(field_line(&FieldView::toggle("Active", true, &None), false), "  Active: [x]");
        let choice = FieldView::choice("Vehicle", "Panda", vec!["Panda".into()], &None);
        assert_eq!(field_line(&choice, true), "> Vehicle: < Panda >");
    }
}
