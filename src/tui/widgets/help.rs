use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::Config;
use crate::utils::format_key_binding_for_display as key;

use super::popup_area;

pub fn render_help(f: &mut Frame, area: Rect, config: &Config) {
    let popup_area = popup_area(area, 60, 80);
    f.render_widget(Clear, popup_area);

    let paragraph = Paragraph::new(build_help_text(config))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help - Key Bindings")
                .title_alignment(Alignment::Center),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, popup_area);
}

pub fn build_help_text(config: &Config) -> String {
    let kb = &config.key_bindings;
    let mut text = String::new();

    text.push_str("Lists:\n");
    text.push_str(&format!("  {} / {}: Move selection\n", key(&kb.list_up), key(&kb.list_down)));
    text.push_str(&format!("  {}: Open selected\n", key(&kb.select)));
    text.push_str(&format!("  {}: Add\n", key(&kb.new)));
    text.push_str(&format!("  {}: Edit selected\n", key(&kb.edit)));
    text.push_str(&format!("  {}: Delete selected\n", key(&kb.delete)));
    text.push_str(&format!("  {}: Cycle maintenance category\n", key(&kb.filter)));
    text.push('\n');

    text.push_str("Garage and vehicle:\n");
    text.push_str(&format!("  {}: Maintenance history\n", key(&kb.maintenance)));
    text.push_str(&format!("  {}: Fuel log\n", key(&kb.fuel)));
    text.push_str(&format!("  {}: Add fill-up\n", key(&kb.add_fuel)));
    text.push_str(&format!("  {}: Reminders\n", key(&kb.reminders)));
    text.push_str(&format!("  {}: Nearby shops\n", key(&kb.shops)));
    text.push_str(&format!("  {}: Sign out\n", key(&kb.logout)));
    text.push('\n');

    text.push_str("Reminders:\n");
    text.push_str(&format!("  {}: Mark completed\n", key(&kb.complete)));
    text.push_str(&format!("  {}: Mark cancelled\n", key(&kb.cancel_reminder)));
    text.push_str(&format!("  {}: Switch on/off\n", key(&kb.toggle)));
    text.push('\n');

    text.push_str("Forms:\n");
    text.push_str("  Tab / Shift+Tab: Next / previous field\n");
    text.push_str("  Left / Right / Space: Change choice or toggle\n");
    text.push_str(&format!("  Enter or {}: Submit\n", key(&kb.save)));
    text.push_str("  PageUp / PageDown: Move through shop results\n");
    text.push('\n');

    text.push_str("General:\n");
    text.push_str(&format!("  {}: Back\n", key(&kb.back)));
    text.push_str(&format!("  {}: Quit (Ctrl+c anywhere)\n", key(&kb.quit)));
    text.push_str(&format!("  {}: Show/hide help\n", key(&kb.help)));

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_follows_configured_bindings() {
        let mut config = Config::default();
        config.key_bindings.complete = "z".to_string();
        let text = build_help_text(&config);
        assert!(text.contains("  z: Mark completed"));
        assert!(text.contains("  Esc: Back"));
    }
}
