use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout as RatLayout};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::config::KeyBindings;
use crate::tui::app::ScreenModel;
use crate::tui::widgets::{
    confirm_delete::render_confirm_delete, form::render_form, help::render_help, list::render_list,
    status_bar::render_status_bar,
};
use crate::tui::{App, Layout};
use crate::utils::format_key_binding_for_display as key;

pub fn render(f: &mut Frame, app: &App, layout: &Layout) {
    let title = match app.ctx.current_user() {
        Some(user) => format!("garagebook - {} - {}", app.current_screen().title(), user.email),
        None => format!("garagebook - {}", app.current_screen().title()),
    };
    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_alignment(Alignment::Center);
    f.render_widget(outer_block, f.area());

    let screen_title = app.current_screen().title();
    let area = layout.main_area;
    match &app.screen {
        ScreenModel::VehicleDetail(vm) => {
            let name = vm.state().vehicle.as_ref().map(|v| v.name.clone()).unwrap_or_default();
            let paragraph = Paragraph::new(vm.lines().join("\n"))
                .block(Block::default().borders(Borders::ALL).title(name))
                .wrap(Wrap { trim: false });
            f.render_widget(paragraph, area);
        }
        ScreenModel::NearbyShops(vm) => {
            let fields = app.form_fields();
            // 2 borders per box plus error lines
            let form_height = fields.len() as u16 + 2 + fields.iter().filter(|f| f.error.is_some()).count() as u16;
            let chunks = RatLayout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(form_height), Constraint::Min(3)])
                .split(area);
            render_form(f, chunks[0], screen_title, &fields, &[], app.focus.index);
            render_list(f, chunks[1], "Results", vm);
        }
        screen => {
            if let Some(form) = screen.form() {
                render_form(f, area, screen_title, &form.fields(), &form.links(), app.focus.index);
            } else if let Some(list) = screen.list() {
                render_list(f, area, screen_title, list);
            }
        }
    }

    render_status_bar(
        f,
        layout.status_area,
        app.status.message.as_ref(),
        &key_hints(&app.screen, &app.config.key_bindings),
    );

    if let Some(pending) = &app.pending_delete {
        render_confirm_delete(f, f.area(), &pending.label);
    }
    if app.show_help {
        render_help(f, f.area(), &app.config);
    }
}

/// Status bar hints for the keys the current screen reacts to
pub fn key_hints(screen: &ScreenModel, kb: &KeyBindings) -> Vec<String> {
    let hint = |binding: &str, label: &str| format!("{}: {}", key(binding), label);
    let mut hints = match screen {
        ScreenModel::Garage(_) => vec![
            hint(&kb.select, "Open"),
            hint(&kb.new, "Add"),
            hint(&kb.edit, "Edit"),
            hint(&kb.delete, "Delete"),
            hint(&kb.reminders, "Reminders"),
            hint(&kb.shops, "Shops"),
            hint(&kb.logout, "Sign out"),
            hint(&kb.quit, "Quit"),
        ],
        ScreenModel::VehicleDetail(_) => vec![
            hint(&kb.maintenance, "Maintenance"),
            hint(&kb.fuel, "Fuel"),
            hint(&kb.new, "Add service"),
            hint(&kb.add_fuel, "Add fill-up"),
            hint(&kb.reminders, "Add reminder"),
            hint(&kb.edit, "Edit"),
        ],
        ScreenModel::MaintenanceList(_) => vec![
            hint(&kb.new, "Add"),
            hint(&kb.edit, "Edit"),
            hint(&kb.delete, "Delete"),
            hint(&kb.filter, "Category"),
        ],
        ScreenModel::FuelLogs(_) => vec![hint(&kb.new, "Add"), hint(&kb.edit, "Edit"), hint(&kb.delete, "Delete")],
        ScreenModel::Reminders(_) => vec![
            hint(&kb.new, "Add"),
            hint(&kb.edit, "Edit"),
            hint(&kb.complete, "Complete"),
            hint(&kb.cancel_reminder, "Cancel"),
            hint(&kb.toggle, "On/off"),
            hint(&kb.delete, "Delete"),
        ],
        ScreenModel::NearbyShops(_) => vec![
            "Tab: Next field".to_string(),
            hint("Enter", "Search"),
            "PgUp/PgDn: Results".to_string(),
        ],
        _ => vec!["Tab: Next field".to_string(), hint(&kb.save, "Submit")],
    };
    hints.push(hint(&kb.back, "Back"));
    hints.push(hint(&kb.help, "Help"));
    hints
}
