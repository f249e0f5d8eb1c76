use std::io;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode, size as terminal_size,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::config::KeyBindings;
use crate::navigation::{NavIntent, Screen};
use crate::tui::App;
use crate::tui::app::{PendingDelete, ScreenModel};
use crate::tui::error::TuiError;
use crate::tui::layout::Layout;
use crate::utils::{has_primary_modifier, parse_key_binding};
use crate::viewmodel::FieldKind;
use crate::viewmodel::fuel::FuelIntent;
use crate::viewmodel::garage::GarageIntent;
use crate::viewmodel::maintenance_list::MaintenanceListIntent;
use crate::viewmodel::reminders::RemindersIntent;
use crate::viewmodel::shops::NearbyShopsIntent;
use crate::viewmodel::vehicle_detail::VehicleDetailIntent;

/// Guard that ensures terminal state is restored even on panic
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self {
            raw_mode_enabled: true,
            alternate_screen_enabled: true,
        })
    }

    /// Restore the terminal now; the guard then does nothing on drop
    fn restore(&mut self) -> Result<(), TuiError> {
        if self.raw_mode_enabled {
            disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        if self.alternate_screen_enabled {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate_screen_enabled = false;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Already cleaning up, errors have nowhere to go
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

pub fn run_event_loop(mut app: App) -> Result<(), TuiError> {
    let (width, height) = terminal_size()?;
    if width < Layout::MIN_WIDTH || height < Layout::MIN_HEIGHT {
        return Err(TuiError::TooSmall {
            width,
            height,
            min_width: Layout::MIN_WIDTH,
            min_height: Layout::MIN_HEIGHT,
        });
    }

    let mut guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    loop {
        app.check_status_message_timeout();
        app.drain_notifications();

        terminal.draw(|f| {
            let layout = Layout::calculate(f.area());
            crate::tui::render::render(f, &app, &layout);
        })?;

        if event::poll(std::time::Duration::from_millis(50))? {
            // Only Press events, Windows also reports Release
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press && handle_key_event(&mut app, key_event)? {
                    break;
                }
            }
        }
    }

    app.shutdown();
    guard.restore()?;
    Ok(())
}

fn matches(binding: &str, key: &KeyEvent) -> bool {
    parse_key_binding(binding).map(|b| b.matches(key)).unwrap_or(false)
}

/// Returns `true` when the user asked to quit
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Result<bool, TuiError> {
    if key.code == KeyCode::Char('c') && has_primary_modifier(key.modifiers) {
        return Ok(true);
    }

    if app.show_help {
        app.show_help = false;
        return Ok(false);
    }

    if app.pending_delete.is_some() {
        handle_delete_confirmation(app, key);
        app.process_events();
        return Ok(false);
    }

    let bindings = app.config.key_bindings.clone();
    if matches(&bindings.help, &key) {
        app.show_help = true;
        return Ok(false);
    }
    if matches(&bindings.back, &key) {
        app.navigate(NavIntent::Back);
        app.process_events();
        return Ok(false);
    }

    let quit = if app.screen.form().is_some() {
        handle_form_key(app, &bindings, key);
        false
    } else {
        handle_screen_key(app, &bindings, key)
    };
    app.process_events();
    Ok(quit)
}

fn handle_delete_confirmation(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => {
            app.pending_delete = None;
            let App { screen, ctx, .. } = app;
            match screen {
                ScreenModel::Garage(vm) => vm.dispatch(ctx, GarageIntent::Delete),
                ScreenModel::MaintenanceList(vm) => vm.dispatch(ctx, MaintenanceListIntent::Delete),
                ScreenModel::FuelLogs(vm) => vm.dispatch(ctx, FuelIntent::Delete),
                ScreenModel::Reminders(vm) => vm.dispatch(ctx, RemindersIntent::Delete),
                _ => {}
            }
        }
        KeyCode::Char('n') | KeyCode::Esc => app.pending_delete = None,
        _ => {}
    }
}

fn confirm_delete(app: &mut App) {
    if let Some(label) = app.selected_row() {
        app.pending_delete = Some(PendingDelete { label });
    }
}

/// Keys for list and detail screens
fn handle_screen_key(app: &mut App, kb: &KeyBindings, key: KeyEvent) -> bool {
    if matches(&kb.quit, &key) {
        return true;
    }
    if matches(&kb.delete, &key) && app.screen.list().is_some() {
        confirm_delete(app);
        return false;
    }

    let up = matches(&kb.list_up, &key) || key.code == KeyCode::Up;
    let down = matches(&kb.list_down, &key) || key.code == KeyCode::Down;
    let is = |binding: &str| matches(binding, &key);

    let App { screen, ctx, .. } = app;
    match screen {
        ScreenModel::Garage(vm) => {
            let intent = if up {
                GarageIntent::SelectPrev
            } else if down {
                GarageIntent::SelectNext
            } else if is(&kb.select) {
                GarageIntent::Open
            } else if is(&kb.new) {
                GarageIntent::Add
            } else if is(&kb.edit) {
                GarageIntent::Edit
            } else if is(&kb.reminders) {
                GarageIntent::OpenReminders
            } else if is(&kb.shops) {
                GarageIntent::OpenShops
            } else if is(&kb.logout) {
                GarageIntent::SignOut
            } else {
                return false;
            };
            vm.dispatch(ctx, intent);
        }
        ScreenModel::VehicleDetail(vm) => {
            let intent = if is(&kb.maintenance) || is(&kb.select) {
                VehicleDetailIntent::OpenMaintenance
            } else if is(&kb.fuel) {
                VehicleDetailIntent::OpenFuel
            } else if is(&kb.new) {
                VehicleDetailIntent::AddMaintenance
            } else if is(&kb.add_fuel) {
                VehicleDetailIntent::AddFuel
            } else if is(&kb.reminders) {
                VehicleDetailIntent::AddReminder
            } else if is(&kb.edit) {
                VehicleDetailIntent::Edit
            } else {
                return false;
            };
            vm.dispatch(ctx, intent);
        }
        ScreenModel::MaintenanceList(vm) => {
            let intent = if up {
                MaintenanceListIntent::SelectPrev
            } else if down {
                MaintenanceListIntent::SelectNext
            } else if is(&kb.new) {
                MaintenanceListIntent::Add
            } else if is(&kb.edit) || is(&kb.select) {
                MaintenanceListIntent::Edit
            } else if is(&kb.filter) {
                MaintenanceListIntent::CycleCategory
            } else {
                return false;
            };
            vm.dispatch(ctx, intent);
        }
        ScreenModel::FuelLogs(vm) => {
            let intent = if up {
                FuelIntent::SelectPrev
            } else if down {
                FuelIntent::SelectNext
            } else if is(&kb.new) {
                FuelIntent::Add
            } else if is(&kb.edit) || is(&kb.select) {
                FuelIntent::Edit
            } else {
                return false;
            };
            vm.dispatch(ctx, intent);
        }
        ScreenModel::Reminders(vm) => {
            let intent = if up {
                RemindersIntent::SelectPrev
            } else if down {
                RemindersIntent::SelectNext
            } else if is(&kb.new) {
                RemindersIntent::Add
            } else if is(&kb.edit) || is(&kb.select) {
                RemindersIntent::Edit
            } else if is(&kb.complete) {
                RemindersIntent::Complete
            } else if is(&kb.cancel_reminder) {
                RemindersIntent::Cancel
            } else if is(&kb.toggle) {
                RemindersIntent::ToggleActive
            } else {
                return false;
            };
            vm.dispatch(ctx, intent);
        }
        _ => {}
    }
    false
}

/// Typing, focus movement and submit for form screens
fn handle_form_key(app: &mut App, kb: &KeyBindings, key: KeyEvent) {
    if let Some(target) = edit_form(app, kb, key) {
        app.navigate(NavIntent::NavigateTo(target));
    }
}

/// Applies `key` to the focused form; returns a link target when one was chosen
fn edit_form(app: &mut App, kb: &KeyBindings, key: KeyEvent) -> Option<Screen> {
    let App { screen, ctx, focus, .. } = app;

    if let ScreenModel::NearbyShops(vm) = screen {
        match key.code {
            KeyCode::PageDown => {
                vm.dispatch(ctx, NearbyShopsIntent::SelectNext);
                return None;
            }
            KeyCode::PageUp => {
                vm.dispatch(ctx, NearbyShopsIntent::SelectPrev);
                return None;
            }
            _ => {}
        }
    }

    let form = screen.form_mut()?;
    let fields = form.fields();
    let links = form.links();
    let total = fields.len() + links.len();

    if matches(&kb.save, &key) {
        form.submit(ctx);
        return None;
    }

    match key.code {
        KeyCode::Tab | KeyCode::Down => {
            focus.index = if total == 0 { 0 } else { (focus.index + 1) % total };
        }
        KeyCode::BackTab | KeyCode::Up => {
            focus.index = if total == 0 { 0 } else { (focus.index + total - 1) % total };
        }
        KeyCode::Enter => match focus.index.checked_sub(fields.len()) {
            Some(link) => return links.into_iter().nth(link).map(|(_, target)| target),
            None => form.submit(ctx),
        },
        _ => {
            let field = fields.get(focus.index)?;
            if let Some(value) = edit_value(&field.kind, &field.value, key) {
                form.set_field(focus.index, value);
            }
        }
    }
    None
}

/// New value for a field after `key`, or `None` when the key does not edit it
pub fn edit_value(kind: &FieldKind, value: &str, key: KeyEvent) -> Option<String> {
    let typed = !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
    match kind {
        FieldKind::Text | FieldKind::Secret => match key.code {
            KeyCode::Char(c) if typed => Some(format!("{}{}", value, c)),
            KeyCode::Backspace => {
                let mut chars = value.chars();
                chars.next_back();
                Some(chars.as_str().to_string())
            }
            _ => None,
        },
        FieldKind::Toggle => match key.code {
            KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right => Some((value != "true").to_string()),
            _ => None,
        },
        FieldKind::Choice { options } => {
            if options.is_empty() {
                return None;
            }
            let current = options.iter().position(|o| o == value);
            let next = match (key.code, current) {
                (KeyCode::Right | KeyCode::Char(' '), Some(i)) => (i + 1) % options.len(),
                (KeyCode::Left, Some(i)) => (i + options.len() - 1) % options.len(),
                (KeyCode::Right | KeyCode::Left | KeyCode::Char(' '), None) => 0,
                _ => return None,
            };
            options.get(next).cloned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use crate::viewmodel::testing;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_key_event(app, key(KeyCode::Char(c))).unwrap();
        }
    }

    #[test]
    fn text_editing() {
        assert_eq!(edit_value(&FieldKind::Text, "ab", key(KeyCode::Char('c'))), Some("abc".into()));
        assert_eq!(edit_value(&FieldKind::Text, "ab", key(KeyCode::Backspace)), Some("a".into()));
        assert_eq!(
            edit_value(&FieldKind::Text, "ab", KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)),
            None
        );
        assert_eq!(edit_value(&FieldKind::Toggle, "false", key(KeyCode::Char(' '))), Some("true".into()));
    }

    #[test]
    fn choice_cycles_both_ways() {
        let kind = FieldKind::Choice {
            options: vec!["a".into(), "b".into(), "c".into()],
        };
        assert_eq!(edit_value(&kind, "c", key(KeyCode::Right)), Some("a".into()));
        assert_eq!(edit_value(&kind, "a", key(KeyCode::Left)), Some("c".into()));
        assert_eq!(edit_value(&kind, "", key(KeyCode::Right)), Some("a".into()));
    }

    #[test]
    fn login_link_opens_registration() {
        let mut app = App::new(Config::default(), testing::context(), None);
        // email, password, then the first link
        handle_key_event(&mut app, key(KeyCode::Tab)).unwrap();
        handle_key_event(&mut app, key(KeyCode::Tab)).unwrap();
        handle_key_event(&mut app, key(KeyCode::Enter)).unwrap();
        assert_eq!(app.current_screen(), &Screen::Registration);

        handle_key_event(&mut app, key(KeyCode::Esc)).unwrap();
        assert_eq!(app.current_screen(), &Screen::Login);
    }

    #[test]
    fn add_vehicle_through_keys() {
        let (ctx, user) = testing::signed_in_context();
        let mut app = App::new(Config::default(), ctx, None);
        handle_key_event(&mut app, key(KeyCode::Char('n'))).unwrap();
        assert_eq!(app.current_screen(), &Screen::VehicleForm { vehicle_id: None });

        for text in ["Runabout", "Fiat", "Panda"] {
            type_text(&mut app, text);
            handle_key_event(&mut app, key(KeyCode::Tab)).unwrap();
        }
        handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)).unwrap();

        assert_eq!(app.current_screen(), &Screen::Garage);
        let vehicles = app.ctx.repos.vehicles.list_for(&user.id);
        assert_eq!(vehicles.len(), 1);
        assert_eq!(vehicles[0].model, "Panda");
    }

    #[test]
    fn delete_waits_for_confirmation() {
        let (ctx, user) = testing::signed_in_context();
        ctx.repos
            .vehicles
            .add(&crate::models::Vehicle {
                id: String::new(),
                name: "Old".to_string(),
                make: "Rover".to_string(),
                model: "25".to_string(),
                year: None,
                license_plate: String::new(),
                mileage: 0,
                user_id: user.id.clone(),
            })
            .unwrap();
        let mut app = App::new(Config::default(), ctx, None);

        handle_key_event(&mut app, key(KeyCode::Char('d'))).unwrap();
        assert!(app.pending_delete.is_some());
        handle_key_event(&mut app, key(KeyCode::Char('n'))).unwrap();
        assert_eq!(app.ctx.repos.vehicles.list_for(&user.id).len(), 1);

        handle_key_event(&mut app, key(KeyCode::Char('d'))).unwrap();
        handle_key_event(&mut app, key(KeyCode::Char('y'))).unwrap();
        assert!(app.ctx.repos.vehicles.list_for(&user.id).is_empty());
    }

    #[test]
    fn back_onto_deleted_vehicle_skips_its_detail() {
        let (ctx, user) = testing::signed_in_context();
        let vehicle_id = ctx
            .repos
            .vehicles
            .add(&crate::models::Vehicle {
                id: String::new(),
                name: "Gone".to_string(),
                make: "Saab".to_string(),
                model: "900".to_string(),
                year: None,
                license_plate: String::new(),
                mileage: 0,
                user_id: user.id.clone(),
            })
            .unwrap();
        let mut app = App::new(Config::default(), ctx, None);
        app.navigate(NavIntent::NavigateTo(Screen::VehicleDetail {
            vehicle_id: vehicle_id.clone(),
        }));
        app.navigate(NavIntent::NavigateTo(Screen::FuelLogs {
            vehicle_id: vehicle_id.clone(),
        }));
        app.ctx.repos.vehicles.delete(&vehicle_id).unwrap();

        handle_key_event(&mut app, key(KeyCode::Esc)).unwrap();
        assert_eq!(app.current_screen(), &Screen::Garage);
    }

    #[test]
    fn quit_key_ignored_while_typing() {
        let mut app = App::new(Config::default(), testing::context(), None);
        assert!(!handle_key_event(&mut app, key(KeyCode::Char('q'))).unwrap());
        assert_eq!(app.form_fields()[0].value, "q");
        assert!(handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)).unwrap());
    }
}
