use std::time::Instant;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::error::TryRecvError;

use crate::Config;
use crate::mvi::Reducer;
use crate::navigation::{NavIntent, NavigationReducer, Navigator, Screen};
use crate::notify::Notification;
use crate::viewmodel::{
    AppContext, FieldView, FormModel, ForgotPasswordViewModel, FuelFormViewModel, FuelViewModel, GarageViewModel,
    ListModel, LoginViewModel, MaintenanceFormViewModel, MaintenanceListViewModel, NearbyShopsViewModel,
    RegistrationViewModel, ReminderFormViewModel, RemindersViewModel, UiEvent, VehicleDetailViewModel,
    VehicleFormViewModel,
};

const STATUS_MESSAGE_TIMEOUT_SECS: u64 = 3;

/// The view-model behind the screen on top of the navigator
pub enum ScreenModel {
    Login(LoginViewModel),
    Registration(RegistrationViewModel),
    ForgotPassword(ForgotPasswordViewModel),
    Garage(GarageViewModel),
    VehicleForm(VehicleFormViewModel),
    VehicleDetail(VehicleDetailViewModel),
    MaintenanceList(MaintenanceListViewModel),
    MaintenanceForm(MaintenanceFormViewModel),
    FuelLogs(FuelViewModel),
    FuelForm(FuelFormViewModel),
    Reminders(RemindersViewModel),
    ReminderForm(ReminderFormViewModel),
    NearbyShops(NearbyShopsViewModel),
}

impl ScreenModel {
    pub fn build(ctx: &AppContext, screen: &Screen) -> Self {
        match screen {
            Screen::Login => ScreenModel::Login(LoginViewModel::new()),
            Screen::Registration => ScreenModel::Registration(RegistrationViewModel::new()),
            Screen::ForgotPassword => ScreenModel::ForgotPassword(ForgotPasswordViewModel::new()),
            Screen::Garage => ScreenModel::Garage(GarageViewModel::new(ctx)),
            Screen::VehicleForm { vehicle_id } => {
                ScreenModel::VehicleForm(VehicleFormViewModel::new(ctx, vehicle_id.as_deref()))
            }
            Screen::VehicleDetail { vehicle_id } => {
                ScreenModel::VehicleDetail(VehicleDetailViewModel::new(ctx, vehicle_id))
            }
            Screen::MaintenanceList { vehicle_id, category } => {
                ScreenModel::MaintenanceList(MaintenanceListViewModel::new(ctx, vehicle_id, category.clone()))
            }
            Screen::MaintenanceForm { vehicle_id, record_id } => ScreenModel::MaintenanceForm(
                MaintenanceFormViewModel::new(ctx, vehicle_id, record_id.as_deref()),
            ),
            Screen::FuelLogs { vehicle_id } => ScreenModel::FuelLogs(FuelViewModel::new(ctx, vehicle_id)),
            Screen::FuelForm { vehicle_id, log_id } => {
                ScreenModel::FuelForm(FuelFormViewModel::new(ctx, vehicle_id, log_id.as_deref()))
            }
            Screen::Reminders => ScreenModel::Reminders(RemindersViewModel::new(ctx)),
            Screen::ReminderForm { reminder_id } => {
                ScreenModel::ReminderForm(ReminderFormViewModel::new(ctx, reminder_id.as_deref()))
            }
            Screen::NearbyShops => ScreenModel::NearbyShops(NearbyShopsViewModel::new(ctx)),
        }
    }

    pub fn form(&self) -> Option<&dyn FormModel> {
        match self {
            ScreenModel::Login(vm) => Some(vm),
            ScreenModel::Registration(vm) => Some(vm),
            ScreenModel::ForgotPassword(vm) => Some(vm),
            ScreenModel::VehicleForm(vm) => Some(vm),
            ScreenModel::MaintenanceForm(vm) => Some(vm),
            ScreenModel::FuelForm(vm) => Some(vm),
            ScreenModel::ReminderForm(vm) => Some(vm),
            ScreenModel::NearbyShops(vm) => Some(vm),
            _ => None,
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut dyn FormModel> {
        match self {
            ScreenModel::Login(vm) => Some(vm),
            ScreenModel::Registration(vm) => Some(vm),
            ScreenModel::ForgotPassword(vm) => Some(vm),
            ScreenModel::VehicleForm(vm) => Some(vm),
            ScreenModel::MaintenanceForm(vm) => Some(vm),
            ScreenModel::FuelForm(vm) => Some(vm),
            ScreenModel::ReminderForm(vm) => Some(vm),
            ScreenModel::NearbyShops(vm) => Some(vm),
            _ => None,
        }
    }

    pub fn list(&self) -> Option<&dyn ListModel> {
        match self {
            ScreenModel::Garage(vm) => Some(vm),
            ScreenModel::MaintenanceList(vm) => Some(vm),
            ScreenModel::FuelLogs(vm) => Some(vm),
            ScreenModel::Reminders(vm) => Some(vm),
            ScreenModel::NearbyShops(vm) => Some(vm),
            _ => None,
        }
    }

    pub fn drain_events(&mut self) -> Vec<UiEvent> {
        match self {
            ScreenModel::Garage(vm) => vm.drain_events(),
            ScreenModel::VehicleDetail(vm) => vm.drain_events(),
            ScreenModel::MaintenanceList(vm) => vm.drain_events(),
            ScreenModel::FuelLogs(vm) => vm.drain_events(),
            ScreenModel::Reminders(vm) => vm.drain_events(),
            other => other.form_mut().map(|f| f.drain_events()).unwrap_or_default(),
        }
    }
}

/// Cursor within the current form: fields first, then links
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormFocus {
    pub index: usize,
}

/// A list row awaiting a yes/no before deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub label: String,
}

#[derive(Debug, Clone, Default)]
pub struct StatusState {
    pub message: Option<String>,
    pub message_time: Option<Instant>,
}

pub struct App {
    pub config: Config,
    pub ctx: AppContext,
    pub navigator: Navigator,
    pub screen: ScreenModel,
    pub focus: FormFocus,
    pub pending_delete: Option<PendingDelete>,
    pub show_help: bool,
    pub status: StatusState,
    notifications: Option<UnboundedReceiver<Notification>>,
}

impl App {
    pub fn new(config: Config, ctx: AppContext, notifications: Option<UnboundedReceiver<Notification>>) -> Self {
        let start = match ctx.current_user() {
            Some(user) => {
                ctx.schedule_user_reminders(&user.id);
                Screen::Garage
            }
            None => Screen::Login,
        };
        let screen = ScreenModel::build(&ctx, &start);
        let mut app = Self {
            config,
            ctx,
            navigator: Navigator::new(start),
            screen,
            focus: FormFocus::default(),
            pending_delete: None,
            show_help: false,
            status: StatusState::default(),
            notifications,
        };
        app.process_events();
        app
    }

    pub fn current_screen(&self) -> &Screen {
        self.navigator.current()
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status.message = Some(message);
        self.status.message_time = Some(Instant::now());
    }

    pub fn clear_status_message(&mut self) {
        self.status.message = None;
        self.status.message_time = None;
    }

    /// Check if status message should be auto-cleared
    pub fn check_status_message_timeout(&mut self) {
        if let Some(time) = self.status.message_time {
            if time.elapsed().as_secs() >= STATUS_MESSAGE_TIMEOUT_SECS {
                self.clear_status_message();
            }
        }
    }

    /// Apply a router intent and rebuild the screen on top
    pub fn navigate(&mut self, intent: NavIntent) {
        let before = self.navigator.current().clone();
        self.navigator = NavigationReducer::reduce(std::mem::take(&mut self.navigator), intent);
        if *self.navigator.current() != before {
            tracing::debug!(from = ?before, to = ?self.navigator.current(), "navigate");
            self.rebuild_screen();
        }
    }

    fn rebuild_screen(&mut self) {
        self.screen = ScreenModel::build(&self.ctx, self.navigator.current());
        self.focus = FormFocus::default();
        self.pending_delete = None;
    }

    /// Drain the current view-model's one-shot events into the router and status bar.
    ///
    /// Building a screen can itself queue events (a missing record sends the
    /// user back), so this repeats until the screen on top is quiet.
    pub fn process_events(&mut self) {
        loop {
            let events = self.screen.drain_events();
            if events.is_empty() {
                break;
            }
            let mut nav = self.navigator.clone();
            for event in events {
                nav = match event {
                    UiEvent::Message(message) => {
                        self.set_status_message(message);
                        nav
                    }
                    UiEvent::Navigate(screen) => nav.navigate_to(screen),
                    UiEvent::Back => nav.navigate_back(),
                    UiEvent::ClearBackStack => nav.clear_back_stack(),
                };
            }
            if nav != self.navigator {
                self.navigator = nav;
                self.rebuild_screen();
            } else if let Some(form) = self.screen.form() {
                // Fields can appear or vanish after a submit
                let total = form.fields().len() + form.links().len();
                self.focus.index = self.focus.index.min(total.saturating_sub(1));
            }
        }
    }

    /// Show delivered notifications in the status bar
    pub fn drain_notifications(&mut self) {
        let Some(receiver) = self.notifications.as_mut() else {
            return;
        };
        let mut latest = None;
        loop {
            match receiver.try_recv() {
                Ok(notification) => latest = Some(format!("{}: {}", notification.title, notification.body)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::debug!("notification channel closed");
                    self.notifications = None;
                    break;
                }
            }
        }
        if let Some(message) = latest {
            self.set_status_message(message);
        }
    }

    /// Field views of the current form, if the screen has one
    pub fn form_fields(&self) -> Vec<FieldView> {
        self.screen.form().map(|f| f.fields()).unwrap_or_default()
    }

    /// Row label of the selected list entry, used in the delete prompt
    pub fn selected_row(&self) -> Option<String> {
        let list = self.screen.list()?;
        list.rows().into_iter().nth(list.selected())
    }

    /// Stop background timers before the terminal is released
    pub fn shutdown(&self) {
        if let Some(scheduler) = &self.ctx.scheduler {
            scheduler.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewmodel::testing;

    #[test]
    fn starts_on_login_without_session() {
        let app = App::new(Config::default(), testing::context(), None);
        assert_eq!(app.current_screen(), &Screen::Login);
        assert!(matches!(app.screen, ScreenModel::Login(_)));
    }

    #[test]
    fn starts_on_garage_with_session() {
        let (ctx, _) = testing::signed_in_context();
        let app = App::new(Config::default(), ctx, None);
        assert_eq!(app.current_screen(), &Screen::Garage);
    }

    #[test]
    fn missing_record_bounces_back() {
        let (ctx, _) = testing::signed_in_context();
        let mut app = App::new(Config::default(), ctx, None);
        app.navigate(NavIntent::NavigateTo(Screen::VehicleForm {
            vehicle_id: Some("gone".to_string()),
        }));
        app.process_events();
        assert_eq!(app.current_screen(), &Screen::Garage);
        assert!(!app.navigator.can_go_back());
    }

    #[test]
    fn notifications_reach_status_bar() {
        let (channel, receiver) = crate::notify::NotificationChannel::new("test");
        let app_ctx = testing::context().with_notifications(channel.clone(), None);
        let mut app = App::new(Config::default(), app_ctx, Some(receiver));
        channel.post("Reminder: MOT", "Due tomorrow");
        app.drain_notifications();
        assert_eq!(app.status.message.as_deref(), Some("Reminder: MOT: Due tomorrow"));
    }
}
