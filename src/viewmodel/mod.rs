//! One view-model per screen.
//!
//! A view-model owns its screen state, applies validation, calls the
//! repositories and services in [`AppContext`], and queues one-shot
//! [`UiEvent`]s that the app drains into the router and the status bar.

use std::collections::VecDeque;
use std::rc::Rc;

use chrono::Utc;

use crate::auth::AuthService;
use crate::config::{Config, ReminderConfig, ShopConfig};
use crate::database::DocumentStore;
use crate::models::{Reminder, User};
use crate::navigation::Screen;
use crate::notify::{NotificationChannel, ReminderScheduler};
use crate::poi::ShopFinder;
use crate::repository::Repositories;

pub mod forgot_password;
pub mod fuel;
pub mod fuel_form;
pub mod garage;
pub mod login;
pub mod maintenance_form;
pub mod maintenance_list;
pub mod reminder_form;
pub mod reminders;
pub mod registration;
pub mod shops;
pub mod vehicle_detail;
pub mod vehicle_form;

pub use forgot_password::ForgotPasswordViewModel;
pub use fuel::FuelViewModel;
pub use fuel_form::FuelFormViewModel;
pub use garage::GarageViewModel;
pub use login::LoginViewModel;
pub use maintenance_form::MaintenanceFormViewModel;
pub use maintenance_list::MaintenanceListViewModel;
pub use reminder_form::ReminderFormViewModel;
pub use reminders::RemindersViewModel;
pub use registration::RegistrationViewModel;
pub use shops::NearbyShopsViewModel;
pub use vehicle_detail::VehicleDetailViewModel;
pub use vehicle_form::VehicleFormViewModel;

/// One-shot signal from a view-model to the app
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Message(String),
    Navigate(Screen),
    Back,
    ClearBackStack,
}

#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<UiEvent>,
}

impl EventQueue {
    pub fn push(&mut self, event: UiEvent) {
        self.events.push_back(event);
    }

    pub fn message(&mut self, text: impl Into<String>) {
        self.push(UiEvent::Message(text.into()));
    }

    pub fn navigate(&mut self, screen: Screen) {
        self.push(UiEvent::Navigate(screen));
    }

    /// Take every queued event in order
    pub fn drain(&mut self) -> Vec<UiEvent> {
        self.events.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// How a form field is edited and shown
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    /// Masked on screen
    Secret,
    /// Value is "true" or "false"
    Toggle,
    /// Value is one of `options`
    Choice { options: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldView {
    pub label: &'static str,
    pub value: String,
    pub kind: FieldKind,
    pub error: Option<String>,
}

impl FieldView {
    pub fn text(label: &'static str, value: &str, error: &Option<String>) -> Self {
        Self {
            label,
            value: value.to_string(),
            kind: FieldKind::Text,
            error: error.clone(),
        }
    }

    pub fn secret(label: &'static str, value: &str, error: &Option<String>) -> Self {
        Self {
            kind: FieldKind::Secret,
            ..Self::text(label, value, error)
        }
    }

    pub fn toggle(label: &'static str, value: bool, error: &Option<String>) -> Self {
        Self {
            label,
            value: value.to_string(),
            kind: FieldKind::Toggle,
            error: error.clone(),
        }
    }

    pub fn choice(label: &'static str, value: &str, options: Vec<String>, error: &Option<String>) -> Self {
        Self {
            kind: FieldKind::Choice { options },
            ..Self::text(label, value, error)
        }
    }
}

/// Uniform surface over every form screen
pub trait FormModel {
    fn fields(&self) -> Vec<FieldView>;
    fn set_field(&mut self, index: usize, value: String);
    fn can_submit(&self) -> bool;
    fn submit(&mut self, ctx: &AppContext);
    fn drain_events(&mut self) -> Vec<UiEvent>;

    /// Secondary destinations offered below the form (label, screen)
    fn links(&self) -> Vec<(&'static str, Screen)> {
        Vec::new()
    }
}

/// Uniform surface over every list screen
pub trait ListModel {
    /// Lines shown above the list (totals, filters)
    fn summary(&self) -> Vec<String> {
        Vec::new()
    }
    fn rows(&self) -> Vec<String>;
    fn selected(&self) -> usize;
    fn empty_text(&self) -> &'static str;
}

pub(crate) fn select_next(selected: usize, len: usize) -> usize {
    if len == 0 { 0 } else { (selected + 1).min(len - 1) }
}

pub(crate) fn select_prev(selected: usize) -> usize {
    selected.saturating_sub(1)
}

/// Keep a selection inside a list that may have shrunk
pub(crate) fn clamp_selection(selected: usize, len: usize) -> usize {
    selected.min(len.saturating_sub(1))
}

pub(crate) fn parse_toggle(value: &str) -> bool {
    value == "true"
}

/// Services shared by every view-model
pub struct AppContext {
    pub repos: Repositories,
    pub auth: AuthService,
    pub reminders: ReminderConfig,
    pub shops: ShopConfig,
    pub shop_finder: Option<Box<dyn ShopFinder>>,
    pub notifier: Option<NotificationChannel>,
    pub scheduler: Option<ReminderScheduler>,
}

impl AppContext {
    pub fn new(store: Rc<dyn DocumentStore>, config: &Config) -> Self {
        let auth = AuthService::new(Rc::clone(&store));
        Self::with_auth(store, auth, config)
    }

    pub fn with_auth(store: Rc<dyn DocumentStore>, auth: AuthService, config: &Config) -> Self {
        Self {
            repos: Repositories::new(store),
            auth,
            reminders: config.reminders.clone(),
            shops: config.shops.clone(),
            shop_finder: None,
            notifier: None,
            scheduler: None,
        }
    }

    pub fn with_shop_finder(mut self, finder: Box<dyn ShopFinder>) -> Self {
        self.shop_finder = Some(finder);
        self
    }

    pub fn with_notifications(mut self, notifier: NotificationChannel, scheduler: Option<ReminderScheduler>) -> Self {
        self.notifier = Some(notifier);
        self.scheduler = scheduler;
        self
    }

    pub fn current_user(&self) -> Option<User> {
        self.auth.current_user()
    }

    /// Post to the notification channel when one is attached
    pub fn notify(&self, title: &str, body: &str) {
        match &self.notifier {
            Some(channel) => {
                channel.post(title, body);
            }
            None => tracing::debug!(title, "no notification channel, dropping"),
        }
    }

    pub fn schedule_reminder(&self, reminder: &Reminder) {
        if let Some(scheduler) = &self.scheduler {
            scheduler.schedule(reminder, Utc::now());
        }
    }

    /// Start timers for every reminder the user owns
    pub fn schedule_user_reminders(&self, user_id: &str) {
        if let Some(scheduler) = &self.scheduler {
            let reminders = self.repos.reminders.list_for(user_id);
            let started = scheduler.schedule_all(&reminders, Utc::now());
            tracing::info!(user_id, started, "reminder timers started");
        }
    }

    pub fn cancel_reminder(&self, reminder_id: &str) {
        if let Some(scheduler) = &self.scheduler {
            scheduler.cancel(reminder_id);
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::database::Database;

    /// In-memory context with a fast bcrypt cost
    pub fn context() -> AppContext {
        let store: Rc<dyn DocumentStore> = Rc::new(Database::in_memory().expect("in-memory database"));
        let auth = AuthService::with_cost(Rc::clone(&store), 4);
        AppContext::with_auth(store, auth, &Config::default())
    }

    pub fn signed_in_context() -> (AppContext, User) {
        let ctx = context();
        let user = ctx
            .auth
            .sign_up("Test", "Driver", "driver@example.com", "Secret12!")
            .expect("sign up");
        (ctx, user)
    }

    pub fn messages(events: &[UiEvent]) -> Vec<&str> {
        events
            .iter()
            .filter_map(|e| match e {
                UiEvent::Message(m) => Some(m.as_str()),
                _ => None,
            })
            .collect()
    }
}
