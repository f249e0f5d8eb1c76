use crate::models::{Reminder, Vehicle};
use crate::mvi::{Intent, Reducer, UiState};
use crate::utils;
use crate::validation::{self, FieldCheck};

use super::{AppContext, EventQueue, FieldView, FormModel, UiEvent, parse_toggle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderField {
    Vehicle,
    Type,
    DueDate,
    OdometerThreshold,
    RepeatDays,
    NotifyBefore,
    Notes,
    Active,
}

impl ReminderField {
    const ALL: [ReminderField; 8] = [
        ReminderField::Vehicle,
        ReminderField::Type,
        ReminderField::DueDate,
        ReminderField::OdometerThreshold,
        ReminderField::RepeatDays,
        ReminderField::NotifyBefore,
        ReminderField::Notes,
        ReminderField::Active,
    ];

    fn label(self) -> &'static str {
        match self {
            ReminderField::Vehicle => "Vehicle",
            ReminderField::Type => "Type",
            ReminderField::DueDate => "Due date (YYYY-MM-DD)",
            ReminderField::OdometerThreshold => "Due at km (optional)",
            ReminderField::RepeatDays => "Repeat every N days (optional)",
            ReminderField::NotifyBefore => "Notify days before, e.g. 7,1",
            ReminderField::Notes => "Notes",
            ReminderField::Active => "Active",
        }
    }

    fn check(self, value: &str) -> FieldCheck {
        let optional = |check: FieldCheck| if value.trim().is_empty() { FieldCheck::ok() } else { check };
        match self {
            ReminderField::Vehicle => validation::validate_required(value, "Vehicle"),
            ReminderField::Type => validation::validate_required(value, "Type"),
            ReminderField::DueDate => validation::validate_date(value),
            ReminderField::OdometerThreshold => optional(validation::validate_whole_number(value, "Odometer")),
            ReminderField::RepeatDays => optional(validation::validate_day_count(value, "Repeat interval")),
            ReminderField::NotifyBefore => validation::validate_lead_days(value),
            ReminderField::Notes | ReminderField::Active => FieldCheck::ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReminderFormUiState {
    pub editing: Option<Reminder>,
    /// (id, label) for each of the user's vehicles
    pub vehicles: Vec<(String, String)>,
    pub values: [String; 8],
    pub errors: [Option<String>; 8],
}

impl UiState for ReminderFormUiState {}

impl ReminderFormUiState {
    fn value(&self, field: ReminderField) -> &str {
        &self.values[field as usize]
    }

    fn all_valid(&self) -> bool {
        ReminderField::ALL.iter().all(|f| f.check(self.value(*f)).valid)
    }

    fn vehicle_id(&self) -> Option<&str> {
        let label = self.value(ReminderField::Vehicle);
        self.vehicles
            .iter()
            .find(|(_, l)| l == label)
            .map(|(id, _)| id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReminderFormIntent {
    Changed(ReminderField, String),
    Save,
}

impl Intent for ReminderFormIntent {}

pub struct ReminderFormReducer;

impl Reducer for ReminderFormReducer {
    type State = ReminderFormUiState;
    type Intent = ReminderFormIntent;

    fn reduce(mut state: Self::State, intent: Self::Intent) -> Self::State {
        if let ReminderFormIntent::Changed(field, value) = intent {
            state.errors[field as usize] = field.check(&value).message;
            state.values[field as usize] = value;
        }
        state
    }
}

fn vehicle_label(v: &Vehicle) -> String {
    format!("{} ({} {})", v.name, v.make, v.model)
}

fn optional_number<T: std::str::FromStr>(value: &str) -> Option<T> {
    value.trim().parse().ok()
}

pub struct ReminderFormViewModel {
    state: ReminderFormUiState,
    events: EventQueue,
}

impl ReminderFormViewModel {
    pub fn new(ctx: &AppContext, reminder_id: Option<&str>) -> Self {
        let mut state = ReminderFormUiState::default();
        let mut events = EventQueue::default();

        if let Some(user) = ctx.current_user() {
            let mut vehicles = ctx.repos.vehicles.list_for(&user.id);
            vehicles.sort_by(|a, b| a.name.cmp(&b.name));
            state.vehicles = vehicles.iter().map(|v| (v.id.clone(), vehicle_label(v))).collect();
        }

        match reminder_id.map(|id| ctx.repos.reminders.get(id)) {
            Some(Some(r)) => {
                let vehicle = state
                    .vehicles
                    .iter()
                    .find(|(id, _)| *id == r.vehicle_id)
                    .map(|(_, label)| label.clone())
                    .unwrap_or_default();
                let join = |days: &[u32]| days.iter().map(u32::to_string).collect::<Vec<_>>().join(",");
                state.values = [
                    vehicle,
                    r.reminder_type.clone(),
                    r.due_date.format("%Y-%m-%d").to_string(),
                    r.odometer_threshold.map(|n| n.to_string()).unwrap_or_default(),
                    r.repeat_interval_days.map(|n| n.to_string()).unwrap_or_default(),
                    join(&r.notify_before_days),
                    r.notes.clone(),
                    r.active.to_string(),
                ];
                state.editing = Some(r);
            }
            Some(None) => {
                events.message("Reminder not found");
                events.push(UiEvent::Back);
            }
            None => {
                let leads: Vec<String> = ctx.reminders.default_lead_days.iter().map(u32::to_string).collect();
                state.values[ReminderField::Vehicle as usize] =
                    state.vehicles.first().map(|(_, l)| l.clone()).unwrap_or_default();
                state.values[ReminderField::DueDate as usize] = utils::get_current_date_string();
                state.values[ReminderField::NotifyBefore as usize] = leads.join(",");
                state.values[ReminderField::Active as usize] = true.to_string();
                if state.vehicles.is_empty() {
                    events.message("Add a vehicle before setting reminders");
                }
            }
        }

        Self { state, events }
    }

    pub fn state(&self) -> &ReminderFormUiState {
        &self.state
    }

    pub fn dispatch(&mut self, ctx: &AppContext, intent: ReminderFormIntent) {
        self.state = ReminderFormReducer::reduce(std::mem::take(&mut self.state), intent.clone());
        if intent == ReminderFormIntent::Save {
            self.save(ctx);
        }
    }

    fn save(&mut self, ctx: &AppContext) {
        let Some(user) = ctx.current_user() else {
            self.events.message("Sign in to manage reminders");
            return;
        };
        if !self.state.all_valid() {
            for field in ReminderField::ALL {
                self.state.errors[field as usize] = field.check(self.state.value(field)).message;
            }
            self.events.message("Please fix the highlighted fields");
            return;
        }
        let Some(vehicle_id) = self.state.vehicle_id().map(str::to_string) else {
            self.state.errors[ReminderField::Vehicle as usize] = Some("Choose one of your vehicles".to_string());
            return;
        };
        let Ok(due_date) = utils::parse_due_date(self.state.value(ReminderField::DueDate).trim()) else {
            return;
        };

        let s = &self.state;
        let base = s.editing.clone();
        let reminder = Reminder {
            id: base.as_ref().map(|r| r.id.clone()).unwrap_or_default(),
            user_id: user.id,
            vehicle_id,
            reminder_type: s.value(ReminderField::Type).trim().to_string(),
            due_date,
            odometer_threshold: optional_number(s.value(ReminderField::OdometerThreshold)),
            notes: s.value(ReminderField::Notes).trim().to_string(),
            active: parse_toggle(s.value(ReminderField::Active)),
            repeat_interval_days: optional_number::<u32>(s.value(ReminderField::RepeatDays)).filter(|d| *d > 0),
            notify_before_days: validation::parse_lead_days(s.value(ReminderField::NotifyBefore)).unwrap_or_default(),
            manual_status: base.and_then(|r| r.manual_status),
        };

        let result = if reminder.id.is_empty() {
            ctx.repos.reminders.add(&reminder)
        } else {
            ctx.repos.reminders.update(&reminder).map(|_| reminder.id.clone())
        };
        match result {
            Ok(id) => {
                ctx.schedule_reminder(&Reminder { id, ..reminder.clone() });
                self.events.message(format!(
                    "{} due {}",
                    reminder.reminder_type,
                    reminder.due_date.format("%Y-%m-%d")
                ));
                self.events.push(UiEvent::Back);
            }
            Err(e) => self.events.message(format!("Could not save reminder: {}", e)),
        }
    }
}

impl FormModel for ReminderFormViewModel {
    fn fields(&self) -> Vec<FieldView> {
        ReminderField::ALL
            .iter()
            .map(|f| {
                let (value, error) = (self.state.value(*f), &self.state.errors[*f as usize]);
                match f {
                    ReminderField::Vehicle => FieldView::choice(
                        f.label(),
                        value,
                        self.state.vehicles.iter().map(|(_, l)| l.clone()).collect(),
                        error,
                    ),
                    ReminderField::Active => FieldView::toggle(f.label(), parse_toggle(value), error),
                    _ => FieldView::text(f.label(), value, error),
                }
            })
            .collect()
    }

    fn set_field(&mut self, index: usize, value: String) {
        if let Some(field) = ReminderField::ALL.get(index) {
            self.state = ReminderFormReducer::reduce(
                std::mem::take(&mut self.state),
                ReminderFormIntent::Changed(*field, value),
            );
        }
    }

    fn can_submit(&self) -> bool {
        self.state.all_valid() && self.state.vehicle_id().is_some()
    }

    fn submit(&mut self, ctx: &AppContext) {
        self.dispatch(ctx, ReminderFormIntent::Save);
    }

    fn drain_events(&mut self) -> Vec<UiEvent> {
        self.events.drain()
    }
}
