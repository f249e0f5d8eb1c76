use chrono::Utc;

use crate::models::{Reminder, ReminderStatus};
use crate::mvi::{Intent, Reducer, UiState};
use crate::navigation::Screen;
use crate::reminder;

use super::{AppContext, EventQueue, ListModel, UiEvent, clamp_selection, select_next, select_prev};

#[derive(Debug, Clone, PartialEq)]
pub struct ReminderRow {
    pub reminder: Reminder,
    pub status: ReminderStatus,
    pub vehicle_name: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RemindersUiState {
    /// Soonest due first
    pub rows: Vec<ReminderRow>,
    pub selected: usize,
}

impl UiState for RemindersUiState {}

impl RemindersUiState {
    pub fn selected_reminder(&self) -> Option<&Reminder> {
        self.rows.get(self.selected).map(|r| &r.reminder)
    }

    pub fn count(&self, status: ReminderStatus) -> usize {
        self.rows.iter().filter(|r| r.status == status).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemindersIntent {
    Refresh,
    SelectNext,
    SelectPrev,
    Add,
    Edit,
    Complete,
    Cancel,
    Delete,
    ToggleActive,
}

impl Intent for RemindersIntent {}

pub struct RemindersReducer;

impl Reducer for RemindersReducer {
    type State = RemindersUiState;
    type Intent = RemindersIntent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            RemindersIntent::SelectNext => RemindersUiState {
                selected: select_next(state.selected, state.rows.len()),
                ..state
            },
            RemindersIntent::SelectPrev => RemindersUiState {
                selected: select_prev(state.selected),
                ..state
            },
            _ => state,
        }
    }
}

pub struct RemindersViewModel {
    state: RemindersUiState,
    events: EventQueue,
}

impl RemindersViewModel {
    pub fn new(ctx: &AppContext) -> Self {
        let mut vm = Self {
            state: RemindersUiState::default(),
            events: EventQueue::default(),
        };
        vm.refresh(ctx);
        vm
    }

    pub fn state(&self) -> &RemindersUiState {
        &self.state
    }

    pub fn drain_events(&mut self) -> Vec<UiEvent> {
        self.events.drain()
    }

    pub fn dispatch(&mut self, ctx: &AppContext, intent: RemindersIntent) {
        self.state = RemindersReducer::reduce(std::mem::take(&mut self.state), intent.clone());
        let selected = self.state.selected_reminder().cloned();
        match (intent, selected) {
            (RemindersIntent::Refresh, _) => self.refresh(ctx),
            (RemindersIntent::Add, _) => self.events.navigate(Screen::ReminderForm { reminder_id: None }),
            (RemindersIntent::Edit, Some(r)) => self.events.navigate(Screen::ReminderForm {
                reminder_id: Some(r.id),
            }),
            (RemindersIntent::Complete, Some(r)) => self.complete(ctx, r),
            (RemindersIntent::Cancel, Some(r)) => {
                self.pin(ctx, r, ReminderStatus::Cancelled);
            }
            (RemindersIntent::ToggleActive, Some(r)) => self.toggle_active(ctx, r),
            (RemindersIntent::Delete, Some(r)) => {
                ctx.cancel_reminder(&r.id);
                match ctx.repos.reminders.delete(&r.id) {
                    Ok(()) => self.events.message(format!("Deleted {}", r.reminder_type)),
                    Err(e) => self.events.message(format!("Could not delete reminder: {}", e)),
                }
                self.refresh(ctx);
            }
            _ => {}
        }
    }

    fn refresh(&mut self, ctx: &AppContext) {
        let Some(user) = ctx.current_user() else {
            self.events.navigate(Screen::Login);
            self.events.push(UiEvent::ClearBackStack);
            return;
        };

        let vehicles = ctx.repos.vehicles.list_for(&user.id);
        let now = Utc::now();
        let mut rows: Vec<ReminderRow> = ctx
            .repos
            .reminders
            .list_for(&user.id)
            .into_iter()
            .map(|r| ReminderRow {
                status: reminder::status_of(&r, now, ctx.reminders.status_rule),
                vehicle_name: vehicles
                    .iter()
                    .find(|v| v.id == r.vehicle_id)
                    .map(|v| v.name.clone())
                    .unwrap_or_else(|| "(no vehicle)".to_string()),
                reminder: r,
            })
            .collect();
        rows.sort_by_key(|row| row.reminder.due_date);

        self.state.selected = clamp_selection(self.state.selected, rows.len());
        self.state.rows = rows;
    }

    fn complete(&mut self, ctx: &AppContext, reminder: Reminder) {
        if reminder.manual_status == Some(ReminderStatus::Completed) {
            return;
        }
        if !self.pin(ctx, reminder.clone(), ReminderStatus::Completed) {
            return;
        }

        let Some(next) = reminder::next_occurrence(&reminder) else {
            return;
        };
        match ctx.repos.reminders.add(&next) {
            Ok(id) => {
                let next = Reminder { id, ..next };
                ctx.schedule_reminder(&next);
                self.events.message(format!(
                    "Next {} due {}",
                    next.reminder_type,
                    next.due_date.format("%Y-%m-%d")
                ));
                self.refresh(ctx);
            }
            Err(e) => self.events.message(format!("Could not schedule next reminder: {}", e)),
        }
    }

    /// Set a manual status and stop the reminder's timers
    fn pin(&mut self, ctx: &AppContext, reminder: Reminder, status: ReminderStatus) -> bool {
        ctx.cancel_reminder(&reminder.id);
        let updated = Reminder {
            manual_status: Some(status),
            ..reminder
        };
        let saved = match ctx.repos.reminders.update(&updated) {
            Ok(()) => {
                self.events
                    .message(format!("{} marked {}", updated.reminder_type, status.label().to_lowercase()));
                true
            }
            Err(e) => {
                self.events.message(format!("Could not update reminder: {}", e));
                false
            }
        };
        self.refresh(ctx);
        saved
    }

    fn toggle_active(&mut self, ctx: &AppContext, reminder: Reminder) {
        let updated = Reminder {
            active: !reminder.active,
            ..reminder
        };
        if let Err(e) = ctx.repos.reminders.update(&updated) {
            self.events.message(format!("Could not update reminder: {}", e));
            return;
        }
        if updated.active {
            ctx.schedule_reminder(&updated);
            self.events.message(format!("{} switched on", updated.reminder_type));
        } else {
            ctx.cancel_reminder(&updated.id);
            self.events.message(format!("{} switched off", updated.reminder_type));
        }
        self.refresh(ctx);
    }
}

impl ListModel for RemindersViewModel {
    fn summary(&self) -> Vec<String> {
        let s = &self.state;
        vec![format!(
            "{} reminder(s): {} overdue, {} due today, {} missed",
            s.rows.len(),
            s.count(ReminderStatus::Overdue),
            s.count(ReminderStatus::DueToday),
            s.count(ReminderStatus::Missed)
        )]
    }

    fn rows(&self) -> Vec<String> {
        self.state
            .rows
            .iter()
            .map(|row| {
                let r = &row.reminder;
                let off = if r.active { "" } else { "  (off)" };
                let repeat = r
                    .repeat_interval_days
                    .map(|d| format!("  every {}d", d))
                    .unwrap_or_default();
                format!(
                    "{}  {:<14} {:<16} {}{}{}",
                    r.due_date.format("%Y-%m-%d"),
                    row.status.label(),
                    r.reminder_type,
                    row.vehicle_name,
                    repeat,
                    off
                )
            })
            .collect()
    }

    fn selected(&self) -> usize {
        self.state.selected
    }

    fn empty_text(&self) -> &'static str {
        "No reminders set."
    }
}
