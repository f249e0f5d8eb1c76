use crate::database::DocumentFilter;
use crate::models::MaintenanceRecord;
use crate::mvi::{Intent, Reducer, UiState};
use crate::navigation::Screen;

use super::{AppContext, EventQueue, ListModel, UiEvent, clamp_selection, select_next, select_prev};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaintenanceListUiState {
    pub records: Vec<MaintenanceRecord>,
    /// Record types seen for this vehicle, sorted
    pub categories: Vec<String>,
    pub category: Option<String>,
    pub selected: usize,
    pub total_cost: f64,
}

impl UiState for MaintenanceListUiState {}

impl MaintenanceListUiState {
    pub fn selected_record(&self) -> Option<&MaintenanceRecord> {
        self.records.get(self.selected)
    }

    /// No filter, then each category in turn, then back to no filter
    fn next_category(&self) -> Option<String> {
        match &self.category {
            None => self.categories.first().cloned(),
            Some(current) => {
                let pos = self.categories.iter().position(|c| c == current)?;
                self.categories.get(pos + 1).cloned()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MaintenanceListIntent {
    Refresh,
    SelectNext,
    SelectPrev,
    CycleCategory,
    Add,
    Edit,
    Delete,
}

impl Intent for MaintenanceListIntent {}

pub struct MaintenanceListReducer;

impl Reducer for MaintenanceListReducer {
    type State = MaintenanceListUiState;
    type Intent = MaintenanceListIntent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            MaintenanceListIntent::SelectNext => MaintenanceListUiState {
                selected: select_next(state.selected, state.records.len()),
                ..state
            },
            MaintenanceListIntent::SelectPrev => MaintenanceListUiState {
                selected: select_prev(state.selected),
                ..state
            },
            MaintenanceListIntent::CycleCategory => MaintenanceListUiState {
                category: state.next_category(),
                selected: 0,
                ..state
            },
            _ => state,
        }
    }
}

pub struct MaintenanceListViewModel {
    vehicle_id: String,
    state: MaintenanceListUiState,
    events: EventQueue,
}

impl MaintenanceListViewModel {
    pub fn new(ctx: &AppContext, vehicle_id: &str, category: Option<String>) -> Self {
        let mut vm = Self {
            vehicle_id: vehicle_id.to_string(),
            state: MaintenanceListUiState {
                category,
                ..Default::default()
            },
            events: EventQueue::default(),
        };
        vm.refresh(ctx);
        vm
    }

    pub fn state(&self) -> &MaintenanceListUiState {
        &self.state
    }

    pub fn drain_events(&mut self) -> Vec<UiEvent> {
        self.events.drain()
    }

    pub fn dispatch(&mut self, ctx: &AppContext, intent: MaintenanceListIntent) {
        self.state = MaintenanceListReducer::reduce(std::mem::take(&mut self.state), intent.clone());
        let vehicle_id = self.vehicle_id.clone();
        match intent {
            MaintenanceListIntent::Refresh | MaintenanceListIntent::CycleCategory => self.refresh(ctx),
            MaintenanceListIntent::Add => self.events.navigate(Screen::MaintenanceForm {
                vehicle_id,
                record_id: None,
            }),
            MaintenanceListIntent::Edit => {
                if let Some(record) = self.state.selected_record() {
                    let record_id = Some(record.id.clone());
                    self.events.navigate(Screen::MaintenanceForm { vehicle_id, record_id });
                }
            }
            MaintenanceListIntent::Delete => self.delete_selected(ctx),
            MaintenanceListIntent::SelectNext | MaintenanceListIntent::SelectPrev => {}
        }
    }

    fn refresh(&mut self, ctx: &AppContext) {
        let all = ctx.repos.maintenance.list_for(&self.vehicle_id);
        let mut categories: Vec<String> = all.iter().map(|r| r.record_type.clone()).collect();
        categories.sort();
        categories.dedup();

        let mut records = match &self.state.category {
            Some(category) => ctx.repos.maintenance.list(
                &DocumentFilter::by_parent(self.vehicle_id.as_str()).with_category(category.as_str()),
            ),
            None => all,
        };
        records.sort_by(|a, b| b.date.cmp(&a.date));

        self.state.total_cost = records.iter().map(|r| r.cost).sum();
        self.state.selected = clamp_selection(self.state.selected, records.len());
        self.state.records = records;
        self.state.categories = categories;
    }

    fn delete_selected(&mut self, ctx: &AppContext) {
        let Some(record) = self.state.selected_record().cloned() else {
            return;
        };
        match ctx.repos.maintenance.delete(&record.id) {
            Ok(()) => self.events.message(format!("Deleted {} on {}", record.record_type, record.date)),
            Err(e) => self.events.message(format!("Could not delete record: {}", e)),
        }
        self.refresh(ctx);
    }
}

impl ListModel for MaintenanceListViewModel {
    fn summary(&self) -> Vec<String> {
        let filter = self.state.category.as_deref().unwrap_or("all types");
        vec![format!(
            "Showing {} - {} record(s), total {:.2}",
            filter,
            self.state.records.len(),
            self.state.total_cost
        )]
    }

    fn rows(&self) -> Vec<String> {
        self.state
            .records
            .iter()
            .map(|r| {
                let notes = if r.notes.is_empty() { String::new() } else { format!("  {}", r.notes) };
                format!("{}  {:<16} {:>8} km  {:>9.2}{}", r.date, r.record_type, r.mileage, r.cost, notes)
            })
            .collect()
    }

    fn selected(&self) -> usize {
        self.state.selected
    }

    fn empty_text(&self) -> &'static str {
        "No maintenance recorded."
    }
}
