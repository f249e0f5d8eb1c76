use crate::efficiency::{self, Efficiency};
use crate::models::FuelLog;
use crate::mvi::{Intent, Reducer, UiState};
use crate::navigation::Screen;

use super::{AppContext, EventQueue, ListModel, UiEvent, clamp_selection, select_next, select_prev};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FuelUiState {
    /// Newest reading first
    pub logs: Vec<FuelLog>,
    pub efficiency: Efficiency,
    pub total_cost: f64,
    pub total_litres: f64,
    pub selected: usize,
}

impl UiState for FuelUiState {}

#[derive(Debug, Clone, PartialEq)]
pub enum FuelIntent {
    Refresh,
    SelectNext,
    SelectPrev,
    Add,
    Edit,
    Delete,
}

impl Intent for FuelIntent {}

pub struct FuelReducer;

impl Reducer for FuelReducer {
    type State = FuelUiState;
    type Intent = FuelIntent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            FuelIntent::SelectNext => FuelUiState {
                selected: select_next(state.selected, state.logs.len()),
                ..state
            },
            FuelIntent::SelectPrev => FuelUiState {
                selected: select_prev(state.selected),
                ..state
            },
            _ => state,
        }
    }
}

pub struct FuelViewModel {
    vehicle_id: String,
    state: FuelUiState,
    events: EventQueue,
}

impl FuelViewModel {
    pub fn new(ctx: &AppContext, vehicle_id: &str) -> Self {
        let mut vm = Self {
            vehicle_id: vehicle_id.to_string(),
            state: FuelUiState::default(),
            events: EventQueue::default(),
        };
        vm.refresh(ctx);
        vm
    }

    pub fn state(&self) -> &FuelUiState {
        &self.state
    }

    pub fn drain_events(&mut self) -> Vec<UiEvent> {
        self.events.drain()
    }

    pub fn dispatch(&mut self, ctx: &AppContext, intent: FuelIntent) {
        self.state = FuelReducer::reduce(std::mem::take(&mut self.state), intent.clone());
        let vehicle_id = self.vehicle_id.clone();
        let selected_id = self.state.logs.get(self.state.selected).map(|l| l.id.clone());
        match intent {
            FuelIntent::Refresh => self.refresh(ctx),
            FuelIntent::Add => self.events.navigate(Screen::FuelForm { vehicle_id, log_id: None }),
            FuelIntent::Edit => {
                if let Some(log_id) = selected_id {
                    self.events.navigate(Screen::FuelForm {
                        vehicle_id,
                        log_id: Some(log_id),
                    });
                }
            }
            FuelIntent::Delete => {
                if let Some(log_id) = selected_id {
                    match ctx.repos.fuel_logs.delete(&log_id) {
                        Ok(()) => self.events.message("Fill-up deleted"),
                        Err(e) => self.events.message(format!("Could not delete fill-up: {}", e)),
                    }
                    self.refresh(ctx);
                }
            }
            FuelIntent::SelectNext | FuelIntent::SelectPrev => {}
        }
    }

    fn refresh(&mut self, ctx: &AppContext) {
        let mut logs = ctx.repos.fuel_logs.list_for(&self.vehicle_id);
        let efficiency = efficiency::calculate(&logs);
        logs.sort_by(|a, b| b.odometer.total_cmp(&a.odometer));

        self.state = FuelUiState {
            efficiency,
            total_cost: logs.iter().map(|l| l.cost).sum(),
            total_litres: logs.iter().map(|l| l.amount).sum(),
            selected: clamp_selection(self.state.selected, logs.len()),
            logs,
        };
    }
}

impl ListModel for FuelViewModel {
    fn summary(&self) -> Vec<String> {
        let s = &self.state;
        let efficiency = if s.efficiency.total_distance > 0.0 {
            format!(
                "Average {:.2} km/L, {:.3} per km over {:.0} km",
                s.efficiency.km_per_litre, s.efficiency.cost_per_km, s.efficiency.total_distance
            )
        } else {
            "Add two or more fill-ups to see efficiency".to_string()
        };
        vec![
            efficiency,
            format!("{} fill-up(s), {:.1} L, total {:.2}", s.logs.len(), s.total_litres, s.total_cost),
        ]
    }

    fn rows(&self) -> Vec<String> {
        self.state
            .logs
            .iter()
            .map(|l| format!("{}  {:>9.0} km  {:>6.2} L  {:>8.2}", l.date, l.odometer, l.amount, l.cost))
            .collect()
    }

    fn selected(&self) -> usize {
        self.state.selected
    }

    fn empty_text(&self) -> &'static str {
        "No fill-ups logged."
    }
}
