use crate::models::Vehicle;
use crate::mvi::{Intent, Reducer, UiState};
use crate::navigation::Screen;

use super::{AppContext, EventQueue, ListModel, UiEvent, clamp_selection, select_next, select_prev};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GarageUiState {
    pub owner: String,
    pub vehicles: Vec<Vehicle>,
    pub selected: usize,
}

impl UiState for GarageUiState {}

impl GarageUiState {
    pub fn selected_vehicle(&self) -> Option<&Vehicle> {
        self.vehicles.get(self.selected)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GarageIntent {
    Refresh,
    SelectNext,
    SelectPrev,
    Open,
    Add,
    Edit,
    Delete,
    OpenReminders,
    OpenShops,
    SignOut,
}

impl Intent for GarageIntent {}

pub struct GarageReducer;

impl Reducer for GarageReducer {
    type State = GarageUiState;
    type Intent = GarageIntent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            GarageIntent::SelectNext => GarageUiState {
                selected: select_next(state.selected, state.vehicles.len()),
                ..state
            },
            GarageIntent::SelectPrev => GarageUiState {
                selected: select_prev(state.selected),
                ..state
            },
            _ => state,
        }
    }
}

pub struct GarageViewModel {
    state: GarageUiState,
    events: EventQueue,
}

impl GarageViewModel {
    pub fn new(ctx: &AppContext) -> Self {
        let mut vm = Self {
            state: GarageUiState::default(),
            events: EventQueue::default(),
        };
        vm.refresh(ctx);
        vm
    }

    pub fn state(&self) -> &GarageUiState {
        &self.state
    }

    pub fn drain_events(&mut self) -> Vec<UiEvent> {
        self.events.drain()
    }

    pub fn dispatch(&mut self, ctx: &AppContext, intent: GarageIntent) {
        self.state = GarageReducer::reduce(std::mem::take(&mut self.state), intent.clone());
        let selected_id = self.state.selected_vehicle().map(|v| v.id.clone());

        match (intent, selected_id) {
            (GarageIntent::Refresh, _) => self.refresh(ctx),
            (GarageIntent::Add, _) => self.events.navigate(Screen::VehicleForm { vehicle_id: None }),
            (GarageIntent::Open, Some(vehicle_id)) => {
                self.events.navigate(Screen::VehicleDetail { vehicle_id })
            }
            (GarageIntent::Edit, Some(vehicle_id)) => self.events.navigate(Screen::VehicleForm {
                vehicle_id: Some(vehicle_id),
            }),
            (GarageIntent::Delete, Some(_)) => self.delete_selected(ctx),
            (GarageIntent::OpenReminders, _) => self.events.navigate(Screen::Reminders),
            (GarageIntent::OpenShops, _) => self.events.navigate(Screen::NearbyShops),
            (GarageIntent::SignOut, _) => self.sign_out(ctx),
            _ => {}
        }
    }

    fn refresh(&mut self, ctx: &AppContext) {
        let Some(user) = ctx.current_user() else {
            self.events.navigate(Screen::Login);
            self.events.push(UiEvent::ClearBackStack);
            return;
        };
        let mut vehicles = ctx.repos.vehicles.list_for(&user.id);
        vehicles.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        self.state = GarageUiState {
            owner: user.display_name(),
            selected: clamp_selection(self.state.selected, vehicles.len()),
            vehicles,
        };
    }

    fn delete_selected(&mut self, ctx: &AppContext) {
        let Some(vehicle) = self.state.selected_vehicle().cloned() else {
            return;
        };
        let reminder_ids: Vec<String> = ctx
            .repos
            .reminders
            .list_for(&vehicle.user_id)
            .into_iter()
            .filter(|r| r.vehicle_id == vehicle.id)
            .map(|r| r.id)
            .collect();

        match ctx.repos.delete_vehicle_cascade(&vehicle) {
            Ok(()) => {
                reminder_ids.iter().for_each(|id| ctx.cancel_reminder(id));
                self.events.message(format!("Deleted {}", vehicle.name));
            }
            Err(e) => self.events.message(format!("Could not delete vehicle: {}", e)),
        }
        self.refresh(ctx);
    }

    fn sign_out(&mut self, ctx: &AppContext) {
        if let Err(e) = ctx.auth.sign_out() {
            self.events.message(format!("Could not sign out: {}", e));
            return;
        }
        if let Some(scheduler) = &ctx.scheduler {
            scheduler.stop();
        }
        self.events.navigate(Screen::Login);
        self.events.push(UiEvent::ClearBackStack);
        self.events.message("Signed out");
    }
}

pub fn vehicle_row(v: &Vehicle) -> String {
    let year = v.year.map(|y| format!(" ({})", y)).unwrap_or_default();
    let plate = if v.license_plate.is_empty() {
        String::new()
    } else {
        format!("  [{}]", v.license_plate)
    };
    format!("{} - {} {}{}{}  {} km", v.name, v.make, v.model, year, plate, v.mileage)
}

impl ListModel for GarageViewModel {
    fn summary(&self) -> Vec<String> {
        vec![format!(
            "{} - {} vehicle(s)",
            self.state.owner,
            self.state.vehicles.len()
        )]
    }

    fn rows(&self) -> Vec<String> {
        self.state.vehicles.iter().map(vehicle_row).collect()
    }

    fn selected(&self) -> usize {
        self.state.selected
    }

    fn empty_text(&self) -> &'static str {
        "No vehicles yet. Press n to add one."
    }
}
