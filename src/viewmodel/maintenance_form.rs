use crate::models::MaintenanceRecord;
use crate::mvi::{Intent, Reducer, UiState};
use crate::utils;
use crate::validation::{self, FieldCheck};

use super::{AppContext, EventQueue, FieldView, FormModel, UiEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceField {
    Type,
    Date,
    Mileage,
    Cost,
    Notes,
}

impl MaintenanceField {
    const ALL: [MaintenanceField; 5] = [
        MaintenanceField::Type,
        MaintenanceField::Date,
        MaintenanceField::Mileage,
        MaintenanceField::Cost,
        MaintenanceField::Notes,
    ];

    fn label(self) -> &'static str {
        match self {
            MaintenanceField::Type => "Type",
            MaintenanceField::Date => "Date (YYYY-MM-DD)",
            MaintenanceField::Mileage => "Mileage (km)",
            MaintenanceField::Cost => "Cost",
            MaintenanceField::Notes => "Notes",
        }
    }

    fn check(self, value: &str) -> FieldCheck {
        match self {
            MaintenanceField::Type => validation::validate_required(value, "Type"),
            MaintenanceField::Date => validation::validate_date(value),
            MaintenanceField::Mileage => validation::validate_whole_number(value, "Mileage"),
            MaintenanceField::Cost => validation::validate_amount(value, "Cost"),
            MaintenanceField::Notes => FieldCheck::ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaintenanceFormUiState {
    pub editing: Option<MaintenanceRecord>,
    pub values: [String; 5],
    pub errors: [Option<String>; 5],
}

impl UiState for MaintenanceFormUiState {}

impl MaintenanceFormUiState {
    fn value(&self, field: MaintenanceField) -> &str {
        &self.values[field as usize]
    }

    fn all_valid(&self) -> bool {
        MaintenanceField::ALL.iter().all(|f| f.check(self.value(*f)).valid)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MaintenanceFormIntent {
    Changed(MaintenanceField, String),
    Save,
}

impl Intent for MaintenanceFormIntent {}

pub struct MaintenanceFormReducer;

impl Reducer for MaintenanceFormReducer {
    type State = MaintenanceFormUiState;
    type Intent = MaintenanceFormIntent;

    fn reduce(mut state: Self::State, intent: Self::Intent) -> Self::State {
        if let MaintenanceFormIntent::Changed(field, value) = intent {
            state.errors[field as usize] = field.check(&value).message;
            state.values[field as usize] = value;
        }
        state
    }
}

pub struct MaintenanceFormViewModel {
    vehicle_id: String,
    state: MaintenanceFormUiState,
    events: EventQueue,
}

impl MaintenanceFormViewModel {
    pub fn new(ctx: &AppContext, vehicle_id: &str, record_id: Option<&str>) -> Self {
        let mut state = MaintenanceFormUiState::default();
        let mut events = EventQueue::default();

        match record_id.map(|id| ctx.repos.maintenance.get(id)) {
            Some(Some(r)) => {
                state.values = [
                    r.record_type.clone(),
                    r.date.clone(),
                    r.mileage.to_string(),
                    format!("{:.2}", r.cost),
                    r.notes.clone(),
                ];
                state.editing = Some(r);
            }
            Some(None) => {
                events.message("Record not found");
                events.push(UiEvent::Back);
            }
            None => {
                let mileage = ctx.repos.vehicles.get(vehicle_id).map(|v| v.mileage).unwrap_or(0);
                state.values[MaintenanceField::Date as usize] = utils::get_current_date_string();
                state.values[MaintenanceField::Mileage as usize] = mileage.to_string();
            }
        }

        Self {
            vehicle_id: vehicle_id.to_string(),
            state,
            events,
        }
    }

    pub fn state(&self) -> &MaintenanceFormUiState {
        &self.state
    }

    pub fn dispatch(&mut self, ctx: &AppContext, intent: MaintenanceFormIntent) {
        self.state = MaintenanceFormReducer::reduce(std::mem::take(&mut self.state), intent.clone());
        if intent == MaintenanceFormIntent::Save {
            self.save(ctx);
        }
    }

    fn build(&self) -> MaintenanceRecord {
        let s = &self.state;
        MaintenanceRecord {
            id: s.editing.as_ref().map(|r| r.id.clone()).unwrap_or_default(),
            record_type: s.value(MaintenanceField::Type).trim().to_string(),
            date: s.value(MaintenanceField::Date).trim().to_string(),
            mileage: s.value(MaintenanceField::Mileage).trim().parse().unwrap_or(0),
            cost: s.value(MaintenanceField::Cost).trim().parse().unwrap_or(0.0),
            notes: s.value(MaintenanceField::Notes).trim().to_string(),
            vehicle_id: self.vehicle_id.clone(),
        }
    }

    fn save(&mut self, ctx: &AppContext) {
        if !self.state.all_valid() {
            for field in MaintenanceField::ALL {
                self.state.errors[field as usize] = field.check(self.state.value(field)).message;
            }
            self.events.message("Please fix the highlighted fields");
            return;
        }

        let record = self.build();
        let result = if record.id.is_empty() {
            ctx.repos.maintenance.add(&record).map(|_| ())
        } else {
            ctx.repos.maintenance.update(&record)
        };
        if let Err(e) = result {
            self.events.message(format!("Could not save record: {}", e));
            return;
        }

        // The odometer only moves forward
        if let Some(mut vehicle) = ctx.repos.vehicles.get(&self.vehicle_id) {
            if record.mileage > vehicle.mileage {
                vehicle.mileage = record.mileage;
                if let Err(e) = ctx.repos.vehicles.update(&vehicle) {
                    tracing::warn!(vehicle_id = %vehicle.id, error = %e, "could not update vehicle mileage");
                }
            }
        }

        self.events.message(format!("Saved {}", record.record_type));
        self.events.push(UiEvent::Back);
    }
}

impl FormModel for MaintenanceFormViewModel {
    fn fields(&self) -> Vec<FieldView> {
        MaintenanceField::ALL
            .iter()
            .map(|f| FieldView::text(f.label(), self.state.value(*f), &self.state.errors[*f as usize]))
            .collect()
    }

    fn set_field(&mut self, index: usize, value: String) {
        if let Some(field) = MaintenanceField::ALL.get(index) {
            self.state = MaintenanceFormReducer::reduce(
                std::mem::take(&mut self.state),
                MaintenanceFormIntent::Changed(*field, value),
            );
        }
    }

    fn can_submit(&self) -> bool {
        self.state.all_valid()
    }

    fn submit(&mut self, ctx: &AppContext) {
        self.dispatch(ctx, MaintenanceFormIntent::Save);
    }

    fn drain_events(&mut self) -> Vec<UiEvent> {
        self.events.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Vehicle;
    use crate::viewmodel::testing;

    fn with_vehicle() -> (AppContext, String) {
        let (ctx, user) = testing::signed_in_context();
        let id = ctx
            .repos
            .vehicles
            .add(&Vehicle {
                id: String::new(),
                name: "Hatch".to_string(),
                make: "VW".to_string(),
                model: "Golf".to_string(),
                year: Some(2012),
                license_plate: String::new(),
                mileage: 90_000,
                user_id: user.id,
            })
            .unwrap();
        (ctx, id)
    }

    #[test]
    fn new_form_defaults_to_today_and_vehicle_mileage() {
        let (ctx, vehicle_id) = with_vehicle();
        let vm = MaintenanceFormViewModel::new(&ctx, &vehicle_id, None);
        let fields = vm.fields();
        assert_eq!(fields[1].value, utils::get_current_date_string());
        assert_eq!(fields[2].value, "90000");
    }

    #[test]
    fn save_adds_record_and_advances_odometer() {
        let (ctx, vehicle_id) = with_vehicle();
        let mut vm = MaintenanceFormViewModel::new(&ctx, &vehicle_id, None);
        vm.set_field(0, "Brake pads".into());
        vm.set_field(1, "2024-05-01".into());
        vm.set_field(2, "91500".into());
        vm.set_field(3, "180.50".into());
        vm.submit(&ctx);

        let records = ctx.repos.maintenance.list_for(&vehicle_id);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cost, 180.5);
        assert_eq!(ctx.repos.vehicles.get(&vehicle_id).unwrap().mileage, 91_500);
        assert_eq!(vm.drain_events().last(), Some(&UiEvent::Back));
    }

    #[test]
    fn bad_date_is_rejected() {
        let (ctx, vehicle_id) = with_vehicle();
        let mut vm = MaintenanceFormViewModel::new(&ctx, &vehicle_id, None);
        vm.set_field(0, "Oil".into());
        vm.set_field(1, "05/01/2024".into());
        vm.set_field(3, "10".into());
        assert!(!vm.can_submit());
        assert_eq!(vm.fields()[1].error.as_deref(), Some("Date must be YYYY-MM-DD"));
        vm.submit(&ctx);
        assert!(ctx.repos.maintenance.list_for(&vehicle_id).is_empty());
    }

    #[test]
    fn edit_updates_in_place() {
        let (ctx, vehicle_id) = with_vehicle();
        let id = ctx
            .repos
            .maintenance
            .add(&MaintenanceRecord {
                id: String::new(),
                record_type: "Oil".to_string(),
                date: "2024-01-01".to_string(),
                mileage: 85_000,
                cost: 40.0,
                notes: String::new(),
                vehicle_id: vehicle_id.clone(),
            })
            .unwrap();

        let mut vm = MaintenanceFormViewModel::new(&ctx, &vehicle_id, Some(&id));
        assert_eq!(vm.fields()[3].value, "40.00");
        vm.set_field(4, "synthetic".into());
        vm.submit(&ctx);

        let stored = ctx.repos.maintenance.get(&id).unwrap();
        assert_eq!(stored.notes, "synthetic");
        assert_eq!(ctx.repos.maintenance.list_for(&vehicle_id).len(), 1);
        // Older reading leaves the odometer alone
        assert_eq!(ctx.repos.vehicles.get(&vehicle_id).unwrap().mileage, 90_000);
    }
}
