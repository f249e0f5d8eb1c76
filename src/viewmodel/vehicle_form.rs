use crate::models::Vehicle;
use crate::mvi::{Intent, Reducer, UiState};
use crate::validation::{self, FieldCheck};

use super::{AppContext, EventQueue, FieldView, FormModel, UiEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleField {
    Name,
    Make,
    Model,
    Year,
    LicensePlate,
    Mileage,
}

impl VehicleField {
    const ALL: [VehicleField; 6] = [
        VehicleField::Name,
        VehicleField::Make,
        VehicleField::Model,
        VehicleField::Year,
        VehicleField::LicensePlate,
        VehicleField::Mileage,
    ];

    fn label(self) -> &'static str {
        match self {
            VehicleField::Name => "Name",
            VehicleField::Make => "Make",
            VehicleField::Model => "Model",
            VehicleField::Year => "Year",
            VehicleField::LicensePlate => "License plate",
            VehicleField::Mileage => "Mileage (km)",
        }
    }

    fn check(self, value: &str) -> FieldCheck {
        match self {
            VehicleField::Name => validation::validate_required(value, "Name"),
            VehicleField::Make => validation::validate_required(value, "Make"),
            VehicleField::Model => validation::validate_required(value, "Model"),
            VehicleField::Year => validation::validate_year(value),
            VehicleField::LicensePlate => FieldCheck::ok(),
            VehicleField::Mileage => validation::validate_whole_number(value, "Mileage"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct VehicleFormUiState {
    pub editing: Option<Vehicle>,
    pub values: [String; 6],
    pub errors: [Option<String>; 6],
}

impl UiState for VehicleFormUiState {}

impl VehicleFormUiState {
    fn value(&self, field: VehicleField) -> &str {
        &self.values[field as usize]
    }

    fn all_valid(&self) -> bool {
        VehicleField::ALL.iter().all(|f| f.check(self.value(*f)).valid)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VehicleFormIntent {
    Changed(VehicleField, String),
    Save,
}

impl Intent for VehicleFormIntent {}

pub struct VehicleFormReducer;

impl Reducer for VehicleFormReducer {
    type State = VehicleFormUiState;
    type Intent = VehicleFormIntent;

    fn reduce(mut state: Self::State, intent: Self::Intent) -> Self::State {
        if let VehicleFormIntent::Changed(field, value) = intent {
            state.errors[field as usize] = field.check(&value).message;
            state.values[field as usize] = value;
        }
        state
    }
}

pub struct VehicleFormViewModel {
    state: VehicleFormUiState,
    events: EventQueue,
}

impl VehicleFormViewModel {
    /// Empty form, or pre-filled from the stored vehicle when editing
    pub fn new(ctx: &AppContext, vehicle_id: Option<&str>) -> Self {
        let mut state = VehicleFormUiState {
            values: Default::default(),
            errors: Default::default(),
            editing: None,
        };
        state.values[VehicleField::Mileage as usize] = "0".to_string();

        let mut events = EventQueue::default();
        if let Some(id) = vehicle_id {
            match ctx.repos.vehicles.get(id) {
                Some(v) => {
                    state.values = [
                        v.name.clone(),
                        v.make.clone(),
                        v.model.clone(),
                        v.year.map(|y| y.to_string()).unwrap_or_default(),
                        v.license_plate.clone(),
                        v.mileage.to_string(),
                    ];
                    state.editing = Some(v);
                }
                None => {
                    events.message("Vehicle not found");
                    events.push(UiEvent::Back);
                }
            }
        }
        Self { state, events }
    }

    pub fn state(&self) -> &VehicleFormUiState {
        &self.state
    }

    pub fn dispatch(&mut self, ctx: &AppContext, intent: VehicleFormIntent) {
        self.state = VehicleFormReducer::reduce(std::mem::take(&mut self.state), intent.clone());
        if intent == VehicleFormIntent::Save {
            self.save(ctx);
        }
    }

    fn build(&self, user_id: String) -> Vehicle {
        let s = &self.state;
        let year = s.value(VehicleField::Year).trim();
        Vehicle {
            id: s.editing.as_ref().map(|v| v.id.clone()).unwrap_or_default(),
            name: s.value(VehicleField::Name).trim().to_string(),
            make: s.value(VehicleField::Make).trim().to_string(),
            model: s.value(VehicleField::Model).trim().to_string(),
            year: year.parse().ok(),
            license_plate: s.value(VehicleField::LicensePlate).trim().to_uppercase(),
            mileage: s.value(VehicleField::Mileage).trim().parse().unwrap_or(0),
            user_id,
        }
    }

    fn save(&mut self, ctx: &AppContext) {
        if !self.state.all_valid() {
            for field in VehicleField::ALL {
                self.state.errors[field as usize] = field.check(self.state.value(field)).message;
            }
            self.events.message("Please fix the highlighted fields");
            return;
        }

        let user_id = match &self.state.editing {
            Some(v) => v.user_id.clone(),
            None => match ctx.current_user() {
                Some(user) => user.id,
                None => {
                    self.events.message("Sign in to add vehicles");
                    return;
                }
            },
        };
        let vehicle = self.build(user_id);

        let result = if vehicle.id.is_empty() {
            ctx.repos.vehicles.add(&vehicle).map(|_| ())
        } else {
            ctx.repos.vehicles.update(&vehicle)
        };
        match result {
            Ok(()) => {
                self.events.message(format!("Saved {}", vehicle.name));
                self.events.push(UiEvent::Back);
            }
            Err(e) => self.events.message(format!("Could not save vehicle: {}", e)),
        }
    }
}

impl FormModel for VehicleFormViewModel {
    fn fields(&self) -> Vec<FieldView> {
        VehicleField::ALL
            .iter()
            .map(|f| FieldView::text(f.label(), self.state.value(*f), &self.state.errors[*f as usize]))
            .collect()
    }

    fn set_field(&mut self, index: usize, value: String) {
        if let Some(field) = VehicleField::ALL.get(index) {
            self.state = VehicleFormReducer::reduce(
                std::mem::take(&mut self.state),
                VehicleFormIntent::Changed(*field, value),
            );
        }
    }

    fn can_submit(&self) -> bool {
        self.state.all_valid()
    }

    fn submit(&mut self, ctx: &AppContext) {
        self.dispatch(ctx, VehicleFormIntent::Save);
    }

    fn drain_events(&mut self) -> Vec<UiEvent> {
        self.events.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewmodel::testing;

    fn fill(vm: &mut VehicleFormViewModel, values: [&str; 6]) {
        for (i, v) in values.iter().enumerate() {
            vm.set_field(i, v.to_string());
        }
    }

    #[test]
    fn add_vehicle_for_current_user() {
        let (ctx, user) = testing::signed_in_context();
        let mut vm = VehicleFormViewModel::new(&ctx, None);
        fill(&mut vm, ["Daily", "Honda", "Jazz", "2016", "ab12 cde", "81000"]);
        assert!(vm.can_submit());
        vm.submit(&ctx);

        let stored = ctx.repos.vehicles.list_for(&user.id);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].license_plate, "AB12 CDE");
        assert_eq!(stored[0].year, Some(2016));
        assert_eq!(vm.drain_events().last(), Some(&UiEvent::Back));
    }

    #[test]
    fn edit_keeps_id_and_owner() {
        let (ctx, user) = testing::signed_in_context();
        let mut vm = VehicleFormViewModel::new(&ctx, None);
        fill(&mut vm, ["Daily", "Honda", "Jazz", "", "", "100"]);
        vm.submit(&ctx);
        let id = ctx.repos.vehicles.list_for(&user.id)[0].id.clone();

        let mut vm = VehicleFormViewModel::new(&ctx, Some(&id));
        assert_eq!(vm.fields()[0].value, "Daily");
        vm.set_field(5, "250".into());
        vm.submit(&ctx);

        let stored = ctx.repos.vehicles.get(&id).unwrap();
        assert_eq!(stored.mileage, 250);
        assert_eq!(stored.year, None);
        assert_eq!(ctx.repos.vehicles.list_for(&user.id).len(), 1);
    }

    #[test]
    fn invalid_input_blocks_save() {
        let (ctx, user) = testing::signed_in_context();
        let mut vm = VehicleFormViewModel::new(&ctx, None);
        fill(&mut vm, ["Daily", "", "Jazz", "1800", "", "-5"]);
        assert!(!vm.can_submit());
        vm.submit(&ctx);
        let fields = vm.fields();
        assert!(fields[1].error.is_some());
        assert!(fields[3].error.is_some());
        assert!(fields[5].error.is_some());
        assert!(ctx.repos.vehicles.list_for(&user.id).is_empty());
    }

    #[test]
    fn missing_vehicle_goes_back() {
        let (ctx, _) = testing::signed_in_context();
        let mut vm = VehicleFormViewModel::new(&ctx, Some("nope"));
        assert_eq!(vm.drain_events().last(), Some(&UiEvent::Back));
    }
}
