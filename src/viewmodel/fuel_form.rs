use crate::models::FuelLog;
use crate::mvi::{Intent, Reducer, UiState};
use crate::utils;
use crate::validation::{self, FieldCheck};

use super::{AppContext, EventQueue, FieldView, FormModel, UiEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuelField {
    Litres,
    Cost,
    Date,
    Odometer,
    Notes,
}

impl FuelField {
    const ALL: [FuelField; 5] = [
        FuelField::Litres,
        FuelField::Cost,
        FuelField::Date,
        FuelField::Odometer,
        FuelField::Notes,
    ];

    fn label(self) -> &'static str {
        match self {
            FuelField::Litres => "Litres",
            FuelField::Cost => "Cost",
            FuelField::Date => "Date (YYYY-MM-DD)",
            FuelField::Odometer => "Odometer (km)",
            FuelField::Notes => "Notes",
        }
    }

    fn check(self, value: &str) -> FieldCheck {
        match self {
            FuelField::Litres => validation::validate_amount(value, "Litres"),
            FuelField::Cost => validation::validate_amount(value, "Cost"),
            FuelField::Date => validation::validate_date(value),
            FuelField::Odometer => validation::validate_amount(value, "Odometer"),
            FuelField::Notes => FieldCheck::ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FuelFormUiState {
    pub editing: Option<FuelLog>,
    pub values: [String; 5],
    pub errors: [Option<String>; 5],
}

impl UiState for FuelFormUiState {}

impl FuelFormUiState {
    fn value(&self, field: FuelField) -> &str {
        &self.values[field as usize]
    }

    fn all_valid(&self) -> bool {
        FuelField::ALL.iter().all(|f| f.check(self.value(*f)).valid)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FuelFormIntent {
    Changed(FuelField, String),
    Save,
}

impl Intent for FuelFormIntent {}

pub struct FuelFormReducer;

impl Reducer for FuelFormReducer {
    type State = FuelFormUiState;
    type Intent = FuelFormIntent;

    fn reduce(mut state: Self::State, intent: Self::Intent) -> Self::State {
        if let FuelFormIntent::Changed(field, value) = intent {
            state.errors[field as usize] = field.check(&value).message;
            state.values[field as usize] = value;
        }
        state
    }
}

pub struct FuelFormViewModel {
    vehicle_id: String,
    state: FuelFormUiState,
    events: EventQueue,
}

impl FuelFormViewModel {
    pub fn new(ctx: &AppContext, vehicle_id: &str, log_id: Option<&str>) -> Self {
        let mut state = FuelFormUiState::default();
        let mut events = EventQueue::default();

        match log_id.map(|id| ctx.repos.fuel_logs.get(id)) {
            Some(Some(log)) => {
                state.values = [
                    log.amount.to_string(),
                    format!("{:.2}", log.cost),
                    log.date.clone(),
                    log.odometer.to_string(),
                    log.notes.clone(),
                ];
                state.editing = Some(log);
            }
            Some(None) => {
                events.message("Fill-up not found");
                events.push(UiEvent::Back);
            }
            None => {
                state.values[FuelField::Date as usize] = utils::get_current_date_string();
            }
        }

        Self {
            vehicle_id: vehicle_id.to_string(),
            state,
            events,
        }
    }

    pub fn state(&self) -> &FuelFormUiState {
        &self.state
    }

    pub fn dispatch(&mut self, ctx: &AppContext, intent: FuelFormIntent) {
        self.state = FuelFormReducer::reduce(std::mem::take(&mut self.state), intent.clone());
        if intent == FuelFormIntent::Save {
            self.save(ctx);
        }
    }

    fn build(&self) -> FuelLog {
        let s = &self.state;
        let number = |field: FuelField| s.value(field).trim().parse::<f64>().unwrap_or(0.0);
        FuelLog {
            id: s.editing.as_ref().map(|l| l.id.clone()).unwrap_or_default(),
            vehicle_id: self.vehicle_id.clone(),
            amount: number(FuelField::Litres),
            cost: number(FuelField::Cost),
            date: s.value(FuelField::Date).trim().to_string(),
            odometer: number(FuelField::Odometer),
            notes: s.value(FuelField::Notes).trim().to_string(),
        }
    }

    fn save(&mut self, ctx: &AppContext) {
        if !self.state.all_valid() {
            for field in FuelField::ALL {
                self.state.errors[field as usize] = field.check(self.state.value(field)).message;
            }
            self.events.message("Please fix the highlighted fields");
            return;
        }

        let log = self.build();
        let result = if log.id.is_empty() {
            ctx.repos.fuel_logs.add(&log).map(|_| ())
        } else {
            ctx.repos.fuel_logs.update(&log)
        };
        match result {
            Ok(()) => {
                self.events.message(format!("Saved fill-up of {:.2} L", log.amount));
                self.events.push(UiEvent::Back);
            }
            Err(e) => self.events.message(format!("Could not save fill-up: {}", e)),
        }
    }
}

impl FormModel for FuelFormViewModel {
    fn fields(&self) -> Vec<FieldView> {
        FuelField::ALL
            .iter()
            .map(|f| FieldView::text(f.label(), self.state.value(*f), &self.state.errors[*f as usize]))
            .collect()
    }

    fn set_field(&mut self, index: usize, value: String) {
        if let Some(field) = FuelField::ALL.get(index) {
            self.state = FuelFormReducer::reduce(std::mem::take(&mut self.state), FuelFormIntent::Changed(*field, value));
        }
    }

    fn can_submit(&self) -> bool {
        self.state.all_valid()
    }

    fn submit(&mut self, ctx: &AppContext) {
        self.dispatch(ctx, FuelFormIntent::Save);
    }

    fn drain_events(&mut self) -> Vec<UiEvent> {
        self.events.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewmodel::testing;

    #[test]
    fn save_new_fill_up() {
        let ctx = testing::context();
        let mut vm = FuelFormViewModel::new(&ctx, "v1", None);
        vm.set_field(0, "42.5".into());
        vm.set_field(1, "71.40".into());
        vm.set_field(3, "123456".into());
        assert!(vm.can_submit());
        vm.submit(&ctx);

        let logs = ctx.repos.fuel_logs.list_for("v1");
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].amount, 42.5);
        assert_eq!(logs[0].date, utils::get_current_date_string());
        assert_eq!(
            testing::messages(&vm.drain_events()),
            vec!["Saved fill-up of 42.50 L"]
        );
    }

    #[test]
    fn negative_amount_rejected() {
        let ctx = testing::context();
        let mut vm = FuelFormViewModel::new(&ctx, "v1", None);
        vm.set_field(0, "-3".into());
        assert_eq!(vm.fields()[0].error.as_deref(), Some("Litres cannot be negative"));
        assert!(!vm.can_submit());
    }

    #[test]
    fn edit_prefills_values() {
        let ctx = testing::context();
        let id = ctx
            .repos
            .fuel_logs
            .add(&FuelLog {
                id: String::new(),
                vehicle_id: "v1".to_string(),
                amount: 30.0,
                cost: 45.0,
                date: "2024-02-02".to_string(),
                odometer: 5000.0,
                notes: "motorway".to_string(),
            })
            .unwrap();
        let mut vm = FuelFormViewModel::new(&ctx, "v1", Some(&id));
        assert_eq!(vm.fields()[2].value, "2024-02-02");
        vm.set_field(1, "47.00".into());
        vm.submit(&ctx);
        assert_eq!(ctx.repos.fuel_logs.get(&id).unwrap().cost, 47.0);
    }
}
