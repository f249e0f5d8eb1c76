use chrono::Utc;

use crate::efficiency::{self, Efficiency};
use crate::models::{MaintenanceRecord, ReminderStatus, Vehicle};
use crate::mvi::{Intent, UiState};
use crate::navigation::Screen;
use crate::reminder;

use super::{AppContext, EventQueue, UiEvent};

const RECENT_RECORDS: usize = 5;

/// Summary of one vehicle: recent service history, fuel figures and open reminders
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VehicleDetailUiState {
    pub vehicle: Option<Vehicle>,
    pub recent: Vec<MaintenanceRecord>,
    pub maintenance_count: usize,
    pub maintenance_cost: f64,
    pub fuel: Efficiency,
    pub open_reminders: Vec<(String, ReminderStatus)>,
}

impl UiState for VehicleDetailUiState {}

#[derive(Debug, Clone, PartialEq)]
pub enum VehicleDetailIntent {
    Refresh,
    OpenMaintenance,
    OpenFuel,
    AddMaintenance,
    AddFuel,
    AddReminder,
    Edit,
}

impl Intent for VehicleDetailIntent {}

pub struct VehicleDetailViewModel {
    vehicle_id: String,
    state: VehicleDetailUiState,
    events: EventQueue,
}

impl VehicleDetailViewModel {
    pub fn new(ctx: &AppContext, vehicle_id: &str) -> Self {
        let mut vm = Self {
            vehicle_id: vehicle_id.to_string(),
            state: VehicleDetailUiState::default(),
            events: EventQueue::default(),
        };
        vm.refresh(ctx);
        vm
    }

    pub fn state(&self) -> &VehicleDetailUiState {
        &self.state
    }

    pub fn drain_events(&mut self) -> Vec<UiEvent> {
        self.events.drain()
    }

    pub fn dispatch(&mut self, ctx: &AppContext, intent: VehicleDetailIntent) {
        let vehicle_id = self.vehicle_id.clone();
        match intent {
            VehicleDetailIntent::Refresh => self.refresh(ctx),
            VehicleDetailIntent::OpenMaintenance => self.events.navigate(Screen::MaintenanceList {
                vehicle_id,
                category: None,
            }),
            VehicleDetailIntent::OpenFuel => self.events.navigate(Screen::FuelLogs { vehicle_id }),
            VehicleDetailIntent::AddMaintenance => self.events.navigate(Screen::MaintenanceForm {
                vehicle_id,
                record_id: None,
            }),
            VehicleDetailIntent::AddFuel => self.events.navigate(Screen::FuelForm {
                vehicle_id,
                log_id: None,
            }),
            VehicleDetailIntent::AddReminder => self.events.navigate(Screen::ReminderForm { reminder_id: None }),
            VehicleDetailIntent::Edit => self.events.navigate(Screen::VehicleForm {
                vehicle_id: Some(vehicle_id),
            }),
        }
    }

    fn refresh(&mut self, ctx: &AppContext) {
        let Some(vehicle) = ctx.repos.vehicles.get(&self.vehicle_id) else {
            self.events.message("Vehicle not found");
            self.events.push(UiEvent::Back);
            return;
        };

        let mut records = ctx.repos.maintenance.list_for(&vehicle.id);
        records.sort_by(|a, b| b.date.cmp(&a.date));
        let maintenance_cost = records.iter().map(|r| r.cost).sum();
        let maintenance_count = records.len();
        records.truncate(RECENT_RECORDS);

        let fuel = efficiency::calculate(&ctx.repos.fuel_logs.list_for(&vehicle.id));

        let now = Utc::now();
        let mut reminders: Vec<_> = ctx
            .repos
            .reminders
            .list_for(&vehicle.user_id)
            .into_iter()
            .filter(|r| r.vehicle_id == vehicle.id && r.active)
            .map(|r| {
                let status = reminder::status_of(&r, now, ctx.reminders.status_rule);
                (r, status)
            })
            .filter(|(_, status)| !matches!(status, ReminderStatus::Completed | ReminderStatus::Cancelled))
            .collect();
        reminders.sort_by_key(|(r, _)| r.due_date);

        self.state = VehicleDetailUiState {
            vehicle: Some(vehicle),
            recent: records,
            maintenance_count,
            maintenance_cost,
            fuel,
            open_reminders: reminders
                .into_iter()
                .map(|(r, status)| (format!("{} ({})", r.reminder_type, r.due_date.format("%Y-%m-%d")), status))
                .collect(),
        };
    }

    /// Plain text lines for the detail screen
    pub fn lines(&self) -> Vec<String> {
        let s = &self.state;
        let Some(v) = &s.vehicle else {
            return Vec::new();
        };
        let mut lines = vec![
            format!("{} {} {}", v.make, v.model, v.year.map(|y| y.to_string()).unwrap_or_default()),
            format!("Plate: {}   Mileage: {} km", v.license_plate, v.mileage),
            String::new(),
            format!("Services: {}   Total spent: {:.2}", s.maintenance_count, s.maintenance_cost),
        ];
        lines.extend(
            s.recent
                .iter()
                .map(|r| format!("  {}  {}  {:.2}", r.date, r.record_type, r.cost)),
        );
        lines.push(String::new());
        if s.fuel.total_distance > 0.0 {
            lines.push(format!(
                "Fuel: {:.2} km/L   {:.3} per km   over {:.0} km",
                s.fuel.km_per_litre, s.fuel.cost_per_km, s.fuel.total_distance
            ));
        } else {
            lines.push("Fuel: not enough fill-ups yet".to_string());
        }
        lines.push(String::new());
        lines.push(format!("Open reminders: {}", s.open_reminders.len()));
        lines.extend(
            s.open_reminders
                .iter()
                .map(|(label, status)| format!("  {}  {}", status.label(), label)),
        );
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FuelLog, Reminder};
    use crate::viewmodel::testing;
    use chrono::Duration;

    #[test]
    fn summarises_vehicle_history() {
        let (ctx, user) = testing::signed_in_context();
        let vehicle_id = ctx
            .repos
            .vehicles
            .add(&Vehicle {
                id: String::new(),
                name: "Van".to_string(),
                make: "Ford".to_string(),
                model: "Transit".to_string(),
                year: None,
                license_plate: String::new(),
                mileage: 1100,
                user_id: user.id.clone(),
            })
            .unwrap();
        for (date, cost) in [("2024-01-10", 80.0), ("2024-03-02", 120.0)] {
            ctx.repos
                .maintenance
                .add(&MaintenanceRecord {
                    id: String::new(),
                    record_type: "Service".to_string(),
                    date: date.to_string(),
                    mileage: 1000,
                    cost,
                    notes: String::new(),
                    vehicle_id: vehicle_id.clone(),
                })
                .unwrap();
        }
        for (odometer, amount, cost) in [(1000.0, 10.0, 1000.0), (1100.0, 8.0, 800.0)] {
            ctx.repos
                .fuel_logs
                .add(&FuelLog {
                    id: String::new(),
                    vehicle_id: vehicle_id.clone(),
                    amount,
                    cost,
                    date: "2024-03-01".to_string(),
                    odometer,
                    notes: String::new(),
                })
                .unwrap();
        }
        ctx.repos
            .reminders
            .add(&Reminder {
                id: String::new(),
                user_id: user.id.clone(),
                vehicle_id: vehicle_id.clone(),
                reminder_type: "MOT".to_string(),
                due_date: Utc::now() + Duration::days(30),
                odometer_threshold: None,
                notes: String::new(),
                active: true,
                repeat_interval_days: None,
                notify_before_days: vec![],
                manual_status: None,
            })
            .unwrap();

        let vm = VehicleDetailViewModel::new(&ctx, &vehicle_id);
        let state = vm.state();
        assert_eq!(state.maintenance_count, 2);
        assert_eq!(state.maintenance_cost, 200.0);
        assert_eq!(state.recent[0].date, "2024-03-02");
        assert_eq!(state.fuel.km_per_litre, 12.5);
        assert_eq!(state.open_reminders.len(), 1);
        assert_eq!(state.open_reminders[0].1, ReminderStatus::Upcoming);
        assert!(vm.lines().iter().any(|l| l.contains("12.50 km/L")));
    }

    #[test]
    fn navigation_carries_vehicle_id() {
        let (ctx, _) = testing::signed_in_context();
        let mut vm = VehicleDetailViewModel::new(&ctx, "v1");
        vm.drain_events();
        vm.dispatch(&ctx, VehicleDetailIntent::OpenFuel);
        assert_eq!(
            vm.drain_events(),
            vec![UiEvent::Navigate(Screen::FuelLogs { vehicle_id: "v1".to_string() })]
        );
    }
}
