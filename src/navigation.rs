//! Screen router: an immutable current-screen plus back-stack value.

use crate::mvi::{Intent, Reducer, UiState};

/// Every destination in the app. Variants carry the ids the screen needs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Login,
    Registration,
    ForgotPassword,
    /// Vehicle list for the signed-in user
    Garage,
    VehicleForm {
        vehicle_id: Option<String>,
    },
    VehicleDetail {
        vehicle_id: String,
    },
    MaintenanceList {
        vehicle_id: String,
        category: Option<String>,
    },
    MaintenanceForm {
        vehicle_id: String,
        record_id: Option<String>,
    },
    FuelLogs {
        vehicle_id: String,
    },
    FuelForm {
        vehicle_id: String,
        log_id: Option<String>,
    },
    Reminders,
    ReminderForm {
        reminder_id: Option<String>,
    },
    NearbyShops,
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Screen::Login => "Sign in",
            Screen::Registration => "Create account",
            Screen::ForgotPassword => "Reset password",
            Screen::Garage => "Garage",
            Screen::VehicleForm { vehicle_id: None } => "Add vehicle",
            Screen::VehicleForm { vehicle_id: Some(_) } => "Edit vehicle",
            Screen::VehicleDetail { .. } => "Vehicle",
            Screen::MaintenanceList { .. } => "Maintenance",
            Screen::MaintenanceForm { record_id: None, .. } => "Add maintenance",
            Screen::MaintenanceForm { record_id: Some(_), .. } => "Edit maintenance",
            Screen::FuelLogs { .. } => "Fuel",
            Screen::FuelForm { log_id: None, .. } => "Add fill-up",
            Screen::FuelForm { log_id: Some(_), .. } => "Edit fill-up",
            Screen::Reminders => "Reminders",
            Screen::ReminderForm { reminder_id: None } => "Add reminder",
            Screen::ReminderForm { reminder_id: Some(_) } => "Edit reminder",
            Screen::NearbyShops => "Nearby shops",
        }
    }

    /// Screens reachable without a session
    pub fn is_public(&self) -> bool {
        matches!(self, Screen::Login | Screen::Registration | Screen::ForgotPassword)
    }
}

/// Current screen plus the screens to return to, most recent last.
///
/// Every operation consumes the navigator and returns the next one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Navigator {
    current: Screen,
    back_stack: Vec<Screen>,
}

impl Navigator {
    pub fn new(start: Screen) -> Self {
        Self {
            current: start,
            back_stack: Vec::new(),
        }
    }

    pub fn current(&self) -> &Screen {
        &self.current
    }

    pub fn back_stack(&self) -> &[Screen] {
        &self.back_stack
    }

    pub fn can_go_back(&self) -> bool {
        !self.back_stack.is_empty()
    }

    /// Push the current screen and show `screen`. Repeats are not collapsed.
    pub fn navigate_to(mut self, screen: Screen) -> Self {
        let previous = std::mem::replace(&mut self.current, screen);
        self.back_stack.push(previous);
        self
    }

    /// Return to the previous screen; unchanged when there is none
    pub fn navigate_back(mut self) -> Self {
        if let Some(previous) = self.back_stack.pop() {
            self.current = previous;
        }
        self
    }

    pub fn clear_back_stack(mut self) -> Self {
        self.back_stack.clear();
        self
    }
}

impl UiState for Navigator {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavIntent {
    NavigateTo(Screen),
    Back,
    ClearBackStack,
}

impl Intent for NavIntent {}

pub struct NavigationReducer;

impl Reducer for NavigationReducer {
    type State = Navigator;
    type Intent = NavIntent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            NavIntent::NavigateTo(screen) => state.navigate_to(screen),
            NavIntent::Back => state.navigate_back(),
            NavIntent::ClearBackStack => state.clear_back_stack(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_then_back_returns_to_start() {
        let nav = Navigator::new(Screen::Login)
            .navigate_to(Screen::Garage)
            .navigate_to(Screen::Reminders);
        assert_eq!(nav.current(), &Screen::Reminders);
        assert_eq!(nav.back_stack().len(), 2);

        let nav = nav.navigate_back().navigate_back();
        assert_eq!(nav.current(), &Screen::Login);
        assert!(!nav.can_go_back());
    }

    #[test]
    fn back_on_empty_stack_is_noop() {
        let nav = Navigator::new(Screen::Garage);
        let after = nav.clone().navigate_back();
        assert_eq!(after, nav);
    }

    #[test]
    fn clear_keeps_current() {
        let nav = Navigator::new(Screen::Login)
            .navigate_to(Screen::Garage)
            .clear_back_stack();
        assert_eq!(nav.current(), &Screen::Garage);
        assert!(nav.back_stack().is_empty());
    }

    #[test]
    fn duplicates_are_kept() {
        let nav = Navigator::new(Screen::Garage)
            .navigate_to(Screen::Garage)
            .navigate_to(Screen::Garage);
        assert_eq!(nav.back_stack(), &[Screen::Garage, Screen::Garage]);
    }

    #[test]
    fn reducer_matches_methods() {
        let via_reducer = [
            NavIntent::NavigateTo(Screen::Garage),
            NavIntent::NavigateTo(Screen::NearbyShops),
            NavIntent::Back,
            NavIntent::NavigateTo(Screen::Reminders),
            NavIntent::ClearBackStack,
        ]
        .into_iter()
        .fold(Navigator::default(), NavigationReducer::reduce);

        let via_methods = Navigator::default()
            .navigate_to(Screen::Garage)
            .navigate_to(Screen::NearbyShops)
            .navigate_back()
            .navigate_to(Screen::Reminders)
            .clear_back_stack();
        assert_eq!(via_reducer, via_methods);
        assert_eq!(via_reducer.current(), &Screen::Reminders);
    }
}
