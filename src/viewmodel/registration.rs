use crate::mvi::{Intent, Reducer, UiState};
use crate::navigation::Screen;
use crate::validation::{self, FieldCheck};

use super::{AppContext, EventQueue, FieldView, FormModel, UiEvent, parse_toggle};

/// Registration form. Error messages are set only for fields the user has
/// touched; `all_valid` always reflects every field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegistrationUiState {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub accepted_policy: bool,
    pub first_name_error: Option<String>,
    pub last_name_error: Option<String>,
    pub email_error: Option<String>,
    pub password_error: Option<String>,
    pub policy_error: Option<String>,
    pub all_valid: bool,
}

impl UiState for RegistrationUiState {}

impl RegistrationUiState {
    fn checks(&self) -> [FieldCheck; 5] {
        [
            validation::validate_name(&self.first_name, "First name"),
            validation::validate_name(&self.last_name, "Last name"),
            validation::validate_email(&self.email),
            validation::validate_password(&self.password),
            validation::validate_accepted(self.accepted_policy),
        ]
    }

    /// Show every failing field, as on a premature submit
    fn reveal_errors(&mut self) {
        let [first, last, email, password, policy] = self.checks();
        self.first_name_error = first.message;
        self.last_name_error = last.message;
        self.email_error = email.message;
        self.password_error = password.message;
        self.policy_error = policy.message;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationIntent {
    FirstNameChanged(String),
    LastNameChanged(String),
    EmailChanged(String),
    PasswordChanged(String),
    PolicyToggled(bool),
    Submit,
}

impl Intent for RegistrationIntent {}

pub struct RegistrationReducer;

impl Reducer for RegistrationReducer {
    type State = RegistrationUiState;
    type Intent = RegistrationIntent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State {
        let mut next = match intent {
            RegistrationIntent::FirstNameChanged(v) => RegistrationUiState {
                first_name_error: validation::validate_name(&v, "First name").message,
                first_name: v,
                ..state
            },
            RegistrationIntent::LastNameChanged(v) => RegistrationUiState {
                last_name_error: validation::validate_name(&v, "Last name").message,
                last_name: v,
                ..state
            },
            RegistrationIntent::EmailChanged(v) => RegistrationUiState {
                email_error: validation::validate_email(&v).message,
                email: v,
                ..state
            },
            RegistrationIntent::PasswordChanged(v) => RegistrationUiState {
                password_error: validation::validate_password(&v).message,
                password: v,
                ..state
            },
            RegistrationIntent::PolicyToggled(v) => RegistrationUiState {
                policy_error: validation::validate_accepted(v).message,
                accepted_policy: v,
                ..state
            },
            RegistrationIntent::Submit => state,
        };
        next.all_valid = validation::all_valid(&next.checks());
        next
    }
}

#[derive(Default)]
pub struct RegistrationViewModel {
    state: RegistrationUiState,
    events: EventQueue,
}

impl RegistrationViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RegistrationUiState {
        &self.state
    }

    pub fn dispatch(&mut self, ctx: &AppContext, intent: RegistrationIntent) {
        self.state = RegistrationReducer::reduce(std::mem::take(&mut self.state), intent.clone());
        if intent == RegistrationIntent::Submit {
            self.register(ctx);
        }
    }

    fn register(&mut self, ctx: &AppContext) {
        if !self.state.all_valid {
            self.state.reveal_errors();
            self.events.message("Please fix the highlighted fields");
            return;
        }

        let s = &self.state;
        match ctx.auth.sign_up(&s.first_name, &s.last_name, &s.email, &s.password) {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "account created");
                self.state = RegistrationUiState::default();
                self.events.navigate(Screen::Garage);
                self.events.push(UiEvent::ClearBackStack);
                self.events.message(format!("Welcome, {}", user.first_name));
            }
            Err(e) => self.events.message(e.to_string()),
        }
    }
}

impl FormModel for RegistrationViewModel {
    fn fields(&self) -> Vec<FieldView> {
        let s = &self.state;
        vec![
            FieldView::text("First name", &s.first_name, &s.first_name_error),
            FieldView::text("Last name", &s.last_name, &s.last_name_error),
            FieldView::text("Email", &s.email, &s.email_error),
            FieldView::secret("Password", &s.password, &s.password_error),
            FieldView::toggle("I accept the privacy policy", s.accepted_policy, &s.policy_error),
        ]
    }

    fn set_field(&mut self, index: usize, value: String) {
        let intent = match index {
            0 => RegistrationIntent::FirstNameChanged(value),
            1 => RegistrationIntent::LastNameChanged(value),
            2 => RegistrationIntent::EmailChanged(value),
            3 => RegistrationIntent::PasswordChanged(value),
            4 => RegistrationIntent::PolicyToggled(parse_toggle(&value)),
            _ => return,
        };
        self.state = RegistrationReducer::reduce(std::mem::take(&mut self.state), intent);
    }

    fn can_submit(&self) -> bool {
        self.state.all_valid
    }

    fn submit(&mut self, ctx: &AppContext) {
        self.dispatch(ctx, RegistrationIntent::Submit);
    }

    fn drain_events(&mut self) -> Vec<UiEvent> {
        self.events.drain()
    }

    fn links(&self) -> Vec<(&'static str, Screen)> {
        vec![("Already have an account? Sign in", Screen::Login)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewmodel::testing;

    fn filled() -> RegistrationUiState {
        [
            RegistrationIntent::FirstNameChanged("Ada".into()),
            RegistrationIntent::LastNameChanged("Lovelace".into()),
            RegistrationIntent::EmailChanged("ada@example.com".into()),
            RegistrationIntent::PasswordChanged("Abcdefg1!".into()),
            RegistrationIntent::PolicyToggled(true),
        ]
        .into_iter()
        .fold(RegistrationUiState::default(), RegistrationReducer::reduce)
    }

    #[test]
    fn all_valid_recomputed_after_each_change() {
        let state = filled();
        assert!(state.all_valid);

        let state = RegistrationReducer::reduce(state, RegistrationIntent::PolicyToggled(false));
        assert!(!state.all_valid);
        assert!(state.policy_error.is_some());

        let state = RegistrationReducer::reduce(state, RegistrationIntent::PolicyToggled(true));
        let state = RegistrationReducer::reduce(state, RegistrationIntent::PasswordChanged("abcdefg1".into()));
        assert!(!state.all_valid);
        assert!(state.password_error.is_some());
    }

    #[test]
    fn untouched_fields_have_no_errors() {
        let state = RegistrationReducer::reduce(
            RegistrationUiState::default(),
            RegistrationIntent::FirstNameChanged("A".into()),
        );
        assert!(state.first_name_error.is_some());
        assert_eq!(state.email_error, None);
        assert!(!state.all_valid);
    }

    #[test]
    fn submit_creates_account_and_resets_state() {
        let ctx = testing::context();
        let mut vm = RegistrationViewModel::new();
        vm.state = filled();
        vm.submit(&ctx);

        let events = vm.drain_events();
        assert_eq!(events[0], UiEvent::Navigate(Screen::Garage));
        assert_eq!(vm.state(), &RegistrationUiState::default());
        assert_eq!(ctx.current_user().unwrap().email, "ada@example.com");
    }

    #[test]
    fn premature_submit_reveals_errors() {
        let ctx = testing::context();
        let mut vm = RegistrationViewModel::new();
        vm.submit(&ctx);
        assert!(vm.state().email_error.is_some());
        assert!(vm.state().policy_error.is_some());
        assert!(ctx.current_user().is_none());
    }

    #[test]
    fn duplicate_email_is_reported() {
        let (ctx, _) = testing::signed_in_context();
        let mut vm = RegistrationViewModel::new();
        vm.state = RegistrationReducer::reduce(filled(), RegistrationIntent::EmailChanged("driver@example.com".into()));
        vm.submit(&ctx);
        let events = vm.drain_events();
        assert_eq!(
            testing::messages(&events),
            vec!["An account already exists for driver@example.com"]
        );
    }
}
