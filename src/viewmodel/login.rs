use crate::mvi::{Intent, Reducer, UiState};
use crate::navigation::Screen;
use crate::validation;

use super::{AppContext, EventQueue, FieldView, FormModel, UiEvent};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoginUiState {
    pub email: String,
    pub password: String,
    pub email_error: Option<String>,
    pub password_error: Option<String>,
    pub is_valid: bool,
}

impl UiState for LoginUiState {}

#[derive(Debug, Clone, PartialEq)]
pub enum LoginIntent {
    EmailChanged(String),
    PasswordChanged(String),
    Submit,
}

impl Intent for LoginIntent {}

pub struct LoginReducer;

impl Reducer for LoginReducer {
    type State = LoginUiState;
    type Intent = LoginIntent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State {
        let mut next = match intent {
            LoginIntent::EmailChanged(email) => LoginUiState {
                email_error: validation::validate_email(&email).message,
                email,
                ..state
            },
            LoginIntent::PasswordChanged(password) => LoginUiState {
                password_error: validation::validate_required(&password, "Password").message,
                password,
                ..state
            },
            LoginIntent::Submit => state,
        };
        next.is_valid = validation::validate_email(&next.email).valid
            && validation::validate_required(&next.password, "Password").valid;
        next
    }
}

#[derive(Default)]
pub struct LoginViewModel {
    state: LoginUiState,
    events: EventQueue,
}

impl LoginViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &LoginUiState {
        &self.state
    }

    pub fn dispatch(&mut self, ctx: &AppContext, intent: LoginIntent) {
        self.state = LoginReducer::reduce(std::mem::take(&mut self.state), intent.clone());
        if intent == LoginIntent::Submit {
            self.sign_in(ctx);
        }
    }

    fn sign_in(&mut self, ctx: &AppContext) {
        if !self.state.is_valid {
            let email = validation::validate_email(&self.state.email);
            let password = validation::validate_required(&self.state.password, "Password");
            self.state.email_error = email.message;
            self.state.password_error = password.message;
            self.events.message("Enter your email and password");
            return;
        }

        match ctx.auth.sign_in(&self.state.email, &self.state.password) {
            Ok(user) => {
                ctx.schedule_user_reminders(&user.id);
                self.state = LoginUiState::default();
                self.events.navigate(Screen::Garage);
                self.events.push(UiEvent::ClearBackStack);
                self.events.message(format!("Welcome back, {}", user.first_name));
            }
            Err(e) => {
                self.state.password.clear();
                self.state.is_valid = false;
                self.events.message(e.to_string());
            }
        }
    }
}

impl FormModel for LoginViewModel {
    fn fields(&self) -> Vec<FieldView> {
        vec![
            FieldView::text("Email", &self.state.email, &self.state.email_error),
            FieldView::secret("Password", &self.state.password, &self.state.password_error),
        ]
    }

    fn set_field(&mut self, index: usize, value: String) {
        let intent = match index {
            0 => LoginIntent::EmailChanged(value),
            1 => LoginIntent::PasswordChanged(value),
            _ => return,
        };
        self.state = LoginReducer::reduce(std::mem::take(&mut self.state), intent);
    }

    fn can_submit(&self) -> bool {
        self.state.is_valid
    }

    fn submit(&mut self, ctx: &AppContext) {
        self.dispatch(ctx, LoginIntent::Submit);
    }

    fn drain_events(&mut self) -> Vec<UiEvent> {
        self.events.drain()
    }

    fn links(&self) -> Vec<(&'static str, Screen)> {
        vec![
            ("Create account", Screen::Registration),
            ("Forgot password", Screen::ForgotPassword),
        ]
    }
}
