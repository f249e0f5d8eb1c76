use crate::mvi::{Intent, Reducer, UiState};
use crate::validation;

use super::{AppContext, EventQueue, FieldView, FormModel, UiEvent};

/// Two steps: request a code for an email, then apply it with a new password.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForgotPasswordUiState {
    pub email: String,
    pub code: String,
    pub new_password: String,
    pub email_error: Option<String>,
    pub password_error: Option<String>,
    pub code_sent: bool,
}

impl UiState for ForgotPasswordUiState {}

#[derive(Debug, Clone, PartialEq)]
pub enum ForgotPasswordIntent {
    EmailChanged(String),
    CodeChanged(String),
    NewPasswordChanged(String),
    RequestCode,
    ApplyCode,
}

impl Intent for ForgotPasswordIntent {}

pub struct ForgotPasswordReducer;

impl Reducer for ForgotPasswordReducer {
    type State = ForgotPasswordUiState;
    type Intent = ForgotPasswordIntent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            ForgotPasswordIntent::EmailChanged(email) => ForgotPasswordUiState {
                email_error: validation::validate_email(&email).message,
                email,
                ..state
            },
            ForgotPasswordIntent::CodeChanged(code) => ForgotPasswordUiState { code, ..state },
            ForgotPasswordIntent::NewPasswordChanged(new_password) => ForgotPasswordUiState {
                password_error: validation::validate_password(&new_password).message,
                new_password,
                ..state
            },
            ForgotPasswordIntent::RequestCode | ForgotPasswordIntent::ApplyCode => state,
        }
    }
}

#[derive(Default)]
pub struct ForgotPasswordViewModel {
    state: ForgotPasswordUiState,
    events: EventQueue,
}

impl ForgotPasswordViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ForgotPasswordUiState {
        &self.state
    }

    pub fn dispatch(&mut self, ctx: &AppContext, intent: ForgotPasswordIntent) {
        self.state = ForgotPasswordReducer::reduce(std::mem::take(&mut self.state), intent.clone());
        match intent {
            ForgotPasswordIntent::RequestCode => self.request_code(ctx),
            ForgotPasswordIntent::ApplyCode => self.apply_code(ctx),
            _ => {}
        }
    }

    fn request_code(&mut self, ctx: &AppContext) {
        if !validation::validate_email(&self.state.email).valid {
            self.state.email_error = validation::validate_email(&self.state.email).message;
            return;
        }
        match ctx.auth.request_password_reset(&self.state.email) {
            Ok(token) => {
                // No mail transport: the code goes to the local notification channel
                if let Some(token) = token {
                    ctx.notify("Password reset", &format!("Your reset code is {}", token));
                }
                self.state.code_sent = true;
                self.events
                    .message("If an account exists for that email, a reset code has been sent");
            }
            Err(e) => self.events.message(e.to_string()),
        }
    }

    fn apply_code(&mut self, ctx: &AppContext) {
        if self.state.code.trim().is_empty() {
            self.events.message("Enter the reset code");
            return;
        }
        match ctx.auth.reset_password(&self.state.code, &self.state.new_password) {
            Ok(()) => {
                self.state = ForgotPasswordUiState::default();
                self.events.message("Password updated, sign in with your new password");
                self.events.push(UiEvent::Back);
            }
            Err(e) => self.events.message(e.to_string()),
        }
    }
}

impl FormModel for ForgotPasswordViewModel {
    fn fields(&self) -> Vec<FieldView> {
        let s = &self.state;
        let mut fields = vec![FieldView::text("Email", &s.email, &s.email_error)];
        if s.code_sent {
            fields.push(FieldView::text("Reset code", &s.code, &None));
            fields.push(FieldView::secret("New password", &s.new_password, &s.password_error));
        }
        fields
    }

    fn set_field(&mut self, index: usize, value: String) {
        let intent = match index {
            0 => ForgotPasswordIntent::EmailChanged(value),
            1 => ForgotPasswordIntent::CodeChanged(value),
            2 => ForgotPasswordIntent::NewPasswordChanged(value),
            _ => return,
        };
        self.state = ForgotPasswordReducer::reduce(std::mem::take(&mut self.state), intent);
    }

    fn can_submit(&self) -> bool {
        if self.state.code_sent {
            !self.state.code.trim().is_empty() && validation::validate_password(&self.state.new_password).valid
        } else {
            validation::validate_email(&self.state.email).valid
        }
    }

    fn submit(&mut self, ctx: &AppContext) {
        let intent = if self.state.code_sent {
            ForgotPasswordIntent::ApplyCode
        } else {
            ForgotPasswordIntent::RequestCode
        };
        self.dispatch(ctx, intent);
    }

    fn drain_events(&mut self) -> Vec<UiEvent> {
        self.events.drain()
    }
}
