//! Local email/password accounts with a single persisted session.

use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::database::{DocumentFilter, DocumentStore};
use crate::models::{PasswordReset, Session, User};
use crate::repository::{Repository, RepositoryError};
use crate::validation;

const SESSION_ID: &str = "current";
const RESET_TOKEN_TTL_HOURS: i64 = 1;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("An account already exists for {0}")]
    EmailInUse(String),
    #[error("Reset token is invalid or has expired")]
    InvalidToken,
    #[error("{0}")]
    WeakPassword(String),
    #[error("Not signed in")]
    NotSignedIn,
    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub struct AuthService {
    users: Repository<User>,
    sessions: Repository<Session>,
    resets: Repository<PasswordReset>,
    hash_cost: u32,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AuthService {
    pub fn new(store: Rc<dyn DocumentStore>) -> Self {
        Self::with_cost(store, bcrypt::DEFAULT_COST)
    }

    /// Use a custom bcrypt cost (tests use the minimum)
    pub fn with_cost(store: Rc<dyn DocumentStore>, hash_cost: u32) -> Self {
        Self {
            users: Repository::new(Rc::clone(&store)),
            sessions: Repository::new(Rc::clone(&store)),
            resets: Repository::new(store),
            hash_cost,
        }
    }

    fn find_by_email(&self, email: &str) -> Option<User> {
        self.users
            .list(&DocumentFilter::all().with_category(normalize_email(email)))
            .into_iter()
            .next()
    }

    fn start_session(&self, user: &User) -> Result<(), AuthError> {
        let session = Session {
            id: SESSION_ID.to_string(),
            user_id: user.id.clone(),
            signed_in_at: Utc::now(),
        };
        self.sessions.update(&session)?;
        tracing::info!(user_id = %user.id, "session started");
        Ok(())
    }

    pub fn sign_up(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let email = normalize_email(email);
        if let Some(message) = validation::validate_password(password).message {
            return Err(AuthError::WeakPassword(message));
        }
        if self.find_by_email(&email).is_some() {
            return Err(AuthError::EmailInUse(email));
        }

        let mut user = User {
            id: String::new(),
            email,
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            password_hash: bcrypt::hash(password, self.hash_cost)?,
            created_at: Utc::now(),
        };
        user.id = self.users.add(&user)?;
        self.start_session(&user)?;
        Ok(user)
    }

    pub fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self.find_by_email(email).ok_or(AuthError::InvalidCredentials)?;
        if !bcrypt::verify(password, &user.password_hash)? {
            tracing::info!(email = %user.email, "rejected sign-in");
            return Err(AuthError::InvalidCredentials);
        }
        self.start_session(&user)?;
        Ok(user)
    }

    pub fn sign_out(&self) -> Result<(), AuthError> {
        self.sessions.delete(SESSION_ID)?;
        Ok(())
    }

    /// The signed-in user, if the session still points at an existing account
    pub fn current_user(&self) -> Option<User> {
        let session = self.sessions.get(SESSION_ID)?;
        self.users.get(&session.user_id)
    }

    pub fn require_user(&self) -> Result<User, AuthError> {
        self.current_user().ok_or(AuthError::NotSignedIn)
    }

    /// Issue a reset token for `email`.
    ///
    /// Returns `None` for unknown addresses so callers cannot probe for
    /// accounts; the caller still reports success to the user.
    pub fn request_password_reset(&self, email: &str) -> Result<Option<String>, AuthError> {
        self.request_password_reset_at(email, Utc::now())
    }

    pub fn request_password_reset_at(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, AuthError> {
        let Some(user) = self.find_by_email(email) else {
            tracing::info!("password reset requested for unknown email");
            return Ok(None);
        };
        let reset = PasswordReset {
            id: uuid::Uuid::new_v4().simple().to_string(),
            user_id: user.id,
            expires_at: now + Duration::hours(RESET_TOKEN_TTL_HOURS),
        };
        let token = self.resets.add(&reset)?;
        Ok(Some(token))
    }

    pub fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        self.reset_password_at(token, new_password, Utc::now())
    }

    pub fn reset_password_at(
        &self,
        token: &str,
        new_password: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let reset = self.resets.get(token.trim()).ok_or(AuthError::InvalidToken)?;
        if reset.expires_at < now {
            self.resets.delete(&reset.id)?;
            return Err(AuthError::InvalidToken);
        }
        if let Some(message) = validation::validate_password(new_password).message {
            return Err(AuthError::WeakPassword(message));
        }
        let mut user = self.users.get(&reset.user_id).ok_or(AuthError::InvalidToken)?;
        user.password_hash = bcrypt::hash(new_password, self.hash_cost)?;
        self.users.update(&user)?;
        self.resets.delete(&reset.id)?;
        tracing::info!(user_id = %user.id, "password reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    fn service() -> AuthService {
        let store: Rc<dyn DocumentStore> = Rc::new(Database::in_memory().unwrap());
        AuthService::with_cost(store, 4)
    }

    #[test]
    fn sign_up_then_sign_in() {
        let auth = service();
        let user = auth.sign_up("Ada", "Lovelace", " Ada@Example.com ", "Abcdefg1!").unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(auth.current_user().unwrap().id, user.id);

        auth.sign_out().unwrap();
        assert!(auth.current_user().is_none());

        let again = auth.sign_in("ada@example.com", "Abcdefg1!").unwrap();
        assert_eq!(again.id, user.id);
        assert!(matches!(
            auth.sign_in("ada@example.com", "wrong"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn duplicate_email_rejected() {
        let auth = service();
        auth.sign_up("Ada", "Lovelace", "ada@example.com", "Abcdefg1!").unwrap();
        assert!(matches!(
            auth.sign_up("Ada", "L", "ADA@example.com", "Abcdefg1!"),
            Err(AuthError::EmailInUse(_))
        ));
    }

    #[test]
    fn weak_password_rejected() {
        let auth = service();
        assert!(matches!(
            auth.sign_up("Ada", "Lovelace", "ada@example.com", "password"),
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[test]
    fn password_reset_flow() {
        let auth = service();
        auth.sign_up("Ada", "Lovelace", "ada@example.com", "Abcdefg1!").unwrap();
        assert_eq!(auth.request_password_reset("nobody@example.com").unwrap(), None);

        let token = auth.request_password_reset("ada@example.com").unwrap().unwrap();
        auth.reset_password(&token, "Newpass9#").unwrap();
        assert!(auth.sign_in("ada@example.com", "Newpass9#").is_ok());
        assert!(matches!(
            auth.reset_password(&token, "Another1!"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_rejected() {
        let auth = service();
        auth.sign_up("Ada", "Lovelace", "ada@example.com", "Abcdefg1!").unwrap();
        let issued = Utc::now() - Duration::hours(3);
        let token = auth
            .request_password_reset_at("ada@example.com", issued)
            .unwrap()
            .unwrap();
        assert!(matches!(
            auth.reset_password(&token, "Newpass9#"),
            Err(AuthError::InvalidToken)
        ));
    }
}
