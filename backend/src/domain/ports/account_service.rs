//! Driving port for email and password authentication.

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{
    Account, Error, SignInCredentials, SignUpCredentials, USERNAME_MAX, UserId, Username,
};

/// Port for registering accounts and checking credentials.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Register a new account.
    async fn sign_up(&self, credentials: SignUpCredentials) -> Result<Account, Error>;

    /// Account matching the credentials, or `Unauthorized`.
    async fn sign_in(&self, credentials: SignInCredentials) -> Result<Account, Error>;
}

/// Fixture service: every sign-up succeeds and sign-in accepts the password
/// `password` for any email.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAccountService;

const FIXTURE_PASSWORD: &str = "password";

#[async_trait]
impl AccountService for FixtureAccountService {
    async fn sign_up(&self, credentials: SignUpCredentials) -> Result<Account, Error> {
        Ok(Account {
            id: UserId::random(),
            email: credentials.email,
            username: credentials.username,
            created_at: Utc::now(),
        })
    }

    async fn sign_in(&self, credentials: SignInCredentials) -> Result<Account, Error> {
        if credentials.password.expose() != FIXTURE_PASSWORD {
            return Err(Error::unauthorized("invalid credentials"));
        }
        let username = credentials
            .email
            .as_ref()
            .split('@')
            .next()
            .unwrap_or_default()
            .chars()
            .take(USERNAME_MAX)
            .collect::<String>();
        let username = Username::new(username)
            .map_err(|err| Error::internal(format!("fixture username: {err}")))?;
        Ok(Account {
            id: UserId::random(),
            email: credentials.email,
            username,
            created_at: Utc::now(),
        })
    }
}
