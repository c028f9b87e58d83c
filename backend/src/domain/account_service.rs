//! Account service implementing [`AccountService`] over an
//! [`AccountRepository`].

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::ports::{AccountRepository, AccountRepositoryError, AccountService};
use crate::domain::{
    Account, Error, NewAccount, Password, PasswordDigest, SignInCredentials, SignUpCredentials,
    UserId,
};

fn map_repository_error(error: AccountRepositoryError) -> Error {
    match error {
        AccountRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("account store unavailable: {message}"))
        }
        AccountRepositoryError::Query { message } => {
            Error::internal(format!("account store error: {message}"))
        }
        AccountRepositoryError::DuplicateEmail { email } => {
            Error::conflict(format!("an account for {email} already exists"))
                .with_details(json!({ "field": "email", "code": "duplicate_email" }))
        }
    }
}

fn invalid_credentials() -> Error {
    Error::unauthorized("invalid credentials")
}

async fn hash_off_thread(password: Password) -> Result<PasswordDigest, Error> {
    tokio::task::spawn_blocking(move || PasswordDigest::hash(&password))
        .await
        .map_err(|err| Error::internal(format!("password hashing task failed: {err}")))?
        .map_err(|err| Error::internal(format!("password hashing failed: {err}")))
}

async fn verify_off_thread(digest: PasswordDigest, password: Password) -> Result<bool, Error> {
    tokio::task::spawn_blocking(move || digest.verify(&password))
        .await
        .map_err(|err| Error::internal(format!("password check task failed: {err}")))
}

/// Email and password authentication backed by a repository.
#[derive(Clone)]
pub struct AccountCommandService {
    repository: Arc<dyn AccountRepository>,
    clock: Arc<dyn Clock>,
}

impl AccountCommandService {
    /// Build the service.
    pub fn new(repository: Arc<dyn AccountRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }
}

#[async_trait]
impl AccountService for AccountCommandService {
    async fn sign_up(&self, credentials: SignUpCredentials) -> Result<Account, Error> {
        let SignUpCredentials {
            email,
            password,
            username,
        } = credentials;
        let password_digest = hash_off_thread(password).await?;
        let account = self
            .repository
            .insert(NewAccount {
                id: UserId::random(),
                email,
                username,
                password_digest,
                created_at: self.clock.utc(),
            })
            .await
            .map_err(map_repository_error)?;
        info!(account = %account.id, "account registered");
        Ok(account)
    }

    async fn sign_in(&self, credentials: SignInCredentials) -> Result<Account, Error> {
        let SignInCredentials { email, password } = credentials;
        let Some(stored) = self
            .repository
            .find_by_email(&email)
            .await
            .map_err(map_repository_error)?
        else {
            return Err(invalid_credentials());
        };
        if !verify_off_thread(stored.password_digest, password).await? {
            warn!(account = %stored.account.id, "sign-in rejected");
            return Err(invalid_credentials());
        }
        Ok(stored.account)
    }
}
