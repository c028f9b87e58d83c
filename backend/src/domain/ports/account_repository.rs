//! Driven port for account persistence.

use async_trait::async_trait;

use crate::domain::{Account, Email, NewAccount, StoredAccount};

use super::define_port_error;

define_port_error! {
    /// Errors raised by account repository adapters.
    pub enum AccountRepositoryError {
        /// The store could not be reached.
        Connection { message: String } => "account repository connection failed: {message}",
        /// A read or write failed while executing.
        Query { message: String } => "account repository query failed: {message}",
        /// Another account already uses this email.
        DuplicateEmail { email: String } => "an account for {email} already exists",
    }
}

/// Port for storing accounts and looking them up at sign-in.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert an account; emails are unique.
    async fn insert(&self, account: NewAccount) -> Result<Account, AccountRepositoryError>;

    /// Account and digest registered under `email`.
    async fn find_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<StoredAccount>, AccountRepositoryError>;
}

/// Fixture repository that accepts every insert and finds nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAccountRepository;

#[async_trait]
impl AccountRepository for FixtureAccountRepository {
    async fn insert(&self, account: NewAccount) -> Result<Account, AccountRepositoryError> {
        Ok(StoredAccount::from(account).account)
    }

    async fn find_by_email(
        &self,
        _email: &Email,
    ) -> Result<Option<StoredAccount>, AccountRepositoryError> {
        Ok(None)
    }
}
