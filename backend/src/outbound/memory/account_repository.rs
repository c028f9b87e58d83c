//! Mutex-guarded [`AccountRepository`] adapter.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{AccountRepository, AccountRepositoryError};
use crate::domain::{Account, Email, NewAccount, StoredAccount};

/// Accounts kept in process memory, keyed by email.
#[derive(Debug, Default)]
pub struct InMemoryAccountRepository {
    accounts: Mutex<HashMap<Email, StoredAccount>>,
}

impl InMemoryAccountRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn accounts(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<Email, StoredAccount>>, AccountRepositoryError> {
        self.accounts
            .lock()
            .map_err(|_| AccountRepositoryError::query("account store lock poisoned"))
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn insert(&self, account: NewAccount) -> Result<Account, AccountRepositoryError> {
        let mut accounts = self.accounts()?;
        match accounts.entry(account.email.clone()) {
            Entry::Occupied(_) => Err(AccountRepositoryError::duplicate_email(
                account.email.as_ref(),
            )),
            Entry::Vacant(slot) => Ok(slot.insert(StoredAccount::from(account)).account.clone()),
        }
    }

    async fn find_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<StoredAccount>, AccountRepositoryError> {
        Ok(self.accounts()?.get(email).cloned())
    }
}
