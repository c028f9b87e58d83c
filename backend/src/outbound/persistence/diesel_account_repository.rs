//! PostgreSQL-backed [`AccountRepository`].

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{AccountRepository, AccountRepositoryError};
use crate::domain::{Account, Email, NewAccount, PasswordDigest, StoredAccount, UserId, Username};

use super::diesel_basic_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, unique_violation,
};
use super::models::{AccountRow, NewAccountRow};
use super::pool::{DbPool, PoolError};
use super::schema::accounts;

const EMAIL_KEY: &str = "accounts_email_key";

/// Diesel implementation of the [`AccountRepository`] port.
#[derive(Clone)]
pub struct DieselAccountRepository {
    pool: DbPool,
}

impl DieselAccountRepository {
    /// Repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> AccountRepositoryError {
    map_basic_pool_error(error, AccountRepositoryError::connection)
}

fn map_diesel_error(error: DieselError) -> AccountRepositoryError {
    map_basic_diesel_error(
        error,
        AccountRepositoryError::query,
        AccountRepositoryError::connection,
    )
}

fn map_insert_error(error: DieselError, email: &Email) -> AccountRepositoryError {
    if unique_violation(&error) == Some(EMAIL_KEY) {
        return AccountRepositoryError::duplicate_email(email.as_ref());
    }
    map_diesel_error(error)
}

fn row_to_stored(row: AccountRow) -> Result<StoredAccount, AccountRepositoryError> {
    let email = Email::new(&row.email)
        .map_err(|err| AccountRepositoryError::query(format!("invalid email in database: {err}")))?;
    let username = Username::new(row.username).map_err(|err| {
        AccountRepositoryError::query(format!("invalid username in database: {err}"))
    })?;
    Ok(StoredAccount {
        account: Account {
            id: UserId::from_uuid(row.id),
            email,
            username,
            created_at: row.created_at,
        },
        password_digest: PasswordDigest::from_phc(row.password_digest),
    })
}

#[async_trait]
impl AccountRepository for DieselAccountRepository {
    async fn insert(&self, account: NewAccount) -> Result<Account, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let new_row = NewAccountRow {
            id: *account.id.as_uuid(),
            email: account.email.as_ref(),
            username: account.username.as_ref(),
            password_digest: account.password_digest.as_phc(),
            created_at: account.created_at,
        };

        diesel::insert_into(accounts::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map_err(|err| map_insert_error(err, &account.email))?;
        Ok(StoredAccount::from(account).account)
    }

    async fn find_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<StoredAccount>, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        accounts::table
            .filter(accounts::email.eq(email.as_ref()))
            .select(AccountRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_stored)
            .transpose()
    }
}
