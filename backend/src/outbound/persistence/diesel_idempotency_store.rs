//! PostgreSQL-backed [`IdempotencyStore`].
//!
//! Claims are a single upsert: a fresh scope inserts, an expired record is
//! overwritten in place, and a live record is left untouched so the claim
//! returns no row. Two concurrent claims for one scope therefore cannot both
//! win.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel::sql_types::{Bytea, Timestamptz, Uuid as SqlUuid, Varchar};
use diesel_async::RunQueryDsl;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{IdempotencyStore, IdempotencyStoreError};
use crate::domain::{
    ClaimOutcome, IdempotencyKey, IdempotencyRecord, IdempotencyScope, MutationType, PayloadHash,
    RecordState, UserId,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::IdempotencyKeyRow;
use super::pool::{DbPool, PoolError};
use super::schema::idempotency_keys;

const CLAIM_SQL: &str = "\
INSERT INTO idempotency_keys \
    (key, user_id, mutation_type, payload_hash, response_snapshot, created_at, expires_at) \
VALUES ($1, $2, $3, $4, NULL, $5, $6) \
ON CONFLICT (key, user_id, mutation_type) DO UPDATE SET \
    payload_hash = EXCLUDED.payload_hash, \
    response_snapshot = NULL, \
    created_at = EXCLUDED.created_at, \
    expires_at = EXCLUDED.expires_at \
WHERE idempotency_keys.expires_at <= EXCLUDED.created_at \
RETURNING key";

/// A released claim can vanish between the upsert and the follow-up read;
/// the claim is retried this many times before giving up.
const CLAIM_ATTEMPTS: usize = 3;

#[derive(QueryableByName)]
struct ClaimedKey {
    #[diesel(sql_type = SqlUuid)]
    key: Uuid,
}

/// Diesel implementation of the [`IdempotencyStore`] port.
#[derive(Clone)]
pub struct DieselIdempotencyStore {
    pool: DbPool,
}

impl DieselIdempotencyStore {
    /// Store over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> IdempotencyStoreError {
    map_basic_pool_error(error, IdempotencyStoreError::connection)
}

fn map_diesel_error(error: DieselError) -> IdempotencyStoreError {
    map_basic_diesel_error(
        error,
        IdempotencyStoreError::query,
        IdempotencyStoreError::connection,
    )
}

fn row_to_record(row: IdempotencyKeyRow) -> Result<IdempotencyRecord, IdempotencyStoreError> {
    let bytes: [u8; 32] = row.payload_hash.as_slice().try_into().map_err(|_| {
        IdempotencyStoreError::query(format!(
            "corrupted payload hash in database: {} bytes",
            row.payload_hash.len()
        ))
    })?;
    let mutation_type = MutationType::from_str(&row.mutation_type).map_err(|err| {
        IdempotencyStoreError::query(format!("invalid mutation type in database: {err}"))
    })?;

    Ok(IdempotencyRecord {
        scope: IdempotencyScope::new(
            IdempotencyKey::from_uuid(row.key),
            UserId::from_uuid(row.user_id),
            mutation_type,
        ),
        payload_hash: PayloadHash::from_bytes(bytes),
        state: row
            .response_snapshot
            .map_or(RecordState::InProgress, RecordState::Completed),
        created_at: row.created_at,
        expires_at: row.expires_at,
    })
}

#[async_trait]
impl IdempotencyStore for DieselIdempotencyStore {
    async fn claim(
        &self,
        record: IdempotencyRecord,
    ) -> Result<ClaimOutcome, IdempotencyStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let scope = &record.scope;

        for _ in 0..CLAIM_ATTEMPTS {
            let claimed: Vec<ClaimedKey> = diesel::sql_query(CLAIM_SQL)
                .bind::<SqlUuid, _>(scope.key.as_uuid())
                .bind::<SqlUuid, _>(scope.user_id.as_uuid())
                .bind::<Varchar, _>(scope.mutation_type.as_str())
                .bind::<Bytea, _>(record.payload_hash.as_bytes().as_slice())
                .bind::<Timestamptz, _>(record.created_at)
                .bind::<Timestamptz, _>(record.expires_at)
                .load(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            if let Some(won) = claimed.as_slice().first() {
                debug!(key = %won.key, "claimed idempotency key");
                return Ok(ClaimOutcome::Claimed);
            }

            let existing = idempotency_keys::table
                .find((
                    scope.key.as_uuid(),
                    scope.user_id.as_uuid(),
                    scope.mutation_type.as_str(),
                ))
                .select(IdempotencyKeyRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?;
            if let Some(row) = existing {
                return row_to_record(row).map(ClaimOutcome::Existing);
            }
            debug!(key = %scope.key, "idempotency claim released mid-flight; retrying");
        }

        Err(IdempotencyStoreError::query(format!(
            "claim for key {} did not settle",
            scope.key
        )))
    }

    async fn complete(
        &self,
        scope: &IdempotencyScope,
        response: serde_json::Value,
    ) -> Result<(), IdempotencyStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(idempotency_keys::table.find((
            scope.key.as_uuid(),
            scope.user_id.as_uuid(),
            scope.mutation_type.as_str(),
        )))
        .set(idempotency_keys::response_snapshot.eq(Some(response)))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        if updated == 0 {
            return Err(IdempotencyStoreError::missing_claim(scope.key.as_ref()));
        }
        Ok(())
    }

    async fn release(&self, scope: &IdempotencyScope) -> Result<(), IdempotencyStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(idempotency_keys::table.find((
            scope.key.as_uuid(),
            scope.user_id.as_uuid(),
            scope.mutation_type.as_str(),
        )))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        if deleted == 0 {
            return Err(IdempotencyStoreError::missing_claim(scope.key.as_ref()));
        }
        Ok(())
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<u64, IdempotencyStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(idempotency_keys::table)
            .filter(idempotency_keys::expires_at.le(now))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        debug!(deleted, cutoff = %now, "removed expired idempotency records");
        Ok(u64::try_from(deleted).unwrap_or(u64::MAX))
    }
}
