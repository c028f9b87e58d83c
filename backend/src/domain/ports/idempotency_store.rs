//! Driven port for idempotency record persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ClaimOutcome, IdempotencyRecord, IdempotencyScope};

use super::define_port_error;

define_port_error! {
    /// Errors raised by idempotency store adapters.
    pub enum IdempotencyStoreError {
        /// The store could not be reached.
        Connection { message: String } => "idempotency store connection failed: {message}",
        /// A read or write failed while executing.
        Query { message: String } => "idempotency store query failed: {message}",
        /// The claim to complete or release does not exist.
        MissingClaim { key: String } => "no idempotency claim for key {key}",
    }
}

/// Port for claiming keys and recording their responses.
///
/// A key moves through `claim -> complete` on success, or `claim -> release`
/// when the guarded operation fails so the client may retry with the same
/// key.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Insert `record` unless its scope is already taken.
    ///
    /// An existing record that has expired by `record.created_at` does not
    /// count: it is replaced and the claim succeeds.
    ///
    /// Must be atomic: of two concurrent claims for one scope exactly one
    /// observes [`ClaimOutcome::Claimed`].
    async fn claim(&self, record: IdempotencyRecord)
    -> Result<ClaimOutcome, IdempotencyStoreError>;

    /// Attach the serialised response to a claimed scope.
    async fn complete(
        &self,
        scope: &IdempotencyScope,
        response: serde_json::Value,
    ) -> Result<(), IdempotencyStoreError>;

    /// Drop a claim whose operation failed.
    async fn release(&self, scope: &IdempotencyScope) -> Result<(), IdempotencyStoreError>;

    /// Delete every record expired at `now`, returning how many went.
    async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<u64, IdempotencyStoreError>;
}

/// Fixture store that grants every claim and remembers nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureIdempotencyStore;

#[async_trait]
impl IdempotencyStore for FixtureIdempotencyStore {
    async fn claim(
        &self,
        _record: IdempotencyRecord,
    ) -> Result<ClaimOutcome, IdempotencyStoreError> {
        Ok(ClaimOutcome::Claimed)
    }

    async fn complete(
        &self,
        _scope: &IdempotencyScope,
        _response: serde_json::Value,
    ) -> Result<(), IdempotencyStoreError> {
        Ok(())
    }

    async fn release(&self, _scope: &IdempotencyScope) -> Result<(), IdempotencyStoreError> {
        Ok(())
    }

    async fn cleanup_expired(&self, _now: DateTime<Utc>) -> Result<u64, IdempotencyStoreError> {
        Ok(0)
    }
}
