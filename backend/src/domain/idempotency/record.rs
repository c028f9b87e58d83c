//! Stored idempotency records.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::UserId;

use super::config::expiry_after;
use super::{IdempotencyConfig, IdempotencyKey, MutationType, PayloadHash};

/// Identity of an idempotency record: one key, per user, per mutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyScope {
    /// Client-supplied key.
    pub key: IdempotencyKey,
    /// User who sent the request.
    pub user_id: UserId,
    /// Operation the key protects.
    pub mutation_type: MutationType,
}

impl IdempotencyScope {
    /// Bundle the scope fields.
    pub fn new(key: IdempotencyKey, user_id: UserId, mutation_type: MutationType) -> Self {
        Self {
            key,
            user_id,
            mutation_type,
        }
    }
}

/// Progress of the request that owns a record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordState {
    /// Claimed; the owning request has not finished yet.
    InProgress,
    /// Finished successfully; holds the serialised response to replay.
    Completed(Value),
}

/// Record linking a scoped key to a payload fingerprint and its outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct IdempotencyRecord {
    /// Who and what the key belongs to.
    pub scope: IdempotencyScope,
    /// Fingerprint of the first request under this key.
    pub payload_hash: PayloadHash,
    /// Whether a response is available.
    pub state: RecordState,
    /// When the key was first claimed.
    pub created_at: DateTime<Utc>,
    /// When the record stops blocking its key.
    pub expires_at: DateTime<Utc>,
}

impl IdempotencyRecord {
    /// New in-progress claim living for the default TTL.
    pub fn claim(scope: IdempotencyScope, payload_hash: PayloadHash, now: DateTime<Utc>) -> Self {
        Self {
            scope,
            payload_hash,
            state: RecordState::InProgress,
            created_at: now,
            expires_at: expiry_after(now, IdempotencyConfig::default().ttl()),
        }
    }

    /// Replace the record's lifetime, counted from `created_at`.
    #[must_use]
    pub fn with_ttl(self, ttl: Duration) -> Self {
        Self {
            expires_at: expiry_after(self.created_at, ttl),
            ..self
        }
    }

    /// Whether the record no longer blocks its key at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Whether `hash` fingerprints the same request as this record.
    pub fn matches(&self, hash: &PayloadHash) -> bool {
        &self.payload_hash == hash
    }
}

/// Result of trying to claim a scoped key.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    /// The caller now owns the key and must run the operation.
    Claimed,
    /// Another request already holds the key; its record is returned.
    Existing(IdempotencyRecord),
}
