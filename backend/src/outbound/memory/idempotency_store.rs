//! Mutex-guarded [`IdempotencyStore`] adapter.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::ports::{IdempotencyStore, IdempotencyStoreError};
use crate::domain::{ClaimOutcome, IdempotencyRecord, IdempotencyScope, RecordState};

/// Idempotency records kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryIdempotencyStore {
    records: Mutex<HashMap<IdempotencyScope, IdempotencyRecord>>,
}

impl InMemoryIdempotencyStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn records(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<IdempotencyScope, IdempotencyRecord>>, IdempotencyStoreError>
    {
        self.records
            .lock()
            .map_err(|_| IdempotencyStoreError::query("idempotency store lock poisoned"))
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn claim(
        &self,
        record: IdempotencyRecord,
    ) -> Result<ClaimOutcome, IdempotencyStoreError> {
        let mut records = self.records()?;
        match records.entry(record.scope.clone()) {
            Entry::Occupied(mut existing) => {
                if existing.get().is_expired_at(record.created_at) {
                    debug!(key = %record.scope.key, "replacing expired idempotency record");
                    existing.insert(record);
                    Ok(ClaimOutcome::Claimed)
                } else {
                    Ok(ClaimOutcome::Existing(existing.get().clone()))
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(ClaimOutcome::Claimed)
            }
        }
    }

    async fn complete(
        &self,
        scope: &IdempotencyScope,
        response: serde_json::Value,
    ) -> Result<(), IdempotencyStoreError> {
        let mut records = self.records()?;
        let record = records
            .get_mut(scope)
            .ok_or_else(|| IdempotencyStoreError::missing_claim(scope.key.as_ref()))?;
        record.state = RecordState::Completed(response);
        Ok(())
    }

    async fn release(&self, scope: &IdempotencyScope) -> Result<(), IdempotencyStoreError> {
        self.records()?
            .remove(scope)
            .map(|_| ())
            .ok_or_else(|| IdempotencyStoreError::missing_claim(scope.key.as_ref()))
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<u64, IdempotencyStoreError> {
        let mut records = self.records()?;
        let before = records.len();
        records.retain(|_, record| !record.is_expired_at(now));
        let removed = before.saturating_sub(records.len());
        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeDelta;
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;
    use crate::domain::{IdempotencyKey, MutationType, UserId, canonicalize_and_hash};

    #[fixture]
    fn scope() -> IdempotencyScope {
        IdempotencyScope::new(
            IdempotencyKey::random(),
            UserId::random(),
            MutationType::CreateSession,
        )
    }

    fn claim_for(scope: &IdempotencyScope) -> IdempotencyRecord {
        IdempotencyRecord::claim(
            scope.clone(),
            canonicalize_and_hash(&json!({"location": "Gym A"})),
            Utc::now(),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn second_claim_sees_completed_response(scope: IdempotencyScope) {
        let store = InMemoryIdempotencyStore::new();
        assert_eq!(
            store.claim(claim_for(&scope)).await.expect("claim"),
            ClaimOutcome::Claimed
        );
        store
            .complete(&scope, json!({"roomCode": "ABC123"}))
            .await
            .expect("complete");

        let ClaimOutcome::Existing(record) = store.claim(claim_for(&scope)).await.expect("claim")
        else {
            panic!("expected existing record");
        };
        assert_eq!(
            record.state,
            RecordState::Completed(json!({"roomCode": "ABC123"}))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn released_scope_can_be_claimed_again(scope: IdempotencyScope) {
        let store = InMemoryIdempotencyStore::new();
        store.claim(claim_for(&scope)).await.expect("claim");
        store.release(&scope).await.expect("release");

        assert_eq!(
            store.claim(claim_for(&scope)).await.expect("claim"),
            ClaimOutcome::Claimed
        );
    }

    #[rstest]
    #[tokio::test]
    async fn keys_are_scoped_per_mutation(scope: IdempotencyScope) {
        let store = InMemoryIdempotencyStore::new();
        store.claim(claim_for(&scope)).await.expect("claim");
        let other = IdempotencyScope::new(
            scope.key.clone(),
            scope.user_id.clone(),
            MutationType::JoinSession,
        );

        assert_eq!(
            store.claim(claim_for(&other)).await.expect("claim"),
            ClaimOutcome::Claimed
        );
    }

    #[rstest]
    #[tokio::test]
    async fn expired_record_can_be_claimed_again(scope: IdempotencyScope) {
        let store = InMemoryIdempotencyStore::new();
        let ttl = Duration::from_secs(3600);
        let first = claim_for(&scope).with_ttl(ttl);
        let claimed_at = first.created_at;
        store.claim(first).await.expect("claim");
        store
            .complete(&scope, json!({"roomCode": "ABC123"}))
            .await
            .expect("complete");

        let mut early = claim_for(&scope).with_ttl(ttl);
        early.created_at = claimed_at + TimeDelta::minutes(30);
        assert!(matches!(
            store.claim(early).await.expect("claim"),
            ClaimOutcome::Existing(_)
        ));

        let mut late = claim_for(&scope);
        late.created_at = claimed_at + TimeDelta::hours(2);
        assert_eq!(
            store.claim(late.with_ttl(ttl)).await.expect("claim"),
            ClaimOutcome::Claimed
        );
    }

    #[rstest]
    #[tokio::test]
    async fn cleanup_removes_only_expired_records(scope: IdempotencyScope) {
        let store = InMemoryIdempotencyStore::new();
        let now = Utc::now();
        let mut stale = claim_for(&scope).with_ttl(Duration::from_secs(60));
        stale.expires_at = now - TimeDelta::seconds(1);
        store.claim(stale).await.expect("stale claim");
        let fresh_scope = IdempotencyScope::new(
            IdempotencyKey::random(),
            scope.user_id.clone(),
            MutationType::AddMove,
        );
        store.claim(claim_for(&fresh_scope)).await.expect("fresh claim");

        assert_eq!(store.cleanup_expired(now).await.expect("cleanup"), 1);
        assert_eq!(
            store.claim(claim_for(&scope)).await.expect("claim"),
            ClaimOutcome::Claimed
        );
        assert!(matches!(
            store.claim(claim_for(&fresh_scope)).await.expect("claim"),
            ClaimOutcome::Existing(_)
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn completing_unknown_scope_fails(scope: IdempotencyScope) {
        let store = InMemoryIdempotencyStore::new();
        let err = store
            .complete(&scope, json!(null))
            .await
            .expect_err("no claim");
        assert!(matches!(err, IdempotencyStoreError::MissingClaim { .. }));
    }
}
