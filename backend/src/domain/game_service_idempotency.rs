//! Idempotency orchestration for game engine mutations.

use std::future::Future;

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::domain::ports::{GameStore, IdempotencyStore, IdempotencyStoreError};
use crate::domain::{
    Actor, ClaimOutcome, Error, IdempotencyKey, IdempotencyRecord, IdempotencyScope,
    MutationType, PayloadHash, RecordState, hash_request,
};

use super::game_service::GameCommandService;

const IN_PROGRESS_MESSAGE: &str = "idempotent request is still in progress; retry shortly";
const PAYLOAD_MISMATCH_MESSAGE: &str = "idempotency key already used with a different payload";

fn map_idempotency_error(error: IdempotencyStoreError) -> Error {
    match error {
        IdempotencyStoreError::Connection { message } => {
            Error::service_unavailable(format!("idempotency store unavailable: {message}"))
        }
        IdempotencyStoreError::Query { message } => {
            Error::internal(format!("idempotency store error: {message}"))
        }
        IdempotencyStoreError::MissingClaim { key } => {
            Error::internal(format!("idempotency claim for {key} vanished"))
        }
    }
}

/// Scope and fingerprint for one keyed mutation.
#[derive(Debug, Clone)]
pub(super) struct IdempotentMutation {
    scope: IdempotencyScope,
    payload_hash: PayloadHash,
}

impl IdempotentMutation {
    /// Fingerprint `payload` when the caller supplied a key.
    pub(super) fn prepare<P: Serialize + ?Sized>(
        key: Option<IdempotencyKey>,
        actor: &Actor,
        mutation_type: MutationType,
        payload: &P,
    ) -> Result<Option<Self>, Error> {
        let Some(key) = key else {
            return Ok(None);
        };
        let payload_hash = hash_request(payload)
            .map_err(|err| Error::internal(format!("failed to fingerprint request: {err}")))?;
        Ok(Some(Self {
            scope: IdempotencyScope::new(key, actor.user_id.clone(), mutation_type),
            payload_hash,
        }))
    }
}

fn replay<T: DeserializeOwned>(record: IdempotencyRecord, hash: &PayloadHash) -> Result<T, Error> {
    if !record.matches(hash) {
        return Err(Error::conflict(PAYLOAD_MISMATCH_MESSAGE));
    }
    match record.state {
        RecordState::InProgress => Err(Error::service_unavailable(IN_PROGRESS_MESSAGE)),
        RecordState::Completed(snapshot) => serde_json::from_value(snapshot).map_err(|err| {
            Error::internal(format!("stored idempotent response is unreadable: {err}"))
        }),
    }
}

impl<S, I> GameCommandService<S, I>
where
    S: GameStore,
    I: IdempotencyStore,
{
    /// Run `operation` at most once per scoped key.
    ///
    /// Without a key the operation simply runs. With a key, the first caller
    /// claims it and stores the response on success or releases the claim on
    /// failure; later callers replay, conflict, or wait until the record
    /// expires.
    pub(super) async fn run_idempotent<T, F, Fut>(
        &self,
        guard: Option<IdempotentMutation>,
        operation: F,
    ) -> Result<T, Error>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let Some(guard) = guard else {
            return operation().await;
        };

        let claim =
            IdempotencyRecord::claim(guard.scope.clone(), guard.payload_hash, self.clock.utc())
                .with_ttl(self.config.idempotency.ttl());
        match self
            .idempotency
            .claim(claim)
            .await
            .map_err(map_idempotency_error)?
        {
            ClaimOutcome::Claimed => {}
            ClaimOutcome::Existing(record) => {
                debug!(
                    key = %guard.scope.key,
                    mutation = %guard.scope.mutation_type,
                    "idempotency key already claimed"
                );
                return replay(record, &guard.payload_hash);
            }
        }

        let response = match operation().await {
            Ok(response) => response,
            Err(err) => {
                if let Err(release) = self.idempotency.release(&guard.scope).await {
                    warn!(key = %guard.scope.key, error = %release, "idempotency release failed");
                }
                return Err(err);
            }
        };

        // The mutation already happened: a failed snapshot write leaves the
        // claim in progress so retries wait instead of repeating it.
        match serde_json::to_value(&response) {
            Ok(snapshot) => {
                if let Err(err) = self.idempotency.complete(&guard.scope, snapshot).await {
                    warn!(key = %guard.scope.key, error = %err, "idempotency completion failed");
                }
            }
            Err(err) => {
                warn!(key = %guard.scope.key, error = %err, "response snapshot failed");
            }
        }
        Ok(response)
    }
}
