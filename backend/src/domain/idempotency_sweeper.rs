//! Background task that deletes expired idempotency records.

use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use rand::Rng;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::IdempotencyConfig;
use crate::domain::ports::{IdempotencyStore, IdempotencyStoreError};

/// Periodically purges idempotency records past their TTL.
pub struct IdempotencySweeper {
    store: Arc<dyn IdempotencyStore>,
    clock: Arc<dyn Clock>,
    config: IdempotencyConfig,
}

impl IdempotencySweeper {
    /// Sweeper over `store`, timing expiry with `clock`.
    pub fn new(
        store: Arc<dyn IdempotencyStore>,
        clock: Arc<dyn Clock>,
        config: IdempotencyConfig,
    ) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Delete everything expired now.
    pub async fn sweep_once(&self) -> Result<u64, IdempotencyStoreError> {
        let removed = self.store.cleanup_expired(self.clock.utc()).await?;
        debug!(removed, "idempotency sweep finished");
        Ok(removed)
    }

    /// Sweep forever, sleeping the configured interval plus up to 10% jitter
    /// between runs.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(self.next_delay()).await;
                if let Err(err) = self.sweep_once().await {
                    warn!(error = %err, "idempotency sweep failed");
                }
            }
        })
    }

    fn next_delay(&self) -> Duration {
        let base = self.config.sweep_interval();
        let spread = u64::try_from(base.as_millis())
            .unwrap_or(u64::MAX)
            .checked_div(10)
            .unwrap_or(0);
        base.saturating_add(Duration::from_millis(
            rand::thread_rng().gen_range(0..=spread),
        ))
    }
}
