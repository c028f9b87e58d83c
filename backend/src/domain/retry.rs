//! Automatic retry for transient engine failures.
//!
//! Store outages and lost compare-and-swap races are worth one more try after
//! a short, jittered pause; every other failure is the caller's to handle.
//! [`RetryingGameCommand`] decorates any [`GameCommand`] with that policy.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::debug;

use crate::domain::ports::{
    AddMoveRequest, CreateSessionRequest, GameCommand, JoinSessionRequest, StartSessionRequest,
};
use crate::domain::{Error, GameMove, GameSession};

/// Async sleeping abstraction so retries can be driven without real time.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Spreads retry delays so clients racing on one turn do not retry in step.
pub trait BackoffJitter: Send + Sync {
    /// Delay to use for retry `attempt` given the exponential `base`.
    ///
    /// ```rust
    /// use addon_backend::domain::BackoffJitter;
    /// use chrono::{TimeZone, Utc};
    /// use std::time::Duration;
    ///
    /// struct Fixed;
    /// impl BackoffJitter for Fixed {
    ///     fn jittered_delay(&self, base: Duration, _attempt: u32, _now: chrono::DateTime<Utc>) -> Duration {
    ///         base
    ///     }
    /// }
    /// let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().expect("valid time");
    /// assert_eq!(Fixed.jittered_delay(Duration::from_millis(200), 1, now), Duration::from_millis(200));
    /// ```
    fn jittered_delay(&self, base: Duration, attempt: u32, now: DateTime<Utc>) -> Duration;
}

/// Sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Adds up to a quarter of the base delay, seeded from the clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttemptJitter;

impl BackoffJitter for AttemptJitter {
    fn jittered_delay(&self, base: Duration, attempt: u32, now: DateTime<Utc>) -> Duration {
        let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        let spread = (base_ms / 4).max(1);
        let seed = u64::from(now.timestamp_subsec_nanos()) ^ u64::from(attempt);
        Duration::from_millis(base_ms.saturating_add(seed % spread.saturating_add(1)))
    }
}

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first call.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles per further retry.
    pub initial_backoff: Duration,
    /// Upper bound on the un-jittered delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Un-jittered delay after failed attempt number `attempt` (1-based).
    ///
    /// ```rust
    /// use addon_backend::domain::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy {
    ///     max_attempts: 4,
    ///     initial_backoff: Duration::from_millis(100),
    ///     max_backoff: Duration::from_millis(250),
    /// };
    /// assert_eq!(policy.base_delay(1), Duration::from_millis(100));
    /// assert_eq!(policy.base_delay(2), Duration::from_millis(200));
    /// assert_eq!(policy.base_delay(3), Duration::from_millis(250));
    /// ```
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// [`GameCommand`] decorator that retries retryable failures.
///
/// Retries happen for [`ErrorCode::ServiceUnavailable`] and
/// [`ErrorCode::TurnConflict`] only (see [`ErrorCode::is_retryable`]).
/// Requests are cloned per attempt, idempotency key included, so a retried
/// mutation that actually landed is replayed rather than repeated.
///
/// [`ErrorCode::ServiceUnavailable`]: crate::domain::ErrorCode::ServiceUnavailable
/// [`ErrorCode::TurnConflict`]: crate::domain::ErrorCode::TurnConflict
/// [`ErrorCode::is_retryable`]: crate::domain::ErrorCode::is_retryable
pub struct RetryingGameCommand<C> {
    inner: C,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    jitter: Arc<dyn BackoffJitter>,
}

impl<C> RetryingGameCommand<C> {
    /// Wrap `inner` using the tokio timer and clock-seeded jitter.
    pub fn new(inner: C, policy: RetryPolicy, clock: Arc<dyn Clock>) -> Self {
        Self::with_runtime(
            inner,
            policy,
            clock,
            Arc::new(TokioSleeper),
            Arc::new(AttemptJitter),
        )
    }

    /// Wrap `inner` with injected sleeping and jitter.
    pub fn with_runtime(
        inner: C,
        policy: RetryPolicy,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
        jitter: Arc<dyn BackoffJitter>,
    ) -> Self {
        Self {
            inner,
            policy,
            clock,
            sleeper,
            jitter,
        }
    }

    /// The wrapped command.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C> RetryingGameCommand<C>
where
    C: GameCommand,
{
    async fn retry<T, F, Fut>(&self, operation: &'static str, call: F) -> Result<T, Error>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call().await {
                Err(err) if err.code().is_retryable() && attempt < max_attempts => {
                    let delay = self.jitter.jittered_delay(
                        self.policy.base_delay(attempt),
                        attempt,
                        self.clock.utc(),
                    );
                    debug!(
                        operation,
                        attempt,
                        code = ?err.code(),
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "retrying game command"
                    );
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }
}

#[async_trait]
impl<C> GameCommand for RetryingGameCommand<C>
where
    C: GameCommand,
{
    async fn create_session(&self, request: CreateSessionRequest) -> Result<GameSession, Error> {
        let inner = &self.inner;
        self.retry("create_session", move || inner.create_session(request.clone()))
            .await
    }

    async fn join_session(&self, request: JoinSessionRequest) -> Result<GameSession, Error> {
        let inner = &self.inner;
        self.retry("join_session", move || inner.join_session(request.clone()))
            .await
    }

    async fn start_session(&self, request: StartSessionRequest) -> Result<GameSession, Error> {
        let inner = &self.inner;
        self.retry("start_session", move || inner.start_session(request.clone()))
            .await
    }

    async fn add_move(&self, request: AddMoveRequest) -> Result<GameMove, Error> {
        let inner = &self.inner;
        self.retry("add_move", move || inner.add_move(request.clone()))
            .await
    }
}
