//! Retention settings for idempotency records.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// How long idempotency records stay authoritative.
///
/// A record older than the TTL no longer blocks its key: the next claim
/// replaces it, and the periodic sweep deletes it.
///
/// # Example
///
/// ```
/// # use addon_backend::domain::IdempotencyConfig;
/// # use std::time::Duration;
/// let config = IdempotencyConfig::default();
/// assert_eq!(config.ttl(), Duration::from_secs(24 * 3600));
///
/// let clamped = IdempotencyConfig::from_hours(0);
/// assert_eq!(clamped.ttl(), Duration::from_secs(3600));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdempotencyConfig {
    ttl: Duration,
    sweep_interval: Duration,
}

impl IdempotencyConfig {
    /// Default TTL in hours.
    pub const DEFAULT_TTL_HOURS: u64 = 24;

    /// Minimum TTL in hours; shorter values would expire keys mid-retry.
    const MIN_TTL_HOURS: u64 = 1;

    /// Maximum TTL in hours (10 years).
    const MAX_TTL_HOURS: u64 = 24 * 365 * 10;

    const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

    /// TTL in whole hours, clamped to `[1, 87600]`.
    pub fn from_hours(hours: u64) -> Self {
        let hours = hours.clamp(Self::MIN_TTL_HOURS, Self::MAX_TTL_HOURS);
        Self {
            ttl: Duration::from_secs(hours.saturating_mul(3600)),
            sweep_interval: Self::DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Explicit TTL, unclamped (for tests).
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            sweep_interval: Self::DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Replace the sweep interval.
    #[must_use]
    pub fn with_sweep_interval(self, sweep_interval: Duration) -> Self {
        Self {
            sweep_interval,
            ..self
        }
    }

    /// Configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Base delay between expiry sweeps.
    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    /// Records created before the returned instant have expired at `now`.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        TimeDelta::from_std(self.ttl)
            .ok()
            .and_then(|ttl| now.checked_sub_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self::from_hours(Self::DEFAULT_TTL_HOURS)
    }
}

/// Instant `ttl` after `created_at`, saturating at the far future.
pub(super) fn expiry_after(created_at: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|ttl| created_at.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
