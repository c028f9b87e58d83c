//! Runtime settings loaded via OrthoConfig.
//!
//! Values come from `ADDON_*` environment variables, CLI flags or a config
//! file; anything unset falls back to the defaults below.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{GameEngineConfig, IdempotencyConfig, RetryPolicy};

const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;
const DEFAULT_RETRY_ATTEMPTS: u32 = 2;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 200;
const DEFAULT_ROOM_CODE_ATTEMPTS: u32 = 5;

/// Tunables for the game engine, its observer and the HTTP listener.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ADDON")]
pub struct GameSettings {
    /// Observer poll interval in milliseconds.
    pub poll_interval_ms: Option<u64>,
    /// Total attempts for a retryable mutation, first try included.
    pub retry_attempts: Option<u32>,
    /// Backoff before the first retry, in milliseconds.
    pub retry_backoff_ms: Option<u64>,
    /// Room codes tried before session creation gives up.
    pub room_code_attempts: Option<u32>,
    /// HTTP listen address.
    pub bind_addr: Option<SocketAddr>,
    /// Hours an idempotency key keeps replaying its first response.
    pub idempotency_ttl_hours: Option<u64>,
    /// PostgreSQL URL. Without one, every store lives in process memory.
    pub database_url: Option<String>,
}

impl GameSettings {
    /// Interval between observer polls.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS))
    }

    /// Retry policy for [`crate::domain::RetryingGameCommand`].
    ///
    /// The backoff ceiling stays at ten times the initial delay.
    pub fn retry_policy(&self) -> RetryPolicy {
        let initial_backoff =
            Duration::from_millis(self.retry_backoff_ms.unwrap_or(DEFAULT_RETRY_BACKOFF_MS));
        RetryPolicy {
            max_attempts: self.retry_attempts.unwrap_or(DEFAULT_RETRY_ATTEMPTS).max(1),
            initial_backoff,
            max_backoff: initial_backoff.saturating_mul(10),
        }
    }

    /// Idempotency record lifetime, clamped to `[1h, 10y]`.
    pub fn idempotency_config(&self) -> IdempotencyConfig {
        IdempotencyConfig::from_hours(
            self.idempotency_ttl_hours
                .unwrap_or(IdempotencyConfig::DEFAULT_TTL_HOURS),
        )
    }

    /// Engine tunables.
    pub fn engine_config(&self) -> GameEngineConfig {
        GameEngineConfig {
            room_code_attempts: self
                .room_code_attempts
                .unwrap_or(DEFAULT_ROOM_CODE_ATTEMPTS)
                .max(1),
            idempotency: self.idempotency_config(),
        }
    }

    /// Address the HTTP server binds.
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr.unwrap_or_else(default_bind_addr)
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing.

    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    use super::*;

    const VARS: [&str; 7] = [
        "ADDON_POLL_INTERVAL_MS",
        "ADDON_RETRY_ATTEMPTS",
        "ADDON_RETRY_BACKOFF_MS",
        "ADDON_ROOM_CODE_ATTEMPTS",
        "ADDON_BIND_ADDR",
        "ADDON_IDEMPOTENCY_TTL_HOURS",
        "ADDON_DATABASE_URL",
    ];

    fn load_from_empty_args() -> GameSettings {
        GameSettings::load_from_iter([OsString::from("addon-backend")])
            .expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();

        assert_eq!(settings.poll_interval(), Duration::from_secs(3));
        assert_eq!(settings.retry_policy(), RetryPolicy::default());
        assert_eq!(settings.engine_config(), GameEngineConfig::default());
        assert_eq!(settings.bind_addr().to_string(), "0.0.0.0:8080");
        assert!(settings.database_url.is_none());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("ADDON_POLL_INTERVAL_MS", Some("1500".to_owned())),
            ("ADDON_RETRY_ATTEMPTS", Some("3".to_owned())),
            ("ADDON_RETRY_BACKOFF_MS", Some("50".to_owned())),
            ("ADDON_ROOM_CODE_ATTEMPTS", Some("9".to_owned())),
            ("ADDON_BIND_ADDR", Some("127.0.0.1:9000".to_owned())),
            ("ADDON_IDEMPOTENCY_TTL_HOURS", Some("6".to_owned())),
            (
                "ADDON_DATABASE_URL",
                Some("postgres://addon@localhost/addon".to_owned()),
            ),
        ]);

        let settings = load_from_empty_args();

        assert_eq!(settings.poll_interval(), Duration::from_millis(1500));
        let policy = settings.retry_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_backoff, Duration::from_millis(50));
        assert_eq!(policy.max_backoff, Duration::from_millis(500));
        assert_eq!(settings.engine_config().room_code_attempts, 9);
        assert_eq!(settings.bind_addr().to_string(), "127.0.0.1:9000");
        assert_eq!(
            settings.engine_config().idempotency.ttl(),
            Duration::from_secs(6 * 3600)
        );
        assert_eq!(
            settings.database_url.as_deref(),
            Some("postgres://addon@localhost/addon")
        );
    }

    #[rstest]
    fn zero_attempts_are_clamped_to_one() {
        let _guard = lock_env([
            ("ADDON_RETRY_ATTEMPTS", Some("0".to_owned())),
            ("ADDON_ROOM_CODE_ATTEMPTS", Some("0".to_owned())),
            ("ADDON_IDEMPOTENCY_TTL_HOURS", Some("0".to_owned())),
        ]);

        let settings = load_from_empty_args();

        assert_eq!(settings.retry_policy().max_attempts, 1);
        assert_eq!(settings.engine_config().room_code_attempts, 1);
        assert_eq!(settings.idempotency_config().ttl(), Duration::from_secs(3600));
    }
}
