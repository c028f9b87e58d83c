//! Session cookie configuration read from the environment.
//!
//! ```text
//! SESSION_KEY_FILE         path to the signing key (default /var/run/secrets/session_key)
//! SESSION_ALLOW_EPHEMERAL  permit a generated key when the file is unreadable
//! SESSION_COOKIE_SECURE    mark the cookie `Secure` (default on)
//! ```

use std::path::PathBuf;

use actix_web::cookie::Key;
use mockable::Env;
use tracing::warn;
use zeroize::Zeroize;

const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/session_key";
const SESSION_KEY_MIN_LEN: usize = 64;
const KEY_FILE_ENV: &str = "SESSION_KEY_FILE";
const ALLOW_EPHEMERAL_ENV: &str = "SESSION_ALLOW_EPHEMERAL";
const COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no";

/// Build mode for session configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds fall back to a generated key.
    Debug,
    /// Release builds require a readable key of sufficient length.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }
}

/// Cookie session settings.
pub struct SessionSettings {
    /// Signing key for cookie sessions.
    pub key: Key,
    /// Whether session cookies are marked `Secure`.
    pub cookie_secure: bool,
}

/// Errors raised while validating session configuration.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Rejected value.
        value: String,
        /// Accepted spellings.
        expected: &'static str,
    },
    /// Reading the session key file failed.
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        /// Configured key path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The key file is too short for release builds.
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        /// Configured key path.
        path: PathBuf,
        /// Bytes read.
        length: usize,
        /// Required bytes.
        min_len: usize,
    },
}

/// Build session settings from environment variables and build mode.
pub fn session_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    let cookie_secure = flag_from_env(env, COOKIE_SECURE_ENV)?.unwrap_or(true);
    let allow_ephemeral = flag_from_env(env, ALLOW_EPHEMERAL_ENV)?.unwrap_or(false);
    let key = session_key_from_env(env, mode, allow_ephemeral)?;
    Ok(SessionSettings { key, cookie_secure })
}

fn flag_from_env<E: Env>(env: &E, name: &'static str) -> Result<Option<bool>, SessionConfigError> {
    let Some(value) = env.string(name) else {
        return Ok(None);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(Some(true)),
        "0" | "false" | "no" => Ok(Some(false)),
        _ => Err(SessionConfigError::InvalidEnv {
            name,
            value,
            expected: BOOL_EXPECTED,
        }),
    }
}

fn session_key_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<Key, SessionConfigError> {
    let path = PathBuf::from(
        env.string(KEY_FILE_ENV)
            .unwrap_or_else(|| SESSION_KEY_DEFAULT_PATH.to_owned()),
    );

    match std::fs::read(&path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if mode == BuildMode::Release && length < SESSION_KEY_MIN_LEN {
                bytes.zeroize();
                return Err(SessionConfigError::KeyTooShort {
                    path,
                    length,
                    min_len: SESSION_KEY_MIN_LEN,
                });
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(source) if mode == BuildMode::Debug || allow_ephemeral => {
            warn!(
                path = %path.display(),
                error = %source,
                "using temporary session key (dev only)"
            );
            Ok(Key::generate())
        }
        Err(source) => Err(SessionConfigError::KeyRead { path, source }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use mockable::MockEnv;
    use rstest::rstest;
    use uuid::Uuid;

    use super::*;

    struct TempKeyFile(PathBuf);

    impl TempKeyFile {
        fn new(len: usize) -> Self {
            let path = std::env::temp_dir().join(format!("session-key-{}", Uuid::new_v4()));
            std::fs::write(&path, vec![b'a'; len]).expect("write key file");
            Self(path)
        }

        fn path_str(&self) -> String {
            self.0.to_string_lossy().into_owned()
        }
    }

    impl Drop for TempKeyFile {
        fn drop(&mut self) {
            std::fs::remove_file(&self.0).ok();
        }
    }

    fn mock_env(vars: &[(&str, String)]) -> MockEnv {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect();
        let mut env = MockEnv::new();
        env.expect_string()
            .times(0..)
            .returning(move |key| vars.get(key).cloned());
        env
    }

    fn missing_key_path() -> String {
        std::env::temp_dir()
            .join(format!("missing-{}", Uuid::new_v4()))
            .to_string_lossy()
            .into_owned()
    }

    #[rstest]
    fn release_reads_key_and_defaults_to_secure_cookie() {
        let key_file = TempKeyFile::new(SESSION_KEY_MIN_LEN);
        let env = mock_env(&[(KEY_FILE_ENV, key_file.path_str())]);

        let settings =
            session_settings_from_env(&env, BuildMode::Release).expect("settings load");

        assert!(settings.cookie_secure);
    }

    #[rstest]
    fn release_rejects_short_key() {
        let key_file = TempKeyFile::new(8);
        let env = mock_env(&[(KEY_FILE_ENV, key_file.path_str())]);

        let result = session_settings_from_env(&env, BuildMode::Release);

        assert!(matches!(
            result,
            Err(SessionConfigError::KeyTooShort { length: 8, .. })
        ));
    }

    #[rstest]
    fn release_requires_key_file_unless_ephemeral_allowed() {
        let strict = mock_env(&[(KEY_FILE_ENV, missing_key_path())]);
        assert!(matches!(
            session_settings_from_env(&strict, BuildMode::Release),
            Err(SessionConfigError::KeyRead { .. })
        ));

        let relaxed = mock_env(&[
            (KEY_FILE_ENV, missing_key_path()),
            (ALLOW_EPHEMERAL_ENV, "1".to_owned()),
        ]);
        assert!(session_settings_from_env(&relaxed, BuildMode::Release).is_ok());
    }

    #[rstest]
    fn debug_generates_key_when_file_missing() {
        let env = mock_env(&[
            (KEY_FILE_ENV, missing_key_path()),
            (COOKIE_SECURE_ENV, "0".to_owned()),
        ]);

        let settings = session_settings_from_env(&env, BuildMode::Debug).expect("dev settings");

        assert!(!settings.cookie_secure);
    }

    #[rstest]
    #[case(COOKIE_SECURE_ENV)]
    #[case(ALLOW_EPHEMERAL_ENV)]
    fn invalid_flags_are_rejected(#[case] name: &'static str) {
        let env = mock_env(&[(name, "maybe".to_owned())]);

        let result = session_settings_from_env(&env, BuildMode::Debug);

        assert!(matches!(
            result,
            Err(SessionConfigError::InvalidEnv { name: rejected, .. }) if rejected == name
        ));
    }
}
