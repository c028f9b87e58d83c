//! Client-supplied idempotency keys.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors for [`IdempotencyKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdempotencyKeyValidationError {
    /// The header or field was present but empty.
    EmptyKey,
    /// The value was not a canonical UUID string.
    InvalidKey,
}

impl fmt::Display for IdempotencyKeyValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyKey => write!(f, "idempotency key must not be empty"),
            Self::InvalidKey => write!(f, "idempotency key must be a valid UUID"),
        }
    }
}

impl std::error::Error for IdempotencyKeyValidationError {}

/// UUID chosen by the client for one logical mutation.
///
/// Clients reuse the same key when retrying after a timeout or dropped
/// connection; the engine then answers with the response recorded for the
/// first attempt.
///
/// # Examples
/// ```
/// use addon_backend::domain::IdempotencyKey;
///
/// let key = IdempotencyKey::new("550e8400-e29b-41d4-a716-446655440000").expect("uuid");
/// assert_eq!(key.to_string(), "550e8400-e29b-41d4-a716-446655440000");
/// assert!(IdempotencyKey::new("retry-1").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdempotencyKey(Uuid, String);

impl IdempotencyKey {
    /// Validate a key string; surrounding whitespace is rejected, not trimmed.
    pub fn new(key: impl AsRef<str>) -> Result<Self, IdempotencyKeyValidationError> {
        Self::parse_owned(key.as_ref().to_owned())
    }

    /// Wrap an already parsed UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, uuid.to_string())
    }

    /// Fresh random key, mostly for clients and tests.
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    fn parse_owned(raw: String) -> Result<Self, IdempotencyKeyValidationError> {
        if raw.is_empty() {
            return Err(IdempotencyKeyValidationError::EmptyKey);
        }
        if raw.trim() != raw {
            return Err(IdempotencyKeyValidationError::InvalidKey);
        }
        let uuid = Uuid::parse_str(&raw).map_err(|_| IdempotencyKeyValidationError::InvalidKey)?;
        Ok(Self(uuid, raw))
    }

    /// Underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for IdempotencyKey {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<IdempotencyKey> for String {
    fn from(value: IdempotencyKey) -> Self {
        value.1
    }
}

impl TryFrom<String> for IdempotencyKey {
    type Error = IdempotencyKeyValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_owned(value)
    }
}
