//! Request fingerprinting for idempotency comparisons.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Failure while fingerprinting a request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadHashError {
    /// The request could not be represented as JSON.
    Serialization {
        /// Serializer message.
        message: String,
    },
}

impl fmt::Display for PayloadHashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serialization { message } => {
                write!(f, "failed to serialise request payload: {message}")
            }
        }
    }
}

impl std::error::Error for PayloadHashError {}

/// SHA-256 digest of a canonicalised request payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PayloadHash([u8; 32]);

impl PayloadHash {
    /// Wrap raw digest bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hexadecimal rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for PayloadHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Hash a JSON value after sorting object keys recursively.
///
/// Array order is significant; whitespace and key order are not.
///
/// # Examples
/// ```
/// use addon_backend::domain::canonicalize_and_hash;
/// use serde_json::json;
///
/// let a = canonicalize_and_hash(&json!({"location": "Gym A", "maxPlayers": 4}));
/// let b = canonicalize_and_hash(&json!({"maxPlayers": 4, "location": "Gym A"}));
/// assert_eq!(a, b);
/// ```
pub fn canonicalize_and_hash(value: &Value) -> PayloadHash {
    let canonical = canonicalize(value);
    // `Value`'s Display writes compact JSON and cannot fail.
    let encoded = canonical.to_string();
    PayloadHash::from_bytes(Sha256::digest(encoded.as_bytes()).into())
}

/// Serialise `request` to JSON and fingerprint it.
pub fn hash_request<T: Serialize + ?Sized>(request: &T) -> Result<PayloadHash, PayloadHashError> {
    let value = serde_json::to_value(request).map_err(|err| PayloadHashError::Serialization {
        message: err.to_string(),
    })?;
    Ok(canonicalize_and_hash(&value))
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(left, _), (right, _)| left.cmp(right));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(key, inner)| (key.clone(), canonicalize(inner)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        scalar => scalar.clone(),
    }
}
