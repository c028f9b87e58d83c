//! Discriminates which engine operation an idempotency key protects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Engine mutation guarded by an idempotency record.
///
/// # Examples
/// ```
/// use addon_backend::domain::MutationType;
///
/// assert_eq!(MutationType::AddMove.as_str(), "add_move");
/// assert_eq!("join_session".parse(), Ok(MutationType::JoinSession));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationType {
    /// `create_session`.
    CreateSession,
    /// `join_session`.
    JoinSession,
    /// `start_session`.
    StartSession,
    /// `add_move`.
    AddMove,
}

impl MutationType {
    /// Every variant, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::CreateSession,
        Self::JoinSession,
        Self::StartSession,
        Self::AddMove,
    ];

    /// Stable snake_case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateSession => "create_session",
            Self::JoinSession => "join_session",
            Self::StartSession => "start_session",
            Self::AddMove => "add_move",
        }
    }
}

impl fmt::Display for MutationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no [`MutationType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMutationTypeError {
    /// Rejected input.
    pub input: String,
}

impl fmt::Display for ParseMutationTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = MutationType::ALL.iter().map(|m| m.as_str()).collect();
        write!(
            f,
            "unknown mutation type '{}', expected one of {}",
            self.input,
            names.join(", ")
        )
    }
}

impl std::error::Error for ParseMutationTypeError {}

impl FromStr for MutationType {
    type Err = ParseMutationTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ParseMutationTypeError {
                input: s.to_owned(),
            })
    }
}
