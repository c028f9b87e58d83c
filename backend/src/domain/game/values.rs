//! Validated scalar values used by game records.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::GameValidationError;

/// Stable game session identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(Uuid);

impl GameId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for GameId {
    type Err = GameValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| GameValidationError::InvalidGameId)
    }
}

/// Free-text climbing location, trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Location(String);

impl Location {
    /// Validate and construct a [`Location`].
    pub fn new(location: impl Into<String>) -> Result<Self, GameValidationError> {
        let location = location.into();
        let trimmed = location.trim();
        if trimmed.is_empty() {
            return Err(GameValidationError::EmptyLocation);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Location {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Location> for String {
    fn from(value: Location) -> Self {
        value.0
    }
}

impl TryFrom<String> for Location {
    type Error = GameValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Inclusive bounds for [`MaxPlayers`].
pub const MAX_PLAYERS_RANGE: RangeInclusive<u8> = 2..=12;

/// Player limit for a session, between 2 and 12 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct MaxPlayers(u8);

impl MaxPlayers {
    /// Validate a requested player limit.
    ///
    /// # Examples
    /// ```
    /// use addon_backend::domain::MaxPlayers;
    ///
    /// assert!(MaxPlayers::new(4).is_ok());
    /// assert!(MaxPlayers::new(1).is_err());
    /// assert!(MaxPlayers::new(13).is_err());
    /// ```
    pub fn new(value: i64) -> Result<Self, GameValidationError> {
        u8::try_from(value)
            .ok()
            .filter(|candidate| MAX_PLAYERS_RANGE.contains(candidate))
            .map(Self)
            .ok_or(GameValidationError::MaxPlayersOutOfRange { value })
    }

    /// Limit as an unsigned count.
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Whether `player_count` players already fill the session.
    pub fn is_reached_by(self, player_count: usize) -> bool {
        player_count >= usize::from(self.0)
    }
}

impl From<MaxPlayers> for u8 {
    fn from(value: MaxPlayers) -> Self {
        value.0
    }
}

impl TryFrom<i64> for MaxPlayers {
    type Error = GameValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Description of the hold added by a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HoldDescription(String);

impl HoldDescription {
    /// Validate and construct a [`HoldDescription`].
    pub fn new(description: impl Into<String>) -> Result<Self, GameValidationError> {
        let description = description.into();
        let trimmed = description.trim();
        if trimmed.is_empty() {
            return Err(GameValidationError::EmptyHoldDescription);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for HoldDescription {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<HoldDescription> for String {
    fn from(value: HoldDescription) -> Self {
        value.0
    }
}

impl TryFrom<String> for HoldDescription {
    type Error = GameValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Optional photo reference attached to a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhotoUrl(String);

impl PhotoUrl {
    /// Validate and construct a [`PhotoUrl`].
    pub fn new(url: impl Into<String>) -> Result<Self, GameValidationError> {
        let url = url.into();
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(GameValidationError::EmptyPhotoUrl);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for PhotoUrl {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<PhotoUrl> for String {
    fn from(value: PhotoUrl) -> Self {
        value.0
    }
}

impl TryFrom<String> for PhotoUrl {
    type Error = GameValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
