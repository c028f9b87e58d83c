//! Human-shareable room codes used to join a lobby.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::GameValidationError;

/// Number of characters in a room code.
pub const ROOM_CODE_LEN: usize = 6;
/// Symbols a room code is drawn from.
pub const ROOM_CODE_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Six-character uppercase alphanumeric room code.
///
/// Parsing trims surrounding whitespace and upper-cases the input so players
/// can type codes in any case.
///
/// # Examples
/// ```
/// use addon_backend::domain::RoomCode;
///
/// let code = RoomCode::parse(" ab12cd ").expect("valid code");
/// assert_eq!(code.as_ref(), "AB12CD");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Normalise and validate a user-supplied room code.
    pub fn parse(value: &str) -> Result<Self, GameValidationError> {
        let normalised = value.trim().to_ascii_uppercase();
        let found = normalised.chars().count();
        if found != ROOM_CODE_LEN {
            return Err(GameValidationError::RoomCodeLength { found });
        }
        for (index, ch) in normalised.chars().enumerate() {
            if !ROOM_CODE_ALPHABET.contains(ch) {
                return Err(GameValidationError::RoomCodeCharacter { ch, index });
            }
        }
        Ok(Self(normalised))
    }

    /// Draw a code uniformly from [`ROOM_CODE_ALPHABET`].
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let alphabet = ROOM_CODE_ALPHABET.as_bytes();
        let code = (0..ROOM_CODE_LEN)
            .map(|_| {
                let index = rng.gen_range(0..alphabet.len());
                alphabet.get(index).map_or('A', |byte| char::from(*byte))
            })
            .collect();
        Self(code)
    }
}

impl AsRef<str> for RoomCode {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl FromStr for RoomCode {
    type Err = GameValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<RoomCode> for String {
    fn from(value: RoomCode) -> Self {
        value.0
    }
}

impl TryFrom<String> for RoomCode {
    type Error = GameValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// Source of fresh room codes for new sessions.
pub trait RoomCodeGenerator: Send + Sync {
    /// Produce the next candidate code.
    fn next_code(&self) -> RoomCode;
}

/// Generator backed by the thread-local random number generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomRoomCodeGenerator;

impl RoomCodeGenerator for RandomRoomCodeGenerator {
    fn next_code(&self) -> RoomCode {
        RoomCode::generate(&mut rand::thread_rng())
    }
}
