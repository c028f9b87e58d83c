//! Add-on game session domain types.
//!
//! A game session collects players in a lobby, then hands the turn around
//! the table in join order while each player appends one described hold to a
//! shared move log.
//!
//! Lifecycle: `lobby --start--> active`. The `completed` status and player
//! elimination are part of the record shape but no operation reaches them.

use std::fmt;

mod moves;
mod player;
mod room_code;
mod session;
#[cfg(test)]
mod tests;
mod turn;
mod values;
mod view;

pub use moves::{GameMove, NewGameMove};
pub use player::{GamePlayer, NewGamePlayer};
pub use room_code::{
    ROOM_CODE_ALPHABET, ROOM_CODE_LEN, RandomRoomCodeGenerator, RoomCode, RoomCodeGenerator,
};
pub use session::{GameSession, GameStatus, NewGameSession};
pub use turn::{first_turn, next_turn};
pub use values::{GameId, HoldDescription, Location, MAX_PLAYERS_RANGE, MaxPlayers, PhotoUrl};
pub use view::GameStateView;

/// Validation errors raised by game value constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameValidationError {
    /// The location was blank.
    EmptyLocation,
    /// The player limit fell outside [`MAX_PLAYERS_RANGE`].
    MaxPlayersOutOfRange {
        /// Rejected value.
        value: i64,
    },
    /// The hold description was blank.
    EmptyHoldDescription,
    /// A photo URL was supplied but blank.
    EmptyPhotoUrl,
    /// The room code did not have [`ROOM_CODE_LEN`] characters.
    RoomCodeLength {
        /// Characters received.
        found: usize,
    },
    /// The room code contained a character outside [`ROOM_CODE_ALPHABET`].
    RoomCodeCharacter {
        /// Offending character.
        ch: char,
        /// Zero-based position.
        index: usize,
    },
    /// The game id was not a UUID.
    InvalidGameId,
}

impl fmt::Display for GameValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyLocation => write!(f, "location must not be empty"),
            Self::MaxPlayersOutOfRange { value } => write!(
                f,
                "max players must be between {} and {} (got {value})",
                MAX_PLAYERS_RANGE.start(),
                MAX_PLAYERS_RANGE.end()
            ),
            Self::EmptyHoldDescription => write!(f, "hold description must not be empty"),
            Self::EmptyPhotoUrl => write!(f, "photo url must not be empty when provided"),
            Self::RoomCodeLength { found } => {
                write!(f, "room code must be {ROOM_CODE_LEN} characters, got {found}")
            }
            Self::RoomCodeCharacter { ch, index } => {
                write!(f, "invalid room code character '{ch}' at position {index}")
            }
            Self::InvalidGameId => write!(f, "game id must be a valid UUID"),
        }
    }
}

impl std::error::Error for GameValidationError {}
