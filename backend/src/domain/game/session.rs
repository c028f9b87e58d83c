//! Game session records and the forward-only status machine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::UserId;

use super::{GameId, Location, MaxPlayers, RoomCode};

/// Session lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Players may join; no moves yet.
    Lobby,
    /// Turns rotate and moves are appended.
    Active,
    /// Terminal. Declared by the record shape; nothing transitions here yet.
    Completed,
}

impl GameStatus {
    /// Whether the status machine allows moving from `self` to `next`.
    ///
    /// # Examples
    /// ```
    /// use addon_backend::domain::GameStatus;
    ///
    /// assert!(GameStatus::Lobby.can_transition_to(GameStatus::Active));
    /// assert!(!GameStatus::Active.can_transition_to(GameStatus::Lobby));
    /// ```
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Lobby, Self::Active) | (Self::Active, Self::Completed)
        )
    }

    /// Stable lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lobby => "lobby",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted game session.
///
/// ## Invariants
/// - `current_turn_user_id` is `None` exactly while `status` is
///   [`GameStatus::Lobby`].
/// - When set, `current_turn_user_id` names a non-eliminated player of this
///   game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    /// Store-assigned identifier.
    pub id: GameId,
    /// Creator of the session.
    pub host_id: UserId,
    /// Code shared with other players.
    pub room_code: RoomCode,
    /// Where the group is climbing.
    pub location: Location,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Player allowed to add the next move.
    pub current_turn_user_id: Option<UserId>,
    /// Player limit.
    pub max_players: MaxPlayers,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Set when the host starts the game.
    pub started_at: Option<DateTime<Utc>>,
    /// Reserved for a completion transition.
    pub ended_at: Option<DateTime<Utc>>,
}

impl GameSession {
    /// Whether `user_id` created this session.
    pub fn is_hosted_by(&self, user_id: &UserId) -> bool {
        &self.host_id == user_id
    }

    /// Whether `user_id` may add the next move.
    pub fn is_turn_of(&self, user_id: &UserId) -> bool {
        self.status == GameStatus::Active && self.current_turn_user_id.as_ref() == Some(user_id)
    }
}

/// Insert payload for a new lobby session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGameSession {
    /// Creator of the session.
    pub host_id: UserId,
    /// Candidate room code; the store rejects codes already used by a lobby.
    pub room_code: RoomCode,
    /// Where the group is climbing.
    pub location: Location,
    /// Player limit.
    pub max_players: MaxPlayers,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl NewGameSession {
    /// Materialise the lobby record under the store-assigned id.
    pub fn into_session(self, id: GameId) -> GameSession {
        GameSession {
            id,
            host_id: self.host_id,
            room_code: self.room_code,
            location: self.location,
            status: GameStatus::Lobby,
            current_turn_user_id: None,
            max_players: self.max_players,
            created_at: self.created_at,
            started_at: None,
            ended_at: None,
        }
    }
}
