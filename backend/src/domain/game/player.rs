//! Player membership records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{UserId, Username};

use super::GameId;

/// A user seated in a game.
///
/// `turn_order` values for one game form the contiguous range `0..n` in join
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePlayer {
    /// Owning session.
    pub game_id: GameId,
    /// Player identity.
    pub user_id: UserId,
    /// Display name captured at join time.
    pub username: Username,
    /// Zero-based seat in the rotation.
    pub turn_order: u32,
    /// Reserved; no operation eliminates players.
    pub is_eliminated: bool,
    /// Join timestamp.
    pub joined_at: DateTime<Utc>,
    /// Reserved; always `None`.
    pub eliminated_at: Option<DateTime<Utc>>,
}

/// Insert payload for a new player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGamePlayer {
    /// Owning session.
    pub game_id: GameId,
    /// Player identity.
    pub user_id: UserId,
    /// Display name captured at join time.
    pub username: Username,
    /// Requested seat; the store rejects seats already taken.
    pub turn_order: u32,
    /// Join timestamp.
    pub joined_at: DateTime<Utc>,
}

impl From<NewGamePlayer> for GamePlayer {
    fn from(value: NewGamePlayer) -> Self {
        Self {
            game_id: value.game_id,
            user_id: value.user_id,
            username: value.username,
            turn_order: value.turn_order,
            is_eliminated: false,
            joined_at: value.joined_at,
            eliminated_at: None,
        }
    }
}
