//! Append-only move log records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{UserId, Username};

use super::{GameId, HoldDescription, PhotoUrl};

/// One described hold appended to the shared sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameMove {
    /// Store-assigned identifier.
    pub id: Uuid,
    /// Owning session.
    pub game_id: GameId,
    /// One-based position in the game's move log.
    pub move_number: u32,
    /// Author identity.
    pub added_by_user_id: UserId,
    /// Author display name.
    pub added_by_username: Username,
    /// The hold being added.
    pub hold_description: HoldDescription,
    /// Optional photo of the hold.
    pub photo_url: Option<PhotoUrl>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Append payload; the store assigns `id` and `move_number`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGameMove {
    /// Owning session.
    pub game_id: GameId,
    /// Author identity.
    pub added_by_user_id: UserId,
    /// Author display name.
    pub added_by_username: Username,
    /// The hold being added.
    pub hold_description: HoldDescription,
    /// Optional photo of the hold.
    pub photo_url: Option<PhotoUrl>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl NewGameMove {
    /// Materialise the record with store-assigned identity and sequence.
    pub fn into_move(self, id: Uuid, move_number: u32) -> GameMove {
        GameMove {
            id,
            game_id: self.game_id,
            move_number,
            added_by_user_id: self.added_by_user_id,
            added_by_username: self.added_by_username,
            hold_description: self.hold_description,
            photo_url: self.photo_url,
            created_at: self.created_at,
        }
    }
}
