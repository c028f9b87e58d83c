//! Read-only projection consumed by clients.

use serde::{Deserialize, Serialize};

use crate::domain::UserId;

use super::{GameMove, GamePlayer, GameSession, GameStatus};

/// Full game state plus fields derived for one viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateView {
    /// The session record.
    pub session: GameSession,
    /// Players ordered by `turn_order`.
    pub players: Vec<GamePlayer>,
    /// Moves ordered by `move_number`.
    pub moves: Vec<GameMove>,
    /// Player holding the turn, if any.
    pub current_player: Option<GamePlayer>,
    /// Whether the viewer holds the turn.
    pub is_my_turn: bool,
    /// Whether the viewer created the session.
    pub is_host: bool,
    /// The viewer's own player record, if seated.
    pub my_player: Option<GamePlayer>,
    /// Whether the viewer may start the game now.
    pub can_start: bool,
}

impl GameStateView {
    /// Sort the fetched records and derive the viewer-specific fields.
    pub fn derive(
        session: GameSession,
        mut players: Vec<GamePlayer>,
        mut moves: Vec<GameMove>,
        viewer: &UserId,
    ) -> Self {
        players.sort_by_key(|p| p.turn_order);
        moves.sort_by_key(|m| m.move_number);

        let current_player = session
            .current_turn_user_id
            .as_ref()
            .and_then(|turn| players.iter().find(|p| &p.user_id == turn))
            .cloned();
        let is_my_turn = session.current_turn_user_id.as_ref() == Some(viewer);
        let is_host = session.is_hosted_by(viewer);
        let my_player = players.iter().find(|p| &p.user_id == viewer).cloned();
        let can_start = is_host && session.status == GameStatus::Lobby && players.len() >= 2;

        Self {
            session,
            players,
            moves,
            current_player,
            is_my_turn,
            is_host,
            my_player,
            can_start,
        }
    }

    /// Whether an observer for this viewer should keep polling.
    pub fn awaits_other_player(&self) -> bool {
        self.session.status == GameStatus::Active && !self.is_my_turn
    }
}
