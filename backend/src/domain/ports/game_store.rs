//! Driven port for game session, player and move persistence.
//!
//! The store is the only shared state between concurrent engine calls, so it
//! owns every ordering guarantee the engine relies on:
//!
//! - lobby room codes are unique (`DuplicateRoomCode`),
//! - `(game, user)` and `(game, turn_order)` are unique per player row,
//! - players are only seated while their session is still a lobby,
//! - session status and turn pointer change only through
//!   [`GameStore::compare_and_swap_session`],
//! - move numbers are assigned inside [`GameStore::append_move`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    GameId, GameMove, GamePlayer, GameSession, GameStatus, NewGameMove, NewGamePlayer,
    NewGameSession, RoomCode, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by game store adapters.
    pub enum GameStoreError {
        /// The store could not be reached.
        Connection { message: String } => "game store connection failed: {message}",
        /// A read or write failed while executing.
        Query { message: String } => "game store query failed: {message}",
        /// A conditional update found state other than expected.
        Conflict { message: String } => "game store conditional update rejected: {message}",
        /// Another lobby already uses this room code.
        DuplicateRoomCode { code: String } => "room code {code} is already used by a lobby",
        /// The user already has a player row in this game.
        DuplicatePlayer { user_id: String } => "user {user_id} already joined this game",
        /// Another player already holds this seat.
        TurnOrderTaken { turn_order: u32 } => "turn order {turn_order} is already taken",
        /// The game left the lobby before the seat was written.
        NotInLobby { game_id: String } => "game {game_id} is no longer a lobby",
        /// The targeted record does not exist.
        NotFound { message: String } => "game store record not found: {message}",
    }
}

/// Fields a conditional session update requires to still hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionExpectation {
    /// Expected lifecycle status.
    pub status: GameStatus,
    /// Expected turn holder.
    pub current_turn_user_id: Option<UserId>,
}

/// Fields written by a conditional session update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPatch {
    /// New lifecycle status.
    pub status: GameStatus,
    /// New turn holder.
    pub current_turn_user_id: Option<UserId>,
    /// Start timestamp to record; `None` leaves the stored value untouched.
    pub started_at: Option<DateTime<Utc>>,
}

impl SessionExpectation {
    /// Expectation matching the current state of `session`.
    pub fn of(session: &GameSession) -> Self {
        Self {
            status: session.status,
            current_turn_user_id: session.current_turn_user_id.clone(),
        }
    }

    /// Whether `session` still satisfies the expectation.
    pub fn holds_for(&self, session: &GameSession) -> bool {
        session.status == self.status && session.current_turn_user_id == self.current_turn_user_id
    }
}

impl SessionPatch {
    /// Apply the patch to an in-memory session record.
    pub fn apply_to(&self, session: &mut GameSession) {
        session.status = self.status;
        session.current_turn_user_id = self.current_turn_user_id.clone();
        if let Some(started_at) = self.started_at {
            session.started_at = Some(started_at);
        }
    }
}

/// Port for reading and writing the three game collections.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Insert a lobby session; the store assigns its id.
    ///
    /// Fails with [`GameStoreError::DuplicateRoomCode`] when a lobby session
    /// already uses the requested code.
    async fn insert_session(&self, session: NewGameSession)
    -> Result<GameSession, GameStoreError>;

    /// Fetch one session by id.
    async fn find_session(&self, game_id: &GameId) -> Result<Option<GameSession>, GameStoreError>;

    /// Fetch the lobby session using `room_code`, if any.
    async fn find_lobby_by_room_code(
        &self,
        room_code: &RoomCode,
    ) -> Result<Option<GameSession>, GameStoreError>;

    /// Remove a session together with its players and moves.
    async fn delete_session(&self, game_id: &GameId) -> Result<(), GameStoreError>;

    /// Atomically apply `patch` if the session still matches `expected`.
    ///
    /// Returns the updated session, [`GameStoreError::Conflict`] when the
    /// expectation no longer holds, or [`GameStoreError::NotFound`] when the
    /// session is gone.
    async fn compare_and_swap_session(
        &self,
        game_id: &GameId,
        expected: SessionExpectation,
        patch: SessionPatch,
    ) -> Result<GameSession, GameStoreError>;

    /// Seat a player.
    ///
    /// The write is conditional on the session still being a lobby; a seat
    /// requested after the game started fails with
    /// [`GameStoreError::NotInLobby`].
    async fn insert_player(&self, player: NewGamePlayer) -> Result<GamePlayer, GameStoreError>;

    /// All players of a game, in no particular order.
    async fn list_players(&self, game_id: &GameId) -> Result<Vec<GamePlayer>, GameStoreError>;

    /// One player's row, if the user joined the game.
    async fn find_player(
        &self,
        game_id: &GameId,
        user_id: &UserId,
    ) -> Result<Option<GamePlayer>, GameStoreError>;

    /// Append a move, assigning the next move number for its game.
    async fn append_move(&self, game_move: NewGameMove) -> Result<GameMove, GameStoreError>;

    /// All moves of a game, in no particular order.
    async fn list_moves(&self, game_id: &GameId) -> Result<Vec<GameMove>, GameStoreError>;
}

/// Fixture store for tests that never reach persistence.
///
/// Inserts echo their input under fresh ids; reads find nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureGameStore;

#[async_trait]
impl GameStore for FixtureGameStore {
    async fn insert_session(
        &self,
        session: NewGameSession,
    ) -> Result<GameSession, GameStoreError> {
        Ok(session.into_session(GameId::random()))
    }

    async fn find_session(&self, _game_id: &GameId) -> Result<Option<GameSession>, GameStoreError> {
        Ok(None)
    }

    async fn find_lobby_by_room_code(
        &self,
        _room_code: &RoomCode,
    ) -> Result<Option<GameSession>, GameStoreError> {
        Ok(None)
    }

    async fn delete_session(&self, _game_id: &GameId) -> Result<(), GameStoreError> {
        Ok(())
    }

    async fn compare_and_swap_session(
        &self,
        game_id: &GameId,
        _expected: SessionExpectation,
        _patch: SessionPatch,
    ) -> Result<GameSession, GameStoreError> {
        Err(GameStoreError::not_found(format!("session {game_id}")))
    }

    async fn insert_player(&self, player: NewGamePlayer) -> Result<GamePlayer, GameStoreError> {
        Ok(player.into())
    }

    async fn list_players(&self, _game_id: &GameId) -> Result<Vec<GamePlayer>, GameStoreError> {
        Ok(Vec::new())
    }

    async fn find_player(
        &self,
        _game_id: &GameId,
        _user_id: &UserId,
    ) -> Result<Option<GamePlayer>, GameStoreError> {
        Ok(None)
    }

    async fn append_move(&self, game_move: NewGameMove) -> Result<GameMove, GameStoreError> {
        Ok(game_move.into_move(Uuid::new_v4(), 1))
    }

    async fn list_moves(&self, _game_id: &GameId) -> Result<Vec<GameMove>, GameStoreError> {
        Ok(Vec::new())
    }
}
