//! Game engine services.
//!
//! [`GameCommandService`] implements the four state-changing operations over
//! a [`GameStore`]. Each operation is a short sequence of store round trips;
//! the only writes that race with other clients (session status and the turn
//! pointer) go through the store's compare-and-swap, so a stale caller gets
//! an explicit conflict instead of overwriting newer state.
//!
//! [`GameQueryService`] implements the observer's full-state fetch.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    AddMovePayload, AddMoveRequest, CreateSessionRequest, GameCommand, GameQuery, GameStore,
    GameStoreError, IdempotencyStore, JoinSessionRequest, SessionExpectation, SessionPatch,
    StartSessionRequest, parse_hold, parse_location, parse_max_players, parse_room_code,
};
use crate::domain::{
    Actor, Error, GameId, GameMove, GameSession, GameStateView, GameStatus, IdempotencyConfig,
    Location, MaxPlayers,
    MutationType, NewGameMove, NewGamePlayer, NewGameSession, RoomCode, RoomCodeGenerator, UserId,
    first_turn, next_turn,
};

use super::game_service_idempotency::IdempotentMutation;

/// Seat attempts made by one join before giving up on a busy lobby.
const JOIN_SEAT_ATTEMPTS: usize = 12;

pub(super) fn map_store_error(error: GameStoreError) -> Error {
    match error {
        GameStoreError::Connection { message } => {
            Error::service_unavailable(format!("game store unavailable: {message}"))
        }
        GameStoreError::Query { message } => {
            Error::internal(format!("game store error: {message}"))
        }
        GameStoreError::Conflict { message } => {
            Error::turn_conflict(format!("game changed concurrently: {message}"))
        }
        GameStoreError::DuplicateRoomCode { code } => {
            Error::conflict(format!("room code {code} is already in use"))
        }
        GameStoreError::DuplicatePlayer { user_id } => {
            Error::conflict(format!("user {user_id} already joined this game"))
        }
        GameStoreError::TurnOrderTaken { turn_order } => {
            Error::turn_conflict(format!("seat {turn_order} was taken concurrently"))
        }
        GameStoreError::NotInLobby { game_id } => {
            Error::not_found(format!("game {game_id} is no longer open for joining"))
        }
        GameStoreError::NotFound { message } => {
            Error::not_found(format!("game record not found: {message}"))
        }
    }
}

/// Tunables for [`GameCommandService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameEngineConfig {
    /// Room codes tried before create gives up on collisions.
    pub room_code_attempts: u32,
    /// Lifetime of idempotency records written by the engine.
    pub idempotency: IdempotencyConfig,
}

impl Default for GameEngineConfig {
    fn default() -> Self {
        Self {
            room_code_attempts: 5,
            idempotency: IdempotencyConfig::default(),
        }
    }
}

/// Engine implementing the [`GameCommand`] driving port.
#[derive(Clone)]
pub struct GameCommandService<S, I> {
    pub(super) store: Arc<S>,
    pub(super) idempotency: Arc<I>,
    pub(super) clock: Arc<dyn Clock>,
    room_codes: Arc<dyn RoomCodeGenerator>,
    pub(super) config: GameEngineConfig,
}

impl<S, I> GameCommandService<S, I> {
    /// Build the engine over its driven ports.
    pub fn new(
        store: Arc<S>,
        idempotency: Arc<I>,
        clock: Arc<dyn Clock>,
        room_codes: Arc<dyn RoomCodeGenerator>,
        config: GameEngineConfig,
    ) -> Self {
        Self {
            store,
            idempotency,
            clock,
            room_codes,
            config,
        }
    }
}

impl<S, I> GameCommandService<S, I>
where
    S: GameStore,
    I: IdempotencyStore,
{
    async fn load_session(&self, game_id: &GameId) -> Result<GameSession, Error> {
        self.store
            .find_session(game_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| Error::not_found(format!("game {game_id} not found")))
    }

    async fn insert_lobby(
        &self,
        host_id: &UserId,
        location: Location,
        max_players: MaxPlayers,
    ) -> Result<GameSession, Error> {
        let attempts = self.config.room_code_attempts.max(1);
        for attempt in 1..=attempts {
            let candidate = NewGameSession {
                host_id: host_id.clone(),
                room_code: self.room_codes.next_code(),
                location: location.clone(),
                max_players,
                created_at: self.clock.utc(),
            };
            match self.store.insert_session(candidate).await {
                Ok(session) => return Ok(session),
                Err(GameStoreError::DuplicateRoomCode { code }) => {
                    debug!(attempt, %code, "room code collision; regenerating");
                }
                Err(err) => return Err(map_store_error(err)),
            }
        }
        Err(Error::service_unavailable(
            "could not allocate a unique room code; try again",
        ))
    }

    async fn create_lobby(
        &self,
        actor: Actor,
        location: Location,
        max_players: MaxPlayers,
    ) -> Result<GameSession, Error> {
        let session = self
            .insert_lobby(&actor.user_id, location, max_players)
            .await?;
        let host = NewGamePlayer {
            game_id: session.id,
            user_id: actor.user_id.clone(),
            username: actor.username,
            turn_order: 0,
            joined_at: self.clock.utc(),
        };

        if let Err(err) = self.store.insert_player(host).await {
            warn!(game_id = %session.id, error = %err, "host seat failed; removing session");
            if let Err(cleanup) = self.store.delete_session(&session.id).await {
                warn!(game_id = %session.id, error = %cleanup, "orphaned session cleanup failed");
            }
            return Err(map_store_error(err));
        }

        info!(
            game_id = %session.id,
            room_code = %session.room_code,
            host = %actor.user_id,
            "game session created"
        );
        Ok(session)
    }

    async fn seat_player(&self, actor: Actor, room_code: RoomCode) -> Result<GameSession, Error> {
        let session = self
            .store
            .find_lobby_by_room_code(&room_code)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| Error::not_found(format!("no open game for code {room_code}")))?;

        for _ in 0..JOIN_SEAT_ATTEMPTS {
            let existing = self
                .store
                .find_player(&session.id, &actor.user_id)
                .await
                .map_err(map_store_error)?;
            if existing.is_some() {
                debug!(game_id = %session.id, user = %actor.user_id, "already seated");
                return Ok(session);
            }

            let seated = self
                .store
                .list_players(&session.id)
                .await
                .map_err(map_store_error)?
                .len();
            if session.max_players.is_reached_by(seated) {
                return Err(Error::game_full(format!(
                    "game {room_code} already has {} players",
                    session.max_players.get()
                )));
            }
            let turn_order = u32::try_from(seated)
                .map_err(|_| Error::internal("player count exceeds turn order range"))?;

            let player = NewGamePlayer {
                game_id: session.id,
                user_id: actor.user_id.clone(),
                username: actor.username.clone(),
                turn_order,
                joined_at: self.clock.utc(),
            };
            match self.store.insert_player(player).await {
                Ok(player) => {
                    info!(
                        game_id = %session.id,
                        user = %player.user_id,
                        turn_order = player.turn_order,
                        "player joined"
                    );
                    return Ok(session);
                }
                Err(GameStoreError::TurnOrderTaken { turn_order }) => {
                    debug!(game_id = %session.id, turn_order, "seat taken concurrently; recounting");
                }
                Err(GameStoreError::DuplicatePlayer { .. }) => return Ok(session),
                Err(err) => return Err(map_store_error(err)),
            }
        }

        Err(Error::turn_conflict(
            "lobby changed too quickly while joining; try again",
        ))
    }

    async fn activate(&self, actor: Actor, game_id: GameId) -> Result<GameSession, Error> {
        let session = self.load_session(&game_id).await?;
        if !session.is_hosted_by(&actor.user_id) {
            return Err(Error::forbidden("only the host can start the game"));
        }
        match session.status {
            GameStatus::Lobby => {}
            GameStatus::Active => return Ok(session),
            GameStatus::Completed => return Err(Error::conflict("game has already finished")),
        }

        let players = self
            .store
            .list_players(&game_id)
            .await
            .map_err(map_store_error)?;
        if players.len() < 2 {
            return Err(Error::not_enough_players(
                "at least two players are needed to start",
            ));
        }
        let first = first_turn(&players)
            .map(|player| player.user_id.clone())
            .ok_or_else(|| Error::not_enough_players("no seated players can take a turn"))?;

        let patch = SessionPatch {
            status: GameStatus::Active,
            current_turn_user_id: Some(first.clone()),
            started_at: Some(self.clock.utc()),
        };
        match self
            .store
            .compare_and_swap_session(&game_id, SessionExpectation::of(&session), patch)
            .await
        {
            Ok(active) => {
                info!(game_id = %game_id, first_turn = %first, players = players.len(), "game started");
                Ok(active)
            }
            Err(GameStoreError::Conflict { .. }) => {
                let current = self.load_session(&game_id).await?;
                if current.status == GameStatus::Active {
                    debug!(game_id = %game_id, "concurrent start already activated the game");
                    Ok(current)
                } else {
                    Err(Error::turn_conflict("game changed while starting; try again"))
                }
            }
            Err(err) => Err(map_store_error(err)),
        }
    }

    async fn record_move(
        &self,
        actor: Actor,
        game_id: GameId,
        payload: AddMovePayload,
    ) -> Result<GameMove, Error> {
        let session = self.load_session(&game_id).await?;
        if !session.is_turn_of(&actor.user_id) {
            return Err(Error::not_your_turn("it is not your turn"));
        }
        let (hold_description, photo_url) = parse_hold(&payload)?;

        let players = self
            .store
            .list_players(&game_id)
            .await
            .map_err(map_store_error)?;
        let next = next_turn(&players, &actor.user_id)
            .map(|player| player.user_id.clone())
            .ok_or_else(|| Error::internal("turn holder is not a seated player"))?;

        let expected = SessionExpectation {
            status: GameStatus::Active,
            current_turn_user_id: Some(actor.user_id.clone()),
        };
        let patch = SessionPatch {
            status: GameStatus::Active,
            current_turn_user_id: Some(next.clone()),
            started_at: None,
        };
        match self
            .store
            .compare_and_swap_session(&game_id, expected, patch)
            .await
        {
            Ok(_) => {}
            Err(GameStoreError::Conflict { .. }) => {
                return Err(Error::turn_conflict(
                    "the turn changed before your move was recorded",
                ));
            }
            Err(err) => return Err(map_store_error(err)),
        }

        let new_move = NewGameMove {
            game_id,
            added_by_user_id: actor.user_id.clone(),
            added_by_username: actor.username,
            hold_description,
            photo_url,
            created_at: self.clock.utc(),
        };
        match self.store.append_move(new_move).await {
            Ok(recorded) => {
                info!(
                    game_id = %game_id,
                    move_number = recorded.move_number,
                    next_turn = %next,
                    "move added"
                );
                Ok(recorded)
            }
            Err(err) => {
                warn!(game_id = %game_id, error = %err, "move append failed; restoring turn");
                self.restore_turn(&game_id, next, actor.user_id).await;
                Err(map_store_error(err))
            }
        }
    }

    async fn restore_turn(&self, game_id: &GameId, advanced_to: UserId, original: UserId) {
        let expected = SessionExpectation {
            status: GameStatus::Active,
            current_turn_user_id: Some(advanced_to),
        };
        let patch = SessionPatch {
            status: GameStatus::Active,
            current_turn_user_id: Some(original),
            started_at: None,
        };
        if let Err(err) = self
            .store
            .compare_and_swap_session(game_id, expected, patch)
            .await
        {
            warn!(game_id = %game_id, error = %err, "turn restore failed");
        }
    }
}

#[async_trait]
impl<S, I> GameCommand for GameCommandService<S, I>
where
    S: GameStore,
    I: IdempotencyStore,
{
    async fn create_session(&self, request: CreateSessionRequest) -> Result<GameSession, Error> {
        let CreateSessionRequest {
            actor,
            payload,
            idempotency_key,
        } = request;
        let location = parse_location(&payload.location)?;
        let max_players = parse_max_players(payload.max_players)?;
        let guard = IdempotentMutation::prepare(
            idempotency_key,
            &actor,
            MutationType::CreateSession,
            &payload,
        )?;

        self.run_idempotent(guard, move || {
            self.create_lobby(actor, location, max_players)
        })
        .await
    }

    async fn join_session(&self, request: JoinSessionRequest) -> Result<GameSession, Error> {
        let JoinSessionRequest {
            actor,
            payload,
            idempotency_key,
        } = request;
        let room_code = parse_room_code(&payload.room_code)?;
        let guard = IdempotentMutation::prepare(
            idempotency_key,
            &actor,
            MutationType::JoinSession,
            &serde_json::json!({ "roomCode": room_code }),
        )?;

        self.run_idempotent(guard, move || self.seat_player(actor, room_code))
            .await
    }

    async fn start_session(&self, request: StartSessionRequest) -> Result<GameSession, Error> {
        let StartSessionRequest {
            actor,
            game_id,
            idempotency_key,
        } = request;
        let guard = IdempotentMutation::prepare(
            idempotency_key,
            &actor,
            MutationType::StartSession,
            &serde_json::json!({ "gameId": game_id }),
        )?;

        self.run_idempotent(guard, move || self.activate(actor, game_id))
            .await
    }

    async fn add_move(&self, request: AddMoveRequest) -> Result<GameMove, Error> {
        let AddMoveRequest {
            actor,
            game_id,
            payload,
            idempotency_key,
        } = request;
        let guard = IdempotentMutation::prepare(
            idempotency_key,
            &actor,
            MutationType::AddMove,
            &serde_json::json!({ "gameId": game_id, "move": &payload }),
        )?;

        self.run_idempotent(guard, move || self.record_move(actor, game_id, payload))
            .await
    }
}

/// Service implementing the [`GameQuery`] driving port.
#[derive(Clone)]
pub struct GameQueryService<S> {
    store: Arc<S>,
}

impl<S> GameQueryService<S> {
    /// Build the query service over the game store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S> GameQuery for GameQueryService<S>
where
    S: GameStore,
{
    async fn load_state(&self, game_id: &GameId, viewer: &UserId) -> Result<GameStateView, Error> {
        let session = self
            .store
            .find_session(game_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| Error::not_found(format!("game {game_id} not found")))?;
        let (players, moves) = tokio::try_join!(
            self.store.list_players(game_id),
            self.store.list_moves(game_id)
        )
        .map_err(map_store_error)?;

        debug!(
            game_id = %game_id,
            players = players.len(),
            moves = moves.len(),
            "loaded game state"
        );
        Ok(GameStateView::derive(session, players, moves, viewer))
    }
}

#[cfg(test)]
#[path = "game_service_tests.rs"]
mod tests;
