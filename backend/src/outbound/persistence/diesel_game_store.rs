//! PostgreSQL-backed [`GameStore`].
//!
//! The ordering guarantees the engine relies on live in the database:
//!
//! - `game_sessions_lobby_room_code_key` is a partial unique index over
//!   `room_code WHERE status = 'lobby'`.
//! - `game_players` carries unique constraints on `(game_id, user_id)` and
//!   `(game_id, turn_order)`.
//! - Seating and move appends lock the session row (`FOR UPDATE`), so they
//!   serialise against each other and against the start transition.
//! - Status and turn changes are a single
//!   `UPDATE .. WHERE status = $ AND current_turn_user_id IS NOT DISTINCT FROM $`.

use std::fmt;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{GameStore, GameStoreError, SessionExpectation, SessionPatch};
use crate::domain::{
    GameId, GameMove, GamePlayer, GameSession, GameStatus, HoldDescription, Location, MaxPlayers,
    NewGameMove, NewGamePlayer, NewGameSession, PhotoUrl, RoomCode, UserId, Username,
};

use super::diesel_basic_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, unique_violation,
};
use super::models::{
    GameMoveRow, GamePlayerRow, GameSessionRow, NewGamePlayerRow, NewGameSessionRow,
    SessionPatchRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{game_moves, game_players, game_sessions};

const LOBBY_ROOM_CODE_KEY: &str = "game_sessions_lobby_room_code_key";
const PLAYER_USER_KEY: &str = "game_players_game_user_key";
const PLAYER_TURN_ORDER_KEY: &str = "game_players_game_turn_order_key";

/// Diesel implementation of the [`GameStore`] port.
#[derive(Clone)]
pub struct DieselGameStore {
    pool: DbPool,
}

impl DieselGameStore {
    /// Store over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> GameStoreError {
    map_basic_pool_error(error, GameStoreError::connection)
}

fn map_diesel_error(error: DieselError) -> GameStoreError {
    map_basic_diesel_error(error, GameStoreError::query, GameStoreError::connection)
}

fn map_session_insert_error(error: DieselError, room_code: &RoomCode) -> GameStoreError {
    if unique_violation(&error) == Some(LOBBY_ROOM_CODE_KEY) {
        return GameStoreError::duplicate_room_code(room_code.as_ref());
    }
    map_diesel_error(error)
}

fn map_seat_error(error: DieselError, player: &NewGamePlayer) -> GameStoreError {
    match unique_violation(&error) {
        Some(PLAYER_USER_KEY) => GameStoreError::duplicate_player(player.user_id.as_ref()),
        Some(PLAYER_TURN_ORDER_KEY) => GameStoreError::turn_order_taken(player.turn_order),
        _ => map_diesel_error(error),
    }
}

fn corrupt(column: &str, err: impl fmt::Display) -> GameStoreError {
    GameStoreError::query(format!("invalid {column} in database: {err}"))
}

fn missing(game_id: &GameId) -> GameStoreError {
    GameStoreError::not_found(format!("session {game_id}"))
}

fn status_from_db(raw: &str) -> Result<GameStatus, GameStoreError> {
    match raw {
        "lobby" => Ok(GameStatus::Lobby),
        "active" => Ok(GameStatus::Active),
        "completed" => Ok(GameStatus::Completed),
        other => Err(corrupt("status", other)),
    }
}

fn row_to_session(row: GameSessionRow) -> Result<GameSession, GameStoreError> {
    Ok(GameSession {
        id: GameId::from_uuid(row.id),
        host_id: UserId::from_uuid(row.host_id),
        room_code: RoomCode::parse(&row.room_code).map_err(|err| corrupt("room_code", err))?,
        location: Location::new(row.location).map_err(|err| corrupt("location", err))?,
        status: status_from_db(&row.status)?,
        current_turn_user_id: row.current_turn_user_id.map(UserId::from_uuid),
        max_players: MaxPlayers::new(i64::from(row.max_players))
            .map_err(|err| corrupt("max_players", err))?,
        created_at: row.created_at,
        started_at: row.started_at,
        ended_at: row.ended_at,
    })
}

fn row_to_player(row: GamePlayerRow) -> Result<GamePlayer, GameStoreError> {
    Ok(GamePlayer {
        game_id: GameId::from_uuid(row.game_id),
        user_id: UserId::from_uuid(row.user_id),
        username: Username::new(row.username).map_err(|err| corrupt("username", err))?,
        turn_order: u32::try_from(row.turn_order).map_err(|err| corrupt("turn_order", err))?,
        is_eliminated: row.is_eliminated,
        joined_at: row.joined_at,
        eliminated_at: row.eliminated_at,
    })
}

fn row_to_move(row: GameMoveRow) -> Result<GameMove, GameStoreError> {
    Ok(GameMove {
        id: row.id,
        game_id: GameId::from_uuid(row.game_id),
        move_number: u32::try_from(row.move_number).map_err(|err| corrupt("move_number", err))?,
        added_by_user_id: UserId::from_uuid(row.added_by_user_id),
        added_by_username: Username::new(row.added_by_username)
            .map_err(|err| corrupt("added_by_username", err))?,
        hold_description: HoldDescription::new(row.hold_description)
            .map_err(|err| corrupt("hold_description", err))?,
        photo_url: row
            .photo_url
            .map(PhotoUrl::new)
            .transpose()
            .map_err(|err| corrupt("photo_url", err))?,
        created_at: row.created_at,
    })
}

fn collect<R, T>(
    rows: Vec<R>,
    convert: fn(R) -> Result<T, GameStoreError>,
) -> Result<Vec<T>, GameStoreError> {
    rows.into_iter().map(convert).collect()
}

/// What the seating transaction found under the session lock.
enum Seating {
    Seated,
    NotInLobby,
    MissingSession,
}

#[async_trait]
impl GameStore for DieselGameStore {
    async fn insert_session(
        &self,
        session: NewGameSession,
    ) -> Result<GameSession, GameStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let new_row = NewGameSessionRow {
            id: Uuid::new_v4(),
            host_id: *session.host_id.as_uuid(),
            room_code: session.room_code.as_ref(),
            location: session.location.as_ref(),
            status: GameStatus::Lobby.as_str(),
            max_players: i16::from(session.max_players.get()),
            created_at: session.created_at,
        };

        let row = diesel::insert_into(game_sessions::table)
            .values(&new_row)
            .returning(GameSessionRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| map_session_insert_error(err, &session.room_code))?;
        debug!(game_id = %row.id, "inserted session");
        row_to_session(row)
    }

    async fn find_session(&self, game_id: &GameId) -> Result<Option<GameSession>, GameStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        game_sessions::table
            .find(game_id.as_uuid())
            .select(GameSessionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_session)
            .transpose()
    }

    async fn find_lobby_by_room_code(
        &self,
        room_code: &RoomCode,
    ) -> Result<Option<GameSession>, GameStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        game_sessions::table
            .filter(game_sessions::room_code.eq(room_code.as_ref()))
            .filter(game_sessions::status.eq(GameStatus::Lobby.as_str()))
            .select(GameSessionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_session)
            .transpose()
    }

    async fn delete_session(&self, game_id: &GameId) -> Result<(), GameStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        // Players and moves go with the session through ON DELETE CASCADE.
        diesel::delete(game_sessions::table.find(game_id.as_uuid()))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn compare_and_swap_session(
        &self,
        game_id: &GameId,
        expected: SessionExpectation,
        patch: SessionPatch,
    ) -> Result<GameSession, GameStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let expected_turn = expected
            .current_turn_user_id
            .as_ref()
            .map(|user_id| *user_id.as_uuid());
        let changes = SessionPatchRow {
            status: patch.status.as_str(),
            current_turn_user_id: Some(
                patch
                    .current_turn_user_id
                    .as_ref()
                    .map(|user_id| *user_id.as_uuid()),
            ),
            started_at: patch.started_at,
        };

        let updated = diesel::update(game_sessions::table.find(game_id.as_uuid()))
            .filter(game_sessions::status.eq(expected.status.as_str()))
            .filter(game_sessions::current_turn_user_id.is_not_distinct_from(expected_turn))
            .set(&changes)
            .returning(GameSessionRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        if let Some(row) = updated {
            return row_to_session(row);
        }

        let current = game_sessions::table
            .find(game_id.as_uuid())
            .select(game_sessions::status)
            .first::<String>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        match current {
            Some(status) => Err(GameStoreError::conflict(format!(
                "session {game_id} is {status}; expected {}",
                expected.status
            ))),
            None => Err(missing(game_id)),
        }
    }

    async fn insert_player(&self, player: NewGamePlayer) -> Result<GamePlayer, GameStoreError> {
        let username = player.username.as_ref().to_owned();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let game_id = *player.game_id.as_uuid();
        let seat = NewGamePlayerRow {
            id: Uuid::new_v4(),
            game_id,
            user_id: *player.user_id.as_uuid(),
            username: &username,
            turn_order: i32::try_from(player.turn_order)
                .map_err(|err| GameStoreError::query(format!("turn order out of range: {err}")))?,
            joined_at: player.joined_at,
        };

        let seating = conn
            .transaction::<_, DieselError, _>(|conn| {
                async move {
                    let status = game_sessions::table
                        .find(game_id)
                        .select(game_sessions::status)
                        .for_update()
                        .first::<String>(conn)
                        .await
                        .optional()?;
                    match status.as_deref() {
                        None => Ok(Seating::MissingSession),
                        Some(status) if status == GameStatus::Lobby.as_str() => {
                            diesel::insert_into(game_players::table)
                                .values(&seat)
                                .execute(conn)
                                .await?;
                            Ok(Seating::Seated)
                        }
                        Some(_) => Ok(Seating::NotInLobby),
                    }
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| map_seat_error(err, &player))?;

        match seating {
            Seating::Seated => Ok(GamePlayer::from(player)),
            Seating::NotInLobby => Err(GameStoreError::not_in_lobby(player.game_id.to_string())),
            Seating::MissingSession => Err(missing(&player.game_id)),
        }
    }

    async fn list_players(&self, game_id: &GameId) -> Result<Vec<GamePlayer>, GameStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = game_players::table
            .filter(game_players::game_id.eq(game_id.as_uuid()))
            .order_by(game_players::turn_order)
            .select(GamePlayerRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect(rows, row_to_player)
    }

    async fn find_player(
        &self,
        game_id: &GameId,
        user_id: &UserId,
    ) -> Result<Option<GamePlayer>, GameStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        game_players::table
            .filter(game_players::game_id.eq(game_id.as_uuid()))
            .filter(game_players::user_id.eq(user_id.as_uuid()))
            .select(GamePlayerRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_player)
            .transpose()
    }

    async fn append_move(&self, game_move: NewGameMove) -> Result<GameMove, GameStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let game_id = *game_move.game_id.as_uuid();
        let draft = GameMoveRow {
            id: Uuid::new_v4(),
            game_id,
            move_number: 0,
            added_by_user_id: *game_move.added_by_user_id.as_uuid(),
            added_by_username: game_move.added_by_username.as_ref().to_owned(),
            hold_description: game_move.hold_description.as_ref().to_owned(),
            photo_url: game_move
                .photo_url
                .as_ref()
                .map(|url| url.as_ref().to_owned()),
            created_at: game_move.created_at,
        };

        let recorded = conn
            .transaction::<_, DieselError, _>(|conn| {
                async move {
                    let locked = game_sessions::table
                        .find(game_id)
                        .select(game_sessions::id)
                        .for_update()
                        .first::<Uuid>(conn)
                        .await
                        .optional()?;
                    if locked.is_none() {
                        return Ok(None);
                    }
                    let last = game_moves::table
                        .filter(game_moves::game_id.eq(game_id))
                        .select(diesel::dsl::max(game_moves::move_number))
                        .first::<Option<i32>>(conn)
                        .await?;
                    let numbered = GameMoveRow {
                        move_number: last.unwrap_or(0).saturating_add(1),
                        ..draft
                    };
                    diesel::insert_into(game_moves::table)
                        .values(&numbered)
                        .returning(GameMoveRow::as_returning())
                        .get_result(conn)
                        .await
                        .map(Some)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        match recorded {
            Some(row) => row_to_move(row),
            None => Err(missing(&game_move.game_id)),
        }
    }

    async fn list_moves(&self, game_id: &GameId) -> Result<Vec<GameMove>, GameStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = game_moves::table
            .filter(game_moves::game_id.eq(game_id.as_uuid()))
            .order_by(game_moves::move_number)
            .select(GameMoveRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect(rows, row_to_move)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use diesel::result::DatabaseErrorKind;
    use rstest::rstest;

    use super::*;
    use crate::outbound::persistence::diesel_basic_error_mapping::ConstraintViolation;

    fn seat(turn_order: u32) -> NewGamePlayer {
        NewGamePlayer {
            game_id: GameId::random(),
            user_id: UserId::random(),
            username: Username::new("climber").expect("valid name"),
            turn_order,
            joined_at: Utc::now(),
        }
    }

    fn session_row(status: &str) -> GameSessionRow {
        GameSessionRow {
            id: Uuid::new_v4(),
            host_id: Uuid::new_v4(),
            room_code: "ABC234".to_owned(),
            location: "Gym A".to_owned(),
            status: status.to_owned(),
            current_turn_user_id: None,
            max_players: 4,
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
        }
    }

    #[rstest]
    fn lobby_room_code_violation_is_a_duplicate_code() {
        let code = RoomCode::parse("ABC234").expect("valid code");
        let mapped = map_session_insert_error(ConstraintViolation::error(LOBBY_ROOM_CODE_KEY), &code);
        assert!(matches!(mapped, GameStoreError::DuplicateRoomCode { code } if code == "ABC234"));
    }

    #[rstest]
    fn seat_constraints_map_to_their_own_errors() {
        let player = seat(2);

        let duplicate = map_seat_error(ConstraintViolation::error(PLAYER_USER_KEY), &player);
        assert!(matches!(duplicate, GameStoreError::DuplicatePlayer { .. }));

        let taken = map_seat_error(ConstraintViolation::error(PLAYER_TURN_ORDER_KEY), &player);
        assert!(matches!(taken, GameStoreError::TurnOrderTaken { turn_order: 2 }));
    }

    #[rstest]
    fn unrelated_violations_stay_query_errors() {
        let player = seat(0);
        let mapped = map_seat_error(ConstraintViolation::error("game_players_pkey"), &player);
        assert!(matches!(mapped, GameStoreError::Query { .. }));

        let closed = map_seat_error(
            DieselError::DatabaseError(
                DatabaseErrorKind::ClosedConnection,
                Box::new("gone".to_owned()),
            ),
            &player,
        );
        assert!(matches!(closed, GameStoreError::Connection { .. }));
    }

    #[rstest]
    #[case("lobby", GameStatus::Lobby)]
    #[case("active", GameStatus::Active)]
    #[case("completed", GameStatus::Completed)]
    fn stored_statuses_round_trip(#[case] raw: &str, #[case] expected: GameStatus) {
        assert_eq!(status_from_db(raw).expect("known status"), expected);
        assert_eq!(expected.as_str(), raw);
    }

    #[rstest]
    fn corrupt_rows_are_query_errors() {
        let mut row = session_row("paused");
        assert!(matches!(
            row_to_session(row.clone()),
            Err(GameStoreError::Query { .. })
        ));

        row.status = "lobby".to_owned();
        row.max_players = 40;
        assert!(matches!(row_to_session(row), Err(GameStoreError::Query { .. })));
    }

    #[rstest]
    fn negative_turn_order_is_rejected() {
        let row = GamePlayerRow {
            game_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            username: "climber".to_owned(),
            turn_order: -1,
            is_eliminated: false,
            joined_at: Utc::now(),
            eliminated_at: None,
        };
        assert!(matches!(row_to_player(row), Err(GameStoreError::Query { .. })));
    }
}
