//! Mutex-guarded [`GameStore`] adapter.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{GameStore, GameStoreError, SessionExpectation, SessionPatch};
use crate::domain::{
    GameId, GameMove, GamePlayer, GameSession, GameStatus, NewGameMove, NewGamePlayer,
    NewGameSession, RoomCode, UserId,
};

#[derive(Debug, Default)]
struct Tables {
    sessions: HashMap<GameId, GameSession>,
    players: HashMap<GameId, Vec<GamePlayer>>,
    moves: HashMap<GameId, Vec<GameMove>>,
}

/// Game store holding all three collections in process memory.
#[derive(Debug, Default)]
pub struct InMemoryGameStore {
    tables: Mutex<Tables>,
}

impl InMemoryGameStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, GameStoreError> {
        self.tables
            .lock()
            .map_err(|_| GameStoreError::query("game store lock poisoned"))
    }
}

fn missing(game_id: &GameId) -> GameStoreError {
    GameStoreError::not_found(format!("session {game_id}"))
}

#[async_trait]
impl GameStore for InMemoryGameStore {
    async fn insert_session(
        &self,
        session: NewGameSession,
    ) -> Result<GameSession, GameStoreError> {
        let mut tables = self.tables()?;
        let code_in_use = tables
            .sessions
            .values()
            .any(|s| s.status == GameStatus::Lobby && s.room_code == session.room_code);
        if code_in_use {
            return Err(GameStoreError::duplicate_room_code(session.room_code.as_ref()));
        }

        let created = session.into_session(GameId::random());
        tables.sessions.insert(created.id, created.clone());
        debug!(game_id = %created.id, "inserted session");
        Ok(created)
    }

    async fn find_session(&self, game_id: &GameId) -> Result<Option<GameSession>, GameStoreError> {
        Ok(self.tables()?.sessions.get(game_id).cloned())
    }

    async fn find_lobby_by_room_code(
        &self,
        room_code: &RoomCode,
    ) -> Result<Option<GameSession>, GameStoreError> {
        Ok(self
            .tables()?
            .sessions
            .values()
            .find(|s| s.status == GameStatus::Lobby && &s.room_code == room_code)
            .cloned())
    }

    async fn delete_session(&self, game_id: &GameId) -> Result<(), GameStoreError> {
        let mut tables = self.tables()?;
        tables.sessions.remove(game_id);
        tables.players.remove(game_id);
        tables.moves.remove(game_id);
        Ok(())
    }

    async fn compare_and_swap_session(
        &self,
        game_id: &GameId,
        expected: SessionExpectation,
        patch: SessionPatch,
    ) -> Result<GameSession, GameStoreError> {
        let mut tables = self.tables()?;
        let session = tables
            .sessions
            .get_mut(game_id)
            .ok_or_else(|| missing(game_id))?;
        if !expected.holds_for(session) {
            return Err(GameStoreError::conflict(format!(
                "session {game_id} is {} with turn {:?}",
                session.status,
                session.current_turn_user_id.as_ref().map(ToString::to_string)
            )));
        }
        patch.apply_to(session);
        Ok(session.clone())
    }

    async fn insert_player(&self, player: NewGamePlayer) -> Result<GamePlayer, GameStoreError> {
        let mut tables = self.tables()?;
        let status = tables
            .sessions
            .get(&player.game_id)
            .map(|session| session.status)
            .ok_or_else(|| missing(&player.game_id))?;
        if status != GameStatus::Lobby {
            return Err(GameStoreError::not_in_lobby(player.game_id.to_string()));
        }
        let seated = tables.players.entry(player.game_id).or_default();
        if seated.iter().any(|p| p.user_id == player.user_id) {
            return Err(GameStoreError::duplicate_player(player.user_id.as_ref()));
        }
        if seated.iter().any(|p| p.turn_order == player.turn_order) {
            return Err(GameStoreError::turn_order_taken(player.turn_order));
        }
        let player = GamePlayer::from(player);
        seated.push(player.clone());
        Ok(player)
    }

    async fn list_players(&self, game_id: &GameId) -> Result<Vec<GamePlayer>, GameStoreError> {
        Ok(self
            .tables()?
            .players
            .get(game_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_player(
        &self,
        game_id: &GameId,
        user_id: &UserId,
    ) -> Result<Option<GamePlayer>, GameStoreError> {
        Ok(self
            .tables()?
            .players
            .get(game_id)
            .and_then(|players| players.iter().find(|p| &p.user_id == user_id))
            .cloned())
    }

    async fn append_move(&self, game_move: NewGameMove) -> Result<GameMove, GameStoreError> {
        let mut tables = self.tables()?;
        if !tables.sessions.contains_key(&game_move.game_id) {
            return Err(missing(&game_move.game_id));
        }
        let log = tables.moves.entry(game_move.game_id).or_default();
        let last = log.iter().map(|m| m.move_number).max().unwrap_or(0);
        let move_number = last
            .checked_add(1)
            .ok_or_else(|| GameStoreError::query("move number overflow"))?;
        let recorded = game_move.into_move(Uuid::new_v4(), move_number);
        log.push(recorded.clone());
        Ok(recorded)
    }

    async fn list_moves(&self, game_id: &GameId) -> Result<Vec<GameMove>, GameStoreError> {
        Ok(self
            .tables()?
            .moves
            .get(game_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    //! Adapter-level guarantees the engine depends on.

    use chrono::Utc;
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::{HoldDescription, Location, MaxPlayers, Username};

    #[fixture]
    fn store() -> InMemoryGameStore {
        InMemoryGameStore::new()
    }

    fn lobby(code: &str) -> NewGameSession {
        NewGameSession {
            host_id: UserId::random(),
            room_code: RoomCode::parse(code).expect("valid code"),
            location: Location::new("Gym A").expect("valid location"),
            max_players: MaxPlayers::new(4).expect("valid limit"),
            created_at: Utc::now(),
        }
    }

    fn seat(game_id: GameId, turn_order: u32) -> NewGamePlayer {
        NewGamePlayer {
            game_id,
            user_id: UserId::random(),
            username: Username::new("climber").expect("valid name"),
            turn_order,
            joined_at: Utc::now(),
        }
    }

    fn hold(game_id: GameId) -> NewGameMove {
        NewGameMove {
            game_id,
            added_by_user_id: UserId::random(),
            added_by_username: Username::new("climber").expect("valid name"),
            hold_description: HoldDescription::new("crimp").expect("valid hold"),
            photo_url: None,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn lobby_room_codes_are_unique(store: InMemoryGameStore) {
        store.insert_session(lobby("AAAAAA")).await.expect("first lobby");
        let err = store
            .insert_session(lobby("AAAAAA"))
            .await
            .expect_err("duplicate code");
        assert_eq!(err, GameStoreError::duplicate_room_code("AAAAAA"));
    }

    #[rstest]
    #[tokio::test]
    async fn started_games_release_their_room_code(store: InMemoryGameStore) {
        let session = store.insert_session(lobby("AAAAAA")).await.expect("lobby");
        store
            .compare_and_swap_session(
                &session.id,
                SessionExpectation::of(&session),
                SessionPatch {
                    status: GameStatus::Active,
                    current_turn_user_id: Some(session.host_id.clone()),
                    started_at: Some(Utc::now()),
                },
            )
            .await
            .expect("start");

        store.insert_session(lobby("AAAAAA")).await.expect("code reusable");
        let found = store
            .find_lobby_by_room_code(&session.room_code)
            .await
            .expect("lookup")
            .expect("new lobby");
        assert_ne!(found.id, session.id);
    }

    #[rstest]
    #[tokio::test]
    async fn stale_compare_and_swap_conflicts(store: InMemoryGameStore) {
        let session = store.insert_session(lobby("BBBBBB")).await.expect("lobby");
        let stale = SessionExpectation::of(&session);
        let patch = SessionPatch {
            status: GameStatus::Active,
            current_turn_user_id: Some(session.host_id.clone()),
            started_at: Some(Utc::now()),
        };
        store
            .compare_and_swap_session(&session.id, stale.clone(), patch.clone())
            .await
            .expect("first swap");

        let err = store
            .compare_and_swap_session(&session.id, stale, patch)
            .await
            .expect_err("stale expectation");
        assert!(matches!(err, GameStoreError::Conflict { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn seats_reject_duplicates(store: InMemoryGameStore) {
        let session = store.insert_session(lobby("CCCCCC")).await.expect("lobby");
        let first = seat(session.id, 0);
        store.insert_player(first.clone()).await.expect("seat 0");

        let again = store.insert_player(first).await.expect_err("same user");
        assert!(matches!(again, GameStoreError::DuplicatePlayer { .. }));
        let taken = store
            .insert_player(seat(session.id, 0))
            .await
            .expect_err("same seat");
        assert_eq!(taken, GameStoreError::turn_order_taken(0_u32));
    }

    #[rstest]
    #[tokio::test]
    async fn seats_close_once_the_game_starts(store: InMemoryGameStore) {
        let session = store.insert_session(lobby("FFFFFF")).await.expect("lobby");
        store.insert_player(seat(session.id, 0)).await.expect("seat 0");
        store
            .compare_and_swap_session(
                &session.id,
                SessionExpectation::of(&session),
                SessionPatch {
                    status: GameStatus::Active,
                    current_turn_user_id: Some(session.host_id.clone()),
                    started_at: Some(Utc::now()),
                },
            )
            .await
            .expect("start");

        let err = store
            .insert_player(seat(session.id, 1))
            .await
            .expect_err("game already active");

        assert_eq!(err, GameStoreError::not_in_lobby(session.id.to_string()));
        assert_eq!(store.list_players(&session.id).await.expect("read").len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn move_numbers_are_sequential(store: InMemoryGameStore) {
        let session = store.insert_session(lobby("DDDDDD")).await.expect("lobby");
        let mut numbers = Vec::new();
        for _ in 0..3 {
            numbers.push(
                store
                    .append_move(hold(session.id))
                    .await
                    .expect("append")
                    .move_number,
            );
        }
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[rstest]
    #[tokio::test]
    async fn delete_cascades(store: InMemoryGameStore) {
        let session = store.insert_session(lobby("EEEEEE")).await.expect("lobby");
        store.insert_player(seat(session.id, 0)).await.expect("seat");
        store.append_move(hold(session.id)).await.expect("move");

        store.delete_session(&session.id).await.expect("delete");

        assert!(store.find_session(&session.id).await.expect("read").is_none());
        assert!(store.list_players(&session.id).await.expect("read").is_empty());
        assert!(store.list_moves(&session.id).await.expect("read").is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn writes_require_an_existing_session(store: InMemoryGameStore) {
        let ghost = GameId::random();
        assert!(matches!(
            store.insert_player(seat(ghost, 0)).await,
            Err(GameStoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.append_move(hold(ghost)).await,
            Err(GameStoreError::NotFound { .. })
        ));
    }
}
