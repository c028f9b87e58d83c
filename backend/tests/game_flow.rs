//! End-to-end engine behaviour over the in-memory adapters.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use addon_backend::domain::ports::{
    AddMovePayload, AddMoveRequest, CreateSessionPayload, CreateSessionRequest, GameCommand,
    GameQuery, GameStore, GameStoreError, JoinSessionPayload, JoinSessionRequest,
    SessionExpectation, SessionPatch, StartSessionRequest,
};
use addon_backend::domain::{
    Actor, ErrorCode, GameCommandService, GameEngineConfig, GameId, GameMove, GameObserver,
    GamePlayer, GameQueryService, GameSession, GameStatus, IdempotencyKey, NewGameMove,
    NewGamePlayer, NewGameSession, RandomRoomCodeGenerator, RoomCode, UserId, Username,
};
use addon_backend::outbound::memory::{InMemoryGameStore, InMemoryIdempotencyStore};
use addon_backend::test_support::MutableClock;
use async_trait::async_trait;
use chrono::Utc;
use rstest::{fixture, rstest};
use tokio::sync::{Barrier, Notify};

type Engine<S> = GameCommandService<S, InMemoryIdempotencyStore>;

fn engine_over<S: GameStore>(store: Arc<S>) -> Engine<S> {
    GameCommandService::new(
        store,
        Arc::new(InMemoryIdempotencyStore::new()),
        Arc::new(MutableClock::new(Utc::now())),
        Arc::new(RandomRoomCodeGenerator),
        GameEngineConfig::default(),
    )
}

struct Table {
    store: Arc<InMemoryGameStore>,
    engine: Engine<InMemoryGameStore>,
    query: GameQueryService<InMemoryGameStore>,
}

fn new_table() -> Table {
    let store = Arc::new(InMemoryGameStore::new());
    Table {
        engine: engine_over(store.clone()),
        query: GameQueryService::new(store.clone()),
        store,
    }
}

#[fixture]
fn table() -> Table {
    new_table()
}

fn climber(name: &str) -> Actor {
    Actor::new(UserId::random(), Username::new(name).expect("valid username"))
}

async fn create(engine: &impl GameCommand, host: &Actor, max_players: i64) -> GameSession {
    engine
        .create_session(CreateSessionRequest {
            actor: host.clone(),
            payload: CreateSessionPayload {
                location: "Gym A".to_owned(),
                max_players,
            },
            idempotency_key: None,
        })
        .await
        .expect("session created")
}

async fn join(
    engine: &impl GameCommand,
    actor: &Actor,
    code: &str,
) -> Result<GameSession, addon_backend::domain::Error> {
    engine
        .join_session(JoinSessionRequest {
            actor: actor.clone(),
            payload: JoinSessionPayload {
                room_code: code.to_owned(),
            },
            idempotency_key: None,
        })
        .await
}

async fn start(
    engine: &impl GameCommand,
    actor: &Actor,
    game_id: GameId,
) -> Result<GameSession, addon_backend::domain::Error> {
    engine
        .start_session(StartSessionRequest {
            actor: actor.clone(),
            game_id,
            idempotency_key: None,
        })
        .await
}

fn move_by(actor: &Actor, game_id: GameId, hold: &str) -> AddMoveRequest {
    AddMoveRequest {
        actor: actor.clone(),
        game_id,
        payload: AddMovePayload {
            hold_description: hold.to_owned(),
            photo_url: None,
        },
        idempotency_key: None,
    }
}

/// Host plus `others`, started.
async fn started_game(table: &Table, others: &[&Actor]) -> (Actor, GameSession) {
    let host = climber("host");
    let session = create(&table.engine, &host, 4).await;
    for actor in others {
        join(&table.engine, actor, session.room_code.as_ref())
            .await
            .expect("joined");
    }
    let active = start(&table.engine, &host, session.id)
        .await
        .expect("started");
    (host, active)
}

#[rstest]
#[case(2)]
#[case(7)]
#[case(12)]
#[tokio::test]
async fn create_opens_lobby_with_host_at_seat_zero(table: Table, #[case] max_players: i64) {
    let host = climber("host");

    let session = create(&table.engine, &host, max_players).await;

    assert_eq!(session.status, GameStatus::Lobby);
    assert!(session.current_turn_user_id.is_none());
    let players = table.store.list_players(&session.id).await.expect("players");
    assert_eq!(players.len(), 1);
    assert_eq!(players.first().map(|p| (&p.user_id, p.turn_order)), Some((&host.user_id, 0)));
}

#[rstest]
#[tokio::test]
async fn joins_fill_contiguous_seats_then_report_full(table: Table) {
    let host = climber("host");
    let session = create(&table.engine, &host, 4).await;
    let guests: Vec<Actor> = (1..=3).map(|n| climber(&format!("guest{n}"))).collect();

    for guest in &guests {
        join(&table.engine, guest, session.room_code.as_ref())
            .await
            .expect("seat available");
    }
    let err = join(&table.engine, &climber("late"), session.room_code.as_ref())
        .await
        .expect_err("lobby full");

    assert_eq!(err.code(), ErrorCode::GameFull);
    let seats: BTreeSet<u32> = table
        .store
        .list_players(&session.id)
        .await
        .expect("players")
        .iter()
        .map(|p| p.turn_order)
        .collect();
    assert_eq!(seats, (0..4).collect());
}

#[rstest]
#[tokio::test]
async fn concurrent_joins_keep_seats_contiguous(table: Table) {
    let host = climber("host");
    let session = create(&table.engine, &host, 12).await;
    let guests: Vec<Actor> = (1..12).map(|n| climber(&format!("guest{n}"))).collect();

    let joins = guests
        .iter()
        .map(|guest| join(&table.engine, guest, session.room_code.as_ref()));
    for result in futures::future::join_all(joins).await {
        result.expect("joined");
    }

    let seats: Vec<u32> = table
        .store
        .list_players(&session.id)
        .await
        .expect("players")
        .iter()
        .map(|p| p.turn_order)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    assert_eq!(seats, (0..12).collect::<Vec<_>>());
}

#[rstest]
#[tokio::test]
async fn rejoining_does_not_add_a_player(table: Table) {
    let host = climber("host");
    let guest = climber("guest");
    let session = create(&table.engine, &host, 4).await;

    let lowercase = session.room_code.as_ref().to_lowercase();
    join(&table.engine, &guest, session.room_code.as_ref()).await.expect("first join");
    join(&table.engine, &guest, &lowercase).await.expect("second join");

    let players = table.store.list_players(&session.id).await.expect("players");
    assert_eq!(players.len(), 2);
}

#[rstest]
#[tokio::test]
async fn join_rejects_started_games(table: Table) {
    let guest = climber("guest");
    let (_, active) = started_game(&table, &[&guest]).await;

    let err = join(&table.engine, &climber("late"), active.room_code.as_ref())
        .await
        .expect_err("game already started");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn start_guards_host_and_player_count(table: Table) {
    let host = climber("host");
    let guest = climber("guest");
    let session = create(&table.engine, &host, 4).await;

    let alone = start(&table.engine, &host, session.id).await.expect_err("alone");
    join(&table.engine, &guest, session.room_code.as_ref()).await.expect("joined");
    let not_host = start(&table.engine, &guest, session.id).await.expect_err("guest");

    assert_eq!(alone.code(), ErrorCode::NotEnoughPlayers);
    assert_eq!(not_host.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn turns_rotate_cyclically_and_moves_number_from_one(table: Table) {
    let b = climber("b");
    let c = climber("c");
    let (host, active) = started_game(&table, &[&b, &c]).await;
    assert_eq!(active.current_turn_user_id.as_ref(), Some(&host.user_id));

    let rotation = [&host, &b, &c, &host, &b];
    let mut numbers = Vec::new();
    for (index, actor) in rotation.iter().enumerate() {
        let recorded = table
            .engine
            .add_move(move_by(actor, active.id, &format!("hold {index}")))
            .await
            .expect("in turn");
        numbers.push(recorded.move_number);
        let expected_next = rotation
            .get(index + 1)
            .map_or(&c.user_id, |next| &next.user_id);
        let session = table
            .store
            .find_session(&active.id)
            .await
            .expect("store")
            .expect("session");
        assert_eq!(session.current_turn_user_id.as_ref(), Some(expected_next));
    }

    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
}

#[rstest]
#[tokio::test]
async fn only_the_turn_holder_may_move(table: Table) {
    let b = climber("b");
    let c = climber("c");
    let (_, active) = started_game(&table, &[&b, &c]).await;

    for actor in [&b, &c, &climber("stranger")] {
        let err = table
            .engine
            .add_move(move_by(actor, active.id, "sloper"))
            .await
            .expect_err("out of turn");
        assert_eq!(err.code(), ErrorCode::NotYourTurn);
    }
}

#[rstest]
#[tokio::test]
async fn gym_a_scenario(table: Table) {
    let host = climber("host");
    let b = climber("userB");
    let c = climber("userC");

    let session = create(&table.engine, &host, 4).await;
    assert_eq!(session.location.as_ref(), "Gym A");
    join(&table.engine, &b, session.room_code.as_ref()).await.expect("b joins");
    join(&table.engine, &c, session.room_code.as_ref()).await.expect("c joins");
    start(&table.engine, &host, session.id).await.expect("host starts");

    let first = table
        .engine
        .add_move(move_by(&host, session.id, "red jug"))
        .await
        .expect("host moves");
    assert_eq!(first.move_number, 1);
    assert_eq!(first.hold_description.as_ref(), "red jug");

    let view = table
        .query
        .load_state(&session.id, &b.user_id)
        .await
        .expect("state");
    assert!(view.is_my_turn);
    assert_eq!(view.current_player.map(|p| p.user_id), Some(b.user_id.clone()));

    let err = table
        .engine
        .add_move(move_by(&host, session.id, "blue crimp"))
        .await
        .expect_err("host already moved");
    assert_eq!(err.code(), ErrorCode::NotYourTurn);
}

#[rstest]
#[tokio::test]
async fn keyed_move_is_recorded_once(table: Table) {
    let b = climber("b");
    let (host, active) = started_game(&table, &[&b]).await;
    let request = AddMoveRequest {
        idempotency_key: Some(IdempotencyKey::random()),
        ..move_by(&host, active.id, "red jug")
    };

    let first = table.engine.add_move(request.clone()).await.expect("first");
    let replay = table.engine.add_move(request).await.expect("replay");

    assert_eq!(first, replay);
    let moves = table.store.list_moves(&active.id).await.expect("moves");
    assert_eq!(moves.len(), 1);
}

/// Store that holds every caller at `list_players` until `parties` arrive.
///
/// Both racing moves pass the turn check before either writes.
struct RendezvousStore {
    inner: Arc<InMemoryGameStore>,
    barrier: Barrier,
}

#[async_trait]
impl GameStore for RendezvousStore {
    async fn insert_session(&self, session: NewGameSession) -> Result<GameSession, GameStoreError> {
        self.inner.insert_session(session).await
    }

    async fn find_session(&self, game_id: &GameId) -> Result<Option<GameSession>, GameStoreError> {
        self.inner.find_session(game_id).await
    }

    async fn find_lobby_by_room_code(
        &self,
        code: &RoomCode,
    ) -> Result<Option<GameSession>, GameStoreError> {
        self.inner.find_lobby_by_room_code(code).await
    }

    async fn delete_session(&self, game_id: &GameId) -> Result<(), GameStoreError> {
        self.inner.delete_session(game_id).await
    }

    async fn compare_and_swap_session(
        &self,
        game_id: &GameId,
        expected: SessionExpectation,
        patch: SessionPatch,
    ) -> Result<GameSession, GameStoreError> {
        self.inner
            .compare_and_swap_session(game_id, expected, patch)
            .await
    }

    async fn insert_player(&self, player: NewGamePlayer) -> Result<GamePlayer, GameStoreError> {
        self.inner.insert_player(player).await
    }

    async fn list_players(&self, game_id: &GameId) -> Result<Vec<GamePlayer>, GameStoreError> {
        self.barrier.wait().await;
        self.inner.list_players(game_id).await
    }

    async fn find_player(
        &self,
        game_id: &GameId,
        user_id: &UserId,
    ) -> Result<Option<GamePlayer>, GameStoreError> {
        self.inner.find_player(game_id, user_id).await
    }

    async fn append_move(&self, new_move: NewGameMove) -> Result<GameMove, GameStoreError> {
        self.inner.append_move(new_move).await
    }

    async fn list_moves(&self, game_id: &GameId) -> Result<Vec<GameMove>, GameStoreError> {
        self.inner.list_moves(game_id).await
    }
}

#[tokio::test]
async fn racing_moves_by_turn_holder_advance_the_turn_once() {
    let seeded = new_table();
    let b = climber("b");
    let (host, active) = started_game(&seeded, &[&b]).await;
    let racing = Arc::new(RendezvousStore {
        inner: seeded.store.clone(),
        barrier: Barrier::new(2),
    });
    let engine = engine_over(racing.clone());

    let (left, right) = tokio::join!(
        engine.add_move(move_by(&host, active.id, "left hand")),
        engine.add_move(move_by(&host, active.id, "right hand")),
    );

    let mut codes: Vec<Option<ErrorCode>> = [&left, &right]
        .iter()
        .map(|result| result.as_ref().err().map(|err| err.code()))
        .collect();
    codes.sort_by_key(Option::is_some);
    assert_eq!(codes, vec![None, Some(ErrorCode::TurnConflict)]);
    let moves = racing.inner.list_moves(&active.id).await.expect("moves");
    assert_eq!(moves.len(), 1);
    let session = racing
        .inner
        .find_session(&active.id)
        .await
        .expect("store")
        .expect("session");
    assert_eq!(session.current_turn_user_id, Some(b.user_id));
}

/// Store that parks one user's seat write until released.
struct HeldSeatStore {
    inner: Arc<InMemoryGameStore>,
    held: UserId,
    arrived: Notify,
    release: Notify,
}

#[async_trait]
impl GameStore for HeldSeatStore {
    async fn insert_session(&self, session: NewGameSession) -> Result<GameSession, GameStoreError> {
        self.inner.insert_session(session).await
    }

    async fn find_session(&self, game_id: &GameId) -> Result<Option<GameSession>, GameStoreError> {
        self.inner.find_session(game_id).await
    }

    async fn find_lobby_by_room_code(
        &self,
        code: &RoomCode,
    ) -> Result<Option<GameSession>, GameStoreError> {
        self.inner.find_lobby_by_room_code(code).await
    }

    async fn delete_session(&self, game_id: &GameId) -> Result<(), GameStoreError> {
        self.inner.delete_session(game_id).await
    }

    async fn compare_and_swap_session(
        &self,
        game_id: &GameId,
        expected: SessionExpectation,
        patch: SessionPatch,
    ) -> Result<GameSession, GameStoreError> {
        self.inner
            .compare_and_swap_session(game_id, expected, patch)
            .await
    }

    async fn insert_player(&self, player: NewGamePlayer) -> Result<GamePlayer, GameStoreError> {
        if player.user_id == self.held {
            self.arrived.notify_one();
            self.release.notified().await;
        }
        self.inner.insert_player(player).await
    }

    async fn list_players(&self, game_id: &GameId) -> Result<Vec<GamePlayer>, GameStoreError> {
        self.inner.list_players(game_id).await
    }

    async fn find_player(
        &self,
        game_id: &GameId,
        user_id: &UserId,
    ) -> Result<Option<GamePlayer>, GameStoreError> {
        self.inner.find_player(game_id, user_id).await
    }

    async fn append_move(&self, new_move: NewGameMove) -> Result<GameMove, GameStoreError> {
        self.inner.append_move(new_move).await
    }

    async fn list_moves(&self, game_id: &GameId) -> Result<Vec<GameMove>, GameStoreError> {
        self.inner.list_moves(game_id).await
    }
}

#[tokio::test]
async fn join_overtaken_by_start_is_not_seated() {
    let seeded = new_table();
    let host = climber("host");
    let b = climber("b");
    let c = climber("c");
    let lobby = create(&seeded.engine, &host, 4).await;
    join(&seeded.engine, &b, lobby.room_code.as_ref())
        .await
        .expect("b joined");
    let held = Arc::new(HeldSeatStore {
        inner: seeded.store.clone(),
        held: c.user_id.clone(),
        arrived: Notify::new(),
        release: Notify::new(),
    });
    let joining_engine = engine_over(held.clone());

    let starter = async {
        held.arrived.notified().await;
        let started = start(&seeded.engine, &host, lobby.id).await;
        held.release.notify_one();
        started
    };
    let (joined, started) = tokio::join!(
        join(&joining_engine, &c, lobby.room_code.as_ref()),
        starter
    );

    let active = started.expect("host started the game");
    assert_eq!(active.status, GameStatus::Active);
    assert_eq!(
        joined.expect_err("lobby closed mid-join").code(),
        ErrorCode::NotFound
    );
    let players = seeded.store.list_players(&lobby.id).await.expect("players");
    assert_eq!(players.len(), 2);
    assert!(players.iter().all(|p| p.user_id != c.user_id));
}

#[rstest]
#[tokio::test]
async fn observer_follows_the_turn_to_the_viewer(table: Table) {
    let b = climber("b");
    let (host, active) = started_game(&table, &[&b]).await;
    let query: Arc<dyn GameQuery> = Arc::new(GameQueryService::new(table.store.clone()));
    let handle = GameObserver::activate(query, active.id, b.user_id.clone(), Duration::from_millis(10));
    let mut views = handle.subscribe();

    table
        .engine
        .add_move(move_by(&host, active.id, "red jug"))
        .await
        .expect("host moves");

    let arrived = tokio::time::timeout(
        Duration::from_secs(2),
        views.wait_for(|view| view.as_ref().is_some_and(|v| v.is_my_turn)),
    )
    .await
    .is_ok_and(|seen| seen.is_ok());
    assert!(arrived, "observer never saw the turn arrive");
    let latest = handle.latest().expect("view");
    assert_eq!(latest.moves.len(), 1);
    handle.deactivate();
}
