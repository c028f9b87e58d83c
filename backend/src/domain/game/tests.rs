//! Regression coverage for game value types, rotation and projection.

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::{UserId, Username};

fn fixture_timestamp() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
        .expect("RFC3339 fixture timestamp")
        .with_timezone(&Utc)
}

fn seat(game_id: GameId, turn_order: u32) -> GamePlayer {
    GamePlayer {
        game_id,
        user_id: UserId::random(),
        username: Username::new(format!("climber{turn_order}")).expect("valid username"),
        turn_order,
        is_eliminated: false,
        joined_at: fixture_timestamp(),
        eliminated_at: None,
    }
}

#[fixture]
fn table() -> Vec<GamePlayer> {
    let game_id = GameId::random();
    (0..3).map(|order| seat(game_id, order)).collect()
}

fn lobby_session(host_id: UserId) -> GameSession {
    NewGameSession {
        host_id,
        room_code: RoomCode::parse("GYM123").expect("valid code"),
        location: Location::new("Gym A").expect("valid location"),
        max_players: MaxPlayers::new(4).expect("valid max players"),
        created_at: fixture_timestamp(),
    }
    .into_session(GameId::random())
}

#[rstest]
#[case(2)]
#[case(7)]
#[case(12)]
fn max_players_accepts_inclusive_range(#[case] value: i64) {
    let parsed = MaxPlayers::new(value).expect("in range");
    assert_eq!(i64::from(parsed.get()), value);
}

#[rstest]
#[case(-1)]
#[case(0)]
#[case(1)]
#[case(13)]
#[case(300)]
fn max_players_rejects_out_of_range(#[case] value: i64) {
    assert_eq!(
        MaxPlayers::new(value),
        Err(GameValidationError::MaxPlayersOutOfRange { value })
    );
}

#[rstest]
fn max_players_reports_when_full() {
    let limit = MaxPlayers::new(3).expect("valid");
    assert!(!limit.is_reached_by(2));
    assert!(limit.is_reached_by(3));
}

#[rstest]
#[case("", GameValidationError::EmptyLocation)]
#[case("   ", GameValidationError::EmptyLocation)]
fn location_rejects_blank(#[case] raw: &str, #[case] expected: GameValidationError) {
    assert_eq!(Location::new(raw), Err(expected));
}

#[rstest]
fn hold_description_is_trimmed_and_required() {
    let hold = HoldDescription::new(" red jug ").expect("valid hold");
    assert_eq!(hold.as_ref(), "red jug");
    assert_eq!(
        HoldDescription::new(" "),
        Err(GameValidationError::EmptyHoldDescription)
    );
}

#[rstest]
#[case("abc123", "ABC123")]
#[case(" Zz90aa\n", "ZZ90AA")]
fn room_code_normalises_case_and_whitespace(#[case] raw: &str, #[case] expected: &str) {
    let code = RoomCode::parse(raw).expect("valid code");
    assert_eq!(code.as_ref(), expected);
}

#[rstest]
#[case("ABC12", GameValidationError::RoomCodeLength { found: 5 })]
#[case("ABC1234", GameValidationError::RoomCodeLength { found: 7 })]
#[case("AB-123", GameValidationError::RoomCodeCharacter { ch: '-', index: 2 })]
fn room_code_rejects_malformed(#[case] raw: &str, #[case] expected: GameValidationError) {
    assert_eq!(RoomCode::parse(raw), Err(expected));
}

#[rstest]
fn generated_room_codes_parse_back() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let code = RoomCode::generate(&mut rng);
        assert_eq!(RoomCode::parse(code.as_ref()), Ok(code.clone()));
    }
}

#[rstest]
fn status_machine_is_forward_only() {
    use GameStatus::{Active, Completed, Lobby};

    assert!(Lobby.can_transition_to(Active));
    assert!(Active.can_transition_to(Completed));
    for (from, to) in [
        (Active, Lobby),
        (Completed, Active),
        (Completed, Lobby),
        (Lobby, Lobby),
        (Lobby, Completed),
    ] {
        assert!(!from.can_transition_to(to), "{from} -> {to} must be rejected");
    }
}

#[rstest]
fn first_turn_is_lowest_turn_order(table: Vec<GamePlayer>) {
    let mut shuffled = table.clone();
    shuffled.reverse();
    let first = first_turn(&shuffled).expect("non-empty table");
    assert_eq!(first.turn_order, 0);
}

#[rstest]
fn next_turn_rotates_cyclically(table: Vec<GamePlayer>) {
    let ids: Vec<UserId> = table.iter().map(|p| p.user_id.clone()).collect();
    let mut current = ids.first().cloned().expect("first seat");
    let mut visited = Vec::new();
    for _ in 0..4 {
        let next = next_turn(&table, &current).expect("seated player").user_id.clone();
        visited.push(next.clone());
        current = next;
    }
    let expected: Vec<UserId> = [1, 2, 0, 1]
        .into_iter()
        .map(|i: usize| ids.get(i).cloned().expect("seat"))
        .collect();
    assert_eq!(visited, expected);
}

#[rstest]
fn next_turn_skips_eliminated_players(mut table: Vec<GamePlayer>) {
    if let Some(middle) = table.get_mut(1) {
        middle.is_eliminated = true;
    }
    let first = table.first().expect("seat").user_id.clone();
    let next = next_turn(&table, &first).expect("seated");
    assert_eq!(next.turn_order, 2);
}

#[rstest]
fn next_turn_is_none_for_unknown_player(table: Vec<GamePlayer>) {
    assert!(next_turn(&table, &UserId::random()).is_none());
}

#[rstest]
fn view_derives_lobby_flags_for_host(table: Vec<GamePlayer>) {
    let host = table.first().expect("seat").user_id.clone();
    let session = lobby_session(host.clone());
    let view = GameStateView::derive(session, table, Vec::new(), &host);

    assert!(view.is_host);
    assert!(view.can_start);
    assert!(!view.is_my_turn);
    assert!(view.current_player.is_none());
    assert!(!view.awaits_other_player());
    assert_eq!(view.my_player.map(|p| p.turn_order), Some(0));
}

#[rstest]
fn view_orders_records_and_tracks_current_player(table: Vec<GamePlayer>) {
    let host = table.first().expect("seat").user_id.clone();
    let second = table.get(1).expect("seat").user_id.clone();
    let mut session = lobby_session(host.clone());
    session.status = GameStatus::Active;
    session.current_turn_user_id = Some(second.clone());

    let moves: Vec<GameMove> = [2_u32, 1]
        .into_iter()
        .map(|number| {
            NewGameMove {
                game_id: session.id,
                added_by_user_id: host.clone(),
                added_by_username: Username::new("host").expect("valid"),
                hold_description: HoldDescription::new("jug").expect("valid"),
                photo_url: None,
                created_at: fixture_timestamp(),
            }
            .into_move(uuid::Uuid::new_v4(), number)
        })
        .collect();
    let mut players = table;
    players.reverse();

    let view = GameStateView::derive(session, players, moves, &host);

    let orders: Vec<u32> = view.players.iter().map(|p| p.turn_order).collect();
    let numbers: Vec<u32> = view.moves.iter().map(|m| m.move_number).collect();
    assert_eq!(orders, vec![0, 1, 2]);
    assert_eq!(numbers, vec![1, 2]);
    assert_eq!(view.current_player.as_ref().map(|p| p.user_id.clone()), Some(second));
    assert!(!view.is_my_turn);
    assert!(!view.can_start);
    assert!(view.awaits_other_player());
}

#[rstest]
fn session_serialises_camel_case_status() {
    let session = lobby_session(UserId::random());
    let value = serde_json::to_value(&session).expect("serialize");
    assert_eq!(value["status"], "lobby");
    assert_eq!(value["roomCode"], "GYM123");
    assert_eq!(value["maxPlayers"], 4);
    assert!(value["currentTurnUserId"].is_null());
}
