//! Diesel row structs. Internal to the persistence adapters; the domain
//! never sees them.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{accounts, game_moves, game_players, game_sessions, idempotency_keys, problems};

// ---------------------------------------------------------------------------
// Game sessions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = game_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct GameSessionRow {
    pub id: Uuid,
    pub host_id: Uuid,
    pub room_code: String,
    pub location: String,
    pub status: String,
    pub current_turn_user_id: Option<Uuid>,
    pub max_players: i16,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = game_sessions)]
pub(crate) struct NewGameSessionRow<'a> {
    pub id: Uuid,
    pub host_id: Uuid,
    pub room_code: &'a str,
    pub location: &'a str,
    pub status: &'a str,
    pub max_players: i16,
    pub created_at: DateTime<Utc>,
}

/// Columns a compare-and-swap writes. `started_at: None` leaves the column
/// alone; `current_turn_user_id: Some(None)` clears it.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = game_sessions)]
pub(crate) struct SessionPatchRow<'a> {
    pub status: &'a str,
    pub current_turn_user_id: Option<Option<Uuid>>,
    pub started_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Players and moves
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = game_players)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct GamePlayerRow {
    pub game_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub turn_order: i32,
    pub is_eliminated: bool,
    pub joined_at: DateTime<Utc>,
    pub eliminated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = game_players)]
pub(crate) struct NewGamePlayerRow<'a> {
    pub id: Uuid,
    pub game_id: Uuid,
    pub user_id: Uuid,
    pub username: &'a str,
    pub turn_order: i32,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = game_moves)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct GameMoveRow {
    pub id: Uuid,
    pub game_id: Uuid,
    pub move_number: i32,
    pub added_by_user_id: Uuid,
    pub added_by_username: String,
    pub hold_description: String,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Idempotency keys
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = idempotency_keys)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct IdempotencyKeyRow {
    pub key: Uuid,
    pub user_id: Uuid,
    pub mutation_type: String,
    pub payload_hash: Vec<u8>,
    pub response_snapshot: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Problems
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = problems)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProblemRow {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub name: String,
    pub location: String,
    pub description: Option<String>,
    pub difficulty: Option<String>,
    pub wall_photo_url: Option<String>,
    pub holds: serde_json::Value,
    pub is_public: bool,
    pub tags: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full overwrite of a problem's mutable columns; `None` writes NULL.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = problems)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ProblemUpdateRow<'a> {
    pub name: &'a str,
    pub location: &'a str,
    pub description: Option<&'a str>,
    pub difficulty: Option<&'a str>,
    pub wall_photo_url: Option<&'a str>,
    pub holds: serde_json::Value,
    pub is_public: bool,
    pub tags: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AccountRow {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_digest: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = accounts)]
pub(crate) struct NewAccountRow<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub username: &'a str,
    pub password_digest: &'a str,
    pub created_at: DateTime<Utc>,
}
