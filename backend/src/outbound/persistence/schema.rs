//! Diesel table definitions mirroring `backend/migrations`.
//!
//! Keep in step with the migrations; `diesel print-schema` regenerates the
//! column lists from a live database.

diesel::table! {
    /// Game sessions. `room_code` is unique among lobby rows only.
    game_sessions (id) {
        id -> Uuid,
        host_id -> Uuid,
        room_code -> Varchar,
        location -> Text,
        status -> Varchar,
        current_turn_user_id -> Nullable<Uuid>,
        max_players -> Int2,
        created_at -> Timestamptz,
        started_at -> Nullable<Timestamptz>,
        ended_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Seats; unique per `(game_id, user_id)` and `(game_id, turn_order)`.
    game_players (id) {
        id -> Uuid,
        game_id -> Uuid,
        user_id -> Uuid,
        username -> Varchar,
        turn_order -> Int4,
        is_eliminated -> Bool,
        joined_at -> Timestamptz,
        eliminated_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Move log; `move_number` is unique per game.
    game_moves (id) {
        id -> Uuid,
        game_id -> Uuid,
        move_number -> Int4,
        added_by_user_id -> Uuid,
        added_by_username -> Varchar,
        hold_description -> Text,
        photo_url -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Idempotency claims. A NULL `response_snapshot` marks an in-flight claim.
    idempotency_keys (key, user_id, mutation_type) {
        key -> Uuid,
        user_id -> Uuid,
        mutation_type -> Varchar,
        payload_hash -> Bytea,
        response_snapshot -> Nullable<Jsonb>,
        created_at -> Timestamptz,
        expires_at -> Timestamptz,
    }
}

diesel::table! {
    /// Climbing problems with holds and tags stored as JSON arrays.
    problems (id) {
        id -> Uuid,
        creator_id -> Uuid,
        name -> Varchar,
        location -> Text,
        description -> Nullable<Text>,
        difficulty -> Nullable<Text>,
        wall_photo_url -> Nullable<Text>,
        holds -> Jsonb,
        is_public -> Bool,
        tags -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    accounts (id) {
        id -> Uuid,
        email -> Varchar,
        username -> Varchar,
        password_digest -> Text,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(game_players -> game_sessions (game_id));
diesel::joinable!(game_moves -> game_sessions (game_id));

diesel::allow_tables_to_appear_in_same_query!(
    game_sessions,
    game_players,
    game_moves,
    idempotency_keys,
    problems,
    accounts,
);
