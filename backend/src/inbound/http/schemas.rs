//! OpenAPI schema definitions for domain types.
//!
//! Domain types stay framework-agnostic and do not derive `ToSchema`. The
//! wrappers below mirror their JSON shape and live in the inbound adapter
//! where framework concerns belong.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// Authentication failed or is missing.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The lobby has no free seat.
    #[schema(rename = "game_full")]
    GameFull,
    /// Fewer than two players are seated.
    #[schema(rename = "not_enough_players")]
    NotEnoughPlayers,
    /// The caller does not hold the turn.
    #[schema(rename = "not_your_turn")]
    NotYourTurn,
    /// The turn moved while the request was in flight.
    #[schema(rename = "turn_conflict")]
    TurnConflict,
    /// The request conflicts with stored state.
    #[schema(rename = "conflict")]
    Conflict,
    /// A backing store is unreachable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Error, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "location must not be empty")]
    message: String,
    /// Request correlation identifier, also sent as the `trace-id` header.
    #[schema(example = "0b3a4f8e-8a0d-4c2c-9f6e-1d2b3c4d5e6f")]
    trace_id: Option<String>,
    /// Supplementary details such as the offending field.
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::domain::GameStatus`].
#[derive(ToSchema)]
#[schema(as = crate::domain::GameStatus)]
pub enum GameStatusSchema {
    /// Accepting players.
    #[schema(rename = "lobby")]
    Lobby,
    /// Turns rotating.
    #[schema(rename = "active")]
    Active,
    /// Terminal.
    #[schema(rename = "completed")]
    Completed,
}

/// OpenAPI schema for [`crate::domain::GameSession`].
#[derive(ToSchema)]
#[schema(as = crate::domain::GameSession, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct GameSessionSchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    #[schema(value_type = String, format = Uuid)]
    host_id: String,
    /// Six characters from an unambiguous alphabet.
    #[schema(example = "K3X9QZ")]
    room_code: String,
    #[schema(example = "Gym A")]
    location: String,
    status: GameStatusSchema,
    #[schema(value_type = Option<String>, format = Uuid)]
    current_turn_user_id: Option<String>,
    #[schema(minimum = 2, maximum = 8)]
    max_players: u8,
    #[schema(value_type = String, format = DateTime)]
    created_at: String,
    #[schema(value_type = Option<String>, format = DateTime)]
    started_at: Option<String>,
    #[schema(value_type = Option<String>, format = DateTime)]
    ended_at: Option<String>,
}

/// OpenAPI schema for [`crate::domain::GamePlayer`].
#[derive(ToSchema)]
#[schema(as = crate::domain::GamePlayer, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct GamePlayerSchema {
    #[schema(value_type = String, format = Uuid)]
    game_id: String,
    #[schema(value_type = String, format = Uuid)]
    user_id: String,
    username: String,
    /// Zero-based seat; the host sits at 0.
    turn_order: u32,
    is_eliminated: bool,
    #[schema(value_type = String, format = DateTime)]
    joined_at: String,
    #[schema(value_type = Option<String>, format = DateTime)]
    eliminated_at: Option<String>,
}

/// OpenAPI schema for [`crate::domain::GameMove`].
#[derive(ToSchema)]
#[schema(as = crate::domain::GameMove, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct GameMoveSchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    #[schema(value_type = String, format = Uuid)]
    game_id: String,
    /// One-based, dense per game.
    move_number: u32,
    #[schema(value_type = String, format = Uuid)]
    added_by_user_id: String,
    added_by_username: String,
    #[schema(example = "red jug")]
    hold_description: String,
    photo_url: Option<String>,
    #[schema(value_type = String, format = DateTime)]
    created_at: String,
}

/// OpenAPI schema for [`crate::domain::GameStateView`].
#[derive(ToSchema)]
#[schema(as = crate::domain::GameStateView, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct GameStateViewSchema {
    session: GameSessionSchema,
    players: Vec<GamePlayerSchema>,
    moves: Vec<GameMoveSchema>,
    current_player: Option<GamePlayerSchema>,
    is_my_turn: bool,
    is_host: bool,
    my_player: Option<GamePlayerSchema>,
    can_start: bool,
}

/// OpenAPI schema for [`crate::domain::ports::CreateSessionPayload`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::CreateSessionPayload, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct CreateSessionPayloadSchema {
    #[schema(example = "Gym A")]
    location: String,
    #[schema(minimum = 2, maximum = 8, example = 4)]
    max_players: i64,
}

/// OpenAPI schema for [`crate::domain::ports::JoinSessionPayload`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::JoinSessionPayload, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct JoinSessionPayloadSchema {
    /// Case-insensitive; surrounding whitespace is ignored.
    #[schema(example = "k3x9qz")]
    room_code: String,
}

/// OpenAPI schema for [`crate::domain::ports::AddMovePayload`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::AddMovePayload, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct AddMovePayloadSchema {
    #[schema(example = "red jug")]
    hold_description: String,
    photo_url: Option<String>,
}

/// OpenAPI schema for [`crate::domain::HoldType`].
#[derive(ToSchema)]
#[schema(as = crate::domain::HoldType)]
pub enum HoldTypeSchema {
    #[schema(rename = "start")]
    Start,
    #[schema(rename = "middle")]
    Middle,
    #[schema(rename = "finish")]
    Finish,
    #[schema(rename = "feet_only")]
    FeetOnly,
}

/// OpenAPI schema for [`crate::domain::Hold`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Hold)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct HoldSchema {
    /// Horizontal position on the wall photo.
    #[schema(minimum = 0.0, example = 12.5)]
    x: f64,
    /// Vertical position on the wall photo.
    #[schema(minimum = 0.0, example = 80.0)]
    y: f64,
    #[schema(example = "left crimp")]
    description: String,
    color: Option<String>,
    #[schema(rename = "type")]
    hold_type: Option<HoldTypeSchema>,
}

/// OpenAPI schema for [`crate::domain::Problem`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Problem, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ProblemSchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    #[schema(value_type = String, format = Uuid)]
    creator_id: String,
    #[schema(example = "Slab traverse")]
    name: String,
    location: String,
    description: Option<String>,
    #[schema(example = "V3")]
    difficulty: Option<String>,
    wall_photo_url: Option<String>,
    holds: Vec<HoldSchema>,
    is_public: bool,
    tags: Vec<String>,
    #[schema(value_type = String, format = DateTime)]
    created_at: String,
    #[schema(value_type = String, format = DateTime)]
    updated_at: String,
}

/// OpenAPI schema for [`crate::domain::ports::CreateProblemPayload`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::CreateProblemPayload, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct CreateProblemPayloadSchema {
    name: String,
    location: String,
    description: Option<String>,
    difficulty: Option<String>,
    wall_photo_url: Option<String>,
    #[schema(max_items = 100)]
    holds: Option<Vec<HoldSchema>>,
    /// Defaults to `true`.
    is_public: Option<bool>,
    #[schema(max_items = 20)]
    tags: Option<Vec<String>>,
}

/// OpenAPI schema for [`crate::domain::ports::UpdateProblemPayload`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::UpdateProblemPayload, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct UpdateProblemPayloadSchema {
    name: Option<String>,
    location: Option<String>,
    /// Empty string clears.
    description: Option<String>,
    /// Empty string clears.
    difficulty: Option<String>,
    /// Empty string clears.
    wall_photo_url: Option<String>,
    holds: Option<Vec<HoldSchema>>,
    is_public: Option<bool>,
    tags: Option<Vec<String>>,
}

/// OpenAPI schema for [`crate::domain::Account`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Account, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct AccountSchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    #[schema(example = "climber@example.com")]
    email: String,
    username: String,
    #[schema(value_type = String, format = DateTime)]
    created_at: String,
}

#[cfg(test)]
mod tests {
    use utoipa::PartialSchema;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    use super::*;

    fn object_fields<T: PartialSchema>() -> Vec<String> {
        match T::schema() {
            RefOr::T(Schema::Object(obj)) => obj.properties.keys().cloned().collect(),
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn error_schema_uses_camel_case_trace_id() {
        let fields = object_fields::<ErrorSchema>();
        assert!(fields.contains(&"traceId".to_owned()));
        assert!(!fields.contains(&"trace_id".to_owned()));
    }

    #[test]
    fn hold_schema_names_its_type_field_like_the_wire() {
        let fields = object_fields::<HoldSchema>();
        assert!(fields.contains(&"type".to_owned()));
        assert!(!fields.contains(&"hold_type".to_owned()));
    }

    #[test]
    fn error_code_schema_lists_every_code() {
        let RefOr::T(Schema::Object(obj)) = ErrorCodeSchema::schema() else {
            panic!("expected Object schema");
        };
        let values = obj.enum_values.unwrap_or_default();
        assert_eq!(values.len(), 11);
        assert!(values.contains(&serde_json::json!("turn_conflict")));
    }
}
