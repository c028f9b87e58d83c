//! Game HTTP handlers.
//!
//! ```text
//! POST /api/v1/games                 {"location":"Gym A","maxPlayers":4}
//! POST /api/v1/games/join            {"roomCode":"K3X9QZ"}
//! POST /api/v1/games/{id}/start
//! POST /api/v1/games/{id}/moves      {"holdDescription":"red jug","photoUrl":null}
//! GET  /api/v1/games/{id}
//! ```
//!
//! Mutating endpoints honour an optional `Idempotency-Key` header.

use std::str::FromStr;

use actix_web::{HttpRequest, get, post, web};
use serde_json::json;

use crate::domain::ports::{
    AddMovePayload, AddMoveRequest, CreateSessionPayload, CreateSessionRequest,
    JoinSessionPayload, JoinSessionRequest, StartSessionRequest,
};
use crate::domain::{Error, GameId, GameMove, GameSession, GameStateView};
use crate::inbound::http::ApiResult;
use crate::inbound::http::idempotency::idempotency_key_from;
use crate::inbound::http::schemas::{
    AddMovePayloadSchema, CreateSessionPayloadSchema, ErrorSchema, GameMoveSchema,
    GameSessionSchema, GameStateViewSchema, JoinSessionPayloadSchema,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

fn parse_game_id(raw: &str) -> Result<GameId, Error> {
    GameId::from_str(raw).map_err(|_| {
        Error::invalid_request("game id must be a valid uuid")
            .with_details(json!({ "field": "gameId", "code": "invalid_uuid" }))
    })
}

/// Open a lobby hosted by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/games",
    request_body = CreateSessionPayloadSchema,
    params(
        ("Idempotency-Key" = Option<String>, Header, description = "UUID; repeats replay the first response")
    ),
    responses(
        (status = 200, description = "Lobby created; the host sits at turn order 0", body = GameSessionSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 409, description = "Idempotency key reused with a different payload", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["games"],
    operation_id = "createGame"
)]
#[post("/games")]
pub async fn create_game(
    state: web::Data<HttpState>,
    session: SessionContext,
    request: HttpRequest,
    payload: web::Json<CreateSessionPayload>,
) -> ApiResult<web::Json<GameSession>> {
    let actor = session.require_actor()?;
    let idempotency_key = idempotency_key_from(request.headers())?;
    let created = state
        .games
        .create_session(CreateSessionRequest {
            actor,
            payload: payload.into_inner(),
            idempotency_key,
        })
        .await?;
    Ok(web::Json(created))
}

/// Join a lobby by room code.
#[utoipa::path(
    post,
    path = "/api/v1/games/join",
    request_body = JoinSessionPayloadSchema,
    params(
        ("Idempotency-Key" = Option<String>, Header, description = "UUID; repeats replay the first response")
    ),
    responses(
        (status = 200, description = "Seated, or already seated", body = GameSessionSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 404, description = "No lobby with that room code", body = ErrorSchema),
        (status = 409, description = "Lobby full or key reused", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["games"],
    operation_id = "joinGame"
)]
#[post("/games/join")]
pub async fn join_game(
    state: web::Data<HttpState>,
    session: SessionContext,
    request: HttpRequest,
    payload: web::Json<JoinSessionPayload>,
) -> ApiResult<web::Json<GameSession>> {
    let actor = session.require_actor()?;
    let idempotency_key = idempotency_key_from(request.headers())?;
    let joined = state
        .games
        .join_session(JoinSessionRequest {
            actor,
            payload: payload.into_inner(),
            idempotency_key,
        })
        .await?;
    Ok(web::Json(joined))
}

/// Start a lobby; host only.
#[utoipa::path(
    post,
    path = "/api/v1/games/{id}/start",
    params(
        ("id" = String, Path, description = "Game identifier"),
        ("Idempotency-Key" = Option<String>, Header, description = "UUID; repeats replay the first response")
    ),
    responses(
        (status = 200, description = "Game active; the host holds the first turn", body = GameSessionSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 403, description = "Caller is not the host", body = ErrorSchema),
        (status = 404, description = "Unknown game", body = ErrorSchema),
        (status = 409, description = "Game already started", body = ErrorSchema),
        (status = 422, description = "Fewer than two players", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["games"],
    operation_id = "startGame"
)]
#[post("/games/{id}/start")]
pub async fn start_game(
    state: web::Data<HttpState>,
    session: SessionContext,
    request: HttpRequest,
    path: web::Path<String>,
) -> ApiResult<web::Json<GameSession>> {
    let actor = session.require_actor()?;
    let game_id = parse_game_id(&path.into_inner())?;
    let idempotency_key = idempotency_key_from(request.headers())?;
    let started = state
        .games
        .start_session(StartSessionRequest {
            actor,
            game_id,
            idempotency_key,
        })
        .await?;
    Ok(web::Json(started))
}

/// Append a hold and pass the turn.
#[utoipa::path(
    post,
    path = "/api/v1/games/{id}/moves",
    request_body = AddMovePayloadSchema,
    params(
        ("id" = String, Path, description = "Game identifier"),
        ("Idempotency-Key" = Option<String>, Header, description = "UUID; repeats replay the first response")
    ),
    responses(
        (status = 200, description = "Move recorded; the turn advanced", body = GameMoveSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 404, description = "Unknown game", body = ErrorSchema),
        (status = 409, description = "Not the caller's turn, game not active or the turn moved concurrently", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["games"],
    operation_id = "addMove"
)]
#[post("/games/{id}/moves")]
pub async fn add_move(
    state: web::Data<HttpState>,
    session: SessionContext,
    request: HttpRequest,
    path: web::Path<String>,
    payload: web::Json<AddMovePayload>,
) -> ApiResult<web::Json<GameMove>> {
    let actor = session.require_actor()?;
    let game_id = parse_game_id(&path.into_inner())?;
    let idempotency_key = idempotency_key_from(request.headers())?;
    let recorded = state
        .games
        .add_move(AddMoveRequest {
            actor,
            game_id,
            payload: payload.into_inner(),
            idempotency_key,
        })
        .await?;
    Ok(web::Json(recorded))
}

/// Full game state as seen by the caller.
#[utoipa::path(
    get,
    path = "/api/v1/games/{id}",
    params(
        ("id" = String, Path, description = "Game identifier")
    ),
    responses(
        (status = 200, description = "Session, players, moves and derived flags", body = GameStateViewSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 404, description = "Unknown game", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["games"],
    operation_id = "getGame"
)]
#[get("/games/{id}")]
pub async fn get_game(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<GameStateView>> {
    let actor = session.require_actor()?;
    let game_id = parse_game_id(&path.into_inner())?;
    let view = state
        .games_query
        .load_state(&game_id, &actor.user_id)
        .await?;
    Ok(web::Json(view))
}

/// Register every game route on a scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_game)
        .service(join_game)
        .service(start_game)
        .service(add_move)
        .service(get_game);
}

#[cfg(test)]
#[path = "games_tests.rs"]
mod tests;
