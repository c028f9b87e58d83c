//! OpenAPI documentation.
//!
//! [`ApiDoc`] registers every REST path, the schema wrappers from
//! [`crate::inbound::http::schemas`] and the session cookie scheme. Swagger UI
//! serves it in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::inbound::http::accounts::{SignInRequest, SignUpRequest};
use crate::inbound::http::schemas::{
    AccountSchema, AddMovePayloadSchema, CreateProblemPayloadSchema, CreateSessionPayloadSchema,
    ErrorCodeSchema, ErrorSchema, GameMoveSchema, GamePlayerSchema, GameSessionSchema,
    GameStateViewSchema, GameStatusSchema, HoldSchema, HoldTypeSchema, JoinSessionPayloadSchema,
    ProblemSchema, UpdateProblemPayloadSchema,
};
use crate::inbound::http::users::{LoginRequest, LoginResponse};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login, /signup or /signin.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Add-on bouldering backend API",
        description = "Turn-based add-on games, the climbing problem library and accounts."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::login,
        crate::inbound::http::accounts::sign_up,
        crate::inbound::http::accounts::sign_in,
        crate::inbound::http::accounts::logout,
        crate::inbound::http::games::create_game,
        crate::inbound::http::games::join_game,
        crate::inbound::http::games::start_game,
        crate::inbound::http::games::add_move,
        crate::inbound::http::games::get_game,
        crate::inbound::http::problems::create_problem,
        crate::inbound::http::problems::list_problems,
        crate::inbound::http::problems::list_my_problems,
        crate::inbound::http::problems::search_problems,
        crate::inbound::http::problems::problems_by_difficulty,
        crate::inbound::http::problems::problems_by_location,
        crate::inbound::http::problems::get_problem,
        crate::inbound::http::problems::update_problem,
        crate::inbound::http::problems::delete_problem,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        GameStatusSchema,
        GameSessionSchema,
        GamePlayerSchema,
        GameMoveSchema,
        GameStateViewSchema,
        CreateSessionPayloadSchema,
        JoinSessionPayloadSchema,
        AddMovePayloadSchema,
        HoldTypeSchema,
        HoldSchema,
        ProblemSchema,
        CreateProblemPayloadSchema,
        UpdateProblemPayloadSchema,
        AccountSchema,
        LoginRequest,
        LoginResponse,
        SignUpRequest,
        SignInRequest,
    )),
    tags(
        (name = "users", description = "Guest identity"),
        (name = "accounts", description = "Email and password accounts"),
        (name = "games", description = "Turn-based add-on sessions"),
        (name = "problems", description = "Climbing problem library"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
