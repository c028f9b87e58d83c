//! Guest login.
//!
//! ```text
//! POST /api/v1/login {"username":"Ada"}
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::domain::{Actor, Error, UserId, UserValidationError, Username};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;

/// Login request body for `POST /api/v1/login`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Display name shown to other players.
    pub username: String,
}

/// Identity established by a login.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Identifier used for turn and host checks.
    #[schema(value_type = String, format = Uuid)]
    pub user_id: UserId,
    /// Display name.
    #[schema(value_type = String)]
    pub username: Username,
}

fn map_username_error(err: &UserValidationError) -> Error {
    match err {
        UserValidationError::UsernameTooLong { max } => {
            Error::invalid_request(format!("username must be at most {max} characters"))
                .with_details(json!({ "field": "username", "code": "username_too_long" }))
        }
        _ => Error::invalid_request("username must not be empty")
            .with_details(json!({ "field": "username", "code": "empty_username" })),
    }
}

/// Establish a guest identity in the session cookie.
///
/// A caller already logged in keeps their user id and may change display
/// name; otherwise a fresh id is issued.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Guest identity stored in the session", body = LoginResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<LoginResponse>> {
    let username =
        Username::new(payload.into_inner().username).map_err(|err| map_username_error(&err))?;
    let user_id = session
        .actor()?
        .map_or_else(UserId::random, |existing| existing.user_id);
    let actor = Actor::new(user_id, username);
    session.persist_actor(&actor)?;
    info!(user = %actor.user_id, "guest logged in");
    Ok(web::Json(LoginResponse {
        user_id: actor.user_id,
        username: actor.username,
    }))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::Value;

    use super::*;
    use crate::inbound::http::test_utils::{session_cookie, test_session_middleware};

    #[rstest]
    #[case("", "empty_username")]
    #[case("   ", "empty_username")]
    #[actix_web::test]
    async fn login_rejects_blank_username(#[case] username: &str, #[case] code: &str) {
        let app = actix_test::init_service(
            App::new().wrap(test_session_middleware()).service(login),
        )
        .await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/login")
                .set_json(json!({ "username": username }))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(
            body.pointer("/details/code").and_then(Value::as_str),
            Some(code)
        );
    }

    #[actix_web::test]
    async fn relogin_keeps_user_id() {
        let app = actix_test::init_service(
            App::new().wrap(test_session_middleware()).service(login),
        )
        .await;

        let first = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/login")
                .set_json(json!({ "username": "Ada" }))
                .to_request(),
        )
        .await;
        assert_eq!(first.status(), StatusCode::OK);
        let cookie = session_cookie(&first);
        let first: LoginResponse = actix_test::read_body_json(first).await;

        let second = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/login")
                .cookie(cookie)
                .set_json(json!({ "username": "Ada L." }))
                .to_request(),
        )
        .await;
        let second: LoginResponse = actix_test::read_body_json(second).await;

        assert_eq!(second.user_id, first.user_id);
        assert_eq!(second.username.as_ref(), "Ada L.");
    }
}
