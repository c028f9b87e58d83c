//! Email and password account handlers.
//!
//! ```text
//! POST /api/v1/signup  {"email":"a@b.co","password":"correct horse","username":"Ada"}
//! POST /api/v1/signin  {"email":"a@b.co","password":"correct horse"}
//! POST /api/v1/logout
//! ```
//!
//! Sign-up and sign-in store the account as the session actor, so the same
//! cookie authorises game and problem routes.

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::domain::{
    Account, AccountValidationError, Error, SignInCredentials, SignUpCredentials,
    UserValidationError,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{AccountSchema, ErrorSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Body for `POST /api/v1/signup`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    /// Sign-in identifier; stored lowercased.
    #[schema(example = "climber@example.com")]
    pub email: String,
    /// 8 to 72 characters.
    pub password: String,
    /// Display name shown to other players.
    #[schema(example = "Ada")]
    pub username: String,
}

impl TryFrom<SignUpRequest> for SignUpCredentials {
    type Error = AccountValidationError;

    fn try_from(value: SignUpRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.password, &value.username)
    }
}

/// Body for `POST /api/v1/signin`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    /// Registered email.
    #[schema(example = "climber@example.com")]
    pub email: String,
    /// Account password.
    pub password: String,
}

impl TryFrom<SignInRequest> for SignInCredentials {
    type Error = AccountValidationError;

    fn try_from(value: SignInRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.password)
    }
}

fn map_account_validation_error(err: &AccountValidationError) -> Error {
    let (field, code) = match err {
        AccountValidationError::EmptyEmail => ("email", "empty_email"),
        AccountValidationError::InvalidEmail => ("email", "invalid_email"),
        AccountValidationError::EmailTooLong { .. } => ("email", "email_too_long"),
        AccountValidationError::EmptyPassword => ("password", "empty_password"),
        AccountValidationError::PasswordTooShort { .. } => ("password", "password_too_short"),
        AccountValidationError::PasswordTooLong { .. } => ("password", "password_too_long"),
        AccountValidationError::Username(UserValidationError::UsernameTooLong { .. }) => {
            ("username", "username_too_long")
        }
        AccountValidationError::Username(_) => ("username", "empty_username"),
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field, "code": code }))
}

/// Register an account and sign it in.
#[utoipa::path(
    post,
    path = "/api/v1/signup",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Account created; session established", body = AccountSchema,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Email already registered", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["accounts"],
    operation_id = "signUp",
    security([])
)]
#[post("/signup")]
pub async fn sign_up(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SignUpRequest>,
) -> ApiResult<HttpResponse> {
    let credentials = SignUpCredentials::try_from(payload.into_inner())
        .map_err(|err| map_account_validation_error(&err))?;
    let account = state.accounts.sign_up(credentials).await?;
    session.persist_actor(&account.actor())?;
    Ok(HttpResponse::Created().json(account))
}

/// Check credentials and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/signin",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = AccountSchema,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["accounts"],
    operation_id = "signIn",
    security([])
)]
#[post("/signin")]
pub async fn sign_in(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SignInRequest>,
) -> ApiResult<web::Json<Account>> {
    let credentials = SignInCredentials::try_from(payload.into_inner())
        .map_err(|err| map_account_validation_error(&err))?;
    let account = state.accounts.sign_in(credentials).await?;
    session.persist_actor(&account.actor())?;
    info!(account = %account.id, "account signed in");
    Ok(web::Json(account))
}

/// Forget the session. Succeeds whether or not anyone was signed in.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses(
        (status = 204, description = "Session cleared")
    ),
    tags = ["accounts"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.purge();
    HttpResponse::NoContent().finish()
}

/// Register every account route on a scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(sign_up).service(sign_in).service(logout);
}
