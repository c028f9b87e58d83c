//! Climbing problem HTTP handlers.
//!
//! ```text
//! POST   /api/v1/problems                      {"name":"Arete","location":"Gym A","holds":[...]}
//! GET    /api/v1/problems?location=&limit=
//! GET    /api/v1/problems/mine
//! GET    /api/v1/problems/search?q=
//! GET    /api/v1/problems/difficulty/{grade}
//! GET    /api/v1/problems/location/{location}
//! GET    /api/v1/problems/{id}
//! PATCH  /api/v1/problems/{id}                 {"difficulty":"V5"}
//! DELETE /api/v1/problems/{id}
//! ```
//!
//! Every route needs a session. Reads other than `/mine` and `/{id}` only
//! return public problems.

use std::str::FromStr;

use actix_web::{HttpResponse, delete, get, patch, post, web};
use serde::Deserialize;

use crate::domain::ports::{
    CreateProblemPayload, CreateProblemRequest, DeleteProblemRequest, UpdateProblemPayload,
    UpdateProblemRequest, problem_field_error,
};
use crate::domain::{Error, Problem, ProblemId, ProblemValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{
    CreateProblemPayloadSchema, ErrorSchema, ProblemSchema, UpdateProblemPayloadSchema,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

fn parse_problem_id(raw: &str) -> Result<ProblemId, Error> {
    ProblemId::from_str(raw)
        .map_err(|_| problem_field_error("problemId", &ProblemValidationError::InvalidProblemId))
}

/// Query string for `GET /problems`.
#[derive(Debug, Default, Deserialize)]
pub struct ListProblemsQuery {
    /// Case-insensitive location fragment.
    #[serde(default)]
    pub location: Option<String>,
    /// Page size, clamped to `1..=50`.
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Query string for `GET /problems/search`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchProblemsQuery {
    /// Search term.
    #[serde(default)]
    pub q: String,
}

/// Store a new problem owned by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/problems",
    request_body = CreateProblemPayloadSchema,
    responses(
        (status = 201, description = "Problem created", body = ProblemSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["problems"],
    operation_id = "createProblem"
)]
#[post("/problems")]
pub async fn create_problem(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateProblemPayload>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_actor()?;
    let created = state
        .problems
        .create_problem(CreateProblemRequest {
            actor,
            payload: payload.into_inner(),
        })
        .await?;
    Ok(HttpResponse::Created().json(created))
}

/// Newest public problems.
#[utoipa::path(
    get,
    path = "/api/v1/problems",
    params(
        ("location" = Option<String>, Query, description = "Case-insensitive location fragment"),
        ("limit" = Option<u32>, Query, description = "Page size, default and max 50")
    ),
    responses(
        (status = 200, description = "Public problems, newest first", body = [ProblemSchema]),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["problems"],
    operation_id = "listProblems"
)]
#[get("/problems")]
pub async fn list_problems(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<ListProblemsQuery>,
) -> ApiResult<web::Json<Vec<Problem>>> {
    session.require_actor()?;
    let ListProblemsQuery { location, limit } = query.into_inner();
    let problems = state.problems_query.list_public(location, limit).await?;
    Ok(web::Json(problems))
}

/// Every problem the caller created, private ones included.
#[utoipa::path(
    get,
    path = "/api/v1/problems/mine",
    responses(
        (status = 200, description = "Caller's problems, newest first", body = [ProblemSchema]),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["problems"],
    operation_id = "listMyProblems"
)]
#[get("/problems/mine")]
pub async fn list_my_problems(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<Problem>>> {
    let actor = session.require_actor()?;
    let problems = state.problems_query.list_mine(&actor.user_id).await?;
    Ok(web::Json(problems))
}

/// Public problems whose text fields contain `q`.
#[utoipa::path(
    get,
    path = "/api/v1/problems/search",
    params(
        ("q" = String, Query, description = "Matched against name, location, description and grade")
    ),
    responses(
        (status = 200, description = "Up to 20 matches, newest first", body = [ProblemSchema]),
        (status = 400, description = "Blank search term", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["problems"],
    operation_id = "searchProblems"
)]
#[get("/problems/search")]
pub async fn search_problems(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<SearchProblemsQuery>,
) -> ApiResult<web::Json<Vec<Problem>>> {
    session.require_actor()?;
    let problems = state.problems_query.search(&query.q).await?;
    Ok(web::Json(problems))
}

/// Public problems with exactly this grade.
#[utoipa::path(
    get,
    path = "/api/v1/problems/difficulty/{grade}",
    params(("grade" = String, Path, description = "Grade as written, e.g. V4")),
    responses(
        (status = 200, description = "Matching problems", body = [ProblemSchema]),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["problems"],
    operation_id = "listProblemsByDifficulty"
)]
#[get("/problems/difficulty/{grade}")]
pub async fn problems_by_difficulty(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<Problem>>> {
    session.require_actor()?;
    let problems = state
        .problems_query
        .by_difficulty(&path.into_inner())
        .await?;
    Ok(web::Json(problems))
}

/// Public problems at a location.
#[utoipa::path(
    get,
    path = "/api/v1/problems/location/{location}",
    params(("location" = String, Path, description = "Case-insensitive location fragment")),
    responses(
        (status = 200, description = "Matching problems", body = [ProblemSchema]),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["problems"],
    operation_id = "listProblemsByLocation"
)]
#[get("/problems/location/{location}")]
pub async fn problems_by_location(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<Problem>>> {
    session.require_actor()?;
    let problems = state
        .problems_query
        .by_location(&path.into_inner())
        .await?;
    Ok(web::Json(problems))
}

/// One problem; private problems are visible to their creator only.
#[utoipa::path(
    get,
    path = "/api/v1/problems/{id}",
    params(("id" = String, Path, description = "Problem identifier")),
    responses(
        (status = 200, description = "The problem", body = ProblemSchema),
        (status = 400, description = "Malformed id", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 404, description = "Unknown or private", body = ErrorSchema)
    ),
    tags = ["problems"],
    operation_id = "getProblem"
)]
#[get("/problems/{id}")]
pub async fn get_problem(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Problem>> {
    let actor = session.require_actor()?;
    let problem_id = parse_problem_id(&path.into_inner())?;
    let problem = state
        .problems_query
        .get_problem(&actor.user_id, &problem_id)
        .await?;
    Ok(web::Json(problem))
}

/// Partially edit a problem; creator only.
#[utoipa::path(
    patch,
    path = "/api/v1/problems/{id}",
    request_body = UpdateProblemPayloadSchema,
    params(("id" = String, Path, description = "Problem identifier")),
    responses(
        (status = 200, description = "Stored problem after the edit", body = ProblemSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 403, description = "Caller did not create the problem", body = ErrorSchema),
        (status = 404, description = "Unknown or private", body = ErrorSchema)
    ),
    tags = ["problems"],
    operation_id = "updateProblem"
)]
#[patch("/problems/{id}")]
pub async fn update_problem(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateProblemPayload>,
) -> ApiResult<web::Json<Problem>> {
    let actor = session.require_actor()?;
    let problem_id = parse_problem_id(&path.into_inner())?;
    let updated = state
        .problems
        .update_problem(UpdateProblemRequest {
            actor,
            problem_id,
            payload: payload.into_inner(),
        })
        .await?;
    Ok(web::Json(updated))
}

/// Delete a problem; creator only.
#[utoipa::path(
    delete,
    path = "/api/v1/problems/{id}",
    params(("id" = String, Path, description = "Problem identifier")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Malformed id", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 403, description = "Caller did not create the problem", body = ErrorSchema),
        (status = 404, description = "Unknown or private", body = ErrorSchema)
    ),
    tags = ["problems"],
    operation_id = "deleteProblem"
)]
#[delete("/problems/{id}")]
pub async fn delete_problem(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_actor()?;
    let problem_id = parse_problem_id(&path.into_inner())?;
    state
        .problems
        .delete_problem(DeleteProblemRequest { actor, problem_id })
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Register every problem route on a scope.
///
/// Fixed segments are registered before `/problems/{id}` so they are not
/// captured as ids.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_problem)
        .service(list_problems)
        .service(list_my_problems)
        .service(search_problems)
        .service(problems_by_difficulty)
        .service(problems_by_location)
        .service(get_problem)
        .service(update_problem)
        .service(delete_problem);
}

#[cfg(test)]
#[path = "problems_tests.rs"]
mod tests;
