//! Tests for problem HTTP handlers over the in-memory repository.

use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::{Value, json};

use super::*;
use crate::domain::ports::{FixtureAccountService, FixtureGameCommand, FixtureGameQuery};
use crate::domain::ProblemService;
use crate::inbound::http::state::{HttpStateExtraPorts, HttpStatePorts};
use crate::inbound::http::test_utils::{session_cookie, test_session_middleware};
use crate::inbound::http::users::login;
use crate::outbound::memory::InMemoryProblemRepository;

fn test_app() -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let service = Arc::new(ProblemService::new(
        Arc::new(InMemoryProblemRepository::new()),
        Arc::new(DefaultClock),
    ));
    let state = HttpState::new_with_extra(
        HttpStatePorts {
            games: Arc::new(FixtureGameCommand),
            games_query: Arc::new(FixtureGameQuery),
        },
        HttpStateExtraPorts {
            problems: service.clone(),
            problems_query: service,
            accounts: Arc::new(FixtureAccountService),
        },
    );
    App::new()
        .app_data(web::Data::new(state))
        .wrap(test_session_middleware())
        .service(web::scope("/api/v1").service(login).configure(configure))
}

async fn login_as(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
    username: &str,
) -> Cookie<'static> {
    let res = actix_test::call_service(
        app,
        actix_test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(json!({ "username": username }))
            .to_request(),
    )
    .await;
    assert!(res.status().is_success());
    session_cookie(&res)
}

async fn send(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
    request: actix_test::TestRequest,
) -> (StatusCode, Value) {
    let res = actix_test::call_service(app, request.to_request()).await;
    let status = res.status();
    let body = actix_test::read_body(res).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("JSON body")
    };
    (status, value)
}

fn problem_body(name: &str, is_public: bool) -> Value {
    json!({
        "name": name,
        "location": "Boulder Barn",
        "difficulty": "V4",
        "holds": [
            { "x": 10.0, "y": 90.0, "description": "matched start", "type": "start" },
            { "x": 55.0, "y": 5.0, "description": "lip", "type": "finish", "color": "red" }
        ],
        "isPublic": is_public,
        "tags": ["Crimpy", "crimpy", "overhang"]
    })
}

fn str_field<'a>(body: &'a Value, pointer: &str) -> &'a str {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_else(|| panic!("missing {pointer} in {body}"))
}

#[rstest]
#[case("/api/v1/problems")]
#[case("/api/v1/problems/mine")]
#[case("/api/v1/problems/search?q=slab")]
#[actix_web::test]
async fn problem_routes_require_login(#[case] uri: &str) {
    let app = actix_test::init_service(test_app()).await;

    let (status, body) = send(&app, actix_test::TestRequest::get().uri(uri)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(str_field(&body, "/code"), "unauthorized");
}

#[actix_web::test]
async fn create_returns_created_problem_in_camel_case() {
    let app = actix_test::init_service(test_app()).await;
    let setter = login_as(&app, "setter").await;

    let (status, body) = send(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/problems")
            .cookie(setter)
            .set_json(problem_body("Barn door", true)),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(str_field(&body, "/name"), "Barn door");
    assert_eq!(body.get("isPublic"), Some(&json!(true)));
    assert_eq!(body.get("tags"), Some(&json!(["Crimpy", "overhang"])));
    assert_eq!(str_field(&body, "/holds/0/type"), "start");
    assert_eq!(str_field(&body, "/holds/1/color"), "red");
}

#[actix_web::test]
async fn invalid_holds_name_the_field() {
    let app = actix_test::init_service(test_app()).await;
    let setter = login_as(&app, "setter").await;

    let (status, body) = send(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/problems")
            .cookie(setter)
            .set_json(json!({
                "name": "Bad",
                "location": "Gym A",
                "holds": [{ "x": 1.0, "y": 1.0, "description": "  " }]
            })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(str_field(&body, "/details/field"), "holds");
    assert_eq!(str_field(&body, "/details/code"), "empty_hold_description");
}

#[actix_web::test]
async fn library_lifecycle_over_http() {
    let app = actix_test::init_service(test_app()).await;
    let setter = login_as(&app, "setter").await;
    let stranger = login_as(&app, "stranger").await;

    let (_, public) = send(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/problems")
            .cookie(setter.clone())
            .set_json(problem_body("Barn door", true)),
    )
    .await;
    let (_, private) = send(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/problems")
            .cookie(setter.clone())
            .set_json(problem_body("Project", false)),
    )
    .await;
    let public_id = str_field(&public, "/id").to_owned();
    let private_id = str_field(&private, "/id").to_owned();

    let (status, listed) = send(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/problems?location=barn")
            .cookie(stranger.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let (_, mine) = send(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/problems/mine")
            .cookie(setter.clone()),
    )
    .await;
    assert_eq!(mine.as_array().map(Vec::len), Some(2));

    let (status, _) = send(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/problems/{private_id}"))
            .cookie(stranger.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, by_grade) = send(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/problems/difficulty/V4")
            .cookie(stranger.clone()),
    )
    .await;
    assert_eq!(str_field(&by_grade, "/0/id"), public_id);

    let (status, _) = send(
        &app,
        actix_test::TestRequest::patch()
            .uri(&format!("/api/v1/problems/{public_id}"))
            .cookie(stranger.clone())
            .set_json(json!({ "difficulty": "V1" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, edited) = send(
        &app,
        actix_test::TestRequest::patch()
            .uri(&format!("/api/v1/problems/{public_id}"))
            .cookie(setter.clone())
            .set_json(json!({ "difficulty": "V5", "description": "no heel hooks" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(str_field(&edited, "/difficulty"), "V5");

    let (status, _) = send(
        &app,
        actix_test::TestRequest::delete()
            .uri(&format!("/api/v1/problems/{public_id}"))
            .cookie(setter.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, found) = send(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/problems/location/barn")
            .cookie(stranger),
    )
    .await;
    assert_eq!(found, json!([]));
}

#[rstest]
#[case("/api/v1/problems/search?q=%20%20", StatusCode::BAD_REQUEST)]
#[case("/api/v1/problems/search", StatusCode::BAD_REQUEST)]
#[case("/api/v1/problems/not-a-uuid", StatusCode::BAD_REQUEST)]
#[case("/api/v1/problems/550e8400-e29b-41d4-a716-446655440000", StatusCode::NOT_FOUND)]
#[actix_web::test]
async fn reads_validate_their_input(#[case] uri: &str, #[case] expected: StatusCode) {
    let app = actix_test::init_service(test_app()).await;
    let viewer = login_as(&app, "viewer").await;

    let (status, _) = send(&app, actix_test::TestRequest::get().uri(uri).cookie(viewer)).await;

    assert_eq!(status, expected);
}
