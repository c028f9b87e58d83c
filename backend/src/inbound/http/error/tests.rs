//! Tests for HTTP error mapping.

use actix_web::ResponseError;
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use rstest::rstest;
use serde_json::{Value, json};

use super::*;

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("login required"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("host only"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case(Error::game_full("full"), StatusCode::CONFLICT)]
#[case(Error::not_enough_players("alone"), StatusCode::UNPROCESSABLE_ENTITY)]
#[case(Error::not_your_turn("wait"), StatusCode::CONFLICT)]
#[case(Error::turn_conflict("raced"), StatusCode::CONFLICT)]
#[case(Error::conflict("key reused"), StatusCode::CONFLICT)]
#[case(Error::service_unavailable("down"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] err: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&err), status);
}

async fn response_body(error: &Error) -> Value {
    let response = ResponseError::error_response(error);
    let bytes = to_bytes(response.into_body())
        .await
        .expect("response body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[actix_web::test]
async fn internal_errors_are_redacted() {
    let error = Error::internal("store exploded").with_details(json!({"secret": "x"}));

    let body = response_body(&error).await;

    assert_eq!(body.get("code"), Some(&json!("internal_error")));
    assert_eq!(body.get("message"), Some(&json!("Internal server error")));
    assert!(body.get("details").is_none_or(Value::is_null));
}

#[actix_web::test]
async fn user_facing_errors_keep_message_and_details() {
    let error = Error::invalid_request("location must not be empty")
        .with_details(json!({"field": "location", "code": "empty_location"}));

    let body = response_body(&error).await;

    assert_eq!(body.get("code"), Some(&json!("invalid_request")));
    assert_eq!(
        body.get("message"),
        Some(&json!("location must not be empty"))
    );
    assert_eq!(
        body.pointer("/details/field"),
        Some(&json!("location"))
    );
}

#[actix_web::test]
async fn trace_id_is_echoed_in_header_and_survives_redaction() {
    let error = Error::internal("store exploded").with_trace_id("trace-123");

    let response = ResponseError::error_response(&error);
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let bytes = to_bytes(response.into_body())
        .await
        .expect("response body");
    let body: Value = serde_json::from_slice(&bytes).expect("json body");

    assert_eq!(header.as_deref(), Some("trace-123"));
    assert_eq!(body.get("traceId"), Some(&json!("trace-123")));
    assert_eq!(body.get("message"), Some(&json!("Internal server error")));
}
