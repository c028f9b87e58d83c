//! Tests for the domain error payload.

use super::*;
use rstest::rstest;
use serde_json::json;

#[rstest]
fn invalid_request_constructor_sets_code() {
    let err = Error::invalid_request("bad");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.message(), "bad");
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = Error::try_new(ErrorCode::InvalidRequest, "   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
}

#[rstest]
#[case(Error::game_full("full"), ErrorCode::GameFull)]
#[case(Error::not_enough_players("lonely"), ErrorCode::NotEnoughPlayers)]
#[case(Error::not_your_turn("wait"), ErrorCode::NotYourTurn)]
#[case(Error::turn_conflict("raced"), ErrorCode::TurnConflict)]
#[case(Error::service_unavailable("down"), ErrorCode::ServiceUnavailable)]
fn game_constructors_set_codes(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
#[case(ErrorCode::ServiceUnavailable, true)]
#[case(ErrorCode::TurnConflict, true)]
#[case(ErrorCode::NotYourTurn, false)]
#[case(ErrorCode::GameFull, false)]
#[case(ErrorCode::InvalidRequest, false)]
fn only_transient_codes_are_retryable(#[case] code: ErrorCode, #[case] retryable: bool) {
    assert_eq!(code.is_retryable(), retryable);
}

#[rstest]
fn serializes_snake_case_code_and_omits_missing_details() {
    let value = serde_json::to_value(Error::not_your_turn("Not your turn")).expect("serialize");
    assert_eq!(
        value,
        json!({ "code": "not_your_turn", "message": "Not your turn" })
    );
}

#[rstest]
fn deserialization_rejects_blank_messages() {
    let payload = json!({ "code": "not_found", "message": "  " });
    let result = serde_json::from_value::<Error>(payload);
    assert!(result.is_err());
}

#[rstest]
fn details_survive_serde() {
    let error = Error::invalid_request("bad").with_details(json!({ "field": "maxPlayers" }));
    let value = serde_json::to_value(&error).expect("serialize");
    let restored: Error = serde_json::from_value(value).expect("deserialize");
    assert_eq!(restored, error);
}

#[tokio::test]
async fn constructors_capture_the_scoped_trace_id() {
    let trace_id = TraceId::generate();
    let expected = trace_id.to_string();
    let error = TraceId::scope(trace_id, async { Error::not_your_turn("wait") }).await;
    assert_eq!(error.trace_id(), Some(expected.as_str()));
}

#[rstest]
fn errors_built_outside_a_request_have_no_trace_id() {
    assert!(Error::internal("boom").trace_id().is_none());
}

#[rstest]
fn blank_trace_ids_are_rejected() {
    let result = Error::not_found("missing").try_with_trace_id("  ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyTraceId)));
}

#[tokio::test]
async fn deserialised_errors_keep_their_own_trace_id() {
    let payload = json!({ "code": "not_found", "message": "gone", "traceId": "abc" });
    let restored: Error = TraceId::scope(TraceId::generate(), async {
        serde_json::from_value(payload).expect("deserialize")
    })
    .await;
    assert_eq!(restored.trace_id(), Some("abc"));
}
