// ---------------------------------------------------------------------------
// handlers/tests.rs - ApiError codes, statuses, bodies and conversions
// ---------------------------------------------------------------------------

use super::*;
use crate::schema::Violation;
use axum::response::IntoResponse;
use http_body_util::BodyExt;

fn violations() -> Violations {
    serde_json::from_value(serde_json::json!([
        { "path": "cases.0.given", "message": "Required" }
    ]))
    .unwrap()
}

async fn body_json(err: ApiError) -> (StatusCode, Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[test]
fn status_codes_follow_error_class() {
    let cases = [
        (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        (ApiError::Validation(violations()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
        (
            ApiError::GenerationService("x".into()),
            StatusCode::BAD_GATEWAY,
            "GENERATION_SERVICE_FAILURE",
        ),
        (ApiError::MalformedOutput("x".into()), StatusCode::BAD_GATEWAY, "MALFORMED_MODEL_OUTPUT"),
        (ApiError::SchemaMismatch(violations()), StatusCode::BAD_GATEWAY, "SCHEMA_MISMATCH"),
        (ApiError::Tracker(TrackerError::Unauthorized), StatusCode::BAD_GATEWAY, "TRACKER_FAILURE"),
        (
            ApiError::TrackerNotConfigured("x".into()),
            StatusCode::SERVICE_UNAVAILABLE,
            "TRACKER_NOT_CONFIGURED",
        ),
        (ApiError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    ];
    for (err, status, code) in cases {
        assert_eq!(err.status_code(), status, "{code}");
        assert_eq!(err.error_code(), code);
    }
}

#[tokio::test]
async fn schema_mismatch_body_carries_violations() {
    let (status, body) = body_json(ApiError::SchemaMismatch(violations())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "SCHEMA_MISMATCH");
    assert_eq!(body["error"]["details"][0]["path"], "cases.0.given");
    assert_eq!(body["error"]["details"][0]["message"], "Required");
    assert!(!body["error"]["request_id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn internal_details_are_not_leaked() {
    let (_, body) = body_json(ApiError::Internal("db password=hunter2".into())).await;
    assert_eq!(body["error"]["message"], "Internal server error");
    assert!(body["error"].get("details").is_none());

    let (_, body) = body_json(ApiError::GenerationService("upstream said 429".into())).await;
    assert!(!body["error"]["message"].as_str().unwrap().contains("429"));
}

#[test]
fn generation_errors_map_to_distinct_codes() {
    let invalid = ApiError::from(GenerationError::InvalidRequest(violations()));
    assert_eq!(invalid.error_code(), "VALIDATION_ERROR");

    let service = ApiError::from(GenerationError::Service(GatewayError::NotConfigured));
    assert_eq!(service.error_code(), "GENERATION_SERVICE_FAILURE");

    let parse_err = serde_json::from_str::<Value>("{ cases: []").unwrap_err();
    let malformed = ApiError::from(GenerationError::Output(OutputError::Malformed(parse_err)));
    assert_eq!(malformed.error_code(), "MALFORMED_MODEL_OUTPUT");

    let mismatch = ApiError::from(GenerationError::Output(OutputError::SchemaMismatch(
        violations(),
    )));
    match mismatch {
        ApiError::SchemaMismatch(v) => {
            assert_eq!(
                v.as_slice(),
                &[Violation { path: "cases.0.given".into(), message: "Required".into() }]
            );
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn tracker_errors_map_by_kind() {
    let missing = ApiError::from(TrackerError::NotConfigured { missing: vec!["JIRA_BASE_URL"] });
    assert_eq!(missing.status_code(), StatusCode::SERVICE_UNAVAILABLE);

    match ApiError::from(TrackerError::NotFound("PROJ-9".into())) {
        ApiError::NotFound(m) => assert_eq!(m, "Issue PROJ-9 not found"),
        other => panic!("unexpected {other:?}"),
    }

    assert_eq!(ApiError::from(TrackerError::Unauthorized).error_code(), "TRACKER_FAILURE");
    assert_eq!(ApiError::from(TrackerError::Timeout(10)).status_code(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn tracker_upstream_detail_stays_in_the_log() {
    let status_err = TrackerError::Status {
        status: 500,
        body: "java.lang.NullPointerException at com.atlassian.internal".into(),
    };
    let (status, body) = body_json(ApiError::from(status_err)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "TRACKER_FAILURE");
    assert_eq!(body["error"]["message"], "Issue tracker request failed");

    let (_, body) = body_json(ApiError::from(TrackerError::Decode("line 1 column 2".into()))).await;
    assert_eq!(body["error"]["message"], "Issue tracker request failed");

    let (_, body) = body_json(ApiError::from(TrackerError::Unauthorized)).await;
    assert!(body["error"]["message"].as_str().unwrap().contains("check credentials"));
}
