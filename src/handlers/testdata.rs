// ---------------------------------------------------------------------------
// handlers/testdata.rs - synthetic cases and CSV export (no model call)
// ---------------------------------------------------------------------------

use axum::extract::rejection::JsonRejection;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value;

use crate::models::{GenerationRequest, GenerationResponse};
use crate::schema;
use crate::testdata;

use super::{ApiError, ErrorBody};

#[utoipa::path(post, path = "/api/testdata/generate", tag = "testdata",
    request_body = GenerationRequest,
    responses(
        (status = 200, description = "Synthetic test cases", body = GenerationResponse),
        (status = 400, description = "Request failed validation", body = ErrorBody)
    )
)]
pub async fn generate_test_data(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<GenerationResponse>, ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let request = schema::validate_request(&body).map_err(ApiError::Validation)?;
    Ok(Json(testdata::synthesize(&request)))
}

#[utoipa::path(post, path = "/api/testdata/csv", tag = "testdata",
    request_body(content = Value, description = "Object with a `cases` array"),
    responses(
        (status = 200, description = "CSV attachment", body = String, content_type = "text/csv"),
        (status = 400, description = "Body has no cases array", body = ErrorBody)
    )
)]
pub async fn export_csv(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let cases = body["cases"]
        .as_array()
        .ok_or_else(|| ApiError::BadRequest("Request must include cases array".into()))?;

    let csv = testdata::render_csv(cases).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"test-cases.csv\""),
        ],
        csv,
    ))
}
