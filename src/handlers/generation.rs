// ---------------------------------------------------------------------------
// handlers/generation.rs - POST /api/generate
// ---------------------------------------------------------------------------

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::Value;

use crate::models::{GenerationRequest, GenerationResponse};
use crate::orchestrator;
use crate::state::AppState;

use super::{ApiError, ErrorBody};

/// Generate test cases for a user story through the hosted model.
///
/// The body is taken as untyped JSON so shape problems come back as
/// field-level violations rather than a single deserializer message.
#[utoipa::path(post, path = "/api/generate", tag = "generation",
    request_body = GenerationRequest,
    responses(
        (status = 200, description = "Validated test cases", body = GenerationResponse),
        (status = 400, description = "Request failed validation", body = ErrorBody),
        (status = 502, description = "Generation service failure, malformed model output, or schema mismatch", body = ErrorBody),
        (status = 500, description = "Unexpected internal failure", body = ErrorBody)
    )
)]
pub async fn generate_tests(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<GenerationResponse>, ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let response =
        orchestrator::generate(&body, state.gateway.as_ref(), state.tracker.as_ref()).await?;
    Ok(Json(response))
}
