// ---------------------------------------------------------------------------
// handlers/ - HTTP handlers grouped by area
// mod.rs owns the shared error type and re-exports every handler so that
// `crate::handlers::*` paths stay flat for the router and the OpenAPI doc.
// ---------------------------------------------------------------------------

pub(crate) mod generation;
pub(crate) mod system;
pub(crate) mod testdata;
pub(crate) mod tracker;

pub use generation::generate_tests;
pub use system::{health, openapi_json, readiness};
pub use testdata::{export_csv, generate_test_data};
pub use tracker::fetch_issue;

// ── utoipa __path_* re-exports ───────────────────────────────────────────────
pub use generation::__path_generate_tests;
pub use system::{__path_health, __path_readiness};
pub use testdata::{__path_export_csv, __path_generate_test_data};
pub use tracker::__path_fetch_issue;

use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::gateway::GatewayError;
use crate::orchestrator::GenerationError;
use crate::schema::Violations;
use crate::tracker::TrackerError;
use crate::validator::OutputError;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Centralized API error type for all handlers.
/// Logs full details server-side, returns sanitized JSON to the client.
///
/// Response format:
/// ```json
/// {
///   "error": {
///     "code": "SCHEMA_MISMATCH",
///     "message": "Human-readable description",
///     "request_id": "uuid",
///     "details": [ { "path": "cases.0.given", "message": "Required" } ]
///   }
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(Violations),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Generation service failure: {0}")]
    GenerationService(String),

    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(Violations),

    #[error("Issue tracker failure: {0}")]
    Tracker(TrackerError),

    #[error("Issue tracker not configured: {0}")]
    TrackerNotConfigured(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Structured error response body - serialized inside `{ "error": ... }`.
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct StructuredApiError {
    /// Machine-readable error code (e.g. "VALIDATION_ERROR", "SCHEMA_MISMATCH").
    #[schema(value_type = String)]
    pub code: &'static str,
    /// Human-readable error message (sanitized, safe to show to users).
    pub message: String,
    /// Correlation id, also present in the server log line for this error.
    pub request_id: String,
    /// Field-level violations for validation and schema-mismatch errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub details: Option<Value>,
}

#[derive(Debug, serde::Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: StructuredApiError,
}

impl ApiError {
    /// Machine-readable error code string for each variant.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::GenerationService(_) => "GENERATION_SERVICE_FAILURE",
            ApiError::MalformedOutput(_) => "MALFORMED_MODEL_OUTPUT",
            ApiError::SchemaMismatch(_) => "SCHEMA_MISMATCH",
            ApiError::Tracker(_) => "TRACKER_FAILURE",
            ApiError::TrackerNotConfigured(_) => "TRACKER_NOT_CONFIGURED",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status code for each variant.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::GenerationService(_)
            | ApiError::MalformedOutput(_)
            | ApiError::SchemaMismatch(_)
            | ApiError::Tracker(_) => StatusCode::BAD_GATEWAY,
            ApiError::TrackerNotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Sanitized message safe to return to clients. Upstream causes and
    /// internal failures are replaced by generic text; the full error is logged.
    fn sanitized_message(&self) -> String {
        match self {
            ApiError::BadRequest(m) | ApiError::NotFound(m) => m.clone(),
            ApiError::TrackerNotConfigured(m) => m.clone(),
            ApiError::Tracker(e @ (TrackerError::Unauthorized | TrackerError::Timeout(_))) => {
                e.to_string()
            }
            ApiError::Tracker(_) => "Issue tracker request failed".to_string(),
            ApiError::Validation(_) => "Request validation failed".to_string(),
            ApiError::GenerationService(_) => {
                "Failed to generate tests from the generation service".to_string()
            }
            ApiError::MalformedOutput(_) => "Generation service returned invalid JSON".to_string(),
            ApiError::SchemaMismatch(_) => {
                "Generation service response does not match the expected schema".to_string()
            }
            ApiError::Internal(_) => "Internal server error".to_string(),
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            ApiError::Validation(v) | ApiError::SchemaMismatch(v) => serde_json::to_value(v).ok(),
            _ => None,
        }
    }
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let request_id = Uuid::new_v4().to_string();

        // Log full detail server-side (with request_id for correlation)
        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                code = self.error_code(),
                "API error ({}): {}",
                status.as_u16(),
                self
            );
        } else {
            tracing::warn!(
                request_id = %request_id,
                code = self.error_code(),
                "API error ({}): {}",
                status.as_u16(),
                self
            );
        }

        let body = ErrorBody {
            error: StructuredApiError {
                code: self.error_code(),
                message: self.sanitized_message(),
                request_id,
                details: self.details(),
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::InvalidRequest(v) => ApiError::Validation(v),
            GenerationError::Service(e) => ApiError::from(e),
            GenerationError::Output(OutputError::Malformed(e)) => {
                ApiError::MalformedOutput(e.to_string())
            }
            GenerationError::Output(OutputError::SchemaMismatch(v)) => ApiError::SchemaMismatch(v),
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError::GenerationService(err.to_string())
    }
}

impl From<TrackerError> for ApiError {
    fn from(err: TrackerError) -> Self {
        match err {
            e @ TrackerError::NotConfigured { .. } => ApiError::TrackerNotConfigured(e.to_string()),
            TrackerError::NotFound(id) => ApiError::NotFound(format!("Issue {} not found", id)),
            e => ApiError::Tracker(e),
        }
    }
}

#[cfg(test)]
mod tests;
