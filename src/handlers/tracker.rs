// ---------------------------------------------------------------------------
// handlers/tracker.rs - POST /api/jira/fetch
// ---------------------------------------------------------------------------

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;
use crate::tracker::TrackerIssue;

use super::{ApiError, ErrorBody};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FetchIssueRequest {
    #[serde(default)]
    pub issue_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FetchIssueResponse {
    pub issue: TrackerIssue,
}

#[utoipa::path(post, path = "/api/jira/fetch", tag = "tracker",
    request_body = FetchIssueRequest,
    responses(
        (status = 200, description = "Story fields scraped from the issue", body = FetchIssueResponse),
        (status = 400, description = "Missing issue id", body = ErrorBody),
        (status = 404, description = "Issue not found", body = ErrorBody),
        (status = 502, description = "Tracker rejected the credentials or failed", body = ErrorBody),
        (status = 503, description = "Tracker not configured on the server", body = ErrorBody)
    )
)]
pub async fn fetch_issue(
    State(state): State<AppState>,
    payload: Result<Json<FetchIssueRequest>, JsonRejection>,
) -> Result<Json<FetchIssueResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let issue_id = req.issue_id.trim();
    if issue_id.is_empty() {
        return Err(ApiError::BadRequest("Invalid request: issueId is required".into()));
    }

    let issue = state.tracker.fetch_issue(issue_id).await?;
    Ok(Json(FetchIssueResponse { issue }))
}
