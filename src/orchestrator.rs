//! One generation cycle: validate → enrich from tracker → prompt → model →
//! validate output → attach metadata.
//!
//! Nothing here is shared between requests. The only fault-tolerant step is
//! tracker enrichment; every other failure ends the request.

use serde_json::Value;

use crate::gateway::{GatewayError, ModelGateway};
use crate::models::{GenerationRequest, GenerationResponse};
use crate::prompt;
use crate::schema::{self, Violations};
use crate::tracker::{IssueTracker, TrackerError, TrackerIssue};
use crate::validator::{self, OutputError};

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("invalid generation request: {0}")]
    InvalidRequest(Violations),

    #[error(transparent)]
    Service(#[from] GatewayError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Result of the tracker step. A tracker failure is carried here, not raised.
#[derive(Debug)]
pub struct Enrichment {
    pub request: GenerationRequest,
    pub tracker_error: Option<TrackerError>,
}

/// Fill empty story fields from an issue; fields the caller supplied win.
pub fn merge_issue(request: &GenerationRequest, issue: &TrackerIssue) -> GenerationRequest {
    fn pick(current: &str, fetched: Option<&str>) -> String {
        match fetched {
            Some(f) if current.trim().is_empty() && !f.trim().is_empty() => f.to_string(),
            _ => current.to_string(),
        }
    }

    let description = request.description.as_deref().unwrap_or_default();
    let description = pick(description, Some(issue.description.as_str()));

    GenerationRequest {
        story_title: pick(&request.story_title, Some(issue.title.as_str())),
        acceptance_criteria: pick(
            &request.acceptance_criteria,
            issue.acceptance_criteria.as_deref(),
        ),
        description: (!description.is_empty()).then_some(description),
        ..request.clone()
    }
}

/// Best-effort tracker lookup. Never fails: errors are returned alongside the
/// unchanged request for the caller to log and drop.
pub async fn enrich(request: GenerationRequest, tracker: &dyn IssueTracker) -> Enrichment {
    let Some(issue_id) = request
        .issue_tracker_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
    else {
        return Enrichment { request, tracker_error: None };
    };

    match tracker.fetch_issue(issue_id).await {
        Ok(issue) => {
            tracing::info!(issue = %issue_id, "tracker: merged issue fields into request");
            Enrichment {
                request: merge_issue(&request, &issue),
                tracker_error: None,
            }
        }
        Err(e) => Enrichment { request, tracker_error: Some(e) },
    }
}

/// Run the full pipeline on an untyped request body.
pub async fn generate(
    body: &Value,
    gateway: &dyn ModelGateway,
    tracker: &dyn IssueTracker,
) -> Result<GenerationResponse, GenerationError> {
    let request = schema::validate_request(body).map_err(GenerationError::InvalidRequest)?;

    let Enrichment { request, tracker_error } = enrich(request, tracker).await;
    if let Some(e) = tracker_error {
        tracing::warn!("tracker: continuing without issue data: {}", e);
    }

    generate_for(&request, gateway).await
}

/// Steps 3–6 for an already validated request.
pub async fn generate_for(
    request: &GenerationRequest,
    gateway: &dyn ModelGateway,
) -> Result<GenerationResponse, GenerationError> {
    let prompt = prompt::build_prompt(request);
    tracing::debug!(
        format = %request.format,
        categories = %prompt::category_list(request),
        user_chars = prompt.user.len(),
        "prompt built"
    );

    let completion = gateway.complete(&prompt.system, &prompt.user).await?;
    let parsed = validator::parse_model_output(&completion.content)?;
    let response = validator::attach_metadata(parsed, &completion);

    tracing::info!(
        model = %completion.model,
        cases = response.cases.len(),
        prompt_tokens = response.prompt_tokens,
        completion_tokens = response.completion_tokens,
        "generation complete"
    );
    Ok(response)
}
