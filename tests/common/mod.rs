// Shared fakes and request helpers for the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures_util::future::BoxFuture;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use storytests_backend::gateway::{Completion, GatewayError, ModelGateway};
use storytests_backend::state::AppState;
use storytests_backend::tracker::{IssueTracker, TrackerError, TrackerIssue};

pub const MANUAL_REPLY: &str = r#"{
  "cases": [
    {
      "id": "TC-001",
      "title": "Valid credentials log the user in",
      "format": "Manual",
      "steps": ["Open the login page", "Enter a valid email and password", "Press Sign in"],
      "testData": "email=ana@example.com",
      "expectedResult": "The dashboard is shown",
      "category": "Positive"
    }
  ]
}"#;

/// Gateway answering with fixed content (or a fixed failure), recording
/// every user prompt it receives.
pub struct FakeGateway {
    reply: Result<String, u16>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeGateway {
    pub fn replying(content: &str) -> Arc<Self> {
        Arc::new(Self { reply: Ok(content.to_string()), prompts: Mutex::new(Vec::new()) })
    }

    pub fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self { reply: Err(status), prompts: Mutex::new(Vec::new()) })
    }
}

impl ModelGateway for FakeGateway {
    fn complete<'a>(
        &'a self,
        _system: &'a str,
        user: &'a str,
    ) -> BoxFuture<'a, Result<Completion, GatewayError>> {
        self.prompts.lock().unwrap().push(user.to_string());
        let result = match &self.reply {
            Ok(content) => Ok(Completion {
                content: content.clone(),
                model: "fake-model".into(),
                prompt_tokens: 42,
                completion_tokens: 7,
            }),
            Err(status) => Err(GatewayError::Status {
                status: *status,
                body: "upstream refused".into(),
            }),
        };
        Box::pin(async move { result })
    }
}

/// Tracker behaviours the handlers care about.
pub enum FakeTracker {
    Unconfigured,
    Down,
    Issue(TrackerIssue),
}

impl IssueTracker for FakeTracker {
    fn fetch_issue<'a>(
        &'a self,
        issue_id: &'a str,
    ) -> BoxFuture<'a, Result<TrackerIssue, TrackerError>> {
        let result = match self {
            FakeTracker::Unconfigured => Err(TrackerError::NotConfigured {
                missing: vec!["JIRA_BASE_URL", "JIRA_EMAIL", "JIRA_API_TOKEN"],
            }),
            FakeTracker::Down => Err(TrackerError::Timeout(10)),
            FakeTracker::Issue(issue) if issue_id == "PROJ-1" => Ok(issue.clone()),
            FakeTracker::Issue(_) => Err(TrackerError::NotFound(issue_id.to_string())),
        };
        Box::pin(async move { result })
    }

    fn is_configured(&self) -> bool {
        !matches!(self, FakeTracker::Unconfigured)
    }
}

pub fn app(gateway: Arc<FakeGateway>, tracker: FakeTracker) -> axum::Router {
    let state = AppState::with_collaborators(gateway, Arc::new(tracker));
    storytests_backend::create_router(state)
}

pub async fn post_json(app: axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

/// Collect a response body into a `serde_json::Value`.
pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
