//! Issue-tracker (Jira Cloud REST v3) client.
//!
//! Only one read is supported: fetch an issue and scrape a story title,
//! a plain-text description, and a best-effort acceptance-criteria section.

use std::sync::OnceLock;

use futures_util::future::BoxFuture;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::config::{JiraSettings, TrackerConfig};

/// Story fields scraped from an issue.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackerIssue {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acceptance_criteria: Option<String>,
    /// The issue exactly as the tracker returned it.
    #[schema(value_type = Object)]
    pub raw: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("issue tracker is not configured on the server (missing {})", .missing.join(", "))]
    NotConfigured { missing: Vec<&'static str> },

    #[error("issue {0} not found")]
    NotFound(String),

    #[error("unauthorized when contacting the issue tracker; check credentials")]
    Unauthorized,

    #[error("issue tracker returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("issue tracker timed out after {0}s")]
    Timeout(u64),

    #[error("issue tracker request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("issue tracker response could not be decoded: {0}")]
    Decode(String),
}

pub trait IssueTracker: Send + Sync {
    fn fetch_issue<'a>(&'a self, issue_id: &'a str) -> BoxFuture<'a, Result<TrackerIssue, TrackerError>>;

    fn is_configured(&self) -> bool;
}

// ── Jira client ─────────────────────────────────────────────────────────────

pub struct JiraClient {
    client: reqwest::Client,
    config: TrackerConfig,
}

impl JiraClient {
    pub fn new(client: reqwest::Client, config: TrackerConfig) -> Self {
        Self { client, config }
    }

    async fn fetch(&self, issue_id: &str) -> Result<TrackerIssue, TrackerError> {
        let settings = match &self.config {
            TrackerConfig::Configured(s) => s,
            TrackerConfig::Missing(missing) => {
                return Err(TrackerError::NotConfigured { missing: missing.clone() });
            }
        };

        let url = issue_url(settings, issue_id);
        let timeout_secs = settings.timeout.as_secs();
        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                TrackerError::Timeout(timeout_secs)
            } else {
                TrackerError::Transport(e)
            }
        };

        tracing::debug!(issue = %issue_id, "tracker: fetching issue");
        let resp = self
            .client
            .get(url)
            .basic_auth(&settings.email, Some(&settings.api_token))
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(settings.timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = resp.status();
        match status.as_u16() {
            404 => return Err(TrackerError::NotFound(issue_id.to_string())),
            401 | 403 => return Err(TrackerError::Unauthorized),
            _ => {}
        }
        let text = resp.text().await.map_err(classify)?;
        if !status.is_success() {
            let excerpt: String = text.chars().take(300).collect();
            return Err(TrackerError::Status { status: status.as_u16(), body: excerpt });
        }

        let raw: Value =
            serde_json::from_str(&text).map_err(|e| TrackerError::Decode(e.to_string()))?;
        Ok(extract_issue(raw))
    }
}

impl IssueTracker for JiraClient {
    fn fetch_issue<'a>(&'a self, issue_id: &'a str) -> BoxFuture<'a, Result<TrackerIssue, TrackerError>> {
        Box::pin(self.fetch(issue_id))
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }
}

/// `{base}/rest/api/3/issue/{id}`, with the id escaped as one path segment.
fn issue_url(settings: &JiraSettings, issue_id: &str) -> url::Url {
    let mut url = settings.base_url.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments
            .pop_if_empty()
            .extend(["rest", "api", "3", "issue", issue_id.trim()]);
    }
    url
}

// ── Field extraction ────────────────────────────────────────────────────────

/// Scrape story fields out of a raw issue payload.
pub fn extract_issue(raw: Value) -> TrackerIssue {
    let fields = &raw["fields"];
    let title = fields["summary"].as_str().unwrap_or_default().to_string();

    let description = match &fields["description"] {
        Value::String(s) => s.clone(),
        Value::Object(_) => fields["description"]["content"]
            .as_array()
            .map(|blocks| blocks.iter().map(document_text).collect::<Vec<_>>().join("\n"))
            .unwrap_or_default(),
        _ => String::new(),
    };
    let acceptance_criteria = acceptance_criteria(&description);

    TrackerIssue {
        title,
        description,
        acceptance_criteria,
        raw,
    }
}

/// Concatenate every text leaf of a rich-document node, in document order.
pub fn document_text(node: &Value) -> String {
    if node["type"] == "text" {
        return node["text"].as_str().unwrap_or_default().to_string();
    }
    match node["content"].as_array() {
        Some(children) => children.iter().map(document_text).collect(),
        None => String::new(),
    }
}

fn acceptance_label() -> &'static Regex {
    static LABEL_RE: OnceLock<Regex> = OnceLock::new();
    LABEL_RE.get_or_init(|| {
        Regex::new(r"(?is)acceptance criteria[:\-\s]*(.+)").expect("acceptance criteria regex")
    })
}

/// Everything after the first "Acceptance Criteria" label, trimmed.
pub fn acceptance_criteria(description: &str) -> Option<String> {
    acceptance_label()
        .captures(description)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}
