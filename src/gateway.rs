//! Generation-service gateway.
//!
//! A thin conduit to an OpenAI-compatible chat-completions endpoint (Groq by
//! default). It sends the system and user messages, asks for JSON output, and
//! hands back the first choice's content verbatim together with the reported
//! model and token usage. No retries, no JSON interpretation of the content.

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::config::GroqSettings;

const TEMPERATURE: f32 = 0.2;
const MAX_COMPLETION_TOKENS: u32 = 4096;

/// Raw completion plus the metadata the service reported for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub model: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// Every way a generation call can fail. All of these surface to callers as a
/// single "generation-service failure" category.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("generation service is not configured (GROQ_API_KEY is not set)")]
    NotConfigured,

    #[error("generation service timed out after {0}s")]
    Timeout(u64),

    #[error("generation service request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("generation service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("generation service response could not be decoded: {0}")]
    Decode(String),

    #[error("generation service response has no message content")]
    MissingContent,
}

/// Seam between the orchestrator and the hosted model.
pub trait ModelGateway: Send + Sync {
    fn complete<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
    ) -> BoxFuture<'a, Result<Completion, GatewayError>>;

    /// Whether a credential is present. Used by health reporting only.
    fn is_configured(&self) -> bool {
        true
    }
}

// ── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

// ── Groq client ─────────────────────────────────────────────────────────────

pub struct GroqGateway {
    client: reqwest::Client,
    settings: GroqSettings,
}

impl GroqGateway {
    pub fn new(client: reqwest::Client, settings: GroqSettings) -> Self {
        Self { client, settings }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.as_str().trim_end_matches('/')
        )
    }

    async fn call(&self, system: &str, user: &str) -> Result<Completion, GatewayError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(GatewayError::NotConfigured)?;

        let body = ChatRequest {
            model: &self.settings.model,
            messages: [
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_COMPLETION_TOKENS,
            response_format: ResponseFormat { format_type: "json_object" },
        };

        tracing::debug!(
            model = %self.settings.model,
            system_chars = system.len(),
            user_chars = user.len(),
            "gateway: sending chat completion"
        );

        let timeout = self.settings.timeout;
        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(e, timeout.as_secs()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| classify(e, timeout.as_secs()))?;

        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body: truncate(&text, 500).to_string(),
            });
        }

        decode(&text, &self.settings.model)
    }
}

impl ModelGateway for GroqGateway {
    fn complete<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
    ) -> BoxFuture<'a, Result<Completion, GatewayError>> {
        Box::pin(self.call(system, user))
    }

    fn is_configured(&self) -> bool {
        self.settings.api_key.is_some()
    }
}

fn classify(err: reqwest::Error, timeout_secs: u64) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout(timeout_secs)
    } else {
        GatewayError::Transport(err)
    }
}

/// Pull the first choice and usage out of a chat-completions body.
fn decode(text: &str, fallback_model: &str) -> Result<Completion, GatewayError> {
    let parsed: ChatResponse =
        serde_json::from_str(text).map_err(|e| GatewayError::Decode(e.to_string()))?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or(GatewayError::MissingContent)?;
    let usage = parsed.usage.unwrap_or_default();

    Ok(Completion {
        content,
        model: parsed
            .model
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback_model.to_string()),
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
    })
}

/// Safe UTF-8 truncation to at most `max` bytes.
fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
