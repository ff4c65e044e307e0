//! Turns the model's raw text into a trusted [`GenerationResponse`].

use serde_json::Value;

use crate::gateway::Completion;
use crate::models::GenerationResponse;
use crate::schema::{self, Violations};

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// The text is not JSON at all.
    #[error("model output is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    /// Parseable JSON that does not satisfy the response contract.
    #[error("model output does not match the response schema: {0}")]
    SchemaMismatch(Violations),
}

/// Strictly parse `raw` as JSON, then check it against the response shape.
pub fn parse_model_output(raw: &str) -> Result<GenerationResponse, OutputError> {
    let value: Value = serde_json::from_str(raw).map_err(OutputError::Malformed)?;
    schema::validate_response(&value).map_err(OutputError::SchemaMismatch)
}

/// Overlay the gateway's metadata; whatever the model claimed for these
/// fields is discarded.
pub fn attach_metadata(response: GenerationResponse, completion: &Completion) -> GenerationResponse {
    GenerationResponse {
        model: Some(completion.model.clone()),
        prompt_tokens: completion.prompt_tokens,
        completion_tokens: completion.completion_tokens,
        ..response
    }
}
