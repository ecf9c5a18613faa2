//! OpenRouter backend built on a `rig` agent.
//!
//! OpenRouter has no portable structured-output switch, so the schema is
//! appended to the prompt as an instruction and the gateway's JSON parsing
//! does the rest. Search is requested with the `:online` model variant.

use async_trait::async_trait;
use rig::{client::CompletionClient, completion::Prompt, providers::openrouter};
use tracing::debug;

use crate::{
    error::ProviderError,
    gateway::{CompletionGateway, GenerationRequest},
};

pub const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-001";

const PREAMBLE: &str = "You are a clinical decision-support assistant working for a council of physicians. \
Be precise, use standard medical terminology and follow the requested output format exactly.";

const ONLINE_SUFFIX: &str = ":online";

pub struct OpenRouterClient {
    client: openrouter::Client,
}

impl OpenRouterClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: openrouter::Client::new(api_key),
        }
    }
}

/// Prompt text with the output contract spelled out when a schema is present.
pub fn compose_prompt(request: &GenerationRequest) -> String {
    match &request.schema {
        Some(schema) => {
            let schema_pretty =
                serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
            format!(
                "{}\n\nRespond **only** with JSON that conforms to this JSON Schema. \
                 Do not add comments, Markdown or any other text.\n{}",
                request.prompt.trim_end(),
                schema_pretty
            )
        }
        None => request.prompt.clone(),
    }
}

pub fn model_slug(request: &GenerationRequest) -> String {
    if request.use_search && !request.model.ends_with(ONLINE_SUFFIX) {
        format!("{}{}", request.model, ONLINE_SUFFIX)
    } else {
        request.model.clone()
    }
}

#[async_trait]
impl CompletionGateway for OpenRouterClient {
    fn provider(&self) -> &str {
        "openrouter"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let model = model_slug(request);
        debug!(model = %model, structured = request.schema.is_some(), "Calling OpenRouter");

        let agent = self.client.agent(&model).preamble(PREAMBLE).build();
        let prompt = compose_prompt(request);

        agent
            .prompt(&prompt)
            .await
            .map_err(|e| ProviderError::new(format!("OpenRouter completion failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(schema: Option<serde_json::Value>, use_search: bool) -> GenerationRequest {
        GenerationRequest {
            prompt: "Check interactions".into(),
            model: DEFAULT_MODEL.into(),
            schema,
            use_search,
        }
    }

    #[test]
    fn schema_is_appended_as_instruction() {
        let prompt = compose_prompt(&request(Some(json!({"type": "object"})), false));
        assert!(prompt.starts_with("Check interactions"));
        assert!(prompt.contains("JSON Schema"));
        assert!(prompt.contains("\"type\": \"object\""));
    }

    #[test]
    fn plain_prompt_is_unchanged() {
        assert_eq!(compose_prompt(&request(None, false)), "Check interactions");
    }

    #[test]
    fn search_selects_online_variant_once() {
        assert_eq!(model_slug(&request(None, false)), DEFAULT_MODEL);
        let online = model_slug(&request(None, true));
        assert_eq!(online, format!("{DEFAULT_MODEL}:online"));

        let mut already = request(None, true);
        already.model = online.clone();
        assert_eq!(model_slug(&already), online);
    }
}
