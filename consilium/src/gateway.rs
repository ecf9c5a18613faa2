use async_trait::async_trait;
use serde_json::Value;
use std::{fmt, sync::Arc};
use tracing::{debug, error};

use crate::{
    error::{AiError, ProviderError, Result},
    prompts::PromptSpec,
};

/// A single request to a generative-AI provider.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: String,
    /// When present the provider is asked for JSON conforming to this schema.
    pub schema: Option<Value>,
    /// Let the provider ground its answer with live search results.
    pub use_search: bool,
}

/// Provider backend. Implementations perform exactly one outbound call per
/// `generate` and return the raw generated text.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Short provider name used in logs.
    fn provider(&self) -> &str;

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<String, ProviderError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayOutput {
    Text(String),
    Structured(Value),
}

/// Front door to the configured provider: classifies failures and parses
/// structured output. No retries, no timeout override.
#[derive(Clone)]
pub struct AiGateway {
    backend: Arc<dyn CompletionGateway>,
    default_model: String,
}

impl fmt::Debug for AiGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiGateway")
            .field("provider", &self.provider())
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl AiGateway {
    pub fn new(backend: Arc<dyn CompletionGateway>, default_model: impl Into<String>) -> Self {
        Self {
            backend,
            default_model: default_model.into(),
        }
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn provider(&self) -> &str {
        self.backend.provider()
    }

    /// Issue one provider call. Returns parsed JSON when `schema` is given and
    /// raw text otherwise.
    pub async fn call(
        &self,
        prompt: &str,
        model: Option<&str>,
        schema: Option<&Value>,
        use_search: bool,
    ) -> Result<GatewayOutput> {
        let request = GenerationRequest {
            prompt: prompt.to_string(),
            model: model.unwrap_or(&self.default_model).to_string(),
            schema: schema.cloned(),
            use_search,
        };

        let text = self.backend.generate(&request).await.map_err(|e| {
            let classified = AiError::classify(&e.message);
            error!(
                provider = %self.backend.provider(),
                model = %request.model,
                error = %e,
                classified = ?classified,
                "AI provider call failed"
            );
            classified
        })?;

        if request.schema.is_some() {
            parse_structured(&text).map(GatewayOutput::Structured)
        } else {
            Ok(GatewayOutput::Text(text))
        }
    }

    /// Send a built prompt in structured output mode with the default model.
    pub async fn call_structured(&self, spec: &PromptSpec) -> Result<Value> {
        debug!(operation = spec.operation.name(), "Sending structured prompt");
        match self.call(&spec.text, None, Some(&spec.schema), false).await? {
            GatewayOutput::Structured(value) => Ok(value),
            GatewayOutput::Text(text) => parse_structured(&text),
        }
    }
}

/// Remove a leading ```` ```json ```` fence and a trailing ```` ``` ```` fence.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_prefix("```json").unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix("```").unwrap_or(trimmed);
    trimmed.trim()
}

/// Parse provider text as JSON after fence stripping. A parse failure is a
/// bad-input condition.
pub fn parse_structured(text: &str) -> Result<Value> {
    let cleaned = strip_code_fences(text);
    serde_json::from_str(cleaned).map_err(|e| {
        error!(error = %e, response = %cleaned, "Received invalid JSON from AI provider");
        AiError::InvalidRequest
    })
}
