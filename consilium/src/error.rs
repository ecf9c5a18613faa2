use thiserror::Error;

/// Caller-facing failure of an AI operation.
///
/// The variants carry no provider text. The raw diagnostic is
/// logged where the failure is classified and never leaves the process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AiError {
    /// Provider reported a quota or rate-limit condition. Safe to retry later.
    #[error("AI service rate limit exceeded. Please try again later.")]
    RateLimited,

    /// The request or the provider's structured output could not be used.
    #[error("Invalid request format. Please check your input.")]
    InvalidRequest,

    /// Any other provider or transport failure.
    #[error("AI service temporarily unavailable. Please try again later.")]
    Unavailable,
}

impl AiError {
    /// Classify a raw provider failure message.
    ///
    /// Matching is case-insensitive and rate-limit wording wins over
    /// invalid-request wording when both appear.
    pub fn classify(message: &str) -> Self {
        let lowered = message.to_lowercase();
        if lowered.contains("quota") || lowered.contains("rate limit") {
            AiError::RateLimited
        } else if lowered.contains("invalid") || lowered.contains("malformed") {
            AiError::InvalidRequest
        } else {
            AiError::Unavailable
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, AiError::RateLimited)
    }
}

/// Error raised by a provider backend before classification.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct ProviderError {
    pub message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AiError>;
