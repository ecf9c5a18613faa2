//! Consilium: the AI pipeline behind the consultation service.
//!
//! Each operation builds a prompt ([`prompts`]) with a fixed output schema
//! ([`schema`]), sends it through the [`AiGateway`] to the configured provider
//! ([`gemini`] or [`openrouter`]) and shapes the parsed reply ([`normalize`]).
//! [`ConsultationService`] strings the three stages together.

pub mod catalog;
pub mod error;
pub mod gateway;
pub mod gemini;
pub mod language;
pub mod mock;
pub mod models;
pub mod normalize;
pub mod openrouter;
pub mod prompts;
pub mod schema;
pub mod service;

// Re-export commonly used types
pub use error::{AiError, ProviderError, Result};
pub use gateway::{AiGateway, CompletionGateway, GatewayOutput, GenerationRequest};
pub use gemini::GeminiClient;
pub use language::Language;
pub use models::*;
pub use openrouter::OpenRouterClient;
pub use schema::Operation;
pub use service::ConsultationService;
