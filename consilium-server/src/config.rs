use anyhow::{Context, bail};
use consilium::{AiGateway, CompletionGateway, GeminiClient, OpenRouterClient, gemini, openrouter};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    Gemini,
    OpenRouter,
}

impl AiProvider {
    pub fn parse(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "" | "gemini" => Ok(AiProvider::Gemini),
            "openrouter" => Ok(AiProvider::OpenRouter),
            other => bail!("Unknown AI_PROVIDER '{}' (expected gemini or openrouter)", other),
        }
    }
}

/// Configuration for the consultation service, read once at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub provider: AiProvider,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub openrouter_api_key: Option<String>,
    pub openrouter_model: String,
    pub database_url: Option<String>,
    pub port: u16,
}

impl ServiceConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let provider = AiProvider::parse(&get("AI_PROVIDER").unwrap_or_default())?;
        let port = match get("PORT") {
            Some(port) => port
                .parse::<u16>()
                .with_context(|| format!("PORT must be a port number, got '{}'", port))?,
            None => 3000,
        };

        Ok(Self {
            provider,
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string()),
            gemini_base_url: get("GEMINI_BASE_URL")
                .unwrap_or_else(|| gemini::DEFAULT_BASE_URL.to_string()),
            openrouter_api_key: get("OPENROUTER_API_KEY"),
            openrouter_model: get("OPENROUTER_MODEL")
                .unwrap_or_else(|| openrouter::DEFAULT_MODEL.to_string()),
            database_url: get("DATABASE_URL"),
            port,
        })
    }

    /// Provider client for the selected backend. Fails when its key is missing.
    pub fn build_gateway(&self) -> anyhow::Result<AiGateway> {
        match self.provider {
            AiProvider::Gemini => {
                let key = self
                    .gemini_api_key
                    .as_deref()
                    .context("GEMINI_API_KEY environment variable is required")?;
                let backend: Arc<dyn CompletionGateway> =
                    Arc::new(GeminiClient::with_base_url(key, self.gemini_base_url.as_str()));
                Ok(AiGateway::new(backend, self.gemini_model.as_str()))
            }
            AiProvider::OpenRouter => {
                let key = self
                    .openrouter_api_key
                    .as_deref()
                    .context("OPENROUTER_API_KEY environment variable is required")?;
                let backend: Arc<dyn CompletionGateway> = Arc::new(OpenRouterClient::new(key));
                Ok(AiGateway::new(backend, self.openrouter_model.as_str()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> anyhow::Result<ServiceConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.provider, AiProvider::Gemini);
        assert_eq!(config.gemini_model, "gemini-2.0-flash-exp");
        assert_eq!(config.port, 3000);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn provider_and_overrides() {
        let config = config(&[
            ("AI_PROVIDER", "OpenRouter"),
            ("OPENROUTER_API_KEY", "or-key"),
            ("PORT", "8080"),
            ("DATABASE_URL", ""),
        ])
        .unwrap();
        assert_eq!(config.provider, AiProvider::OpenRouter);
        assert_eq!(config.port, 8080);
        assert!(config.database_url.is_none());
        let gateway = config.build_gateway().unwrap();
        assert_eq!(gateway.provider(), "openrouter");
    }

    #[test]
    fn unknown_provider_and_bad_port_fail() {
        assert!(config(&[("AI_PROVIDER", "watson")]).is_err());
        assert!(config(&[("AI_PROVIDER", "scripted")]).is_err());
        assert!(config(&[("PORT", "http")]).is_err());
    }

    #[test]
    fn missing_key_aborts_gateway_construction() {
        let err = config(&[]).unwrap().build_gateway().unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn gemini_gateway_uses_configured_model() {
        let gateway = config(&[("GEMINI_API_KEY", "g-key"), ("GEMINI_MODEL", "gemini-2.5-pro")])
            .unwrap()
            .build_gateway()
            .unwrap();
        assert_eq!(gateway.provider(), "gemini");
        assert_eq!(gateway.default_model(), "gemini-2.5-pro");
    }
}
