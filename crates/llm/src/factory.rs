//! LLM client factory.
//!
//! Builds the configured client from [`LlmSettings`].

use crate::client::LlmClient;
use crate::providers::OllamaClient;
use refchat_core::config::LlmSettings;
use refchat_core::{AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client for the configured provider.
///
/// # Errors
/// Returns a configuration error if the provider is unknown or the HTTP
/// client cannot be built.
pub fn create_client(settings: &LlmSettings) -> AppResult<Arc<dyn LlmClient>> {
    match settings.provider.to_lowercase().as_str() {
        "ollama" => {
            let client = match settings.timeout {
                Some(secs) => OllamaClient::with_timeout(&settings.endpoint, secs)?,
                None => OllamaClient::with_base_url(&settings.endpoint),
            };
            tracing::debug!("Created Ollama client for {}", settings.endpoint);
            Ok(Arc::new(client))
        }
        _ => Err(AppError::Config(format!(
            "Unknown provider: {}",
            settings.provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let client = create_client(&LlmSettings::default()).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_ollama_with_timeout() {
        let settings = LlmSettings {
            endpoint: "http://localhost:8080".to_string(),
            timeout: Some(5),
            ..LlmSettings::default()
        };
        assert!(create_client(&settings).is_ok());
    }

    #[test]
    fn test_unknown_provider() {
        let settings = LlmSettings {
            provider: "unknown".to_string(),
            ..LlmSettings::default()
        };
        match create_client(&settings) {
            Err(err) => assert!(err.to_string().contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
