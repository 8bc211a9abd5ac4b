//! Ollama LLM provider implementation.
//!
//! Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use refchat_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Ollama `/api/generate` request body.
#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
    stream: bool,
}

#[derive(Debug, Serialize, PartialEq)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Ollama `/api/generate` response body (non-streaming).
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    model: String,
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Ollama LLM client.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a client for the default local server.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client for a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.into()),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client whose requests time out after `secs` seconds.
    pub fn with_timeout(base_url: impl Into<String>, secs: u64) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: normalize_base_url(base_url.into()),
            client,
        })
    }

    fn to_generate_request(&self, request: &LlmRequest) -> GenerateRequest {
        let options = if request.temperature.is_some() || request.max_tokens.is_some() {
            Some(GenerateOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            })
        } else {
            None
        };

        GenerateRequest {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            system: request.system.clone(),
            options,
            stream: false,
        }
    }

    fn convert_response(response: GenerateResponse) -> LlmResponse {
        LlmResponse {
            content: response.response,
            model: response.model,
            usage: LlmUsage::new(
                response.prompt_eval_count.unwrap_or(0),
                response.eval_count.unwrap_or(0),
            ),
        }
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!(model = %request.model, "Sending completion request to Ollama");

        let body = self.to_generate_request(request);
        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Ollama response: {}", e)))?;

        tracing::debug!(
            prompt_tokens = generated.prompt_eval_count.unwrap_or(0),
            completion_tokens = generated.eval_count.unwrap_or(0),
            "Received completion from Ollama"
        );

        Ok(Self::convert_response(generated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_client_creation() {
        let client = OllamaClient::new();
        assert_eq!(client.provider_name(), "ollama");
        assert_eq!(client.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = OllamaClient::with_base_url("http://10.0.0.5:11434/");
        assert_eq!(client.base_url, "http://10.0.0.5:11434");
    }

    #[test]
    fn test_generate_request_conversion() {
        let client = OllamaClient::new();
        let request = LlmRequest::new("Hello", "mistral")
            .with_temperature(0.7)
            .with_max_tokens(100);

        let body = client.to_generate_request(&request);
        assert_eq!(body.model, "mistral");
        assert_eq!(body.prompt, "Hello");
        assert!(!body.stream);
        assert_eq!(
            body.options,
            Some(GenerateOptions {
                temperature: Some(0.7),
                num_predict: Some(100),
            })
        );
    }

    #[test]
    fn test_generate_request_without_options() {
        let client = OllamaClient::new();
        let body = client.to_generate_request(&LlmRequest::new("Hello", "mistral"));
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("options").is_none());
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_convert_response() {
        let raw = r#"{"model":"mistral","response":"Paris.","done":true,"prompt_eval_count":8,"eval_count":3}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        let response = OllamaClient::convert_response(parsed);
        assert_eq!(response.content, "Paris.");
        assert_eq!(response.usage, LlmUsage::new(8, 3));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_llm_error() {
        let client = OllamaClient::with_timeout("http://127.0.0.1:9", 2).unwrap();
        let result = client.complete(&LlmRequest::new("hi", "mistral")).await;
        assert!(matches!(result, Err(AppError::Llm(_))));
    }
}
