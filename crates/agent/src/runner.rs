//! Renders a prompt and sends it to the model.

use refchat_core::AppResult;
use refchat_llm::{LlmClient, LlmRequest};
use refchat_prompt::{build_prompt, PromptDefinition};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// One model, one call per prompt.
#[derive(Clone)]
pub struct PromptRunner {
    client: Arc<dyn LlmClient>,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl PromptRunner {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Sampling options sent with every request; `None` keeps the server default.
    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Render `definition` with `variables` and return the model's raw text.
    ///
    /// Each call gets a fresh run id on its tracing span.
    pub async fn run(
        &self,
        stage: &'static str,
        definition: &PromptDefinition,
        variables: &[(&str, &str)],
    ) -> AppResult<String> {
        let variables: HashMap<String, String> = variables
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let built = build_prompt(definition, variables)?;

        let mut request = LlmRequest::new(built.user, &self.model);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let run_id = Uuid::new_v4();
        let span = tracing::debug_span!("llm_call", stage, %run_id, prompt = %definition.id);

        let response = self.client.complete(&request).instrument(span).await?;
        tracing::debug!(stage, %run_id, "Model output: {}", response.content);

        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refchat_llm::MockLlmClient;
    use refchat_prompt::PromptSet;

    #[tokio::test]
    async fn test_run_renders_and_returns_raw_text() {
        let client = Arc::new(MockLlmClient::with_replies(["  raw reply \n"]));
        let runner = PromptRunner::new(client.clone(), "mistral");
        let prompts = PromptSet::builtin().unwrap();

        let out = runner
            .run(
                "draft",
                &prompts.draft,
                &[("query", "Plan a trip"), ("chat_history", "user: hi")],
            )
            .await
            .unwrap();

        assert_eq!(out, "  raw reply \n");
        let sent = client.prompts();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("Query: Plan a trip"));
        assert!(sent[0].contains("Chat History: user: hi"));
    }

    #[tokio::test]
    async fn test_sampling_options_reach_client() {
        let client = Arc::new(MockLlmClient::with_replies(["ok", "ok"]));
        let prompts = PromptSet::builtin().unwrap();
        let vars = [("query", "q"), ("chat_history", "")];

        PromptRunner::new(client.clone(), "mistral")
            .run("draft", &prompts.draft, &vars)
            .await
            .unwrap();
        PromptRunner::new(client.clone(), "mistral")
            .with_sampling(Some(0.2), Some(512))
            .run("draft", &prompts.draft, &vars)
            .await
            .unwrap();

        let requests = client.requests();
        assert_eq!(requests[0].temperature, None);
        assert_eq!(requests[0].max_tokens, None);
        assert_eq!(requests[1].temperature, Some(0.2));
        assert_eq!(requests[1].max_tokens, Some(512));
    }

    #[tokio::test]
    async fn test_missing_variable_fails_before_model_call() {
        let client = Arc::new(MockLlmClient::with_replies(["unused"]));
        let runner = PromptRunner::new(client.clone(), "mistral");
        let prompts = PromptSet::builtin().unwrap();

        let result = runner.run("draft", &prompts.draft, &[("query", "q")]).await;
        assert!(result.is_err());
        assert_eq!(client.call_count(), 0);
    }
}
