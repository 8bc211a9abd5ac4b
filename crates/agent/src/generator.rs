//! Answer drafting.

use crate::runner::PromptRunner;
use refchat_core::AppResult;
use refchat_prompt::PromptDefinition;

/// Drafts a markdown answer from a query and the conversation so far.
#[derive(Clone)]
pub struct AnswerGenerator {
    runner: PromptRunner,
    prompt: PromptDefinition,
}

impl AnswerGenerator {
    pub fn new(runner: PromptRunner, prompt: PromptDefinition) -> Self {
        Self { runner, prompt }
    }

    /// One model call; returns the model's text unchanged.
    pub async fn draft(&self, query: &str, chat_history: &str) -> AppResult<String> {
        tracing::debug!("Drafting answer for query: {}", query);
        self.runner
            .run(
                "draft",
                &self.prompt,
                &[("query", query), ("chat_history", chat_history)],
            )
            .await
    }
}
