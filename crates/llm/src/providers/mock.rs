//! Scripted LLM client for tests and offline development.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use refchat_core::{AppError, AppResult};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A client that replays a fixed script of replies in order.
///
/// Every request it receives is recorded so tests can assert on what the
/// pipeline sent. Once the script runs out, calls fail with an
/// [`AppError::Llm`].
#[derive(Debug, Default)]
pub struct MockLlmClient {
    script: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client that answers with each reply in turn.
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let client = Self::new();
        for reply in replies {
            client.push_reply(reply);
        }
        client
    }

    /// Queue a successful reply.
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.lock_script().push_back(Ok(reply.into()));
    }

    /// Queue a failure; the call returns `AppError::Llm(message)`.
    pub fn push_error(&self, message: impl Into<String>) {
        self.lock_script().push_back(Err(message.into()));
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Prompt text of each request, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.prompt).collect()
    }

    /// Number of completion calls made.
    pub fn call_count(&self) -> usize {
        self.requests().len()
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, String>>> {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl LlmClient for MockLlmClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());

        let next = self.lock_script().pop_front();
        match next {
            Some(Ok(content)) => Ok(LlmResponse {
                content,
                model: request.model.clone(),
                usage: LlmUsage::default(),
            }),
            Some(Err(message)) => Err(AppError::Llm(message)),
            None => Err(AppError::Llm("mock script exhausted".to_string())),
        }
    }
}
