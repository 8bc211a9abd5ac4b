//! Bounded draft → evaluate → refine loop.
//!
//! Each cycle drafts an answer for the current query and asks the model
//! whether it is complete. A rejected draft produces a rewritten query for
//! the next cycle. Once `max_iterations` rewrites are spent the latest draft
//! is accepted as is, together with the last rewritten query. A budget of
//! zero still runs a single cycle.

use crate::generator::AnswerGenerator;
use crate::judge::CompletionJudge;
use crate::runner::PromptRunner;
use refchat_core::AppResult;
use refchat_prompt::PromptDefinition;
use serde::Serialize;

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Termination {
    /// The judge accepted a draft.
    Accepted,
    /// The iteration budget ran out.
    Exhausted,
}

/// Result of a finished loop.
#[derive(Debug, Clone)]
pub struct LoopOutcome {
    /// Last drafted answer
    pub response: String,

    /// Query the last draft answered
    pub final_query: String,

    /// Draft/evaluate cycles performed
    pub cycles: u32,

    pub termination: Termination,
}

pub struct RefinementLoop {
    generator: AnswerGenerator,
    runner: PromptRunner,
    evaluate_prompt: PromptDefinition,
    refine_prompt: PromptDefinition,
    judge: Box<dyn CompletionJudge>,
}

impl RefinementLoop {
    pub fn new(
        generator: AnswerGenerator,
        runner: PromptRunner,
        evaluate_prompt: PromptDefinition,
        refine_prompt: PromptDefinition,
        judge: Box<dyn CompletionJudge>,
    ) -> Self {
        Self {
            generator,
            runner,
            evaluate_prompt,
            refine_prompt,
            judge,
        }
    }

    pub fn set_judge(&mut self, judge: Box<dyn CompletionJudge>) {
        self.judge = judge;
    }

    /// Run the loop until a draft is accepted or the budget is spent.
    ///
    /// Any model or prompt error aborts the loop.
    pub async fn run(
        &self,
        query: &str,
        chat_history: &str,
        max_iterations: u32,
    ) -> AppResult<LoopOutcome> {
        let mut current_query = query.to_string();
        let mut iteration: u32 = 0;

        loop {
            let cycle = iteration + 1;
            tracing::debug!(cycle, "Running draft for query: {}", current_query);

            let response = self.generator.draft(&current_query, chat_history).await?;
            let evaluation = self
                .evaluate(&current_query, &response, chat_history)
                .await?;

            if self.judge.is_complete(&evaluation) {
                tracing::info!(cycle, "Draft accepted");
                return Ok(LoopOutcome {
                    response,
                    final_query: current_query,
                    cycles: cycle,
                    termination: Termination::Accepted,
                });
            }

            if max_iterations == 0 {
                tracing::info!(cycle, "No refinements allowed, keeping the draft");
                return Ok(LoopOutcome {
                    response,
                    final_query: current_query,
                    cycles: cycle,
                    termination: Termination::Exhausted,
                });
            }

            let refined = self
                .refine(&current_query, &evaluation, chat_history)
                .await?;
            let refined = refined.trim();
            if refined.is_empty() {
                tracing::warn!(cycle, "Empty refined query, keeping the current one");
            } else {
                current_query = refined.to_string();
            }
            tracing::debug!(cycle, "Refined query: {}", current_query);

            iteration += 1;
            if iteration >= max_iterations {
                // The last draft answered the previous query; references follow the refined one
                tracing::info!(cycle, max_iterations, "Iteration limit reached, keeping last draft");
                return Ok(LoopOutcome {
                    response,
                    final_query: current_query,
                    cycles: cycle,
                    termination: Termination::Exhausted,
                });
            }
        }
    }

    async fn evaluate(&self, query: &str, response: &str, chat_history: &str) -> AppResult<String> {
        self.runner
            .run(
                "evaluate",
                &self.evaluate_prompt,
                &[
                    ("query", query),
                    ("response", response),
                    ("chat_history", chat_history),
                ],
            )
            .await
    }

    async fn refine(&self, query: &str, evaluation: &str, chat_history: &str) -> AppResult<String> {
        self.runner
            .run(
                "refine",
                &self.refine_prompt,
                &[
                    ("query", query),
                    ("evaluation", evaluation),
                    ("chat_history", chat_history),
                ],
            )
            .await
    }
}
