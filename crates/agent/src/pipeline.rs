//! Query-resolution pipeline.
//!
//! Simplified mode drafts once and picks references by keyword route. Full
//! mode runs the refinement loop and always merges both providers. Model
//! failures never escape [`Pipeline::answer`]; they become a visible error
//! reply instead.

use crate::generator::AnswerGenerator;
use crate::judge::{CompletionJudge, KeywordJudge};
use crate::refine::{RefinementLoop, Termination};
use crate::runner::PromptRunner;
use refchat_core::{AppConfig, AppResult, PipelineMode};
use refchat_llm::{create_client, LlmClient};
use refchat_prompt::PromptSet;
use refchat_search::{ReferenceRouter, RouteTag};
use serde::Serialize;
use std::sync::Arc;

/// Default refinement budget.
pub const DEFAULT_MAX_ITERATIONS: u32 = 3;

const REFERENCES_HEADER: &str = "\n\n**References**:\n";
const ERROR_PREFIX: &str = "Error processing query: ";

/// One user turn.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub query: String,

    /// Serialized history (`role: content` lines)
    pub chat_history: String,

    /// Refinements allowed in full mode
    pub max_iterations: u32,

    pub mode: PipelineMode,
}

impl PipelineRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            chat_history: String::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            mode: PipelineMode::Simplified,
        }
    }

    pub fn with_history(mut self, chat_history: impl Into<String>) -> Self {
        self.chat_history = chat_history.into();
        self
    }

    pub fn with_mode(mut self, mode: PipelineMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// How a result was produced.
#[derive(Debug, Clone, Serialize)]
pub struct TurnTrace {
    pub mode: PipelineMode,

    /// Route used for references (simplified mode only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteTag>,

    /// Draft/evaluate cycles (full mode only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycles: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination: Option<Termination>,

    /// Query the references were fetched for
    pub final_query: String,
}

/// A successfully answered turn.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub answer_markdown: String,
    pub references_markdown: String,
    pub trace: TurnTrace,
}

impl PipelineResult {
    /// The answer with the references appended after it.
    pub fn to_markdown(&self) -> String {
        format!(
            "{}{}{}",
            self.answer_markdown, REFERENCES_HEADER, self.references_markdown
        )
    }
}

/// What the shell shows for a turn.
#[derive(Debug, Clone)]
pub enum Reply {
    Answered(PipelineResult),
    Failed { message: String },
}

impl Reply {
    pub fn to_markdown(&self) -> String {
        match self {
            Self::Answered(result) => result.to_markdown(),
            Self::Failed { message } => format!("{}{}", ERROR_PREFIX, message),
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered(_))
    }
}

/// Answers queries with a model and web references.
pub struct Pipeline {
    generator: AnswerGenerator,
    refinement: RefinementLoop,
    router: ReferenceRouter,
}

impl Pipeline {
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        prompts: PromptSet,
        router: ReferenceRouter,
    ) -> Self {
        Self::from_runner(PromptRunner::new(client, model), prompts, router)
    }

    /// Build around a configured runner.
    pub fn from_runner(runner: PromptRunner, prompts: PromptSet, router: ReferenceRouter) -> Self {
        let generator = AnswerGenerator::new(runner.clone(), prompts.draft);
        let refinement = RefinementLoop::new(
            generator.clone(),
            runner,
            prompts.evaluate,
            prompts.refine,
            Box::new(KeywordJudge::default()),
        );

        Self {
            generator,
            refinement,
            router,
        }
    }

    /// Build the pipeline described by `config`.
    ///
    /// Search credentials are not checked here.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let client = create_client(&config.llm)?;
        let runner = PromptRunner::new(client, &config.llm.model)
            .with_sampling(config.llm.temperature, config.llm.max_tokens);
        let prompts = PromptSet::load(&config.workspace)?;
        let router = ReferenceRouter::from_settings(&config.search);

        let mut pipeline = Self::from_runner(runner, prompts, router);
        if !config.pipeline.accept_phrases.is_empty() {
            tracing::debug!(
                "Accepting evaluations containing: {:?}",
                config.pipeline.accept_phrases
            );
            pipeline = pipeline.with_judge(Box::new(KeywordJudge::new(
                config.pipeline.accept_phrases.iter().cloned(),
            )));
        }

        tracing::debug!(
            provider = %config.llm.provider,
            model = %config.llm.model,
            "Pipeline ready"
        );
        Ok(pipeline)
    }

    /// Replace the judge that reads evaluations.
    pub fn with_judge(mut self, judge: Box<dyn CompletionJudge>) -> Self {
        self.refinement.set_judge(judge);
        self
    }

    /// Answer a turn. Errors become [`Reply::Failed`].
    pub async fn answer(&self, request: &PipelineRequest) -> Reply {
        match self.resolve(request).await {
            Ok(result) => Reply::Answered(result),
            Err(e) => {
                tracing::error!("Error processing query: {}", e);
                Reply::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    /// Answer a turn, propagating model and prompt errors.
    pub async fn resolve(&self, request: &PipelineRequest) -> AppResult<PipelineResult> {
        tracing::info!(mode = request.mode.as_str(), "Resolving query");
        tracing::debug!("Query: {}", request.query);

        match request.mode {
            PipelineMode::Simplified => self.resolve_simplified(request).await,
            PipelineMode::Full => self.resolve_full(request).await,
        }
    }

    async fn resolve_simplified(&self, request: &PipelineRequest) -> AppResult<PipelineResult> {
        let route = RouteTag::classify(&request.query);
        let references = self.router.route(&request.query).await;
        let answer = self
            .generator
            .draft(&request.query, &request.chat_history)
            .await?;

        Ok(PipelineResult {
            answer_markdown: answer,
            references_markdown: references,
            trace: TurnTrace {
                mode: PipelineMode::Simplified,
                route: Some(route),
                cycles: None,
                termination: None,
                final_query: request.query.clone(),
            },
        })
    }

    async fn resolve_full(&self, request: &PipelineRequest) -> AppResult<PipelineResult> {
        let outcome = self
            .refinement
            .run(&request.query, &request.chat_history, request.max_iterations)
            .await?;
        let references = self.router.aggregator().combine(&outcome.final_query).await;

        Ok(PipelineResult {
            answer_markdown: outcome.response,
            references_markdown: references,
            trace: TurnTrace {
                mode: PipelineMode::Full,
                route: None,
                cycles: Some(outcome.cycles),
                termination: Some(outcome.termination),
                final_query: outcome.final_query,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refchat_llm::MockLlmClient;
    use refchat_search::{ProviderError, Reference, StaticProvider};

    struct Fixture {
        pipeline: Pipeline,
        client: Arc<MockLlmClient>,
        detailed: Arc<StaticProvider>,
        concise: Arc<StaticProvider>,
    }

    fn fixture(client: MockLlmClient, detailed: StaticProvider, concise: StaticProvider) -> Fixture {
        let client = Arc::new(client);
        let detailed = Arc::new(detailed);
        let concise = Arc::new(concise);
        let router = ReferenceRouter::new(detailed.clone(), concise.clone());
        let pipeline = Pipeline::new(
            client.clone(),
            "mistral",
            PromptSet::builtin().unwrap(),
            router,
        );
        Fixture {
            pipeline,
            client,
            detailed,
            concise,
        }
    }

    fn specs() -> StaticProvider {
        StaticProvider::returning(
            "SerpApi",
            vec![
                Reference::new("iPhone 15 specs", "https://apple.com/iphone-15", "A16 chip"),
                Reference::new("Galaxy S24 specs", "https://samsung.com/s24", "Snapdragon 8 Gen 3"),
            ],
        )
    }

    fn facts() -> StaticProvider {
        StaticProvider::returning(
            "Tavily",
            vec![
                Reference::new("Paris", "https://en.wikipedia.org/wiki/Paris", "Capital of France"),
                Reference::new("iPhone 15 specs (dup)", "https://apple.com/iphone-15", "dup"),
            ],
        )
    }

    #[tokio::test]
    async fn test_simplified_compare_scenario() {
        let f = fixture(
            MockLlmClient::with_replies(["The iPhone 15 and Galaxy S24 differ mainly in..."]),
            specs(),
            facts(),
        );

        let request = PipelineRequest::new("Compare iPhone 15 and Samsung Galaxy S24");
        let reply = f.pipeline.answer(&request).await;

        assert_eq!(
            reply.to_markdown(),
            "The iPhone 15 and Galaxy S24 differ mainly in...\n\n**References**:\n\
             - [iPhone 15 specs](https://apple.com/iphone-15): A16 chip\n\
             - [Galaxy S24 specs](https://samsung.com/s24): Snapdragon 8 Gen 3"
        );
        assert_eq!(f.detailed.queries(), vec!["Compare iPhone 15 and Samsung Galaxy S24"]);
        assert_eq!(f.concise.call_count(), 0);
        assert_eq!(f.client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_simplified_compare_without_results() {
        let f = fixture(
            MockLlmClient::with_replies(["Draft"]),
            StaticProvider::empty("SerpApi"),
            facts(),
        );

        let reply = f
            .pipeline
            .answer(&PipelineRequest::new("Pixel 8 vs iPhone 15"))
            .await;
        assert_eq!(reply.to_markdown(), "Draft\n\n**References**:\nNo references found.");
    }

    #[tokio::test]
    async fn test_simplified_default_route() {
        let f = fixture(MockLlmClient::with_replies(["Paris."]), specs(), facts());

        let reply = f
            .pipeline
            .answer(&PipelineRequest::new("What is the capital of France?"))
            .await;
        match reply {
            Reply::Answered(result) => {
                assert_eq!(result.trace.route, Some(RouteTag::Default));
                assert!(result.references_markdown.starts_with("- [Paris]"));
            }
            Reply::Failed { message } => panic!("unexpected failure: {}", message),
        }
        assert_eq!(f.detailed.call_count(), 0);
        assert_eq!(f.concise.call_count(), 1);
    }

    #[tokio::test]
    async fn test_simplified_provider_failure_still_answers() {
        let f = fixture(
            MockLlmClient::with_replies(["Draft"]),
            StaticProvider::failing("SerpApi", ProviderError::network("SerpApi", "timed out")),
            facts(),
        );

        let reply = f
            .pipeline
            .answer(&PipelineRequest::new("compare A and B"))
            .await;
        assert!(reply.is_answered());
        assert!(reply
            .to_markdown()
            .ends_with("- [Error](): Network error while fetching SerpApi references: timed out"));
    }

    #[tokio::test]
    async fn test_full_mode_uses_aggregator_on_final_query() {
        let f = fixture(
            MockLlmClient::with_replies([
                "draft 1",
                "Missing the budget.",
                "Capital of France with population",
                "draft 2",
                "The response fully answers the query.",
            ]),
            specs(),
            facts(),
        );

        // "compare" would route to the detailed provider in simplified mode
        let request = PipelineRequest::new("compare capitals")
            .with_mode(PipelineMode::Full)
            .with_history("user: hi");
        let reply = f.pipeline.answer(&request).await;

        let Reply::Answered(result) = reply else {
            panic!("expected an answer");
        };
        assert_eq!(result.answer_markdown, "draft 2");
        assert_eq!(result.trace.cycles, Some(2));
        assert_eq!(result.trace.termination, Some(Termination::Accepted));
        assert_eq!(
            result.references_markdown,
            "- [iPhone 15 specs](https://apple.com/iphone-15): A16 chip\n\
             - [Galaxy S24 specs](https://samsung.com/s24): Snapdragon 8 Gen 3\n\
             - [Paris](https://en.wikipedia.org/wiki/Paris): Capital of France"
        );
        assert_eq!(f.detailed.queries(), vec!["Capital of France with population"]);
        assert_eq!(f.concise.queries(), vec!["Capital of France with population"]);
    }

    #[tokio::test]
    async fn test_full_mode_exhausted_uses_refined_query() {
        let f = fixture(
            MockLlmClient::with_replies([
                "draft 1",
                "Missing costs.",
                "Rome trip with costs",
                "draft 2",
                "Still missing costs.",
                "Rome trip with daily costs",
            ]),
            specs(),
            facts(),
        );

        let request = PipelineRequest::new("Rome trip")
            .with_mode(PipelineMode::Full)
            .with_max_iterations(2);
        let Reply::Answered(result) = f.pipeline.answer(&request).await else {
            panic!("expected an answer");
        };

        assert_eq!(result.answer_markdown, "draft 2");
        assert_eq!(result.trace.termination, Some(Termination::Exhausted));
        assert_eq!(result.trace.final_query, "Rome trip with daily costs");
        assert_eq!(f.detailed.queries(), vec!["Rome trip with daily costs"]);
        assert_eq!(f.client.call_count(), 6);
    }

    #[tokio::test]
    async fn test_with_judge_replaces_default_phrases() {
        let f = fixture(
            MockLlmClient::with_replies(["draft", "VERDICT: COMPLETE"]),
            specs(),
            facts(),
        );
        let pipeline = f
            .pipeline
            .with_judge(Box::new(KeywordJudge::new(["verdict: complete"])));

        let request = PipelineRequest::new("q").with_mode(PipelineMode::Full);
        let Reply::Answered(result) = pipeline.answer(&request).await else {
            panic!("expected an answer");
        };
        assert_eq!(result.trace.termination, Some(Termination::Accepted));
        assert_eq!(result.trace.cycles, Some(1));
    }

    #[tokio::test]
    async fn test_full_mode_both_providers_empty() {
        let f = fixture(
            MockLlmClient::with_replies(["draft", "It fully addresses everything."]),
            StaticProvider::empty("SerpApi"),
            StaticProvider::empty("Tavily"),
        );

        let request = PipelineRequest::new("q").with_mode(PipelineMode::Full);
        let reply = f.pipeline.answer(&request).await;
        assert_eq!(
            reply.to_markdown(),
            "draft\n\n**References**:\nNo references found for the query."
        );
    }

    #[tokio::test]
    async fn test_fail_open_on_model_error() {
        let client = MockLlmClient::new();
        client.push_error("connection refused");
        let f = fixture(client, specs(), facts());

        let reply = f
            .pipeline
            .answer(&PipelineRequest::new("Plan a 3-day trip to Rome"))
            .await;

        assert!(!reply.is_answered());
        assert_eq!(
            reply.to_markdown(),
            "Error processing query: LLM error: connection refused"
        );
        assert!(!reply.to_markdown().contains("**References**"));
    }

    #[tokio::test]
    async fn test_fail_open_in_full_mode() {
        let client = MockLlmClient::with_replies(["draft", "not complete"]);
        client.push_error("refiner crashed");
        let f = fixture(client, specs(), facts());

        let request = PipelineRequest::new("q").with_mode(PipelineMode::Full);
        let reply = f.pipeline.answer(&request).await;
        assert_eq!(
            reply.to_markdown(),
            "Error processing query: LLM error: refiner crashed"
        );
        assert_eq!(f.detailed.call_count(), 0);
    }

    #[tokio::test]
    async fn test_trace_serializes_for_mode() {
        let f = fixture(MockLlmClient::with_replies(["answer"]), specs(), facts());
        let Reply::Answered(result) = f.pipeline.answer(&PipelineRequest::new("Plan Lisbon")).await
        else {
            panic!("expected an answer");
        };

        let trace = serde_json::to_value(&result.trace).unwrap();
        assert_eq!(trace["mode"], "simplified");
        assert_eq!(trace["route"], "itinerary");
        assert_eq!(trace["final_query"], "Plan Lisbon");
        assert!(trace.get("cycles").is_none());
    }

    #[test]
    fn test_from_config_with_workspace() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = AppConfig {
            workspace: dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        assert!(Pipeline::from_config(&config).is_ok());

        let mut tuned = config.clone();
        tuned.llm.temperature = Some(0.1);
        tuned.pipeline.accept_phrases = vec!["looks complete".to_string()];
        assert!(Pipeline::from_config(&tuned).is_ok());

        let config = AppConfig {
            workspace: dir.path().to_path_buf(),
            llm: refchat_core::config::LlmSettings {
                provider: "nope".to_string(),
                ..Default::default()
            },
            ..AppConfig::default()
        };
        assert!(Pipeline::from_config(&config).is_err());
    }

    #[test]
    fn test_request_defaults() {
        let request = PipelineRequest::new("q");
        assert_eq!(request.max_iterations, 3);
        assert_eq!(request.mode, PipelineMode::Simplified);
        assert!(request.chat_history.is_empty());
    }
}
