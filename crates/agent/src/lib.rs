//! Query resolution for refchat.
//!
//! A [`Pipeline`] turns one user query into a markdown answer followed by
//! web references. It drafts with the configured model, optionally runs a
//! bounded evaluate/refine loop, and picks references through
//! [`refchat_search::ReferenceRouter`].

pub mod generator;
pub mod judge;
pub mod pipeline;
pub mod refine;
pub mod runner;
pub mod session;

pub use generator::AnswerGenerator;
pub use judge::{CompletionJudge, KeywordJudge};
pub use pipeline::{
    Pipeline, PipelineRequest, PipelineResult, Reply, TurnTrace, DEFAULT_MAX_ITERATIONS,
};
pub use refine::{LoopOutcome, RefinementLoop, Termination};
pub use runner::PromptRunner;
pub use session::{ChatHistory, ConversationTurn, Role, GREETING};
