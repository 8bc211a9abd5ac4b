//! Command handlers for the refchat CLI.

pub mod ask;
pub mod chat;
pub mod prompts;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use prompts::PromptsCommand;

use refchat_core::{config::AppConfig, PipelineMode};

/// Mode requested on the command line, falling back to the config.
///
/// `--full` wins over `--mode`.
pub(crate) fn resolve_mode(full: bool, mode: Option<PipelineMode>, config: &AppConfig) -> PipelineMode {
    if full {
        PipelineMode::Full
    } else {
        mode.unwrap_or(config.pipeline.mode)
    }
}

/// clap value parser for `--mode`.
pub(crate) fn parse_mode(value: &str) -> Result<PipelineMode, String> {
    PipelineMode::parse(value)
        .ok_or_else(|| format!("unknown mode '{}', expected 'simplified' or 'full'", value))
}
