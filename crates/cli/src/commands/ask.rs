//! Ask command handler.
//!
//! Answers a single query and prints the markdown reply to stdout.

use super::{parse_mode, resolve_mode};
use clap::Args;
use refchat_agent::{Pipeline, PipelineRequest, Reply};
use refchat_core::{config::AppConfig, AppError, AppResult, PipelineMode};
use std::path::PathBuf;

/// Answer a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask (alternative to --prompt flag)
    pub query: Option<String>,

    /// Question text (explicit flag)
    #[arg(long = "prompt", conflicts_with = "query")]
    pub prompt_flag: Option<String>,

    /// Read the question from a file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Run the draft/evaluate/refine loop and merge both providers
    #[arg(long)]
    pub full: bool,

    /// Pipeline mode (simplified or full); defaults to the configured mode
    #[arg(long, value_parser = parse_mode)]
    pub mode: Option<PipelineMode>,

    /// Refinements allowed in full mode
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// File holding the conversation so far (`role: content` lines)
    #[arg(long)]
    pub history_file: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let query = self.get_query()?;
        let chat_history = self.read_history()?;

        let request = PipelineRequest::new(query)
            .with_history(chat_history)
            .with_mode(resolve_mode(self.full, self.mode, config))
            .with_max_iterations(
                self.max_iterations
                    .unwrap_or(config.pipeline.max_iterations),
            );

        let pipeline = Pipeline::from_config(config)?;
        let reply = pipeline.answer(&request).await;

        if self.json {
            println!("{}", self.render_json(&reply, config)?);
        } else {
            println!("{}", reply.to_markdown());
        }

        Ok(())
    }

    fn render_json(&self, reply: &Reply, config: &AppConfig) -> AppResult<String> {
        let output = match reply {
            Reply::Answered(result) => serde_json::json!({
                "answer": result.answer_markdown,
                "references": result.references_markdown,
                "markdown": result.to_markdown(),
                "model": config.llm.model,
                "provider": config.llm.provider,
                "trace": result.trace,
            }),
            Reply::Failed { message } => serde_json::json!({
                "error": message,
                "markdown": reply.to_markdown(),
                "model": config.llm.model,
                "provider": config.llm.provider,
            }),
        };

        Ok(serde_json::to_string_pretty(&output)?)
    }

    /// Get the query text from the argument, the flag, or a file.
    fn get_query(&self) -> AppResult<String> {
        if let Some(query) = self.query.clone().or_else(|| self.prompt_flag.clone()) {
            return non_empty(query);
        }

        match &self.file {
            Some(path) => {
                let contents = std::fs::read_to_string(path).map_err(|e| {
                    AppError::Config(format!("Failed to read query file {:?}: {}", path, e))
                })?;
                non_empty(contents)
            }
            None => Err(AppError::Config("No query provided".to_string())),
        }
    }

    fn read_history(&self) -> AppResult<String> {
        match &self.history_file {
            Some(path) => Ok(std::fs::read_to_string(path)?.trim_end().to_string()),
            None => Ok(String::new()),
        }
    }
}

fn non_empty(query: String) -> AppResult<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(AppError::Config("Query cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}
