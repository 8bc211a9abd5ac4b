//! Chat command handler.
//!
//! A line-oriented session on stdin. Each line is one turn; the reply is
//! printed to stdout and both sides are kept in the session history.

use super::{parse_mode, resolve_mode};
use clap::Args;
use refchat_agent::{ChatHistory, Pipeline, PipelineRequest};
use refchat_core::{config::AppConfig, AppResult, PipelineMode};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

const THINKING: &str = "Thinking...";

/// Interactive chat session
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Run the draft/evaluate/refine loop and merge both providers
    #[arg(long)]
    pub full: bool,

    /// Pipeline mode (simplified or full); defaults to the configured mode
    #[arg(long, value_parser = parse_mode)]
    pub mode: Option<PipelineMode>,

    /// Refinements allowed in full mode
    #[arg(long)]
    pub max_iterations: Option<u32>,
}

/// What a line of input asks for.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Query(&'a str),
    Clear,
    Exit,
    Blank,
}

fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Blank,
        "/exit" | "/quit" => Input::Exit,
        "/clear" => Input::Clear,
        query => Input::Query(query),
    }
}

impl ChatCommand {
    /// Execute the chat command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Starting chat session");

        let pipeline = Pipeline::from_config(config)?;
        let mode = resolve_mode(self.full, self.mode, config);
        let max_iterations = self
            .max_iterations
            .unwrap_or(config.pipeline.max_iterations);

        let mut history = ChatHistory::with_greeting();
        if let Some(greeting) = history.turns().first() {
            println!("{}\n", greeting.content);
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            prompt_marker();
            let Some(line) = lines.next_line().await? else {
                break;
            };

            let query = match parse_input(&line) {
                Input::Blank => continue,
                Input::Exit => break,
                Input::Clear => {
                    history.reset();
                    tracing::debug!("Chat history cleared");
                    eprintln!("History cleared.");
                    continue;
                }
                Input::Query(query) => query,
            };

            // The pipeline sees the history before this turn
            let request = PipelineRequest::new(query)
                .with_history(history.transcript())
                .with_mode(mode)
                .with_max_iterations(max_iterations);
            history.push_user(query);

            eprintln!("{}", THINKING);
            let reply = pipeline.answer(&request).await;
            let markdown = reply.to_markdown();

            println!("{}\n", markdown);
            history.push_assistant(markdown);
            tracing::debug!(turns = history.len(), "Turn complete");
        }

        tracing::info!("Chat session ended");
        Ok(())
    }
}

fn prompt_marker() {
    eprint!("> ");
    std::io::stderr().flush().ok();
}
