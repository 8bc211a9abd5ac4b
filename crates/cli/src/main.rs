//! Refchat CLI
//!
//! Main entry point for the refchat command-line tool.
//! Answers questions with a local model and attaches web references.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, PromptsCommand};
use refchat_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Refchat - answers with web references
#[derive(Parser, Debug)]
#[command(name = "refchat")]
#[command(about = "Conversational answers backed by web references", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "REFCHAT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "REFCHAT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider
    #[arg(short, long, global = true, env = "REFCHAT_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "REFCHAT_MODEL")]
    model: Option<String>,

    /// Model server URL
    #[arg(long, global = true, env = "REFCHAT_ENDPOINT")]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer a single question
    Ask(AskCommand),

    /// Interactive chat session
    Chat(ChatCommand),

    /// List or show prompt templates
    Prompts(PromptsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // API keys usually live in .env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = AppConfig::load_with(cli.workspace, cli.config)?.with_overrides(
        cli.provider,
        cli.model,
        cli.endpoint,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Refchat starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.llm.provider);
    tracing::debug!("Model: {}", config.llm.model);

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Chat(_) => "chat",
        Commands::Prompts(_) => "prompts",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Prompts(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
