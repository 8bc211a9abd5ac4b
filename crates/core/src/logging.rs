//! Logging infrastructure for refchat.
//!
//! All logs go to stderr so stdout carries only answers.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{AppError, AppResult};

/// Default filter when neither `RUST_LOG` nor an override is given.
const DEFAULT_LEVEL: &str = "warn";

/// Initialize the tracing subscriber with stderr output.
///
/// # Arguments
/// * `log_level` - Optional filter override (e.g., "debug", "refchat_search=trace")
/// * `no_color` - Disable colored output
///
/// # Example
/// ```no_run
/// use refchat_core::logging::init_logging;
///
/// init_logging(Some("debug"), false).expect("Failed to initialize logging");
/// ```
pub fn init_logging(log_level: Option<&str>, no_color: bool) -> AppResult<()> {
    let env_filter = build_filter(log_level)?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(!no_color && supports_color());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| AppError::Config(format!("Failed to init logging: {}", e)))?;

    Ok(())
}

/// Resolve the filter from the override, `RUST_LOG`, or the default level.
fn build_filter(log_level: Option<&str>) -> AppResult<EnvFilter> {
    let from_env = std::env::var("RUST_LOG").ok();
    let filter_str = log_level
        .or(from_env.as_deref())
        .unwrap_or(DEFAULT_LEVEL);

    EnvFilter::try_new(filter_str)
        .map_err(|e| AppError::Config(format!("Invalid log filter '{}': {}", filter_str, e)))
}

fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
}
