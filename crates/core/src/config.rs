//! Configuration management for refchat.
//!
//! Configuration is merged from, in increasing precedence:
//! - Built-in defaults (local Ollama, `mistral`, three results per provider)
//! - The workspace config file (`.refchat/config.yaml`)
//! - Environment variables
//! - Command-line flags
//!
//! Search credentials are never required at load time. A missing key is
//! reported by the provider on first use.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Language model providers with a client implementation.
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["ollama"];

/// Upper bound for results requested from a single search provider.
pub const MAX_RESULTS_LIMIT: usize = 10;

/// How a turn is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineMode {
    /// One draft, references chosen by keyword routing.
    #[default]
    Simplified,
    /// Bounded draft/evaluate/refine loop, references from both providers.
    Full,
}

impl PipelineMode {
    /// Parse a mode name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "simplified" | "simple" => Some(Self::Simplified),
            "full" => Some(Self::Full),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simplified => "simplified",
            Self::Full => "full",
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .refchat/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Language model settings
    pub llm: LlmSettings,

    /// Search provider settings
    pub search: SearchSettings,

    /// Pipeline defaults
    pub pipeline: PipelineSettings,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Language model endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Provider identifier (e.g., "ollama")
    pub provider: String,

    /// Base URL of the model server
    pub endpoint: String,

    /// Model identifier
    pub model: String,

    /// Request timeout in seconds, enforced by the HTTP client
    pub timeout: Option<u64>,

    /// Sampling temperature; the server default when unset
    pub temperature: Option<f32>,

    /// Cap on generated tokens; the server default when unset
    pub max_tokens: Option<u32>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            model: "mistral".to_string(),
            timeout: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Settings for both search providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Results requested from each provider
    pub max_results: usize,

    /// SerpApi (detailed Google results)
    pub serpapi: SearchProviderConfig,

    /// Tavily (concise results)
    pub tavily: SearchProviderConfig,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_results: 3,
            serpapi: SearchProviderConfig::with_key_env("SERPAPI_API_KEY"),
            tavily: SearchProviderConfig::with_key_env("TAVILY_API_KEY"),
        }
    }
}

/// Settings for one search provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchProviderConfig {
    /// Environment variable holding the API key
    #[serde(rename = "apiKeyEnv")]
    pub api_key_env: String,

    /// Optional endpoint override (defaults to the public API)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Request timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,
}

impl SearchProviderConfig {
    fn with_key_env(env: &str) -> Self {
        Self {
            api_key_env: env.to_string(),
            endpoint: None,
            timeout: None,
        }
    }

    /// Read the API key from the configured environment variable.
    ///
    /// Returns `None` when the variable is unset or blank.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}

/// Pipeline defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Maximum refinements in full mode
    pub max_iterations: u32,

    /// Default mode for new turns
    pub mode: PipelineMode,

    /// Phrases that mark an evaluation as accepting; built-in phrases when empty
    pub accept_phrases: Vec<String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            mode: PipelineMode::Simplified,
            accept_phrases: Vec::new(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    workspace: Option<WorkspaceSection>,
    llm: Option<LlmSection>,
    search: Option<SearchSection>,
    pipeline: Option<PipelineSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceSection {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    endpoint: Option<String>,
    model: Option<String>,
    timeout: Option<u64>,
    temperature: Option<f32>,
    #[serde(rename = "maxTokens")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SearchSection {
    #[serde(rename = "maxResults")]
    max_results: Option<usize>,
    serpapi: Option<SearchProviderConfig>,
    tavily: Option<SearchProviderConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PipelineSection {
    #[serde(rename = "maxIterations")]
    max_iterations: Option<u32>,
    mode: Option<PipelineMode>,
    #[serde(rename = "acceptPhrases")]
    accept_phrases: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            llm: LlmSettings::default(),
            search: SearchSettings::default(),
            pipeline: PipelineSettings::default(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `REFCHAT_WORKSPACE`: Override workspace path
    /// - `REFCHAT_CONFIG`: Path to config file
    /// - `REFCHAT_PROVIDER`: LLM provider
    /// - `REFCHAT_MODEL`: Model identifier
    /// - `REFCHAT_ENDPOINT`: Model server URL
    /// - `REFCHAT_MODE`: Default pipeline mode (`simplified` or `full`)
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Load configuration with an explicit workspace and config file.
    ///
    /// Explicit arguments win over `REFCHAT_WORKSPACE` / `REFCHAT_CONFIG`.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace.or_else(|| env_path("REFCHAT_WORKSPACE")) {
            config.workspace = workspace;
        }
        config.config_file = config_file.or_else(|| env_path("REFCHAT_CONFIG"));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => {
                if !cf.exists() {
                    return Err(AppError::Config(format!("Config file not found: {:?}", cf)));
                }
                cf.clone()
            }
            None => config.refchat_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("REFCHAT_PROVIDER") {
            config.llm.provider = provider;
        }

        if let Ok(model) = std::env::var("REFCHAT_MODEL") {
            config.llm.model = model;
        }

        if let Ok(endpoint) = std::env::var("REFCHAT_ENDPOINT") {
            config.llm.endpoint = endpoint;
        }

        if let Ok(mode) = std::env::var("REFCHAT_MODE") {
            config.pipeline.mode = PipelineMode::parse(&mode).ok_or_else(|| {
                AppError::Config(format!(
                    "Invalid REFCHAT_MODE '{}', expected 'simplified' or 'full'",
                    mode
                ))
            })?;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(llm) = config_file.llm {
            if let Some(provider) = llm.provider {
                result.llm.provider = provider;
            }
            if let Some(endpoint) = llm.endpoint {
                result.llm.endpoint = endpoint;
            }
            if let Some(model) = llm.model {
                result.llm.model = model;
            }
            if llm.timeout.is_some() {
                result.llm.timeout = llm.timeout;
            }
            if llm.temperature.is_some() {
                result.llm.temperature = llm.temperature;
            }
            if llm.max_tokens.is_some() {
                result.llm.max_tokens = llm.max_tokens;
            }
        }

        if let Some(search) = config_file.search {
            if let Some(max_results) = search.max_results {
                result.search.max_results = max_results;
            }
            if let Some(serpapi) = search.serpapi {
                result.search.serpapi = serpapi;
            }
            if let Some(tavily) = search.tavily {
                result.search.tavily = tavily;
            }
        }

        if let Some(pipeline) = config_file.pipeline {
            if let Some(max_iterations) = pipeline.max_iterations {
                result.pipeline.max_iterations = max_iterations;
            }
            if let Some(mode) = pipeline.mode {
                result.pipeline.mode = mode;
            }
            if let Some(phrases) = pipeline.accept_phrases {
                result.pipeline.accept_phrases = phrases;
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over the config file and
    /// environment variables.
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        endpoint: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.llm.provider = provider;
        }

        if let Some(model) = model {
            self.llm.model = model;
        }

        if let Some(endpoint) = endpoint {
            self.llm.endpoint = endpoint;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .refchat directory.
    pub fn refchat_dir(&self) -> PathBuf {
        self.workspace.join(".refchat")
    }

    /// Validate settings that would otherwise fail on every turn.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.llm.provider.to_lowercase();
        if !KNOWN_LLM_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.llm.provider,
                KNOWN_LLM_PROVIDERS.join(", ")
            )));
        }

        if self.llm.endpoint.trim().is_empty() {
            return Err(AppError::Config("LLM endpoint cannot be empty".to_string()));
        }

        if self.llm.model.trim().is_empty() {
            return Err(AppError::Config("Model identifier cannot be empty".to_string()));
        }

        if self.search.max_results == 0 || self.search.max_results > MAX_RESULTS_LIMIT {
            return Err(AppError::Config(format!(
                "search.maxResults must be between 1 and {}, got {}",
                MAX_RESULTS_LIMIT, self.search.max_results
            )));
        }

        Ok(())
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &Path, yaml: &str) -> PathBuf {
        let refchat_dir = dir.join(".refchat");
        std::fs::create_dir_all(&refchat_dir).unwrap();
        let path = refchat_dir.join("config.yaml");
        std::fs::write(&path, yaml).unwrap();
        path
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.llm.model, "mistral");
        assert_eq!(config.search.max_results, 3);
        assert_eq!(config.search.serpapi.api_key_env, "SERPAPI_API_KEY");
        assert_eq!(config.search.tavily.api_key_env, "TAVILY_API_KEY");
        assert_eq!(config.pipeline.max_iterations, 3);
        assert_eq!(config.pipeline.mode, PipelineMode::Simplified);
        assert!(!config.verbose);
    }

    #[test]
    fn test_refchat_dir() {
        let config = AppConfig::default();
        assert!(config.refchat_dir().ends_with(".refchat"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(
            None,
            Some("llama3.2".to_string()),
            Some("http://gpu-box:11434".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.llm.model, "llama3.2");
        assert_eq!(config.llm.endpoint, "http://gpu-box:11434");
        assert!(config.verbose);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml_sections() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            temp.path(),
            r#"
llm:
  model: mixtral
  timeout: 90
  temperature: 0.2
  maxTokens: 512
search:
  maxResults: 5
  tavily:
    apiKeyEnv: MY_TAVILY_KEY
    endpoint: http://localhost:8080
pipeline:
  maxIterations: 1
  mode: full
  acceptPhrases:
    - "verdict: complete"
logging:
  level: trace
  color: false
"#,
        );

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.llm.model, "mixtral");
        assert_eq!(merged.llm.endpoint, "http://localhost:11434");
        assert_eq!(merged.llm.timeout, Some(90));
        assert_eq!(merged.llm.temperature, Some(0.2));
        assert_eq!(merged.llm.max_tokens, Some(512));
        assert_eq!(merged.search.max_results, 5);
        assert_eq!(merged.search.tavily.api_key_env, "MY_TAVILY_KEY");
        assert_eq!(
            merged.search.tavily.endpoint.as_deref(),
            Some("http://localhost:8080")
        );
        assert_eq!(merged.search.serpapi.api_key_env, "SERPAPI_API_KEY");
        assert_eq!(merged.pipeline.max_iterations, 1);
        assert_eq!(merged.pipeline.mode, PipelineMode::Full);
        assert_eq!(merged.pipeline.accept_phrases, vec!["verdict: complete"]);
        assert_eq!(merged.log_level.as_deref(), Some("trace"));
        assert!(merged.no_color);
    }

    #[test]
    fn test_merge_yaml_invalid() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), "llm: [not, a, map");
        assert!(matches!(
            AppConfig::default().merge_yaml(&path),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_load_with_missing_config_file() {
        let temp = TempDir::new().unwrap();
        let result = AppConfig::load_with(
            Some(temp.path().to_path_buf()),
            Some(temp.path().join("absent.yaml")),
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_resolve_api_key_missing() {
        let cfg = SearchProviderConfig::with_key_env("REFCHAT_TEST_KEY_THAT_IS_NEVER_SET");
        assert_eq!(cfg.resolve_api_key(), None);
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.llm.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_result_bounds() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.search.max_results = 0;
        assert!(config.validate().is_err());

        config.search.max_results = MAX_RESULTS_LIMIT + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pipeline_mode_parse() {
        assert_eq!(PipelineMode::parse("full"), Some(PipelineMode::Full));
        assert_eq!(PipelineMode::parse(" Simplified "), Some(PipelineMode::Simplified));
        assert_eq!(PipelineMode::parse("turbo"), None);
        assert_eq!(PipelineMode::Full.as_str(), "full");
    }
}
