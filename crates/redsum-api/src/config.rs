use config::{Config as ConfigLoader, ConfigError, Environment, File};
use redsum_llm::OpenAIConfig;
use redsum_pipeline::PipelineOptions;
use redsum_reddit::RedditConfig;
use redsum_types::ModelCatalog;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    #[serde(default)]
    pub reddit: RedditConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub models: ModelCatalog,

    // Secrets (from ENV only)
    #[serde(default)]
    pub openai_api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for a whole request, reduce passes included.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible endpoint; the public API when unset.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub temperature: Option<f32>,
}

fn default_llm_timeout_secs() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_llm_timeout_secs(),
            temperature: None,
        }
    }
}

impl LlmConfig {
    pub fn openai_config(&self, api_key: &str) -> OpenAIConfig {
        let config = OpenAIConfig::new(api_key).with_timeout(Duration::from_secs(self.timeout_secs));
        match &self.base_url {
            Some(base_url) => config.with_base_url(base_url.as_str()),
            None => config,
        }
    }
}

/// Request defaults and reducer tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub default_model: String,
    pub query: String,
    pub system_role: String,
    pub max_summaries: i64,
    pub chunk_length: i64,
    pub max_tokens: i64,
    pub max_passes: usize,
    pub max_concurrency: usize,
    pub call_timeout_secs: u64,
    pub retry_delay_ms: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            default_model: "gpt-3.5-turbo".to_string(),
            query: "Summarize this Reddit post and its comments professionally and objectively."
                .to_string(),
            system_role: "You are a helpful assistant that summarizes Reddit posts professionally and objectively."
                .to_string(),
            max_summaries: 3,
            chunk_length: 1000,
            max_tokens: 1500,
            max_passes: 5,
            max_concurrency: 4,
            call_timeout_secs: 60,
            retry_delay_ms: 500,
        }
    }
}

impl SummarizerConfig {
    pub fn pipeline_options(&self, temperature: Option<f32>) -> PipelineOptions {
        PipelineOptions {
            max_passes: self.max_passes,
            max_concurrency: self.max_concurrency,
            call_timeout: Duration::from_secs(self.call_timeout_secs),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            temperature,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. `REDSUM_`-prefixed environment variables, `__` between section and key
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("REDSUM")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.origins")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // Load secrets from ENV (not in TOML)
        cfg.openai_api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            ConfigError::Message("OPENAI_API_KEY environment variable is required".to_string())
        })?;

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        ConfigLoader::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }
}
