//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Redis configuration.
    pub redis: RedisConfig,
    /// Quiz configuration.
    pub quiz: QuizConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL.
    pub url: String,
    /// Key prefix for all Redis keys.
    #[serde(default = "default_redis_prefix")]
    pub prefix: String,
}

/// Quiz feature configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct QuizConfig {
    /// Chat-completions endpoint (OpenAI-compatible).
    #[serde(default = "default_completion_url")]
    pub completion_url: String,
    /// Model identifier sent to the completion service.
    #[serde(default = "default_completion_model")]
    pub completion_model: String,
    /// API key for the completion service. Usually supplied via
    /// `CARERIDE__QUIZ__API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Upstream request timeout in seconds.
    #[serde(default = "default_completion_timeout")]
    pub timeout_secs: u64,
    /// Candidate paths for the question bank; the first existing file wins.
    #[serde(default = "default_question_paths")]
    pub question_paths: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

fn default_redis_prefix() -> String {
    "careride".to_string()
}

fn default_completion_url() -> String {
    "https://api.groq.com/openai/v1/chat/completions".to_string()
}

fn default_completion_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

const fn default_completion_timeout() -> u64 {
    30
}

fn default_question_paths() -> Vec<String> {
    vec![
        "data/questions.json".to_string(),
        "static/quiz/questions.json".to_string(),
    ]
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `CARERIDE_ENV`)
    /// 3. Environment variables with `CARERIDE_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("CARERIDE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("CARERIDE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("CARERIDE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
