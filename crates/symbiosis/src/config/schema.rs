use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    /// SQLite file; defaults to `~/.symbiosis/data/symbiosis.db`.
    #[serde(default)]
    pub database_path: Option<String>,
    #[serde(default = "default_upload_directory")]
    pub upload_directory: String,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

fn default_upload_directory() -> String {
    "./uploads".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            database_path: None,
            upload_directory: default_upload_directory(),
            oracle: OracleConfig::default(),
            retry: RetryConfig::default(),
            parser: ParserConfig::default(),
            logging: LoggingConfig::default(),
            events: EventsConfig::default(),
        }
    }
}

impl Config {
    /// The configured database file, or the per-user default.
    pub fn resolved_database_path(&self) -> Option<PathBuf> {
        match &self.database_path {
            Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
            _ => crate::db::default_database_path(),
        }
    }
}

/// Reasoning service settings. The API key is resolved from `api_key`,
/// then `api_key_file`, then the `api_key_env` variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_oracle_timeout")]
    pub timeout_secs: u64,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_file: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: Option<String>,
    /// Upper bound on document characters embedded in an extraction prompt.
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-pro".to_string()
}

fn default_oracle_timeout() -> u64 {
    30
}

fn default_api_key_env() -> Option<String> {
    Some("GEMINI_API_KEY".to_string())
}

fn default_max_prompt_chars() -> usize {
    8000
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_secs: default_oracle_timeout(),
            api_key: None,
            api_key_file: None,
            api_key_env: default_api_key_env(),
            max_prompt_chars: default_max_prompt_chars(),
        }
    }
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_unit_delay_ms")]
    pub unit_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_unit_delay_ms() -> u64 {
    1000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            unit_delay_ms: default_unit_delay_ms(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.unit_delay_ms))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    #[serde(default = "default_worker_url")]
    pub worker_url: String,
    #[serde(default = "default_parser_timeout")]
    pub timeout_secs: u64,
}

fn default_worker_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_parser_timeout() -> u64 {
    120
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            worker_url: default_worker_url(),
            timeout_secs: default_parser_timeout(),
        }
    }
}

impl ParserConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

fn default_event_capacity() -> usize {
    256
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}
