use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;
use crate::secrets::has_secret_source;

const SCHEMA_JSON: &str = include_str!("../../schema/config.json");

/// Reads, validates and returns the config at `path`, then applies
/// environment overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut config = load_config_from_str(&content)?;
    apply_env_overrides(&mut config);
    validate_config(&config)?;

    log::info!("Loaded config from {}", path.display());
    Ok(config)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

/// Environment variables that take precedence over file values.
///
/// - `DATABASE_PATH`
/// - `UPLOAD_DIR`
/// - `PYTHON_WORKER_URL`
pub fn apply_env_overrides(config: &mut Config) {
    if let Some(path) = non_empty_env("DATABASE_PATH") {
        config.database_path = Some(path);
    }
    if let Some(dir) = non_empty_env("UPLOAD_DIR") {
        config.upload_directory = dir;
    }
    if let Some(url) = non_empty_env("PYTHON_WORKER_URL") {
        config.parser.worker_url = url;
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let errors: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !errors.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: errors.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.upload_directory.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "upload_directory must not be empty".to_string(),
        });
    }

    validate_url("oracle.endpoint", &config.oracle.endpoint)?;
    validate_url("parser.worker_url", &config.parser.worker_url)?;

    if config.oracle.timeout_secs == 0 || config.parser.timeout_secs == 0 {
        return Err(ConfigError::Validation {
            message: "timeouts must be at least one second".to_string(),
        });
    }

    if config.oracle.max_prompt_chars == 0 {
        return Err(ConfigError::Validation {
            message: "oracle.max_prompt_chars must be positive".to_string(),
        });
    }

    if config.events.capacity == 0 {
        return Err(ConfigError::Validation {
            message: "events.capacity must be positive".to_string(),
        });
    }

    let oracle = &config.oracle;
    if !has_secret_source(
        oracle.api_key.as_deref(),
        oracle.api_key_file.as_deref(),
        oracle.api_key_env.as_deref(),
    ) {
        return Err(ConfigError::Secret {
            name: "oracle.api_key".to_string(),
            reason: "set one of api_key, api_key_file or api_key_env".to_string(),
        });
    }

    Ok(())
}

fn validate_url(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::Validation {
            message: format!("{} must be an http(s) URL, got '{}'", field, value),
        })
    }
}
