//! Builder patterns for creating test data programmatically.

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};

use symbiosis::config::schema::{Config, OracleConfig, ParserConfig, RetryConfig};
use symbiosis::models::{Converter, IndustryProfile, Location, Output};
use symbiosis::oracle::{Complexity, ConversionEstimate};

/// Builder for creating `IndustryProfile` instances.
pub struct ProfileBuilder {
    id: Option<String>,
    name: String,
    location: Location,
    inputs: Vec<String>,
    outputs: Vec<Output>,
    created_at: Option<DateTime<Utc>>,
}

impl ProfileBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            location: Location::default(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            created_at: None,
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn at(mut self, lat: f64, lng: f64) -> Self {
        self.location = Location::new(lat, lng);
        self
    }

    pub fn input(mut self, input: &str) -> Self {
        self.inputs.push(input.to_string());
        self
    }

    /// Adds a solid output stream.
    pub fn output(mut self, name: &str) -> Self {
        self.outputs.push(Output::new(name, "solid", "10 tons/month"));
        self
    }

    /// Backdates creation so list order is deterministic.
    pub fn created_minutes_ago(mut self, minutes: i64) -> Self {
        self.created_at = Some(Utc::now() - Duration::minutes(minutes));
        self
    }

    pub fn build(self) -> IndustryProfile {
        let mut profile = IndustryProfile::new(&self.name, self.location, self.inputs, self.outputs);
        if let Some(id) = self.id {
            profile.id = id;
        }
        if let Some(created_at) = self.created_at {
            profile.created_at = created_at;
            profile.updated_at = created_at;
        }
        profile
    }
}

/// Builder for creating `ConversionEstimate` instances.
pub struct ConversionBuilder {
    estimate: ConversionEstimate,
}

impl ConversionBuilder {
    /// Direct use, no processing required.
    pub fn direct() -> Self {
        Self {
            estimate: ConversionEstimate {
                conversion_needed: false,
                description: String::new(),
                recommended_converter: Converter::Producer,
                estimated_cost: "$0".to_string(),
                complexity: Complexity::Low,
            },
        }
    }

    pub fn needs_conversion(mut self, description: &str) -> Self {
        self.estimate.conversion_needed = true;
        self.estimate.description = description.to_string();
        self
    }

    pub fn complexity(mut self, complexity: Complexity) -> Self {
        self.estimate.complexity = complexity;
        self
    }

    pub fn converter(mut self, converter: Converter) -> Self {
        self.estimate.recommended_converter = converter;
        self
    }

    pub fn cost(mut self, cost: &str) -> Self {
        self.estimate.estimated_cost = cost.to_string();
        self
    }

    pub fn build(self) -> ConversionEstimate {
        self.estimate
    }
}

/// Builder for creating `Config` instances.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config {
                oracle: OracleConfig {
                    api_key: Some("test-key".to_string()),
                    ..OracleConfig::default()
                },
                retry: RetryConfig {
                    max_attempts: 1,
                    unit_delay_ms: 0,
                },
                ..Config::default()
            },
        }
    }

    pub fn database_path(mut self, path: &str) -> Self {
        self.config.database_path = Some(path.to_string());
        self
    }

    pub fn upload_directory(mut self, path: &str) -> Self {
        self.config.upload_directory = path.to_string();
        self
    }

    pub fn worker_url(mut self, url: &str) -> Self {
        self.config.parser = ParserConfig {
            worker_url: url.to_string(),
            timeout_secs: 5,
        };
        self
    }

    pub fn api_key_env(mut self, name: &str) -> Self {
        self.config.oracle.api_key = None;
        self.config.oracle.api_key_env = Some(name.to_string());
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
