use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which party should carry out a conversion step.
///
/// Parsed leniently: case and surrounding whitespace are ignored and
/// anything unrecognised becomes `Unknown`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", from = "String")]
pub enum Converter {
    #[default]
    Producer,
    Consumer,
    ThirdParty,
    Unknown,
}

impl Converter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Producer => "producer",
            Self::Consumer => "consumer",
            Self::ThirdParty => "third-party",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "producer" => Self::Producer,
            "consumer" => Self::Consumer,
            "third-party" | "third party" | "thirdparty" => Self::ThirdParty,
            _ => Self::Unknown,
        }
    }
}

impl From<String> for Converter {
    fn from(s: String) -> Self {
        Self::parse_lenient(&s)
    }
}

impl fmt::Display for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scored suggestion that one profile's waste stream can feed another
/// profile's inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecommendation {
    pub id: String,
    /// Name of the waste stream that triggered the match.
    pub waste_id: String,
    pub producer_id: String,
    pub candidate_id: String,
    pub conversion_needed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_description: Option<String>,
    pub recommended_converter: Converter,
    pub score: f64,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl MatchRecommendation {
    /// An unconfirmed recommendation with a fresh id and neutral values.
    pub fn new(waste_id: &str, producer_id: &str, candidate_id: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            waste_id: waste_id.to_string(),
            producer_id: producer_id.to_string(),
            candidate_id: candidate_id.to_string(),
            conversion_needed: false,
            conversion_description: None,
            recommended_converter: Converter::Unknown,
            score: 0.0,
            reasoning: String::new(),
            estimated_cost: None,
            created_at: Utc::now(),
            confirmed: false,
            confirmed_at: None,
        }
    }
}
