//! Typed replies of the reasoning operations, each with its fallback.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{Converter, Location, Output};

/// Estimated effort of a conversion step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Complexity {
    Low,
    Medium,
    High,
    #[default]
    Unknown,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Unknown => "unknown",
        }
    }
}

impl From<String> for Complexity {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(alias = "waste_type")]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub potential_uses: Vec<String>,
}

impl Classification {
    pub fn fallback() -> Self {
        Self {
            category: "unclassified".to_string(),
            tags: Vec::new(),
            potential_uses: Vec::new(),
        }
    }
}

/// How a waste stream has to be processed before the target can use it.
///
/// Keys missing from an otherwise valid reply take neutral defaults;
/// note the converter defaults to `producer` here but the whole-reply
/// fallback reports `unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionEstimate {
    #[serde(default)]
    pub conversion_needed: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub recommended_converter: Converter,
    #[serde(default = "unknown_cost")]
    pub estimated_cost: String,
    #[serde(default)]
    pub complexity: Complexity,
}

fn unknown_cost() -> String {
    "Unknown".to_string()
}

impl ConversionEstimate {
    pub fn fallback() -> Self {
        Self {
            conversion_needed: false,
            description: "Unable to determine".to_string(),
            recommended_converter: Converter::Unknown,
            estimated_cost: unknown_cost(),
            complexity: Complexity::Unknown,
        }
    }
}

/// Location as reported in free text: coordinates when the document
/// gives them, otherwise a place name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtractedLocation {
    Coordinates(Location),
    Place(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    #[serde(default, alias = "company_name")]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<ExtractedLocation>,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default, deserialize_with = "lenient_outputs")]
    pub outputs: Vec<Output>,
}

/// Accepts outputs either as full objects or as bare names.
fn lenient_outputs<'de, D>(deserializer: D) -> Result<Vec<Output>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Entry {
        Detailed(Output),
        Named(String),
    }

    let entries = Vec::<Entry>::deserialize(deserializer)?;
    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            Entry::Detailed(output) => output,
            Entry::Named(name) => Output {
                name,
                ..Output::default()
            },
        })
        .collect())
}

/// Result of free-text extraction. `Raw` carries the undecodable reply
/// under the `raw_response` key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtractedProfile {
    Structured(ExtractedFields),
    Raw { raw_response: String },
}

impl ExtractedProfile {
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }
}
