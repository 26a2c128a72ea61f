//! Industry profile: a company's declared inputs, outputs and location.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Geographical coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A material stream produced by a profile (product, by-product or waste).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub name: String,
    /// Physical state: nominally solid, liquid or gas.
    #[serde(default)]
    pub state: String,
    /// Free text with the unit embedded ("200 tons/month").
    #[serde(default)]
    pub quantity: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Output {
    pub fn new(name: &str, state: &str, quantity: &str) -> Self {
        Self {
            name: name.to_string(),
            state: state.to_string(),
            quantity: quantity.to_string(),
            tags: Vec::new(),
        }
    }
}

/// A company's input/output profile.
///
/// The `id` is assigned once and never changes. Re-saving a profile
/// replaces the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryProfile {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<Output>,
    #[serde(default = "Utc::now", deserialize_with = "utc_timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now", deserialize_with = "utc_timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
}

/// Accepts RFC 3339 and offset-less ISO 8601 timestamps. The parsing
/// worker emits the latter; they are read as UTC.
mod utc_timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de::Error, Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp '{}'", raw)))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

impl IndustryProfile {
    /// Creates a profile with a freshly generated id.
    pub fn new(name: &str, location: Location, inputs: Vec<String>, outputs: Vec<Output>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            location,
            inputs,
            outputs,
            created_at: now,
            updated_at: now,
        }
    }

    /// Assigns a fresh id if the profile arrived without one.
    pub fn ensure_id(&mut self) {
        if self.id.trim().is_empty() {
            self.id = uuid::Uuid::new_v4().to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_profile_has_id() {
        let profile = IndustryProfile::new("Mill", Location::new(1.0, 2.0), vec![], vec![]);
        assert!(!profile.id.is_empty());
        assert_eq!(profile.created_at, profile.updated_at);
    }

    #[test]
    fn test_deserialize_worker_profile_without_id() {
        let json = r#"{
            "name": "Steel Rolling Mill A",
            "location": {"lat": 12.34, "lng": 56.78},
            "inputs": ["scrap metal", "coal"],
            "outputs": [{"name": "waste slag", "state": "solid", "quantity": "200 tons/month"}]
        }"#;

        let mut profile: IndustryProfile = serde_json::from_str(json).unwrap();
        assert!(profile.id.is_empty());
        profile.ensure_id();
        assert!(!profile.id.is_empty());
        assert_eq!(profile.outputs.len(), 1);
        assert!(profile.outputs[0].tags.is_empty());
        assert_eq!(profile.location, Location::new(12.34, 56.78));
    }

    #[test]
    fn test_naive_worker_timestamps_read_as_utc() {
        let json = r#"{
            "id": "p-1",
            "name": "Unknown Company",
            "created_at": "2024-05-01T12:34:56.123456",
            "updated_at": "2024-05-01T12:34:56"
        }"#;

        let profile: IndustryProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.created_at.to_rfc3339(), "2024-05-01T12:34:56.123456+00:00");
        assert_eq!(profile.updated_at.to_rfc3339(), "2024-05-01T12:34:56+00:00");
    }

    #[test]
    fn test_offset_timestamps_are_normalised() {
        let ts = utc_timestamp::parse("2024-05-01T14:00:00+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-05-01T12:00:00+00:00");
        assert!(utc_timestamp::parse("yesterday").is_none());
    }

    #[test]
    fn test_ensure_id_keeps_existing() {
        let mut profile = IndustryProfile::new("Mill", Location::default(), vec![], vec![]);
        let id = profile.id.clone();
        profile.ensure_id();
        assert_eq!(profile.id, id);
    }

    #[test]
    fn test_output_tags_skipped_when_empty() {
        let output = Output::new("fly ash", "solid", "5 t/day");
        let json = serde_json::to_string(&output).unwrap();
        assert!(!json.contains("tags"));
    }
}
