use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::DocumentParser;
use crate::error::ParseError;
use crate::models::IndustryProfile;
use crate::sanitize::truncate_body;

#[derive(Debug, Serialize)]
struct ParseRequest<'a> {
    file_url: &'a str,
    filename: &'a str,
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    profile: IndustryProfile,
}

/// Calls an external parsing worker at `POST {worker_url}/parse`.
pub struct HttpDocumentParser {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpDocumentParser {
    pub fn new(worker_url: &str, timeout: Duration) -> Result<Self, ParseError> {
        let endpoint = format!("{}/parse", worker_url.trim_end_matches('/'));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ParseError::Unavailable {
                url: endpoint.clone(),
                source: e,
            })?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl DocumentParser for HttpDocumentParser {
    async fn parse(&self, file_url: &str, filename: &str) -> Result<IndustryProfile, ParseError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ParseRequest { file_url, filename })
            .send()
            .await
            .map_err(|e| ParseError::Unavailable {
                url: self.endpoint.clone(),
                source: e,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ParseError::Unavailable {
                url: self.endpoint.clone(),
                source: e,
            })?;

        if !status.is_success() {
            return Err(ParseError::Rejected {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: ParseResponse =
            serde_json::from_str(&body).map_err(|e| ParseError::MalformedBody(e.to_string()))?;

        let mut profile = parsed.profile;
        profile.ensure_id();
        Ok(profile)
    }
}
