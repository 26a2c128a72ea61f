//! Document-parsing collaborator: turns a stored upload into a profile.

pub mod http;

use async_trait::async_trait;

use crate::error::ParseError;
use crate::models::IndustryProfile;

pub use http::HttpDocumentParser;

/// Parses the document at `file_url` into an industry profile.
///
/// Implementations must return a profile with a non-empty id.
#[async_trait]
pub trait DocumentParser: Send + Sync {
    async fn parse(&self, file_url: &str, filename: &str) -> Result<IndustryProfile, ParseError>;
}
