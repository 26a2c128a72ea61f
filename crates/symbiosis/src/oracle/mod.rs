//! Typed façade over the text-reasoning service.

pub mod client;
pub mod decode;
pub mod error;
pub mod prompts;
pub mod reasoning;
pub mod types;

pub use client::{GeminiClient, GeminiConfig, LlmClient};
pub use error::OracleError;
pub use reasoning::{ReasoningOracle, SymbiosisOracle};
pub use types::{
    Classification, Complexity, ConversionEstimate, ExtractedFields, ExtractedLocation,
    ExtractedProfile,
};
