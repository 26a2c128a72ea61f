use async_trait::async_trait;

use super::client::LlmClient;
use super::decode::decode_or;
use super::error::OracleError;
use super::prompts;
use super::types::{Classification, ConversionEstimate, ExtractedFields, ExtractedProfile};
use crate::models::{IndustryProfile, Output};
use crate::retry::{call_with_retry, RetryPolicy};

/// The five reasoning operations the pipeline relies on.
///
/// Replies that cannot be decoded resolve to each operation's fallback;
/// only transport failures surface as errors.
#[async_trait]
pub trait SymbiosisOracle: Send + Sync {
    async fn extract(&self, raw_text: &str) -> Result<ExtractedProfile, OracleError>;

    async fn classify(&self, stream_name: &str, state: &str)
        -> Result<Classification, OracleError>;

    /// Display names of pool members that could use `waste` as an input.
    async fn find_candidates(
        &self,
        waste: &Output,
        pool: &[IndustryProfile],
    ) -> Result<Vec<String>, OracleError>;

    async fn estimate_conversion(
        &self,
        waste: &Output,
        target_input: &str,
    ) -> Result<ConversionEstimate, OracleError>;

    async fn explain(
        &self,
        waste: &Output,
        candidate: &IndustryProfile,
        conversion: &ConversionEstimate,
    ) -> Result<String, OracleError>;
}

/// Prompt-driven oracle over any [`LlmClient`], with every call retried
/// under the configured policy.
pub struct ReasoningOracle<C> {
    client: C,
    retry: RetryPolicy,
    max_prompt_chars: usize,
}

impl<C: LlmClient> ReasoningOracle<C> {
    pub fn new(client: C, retry: RetryPolicy, max_prompt_chars: usize) -> Self {
        Self {
            client,
            retry,
            max_prompt_chars,
        }
    }

    async fn ask(&self, operation: &'static str, prompt: &str) -> Result<String, OracleError> {
        tracing::debug!(operation, prompt_chars = prompt.len(), "Querying reasoning service");
        let reply = call_with_retry(&self.retry, || self.client.generate(prompt)).await?;
        Ok(reply)
    }
}

#[async_trait]
impl<C: LlmClient> SymbiosisOracle for ReasoningOracle<C> {
    async fn extract(&self, raw_text: &str) -> Result<ExtractedProfile, OracleError> {
        let prompt = prompts::extract(raw_text, self.max_prompt_chars);
        let reply = self.ask("extract", &prompt).await?;
        Ok(super::decode::decode::<ExtractedFields>(&reply)
            .map(ExtractedProfile::Structured)
            .unwrap_or_else(|| {
                log::warn!("extract: reply is not a profile object, keeping raw text");
                ExtractedProfile::Raw {
                    raw_response: reply,
                }
            }))
    }

    async fn classify(
        &self,
        stream_name: &str,
        state: &str,
    ) -> Result<Classification, OracleError> {
        let reply = self
            .ask("classify", &prompts::classify(stream_name, state))
            .await?;
        Ok(decode_or("classify", &reply, Classification::fallback))
    }

    async fn find_candidates(
        &self,
        waste: &Output,
        pool: &[IndustryProfile],
    ) -> Result<Vec<String>, OracleError> {
        let reply = self
            .ask("find_candidates", &prompts::find_candidates(waste, pool))
            .await?;
        Ok(decode_or("find_candidates", &reply, Vec::new))
    }

    async fn estimate_conversion(
        &self,
        waste: &Output,
        target_input: &str,
    ) -> Result<ConversionEstimate, OracleError> {
        let reply = self
            .ask(
                "estimate_conversion",
                &prompts::estimate_conversion(waste, target_input),
            )
            .await?;
        Ok(decode_or(
            "estimate_conversion",
            &reply,
            ConversionEstimate::fallback,
        ))
    }

    async fn explain(
        &self,
        waste: &Output,
        candidate: &IndustryProfile,
        conversion: &ConversionEstimate,
    ) -> Result<String, OracleError> {
        let reply = self
            .ask("explain", &prompts::explain(waste, candidate, conversion))
            .await?;
        Ok(reply.trim().to_string())
    }
}
