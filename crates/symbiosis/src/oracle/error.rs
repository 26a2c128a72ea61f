use thiserror::Error;

use crate::retry::RetryExhausted;

/// Failures talking to the reasoning service.
///
/// Replies that arrive but do not decode into the expected domain shape
/// are not errors; each operation substitutes its fallback instead.
#[derive(Debug, Error)]
pub enum OracleError {
    /// Network failure, timeout or non-2xx status.
    #[error("Reasoning service unavailable: {0}")]
    ServiceUnavailable(String),

    /// 2xx response without `candidates[0].content.parts[0].text`.
    #[error("Unexpected response shape from reasoning service: {0}")]
    UnexpectedResponseShape(String),

    #[error("Reasoning service failed after {attempts} attempts: {last}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        last: Box<OracleError>,
    },
}

impl From<RetryExhausted<OracleError>> for OracleError {
    fn from(e: RetryExhausted<OracleError>) -> Self {
        Self::RetryExhausted {
            attempts: e.attempts,
            last: Box::new(e.last),
        }
    }
}
