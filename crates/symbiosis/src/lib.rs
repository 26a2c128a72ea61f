pub mod broadcast;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod matching;
pub mod models;
pub mod oracle;
pub mod orchestrator;
pub mod parser;
pub mod retry;
pub mod sanitize;
pub mod secrets;
pub mod service;
pub mod storage;

pub use broadcast::{EventBroadcaster, PipelineEvent, TaskUpdatedEvent};
pub use config::{load_config, Config};
pub use db::{Database, DatabaseError, Store};
pub use error::{ConfigError, ParseError, Result, StorageError, SymbiosisError};
pub use logging::init_logging;
pub use matching::{compute_score, MatchEngine, MatchRunSummary};
pub use models::{
    Converter, IndustryProfile, Location, MatchRecommendation, Output, Task, TaskStatus, TaskType,
};
pub use oracle::{OracleError, ReasoningOracle, SymbiosisOracle};
pub use orchestrator::TaskOrchestrator;
pub use parser::{DocumentParser, HttpDocumentParser};
pub use retry::{call_with_retry, RetryExhausted, RetryPolicy};
pub use secrets::{resolve_secret, SecretError};
pub use service::SymbiosisService;
pub use storage::BlobStorage;
