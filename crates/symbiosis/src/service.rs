//! Transport-neutral boundary: the operations an HTTP or IPC front end
//! maps its routes onto.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::broadcast::{EventBroadcaster, PipelineEvent};
use crate::config::Config;
use crate::db::{Database, Store};
use crate::error::{ConfigError, Result, SymbiosisError};
use crate::matching::MatchEngine;
use crate::models::{IndustryProfile, MatchRecommendation, Task, TaskStatus};
use crate::oracle::{GeminiClient, GeminiConfig, ReasoningOracle, SymbiosisOracle};
use crate::orchestrator::TaskOrchestrator;
use crate::parser::{DocumentParser, HttpDocumentParser};
use crate::secrets::resolve_secret;
use crate::storage::BlobStorage;

/// Extensions accepted for upload (compared case-insensitively).
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["pdf", "docx", "txt"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub task_id: String,
    pub file_url: String,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileList {
    pub count: usize,
    pub profiles: Vec<IndustryProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchList {
    pub profile_id: String,
    pub matches: Vec<MatchRecommendation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmReceipt {
    pub match_id: String,
    pub confirmed: bool,
    pub message: String,
}

pub struct SymbiosisService {
    store: Arc<dyn Store>,
    blobs: BlobStorage,
    orchestrator: TaskOrchestrator,
    events: EventBroadcaster,
}

impl SymbiosisService {
    pub fn new(
        store: Arc<dyn Store>,
        blobs: BlobStorage,
        oracle: Arc<dyn SymbiosisOracle>,
        parser: Arc<dyn DocumentParser>,
        events: EventBroadcaster,
    ) -> Self {
        let engine = MatchEngine::new(oracle, store.clone(), events.clone());
        let orchestrator = TaskOrchestrator::new(parser, store.clone(), engine, events.clone());
        Self {
            store,
            blobs,
            orchestrator,
            events,
        }
    }

    /// Production wiring: SQLite store, local blob storage, Gemini oracle
    /// and the HTTP parsing worker.
    pub fn from_config(config: &Config) -> Result<Self> {
        let db_path = config
            .resolved_database_path()
            .ok_or_else(|| ConfigError::Validation {
                message: "database_path not set and no home directory found".to_string(),
            })?;
        let db = Database::open(&db_path)?;

        let oracle_config = &config.oracle;
        let api_key = resolve_secret(
            oracle_config.api_key.as_deref(),
            oracle_config.api_key_file.as_deref(),
            oracle_config.api_key_env.as_deref(),
        )
        .map_err(|e| ConfigError::Secret {
            name: "oracle.api_key".to_string(),
            reason: e.to_string(),
        })?;

        let client = GeminiClient::new(GeminiConfig {
            endpoint: oracle_config.endpoint.clone(),
            model: oracle_config.model.clone(),
            api_key,
            timeout: oracle_config.timeout(),
        })?;
        let oracle =
            ReasoningOracle::new(client, config.retry.policy(), oracle_config.max_prompt_chars);
        let parser = HttpDocumentParser::new(&config.parser.worker_url, config.parser.timeout())?;

        tracing::info!(
            model = %oracle_config.model,
            worker = %parser.endpoint(),
            uploads = %config.upload_directory,
            "Symbiosis service configured"
        );

        Ok(Self::new(
            Arc::new(db),
            BlobStorage::new(&config.upload_directory),
            Arc::new(oracle),
            Arc::new(parser),
            EventBroadcaster::new(config.events.capacity),
        ))
    }

    /// Stores the upload, records a pending task and starts processing
    /// in the background.
    ///
    /// The returned receipt always reports `pending`; follow progress with
    /// [`get_task`](Self::get_task), [`subscribe`](Self::subscribe) or the
    /// handle.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime, since processing is
    /// spawned onto the current one.
    pub fn submit_upload(
        &self,
        filename: &str,
        content: &[u8],
    ) -> Result<(UploadReceipt, JoinHandle<Result<Task>>)> {
        let ext = supported_extension(filename)?;
        let stored_name = format!("{}.{}", uuid::Uuid::new_v4(), ext);
        let path = self.blobs.store(content, &stored_name)?;
        let file_url = path.to_string_lossy().into_owned();

        let task = self.orchestrator.create_task(&file_url)?;
        let handle = self.orchestrator.submit(&task.id, &file_url, filename);

        let receipt = UploadReceipt {
            task_id: task.id,
            file_url,
            status: TaskStatus::Pending,
        };
        Ok((receipt, handle))
    }

    pub fn get_task(&self, task_id: &str) -> Result<Task> {
        self.store
            .get_task(task_id)?
            .ok_or_else(|| not_found("task", task_id))
    }

    pub fn get_profile(&self, profile_id: &str) -> Result<IndustryProfile> {
        self.store
            .get_profile(profile_id)?
            .ok_or_else(|| not_found("profile", profile_id))
    }

    /// All profiles, newest first.
    pub fn list_profiles(&self) -> Result<ProfileList> {
        let profiles = self.store.list_profiles()?;
        Ok(ProfileList {
            count: profiles.len(),
            profiles,
        })
    }

    /// Recommendations where `profile_id` is the producer, best first.
    /// An unknown profile yields an empty list.
    pub fn get_matches(&self, profile_id: &str) -> Result<MatchList> {
        let matches = self.store.matches_for_producer(profile_id)?;
        Ok(MatchList {
            profile_id: profile_id.to_string(),
            matches,
        })
    }

    /// Marks a recommendation as confirmed. Repeating the call is harmless
    /// and keeps the first confirmation time.
    pub fn confirm_match(&self, match_id: &str) -> Result<ConfirmReceipt> {
        if !self.store.confirm_match(match_id, Utc::now())? {
            return Err(not_found("match", match_id));
        }
        tracing::info!(match_id = %match_id, "Match confirmed");
        Ok(ConfirmReceipt {
            match_id: match_id.to_string(),
            confirmed: true,
            message: "Match confirmed successfully".to_string(),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    pub fn blob_storage(&self) -> &BlobStorage {
        &self.blobs
    }
}

fn not_found(kind: &'static str, id: &str) -> SymbiosisError {
    SymbiosisError::NotFound {
        kind,
        id: id.to_string(),
    }
}

/// Lower-cased extension of `filename` if it is one we accept.
fn supported_extension(filename: &str) -> Result<String> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(SymbiosisError::UnsupportedFileType(filename.to_string()))
    }
}
