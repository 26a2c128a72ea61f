//! Drives an uploaded document through parsing, profile persistence and
//! match generation, recording progress on a [`Task`].

use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info_span, Instrument};

use crate::broadcast::EventBroadcaster;
use crate::db::Store;
use crate::error::{Result, SymbiosisError};
use crate::matching::MatchEngine;
use crate::models::{IndustryProfile, Task};
use crate::parser::DocumentParser;
use crate::sanitize;

#[derive(Clone)]
pub struct TaskOrchestrator {
    parser: Arc<dyn DocumentParser>,
    store: Arc<dyn Store>,
    engine: MatchEngine,
    events: EventBroadcaster,
}

impl TaskOrchestrator {
    pub fn new(
        parser: Arc<dyn DocumentParser>,
        store: Arc<dyn Store>,
        engine: MatchEngine,
        events: EventBroadcaster,
    ) -> Self {
        Self {
            parser,
            store,
            engine,
            events,
        }
    }

    /// Persists a pending `document_parse` task for `file_url`.
    pub fn create_task(&self, file_url: &str) -> Result<Task> {
        let task = Task::document_parse(file_url);
        self.store.save_task(&task)?;
        self.events.task_updated(&task);
        tracing::debug!(task_id = %task.id, "Task created");
        Ok(task)
    }

    /// Runs [`begin_processing`](Self::begin_processing) in the background.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn submit(&self, task_id: &str, file_url: &str, filename: &str) -> JoinHandle<Result<Task>> {
        let orchestrator = self.clone();
        let task_id = task_id.to_string();
        let file_url = file_url.to_string();
        let filename = filename.to_string();
        tokio::spawn(async move {
            let result = orchestrator
                .begin_processing(&task_id, &file_url, &filename)
                .await;
            if let Err(e) = &result {
                tracing::error!(task_id = %task_id, error = %e, "Task processing aborted");
            }
            result
        })
    }

    /// Moves the task to processing, parses the document and persists the
    /// resulting profile.
    ///
    /// Parse and profile-save failures end the task as failed and are
    /// reported through the returned task, not as `Err`. On success match
    /// generation for the new profile is spawned and not awaited.
    pub async fn begin_processing(
        &self,
        task_id: &str,
        file_url: &str,
        filename: &str,
    ) -> Result<Task> {
        let span = info_span!(
            "process_document",
            task_id = %task_id,
            file = %sanitize::redact_path(Path::new(file_url)),
        );
        self.process(task_id, file_url, filename)
            .instrument(span)
            .await
    }

    async fn process(&self, task_id: &str, file_url: &str, filename: &str) -> Result<Task> {
        let mut task = self
            .store
            .get_task(task_id)?
            .ok_or_else(|| SymbiosisError::NotFound {
                kind: "task",
                id: task_id.to_string(),
            })?;

        task.start_processing()?;
        if let Err(e) = self.record(&task) {
            tracing::error!(error = %e, "Failed to record processing state");
            self.fail_after_store_error(&mut task, &e);
            return Err(e);
        }

        let profile = match self.parser.parse(file_url, filename).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(error = %e, "Document parsing failed");
                task.fail(format!("Failed to parse document: {}", e))?;
                self.record(&task)?;
                return Ok(task);
            }
        };

        if let Err(e) = self.store.save_profile(&profile) {
            tracing::error!(profile_id = %profile.id, error = %e, "Failed to save profile");
            task.fail(format!("Failed to save profile: {}", e))?;
            self.record(&task)?;
            return Ok(task);
        }

        task.complete(&profile)?;
        self.record(&task)?;
        tracing::info!(profile_id = %profile.id, name = %profile.name, "Document processed");

        self.schedule_matching(&profile);
        Ok(task)
    }

    fn schedule_matching(&self, profile: &IndustryProfile) {
        // The match run reports through events; its outcome never touches the task.
        drop(self.engine.spawn(&profile.id));
    }

    /// Tries to leave the task terminal when its progress could not be
    /// written. A store that is still down leaves it as last persisted.
    fn fail_after_store_error(&self, task: &mut Task, cause: &SymbiosisError) {
        if task
            .fail(format!("Failed to record task progress: {}", cause))
            .is_err()
        {
            return;
        }
        if let Err(e) = self.record(task) {
            tracing::error!(error = %e, "Failed to record task failure");
        }
    }

    fn record(&self, task: &Task) -> Result<()> {
        self.store.save_task(task)?;
        self.events.task_updated(task);
        Ok(())
    }
}
