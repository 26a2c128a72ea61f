//! Test harness for isolated pipeline execution.
//!
//! The `TestHarness` owns a temp directory holding the SQLite file and the
//! upload directory, and wires them into a `SymbiosisService` together with
//! a `ScriptedOracle` and a `QueueParser`.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::broadcast;

use symbiosis::broadcast::{EventBroadcaster, PipelineEvent};
use symbiosis::db::{Database, Store};
use symbiosis::error::ParseError;
use symbiosis::matching::MatchRunSummary;
use symbiosis::models::{IndustryProfile, Output, Task};
use symbiosis::oracle::{
    Classification, ConversionEstimate, ExtractedProfile, OracleError, SymbiosisOracle,
};
use symbiosis::storage::BlobStorage;
use symbiosis::SymbiosisService;

/// Oracle double answering from per-waste and per-candidate tables.
///
/// Unknown wastes get no candidates and unknown candidates get the
/// documented conversion fallback.
#[derive(Default)]
pub struct ScriptedOracle {
    candidates: Mutex<HashMap<String, Vec<String>>>,
    conversions: Mutex<HashMap<String, ConversionEstimate>>,
    failing_lookups: Mutex<HashSet<String>>,
    failing_estimates: Mutex<HashSet<String>>,
    fail_explain: Mutex<bool>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn candidates_for(&self, waste: &str, names: &[&str]) {
        self.candidates.lock().unwrap().insert(
            waste.to_string(),
            names.iter().map(|n| n.to_string()).collect(),
        );
    }

    pub fn conversion_for(&self, candidate: &str, estimate: ConversionEstimate) {
        self.conversions
            .lock()
            .unwrap()
            .insert(candidate.to_string(), estimate);
    }

    pub fn fail_lookup_for(&self, waste: &str) {
        self.failing_lookups.lock().unwrap().insert(waste.to_string());
    }

    pub fn fail_estimate_for(&self, candidate: &str) {
        self.failing_estimates
            .lock()
            .unwrap()
            .insert(candidate.to_string());
    }

    pub fn fail_explanations(&self) {
        *self.fail_explain.lock().unwrap() = true;
    }

    /// Operation log, e.g. `find_candidates:slag`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

fn unavailable() -> OracleError {
    OracleError::ServiceUnavailable("scripted failure".to_string())
}

#[async_trait]
impl SymbiosisOracle for ScriptedOracle {
    async fn extract(&self, raw_text: &str) -> Result<ExtractedProfile, OracleError> {
        self.record("extract".to_string());
        Ok(ExtractedProfile::Raw {
            raw_response: raw_text.to_string(),
        })
    }

    async fn classify(&self, stream_name: &str, _state: &str) -> Result<Classification, OracleError> {
        self.record(format!("classify:{stream_name}"));
        Ok(Classification::fallback())
    }

    async fn find_candidates(
        &self,
        waste: &Output,
        _pool: &[IndustryProfile],
    ) -> Result<Vec<String>, OracleError> {
        self.record(format!("find_candidates:{}", waste.name));
        if self.failing_lookups.lock().unwrap().contains(&waste.name) {
            return Err(unavailable());
        }
        Ok(self
            .candidates
            .lock()
            .unwrap()
            .get(&waste.name)
            .cloned()
            .unwrap_or_default())
    }

    async fn estimate_conversion(
        &self,
        waste: &Output,
        target_input: &str,
    ) -> Result<ConversionEstimate, OracleError> {
        self.record(format!("estimate_conversion:{}:{}", waste.name, target_input));
        if self.failing_estimates.lock().unwrap().contains(target_input) {
            return Err(unavailable());
        }
        Ok(self
            .conversions
            .lock()
            .unwrap()
            .get(target_input)
            .cloned()
            .unwrap_or_else(ConversionEstimate::fallback))
    }

    async fn explain(
        &self,
        waste: &Output,
        candidate: &IndustryProfile,
        _conversion: &ConversionEstimate,
    ) -> Result<String, OracleError> {
        self.record(format!("explain:{}:{}", waste.name, candidate.name));
        if *self.fail_explain.lock().unwrap() {
            return Err(unavailable());
        }
        Ok(format!("{} can take {}", candidate.name, waste.name))
    }
}

/// Parser double returning queued results in order; an empty queue is a
/// rejection.
#[derive(Default)]
pub struct QueueParser {
    results: Mutex<VecDeque<Result<IndustryProfile, String>>>,
    requests: Mutex<Vec<(String, String)>>,
}

impl QueueParser {
    pub fn push_profile(&self, profile: IndustryProfile) {
        self.results.lock().unwrap().push_back(Ok(profile));
    }

    pub fn push_failure(&self, body: &str) {
        self.results.lock().unwrap().push_back(Err(body.to_string()));
    }

    /// `(file_url, filename)` pairs received so far.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl symbiosis::parser::DocumentParser for QueueParser {
    async fn parse(&self, file_url: &str, filename: &str) -> Result<IndustryProfile, ParseError> {
        self.requests
            .lock()
            .unwrap()
            .push((file_url.to_string(), filename.to_string()));
        match self.results.lock().unwrap().pop_front() {
            Some(Ok(profile)) => Ok(profile),
            Some(Err(body)) => Err(ParseError::Rejected { status: 500, body }),
            None => Err(ParseError::Rejected {
                status: 500,
                body: "no scripted result".to_string(),
            }),
        }
    }
}

/// Isolated service instance backed by a temp directory.
pub struct TestHarness {
    temp_dir: TempDir,
    pub db: Arc<Database>,
    pub oracle: Arc<ScriptedOracle>,
    pub parser: Arc<QueueParser>,
    pub service: SymbiosisService,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db = Arc::new(
            Database::open(&temp_dir.path().join("data").join("symbiosis.db"))
                .expect("Failed to open database"),
        );
        let oracle = Arc::new(ScriptedOracle::new());
        let parser = Arc::new(QueueParser::default());
        let service = SymbiosisService::new(
            db.clone(),
            BlobStorage::new(temp_dir.path().join("uploads")),
            oracle.clone(),
            parser.clone(),
            EventBroadcaster::new(64),
        );

        Self {
            temp_dir,
            db,
            oracle,
            parser,
            service,
        }
    }

    pub fn seed(&self, profile: &IndustryProfile) {
        self.db.save_profile(profile).expect("Failed to seed profile");
    }

    /// Uploads a text document and waits for its task to finish.
    pub async fn upload(&self, filename: &str) -> Task {
        let (_receipt, handle) = self
            .service
            .submit_upload(filename, b"company profile text")
            .expect("Upload rejected");
        handle
            .await
            .expect("Processing task panicked")
            .expect("Processing aborted")
    }

    /// Uploads a document whose parse yields `profile` and waits until the
    /// match run for it has completed.
    pub async fn ingest(&self, profile: IndustryProfile) -> (Task, MatchRunSummary) {
        let mut events = self.service.subscribe();
        let producer_id = profile.id.clone();
        self.parser.push_profile(profile);
        let task = self.upload("profile.pdf").await;
        let summary = wait_for_match_run(&mut events, &producer_id).await;
        (task, summary)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Receives events until the match run for `producer_id` completes.
pub async fn wait_for_match_run(
    events: &mut broadcast::Receiver<PipelineEvent>,
    producer_id: &str,
) -> MatchRunSummary {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match events.recv().await {
                Ok(PipelineEvent::MatchRunCompleted(summary))
                    if summary.producer_id == producer_id =>
                {
                    return summary;
                }
                Ok(_) => continue,
                Err(e) => panic!("event stream closed: {e}"),
            }
        }
    })
    .await
    .expect("Timed out waiting for match run")
}
