//! The persistence contract the pipeline depends on.

use chrono::{DateTime, Utc};

use super::{match_repo, profile_repo, task_repo, Database, DatabaseError};
use crate::models::{IndustryProfile, MatchRecommendation, Task};

/// CRUD operations over profiles, tasks and recommendations.
///
/// Profiles and tasks are upserted by id (last write wins);
/// recommendations are insert-only apart from the confirm flag.
pub trait Store: Send + Sync {
    fn save_profile(&self, profile: &IndustryProfile) -> Result<(), DatabaseError>;
    fn get_profile(&self, id: &str) -> Result<Option<IndustryProfile>, DatabaseError>;
    /// Newest first.
    fn list_profiles(&self) -> Result<Vec<IndustryProfile>, DatabaseError>;

    fn save_task(&self, task: &Task) -> Result<(), DatabaseError>;
    fn get_task(&self, id: &str) -> Result<Option<Task>, DatabaseError>;

    fn insert_match(&self, rec: &MatchRecommendation) -> Result<(), DatabaseError>;
    fn get_match(&self, id: &str) -> Result<Option<MatchRecommendation>, DatabaseError>;
    /// Score descending.
    fn matches_for_producer(
        &self,
        producer_id: &str,
    ) -> Result<Vec<MatchRecommendation>, DatabaseError>;
    /// Returns `false` if the recommendation does not exist.
    fn confirm_match(&self, id: &str, at: DateTime<Utc>) -> Result<bool, DatabaseError>;
}

impl Store for Database {
    fn save_profile(&self, profile: &IndustryProfile) -> Result<(), DatabaseError> {
        profile_repo::upsert(self, profile)
    }

    fn get_profile(&self, id: &str) -> Result<Option<IndustryProfile>, DatabaseError> {
        profile_repo::find_by_id(self, id)
    }

    fn list_profiles(&self) -> Result<Vec<IndustryProfile>, DatabaseError> {
        profile_repo::list_all(self)
    }

    fn save_task(&self, task: &Task) -> Result<(), DatabaseError> {
        task_repo::upsert(self, task)
    }

    fn get_task(&self, id: &str) -> Result<Option<Task>, DatabaseError> {
        task_repo::find_by_id(self, id)
    }

    fn insert_match(&self, rec: &MatchRecommendation) -> Result<(), DatabaseError> {
        match_repo::insert(self, rec)
    }

    fn get_match(&self, id: &str) -> Result<Option<MatchRecommendation>, DatabaseError> {
        match_repo::find_by_id(self, id)
    }

    fn matches_for_producer(
        &self,
        producer_id: &str,
    ) -> Result<Vec<MatchRecommendation>, DatabaseError> {
        match_repo::find_by_producer(self, producer_id)
    }

    fn confirm_match(&self, id: &str, at: DateTime<Utc>) -> Result<bool, DatabaseError> {
        match_repo::confirm(self, id, at)
    }
}
