//! Task repository: CRUD operations for the `tasks` table.

use rusqlite::{params, Row};

use super::{format_timestamp, parse_timestamp, Database, DatabaseError};
use crate::models::Task;

/// A raw task row from the database.
#[derive(Debug, Clone)]
pub struct TaskRow {
    pub id: String,
    pub status: String,
    pub task_type: String,
    pub file_url: Option<String>,
    pub profile_id: Option<String>,
    pub error: Option<String>,
    pub result: Option<String>,
    pub created_at: String,
    pub completed_at: Option<String>,
}

impl TaskRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            status: row.get("status")?,
            task_type: row.get("task_type")?,
            file_url: row.get("file_url")?,
            profile_id: row.get("profile_id")?,
            error: row.get("error")?,
            result: row.get("result")?,
            created_at: row.get("created_at")?,
            completed_at: row.get("completed_at")?,
        })
    }

    pub fn from_task(task: &Task) -> Result<Self, DatabaseError> {
        Ok(Self {
            id: task.id.clone(),
            status: task.status.as_str().to_string(),
            task_type: task.task_type.as_str().to_string(),
            file_url: task.file_url.clone(),
            profile_id: task.profile_id.clone(),
            error: task.error.clone(),
            result: task.result.as_ref().map(serde_json::to_string).transpose()?,
            created_at: format_timestamp(task.created_at),
            completed_at: task.completed_at.map(format_timestamp),
        })
    }

    pub fn into_task(self) -> Result<Task, DatabaseError> {
        let status = self.status.parse().map_err(|_| DatabaseError::InvalidValue {
            column: "status",
            value: self.status.clone(),
        })?;
        let task_type = self
            .task_type
            .parse()
            .map_err(|_| DatabaseError::InvalidValue {
                column: "task_type",
                value: self.task_type.clone(),
            })?;
        Ok(Task {
            id: self.id,
            status,
            task_type,
            file_url: self.file_url,
            profile_id: self.profile_id,
            error: self.error,
            result: self.result.as_deref().map(serde_json::from_str).transpose()?,
            created_at: parse_timestamp("created_at", &self.created_at)?,
            completed_at: self
                .completed_at
                .as_deref()
                .map(|s| parse_timestamp("completed_at", s))
                .transpose()?,
        })
    }
}

/// Inserts the task or overwrites every mutable field of an existing one.
pub fn upsert(db: &Database, task: &Task) -> Result<(), DatabaseError> {
    let row = TaskRow::from_task(task)?;
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO tasks (id, status, task_type, file_url, profile_id, error, result,
             created_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                status = excluded.status,
                file_url = excluded.file_url,
                profile_id = excluded.profile_id,
                error = excluded.error,
                result = excluded.result,
                completed_at = excluded.completed_at",
            params![
                row.id,
                row.status,
                row.task_type,
                row.file_url,
                row.profile_id,
                row.error,
                row.result,
                row.created_at,
                row.completed_at,
            ],
        )?;
        Ok(())
    })
}

/// Finds a task by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<Task>, DatabaseError> {
    let row = db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM tasks WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], TaskRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })?;
    row.map(TaskRow::into_task).transpose()
}

/// Counts tasks with the given status.
pub fn count_by_status(db: &Database, status: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE status = ?1",
            params![status],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::profile_repo;
    use crate::models::{IndustryProfile, Location, TaskStatus};

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    #[test]
    fn test_upsert_and_find_pending() {
        let db = test_db();
        let task = Task::document_parse("/uploads/abc.pdf");
        upsert(&db, &task).unwrap();

        let found = find_by_id(&db, &task.id).unwrap().unwrap();
        assert_eq!(found.status, TaskStatus::Pending);
        assert_eq!(found.file_url.as_deref(), Some("/uploads/abc.pdf"));
        assert!(found.result.is_none());
        assert!(found.completed_at.is_none());
    }

    #[test]
    fn test_upsert_tracks_lifecycle() {
        let db = test_db();
        let profile = IndustryProfile::new("Cannery", Location::default(), vec![], vec![]);
        profile_repo::upsert(&db, &profile).unwrap();

        let mut task = Task::document_parse("/uploads/abc.pdf");
        upsert(&db, &task).unwrap();
        task.start_processing().unwrap();
        upsert(&db, &task).unwrap();
        task.complete(&profile).unwrap();
        upsert(&db, &task).unwrap();

        let found = find_by_id(&db, &task.id).unwrap().unwrap();
        assert_eq!(found.status, TaskStatus::Completed);
        assert_eq!(found.profile_id.as_deref(), Some(profile.id.as_str()));
        assert_eq!(found.result.unwrap()["name"], "Cannery");
        assert!(found.completed_at.is_some());
        assert_eq!(count_by_status(&db, "completed").unwrap(), 1);
        assert_eq!(count_by_status(&db, "pending").unwrap(), 0);
    }

    #[test]
    fn test_failed_task_keeps_error() {
        let db = test_db();
        let mut task = Task::document_parse("/uploads/abc.pdf");
        task.start_processing().unwrap();
        task.fail("Failed to parse document: connection refused").unwrap();
        upsert(&db, &task).unwrap();

        let found = find_by_id(&db, &task.id).unwrap().unwrap();
        assert_eq!(found.status, TaskStatus::Failed);
        assert!(found.error.unwrap().contains("connection refused"));
    }

    #[test]
    fn test_unknown_status_is_invalid_value() {
        let db = test_db();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (id, status, task_type, created_at)
                 VALUES ('t1', 'exploded', 'document_parse', '2026-01-01T00:00:00Z')",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        let err = find_by_id(&db, "t1").unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidValue { column: "status", .. }));
    }
}
