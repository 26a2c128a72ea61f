//! Match repository: insert-only recommendations plus the confirm flag.

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use super::{format_timestamp, parse_timestamp, Database, DatabaseError};
use crate::models::{Converter, MatchRecommendation};

#[derive(Debug, Clone)]
pub struct MatchRow {
    pub id: String,
    pub waste_id: String,
    pub producer_id: String,
    pub candidate_id: String,
    pub conversion_needed: bool,
    pub conversion_description: Option<String>,
    pub recommended_converter: String,
    pub score: f64,
    pub reasoning: String,
    pub estimated_cost: Option<String>,
    pub created_at: String,
    pub confirmed: bool,
    pub confirmed_at: Option<String>,
}

impl MatchRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            waste_id: row.get("waste_id")?,
            producer_id: row.get("producer_id")?,
            candidate_id: row.get("candidate_id")?,
            conversion_needed: row.get("conversion_needed")?,
            conversion_description: row.get("conversion_description")?,
            recommended_converter: row.get("recommended_converter")?,
            score: row.get("score")?,
            reasoning: row.get("reasoning")?,
            estimated_cost: row.get("estimated_cost")?,
            created_at: row.get("created_at")?,
            confirmed: row.get("confirmed")?,
            confirmed_at: row.get("confirmed_at")?,
        })
    }

    pub fn from_recommendation(rec: &MatchRecommendation) -> Self {
        Self {
            id: rec.id.clone(),
            waste_id: rec.waste_id.clone(),
            producer_id: rec.producer_id.clone(),
            candidate_id: rec.candidate_id.clone(),
            conversion_needed: rec.conversion_needed,
            conversion_description: rec.conversion_description.clone(),
            recommended_converter: rec.recommended_converter.as_str().to_string(),
            score: rec.score,
            reasoning: rec.reasoning.clone(),
            estimated_cost: rec.estimated_cost.clone(),
            created_at: format_timestamp(rec.created_at),
            confirmed: rec.confirmed,
            confirmed_at: rec.confirmed_at.map(format_timestamp),
        }
    }

    pub fn into_recommendation(self) -> Result<MatchRecommendation, DatabaseError> {
        Ok(MatchRecommendation {
            recommended_converter: Converter::parse_lenient(&self.recommended_converter),
            created_at: parse_timestamp("created_at", &self.created_at)?,
            confirmed_at: self
                .confirmed_at
                .as_deref()
                .map(|s| parse_timestamp("confirmed_at", s))
                .transpose()?,
            id: self.id,
            waste_id: self.waste_id,
            producer_id: self.producer_id,
            candidate_id: self.candidate_id,
            conversion_needed: self.conversion_needed,
            conversion_description: self.conversion_description,
            score: self.score,
            reasoning: self.reasoning,
            estimated_cost: self.estimated_cost,
            confirmed: self.confirmed,
        })
    }
}

/// Inserts a new recommendation. Recommendations are never updated
/// apart from [`confirm`].
pub fn insert(db: &Database, rec: &MatchRecommendation) -> Result<(), DatabaseError> {
    let row = MatchRow::from_recommendation(rec);
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO match_recommendations (id, waste_id, producer_id, candidate_id,
             conversion_needed, conversion_description, recommended_converter, score,
             reasoning, estimated_cost, created_at, confirmed, confirmed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                row.id,
                row.waste_id,
                row.producer_id,
                row.candidate_id,
                row.conversion_needed,
                row.conversion_description,
                row.recommended_converter,
                row.score,
                row.reasoning,
                row.estimated_cost,
                row.created_at,
                row.confirmed,
                row.confirmed_at,
            ],
        )?;
        Ok(())
    })
}

pub fn find_by_id(db: &Database, id: &str) -> Result<Option<MatchRecommendation>, DatabaseError> {
    let row = db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM match_recommendations WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], MatchRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })?;
    row.map(MatchRow::into_recommendation).transpose()
}

/// Recommendations where the profile is the producer, best score first.
pub fn find_by_producer(
    db: &Database,
    producer_id: &str,
) -> Result<Vec<MatchRecommendation>, DatabaseError> {
    let rows = db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM match_recommendations WHERE producer_id = ?1
             ORDER BY score DESC, created_at ASC",
        )?;
        let rows = stmt
            .query_map(params![producer_id], MatchRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })?;
    rows.into_iter().map(MatchRow::into_recommendation).collect()
}

/// Sets `confirmed`. `confirmed_at` is only stamped the first time.
/// Returns `false` when no recommendation has the given id.
pub fn confirm(db: &Database, id: &str, at: DateTime<Utc>) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE match_recommendations
             SET confirmed = 1, confirmed_at = COALESCE(confirmed_at, ?2)
             WHERE id = ?1",
            params![id, format_timestamp(at)],
        )?;
        Ok(changed > 0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::profile_repo;
    use crate::models::{IndustryProfile, Location};
    use chrono::Duration;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    fn seed_profiles(db: &Database) -> (IndustryProfile, IndustryProfile) {
        let producer = IndustryProfile::new("Producer", Location::default(), vec![], vec![]);
        let candidate = IndustryProfile::new("Candidate", Location::default(), vec![], vec![]);
        profile_repo::upsert(db, &producer).unwrap();
        profile_repo::upsert(db, &candidate).unwrap();
        (producer, candidate)
    }

    fn sample_match(producer: &str, candidate: &str, score: f64) -> MatchRecommendation {
        let mut rec = MatchRecommendation::new("fly ash", producer, candidate);
        rec.score = score;
        rec.conversion_needed = true;
        rec.conversion_description = Some("Grind and sieve".to_string());
        rec.recommended_converter = Converter::ThirdParty;
        rec.reasoning = "Fly ash replaces part of the clinker".to_string();
        rec.estimated_cost = Some("$10/ton".to_string());
        rec
    }

    #[test]
    fn test_insert_and_find() {
        let db = test_db();
        let (p, c) = seed_profiles(&db);
        let rec = sample_match(&p.id, &c.id, 0.8);
        insert(&db, &rec).unwrap();

        let found = find_by_id(&db, &rec.id).unwrap().unwrap();
        assert_eq!(found.recommended_converter, Converter::ThirdParty);
        assert_eq!(found.conversion_description.as_deref(), Some("Grind and sieve"));
        assert!((found.score - 0.8).abs() < f64::EPSILON);
        assert!(!found.confirmed);
    }

    #[test]
    fn test_find_by_producer_orders_by_score() {
        let db = test_db();
        let (p, c) = seed_profiles(&db);
        for score in [0.4, 0.95, 0.7] {
            insert(&db, &sample_match(&p.id, &c.id, score)).unwrap();
        }
        // Candidate-side rows are not returned for the producer query.
        insert(&db, &sample_match(&c.id, &p.id, 1.0)).unwrap();

        let scores: Vec<f64> = find_by_producer(&db, &p.id)
            .unwrap()
            .iter()
            .map(|m| m.score)
            .collect();
        assert_eq!(scores, vec![0.95, 0.7, 0.4]);
    }

    #[test]
    fn test_insert_requires_known_profiles() {
        let db = test_db();
        let rec = sample_match("ghost", "phantom", 0.5);
        assert!(insert(&db, &rec).is_err());
    }

    #[test]
    fn test_confirm_is_idempotent() {
        let db = test_db();
        let (p, c) = seed_profiles(&db);
        let rec = sample_match(&p.id, &c.id, 0.6);
        insert(&db, &rec).unwrap();

        let first = Utc::now();
        assert!(confirm(&db, &rec.id, first).unwrap());
        let stamped = find_by_id(&db, &rec.id).unwrap().unwrap().confirmed_at;
        assert!(stamped.is_some());

        assert!(confirm(&db, &rec.id, first + Duration::hours(1)).unwrap());
        let again = find_by_id(&db, &rec.id).unwrap().unwrap();
        assert!(again.confirmed);
        assert_eq!(again.confirmed_at, stamped);
    }

    #[test]
    fn test_confirm_unknown_id() {
        let db = test_db();
        assert!(!confirm(&db, "missing", Utc::now()).unwrap());
    }
}
