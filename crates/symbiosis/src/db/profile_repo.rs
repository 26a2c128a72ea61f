//! Profile repository: upsert and lookups for `industry_profiles`.

use rusqlite::{params, Row};

use super::{format_timestamp, parse_timestamp, Database, DatabaseError};
use crate::models::IndustryProfile;

/// A raw profile row. Location, inputs and outputs are JSON text.
#[derive(Debug, Clone)]
pub struct ProfileRow {
    pub id: String,
    pub name: String,
    pub location: String,
    pub inputs: String,
    pub outputs: String,
    pub created_at: String,
    pub updated_at: String,
}

impl ProfileRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            location: row.get("location")?,
            inputs: row.get("inputs")?,
            outputs: row.get("outputs")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn from_profile(profile: &IndustryProfile) -> Result<Self, DatabaseError> {
        Ok(Self {
            id: profile.id.clone(),
            name: profile.name.clone(),
            location: serde_json::to_string(&profile.location)?,
            inputs: serde_json::to_string(&profile.inputs)?,
            outputs: serde_json::to_string(&profile.outputs)?,
            created_at: format_timestamp(profile.created_at),
            updated_at: format_timestamp(profile.updated_at),
        })
    }

    pub fn into_profile(self) -> Result<IndustryProfile, DatabaseError> {
        Ok(IndustryProfile {
            location: serde_json::from_str(&self.location)?,
            inputs: serde_json::from_str(&self.inputs)?,
            outputs: serde_json::from_str(&self.outputs)?,
            created_at: parse_timestamp("created_at", &self.created_at)?,
            updated_at: parse_timestamp("updated_at", &self.updated_at)?,
            id: self.id,
            name: self.name,
        })
    }
}

/// Inserts the profile or replaces every field of an existing one.
/// The original `created_at` is kept on replace.
pub fn upsert(db: &Database, profile: &IndustryProfile) -> Result<(), DatabaseError> {
    let row = ProfileRow::from_profile(profile)?;
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO industry_profiles (id, name, location, inputs, outputs, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                location = excluded.location,
                inputs = excluded.inputs,
                outputs = excluded.outputs,
                updated_at = excluded.updated_at",
            params![
                row.id,
                row.name,
                row.location,
                row.inputs,
                row.outputs,
                row.created_at,
                row.updated_at,
            ],
        )?;
        Ok(())
    })
}

pub fn find_by_id(db: &Database, id: &str) -> Result<Option<IndustryProfile>, DatabaseError> {
    let row = db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM industry_profiles WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], ProfileRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })?;
    row.map(ProfileRow::into_profile).transpose()
}

/// All profiles, newest first.
pub fn list_all(db: &Database) -> Result<Vec<IndustryProfile>, DatabaseError> {
    let rows = db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM industry_profiles ORDER BY created_at DESC, id")?;
        let rows = stmt
            .query_map([], ProfileRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })?;
    rows.into_iter().map(ProfileRow::into_profile).collect()
}
