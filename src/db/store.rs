use super::models::CanonicalRecord;
use super::{Database, Result};
use rusqlite::{params, OptionalExtension};

/// Persistence sink for normalized records.
pub trait RecordStore {
    /// Store a record under its id. A record with the same id is replaced.
    fn save(&mut self, record: &CanonicalRecord) -> Result<()>;
}

impl RecordStore for Database {
    fn save(&mut self, record: &CanonicalRecord) -> Result<()> {
        self.save_record(record)
    }
}

impl Database {
    /// Upsert a record document into the `tracks` collection.
    pub fn save_record(&self, record: &CanonicalRecord) -> Result<()> {
        let document = serde_json::to_string(record)?;
        self.conn.execute(
            "INSERT INTO tracks (id, filename, document, updated_at)
             VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(id) DO UPDATE SET
                filename = excluded.filename,
                document = excluded.document,
                updated_at = datetime('now')",
            params![record.id, record.filename, document],
        )?;
        Ok(())
    }

    pub fn get_record(&self, id: &str) -> Result<Option<CanonicalRecord>> {
        let document: Option<String> = self
            .conn
            .query_row(
                "SELECT document FROM tracks WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        match document {
            Some(doc) => Ok(Some(serde_json::from_str(&doc)?)),
            None => Ok(None),
        }
    }

    pub fn record_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM tracks", [], |row| row.get(0))?;
        Ok(count)
    }
}
