use rusqlite::{Connection, OptionalExtension};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Malformed document {collection}/{id}: {source}")]
    DocumentError {
        collection: String,
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
}

/// A schema-less record as held by the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub parent_id: Option<String>,
    pub category: Option<String>,
    pub body: serde_json::Value,
}

/// Optional narrowing applied to a collection listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    pub parent_id: Option<String>,
    pub category: Option<String>,
}

impl DocumentFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_parent(parent_id: impl Into<String>) -> Self {
        Self {
            parent_id: Some(parent_id.into()),
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Document collection operations the repositories are written against
pub trait DocumentStore {
    /// Insert or overwrite the document with the same id
    fn put(&self, collection: &str, doc: &StoredDocument) -> Result<(), DatabaseError>;
    fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>, DatabaseError>;
    /// Documents in insertion order
    fn list(&self, collection: &str, filter: &DocumentFilter) -> Result<Vec<StoredDocument>, DatabaseError>;
    /// Returns whether a document was removed
    fn delete(&self, collection: &str, id: &str) -> Result<bool, DatabaseError>;
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create a new database connection and initialize the schema
    pub fn new(path: &str) -> Result<Self, DatabaseError> {
        let db_path = PathBuf::from(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        tracing::debug!(path = %db_path.display(), "opened database");

        let db = Database { conn };
        db.initialize_schema()?;

        Ok(db)
    }

    /// Open a private in-memory database (tests, dry runs)
    pub fn in_memory() -> Result<Self, DatabaseError> {
        let db = Database {
            conn: Connection::open_in_memory()?,
        };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Initialize the database schema (tables and indexes)
    fn initialize_schema(&self) -> Result<(), DatabaseError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                collection      TEXT NOT NULL,
                id              TEXT NOT NULL,
                parent_id       TEXT,
                category        TEXT,
                body            TEXT NOT NULL,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_documents_parent ON documents(collection, parent_id)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_documents_category ON documents(collection, category)",
            [],
        )?;

        Ok(())
    }

    /// Get a reference to the underlying connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn row_to_document(collection: &str, row: &rusqlite::Row) -> Result<StoredDocument, DatabaseError> {
        let id: String = row.get(0)?;
        let body: String = row.get(3)?;
        let body = serde_json::from_str(&body).map_err(|source| DatabaseError::DocumentError {
            collection: collection.to_string(),
            id: id.clone(),
            source,
        })?;
        Ok(StoredDocument {
            id,
            parent_id: row.get(1)?,
            category: row.get(2)?,
            body,
        })
    }
}

fn timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

impl DocumentStore for Database {
    fn put(&self, collection: &str, doc: &StoredDocument) -> Result<(), DatabaseError> {
        let body = serde_json::to_string(&doc.body).map_err(|source| DatabaseError::DocumentError {
            collection: collection.to_string(),
            id: doc.id.clone(),
            source,
        })?;
        let now = timestamp();

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO documents (collection, id, parent_id, category, body, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             ON CONFLICT(collection, id) DO UPDATE SET
                parent_id = excluded.parent_id,
                category = excluded.category,
                body = excluded.body,
                updated_at = excluded.updated_at",
            rusqlite::params![collection, doc.id, doc.parent_id, doc.category, body, now],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, parent_id, category, body FROM documents WHERE collection = ?1 AND id = ?2",
        )?;
        let row = stmt
            .query_row(rusqlite::params![collection, id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .optional()?;

        match row {
            Some((id, parent_id, category, body)) => {
                let body = serde_json::from_str(&body).map_err(|source| DatabaseError::DocumentError {
                    collection: collection.to_string(),
                    id: id.clone(),
                    source,
                })?;
                Ok(Some(StoredDocument { id, parent_id, category, body }))
            }
            None => Ok(None),
        }
    }

    fn list(&self, collection: &str, filter: &DocumentFilter) -> Result<Vec<StoredDocument>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, parent_id, category, body FROM documents
             WHERE collection = ?1
               AND (?2 IS NULL OR parent_id = ?2)
               AND (?3 IS NULL OR category = ?3)
             ORDER BY created_at ASC, rowid ASC",
        )?;
        let mut rows = stmt.query(rusqlite::params![collection, filter.parent_id, filter.category])?;

        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            documents.push(Self::row_to_document(collection, row)?);
        }
        Ok(documents)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<bool, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            rusqlite::params![collection, id],
        )?;
        tx.commit()?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, parent: Option<&str>, category: Option<&str>, body: serde_json::Value) -> StoredDocument {
        StoredDocument {
            id: id.to_string(),
            parent_id: parent.map(str::to_string),
            category: category.map(str::to_string),
            body,
        }
    }

    #[test]
    fn put_get_roundtrip_and_overwrite() {
        let db = Database::in_memory().unwrap();
        db.put("vehicles", &doc("a", Some("u1"), None, json!({"name": "Golf"}))).unwrap();
        db.put("vehicles", &doc("a", Some("u1"), None, json!({"name": "Polo"}))).unwrap();

        let stored = db.get("vehicles", "a").unwrap().unwrap();
        assert_eq!(stored.body["name"], "Polo");
        assert_eq!(db.list("vehicles", &DocumentFilter::all()).unwrap().len(), 1);
        assert!(db.get("vehicles", "missing").unwrap().is_none());
    }

    #[test]
    fn list_filters_by_parent_and_category() {
        let db = Database::in_memory().unwrap();
        db.put("maintenance", &doc("1", Some("v1"), Some("Oil"), json!({}))).unwrap();
        db.put("maintenance", &doc("2", Some("v1"), Some("Tyres"), json!({}))).unwrap();
        db.put("maintenance", &doc("3", Some("v2"), Some("Oil"), json!({}))).unwrap();
        db.put("fuel_logs", &doc("4", Some("v1"), None, json!({}))).unwrap();

        let v1 = db.list("maintenance", &DocumentFilter::by_parent("v1")).unwrap();
        assert_eq!(v1.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(), vec!["1", "2"]);

        let v1_oil = db
            .list("maintenance", &DocumentFilter::by_parent("v1").with_category("Oil"))
            .unwrap();
        assert_eq!(v1_oil.len(), 1);

        let oil = db
            .list("maintenance", &DocumentFilter::all().with_category("Oil"))
            .unwrap();
        assert_eq!(oil.len(), 2);
    }

    #[test]
    fn delete_reports_removal() {
        let db = Database::in_memory().unwrap();
        db.put("reminders", &doc("r", None, None, json!({}))).unwrap();
        assert!(db.delete("reminders", "r").unwrap());
        assert!(!db.delete("reminders", "r").unwrap());
    }

    #[test]
    fn file_database_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("garage.db");
        let db = Database::new(path.to_str().unwrap()).unwrap();
        db.put("vehicles", &doc("a", None, None, json!({"n": 1}))).unwrap();
        drop(db);

        let reopened = Database::new(path.to_str().unwrap()).unwrap();
        assert!(reopened.get("vehicles", "a").unwrap().is_some());
    }
}
