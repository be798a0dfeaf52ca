use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension};

use crate::cache::models::OfflineDocument;
use crate::error::AppError;

/// Trait for the local offline document cache.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OfflineCache: Send + Sync {
    /// Store a copy, replacing any existing copy with the same id.
    async fn save(&self, entry: OfflineDocument) -> Result<(), AppError>;

    /// Remove a copy. Returns `false` if nothing was cached under `document_id`.
    async fn remove(&self, document_id: &str) -> Result<bool, AppError>;

    /// Retrieve a copy by id.
    async fn get(&self, document_id: &str) -> Result<Option<OfflineDocument>, AppError>;

    /// All cached copies, newest first.
    async fn list_all(&self) -> Result<Vec<OfflineDocument>, AppError>;

    async fn contains(&self, document_id: &str) -> Result<bool, AppError> {
        Ok(self.get(document_id).await?.is_some())
    }
}

/// SQLite-backed offline cache with a single `offline_documents` table.
pub struct SqliteOfflineCache {
    conn: Mutex<Connection>,
}

impl SqliteOfflineCache {
    /// Open (or create) the cache database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let conn = Connection::open(path.as_ref())?;
        Self::with_connection(conn)
    }

    /// Open a throwaway cache that lives only as long as this value.
    pub fn open_in_memory() -> Result<Self, AppError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, AppError> {
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.create_table()?;
        Ok(cache)
    }

    fn create_table(&self) -> Result<(), AppError> {
        let conn = self.lock()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS offline_documents (
                documentId TEXT PRIMARY KEY NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL DEFAULT '',
                timestamp INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, AppError> {
        self.conn
            .lock()
            .map_err(|_| AppError::Cache("cache connection lock poisoned".into()))
    }

    fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<OfflineDocument> {
        Ok(OfflineDocument {
            document_id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            timestamp: row.get(3)?,
        })
    }
}

#[async_trait]
impl OfflineCache for SqliteOfflineCache {
    async fn save(&self, entry: OfflineDocument) -> Result<(), AppError> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT OR REPLACE INTO offline_documents (documentId, title, content, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![entry.document_id, entry.title, entry.content, entry.timestamp],
        )?;

        tracing::debug!("Cached document '{}' offline", entry.document_id);
        Ok(())
    }

    async fn remove(&self, document_id: &str) -> Result<bool, AppError> {
        let conn = self.lock()?;

        let affected = conn.execute(
            "DELETE FROM offline_documents WHERE documentId = ?1",
            [document_id],
        )?;

        Ok(affected > 0)
    }

    async fn get(&self, document_id: &str) -> Result<Option<OfflineDocument>, AppError> {
        let conn = self.lock()?;

        let entry = conn
            .query_row(
                "SELECT documentId, title, content, timestamp
                 FROM offline_documents WHERE documentId = ?1",
                [document_id],
                Self::row_to_entry,
            )
            .optional()?;

        Ok(entry)
    }

    async fn list_all(&self) -> Result<Vec<OfflineDocument>, AppError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT documentId, title, content, timestamp
             FROM offline_documents
             ORDER BY timestamp DESC, documentId ASC",
        )?;

        let rows = stmt.query_map([], Self::row_to_entry)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }

        Ok(entries)
    }
}

/// In-memory offline cache for tests and demo mode.
#[derive(Default)]
pub struct MemoryOfflineCache {
    entries: Mutex<HashMap<String, OfflineDocument>>,
}

impl MemoryOfflineCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, OfflineDocument>>, AppError> {
        self.entries
            .lock()
            .map_err(|_| AppError::Cache("cache lock poisoned".into()))
    }
}

#[async_trait]
impl OfflineCache for MemoryOfflineCache {
    async fn save(&self, entry: OfflineDocument) -> Result<(), AppError> {
        self.lock()?.insert(entry.document_id.clone(), entry);
        Ok(())
    }

    async fn remove(&self, document_id: &str) -> Result<bool, AppError> {
        Ok(self.lock()?.remove(document_id).is_some())
    }

    async fn get(&self, document_id: &str) -> Result<Option<OfflineDocument>, AppError> {
        Ok(self.lock()?.get(document_id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<OfflineDocument>, AppError> {
        let mut entries: Vec<OfflineDocument> = self.lock()?.values().cloned().collect();
        entries.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.document_id.cmp(&b.document_id))
        });
        Ok(entries)
    }
}
