//! SQLite-backed document store
//!
//! One database file with a single `documents` table keyed by filename.
//! The connection pool is opened on first use and shared for the lifetime
//! of the store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use tokio::sync::OnceCell;

use super::traits::DocumentStore;
use super::types::{StoreEntry, Thumbnail};
use crate::error::StoreError;

/// Layout version recorded in `PRAGMA user_version`
pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    filename TEXT PRIMARY KEY,
    content BLOB NOT NULL,
    thumbnail_width INTEGER,
    thumbnail_height INTEGER,
    thumbnail_pixels BLOB,
    stored_at TEXT NOT NULL
);
"#;

pub struct SqliteDocumentStore {
    path: PathBuf,
    pool: OnceCell<SqlitePool>,
}

impl SqliteDocumentStore {
    /// Create a store for the given database file. Nothing is opened yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pool: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Shared pool, opened on first call
    ///
    /// Concurrent first callers wait on one open attempt. A failed open
    /// leaves the cell empty so the next operation tries again.
    async fn pool(&self) -> Result<&SqlitePool, StoreError> {
        self.pool.get_or_try_init(|| open_pool(&self.path)).await
    }
}

async fn open_pool(path: &Path) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    initialize_schema(&pool).await?;

    tracing::info!(path = %path.display(), "Document store opened");
    Ok(pool)
}

async fn initialize_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::query(SCHEMA_SQL).execute(pool).await?;

    let (version,): (i64,) = sqlx::query_as("PRAGMA user_version")
        .fetch_one(pool)
        .await?;

    if version == 0 {
        sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
            .execute(pool)
            .await?;
    } else if version > SCHEMA_VERSION {
        tracing::warn!(
            found = version,
            supported = SCHEMA_VERSION,
            "Document store was written by a newer layout"
        );
    }

    Ok(())
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    filename: String,
    content: Vec<u8>,
    thumbnail_width: Option<i64>,
    thumbnail_height: Option<i64>,
    thumbnail_pixels: Option<Vec<u8>>,
    stored_at: String,
}

impl DocumentRow {
    fn into_entry(self) -> Result<StoreEntry, StoreError> {
        let thumbnail = match (self.thumbnail_width, self.thumbnail_height, self.thumbnail_pixels) {
            (Some(width), Some(height), Some(pixels)) => Some(Thumbnail {
                width: to_dimension(width)?,
                height: to_dimension(height)?,
                pixels,
            }),
            _ => None,
        };

        let stored_at = DateTime::parse_from_rfc3339(&self.stored_at)
            .map_err(|e| StoreError::Transactional(format!("Invalid stored_at: {}", e)))?
            .with_timezone(&Utc);

        Ok(StoreEntry {
            filename: self.filename,
            content: self.content,
            thumbnail,
            stored_at,
        })
    }
}

fn to_dimension(value: i64) -> Result<u32, StoreError> {
    u32::try_from(value)
        .map_err(|_| StoreError::Transactional(format!("Invalid thumbnail dimension: {}", value)))
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get(&self, filename: &str) -> Result<Option<StoreEntry>, StoreError> {
        let pool = self.pool().await?;

        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT filename, content, thumbnail_width, thumbnail_height,
                   thumbnail_pixels, stored_at
            FROM documents
            WHERE filename = ?
            "#,
        )
        .bind(filename)
        .fetch_optional(pool)
        .await?;

        row.map(DocumentRow::into_entry).transpose()
    }

    async fn set(
        &self,
        filename: &str,
        content: &[u8],
        thumbnail: Option<&Thumbnail>,
    ) -> Result<(), StoreError> {
        let pool = self.pool().await?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO documents (filename, content, thumbnail_width, thumbnail_height, thumbnail_pixels, stored_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(filename) DO UPDATE SET
                content = excluded.content,
                thumbnail_width = excluded.thumbnail_width,
                thumbnail_height = excluded.thumbnail_height,
                thumbnail_pixels = excluded.thumbnail_pixels,
                stored_at = excluded.stored_at
            "#,
        )
        .bind(filename)
        .bind(content)
        .bind(thumbnail.map(|t| i64::from(t.width)))
        .bind(thumbnail.map(|t| i64::from(t.height)))
        .bind(thumbnail.map(|t| t.pixels.as_slice()))
        .bind(&now)
        .execute(pool)
        .await?;

        tracing::debug!(filename = %filename, bytes = content.len(), "Stored document");
        Ok(())
    }

    async fn delete(&self, filename: &str) -> Result<(), StoreError> {
        let pool = self.pool().await?;

        sqlx::query("DELETE FROM documents WHERE filename = ?")
            .bind(filename)
            .execute(pool)
            .await?;

        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let pool = self.pool().await?;
        sqlx::query("DELETE FROM documents").execute(pool).await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<String>, StoreError> {
        let pool = self.pool().await?;

        let rows: Vec<(String,)> = sqlx::query_as("SELECT filename FROM documents")
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(|(filename,)| filename).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_store() -> (TempDir, SqliteDocumentStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteDocumentStore::new(dir.path().join("documents.db"));
        (dir, store)
    }

    #[tokio::test]
    async fn test_round_trip() {
        let (_dir, store) = setup_store();
        let content = b"%PDF-1.7 round trip".to_vec();

        store.set("report.pdf", &content, None).await.unwrap();

        let entry = store.get("report.pdf").await.unwrap().unwrap();
        assert_eq!(entry.filename, "report.pdf");
        assert_eq!(entry.content, content);
        assert!(entry.thumbnail.is_none());
    }

    #[tokio::test]
    async fn test_missing_entry_is_none() {
        let (_dir, store) = setup_store();
        assert_eq!(store.get("nope.pdf").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_thumbnail_is_persisted_and_overwritten() {
        let (_dir, store) = setup_store();
        let thumb = Thumbnail { width: 2, height: 3, pixels: vec![7; 24] };

        store.set("a.pdf", b"one", Some(&thumb)).await.unwrap();
        let entry = store.get("a.pdf").await.unwrap().unwrap();
        assert_eq!(entry.thumbnail, Some(thumb));

        store.set("a.pdf", b"two", None).await.unwrap();
        let entry = store.get("a.pdf").await.unwrap().unwrap();
        assert_eq!(entry.content, b"two");
        assert!(entry.thumbnail.is_none());
    }

    #[tokio::test]
    async fn test_delete_absent_key_succeeds() {
        let (_dir, store) = setup_store();
        store.set("keep.pdf", b"k", None).await.unwrap();

        store.delete("ghost.pdf").await.unwrap();
        store.delete("keep.pdf").await.unwrap();
        store.delete("keep.pdf").await.unwrap();

        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_and_clear() {
        let (_dir, store) = setup_store();
        store.set("b.pdf", b"b", None).await.unwrap();
        store.set("a.pdf", b"a", None).await.unwrap();

        let mut names = store.list_all().await.unwrap();
        names.sort();
        assert_eq!(names, vec!["a.pdf".to_string(), "b.pdf".to_string()]);

        store.clear().await.unwrap();
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("documents.db");

        SqliteDocumentStore::new(&path)
            .set("kept.pdf", b"persisted", None)
            .await
            .unwrap();

        let reopened = SqliteDocumentStore::new(&path);
        let entry = reopened.get("kept.pdf").await.unwrap().unwrap();
        assert_eq!(entry.content, b"persisted");
    }

    #[tokio::test]
    async fn test_schema_version_recorded() {
        let (_dir, store) = setup_store();
        let pool = store.pool().await.unwrap();

        let (version,): (i64,) = sqlx::query_as("PRAGMA user_version")
            .fetch_one(pool)
            .await
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_failed_open_is_retried() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("later");
        let store = SqliteDocumentStore::new(nested.join("documents.db"));

        assert!(matches!(store.list_all().await, Err(StoreError::Transactional(_))));

        std::fs::create_dir_all(&nested).unwrap();
        assert!(store.list_all().await.unwrap().is_empty());
    }
}
