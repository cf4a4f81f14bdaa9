//! Document store trait

use async_trait::async_trait;

use super::types::{StoreEntry, Thumbnail};
use crate::error::StoreError;

/// Asynchronous key-value store of documents keyed by filename
///
/// Every variant exposes the same surface, so callers never branch on
/// whether persistent storage is available.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch an entry. Absence is `Ok(None)`, never an error.
    async fn get(&self, filename: &str) -> Result<Option<StoreEntry>, StoreError>;

    /// Write an entry, fully replacing any previous one
    async fn set(
        &self,
        filename: &str,
        content: &[u8],
        thumbnail: Option<&Thumbnail>,
    ) -> Result<(), StoreError>;

    /// Remove an entry. Removing an absent key succeeds.
    async fn delete(&self, filename: &str) -> Result<(), StoreError>;

    /// Remove all entries
    async fn clear(&self) -> Result<(), StoreError>;

    /// All stored filenames, in no particular order
    async fn list_all(&self) -> Result<Vec<String>, StoreError>;
}
