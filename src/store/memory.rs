//! In-memory document store
//!
//! Same contract as the SQLite store without persistence. Used for
//! ephemeral runs and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::traits::DocumentStore;
use super::types::{StoreEntry, Thumbnail};
use crate::error::StoreError;

#[derive(Default)]
pub struct MemoryDocumentStore {
    entries: RwLock<HashMap<String, StoreEntry>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, filename: &str) -> Result<Option<StoreEntry>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.get(filename).cloned())
    }

    async fn set(
        &self,
        filename: &str,
        content: &[u8],
        thumbnail: Option<&Thumbnail>,
    ) -> Result<(), StoreError> {
        let entry = StoreEntry::new(filename, content.to_vec(), thumbnail.cloned());
        let mut entries = self.entries.write().await;
        entries.insert(filename.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, filename: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.remove(filename);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.clear();
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<String>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.keys().cloned().collect())
    }
}
