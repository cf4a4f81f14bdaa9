//! Store used when the host cannot persist documents

use async_trait::async_trait;

use super::traits::DocumentStore;
use super::types::{StoreEntry, Thumbnail};
use crate::error::StoreError;

/// Every operation resolves to [`StoreError::Unsupported`]
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedDocumentStore;

#[async_trait]
impl DocumentStore for UnsupportedDocumentStore {
    async fn get(&self, _filename: &str) -> Result<Option<StoreEntry>, StoreError> {
        Err(StoreError::Unsupported)
    }

    async fn set(
        &self,
        _filename: &str,
        _content: &[u8],
        _thumbnail: Option<&Thumbnail>,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unsupported)
    }

    async fn delete(&self, _filename: &str) -> Result<(), StoreError> {
        Err(StoreError::Unsupported)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        Err(StoreError::Unsupported)
    }

    async fn list_all(&self) -> Result<Vec<String>, StoreError> {
        Err(StoreError::Unsupported)
    }
}
