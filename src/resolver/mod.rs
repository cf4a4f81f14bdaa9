//! Fetch-or-cache resolution
//!
//! Opening a document checks the store first and only goes to the network
//! on a miss. Freshly fetched or imported bytes are written back to the
//! store through the session queue, right behind their own load, so the
//! write never delays the load and never lands after a later save.

mod fetcher;

use std::sync::Arc;

pub use fetcher::{http_client, DocumentFetcher, HttpFetcher};

use crate::engine::looks_like_pdf;
use crate::error::{OpenError, Result};
use crate::interaction::UserInteraction;
use crate::session::SessionController;
use crate::store::{DocumentStore, StoreEntry};

/// Where an opened document came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentSource {
    Cache,
    Network,
    Import,
}

pub struct DocumentResolver {
    store: Arc<dyn DocumentStore>,
    fetcher: Arc<dyn DocumentFetcher>,
    controller: SessionController,
    interaction: Arc<dyn UserInteraction>,
}

impl DocumentResolver {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        fetcher: Arc<dyn DocumentFetcher>,
        controller: SessionController,
        interaction: Arc<dyn UserInteraction>,
    ) -> Self {
        Self {
            store,
            fetcher,
            controller,
            interaction,
        }
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    /// Open `filename`, from the store if present, otherwise from `url`
    pub async fn open(&self, filename: &str, url: Option<&str>) -> Result<DocumentSource> {
        let result = self.resolve(filename, url).await;
        if let Err(e) = &result {
            tracing::error!(filename = %filename, "Failed to open document: {}", e);
            self.interaction
                .alert(&format!("An error occurred while fetching the file:\n{}", e));
        }
        result
    }

    async fn resolve(&self, filename: &str, url: Option<&str>) -> Result<DocumentSource> {
        if let Some(entry) = self.cached(filename).await {
            tracing::info!(filename = %filename, bytes = entry.content.len(), "Opening document from store");
            self.controller.load(entry.content, filename).await?;
            return Ok(DocumentSource::Cache);
        }

        let url = url.ok_or_else(|| OpenError::NotFound(filename.to_string()))?;

        tracing::info!(filename = %filename, url = %url, "Fetching document");
        let content = self.fetcher.fetch(url).await?;

        self.load_and_write_back(filename, content).await?;
        Ok(DocumentSource::Network)
    }

    /// Store lookup; a failing store counts as a miss
    async fn cached(&self, filename: &str) -> Option<StoreEntry> {
        match self.store.get(filename).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(filename = %filename, "Store lookup failed, treating as miss: {}", e);
                None
            }
        }
    }

    /// Open a locally picked file
    pub async fn import(&self, filename: &str, content: Vec<u8>) -> Result<DocumentSource> {
        let result = self.import_inner(filename, content).await;
        if let Err(e) = &result {
            tracing::error!(filename = %filename, "Failed to import document: {}", e);
            self.interaction.alert(&e.to_string());
        }
        result
    }

    async fn import_inner(&self, filename: &str, content: Vec<u8>) -> Result<DocumentSource> {
        if !looks_like_pdf(&content) {
            return Err(OpenError::InvalidFileType(filename.to_string()));
        }

        tracing::info!(filename = %filename, bytes = content.len(), "Importing document");
        self.load_and_write_back(filename, content).await?;
        Ok(DocumentSource::Import)
    }

    /// Load, with the store write queued directly behind it
    async fn load_and_write_back(&self, filename: &str, content: Vec<u8>) -> Result<()> {
        let load = self.controller.load(content.clone(), filename);
        self.controller.write_back(filename, content);
        load.await?;
        Ok(())
    }

    /// Wait for every queued write-back
    pub async fn flush_write_backs(&self) {
        self.controller.settled().await;
    }

    /// Stored filenames, sorted
    pub async fn list_documents(&self) -> Vec<String> {
        match self.store.list_all().await {
            Ok(mut names) => {
                names.sort();
                names
            }
            Err(e) => {
                tracing::warn!("Failed to list stored documents: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn remove(&self, filename: &str) -> Result<()> {
        self.store.delete(filename).await.map_err(|e| {
            tracing::error!(filename = %filename, "Failed to remove document: {}", e);
            self.interaction.alert(&e.to_string());
            OpenError::from(e)
        })
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await.map_err(|e| {
            tracing::error!("Failed to clear document store: {}", e);
            self.interaction.alert(&e.to_string());
            OpenError::from(e)
        })
    }
}

/// Last non-empty path segment of `url`
pub fn filename_from_url(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let last = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    Some(last.to_string())
}

/// Strip scheme and host from URL-shaped names
pub fn display_name(filename: &str) -> String {
    for scheme in ["https://", "http://"] {
        if let Some(rest) = filename.strip_prefix(scheme) {
            return match rest.find('/') {
                Some(idx) => rest[idx..].to_string(),
                None => String::new(),
            };
        }
    }
    filename.to_string()
}
