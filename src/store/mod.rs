//! Offline document store
//!
//! Persistent key-value cache of document bytes and page-1 thumbnails,
//! keyed by filename.
//!
//! # Variants
//!
//! ```text
//!                     probe_capability(&StoreConfig)
//!                                │
//!        ┌───────────────────────┼────────────────────────┐
//!        ▼                       ▼                        ▼
//! ┌──────────────┐      ┌────────────────┐      ┌──────────────────┐
//! │ SqliteStore  │      │  MemoryStore   │      │ UnsupportedStore │
//! │ (persistent) │      │  (ephemeral)   │      │ (always fails)   │
//! └──────────────┘      └────────────────┘      └──────────────────┘
//! ```
//!
//! All three implement [`DocumentStore`], so the rest of the crate never
//! checks which one it got.

mod memory;
mod sqlite;
mod traits;
mod types;
mod unsupported;

use std::path::Path;
use std::sync::Arc;

pub use memory::MemoryDocumentStore;
pub use sqlite::{SqliteDocumentStore, SCHEMA_VERSION};
pub use traits::DocumentStore;
pub use types::{StoreCapability, StoreEntry, Thumbnail};
pub use unsupported::UnsupportedDocumentStore;

use crate::config::{StoreBackend, StoreConfig};

/// Decide which store variant the host can support
pub fn probe_capability(config: &StoreConfig) -> StoreCapability {
    match &config.backend {
        StoreBackend::Disabled => StoreCapability::Unsupported,
        StoreBackend::Memory => StoreCapability::Ephemeral,
        StoreBackend::Sqlite { path } => {
            if can_persist_at(path) {
                StoreCapability::Persistent
            } else {
                StoreCapability::Unsupported
            }
        }
    }
}

fn can_persist_at(path: &Path) -> bool {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    if let Err(e) = std::fs::create_dir_all(parent) {
        tracing::warn!(path = %parent.display(), "Cannot create store directory: {}", e);
        return false;
    }

    match std::fs::metadata(parent) {
        Ok(meta) if meta.is_dir() && !meta.permissions().readonly() => true,
        Ok(_) => {
            tracing::warn!(path = %parent.display(), "Store directory is not writable");
            false
        }
        Err(e) => {
            tracing::warn!(path = %parent.display(), "Cannot inspect store directory: {}", e);
            false
        }
    }
}

/// Probe the host and build the matching store
pub fn open_store(config: &StoreConfig) -> Arc<dyn DocumentStore> {
    match (probe_capability(config), &config.backend) {
        (StoreCapability::Persistent, StoreBackend::Sqlite { path }) => {
            Arc::new(SqliteDocumentStore::new(path.clone()))
        }
        (StoreCapability::Ephemeral, _) => {
            tracing::info!("Using in-memory document store; documents will not survive restart");
            Arc::new(MemoryDocumentStore::new())
        }
        _ => {
            tracing::warn!("Persistent storage unavailable; offline document cache disabled");
            Arc::new(UnsupportedDocumentStore)
        }
    }
}
