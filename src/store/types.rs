//! Store types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Decoded raster preview of page 1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    /// RGBA pixels, row-major
    pub pixels: Vec<u8>,
}

/// A stored document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    pub filename: String,
    pub content: Vec<u8>,
    pub thumbnail: Option<Thumbnail>,
    /// Time of the last full write
    pub stored_at: DateTime<Utc>,
}

impl StoreEntry {
    pub fn new(filename: impl Into<String>, content: Vec<u8>, thumbnail: Option<Thumbnail>) -> Self {
        Self {
            filename: filename.into(),
            content,
            thumbnail,
            stored_at: Utc::now(),
        }
    }
}

/// Result of the startup capability probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreCapability {
    Persistent,
    Ephemeral,
    Unsupported,
}
