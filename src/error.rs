//! Error types for PDF Offline
//!
//! Storage, export and save failures are logged and swallowed by their
//! callers. Load and fetch failures are surfaced to the user.

use thiserror::Error;

/// Document store failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The host offers no persistent storage capability
    #[error("Document store works only where persistent storage is available")]
    Unsupported,

    #[error("Store transaction failed: {0}")]
    Transactional(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Transactional(err.to_string())
    }
}

/// Rendering engine failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Engine failed to load document: {0}")]
    Load(String),

    #[error("Engine failed to export document: {0}")]
    Export(String),

    #[error("Engine failed to render thumbnail: {0}")]
    Thumbnail(String),

    #[error("Engine operation timed out after {0} seconds")]
    Timeout(u64),
}

/// Credential (license key) fetch failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Credential request failed: {0}")]
    Request(String),

    #[error("Credential endpoint returned status {0}")]
    Status(u16),
}

/// Network fetch failures for remote documents
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Server responded with status {0}")]
    Status(u16),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Failures that abort a requested load
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Failed to fetch viewer credential: {0}")]
    CredentialFetchFailed(#[source] CredentialError),

    #[error("{0}")]
    EngineLoadFailed(#[source] EngineError),

    #[error("Session controller is no longer running")]
    ControllerClosed,
}

/// Failures surfaced by the fetch-or-cache resolver
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OpenError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Fetch failed with status {status}")]
    FetchFailed { status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid file type, please load a PDF: {0}")]
    InvalidFileType(String),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<FetchError> for OpenError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Status(status) => OpenError::FetchFailed { status },
            FetchError::Transport(msg) => OpenError::Network(msg),
        }
    }
}

/// Resolver result type
pub type Result<T> = std::result::Result<T, OpenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_maps_to_open_error() {
        assert_eq!(
            OpenError::from(FetchError::Status(404)),
            OpenError::FetchFailed { status: 404 }
        );
        assert_eq!(
            OpenError::from(FetchError::Transport("reset".into())),
            OpenError::Network("reset".into())
        );
    }

    #[test]
    fn test_load_error_message_is_transparent() {
        let err = OpenError::from(LoadError::EngineLoadFailed(EngineError::Load(
            "bad xref".into(),
        )));
        assert_eq!(err.to_string(), "Engine failed to load document: bad xref");
    }
}
