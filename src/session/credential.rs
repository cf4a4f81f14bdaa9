//! Viewer credential (license key)
//!
//! Fetched at most once per process. Concurrent callers share one
//! in-flight request; a failed request is forgotten so the next caller
//! starts over.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::error::CredentialError;

/// Where the credential comes from
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn fetch(&self) -> Result<String, CredentialError>;
}

/// Credential known up front
pub struct StaticCredential {
    value: String,
}

impl StaticCredential {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }
}

#[async_trait]
impl CredentialSource for StaticCredential {
    async fn fetch(&self) -> Result<String, CredentialError> {
        Ok(self.value.clone())
    }
}

/// Credential downloaded from a URL; the trimmed body is the key
pub struct HttpCredentialSource {
    client: reqwest::Client,
    url: String,
}

impl HttpCredentialSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl CredentialSource for HttpCredentialSource {
    async fn fetch(&self) -> Result<String, CredentialError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| CredentialError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CredentialError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CredentialError::Request(e.to_string()))?;

        Ok(body.trim().to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    Uninitialized,
    InFlight,
    Resolved,
    /// Last attempt failed; the next call fetches again
    Failed,
}

/// Single-flight, memoized credential
pub struct CredentialCache {
    source: Arc<dyn CredentialSource>,
    value: OnceCell<String>,
    state: Mutex<CredentialState>,
}

impl CredentialCache {
    pub fn new(source: Arc<dyn CredentialSource>) -> Self {
        Self {
            source,
            value: OnceCell::new(),
            state: Mutex::new(CredentialState::Uninitialized),
        }
    }

    pub fn state(&self) -> CredentialState {
        *self.state.lock()
    }

    pub async fn get(&self) -> Result<String, CredentialError> {
        let value = self
            .value
            .get_or_try_init(|| async {
                *self.state.lock() = CredentialState::InFlight;
                tracing::debug!("Fetching viewer credential");

                match self.source.fetch().await {
                    Ok(value) => {
                        *self.state.lock() = CredentialState::Resolved;
                        Ok(value)
                    }
                    Err(e) => {
                        *self.state.lock() = CredentialState::Failed;
                        tracing::warn!("Viewer credential fetch failed: {}", e);
                        Err(e)
                    }
                }
            })
            .await?;

        Ok(value.clone())
    }
}
