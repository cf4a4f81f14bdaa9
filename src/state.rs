//! Application state management

use std::sync::Arc;

use crate::config::{Config, CredentialConfig};
use crate::engine::ViewerEngine;
use crate::error::FetchError;
use crate::interaction::UserInteraction;
use crate::resolver::{http_client, DocumentResolver, HttpFetcher};
use crate::session::{ControllerSettings, CredentialSource, HttpCredentialSource, SessionController, StaticCredential};
use crate::store::{open_store, DocumentStore};

/// Error type for state initialization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to initialize HTTP client: {0}")]
    HttpClient(#[from] FetchError),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    store: Arc<dyn DocumentStore>,
    resolver: DocumentResolver,
}

impl AppState {
    /// Wire store, credential, controller and resolver together
    ///
    /// Spawns the session worker, so this must run inside a tokio runtime.
    pub fn new(
        config: Config,
        engine: Arc<dyn ViewerEngine>,
        interaction: Arc<dyn UserInteraction>,
    ) -> Result<Self, StateError> {
        let store = open_store(&config.store);
        let client = http_client(config.network.fetch_timeout)?;

        let credentials: Arc<dyn CredentialSource> = match &config.viewer.credential {
            CredentialConfig::Static(key) => Arc::new(StaticCredential::new(key.clone())),
            CredentialConfig::Remote(url) => Arc::new(HttpCredentialSource::new(client.clone(), url.clone())),
        };

        let controller = SessionController::spawn(
            engine,
            store.clone(),
            interaction.clone(),
            credentials,
            ControllerSettings::from(&config.viewer),
        );

        let resolver = DocumentResolver::new(
            store.clone(),
            Arc::new(HttpFetcher::new(client)),
            controller,
            interaction,
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                resolver,
            }),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the document store
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.inner.store
    }

    /// Get the resolver
    pub fn resolver(&self) -> &DocumentResolver {
        &self.inner.resolver
    }

    /// Get the session controller
    pub fn controller(&self) -> &SessionController {
        self.inner.resolver.controller()
    }

    /// Flush pending write-backs and close the active session
    ///
    /// Call before exit so an unsaved document still gets its save prompt.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down application state...");
        self.inner.resolver.flush_write_backs().await;
        self.controller().shutdown().await;
    }
}
