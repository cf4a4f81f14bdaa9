//! Session controller
//!
//! Owns the single engine instance. Every operation is queued on one
//! channel and executed by a dedicated worker task, strictly in order and
//! one at a time, so a load never races a half-built or half-destroyed
//! instance. Store writes for fetched documents go through the same
//! queue, so a write-back issued before a save can never land after it.
//!
//! ```text
//!  load / unload / write_back / export / current / shutdown
//!                    │
//!                    ▼
//!          ┌───────────────────┐
//!          │  mpsc FIFO queue  │
//!          └───────────────────┘
//!                    │
//!                    ▼
//!          ┌───────────────────┐      ┌──────────────┐
//!          │      Worker       │─────►│ ViewerEngine │
//!          │  ControllerState  │      └──────────────┘
//!          │  (session, cred,  │      ┌──────────────┐
//!          │   phase)          │─────►│ DocumentStore│
//!          └───────────────────┘      └──────────────┘
//! ```

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::timeout;
use uuid::Uuid;

use super::credential::{CredentialCache, CredentialSource};
use super::tracker::{ChangeObserver, DirtyFlag};
use super::types::{ControllerPhase, ControllerSettings, SessionSnapshot};
use crate::engine::{ChangeKind, InstantiateRequest, ViewerEngine, ViewerHandle};
use crate::error::{EngineError, LoadError};
use crate::interaction::UserInteraction;
use crate::store::DocumentStore;

/// Page the saved thumbnail is rendered from
const THUMBNAIL_PAGE: usize = 0;

enum Command {
    Load {
        content: Vec<u8>,
        filename: String,
        reply: oneshot::Sender<Result<(), LoadError>>,
    },
    Unload {
        reply: oneshot::Sender<()>,
    },
    WriteBack {
        filename: String,
        content: Vec<u8>,
    },
    Settle {
        reply: oneshot::Sender<()>,
    },
    Export {
        reply: oneshot::Sender<Result<Option<Vec<u8>>, EngineError>>,
    },
    Current {
        reply: oneshot::Sender<Option<SessionSnapshot>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Handle to the session worker
#[derive(Clone)]
pub struct SessionController {
    commands: mpsc::UnboundedSender<Command>,
    phase: watch::Receiver<ControllerPhase>,
}

impl SessionController {
    /// Start the worker task
    pub fn spawn(
        engine: Arc<dyn ViewerEngine>,
        store: Arc<dyn DocumentStore>,
        interaction: Arc<dyn UserInteraction>,
        credentials: Arc<dyn CredentialSource>,
        settings: ControllerSettings,
    ) -> Self {
        let (commands, queue) = mpsc::unbounded_channel();
        let (phase_tx, phase) = watch::channel(ControllerPhase::Idle);

        let worker = Worker {
            state: ControllerState {
                session: None,
                credential: CredentialCache::new(credentials),
                phase: phase_tx,
            },
            engine,
            store,
            interaction,
            settings,
        };
        tokio::spawn(worker.run(queue));

        Self { commands, phase }
    }

    /// Queue a load of `content` as `filename`
    ///
    /// The request joins the queue when this is called, not when the
    /// returned future is first polled. Dropping the future does not
    /// cancel the load.
    pub fn load(
        &self,
        content: Vec<u8>,
        filename: impl Into<String>,
    ) -> impl Future<Output = Result<(), LoadError>> + Send + 'static {
        let (reply, response) = oneshot::channel();
        let sent = self
            .commands
            .send(Command::Load {
                content,
                filename: filename.into(),
                reply,
            })
            .is_ok();

        async move {
            if !sent {
                return Err(LoadError::ControllerClosed);
            }
            response.await.unwrap_or(Err(LoadError::ControllerClosed))
        }
    }

    /// Queue an unload of the active session, if any
    pub fn unload(&self) -> impl Future<Output = ()> + Send + 'static {
        let (reply, response) = oneshot::channel();
        let sent = self.commands.send(Command::Unload { reply }).is_ok();

        async move {
            if sent {
                let _ = response.await;
            }
        }
    }

    /// Queue a store write of `content` without a thumbnail
    ///
    /// Runs after everything queued before it and before anything queued
    /// after it, so a later save of the same file always wins.
    pub fn write_back(&self, filename: impl Into<String>, content: Vec<u8>) {
        let filename = filename.into();
        if self
            .commands
            .send(Command::WriteBack {
                filename: filename.clone(),
                content,
            })
            .is_err()
        {
            tracing::warn!(filename = %filename, "Session controller closed, write-back dropped");
        }
    }

    /// Wait until every operation queued so far has finished
    pub async fn settled(&self) {
        let (reply, response) = oneshot::channel();
        if self.commands.send(Command::Settle { reply }).is_ok() {
            let _ = response.await;
        }
    }

    /// Current bytes of the active document, or `None` when idle
    pub async fn export_current(&self) -> Result<Option<Vec<u8>>, EngineError> {
        let (reply, response) = oneshot::channel();
        if self.commands.send(Command::Export { reply }).is_err() {
            return Ok(None);
        }
        response.await.unwrap_or(Ok(None))
    }

    /// Snapshot of the active session, taken after earlier queued work
    pub async fn current(&self) -> Option<SessionSnapshot> {
        let (reply, response) = oneshot::channel();
        self.commands.send(Command::Current { reply }).ok()?;
        response.await.ok().flatten()
    }

    /// Phase right now, without queueing
    pub fn phase(&self) -> ControllerPhase {
        self.phase.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ControllerPhase> {
        self.phase.clone()
    }

    /// Unload the active session and stop the worker
    pub async fn shutdown(&self) {
        let (reply, response) = oneshot::channel();
        if self.commands.send(Command::Shutdown { reply }).is_ok() {
            let _ = response.await;
        }
    }
}

/// The live association between a filename and an engine instance
struct Session {
    id: Uuid,
    filename: String,
    handle: Box<dyn ViewerHandle>,
    dirty: DirtyFlag,
}

struct ControllerState {
    session: Option<Session>,
    credential: CredentialCache,
    phase: watch::Sender<ControllerPhase>,
}

struct Worker {
    state: ControllerState,
    engine: Arc<dyn ViewerEngine>,
    store: Arc<dyn DocumentStore>,
    interaction: Arc<dyn UserInteraction>,
    settings: ControllerSettings,
}

impl Worker {
    async fn run(mut self, mut queue: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = queue.recv().await {
            match command {
                Command::Load {
                    content,
                    filename,
                    reply,
                } => {
                    let result = self.load(content, filename).await;
                    let _ = reply.send(result);
                }
                Command::Unload { reply } => {
                    self.unload().await;
                    let _ = reply.send(());
                }
                Command::WriteBack { filename, content } => {
                    self.write_back(&filename, &content).await;
                }
                Command::Settle { reply } => {
                    let _ = reply.send(());
                }
                Command::Export { reply } => {
                    let result = self.export().await;
                    let _ = reply.send(result);
                }
                Command::Current { reply } => {
                    let _ = reply.send(self.snapshot());
                }
                Command::Shutdown { reply } => {
                    self.unload().await;
                    let _ = reply.send(());
                    break;
                }
            }
        }

        self.unload().await;
        tracing::debug!("Session controller stopped");
    }

    fn set_phase(&self, phase: ControllerPhase) {
        tracing::debug!(phase = %phase, "Session controller phase");
        self.state.phase.send_replace(phase);
    }

    async fn load(&mut self, content: Vec<u8>, filename: String) -> Result<(), LoadError> {
        if self.state.session.is_some() {
            self.unload().await;
        }

        self.set_phase(ControllerPhase::Loading {
            filename: filename.clone(),
        });

        match self.open_session(content, &filename).await {
            Ok(session) => {
                tracing::info!(session_id = %session.id, filename = %filename, "Document loaded");
                self.state.session = Some(session);
                self.set_phase(ControllerPhase::Active { filename });
                Ok(())
            }
            Err(e) => {
                tracing::error!(filename = %filename, "Failed to load document: {}", e);
                self.set_phase(ControllerPhase::Idle);
                Err(e)
            }
        }
    }

    async fn open_session(&self, content: Vec<u8>, filename: &str) -> Result<Session, LoadError> {
        let credential = self
            .state
            .credential
            .get()
            .await
            .map_err(LoadError::CredentialFetchFailed)?;

        let request = InstantiateRequest {
            filename: filename.to_string(),
            content,
            credential,
            options: self.settings.options.clone(),
        };
        let handle = self.instantiate(request).await.map_err(LoadError::EngineLoadFailed)?;

        let dirty = DirtyFlag::new();
        for kind in ChangeKind::ALL {
            handle.on(kind, ChangeObserver::new(kind, dirty.clone()).into_callback());
        }

        Ok(Session {
            id: Uuid::new_v4(),
            filename: filename.to_string(),
            handle,
            dirty,
        })
    }

    async fn instantiate(&self, request: InstantiateRequest) -> Result<Box<dyn ViewerHandle>, EngineError> {
        match self.settings.instantiate_timeout {
            Some(limit) => match timeout(limit, self.engine.instantiate(request)).await {
                Ok(result) => result,
                Err(_) => Err(EngineError::Timeout(limit.as_secs())),
            },
            None => self.engine.instantiate(request).await,
        }
    }

    /// Tear down the active session. Never fails.
    async fn unload(&mut self) {
        let Some(session) = self.state.session.take() else {
            return;
        };

        self.set_phase(ControllerPhase::Unloading {
            filename: session.filename.clone(),
        });

        let dirty = session.dirty.is_set();
        tracing::info!(
            session_id = %session.id,
            filename = %session.filename,
            dirty = dirty,
            "Unloading document"
        );

        if dirty && self.interaction.confirm_save(&session.filename).await {
            self.persist(&session).await;
        }

        self.engine.destroy(session.handle).await;
        self.set_phase(ControllerPhase::Idle);
    }

    /// Export and store the session's document; failures are logged only
    async fn persist(&self, session: &Session) {
        let content = match session.handle.export_bytes().await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(filename = %session.filename, "Export failed, document not saved: {}", e);
                return;
            }
        };

        let thumbnail = match session
            .handle
            .render_thumbnail(THUMBNAIL_PAGE, self.settings.thumbnail_width)
            .await
        {
            Ok(thumbnail) => Some(thumbnail),
            Err(e) => {
                tracing::warn!(filename = %session.filename, "Thumbnail failed, saving without it: {}", e);
                None
            }
        };

        match self.store.set(&session.filename, &content, thumbnail.as_ref()).await {
            Ok(()) => tracing::info!(filename = %session.filename, bytes = content.len(), "Document saved"),
            Err(e) => tracing::warn!(filename = %session.filename, "Failed to save document: {}", e),
        }
    }

    async fn write_back(&self, filename: &str, content: &[u8]) {
        match self.store.set(filename, content, None).await {
            Ok(()) => tracing::debug!(filename = %filename, "Document written to store"),
            Err(e) => tracing::warn!(filename = %filename, "Failed to write document to store: {}", e),
        }
    }

    async fn export(&self) -> Result<Option<Vec<u8>>, EngineError> {
        match &self.state.session {
            Some(session) => session.handle.export_bytes().await.map(Some),
            None => Ok(None),
        }
    }

    fn snapshot(&self) -> Option<SessionSnapshot> {
        self.state.session.as_ref().map(|session| SessionSnapshot {
            id: session.id,
            filename: session.filename.clone(),
            dirty: session.dirty.is_set(),
        })
    }
}
