//! Scripted collaborators for unit tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::engine::{ChangeCallback, ChangeKind, InstantiateRequest, ViewerEngine, ViewerHandle};
use crate::error::{CredentialError, EngineError, FetchError, StoreError};
use crate::interaction::UserInteraction;
use crate::resolver::DocumentFetcher;
use crate::session::CredentialSource;
use crate::store::{DocumentStore, MemoryDocumentStore, StoreEntry, Thumbnail};

// ============================================================================
// Engine
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Instantiating(String),
    Instantiated(String),
    Destroyed(String),
}

#[derive(Default)]
struct EngineInner {
    events: Mutex<Vec<EngineEvent>>,
    live: AtomicUsize,
    max_live: AtomicUsize,
    listeners: Mutex<Vec<(ChangeKind, ChangeCallback)>>,
    failing_loads: Mutex<HashSet<String>>,
    fail_export: AtomicBool,
    fail_thumbnail: AtomicBool,
    exported: Mutex<Option<Vec<u8>>>,
    delay: Mutex<Option<Duration>>,
}

/// Engine that records its lifecycle and lets tests emit change events
#[derive(Clone, Default)]
pub struct ScriptedEngine {
    inner: Arc<EngineInner>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        *self.inner.delay.lock() = Some(delay);
        self
    }

    pub fn fail_load_of(&self, filename: &str) {
        self.inner.failing_loads.lock().insert(filename.to_string());
    }

    pub fn fail_export(&self) {
        self.inner.fail_export.store(true, Ordering::SeqCst);
    }

    pub fn fail_thumbnail(&self) {
        self.inner.fail_thumbnail.store(true, Ordering::SeqCst);
    }

    /// Bytes every later export returns instead of the loaded content
    pub fn set_exported(&self, bytes: &[u8]) {
        *self.inner.exported.lock() = Some(bytes.to_vec());
    }

    /// Fire listeners of the most recent instance
    pub fn emit(&self, kind: ChangeKind) {
        let listeners = self.inner.listeners.lock();
        for (listener_kind, callback) in listeners.iter() {
            if *listener_kind == kind {
                callback();
            }
        }
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.inner.events.lock().clone()
    }

    pub fn live(&self) -> usize {
        self.inner.live.load(Ordering::SeqCst)
    }

    pub fn max_live(&self) -> usize {
        self.inner.max_live.load(Ordering::SeqCst)
    }

    pub fn instantiations(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, EngineEvent::Instantiated(_)))
            .count()
    }
}

#[async_trait]
impl ViewerEngine for ScriptedEngine {
    async fn instantiate(&self, request: InstantiateRequest) -> Result<Box<dyn ViewerHandle>, EngineError> {
        let inner = &self.inner;
        inner.events.lock().push(EngineEvent::Instantiating(request.filename.clone()));

        let delay = *inner.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if inner.failing_loads.lock().contains(&request.filename) {
            return Err(EngineError::Load(format!("cannot open {}", request.filename)));
        }

        let live = inner.live.fetch_add(1, Ordering::SeqCst) + 1;
        inner.max_live.fetch_max(live, Ordering::SeqCst);
        inner.listeners.lock().clear();
        inner.events.lock().push(EngineEvent::Instantiated(request.filename.clone()));

        Ok(Box::new(ScriptedHandle {
            filename: request.filename,
            content: request.content,
            engine: self.inner.clone(),
        }))
    }

    async fn destroy(&self, handle: Box<dyn ViewerHandle>) {
        drop(handle);
    }
}

struct ScriptedHandle {
    filename: String,
    content: Vec<u8>,
    engine: Arc<EngineInner>,
}

#[async_trait]
impl ViewerHandle for ScriptedHandle {
    async fn export_bytes(&self) -> Result<Vec<u8>, EngineError> {
        if self.engine.fail_export.load(Ordering::SeqCst) {
            return Err(EngineError::Export("export refused".to_string()));
        }
        let exported = self.engine.exported.lock().clone();
        Ok(exported.unwrap_or_else(|| self.content.clone()))
    }

    async fn render_thumbnail(&self, page_index: usize, width_hint: u32) -> Result<Thumbnail, EngineError> {
        if self.engine.fail_thumbnail.load(Ordering::SeqCst) {
            return Err(EngineError::Thumbnail(format!("page {} unavailable", page_index)));
        }
        Ok(Thumbnail {
            width: width_hint,
            height: width_hint,
            pixels: vec![0; width_hint as usize * width_hint as usize * 4],
        })
    }

    fn on(&self, kind: ChangeKind, callback: ChangeCallback) {
        self.engine.listeners.lock().push((kind, callback));
    }
}

impl Drop for ScriptedHandle {
    fn drop(&mut self) {
        self.engine.live.fetch_sub(1, Ordering::SeqCst);
        self.engine
            .events
            .lock()
            .push(EngineEvent::Destroyed(self.filename.clone()));
    }
}

// ============================================================================
// Credential
// ============================================================================

pub struct ScriptedCredential {
    value: String,
    calls: AtomicUsize,
    failures_left: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedCredential {
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
            calls: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Fail the next `count` fetches with status 500
    pub fn failing(self, count: usize) -> Self {
        self.failures_left.store(count, Ordering::SeqCst);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialSource for ScriptedCredential {
    async fn fetch(&self) -> Result<String, CredentialError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(CredentialError::Status(500));
        }
        Ok(self.value.clone())
    }
}

// ============================================================================
// Interaction
// ============================================================================

pub struct RecordingInteraction {
    answer: AtomicBool,
    prompts: Mutex<Vec<String>>,
    alerts: Mutex<Vec<String>>,
}

impl RecordingInteraction {
    pub fn answering(save: bool) -> Self {
        Self {
            answer: AtomicBool::new(save),
            prompts: Mutex::new(Vec::new()),
            alerts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().clone()
    }
}

#[async_trait]
impl UserInteraction for RecordingInteraction {
    async fn confirm_save(&self, filename: &str) -> bool {
        self.prompts.lock().push(filename.to_string());
        self.answer.load(Ordering::SeqCst)
    }

    fn alert(&self, message: &str) {
        self.alerts.lock().push(message.to_string());
    }
}

// ============================================================================
// Fetcher
// ============================================================================

#[derive(Default)]
pub struct ScriptedFetcher {
    responses: Mutex<HashMap<String, Result<Vec<u8>, FetchError>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url: &str, response: Result<Vec<u8>, FetchError>) -> Self {
        self.responses.lock().insert(url.to_string(), response);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl DocumentFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.requests.lock().push(url.to_string());
        self.responses
            .lock()
            .get(url)
            .cloned()
            .unwrap_or(Err(FetchError::Status(404)))
    }
}

// ============================================================================
// Store
// ============================================================================

/// Memory store that counts writes
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryDocumentStore,
    sets: AtomicUsize,
    first_set_delay: Option<Duration>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the first `set` sleep before writing
    pub fn with_first_set_delay(mut self, delay: Duration) -> Self {
        self.first_set_delay = Some(delay);
        self
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn get(&self, filename: &str) -> Result<Option<StoreEntry>, StoreError> {
        self.inner.get(filename).await
    }

    async fn set(
        &self,
        filename: &str,
        content: &[u8],
        thumbnail: Option<&Thumbnail>,
    ) -> Result<(), StoreError> {
        let previous = self.sets.fetch_add(1, Ordering::SeqCst);
        if let (0, Some(delay)) = (previous, self.first_set_delay) {
            tokio::time::sleep(delay).await;
        }
        self.inner.set(filename, content, thumbnail).await
    }

    async fn delete(&self, filename: &str) -> Result<(), StoreError> {
        self.inner.delete(filename).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.inner.clear().await
    }

    async fn list_all(&self) -> Result<Vec<String>, StoreError> {
        self.inner.list_all().await
    }
}
