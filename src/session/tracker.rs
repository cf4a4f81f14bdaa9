//! Unsaved-change tracking
//!
//! Right after opening a document the engine emits one change event per
//! listener while it normalizes the document. Each observer swallows that
//! first event and only then starts marking the session dirty.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::engine::{ChangeCallback, ChangeKind};

/// Shared "has unsaved edits" flag for one session
#[derive(Debug, Clone, Default)]
pub struct DirtyFlag(Arc<AtomicBool>);

impl DirtyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverState {
    /// Next event is the engine's post-load normalization
    AwaitingNormalization,
    /// Every event is a real edit
    Tracking,
}

/// Listener for one change kind
pub struct ChangeObserver {
    kind: ChangeKind,
    state: Mutex<ObserverState>,
    dirty: DirtyFlag,
}

impl ChangeObserver {
    pub fn new(kind: ChangeKind, dirty: DirtyFlag) -> Arc<Self> {
        Arc::new(Self {
            kind,
            state: Mutex::new(ObserverState::AwaitingNormalization),
            dirty,
        })
    }

    pub fn state(&self) -> ObserverState {
        *self.state.lock()
    }

    pub fn observe(&self) {
        let mut state = self.state.lock();
        match *state {
            ObserverState::AwaitingNormalization => {
                *state = ObserverState::Tracking;
                tracing::debug!(kind = %self.kind, "Ignoring post-load normalization event");
            }
            ObserverState::Tracking => self.dirty.mark(),
        }
    }

    /// Wrap as an engine callback
    pub fn into_callback(self: Arc<Self>) -> ChangeCallback {
        Box::new(move || self.observe())
    }
}
