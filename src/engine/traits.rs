//! Engine traits
//!
//! The rendering engine is an external collaborator. Only the session
//! controller talks to it.

use async_trait::async_trait;

use super::types::{ChangeCallback, ChangeKind, InstantiateRequest};
use crate::error::EngineError;
use crate::store::Thumbnail;

/// Factory and destructor for engine instances
#[async_trait]
pub trait ViewerEngine: Send + Sync {
    /// Open a document and return a live instance
    async fn instantiate(&self, request: InstantiateRequest) -> Result<Box<dyn ViewerHandle>, EngineError>;

    /// Release an instance. Never fails.
    async fn destroy(&self, handle: Box<dyn ViewerHandle>);
}

/// A live engine instance holding one open document
#[async_trait]
pub trait ViewerHandle: Send + Sync {
    /// Current document bytes, including any edits
    async fn export_bytes(&self) -> Result<Vec<u8>, EngineError>;

    /// Raster preview of a page, scaled to roughly `width_hint` pixels wide
    async fn render_thumbnail(&self, page_index: usize, width_hint: u32) -> Result<Thumbnail, EngineError>;

    /// Register a change listener
    fn on(&self, kind: ChangeKind, callback: ChangeCallback);
}
