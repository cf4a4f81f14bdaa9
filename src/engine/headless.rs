//! Headless engine
//!
//! Stands in for a real rendering engine when running from the command
//! line. Documents are held as-is and exported unchanged; thumbnails are
//! blank pages. There is no editing surface, so registered change
//! listeners are never fired and a headless session is never dirty.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::looks_like_pdf;
use super::traits::{ViewerEngine, ViewerHandle};
use super::types::{ChangeCallback, ChangeKind, InstantiateRequest};
use crate::error::EngineError;
use crate::store::Thumbnail;

/// A4 height / width
const PAGE_ASPECT: f64 = 297.0 / 210.0;

/// Widest thumbnail rendered; larger hints are clamped
pub const MAX_THUMBNAIL_WIDTH: u32 = 2048;

#[derive(Default)]
pub struct HeadlessEngine {
    live: Arc<AtomicUsize>,
}

impl HeadlessEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of instances not yet destroyed
    pub fn live_instances(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ViewerEngine for HeadlessEngine {
    async fn instantiate(&self, request: InstantiateRequest) -> Result<Box<dyn ViewerHandle>, EngineError> {
        if !looks_like_pdf(&request.content) {
            return Err(EngineError::Load(format!("{} is not a PDF document", request.filename)));
        }

        self.live.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(
            filename = %request.filename,
            container = %request.options.container,
            bytes = request.content.len(),
            "Headless instance created"
        );

        Ok(Box::new(HeadlessHandle {
            content: request.content,
            listeners: Mutex::new(Vec::new()),
        }))
    }

    async fn destroy(&self, handle: Box<dyn ViewerHandle>) {
        drop(handle);
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

struct HeadlessHandle {
    content: Vec<u8>,
    listeners: Mutex<Vec<(ChangeKind, ChangeCallback)>>,
}

#[async_trait]
impl ViewerHandle for HeadlessHandle {
    async fn export_bytes(&self) -> Result<Vec<u8>, EngineError> {
        Ok(self.content.clone())
    }

    async fn render_thumbnail(&self, page_index: usize, width_hint: u32) -> Result<Thumbnail, EngineError> {
        if page_index != 0 {
            return Err(EngineError::Thumbnail(format!("Page {} out of range", page_index)));
        }

        let width = width_hint.clamp(1, MAX_THUMBNAIL_WIDTH);
        let height = ((f64::from(width) * PAGE_ASPECT).round() as u32).max(1);
        let len = width as usize * height as usize * 4;

        Ok(Thumbnail {
            width,
            height,
            pixels: vec![255; len],
        })
    }

    fn on(&self, kind: ChangeKind, callback: ChangeCallback) {
        self.listeners.lock().push((kind, callback));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ViewerOptions;

    fn request(content: &[u8]) -> InstantiateRequest {
        InstantiateRequest {
            filename: "doc.pdf".to_string(),
            content: content.to_vec(),
            credential: String::new(),
            options: ViewerOptions::default(),
        }
    }

    #[tokio::test]
    async fn test_rejects_non_pdf() {
        let engine = HeadlessEngine::new();
        let result = engine.instantiate(request(b"<html></html>")).await;

        assert!(matches!(result, Err(EngineError::Load(_))));
        assert_eq!(engine.live_instances(), 0);
    }

    #[tokio::test]
    async fn test_exports_input_and_tracks_instances() {
        let engine = HeadlessEngine::new();
        let handle = engine.instantiate(request(b"%PDF-1.4 body")).await.unwrap();
        assert_eq!(engine.live_instances(), 1);

        assert_eq!(handle.export_bytes().await.unwrap(), b"%PDF-1.4 body");

        engine.destroy(handle).await;
        assert_eq!(engine.live_instances(), 0);
    }

    #[tokio::test]
    async fn test_thumbnail_is_a4_blank() {
        let engine = HeadlessEngine::new();
        let handle = engine.instantiate(request(b"%PDF-1.4")).await.unwrap();

        let thumb = handle.render_thumbnail(0, 210).await.unwrap();
        assert_eq!((thumb.width, thumb.height), (210, 297));
        assert_eq!(thumb.pixels.len(), 210 * 297 * 4);
        assert!(thumb.pixels.iter().all(|&p| p == 255));

        assert!(handle.render_thumbnail(1, 210).await.is_err());
    }

    #[tokio::test]
    async fn test_listeners_are_registered_but_never_fired() {
        use std::sync::atomic::AtomicBool;

        let engine = HeadlessEngine::new();
        let handle = engine.instantiate(request(b"%PDF-1.4")).await.unwrap();
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        handle.on(
            ChangeKind::AnnotationsChanged,
            Box::new(move || flag.store(true, Ordering::SeqCst)),
        );

        handle.export_bytes().await.unwrap();
        handle.render_thumbnail(0, 64).await.unwrap();
        engine.destroy(handle).await;

        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_oversized_width_hint_is_clamped() {
        let engine = HeadlessEngine::new();
        let handle = engine.instantiate(request(b"%PDF-1.4")).await.unwrap();

        let thumb = handle.render_thumbnail(0, u32::MAX).await.unwrap();
        assert_eq!(thumb.width, MAX_THUMBNAIL_WIDTH);
        assert_eq!(thumb.height, 2896);
        assert_eq!(thumb.pixels.len(), 2048 * 2896 * 4);

        let tiny = handle.render_thumbnail(0, 0).await.unwrap();
        assert_eq!(tiny.width, 1);
    }
}
