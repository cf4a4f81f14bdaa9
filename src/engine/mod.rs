//! Rendering engine interface
//!
//! The engine that actually renders and edits PDFs lives outside this
//! crate. It is reached only through [`ViewerEngine`] and
//! [`ViewerHandle`]; [`HeadlessEngine`] is a non-rendering stand-in for
//! command-line use.

mod headless;
mod traits;
mod types;

pub use headless::HeadlessEngine;
pub use traits::{ViewerEngine, ViewerHandle};
pub use types::{ChangeCallback, ChangeKind, InstantiateRequest, ViewerOptions};

/// How far into the file a `%PDF-` header may appear
const HEADER_SEARCH_LIMIT: usize = 1024;

/// Whether `bytes` carries a PDF header near the start
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_LIMIT)];
    window.windows(5).any(|w| w == b"%PDF-")
}
