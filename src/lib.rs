//! PDF Offline
//!
//! Offline document cache and viewer session coordination. Documents are
//! opened from a local store when present, fetched over HTTP otherwise,
//! and displayed through a single serialized engine session that offers
//! to save edits when it closes.

pub mod config;
pub mod engine;
pub mod error;
pub mod interaction;
pub mod resolver;
pub mod session;
pub mod state;
pub mod store;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{OpenError, Result};
pub use state::AppState;
