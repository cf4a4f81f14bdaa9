//! Viewer session management
//!
//! A session is one document open in the engine. At most one exists at a
//! time and [`SessionController`] is the only thing that creates or
//! destroys it.

mod controller;
mod credential;
mod tracker;
mod types;

pub use controller::SessionController;
pub use credential::{CredentialCache, CredentialSource, CredentialState, HttpCredentialSource, StaticCredential};
pub use tracker::{ChangeObserver, DirtyFlag, ObserverState};
pub use types::{ControllerPhase, ControllerSettings, SessionSnapshot};
