//! Session types

use std::fmt;
use std::time::Duration;

use uuid::Uuid;

use crate::config::ViewerConfig;
use crate::engine::ViewerOptions;

/// Where the controller is in its load/unload cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerPhase {
    Idle,
    Loading { filename: String },
    Active { filename: String },
    Unloading { filename: String },
}

impl ControllerPhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, ControllerPhase::Idle)
    }

    pub fn filename(&self) -> Option<&str> {
        match self {
            ControllerPhase::Idle => None,
            ControllerPhase::Loading { filename }
            | ControllerPhase::Active { filename }
            | ControllerPhase::Unloading { filename } => Some(filename),
        }
    }
}

impl fmt::Display for ControllerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerPhase::Idle => write!(f, "idle"),
            ControllerPhase::Loading { filename } => write!(f, "loading {}", filename),
            ControllerPhase::Active { filename } => write!(f, "active {}", filename),
            ControllerPhase::Unloading { filename } => write!(f, "unloading {}", filename),
        }
    }
}

/// Point-in-time view of the active session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub filename: String,
    pub dirty: bool,
}

/// Tunables for the session controller
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub options: ViewerOptions,
    /// Width hint for the page-1 thumbnail saved on unload
    pub thumbnail_width: u32,
    /// `None` waits for the engine indefinitely
    pub instantiate_timeout: Option<Duration>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            options: ViewerOptions::default(),
            thumbnail_width: 200,
            instantiate_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl From<&ViewerConfig> for ControllerSettings {
    fn from(config: &ViewerConfig) -> Self {
        Self {
            options: ViewerOptions {
                container: config.container.clone(),
                settings: config.settings.clone(),
            },
            thumbnail_width: config.thumbnail_width,
            instantiate_timeout: config.instantiate_timeout,
        }
    }
}
