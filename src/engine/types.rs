//! Engine types

use std::fmt;

/// Change notifications emitted by an engine instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    AnnotationsChanged,
    FormFieldValuesUpdated,
}

impl ChangeKind {
    /// Every kind the session controller observes
    pub const ALL: [ChangeKind; 2] = [ChangeKind::AnnotationsChanged, ChangeKind::FormFieldValuesUpdated];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::AnnotationsChanged => "annotations.change",
            ChangeKind::FormFieldValuesUpdated => "formFieldValues.update",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Callback invoked for each change event
pub type ChangeCallback = Box<dyn Fn() + Send + Sync>;

/// UI configuration passed through to the engine untouched
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerOptions {
    pub container: String,
    pub settings: serde_json::Value,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            container: ".Viewer".to_string(),
            settings: serde_json::json!({}),
        }
    }
}

/// Everything the engine needs to open one document
#[derive(Debug, Clone)]
pub struct InstantiateRequest {
    pub filename: String,
    pub content: Vec<u8>,
    pub credential: String,
    pub options: ViewerOptions,
}
