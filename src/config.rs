//! Configuration management for PDF Offline

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    pub viewer: ViewerConfig,
    pub network: NetworkConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum StoreBackend {
    Sqlite { path: PathBuf },
    Memory,
    Disabled,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewerConfig {
    /// Opaque mount target handed to the engine
    pub container: String,
    /// Opaque engine settings
    pub settings: serde_json::Value,
    pub credential: CredentialConfig,
    pub thumbnail_width: u32,
    /// `None` disables the bound
    pub instantiate_timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialConfig {
    Static(String),
    Remote(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// `None` disables the bound
    pub fetch_timeout: Option<Duration>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("VIEWER_OPTIONS is not valid JSON: {0}")]
    InvalidOptions(#[from] serde_json::Error),
}

const DEFAULT_STORE_PATH: &str = "./documents.db";
const DEFAULT_CONTAINER: &str = ".Viewer";
const DEFAULT_THUMBNAIL_WIDTH: u32 = 200;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

impl Default for Config {
    fn default() -> Self {
        Config {
            store: StoreConfig {
                backend: StoreBackend::Sqlite {
                    path: PathBuf::from(DEFAULT_STORE_PATH),
                },
            },
            viewer: ViewerConfig {
                container: DEFAULT_CONTAINER.to_string(),
                settings: serde_json::json!({}),
                credential: CredentialConfig::Static(String::new()),
                thumbnail_width: DEFAULT_THUMBNAIL_WIDTH,
                instantiate_timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            },
            network: NetworkConfig {
                fetch_timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = lookup("PDF_STORE_PATH").unwrap_or_else(|| DEFAULT_STORE_PATH.to_string());
        let backend = match lookup("PDF_STORE_BACKEND").as_deref().unwrap_or("sqlite") {
            "sqlite" => StoreBackend::Sqlite { path: PathBuf::from(path) },
            "memory" => StoreBackend::Memory,
            "disabled" => StoreBackend::Disabled,
            other => {
                return Err(ConfigError::InvalidValue {
                    name: "PDF_STORE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let credential = match (lookup("VIEWER_LICENSE_KEY"), lookup("VIEWER_LICENSE_URL")) {
            (Some(key), _) => CredentialConfig::Static(key),
            (None, Some(url)) => CredentialConfig::Remote(url),
            (None, None) => CredentialConfig::Static(String::new()),
        };

        let settings = match lookup("VIEWER_OPTIONS") {
            Some(raw) => serde_json::from_str(&raw)?,
            None => serde_json::json!({}),
        };

        Ok(Config {
            store: StoreConfig { backend },
            viewer: ViewerConfig {
                container: lookup("VIEWER_CONTAINER").unwrap_or_else(|| DEFAULT_CONTAINER.to_string()),
                settings,
                credential,
                thumbnail_width: parse_or(&lookup, "THUMBNAIL_WIDTH", DEFAULT_THUMBNAIL_WIDTH)?,
                instantiate_timeout: timeout_from(parse_or(
                    &lookup,
                    "ENGINE_TIMEOUT_SECS",
                    DEFAULT_TIMEOUT_SECS,
                )?),
            },
            network: NetworkConfig {
                fetch_timeout: timeout_from(parse_or(&lookup, "FETCH_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        None => Ok(default),
    }
}

fn timeout_from(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
