//! Client configuration: optional RON file, then command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use engine_logging::engine_info;
use serde::Deserialize;
use thiserror::Error;
use tracks_engine::ClientSettings;
use url::Url;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILENAME: &str = "tracks_client.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid url {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub server_url: String,
    pub progress_url: Option<String>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub inference_concurrency: usize,
}

impl Default for FileConfig {
    fn default() -> Self {
        let settings = ClientSettings::default();
        Self {
            server_url: settings.base_url.to_string(),
            progress_url: None,
            connect_timeout_secs: settings.connect_timeout.as_secs(),
            request_timeout_secs: settings.request_timeout.as_secs(),
            inference_concurrency: settings.inference_concurrency,
        }
    }
}

/// Reads `explicit`, or the default file if it exists, or falls back to defaults.
pub fn load(explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILENAME);
            if !default.exists() {
                return Ok(FileConfig::default());
            }
            default
        }
    };

    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let config = ron::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.clone(),
        message: err.to_string(),
    })?;
    engine_info!("Loaded client config from {:?}", path);
    Ok(config)
}

/// Applies the `--server` override and converts to engine settings.
pub fn resolve(config: FileConfig, server: Option<&str>) -> Result<ClientSettings, ConfigError> {
    let base = server.unwrap_or(&config.server_url);
    let mut settings = ClientSettings::with_base_url(base)
        .map_err(|_| ConfigError::InvalidUrl(base.to_string()))?;

    settings.progress_url = match config.progress_url.as_deref() {
        Some(raw) => Some(Url::parse(raw).map_err(|_| ConfigError::InvalidUrl(raw.to_string()))?),
        None => None,
    };
    settings.connect_timeout = Duration::from_secs(config.connect_timeout_secs);
    settings.request_timeout = Duration::from_secs(config.request_timeout_secs);
    settings.inference_concurrency = config.inference_concurrency.max(1);
    Ok(settings)
}
