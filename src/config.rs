//! Application configuration
//!
//! Defaults work out of the box against a conversion service on localhost.
//! A JSON file named by `VIDEO_VAULT_CONFIG` can replace any of them, and
//! `VIDEO_VAULT_API_URL` / `VIDEO_VAULT_DOWNLOAD_DIR` override the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{api::ApiConfig, application::ProgressConfig, domain::MediaFormat};

pub const CONFIG_FILE_ENV: &str = "VIDEO_VAULT_CONFIG";
pub const API_URL_ENV: &str = "VIDEO_VAULT_API_URL";
pub const DOWNLOAD_DIR_ENV: &str = "VIDEO_VAULT_DOWNLOAD_DIR";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub progress: ProgressConfig,

    /// Save straight into this directory instead of asking for a location
    #[serde(default)]
    pub download_dir: Option<PathBuf>,

    /// Format preselected when the window opens
    #[serde(default)]
    pub default_format: MediaFormat,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources(
            std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from).as_deref(),
            std::env::var(API_URL_ENV).ok(),
            std::env::var_os(DOWNLOAD_DIR_ENV).map(PathBuf::from),
        )
    }

    pub fn from_sources(
        file: Option<&Path>,
        api_url: Option<String>,
        download_dir: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(url) = api_url.filter(|url| !url.trim().is_empty()) {
            config.api.base_url = url.trim().to_string();
        }
        if let Some(dir) = download_dir {
            config.download_dir = Some(dir);
        }

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
