//! Configuration management for gr

pub mod schema;

pub use schema::Config;

use crate::error::{GrError, GrResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gr")
            .join("config.toml")
    }

    /// Default cache root, if the platform has a cache directory
    pub fn default_cache_dir() -> Option<PathBuf> {
        dirs::cache_dir().map(|d| d.join("gr"))
    }

    /// Load configuration, using defaults if the file does not exist
    pub async fn load(&self) -> GrResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> GrResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| GrError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| GrError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick the cache root: explicit value, then config file, then platform default.
///
/// The result is checked to be absolute.
pub fn resolve_cache_dir(explicit: Option<&Path>, config: &Config) -> GrResult<PathBuf> {
    let dir = explicit
        .map(Path::to_path_buf)
        .or_else(|| config.cache.dir.clone())
        .or_else(ConfigManager::default_cache_dir)
        .ok_or(GrError::CacheDirNotSet)?;

    if dir.as_os_str().is_empty() {
        return Err(GrError::CacheDirNotSet);
    }
    if !dir.is_absolute() {
        return Err(GrError::CacheDirNotAbsolute(dir));
    }
    Ok(dir)
}
