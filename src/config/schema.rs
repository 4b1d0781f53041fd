//! Configuration schema for gr
//!
//! Configuration is stored at `~/.config/gr/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache settings
    pub cache: CacheConfig,

    /// Build settings
    pub build: BuildSettings,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root; must be absolute
    pub dir: Option<PathBuf>,
}

/// Build step configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Go toolchain binary
    pub go: String,

    /// Flags passed to every `go build`, before command-line flags
    pub flags: Vec<String>,

    /// Additional environment variables that affect builds
    pub env: Vec<String>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            go: "go".to_string(),
            flags: vec![],
            env: vec![],
        }
    }
}
