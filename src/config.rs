//! Configuration for termdeck.
//!
//! Loaded from `~/.termdeck/config.toml`. Every field is optional:
//!
//! ```toml
//! # Log filter when TERMDECK_LOG is not set
//! log_level = "info"
//!
//! [pager]
//! wrap = false
//!
//! [editor]
//! tab_width = 4
//! line_numbers = true
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::editor::EditorOptions;
use crate::pager::PagerOptions;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log filter directive (EnvFilter syntax)
    pub log_level: String,
    pub pager: PagerConfig,
    pub editor: EditorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            pager: PagerConfig::default(),
            editor: EditorConfig::default(),
        }
    }
}

/// Pager settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagerConfig {
    /// Start with word-wrap on
    pub wrap: bool,
}

/// Editor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub tab_width: usize,
    pub line_numbers: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            tab_width: 4,
            line_numbers: true,
        }
    }
}

impl Config {
    /// Load the user config, falling back to defaults
    pub fn load() -> Self {
        Self::try_load().unwrap_or_else(|e| {
            warn!("{}; using defaults", e);
            Self::default()
        })
    }

    /// Load the user config. A missing file gives the defaults.
    pub fn try_load() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from an explicit path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `~/.termdeck/config.toml`
    pub fn config_path() -> Option<PathBuf> {
        data_dir().map(|dir| dir.join("config.toml"))
    }

    pub fn pager_options(&self) -> PagerOptions {
        PagerOptions {
            wrap: self.pager.wrap,
        }
    }

    pub fn editor_options(&self) -> EditorOptions {
        EditorOptions {
            tab_width: self.editor.tab_width.max(1),
            line_numbers: self.editor.line_numbers,
        }
    }
}

/// `~/.termdeck`, home taken from USERPROFILE or HOME
pub fn data_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(|home| PathBuf::from(home).join(".termdeck"))
}
