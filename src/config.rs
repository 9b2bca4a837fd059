//! Configuration for notestore
//!
//! Centralized configuration with sensible defaults, a builder, and optional
//! YAML config files.
//!
//! ## Config file
//! ```yaml
//! store:
//!   backend: file          # or "memory"
//!   file:
//!     path: /var/lib/noteapp
//!     write_mode: atomic   # or "in_place"
//!     sync: true
//! ```
//! Searched as `config.yaml` in `/etc/noteapp`, `$HOME/.noteapp` and `.`;
//! the first one found wins.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, StoreError};

/// Name of the snapshot file inside the data directory
pub const NOTES_FILENAME: &str = "notes.db";

/// Name of the config file looked up by [`Config::load`]
pub const CONFIG_FILENAME: &str = "config.yaml";

/// Main configuration for a notestore instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the snapshot file:
    ///   {data_dir}/
    ///     └── notes.db
    pub data_dir: PathBuf,

    /// Which store implementation to run
    pub backend: Backend,

    // -------------------------------------------------------------------------
    // Write-back Configuration
    // -------------------------------------------------------------------------
    /// How the snapshot file is rewritten after each mutation
    pub write_mode: WriteMode,

    /// fsync after every rewrite
    pub sync_on_write: bool,
}

/// Store implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Durable, file-backed
    #[default]
    File,

    /// Volatile, lost on restart
    Memory,
}

/// Snapshot rewrite strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Encode into a temp file in the same directory, fsync, rename over
    /// the snapshot. A crash leaves either the old or the new file.
    #[default]
    #[serde(alias = "atomic")]
    AtomicReplace,

    /// Truncate the snapshot and rewrite it through the open handle.
    /// NOT crash-atomic: a crash between truncate and write loses data.
    InPlace,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            backend: Backend::File,
            write_mode: WriteMode::AtomicReplace,
            sync_on_write: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Path of the snapshot file
    pub fn notes_path(&self) -> PathBuf {
        self.data_dir.join(NOTES_FILENAME)
    }

    /// Load the first `config.yaml` found in the search path, or defaults
    /// when there is none.
    pub fn load() -> Result<Self> {
        for dir in Self::search_dirs() {
            let candidate = dir.join(CONFIG_FILENAME);
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "loading config file");
                return Self::from_yaml_file(&candidate);
            }
        }
        Ok(Self::default())
    }

    /// Directories searched by [`Config::load`], highest priority first
    pub fn search_dirs() -> Vec<PathBuf> {
        let mut dirs = vec![PathBuf::from("/etc/noteapp")];
        if let Some(home) = std::env::var_os("HOME") {
            dirs.push(PathBuf::from(home).join(".noteapp"));
        }
        dirs.push(PathBuf::from("."));
        dirs
    }

    /// Load a YAML config file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| StoreError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&raw)
    }

    /// Parse YAML config text. Missing keys keep their defaults.
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let file: ConfigFile =
            serde_yaml::from_str(raw).map_err(|e| StoreError::Config(e.to_string()))?;

        let defaults = Config::default();
        let store = file.store;
        Ok(Self {
            data_dir: store.file.path.unwrap_or(defaults.data_dir),
            backend: store.backend.unwrap_or(defaults.backend),
            write_mode: store.file.write_mode.unwrap_or(defaults.write_mode),
            sync_on_write: store.file.sync.unwrap_or(defaults.sync_on_write),
        })
    }
}

// =============================================================================
// YAML layout
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    store: StoreSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoreSection {
    backend: Option<Backend>,
    file: FileSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSection {
    path: Option<PathBuf>,
    write_mode: Option<WriteMode>,
    sync: Option<bool>,
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the store backend
    pub fn backend(mut self, backend: Backend) -> Self {
        self.config.backend = backend;
        self
    }

    /// Set the snapshot rewrite strategy
    pub fn write_mode(mut self, mode: WriteMode) -> Self {
        self.config.write_mode = mode;
        self
    }

    /// Enable or disable fsync after every rewrite
    pub fn sync_on_write(mut self, sync: bool) -> Self {
        self.config.sync_on_write = sync;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
