//! Layered application configuration.
//!
//! Values are merged with figment, later layers winning:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. `config.toml` in the platform config directory
//! 3. `MEMESCANNER_*` environment variables (e.g. `MEMESCANNER_MIN_SIZE=0`,
//!    `MEMESCANNER_EXTENSIONS=[jpg,png]`)
//!
//! Command-line flags are applied on top by the caller.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::duplicates::{KeepPolicy, DEFAULT_IO_THREADS};
use crate::manifest::DEFAULT_LOG_DIR;
use crate::scanner::{DEFAULT_EXTENSIONS, DEFAULT_MIN_SIZE};

/// Prefix of environment variables read into the configuration.
pub const ENV_PREFIX: &str = "MEMESCANNER_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum file size in bytes
    pub min_size: u64,
    /// Media extensions (dot optional, case-insensitive)
    pub extensions: Vec<String>,
    /// Keeper policy
    pub keep: KeepPolicy,
    /// Concurrent signature readers
    pub io_threads: usize,
    /// Manifest directory
    pub log_dir: PathBuf,
    /// Include hidden files and directories
    pub include_hidden: bool,
    /// Signature cache database; the platform cache directory when unset
    pub cache_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_SIZE,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
            keep: KeepPolicy::default(),
            io_threads: DEFAULT_IO_THREADS,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            include_hidden: false,
            cache_path: None,
        }
    }
}

impl Config {
    /// Load the configuration from the default locations.
    ///
    /// Falls back to defaults (with a warning) if any layer is invalid.
    #[must_use]
    pub fn load() -> Self {
        let path = Self::config_path();
        match Self::load_from(path.as_deref()) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Invalid configuration, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Load the configuration using `file` as the TOML layer.
    ///
    /// A missing file is skipped.
    ///
    /// # Errors
    ///
    /// Returns a figment error if the file or environment holds values of
    /// the wrong type.
    pub fn load_from(file: Option<&Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(file).extract().map_err(Box::new)
    }

    /// The merged provider stack.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            log::debug!("Reading configuration from {}", file.display());
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Platform-specific path of `config.toml`.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "memescanner").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
