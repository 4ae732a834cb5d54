//! Reading and writing manifests in the log directory.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::data::{Manifest, RelocationOp};

/// Default manifest directory, relative to the working directory.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Target name that selects the newest manifest.
pub const LATEST: &str = "latest";

/// Errors raised while handling manifests.
#[derive(thiserror::Error, Debug)]
pub enum ManifestError {
    /// `latest` was requested but the log directory holds no manifest.
    #[error("No manifest found in {}", .0.display())]
    NoManifests(PathBuf),

    /// The undo target was empty or otherwise unusable.
    #[error("Invalid undo target '{0}': pass a manifest path or 'latest'")]
    InvalidTarget(String),

    /// Reading or writing a manifest failed.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Manifest or directory path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A manifest file is not valid JSON of the expected shape.
    #[error("Malformed manifest {path}: {source}")]
    Parse {
        /// Manifest path
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: serde_json::Error,
    },
}

impl ManifestError {
    /// Whether this error stems from how the tool was invoked.
    #[must_use]
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::NoManifests(_) | Self::InvalidTarget(_))
    }

    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// The directory where manifests are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestLog {
    dir: PathBuf,
}

impl Default for ManifestLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_DIR)
    }
}

impl ManifestLog {
    /// Use `dir` as the log directory. It is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The log directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the log directory if needed and check that files can be
    /// created in it.
    ///
    /// # Errors
    ///
    /// Returns the [`std::io::Error`] from creating the directory or the
    /// scratch file.
    pub fn ensure_writable(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let scratch = self
            .dir
            .join(format!(".write-check-{}", std::process::id()));
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&scratch)?;
        fs::remove_file(&scratch)
    }

    /// Persist `ops` as a new manifest and return its path.
    ///
    /// Never overwrites an existing manifest: on a name clash the timestamp
    /// is advanced by one millisecond.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Io`] if the directory or file cannot be written.
    pub fn write(&self, ops: &[RelocationOp]) -> Result<PathBuf, ManifestError> {
        fs::create_dir_all(&self.dir).map_err(|e| ManifestError::io(&self.dir, e))?;

        let mut manifest = Manifest::new(ops.to_vec());

        loop {
            let path = self.dir.join(manifest.file_name());
            let json = serde_json::to_string_pretty(&manifest).map_err(|source| {
                ManifestError::Parse {
                    path: path.clone(),
                    source,
                }
            })?;
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(json.as_bytes())
                        .map_err(|e| ManifestError::io(&path, e))?;
                    log::info!("Manifest written: {} ({} ops)", path.display(), ops.len());
                    return Ok(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    manifest.created_at += chrono::Duration::milliseconds(1);
                }
                Err(e) => return Err(ManifestError::io(&path, e)),
            }
        }
    }

    /// Manifests in the log directory, newest first.
    ///
    /// Files named `manifest-*.json` (case-insensitive) are ordered by name
    /// descending, then by modification time descending. A missing or
    /// unreadable directory yields an empty list.
    #[must_use]
    pub fn list(&self) -> Vec<PathBuf> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::debug!("Cannot read log directory {}: {}", self.dir.display(), e);
                return Vec::new();
            }
        };

        let mut found: Vec<(String, SystemTime, PathBuf)> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                if !is_manifest_name(&name) {
                    return None;
                }
                let mtime = entry
                    .metadata()
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                Some((name, mtime, entry.path()))
            })
            .collect();

        found.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
        found.into_iter().map(|(_, _, path)| path).collect()
    }

    /// Turn an undo target into a manifest path.
    ///
    /// `"latest"` selects the newest manifest in the log directory; any
    /// other value is taken as a path and made absolute.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::InvalidTarget`] for an empty target and
    /// [`ManifestError::NoManifests`] when `latest` finds nothing.
    pub fn resolve(&self, target: &str) -> Result<PathBuf, ManifestError> {
        let target = target.trim();
        if target.is_empty() {
            return Err(ManifestError::InvalidTarget(target.to_string()));
        }

        if target == LATEST {
            return self
                .list()
                .into_iter()
                .next()
                .ok_or_else(|| ManifestError::NoManifests(self.dir.clone()));
        }

        let path = Path::new(target);
        Ok(std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()))
    }

    /// Load a manifest from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] if the file cannot be read or parsed.
    pub fn read(path: &Path) -> Result<Manifest, ManifestError> {
        let content = fs::read_to_string(path).map_err(|e| ManifestError::io(path, e))?;
        serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// `manifest-*.json`, case-insensitive.
fn is_manifest_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.starts_with("manifest-") && lower.ends_with(".json")
}
