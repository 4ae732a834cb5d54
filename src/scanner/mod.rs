//! Scanner module for directory traversal and file signatures.
//!
//! This module provides functionality for:
//! - Directory walking using jwalk, filtered to media extensions
//! - Partial and full content signatures with BLAKE3
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and [`FileRecord`] discovery
//! - [`hasher`]: Partial (head + tail) and full (streaming) signatures
//!
//! # Example
//!
//! ```no_run
//! use memescanner::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig {
//!     min_size: 32 * 1024,
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(Path::new("."), config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.rel_path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

// Re-export main types
pub use hasher::{
    full_signature, hash_to_hex, hex_to_hash, partial_signature, Hash, PARTIAL_CHUNK_SIZE,
};
pub use walker::Walker;

/// Extensions considered media files when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp", ".tiff", ".mp4", ".mov", ".webm", ".avi",
    ".mkv",
];

/// Default minimum file size (32 KiB). Smaller files are never grouped.
pub const DEFAULT_MIN_SIZE: u64 = 32 * 1024;

/// Descriptor of one candidate file.
///
/// Created during traversal. Only the signature fields are filled in later,
/// by the duplicate finder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Absolute path to the file
    pub path: PathBuf,
    /// Path relative to the scan root
    pub rel_path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
    /// Lowercase extension including the leading dot (empty if none)
    pub extension: String,
    /// Partial signature (first and last 256 KiB), when computed
    pub partial: Option<Hash>,
    /// Full content signature, when computed
    pub full: Option<Hash>,
}

impl FileRecord {
    /// Create a new record with no signatures attached.
    ///
    /// # Arguments
    ///
    /// * `path` - Absolute path to the file
    /// * `rel_path` - Path relative to the scan root
    /// * `size` - File size in bytes
    /// * `modified` - Last modification time
    #[must_use]
    pub fn new(path: PathBuf, rel_path: PathBuf, size: u64, modified: SystemTime) -> Self {
        let extension = extension_of(&path);
        Self {
            path,
            rel_path,
            size,
            modified,
            extension,
            partial: None,
            full: None,
        }
    }

    /// Create a record whose relative path is just its file name.
    ///
    /// Handy when records are built outside of a walk.
    #[must_use]
    pub fn from_path(path: PathBuf, size: u64, modified: SystemTime) -> Self {
        let rel_path = path
            .file_name()
            .map_or_else(|| path.clone(), PathBuf::from);
        Self::new(path, rel_path, size, modified)
    }
}

/// Lowercase extension of `path` with a leading dot, or an empty string.
#[must_use]
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Normalize a user-supplied extension list.
///
/// Entries are trimmed, lowercased and given a leading dot; empty entries
/// are dropped. `"jpg, .PNG,,mp4"` becomes `[".jpg", ".png", ".mp4"]`.
#[must_use]
pub fn normalize_extensions<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    raw.iter()
        .flat_map(|s| s.as_ref().split(','))
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .map(|s| if s.starts_with('.') { s } else { format!(".{s}") })
        .collect()
}

/// Configuration for directory walking.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Include hidden files and directories (names starting with `.`).
    pub include_hidden: bool,

    /// Minimum file size to include (in bytes).
    pub min_size: u64,

    /// Stop after this many accepted media files. Skipped entries (other
    /// extensions, too small, hidden, pruned) do not count.
    pub max_files: Option<usize>,

    /// Accepted extensions, lowercase with leading dot.
    pub extensions: Vec<String>,

    /// Directory names that are never descended into.
    pub ignored_dirs: Vec<String>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            include_hidden: false,
            min_size: 0,
            max_files: None,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
            ignored_dirs: ["node_modules", ".git", ".pnpm-store", ".cache"]
                .iter()
                .map(|d| (*d).to_string())
                .collect(),
        }
    }
}

impl WalkerConfig {
    /// Check whether a file extension is accepted.
    #[must_use]
    pub fn accepts_extension(&self, extension: &str) -> bool {
        self.extensions.iter().any(|e| e == extension)
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while computing a signature.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error raised while reading `path`.
    pub(crate) fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}
