//! Directory walker implementation using jwalk.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing a scan root and
//! collecting [`FileRecord`]s for media files.
//!
//! # Features
//!
//! - Children sorted by name for deterministic output
//! - Tool directories (`node_modules`, `.git`, ...) pruned via the `ignore` crate
//! - Hidden file filtering
//! - Extension and minimum size filtering
//! - Optional cap on the number of discovered files
//!
//! # Example
//!
//! ```no_run
//! use memescanner::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Pictures"), WalkerConfig::default());
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} media files", files.len());
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use jwalk::WalkDir;

use super::{extension_of, FileRecord, ScanError, WalkerConfig};
use crate::progress::ProgressCallback;

/// Directory walker for media file discovery.
pub struct Walker {
    /// Absolute root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional progress callback
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("root", &self.root)
            .field("config", &self.config)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// Relative paths are resolved against the current directory.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        let root = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        Self {
            root,
            config,
            progress_callback: None,
        }
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// The absolute scan root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build the matcher for directories that are never descended into.
    fn build_dir_matcher(&self) -> Option<Gitignore> {
        let mut builder = GitignoreBuilder::new(&self.root);
        for name in &self.config.ignored_dirs {
            // Trailing slash: only match directories, at any depth
            if let Err(e) = builder.add_line(None, &format!("{name}/")) {
                log::warn!("Invalid ignored directory '{}': {}", name, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if !gitignore.is_empty() => Some(gitignore),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Failed to build ignored directory patterns: {}", e);
                None
            }
        }
    }

    /// Walk the directory tree, yielding file records.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. Files that do not pass the extension or size filters are
    /// skipped silently (trace log only).
    pub fn walk(&self) -> impl Iterator<Item = Result<FileRecord, ScanError>> + '_ {
        let dir_matcher = self.build_dir_matcher();
        let max_files = self.config.max_files.unwrap_or(usize::MAX);
        let mut found = 0usize;

        let walk_dir = WalkDir::new(&self.root)
            .follow_links(false)
            .skip_hidden(!self.config.include_hidden)
            .process_read_dir(move |_depth, _path, _read_dir_state, children| {
                children.retain(|child| match (child, &dir_matcher) {
                    (Ok(entry), Some(matcher)) if entry.file_type().is_dir() => {
                        let ignored = matcher.matched(entry.path(), true).is_ignore();
                        if ignored {
                            log::trace!("Ignoring directory: {}", entry.path().display());
                        }
                        !ignored
                    }
                    _ => true,
                });
                // Sort children for deterministic output
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        walk_dir
            .into_iter()
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    let file_type = entry.file_type();
                    // Directories and symlinks are never candidates
                    if !file_type.is_file() {
                        return None;
                    }
                    self.process_file(entry.path())
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                    log::warn!("Walker error for {}: {}", path.display(), e);
                    Some(Err(ScanError::Io {
                        path,
                        source: std::io::Error::other(e.to_string()),
                    }))
                }
            })
            // Only accepted media records count toward the cap
            .take_while(move |result| {
                if result.is_ok() {
                    found += 1;
                    if found > max_files {
                        log::info!("Reached the limit of {} files, stopping walk", max_files);
                        return false;
                    }
                }
                true
            })
            .inspect(|result| {
                if let (Ok(record), Some(callback)) = (result, &self.progress_callback) {
                    callback.on_progress(0, record.path.to_string_lossy().as_ref());
                }
            })
    }

    /// Turn a regular file into a record if it passes the filters.
    fn process_file(&self, path: PathBuf) -> Option<Result<FileRecord, ScanError>> {
        let extension = extension_of(&path);
        if !self.config.accepts_extension(&extension) {
            log::trace!("Skipping non-media file: {}", path.display());
            return None;
        }

        let metadata = match std::fs::metadata(&path) {
            Ok(m) => m,
            Err(e) => return Some(Err(self.handle_io_error(&path, e))),
        };

        let size = metadata.len();
        if size < self.config.min_size {
            log::trace!(
                "Skipping file below minimum size ({} bytes): {}",
                size,
                path.display()
            );
            return None;
        }

        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let rel_path = path
            .strip_prefix(&self.root)
            .map_or_else(|_| path.clone(), Path::to_path_buf);

        Some(Ok(FileRecord::new(path, rel_path, size, modified)))
    }

    /// Classify I/O errors during file access.
    fn handle_io_error(&self, path: &Path, error: std::io::Error) -> ScanError {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => {
                log::warn!("Permission denied: {}", path.display());
                ScanError::PermissionDenied(path.to_path_buf())
            }
            ErrorKind::NotFound => {
                log::debug!("File not found (may have been deleted): {}", path.display());
                ScanError::NotFound(path.to_path_buf())
            }
            _ => {
                log::warn!("I/O error for {}: {}", path.display(), error);
                ScanError::Io {
                    path: path.to_path_buf(),
                    source: error,
                }
            }
        }
    }
}
