//! System trash integration.
//!
//! Trashed files can be restored from the platform's recycle bin; they are
//! never recorded with a destination in the manifest and undo skips them.

use std::io;
use std::path::PathBuf;

/// Something that can take files off the user's hands reversibly.
pub trait TrashFacility: Send + Sync {
    /// Send every path in `paths` to the trash.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] if any path could not be trashed.
    fn delete_all(&self, paths: &[PathBuf]) -> io::Result<()>;
}

/// The operating system's trash, via the `trash` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTrash;

impl TrashFacility for SystemTrash {
    fn delete_all(&self, paths: &[PathBuf]) -> io::Result<()> {
        log::debug!("Moving {} file(s) to trash", paths.len());
        trash::delete_all(paths).map_err(|e| io::Error::other(e.to_string()))
    }
}
