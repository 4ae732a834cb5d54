//! Replaying a manifest in reverse.

use std::path::Path;

use super::data::OpMode;
use super::io::{ManifestError, ManifestLog};
use crate::actions::relocate::safe_move;

/// Outcome of an undo run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UndoReport {
    /// Files moved back to their original location
    pub undone: usize,
    /// Operations that failed with an I/O error
    pub errors: usize,
}

impl UndoReport {
    /// Human-readable one-line summary.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.errors == 0 {
            format!("Restored {} file(s)", self.undone)
        } else {
            format!("Restored {} file(s), {} error(s)", self.undone, self.errors)
        }
    }
}

/// Move every relocated file of a manifest back to where it came from.
///
/// An operation is reverted only when its original location is free and its
/// destination still exists; anything else is skipped silently, so undoing
/// the same manifest twice is harmless. Trash operations are always skipped,
/// even when a hand-edited manifest gives them a destination. Undo does not
/// write a manifest.
///
/// # Errors
///
/// Returns [`ManifestError`] if the manifest cannot be read or parsed.
/// Failures of individual operations are counted in [`UndoReport::errors`].
pub fn undo(manifest_path: &Path) -> Result<UndoReport, ManifestError> {
    let manifest = ManifestLog::read(manifest_path)?;
    let mut report = UndoReport::default();

    log::info!(
        "Undoing {} operation(s) from {}",
        manifest.ops.len(),
        manifest_path.display()
    );

    for op in &manifest.ops {
        if op.mode == OpMode::Trash {
            log::trace!("Skipping trash operation for {}", op.from.display());
            continue;
        }
        let Some(to) = op.to.as_deref() else {
            log::trace!("Move of {} has no destination", op.from.display());
            continue;
        };

        let from_exists = op.from.try_exists();
        let to_exists = to.try_exists();
        match (from_exists, to_exists) {
            (Ok(false), Ok(true)) => match safe_move(to, &op.from) {
                Ok(()) => {
                    log::debug!("Restored {}", op.from.display());
                    report.undone += 1;
                }
                Err(e) => {
                    log::warn!("Failed to restore {}: {}", op.from.display(), e);
                    report.errors += 1;
                }
            },
            (Err(e), _) | (_, Err(e)) => {
                log::warn!("Cannot check {}: {}", op.from.display(), e);
                report.errors += 1;
            }
            _ => log::trace!("Nothing to undo for {}", op.from.display()),
        }
    }

    log::info!("{}", report.summary());
    Ok(report)
}
