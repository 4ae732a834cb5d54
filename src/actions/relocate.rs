//! Moving or trashing redundant copies.
//!
//! # Overview
//!
//! Relocation is split into two steps:
//!
//! 1. [`plan_relocations`] turns duplicate groups into [`RelocationOp`]s,
//!    one per non-kept file. Destinations are made unique against the live
//!    filesystem and against names already handed out in the same plan.
//! 2. [`relocate_duplicates`] executes the plan (unless dry-run), counts
//!    successes and failures, and writes a manifest so the run can be undone.
//!
//! The keeper of each group never appears in a plan, so at least one copy
//! of every file survives.
//!
//! # Move fallback
//!
//! [`safe_move`] tries `rename` first. When that fails because source and
//! destination are on different devices, or because of a permission error,
//! the file is copied and the source removed. A crash between the two steps
//! leaves both copies on disk.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::trash::TrashFacility;
use crate::duplicates::{keeper_index, DuplicateGroup, KeepPolicy};
use crate::manifest::{ManifestError, ManifestLog, OpMode, RelocationOp};
use crate::progress::{ProgressCallback, PHASE_RELOCATE};

/// Number of planned operations kept in [`RelocationReport::sample`].
pub const SAMPLE_SIZE: usize = 10;

/// Where non-kept files go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelocationMode {
    /// Move into `dest_root`, optionally mirroring the scan-relative layout.
    MoveTo {
        /// Destination directory
        dest_root: PathBuf,
        /// Keep the path relative to the scan root instead of the bare name
        preserve_dirs: bool,
    },
    /// Hand files to the trash facility.
    Trash,
}

/// Options for a relocation run.
#[derive(Debug, Clone)]
pub struct RelocationOptions {
    /// Destination for non-kept files
    pub mode: RelocationMode,
    /// Keeper policy
    pub policy: KeepPolicy,
    /// Plan and report only
    pub dry_run: bool,
}

/// One operation that could not be carried out.
#[derive(Debug, Clone)]
pub struct OpFailure {
    /// The failed operation
    pub op: RelocationOp,
    /// Error message
    pub error: String,
}

/// Outcome of a relocation run.
#[derive(Debug, Clone, Default)]
pub struct RelocationReport {
    /// Number of planned operations
    pub planned: usize,
    /// Operations that succeeded
    pub succeeded: usize,
    /// Operations that failed
    pub failed: usize,
    /// The first [`SAMPLE_SIZE`] planned operations
    pub sample: Vec<RelocationOp>,
    /// Every planned operation
    pub ops: Vec<RelocationOp>,
    /// Details for every failed operation
    pub failures: Vec<OpFailure>,
    /// Manifest path, `None` on dry-run
    pub manifest: Option<PathBuf>,
    /// Whether this was a dry-run
    pub dry_run: bool,
}

impl RelocationReport {
    /// Check if all operations succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// Human-readable one-line summary.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.dry_run {
            format!("{} operation(s) planned (dry-run)", self.planned)
        } else if self.failed == 0 {
            format!("{} of {} operation(s) succeeded", self.succeeded, self.planned)
        } else {
            format!(
                "{} of {} operation(s) succeeded, {} failed",
                self.succeeded, self.planned, self.failed
            )
        }
    }
}

/// Errors that abort a relocation run.
#[derive(thiserror::Error, Debug)]
pub enum RelocateError {
    /// The destination directory could not be created.
    #[error("Failed to create destination {path}: {source}")]
    CreateDestination {
        /// Destination directory
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The log directory is missing and cannot be created, or is not writable.
    #[error("Log directory {path} is not writable: {source}")]
    LogDir {
        /// Log directory
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The manifest could not be written.
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Check if an error is a cross-device link error (EXDEV / ERROR_NOT_SAME_DEVICE).
#[must_use]
pub fn is_cross_device_error(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::CrossesDevices
}

/// Whether a failed `rename` should be retried as copy + delete.
fn needs_copy_fallback(err: &io::Error) -> bool {
    is_cross_device_error(err) || err.kind() == io::ErrorKind::PermissionDenied
}

/// Move `src` to `dest`, creating parent directories.
///
/// Falls back to copy-then-delete when `rename` is not possible.
///
/// # Errors
///
/// Returns the underlying [`io::Error`]. If the copy fails, the partial
/// destination is removed and the source is left untouched.
pub fn safe_move(src: &Path, dest: &Path) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(err) if needs_copy_fallback(&err) => {
            log::debug!(
                "rename failed for {} ({}), falling back to copy",
                src.display(),
                err
            );
            copy_then_remove(src, dest)
        }
        Err(err) => Err(err),
    }
}

/// Copy `src` to `dest`, flush it to disk, then delete `src`.
///
/// A failed copy removes whatever reached `dest` and leaves `src` alone.
fn copy_then_remove(src: &Path, dest: &Path) -> io::Result<()> {
    if let Err(err) = fs::copy(src, dest) {
        let _ = fs::remove_file(dest);
        return Err(err);
    }
    fs::File::open(dest)?.sync_all()?;
    fs::remove_file(src)
}

/// `"<stem> (dup<n>)<ext>"` next to `path`.
fn dup_name(path: &Path, n: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    path.with_file_name(format!("{stem} (dup{n}){ext}"))
}

/// First free variant of `candidate`.
///
/// A path is taken if it exists on disk or is in `taken`. Tries
/// `candidate`, then `"<stem> (dup1)<ext>"`, `"<stem> (dup2)<ext>"`, ...
#[must_use]
pub fn unique_target_path(candidate: &Path, taken: &HashSet<PathBuf>) -> PathBuf {
    let is_free = |p: &Path| !taken.contains(p) && fs::symlink_metadata(p).is_err();

    if is_free(candidate) {
        return candidate.to_path_buf();
    }

    (1..)
        .map(|n| dup_name(candidate, n))
        .find(|p| is_free(p))
        .unwrap_or_else(|| candidate.to_path_buf())
}

/// Build the operation list for `groups`.
///
/// Planning never mutates the filesystem; it only checks which destination
/// names already exist.
#[must_use]
pub fn plan_relocations(
    groups: &[DuplicateGroup],
    policy: KeepPolicy,
    mode: &RelocationMode,
) -> Vec<RelocationOp> {
    let mut ops = Vec::new();
    let mut taken: HashSet<PathBuf> = HashSet::new();

    for group in groups {
        let Some(keep) = keeper_index(&group.files, policy) else {
            continue;
        };
        log::debug!(
            "Group {}: keeping {}",
            &group.hash_hex()[..16],
            group.files[keep].path.display()
        );

        for (i, file) in group.files.iter().enumerate() {
            if i == keep {
                continue;
            }

            let op = match mode {
                RelocationMode::Trash => RelocationOp::trashed(file.path.clone()),
                RelocationMode::MoveTo {
                    dest_root,
                    preserve_dirs,
                } => {
                    let relative = if *preserve_dirs {
                        file.rel_path.clone()
                    } else {
                        file.path
                            .file_name()
                            .map_or_else(|| file.rel_path.clone(), PathBuf::from)
                    };
                    let target = unique_target_path(&dest_root.join(relative), &taken);
                    taken.insert(target.clone());
                    RelocationOp::moved(file.path.clone(), target)
                }
            };
            ops.push(op);
        }
    }

    ops
}

fn execute_op(op: &RelocationOp, trash: &dyn TrashFacility) -> io::Result<()> {
    match (op.mode, op.to.as_deref()) {
        (OpMode::Trash, _) => trash.delete_all(std::slice::from_ref(&op.from)),
        (OpMode::Move, Some(to)) => safe_move(&op.from, to),
        (OpMode::Move, None) => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "move operation without destination",
        )),
    }
}

/// Plan and, unless dry-run, execute the relocation of every non-kept file.
///
/// Individual failures are logged and counted; they never stop the run.
/// After execution a manifest listing every attempted operation is written
/// to `log`.
///
/// # Errors
///
/// Returns [`RelocateError`] if the log directory is not writable, the
/// destination directory cannot be created, or the manifest cannot be
/// written. The log directory is checked before any file is touched.
pub fn relocate_duplicates(
    groups: &[DuplicateGroup],
    options: &RelocationOptions,
    trash: &dyn TrashFacility,
    log: &ManifestLog,
    progress: Option<&dyn ProgressCallback>,
) -> Result<RelocationReport, RelocateError> {
    let ops = plan_relocations(groups, options.policy, &options.mode);
    let mut report = RelocationReport {
        planned: ops.len(),
        sample: ops.iter().take(SAMPLE_SIZE).cloned().collect(),
        dry_run: options.dry_run,
        ..Default::default()
    };

    if options.dry_run {
        log::info!("Dry-run: {} operation(s) planned, nothing changed", ops.len());
        report.ops = ops;
        return Ok(report);
    }

    log.ensure_writable().map_err(|source| RelocateError::LogDir {
        path: log.dir().to_path_buf(),
        source,
    })?;

    if let RelocationMode::MoveTo { dest_root, .. } = &options.mode {
        fs::create_dir_all(dest_root).map_err(|source| RelocateError::CreateDestination {
            path: dest_root.clone(),
            source,
        })?;
    }

    if let Some(cb) = progress {
        cb.on_phase_start(PHASE_RELOCATE, ops.len());
    }

    for (idx, op) in ops.iter().enumerate() {
        if let Some(cb) = progress {
            cb.on_progress(idx + 1, op.from.to_string_lossy().as_ref());
        }
        match execute_op(op, trash) {
            Ok(()) => {
                log::debug!("Relocated {}", op.from.display());
                report.succeeded += 1;
            }
            Err(e) => {
                log::warn!("Failed to relocate {}: {}", op.from.display(), e);
                report.failed += 1;
                report.failures.push(OpFailure {
                    op: op.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    if let Some(cb) = progress {
        cb.on_phase_end(PHASE_RELOCATE);
    }

    if report.failed > 0 {
        log::debug!(
            "{} failed operation(s) are still recorded in the manifest",
            report.failed
        );
    }
    report.manifest = Some(log.write(&ops)?);
    report.ops = ops;

    log::info!("{}", report.summary());
    Ok(report)
}
