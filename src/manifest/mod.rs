//! Manifest log and undo.
//!
//! Every non-dry-run relocation writes one manifest listing the operations
//! it attempted. Manifests are never modified or merged afterwards; undo
//! reads one and moves files back.
//!
//! # Architecture
//!
//! * [`data`]: [`Manifest`] and [`RelocationOp`] with their JSON layout.
//! * [`io`]: [`ManifestLog`], which writes, lists and resolves manifests.
//! * [`undo`](mod@undo): reverting the moves recorded in a manifest.

pub mod data;
pub mod io;
pub mod undo;

pub use data::{Manifest, OpMode, RelocationOp};
pub use io::{ManifestError, ManifestLog, DEFAULT_LOG_DIR, LATEST};
pub use undo::{undo, UndoReport};
