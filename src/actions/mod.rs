//! File actions on duplicate groups.
//!
//! Non-kept copies are either moved to a destination directory or sent to
//! the system trash. Every executed run is recorded in a manifest (see
//! [`crate::manifest`]).

pub mod relocate;
pub mod trash;

pub use relocate::{
    is_cross_device_error, plan_relocations, relocate_duplicates, safe_move, unique_target_path,
    OpFailure, RelocateError, RelocationMode, RelocationOptions, RelocationReport, SAMPLE_SIZE,
};
pub use trash::{SystemTrash, TrashFacility};
