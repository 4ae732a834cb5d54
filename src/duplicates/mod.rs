//! Duplicate detection.
//!
//! This module provides functionality for:
//! - Bucketing by size and partial signature
//! - Confirming duplicates by full signature
//! - Choosing the keeper of each group

pub mod finder;
pub mod groups;
pub mod keeper;

pub use finder::{
    DuplicateFinder, FinderConfig, FinderError, ScanOutcome, ScanSummary, StageStats,
    DEFAULT_IO_THREADS,
};
pub use groups::{
    group_by_full, group_by_partial, sort_groups, CandidateGroup, DuplicateGroup, GroupingStats,
};
pub use keeper::{keeper_index, select_keeper, KeepPolicy};
