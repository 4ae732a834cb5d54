//! Manifest data model.
//!
//! The JSON layout is fixed:
//!
//! ```json
//! {
//!   "createdAt": "2024-05-01T10:00:00.000Z",
//!   "ops": [
//!     { "from": "/media/a.jpg", "to": "/dups/a.jpg", "mode": "move" },
//!     { "from": "/media/b.jpg", "mode": "trash" }
//!   ]
//! }
//! ```

use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// How a duplicate was disposed of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpMode {
    /// Moved to a destination directory
    Move,
    /// Handed to the system trash
    Trash,
}

/// One planned relocation of a non-kept file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationOp {
    /// Original location
    pub from: PathBuf,
    /// Destination, absent for trash operations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<PathBuf>,
    /// Disposal mode
    pub mode: OpMode,
}

impl RelocationOp {
    /// A move from `from` to `to`.
    #[must_use]
    pub fn moved(from: PathBuf, to: PathBuf) -> Self {
        Self {
            from,
            to: Some(to),
            mode: OpMode::Move,
        }
    }

    /// A trash operation for `from`.
    #[must_use]
    pub fn trashed(from: PathBuf) -> Self {
        Self {
            from,
            to: None,
            mode: OpMode::Trash,
        }
    }
}

/// Record of every operation attempted in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// When the manifest was written
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// Operations in execution order
    #[serde(default)]
    pub ops: Vec<RelocationOp>,
}

impl Manifest {
    /// Create a manifest stamped with the current time.
    #[must_use]
    pub fn new(ops: Vec<RelocationOp>) -> Self {
        Self {
            created_at: Utc::now(),
            ops,
        }
    }

    /// File name for this manifest: `manifest-<timestamp>.json`.
    ///
    /// The timestamp is ISO-8601 with millisecond precision, with `:` and
    /// `.` replaced by `-` so names sort chronologically.
    #[must_use]
    pub fn file_name(&self) -> String {
        let stamp = self
            .created_at
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace([':', '.'], "-");
        format!("manifest-{stamp}.json")
    }
}
