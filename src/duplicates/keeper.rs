//! Keeper selection.
//!
//! Every duplicate group retains exactly one file, the keeper. The policy
//! decides which one; ties always go to the earliest member in group order,
//! so the same group and policy always yield the same keeper.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::DuplicateGroup;
use crate::scanner::FileRecord;

/// Rule for choosing the file to keep in a duplicate group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum KeepPolicy {
    /// First member in traversal order
    First,
    /// Most recently modified
    #[default]
    Newest,
    /// Least recently modified
    Oldest,
    /// Largest file
    Largest,
    /// Smallest file
    Smallest,
}

impl KeepPolicy {
    /// All policies, in CLI help order.
    pub const ALL: [KeepPolicy; 5] = [
        KeepPolicy::First,
        KeepPolicy::Newest,
        KeepPolicy::Oldest,
        KeepPolicy::Largest,
        KeepPolicy::Smallest,
    ];

    /// Lowercase policy name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Largest => "largest",
            Self::Smallest => "smallest",
        }
    }

    /// Parse a policy name, falling back to [`KeepPolicy::Newest`] for
    /// anything unrecognized.
    #[must_use]
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "first" => Self::First,
            "oldest" => Self::Oldest,
            "largest" => Self::Largest,
            "smallest" => Self::Smallest,
            "newest" => Self::Newest,
            other => {
                log::warn!("Unknown keep policy '{}', using 'newest'", other);
                Self::Newest
            }
        }
    }
}

impl fmt::Display for KeepPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for KeepPolicy {
    fn from(s: String) -> Self {
        Self::parse_lenient(&s)
    }
}

impl FromStr for KeepPolicy {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_lenient(s))
    }
}

/// Index of the keeper within `files`, or `None` for an empty slice.
#[must_use]
pub fn keeper_index(files: &[FileRecord], policy: KeepPolicy) -> Option<usize> {
    if files.is_empty() {
        return None;
    }

    // `better(candidate, best)` must be strict so ties keep the earlier member
    let better: fn(&FileRecord, &FileRecord) -> bool = match policy {
        KeepPolicy::First => return Some(0),
        KeepPolicy::Newest => |c, b| c.modified > b.modified,
        KeepPolicy::Oldest => |c, b| c.modified < b.modified,
        KeepPolicy::Largest => |c, b| c.size > b.size,
        KeepPolicy::Smallest => |c, b| c.size < b.size,
    };

    let mut best = 0;
    for (i, candidate) in files.iter().enumerate().skip(1) {
        if better(candidate, &files[best]) {
            best = i;
        }
    }
    Some(best)
}

/// Choose the file to keep from `group`.
///
/// Returns `None` only for an empty group, which the grouper never produces.
#[must_use]
pub fn select_keeper(group: &DuplicateGroup, policy: KeepPolicy) -> Option<&FileRecord> {
    keeper_index(&group.files, policy).map(|i| &group.files[i])
}
