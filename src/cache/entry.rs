//! Cache key and record definitions.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::scanner::{FileRecord, Hash};

/// Identity of a file version in the signature cache.
///
/// A cached record is only valid while the path, size and modification time
/// all match. Any change produces a different key and therefore a miss.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Absolute file path
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Modification time in nanoseconds since the Unix epoch
    pub mtime_ns: i64,
}

impl CacheKey {
    /// Build a key from its parts.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, modified: SystemTime) -> Self {
        Self {
            path,
            size,
            mtime_ns: system_time_to_nanos(modified),
        }
    }

    /// Build the key for a scanned file.
    #[must_use]
    pub fn for_record(record: &FileRecord) -> Self {
        Self::new(record.path.clone(), record.size, record.modified)
    }
}

/// Signatures remembered for one [`CacheKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureRecord {
    /// Partial (head + tail) signature
    pub partial: Hash,
    /// Full content signature, if it was ever needed
    pub full: Option<Hash>,
}

impl SignatureRecord {
    /// A record carrying only the partial signature.
    #[must_use]
    pub fn partial_only(partial: Hash) -> Self {
        Self {
            partial,
            full: None,
        }
    }
}

/// Nanoseconds since the Unix epoch, negative for earlier times.
fn system_time_to_nanos(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_nanos()).unwrap_or(i64::MAX),
        Err(e) => i64::try_from(e.duration().as_nanos()).map_or(i64::MIN, |n| -n),
    }
}
