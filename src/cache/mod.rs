//! Signature caching.
//!
//! Re-scanning a large media library is dominated by hashing. The cache
//! remembers the partial and full signatures of each file version so
//! unchanged files are never read twice.
//!
//! # Architecture
//!
//! * [`entry`]: [`CacheKey`] (path, size, mtime) and [`SignatureRecord`].
//! * [`database`]: [`HashCache`], the SQLite-backed implementation.
//! * [`MemoryCache`]: in-process map, used when persistence is disabled.
//!
//! All implementations are shared between rayon workers, so they take
//! `&self` and synchronize internally.

pub mod database;
pub mod entry;

use std::collections::HashMap;
use std::sync::Mutex;

pub use database::{CacheError, CacheResult, HashCache};
pub use entry::{CacheKey, SignatureRecord};

/// Lookup and storage of file signatures.
///
/// Implementations never fail loudly: a broken cache behaves like an empty
/// one and logs the problem.
pub trait SignatureCache: Send + Sync {
    /// Fetch the record stored for `key`, if any.
    fn get(&self, key: &CacheKey) -> Option<SignatureRecord>;

    /// Remember `record` for `key`.
    fn set(&self, key: &CacheKey, record: SignatureRecord);
}

/// Non-persistent cache backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<CacheKey, SignatureRecord>>,
}

impl MemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |e| e.len())
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SignatureCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Option<SignatureRecord> {
        self.entries.lock().ok()?.get(key).copied()
    }

    fn set(&self, key: &CacheKey, record: SignatureRecord) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.clone(), record);
        }
    }
}
