//! SQLite-backed signature cache.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use super::entry::{CacheKey, SignatureRecord};
use super::SignatureCache;
use crate::scanner::{hash_to_hex, hex_to_hash};

/// Current on-disk schema version.
const SCHEMA_VERSION: i64 = 1;

/// Errors raised by the persistent cache.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// SQLite reported an error.
    #[error("Cache database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The cache directory could not be created.
    #[error("Failed to create cache directory {path}: {source}")]
    CreateDir {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The connection mutex was poisoned by a panicking worker.
    #[error("Cache connection lock poisoned")]
    Poisoned,
}

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Persistent signature cache stored in SQLite.
///
/// Rows are keyed by `(path, size, mtime_ns)`. A file that changed on disk
/// simply has no row for its new key; stale rows for the same path are
/// replaced on the next write.
pub struct HashCache {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for HashCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashCache")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl HashCache {
    /// Open or create the cache database at `path`.
    ///
    /// Parent directories are created as needed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the directory or database cannot be created.
    pub fn new(path: &Path) -> CacheResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| CacheError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        let cache = Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        };
        cache.initialize()?;
        log::debug!("Signature cache opened at {}", path.display());
        Ok(cache)
    }

    /// Open a throwaway in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if SQLite fails to initialize.
    pub fn in_memory() -> CacheResult<Self> {
        let cache = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            path: None,
        };
        cache.initialize()?;
        Ok(cache)
    }

    /// Default database location under the platform cache directory.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "memescanner")
            .map(|dirs| dirs.cache_dir().join("signatures.db"))
    }

    /// Location of the database file, `None` for in-memory caches.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn initialize(&self) -> CacheResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;

        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if version != SCHEMA_VERSION {
            // Rows are derived data, so an unknown layout is simply rebuilt
            log::debug!(
                "Cache schema version {} != {}, recreating",
                version,
                SCHEMA_VERSION
            );
            conn.execute_batch("DROP TABLE IF EXISTS signatures;")?;
        }

        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS signatures (
                 path     TEXT PRIMARY KEY,
                 size     INTEGER NOT NULL,
                 mtime_ns INTEGER NOT NULL,
                 partial  TEXT NOT NULL,
                 full     TEXT
             );
             PRAGMA user_version = {SCHEMA_VERSION};"
        ))?;
        Ok(())
    }

    fn lock(&self) -> CacheResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CacheError::Poisoned)
    }

    /// Look up the record for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] on database failure.
    pub fn lookup(&self, key: &CacheKey) -> CacheResult<Option<SignatureRecord>> {
        let conn = self.lock()?;
        let row: Option<(String, Option<String>)> = conn
            .query_row(
                "SELECT partial, full FROM signatures
                 WHERE path = ?1 AND size = ?2 AND mtime_ns = ?3",
                params![
                    key.path.to_string_lossy().into_owned(),
                    size_to_sql(key.size),
                    key.mtime_ns
                ],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        Ok(row.and_then(|(partial, full)| {
            // Corrupt hex is treated as a miss
            let partial = hex_to_hash(&partial)?;
            let full = full.as_deref().and_then(hex_to_hash);
            Some(SignatureRecord { partial, full })
        }))
    }

    /// Store `record` for `key`, replacing any row for the same path.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] on database failure.
    pub fn store(&self, key: &CacheKey, record: &SignatureRecord) -> CacheResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO signatures (path, size, mtime_ns, partial, full)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                key.path.to_string_lossy().into_owned(),
                size_to_sql(key.size),
                key.mtime_ns,
                hash_to_hex(&record.partial),
                record.full.as_ref().map(hash_to_hex),
            ],
        )?;
        Ok(())
    }

    /// Number of rows in the cache.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] on database failure.
    pub fn len(&self) -> CacheResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM signatures", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Whether the cache holds no rows.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] on database failure.
    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl SignatureCache for HashCache {
    fn get(&self, key: &CacheKey) -> Option<SignatureRecord> {
        match self.lookup(key) {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Cache lookup failed for {}: {}", key.path.display(), e);
                None
            }
        }
    }

    fn set(&self, key: &CacheKey, record: SignatureRecord) {
        if let Err(e) = self.store(key, &record) {
            log::warn!("Cache write failed for {}: {}", key.path.display(), e);
        }
    }
}

/// SQLite integers are signed; sizes beyond `i64::MAX` do not occur on real filesystems.
fn size_to_sql(size: u64) -> i64 {
    i64::try_from(size).unwrap_or(i64::MAX)
}
