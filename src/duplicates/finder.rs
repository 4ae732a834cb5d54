//! Duplicate finder pipeline.
//!
//! # Overview
//!
//! [`DuplicateFinder`] runs the staged detection pipeline:
//!
//! 1. **Walk** - collect [`FileRecord`]s with the [`Walker`]
//! 2. **Partial stage** - attach a partial signature to every record
//!    (from the cache or computed), then bucket by `(size, partial)`
//! 3. **Full stage** - attach a full signature to every candidate, then
//!    bucket by full signature into [`DuplicateGroup`]s
//!
//! Signature stages run on a bounded rayon pool (`io_threads`). Grouping
//! and ordering only happen once a stage has finished, so the result is the
//! same as a sequential run.
//!
//! # Example
//!
//! ```no_run
//! use memescanner::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(4));
//! let outcome = finder.find_duplicates(Path::new("/some/path")).unwrap();
//!
//! println!("Found {} duplicate groups", outcome.groups.len());
//! println!("Reclaimable space: {}", outcome.summary.reclaimable_display());
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use super::groups::{group_by_full, group_by_partial, DuplicateGroup};
use crate::cache::{CacheKey, SignatureCache, SignatureRecord};
use crate::progress::{ProgressCallback, PHASE_FULL, PHASE_PARTIAL, PHASE_WALKING};
use crate::scanner::{
    full_signature, partial_signature, FileRecord, Hash, ScanError, Walker, WalkerConfig,
};

/// Default number of concurrent signature readers.
pub const DEFAULT_IO_THREADS: usize = 4;

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of I/O threads for signature computation
    pub io_threads: usize,
    /// Traversal settings
    pub walker_config: WalkerConfig,
    /// Optional signature cache
    pub cache: Option<Arc<dyn SignatureCache>>,
    /// Only accept cache entries that already carry a full signature
    pub require_full_in_cache: bool,
    /// Optional progress callback
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("walker_config", &self.walker_config)
            .field("cache", &self.cache.as_ref().map(|_| "<cache>"))
            .field("require_full_in_cache", &self.require_full_in_cache)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: DEFAULT_IO_THREADS,
            walker_config: WalkerConfig::default(),
            cache: None,
            require_full_in_cache: false,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the number of I/O threads (minimum 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the traversal settings.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the signature cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn SignatureCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Treat cache entries without a full signature as misses.
    #[must_use]
    pub fn with_require_full_in_cache(mut self, required: bool) -> Self {
        self.require_full_in_cache = required;
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// Where a signature came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Cache,
    Computed,
    Failed,
}

/// Counters for one signature stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageStats {
    /// Records handed to the stage
    pub input_files: usize,
    /// Signatures computed from file contents
    pub computed: usize,
    /// Signatures served from the cache
    pub cache_hits: usize,
    /// Files that could not be read
    pub failed: usize,
}

impl StageStats {
    fn record(&mut self, source: Source) {
        match source {
            Source::Cache => self.cache_hits += 1,
            Source::Computed => self.computed += 1,
            Source::Failed => self.failed += 1,
        }
    }
}

/// Summary statistics from a scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Total number of files scanned
    pub total_files: usize,
    /// Total size of all scanned files in bytes
    pub total_size: u64,
    /// Traversal errors (unreadable directories or files)
    pub scan_errors: usize,
    /// Partial signature stage counters
    pub partial: StageStats,
    /// Full signature stage counters
    pub full: StageStats,
    /// Files eliminated because their (size, partial) pair was unique
    pub eliminated_by_partial: usize,
    /// Candidates eliminated because their full signature was unique
    pub eliminated_by_full: usize,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of redundant files (excluding one keeper per group)
    pub duplicate_files: usize,
    /// Total space that can be reclaimed by removing duplicates
    pub reclaimable_space: u64,
    /// Duration of the entire scan
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Percentage of scanned bytes occupied by redundant copies.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Reclaimable space as a human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        bytesize::ByteSize(self.reclaimable_space).to_string()
    }

    /// Total size as a human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        bytesize::ByteSize(self.total_size).to_string()
    }
}

/// Result of a scan, owned by the caller.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Absolute scan root
    pub root: PathBuf,
    /// Every scanned record, with whatever signatures were attached
    pub records: Vec<FileRecord>,
    /// Confirmed duplicate groups, largest total size first
    pub groups: Vec<DuplicateGroup>,
    /// Statistics
    pub summary: ScanSummary,
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The rayon pool could not be created.
    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A scan error occurred.
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Duplicate finder that orchestrates the staged detection pipeline.
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl std::fmt::Debug for DuplicateFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplicateFinder")
            .field("config", &self.config)
            .finish()
    }
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Walk `path` and find all duplicate media files below it.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError`] if the path does not exist, is not a
    /// directory, or the thread pool cannot be built. Per-file problems are
    /// logged and counted, never fatal.
    pub fn find_duplicates(&self, path: &Path) -> Result<ScanOutcome, FinderError> {
        let start = Instant::now();

        if !path.exists() {
            return Err(FinderError::PathNotFound(path.to_path_buf()));
        }
        if !path.is_dir() {
            return Err(FinderError::NotADirectory(path.to_path_buf()));
        }

        let mut walker = Walker::new(path, self.config.walker_config.clone());
        if let Some(ref callback) = self.config.progress_callback {
            walker = walker.with_progress_callback(Arc::clone(callback));
            callback.on_phase_start(PHASE_WALKING, 0);
        }

        let mut records = Vec::new();
        let mut scan_errors = 0;
        for result in walker.walk() {
            match result {
                Ok(record) => records.push(record),
                Err(_) => scan_errors += 1,
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_WALKING);
        }
        log::info!(
            "Walk complete: {} media files ({} errors) under {}",
            records.len(),
            scan_errors,
            walker.root().display()
        );

        let mut outcome = self.find_duplicates_from_records(walker.root(), records)?;
        outcome.summary.scan_errors = scan_errors;
        outcome.summary.scan_duration = start.elapsed();
        Ok(outcome)
    }

    /// Find duplicates among already collected records.
    ///
    /// Records are expected to share the root `root` and to have passed the
    /// caller's size and extension filters.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::ThreadPool`] if the rayon pool cannot be built.
    pub fn find_duplicates_from_records(
        &self,
        root: &Path,
        records: Vec<FileRecord>,
    ) -> Result<ScanOutcome, FinderError> {
        let start = Instant::now();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads.max(1))
            .build()?;

        let mut summary = ScanSummary {
            total_files: records.len(),
            total_size: records.iter().map(|r| r.size).sum(),
            ..Default::default()
        };

        // Partial stage
        let mut records = pool.install(|| self.partial_stage(records, &mut summary.partial));
        let (candidates, grouping) = group_by_partial(records.clone());
        summary.eliminated_by_partial = grouping.eliminated_unique;

        // Full stage
        let candidate_files: Vec<FileRecord> =
            candidates.into_iter().flat_map(|g| g.files).collect();
        let candidate_count = candidate_files.len();
        let hashed = pool.install(|| self.full_stage(candidate_files, &mut summary.full));

        let full_by_path: HashMap<&Path, Hash> = hashed
            .iter()
            .filter_map(|r| r.full.map(|h| (r.path.as_path(), h)))
            .collect();
        for record in &mut records {
            if let Some(hash) = full_by_path.get(record.path.as_path()) {
                record.full = Some(*hash);
            }
        }

        let groups = group_by_full(hashed);

        let grouped_files: usize = groups.iter().map(DuplicateGroup::len).sum();
        summary.eliminated_by_full = candidate_count - grouped_files;
        summary.duplicate_groups = groups.len();
        summary.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        summary.reclaimable_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
        summary.scan_duration = start.elapsed();

        log::info!(
            "Found {} duplicate groups ({} redundant files, {} reclaimable)",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display()
        );

        Ok(ScanOutcome {
            root: root.to_path_buf(),
            records,
            groups,
            summary,
        })
    }

    /// Attach partial (and cached full) signatures to every record.
    fn partial_stage(&self, records: Vec<FileRecord>, stats: &mut StageStats) -> Vec<FileRecord> {
        stats.input_files = records.len();
        if records.is_empty() {
            log::debug!("Partial stage: no files to process");
            return records;
        }

        let callback = self.config.progress_callback.as_ref();
        if let Some(cb) = callback {
            cb.on_phase_start(PHASE_PARTIAL, records.len());
        }
        log::info!("Computing partial signatures for {} files", records.len());

        let results: Vec<(FileRecord, Source)> = records
            .into_par_iter()
            .enumerate()
            .map(|(idx, mut record)| {
                if let Some(cb) = callback {
                    cb.on_progress(idx + 1, record.path.to_string_lossy().as_ref());
                }
                let source = self.attach_partial(&mut record);
                (record, source)
            })
            .collect();

        if let Some(cb) = callback {
            cb.on_phase_end(PHASE_PARTIAL);
        }

        let mut out = Vec::with_capacity(results.len());
        for (record, source) in results {
            stats.record(source);
            out.push(record);
        }

        log::info!(
            "Partial stage complete: {} computed, {} from cache, {} failed",
            stats.computed,
            stats.cache_hits,
            stats.failed
        );
        out
    }

    fn attach_partial(&self, record: &mut FileRecord) -> Source {
        let key = CacheKey::for_record(record);

        if let Some(cache) = self.config.cache.as_ref() {
            match cache.get(&key) {
                Some(cached) if !self.config.require_full_in_cache || cached.full.is_some() => {
                    log::trace!("Partial cache hit: {}", record.path.display());
                    record.partial = Some(cached.partial);
                    record.full = cached.full;
                    return Source::Cache;
                }
                _ => log::trace!("Partial cache miss: {}", record.path.display()),
            }
        }

        match partial_signature(&record.path, record.size) {
            Ok(hash) => {
                record.partial = Some(hash);
                if let Some(cache) = self.config.cache.as_ref() {
                    cache.set(&key, SignatureRecord::partial_only(hash));
                }
                Source::Computed
            }
            Err(e) => {
                log::warn!("Skipping unreadable file: {}", e);
                Source::Failed
            }
        }
    }

    /// Attach full signatures to every candidate.
    fn full_stage(&self, records: Vec<FileRecord>, stats: &mut StageStats) -> Vec<FileRecord> {
        stats.input_files = records.len();
        if records.is_empty() {
            log::debug!("Full stage: no candidates");
            return records;
        }

        let callback = self.config.progress_callback.as_ref();
        if let Some(cb) = callback {
            cb.on_phase_start(PHASE_FULL, records.len());
        }
        log::info!("Computing full signatures for {} candidates", records.len());

        let results: Vec<(FileRecord, Source)> = records
            .into_par_iter()
            .enumerate()
            .map(|(idx, mut record)| {
                if let Some(cb) = callback {
                    cb.on_progress(idx + 1, record.path.to_string_lossy().as_ref());
                }
                let source = self.attach_full(&mut record);
                (record, source)
            })
            .collect();

        if let Some(cb) = callback {
            cb.on_phase_end(PHASE_FULL);
        }

        let mut out = Vec::with_capacity(results.len());
        for (record, source) in results {
            stats.record(source);
            out.push(record);
        }

        log::info!(
            "Full stage complete: {} computed, {} from cache, {} failed",
            stats.computed,
            stats.cache_hits,
            stats.failed
        );
        out
    }

    fn attach_full(&self, record: &mut FileRecord) -> Source {
        if record.full.is_some() {
            log::trace!("Full cache hit: {}", record.path.display());
            return Source::Cache;
        }

        match full_signature(&record.path) {
            Ok(hash) => {
                record.full = Some(hash);
                if let (Some(cache), Some(partial)) = (self.config.cache.as_ref(), record.partial) {
                    cache.set(
                        &CacheKey::for_record(record),
                        SignatureRecord {
                            partial,
                            full: Some(hash),
                        },
                    );
                }
                Source::Computed
            }
            Err(e) => {
                log::warn!("Skipping unreadable file: {}", e);
                Source::Failed
            }
        }
    }
}
