//! Candidate and duplicate groups.
//!
//! # Overview
//!
//! Grouping happens twice:
//!
//! 1. [`group_by_partial`] buckets records by `(size, partial signature)`.
//!    Only buckets with two or more members are worth a full hash.
//! 2. [`group_by_full`] buckets the survivors by full signature. Buckets with
//!    two or more members are confirmed [`DuplicateGroup`]s.
//!
//! Both passes keep the input order of records inside each bucket, and the
//! buckets themselves appear in order of their first member.
//!
//! # Example
//!
//! ```
//! use memescanner::scanner::FileRecord;
//! use memescanner::duplicates::group_by_partial;
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let mut a = FileRecord::from_path(PathBuf::from("/a.jpg"), 1024, SystemTime::now());
//! let mut b = FileRecord::from_path(PathBuf::from("/b.jpg"), 1024, SystemTime::now());
//! let mut c = FileRecord::from_path(PathBuf::from("/c.jpg"), 2048, SystemTime::now());
//! a.partial = Some([1; 32]);
//! b.partial = Some([1; 32]);
//! c.partial = Some([1; 32]);
//!
//! let (candidates, stats) = group_by_partial(vec![a, b, c]);
//! assert_eq!(candidates.len(), 1);
//! assert_eq!(stats.candidate_files, 2);
//! ```

use std::collections::HashMap;

use crate::scanner::{hash_to_hex, FileRecord, Hash};

/// Files sharing size and partial signature: potential duplicates.
#[derive(Debug, Clone)]
pub struct CandidateGroup {
    /// File size in bytes
    pub size: u64,
    /// Shared partial signature
    pub partial: Hash,
    /// Members in input order
    pub files: Vec<FileRecord>,
}

impl CandidateGroup {
    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Confirmed group of byte-identical files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// Full content signature shared by every member
    pub hash: Hash,
    /// File size in bytes (identical for all members)
    pub size: u64,
    /// Members in traversal order; always two or more
    pub files: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    #[must_use]
    pub fn new(hash: Hash, size: u64, files: Vec<FileRecord>) -> Self {
        Self { hash, size, files }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total bytes occupied by all members.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size * self.files.len() as u64
    }

    /// Bytes reclaimable by keeping a single copy.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Number of redundant copies (all members but one).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Full signature as lowercase hex.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hash_to_hex(&self.hash)
    }
}

/// Statistics from the partial grouping pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Records handed to the pass
    pub total_files: usize,
    /// Records without a partial signature
    pub unsigned_files: usize,
    /// Records in buckets of two or more
    pub candidate_files: usize,
    /// Records eliminated because their bucket was a singleton
    pub eliminated_unique: usize,
    /// Number of candidate buckets
    pub candidate_groups: usize,
}

impl GroupingStats {
    /// Percentage of signed records eliminated by this pass.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        let signed = self.total_files - self.unsigned_files;
        if signed == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / signed as f64) * 100.0
        }
    }
}

/// Bucket records by key, preserving first-seen bucket order and member order.
fn bucket_by<K, F>(records: impl IntoIterator<Item = FileRecord>, key: F) -> Vec<(K, Vec<FileRecord>)>
where
    K: std::hash::Hash + Eq + Clone,
    F: Fn(&FileRecord) -> Option<K>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut buckets: Vec<(K, Vec<FileRecord>)> = Vec::new();

    for record in records {
        let Some(k) = key(&record) else { continue };
        match index.get(&k) {
            Some(&i) => buckets[i].1.push(record),
            None => {
                index.insert(k.clone(), buckets.len());
                buckets.push((k, vec![record]));
            }
        }
    }

    buckets
}

/// Bucket records by `(size, partial signature)`.
///
/// Records without a partial signature are dropped. Only buckets with two
/// or more members are returned.
#[must_use]
pub fn group_by_partial(records: Vec<FileRecord>) -> (Vec<CandidateGroup>, GroupingStats) {
    let mut stats = GroupingStats {
        total_files: records.len(),
        unsigned_files: records.iter().filter(|r| r.partial.is_none()).count(),
        ..Default::default()
    };

    let candidates: Vec<CandidateGroup> = bucket_by(records, |r| r.partial.map(|p| (r.size, p)))
        .into_iter()
        .filter_map(|((size, partial), files)| {
            if files.len() < 2 {
                stats.eliminated_unique += files.len();
                return None;
            }
            stats.candidate_files += files.len();
            Some(CandidateGroup {
                size,
                partial,
                files,
            })
        })
        .collect();

    stats.candidate_groups = candidates.len();

    log::info!(
        "Partial grouping complete: {} files -> {} candidates in {} groups ({:.1}% eliminated)",
        stats.total_files,
        stats.candidate_files,
        stats.candidate_groups,
        stats.elimination_rate()
    );

    (candidates, stats)
}

/// Bucket records by `(size, full signature)` into confirmed duplicate groups.
///
/// Records without a full signature are dropped. The result is sorted with
/// [`sort_groups`].
#[must_use]
pub fn group_by_full(records: impl IntoIterator<Item = FileRecord>) -> Vec<DuplicateGroup> {
    let mut groups: Vec<DuplicateGroup> = bucket_by(records, |r| r.full.map(|h| (r.size, h)))
        .into_iter()
        .filter(|(_, files)| files.len() >= 2)
        .map(|((size, hash), files)| DuplicateGroup::new(hash, size, files))
        .collect();

    sort_groups(&mut groups);
    groups
}

/// Order groups by total size descending, then by hash.
pub fn sort_groups(groups: &mut [DuplicateGroup]) {
    groups.sort_by(|a, b| {
        b.total_size()
            .cmp(&a.total_size())
            .then_with(|| a.hash.cmp(&b.hash))
    });
}
