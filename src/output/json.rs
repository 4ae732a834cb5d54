//! JSON export of every scanned record.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "root": "/home/me/Pictures",
//!   "count": 2,
//!   "totalBytes": 2048,
//!   "results": [
//!     {
//!       "path": "cats/a.jpg",
//!       "absPath": "/home/me/Pictures/cats/a.jpg",
//!       "size": 1024,
//!       "sizeHuman": "1.0 KiB",
//!       "mtime": "2024-05-01T10:00:00.000Z",
//!       "ext": ".jpg",
//!       "qsig": "9f0c...",
//!       "sha1": null
//!     }
//!   ]
//! }
//! ```
//!
//! `qsig` is the partial signature and `sha1` the full content signature;
//! both are BLAKE3 hex digests, or `null` when not computed.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use bytesize::ByteSize;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::duplicates::ScanOutcome;
use crate::scanner::{hash_to_hex, FileRecord};

/// One scanned file in JSON format.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonRecord {
    /// Path relative to the scan root
    pub path: String,
    /// Absolute path
    pub abs_path: String,
    /// Size in bytes
    pub size: u64,
    /// Human-readable size
    pub size_human: String,
    /// Modification time, ISO-8601 UTC
    pub mtime: String,
    /// Lowercase extension with the dot
    pub ext: String,
    /// Partial signature as hex
    pub qsig: Option<String>,
    /// Full signature as hex
    pub sha1: Option<String>,
}

impl JsonRecord {
    /// Convert a scanned record.
    #[must_use]
    pub fn from_record(record: &FileRecord) -> Self {
        let mtime: DateTime<Utc> = record.modified.into();
        Self {
            path: record.rel_path.to_string_lossy().into_owned(),
            abs_path: record.path.to_string_lossy().into_owned(),
            size: record.size,
            size_human: ByteSize::b(record.size).to_string(),
            mtime: mtime.to_rfc3339_opts(SecondsFormat::Millis, true),
            ext: record.extension.clone(),
            qsig: record.partial.as_ref().map(hash_to_hex),
            sha1: record.full.as_ref().map(hash_to_hex),
        }
    }
}

/// Complete export document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonOutput {
    /// Absolute scan root
    pub root: String,
    /// Number of records
    pub count: usize,
    /// Sum of all record sizes
    pub total_bytes: u64,
    /// Every scanned record in traversal order
    pub results: Vec<JsonRecord>,
}

impl JsonOutput {
    /// Build the export from a finished scan.
    #[must_use]
    pub fn new(outcome: &ScanOutcome) -> Self {
        Self::from_records(&outcome.root, &outcome.records)
    }

    /// Build the export from a root and its records.
    #[must_use]
    pub fn from_records(root: &Path, records: &[FileRecord]) -> Self {
        Self {
            root: root.to_string_lossy().into_owned(),
            count: records.len(),
            total_bytes: records.iter().map(|r| r.size).sum(),
            results: records.iter().map(JsonRecord::from_record).collect(),
        }
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), JsonOutputError> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write JSON to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn write_file(&self, path: &Path) -> Result<(), JsonOutputError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        log::info!("Wrote {} records to {}", self.count, path.display());
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
