//! Command-line interface definitions for memescanner.
//!
//! # Example
//!
//! ```bash
//! # Report duplicates under ~/Pictures
//! memescanner scan ~/Pictures
//!
//! # Move redundant copies away, keeping the oldest file of each group
//! memescanner scan ~/Pictures --move-duplicates ~/dups --keep oldest
//!
//! # Preview what would be trashed
//! memescanner scan ~/Pictures --trash-duplicates --dry-run
//!
//! # Put everything from the last run back
//! memescanner undo latest
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::duplicates::KeepPolicy;

/// Find byte-identical media duplicates and relocate them reversibly.
#[derive(Debug, Parser)]
#[command(name = "memescanner")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory for duplicate media files
    Scan(ScanArgs),
    /// Revert the moves recorded in a manifest
    Undo(UndoArgs),
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to scan
    #[arg(value_name = "DIR")]
    pub path: PathBuf,

    /// Comma-separated media extensions (e.g. jpg,png,mp4)
    #[arg(long, value_name = "LIST")]
    pub exts: Option<String>,

    /// Minimum file size to consider (e.g. 0, 32KiB, 1MB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Stop after this many media files
    #[arg(long, value_name = "N")]
    pub max_files: Option<usize>,

    /// Include hidden files and directories
    #[arg(long)]
    pub include_hidden: bool,

    /// Only trust cached signatures that include a full hash
    #[arg(long)]
    pub hash: bool,

    /// Which file of each group to keep: first, newest, oldest, largest, smallest
    #[arg(long, value_name = "POLICY", value_parser = parse_keep)]
    pub keep: Option<KeepPolicy>,

    /// Move redundant copies into DIR
    #[arg(long, value_name = "DIR", conflicts_with = "trash_duplicates")]
    pub move_duplicates: Option<PathBuf>,

    /// Send redundant copies to the system trash
    #[arg(long)]
    pub trash_duplicates: bool,

    /// Plan and report without touching any file
    #[arg(long)]
    pub dry_run: bool,

    /// Mirror the scan-relative directory layout under the move destination
    #[arg(long, requires = "move_duplicates")]
    pub preserve_dirs: bool,

    /// Write every scanned file with its signatures to a JSON file
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Signature cache database location
    #[arg(long, value_name = "PATH", conflicts_with = "no_cache")]
    pub cache: Option<PathBuf>,

    /// Do not read or write the persistent signature cache
    #[arg(long)]
    pub no_cache: bool,

    /// Number of concurrent readers for hashing
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..=256))]
    pub io_threads: Option<u16>,

    /// Directory where manifests are written
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

impl ScanArgs {
    /// Whether any relocation was requested.
    #[must_use]
    pub fn wants_relocation(&self) -> bool {
        self.move_duplicates.is_some() || self.trash_duplicates
    }
}

/// Arguments for the undo subcommand.
#[derive(Debug, Args)]
pub struct UndoArgs {
    /// Manifest path, or `latest` for the newest manifest in the log directory
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Directory searched for `latest`
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

/// Keeper policy parser; unknown names fall back to `newest`.
///
/// # Errors
///
/// Never fails; the signature matches clap's value parser contract.
pub fn parse_keep(s: &str) -> Result<KeepPolicy, String> {
    Ok(KeepPolicy::parse_lenient(s))
}

/// Parse a human-readable size string into bytes.
///
/// Units are binary and case-insensitive, with or without a space between
/// number and unit:
/// - B (bytes)
/// - KB, K, KiB (1024 bytes)
/// - MB, M, MiB (1024^2 bytes)
/// - GB, G, GiB (1024^3 bytes)
/// - TB, T, TiB (1024^4 bytes)
///
/// # Examples
///
/// ```
/// use memescanner::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("64KB").unwrap(), 64 * 1024);
/// assert_eq!(parse_size("1 KB").unwrap(), 1024);
/// assert_eq!(parse_size("1.5MiB").unwrap(), 1_572_864);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// or has an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" | "KIB" => 1 << 10,
        "MB" | "M" | "MIB" => 1 << 20,
        "GB" | "G" | "GIB" => 1 << 30,
        "TB" | "T" | "TIB" => 1 << 40,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
