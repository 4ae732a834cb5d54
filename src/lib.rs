//! memescanner - Media Duplicate Finder
//!
//! Finds byte-identical image and video files under a directory using a
//! cheap partial signature followed by a full BLAKE3 signature, then
//! optionally moves or trashes every copy but one. Executed runs are
//! recorded in JSON manifests so moves can be undone.

pub mod actions;
pub mod cache;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod output;
pub mod progress;
pub mod scanner;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use bytesize::ByteSize;

use crate::actions::{
    relocate_duplicates, RelocationMode, RelocationOptions, RelocationReport, SystemTrash,
};
use crate::cache::{HashCache, MemoryCache, SignatureCache};
use crate::cli::{Cli, Commands, ScanArgs, UndoArgs};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, FinderConfig, ScanOutcome};
use crate::error::ExitCode;
use crate::manifest::{undo, ManifestLog, OpMode};
use crate::output::JsonOutput;
use crate::progress::{Progress, ProgressCallback};
use crate::scanner::{normalize_extensions, WalkerConfig, DEFAULT_EXTENSIONS};

/// Run the command selected on the command line.
///
/// # Errors
///
/// Returns an error if the scan root is unusable, the undo target cannot be
/// resolved, or an unexpected I/O failure aborts the command. Per-file
/// failures are logged and counted instead.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    let config = Config::load();

    match cli.command {
        Commands::Scan(args) => handle_scan(&args, config, cli.quiet),
        Commands::Undo(args) => handle_undo(&args, &config),
    }
}

/// Apply scan flags on top of the layered configuration.
pub fn apply_scan_overrides(config: &mut Config, args: &ScanArgs) {
    if let Some(exts) = &args.exts {
        config.extensions = vec![exts.clone()];
    }
    if let Some(min_size) = args.min_size {
        config.min_size = min_size;
    }
    if let Some(keep) = args.keep {
        config.keep = keep;
    }
    if let Some(threads) = args.io_threads {
        config.io_threads = usize::from(threads);
    }
    if let Some(log_dir) = &args.log_dir {
        config.log_dir.clone_from(log_dir);
    }
    if let Some(cache) = &args.cache {
        config.cache_path = Some(cache.clone());
    }
    config.include_hidden |= args.include_hidden;
}

/// Traversal settings derived from the merged configuration.
#[must_use]
pub fn walker_config(config: &Config, max_files: Option<usize>) -> WalkerConfig {
    let mut extensions = normalize_extensions(&config.extensions);
    if extensions.is_empty() {
        log::warn!("No usable extensions configured, using the default media list");
        extensions = DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect();
    }
    WalkerConfig {
        include_hidden: config.include_hidden,
        min_size: config.min_size,
        max_files,
        extensions,
        ..Default::default()
    }
}

/// Open the signature cache, falling back to an in-memory one.
fn open_cache(config: &Config, disabled: bool) -> Arc<dyn SignatureCache> {
    if disabled {
        log::debug!("Persistent cache disabled");
        return Arc::new(MemoryCache::new());
    }

    let Some(path) = config.cache_path.clone().or_else(HashCache::default_path) else {
        log::warn!("No cache directory available, signatures will not be persisted");
        return Arc::new(MemoryCache::new());
    };

    match HashCache::new(&path) {
        Ok(cache) => {
            log::debug!("Using signature cache at {}", path.display());
            Arc::new(cache)
        }
        Err(e) => {
            log::warn!("Cannot open cache {}: {}; continuing without it", path.display(), e);
            Arc::new(MemoryCache::new())
        }
    }
}

fn handle_scan(args: &ScanArgs, mut config: Config, quiet: bool) -> anyhow::Result<ExitCode> {
    apply_scan_overrides(&mut config, args);
    log::debug!("Effective configuration: {:?}", config);

    let progress = Arc::new(Progress::new(quiet));
    let finder_config = FinderConfig::default()
        .with_io_threads(config.io_threads)
        .with_walker_config(walker_config(&config, args.max_files))
        .with_cache(open_cache(&config, args.no_cache))
        .with_require_full_in_cache(args.hash)
        .with_progress_callback(progress.clone());

    let outcome = DuplicateFinder::new(finder_config)
        .find_duplicates(&args.path)
        .with_context(|| format!("Scan of {} failed", args.path.display()))?;

    print_scan_summary(&outcome);

    if let Some(out) = &args.out {
        JsonOutput::new(&outcome)
            .write_file(out)
            .with_context(|| format!("Failed to write results to {}", out.display()))?;
        println!("Results written to {}", out.display());
    }

    if !args.wants_relocation() {
        return Ok(ExitCode::Success);
    }

    let mode = match &args.move_duplicates {
        Some(dest) => RelocationMode::MoveTo {
            dest_root: std::path::absolute(dest)
                .with_context(|| format!("Invalid destination {}", dest.display()))?,
            preserve_dirs: args.preserve_dirs,
        },
        None => RelocationMode::Trash,
    };
    let options = RelocationOptions {
        mode,
        policy: config.keep,
        dry_run: args.dry_run,
    };
    if options.dry_run {
        println!("Dry-run: no files will be moved or trashed");
    }

    let log = ManifestLog::new(config.log_dir.clone());
    let report = relocate_duplicates(
        &outcome.groups,
        &options,
        &SystemTrash,
        &log,
        Some(progress.as_ref() as &dyn ProgressCallback),
    )
    .context("Relocation failed")?;

    print_relocation_report(&report);
    Ok(ExitCode::Success)
}

fn print_scan_summary(outcome: &ScanOutcome) {
    let summary = &outcome.summary;
    println!(
        "Scanned {} file(s), {} under {}",
        summary.total_files,
        summary.total_size_display(),
        outcome.root.display()
    );
    println!(
        "Found {} duplicate group(s), {} redundant file(s), {} reclaimable",
        summary.duplicate_groups,
        summary.duplicate_files,
        summary.reclaimable_display()
    );
    if summary.scan_errors > 0 || summary.partial.failed + summary.full.failed > 0 {
        println!(
            "Skipped {} unreadable entr(ies) and {} unhashable file(s)",
            summary.scan_errors,
            summary.partial.failed + summary.full.failed
        );
    }
    for group in outcome.groups.iter().take(5) {
        log::info!(
            "{} x {} ({})",
            group.len(),
            ByteSize::b(group.size),
            group.files[0].rel_path.display()
        );
    }
}

fn print_relocation_report(report: &RelocationReport) {
    println!("{}", report.summary());
    for op in &report.sample {
        match (op.mode, &op.to) {
            (OpMode::Move, Some(to)) => println!("  {} -> {}", op.from.display(), to.display()),
            _ => println!("  {} -> trash", op.from.display()),
        }
    }
    if report.planned > report.sample.len() {
        println!("  ... and {} more", report.planned - report.sample.len());
    }
    for failure in &report.failures {
        eprintln!("  failed: {} ({})", failure.op.from.display(), failure.error);
    }
    if let Some(manifest) = &report.manifest {
        println!("Manifest: {}", manifest.display());
    }
}

fn handle_undo(args: &UndoArgs, config: &Config) -> anyhow::Result<ExitCode> {
    let dir: PathBuf = args.log_dir.clone().unwrap_or_else(|| config.log_dir.clone());
    let log = ManifestLog::new(dir);

    let manifest = log.resolve(&args.target)?;
    println!("Undoing {}", manifest.display());

    let report = undo(&manifest)?;
    println!("{}", report.summary());
    Ok(ExitCode::Success)
}
