//! Progress reporting using indicatif.
//!
//! The pipeline reports through the [`ProgressCallback`] trait; [`Progress`]
//! renders those events as terminal progress bars. Phases are named by the
//! `PHASE_*` constants.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Directory traversal.
pub const PHASE_WALKING: &str = "walking";
/// Partial signature computation.
pub const PHASE_PARTIAL: &str = "partial";
/// Full signature computation.
pub const PHASE_FULL: &str = "full";
/// Moving or trashing duplicates.
pub const PHASE_RELOCATE: &str = "relocate";

/// Progress callback for pipeline phases.
///
/// Implement this trait to receive progress updates during scanning and
/// relocation. Implementations are shared with rayon workers.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase (one of the `PHASE_*` constants)
    /// * `total` - Total number of items to process, 0 if unknown
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Current item number (1-based), 0 if not counted
    /// * `path` - Path being processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);

    /// Called to update the progress message.
    fn on_message(&self, _message: &str) {}
}

/// Progress reporter using indicatif.
///
/// One bar per phase; the most recently started phase receives progress
/// updates.
pub struct Progress {
    multi: MultiProgress,
    bars: Mutex<Vec<(String, ProgressBar)>>,
    quiet: bool,
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("quiet", &self.quiet)
            .finish_non_exhaustive()
    }
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use memescanner::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(Vec::new()),
            quiet,
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn bar_style(color: &str) -> ProgressStyle {
        let template = format!(
            "[{{elapsed_precise}}] [{{bar:40.{color}/blue}}] {{pos}}/{{len}} ({{percent}}%) {{msg}} (ETA: {{eta}})"
        );
        ProgressStyle::with_template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-")
    }

    fn label(phase: &str) -> &'static str {
        match phase {
            PHASE_WALKING => "Walking directory",
            PHASE_PARTIAL => "Partial signatures",
            PHASE_FULL => "Full signatures",
            PHASE_RELOCATE => "Relocating duplicates",
            _ => "Working",
        }
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        let pb = if phase == PHASE_WALKING {
            let pb = self.multi.add(ProgressBar::new_spinner());
            pb.set_style(Self::spinner_style());
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            let color = if phase == PHASE_FULL { "green" } else { "cyan" };
            let pb = self.multi.add(ProgressBar::new(total as u64));
            pb.set_style(Self::bar_style(color));
            pb
        };
        pb.set_message(Self::label(phase));

        if let Ok(mut bars) = self.bars.lock() {
            bars.push((phase.to_string(), pb));
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }

        if let Some((_, pb)) = self.bars.lock().ok().as_ref().and_then(|b| b.last()) {
            if current == 0 {
                pb.inc(1);
            } else {
                pb.set_position(current as u64);
            }
            pb.set_message(truncate_path(path, 30));
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        if let Ok(mut bars) = self.bars.lock() {
            if let Some(idx) = bars.iter().rposition(|(name, _)| name == phase) {
                let (_, pb) = bars.remove(idx);
                pb.finish_with_message(format!("{} complete", Self::label(phase)));
            }
        }
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }

        if let Some((_, pb)) = self.bars.lock().ok().as_ref().and_then(|b| b.last()) {
            pb.set_message(message.to_string());
        }
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.len() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if file_name.len() >= max_len {
        let start = file_name
            .char_indices()
            .map(|(i, _)| i)
            .find(|&i| file_name.len() - i <= max_len - 3)
            .unwrap_or(0);
        return format!("...{}", &file_name[start..]);
    }

    format!(".../{file_name}")
}
