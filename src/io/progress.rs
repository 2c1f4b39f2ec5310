//! Batch progress display with a rolling window of finished FOVs

use crate::io::configuration::{MAX_INDIVIDUAL_PROGRESS_BARS, PROGRESS_BAR_WIDTH};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{LazyLock, Mutex};

static BATCH_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template(&format!(
            "[{{elapsed_precise}}] FOVs: [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}} {{msg}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

static FOV_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_spinner()
        .template("  {prefix} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
});

/// Coordinates progress display for a batch of FOVs
///
/// One bar tracks the whole batch; below it a few lines list the most
/// recently finished FOVs. All updates take `&self` so worker threads can
/// report completions directly.
pub struct ProgressManager {
    multi_progress: MultiProgress,
    batch_bar: Option<ProgressBar>,
    fov_lines: Vec<ProgressBar>,
    recent: Mutex<VecDeque<String>>,
    failed: AtomicUsize,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ProgressManager {
    /// Create a progress manager; `hidden` suppresses all drawing
    pub fn new(hidden: bool) -> Self {
        let multi_progress = if hidden {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };
        Self {
            multi_progress,
            batch_bar: None,
            fov_lines: Vec::new(),
            recent: Mutex::new(VecDeque::new()),
            failed: AtomicUsize::new(0),
        }
    }

    /// Set up bars for a batch of `fov_count` FOVs
    pub fn initialize(&mut self, fov_count: usize) {
        let batch_bar = ProgressBar::new(fov_count as u64);
        batch_bar.set_style(BATCH_STYLE.clone());
        self.batch_bar = Some(self.multi_progress.add(batch_bar));

        for _ in 0..fov_count.min(MAX_INDIVIDUAL_PROGRESS_BARS) {
            let line = ProgressBar::new_spinner();
            line.set_style(FOV_STYLE.clone());
            self.fov_lines.push(self.multi_progress.add(line));
        }
    }

    /// Record one finished FOV
    pub fn complete_fov(&self, fov_id: &str, succeeded: bool) {
        let mark = if succeeded { "✓" } else { "✗" };
        if !succeeded {
            let failed = self.failed.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(bar) = &self.batch_bar {
                bar.set_message(format!("({failed} failed)"));
            }
        }
        if let Some(bar) = &self.batch_bar {
            bar.inc(1);
        }

        if let Ok(mut recent) = self.recent.lock() {
            recent.push_back(format!("{mark} {fov_id}"));
            while recent.len() > self.fov_lines.len() {
                recent.pop_front();
            }
            for (line, entry) in self.fov_lines.iter().zip(recent.iter()) {
                line.set_prefix(entry.clone());
            }
        }
    }

    /// Number of FOVs reported as failed so far
    pub fn failed_count(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    /// Clean up all progress displays
    pub fn finish(&self) {
        if let Some(bar) = &self.batch_bar {
            bar.finish_with_message("All FOVs processed");
        }
        for line in &self.fov_lines {
            line.finish_and_clear();
        }
        let _ = self.multi_progress.clear();
    }
}
