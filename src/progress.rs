//! Spinner and progress bar shown while a scan runs.
//!
//! Everything here draws to stderr and is hidden entirely when disabled, so
//! library callers and tests get silent scans.

use std::time::Duration;

use indicatif::{HumanBytes, HumanCount, ProgressBar, ProgressStyle};

const TICK_STRINGS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

#[derive(Debug, Clone, Copy, Default)]
pub struct ScanProgress {
    enabled: bool,
}

impl ScanProgress {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn hidden() -> Self {
        Self { enabled: false }
    }

    /// Spinner for the directory walk.
    pub fn collecting(&self) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICK_STRINGS),
        );
        pb.set_message("Scanning files and directories...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Bar advanced once per hashed candidate.
    pub fn hashing(&self, total: usize) -> HashProgress {
        let bar = if self.enabled {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg} ETA: {eta}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };
        HashProgress { bar, bytes: 0 }
    }
}

pub struct HashProgress {
    bar: ProgressBar,
    bytes: u64,
}

impl HashProgress {
    pub fn advance(&mut self, hashed_bytes: u64) {
        self.bytes += hashed_bytes;
        self.bar.inc(1);
        self.bar.set_message(format!(
            "Scanned {} files ({})",
            HumanCount(self.bar.position()),
            HumanBytes(self.bytes)
        ));
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_progress_still_counts() {
        let progress = ScanProgress::hidden();
        let mut hashing = progress.hashing(3);
        hashing.advance(10);
        hashing.advance(5);
        assert_eq!(hashing.bar.position(), 2);
        assert_eq!(hashing.bytes, 15);
        hashing.finish();

        let spinner = progress.collecting();
        assert!(spinner.is_hidden());
    }
}
