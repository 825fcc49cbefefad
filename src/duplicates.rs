use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::Result;
use colored::Colorize;
use indicatif::{HumanBytes, HumanCount};
use log::{debug, info};

use crate::collector::Collector;
use crate::config::ScanConfig;
use crate::progress::ScanProgress;
use crate::scanner::{FailureReason, HashScheduler, Outcome};
use crate::utils::natural_size;

/// Files sharing one content digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateSet {
    pub digest: String,
    /// Size of each member, captured while hashing.
    pub size: u64,
    pub files: Vec<PathBuf>,
}

impl DuplicateSet {
    /// Bytes that would be freed by keeping a single copy.
    pub fn wasted_bytes(&self) -> u64 {
        self.size * (self.files.len() as u64).saturating_sub(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Sets of two or more files, largest waste first.
    pub duplicate_sets: Vec<DuplicateSet>,
    /// Sum of sizes of every digested file.
    pub total_bytes_scanned: u64,
    pub duplicate_bytes: u64,
    pub files_processed: usize,
    /// Candidates that could not be read.
    pub files_failed: usize,
    /// Candidates below the size threshold or never started due to cancellation.
    pub files_skipped: usize,
    pub interrupted: bool,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.duplicate_sets.is_empty()
    }

    /// Number of redundant copies across all sets.
    pub fn duplicate_count(&self) -> usize {
        self.duplicate_sets.iter().map(|set| set.files.len() - 1).sum()
    }

    pub fn get(&self, digest: &str) -> Option<&DuplicateSet> {
        self.duplicate_sets.iter().find(|set| set.digest == digest)
    }
}

pub const PROGRESS_LOG_INTERVAL: usize = 100;

/// Single-threaded fold of scheduler outcomes into a [`ScanResult`].
#[derive(Debug, Default)]
pub struct Aggregator {
    hash_groups: HashMap<String, (u64, Vec<PathBuf>)>,
    total_bytes_scanned: u64,
    files_processed: usize,
    files_failed: usize,
    files_skipped: usize,
    interrupted: bool,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one outcome in. Returns the running record count each time it
    /// reaches another multiple of [`PROGRESS_LOG_INTERVAL`].
    pub fn push(&mut self, outcome: Outcome) -> Option<usize> {
        match outcome {
            Outcome::Record(record) => {
                self.hash_groups
                    .entry(record.digest)
                    .or_insert_with(|| (record.size, Vec::new()))
                    .1
                    .push(record.path);
                self.total_bytes_scanned += record.size;
                self.files_processed += 1;
                return (self.files_processed % PROGRESS_LOG_INTERVAL == 0).then_some(self.files_processed);
            }
            Outcome::Failure(failure) => match failure.reason {
                FailureReason::Access(_) => self.files_failed += 1,
                FailureReason::BelowMinSize { .. } => self.files_skipped += 1,
                FailureReason::Cancelled => {
                    self.files_skipped += 1;
                    self.interrupted = true;
                }
            },
        }
        None
    }

    pub fn files_processed(&self) -> usize {
        self.files_processed
    }

    /// Drops singleton groups and computes the duplicate byte total.
    pub fn finish(self) -> ScanResult {
        let total_groups = self.hash_groups.len();

        let mut duplicate_sets: Vec<DuplicateSet> = self
            .hash_groups
            .into_iter()
            .filter(|(_, (_, files))| files.len() > 1)
            .map(|(digest, (size, mut files))| {
                files.sort();
                DuplicateSet { digest, size, files }
            })
            .collect();

        duplicate_sets.sort_by(|a, b| {
            b.wasted_bytes()
                .cmp(&a.wasted_bytes())
                .then_with(|| a.digest.cmp(&b.digest))
        });

        let duplicate_bytes = duplicate_sets.iter().map(DuplicateSet::wasted_bytes).sum();

        info!(
            "Duplicate analysis complete: {} unique hashes, {} duplicate groups",
            total_groups,
            duplicate_sets.len()
        );

        ScanResult {
            duplicate_sets,
            total_bytes_scanned: self.total_bytes_scanned,
            duplicate_bytes,
            files_processed: self.files_processed,
            files_failed: self.files_failed,
            files_skipped: self.files_skipped,
            interrupted: self.interrupted,
        }
    }
}

pub fn aggregate<I>(outcomes: I) -> ScanResult
where
    I: IntoIterator<Item = Outcome>,
{
    let mut aggregator = Aggregator::new();
    for outcome in outcomes {
        aggregator.push(outcome);
    }
    aggregator.finish()
}

/// Runs the whole pipeline: collect, hash in parallel, aggregate.
pub struct DuplicateFinder<'a> {
    config: &'a ScanConfig,
    progress: ScanProgress,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl<'a> DuplicateFinder<'a> {
    pub fn new(config: &'a ScanConfig) -> Self {
        Self {
            config,
            progress: ScanProgress::hidden(),
            shutdown_flag: None,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: ScanProgress) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    pub fn find_duplicates(&self) -> Result<ScanResult> {
        let mut collector = Collector::new(self.config);
        let mut scheduler = HashScheduler::from_config(self.config)?;
        if let Some(flag) = &self.shutdown_flag {
            collector = collector.with_shutdown_flag(Arc::clone(flag));
            scheduler = scheduler.with_shutdown_flag(Arc::clone(flag));
        }

        let spinner = self.progress.collecting();
        let candidates = collector.collect();
        spinner.finish_and_clear();

        let mut progress = self.progress.hashing(candidates.len());
        let mut aggregator = Aggregator::new();
        scheduler.run_with(&candidates, |outcome| {
            progress.advance(outcome.record().map_or(0, |r| r.size));
            if let Some(processed) = aggregator.push(outcome) {
                debug!("Processed {processed} files...");
            }
        });
        progress.finish();

        let result = aggregator.finish();
        info!(
            "Scanned {} files ({}), {} failed, {} skipped",
            HumanCount(result.files_processed as u64),
            HumanBytes(result.total_bytes_scanned),
            result.files_failed,
            result.files_skipped
        );
        Ok(result)
    }
}

/// Convenience wrapper around [`DuplicateFinder::find_duplicates`].
pub fn find_duplicates(config: &ScanConfig) -> Result<ScanResult> {
    DuplicateFinder::new(config).find_duplicates()
}

pub fn print_results(result: &ScanResult) {
    if result.is_empty() {
        println!("\n{}", "No duplicate files found.".green());
        return;
    }

    println!("\n{}", "Duplicate Files:".bold().blue());
    for set in &result.duplicate_sets {
        println!(
            "\n{} (size: {})",
            "Duplicate set".yellow(),
            natural_size(set.size)
        );
        for file in &set.files {
            println!("  {} {}", "•".green(), file.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{FailedCandidate, FileRecord};
    use crate::error::DupError;
    use proptest::prelude::*;

    fn record(digest: &str, path: &str, size: u64) -> Outcome {
        Outcome::Record(FileRecord {
            digest: digest.to_string(),
            path: PathBuf::from(path),
            size,
        })
    }

    fn failure(path: &str, reason: FailureReason) -> Outcome {
        Outcome::Failure(FailedCandidate {
            path: PathBuf::from(path),
            reason,
        })
    }

    #[test]
    fn groups_by_digest_and_drops_singletons() {
        let result = aggregate(vec![
            record("aa", "/a/1", 7),
            record("bb", "/a/unique", 6),
            record("aa", "/a/2", 7),
            record("cc", "/b/1", 100),
            record("cc", "/b/2", 100),
            record("cc", "/b/3", 100),
        ]);

        assert_eq!(result.files_processed, 6);
        assert_eq!(result.total_bytes_scanned, 7 + 6 + 7 + 300);
        assert_eq!(result.duplicate_sets.len(), 2);
        assert_eq!(result.duplicate_bytes, 7 + 200);
        assert_eq!(result.duplicate_count(), 3);
        assert!(result.get("bb").is_none());
        assert_eq!(
            result.get("aa").unwrap().files,
            vec![PathBuf::from("/a/1"), PathBuf::from("/a/2")]
        );
        // Largest waste first.
        assert_eq!(result.duplicate_sets[0].digest, "cc");
    }

    #[test]
    fn failures_are_counted_but_never_totalled() {
        let result = aggregate(vec![
            record("aa", "/x", 10),
            failure("/small", FailureReason::BelowMinSize { size: 1, min_size: 5 }),
            failure(
                "/locked",
                FailureReason::Access(DupError::FileAccess {
                    path: PathBuf::from("/locked"),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                }),
            ),
        ]);

        assert_eq!(result.files_processed, 1);
        assert_eq!(result.total_bytes_scanned, 10);
        assert_eq!(result.files_skipped, 1);
        assert_eq!(result.files_failed, 1);
        assert!(result.is_empty());
        assert!(!result.interrupted);
    }

    #[test]
    fn cancellation_marks_the_result() {
        let result = aggregate(vec![failure("/late", FailureReason::Cancelled)]);
        assert!(result.interrupted);
        assert_eq!(result.files_skipped, 1);
    }

    #[test]
    fn empty_input() {
        let result = aggregate(Vec::new());
        assert_eq!(result, ScanResult::default());
    }

    #[test]
    fn progress_milestones_count_records_only() {
        let mut aggregator = Aggregator::new();
        for i in 1..PROGRESS_LOG_INTERVAL {
            assert_eq!(aggregator.push(record("aa", &format!("/r/{i}"), 1)), None);
        }
        assert_eq!(
            aggregator.push(record("aa", "/r/last", 1)),
            Some(PROGRESS_LOG_INTERVAL)
        );

        for i in 0..5 {
            let skipped = failure(&format!("/s/{i}"), FailureReason::BelowMinSize { size: 0, min_size: 1 });
            assert_eq!(aggregator.push(skipped), None);
        }
        assert_eq!(aggregator.push(failure("/late", FailureReason::Cancelled)), None);
        assert_eq!(aggregator.files_processed(), PROGRESS_LOG_INTERVAL);
    }

    /// Digest ids paired with their original index, plus a permutation of the same pairs.
    fn digests_and_permutation() -> impl Strategy<Value = (Vec<(usize, u8)>, Vec<(usize, u8)>)> {
        prop::collection::vec(0u8..6, 0..40).prop_flat_map(|digests| {
            let indexed: Vec<(usize, u8)> = digests.into_iter().enumerate().collect();
            (Just(indexed.clone()), Just(indexed).prop_shuffle())
        })
    }

    // Same digest implies same size, so size is derived from the digest.
    fn build(indexed: &[(usize, u8)]) -> Vec<Outcome> {
        indexed
            .iter()
            .map(|(i, digest)| record(&format!("d{digest}"), &format!("/f/{i}"), u64::from(*digest) * 10))
            .collect()
    }

    proptest! {
        #[test]
        fn aggregation_ignores_input_order((forward, shuffled) in digests_and_permutation()) {
            prop_assert_eq!(aggregate(build(&forward)), aggregate(build(&shuffled)));
        }
    }
}
