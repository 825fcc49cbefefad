//! Parallel digest scheduling.
//!
//! Candidates are hashed on a dedicated rayon pool. Each worker sends exactly
//! one [`Outcome`] per candidate over a channel, and the calling thread drains
//! that channel in completion order, so the consumer is never re-entered.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::collector::Candidate;
use crate::config::ScanConfig;
use crate::digest::{DEFAULT_BLOCK_SIZE, calculate_file_hash_with_block_size};
use crate::error::DupError;

/// A successfully digested file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub digest: String,
    pub path: PathBuf,
    pub size: u64,
}

#[derive(Debug)]
pub enum FailureReason {
    /// The file is smaller than the configured threshold; it was never opened.
    BelowMinSize { size: u64, min_size: u64 },
    /// Metadata or content could not be read.
    Access(DupError),
    /// The scan was interrupted before this candidate was started.
    Cancelled,
}

#[derive(Debug)]
pub struct FailedCandidate {
    pub path: PathBuf,
    pub reason: FailureReason,
}

/// The single result produced for every scheduled candidate.
#[derive(Debug)]
pub enum Outcome {
    Record(FileRecord),
    Failure(FailedCandidate),
}

impl Outcome {
    pub fn record(&self) -> Option<&FileRecord> {
        match self {
            Self::Record(record) => Some(record),
            Self::Failure(_) => None,
        }
    }
}

/// Size check plus digest for one candidate.
pub fn process_candidate(candidate: &Candidate, block_size: usize) -> Outcome {
    let path = &candidate.path;
    let fail = |reason| {
        Outcome::Failure(FailedCandidate {
            path: path.clone(),
            reason,
        })
    };

    let size = match fs::metadata(path) {
        Ok(metadata) => metadata.len(),
        Err(source) => {
            let e = DupError::FileAccess {
                path: path.clone(),
                source,
            };
            warn!("Error processing file: {e}");
            return fail(FailureReason::Access(e));
        }
    };

    if size < candidate.min_size {
        debug!("Skipping '{}' (size: {} < {})", path.display(), size, candidate.min_size);
        return fail(FailureReason::BelowMinSize {
            size,
            min_size: candidate.min_size,
        });
    }

    match calculate_file_hash_with_block_size(path, block_size) {
        Ok(digest) => Outcome::Record(FileRecord {
            digest,
            path: path.clone(),
            size,
        }),
        Err(e) => {
            warn!("Error processing file: {e}");
            fail(FailureReason::Access(e))
        }
    }
}

pub struct HashScheduler {
    pool: rayon::ThreadPool,
    block_size: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl HashScheduler {
    /// Builds a pool with `num_threads` workers.
    pub fn new(num_threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads.max(1))
            .thread_name(|i| format!("hash-worker-{i}"))
            .build()
            .context("Failed to build hashing thread pool")?;

        Ok(Self {
            pool,
            block_size: DEFAULT_BLOCK_SIZE,
            shutdown_flag: None,
        })
    }

    pub fn from_config(config: &ScanConfig) -> Result<Self> {
        Ok(Self::new(config.worker_count())?.with_block_size(config.block_size))
    }

    #[must_use]
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Candidates not yet started when the flag is raised become
    /// [`FailureReason::Cancelled`]; in-flight digests finish normally.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Hashes every candidate and feeds each outcome to `consume` as soon as
    /// it completes. `consume` runs on the calling thread only.
    pub fn run_with<F>(&self, candidates: &[Candidate], mut consume: F)
    where
        F: FnMut(Outcome),
    {
        info!(
            "Processing {} files using {} threads...",
            candidates.len(),
            self.num_threads()
        );

        let block_size = self.block_size;
        let shutdown = self.shutdown_flag.as_deref();
        let (sender, receiver) = mpsc::channel();

        thread::scope(|scope| {
            scope.spawn(move || {
                self.pool.install(|| {
                    candidates.par_iter().for_each_with(sender, |sender, candidate| {
                        let outcome = if shutdown.is_some_and(|f| f.load(Ordering::SeqCst)) {
                            Outcome::Failure(FailedCandidate {
                                path: candidate.path.clone(),
                                reason: FailureReason::Cancelled,
                            })
                        } else {
                            process_candidate(candidate, block_size)
                        };
                        // The receiver lives until every sender is dropped.
                        let _ = sender.send(outcome);
                    });
                });
            });

            for outcome in receiver {
                consume(outcome);
            }
        });
    }

    /// Collects all outcomes, in completion order.
    pub fn run(&self, candidates: &[Candidate]) -> Vec<Outcome> {
        let mut outcomes = Vec::with_capacity(candidates.len());
        self.run_with(candidates, |outcome| outcomes.push(outcome));
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn candidate(path: PathBuf, min_size: u64) -> Candidate {
        Candidate { path, min_size }
    }

    #[test]
    fn small_files_short_circuit() {
        let dir = TempDir::new().unwrap();
        let small = dir.path().join("small.txt");
        fs::write(&small, "small").unwrap();

        match process_candidate(&candidate(small, 100), DEFAULT_BLOCK_SIZE) {
            Outcome::Failure(FailedCandidate {
                reason: FailureReason::BelowMinSize { size, min_size },
                ..
            }) => {
                assert_eq!(size, 5);
                assert_eq!(min_size, 100);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn threshold_is_inclusive() {
        let dir = TempDir::new().unwrap();
        let exact = dir.path().join("exact.txt");
        fs::write(&exact, "12345").unwrap();

        let outcome = process_candidate(&candidate(exact.clone(), 5), DEFAULT_BLOCK_SIZE);
        let record = outcome.record().expect("file at the threshold is hashed");
        assert_eq!(record.size, 5);
        assert_eq!(record.path, exact);
        assert_eq!(record.digest, blake3::hash(b"12345").to_hex().to_string());
    }

    #[test]
    fn missing_file_is_an_access_failure() {
        let dir = TempDir::new().unwrap();
        let outcome = process_candidate(&candidate(dir.path().join("gone"), 0), DEFAULT_BLOCK_SIZE);
        assert!(matches!(
            outcome,
            Outcome::Failure(FailedCandidate {
                reason: FailureReason::Access(DupError::FileAccess { .. }),
                ..
            })
        ));
    }

    #[test]
    fn every_candidate_yields_exactly_one_outcome() {
        let dir = TempDir::new().unwrap();
        let mut candidates = Vec::new();
        for i in 0..64 {
            let path = dir.path().join(format!("f{i}.txt"));
            fs::write(&path, format!("content {}", i % 8)).unwrap();
            candidates.push(candidate(path, 0));
        }
        candidates.push(candidate(dir.path().join("missing.txt"), 0));

        let scheduler = HashScheduler::new(4).unwrap();
        assert_eq!(scheduler.num_threads(), 4);
        let outcomes = scheduler.run(&candidates);

        assert_eq!(outcomes.len(), candidates.len());
        let records: HashSet<_> = outcomes.iter().filter_map(|o| o.record()).map(|r| r.path.clone()).collect();
        assert_eq!(records.len(), 64);
        assert_eq!(outcomes.iter().filter(|o| o.record().is_none()).count(), 1);
    }

    #[test]
    fn raised_shutdown_flag_cancels_unstarted_work() {
        let dir = TempDir::new().unwrap();
        let candidates: Vec<_> = (0..10)
            .map(|i| {
                let path = dir.path().join(format!("{i}.bin"));
                fs::write(&path, [i as u8; 16]).unwrap();
                candidate(path, 0)
            })
            .collect();

        let scheduler = HashScheduler::new(2)
            .unwrap()
            .with_shutdown_flag(Arc::new(AtomicBool::new(true)));
        let outcomes = scheduler.run(&candidates);

        assert_eq!(outcomes.len(), 10);
        assert!(outcomes.iter().all(|o| matches!(
            o,
            Outcome::Failure(FailedCandidate { reason: FailureReason::Cancelled, .. })
        )));
    }

    #[test]
    fn empty_input_produces_no_outcomes() {
        let scheduler = HashScheduler::new(1).unwrap();
        assert!(scheduler.run(&[]).is_empty());
    }
}
