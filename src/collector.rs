//! Directory traversal that produces hashing candidates.
//!
//! Excluded and dot-prefixed directories are pruned while walking, so their
//! children are never listed. Unreadable directories are logged and skipped.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::ScanConfig;
use crate::error::DupError;

/// A regular file eligible for digesting, pending the size check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub min_size: u64,
}

pub struct Collector {
    root: PathBuf,
    exclude_dirs: Vec<PathBuf>,
    exclude_extensions: Vec<String>,
    min_size: u64,
    prune_dot_dirs: bool,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Collector {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            root: absolute(&config.root),
            exclude_dirs: config.exclude_dirs.iter().map(|d| absolute(d)).collect(),
            exclude_extensions: config
                .exclude_extensions
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
            min_size: config.min_size,
            prune_dot_dirs: config.prune_dot_dirs,
            shutdown_flag: None,
        }
    }

    /// Stop walking as soon as the flag is raised.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn is_excluded_dir(&self, path: &Path) -> bool {
        self.exclude_dirs.iter().any(|dir| path.starts_with(dir))
    }

    fn has_excluded_extension(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy().to_lowercase();
        self.exclude_extensions.iter().any(|ext| name.ends_with(ext.as_str()))
    }

    /// Decides whether the walker may enter (or yield) an entry.
    fn keep_entry(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return true;
        }
        if self.is_excluded_dir(entry.path()) {
            debug!("Skipping excluded directory: '{}'", entry.path().display());
            return false;
        }
        // The root itself is never pruned for its name.
        if self.prune_dot_dirs && entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.') {
            debug!("Skipping dot directory: '{}'", entry.path().display());
            return false;
        }
        true
    }

    /// Walks the tree and returns every regular file that survives the filters.
    pub fn collect(&self) -> Vec<Candidate> {
        info!("Scanning {}", self.root.display());

        let mut candidates = Vec::new();
        let mut excluded_files = 0usize;
        let mut unreadable = 0usize;

        for entry in WalkDir::new(&self.root).into_iter().filter_entry(|e| self.keep_entry(e)) {
            if self.is_shutdown_requested() {
                warn!("Directory scan interrupted");
                break;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    unreadable += 1;
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone());
                    let source = e.into_io_error().unwrap_or_else(|| {
                        std::io::Error::other("filesystem loop detected")
                    });
                    warn!("{}", DupError::DirectoryAccess { path, source });
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            if self.has_excluded_extension(&entry) {
                debug!("Skipping excluded file type: '{}'", entry.path().display());
                excluded_files += 1;
                continue;
            }

            candidates.push(Candidate {
                path: entry.into_path(),
                min_size: self.min_size,
            });
        }

        info!(
            "Found {} candidate files ({} excluded by extension, {} unreadable entries)",
            candidates.len(),
            excluded_files,
            unreadable
        );
        candidates
    }
}

/// Convenience wrapper around [`Collector::collect`].
pub fn collect_candidates(config: &ScanConfig) -> Vec<Candidate> {
    Collector::new(config).collect()
}

/// Absolute form of `path` with `.` and `..` resolved lexically.
fn absolute(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}
