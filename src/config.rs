//! Scan configuration.
//!
//! [`ScanConfig`] is built once, from the command line and an optional TOML
//! file, and then handed by reference to the collector and the scheduler.
//! Values given on the command line win over the file; list options from both
//! sources are merged.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::cli::Cli;
use crate::digest::DEFAULT_BLOCK_SIZE;
use crate::error::{DupError, Result};
use crate::size::parse_size;

pub const DEFAULT_MIN_SIZE: &str = "0B";

#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Directory tree to scan.
    pub root: PathBuf,
    /// Subtrees that are never entered.
    pub exclude_dirs: Vec<PathBuf>,
    /// Lower-cased file name suffixes to drop, e.g. `.log`.
    pub exclude_extensions: Vec<String>,
    /// Files smaller than this many bytes are not digested.
    pub min_size: u64,
    /// The minimum size as the user wrote it, for display.
    pub min_size_label: String,
    /// Skip directories whose name starts with `.`.
    pub prune_dot_dirs: bool,
    /// Worker pool width; `None` uses all available cores.
    pub threads: Option<usize>,
    pub block_size: usize,
}

impl ScanConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            exclude_dirs: Vec::new(),
            exclude_extensions: Vec::new(),
            min_size: 0,
            min_size_label: DEFAULT_MIN_SIZE.to_string(),
            prune_dot_dirs: true,
            threads: None,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    #[must_use]
    pub fn with_exclude_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.exclude_dirs.push(dir.into());
        self
    }

    #[must_use]
    pub fn with_exclude_extension(mut self, ext: &str) -> Self {
        self.exclude_extensions.push(ext.to_lowercase());
        self
    }

    #[must_use]
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self.min_size_label = min_size.to_string();
        self
    }

    #[must_use]
    pub fn with_dot_dirs(mut self, include: bool) -> Self {
        self.prune_dot_dirs = !include;
        self
    }

    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Number of hashing workers to run.
    pub fn worker_count(&self) -> usize {
        self.threads
            .filter(|&n| n > 0)
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
    }

    /// Fails with [`DupError::InvalidDirectory`] unless the root is a directory.
    pub fn validate(&self) -> Result<()> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(DupError::InvalidDirectory(self.root.clone()))
        }
    }

    /// Resolves the command line (and the config file it names) into a
    /// validated configuration.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let mut config = Self::new(&cli.directory);
        config.validate()?;

        let label = cli
            .min_size
            .clone()
            .or(file.min_size)
            .unwrap_or_else(|| DEFAULT_MIN_SIZE.to_string());
        config.min_size = parse_size(&label)?;
        config.min_size_label = label;

        config.exclude_dirs = file
            .exclude_dirs
            .into_iter()
            .chain(cli.exclude_dir.iter().cloned())
            .collect();
        config.exclude_extensions = file
            .exclude_exts
            .iter()
            .chain(cli.exclude_ext.iter())
            .map(|ext| ext.to_lowercase())
            .collect();
        config.prune_dot_dirs = !(cli.include_dot_dirs || file.include_dot_dirs.unwrap_or(false));
        config.threads = cli.threads.or(file.threads);

        debug!("Resolved scan configuration: {config:?}");
        Ok(config)
    }
}

/// Defaults read from a `--config` TOML file.
///
/// ```toml
/// exclude_dirs = ["target", "node_modules"]
/// exclude_exts = [".log", ".tmp"]
/// min_size = "10KB"
/// include_dot_dirs = false
/// threads = 4
/// ```
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub exclude_dirs: Vec<PathBuf>,
    pub exclude_exts: Vec<String>,
    pub min_size: Option<String>,
    pub include_dot_dirs: Option<bool>,
    pub threads: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config_error = |message: String| DupError::Config {
            path: path.to_path_buf(),
            message,
        };
        let content = fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
        let config = toml::from_str(&content).map_err(|e| config_error(e.to_string()))?;
        debug!("Loaded config file '{}'", path.display());
        Ok(config)
    }
}
