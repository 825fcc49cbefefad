//! Error taxonomy for a duplicate scan.
//!
//! Only [`DupError::InvalidDirectory`], [`DupError::InvalidSizeFormat`] and
//! [`DupError::Config`] are fatal. Access errors are raised per file or per
//! directory and never abort a scan in progress. An export failure happens
//! after the report is printed and ends the run with an error status.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::export::ExportError;

#[derive(Debug, Error)]
pub enum DupError {
    /// The scan root does not exist or is not a directory.
    #[error("'{}' is not a valid directory", .0.display())]
    InvalidDirectory(PathBuf),

    /// A human-readable size string could not be parsed.
    #[error("Invalid size format: {0}")]
    InvalidSizeFormat(String),

    /// A single file could not be inspected or read.
    #[error("Failed to read '{}': {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A directory could not be listed; its subtree is skipped.
    #[error("Failed to read directory '{}': {source}", path.display())]
    DirectoryAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The TOML configuration file is unreadable or malformed.
    #[error("Invalid config file '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// The export file could not be created or written.
    #[error("Failed to export results to '{}': {source}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: ExportError,
    },
}

impl DupError {
    /// Whether this error must stop the program before a scan starts.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidDirectory(_) | Self::InvalidSizeFormat(_) | Self::Config { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DupError>;
