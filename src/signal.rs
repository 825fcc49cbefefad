//! Ctrl+C handling.
//!
//! The handler only raises a shared flag. The collector and the scheduler poll
//! it: the walk stops, unstarted candidates are reported as cancelled, and
//! in-flight digests are allowed to finish.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use log::warn;

/// Exit code for an interrupted run (128 + SIGINT).
pub const EXIT_CODE_INTERRUPTED: u8 = 130;

#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Shared flag for the collector and scheduler.
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

/// Registers the process-wide Ctrl+C handler.
pub fn install_handler() -> Result<ShutdownHandler> {
    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();
    ctrlc::set_handler(move || {
        if !flag.swap(true, Ordering::SeqCst) {
            warn!("Interrupted, finishing files in progress...");
        }
    })
    .context("Failed to install Ctrl+C handler")?;
    Ok(handler)
}
