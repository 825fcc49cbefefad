//! Logger setup.
//!
//! Log lines go to stderr through `simplelog`, leaving stdout to the report.
//! Only records from this crate are shown.

use anyhow::{Context, Result};
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

pub fn level_for(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Installs the global logger. Call once, before any logging.
pub fn init_logging(verbose: bool) -> Result<()> {
    let mut builder = ConfigBuilder::new();
    builder
        .add_filter_allow_str(env!("CARGO_CRATE_NAME"))
        .set_time_format_rfc3339()
        .set_thread_level(LevelFilter::Trace)
        .set_target_level(LevelFilter::Off);
    let local_offset = builder.set_time_offset_to_local().is_ok();

    TermLogger::init(
        level_for(verbose),
        builder.build(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .context("Failed to initialize logger")?;

    if !local_offset {
        log::debug!("Local UTC offset unavailable, logging in UTC");
    }
    Ok(())
}
