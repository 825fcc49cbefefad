use std::io::IsTerminal;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use log::{debug, info};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use find_file_dups::duplicates::{DuplicateFinder, ScanResult, print_results};
use find_file_dups::progress::ScanProgress;
use find_file_dups::signal::{EXIT_CODE_INTERRUPTED, install_handler};
use find_file_dups::{Cli, DupError, ScanConfig, export_to_file, format_human_elapsed, format_number, natural_size};

fn print_row(label: &str, value: impl std::fmt::Display) {
    println!("  {:<26} {}", label.cyan(), value.to_string().green());
}

fn print_configuration(cli: &Cli, config: &ScanConfig) {
    println!("{}", "Scan Configuration".bold().blue());
    print_row("Directory:", cli.directory.display());
    if !config.exclude_dirs.is_empty() {
        let dirs: Vec<_> = config
            .exclude_dirs
            .iter()
            .map(|d| d.display().to_string())
            .collect();
        print_row("Excluding directories:", dirs.join(", "));
    }
    if !config.exclude_extensions.is_empty() {
        print_row("Excluding extensions:", config.exclude_extensions.join(", "));
    }
    if config.min_size > 0 {
        print_row("Minimum file size:", &config.min_size_label);
    }
    if !config.prune_dot_dirs {
        print_row("Dot directories:", "included");
    }
    print_row("Threads:", config.worker_count());
}

fn finished_at() -> String {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string())
}

fn print_summary(result: &ScanResult, start_time: Instant) {
    println!("\n{}", "Scan Results".bold().blue());
    print_row("Scan Duration", format_human_elapsed(start_time.elapsed()));
    print_row("Files Processed", format_number(result.files_processed));
    if result.files_failed > 0 {
        print_row("Files Unreadable", format_number(result.files_failed));
    }
    print_row("Duplicate Sets", format_number(result.duplicate_sets.len()));
    print_row("Total Duplicates", format_number(result.duplicate_count()));
    print_row("Total Space Used", natural_size(result.total_bytes_scanned));
    print_row("Space Used by Duplicates", natural_size(result.duplicate_bytes));
    print_row("Potential Space Savings", natural_size(result.duplicate_bytes));
    print_row("Finished At", finished_at());
}

fn run(cli: Cli) -> Result<ExitCode> {
    let start_time = Instant::now();
    let config = ScanConfig::from_cli(&cli)?;

    print_configuration(&cli, &config);

    if cli.dry_run {
        println!(
            "\n{} - showing what would be scanned without processing files",
            "DRY RUN".yellow()
        );
        return Ok(ExitCode::SUCCESS);
    }

    println!("\n{}", "Starting scan...".blue());

    let shutdown = install_handler()?;
    let result = DuplicateFinder::new(&config)
        .with_progress(ScanProgress::new(std::io::stderr().is_terminal()))
        .with_shutdown_flag(shutdown.get_flag())
        .find_duplicates()?;

    if !result.is_empty() {
        print_summary(&result, start_time);
    }
    print_results(&result);

    if let Some(output) = cli.output.as_ref().filter(|_| !result.is_empty()) {
        export_to_file(&result, output, cli.format)?;
        println!(
            "\n{} {} {}",
            "Results exported to".blue(),
            output.display().to_string().green(),
            format!("in {} format", cli.format).blue()
        );
    }

    info!("Program completed in {}", format_human_elapsed(start_time.elapsed()));

    if result.interrupted || shutdown.is_shutdown_requested() {
        println!("\n{}", "Scan interrupted; results are partial.".yellow());
        return Ok(ExitCode::from(EXIT_CODE_INTERRUPTED));
    }
    Ok(ExitCode::SUCCESS)
}

fn report_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".bold().red(), err);
    for cause in err.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
    if let Some(DupError::InvalidSizeFormat(_)) = err.downcast_ref::<DupError>() {
        eprintln!("{}", "Please use formats like: 10KB, 5MB, 1GB".yellow());
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    if let Err(e) = find_file_dups::logging::init_logging(cli.verbose) {
        eprintln!("{e:#}");
    }
    info!("Starting find-file-dups v{}", env!("CARGO_PKG_VERSION"));
    debug!("Command line arguments: {:?}", cli);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}
