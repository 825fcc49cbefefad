use clap::{Parser, ValueEnum};
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_OUTPUT_FILE: &str = "duplicates.txt";

#[derive(Parser, Debug)]
#[command(name = "find-file-dups", version)]
#[command(about = "Find duplicate files in a directory")]
pub struct Cli {
    /// Directory to scan for duplicates
    pub directory: PathBuf,

    /// Directories to exclude (can be used multiple times)
    #[arg(short = 'e', long = "exclude-dir", value_name = "DIR")]
    pub exclude_dir: Vec<PathBuf>,

    /// File extensions to exclude, e.g. .log (can be used multiple times)
    #[arg(short = 'x', long = "exclude-ext", value_name = "EXT")]
    pub exclude_ext: Vec<String>,

    /// Minimum file size to consider (e.g. 10KB, 5MB) [default: 0B]
    #[arg(short, long, value_name = "SIZE")]
    pub min_size: Option<String>,

    /// Export results to a file (defaults to 'duplicates.txt' if the flag has no value)
    #[arg(
        short,
        long,
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = DEFAULT_OUTPUT_FILE
    )]
    pub output: Option<PathBuf>,

    /// Export format
    #[arg(long, value_enum, default_value_t = ExportFormat::Txt)]
    pub format: ExportFormat,

    /// Show what would be scanned without processing files
    #[arg(long)]
    pub dry_run: bool,

    /// Show verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Include directories that start with a dot (like .git)
    #[arg(long)]
    pub include_dot_dirs: bool,

    /// Number of parallel threads for hashing (default: number of CPU cores)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// TOML file with default scan options
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Txt,
    Json,
    Csv,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Txt => "txt",
            Self::Json => "json",
            Self::Csv => "csv",
        })
    }
}
