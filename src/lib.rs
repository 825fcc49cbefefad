pub mod cli;
pub mod collector;
pub mod config;
pub mod digest;
pub mod duplicates;
pub mod error;
pub mod export;
pub mod logging;
pub mod progress;
pub mod scanner;
pub mod signal;
pub mod size;
pub mod utils;

pub use cli::{Cli, ExportFormat};
pub use collector::{Candidate, Collector, collect_candidates};
pub use config::ScanConfig;
pub use digest::calculate_file_hash;
pub use duplicates::{Aggregator, DuplicateFinder, DuplicateSet, ScanResult, aggregate, find_duplicates, print_results};
pub use error::DupError;
pub use export::export_to_file;
pub use scanner::{FileRecord, HashScheduler, Outcome};
pub use size::parse_size;
pub use utils::{format_human_elapsed, format_number, natural_size};
