#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::doc_markdown)]

mod commands;
mod logging;

use clap::Parser;
use depsize_core::config::{DEFAULT_BACKEND_TIMEOUT, DEFAULT_LARGE_THRESHOLD_MB};
use depsize_core::{Config, MatchMode};
use miette::Result;
use std::path::PathBuf;
use std::time::Duration;

/// Separator for path lists in `DEPSIZE_ROOTS`.
#[cfg(windows)]
const PATH_LIST_DELIMITER: char = ';';
#[cfg(not(windows))]
const PATH_LIST_DELIMITER: char = ':';

/// Printed when no subcommand is given.
const DESCRIPTION: &str = "\
depsize: Get the total size of installed Python dependencies in megabytes (MB).
    Run 'depsize total' to get the total size of dependencies, including the largest
    Run 'depsize export --output FILE' to export dependencies as JSON,
        f.ex 'depsize export --output data/packages.json'
    Add '--from FILE' to 'depsize total' or 'depsize export' to measure only the
    dependencies declared in a manifest,
        f.ex 'depsize total --from requirements-main.txt'
    Run 'depsize doctor' to see which package roots and package managers were found";

#[derive(Parser, Debug)]
#[command(name = "depsize")]
#[command(author, version, about = "Measure the on-disk size of installed Python packages", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    /// Package root to search (repeatable); disables root discovery
    #[arg(
        long = "root",
        global = true,
        value_name = "DIR",
        env = "DEPSIZE_ROOTS",
        value_delimiter = PATH_LIST_DELIMITER
    )]
    roots: Vec<PathBuf>,

    /// Seconds to wait for a package manager before giving up
    #[arg(
        long,
        global = true,
        value_name = "SECS",
        env = "DEPSIZE_BACKEND_TIMEOUT",
        value_parser = parse_positive_f64
    )]
    timeout_secs: Option<f64>,

    /// Packages at or above this size (MB) are listed individually
    #[arg(long, global = true, value_name = "MB", value_parser = parse_non_negative_f64)]
    threshold_mb: Option<f64>,

    /// How package names are matched to installed entries: boundary or prefix
    #[arg(long, global = true, value_name = "MODE", value_parser = parse_match_mode)]
    match_mode: Option<MatchMode>,

    /// Worker threads used for measuring (0 = automatic)
    #[arg(short = 'j', long, global = true, value_name = "N")]
    jobs: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print the total size of installed packages and the largest ones
    Total {
        /// Only measure the dependencies declared in this manifest
        /// (requirements file, pyproject.toml or setup.cfg)
        #[arg(long = "from", value_name = "FILE")]
        from: Option<PathBuf>,

        /// Measure every entry under the package roots without asking a package manager
        #[arg(long)]
        scan: bool,
    },

    /// Write name, version and size of each package to a JSON file
    Export {
        /// Path of the JSON file to write, f.ex data/packages.json
        #[arg(short = 'o', long = "output", visible_alias = "o", value_name = "FILE")]
        output: PathBuf,

        /// Only export the dependencies declared in this manifest
        #[arg(long = "from", value_name = "FILE")]
        from: Option<PathBuf>,
    },

    /// Show package roots and available package managers
    Doctor,

    /// Print version information
    Version,
}

fn parse_positive_f64(s: &str) -> Result<f64, String> {
    match s.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(format!("expected a positive number, got '{s}'")),
    }
}

fn parse_non_negative_f64(s: &str) -> Result<f64, String> {
    match s.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(format!("expected a non-negative number, got '{s}'")),
    }
}

fn parse_match_mode(s: &str) -> Result<MatchMode, String> {
    MatchMode::parse(s).ok_or_else(|| format!("unknown match mode '{s}' (expected boundary or prefix)"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Determine working directory
    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let timeout = cli
        .timeout_secs
        .and_then(|s| Duration::try_from_secs_f64(s).ok())
        .unwrap_or(DEFAULT_BACKEND_TIMEOUT);

    // Build config
    let config = Config::new(cwd.clone())
        .with_verbosity(cli.verbose)
        .with_json_logs(cli.json)
        .with_roots(cli.roots)
        .with_backend_timeout(timeout)
        .with_large_threshold_mb(cli.threshold_mb.unwrap_or(DEFAULT_LARGE_THRESHOLD_MB))
        .with_match_mode(cli.match_mode.unwrap_or_default())
        .with_jobs(cli.jobs);

    logging::init(config.verbosity, config.json_logs);

    match cli.command {
        None => {
            println!("{DESCRIPTION}");
            Ok(())
        }
        Some(Commands::Version) => commands::version::run(cli.json),
        Some(Commands::Doctor) => commands::doctor::run(&config, cli.json),
        Some(Commands::Total { from, scan }) => {
            let span = tracing::info_span!("total", cmd = "total", cwd = %cwd.display());
            let _guard = span.enter();
            commands::total::run(&config, from.as_deref(), scan, cli.json)
        }
        Some(Commands::Export { output, from }) => {
            let span = tracing::info_span!("export", cmd = "export", cwd = %cwd.display());
            let _guard = span.enter();
            commands::export::run(&config, &output, from.as_deref())
        }
    }
}
