//! Pixelwash CLI - turns untrusted images into bounded, metadata-free PNGs.
//!
//! ```bash
//! pixelwash sanitize upload.bin --content-type image/jpeg
//! pixelwash sanitize ./uploads/ -d ./safe -f jsonl -o reports.jsonl
//! pixelwash --config ./pixelwash.toml config show
//! ```
//!
//! Every input gets exactly one report on stdout (or `--output`), logs go to
//! stderr. A report's `state.label` says what happened to that input:
//! `completed`, `opt_out` (not an image), `completed_with_errors` (an image
//! that neither decoder could convert) or `error` (unreadable, too large,
//! timed out). Per-input outcomes never change the exit status; the process
//! exits non-zero only when the run itself cannot proceed, e.g. a missing
//! input path, an invalid override or an unwritable report file.

use clap::{Parser, Subcommand};
use pixelwash_core::Config;
use std::path::{Path, PathBuf};

mod cli;
mod logging;

#[derive(Parser, Debug)]
#[command(name = "pixelwash")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the platform default
    #[arg(long, global = true, env = "PIXELWASH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sanitize images into safe PNGs and report the outcome
    Sanitize(cli::sanitize::SanitizeArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = load_config(&config_path);
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!(
        "Pixelwash v{} (config: {})",
        pixelwash_core::VERSION,
        config_path.display()
    );

    match cli.command {
        Commands::Sanitize(args) => cli::sanitize::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, &config, &config_path).await,
    }
}

/// Load the config file, falling back to defaults when it is missing or broken.
///
/// Runs before logging exists, so problems are reported on stderr directly.
fn load_config(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }

    Config::load_from(path).unwrap_or_else(|e| {
        eprintln!(
            "Warning: Failed to load config from {}: {e}\n  \
             Using default configuration.",
            path.display()
        );
        Config::default()
    })
}
