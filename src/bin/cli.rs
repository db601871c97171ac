//! MOPS watch CLI
//!
//! Polls the day's MOPS disclosure listing, keeps announcements whose subject
//! contains a watched keyword, and pushes a digest of the new ones.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use mops_watch::{
    error::Result,
    models::{Config, LoggingConfig},
    pipeline::{self, RunOptions},
    utils::time::taipei_today,
};

/// mops-watch - MOPS disclosure keyword watcher
#[derive(Parser, Debug)]
#[command(
    name = "mops-watch",
    version,
    about = "Keyword watcher for MOPS material announcements"
)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the listing, write outputs and notify on new matches
    Run {
        /// Keyword file (overrides paths.keywords)
        #[arg(long)]
        keywords: Option<PathBuf>,

        /// JSON output file (overrides paths.out_json)
        #[arg(long)]
        out_json: Option<PathBuf>,

        /// CSV output file (overrides paths.out_csv)
        #[arg(long)]
        out_csv: Option<PathBuf>,

        /// Ledger file (overrides paths.state)
        #[arg(long)]
        state: Option<PathBuf>,

        /// Listing date as YYYY-MM-DD (default: today in Taipei)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        /// Write outputs but leave the ledger untouched and send nothing
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate configuration, keywords and ledger
    Validate,

    /// Show ledger info
    Info,
}

fn parse_date(value: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got {value:?}: {e}"))
}

/// Initialize logging; `RUST_LOG` still wins over both.
fn init_logging(verbose: bool, configured: &str) {
    let level = if verbose { "debug" } else { configured };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = Config::load_if_present(&cli.config);
    let level = match &loaded {
        Ok(Some(config)) => config.logging.level.clone(),
        _ => LoggingConfig::default().level,
    };
    init_logging(cli.verbose, &level);

    let mut config = match loaded {
        Ok(Some(config)) => {
            log::info!("Loaded configuration from {}", cli.config.display());
            config
        }
        Ok(None) => {
            log::warn!("No config at {}, using defaults", cli.config.display());
            Config::default()
        }
        Err(e) => {
            log::error!("Cannot use config {}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };
    config.apply_env();

    match execute(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(command: Command, mut config: Config) -> Result<()> {
    match command {
        Command::Run {
            keywords,
            out_json,
            out_csv,
            state,
            date,
            dry_run,
        } => {
            if let Some(path) = keywords {
                config.paths.keywords = path;
            }
            if let Some(path) = out_json {
                config.paths.out_json = path;
            }
            if let Some(path) = out_csv {
                config.paths.out_csv = path;
            }
            if let Some(path) = state {
                config.paths.state = path;
            }
            config.validate()?;

            let options = RunOptions {
                date: date.unwrap_or_else(taipei_today),
                dry_run,
            };
            let report = pipeline::run_pipeline(&config, &options).await?;

            if report.notify.as_ref().is_some_and(|n| n.failed() > 0) {
                log::warn!("Some notification channels failed; see above");
            }
            log::info!("Done!");
        }

        Command::Validate => {
            pipeline::run_validate(&config).await?;
        }

        Command::Info => {
            pipeline::run_info(&config).await?;
        }
    }

    Ok(())
}
