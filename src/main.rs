//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `channel_harvest` library that handles:
//! - Command-line argument parsing and config file merging
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use channel_harvest::initialization::{init_crypto_provider, init_logger_with};
use channel_harvest::{run_harvest, write_playlist, Config, FileConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments into Config
    let mut config = Config::parse();

    // Merge in the config file, if one was given; CLI values win
    let file_config = match &config.config {
        Some(path) => FileConfig::load(path).context("Failed to load config file")?,
        None => FileConfig::default(),
    };
    file_config.apply_to(&mut config);

    // Initialize logger based on config
    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    // Initialize crypto provider for TLS operations
    init_crypto_provider();

    match run_harvest(&config, &file_config).await {
        Ok(report) if report.seeds_succeeded > 0 => {
            let output_path = config.output_path();
            write_playlist(&output_path, config.output_format(), &report.channels)
                .context("Failed to write playlist")?;
            println!(
                "Harvested {} channel{} from {}/{} seed{} - playlist written to {}",
                report.channels.len(),
                if report.channels.len() == 1 { "" } else { "s" },
                report.seeds_succeeded,
                report.seeds_total,
                if report.seeds_total == 1 { "" } else { "s" },
                output_path.display()
            );
            Ok(())
        }
        Ok(report) => {
            eprintln!(
                "channel_harvest: all {} seed(s) failed; no playlist written",
                report.seeds_total
            );
            process::exit(1);
        }
        Err(e) => {
            eprintln!("channel_harvest error: {:#}", e);
            process::exit(1);
        }
    }
}
