//! channel_harvest library: seed-page channel harvesting
//!
//! This library crawls seed pages for channel/stream metadata embedded in
//! client-side application state, optionally through an authenticating
//! forward proxy, and aggregates the results into a deduplicated playlist.
//!
//! # Example
//!
//! ```no_run
//! use channel_harvest::{run_harvest, write_playlist, Config, FileConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     seeds: vec!["https://tv.example.com/channels".to_string()],
//!     ..Default::default()
//! };
//!
//! let report = run_harvest(&config, &FileConfig::default()).await?;
//! println!("Harvested {} channel(s) from {} seed(s)",
//!          report.channels.len(), report.seeds_succeeded);
//! write_playlist(&config.output_path(), config.output_format(), &report.channels)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your
//! application or ensure you're calling library functions within an async
//! context.

#![warn(missing_docs)]

pub mod config;
pub mod discovery;
pub mod error_handling;
pub mod extract;
pub mod initialization;
mod models;
pub mod output;
mod session;
pub mod transport;
pub mod vpn;

// Re-export public API
pub use config::{Config, FileConfig, LogFormat, LogLevel, OutputFormat};
pub use models::{ChannelLink, ExternalScript, LinksData, ScriptCandidate};
pub use output::{render_json, render_m3u, write_playlist};
pub use session::{build_login_info, run_harvest, AggregatedPlaylist, FieldSource, HarvestReport, LoginPlan};
