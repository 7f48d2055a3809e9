//! Application configuration.
//!
//! This module provides:
//! - Configuration constants (timeouts, default paths, header values)
//! - CLI option types and parsing
//! - TOML config file loading (seeds, credentials, proxy, VPN)
//! - Forward-proxy endpoint validation

mod constants;
mod file;
mod proxy;
mod types;

pub use constants::*;
pub use file::{CredentialRecord, FileConfig, LoginOptions};
pub use proxy::ProxyEndpoint;
pub use types::{Config, LogFormat, LogLevel, OutputFormat};
