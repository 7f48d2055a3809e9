//! Error type definitions.
//!
//! Per-area error enums. Fetch-layer errors are recoverable per seed; config
//! and VPN errors are fatal and abort the run before any fetch.

use thiserror::Error;

/// Errors raised by the transport layer while performing a single fetch.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection, DNS, or timeout failure.
    #[error("network error: {0}")]
    Network(String),

    /// The proxy refused the CONNECT handshake.
    #[error("proxy CONNECT tunnel rejected with status {status}")]
    ProxyTunnel {
        /// Status code observed on the CONNECT response.
        status: u16,
    },

    /// Response body decompression failed.
    #[error("body decode error: {0}")]
    Decode(String),

    /// The response bytes did not parse as an HTTP/1.1 message.
    #[error("malformed HTTP response: {0}")]
    MalformedResponse(String),

    /// The request URL could not be parsed or has an unsupported scheme.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
}

impl From<std::io::Error> for FetchError {
    fn from(e: std::io::Error) -> Self {
        FetchError::Network(e.to_string())
    }
}

/// Fatal configuration errors, detected at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The proxy URL did not parse.
    #[error("malformed proxy URL '{url}': {reason}")]
    MalformedProxyUrl {
        /// The offending URL string.
        url: String,
        /// Parser detail.
        reason: String,
    },

    /// The proxy URL used a scheme other than http/https.
    #[error("unsupported proxy scheme '{0}' (expected http or https)")]
    UnsupportedProxyScheme(String),

    /// The config file could not be read or parsed.
    #[error("config file error: {0}")]
    File(String),

    /// No seed URLs were supplied on the CLI or in the config file.
    #[error("no seed URLs configured")]
    NoSeeds,
}

/// Errors raised by the VPN gate collaborator.
#[derive(Error, Debug)]
pub enum VpnError {
    /// The VPN CLI binary could not be spawned.
    #[error("failed to spawn VPN CLI '{cli}': {reason}")]
    Spawn {
        /// Configured CLI path.
        cli: String,
        /// OS detail.
        reason: String,
    },

    /// The gate never reached the connected state within its budget.
    #[error("VPN did not reach connected state within {timeout_secs}s")]
    ConnectTimeout {
        /// Overall deadline that was exceeded.
        timeout_secs: u64,
    },
}

/// Errors writing the final playlist artifact.
#[derive(Error, Debug)]
pub enum OutputError {
    /// Filesystem failure while writing the playlist.
    #[error("failed to write playlist to '{path}': {source}")]
    Write {
        /// Destination path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors during process startup (logger wiring).
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("logger initialization error: {0}")]
    LoggerError(#[from] log::SetLoggerError),
}
