//! Error types and run statistics.
//!
//! This module provides:
//! - Per-area error enums (fetch, config, VPN, output)
//! - Thread-safe run statistics counters

mod stats;
mod types;

pub use stats::{failure_kind_for, RunStats};
pub use types::{ConfigError, FetchError, InitializationError, OutputError, VpnError};

use strum_macros::EnumIter as EnumIterMacro;

/// Kinds of per-seed failures counted during a run.
///
/// These categorize recoverable failures: a seed that hits one of these is
/// logged and skipped, and the run continues with the remaining seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum SeedFailureKind {
    /// Connection, DNS, or timeout failure.
    Network,
    /// Proxy CONNECT handshake rejected.
    ProxyTunnel,
    /// Response body decompression failed.
    Decode,
    /// Response bytes did not parse as HTTP.
    MalformedResponse,
    /// Seed or discovered URL did not parse.
    InvalidUrl,
}

impl SeedFailureKind {
    /// Human-readable label used in the run summary.
    pub fn as_str(&self) -> &'static str {
        match self {
            SeedFailureKind::Network => "network error",
            SeedFailureKind::ProxyTunnel => "proxy tunnel rejected",
            SeedFailureKind::Decode => "body decode error",
            SeedFailureKind::MalformedResponse => "malformed HTTP response",
            SeedFailureKind::InvalidUrl => "invalid URL",
        }
    }
}

impl std::fmt::Display for SeedFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_seed_failure_kind_labels() {
        for kind in SeedFailureKind::iter() {
            assert!(!kind.as_str().is_empty());
        }
        assert_eq!(SeedFailureKind::Network.to_string(), "network error");
    }
}
