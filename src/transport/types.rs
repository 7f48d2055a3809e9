//! Transport value types.

use std::time::Duration;

use crate::config::ProxyEndpoint;
use crate::transport::response::HeaderMap;

/// The outcome of one completed fetch.
///
/// Created once per request and owned by the caller; the transport keeps no
/// reference to it and reuses nothing between requests.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// Numeric HTTP status code.
    pub status: u16,
    /// Response headers, name lookup case-insensitive.
    pub headers: HeaderMap,
    /// Decoded (decompressed, UTF-8) response body.
    pub body: String,
}

impl FetchResult {
    /// Whether the status code is in the 2xx class.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Per-request options.
#[derive(Debug, Clone)]
pub struct FetchOptions<'a> {
    /// Extra request headers, sent in order after `Host`.
    pub headers: Vec<(String, String)>,
    /// Optional forward proxy.
    pub proxy: Option<&'a ProxyEndpoint>,
    /// Budget for the whole request, connect included.
    pub timeout: Duration,
}

impl<'a> FetchOptions<'a> {
    /// Options with no extra headers and no proxy.
    pub fn new(timeout: Duration) -> Self {
        FetchOptions {
            headers: Vec::new(),
            proxy: None,
            timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_success() {
        let ok = FetchResult {
            status: 204,
            headers: HeaderMap::default(),
            body: String::new(),
        };
        let not = FetchResult {
            status: 301,
            ..ok.clone()
        };
        assert!(ok.is_success());
        assert!(!not.is_success());
    }
}
