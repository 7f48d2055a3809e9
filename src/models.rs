//! Shared data structures.
//!
//! Small value types passed between the transport, extraction, and session
//! layers. Everything here is transient: constructed during a run and dropped
//! when the run's top-level call returns.

use serde::Serialize;

/// One channel rendition: a display name and a playable URL.
///
/// Several links may share a `name` (e.g. an HLS and a DASH rendition of the
/// same channel); after aggregation, `url` values are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelLink {
    /// Channel display name.
    pub name: String,
    /// Stream URL (manifest, acestream id, etc.).
    pub url: String,
}

/// The normalized result of a successful extraction strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinksData {
    /// Extracted links in source traversal order.
    pub links: Vec<ChannelLink>,
}

/// A unit of script text considered for extraction.
#[derive(Debug, Clone)]
pub struct ScriptCandidate {
    /// Position among scanned scripts (diagnostics only).
    pub index: usize,
    /// The script body.
    pub content: String,
    /// Where the body came from: the page itself, or an external chunk URL.
    pub source_url: String,
}

/// Response of the injected external-script fetcher.
#[derive(Debug, Clone)]
pub struct ExternalScript {
    /// HTTP status code of the script fetch.
    pub status: u16,
    /// The script body, already decoded to text.
    pub body: String,
}
