//! Same-session link discovery.
//!
//! Given a fetched page, proposes additional URLs worth visiting in the same
//! session: same-host links always, cross-host links only when they look like
//! stream manifests or embeddable players.

mod unescape;

pub use unescape::unescape_fragments;

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

// Candidate sources, in scan order. Attribute values may be preceded by
// leftover quote characters from unescaped JSON, hence the ["']* runs.
static ANCHOR_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\b[^>]*?\bhref\s*=\s*["']*([^"'\s>]+)"#).expect("anchor href regex")
});
static IFRAME_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<iframe\b[^>]*?\bsrc\s*=\s*["']*([^"'\s>]+)"#).expect("iframe src regex")
});
static DATA_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bdata-[a-z0-9-]*(?:src|url)\s*=\s*["']*([^"'\s>]+)"#)
        .expect("data attr regex")
});
static JSON_URL_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""url"\s*:\s*"([^"]+)""#).expect("json url field regex")
});

/// Extensions and path/query signals marking a cross-host URL as stream-like.
const MANIFEST_EXTENSIONS: &[&str] = &[".m3u8", ".mpd"];
const PLAYER_SEGMENTS: &[&str] = &["embed", "player"];
const STREAM_QUERY_KEY: &str = "stream";

/// Discovers additional same-session URLs in a fetched page.
///
/// The HTML is unescaped first so candidates inside inline JSON blobs are
/// matched too. Candidates are resolved against `base_url`; same-host results
/// are always kept, cross-host results only when they match a stream/player
/// heuristic. Output preserves first-seen order with exact duplicates
/// collapsed.
pub fn discover_additional_urls(html: &str, base_url: &str) -> Vec<String> {
    let Ok(base) = Url::parse(base_url) else {
        log::warn!("Discovery skipped: base URL '{base_url}' did not parse");
        return Vec::new();
    };

    let unescaped = unescape_fragments(html);

    let mut seen = HashSet::new();
    let mut results = Vec::new();
    for regex in [&*ANCHOR_HREF, &*IFRAME_SRC, &*DATA_ATTR, &*JSON_URL_FIELD] {
        for capture in regex.captures_iter(&unescaped) {
            let Some(candidate) = capture.get(1) else {
                continue;
            };
            let Some(resolved) = resolve_candidate(candidate.as_str(), &base) else {
                continue;
            };
            if !keep_candidate(&resolved, &base) {
                log::trace!("Discovery dropped cross-host candidate {resolved}");
                continue;
            }
            let as_string = resolved.to_string();
            if seen.insert(as_string.clone()) {
                results.push(as_string);
            }
        }
    }

    log::debug!("Discovery found {} URL(s) on {}", results.len(), base_url);
    results
}

/// Trims attribute-boundary remnants and resolves a candidate against the
/// base URL. Returns only http(s) results.
fn resolve_candidate(raw: &str, base: &Url) -> Option<Url> {
    let trimmed = trim_candidate(raw);
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("data:")
        || trimmed.starts_with('#')
    {
        return None;
    }
    let resolved = base.join(trimmed).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}

/// Strips stray encoded delimiter remnants produced by naive attribute
/// matching (dangling backslashes, re-encoded quotes, trailing punctuation).
fn trim_candidate(raw: &str) -> &str {
    const REMNANTS: &[&str] = &[
        "\\", "\"", "'", "&quot;", "&#34;", "&#39;", "%22", "%27", ",", ")", ";",
    ];
    let mut out = raw.trim();
    loop {
        let before = out;
        for remnant in REMNANTS {
            if let Some(stripped) = out.strip_suffix(remnant) {
                out = stripped;
            }
        }
        if out == before {
            return out;
        }
    }
}

/// Same-host candidates are always kept; cross-host only when stream-like.
fn keep_candidate(candidate: &Url, base: &Url) -> bool {
    if candidate.host_str() == base.host_str() {
        return true;
    }
    is_stream_like(candidate)
}

fn is_stream_like(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    if MANIFEST_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return true;
    }
    if path
        .split('/')
        .any(|segment| PLAYER_SEGMENTS.iter().any(|p| segment.contains(p)))
    {
        return true;
    }
    url.query_pairs().any(|(key, _)| key == STREAM_QUERY_KEY)
}
