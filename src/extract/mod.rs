//! Multi-strategy channel extraction.
//!
//! Scans a page's scripts for embedded channel/stream state and recovers a
//! normalized link list from one of three incompatible encodings:
//!
//! 1. legacy `linksData` object-literal assignment
//! 2. hydration-state global object graph
//! 3. flat serialized payload with integer references
//!
//! Strategies apply in order; the first match wins; a strategy failing on
//! malformed-but-plausible input is "no match", never an error. The engine
//! performs no network I/O itself: externally-chunked state scripts are
//! fetched through an injected collaborator.

mod hydration;
mod literal;
mod payload;

pub use literal::parse_literal;

use std::sync::LazyLock;

use futures::future::BoxFuture;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::config::KNOWN_SCHEME_PREFIXES;
use crate::error_handling::FetchError;
use crate::models::{ExternalScript, LinksData, ScriptCandidate};

/// Injected fetcher for externally-chunked state scripts. Supplied by the
/// transport layer; extraction never opens connections itself.
pub type ExternalScriptFetcher<'a> =
    dyn Fn(String) -> BoxFuture<'a, Result<ExternalScript, FetchError>> + Send + Sync + 'a;

static SCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("script selector"));

static LEGACY_ASSIGN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:var|let|const)\s+linksData\s*=\s*").expect("legacy assign regex")
});

/// `<script src>` paths following the externally-chunked state convention:
/// payload/state chunks under a build-output directory.
static EXTERNAL_CHUNK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|/)(?:_nuxt|static)/.*(?:payload|state)\.js(?:\?|$)")
        .expect("external chunk regex")
});

/// Markers that qualify an inline script body for extraction.
fn is_candidate_body(content: &str, script_type: Option<&str>, script_id: Option<&str>) -> bool {
    if content.contains("linksData") || content.contains("__NUXT__") {
        return true;
    }
    // Serialized payloads ship as JSON script islands
    let looks_json = matches!(script_type, Some(t) if t.eq_ignore_ascii_case("application/json"));
    let payload_island = matches!(script_id, Some(id) if id.contains("__NUXT_DATA__"));
    (looks_json || payload_island) && content.trim_start().starts_with('[')
}

/// Scans a page for script candidates worth running extraction on.
///
/// Inline scripts are matched by marker; `<script src>` references matching
/// the external-chunk convention are resolved against `base_url` and fetched
/// through `fetch_external_script`. Candidate `index` is the script's
/// position among all scanned `<script>` elements.
pub async fn extract_links_data_scripts(
    html: &str,
    base_url: &str,
    fetch_external_script: &ExternalScriptFetcher<'_>,
) -> Vec<ScriptCandidate> {
    let base = Url::parse(base_url).ok();

    // Scraper documents are not Send; collect everything before awaiting
    let (inline, external) = scan_scripts(html, base.as_ref());

    let mut candidates = inline;
    for (index, chunk_url) in external {
        match fetch_external_script(chunk_url.clone()).await {
            Ok(script) if (200..300).contains(&script.status) => {
                candidates.push(ScriptCandidate {
                    index,
                    content: script.body,
                    source_url: chunk_url,
                });
            }
            Ok(script) => {
                log::debug!("External script {} returned status {}", chunk_url, script.status);
            }
            Err(e) => {
                log::warn!("External script {} failed: {}", chunk_url, e);
            }
        }
    }

    candidates.sort_by_key(|c| c.index);
    candidates
}

fn scan_scripts(
    html: &str,
    base: Option<&Url>,
) -> (Vec<ScriptCandidate>, Vec<(usize, String)>) {
    let document = Html::parse_document(html);
    let mut inline = Vec::new();
    let mut external = Vec::new();

    for (index, element) in document.select(&SCRIPT_SELECTOR).enumerate() {
        if let Some(src) = element.value().attr("src") {
            if EXTERNAL_CHUNK.is_match(src) {
                if let Some(resolved) = base.and_then(|b| b.join(src).ok()) {
                    external.push((index, resolved.to_string()));
                } else {
                    log::debug!("Could not resolve external script src '{src}'");
                }
            }
            continue;
        }

        let content: String = element.text().collect();
        if content.is_empty() {
            continue;
        }
        if is_candidate_body(
            &content,
            element.value().attr("type"),
            element.value().attr("id"),
        ) {
            inline.push(ScriptCandidate {
                index,
                content,
                source_url: base.map(Url::to_string).unwrap_or_default(),
            });
        }
    }

    (inline, external)
}

/// Recovers a normalized link list from a script body.
///
/// Applies the three strategies in order; returns `None` when none match.
/// Calling this twice on identical input yields identical output.
pub fn extract_links_data_from_script(content: &str) -> Option<LinksData> {
    let data = extract_legacy(content)
        .or_else(|| hydration::extract_hydration_state(content))
        .or_else(|| payload::extract_payload(content))?;
    Some(strip_placeholder_links(data))
}

/// Legacy strategy: `var linksData = { ... };` evaluated as a data literal.
fn extract_legacy(content: &str) -> Option<LinksData> {
    let assign = LEGACY_ASSIGN.find(content)?;
    let rest = &content[assign.end()..];
    if !rest.starts_with('{') {
        return None;
    }
    let object = literal::capture_balanced(rest, 0)?;
    let value = literal::parse_literal(object)?;

    let links = value
        .get("links")?
        .as_array()?
        .iter()
        .filter_map(|entry| {
            let name = entry.get("name")?.as_str()?;
            let url = entry.get("url")?.as_str()?;
            Some(crate::models::ChannelLink {
                name: name.to_string(),
                url: url.to_string(),
            })
        })
        .collect::<Vec<_>>();

    if links.is_empty() {
        return None;
    }
    Some(LinksData { links })
}

/// Drops placeholder slots: entries whose URL is empty once a known scheme
/// prefix is stripped.
fn strip_placeholder_links(mut data: LinksData) -> LinksData {
    data.links.retain(|link| {
        let stripped = KNOWN_SCHEME_PREFIXES
            .iter()
            .find_map(|prefix| link.url.strip_prefix(prefix))
            .unwrap_or(&link.url);
        !stripped.trim().is_empty()
    });
    data
}
