//! Hydration-state extraction.
//!
//! Pages that hydrate server-rendered markup serialize their whole
//! application state into a global assignment. This strategy captures that
//! object graph and walks it for channel entries, flattening channels with
//! several stream URLs (HLS + DASH renditions) into one link per URL.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::extract::literal::{capture_balanced, parse_literal};
use crate::models::{ChannelLink, LinksData};

static HYDRATION_ASSIGN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__NUXT__\s*=\s*").expect("hydration assign regex"));

/// Keys holding a channel's display name, in priority order.
const NAME_KEYS: &[&str] = &["name", "title"];
/// Keys holding a single stream URL, in collection order.
const URL_KEYS: &[&str] = &["url", "hls", "dash"];
/// Keys holding a list of stream entries.
const LIST_KEYS: &[&str] = &["streams", "links", "urls"];

/// Applies the hydration-state strategy to a script body.
pub fn extract_hydration_state(content: &str) -> Option<LinksData> {
    let assign = HYDRATION_ASSIGN.find(content)?;
    let rest = &content[assign.end()..];
    let brace = rest.find(|c: char| !c.is_whitespace())?;
    if rest.as_bytes().get(brace) != Some(&b'{') {
        // Function-wrapped state is executable, not a data literal
        return None;
    }
    let literal = capture_balanced(rest, brace)?;
    let state = parse_literal(literal)?;

    let mut links = Vec::new();
    collect_channels(&state, &mut links);
    if links.is_empty() {
        return None;
    }
    Some(LinksData { links })
}

/// Maximum graph depth the channel walk descends to. Resolved payload graphs
/// can nest far deeper than any sane page state.
const MAX_WALK_DEPTH: usize = 128;

/// Walks an object graph in traversal order, flattening channel entries into
/// one [`ChannelLink`] per stream URL.
///
/// A channel entry is an object with a string name (`name`/`title`) and at
/// least one URL-bearing field: a `url`/`hls`/`dash` string, or a
/// `streams`/`links`/`urls` list of strings or `{url: ...}` objects.
/// Descent stops at [`MAX_WALK_DEPTH`].
pub fn collect_channels(value: &Value, out: &mut Vec<ChannelLink>) {
    walk(value, out, 0);
}

fn walk(value: &Value, out: &mut Vec<ChannelLink>, depth: usize) {
    if depth >= MAX_WALK_DEPTH {
        return;
    }
    match value {
        Value::Object(map) => {
            let name = NAME_KEYS
                .iter()
                .find_map(|k| map.get(*k).and_then(Value::as_str))
                .filter(|n| !n.is_empty());

            if let Some(name) = name {
                let urls = stream_urls(map);
                if !urls.is_empty() {
                    for url in urls {
                        out.push(ChannelLink {
                            name: name.to_string(),
                            url,
                        });
                    }
                    // Descend into the rest of the entry (nested groups),
                    // skipping the URL fields already consumed
                    for (key, child) in map {
                        if URL_KEYS.contains(&key.as_str()) || LIST_KEYS.contains(&key.as_str()) {
                            continue;
                        }
                        walk(child, out, depth + 1);
                    }
                    return;
                }
            }
            for child in map.values() {
                walk(child, out, depth + 1);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, out, depth + 1);
            }
        }
        _ => {}
    }
}

/// Collects a channel entry's stream URLs in field order.
fn stream_urls(map: &serde_json::Map<String, Value>) -> Vec<String> {
    let mut urls = Vec::new();
    for key in URL_KEYS {
        if let Some(url) = map.get(*key).and_then(Value::as_str) {
            urls.push(url.to_string());
        }
    }
    for key in LIST_KEYS {
        let Some(Value::Array(items)) = map.get(*key) else {
            continue;
        };
        for item in items {
            match item {
                Value::String(url) => urls.push(url.clone()),
                Value::Object(entry) => {
                    if let Some(url) = entry.get("url").and_then(Value::as_str) {
                        urls.push(url.to_string());
                    }
                }
                _ => {}
            }
        }
    }
    urls
}
