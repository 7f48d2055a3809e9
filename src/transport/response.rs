//! Raw HTTP/1.1 response parsing.
//!
//! The proxied-HTTPS path reads the byte stream off the tunnel itself, so the
//! transport carries its own minimal response parser: split head from body at
//! the first blank line, parse the status line, collect headers (repeated
//! names become ordered lists), and undo chunked framing when present.

use std::collections::BTreeMap;

use crate::error_handling::FetchError;

/// A header value: single, or an ordered list for repeated header names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    /// The header appeared once.
    Single(String),
    /// The header appeared several times, in arrival order.
    Multiple(Vec<String>),
}

impl HeaderValue {
    /// First (or only) value.
    pub fn first(&self) -> &str {
        match self {
            HeaderValue::Single(v) => v,
            HeaderValue::Multiple(vs) => vs.first().map(String::as_str).unwrap_or(""),
        }
    }

    /// All values in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        match self {
            HeaderValue::Single(v) => std::slice::from_ref(v).iter(),
            HeaderValue::Multiple(vs) => vs.iter(),
        }
        .map(String::as_str)
    }
}

/// Case-insensitive response header map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: BTreeMap<String, HeaderValue>,
}

impl HeaderMap {
    /// Appends a header, folding repeats into an ordered list.
    pub fn append(&mut self, name: &str, value: String) {
        let key = name.to_ascii_lowercase();
        match self.entries.get_mut(&key) {
            None => {
                self.entries.insert(key, HeaderValue::Single(value));
            }
            Some(HeaderValue::Single(existing)) => {
                let folded = HeaderValue::Multiple(vec![std::mem::take(existing), value]);
                self.entries.insert(key, folded);
            }
            Some(HeaderValue::Multiple(vs)) => vs.push(value),
        }
    }

    /// Looks up a header by name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.entries.get(&name.to_ascii_lowercase())
    }

    /// First value for a header, if present.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).map(HeaderValue::first)
    }

    /// Builds a map from name/value pairs (test fixtures, mostly).
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let mut map = HeaderMap::default();
        for (name, value) in pairs {
            map.append(&name.into(), value.into());
        }
        map
    }
}

/// A parsed raw response: status, headers, and the still-encoded body bytes.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Splits a raw HTTP/1.1 byte stream into status, headers, and body.
///
/// The split point is the first `\r\n\r\n` boundary. Repeated header names are
/// collected into ordered lists. When the headers declare
/// `Transfer-Encoding: chunked`, the chunked framing is removed from the body.
pub fn parse_response(bytes: &[u8]) -> Result<RawResponse, FetchError> {
    let boundary = find_blank_line(bytes).ok_or_else(|| {
        FetchError::MalformedResponse("no header/body boundary in response".to_string())
    })?;
    let head = &bytes[..boundary];
    let mut body = bytes[boundary + 4..].to_vec();

    let head_text = String::from_utf8_lossy(head);
    let mut lines = head_text.split("\r\n");

    let status_line = lines
        .next()
        .ok_or_else(|| FetchError::MalformedResponse("empty response head".to_string()))?;
    let status = parse_status_line(status_line)?;

    let mut headers = HeaderMap::default();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            // Tolerate stray lines rather than failing the whole fetch
            log::debug!("Skipping malformed header line: {:?}", line);
            continue;
        };
        headers.append(name.trim(), value.trim().to_string());
    }

    if is_chunked(&headers) {
        body = match dechunk(&body) {
            Some(dechunked) => dechunked,
            None => {
                log::warn!("Malformed chunked framing; using raw body bytes");
                body
            }
        };
    }

    Ok(RawResponse {
        status,
        headers,
        body,
    })
}

/// Parses the numeric status code out of an HTTP/1.x status line.
pub fn parse_status_line(line: &str) -> Result<u16, FetchError> {
    let mut parts = line.split_whitespace();
    let version = parts.next().unwrap_or("");
    if !version.starts_with("HTTP/") {
        return Err(FetchError::MalformedResponse(format!(
            "bad status line: {:?}",
            line
        )));
    }
    parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| FetchError::MalformedResponse(format!("bad status line: {:?}", line)))
}

fn find_blank_line(bytes: &[u8]) -> Option<usize> {
    bytes.windows(4).position(|w| w == b"\r\n\r\n")
}

fn is_chunked(headers: &HeaderMap) -> bool {
    headers
        .get("transfer-encoding")
        .map(|v| v.iter().any(|t| t.to_ascii_lowercase().contains("chunked")))
        .unwrap_or(false)
}

/// Removes chunked transfer framing. Returns `None` on malformed framing.
fn dechunk(body: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(body.len());
    let mut pos = 0;
    loop {
        let line_end = body[pos..].windows(2).position(|w| w == b"\r\n")? + pos;
        let size_str = std::str::from_utf8(&body[pos..line_end]).ok()?;
        // Chunk extensions after ';' are ignored
        let size_hex = size_str.split(';').next()?.trim();
        let size = usize::from_str_radix(size_hex, 16).ok()?;
        pos = line_end + 2;
        if size == 0 {
            return Some(out);
        }
        if pos + size > body.len() {
            return None;
        }
        out.extend_from_slice(&body[pos..pos + size]);
        pos += size;
        // Each chunk is terminated by CRLF
        if body.get(pos..pos + 2) != Some(b"\r\n") {
            return None;
        }
        pos += 2;
    }
}
