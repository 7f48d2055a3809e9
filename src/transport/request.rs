//! HTTP request head construction.
//!
//! Builds the hand-written request line and header block for direct requests,
//! absolute-form proxy requests, and CONNECT handshakes.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use url::Url;

use crate::config::ProxyEndpoint;

/// Builds a GET request head.
///
/// `target` is the request path: origin-form for direct requests, the full
/// absolute URL for classic forward-proxy requests. Adds `Host` and
/// `Connection: close`; caller headers with those names are dropped so the
/// request carries each exactly once.
pub fn build_request_head(
    target: &str,
    url: &Url,
    extra_headers: &[(String, String)],
    proxy_auth: Option<&str>,
) -> String {
    let mut head = format!("GET {} HTTP/1.1\r\n", target);
    head.push_str(&format!("Host: {}\r\n", host_header_value(url)));
    if let Some(auth) = proxy_auth {
        head.push_str(&format!("Proxy-Authorization: {}\r\n", auth));
    }
    for (name, value) in extra_headers {
        let lower = name.to_ascii_lowercase();
        if lower == "host" || lower == "connection" || lower == "proxy-authorization" {
            continue;
        }
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str("Connection: close\r\n\r\n");
    head
}

/// Builds a CONNECT handshake head for tunneling to `host:port`.
pub fn build_connect_head(host: &str, port: u16, proxy_auth: Option<&str>) -> String {
    let mut head = format!("CONNECT {host}:{port} HTTP/1.1\r\n");
    head.push_str(&format!("Host: {host}:{port}\r\n"));
    if let Some(auth) = proxy_auth {
        head.push_str(&format!("Proxy-Authorization: {}\r\n", auth));
    }
    head.push_str("\r\n");
    head
}

/// The `Host` header value for a URL: host, plus the port when nonstandard.
pub fn host_header_value(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match (url.port(), url.scheme()) {
        (Some(port), "http") if port != 80 => format!("{host}:{port}"),
        (Some(port), "https") if port != 443 => format!("{host}:{port}"),
        _ => host.to_string(),
    }
}

/// The `Proxy-Authorization` value for an endpoint with credentials.
///
/// Credentials arrive percent-encoded from the proxy URL; they are decoded
/// before the `user:pass` pair is Base64-encoded.
pub fn proxy_authorization(proxy: &ProxyEndpoint) -> Option<String> {
    if !proxy.has_credentials() {
        return None;
    }
    let user = percent_decode(proxy.username.as_deref().unwrap_or(""));
    let pass = percent_decode(proxy.password.as_deref().unwrap_or(""));
    let token = BASE64.encode(format!("{user}:{pass}"));
    Some(format!("Basic {token}"))
}

/// Decodes `%XX` escapes; malformed escapes pass through literally.
fn percent_decode(input: &str) -> String {
    fn hex_val(b: u8) -> Option<u8> {
        match b {
            b'0'..=b'9' => Some(b - b'0'),
            b'a'..=b'f' => Some(b - b'a' + 10),
            b'A'..=b'F' => Some(b - b'A' + 10),
            _ => None,
        }
    }

    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                out.push(hi * 16 + lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy_with(user: Option<&str>, pass: Option<&str>) -> ProxyEndpoint {
        ProxyEndpoint {
            scheme: "http".into(),
            host: "proxy.example.com".into(),
            port: 3128,
            username: user.map(String::from),
            password: pass.map(String::from),
        }
    }

    #[test]
    fn test_build_request_head_direct() {
        let url = Url::parse("https://tv.example.com/guide").unwrap();
        let head = build_request_head(
            "/guide",
            &url,
            &[("Accept-Encoding".into(), "gzip".into())],
            None,
        );
        assert!(head.starts_with("GET /guide HTTP/1.1\r\n"));
        assert!(head.contains("Host: tv.example.com\r\n"));
        assert!(head.contains("Accept-Encoding: gzip\r\n"));
        assert!(head.ends_with("Connection: close\r\n\r\n"));
    }

    #[test]
    fn test_build_request_head_drops_duplicate_host() {
        let url = Url::parse("http://tv.example.com/").unwrap();
        let head = build_request_head(
            "/",
            &url,
            &[("Host".into(), "spoofed.example.net".into())],
            None,
        );
        assert!(head.contains("Host: tv.example.com\r\n"));
        assert!(!head.contains("spoofed"));
    }

    #[test]
    fn test_host_header_includes_nonstandard_port() {
        let url = Url::parse("http://tv.example.com:8080/x").unwrap();
        assert_eq!(host_header_value(&url), "tv.example.com:8080");
        let url = Url::parse("https://tv.example.com/x").unwrap();
        assert_eq!(host_header_value(&url), "tv.example.com");
    }

    #[test]
    fn test_connect_head() {
        let head = build_connect_head("tv.example.com", 443, Some("Basic abc"));
        assert!(head.starts_with("CONNECT tv.example.com:443 HTTP/1.1\r\n"));
        assert!(head.contains("Host: tv.example.com:443\r\n"));
        assert!(head.contains("Proxy-Authorization: Basic abc\r\n"));
        assert!(head.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_proxy_authorization_decodes_percent_escapes() {
        // user@corp : p@ss, percent-encoded as they appear in a proxy URL
        let proxy = proxy_with(Some("user%40corp"), Some("p%40ss"));
        let auth = proxy_authorization(&proxy).unwrap();
        let expected = BASE64.encode("user@corp:p@ss");
        assert_eq!(auth, format!("Basic {expected}"));
    }

    #[test]
    fn test_proxy_authorization_absent_without_credentials() {
        assert!(proxy_authorization(&proxy_with(None, None)).is_none());
    }

    #[test]
    fn test_percent_decode_passthrough() {
        assert_eq!(percent_decode("plain"), "plain");
        assert_eq!(percent_decode("bad%zz"), "bad%zz");
        assert_eq!(percent_decode("%2Fpath"), "/path");
    }
}
