//! Configuration constants.

use std::time::Duration;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 15;

/// Default User-Agent sent with every request.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Accept-Encoding advertised on every request; must stay in sync with the
/// encodings `decode_response_body` can actually undo.
pub const ACCEPT_ENCODING: &str = "gzip, deflate, br";

/// Interval between VPN `status` polls.
pub const VPN_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default overall deadline for the VPN gate.
pub const VPN_DEFAULT_TIMEOUT_SECONDS: u64 = 60;

/// Scheme prefixes stripped when checking for placeholder (empty) stream URLs.
pub const KNOWN_SCHEME_PREFIXES: &[&str] =
    &["acestream://", "https://", "http://", "rtmp://", "rtsp://"];

/// Default playlist output path.
pub const DEFAULT_OUTPUT_PATH: &str = "playlist.m3u";
