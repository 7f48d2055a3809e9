//! HTTP(S) transport.
//!
//! Performs a single GET request: direct, through a forward proxy in
//! absolute-form, or through a CONNECT tunnel with TLS negotiated by hand over
//! the tunneled socket. Each request opens its own connection, reads the
//! response to connection close, and decompresses the body. Nothing here knows
//! anything about page content.

mod decode;
mod request;
mod response;
mod tls;
mod types;

pub use decode::decode_response_body;
pub use response::{HeaderMap, HeaderValue};
pub use types::{FetchOptions, FetchResult};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use url::Url;

use crate::config::ProxyEndpoint;
use crate::error_handling::FetchError;
use request::{build_connect_head, build_request_head, proxy_authorization};
use response::parse_response;

/// Upper bound on a CONNECT handshake response head.
const MAX_CONNECT_HEAD: usize = 16 * 1024;

/// Performs a single GET request and returns the decoded response.
///
/// Dispatches on scheme and proxy presence:
/// - no proxy: direct connection (TLS for https)
/// - proxy + http: absolute-form request to the proxy
/// - proxy + https: CONNECT tunnel, then TLS over the tunnel
///
/// The whole request, connect included, runs under `options.timeout`; expiry
/// is a [`FetchError::Network`].
pub async fn fetch(url: &str, options: &FetchOptions<'_>) -> Result<FetchResult, FetchError> {
    let parsed =
        Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
    let scheme = parsed.scheme().to_ascii_lowercase();
    if scheme != "http" && scheme != "https" {
        return Err(FetchError::InvalidUrl(format!(
            "unsupported scheme '{scheme}' in {url}"
        )));
    }

    log::debug!(
        "Fetching {} ({}proxy)",
        url,
        if options.proxy.is_some() { "via " } else { "no " }
    );

    let raw = tokio::time::timeout(options.timeout, dispatch(&parsed, &scheme, options))
        .await
        .map_err(|_| FetchError::Network(format!("request to {url} timed out")))??;

    let response = parse_response(&raw)?;
    let body = decode_response_body(&response.body, &response.headers)?;

    Ok(FetchResult {
        status: response.status,
        headers: response.headers,
        body,
    })
}

async fn dispatch(
    url: &Url,
    scheme: &str,
    options: &FetchOptions<'_>,
) -> Result<Vec<u8>, FetchError> {
    let host = url
        .host_str()
        .ok_or_else(|| FetchError::InvalidUrl(format!("no host in {url}")))?
        .to_string();
    let port = url
        .port()
        .unwrap_or(if scheme == "https" { 443 } else { 80 });

    match (options.proxy, scheme) {
        (None, "http") => direct_http(url, &host, port, options).await,
        (None, _) => direct_https(url, &host, port, options).await,
        (Some(proxy), "http") => proxied_http(url, proxy, options).await,
        (Some(proxy), _) => proxied_https(url, &host, port, proxy, options).await,
    }
}

/// Origin-form request target: path plus query.
fn origin_form(url: &Url) -> String {
    match url.query() {
        Some(q) => format!("{}?{}", url.path(), q),
        None => url.path().to_string(),
    }
}

async fn direct_http(
    url: &Url,
    host: &str,
    port: u16,
    options: &FetchOptions<'_>,
) -> Result<Vec<u8>, FetchError> {
    let stream = TcpStream::connect((host, port)).await?;
    let head = build_request_head(&origin_form(url), url, &options.headers, None);
    exchange(stream, &head).await
}

async fn direct_https(
    url: &Url,
    host: &str,
    port: u16,
    options: &FetchOptions<'_>,
) -> Result<Vec<u8>, FetchError> {
    let stream = TcpStream::connect((host, port)).await?;
    let tls = tls::connect_tls(stream, host).await?;
    let head = build_request_head(&origin_form(url), url, &options.headers, None);
    exchange(tls, &head).await
}

/// Classic forward-proxy request: the full absolute URL as the request target.
async fn proxied_http(
    url: &Url,
    proxy: &ProxyEndpoint,
    options: &FetchOptions<'_>,
) -> Result<Vec<u8>, FetchError> {
    let stream = TcpStream::connect((proxy.host.as_str(), proxy.port)).await?;
    let auth = proxy_authorization(proxy);
    let head = build_request_head(url.as_str(), url, &options.headers, auth.as_deref());
    exchange(stream, &head).await
}

/// CONNECT tunnel, then TLS over the raw tunneled socket.
async fn proxied_https(
    url: &Url,
    host: &str,
    port: u16,
    proxy: &ProxyEndpoint,
    options: &FetchOptions<'_>,
) -> Result<Vec<u8>, FetchError> {
    let mut stream = TcpStream::connect((proxy.host.as_str(), proxy.port)).await?;

    let auth = proxy_authorization(proxy);
    let connect_head = build_connect_head(host, port, auth.as_deref());
    stream.write_all(connect_head.as_bytes()).await?;
    stream.flush().await?;

    let handshake = read_head(&mut stream).await?;
    let head_text = String::from_utf8_lossy(&handshake);
    let status_line = head_text.split("\r\n").next().unwrap_or("");
    let status = response::parse_status_line(status_line)?;
    if !(200..300).contains(&status) {
        log::warn!("Proxy refused CONNECT to {host}:{port} with status {status}");
        return Err(FetchError::ProxyTunnel { status });
    }

    let tls = tls::connect_tls(stream, host).await?;
    let head = build_request_head(&origin_form(url), url, &options.headers, None);
    exchange(tls, &head).await
}

/// Writes a request head and reads the response until connection close.
async fn exchange<S>(mut stream: S, head: &str) -> Result<Vec<u8>, FetchError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(head.as_bytes()).await?;
    stream.flush().await?;

    let mut buf = Vec::new();
    match stream.read_to_end(&mut buf).await {
        Ok(_) => {}
        // Servers often drop the connection without a TLS close_notify;
        // the bytes read so far are the full close-delimited response
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof && !buf.is_empty() => {}
        Err(e) => return Err(e.into()),
    }
    Ok(buf)
}

/// Reads a response head (through the first blank line) off a stream.
async fn read_head<S>(stream: &mut S) -> Result<Vec<u8>, FetchError>
where
    S: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(256);
    let mut byte = [0u8; 1];
    loop {
        let n = stream.read(&mut byte).await?;
        if n == 0 {
            return Err(FetchError::MalformedResponse(
                "connection closed during CONNECT handshake".to_string(),
            ));
        }
        buf.push(byte[0]);
        if buf.ends_with(b"\r\n\r\n") {
            return Ok(buf);
        }
        if buf.len() > MAX_CONNECT_HEAD {
            return Err(FetchError::MalformedResponse(
                "CONNECT response head too large".to_string(),
            ));
        }
    }
}
