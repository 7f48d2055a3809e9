//! TLS session setup.
//!
//! Builds the rustls client configuration once and negotiates TLS sessions
//! over arbitrary async streams, which is what lets the CONNECT path wrap a
//! tunneled proxy socket exactly like a direct TCP connection.

use std::sync::{Arc, LazyLock};

use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

use crate::error_handling::FetchError;

static CLIENT_CONFIG: LazyLock<Arc<ClientConfig>> = LazyLock::new(|| {
    let mut root_store = RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    Arc::new(
        ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth(),
    )
});

/// Negotiates a TLS session over `stream`, using `host` as the server name
/// indicator.
///
/// `stream` may be a plain TCP socket or an established CONNECT tunnel.
pub async fn connect_tls<S>(stream: S, host: &str) -> Result<TlsStream<S>, FetchError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let server_name = ServerName::try_from(host.to_string())
        .map_err(|e| FetchError::InvalidUrl(format!("invalid TLS server name '{host}': {e}")))?;

    let connector = TlsConnector::from(Arc::clone(&CLIENT_CONFIG));
    connector
        .connect(server_name, stream)
        .await
        .map_err(|e| FetchError::Network(format!("TLS handshake with {host} failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_server_name_is_rejected() {
        let (client, _server) = tokio::io::duplex(64);
        let result = connect_tls(client, "not a hostname").await;
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }
}
