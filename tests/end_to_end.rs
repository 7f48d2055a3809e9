//! End-to-end harvest tests against local one-shot HTTP servers.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use channel_harvest::{run_harvest, write_playlist, Config, FileConfig, OutputFormat};

/// Serves one HTTP response on a fresh local port, then closes the socket.
async fn one_shot_server(body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut request = vec![0u8; 4096];
        let _ = sock.read(&mut request).await.unwrap();
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n{body}"
        );
        sock.write_all(response.as_bytes()).await.unwrap();
        sock.shutdown().await.unwrap();
    });
    addr
}

const LEGACY_PAGE: &str = r#"<html><head>
<script>
var linksData = {links: [
    {name: "Ch1", url: "acestream://aaaa"},
    {name: "Ch1", url: ""}
]};
</script>
</head><body>channel list</body></html>"#;

#[tokio::test]
async fn test_legacy_page_yields_one_link_and_one_extinf_pair() {
    let addr = one_shot_server(LEGACY_PAGE).await;
    let config = Config {
        seeds: vec![format!("http://127.0.0.1:{}/channels", addr.port())],
        ..Config::default()
    };

    let report = run_harvest(&config, &FileConfig::default()).await.unwrap();
    assert_eq!(report.seeds_total, 1);
    assert_eq!(report.seeds_succeeded, 1);
    assert_eq!(report.seeds_failed, 0);
    // The placeholder entry (empty URL) is dropped
    assert_eq!(report.channels.len(), 1);
    assert_eq!(report.channels[0].name, "Ch1");
    assert_eq!(report.channels[0].url, "acestream://aaaa");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("playlist.m3u");
    write_playlist(&path, OutputFormat::M3u, &report.channels).unwrap();

    let playlist = std::fs::read_to_string(&path).unwrap();
    assert!(playlist.starts_with("#EXTM3U\n"));
    assert_eq!(playlist.matches("#EXTINF").count(), 1);
    assert!(playlist.contains("#EXTINF:-1 group-title=\"Ch1\" tvg-id=\"Ch1\",Ch1\n"));
    assert!(playlist.contains("acestream://aaaa\n"));
}

#[tokio::test]
async fn test_duplicate_links_across_seeds_collapse() {
    let page: &'static str = r#"<script>var linksData = {links: [
        {name: "Ch1", url: "acestream://aaaa"},
        {name: "Ch2", url: "acestream://bbbb"}
    ]};</script>"#;
    let first = one_shot_server(page).await;
    let second = one_shot_server(page).await;

    let config = Config {
        seeds: vec![
            format!("http://127.0.0.1:{}/a", first.port()),
            format!("http://127.0.0.1:{}/b", second.port()),
        ],
        no_discovery: true,
        ..Config::default()
    };

    let report = run_harvest(&config, &FileConfig::default()).await.unwrap();
    assert_eq!(report.seeds_succeeded, 2);
    // Both seeds carry the same two links; the aggregate holds each URL once
    assert_eq!(report.channels.len(), 2);
}

#[tokio::test]
async fn test_failed_seed_does_not_block_the_rest() {
    let page: &'static str =
        r#"<script>var linksData = {links: [{name: "Ch1", url: "acestream://aaaa"}]};</script>"#;
    let good = one_shot_server(page).await;

    let config = Config {
        // TEST-NET-1 address that refuses or blackholes connections
        seeds: vec![
            "http://192.0.2.1:9/".to_string(),
            format!("http://127.0.0.1:{}/", good.port()),
        ],
        timeout_seconds: 1,
        no_discovery: true,
        ..Config::default()
    };

    let report = run_harvest(&config, &FileConfig::default()).await.unwrap();
    assert_eq!(report.seeds_succeeded, 1);
    assert_eq!(report.seeds_failed, 1);
    assert_eq!(report.channels.len(), 1);
}

#[tokio::test]
async fn test_json_output_contains_harvested_channels() {
    let addr = one_shot_server(LEGACY_PAGE).await;
    let config = Config {
        seeds: vec![format!("http://127.0.0.1:{}/channels", addr.port())],
        ..Config::default()
    };

    let report = run_harvest(&config, &FileConfig::default()).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("channels.json");
    write_playlist(&path, OutputFormat::Json, &report.channels).unwrap();

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let channels = doc["channels"].as_array().unwrap();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0]["name"], "Ch1");
    assert_eq!(channels[0]["url"], "acestream://aaaa");
}
