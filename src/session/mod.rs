//! Seed session orchestration.
//!
//! Drives the whole run: VPN gate, then a sequential loop over seed pages.
//! Each seed is fetched, its script candidates extracted, and (unless
//! disabled) one discovery hop follows links found on the page through the
//! same fetch+extract path. Links accumulate into a URL-deduplicated
//! playlist. A seed failure is logged and skipped; the run succeeds when at
//! least one seed did.

mod aggregate;
mod login;

pub use aggregate::AggregatedPlaylist;
pub use login::{build_login_info, FieldSource, LoginPlan};

use std::collections::HashSet;
use std::time::Duration;

use anyhow::Context;
use strum::IntoEnumIterator;
use url::Url;

use crate::config::{Config, FileConfig, ProxyEndpoint, ACCEPT_ENCODING};
use crate::discovery::discover_additional_urls;
use crate::error_handling::{
    failure_kind_for, ConfigError, FetchError, RunStats, SeedFailureKind,
};
use crate::extract::{
    extract_links_data_from_script, extract_links_data_scripts, ExternalScriptFetcher,
};
use crate::models::{ChannelLink, ExternalScript};
use crate::transport::{fetch, FetchOptions};
use crate::vpn::ensure_vpn_connection;

/// The outcome of a harvest run.
#[derive(Debug)]
pub struct HarvestReport {
    /// Seeds the run attempted.
    pub seeds_total: usize,
    /// Seeds that fetched and extracted without a fatal per-seed error.
    pub seeds_succeeded: usize,
    /// Seeds skipped after a per-seed failure.
    pub seeds_failed: usize,
    /// Aggregated, URL-deduplicated channel list in first-seen order.
    pub channels: Vec<ChannelLink>,
}

/// Runs a complete harvest over the configured seeds.
///
/// Validates configuration, passes the VPN gate when one is configured, then
/// processes seeds sequentially. Configuration and VPN failures are fatal;
/// per-seed failures are counted and skipped.
///
/// # Arguments
/// * `config` - Merged run configuration (CLI over file)
/// * `file_config` - Parsed config file, source of login options and credentials
///
/// # Returns
/// A [`HarvestReport`] with per-seed outcomes and the aggregated channel list.
pub async fn run_harvest(
    config: &Config,
    file_config: &FileConfig,
) -> anyhow::Result<HarvestReport> {
    if config.seeds.is_empty() {
        return Err(ConfigError::NoSeeds.into());
    }

    let proxy = config
        .proxy
        .as_deref()
        .map(ProxyEndpoint::parse)
        .transpose()
        .context("invalid proxy configuration")?;
    if let Some(endpoint) = &proxy {
        log::info!(
            "Using {} proxy {}:{}{}",
            endpoint.scheme,
            endpoint.host,
            endpoint.port,
            if endpoint.has_credentials() {
                " (authenticated)"
            } else {
                ""
            }
        );
    }

    if let Some(cli) = &config.vpn_cli {
        ensure_vpn_connection(cli, config.vpn_server.as_deref(), config.vpn_timeout())
            .await
            .context("VPN gate failed")?;
    }

    let stats = RunStats::new();
    let mut playlist = AggregatedPlaylist::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut seeds_succeeded = 0;
    let mut seeds_failed = 0;

    for seed in &config.seeds {
        log::info!("Processing seed {}", seed);
        match harvest_seed(seed, config, file_config, proxy.as_ref(), &stats, &mut visited).await
        {
            Ok(links) => {
                log::info!("Seed {} yielded {} link(s)", seed, links.len());
                playlist.extend(links);
                seeds_succeeded += 1;
            }
            Err(e) => {
                let kind = failure_kind_for(&e);
                stats.increment_failure(kind);
                seeds_failed += 1;
                log::warn!("Skipping seed {} ({}): {}", seed, kind, e);
            }
        }
    }

    log_run_summary(&stats, seeds_succeeded, seeds_failed, playlist.len());

    Ok(HarvestReport {
        seeds_total: config.seeds.len(),
        seeds_succeeded,
        seeds_failed,
        channels: playlist.into_links(),
    })
}

/// Fetches one seed page, extracts its links, and runs the discovery hop.
async fn harvest_seed(
    seed: &str,
    config: &Config,
    file_config: &FileConfig,
    proxy: Option<&ProxyEndpoint>,
    stats: &RunStats,
    visited: &mut HashSet<String>,
) -> Result<Vec<ChannelLink>, FetchError> {
    let seed_url =
        Url::parse(seed).map_err(|e| FetchError::InvalidUrl(format!("{seed}: {e}")))?;
    visited.insert(seed_url.to_string());

    let options = request_options(&seed_url, config, file_config, proxy);
    let result = fetch(seed, &options).await?;
    if !result.is_success() {
        log::warn!("Seed {} returned status {}", seed, result.status);
    }

    let mut links = extract_page(&result.body, seed, &options, stats).await;

    if !config.no_discovery {
        let discovered = discover_additional_urls(&result.body, seed);
        log::debug!("Discovered {} candidate URL(s) on {}", discovered.len(), seed);
        for target in discovered {
            if !visited.insert(target.clone()) {
                continue;
            }
            match follow_discovered(&target, config, file_config, proxy, stats).await {
                Ok(more) => links.extend(more),
                Err(e) => {
                    stats.increment_failure(failure_kind_for(&e));
                    log::warn!("Discovered URL {} failed: {}", target, e);
                }
            }
        }
    }

    Ok(links)
}

/// Fetches and extracts one discovered URL. Failures here never fail the seed.
async fn follow_discovered(
    target: &str,
    config: &Config,
    file_config: &FileConfig,
    proxy: Option<&ProxyEndpoint>,
    stats: &RunStats,
) -> Result<Vec<ChannelLink>, FetchError> {
    let url = Url::parse(target).map_err(|e| FetchError::InvalidUrl(format!("{target}: {e}")))?;
    let options = request_options(&url, config, file_config, proxy);
    let result = fetch(target, &options).await?;
    if !result.is_success() {
        log::debug!("Discovered URL {} returned status {}", target, result.status);
        return Ok(Vec::new());
    }
    Ok(extract_page(&result.body, target, &options, stats).await)
}

/// Runs the extraction engine over one fetched page.
async fn extract_page(
    body: &str,
    page_url: &str,
    options: &FetchOptions<'_>,
    stats: &RunStats,
) -> Vec<ChannelLink> {
    let fetcher = external_fetcher(options);
    let candidates = extract_links_data_scripts(body, page_url, fetcher.as_ref()).await;
    stats.add_scripts_scanned(candidates.len());

    let mut links = Vec::new();
    for candidate in candidates {
        if let Some(data) = extract_links_data_from_script(&candidate.content) {
            stats.increment_strategy_match();
            log::debug!(
                "Script {} on {} yielded {} link(s)",
                candidate.index,
                page_url,
                data.links.len()
            );
            links.extend(data.links);
        }
    }
    links
}

/// Builds the per-request options for a target: standard headers plus the
/// resolved login plan's headers for the target host.
fn request_options<'a>(
    url: &Url,
    config: &Config,
    file_config: &FileConfig,
    proxy: Option<&'a ProxyEndpoint>,
) -> FetchOptions<'a> {
    let mut headers = vec![
        ("User-Agent".to_string(), config.user_agent.clone()),
        ("Accept-Encoding".to_string(), ACCEPT_ENCODING.to_string()),
    ];

    let credential = url.host_str().and_then(|h| file_config.credential_for(h));
    let plan = build_login_info(url, file_config.login.as_ref(), credential);
    log_login_plan(url, &plan);
    for (name, value) in &plan.headers {
        headers.push((name.clone(), value.clone()));
    }

    FetchOptions {
        headers,
        proxy,
        timeout: Duration::from_secs(config.timeout_seconds),
    }
}

fn log_login_plan(url: &Url, plan: &LoginPlan) {
    let provenance = |source: &Option<FieldSource>| match source {
        Some(s) => s.as_str(),
        None => "default",
    };
    log::debug!(
        "Login plan for {}: url from {}, method {} from {}, {} header(s) from {}, {} payload field(s) from {}",
        url.host_str().unwrap_or("?"),
        provenance(&plan.url_source),
        plan.method,
        provenance(&plan.method_source),
        plan.headers.len(),
        provenance(&plan.headers_source),
        plan.payload.len(),
        provenance(&plan.payload_source),
    );
}

/// Wraps the transport layer as the extraction engine's external-script
/// collaborator, reusing the page's request options.
fn external_fetcher<'a>(options: &'a FetchOptions<'a>) -> Box<ExternalScriptFetcher<'a>> {
    Box::new(move |url: String| {
        Box::pin(async move {
            let result = fetch(&url, options).await?;
            Ok(ExternalScript {
                status: result.status,
                body: result.body,
            })
        })
    })
}

fn log_run_summary(stats: &RunStats, succeeded: usize, failed: usize, channels: usize) {
    log::info!(
        "Run complete: {} seed(s) succeeded, {} failed, {} unique channel(s)",
        succeeded,
        failed,
        channels
    );
    log::info!(
        "Scanned {} script candidate(s), {} strategy match(es)",
        stats.scripts_scanned(),
        stats.strategy_matches()
    );
    for kind in SeedFailureKind::iter() {
        let count = stats.failure_count(kind);
        if count > 0 {
            log::info!("  {}: {}", kind, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_seeds(seeds: &[&str]) -> Config {
        Config {
            seeds: seeds.iter().map(|s| s.to_string()).collect(),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_no_seeds_is_fatal() {
        let config = config_with_seeds(&[]);
        let err = run_harvest(&config, &FileConfig::default())
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }

    #[tokio::test]
    async fn test_malformed_proxy_is_fatal() {
        let config = Config {
            proxy: Some("socks5://proxy.example.com:1080".into()),
            ..config_with_seeds(&["https://tv.example.com/"])
        };
        let err = run_harvest(&config, &FileConfig::default())
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }

    #[tokio::test]
    async fn test_unreachable_seed_is_counted_not_fatal() {
        // Reserved TEST-NET-1 address; connection fails fast or times out.
        let config = Config {
            timeout_seconds: 1,
            ..config_with_seeds(&["http://192.0.2.1:9/"])
        };
        let report = run_harvest(&config, &FileConfig::default()).await.unwrap();
        assert_eq!(report.seeds_total, 1);
        assert_eq!(report.seeds_succeeded, 0);
        assert_eq!(report.seeds_failed, 1);
        assert!(report.channels.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_seed_url_is_counted_not_fatal() {
        let config = config_with_seeds(&["not a url", "also-not-a-url"]);
        let report = run_harvest(&config, &FileConfig::default()).await.unwrap();
        assert_eq!(report.seeds_failed, 2);
    }

    #[test]
    fn test_request_options_include_login_headers() {
        let raw = r#"
[credentials."tv.example.com"]
[credentials."tv.example.com".headers]
X-Auth-Token = "abc"
"#;
        let file_config = FileConfig::parse(raw).unwrap();
        let config = Config::default();
        let url = Url::parse("https://tv.example.com/guide").unwrap();

        let options = request_options(&url, &config, &file_config, None);
        assert!(options
            .headers
            .iter()
            .any(|(n, v)| n == "X-Auth-Token" && v == "abc"));
        assert!(options.headers.iter().any(|(n, _)| n == "User-Agent"));
        assert!(options.headers.iter().any(|(n, _)| n == "Accept-Encoding"));
    }

    #[test]
    fn test_request_options_other_host_gets_no_credential_headers() {
        let raw = r#"
[credentials."tv.example.com"]
[credentials."tv.example.com".headers]
X-Auth-Token = "abc"
"#;
        let file_config = FileConfig::parse(raw).unwrap();
        let config = Config::default();
        let url = Url::parse("https://cdn.example.com/player").unwrap();

        let options = request_options(&url, &config, &file_config, None);
        assert!(!options.headers.iter().any(|(n, _)| n == "X-Auth-Token"));
    }
}
