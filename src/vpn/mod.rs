//! VPN connection gating through an external CLI.
//!
//! When a VPN CLI is configured, the run does not start until the CLI reports
//! a connected state. The binary is driven with two subcommands: `connect
//! [server]` to initiate the connection and `status` to poll it. Status
//! output is matched case-insensitively, checking for a disconnected state
//! before a connected one so that "Disconnected" never passes the gate.

use std::time::Duration;

use tokio::process::Command;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;

use crate::config::VPN_POLL_INTERVAL;
use crate::error_handling::VpnError;

/// Connection state reported by the VPN CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VpnStatus {
    /// The CLI reports an established connection.
    Connected,
    /// Not connected; carries the raw status text for diagnostics.
    Disconnected(String),
}

/// Interprets the VPN CLI's `status` output.
///
/// "disconnected" is checked first because it contains "connected" as a
/// substring.
pub fn parse_status_output(output: &str) -> VpnStatus {
    let lower = output.to_lowercase();
    if lower.contains("disconnected") {
        return VpnStatus::Disconnected(output.trim().to_string());
    }
    if lower.contains("connected") {
        return VpnStatus::Connected;
    }
    VpnStatus::Disconnected(output.trim().to_string())
}

enum PollFailure {
    Spawn(VpnError),
    NotConnected,
}

/// Blocks until the VPN CLI reports a connected state.
///
/// Issues `connect [server]` once, then polls `status` at a fixed interval
/// under an overall deadline. Already-connected sessions pass immediately
/// without reconnecting.
///
/// # Arguments
/// * `cli` - VPN CLI binary name or path
/// * `server` - Optional server/region argument for the connect command
/// * `timeout` - Overall deadline for the gate
///
/// # Returns
/// `Ok(())` once connected, `VpnError::ConnectTimeout` when the deadline
/// passes, or `VpnError::Spawn` when the CLI cannot be run.
pub async fn ensure_vpn_connection(
    cli: &str,
    server: Option<&str>,
    timeout: Duration,
) -> Result<(), VpnError> {
    if let VpnStatus::Connected = parse_status_output(&run_cli(cli, &["status"]).await?) {
        log::info!("VPN already connected");
        return Ok(());
    }

    let mut connect_args = vec!["connect"];
    if let Some(server) = server {
        connect_args.push(server);
    }
    log::info!("Connecting VPN via '{}'", cli);
    run_cli(cli, &connect_args).await?;

    let attempts = (timeout.as_secs() / VPN_POLL_INTERVAL.as_secs()).max(1) as usize;
    let strategy = FixedInterval::new(VPN_POLL_INTERVAL).take(attempts);
    let poll = Retry::start(strategy, || async {
        match run_cli(cli, &["status"]).await {
            Ok(output) => match parse_status_output(&output) {
                VpnStatus::Connected => Ok(()),
                VpnStatus::Disconnected(state) => {
                    log::debug!("VPN not connected yet: {state}");
                    Err(PollFailure::NotConnected)
                }
            },
            Err(e) => Err(PollFailure::Spawn(e)),
        }
    });

    match tokio::time::timeout(timeout, poll).await {
        Ok(Ok(())) => {
            log::info!("VPN connected");
            Ok(())
        }
        Ok(Err(PollFailure::Spawn(e))) => Err(e),
        Ok(Err(PollFailure::NotConnected)) | Err(_) => Err(VpnError::ConnectTimeout {
            timeout_secs: timeout.as_secs(),
        }),
    }
}

async fn run_cli(cli: &str, args: &[&str]) -> Result<String, VpnError> {
    let output = Command::new(cli)
        .args(args)
        .output()
        .await
        .map_err(|e| VpnError::Spawn {
            cli: cli.to_string(),
            reason: e.to_string(),
        })?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_connected() {
        assert_eq!(parse_status_output("Connected"), VpnStatus::Connected);
        assert_eq!(parse_status_output("  connected\n"), VpnStatus::Connected);
        assert_eq!(
            parse_status_output("Status: CONNECTED to spain"),
            VpnStatus::Connected
        );
    }

    #[test]
    fn test_parse_disconnected_wins_over_substring() {
        assert_eq!(
            parse_status_output("Disconnected"),
            VpnStatus::Disconnected("Disconnected".to_string())
        );
    }

    #[test]
    fn test_parse_unknown_output_is_not_connected() {
        assert!(matches!(
            parse_status_output("Connecting..."),
            VpnStatus::Disconnected(_)
        ));
        assert!(matches!(parse_status_output(""), VpnStatus::Disconnected(_)));
    }

    #[tokio::test]
    async fn test_missing_cli_is_spawn_error() {
        let err = ensure_vpn_connection(
            "/nonexistent/vpnctl-for-tests",
            None,
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, VpnError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_already_connected_passes_immediately() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("vpnctl");
        std::fs::write(&script, "#!/bin/sh\necho Connected\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        ensure_vpn_connection(script.to_str().unwrap(), None, Duration::from_secs(5))
            .await
            .unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_never_connecting_cli_times_out() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("vpnctl");
        std::fs::write(&script, "#!/bin/sh\necho Disconnected\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let err = ensure_vpn_connection(script.to_str().unwrap(), Some("spain"), Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, VpnError::ConnectTimeout { .. }));
    }
}
