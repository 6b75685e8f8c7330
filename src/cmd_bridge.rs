//! Bridge process: relay client in front of the tab coordinator.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use snaprelay_automation::PageAutomation;
use snaprelay_browser_cdp::CdpTabHost;
use snaprelay_config::Config;
use snaprelay_coordinator::{TabCoordinator, serve_channel};
use snaprelay_protocols::{ConnectionState, DuplexChannel};
use snaprelay_relay::RelayClient;

/// Pause before starting over once the client has used up its reconnects.
const RESTART_DELAY: Duration = Duration::from_secs(30);

/// Run until Ctrl+C.
pub(crate) async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting SnapRelay bridge v{}", env!("CARGO_PKG_VERSION"));

    let host = Arc::new(CdpTabHost::new(config.browser.cdp_endpoint.clone()));
    let automation = PageAutomation::new(config.automation.clone(), config.target.host_marker.clone());
    let coordinator = Arc::new(TabCoordinator::new(host, config.target.clone(), automation));

    let client = Arc::new(RelayClient::new(&config.relay));
    client.connect().await?;
    info!(
        "Relaying {} via {} to {}",
        client.url(),
        config.browser.cdp_endpoint,
        config.target.base_url
    );

    let service = tokio::spawn(serve_channel(client.clone(), coordinator));
    let lifecycle = tokio::spawn(keep_connected(client.clone()));

    tokio::signal::ctrl_c().await?;
    info!("Interrupted");

    lifecycle.abort();
    client.close().await;
    service.abort();
    info!("Bridge stopped");
    Ok(())
}

/// Log connection changes and start the client again after it gives up.
async fn keep_connected(client: Arc<RelayClient>) {
    let mut state = client.subscribe_state();
    loop {
        match client.wait_connected().await {
            Ok(()) => {
                info!("Connected to relay at {}", client.url());
                let closed = state
                    .wait_for(|s| *s != ConnectionState::Connected)
                    .await
                    .is_err();
                if closed {
                    return;
                }
                warn!("Relay connection lost, reconnecting");
            }
            Err(e) => {
                warn!("{}; starting over in {}s", e, RESTART_DELAY.as_secs());
                tokio::time::sleep(RESTART_DELAY).await;
                if let Err(e) = client.connect().await {
                    error!("Failed to restart relay client: {}", e);
                }
            }
        }
    }
}
