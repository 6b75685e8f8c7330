//! Reachability check for the relay and the browser.

use serde::Deserialize;

use snaprelay_browser_cdp::CdpClient;
use snaprelay_config::Config;

/// Body of the relay's `/health` endpoint.
#[derive(Debug, Deserialize)]
struct RelayHealth {
    status: String,
    peers: usize,
}

async fn relay_health(address: &str) -> Result<RelayHealth, reqwest::Error> {
    reqwest::get(format!("http://{}/health", address))
        .await?
        .json()
        .await
}

pub(crate) async fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let address = config.relay.address();
    match relay_health(&address).await {
        Ok(health) => println!(
            "Relay    {}: {} ({} bridge(s) connected)",
            address, health.status, health.peers
        ),
        Err(e) => println!("Relay    {}: unreachable ({})", address, e),
    }

    let endpoint = &config.browser.cdp_endpoint;
    match CdpClient::probe(endpoint).await {
        Ok(version) => println!("Browser  {}: {}", endpoint, version.browser),
        Err(e) => println!("Browser  {}: {}", endpoint, e),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_health_deserialize() {
        let health: RelayHealth = serde_json::from_str(r#"{"status":"ok","peers":2}"#).unwrap();
        assert_eq!(health.status, "ok");
        assert_eq!(health.peers, 2);
    }

    #[tokio::test]
    async fn test_relay_health_unreachable() {
        assert!(relay_health("127.0.0.1:1").await.is_err());
    }
}
