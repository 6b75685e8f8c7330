//! Relay-facing service loop of the bridge.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use snaprelay_protocols::{ChannelMessage, DuplexChannel};

use crate::coordinator::TabCoordinator;

/// Serve capture requests arriving on `channel` until it shuts down.
///
/// Each request runs on its own task; replies go back over the same channel.
pub async fn serve_channel<C>(channel: Arc<C>, coordinator: Arc<TabCoordinator>)
where
    C: DuplexChannel + 'static,
{
    let mut inbound = channel.inbound();
    info!("Bridge ready for capture requests");

    loop {
        let message = match inbound.recv().await {
            Ok(message) => message,
            Err(RecvError::Lagged(skipped)) => {
                warn!("Bridge lagged, {} frame(s) dropped", skipped);
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        if !matches!(message, ChannelMessage::ProcessRequest(_)) {
            continue;
        }

        let channel = channel.clone();
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            if let Some(reply) = coordinator.handle_message(message).await {
                if !channel.send(&reply) {
                    warn!("Relay down, dropped '{}' reply", reply.action());
                }
            }
        });
    }
}
