//! Desktop process: relay server, screen capture and the console.

use std::sync::Arc;

use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::info;

use snaprelay_capture_desktop::DesktopCapture;
use snaprelay_config::Config;
use snaprelay_orchestrator::{CaptureOrchestrator, HotkeyAction};
use snaprelay_protocols::DuplexChannel;
use snaprelay_relay::RelayServer;

use crate::console::{self, ConsoleSurface};

/// Run until the operator quits or Ctrl+C.
pub(crate) async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting SnapRelay desktop v{}", env!("CARGO_PKG_VERSION"));

    let server = Arc::new(RelayServer::new(config.relay.clone()));
    server.connect().await?;

    let surface = Arc::new(ConsoleSurface::new());
    let orchestrator = Arc::new(
        CaptureOrchestrator::new(
            Arc::new(DesktopCapture::new()),
            surface.clone(),
            server.clone(),
            config.capture.default_prompt.clone(),
        )
        .with_instructions(console::instructions()),
    );

    let (actions, rx) = mpsc::unbounded_channel();
    let input = {
        let surface = surface.clone();
        let actions = actions.clone();
        tokio::spawn(async move {
            console::read_commands(BufReader::new(tokio::io::stdin()), &surface, actions).await;
        })
    };
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted");
            let _ = actions.send(HotkeyAction::Quit);
        }
    });

    println!("{}", console::HELP);
    orchestrator.run(rx).await;

    input.abort();
    server.close().await;
    info!("Desktop stopped");
    Ok(())
}
