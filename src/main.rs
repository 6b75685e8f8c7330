//! SnapRelay - ask a browser-hosted AI page about your screen
//!
//! Main entry point for the desktop, bridge and status commands.

mod cli;
mod cmd_bridge;
mod cmd_desktop;
mod cmd_status;
mod console;

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::warn;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use snaprelay_config::{Config, ConfigLoader, ConfigValidator};

use cli::{Cli, Commands};

/// Get the SnapRelay data directory (~/.snaprelay).
fn snaprelay_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".snaprelay")
}

fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = snaprelay_dir().join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("snaprelay")
        .filename_suffix("log")
        .max_log_files(14)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The guard flushes the file writer on drop; keep it for the whole run.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Console output goes to stderr so it does not interleave with answers.
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(true)
                .with_writer(std::io::stderr),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

/// Load the config file (or defaults) and reject invalid values.
fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let config = ConfigLoader::load_or_default(path)?;
    for warning in ConfigValidator::validate(&config).into_result()? {
        warn!("Config {}: {}", warning.path, warning.message);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing()?;

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        None => cmd_desktop::run(config).await,
        Some(Commands::Desktop { port }) => {
            if let Some(port) = port {
                config.relay.port = port;
            }
            cmd_desktop::run(config).await
        }
        Some(Commands::Bridge { port, cdp_endpoint }) => {
            apply_overrides(&mut config, port, cdp_endpoint);
            cmd_bridge::run(config).await
        }
        Some(Commands::Status { port, cdp_endpoint }) => {
            apply_overrides(&mut config, port, cdp_endpoint);
            cmd_status::run(&config).await
        }
    }
}

fn apply_overrides(config: &mut Config, port: Option<u16>, cdp_endpoint: Option<String>) {
    if let Some(port) = port {
        config.relay.port = port;
    }
    if let Some(endpoint) = cdp_endpoint {
        config.browser.cdp_endpoint = endpoint;
    }
}
