//! CLI definitions for SnapRelay.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// SnapRelay CLI.
#[derive(Parser)]
#[command(name = "snaprelay")]
#[command(about = "Ask a browser-hosted AI page about your screen")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.snaprelay/config.toml)
    #[arg(short, long, env = "SNAPRELAY_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Capture the screen and relay requests to the bridge (default)
    Desktop {
        /// Relay port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Answer relayed requests by driving the target tab in Chrome
    Bridge {
        /// Relay port to connect to
        #[arg(long)]
        port: Option<u16>,

        /// Chrome remote debugging endpoint
        #[arg(long)]
        cdp_endpoint: Option<String>,
    },

    /// Check whether the relay and the browser are reachable
    Status {
        /// Relay port
        #[arg(long)]
        port: Option<u16>,

        /// Chrome remote debugging endpoint
        #[arg(long)]
        cdp_endpoint: Option<String>,
    },
}
