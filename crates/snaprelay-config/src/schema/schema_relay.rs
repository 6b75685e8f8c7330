//! Relay and target page configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Local relay socket configuration, shared by both processes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Interval between client heartbeats.
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,

    /// Silence after which the client considers the peer dead.
    #[serde(default = "default_liveness_timeout_secs")]
    pub liveness_timeout_secs: u64,

    /// Fixed delay before each reconnect attempt.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Reconnect attempts before the client stays disconnected.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
}

impl RelayConfig {
    /// Socket address the server binds.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// WebSocket URL the client dials.
    pub fn url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_secs(self.liveness_timeout_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            liveness_timeout_secs: default_liveness_timeout_secs(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8765
}

fn default_heartbeat_interval_secs() -> u64 {
    5
}

fn default_liveness_timeout_secs() -> u64 {
    15
}

fn default_reconnect_delay_ms() -> u64 {
    2000
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

/// The conversational page the bridge drives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// URL opened when no target tab exists.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Prefix used to recognise an existing target tab.
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,

    /// Substring the page location must contain before automation starts.
    #[serde(default = "default_host_marker")]
    pub host_marker: String,

    /// Time given to a freshly opened tab before it is searched again.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Prompt used when a request arrives without one.
    #[serde(default = "default_fallback_prompt")]
    pub fallback_prompt: String,
}

impl TargetConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            url_prefix: default_url_prefix(),
            host_marker: default_host_marker(),
            settle_delay_ms: default_settle_delay_ms(),
            fallback_prompt: default_fallback_prompt(),
        }
    }
}

fn default_base_url() -> String {
    "https://gemini.google.com/".to_string()
}

fn default_url_prefix() -> String {
    "https://gemini.google.com/".to_string()
}

fn default_host_marker() -> String {
    "gemini.google.com".to_string()
}

fn default_settle_delay_ms() -> u64 {
    3000
}

fn default_fallback_prompt() -> String {
    "Analyze this image".to_string()
}
