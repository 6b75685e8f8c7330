//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

mod schema_automation;
mod schema_relay;

pub use schema_automation::*;
pub use schema_relay::*;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub relay: RelayConfig,

    #[serde(default)]
    pub target: TargetConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub automation: AutomationConfig,

    #[serde(default)]
    pub capture: CaptureConfig,
}

/// Desktop capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Prompt sent with single captures and used when the operator leaves the
    /// multi-page instruction empty.
    #[serde(default = "default_capture_prompt")]
    pub default_prompt: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            default_prompt: default_capture_prompt(),
        }
    }
}

fn default_capture_prompt() -> String {
    "Solve this problem and provide only the final answer or code with no explanations."
        .to_string()
}

/// Browser connection used by the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Chrome remote debugging endpoint.
    #[serde(default = "default_cdp_endpoint")]
    pub cdp_endpoint: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            cdp_endpoint: default_cdp_endpoint(),
        }
    }
}

fn default_cdp_endpoint() -> String {
    "http://localhost:9222".to_string()
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
