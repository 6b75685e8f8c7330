//! Page automation configuration.
//!
//! Every selector the automation uses lives in [`SelectorsConfig`]. When the
//! target page changes its markup, only this table needs updating.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timeouts and selectors for the page automation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationConfig {
    /// Bound on every "wait for element" step.
    #[serde(default = "default_element_timeout_secs")]
    pub element_timeout_secs: u64,

    /// Bound on the "answer finished streaming" step.
    #[serde(default = "default_completion_timeout_secs")]
    pub completion_timeout_secs: u64,

    /// Pause after completion is detected, before extraction.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Fallback re-check interval when no DOM change is reported.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub selectors: SelectorsConfig,
}

impl AutomationConfig {
    pub fn element_timeout(&self) -> Duration {
        Duration::from_secs(self.element_timeout_secs)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            element_timeout_secs: default_element_timeout_secs(),
            completion_timeout_secs: default_completion_timeout_secs(),
            settle_delay_ms: default_settle_delay_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            selectors: SelectorsConfig::default(),
        }
    }
}

fn default_element_timeout_secs() -> u64 {
    15
}

fn default_completion_timeout_secs() -> u64 {
    60
}

fn default_settle_delay_ms() -> u64 {
    1000
}

fn default_poll_interval_ms() -> u64 {
    250
}

/// Alternative CSS selectors per page element. Any alternative may match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorsConfig {
    #[serde(default = "default_upload_trigger")]
    pub upload_trigger: Vec<String>,

    #[serde(default = "default_file_input")]
    pub file_input: Vec<String>,

    #[serde(default = "default_upload_preview")]
    pub upload_preview: Vec<String>,

    #[serde(default = "default_prompt_input")]
    pub prompt_input: Vec<String>,

    #[serde(default = "default_send_button")]
    pub send_button: Vec<String>,

    #[serde(default = "default_response_container")]
    pub response_container: Vec<String>,

    /// Text-bearing nodes searched for under the response container.
    #[serde(default = "default_response_text")]
    pub response_text: Vec<String>,

    #[serde(default = "default_thinking_indicator")]
    pub thinking_indicator: Vec<String>,
}

impl SelectorsConfig {
    /// Named selector lists, for validation and diagnostics.
    pub fn entries(&self) -> [(&'static str, &[String]); 8] {
        [
            ("upload_trigger", self.upload_trigger.as_slice()),
            ("file_input", self.file_input.as_slice()),
            ("upload_preview", self.upload_preview.as_slice()),
            ("prompt_input", self.prompt_input.as_slice()),
            ("send_button", self.send_button.as_slice()),
            ("response_container", self.response_container.as_slice()),
            ("response_text", self.response_text.as_slice()),
            ("thinking_indicator", self.thinking_indicator.as_slice()),
        ]
    }
}

impl Default for SelectorsConfig {
    fn default() -> Self {
        Self {
            upload_trigger: default_upload_trigger(),
            file_input: default_file_input(),
            upload_preview: default_upload_preview(),
            prompt_input: default_prompt_input(),
            send_button: default_send_button(),
            response_container: default_response_container(),
            response_text: default_response_text(),
            thinking_indicator: default_thinking_indicator(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_upload_trigger() -> Vec<String> {
    strings(&[r#"[aria-label="Add image"]"#, r#"button[aria-label="Add image"]"#])
}

fn default_file_input() -> Vec<String> {
    strings(&[r#"input[type="file"]"#])
}

fn default_upload_preview() -> Vec<String> {
    strings(&[r#"img[alt="Uploaded image"]"#, ".image-preview img"])
}

fn default_prompt_input() -> Vec<String> {
    strings(&[r#"[role="textbox"]"#, "textarea"])
}

fn default_send_button() -> Vec<String> {
    strings(&[
        r#"button[aria-label="Send message"]"#,
        r#"button[aria-label="Submit"]"#,
    ])
}

fn default_response_container() -> Vec<String> {
    strings(&[
        r#"[role="listitem"][data-participant-type="model"]"#,
        ".model-response",
        ".response-content",
    ])
}

fn default_response_text() -> Vec<String> {
    strings(&["[data-message-id]", ".message-content"])
}

fn default_thinking_indicator() -> Vec<String> {
    strings(&[r#"[data-thinking="true"]"#, ".loading-indicator", ".thinking"])
}
