//! Selector lists resolved from configuration.

use snaprelay_config::SelectorsConfig;

/// Join alternative selectors into one CSS selector list.
pub fn selector_group(alternatives: &[String]) -> String {
    alternatives
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// One selector list per page element the automation touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelectors {
    pub upload_trigger: String,
    pub file_input: String,
    pub upload_preview: String,
    pub prompt_input: String,
    pub send_button: String,
    pub response_container: String,
    pub response_text: String,
    pub thinking_indicator: String,
}

impl From<&SelectorsConfig> for PageSelectors {
    fn from(config: &SelectorsConfig) -> Self {
        Self {
            upload_trigger: selector_group(&config.upload_trigger),
            file_input: selector_group(&config.file_input),
            upload_preview: selector_group(&config.upload_preview),
            prompt_input: selector_group(&config.prompt_input),
            send_button: selector_group(&config.send_button),
            response_container: selector_group(&config.response_container),
            response_text: selector_group(&config.response_text),
            thinking_indicator: selector_group(&config.thinking_indicator),
        }
    }
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self::from(&SelectorsConfig::default())
    }
}
