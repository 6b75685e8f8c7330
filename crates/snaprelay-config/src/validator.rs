//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Collapse into the first error, if any.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_relay(config, &mut result);
        Self::validate_target(config, &mut result);
        Self::validate_automation(config, &mut result);

        result
    }

    fn validate_relay(config: &Config, result: &mut ValidationResult) {
        let relay = &config.relay;

        if relay.port == 0 {
            result.add_error(ValidationError::new("relay.port", "Port cannot be 0"));
        }

        if relay.host != "127.0.0.1" && relay.host != "localhost" && relay.host != "::1" {
            result.add_warning(ValidationWarning::new(
                "relay.host",
                "Relay is unauthenticated; binding beyond loopback exposes it to the network",
            ));
        }

        if relay.heartbeat_interval_secs == 0 {
            result.add_error(ValidationError::new(
                "relay.heartbeat_interval_secs",
                "Heartbeat interval must be greater than 0",
            ));
        } else if relay.liveness_timeout_secs <= relay.heartbeat_interval_secs {
            result.add_error(ValidationError::new(
                "relay.liveness_timeout_secs",
                "Liveness timeout must exceed the heartbeat interval",
            ));
        }

        if relay.max_reconnect_attempts == 0 {
            result.add_warning(ValidationWarning::new(
                "relay.max_reconnect_attempts",
                "Reconnection is disabled",
            ));
        }
    }

    fn validate_target(config: &Config, result: &mut ValidationResult) {
        let target = &config.target;

        if !target.base_url.starts_with("http://") && !target.base_url.starts_with("https://") {
            result.add_error(ValidationError::new(
                "target.base_url",
                "Base URL must be an http(s) URL",
            ));
        }

        if target.url_prefix.is_empty() {
            result.add_error(ValidationError::new(
                "target.url_prefix",
                "URL prefix cannot be empty",
            ));
        } else if !target.base_url.starts_with(&target.url_prefix) {
            result.add_warning(ValidationWarning::new(
                "target.url_prefix",
                "A tab opened at base_url would not match url_prefix",
            ));
        }
    }

    fn validate_automation(config: &Config, result: &mut ValidationResult) {
        let automation = &config.automation;

        if automation.element_timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "automation.element_timeout_secs",
                "Timeout must be greater than 0",
            ));
        }

        if automation.completion_timeout_secs < automation.element_timeout_secs {
            result.add_warning(ValidationWarning::new(
                "automation.completion_timeout_secs",
                "Completion timeout is shorter than the element timeout",
            ));
        }

        if automation.poll_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "automation.poll_interval_ms",
                "Poll interval must be greater than 0",
            ));
        }

        for (name, selectors) in automation.selectors.entries() {
            if selectors.iter().all(|s| s.trim().is_empty()) {
                result.add_error(ValidationError::new(
                    format!("automation.selectors.{}", name),
                    "At least one selector is required",
                ));
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
