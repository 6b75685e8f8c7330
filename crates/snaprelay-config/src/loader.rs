//! Configuration loader.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::schema::Config;

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file. A leading `~` is expanded.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let path = PathBuf::from(Self::expand_path(&path.to_string_lossy()));
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(&path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Load `path` when given, otherwise the default location if it exists,
    /// otherwise built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load(&path),
                _ => Ok(Config::default()),
            },
        }
    }

    /// `~/.snaprelay/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".snaprelay").join("config.toml"))
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = regex::Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.snaprelay`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.relay.port, 8765);
    }

    #[test]
    fn test_load_relay_section() {
        let content = r#"
            [relay]
            port = 9000
            max_reconnect_attempts = 3
            reconnect_delay_ms = 500
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.relay.port, 9000);
        assert_eq!(config.relay.max_reconnect_attempts, 3);
        assert_eq!(config.relay.reconnect_delay().as_millis(), 500);
        assert_eq!(config.relay.heartbeat_interval_secs, 5);
    }

    #[test]
    fn test_load_selector_overrides() {
        let content = r#"
            [automation]
            completion_timeout_secs = 30

            [automation.selectors]
            send_button = ["button.send", "button[type=submit]"]
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.automation.completion_timeout_secs, 30);
        assert_eq!(config.automation.selectors.send_button.len(), 2);
        assert!(!config.automation.selectors.prompt_input.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[browser]").unwrap();
        writeln!(file, "cdp_endpoint = \"http://127.0.0.1:9333\"").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.browser.cdp_endpoint, "http://127.0.0.1:9333");
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/config.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_or_default_with_explicit_missing_path() {
        let result = ConfigLoader::load_or_default(Some(Path::new("/nonexistent/snaprelay.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: This test runs in isolation and sets a unique test-only env var
        unsafe {
            std::env::set_var("SNAPRELAY_TEST_CDP", "http://10.0.0.2:9222");
        }
        let content = "[browser]\ncdp_endpoint = \"${SNAPRELAY_TEST_CDP}\"";
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.browser.cdp_endpoint, "http://10.0.0.2:9222");
        unsafe {
            std::env::remove_var("SNAPRELAY_TEST_CDP");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value = \"${NONEXISTENT_SNAPRELAY_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = ConfigLoader::expand_path("~/test");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/test"));
    }

    #[test]
    fn test_load_expands_tilde_in_path() {
        let Some(home) = dirs::home_dir().filter(|h| h.is_dir()) else {
            return;
        };
        let Ok(mut file) = NamedTempFile::new_in(&home) else {
            return;
        };
        writeln!(file, "[relay]").unwrap();
        writeln!(file, "port = 9100").unwrap();

        let name = file.path().file_name().unwrap().to_string_lossy().to_string();
        let tilde = format!("~/{}", name);
        let config = ConfigLoader::load_or_default(Some(Path::new(&tilde))).unwrap();
        assert_eq!(config.relay.port, 9100);
    }
}
