//! Daemon configuration from environment variables
//!
//! All configuration is read from environment variables with sensible defaults.
//! This eliminates the need for command-line argument parsing (clap dependency).

use procsup_engine::constants::daemon::{DEFAULT_CONFIG_FILE, DEFAULT_LOG_LEVEL};
use std::env;
use std::path::Path;

/// Daemon configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Declaration file path
    pub config_file: String,

    /// Tracing filter directive
    pub log_level: String,

    /// Log line format
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl DaemonConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            config_file: env::var("PROCSUP_CONFIG_FILE")
                .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string()),
            log_level: Self::parse_log_level(),
            log_format: Self::parse_log_format(),
        }
    }

    fn parse_log_level() -> String {
        // Priority: PROCSUP_LOG_LEVEL > RUST_LOG > default
        env::var("PROCSUP_LOG_LEVEL")
            .or_else(|_| env::var("RUST_LOG"))
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
    }

    fn parse_log_format() -> LogFormat {
        env::var("PROCSUP_LOG_FORMAT")
            .ok()
            .and_then(|s| match s.to_lowercase().as_str() {
                "json" => Some(LogFormat::Json),
                "text" => Some(LogFormat::Text),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.config_file.trim().is_empty() {
            return Err("PROCSUP_CONFIG_FILE cannot be empty".to_string());
        }
        if !Path::new(&self.config_file).is_file() {
            return Err(format!(
                "Declaration file '{}' does not exist (set PROCSUP_CONFIG_FILE)",
                self.config_file
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        env::remove_var("PROCSUP_CONFIG_FILE");
        env::remove_var("PROCSUP_LOG_LEVEL");
        env::remove_var("PROCSUP_LOG_FORMAT");
        env::remove_var("RUST_LOG");
    }

    #[test]
    #[serial]
    fn test_default_config() {
        clear_env();

        let config = DaemonConfig::from_env();
        assert_eq!(config.config_file, DEFAULT_CONFIG_FILE);
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    #[serial]
    fn test_custom_config_file() {
        clear_env();
        env::set_var("PROCSUP_CONFIG_FILE", "/etc/procsup/apps.yaml");

        let config = DaemonConfig::from_env();
        assert_eq!(config.config_file, "/etc/procsup/apps.yaml");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_log_level_priority() {
        clear_env();

        env::set_var("RUST_LOG", "warn");
        assert_eq!(DaemonConfig::from_env().log_level, "warn");

        env::set_var("PROCSUP_LOG_LEVEL", "debug");
        assert_eq!(DaemonConfig::from_env().log_level, "debug");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_log_format_parsing() {
        clear_env();

        env::set_var("PROCSUP_LOG_FORMAT", "JSON");
        assert_eq!(DaemonConfig::from_env().log_format, LogFormat::Json);

        env::set_var("PROCSUP_LOG_FORMAT", "bogus");
        assert_eq!(DaemonConfig::from_env().log_format, LogFormat::Text);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_validate() {
        clear_env();
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("procsup.yaml");
        std::fs::write(&path, "script: /bin/true\n").unwrap();

        env::set_var("PROCSUP_CONFIG_FILE", &path);
        assert!(DaemonConfig::from_env().validate().is_ok());

        env::set_var("PROCSUP_CONFIG_FILE", dir.path().join("missing.yaml"));
        assert!(DaemonConfig::from_env().validate().is_err());

        env::set_var("PROCSUP_CONFIG_FILE", "  ");
        assert!(DaemonConfig::from_env().validate().is_err());

        clear_env();
    }
}
