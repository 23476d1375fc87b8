//! Application-wide constants and default values
//!
//! Centralizes magic numbers and default configurations for better maintainability

/// Daemon configuration defaults
pub mod daemon {
    /// Declaration file used when `PROCSUP_CONFIG_FILE` is not set
    pub const DEFAULT_CONFIG_FILE: &str = "procsup.yaml";

    /// Default tracing filter
    pub const DEFAULT_LOG_LEVEL: &str = "info";

    /// Environment file looked up next to the declaration when `env_file` is absent
    pub const DEFAULT_ENV_FILE: &str = ".env";
}

/// Output capture defaults
pub mod output {
    /// How long a finished instance waits for its output pumps to drain (milliseconds)
    pub const PUMP_DRAIN_TIMEOUT_MS: u64 = 500;

    /// Read buffer size for raw output copies
    pub const COPY_BUFFER_SIZE: usize = 8 * 1024;
}
