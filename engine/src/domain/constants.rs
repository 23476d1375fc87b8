//! Domain Constants
//!
//! Common constants used throughout the domain layer

/// Exit code indicating successful process termination
pub const SUCCESS_EXIT_CODE: i32 = 0;

/// Signal sent to ask a process to terminate gracefully
pub const SIGNAL_TERMINATE: i32 = 15;

/// Signal sent to force a process to terminate
pub const SIGNAL_KILL: i32 = 9;

/// Default delay before a restart in milliseconds (immediate)
pub const DEFAULT_RESTART_DELAY_MS: u64 = 0;

/// Default cap for exponential restart backoff in milliseconds
pub const DEFAULT_RESTART_MAX_DELAY_MS: u64 = 15_000;

/// Exponential backoff base for restart delays
pub const RESTART_BACKOFF_BASE: u32 = 2;

/// A run at least this long resets the consecutive failure counter (milliseconds)
pub const DEFAULT_MIN_UPTIME_MS: u64 = 1_000;

/// Lower bound on the retry delay after a spawn failure (milliseconds)
pub const SPAWN_FAILURE_MIN_DELAY_MS: u64 = 100;

/// Default grace period between SIGTERM and SIGKILL on stop (milliseconds)
pub const DEFAULT_KILL_TIMEOUT_MS: u64 = 5_000;

/// Default interval between resident memory samples (milliseconds)
pub const DEFAULT_MEMORY_SAMPLE_INTERVAL_MS: u64 = 1_000;

/// Default timestamp format for log lines
pub const DEFAULT_LOG_DATE_FORMAT: &str = "YYYY-MM-DD HH:mm:ss";

/// Memory unit constants
pub const BYTES_PER_KB: u64 = 1024;
pub const BYTES_PER_MB: u64 = 1024 * 1024;
pub const BYTES_PER_GB: u64 = 1024 * 1024 * 1024;
pub const BYTES_PER_TB: u64 = 1024 * 1024 * 1024 * 1024;
