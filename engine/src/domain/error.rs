//! Domain-level errors
//! Configuration errors are fatal for a spec; everything else is handled per instance

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    // Configuration errors
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    // Instance errors
    #[error("Failed to spawn '{command}': {reason}")]
    Spawn { command: String, reason: String },

    #[error("Process exited: {0}")]
    RuntimeExit(String),

    #[error("Resident memory {resident_bytes} bytes exceeds ceiling of {ceiling_bytes} bytes")]
    ResourceLimitExceeded {
        resident_bytes: u64,
        ceiling_bytes: u64,
    },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // Infrastructure errors
    #[error("Failed to send signal {signal} to PID {pid}: {reason}")]
    Signal { pid: u32, signal: i32, reason: String },

    #[error("I/O error: {0}")]
    Io(String),

    // Supervisor errors
    #[error("Supervisor for '{0}' is already running")]
    AlreadyRunning(String),

    #[error("Supervisor for '{0}' has been stopped")]
    AlreadyStopped(String),
}

impl DomainError {
    /// Shorthand used by the configuration layers
    pub fn configuration(message: impl Into<String>) -> Self {
        DomainError::Configuration(message.into())
    }

    /// Whether this error must abort startup before any instance is spawned
    pub fn is_fatal(&self) -> bool {
        matches!(self, DomainError::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
