//! Exit status and exit reason value objects
//! Records how and why an instance stopped running

use crate::domain::constants::SUCCESS_EXIT_CODE;
use crate::domain::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

/// How a child process terminated, as reported by the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitStatus {
    /// Process called exit() with this code
    Code(i32),
    /// Process was terminated by this signal
    Signal(i32),
}

impl ExitStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ExitStatus::Code(SUCCESS_EXIT_CODE))
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            ExitStatus::Code(code) => Some(*code),
            ExitStatus::Signal(_) => None,
        }
    }

    pub fn signal(&self) -> Option<i32> {
        match self {
            ExitStatus::Code(_) => None,
            ExitStatus::Signal(signal) => Some(*signal),
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatus::Code(code) => write!(f, "exit code {}", code),
            ExitStatus::Signal(signal) => write!(f, "signal {}", signal),
        }
    }
}

/// Why an instance left the running state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    /// The process exited on its own (normally, with an error, or from a foreign signal)
    Exited,
    /// The OS refused to create the process
    SpawnFailed(String),
    /// The supervisor killed the process for exceeding its memory ceiling
    ResourceLimitExceeded {
        resident_bytes: u64,
        ceiling_bytes: u64,
    },
    /// The supervisor stopped the process on request
    Stopped,
}

impl ExitReason {
    /// Unexpected exits are eligible for restart
    pub fn is_unexpected(&self) -> bool {
        !matches!(self, ExitReason::Stopped)
    }

    /// The error an exit with this reason is reported as
    pub fn to_error(&self, status: Option<ExitStatus>) -> DomainError {
        match self {
            ExitReason::ResourceLimitExceeded {
                resident_bytes,
                ceiling_bytes,
            } => DomainError::ResourceLimitExceeded {
                resident_bytes: *resident_bytes,
                ceiling_bytes: *ceiling_bytes,
            },
            reason => {
                let exit = status.map_or_else(|| "unknown".to_string(), |s| s.to_string());
                DomainError::RuntimeExit(format!("{} ({})", exit, reason))
            }
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Exited => write!(f, "exited"),
            ExitReason::SpawnFailed(reason) => write!(f, "spawn failed: {}", reason),
            ExitReason::ResourceLimitExceeded {
                resident_bytes,
                ceiling_bytes,
            } => write!(
                f,
                "memory limit exceeded ({} > {} bytes)",
                resident_bytes, ceiling_bytes
            ),
            ExitReason::Stopped => write!(f, "stopped"),
        }
    }
}

/// Last recorded exit of an instance slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastExit {
    /// None when the process never started (spawn failure)
    pub status: Option<ExitStatus>,
    pub reason: ExitReason,
    pub at: SystemTime,
}

impl LastExit {
    pub fn new(status: Option<ExitStatus>, reason: ExitReason) -> Self {
        Self {
            status,
            reason,
            at: SystemTime::now(),
        }
    }
}

impl fmt::Display for LastExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} ({})", self.reason, status),
            None => write!(f, "{}", self.reason),
        }
    }
}
