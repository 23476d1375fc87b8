//! InstanceState value object
//! Represents the lifecycle state of one process instance

use serde::{Deserialize, Serialize};
use std::fmt;

/// The state of an instance in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum InstanceState {
    /// Spawn requested, the OS has not confirmed the process yet
    #[default]
    Starting,

    /// Process is running normally
    Running,

    /// Termination requested by the supervisor
    Stopping,

    /// Process was stopped on request (terminal)
    Stopped,

    /// Process exited unexpectedly and a replacement is pending
    Restarting,

    /// Process exited or could not be spawned and will not be replaced
    Failed,
}

impl InstanceState {
    /// Check if the instance holds a live process
    pub fn is_live(&self) -> bool {
        matches!(self, InstanceState::Running | InstanceState::Stopping)
    }

    /// Check if the instance slot has finished for good
    pub fn is_terminal(&self) -> bool {
        matches!(self, InstanceState::Stopped | InstanceState::Failed)
    }

    /// Validate state transition
    pub fn can_transition_to(&self, new_state: InstanceState) -> bool {
        use InstanceState::*;

        match (self, new_state) {
            // From Starting
            (Starting, Running) => true,
            (Starting, Failed) => true,  // Spawn refused by the OS
            (Starting, Stopped) => true, // Stop issued before the spawn happened

            // From Running
            (Running, Stopping) => true,
            (Running, Restarting) => true, // Unexpected exit with autorestart
            (Running, Failed) => true,     // Exit without autorestart

            // From Stopping
            (Stopping, Stopped) => true,

            // From Restarting
            (Restarting, Starting) => true,
            (Restarting, Stopped) => true, // Stop cancels the pending restart

            // From Failed (spawn failures are retried like runtime exits)
            (Failed, Restarting) => true,

            // Same state is always allowed
            (a, b) if *a == b => true,

            // Everything else is invalid
            _ => false,
        }
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceState::Starting => write!(f, "starting"),
            InstanceState::Running => write!(f, "running"),
            InstanceState::Stopping => write!(f, "stopping"),
            InstanceState::Stopped => write!(f, "stopped"),
            InstanceState::Restarting => write!(f, "restarting"),
            InstanceState::Failed => write!(f, "failed"),
        }
    }
}
