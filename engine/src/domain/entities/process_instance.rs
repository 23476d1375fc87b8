//! ProcessInstance entity
//! Runtime record of the process occupying one supervisor slot

use crate::domain::{
    DomainError, ExitReason, ExitStatus, InstanceId, InstanceState, LastExit,
};
use serde::Serialize;
use std::time::{Duration, SystemTime};

/// One instance slot of a supervised spec.
///
/// Every spawn gets a fresh [`InstanceId`]; the slot index, restart count and
/// failure counter survive across replacements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessInstance {
    id: InstanceId,
    slot: usize,
    pid: Option<u32>,
    state: InstanceState,
    started_at: Option<SystemTime>,
    restarts: u32,
    consecutive_failures: u32,
    last_exit: Option<LastExit>,
}

impl ProcessInstance {
    /// New slot record, about to be spawned
    pub fn new(slot: usize) -> Self {
        Self {
            id: InstanceId::generate(),
            slot,
            pid: None,
            state: InstanceState::Starting,
            started_at: None,
            restarts: 0,
            consecutive_failures: 0,
            last_exit: None,
        }
    }

    // ===== Accessors =====

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn state(&self) -> InstanceState {
        self.state
    }

    pub fn started_at(&self) -> Option<SystemTime> {
        self.started_at
    }

    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn last_exit(&self) -> Option<&LastExit> {
        self.last_exit.as_ref()
    }

    pub fn is_live(&self) -> bool {
        self.state == InstanceState::Running && self.pid.is_some()
    }

    /// Time since the current process was spawned
    pub fn uptime(&self) -> Option<Duration> {
        self.started_at.and_then(|t| t.elapsed().ok())
    }

    // ===== State transitions =====

    fn transition(&mut self, to: InstanceState) -> Result<(), DomainError> {
        if !self.state.can_transition_to(to) {
            return Err(DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        self.state = to;
        Ok(())
    }

    /// Restarting -> Starting, with a fresh instance id
    pub fn mark_starting(&mut self) -> Result<(), DomainError> {
        self.transition(InstanceState::Starting)?;
        self.id = InstanceId::generate();
        self.pid = None;
        self.started_at = None;
        Ok(())
    }

    /// Starting -> Running once the OS reported a pid
    pub fn mark_running(&mut self, pid: u32) -> Result<(), DomainError> {
        self.transition(InstanceState::Running)?;
        self.pid = Some(pid);
        self.started_at = Some(SystemTime::now());
        Ok(())
    }

    /// Starting -> Failed when the OS refused to create the process
    pub fn mark_spawn_failed(&mut self, reason: impl Into<String>) -> Result<(), DomainError> {
        self.transition(InstanceState::Failed)?;
        self.pid = None;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_exit = Some(LastExit::new(None, ExitReason::SpawnFailed(reason.into())));
        Ok(())
    }

    /// Record an unexpected exit; the state is left for the restart decision
    ///
    /// `stable` is true when the run lasted long enough to reset the failure counter.
    pub fn record_exit(&mut self, status: Option<ExitStatus>, reason: ExitReason, stable: bool) {
        self.pid = None;
        self.consecutive_failures = if stable {
            0
        } else {
            self.consecutive_failures.saturating_add(1)
        };
        self.last_exit = Some(LastExit::new(status, reason));
    }

    /// Running | Failed -> Restarting
    pub fn mark_restarting(&mut self) -> Result<(), DomainError> {
        self.transition(InstanceState::Restarting)?;
        self.pid = None;
        self.restarts = self.restarts.saturating_add(1);
        Ok(())
    }

    /// Running -> Failed (terminal, no replacement)
    pub fn mark_failed(&mut self) -> Result<(), DomainError> {
        self.transition(InstanceState::Failed)?;
        self.pid = None;
        Ok(())
    }

    /// Running -> Stopping
    pub fn mark_stopping(&mut self) -> Result<(), DomainError> {
        self.transition(InstanceState::Stopping)
    }

    /// Stopping | Restarting | Starting -> Stopped
    pub fn mark_stopped(&mut self, status: Option<ExitStatus>) -> Result<(), DomainError> {
        self.transition(InstanceState::Stopped)?;
        self.pid = None;
        if status.is_some() || self.last_exit.is_none() {
            self.last_exit = Some(LastExit::new(status, ExitReason::Stopped));
        }
        Ok(())
    }
}
