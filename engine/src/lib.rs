//! Process Supervisor Engine
//!
//! A library for supervising long-running child processes:
//! - Environment file loading and process declaration parsing
//! - Per-instance lifecycle tracking (start, monitor, stop)
//! - Automatic restarts with optional delay, backoff and caps
//! - Resident memory ceilings enforced by sampling
//! - Output capture to append-only log files

pub mod constants;

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{Supervisor, SupervisorRegistry, SupervisorState};
pub use domain::{
    DomainError, EnvironmentMap, InstanceState, ProcessInstance, ProcessSpec, RestartPolicy,
    Result,
};
