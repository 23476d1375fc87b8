//! Application Layer
//!
//! Composition of domain services and infrastructure adapters into running
//! supervisors.

pub mod registry;
pub mod supervisor;

pub use registry::SupervisorRegistry;
pub use supervisor::{Supervisor, SupervisorState};
