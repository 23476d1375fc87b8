pub mod constants;
pub mod entities;
pub mod error;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use entities::{ProcessInstance, ProcessSpec, ProcessSpecBuilder};
pub use error::{DomainError, Result};
pub use services::{
    EnvironmentFileParsingService, LogTimestampFormat, MemoryBreach, MemoryWatchdog,
    ProcessSpecBuildingService,
};
pub use value_objects::{
    ByteSize, EnvironmentMap, ExitReason, ExitStatus, InstanceId, InstanceState, LastExit,
    OutputTarget, RestartDecision, RestartPolicy,
};
