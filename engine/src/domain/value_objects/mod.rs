pub mod byte_size;
pub mod environment_map;
pub mod exit_status;
pub mod instance_id;
pub mod instance_state;
pub mod output_target;
pub mod restart_policy;

pub use byte_size::ByteSize;
pub use environment_map::EnvironmentMap;
pub use exit_status::{ExitReason, ExitStatus, LastExit};
pub use instance_id::InstanceId;
pub use instance_state::InstanceState;
pub use output_target::OutputTarget;
pub use restart_policy::{RestartDecision, RestartPolicy};
