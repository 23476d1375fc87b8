pub mod process_executor;
pub mod resource_usage;

pub use process_executor::{
    OutputStream, ProcessExecutor, ProcessExitHandle, SpawnConfig, SpawnResult, StdioMode,
};
pub use resource_usage::ResourceUsageReader;
