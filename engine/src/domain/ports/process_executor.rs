//! ProcessExecutor port
//! Interface for spawning and signalling system processes

use crate::domain::{DomainError, ExitStatus, OutputTarget, ProcessSpec};
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use tokio::io::AsyncRead;

/// How a child's standard stream is wired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioMode {
    /// Captured by the supervisor and handed to an output sink
    Piped,
    /// Shared with the supervisor
    Inherit,
    /// Discarded
    Null,
}

impl From<&OutputTarget> for StdioMode {
    fn from(target: &OutputTarget) -> Self {
        match target {
            OutputTarget::File(_) => StdioMode::Piped,
            OutputTarget::Inherit => StdioMode::Inherit,
            OutputTarget::Null => StdioMode::Null,
        }
    }
}

/// Configuration for spawning a process
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    pub command: String,
    pub args: Vec<String>,
    pub working_dir: Option<String>,
    pub env_vars: Vec<(String, String)>,
    pub stdout: StdioMode,
    pub stderr: StdioMode,
}

/// Handle for monitoring process exit
/// This allows event-driven monitoring without polling
pub type ProcessExitHandle = Pin<Box<dyn Future<Output = Result<ExitStatus, DomainError>> + Send>>;

/// A captured output stream of a child
pub type OutputStream = Box<dyn AsyncRead + Send + Unpin>;

/// Result of spawning a process
pub struct SpawnResult {
    pub pid: u32,
    /// Resolves once the process has exited and been reaped
    pub exit_handle: ProcessExitHandle,
    /// Present when stdout was spawned with [`StdioMode::Piped`]
    pub stdout: Option<OutputStream>,
    /// Present when stderr was spawned with [`StdioMode::Piped`]
    pub stderr: Option<OutputStream>,
}

impl std::fmt::Debug for SpawnResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpawnResult")
            .field("pid", &self.pid)
            .field("stdout", &self.stdout.is_some())
            .field("stderr", &self.stderr.is_some())
            .finish()
    }
}

/// Port for executing system processes
#[async_trait]
pub trait ProcessExecutor: Send + Sync {
    /// Spawn a new process
    ///
    /// Returns only once the OS has created the process image; failures to
    /// create it (missing executable, permission denied) are `DomainError::Spawn`.
    async fn spawn(&self, config: SpawnConfig) -> Result<SpawnResult, DomainError>;

    /// Send a signal to a spawned process and the processes it started
    async fn kill(&self, pid: u32, signal: i32) -> Result<(), DomainError>;
}

impl SpawnConfig {
    pub fn from_spec(spec: &ProcessSpec) -> Self {
        let env_vars: Vec<(String, String)> = spec
            .environment()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Self {
            command: spec.executable().to_string(),
            args: spec.args().to_vec(),
            working_dir: Some(spec.working_directory().to_string_lossy().into_owned()),
            env_vars,
            stdout: StdioMode::from(spec.stdout()),
            stderr: StdioMode::from(spec.stderr()),
        }
    }
}
