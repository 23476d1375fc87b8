//! Tokio Process Executor
//! Real implementation of the ProcessExecutor port using tokio::process
//!
//! Children inherit the supervisor's environment plus the spec's EnvironmentMap.
//! Streams declared as files are piped so the supervisor can feed an OutputSink.
//!
//! Every child leads its own process group, so signals reach the processes it
//! starts and a terminal Ctrl-C aimed at the supervisor does not reach it.

use crate::domain::{
    ports::{OutputStream, ProcessExecutor, ProcessExitHandle, SpawnConfig, SpawnResult, StdioMode},
    DomainError, ExitStatus,
};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, error, info, warn};

#[cfg(unix)]
use std::os::unix::process::ExitStatusExt;

/// Tokio-based process executor
///
/// This adapter translates domain operations into actual system calls.
#[derive(Debug, Default)]
pub struct TokioProcessExecutor;

impl TokioProcessExecutor {
    pub fn new() -> Self {
        Self
    }

    fn stdio(mode: StdioMode) -> Stdio {
        match mode {
            StdioMode::Piped => Stdio::piped(),
            StdioMode::Inherit => Stdio::inherit(),
            StdioMode::Null => Stdio::null(),
        }
    }

    fn map_exit_status(status: std::process::ExitStatus) -> Result<ExitStatus, DomainError> {
        if let Some(code) = status.code() {
            return Ok(ExitStatus::Code(code));
        }

        #[cfg(unix)]
        if let Some(signal) = status.signal() {
            return Ok(ExitStatus::Signal(signal));
        }

        Err(DomainError::RuntimeExit(format!(
            "Unrecognised exit status: {}",
            status
        )))
    }

    fn create_exit_handle(mut child: Child, pid: u32) -> ProcessExitHandle {
        Box::pin(async move {
            match child.wait().await {
                Ok(status) => {
                    let status = Self::map_exit_status(status)?;
                    debug!(pid = pid, status = %status, "Process exited");
                    Ok(status)
                }
                Err(e) => {
                    error!(pid = pid, error = %e, "Failed to wait for process");
                    Err(DomainError::Io(format!("Failed to wait for process: {}", e)))
                }
            }
        })
    }
}

// ============================================================================
// ProcessExecutor Trait Implementation
// ============================================================================

#[async_trait]
impl ProcessExecutor for TokioProcessExecutor {
    async fn spawn(&self, config: SpawnConfig) -> Result<SpawnResult, DomainError> {
        info!(
            command = %config.command,
            args = ?config.args,
            "Spawning process"
        );

        if config.command.is_empty() {
            return Err(DomainError::Spawn {
                command: config.command,
                reason: "Empty command".to_string(),
            });
        }

        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args);

        if let Some(ref dir) = config.working_dir {
            debug!(working_dir = %dir, "Setting working directory");
            cmd.current_dir(dir);
        }

        if !config.env_vars.is_empty() {
            debug!(count = config.env_vars.len(), "Setting environment variables");
            cmd.envs(config.env_vars.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        // New process group led by the child (pgid == pid)
        #[cfg(unix)]
        cmd.process_group(0);

        cmd.stdin(Stdio::null());
        cmd.stdout(Self::stdio(config.stdout));
        cmd.stderr(Self::stdio(config.stderr));

        let mut child = cmd.spawn().map_err(|e| {
            error!(
                command = %config.command,
                error = %e,
                "Failed to spawn process"
            );
            DomainError::Spawn {
                command: config.command.clone(),
                reason: e.to_string(),
            }
        })?;

        // A child that was reaped before we asked has no pid left to supervise
        let pid = child.id().ok_or_else(|| DomainError::Spawn {
            command: config.command.clone(),
            reason: "Process exited before its pid could be read".to_string(),
        })?;

        let stdout = child
            .stdout
            .take()
            .map(|stream| Box::new(stream) as OutputStream);
        let stderr = child
            .stderr
            .take()
            .map(|stream| Box::new(stream) as OutputStream);

        info!(pid = pid, "Process spawned successfully");

        Ok(SpawnResult {
            pid,
            exit_handle: Self::create_exit_handle(child, pid),
            stdout,
            stderr,
        })
    }

    async fn kill(&self, pid: u32, signal: i32) -> Result<(), DomainError> {
        info!(pid = pid, signal = signal, "Killing process group");

        #[cfg(unix)]
        {
            if unsafe { libc::kill(-(pid as i32), signal) } == 0 {
                debug!(pid = pid, signal = signal, "Signal sent to process group");
                return Ok(());
            }

            // Not a group leader; signal the process alone
            let result = unsafe { libc::kill(pid as i32, signal) };
            if result != 0 {
                let err = std::io::Error::last_os_error();
                warn!(
                    pid = pid,
                    signal = signal,
                    error = %err,
                    "Failed to send signal to process"
                );
                return Err(DomainError::Signal {
                    pid,
                    signal,
                    reason: err.to_string(),
                });
            }
            debug!(pid = pid, signal = signal, "Signal sent successfully");
            Ok(())
        }

        #[cfg(not(unix))]
        {
            Err(DomainError::Signal {
                pid,
                signal,
                reason: "Signals are not supported on this platform".to_string(),
            })
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
