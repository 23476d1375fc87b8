//! Shared test utilities for E2E tests
//!
//! Every scenario drives real `/bin/sh` children through a [`Supervisor`] built on
//! the tokio executor. Memory readings are scripted through [`ScriptedUsage`] so a
//! breach can be triggered for one chosen pid.
//!
//! Set `RUST_LOG=procsup_engine=debug` to see the supervisor's logs for a failing test.

use procsup_engine::domain::ports::ResourceUsageReader;
use procsup_engine::domain::ProcessSpecBuilder;
use procsup_engine::infrastructure::{SysinfoUsageReader, TokioProcessExecutor};
use procsup_engine::{ProcessInstance, ProcessSpec, Supervisor};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const WAIT_TIMEOUT: Duration = Duration::from_secs(10);

// Runs before any test in every binary linking this library
#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Poll `condition` every 20ms until it holds or `timeout` elapses
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Spec builder running `script` with `/bin/sh -c`
pub fn shell_spec(name: &str, script: &str) -> ProcessSpecBuilder {
    ProcessSpec::builder(name, "/bin/sh").args(vec!["-c".to_string(), script.to_string()])
}

/// Supervisor on the real executor and sysinfo
pub fn supervisor(spec: ProcessSpec) -> Supervisor {
    Supervisor::new(
        Arc::new(spec),
        Arc::new(TokioProcessExecutor::new()),
        Arc::new(SysinfoUsageReader::new()),
    )
}

/// Supervisor on the real executor with scripted memory readings
pub fn supervisor_with_usage(spec: ProcessSpec, usage: Arc<ScriptedUsage>) -> Supervisor {
    Supervisor::new(Arc::new(spec), Arc::new(TokioProcessExecutor::new()), usage)
}

pub fn instance(supervisor: &Supervisor, slot: usize) -> ProcessInstance {
    supervisor.instances()[slot].clone()
}

/// Whether `pid` is a running process; unreaped zombies count as gone
pub fn pid_alive(pid: u32) -> bool {
    if unsafe { libc::kill(pid as i32, 0) } != 0 {
        return false;
    }
    std::fs::read_to_string(format!("/proc/{}/stat", pid))
        .map(|stat| {
            stat.rsplit_once(')')
                .map_or(true, |(_, rest)| !rest.trim_start().starts_with('Z'))
        })
        .unwrap_or(true)
}

/// Read a pid a child wrote to `path`, waiting for the file to appear
pub async fn read_pid_file(path: &Path) -> u32 {
    let mut pid = None;
    wait_until(WAIT_TIMEOUT, || {
        pid = std::fs::read_to_string(path)
            .ok()
            .and_then(|content| content.trim().parse().ok());
        pid.is_some()
    })
    .await;
    pid.unwrap_or_else(|| panic!("no pid written to {}", path.display()))
}

pub fn send_signal(pid: u32, signal: i32) {
    unsafe {
        libc::kill(pid as i32, signal);
    }
}

/// Number of lines in `path`, 0 if it does not exist
pub fn line_count(path: &Path) -> usize {
    std::fs::read_to_string(path)
        .map(|content| content.lines().count())
        .unwrap_or(0)
}

/// Resident memory readings chosen by the test
///
/// Unknown pids report a small footprint.
#[derive(Default)]
pub struct ScriptedUsage {
    readings: Mutex<HashMap<u32, u64>>,
}

impl ScriptedUsage {
    pub const BASELINE: u64 = 4 * 1024 * 1024;

    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, pid: u32, bytes: u64) {
        self.readings.lock().unwrap().insert(pid, bytes);
    }
}

impl ResourceUsageReader for ScriptedUsage {
    fn resident_memory(&self, pid: u32) -> Option<u64> {
        Some(
            self.readings
                .lock()
                .unwrap()
                .get(&pid)
                .copied()
                .unwrap_or(Self::BASELINE),
        )
    }
}
