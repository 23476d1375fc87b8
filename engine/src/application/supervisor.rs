//! Supervisor
//! Owns the lifecycle of every instance of one ProcessSpec
//!
//! Each slot (`0..instance_count`) is driven by its own task, which spawns the
//! child, races its exit against the memory watchdog and the stop signal, and
//! decides whether a replacement goes into the same slot. The instance table is
//! the only state shared between slot tasks and observers.
//!
//! `stop` takes the spawn gate exclusively before cancelling, so once it has
//! been issued no slot can begin a new spawn; spawns already in flight finish
//! first and are then terminated like any other live instance.

use crate::constants::output::PUMP_DRAIN_TIMEOUT_MS;
use crate::domain::constants::{SIGNAL_KILL, SIGNAL_TERMINATE, SPAWN_FAILURE_MIN_DELAY_MS};
use crate::domain::ports::{
    ProcessExecutor, ProcessExitHandle, ResourceUsageReader, SpawnConfig, SpawnResult,
};
use crate::domain::{
    DomainError, ExitReason, ExitStatus, MemoryBreach, MemoryWatchdog, ProcessInstance,
    ProcessSpec, RestartDecision,
};
use crate::infrastructure::{OutputPumps, OutputSink};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Lifecycle of the supervisor itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SupervisorState {
    /// Created, `start` not called yet
    Idle,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorState::Idle => write!(f, "idle"),
            SupervisorState::Running => write!(f, "running"),
            SupervisorState::Stopping => write!(f, "stopping"),
            SupervisorState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Keeps `instance_count` copies of one ProcessSpec alive
pub struct Supervisor {
    shared: Arc<Shared>,
    state: RwLock<SupervisorState>,
    tasks: Mutex<JoinSet<()>>,
}

impl Supervisor {
    pub fn new(
        spec: Arc<ProcessSpec>,
        executor: Arc<dyn ProcessExecutor>,
        usage_reader: Arc<dyn ResourceUsageReader>,
    ) -> Self {
        let sink = OutputSink::from_spec(&spec);
        Self {
            shared: Arc::new(Shared {
                spec,
                executor,
                usage_reader,
                sink,
                instances: RwLock::new(Vec::new()),
                spawn_gate: tokio::sync::RwLock::new(false),
                cancel: CancellationToken::new(),
            }),
            state: RwLock::new(SupervisorState::Idle),
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    pub fn name(&self) -> &str {
        self.shared.spec.name()
    }

    pub fn spec(&self) -> &ProcessSpec {
        &self.shared.spec
    }

    pub fn state(&self) -> SupervisorState {
        *self.state.read().unwrap()
    }

    /// Snapshot of every slot, ordered by slot index
    pub fn instances(&self) -> Vec<ProcessInstance> {
        self.shared.instances.read().unwrap().clone()
    }

    /// Number of instances currently holding a running process
    pub fn live_count(&self) -> usize {
        self.shared
            .instances
            .read()
            .unwrap()
            .iter()
            .filter(|instance| instance.is_live())
            .count()
    }

    /// Spawn every slot
    ///
    /// Returns once each slot has made its first spawn attempt. Spawn failures do
    /// not fail `start`; they are handled by the slot's restart policy.
    pub async fn start(&self) -> Result<(), DomainError> {
        {
            let mut state = self.state.write().unwrap();
            match *state {
                SupervisorState::Idle => *state = SupervisorState::Running,
                SupervisorState::Running => {
                    return Err(DomainError::AlreadyRunning(self.name().to_string()))
                }
                SupervisorState::Stopping | SupervisorState::Stopped => {
                    return Err(DomainError::AlreadyStopped(self.name().to_string()))
                }
            }
        }

        let count = self.shared.spec.instance_count() as usize;
        *self.shared.instances.write().unwrap() = (0..count).map(ProcessInstance::new).collect();

        info!(
            process = %self.name(),
            instances = count,
            restart_policy = %self.shared.spec.restart_policy(),
            "Starting supervisor"
        );

        let mut started = Vec::with_capacity(count);
        {
            let mut tasks = self.tasks.lock().await;
            for slot in 0..count {
                let (tx, rx) = oneshot::channel();
                started.push(rx);
                let shared = self.shared.clone();
                tasks.spawn(async move { shared.run_slot(slot, tx).await });
            }
        }

        for rx in started {
            // A closed channel means the slot task is gone; nothing left to wait for
            let _ = rx.await;
        }

        Ok(())
    }

    /// Stop every instance and cancel pending restarts
    ///
    /// Live instances and their process groups get SIGTERM, then SIGKILL after the
    /// spec's grace period.
    /// Returns once every slot task has finished. Stopping twice is a no-op.
    pub async fn stop(&self) -> Result<(), DomainError> {
        {
            let mut state = self.state.write().unwrap();
            match *state {
                SupervisorState::Running => *state = SupervisorState::Stopping,
                SupervisorState::Idle => *state = SupervisorState::Stopped,
                SupervisorState::Stopping | SupervisorState::Stopped => return Ok(()),
            }
        }

        info!(process = %self.name(), "Stopping supervisor");

        // Waits for in-flight spawns; no spawn starts after this
        *self.shared.spawn_gate.write().await = true;
        self.shared.cancel.cancel();

        let mut tasks = self.tasks.lock().await;
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                error!(process = %self.name(), error = %e, "Slot task panicked");
            }
        }

        *self.state.write().unwrap() = SupervisorState::Stopped;
        info!(process = %self.name(), "Supervisor stopped");
        Ok(())
    }
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("name", &self.name())
            .field("state", &self.state())
            .finish()
    }
}

// ============================================================================
// Slot tasks
// ============================================================================

struct Shared {
    spec: Arc<ProcessSpec>,
    executor: Arc<dyn ProcessExecutor>,
    usage_reader: Arc<dyn ResourceUsageReader>,
    sink: OutputSink,
    instances: RwLock<Vec<ProcessInstance>>,
    /// `true` once stop has been issued
    spawn_gate: tokio::sync::RwLock<bool>,
    cancel: CancellationToken,
}

enum SpawnOutcome {
    Spawned(SpawnResult, OutputPumps),
    Failed,
    Gated,
}

enum RunOutcome {
    Exited(Result<ExitStatus, DomainError>),
    MemoryExceeded(MemoryBreach),
    Cancelled,
}

impl Shared {
    fn with_instance<R>(&self, slot: usize, f: impl FnOnce(&mut ProcessInstance) -> R) -> R {
        let mut instances = self.instances.write().unwrap();
        f(&mut instances[slot])
    }

    fn transition(
        &self,
        slot: usize,
        f: impl FnOnce(&mut ProcessInstance) -> Result<(), DomainError>,
    ) {
        if let Err(e) = self.with_instance(slot, f) {
            error!(
                process = %self.spec.name(),
                slot = slot,
                error = %e,
                "Rejected instance state transition"
            );
        }
    }

    async fn run_slot(&self, slot: usize, started: oneshot::Sender<()>) {
        let mut started = Some(started);

        loop {
            let outcome = self.spawn_instance(slot).await;
            if let Some(tx) = started.take() {
                let _ = tx.send(());
            }

            let keep_going = match outcome {
                SpawnOutcome::Gated => false,
                SpawnOutcome::Failed => self.handle_spawn_failure(slot).await,
                SpawnOutcome::Spawned(result, pumps) => self.supervise(slot, result, pumps).await,
            };

            if !keep_going {
                break;
            }
        }

        debug!(process = %self.spec.name(), slot = slot, "Slot task finished");
    }

    /// Spawn into a slot in `Starting`, leaving it `Running`, `Failed` or `Stopped`
    async fn spawn_instance(&self, slot: usize) -> SpawnOutcome {
        let stopping = self.spawn_gate.read().await;
        if *stopping {
            debug!(process = %self.spec.name(), slot = slot, "Spawn skipped, supervisor is stopping");
            self.transition(slot, |instance| instance.mark_stopped(None));
            return SpawnOutcome::Gated;
        }

        let outputs = match self.sink.open().await {
            Ok(outputs) => outputs,
            Err(e) => return self.spawn_failed(slot, e),
        };

        match self.executor.spawn(SpawnConfig::from_spec(&self.spec)).await {
            Ok(mut result) => {
                let pid = result.pid;
                self.transition(slot, |instance| instance.mark_running(pid));
                info!(
                    process = %self.spec.name(),
                    slot = slot,
                    pid = pid,
                    "Instance running"
                );
                let pumps = outputs.attach(result.stdout.take(), result.stderr.take());
                SpawnOutcome::Spawned(result, pumps)
            }
            Err(e) => self.spawn_failed(slot, e),
        }
    }

    fn spawn_failed(&self, slot: usize, e: DomainError) -> SpawnOutcome {
        error!(
            process = %self.spec.name(),
            slot = slot,
            error = %e,
            "Failed to start instance"
        );
        self.transition(slot, |instance| instance.mark_spawn_failed(e.to_string()));
        SpawnOutcome::Failed
    }

    async fn handle_spawn_failure(&self, slot: usize) -> bool {
        let failures = self.with_instance(slot, |instance| instance.consecutive_failures());
        match self.spec.restart_policy().decide(failures) {
            RestartDecision::Restart(delay) => {
                let delay = delay.max(Duration::from_millis(SPAWN_FAILURE_MIN_DELAY_MS));
                self.restart_after(slot, delay).await
            }
            RestartDecision::Disabled => false,
            RestartDecision::LimitReached => {
                error!(
                    process = %self.spec.name(),
                    slot = slot,
                    consecutive_failures = failures,
                    "Restart limit reached, giving up on slot"
                );
                false
            }
        }
    }

    /// Watch a running instance until it exits; returns whether the slot continues
    async fn supervise(&self, slot: usize, result: SpawnResult, pumps: OutputPumps) -> bool {
        let SpawnResult {
            pid,
            mut exit_handle,
            ..
        } = result;
        let watchdog = self.spec.memory_ceiling().map(|ceiling| {
            MemoryWatchdog::new(
                self.usage_reader.clone(),
                ceiling,
                self.spec.memory_sample_interval(),
            )
        });

        let outcome = tokio::select! {
            result = &mut exit_handle => RunOutcome::Exited(result),
            breach = watch_memory(watchdog.as_ref(), pid) => RunOutcome::MemoryExceeded(breach),
            _ = self.cancel.cancelled() => RunOutcome::Cancelled,
        };

        let drain_timeout = Duration::from_millis(PUMP_DRAIN_TIMEOUT_MS);
        let (result, reason) = match outcome {
            RunOutcome::Cancelled => {
                self.transition(slot, |instance| instance.mark_stopping());
                let status = self.terminate(pid, exit_handle).await;
                pumps.finish(drain_timeout).await;
                self.transition(slot, |instance| instance.mark_stopped(status));
                info!(
                    process = %self.spec.name(),
                    slot = slot,
                    pid = pid,
                    "Instance stopped"
                );
                return false;
            }
            RunOutcome::MemoryExceeded(breach) => {
                warn!(
                    process = %self.spec.name(),
                    slot = slot,
                    pid = pid,
                    resident_bytes = breach.resident_bytes,
                    ceiling_bytes = breach.ceiling_bytes,
                    "Memory ceiling exceeded, killing instance"
                );
                if let Err(e) = self.executor.kill(pid, SIGNAL_KILL).await {
                    debug!(pid = pid, error = %e, "SIGKILL after memory breach failed");
                }
                let reason = ExitReason::ResourceLimitExceeded {
                    resident_bytes: breach.resident_bytes,
                    ceiling_bytes: breach.ceiling_bytes,
                };
                (exit_handle.await, reason)
            }
            RunOutcome::Exited(result) => (result, ExitReason::Exited),
        };

        pumps.finish(drain_timeout).await;

        let status = match result {
            Ok(status) => Some(status),
            Err(e) => {
                warn!(
                    process = %self.spec.name(),
                    slot = slot,
                    pid = pid,
                    error = %e,
                    "Lost track of instance exit status"
                );
                None
            }
        };

        let policy = self.spec.restart_policy();
        let uptime = self
            .with_instance(slot, |instance| instance.uptime())
            .unwrap_or_default();
        let stable = policy.is_stable_run(uptime);
        let failures = self.with_instance(slot, |instance| {
            instance.record_exit(status, reason.clone(), stable);
            instance.consecutive_failures()
        });

        let runtime_exit = reason.to_error(status);

        // The exit raced with stop; nothing is replaced after stop
        if self.cancel.is_cancelled() {
            info!(
                process = %self.spec.name(),
                slot = slot,
                pid = pid,
                reason = %runtime_exit,
                "Instance exited during shutdown"
            );
            self.transition(slot, |instance| instance.mark_stopping());
            self.transition(slot, |instance| instance.mark_stopped(None));
            return false;
        }

        match policy.decide(failures) {
            RestartDecision::Restart(delay) => {
                warn!(
                    process = %self.spec.name(),
                    slot = slot,
                    pid = pid,
                    reason = %runtime_exit,
                    uptime_ms = uptime.as_millis() as u64,
                    consecutive_failures = failures,
                    delay_ms = delay.as_millis() as u64,
                    "Instance exited, scheduling restart"
                );
                self.restart_after(slot, delay).await
            }
            RestartDecision::Disabled => {
                warn!(
                    process = %self.spec.name(),
                    slot = slot,
                    pid = pid,
                    reason = %runtime_exit,
                    "Instance exited, autorestart disabled"
                );
                self.transition(slot, |instance| instance.mark_failed());
                false
            }
            RestartDecision::LimitReached => {
                error!(
                    process = %self.spec.name(),
                    slot = slot,
                    pid = pid,
                    reason = %runtime_exit,
                    consecutive_failures = failures,
                    "Restart limit reached, giving up on slot"
                );
                self.transition(slot, |instance| instance.mark_failed());
                false
            }
        }
    }

    /// SIGTERM the process group, wait for the grace period, then SIGKILL it
    async fn terminate(
        &self,
        pid: u32,
        mut exit_handle: ProcessExitHandle,
    ) -> Option<ExitStatus> {
        if let Err(e) = self.executor.kill(pid, SIGNAL_TERMINATE).await {
            debug!(pid = pid, error = %e, "SIGTERM failed, process may already be gone");
        }

        let grace = self.spec.kill_timeout();
        match tokio::time::timeout(grace, &mut exit_handle).await {
            Ok(result) => result.ok(),
            Err(_) => {
                warn!(
                    process = %self.spec.name(),
                    pid = pid,
                    grace_ms = grace.as_millis() as u64,
                    "Instance ignored SIGTERM, sending SIGKILL"
                );
                if let Err(e) = self.executor.kill(pid, SIGNAL_KILL).await {
                    debug!(pid = pid, error = %e, "SIGKILL failed");
                }
                exit_handle.await.ok()
            }
        }
    }

    /// Wait out the restart delay unless stop arrives first
    async fn restart_after(&self, slot: usize, delay: Duration) -> bool {
        self.transition(slot, |instance| instance.mark_restarting());

        let cancelled = tokio::select! {
            _ = tokio::time::sleep(delay) => false,
            _ = self.cancel.cancelled() => true,
        };

        if cancelled {
            debug!(process = %self.spec.name(), slot = slot, "Pending restart cancelled");
            self.transition(slot, |instance| instance.mark_stopped(None));
            return false;
        }

        self.transition(slot, |instance| instance.mark_starting());
        true
    }
}

async fn watch_memory(watchdog: Option<&MemoryWatchdog>, pid: u32) -> MemoryBreach {
    match watchdog {
        Some(watchdog) => watchdog.watch(pid).await,
        None => std::future::pending().await,
    }
}
