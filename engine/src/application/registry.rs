//! Supervisor Registry
//! Composition root owning one Supervisor per declared app

use crate::application::{Supervisor, SupervisorState};
use crate::domain::ports::{ProcessExecutor, ResourceUsageReader};
use crate::domain::{DomainError, ProcessSpec};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info};

/// Starts and stops every supervisor of a declaration together
pub struct SupervisorRegistry {
    supervisors: Vec<Arc<Supervisor>>,
}

impl SupervisorRegistry {
    /// Create one supervisor per spec, sharing the executor and usage reader
    ///
    /// # Arguments
    ///
    /// * `specs` - Validated specs, names unique
    /// * `executor` - Process execution adapter
    /// * `usage_reader` - Resident memory adapter for memory ceilings
    pub fn from_specs(
        specs: Vec<ProcessSpec>,
        executor: Arc<dyn ProcessExecutor>,
        usage_reader: Arc<dyn ResourceUsageReader>,
    ) -> Self {
        let supervisors = specs
            .into_iter()
            .map(|spec| {
                Arc::new(Supervisor::new(
                    Arc::new(spec),
                    executor.clone(),
                    usage_reader.clone(),
                ))
            })
            .collect();

        Self { supervisors }
    }

    pub fn supervisors(&self) -> &[Arc<Supervisor>] {
        &self.supervisors
    }

    pub fn len(&self) -> usize {
        self.supervisors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.supervisors.is_empty()
    }

    /// Total running instances across all supervisors
    pub fn live_count(&self) -> usize {
        self.supervisors.iter().map(|s| s.live_count()).sum()
    }

    /// Start every supervisor in declaration order
    pub async fn start_all(&self) -> Result<(), DomainError> {
        for supervisor in &self.supervisors {
            supervisor.start().await?;
        }

        info!(
            supervisors = self.supervisors.len(),
            live = self.live_count(),
            "All supervisors started"
        );
        Ok(())
    }

    /// Stop every supervisor concurrently so grace periods overlap
    pub async fn stop_all(&self) {
        let mut stops = JoinSet::new();
        for supervisor in &self.supervisors {
            if supervisor.state() == SupervisorState::Stopped {
                continue;
            }
            let supervisor = supervisor.clone();
            stops.spawn(async move {
                if let Err(e) = supervisor.stop().await {
                    error!(process = %supervisor.name(), error = %e, "Failed to stop supervisor");
                }
            });
        }

        while let Some(result) = stops.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "Stop task panicked");
            }
        }

        info!("All supervisors stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{ProcessExitHandle, SpawnConfig, SpawnResult};
    use crate::domain::{ExitStatus, InstanceState};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Children run until signalled
    #[derive(Default)]
    struct MockExecutor {
        next_pid: AtomicU32,
        exits: std::sync::Mutex<std::collections::HashMap<u32, tokio::sync::oneshot::Sender<ExitStatus>>>,
    }

    #[async_trait]
    impl ProcessExecutor for MockExecutor {
        async fn spawn(&self, _config: SpawnConfig) -> Result<SpawnResult, DomainError> {
            let pid = 100 + self.next_pid.fetch_add(1, Ordering::SeqCst);
            let (tx, rx) = tokio::sync::oneshot::channel();
            self.exits.lock().unwrap().insert(pid, tx);
            let exit_handle: ProcessExitHandle = Box::pin(async move {
                rx.await
                    .map_err(|_| DomainError::Io("exit sender dropped".to_string()))
            });
            Ok(SpawnResult {
                pid,
                exit_handle,
                stdout: None,
                stderr: None,
            })
        }

        async fn kill(&self, pid: u32, signal: i32) -> Result<(), DomainError> {
            if let Some(tx) = self.exits.lock().unwrap().remove(&pid) {
                let _ = tx.send(ExitStatus::Signal(signal));
            }
            Ok(())
        }
    }

    struct NoUsage;

    impl ResourceUsageReader for NoUsage {
        fn resident_memory(&self, _pid: u32) -> Option<u64> {
            None
        }
    }

    fn registry() -> SupervisorRegistry {
        let specs = vec![
            ProcessSpec::builder("web", "/bin/web")
                .instances(2)
                .build()
                .unwrap(),
            ProcessSpec::builder("worker", "/bin/worker").build().unwrap(),
        ];
        SupervisorRegistry::from_specs(specs, Arc::new(MockExecutor::default()), Arc::new(NoUsage))
    }

    #[test]
    fn test_registry_creation() {
        let registry = registry();

        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
        let names: Vec<&str> = registry.supervisors().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["web", "worker"]);
        for supervisor in registry.supervisors() {
            assert_eq!(supervisor.state(), SupervisorState::Idle);
        }
    }

    #[tokio::test]
    async fn test_start_and_stop_all() {
        let registry = registry();

        registry.start_all().await.unwrap();
        assert_eq!(registry.live_count(), 3);

        registry.stop_all().await;
        assert_eq!(registry.live_count(), 0);
        for supervisor in registry.supervisors() {
            assert_eq!(supervisor.state(), SupervisorState::Stopped);
            assert!(supervisor
                .instances()
                .iter()
                .all(|instance| instance.state() == InstanceState::Stopped));
        }
    }

    #[tokio::test]
    async fn test_start_all_twice_fails() {
        let registry = registry();

        registry.start_all().await.unwrap();
        assert!(matches!(
            registry.start_all().await,
            Err(DomainError::AlreadyRunning(name)) if name == "web"
        ));

        registry.stop_all().await;
    }
}
