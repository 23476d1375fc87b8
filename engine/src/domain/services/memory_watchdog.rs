//! Memory Watchdog
//! Samples the resident memory of one process and reports a ceiling breach

use crate::domain::ports::ResourceUsageReader;
use crate::domain::ByteSize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::trace;

/// A sampled memory reading above the ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryBreach {
    pub resident_bytes: u64,
    pub ceiling_bytes: u64,
}

/// Watches one pid against a memory ceiling
pub struct MemoryWatchdog {
    reader: Arc<dyn ResourceUsageReader>,
    ceiling: ByteSize,
    interval: Duration,
}

impl MemoryWatchdog {
    pub fn new(reader: Arc<dyn ResourceUsageReader>, ceiling: ByteSize, interval: Duration) -> Self {
        Self {
            reader,
            ceiling,
            interval,
        }
    }

    /// Take a single sample
    pub fn check(&self, pid: u32) -> Option<MemoryBreach> {
        let resident_bytes = self.reader.resident_memory(pid)?;
        trace!(pid = pid, resident_bytes = resident_bytes, "Sampled resident memory");

        if resident_bytes > self.ceiling.bytes() {
            Some(MemoryBreach {
                resident_bytes,
                ceiling_bytes: self.ceiling.bytes(),
            })
        } else {
            None
        }
    }

    /// Sample every interval until the ceiling is exceeded
    ///
    /// Never resolves while the process stays under the ceiling or has vanished;
    /// callers race this against the process exit.
    pub async fn watch(&self, pid: u32) -> MemoryBreach {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Some(breach) = self.check(pid) {
                return breach;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FixedUsage(Mutex<HashMap<u32, u64>>);

    impl ResourceUsageReader for FixedUsage {
        fn resident_memory(&self, pid: u32) -> Option<u64> {
            self.0.lock().unwrap().get(&pid).copied()
        }
    }

    fn reader(entries: &[(u32, u64)]) -> Arc<FixedUsage> {
        Arc::new(FixedUsage(Mutex::new(entries.iter().copied().collect())))
    }

    #[test]
    fn test_check_under_and_over() {
        let usage = reader(&[(1, 100), (2, 101)]);
        let watchdog = MemoryWatchdog::new(usage, ByteSize::from_bytes(100), Duration::from_millis(10));

        // At the ceiling is fine, above is a breach
        assert_eq!(watchdog.check(1), None);
        assert_eq!(
            watchdog.check(2),
            Some(MemoryBreach {
                resident_bytes: 101,
                ceiling_bytes: 100
            })
        );
        // Unknown pid
        assert_eq!(watchdog.check(3), None);
    }

    #[tokio::test]
    async fn test_watch_resolves_on_growth() {
        let usage = reader(&[(7, 10)]);
        let watchdog = MemoryWatchdog::new(
            usage.clone(),
            ByteSize::from_bytes(50),
            Duration::from_millis(10),
        );

        let grower = {
            let usage = usage.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                usage.0.lock().unwrap().insert(7, 500);
            })
        };

        let breach = tokio::time::timeout(Duration::from_secs(2), watchdog.watch(7))
            .await
            .expect("watchdog should report the breach");
        assert_eq!(breach.resident_bytes, 500);
        grower.await.unwrap();
    }

    #[tokio::test]
    async fn test_watch_pending_under_ceiling() {
        let usage = reader(&[(7, 10)]);
        let watchdog = MemoryWatchdog::new(usage, ByteSize::from_bytes(50), Duration::from_millis(5));

        let result = tokio::time::timeout(Duration::from_millis(100), watchdog.watch(7)).await;
        assert!(result.is_err());
    }
}
