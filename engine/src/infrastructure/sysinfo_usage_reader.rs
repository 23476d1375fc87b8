//! Resident memory reader backed by sysinfo

use crate::domain::ports::ResourceUsageReader;
use std::sync::Mutex;
use sysinfo::{Pid, System};

/// Reads per-process resident memory through a shared `sysinfo::System`
pub struct SysinfoUsageReader {
    system: Mutex<System>,
}

impl SysinfoUsageReader {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SysinfoUsageReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceUsageReader for SysinfoUsageReader {
    fn resident_memory(&self, pid: u32) -> Option<u64> {
        let pid = Pid::from_u32(pid);
        let mut system = self.system.lock().unwrap();

        if !system.refresh_process(pid) {
            return None;
        }

        // Already in bytes
        system.process(pid).map(|process| process.memory())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_own_memory() {
        let reader = SysinfoUsageReader::new();
        let resident = reader.resident_memory(std::process::id());
        assert!(matches!(resident, Some(bytes) if bytes > 0));
    }

    #[test]
    fn test_unknown_pid() {
        let reader = SysinfoUsageReader::new();
        assert_eq!(reader.resident_memory(i32::MAX as u32), None);
    }
}
