//! ResourceUsageReader port
//! Interface for querying the memory footprint of a running process

/// Port for sampling process resource usage
pub trait ResourceUsageReader: Send + Sync {
    /// Resident set size of `pid` in bytes, or None if the process is gone
    fn resident_memory(&self, pid: u32) -> Option<u64>;
}
