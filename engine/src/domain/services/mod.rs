//! Domain Services
//!
//! Stateless logic that does not belong to a single entity or value object

pub mod environment_file_parsing_service;
pub mod log_timestamp;
pub mod memory_watchdog;
pub mod process_spec_building_service;

pub use environment_file_parsing_service::EnvironmentFileParsingService;
pub use log_timestamp::LogTimestampFormat;
pub use memory_watchdog::{MemoryBreach, MemoryWatchdog};
pub use process_spec_building_service::ProcessSpecBuildingService;
