//! Infrastructure Layer
//!
//! Adapters implementing the domain ports against the real system.
//!
//! ## Adapters
//!
//! - `TokioProcessExecutor`: spawns and signals children with tokio
//! - `SysinfoUsageReader`: resident memory of a pid via sysinfo
//! - `OutputSink`: append-only files fed from a child's captured streams
//!
//! ## Usage
//!
//! ```rust,no_run
//! use procsup_engine::infrastructure::{SysinfoUsageReader, TokioProcessExecutor};
//! use std::sync::Arc;
//!
//! let executor = Arc::new(TokioProcessExecutor::new());
//! let usage_reader = Arc::new(SysinfoUsageReader::new());
//!
//! // Wire into a Supervisor...
//! ```

pub mod config;
pub mod output_sink;
pub mod sysinfo_usage_reader;
pub mod tokio_executor;

pub use config::{load_process_specs, AppConfig, ArgsConfig, Config, MemoryConfig};
pub use output_sink::{OpenOutputs, OutputPumps, OutputSink};
pub use sysinfo_usage_reader::SysinfoUsageReader;
pub use tokio_executor::TokioProcessExecutor;
