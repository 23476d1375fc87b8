//! Shutdown signals
//!
//! Handlers are installed before any child is spawned so a SIGTERM that arrives
//! during startup is queued instead of killing the daemon outright.

use tokio::signal::unix::{signal, Signal, SignalKind};

pub struct ShutdownSignals {
    sigint: Signal,
    sigterm: Signal,
}

impl ShutdownSignals {
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
        })
    }

    /// Wait for SIGINT or SIGTERM and return its name
    pub async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.sigint.recv() => "SIGINT",
            _ = self.sigterm.recv() => "SIGTERM",
        }
    }
}
