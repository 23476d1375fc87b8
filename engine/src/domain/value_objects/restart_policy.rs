//! RestartPolicy value object
//! Decides whether and when an unexpectedly exited instance is replaced

use crate::domain::constants::{
    DEFAULT_MIN_UPTIME_MS, DEFAULT_RESTART_DELAY_MS, DEFAULT_RESTART_MAX_DELAY_MS,
    RESTART_BACKOFF_BASE,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Policy for automatically restarting instances
///
/// The default is immediate, unlimited restarts. Delay, exponential backoff and a
/// cap on consecutive unstable restarts are opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartPolicy {
    /// Replace instances that exit unexpectedly
    pub autorestart: bool,

    /// Fixed delay before each restart
    pub restart_delay: Duration,

    /// Base delay for exponential backoff; overrides `restart_delay` when set
    pub exp_backoff_base: Option<Duration>,

    /// Upper bound for the backoff delay
    pub max_delay: Duration,

    /// Give up after this many consecutive unstable runs (None = unlimited)
    pub max_restarts: Option<u32>,

    /// A run at least this long counts as stable and resets the failure counter
    pub min_uptime: Duration,
}

/// Outcome of a restart decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    /// Spawn a replacement after this delay
    Restart(Duration),
    /// Autorestart is disabled
    Disabled,
    /// Too many consecutive unstable runs
    LimitReached,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            autorestart: true,
            restart_delay: Duration::from_millis(DEFAULT_RESTART_DELAY_MS),
            exp_backoff_base: None,
            max_delay: Duration::from_millis(DEFAULT_RESTART_MAX_DELAY_MS),
            max_restarts: None,
            min_uptime: Duration::from_millis(DEFAULT_MIN_UPTIME_MS),
        }
    }
}

impl RestartPolicy {
    pub fn never() -> Self {
        Self {
            autorestart: false,
            ..Self::default()
        }
    }

    pub fn with_autorestart(mut self, autorestart: bool) -> Self {
        self.autorestart = autorestart;
        self
    }

    pub fn with_restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = delay;
        self
    }

    pub fn with_exp_backoff(mut self, base: Duration) -> Self {
        self.exp_backoff_base = Some(base);
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_max_restarts(mut self, max_restarts: u32) -> Self {
        self.max_restarts = Some(max_restarts);
        self
    }

    pub fn with_min_uptime(mut self, min_uptime: Duration) -> Self {
        self.min_uptime = min_uptime;
        self
    }

    /// Whether a run of this length resets the consecutive failure counter
    pub fn is_stable_run(&self, uptime: Duration) -> bool {
        uptime >= self.min_uptime
    }

    /// Decide what to do after an unexpected exit
    ///
    /// `consecutive_failures` counts unstable runs in a row, including the one that
    /// just ended (0 when that run was stable).
    pub fn decide(&self, consecutive_failures: u32) -> RestartDecision {
        if !self.autorestart {
            return RestartDecision::Disabled;
        }

        if let Some(max) = self.max_restarts {
            if consecutive_failures > max {
                return RestartDecision::LimitReached;
            }
        }

        RestartDecision::Restart(self.calculate_delay(consecutive_failures))
    }

    /// Delay before the next restart
    pub fn calculate_delay(&self, consecutive_failures: u32) -> Duration {
        let Some(base) = self.exp_backoff_base else {
            return self.restart_delay;
        };

        if consecutive_failures == 0 {
            return base;
        }

        // Exponential backoff: base_delay * 2^(failures - 1), capped
        let exponent = (consecutive_failures - 1).min(31);
        let factor = (RESTART_BACKOFF_BASE as u64).saturating_pow(exponent);
        let millis = (base.as_millis() as u64).saturating_mul(factor);

        Duration::from_millis(millis).min(self.max_delay)
    }
}

impl fmt::Display for RestartPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.autorestart {
            return write!(f, "never");
        }

        match self.exp_backoff_base {
            Some(base) => write!(
                f,
                "always (backoff {}ms..{}ms",
                base.as_millis(),
                self.max_delay.as_millis()
            )?,
            None => write!(f, "always (delay {}ms", self.restart_delay.as_millis())?,
        }

        match self.max_restarts {
            Some(max) => write!(f, ", max {})", max),
            None => write!(f, ", unlimited)"),
        }
    }
}
