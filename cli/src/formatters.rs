//! Output formatting utilities

use chrono::{DateTime, Local};
use colored::*;
use procsup_engine::domain::{ByteSize, OutputTarget, RestartPolicy};
use std::time::SystemTime;

/// Format a file modification time to human-readable date/time
pub fn format_timestamp(time: Option<SystemTime>) -> String {
    match time {
        Some(time) => DateTime::<Local>::from(time)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => "-".to_string(),
    }
}

pub fn format_memory(ceiling: Option<ByteSize>) -> String {
    ceiling.map_or_else(|| "-".to_string(), |c| c.to_string())
}

pub fn format_target(target: &OutputTarget) -> String {
    target.to_string()
}

/// Format the restart policy with appropriate color
pub fn format_restart(policy: &RestartPolicy) -> ColoredString {
    let text = policy.to_string();
    if !policy.autorestart {
        text.yellow()
    } else if policy.max_restarts.is_some() {
        text.cyan()
    } else {
        text.green()
    }
}

pub fn format_ok(message: &str) -> ColoredString {
    format!("✓ {}", message).green()
}

pub fn format_error(message: &str) -> ColoredString {
    format!("✗ {}", message).red()
}
