//! ByteSize value object
//! Human-readable byte counts such as "1G" or "512M"

use crate::domain::constants::{BYTES_PER_GB, BYTES_PER_KB, BYTES_PER_MB, BYTES_PER_TB};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ByteSize(u64);

impl ByteSize {
    pub fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> u64 {
        self.0
    }

    /// Parse a memory string to bytes
    /// Examples: "256M" -> 268435456, "1G" -> 1073741824, "512K" -> 524288, "1gb" -> 1073741824
    pub fn parse(input: &str) -> Result<Self, String> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err("Empty memory string".to_string());
        }

        let upper = trimmed.to_ascii_uppercase();
        let unit_part = upper.strip_suffix('B').unwrap_or(upper.as_str());

        let (value_str, multiplier) = if let Some(v) = unit_part.strip_suffix('K') {
            (v, BYTES_PER_KB)
        } else if let Some(v) = unit_part.strip_suffix('M') {
            (v, BYTES_PER_MB)
        } else if let Some(v) = unit_part.strip_suffix('G') {
            (v, BYTES_PER_GB)
        } else if let Some(v) = unit_part.strip_suffix('T') {
            (v, BYTES_PER_TB)
        } else {
            // No suffix, assume bytes
            (unit_part, 1_u64)
        };

        let value: u64 = value_str
            .trim()
            .parse()
            .map_err(|e| format!("Invalid memory value '{}': {}", input, e))?;

        value
            .checked_mul(multiplier)
            .map(Self)
            .ok_or_else(|| format!("Memory value '{}' is too large", input))
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0;
        if bytes >= BYTES_PER_GB && bytes % BYTES_PER_GB == 0 {
            write!(f, "{}G", bytes / BYTES_PER_GB)
        } else if bytes >= BYTES_PER_MB && bytes % BYTES_PER_MB == 0 {
            write!(f, "{}M", bytes / BYTES_PER_MB)
        } else if bytes >= BYTES_PER_KB && bytes % BYTES_PER_KB == 0 {
            write!(f, "{}K", bytes / BYTES_PER_KB)
        } else {
            write!(f, "{}B", bytes)
        }
    }
}
