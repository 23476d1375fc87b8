//! OutputTarget value object
//! Where a child's stdout or stderr ends up

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OutputTarget {
    /// Append to a file, created if missing
    File(PathBuf),
    /// Share the supervisor's own stream
    Inherit,
    /// Discard
    #[default]
    Null,
}

impl OutputTarget {
    /// Parse a declaration value: a file path, "inherit", or "null"
    /// Relative paths are resolved against `base_dir` (the process working directory)
    pub fn parse(value: &str, base_dir: &Path) -> Self {
        match value.trim() {
            "" | "null" | "/dev/null" => OutputTarget::Null,
            "inherit" => OutputTarget::Inherit,
            path => {
                let path = Path::new(path);
                if path.is_absolute() {
                    OutputTarget::File(path.to_path_buf())
                } else {
                    OutputTarget::File(base_dir.join(path))
                }
            }
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            OutputTarget::File(path) => Some(path),
            _ => None,
        }
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputTarget::File(path) => write!(f, "{}", path.display()),
            OutputTarget::Inherit => write!(f, "inherit"),
            OutputTarget::Null => write!(f, "null"),
        }
    }
}
