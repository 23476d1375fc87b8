//! Environment File Parsing Service
//!
//! Domain service that loads `KEY=VALUE` environment files into an [`EnvironmentMap`].

use crate::domain::{DomainError, EnvironmentMap};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Environment File Parsing Service
///
/// Parses environment variable files in KEY=VALUE format:
/// - Comments (lines starting with #) and empty lines are ignored
/// - The first `=` separates key and value, so values may contain `=`
/// - Key and value are trimmed; quotes are kept verbatim
/// - Lines without `=` or with an empty key are skipped
pub struct EnvironmentFileParsingService;

impl EnvironmentFileParsingService {
    /// Load an environment file from disk
    ///
    /// A missing file is a valid state and yields an empty map. A file that exists
    /// but cannot be read is a configuration error.
    pub fn load(path: impl AsRef<Path>) -> Result<EnvironmentMap, DomainError> {
        let path = path.as_ref();

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(
                    file = %path.display(),
                    "Environment file not found, continuing without it"
                );
                return Ok(EnvironmentMap::new());
            }
            Err(e) => {
                return Err(DomainError::Configuration(format!(
                    "Failed to read environment file '{}': {}",
                    path.display(),
                    e
                )));
            }
        };

        let env = Self::parse_content(&contents);

        debug!(
            file = %path.display(),
            count = env.len(),
            "Loaded environment variables from file"
        );
        Ok(env)
    }

    /// Parse environment file content from a string
    ///
    /// Separated from file I/O to enable testing without filesystem.
    pub fn parse_content(content: &str) -> EnvironmentMap {
        let mut env_vars = HashMap::new();

        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match line.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    env_vars.insert(key.trim().to_string(), value.trim().to_string());
                }
                _ => {
                    debug!(
                        line = line_num + 1,
                        "Skipping malformed environment line (expected KEY=VALUE)"
                    );
                }
            }
        }

        EnvironmentMap::from(env_vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_content_basic() {
        let result = EnvironmentFileParsingService::parse_content("KEY1=value1\nKEY2=value2");

        assert_eq!(result.get("KEY1"), Some("value1"));
        assert_eq!(result.get("KEY2"), Some("value2"));
    }

    #[test]
    fn test_parse_content_comment_and_equals_in_value() {
        let content = "PORT=8080\n# comment\nDB_URL=postgres://a=b\n";
        let result = EnvironmentFileParsingService::parse_content(content);

        let expected: EnvironmentMap = [("PORT", "8080"), ("DB_URL", "postgres://a=b")]
            .into_iter()
            .collect();
        assert_eq!(result, expected);
    }

    #[test]
    fn test_parse_content_with_empty_lines() {
        let content = "KEY1=value1\n\n\nKEY2=value2\n\n";
        let result = EnvironmentFileParsingService::parse_content(content);

        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_parse_content_with_whitespace() {
        let content = "  KEY1  =  value1  \n  KEY2=value2\r\n\t# indented comment";
        let result = EnvironmentFileParsingService::parse_content(content);

        assert_eq!(result.len(), 2);
        assert_eq!(result.get("KEY1"), Some("value1"));
        assert_eq!(result.get("KEY2"), Some("value2"));
    }

    #[test]
    fn test_parse_content_empty_value() {
        let result = EnvironmentFileParsingService::parse_content("KEY1=");
        assert_eq!(result.get("KEY1"), Some(""));
    }

    #[test]
    fn test_parse_content_quotes_kept() {
        let result = EnvironmentFileParsingService::parse_content(r#"GREETING="hello world""#);
        assert_eq!(result.get("GREETING"), Some("\"hello world\""));
    }

    #[test]
    fn test_parse_content_malformed_lines_skipped() {
        let content = "INVALID_LINE\n=value\n   =other\nGOOD=yes";
        let result = EnvironmentFileParsingService::parse_content(content);

        assert_eq!(result.len(), 1);
        assert_eq!(result.get("GOOD"), Some("yes"));
    }

    #[test]
    fn test_parse_content_last_duplicate_wins() {
        let result = EnvironmentFileParsingService::parse_content("A=1\nA=2");
        assert_eq!(result.get("A"), Some("2"));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let result = EnvironmentFileParsingService::load(dir.path().join(".env")).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_load_is_idempotent() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "PORT=8080").unwrap();
        writeln!(file, "MODE=prod").unwrap();

        let first = EnvironmentFileParsingService::load(file.path()).unwrap();
        let second = EnvironmentFileParsingService::load(file.path()).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_load_directory_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EnvironmentFileParsingService::load(dir.path()).unwrap_err();
        assert!(matches!(err, DomainError::Configuration(_)));
    }
}
