//! Process Spec Building Service
//! Translates a declared app plus its loaded environment into a domain ProcessSpec

use crate::domain::{
    ByteSize, DomainError, EnvironmentMap, OutputTarget, ProcessSpec, RestartPolicy,
};
use crate::infrastructure::config::{AppConfig, ArgsConfig, MemoryConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Service for building immutable process specs from declarations
pub struct ProcessSpecBuildingService;

impl ProcessSpecBuildingService {
    /// Merge static declared fields with a loaded environment
    ///
    /// Entries of `app.env` win over `loaded_env` on conflicting keys. Relative
    /// `cwd` values resolve against `base_dir` (the declaration's directory);
    /// relative log paths resolve against the working directory.
    pub fn build(
        app: &AppConfig,
        loaded_env: &EnvironmentMap,
        base_dir: &Path,
    ) -> Result<ProcessSpec, DomainError> {
        let name = app.resolved_name();

        let working_directory = match app.cwd.as_deref() {
            Some(cwd) => resolve(base_dir, cwd),
            None => base_dir.to_path_buf(),
        };

        let args = match &app.args {
            None => Vec::new(),
            Some(ArgsConfig::List(list)) => list.clone(),
            Some(ArgsConfig::Line(line)) => split_args(line).map_err(|e| {
                DomainError::Configuration(format!("Invalid args for '{}': {}", name, e))
            })?,
        };

        let fixed = app
            .env
            .iter()
            .map(|(key, value)| {
                env_value_to_string(value)
                    .map(|v| (key.clone(), v))
                    .ok_or_else(|| {
                        DomainError::Configuration(format!(
                            "Environment value for '{}' in '{}' must be a scalar",
                            key, name
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let environment = loaded_env.overlay(fixed);

        let memory_ceiling = match &app.max_memory_restart {
            None => None,
            Some(MemoryConfig::Bytes(bytes)) => Some(ByteSize::from_bytes(*bytes)),
            Some(MemoryConfig::Human(text)) => Some(ByteSize::parse(text).map_err(|e| {
                DomainError::Configuration(format!(
                    "Invalid max_memory_restart for '{}': {}",
                    name, e
                ))
            })?),
        };

        let stdout = app
            .out_file
            .as_deref()
            .map(|value| OutputTarget::parse(value, &working_directory))
            .unwrap_or_default();
        let stderr = app
            .error_file
            .as_deref()
            .map(|value| OutputTarget::parse(value, &working_directory))
            .unwrap_or_default();

        if app.watch {
            warn!(
                process = %name,
                "File watching is not supported; 'watch' is ignored"
            );
        }

        let mut builder = ProcessSpec::builder(name, app.script.clone())
            .args(args)
            .working_directory(working_directory)
            .instances(app.instances)
            .restart_policy(Self::parse_restart_policy(app))
            .memory_ceiling(memory_ceiling)
            .environment(environment)
            .stdout(stdout)
            .stderr(stderr)
            .log_timestamps(app.log_timestamps)
            .watch(app.watch);

        if let Some(ref format) = app.log_date_format {
            builder = builder.log_date_format(format.clone());
        }
        if let Some(ms) = app.kill_timeout {
            builder = builder.kill_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = app.memory_sample_interval {
            builder = builder.memory_sample_interval(Duration::from_millis(ms));
        }

        builder.build()
    }

    /// Parse restart settings from the declaration
    fn parse_restart_policy(app: &AppConfig) -> RestartPolicy {
        let mut policy = RestartPolicy::default().with_autorestart(app.autorestart);

        if let Some(ms) = app.restart_delay {
            policy = policy.with_restart_delay(Duration::from_millis(ms));
        }
        if let Some(ms) = app.exp_backoff_restart_delay {
            policy = policy.with_exp_backoff(Duration::from_millis(ms));
        }
        if let Some(ms) = app.restart_max_delay {
            policy = policy.with_max_delay(Duration::from_millis(ms));
        }
        if let Some(max) = app.max_restarts {
            policy = policy.with_max_restarts(max);
        }
        if let Some(ms) = app.min_uptime {
            policy = policy.with_min_uptime(Duration::from_millis(ms));
        }

        policy
    }
}

fn resolve(base: &Path, value: &str) -> PathBuf {
    let path = Path::new(value);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn env_value_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Null => Some(String::new()),
        _ => None,
    }
}

/// Split an argument line into words
///
/// Whitespace separates words; single quotes keep everything literally, double
/// quotes group words and honour backslash escapes, a bare backslash escapes the
/// next character.
pub fn split_args(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => current.push(ch),
                        None => return Err("unterminated single quote".to_string()),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(ch) => current.push(ch),
                            None => return Err("unterminated double quote".to_string()),
                        },
                        Some(ch) => current.push(ch),
                        None => return Err("unterminated double quote".to_string()),
                    }
                }
            }
            '\\' => {
                in_word = true;
                if let Some(ch) = chars.next() {
                    current.push(ch);
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }

    if in_word {
        words.push(current);
    }

    Ok(words)
}
