//! ProcessSpec entity
//! Immutable declaration of how to launch and manage one process type

use crate::domain::constants::{
    DEFAULT_KILL_TIMEOUT_MS, DEFAULT_LOG_DATE_FORMAT, DEFAULT_MEMORY_SAMPLE_INTERVAL_MS,
};
use crate::domain::{ByteSize, DomainError, EnvironmentMap, OutputTarget, RestartPolicy};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Everything the supervisor needs to run `instance_count` copies of a program.
///
/// A spec is built once at startup and never mutated; changing configuration means
/// building a new spec and a new supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessSpec {
    name: String,
    executable: String,
    arguments: Vec<String>,
    working_directory: PathBuf,
    instance_count: u32,
    restart_policy: RestartPolicy,
    memory_ceiling: Option<ByteSize>,
    environment: EnvironmentMap,
    stdout: OutputTarget,
    stderr: OutputTarget,
    log_date_format: String,
    log_timestamps: bool,
    kill_timeout: Duration,
    memory_sample_interval: Duration,
    watch: bool,
}

impl ProcessSpec {
    pub fn builder(name: impl Into<String>, executable: impl Into<String>) -> ProcessSpecBuilder {
        ProcessSpecBuilder::new(name.into(), executable.into())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    pub fn args(&self) -> &[String] {
        &self.arguments
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }

    pub fn autorestart(&self) -> bool {
        self.restart_policy.autorestart
    }

    pub fn restart_policy(&self) -> &RestartPolicy {
        &self.restart_policy
    }

    pub fn memory_ceiling(&self) -> Option<ByteSize> {
        self.memory_ceiling
    }

    pub fn environment(&self) -> &EnvironmentMap {
        &self.environment
    }

    pub fn stdout(&self) -> &OutputTarget {
        &self.stdout
    }

    pub fn stderr(&self) -> &OutputTarget {
        &self.stderr
    }

    pub fn log_date_format(&self) -> &str {
        &self.log_date_format
    }

    /// Whether captured output lines are prefixed with a timestamp
    pub fn log_timestamps(&self) -> bool {
        self.log_timestamps
    }

    /// Grace period between SIGTERM and SIGKILL when stopping
    pub fn kill_timeout(&self) -> Duration {
        self.kill_timeout
    }

    pub fn memory_sample_interval(&self) -> Duration {
        self.memory_sample_interval
    }

    /// Declared file-watch flag; carried for completeness, no watcher is attached
    pub fn watch(&self) -> bool {
        self.watch
    }
}

/// Builder for [`ProcessSpec`]; validation happens in [`ProcessSpecBuilder::build`]
#[derive(Debug, Clone)]
pub struct ProcessSpecBuilder {
    spec: ProcessSpec,
}

impl ProcessSpecBuilder {
    fn new(name: String, executable: String) -> Self {
        Self {
            spec: ProcessSpec {
                name,
                executable,
                arguments: Vec::new(),
                working_directory: PathBuf::from("."),
                instance_count: 1,
                restart_policy: RestartPolicy::default(),
                memory_ceiling: None,
                environment: EnvironmentMap::new(),
                stdout: OutputTarget::Null,
                stderr: OutputTarget::Null,
                log_date_format: DEFAULT_LOG_DATE_FORMAT.to_string(),
                log_timestamps: false,
                kill_timeout: Duration::from_millis(DEFAULT_KILL_TIMEOUT_MS),
                memory_sample_interval: Duration::from_millis(DEFAULT_MEMORY_SAMPLE_INTERVAL_MS),
                watch: false,
            },
        }
    }

    pub fn args(mut self, args: Vec<String>) -> Self {
        self.spec.arguments = args;
        self
    }

    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spec.working_directory = dir.into();
        self
    }

    pub fn instances(mut self, count: u32) -> Self {
        self.spec.instance_count = count;
        self
    }

    pub fn autorestart(mut self, autorestart: bool) -> Self {
        self.spec.restart_policy.autorestart = autorestart;
        self
    }

    pub fn restart_policy(mut self, policy: RestartPolicy) -> Self {
        self.spec.restart_policy = policy;
        self
    }

    pub fn memory_ceiling(mut self, ceiling: Option<ByteSize>) -> Self {
        self.spec.memory_ceiling = ceiling;
        self
    }

    pub fn environment(mut self, environment: EnvironmentMap) -> Self {
        self.spec.environment = environment;
        self
    }

    pub fn stdout(mut self, target: OutputTarget) -> Self {
        self.spec.stdout = target;
        self
    }

    pub fn stderr(mut self, target: OutputTarget) -> Self {
        self.spec.stderr = target;
        self
    }

    pub fn log_date_format(mut self, format: impl Into<String>) -> Self {
        self.spec.log_date_format = format.into();
        self
    }

    pub fn log_timestamps(mut self, enabled: bool) -> Self {
        self.spec.log_timestamps = enabled;
        self
    }

    pub fn kill_timeout(mut self, timeout: Duration) -> Self {
        self.spec.kill_timeout = timeout;
        self
    }

    pub fn memory_sample_interval(mut self, interval: Duration) -> Self {
        self.spec.memory_sample_interval = interval;
        self
    }

    pub fn watch(mut self, watch: bool) -> Self {
        self.spec.watch = watch;
        self
    }

    pub fn build(self) -> Result<ProcessSpec, DomainError> {
        let spec = self.spec;

        if spec.name.trim().is_empty() {
            return Err(DomainError::configuration("Process name cannot be empty"));
        }

        if spec.executable.trim().is_empty() {
            return Err(DomainError::configuration(format!(
                "Process '{}' has an empty executable",
                spec.name
            )));
        }

        if spec.instance_count < 1 {
            return Err(DomainError::configuration(format!(
                "Process '{}' must have at least one instance",
                spec.name
            )));
        }

        if spec.memory_ceiling.is_some() && spec.memory_sample_interval.is_zero() {
            return Err(DomainError::configuration(format!(
                "Process '{}' has a memory ceiling but a zero sample interval",
                spec.name
            )));
        }

        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let spec = ProcessSpec::builder("api", "java").build().unwrap();

        assert_eq!(spec.name(), "api");
        assert_eq!(spec.executable(), "java");
        assert!(spec.args().is_empty());
        assert_eq!(spec.instance_count(), 1);
        assert!(spec.autorestart());
        assert_eq!(spec.memory_ceiling(), None);
        assert_eq!(spec.stdout(), &OutputTarget::Null);
        assert_eq!(spec.log_date_format(), "YYYY-MM-DD HH:mm:ss");
        assert_eq!(spec.kill_timeout(), Duration::from_secs(5));
        assert!(!spec.watch());
    }

    #[test]
    fn test_builder_full() {
        let env: EnvironmentMap = [("NODE_ENV", "production")].into_iter().collect();
        let spec = ProcessSpec::builder("api", "java")
            .args(vec!["-jar".to_string(), "app.jar".to_string()])
            .working_directory("/srv/api")
            .instances(3)
            .autorestart(false)
            .memory_ceiling(Some(ByteSize::from_bytes(1024)))
            .environment(env)
            .stdout(OutputTarget::File(PathBuf::from("/srv/api/out.log")))
            .stderr(OutputTarget::Inherit)
            .build()
            .unwrap();

        assert_eq!(spec.args(), &["-jar".to_string(), "app.jar".to_string()]);
        assert_eq!(spec.working_directory(), Path::new("/srv/api"));
        assert_eq!(spec.instance_count(), 3);
        assert!(!spec.autorestart());
        assert_eq!(spec.memory_ceiling().map(|c| c.bytes()), Some(1024));
        assert_eq!(spec.environment().get("NODE_ENV"), Some("production"));
        assert_eq!(spec.stderr(), &OutputTarget::Inherit);
    }

    #[test]
    fn test_empty_executable_rejected() {
        let err = ProcessSpec::builder("api", "  ").build().unwrap_err();
        assert!(matches!(err, DomainError::Configuration(_)));
        assert!(err.to_string().contains("empty executable"));
    }

    #[test]
    fn test_zero_instances_rejected() {
        let err = ProcessSpec::builder("api", "java")
            .instances(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, DomainError::Configuration(_)));
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(ProcessSpec::builder("", "java").build().is_err());
    }

    #[test]
    fn test_zero_sample_interval_with_ceiling_rejected() {
        let result = ProcessSpec::builder("api", "java")
            .memory_ceiling(Some(ByteSize::from_bytes(1)))
            .memory_sample_interval(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_serializes_resolved_fields() {
        let env: EnvironmentMap = [("PORT", "8080")].into_iter().collect();
        let spec = ProcessSpec::builder("api", "java")
            .memory_ceiling(Some(ByteSize::from_bytes(2048)))
            .environment(env)
            .build()
            .unwrap();

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["name"], "api");
        assert_eq!(json["instance_count"], 1);
        assert_eq!(json["memory_ceiling"], 2048);
        assert_eq!(json["environment"]["PORT"], "8080");
        assert_eq!(json["stdout"], "Null");
    }
}
