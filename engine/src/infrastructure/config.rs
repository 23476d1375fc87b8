//! Declaration loading from YAML files
//!
//! A declaration lists the apps to supervise, either under an `apps:` key or as a
//! single bare app. Each app becomes one ProcessSpec; its environment file
//! defaults to `.env` next to the declaration.

use crate::constants::daemon::DEFAULT_ENV_FILE;
use crate::domain::{
    DomainError, EnvironmentFileParsingService, ProcessSpec, ProcessSpecBuildingService,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Top-level declaration
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub apps: Vec<AppConfig>,
}

/// App declaration from YAML (pm2 field names)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    /// Defaults to the file stem of `script`
    #[serde(default)]
    pub name: Option<String>,

    pub script: String,

    #[serde(default)]
    pub args: Option<ArgsConfig>,

    #[serde(default)]
    pub cwd: Option<String>,

    #[serde(default = "default_instances")]
    pub instances: u32,

    #[serde(default = "default_autorestart")]
    pub autorestart: bool,

    #[serde(default)]
    pub watch: bool,

    #[serde(default)]
    pub max_memory_restart: Option<MemoryConfig>,

    #[serde(default)]
    pub env_file: Option<String>,

    #[serde(default)]
    pub env: HashMap<String, serde_yaml::Value>,

    #[serde(default)]
    pub out_file: Option<String>,

    #[serde(default)]
    pub error_file: Option<String>,

    #[serde(default)]
    pub log_date_format: Option<String>,

    #[serde(default)]
    pub log_timestamps: bool,

    // Restart policy, milliseconds
    #[serde(default)]
    pub restart_delay: Option<u64>,

    #[serde(default)]
    pub exp_backoff_restart_delay: Option<u64>,

    #[serde(default)]
    pub restart_max_delay: Option<u64>,

    #[serde(default)]
    pub max_restarts: Option<u32>,

    #[serde(default)]
    pub min_uptime: Option<u64>,

    #[serde(default)]
    pub kill_timeout: Option<u64>,

    #[serde(default)]
    pub memory_sample_interval: Option<u64>,
}

/// `args` as a single command line or an explicit list
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ArgsConfig {
    Line(String),
    List(Vec<String>),
}

/// `max_memory_restart` as a byte count or a human size ("512M", "1G")
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum MemoryConfig {
    Bytes(u64),
    Human(String),
}

fn default_instances() -> u32 {
    1
}

fn default_autorestart() -> bool {
    true
}

impl AppConfig {
    /// Declared name, or the script's file stem
    pub fn resolved_name(&self) -> String {
        if let Some(ref name) = self.name {
            return name.clone();
        }

        Path::new(&self.script)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl Config {
    /// Load a declaration from a YAML file
    pub fn load(path: &str) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path, e))?;

        Self::parse(&contents).map_err(|e| format!("Invalid config file '{}': {}", path, e))
    }

    /// Parse a declaration from YAML text
    pub fn parse(contents: &str) -> Result<Self, String> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(contents).map_err(|e| format!("Failed to parse YAML: {}", e))?;

        let has_apps_key = match &value {
            serde_yaml::Value::Mapping(map) => map.contains_key("apps"),
            serde_yaml::Value::Null => return Err("Declaration is empty".to_string()),
            _ => return Err("Declaration must be a mapping".to_string()),
        };

        let config = if has_apps_key {
            serde_yaml::from_value::<Config>(value).map_err(|e| e.to_string())?
        } else {
            let app = serde_yaml::from_value::<AppConfig>(value).map_err(|e| e.to_string())?;
            Config { apps: vec![app] }
        };

        if config.apps.is_empty() {
            return Err("Declaration has no apps".to_string());
        }

        config.validate_no_duplicate_names()?;

        Ok(config)
    }

    fn validate_no_duplicate_names(&self) -> Result<(), String> {
        let mut seen_names = HashSet::new();
        for app in &self.apps {
            let name = app.resolved_name();
            if !seen_names.insert(name.clone()) {
                return Err(format!(
                    "Duplicate app name '{}' in configuration. Each app must have a unique name.",
                    name
                ));
            }
        }
        Ok(())
    }
}

/// Directory that relative paths of a declaration resolve against
fn declaration_dir(path: &Path) -> Result<PathBuf, DomainError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    if dir.is_absolute() {
        return Ok(dir);
    }

    std::env::current_dir()
        .map(|cwd| cwd.join(dir))
        .map_err(|e| DomainError::Io(format!("Failed to resolve current directory: {}", e)))
}

/// Load every app of a declaration as a ProcessSpec
///
/// Any invalid app fails the whole load: configuration errors are reported before
/// a single instance starts.
pub fn load_process_specs(config_path: &str) -> Result<Vec<ProcessSpec>, DomainError> {
    let config = Config::load(config_path).map_err(DomainError::Configuration)?;
    let base_dir = declaration_dir(Path::new(config_path))?;

    let mut specs = Vec::with_capacity(config.apps.len());
    for app in &config.apps {
        let env_file = base_dir.join(app.env_file.as_deref().unwrap_or(DEFAULT_ENV_FILE));
        let environment = EnvironmentFileParsingService::load(&env_file)?;
        debug!(
            process = %app.resolved_name(),
            env_file = %env_file.display(),
            count = environment.len(),
            "Loaded environment for app"
        );

        specs.push(ProcessSpecBuildingService::build(app, &environment, &base_dir)?);
    }

    info!(
        path = config_path,
        count = specs.len(),
        "Loaded process declarations"
    );
    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_apps_list() {
        let config = Config::parse(
            r#"
apps:
  - name: web
    script: node
    args: server.js
  - name: worker
    script: ./worker
    instances: 3
    autorestart: false
"#,
        )
        .unwrap();

        assert_eq!(config.apps.len(), 2);
        assert_eq!(config.apps[0].resolved_name(), "web");
        assert_eq!(
            config.apps[0].args,
            Some(ArgsConfig::Line("server.js".to_string()))
        );
        assert!(config.apps[0].autorestart);
        assert_eq!(config.apps[0].instances, 1);
        assert_eq!(config.apps[1].instances, 3);
        assert!(!config.apps[1].autorestart);
    }

    #[test]
    fn test_parse_single_app() {
        let config = Config::parse("script: /usr/bin/app.sh\nmax_memory_restart: 512M\n").unwrap();

        assert_eq!(config.apps.len(), 1);
        assert_eq!(config.apps[0].resolved_name(), "app");
        assert_eq!(
            config.apps[0].max_memory_restart,
            Some(MemoryConfig::Human("512M".to_string()))
        );
    }

    #[test]
    fn test_parse_memory_as_bytes() {
        let config = Config::parse("script: app\nmax_memory_restart: 1048576\n").unwrap();
        assert_eq!(
            config.apps[0].max_memory_restart,
            Some(MemoryConfig::Bytes(1_048_576))
        );
    }

    #[test]
    fn test_parse_duplicate_names() {
        let result = Config::parse(
            r#"
apps:
  - name: web
    script: node
  - name: web
    script: python
"#,
        );
        let err = result.unwrap_err();
        assert!(err.contains("Duplicate app name 'web'"));
    }

    #[test]
    fn test_parse_rejects_empty_and_scalar() {
        assert!(Config::parse("").is_err());
        assert!(Config::parse("apps: []\n").is_err());
        assert!(Config::parse("just a string").is_err());
    }

    #[test]
    fn test_parse_missing_script() {
        assert!(Config::parse("name: web\n").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/procsup.yaml").unwrap_err();
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_load_process_specs_merges_env_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(".env"),
            "PORT=8080\n# comment\nNODE_ENV=development\n",
        )
        .unwrap();
        let config_path = dir.path().join("procsup.yaml");
        fs::write(
            &config_path,
            r#"
apps:
  - name: api
    script: /bin/sleep
    args: "60"
    env:
      NODE_ENV: production
    out_file: ./logs/out.log
"#,
        )
        .unwrap();

        let specs = load_process_specs(config_path.to_str().unwrap()).unwrap();

        assert_eq!(specs.len(), 1);
        let spec = &specs[0];
        assert_eq!(spec.name(), "api");
        assert_eq!(spec.environment().get("PORT"), Some("8080"));
        assert_eq!(spec.environment().get("NODE_ENV"), Some("production"));
        assert_eq!(spec.working_directory(), dir.path());
        assert_eq!(
            spec.stdout().path(),
            Some(dir.path().join("logs/out.log").as_path())
        );
    }

    #[test]
    fn test_load_process_specs_custom_env_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("prod.env"), "DB_URL=postgres://a=b\n").unwrap();
        let config_path = dir.path().join("procsup.yaml");
        fs::write(
            &config_path,
            "name: api\nscript: /bin/true\nenv_file: prod.env\n",
        )
        .unwrap();

        let specs = load_process_specs(config_path.to_str().unwrap()).unwrap();
        assert_eq!(specs[0].environment().get("DB_URL"), Some("postgres://a=b"));
    }

    #[test]
    fn test_load_process_specs_without_env_file() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("procsup.yaml");
        fs::write(&config_path, "name: api\nscript: /bin/true\n").unwrap();

        let specs = load_process_specs(config_path.to_str().unwrap()).unwrap();
        assert!(specs[0].environment().is_empty());
    }

    #[test]
    fn test_load_process_specs_invalid_app_is_fatal() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("procsup.yaml");
        fs::write(&config_path, "name: api\nscript: /bin/true\ninstances: 0\n").unwrap();

        let err = load_process_specs(config_path.to_str().unwrap()).unwrap_err();
        assert!(err.is_fatal());
    }
}
