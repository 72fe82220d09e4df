//! Configuration management for Logmon.
//!
//! Loads settings from a TOML file or uses defaults. Lookup order:
//! explicit path, then $LOGMON_CONFIG, then /etc/logmon/config.toml.

use crate::error::ConfigError;
use crate::index_mapping::{default_bindings, IndexBinding, IndexMapping};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/logmon/config.toml";

/// Environment variable overriding the config path
pub const CONFIG_ENV: &str = "LOGMON_CONFIG";

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the daemon listens on
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:5000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Registry document location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_path")]
    pub path: PathBuf,
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("/config/monitors.json")
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: default_registry_path(),
        }
    }
}

/// Search cluster connection and retry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Base URL of the cluster HTTP API
    #[serde(default = "default_cluster_url")]
    pub url: String,

    /// Timeout for status probes (liveness and index existence)
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Timeout for each liveness attempt while provisioning
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,

    /// Liveness attempts before provisioning gives up
    #[serde(default = "default_liveness_attempts")]
    pub liveness_attempts: u32,

    /// Fixed sleep between liveness attempts
    #[serde(default = "default_liveness_interval")]
    pub liveness_interval_secs: u64,
}

fn default_cluster_url() -> String {
    "http://opensearch:9200".to_string()
}

fn default_probe_timeout() -> u64 {
    2
}

fn default_poll_timeout() -> u64 {
    10
}

fn default_liveness_attempts() -> u32 {
    5
}

fn default_liveness_interval() -> u64 {
    5
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            url: default_cluster_url(),
            probe_timeout_secs: default_probe_timeout(),
            poll_timeout_secs: default_poll_timeout(),
            liveness_attempts: default_liveness_attempts(),
            liveness_interval_secs: default_liveness_interval(),
        }
    }
}

impl ClusterConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    pub fn liveness_interval(&self) -> Duration {
        Duration::from_secs(self.liveness_interval_secs)
    }
}

/// External reconciliation job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(default = "default_job_program")]
    pub program: String,

    #[serde(default = "default_job_args")]
    pub args: Vec<String>,
}

fn default_job_program() -> String {
    "bash".to_string()
}

fn default_job_args() -> Vec<String> {
    vec!["/config/update_monitors.sh".to_string()]
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            program: default_job_program(),
            args: default_job_args(),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub cluster: ClusterConfig,

    #[serde(default)]
    pub job: JobConfig,

    /// Display name to physical index name table
    #[serde(default = "default_bindings")]
    pub indexes: Vec<IndexBinding>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            registry: RegistryConfig::default(),
            cluster: ClusterConfig::default(),
            job: JobConfig::default(),
            indexes: default_bindings(),
        }
    }
}

impl Config {
    /// Resolve the config path and load it, falling back to defaults when absent
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => std::env::var_os(CONFIG_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(CONFIG_PATH)),
        };

        if !path.exists() {
            warn!("Config not found at {}, using defaults", path.display());
            return Ok(Config::default());
        }

        Self::load_from_path(&path)
    }

    /// Load config from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Reject values that would make provisioning meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cluster.liveness_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "cluster.liveness_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.cluster.poll_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "cluster.poll_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        self.index_mapping().map(|_| ())
    }

    /// Build the immutable index mapping from the `[[indexes]]` table
    pub fn index_mapping(&self) -> Result<IndexMapping, ConfigError> {
        IndexMapping::new(self.indexes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.bind, "0.0.0.0:5000");
        assert_eq!(config.registry.path, PathBuf::from("/config/monitors.json"));
        assert_eq!(config.cluster.url, "http://opensearch:9200");
        assert_eq!(config.cluster.liveness_attempts, 5);
        assert_eq!(config.cluster.liveness_interval(), Duration::from_secs(5));
        assert_eq!(config.cluster.probe_timeout(), Duration::from_secs(2));
        assert_eq!(config.job.program, "bash");
        assert_eq!(config.indexes.len(), 3);
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[cluster]
url = "http://localhost:9200"
liveness_attempts = 3

[registry]
path = "/tmp/monitors.json"

[[indexes]]
display = "App"
physical = "app-logs"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.cluster.url, "http://localhost:9200");
        assert_eq!(config.cluster.liveness_attempts, 3);
        // Defaults for missing fields
        assert_eq!(config.cluster.liveness_interval_secs, 5);
        assert_eq!(config.server.bind, "0.0.0.0:5000");

        let mapping = config.index_mapping().unwrap();
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.resolve("App"), Some("app-logs"));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.cluster.liveness_attempts, 5);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[cluster\nurl = ").unwrap();
        let result = Config::load(Some(&path));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_zero_liveness_attempts_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[cluster]\nliveness_attempts = 0\n").unwrap();
        let result = Config::load(Some(&path));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "cluster.liveness_attempts",
                ..
            })
        ));
    }

    #[test]
    fn test_duplicate_index_is_rejected_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[[indexes]]\ndisplay = \"A\"\nphysical = \"a\"\n\n[[indexes]]\ndisplay = \"A\"\nphysical = \"b\"\n",
        )
        .unwrap();
        assert!(matches!(
            Config::load(Some(&path)),
            Err(ConfigError::DuplicateIndex(_))
        ));
    }
}
