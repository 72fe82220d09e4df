//! Error types for Logmon.
//!
//! Registry and configuration errors propagate to the caller. Cluster and job
//! failures are downgraded to status values before they reach the console, so
//! `TransportError` and `LaunchFailure` never cross that boundary as errors.

use std::path::PathBuf;
use thiserror::Error;

/// Registry store failures
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Registry storage error at {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Registry document at {} is malformed: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode registry document: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Position {position} is out of range (registry holds {len} rules)")]
    PositionOutOfRange { position: usize, len: usize },
}

impl RegistryError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RegistryError::Storage {
            path: path.into(),
            source,
        }
    }

    /// True for addressing errors (bad position), false for medium/document errors
    pub fn is_addressing(&self) -> bool {
        matches!(self, RegistryError::PositionOutOfRange { .. })
    }
}

/// Network or timeout failure talking to the search cluster
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

/// The external job could not be dispatched
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to launch `{program}`: {reason}")]
pub struct LaunchFailure {
    pub program: String,
    pub reason: String,
}

/// Configuration loading failures
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Duplicate index display name in mapping: {0}")]
    DuplicateIndex(String),

    #[error("Invalid cluster URL {url:?}: {reason}")]
    ClusterUrl { url: String, reason: String },

    #[error("Failed to create HTTP client: {0}")]
    HttpClient(String),

    #[error("Invalid config value {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
