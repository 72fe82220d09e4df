//! Cluster Probe - liveness and index existence checks
//!
//! Every outcome, including transport failures, is returned as a status value.
//! Index checks are only issued while the cluster reports running.

use crate::cluster::ClusterTransport;
use crate::index_mapping::IndexMapping;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Cluster liveness as seen by one GET on the base URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Liveness {
    Running,
    /// Cluster answered with a non-success status
    Unhealthy { status: u16 },
    /// Transport or timeout failure
    Unreachable { detail: String },
}

impl Liveness {
    pub fn is_running(&self) -> bool {
        matches!(self, Liveness::Running)
    }
}

impl fmt::Display for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Liveness::Running => write!(f, "Running"),
            Liveness::Unhealthy { status } => write!(f, "Unexpected response: HTTP {}", status),
            Liveness::Unreachable { detail } => write!(f, "Error: {}", detail),
        }
    }
}

/// Existence of one physical index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IndexStatus {
    Exists,
    NotFound,
    Error { detail: String },
}

impl fmt::Display for IndexStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexStatus::Exists => write!(f, "Exists"),
            IndexStatus::NotFound => write!(f, "Not found"),
            IndexStatus::Error { detail } => write!(f, "Error: {}", detail),
        }
    }
}

/// Status of one mapped index in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexState {
    pub display: String,
    pub physical: String,
    pub status: IndexStatus,
    /// Human-readable form of `status`
    pub label: String,
}

/// Point-in-time cluster view; never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterStatus {
    pub liveness: Liveness,
    /// Human-readable form of `liveness`
    pub liveness_label: String,
    /// Empty unless the cluster is running
    pub indexes: Vec<IndexState>,
}

impl ClusterStatus {
    /// Look up the status of a display name
    pub fn index(&self, display: &str) -> Option<&IndexStatus> {
        self.indexes
            .iter()
            .find(|s| s.display == display)
            .map(|s| &s.status)
    }
}

/// Liveness and existence checks with a short per-request timeout
#[derive(Clone)]
pub struct ClusterProbe {
    transport: Arc<dyn ClusterTransport>,
    timeout: Duration,
}

impl ClusterProbe {
    pub fn new(transport: Arc<dyn ClusterTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub fn check_liveness(&self) -> Liveness {
        match self.transport.ping(self.timeout) {
            Ok(reply) if reply.is_success() => Liveness::Running,
            Ok(reply) => Liveness::Unhealthy {
                status: reply.status,
            },
            Err(e) => Liveness::Unreachable {
                detail: e.to_string(),
            },
        }
    }

    pub fn check_index_exists(&self, physical: &str) -> IndexStatus {
        match self.transport.head_index(physical, self.timeout) {
            Ok(reply) if reply.is_success() => IndexStatus::Exists,
            Ok(reply) if reply.status == 404 => IndexStatus::NotFound,
            Ok(reply) => IndexStatus::Error {
                detail: format!("HTTP {}", reply.status),
            },
            Err(e) => IndexStatus::Error {
                detail: e.to_string(),
            },
        }
    }

    /// Liveness plus, when running, the existence of every mapped index
    pub fn snapshot(&self, mapping: &IndexMapping) -> ClusterStatus {
        let liveness = self.check_liveness();
        debug!("Cluster liveness: {}", liveness);

        let indexes = if liveness.is_running() {
            mapping
                .iter()
                .map(|binding| {
                    let status = self.check_index_exists(&binding.physical);
                    IndexState {
                        display: binding.display.clone(),
                        physical: binding.physical.clone(),
                        label: status.to_string(),
                        status,
                    }
                })
                .collect()
        } else {
            Vec::new()
        };

        ClusterStatus {
            liveness_label: liveness.to_string(),
            liveness,
            indexes,
        }
    }
}
