//! Logmon Common - monitor registry and cluster provisioning core
//!
//! Shared by the `logmond` daemon and the `logmonctl` CLI.

pub mod cluster;
pub mod config;
pub mod console;
pub mod error;
pub mod index_mapping;
pub mod job;
pub mod probe;
pub mod provisioning;
pub mod registry;

pub use cluster::{ClusterReply, ClusterTransport, FakeClusterTransport, HttpClusterTransport};
pub use config::Config;
pub use console::{Console, JobStatus, RuleView};
pub use error::{ConfigError, LaunchFailure, RegistryError, TransportError};
pub use index_mapping::{IndexBinding, IndexMapping};
pub use job::{FakeJobRunner, JobRunner, ScriptJobRunner};
pub use probe::{ClusterProbe, ClusterStatus, IndexState, IndexStatus, Liveness};
pub use provisioning::{
    CreateResult, IndexOutcome, ProvisionPolicy, ProvisionReport, ProvisionState, Provisioner,
    RecordingSleeper, Sleeper, ThreadSleeper,
};
pub use registry::{MonitorRule, RegistryFile, RegistryStore};

/// Version of this build
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
