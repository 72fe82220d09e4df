//! Console - the action surface consumed by the daemon and CLI
//!
//! Wires the registry, probe, provisioning workflow and job runner together
//! behind one set of blocking operations. Registry errors propagate; cluster and
//! job failures come back as status values.

use crate::cluster::{ClusterTransport, HttpClusterTransport};
use crate::config::Config;
use crate::error::{ConfigError, RegistryError};
use crate::index_mapping::IndexMapping;
use crate::job::{JobRunner, ScriptJobRunner};
use crate::probe::{ClusterProbe, ClusterStatus};
use crate::provisioning::{ProvisionPolicy, ProvisionReport, Provisioner, Sleeper, ThreadSleeper};
use crate::registry::{MonitorRule, RegistryStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Status string for a successful job dispatch
pub const JOB_TRIGGERED: &str = "Job triggered successfully";

/// A rule as shown to the user, with its position and resolved index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleView {
    pub position: usize,
    pub rule: MonitorRule,
    /// Physical index backing `rule.index_key`; none when it does not resolve
    pub physical_index: Option<String>,
}

/// Result of a job trigger, as a status string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub dispatched: bool,
    pub status: String,
}

/// Monitor console operations
pub struct Console {
    registry: RegistryStore,
    mapping: IndexMapping,
    probe: ClusterProbe,
    provisioner: Provisioner,
    job: Arc<dyn JobRunner>,
}

impl Console {
    pub fn new(
        registry: RegistryStore,
        mapping: IndexMapping,
        probe: ClusterProbe,
        provisioner: Provisioner,
        job: Arc<dyn JobRunner>,
    ) -> Self {
        Self {
            registry,
            mapping,
            probe,
            provisioner,
            job,
        }
    }

    /// Build a console from configuration with an explicit transport and job runner
    pub fn with_parts(
        config: &Config,
        transport: Arc<dyn ClusterTransport>,
        job: Arc<dyn JobRunner>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mapping = config.index_mapping()?;
        let probe = ClusterProbe::new(transport.clone(), config.cluster.probe_timeout());
        let provisioner = Provisioner::new(
            transport,
            mapping.clone(),
            ProvisionPolicy::from(&config.cluster),
            sleeper,
        );
        Ok(Self::new(
            RegistryStore::new(config.registry.path.clone()),
            mapping,
            probe,
            provisioner,
            job,
        ))
    }

    /// Build the production console: HTTP transport, script job, real sleeps
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let transport = Arc::new(HttpClusterTransport::new(&config.cluster.url)?);
        let job = Arc::new(ScriptJobRunner::from(&config.job));
        Self::with_parts(config, transport, job, Arc::new(ThreadSleeper))
    }

    /// Longest any single action can block, bounded by the provisioning budget
    pub fn longest_action(&self) -> Duration {
        self.provisioner.worst_case_duration()
    }

    pub fn mapping(&self) -> &IndexMapping {
        &self.mapping
    }

    pub fn list_rules(&self) -> Result<Vec<RuleView>, RegistryError> {
        let rules = self.registry.load()?;
        Ok(rules
            .into_iter()
            .enumerate()
            .map(|(position, rule)| {
                let physical_index = self.mapping.resolve(&rule.index_key).map(str::to_string);
                if physical_index.is_none() {
                    warn!(
                        "Rule {} ({}) references unknown index {}",
                        position, rule.name, rule.index_key
                    );
                }
                RuleView {
                    position,
                    rule,
                    physical_index,
                }
            })
            .collect())
    }

    pub fn add_rule(&self, rule: MonitorRule) -> Result<(), RegistryError> {
        self.registry.append(rule)
    }

    pub fn replace_rule(&self, position: usize, rule: MonitorRule) -> Result<(), RegistryError> {
        self.registry.replace_at(position, rule)
    }

    pub fn delete_rule(&self, position: usize) -> Result<MonitorRule, RegistryError> {
        self.registry.remove_at(position)
    }

    pub fn cluster_status(&self) -> ClusterStatus {
        self.probe.snapshot(&self.mapping)
    }

    pub fn provision(&self) -> ProvisionReport {
        info!("Provisioning {} indexes", self.mapping.len());
        self.provisioner.run()
    }

    pub fn trigger_job(&self) -> JobStatus {
        match self.job.trigger() {
            Ok(()) => JobStatus {
                dispatched: true,
                status: JOB_TRIGGERED.to_string(),
            },
            Err(e) => {
                warn!("Job trigger failed: {}", e);
                JobStatus {
                    dispatched: false,
                    status: format!("Error: {}", e),
                }
            }
        }
    }
}
