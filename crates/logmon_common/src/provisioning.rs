//! Provisioning Workflow - create every mapped index once the cluster is up
//!
//! Two phases driven by an explicit state machine:
//!
//! ```text
//! AwaitingLiveness { attempts_remaining } --running--> Provisioning { pending }
//!        |                                                   |
//!   budget exhausted                                   pending empty
//!        v                                                   v
//!   Aborted { reason }                              Completed { outcomes }
//! ```
//!
//! Liveness attempts are separated by a fixed interval (no sleep after the
//! last one). Once provisioning starts every index gets exactly one create
//! request and fails independently; already-created indexes are never rolled back.

use crate::cluster::{index_settings, ClusterTransport};
use crate::config::ClusterConfig;
use crate::index_mapping::{IndexBinding, IndexMapping};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Error type the cluster reports when the index is already there
const ALREADY_EXISTS: &str = "resource_already_exists_exception";

/// Blocking sleep used between liveness attempts
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the calling thread
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Records requested sleeps without waiting (for testing)
#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Retry and timeout knobs for one provisioning run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
    /// Per-request timeout for liveness polls and create requests
    pub request_timeout: Duration,
}

impl Default for ProvisionPolicy {
    fn default() -> Self {
        Self::from(&ClusterConfig::default())
    }
}

impl ProvisionPolicy {
    /// Longest a run can take: every poll and create timing out, plus the sleeps between polls
    pub fn worst_case(&self, index_count: usize) -> Duration {
        let index_count = u32::try_from(index_count).unwrap_or(u32::MAX);
        let requests = self.max_attempts.saturating_add(index_count);
        self.request_timeout
            .saturating_mul(requests)
            .saturating_add(self.interval.saturating_mul(self.max_attempts.saturating_sub(1)))
    }
}

impl From<&ClusterConfig> for ProvisionPolicy {
    fn from(config: &ClusterConfig) -> Self {
        Self {
            max_attempts: config.liveness_attempts,
            interval: config.liveness_interval(),
            request_timeout: config.poll_timeout(),
        }
    }
}

/// Result of the create request for one index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CreateResult {
    /// 200 or 201, or a 400 saying the index already exists
    Ready,
    /// Cluster answered with another status
    Rejected { status: u16, body: String },
    /// Request never got an answer
    Failed { detail: String },
}

/// Outcome line for one mapped index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOutcome {
    pub display: String,
    pub physical: String,
    #[serde(flatten)]
    pub result: CreateResult,
}

impl IndexOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.result, CreateResult::Ready)
    }
}

impl fmt::Display for IndexOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            CreateResult::Ready => write!(
                f,
                "Created or confirmed index {} (using {})",
                self.display, self.physical
            ),
            CreateResult::Rejected { body, .. } => {
                write!(f, "Failed to create index {}: {}", self.display, body)
            }
            CreateResult::Failed { detail } => {
                write!(f, "Error creating index {}: {}", self.display, detail)
            }
        }
    }
}

/// Workflow state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionState {
    AwaitingLiveness {
        attempts_made: u32,
        attempts_remaining: u32,
    },
    Provisioning {
        liveness_attempts: u32,
        pending: VecDeque<IndexBinding>,
        outcomes: Vec<IndexOutcome>,
    },
    Completed {
        liveness_attempts: u32,
        outcomes: Vec<IndexOutcome>,
    },
    Aborted {
        liveness_attempts: u32,
        reason: String,
    },
}

impl ProvisionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProvisionState::Completed { .. } | ProvisionState::Aborted { .. }
        )
    }
}

/// Summary returned to the console
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub liveness_attempts: u32,
    pub aborted: bool,
    pub outcomes: Vec<IndexOutcome>,
    /// One line per index, or a single line when aborted
    pub results: Vec<String>,
}

impl ProvisionReport {
    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }
}

/// Drives the provisioning state machine against a cluster
pub struct Provisioner {
    transport: Arc<dyn ClusterTransport>,
    mapping: IndexMapping,
    policy: ProvisionPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl Provisioner {
    pub fn new(
        transport: Arc<dyn ClusterTransport>,
        mapping: IndexMapping,
        policy: ProvisionPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            transport,
            mapping,
            policy,
            sleeper,
        }
    }

    /// Upper bound on the duration of [`Provisioner::run`]
    pub fn worst_case_duration(&self) -> Duration {
        self.policy.worst_case(self.mapping.len())
    }

    pub fn initial_state(&self) -> ProvisionState {
        ProvisionState::AwaitingLiveness {
            attempts_made: 0,
            attempts_remaining: self.policy.max_attempts,
        }
    }

    /// Advance one transition; terminal states are returned unchanged
    pub fn step(&self, state: ProvisionState) -> ProvisionState {
        match state {
            ProvisionState::AwaitingLiveness {
                attempts_made,
                attempts_remaining,
            } => self.poll_liveness(attempts_made, attempts_remaining),
            ProvisionState::Provisioning {
                liveness_attempts,
                mut pending,
                mut outcomes,
            } => match pending.pop_front() {
                Some(binding) => {
                    outcomes.push(self.create(binding));
                    ProvisionState::Provisioning {
                        liveness_attempts,
                        pending,
                        outcomes,
                    }
                }
                None => ProvisionState::Completed {
                    liveness_attempts,
                    outcomes,
                },
            },
            terminal => terminal,
        }
    }

    /// Run to completion or abort
    pub fn run(&self) -> ProvisionReport {
        let started_at = Utc::now();
        let mut state = self.initial_state();
        loop {
            state = match self.step(state) {
                ProvisionState::Aborted {
                    liveness_attempts,
                    reason,
                } => {
                    warn!("Provisioning aborted: {}", reason);
                    return ProvisionReport {
                        started_at,
                        finished_at: Utc::now(),
                        liveness_attempts,
                        aborted: true,
                        outcomes: Vec::new(),
                        results: vec![format!("Error: {}", reason)],
                    };
                }
                ProvisionState::Completed {
                    liveness_attempts,
                    outcomes,
                } => {
                    let results = outcomes.iter().map(|o| o.to_string()).collect();
                    return ProvisionReport {
                        started_at,
                        finished_at: Utc::now(),
                        liveness_attempts,
                        aborted: false,
                        outcomes,
                        results,
                    };
                }
                next => next,
            };
        }
    }

    fn poll_liveness(&self, attempts_made: u32, attempts_remaining: u32) -> ProvisionState {
        if attempts_remaining == 0 {
            return ProvisionState::Aborted {
                liveness_attempts: attempts_made,
                reason: format!(
                    "cluster is not available after {} attempts",
                    attempts_made
                ),
            };
        }

        let attempt = attempts_made + 1;
        let running = matches!(
            self.transport.ping(self.policy.request_timeout),
            Ok(reply) if reply.is_success()
        );

        if running {
            info!("Cluster is up after {} attempt(s), creating indexes", attempt);
            return ProvisionState::Provisioning {
                liveness_attempts: attempt,
                pending: self.mapping.iter().cloned().collect(),
                outcomes: Vec::new(),
            };
        }

        info!(
            "Waiting for cluster to be ready (attempt {}/{})",
            attempt, self.policy.max_attempts
        );
        let remaining = attempts_remaining - 1;
        if remaining > 0 {
            self.sleeper.sleep(self.policy.interval);
        }
        ProvisionState::AwaitingLiveness {
            attempts_made: attempt,
            attempts_remaining: remaining,
        }
    }

    fn create(&self, binding: IndexBinding) -> IndexOutcome {
        let result = match self.transport.create_index(
            &binding.physical,
            &index_settings(),
            self.policy.request_timeout,
        ) {
            Ok(reply) if matches!(reply.status, 200 | 201) => CreateResult::Ready,
            Ok(reply) if already_exists(reply.status, &reply.body) => {
                debug!("Index {} already exists", binding.physical);
                CreateResult::Ready
            }
            Ok(reply) => CreateResult::Rejected {
                status: reply.status,
                body: reply.body,
            },
            Err(e) => CreateResult::Failed {
                detail: e.to_string(),
            },
        };

        let outcome = IndexOutcome {
            display: binding.display,
            physical: binding.physical,
            result,
        };
        if outcome.is_success() {
            info!("{}", outcome);
        } else {
            warn!("{}", outcome);
        }
        outcome
    }
}

/// A repeat create is answered with 400 and an `error.type` naming the existing index
fn already_exists(status: u16, body: &str) -> bool {
    if status != 400 {
        return false;
    }
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/type")?.as_str().map(|t| t == ALREADY_EXISTS))
        .unwrap_or(false)
}
