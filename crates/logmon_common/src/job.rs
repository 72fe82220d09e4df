//! Job Trigger - dispatch of the external alert reconciliation job
//!
//! Only the launch is observed. The job's exit status is logged by a detached
//! reaper thread and never reported back to the caller.

use crate::config::JobConfig;
use crate::error::LaunchFailure;
use std::process::{Command, Stdio};
use std::sync::Mutex;
use tracing::{info, warn};

/// Capability to start the external job
pub trait JobRunner: Send + Sync {
    fn trigger(&self) -> Result<(), LaunchFailure>;
}

/// Runs a configured program with fixed arguments
#[derive(Debug, Clone)]
pub struct ScriptJobRunner {
    program: String,
    args: Vec<String>,
}

impl ScriptJobRunner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<&JobConfig> for ScriptJobRunner {
    fn from(config: &JobConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }
}

impl JobRunner for ScriptJobRunner {
    fn trigger(&self) -> Result<(), LaunchFailure> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| LaunchFailure {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        info!("Launched job `{}` (pid {})", self.command_line(), child.id());

        let command_line = self.command_line();
        std::thread::spawn(move || match child.wait() {
            Ok(status) if status.success() => info!("Job `{}` finished", command_line),
            Ok(status) => warn!("Job `{}` exited with {}", command_line, status),
            Err(e) => warn!("Failed to wait for job `{}`: {}", command_line, e),
        });

        Ok(())
    }
}

/// Fake runner for testing
pub struct FakeJobRunner {
    outcome: Result<(), LaunchFailure>,
    calls: Mutex<usize>,
}

impl FakeJobRunner {
    pub fn succeeding() -> Self {
        Self {
            outcome: Ok(()),
            calls: Mutex::new(0),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            outcome: Err(LaunchFailure {
                program: "fake".to_string(),
                reason: reason.to_string(),
            }),
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl JobRunner for FakeJobRunner {
    fn trigger(&self) -> Result<(), LaunchFailure> {
        *self.calls.lock().unwrap() += 1;
        self.outcome.clone()
    }
}
