//! Remote task polling for asynchronous generation APIs
//!
//! Task-based providers submit a request, get back a remote task id, and
//! poll it at a fixed interval. Polling is bounded: exhausting the attempt
//! budget is a `GenerationTimeout`, a reported failure a `GenerationFailure`.

use primer_core::{PrimerError, Result};
use std::time::Duration;

/// Status reported by one poll of a remote task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus<T> {
    Pending,
    Succeeded(T),
    Failed(String),
}

/// Interval and attempt bound for polling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 60,
        }
    }
}

/// A submitted remote task
#[derive(Debug, Clone)]
pub struct RemoteTask {
    /// Local id, for log correlation
    pub id: String,
    /// Provider-assigned task id
    pub remote_id: String,
    pub provider: String,
    pub entity_name: String,
}

impl RemoteTask {
    pub fn new(provider: &str, entity_name: &str, remote_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            remote_id: remote_id.into(),
            provider: provider.to_string(),
            entity_name: entity_name.to_string(),
        }
    }

    /// Poll until the task settles or the policy's attempt bound is reached.
    ///
    /// `check` is called once per attempt, after sleeping `policy.interval`.
    pub fn wait<T, F>(&self, policy: PollPolicy, mut check: F) -> Result<T>
    where
        F: FnMut(&str) -> Result<TaskStatus<T>>,
    {
        for attempt in 1..=policy.max_attempts {
            std::thread::sleep(policy.interval);

            match check(&self.remote_id)? {
                TaskStatus::Pending => {
                    log::debug!(
                        "{} task {} for '{}' pending ({}/{})",
                        self.provider,
                        self.remote_id,
                        self.entity_name,
                        attempt,
                        policy.max_attempts
                    );
                }
                TaskStatus::Succeeded(output) => {
                    log::debug!(
                        "{} task {} [{}] succeeded after {} poll(s)",
                        self.provider,
                        self.remote_id,
                        self.id,
                        attempt
                    );
                    return Ok(output);
                }
                TaskStatus::Failed(msg) => {
                    return Err(PrimerError::GenerationFailure(format!(
                        "{} task {} for '{}' failed: {}",
                        self.provider, self.remote_id, self.entity_name, msg
                    )));
                }
            }
        }

        Err(PrimerError::GenerationTimeout {
            attempts: policy.max_attempts,
            detail: format!(
                "{} task {} for '{}'",
                self.provider, self.remote_id, self.entity_name
            ),
        })
    }
}
