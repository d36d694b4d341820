//! Queue and queued-job aggregates owned by the orchestrator (spec §3, §4.9).

use chrono::{DateTime, Utc};
use hodei_core::{HodeiError, JobId, JobPriority, PoolId, QueueId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueDiscipline {
    Fifo,
    Lifo,
    Priority,
}

/// A named lane of work against one resource pool (spec §3 "JobQueue").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobQueue {
    pub id: QueueId,
    pub name: String,
    pub resource_pool_id: PoolId,
    pub discipline: QueueDiscipline,
    pub base_priority: JobPriority,
    pub max_concurrent_jobs: Option<u32>,
    pub max_queued_jobs: Option<u32>,
    pub is_active: bool,
}

impl JobQueue {
    pub fn validate(&self) -> Result<(), HodeiError> {
        if self.name.trim().is_empty() {
            return Err(HodeiError::Validation("queue name must not be empty".into()));
        }
        if matches!(self.max_concurrent_jobs, Some(0)) {
            return Err(HodeiError::Validation("maxConcurrentJobs must be positive".into()));
        }
        if matches!(self.max_queued_jobs, Some(0)) {
            return Err(HodeiError::Validation("maxQueuedJobs must be positive".into()));
        }
        Ok(())
    }
}

/// A Job wrapped with queue-admission bookkeeping (spec §3 "QueuedJob").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedJob {
    pub job_id: JobId,
    pub queue_id: QueueId,
    pub priority: JobPriority,
    pub queued_at: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    pub estimated_duration_secs: Option<i64>,
    pub dependencies: Vec<JobId>,
    pub attempts: u32,
    pub max_attempts: u32,
    pub last_error: Option<String>,
    pub backoff_until: Option<DateTime<Utc>>,
}

impl QueuedJob {
    /// `canRetry ≡ attempts < maxAttempts` (spec §4.9).
    pub fn can_retry(&self) -> bool {
        self.attempts < self.max_attempts
    }

    pub fn is_in_backoff(&self, now: DateTime<Utc>) -> bool {
        self.backoff_until.is_some_and(|until| now < until)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("queue {0} not found")]
    QueueNotFound(QueueId),
    #[error("queue {0} is not active")]
    QueueInactive(QueueId),
    #[error("queue {0} is full")]
    QueueFull(QueueId),
    #[error("job {0} is already queued")]
    AlreadyQueued(JobId),
}

impl From<OrchestratorError> for HodeiError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::QueueNotFound(q) => HodeiError::NotFound(format!("queue {q} not found")),
            OrchestratorError::QueueInactive(q) => HodeiError::Validation(format!("queue {q} is not active")),
            OrchestratorError::QueueFull(q) => HodeiError::Conflict(format!("queue {q} is full")),
            OrchestratorError::AlreadyQueued(j) => HodeiError::Conflict(format!("job {j} is already queued")),
        }
    }
}
