//! Execution record and its terminal-status lifecycle (spec §4.7).

use chrono::{DateTime, Utc};
use hodei_core::{ExecutionId, HodeiError, InstanceId, JobId, PoolId, WorkerId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Provisioning,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ExecutionStatus {
    pub fn can_transition_to(&self, to: ExecutionStatus) -> bool {
        use ExecutionStatus::*;
        matches!(
            (self, to),
            (Provisioning, Running)
                | (Provisioning, Failed)
                | (Provisioning, Cancelled)
                | (Running, Completed)
                | (Running, Failed)
                | (Running, Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed | ExecutionStatus::Cancelled)
    }
}

/// One job's run against a provisioned instance (spec §4.7). The Execution
/// Engine owns this record from `startExecution` until it reaches a
/// terminal status; the orchestrator never re-enters it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: ExecutionId,
    pub job_id: JobId,
    pub pool_id: PoolId,
    pub worker_id: WorkerId,
    pub instance_id: Option<InstanceId>,
    pub status: ExecutionStatus,
    pub exit_code: Option<i32>,
    pub output_tail: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Resource footprint charged at admission; replayed back through
    /// `quota.updateUsage(RemoveJob(...))` on teardown (spec §4.7).
    pub cpu_millicores: u64,
    pub memory_gb: f64,
    pub storage_gb: f64,
}

const OUTPUT_TAIL_CAPACITY: usize = 50;

impl Execution {
    pub fn new(
        id: ExecutionId,
        job_id: JobId,
        pool_id: PoolId,
        worker_id: WorkerId,
        cpu_millicores: u64,
        memory_gb: f64,
        storage_gb: f64,
    ) -> Self {
        Self {
            id,
            job_id,
            pool_id,
            worker_id,
            instance_id: None,
            status: ExecutionStatus::Provisioning,
            exit_code: None,
            output_tail: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
            cpu_millicores,
            memory_gb,
            storage_gb,
        }
    }

    pub fn transition_to(&mut self, to: ExecutionStatus) -> Result<(), HodeiError> {
        if !self.status.can_transition_to(to) {
            return Err(HodeiError::Validation(format!(
                "illegal execution status transition: {:?} -> {:?}",
                self.status, to
            )));
        }
        self.status = to;
        if to.is_terminal() {
            self.ended_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Keeps only the most recent lines, matching spec §4.7's "captured exit
    /// code and output tail" for a failure report.
    pub fn push_output_line(&mut self, line: String) {
        self.output_tail.push(line);
        if self.output_tail.len() > OUTPUT_TAIL_CAPACITY {
            self.output_tail.remove(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Execution {
        Execution::new(
            ExecutionId::new("exec-1").unwrap(),
            JobId::new("job-1").unwrap(),
            PoolId::new("pool-1").unwrap(),
            WorkerId::new("worker-1").unwrap(),
            1000,
            2.0,
            0.0,
        )
    }

    #[test]
    fn provisioning_to_completed_directly_is_rejected() {
        let mut execution = sample();
        assert!(execution.transition_to(ExecutionStatus::Completed).is_err());
    }

    #[test]
    fn running_to_failed_sets_ended_at() {
        let mut execution = sample();
        execution.transition_to(ExecutionStatus::Running).unwrap();
        execution.transition_to(ExecutionStatus::Failed).unwrap();
        assert!(execution.ended_at.is_some());
    }

    #[test]
    fn output_tail_drops_oldest_past_capacity() {
        let mut execution = sample();
        for i in 0..(OUTPUT_TAIL_CAPACITY + 5) {
            execution.push_output_line(format!("line {i}"));
        }
        assert_eq!(execution.output_tail.len(), OUTPUT_TAIL_CAPACITY);
        assert_eq!(execution.output_tail[0], "line 5");
    }
}
