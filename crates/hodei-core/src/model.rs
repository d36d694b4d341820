//! Cross-cutting data model shared by every component (spec §3): jobs,
//! pools, worker templates. Component-owned aggregates (quotas, worker
//! pools, executions, ...) live in their owning crate instead, mirroring how
//! `sem_os_core::types` holds only what every store/service needs in
//! common.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::HodeiError;
use crate::ids::{JobId, PoolId};
use crate::resources::{Bytes, Millicores};
use crate::version::Version;

/// Job lifecycle status (spec §3, transition DAG in §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Queued,
    Scheduled,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// The status-transition DAG from spec §4.9. All other transitions are
    /// rejected.
    pub fn can_transition_to(&self, to: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, to),
            (Pending, Queued)
                | (Queued, Scheduled)
                | (Scheduled, Running)
                | (Running, Completed)
                | (Running, Failed)
                | (Running, Cancelled)
                | (Scheduled, Failed) // placement failure, before a worker ever ran
                | (Queued, Cancelled)
                | (Failed, Queued) // via retry
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }
}

/// Priority tier with the numeric weight used as the base for effective
/// priority (spec §3, §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobPriority {
    Background,
    Low,
    Normal,
    High,
    Critical,
}

impl JobPriority {
    pub fn value(&self) -> f64 {
        match self {
            JobPriority::Critical => 1000.0,
            JobPriority::High => 800.0,
            JobPriority::Normal => 500.0,
            JobPriority::Low => 200.0,
            JobPriority::Background => 100.0,
        }
    }
}

/// A job's definition: either a template reference with overrides, or an
/// inline spec. Spec §3 invariant: never both, never neither.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JobDefinition {
    Template {
        template_ref: String,
        version: Version,
        parameter_overrides: HashMap<String, serde_json::Value>,
    },
    Inline {
        spec: serde_json::Value,
    },
}

/// A pipeline job (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub name: String,
    pub namespace: String,
    pub status: JobStatus,
    pub priority: JobPriority,
    pub definition: JobDefinition,
    pub retry_count: u32,
    pub max_retries: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub latest_execution_id: Option<String>,
}

impl Job {
    /// Validate the structural invariants from spec §3.
    pub fn validate(&self) -> Result<(), HodeiError> {
        if self.name.trim().is_empty() {
            return Err(HodeiError::Validation("job name must not be empty".into()));
        }
        if self.namespace.trim().is_empty() {
            return Err(HodeiError::Validation("job namespace must not be empty".into()));
        }
        Ok(())
    }

    /// Attempt a status transition, enforcing the DAG in spec §4.9.
    pub fn transition_to(&mut self, to: JobStatus) -> Result<(), HodeiError> {
        if !self.status.can_transition_to(to) {
            return Err(HodeiError::Validation(format!(
                "illegal job status transition: {:?} -> {:?}",
                self.status, to
            )));
        }
        self.status = to;
        self.updated_at = Utc::now();
        if to.is_terminal() {
            self.completed_at = Some(self.updated_at);
        }
        Ok(())
    }
}

/// Lifecycle status of a ResourcePool (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoolStatus {
    Active,
    Draining,
    Terminating,
    Error,
}

/// Capacity counters for a ResourcePool (spec §3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PoolCapacity {
    pub total_cpu: Millicores,
    pub total_memory: Bytes,
    pub total_disk: Bytes,
    pub available_cpu: Millicores,
    pub available_memory: Bytes,
    pub available_disk: Bytes,
}

/// An administrative grouping of compute capacity, quota, and scaling policy
/// (spec §3, GLOSSARY "Pool").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourcePool {
    pub id: PoolId,
    pub name: String,
    pub provider_type: String,
    pub display_name: String,
    pub description: String,
    pub labels: HashMap<String, String>,
    pub annotations: HashMap<String, String>,
    pub capacity: PoolCapacity,
    pub status: PoolStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResourcePool {
    /// DNS-1123-ish name validation (spec §3: "DNS-1123, ≤63 chars").
    pub fn validate_name(name: &str) -> Result<(), HodeiError> {
        if name.is_empty() || name.len() > 63 {
            return Err(HodeiError::Validation(format!(
                "pool name must be 1-63 characters: {name:?}"
            )));
        }
        let valid = name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            && !name.starts_with('-')
            && !name.ends_with('-');
        if !valid {
            return Err(HodeiError::Validation(format!(
                "pool name {name:?} is not DNS-1123 compliant"
            )));
        }
        Ok(())
    }

    pub fn is_schedulable(&self) -> bool {
        self.status == PoolStatus::Active
    }
}

/// Resource requirements attached to a WorkerTemplate (spec §3).
///
/// Storage is modeled as present-or-absent rather than `String::new()` vs
/// `null` (an Open Question in spec §9 the source left ambiguous); see
/// DESIGN.md for the rationale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRequirements {
    pub cpu: Millicores,
    pub memory: Bytes,
    pub storage: Option<Bytes>,
    pub gpu_count: u32,
}

/// Capability tags a WorkerTemplate advertises and a job's requirements are
/// matched against (spec §3, §4.6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Capabilities {
    pub languages: Vec<String>,
    pub tools: Vec<String>,
    pub features: Vec<String>,
}

impl Capabilities {
    /// Whether this capability set satisfies every requirement in `required`.
    pub fn satisfies(&self, required: &Capabilities) -> bool {
        required.languages.iter().all(|l| self.languages.contains(l))
            && required.tools.iter().all(|t| self.tools.contains(t))
            && required.features.iter().all(|f| self.features.contains(f))
    }
}

/// Scheduling hints for node placement (spec §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulingHints {
    pub node_selectors: HashMap<String, String>,
    pub tolerations: Vec<String>,
    pub affinity: Option<String>,
}

/// Security context applied to a provisioned worker (spec §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityContext {
    pub run_as_user: Option<i64>,
    pub read_only_root_fs: bool,
    pub privileged: bool,
}

/// A volume mount declared by a WorkerTemplate (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,
    pub read_only: bool,
}

/// A liveness/readiness probe declared by a WorkerTemplate (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Probe {
    pub command: Vec<String>,
    pub initial_delay_seconds: u32,
    pub period_seconds: u32,
}

/// The template a WorkerPool provisions instances from (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerTemplate {
    pub image: String,
    pub resources: ResourceRequirements,
    pub capabilities: Capabilities,
    pub labels: HashMap<String, String>,
    pub env: HashMap<String, String>,
    pub scheduling_hints: SchedulingHints,
    pub security_context: SecurityContext,
    pub volumes: Vec<VolumeMount>,
    pub probes: Vec<Probe>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job(status: JobStatus) -> Job {
        Job {
            id: JobId::new("job-1").unwrap(),
            name: "build".into(),
            namespace: "default".into(),
            status,
            priority: JobPriority::Normal,
            definition: JobDefinition::Inline {
                spec: serde_json::json!({}),
            },
            retry_count: 0,
            max_retries: 3,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            completed_at: None,
            created_by: None,
            latest_execution_id: None,
        }
    }

    #[test]
    fn status_dag_allows_happy_path() {
        let mut job = sample_job(JobStatus::Pending);
        job.transition_to(JobStatus::Queued).unwrap();
        job.transition_to(JobStatus::Scheduled).unwrap();
        job.transition_to(JobStatus::Running).unwrap();
        job.transition_to(JobStatus::Completed).unwrap();
        assert!(job.completed_at.is_some());
    }

    #[test]
    fn status_dag_rejects_illegal_jump() {
        let mut job = sample_job(JobStatus::Pending);
        assert!(job.transition_to(JobStatus::Running).is_err());
    }

    #[test]
    fn failed_can_retry_back_to_queued() {
        let mut job = sample_job(JobStatus::Failed);
        job.transition_to(JobStatus::Queued).unwrap();
        assert_eq!(job.status, JobStatus::Queued);
    }

    #[test]
    fn validate_rejects_blank_name() {
        let mut job = sample_job(JobStatus::Pending);
        job.name = "  ".into();
        assert!(job.validate().is_err());
    }

    #[test]
    fn pool_name_validation() {
        assert!(ResourcePool::validate_name("build-pool-1").is_ok());
        assert!(ResourcePool::validate_name("-leading-dash").is_err());
        assert!(ResourcePool::validate_name("Has_Upper").is_err());
        assert!(ResourcePool::validate_name(&"x".repeat(64)).is_err());
    }

    #[test]
    fn capabilities_satisfy_subset() {
        let available = Capabilities {
            languages: vec!["rust".into(), "go".into()],
            tools: vec!["docker".into()],
            features: vec![],
        };
        let required = Capabilities {
            languages: vec!["rust".into()],
            tools: vec!["docker".into()],
            features: vec![],
        };
        assert!(available.satisfies(&required));

        let unmet = Capabilities {
            languages: vec!["python".into()],
            tools: vec![],
            features: vec![],
        };
        assert!(!available.satisfies(&unmet));
    }
}
