//! The `ComputeDriver` port (spec §4.1). Core logic depends only on this
//! trait, never on a concrete container runtime — the same separation
//! `sem_os_core::ports` draws between a store trait and its postgres
//! adapter.

use async_trait::async_trait;
use hodei_core::{InstanceId, PoolId, ProvisioningError};

use crate::types::{HealthCheckResult, InstanceSpec, InstanceStatus, InstanceSummary, InstanceTypeSpec, ScaleResult};

pub type Result<T> = std::result::Result<T, ProvisioningError>;

#[async_trait]
pub trait ComputeDriver: Send + Sync {
    /// Idempotent under `spec.worker_id`: a second call with the same
    /// worker id against an instance that already exists returns that
    /// instance's id rather than creating a duplicate.
    async fn provision(&self, pool_id: &PoolId, spec: InstanceSpec) -> Result<InstanceId>;

    /// Graceful stop with a grace period, then forced removal. Tolerates
    /// the instance already being gone.
    async fn terminate(&self, instance_id: &InstanceId) -> Result<()>;

    async fn inspect(&self, instance_id: &InstanceId) -> Result<InstanceStatus>;

    async fn list(&self, pool_id: &PoolId) -> Result<Vec<InstanceSummary>>;

    async fn list_all(&self) -> Result<Vec<InstanceSummary>>;

    /// Iteratively provisions or terminates towards `target`. Partial
    /// failures accumulate in the result rather than aborting the whole
    /// call.
    async fn scale_to(&self, pool_id: &PoolId, target: u32) -> Result<ScaleResult>;

    fn available_instance_types(&self, pool_id: &PoolId) -> Vec<InstanceTypeSpec>;

    async fn health_check(&self) -> Result<HealthCheckResult>;
}
