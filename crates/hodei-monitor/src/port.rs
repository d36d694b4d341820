//! The stats source the monitor samples from (spec §4.3: "sampling through
//! the driver"). Kept as its own narrow port, the way `sem_os_core::ports`
//! separates a store trait from its concrete adapter, so the monitor's
//! aggregation math is testable without a container runtime.

use async_trait::async_trait;
use hodei_core::{HodeiError, PoolId};

use crate::types::ContainerStatsSample;

#[async_trait]
pub trait PoolStatsSource: Send + Sync {
    /// One sample per running container in the pool.
    async fn sample_containers(&self, pool_id: &PoolId) -> Result<Vec<ContainerStatsSample>, HodeiError>;

    /// `(running_jobs, queued_jobs)` for the pool.
    async fn job_counts(&self, pool_id: &PoolId) -> Result<(u64, u64), HodeiError>;

    /// `(total_cpu_millicores, total_memory_bytes, total_disk_bytes)` capacity for the pool.
    async fn capacity(&self, pool_id: &PoolId) -> Result<(u64, u64, u64), HodeiError>;
}
