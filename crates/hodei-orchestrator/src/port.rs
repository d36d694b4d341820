//! The pool-lookup port the orchestrator consults when placing a job
//! (spec §4.6, §4.9). Kept narrow the way `hodei_monitor::PoolStatsSource`
//! is, rather than depending on `hodei-pool`/`hodei-driver` directly.

use async_trait::async_trait;
use hodei_core::{PoolId, ResourcePool, WorkerTemplate};

/// A pool candidate's current standing, supplied by whatever keeps
/// utilization/cost figures (normally `hodei-monitor` + `hodei-pool`).
#[derive(Debug, Clone)]
pub struct PoolStanding {
    pub pool: ResourcePool,
    pub template: WorkerTemplate,
    pub projected_utilization: f64,
    pub free_capacity_bytes: u64,
    pub cost_weight: f64,
}

#[async_trait]
pub trait PoolCatalog: Send + Sync {
    async fn standing_for(&self, pool_id: &PoolId) -> Option<PoolStanding>;
}
