//! Scheduler (spec §4.6): `findPlacement(job) -> pool | error`.

use std::collections::HashMap;

use hodei_core::{Capabilities, Millicores, PoolId, ResourcePool, WorkerTemplate};
use hodei_quota::{CheckDecision, QuotaEngine, UsageDelta};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("no active pool satisfies the job's requirements and quota")]
    NoCandidatePool,
}

/// What a job needs from a pool (spec §4.6: "languages, tools, features,
/// labels, resource request").
#[derive(Debug, Clone)]
pub struct JobRequirements {
    pub cpu: Millicores,
    pub memory: hodei_core::Bytes,
    pub capabilities: Capabilities,
    pub labels: HashMap<String, String>,
}

/// One schedulable pool, with the precomputed ranking inputs the caller
/// (normally fed by `hodei-monitor`) already has on hand.
#[derive(Debug, Clone)]
pub struct PoolCandidate {
    pub pool: ResourcePool,
    pub template: WorkerTemplate,
    /// Projected utilization (0-100) if this job were admitted.
    pub projected_utilization: f64,
    pub free_capacity_bytes: u64,
    /// Lower is cheaper/preferred.
    pub cost_weight: f64,
}

fn satisfies_capacity(pool: &ResourcePool, req: &JobRequirements) -> bool {
    pool.capacity.available_cpu >= req.cpu && pool.capacity.available_memory >= req.memory
}

fn satisfies_labels(template: &WorkerTemplate, req: &JobRequirements) -> bool {
    req.labels.iter().all(|(k, v)| template.labels.get(k) == Some(v))
}

/// `findPlacement(job) -> pool | error` (spec §4.6). `quota` is consulted in
/// dry-run mode per candidate — `QuotaEngine::check` never mutates usage, so
/// calling it here is safe without a separate dry-run path.
pub async fn find_placement(
    req: &JobRequirements,
    candidates: &[PoolCandidate],
    quota: &QuotaEngine,
) -> Result<PoolId, SchedulerError> {
    let mut ranked = Vec::new();

    for candidate in candidates {
        if !candidate.pool.is_schedulable() {
            continue;
        }
        if !candidate.template.capabilities.satisfies(&req.capabilities) {
            continue;
        }
        if !satisfies_labels(&candidate.template, req) {
            continue;
        }
        if !satisfies_capacity(&candidate.pool, req) {
            continue;
        }

        let delta = UsageDelta {
            cpu_millicores: req.cpu.0,
            memory_gb: req.memory.as_gib(),
            storage_gb: 0.0,
            jobs: 1,
            workers: 0,
        };
        let decision = quota
            .check(&candidate.pool.id, delta, "scheduler dry run")
            .await
            .map_err(|_| SchedulerError::NoCandidatePool)?;
        if matches!(decision, CheckDecision::Block { .. }) {
            continue;
        }

        ranked.push(candidate);
    }

    ranked.sort_by(|a, b| {
        a.projected_utilization
            .partial_cmp(&b.projected_utilization)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.free_capacity_bytes.cmp(&a.free_capacity_bytes))
            .then_with(|| a.cost_weight.partial_cmp(&b.cost_weight).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| a.pool.id.as_str().cmp(b.pool.id.as_str()))
    });

    let chosen = ranked.into_iter().next().ok_or(SchedulerError::NoCandidatePool)?;
    info!(pool_id = %chosen.pool.id, "job placement chosen");
    Ok(chosen.pool.id.clone())
}
