//! Quota / usage / violation data model (spec §3).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use hodei_core::{PoolId, QuotaId, ViolationId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuotaPolicy {
    Hard,
    Soft,
    Advisory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceQuota {
    pub id: QuotaId,
    pub pool_id: PoolId,
    pub max_cpu_millicores: u64,
    pub max_memory_gb: f64,
    pub max_storage_gb: f64,
    pub max_concurrent_jobs: u32,
    pub max_concurrent_workers: u32,
    pub custom: HashMap<String, f64>,
    pub policy: QuotaPolicy,
    pub enabled: bool,
    /// Per-resource alert threshold, expressed as a percentage of the limit.
    pub alert_thresholds: HashMap<String, f64>,
}

impl ResourceQuota {
    fn threshold_for(&self, resource: &str) -> f64 {
        self.alert_thresholds.get(resource).copied().unwrap_or(80.0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub pool_id: Option<PoolId>,
    pub used_cpu_millicores: u64,
    pub used_memory_gb: f64,
    pub used_storage_gb: f64,
    pub active_jobs: u32,
    pub active_workers: u32,
}

impl ResourceUsage {
    pub fn empty(pool_id: PoolId) -> Self {
        Self {
            pool_id: Some(pool_id),
            ..Default::default()
        }
    }
}

/// A request to admit (spec: `check(poolId, request, context)`).
#[derive(Debug, Clone, Copy, Default)]
pub struct UsageDelta {
    pub cpu_millicores: u64,
    pub memory_gb: f64,
    pub storage_gb: f64,
    pub jobs: u32,
    pub workers: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Severity thresholds from spec §4.4: >=50% excess = CRITICAL, >=25% = HIGH,
/// >=10% = MEDIUM, else LOW.
pub fn severity_for_excess_pct(excess_pct: f64) -> ViolationSeverity {
    if excess_pct >= 50.0 {
        ViolationSeverity::Critical
    } else if excess_pct >= 25.0 {
        ViolationSeverity::High
    } else if excess_pct >= 10.0 {
        ViolationSeverity::Medium
    } else {
        ViolationSeverity::Low
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationAction {
    Blocked,
    AllowedWithWarning,
    NotificationSent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaViolation {
    pub id: ViolationId,
    pub pool_id: PoolId,
    pub quota_id: QuotaId,
    pub resource: String,
    pub limit: f64,
    pub attempted: f64,
    pub current: f64,
    pub severity: ViolationSeverity,
    pub action: ViolationAction,
    pub context: String,
    pub timestamp: DateTime<Utc>,
    pub resolved: bool,
    pub resolved_by: Option<String>,
}

/// Result of evaluating one resource field against its quota.
#[derive(Debug, Clone)]
pub(crate) struct FieldProjection {
    pub resource: &'static str,
    pub limit: f64,
    pub current: f64,
    pub projected: f64,
}

impl FieldProjection {
    pub fn is_violation(&self) -> bool {
        self.limit > 0.0 && self.projected > self.limit
    }

    pub fn excess_pct(&self) -> f64 {
        if self.limit <= 0.0 {
            return 0.0;
        }
        ((self.projected - self.limit) / self.limit * 100.0).max(0.0)
    }

    pub fn warning_pct(&self, threshold_pct: f64) -> bool {
        self.limit > 0.0 && (self.projected / self.limit * 100.0) >= threshold_pct
    }
}

pub(crate) fn project_fields(quota: &ResourceQuota, usage: &ResourceUsage, delta: &UsageDelta) -> Vec<FieldProjection> {
    vec![
        FieldProjection {
            resource: "cpu",
            limit: quota.max_cpu_millicores as f64,
            current: usage.used_cpu_millicores as f64,
            projected: (usage.used_cpu_millicores + delta.cpu_millicores) as f64,
        },
        FieldProjection {
            resource: "memory",
            limit: quota.max_memory_gb,
            current: usage.used_memory_gb,
            projected: usage.used_memory_gb + delta.memory_gb,
        },
        FieldProjection {
            resource: "storage",
            limit: quota.max_storage_gb,
            current: usage.used_storage_gb,
            projected: usage.used_storage_gb + delta.storage_gb,
        },
        FieldProjection {
            resource: "concurrent_jobs",
            limit: quota.max_concurrent_jobs as f64,
            current: usage.active_jobs as f64,
            projected: (usage.active_jobs + delta.jobs) as f64,
        },
        FieldProjection {
            resource: "concurrent_workers",
            limit: quota.max_concurrent_workers as f64,
            current: usage.active_workers as f64,
            projected: (usage.active_workers + delta.workers) as f64,
        },
    ]
}

pub(crate) fn alert_threshold(quota: &ResourceQuota, resource: &str) -> f64 {
    quota.threshold_for(resource)
}
