//! `QuotaEngine`: enforcement decisions, usage bookkeeping, and the
//! continuous monitoring loop (spec §4.4).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use hodei_core::{HodeiError, PoolId, QuotaId, ViolationId};
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{debug, error, info};

use crate::config::QuotaConfig;
use crate::model::{
    alert_threshold, project_fields, severity_for_excess_pct, QuotaPolicy, QuotaViolation, ResourceQuota, ResourceUsage,
    UsageDelta, ViolationAction,
};

const ALERT_BROADCAST_CAPACITY: usize = 256;
const VIOLATION_BROADCAST_CAPACITY: usize = 256;

/// Outcome of `QuotaEngine::check` (spec §4.4).
#[derive(Debug, Clone, PartialEq)]
pub enum CheckDecision {
    Allow,
    AllowWithWarning { warnings: Vec<String> },
    Block { violations: Vec<String> },
}

#[derive(Debug, Clone)]
pub struct ResourceAlert {
    pub pool_id: PoolId,
    pub resource: String,
    pub usage_pct: f64,
}

pub struct QuotaEngine {
    quotas: Mutex<HashMap<String, ResourceQuota>>,
    usage: Mutex<HashMap<String, ResourceUsage>>,
    violations: Mutex<Vec<QuotaViolation>>,
    config: QuotaConfig,
    alert_tx: broadcast::Sender<ResourceAlert>,
    violation_tx: broadcast::Sender<QuotaViolation>,
}

impl QuotaEngine {
    pub fn new(config: QuotaConfig) -> Self {
        let (alert_tx, _) = broadcast::channel(ALERT_BROADCAST_CAPACITY);
        let (violation_tx, _) = broadcast::channel(VIOLATION_BROADCAST_CAPACITY);
        Self {
            quotas: Mutex::new(HashMap::new()),
            usage: Mutex::new(HashMap::new()),
            violations: Mutex::new(Vec::new()),
            config,
            alert_tx,
            violation_tx,
        }
    }

    pub fn subscribe_alerts(&self) -> broadcast::Receiver<ResourceAlert> {
        self.alert_tx.subscribe()
    }

    pub fn subscribe_violations(&self) -> broadcast::Receiver<QuotaViolation> {
        self.violation_tx.subscribe()
    }

    pub async fn set_quota(&self, quota: ResourceQuota) {
        self.quotas.lock().await.insert(quota.pool_id.as_str().to_string(), quota);
    }

    /// `check(poolId, request, context)` (spec §4.4).
    pub async fn check(&self, pool_id: &PoolId, request: UsageDelta, context: &str) -> Result<CheckDecision, HodeiError> {
        let quota = {
            let quotas = self.quotas.lock().await;
            quotas.get(pool_id.as_str()).cloned()
        };
        let Some(quota) = quota else {
            return Ok(CheckDecision::Allow);
        };
        if !quota.enabled {
            return Ok(CheckDecision::Allow);
        }

        let usage = self.usage_for(pool_id).await;
        let fields = project_fields(&quota, &usage, &request);

        let violations: Vec<_> = fields.iter().filter(|f| f.is_violation()).collect();
        let warnings: Vec<_> = fields
            .iter()
            .filter(|f| !f.is_violation() && f.warning_pct(alert_threshold(&quota, f.resource)))
            .collect();

        if !violations.is_empty() {
            let action = match quota.policy {
                QuotaPolicy::Hard => ViolationAction::Blocked,
                QuotaPolicy::Soft | QuotaPolicy::Advisory => ViolationAction::AllowedWithWarning,
            };
            for field in &violations {
                self.record_violation(&quota, field, action, context).await;
            }
            return Ok(match quota.policy {
                QuotaPolicy::Hard => CheckDecision::Block {
                    violations: violations.iter().map(|f| f.resource.to_string()).collect(),
                },
                QuotaPolicy::Soft | QuotaPolicy::Advisory => CheckDecision::AllowWithWarning {
                    warnings: violations.iter().map(|f| f.resource.to_string()).collect(),
                },
            });
        }

        if !warnings.is_empty() {
            return Ok(CheckDecision::AllowWithWarning {
                warnings: warnings.iter().map(|f| f.resource.to_string()).collect(),
            });
        }

        Ok(CheckDecision::Allow)
    }

    async fn record_violation(
        &self,
        quota: &ResourceQuota,
        field: &crate::model::FieldProjection,
        action: ViolationAction,
        context: &str,
    ) {
        let violation = QuotaViolation {
            id: ViolationId::new(format!("viol-{}-{}-{}", quota.pool_id, field.resource, Utc::now().timestamp_nanos_opt().unwrap_or(0)))
                .expect("generated violation id is never blank"),
            pool_id: quota.pool_id.clone(),
            quota_id: quota.id.clone(),
            resource: field.resource.to_string(),
            limit: field.limit,
            attempted: field.projected,
            current: field.current,
            severity: severity_for_excess_pct(field.excess_pct()),
            action,
            context: context.to_string(),
            timestamp: Utc::now(),
            resolved: false,
            resolved_by: None,
        };
        info!(pool_id = %quota.pool_id, resource = %field.resource, severity = ?violation.severity, "quota violation recorded");
        self.violations.lock().await.push(violation.clone());
        let _ = self.violation_tx.send(violation);
    }

    async fn usage_for(&self, pool_id: &PoolId) -> ResourceUsage {
        let usage = self.usage.lock().await;
        usage
            .get(pool_id.as_str())
            .cloned()
            .unwrap_or_else(|| ResourceUsage::empty(pool_id.clone()))
    }

    async fn mutate_usage(&self, pool_id: &PoolId, f: impl FnOnce(&mut ResourceUsage)) {
        let mut usage = self.usage.lock().await;
        let entry = usage
            .entry(pool_id.as_str().to_string())
            .or_insert_with(|| ResourceUsage::empty(pool_id.clone()));
        f(entry);
    }

    pub async fn add_job(&self, pool_id: &PoolId, cpu_millicores: u64, memory_gb: f64, storage_gb: f64) {
        self.mutate_usage(pool_id, |u| {
            u.used_cpu_millicores += cpu_millicores;
            u.used_memory_gb += memory_gb;
            u.used_storage_gb += storage_gb;
            u.active_jobs += 1;
        })
        .await;
    }

    pub async fn remove_job(&self, pool_id: &PoolId, cpu_millicores: u64, memory_gb: f64, storage_gb: f64) {
        self.mutate_usage(pool_id, |u| {
            u.used_cpu_millicores = u.used_cpu_millicores.saturating_sub(cpu_millicores);
            u.used_memory_gb = (u.used_memory_gb - memory_gb).max(0.0);
            u.used_storage_gb = (u.used_storage_gb - storage_gb).max(0.0);
            u.active_jobs = u.active_jobs.saturating_sub(1);
        })
        .await;
    }

    pub async fn add_worker(&self, pool_id: &PoolId) {
        self.mutate_usage(pool_id, |u| u.active_workers += 1).await;
    }

    pub async fn remove_worker(&self, pool_id: &PoolId) {
        self.mutate_usage(pool_id, |u| u.active_workers = u.active_workers.saturating_sub(1)).await;
    }

    pub async fn resolve(&self, id: &ViolationId, resolved_by: &str) -> Result<(), HodeiError> {
        let mut violations = self.violations.lock().await;
        let violation = violations
            .iter_mut()
            .find(|v| &v.id == id)
            .ok_or_else(|| HodeiError::NotFound(format!("quota violation {id} not found")))?;
        violation.resolved = true;
        violation.resolved_by = Some(resolved_by.to_string());
        Ok(())
    }

    /// Checks every enabled quota against *current* (not projected) usage,
    /// on each monitoring tick, emitting alerts on threshold crossings and a
    /// `NOTIFICATION_SENT` violation on actual exceedances (spec §4.4).
    async fn monitor_tick(&self) {
        let quotas: Vec<ResourceQuota> = self.quotas.lock().await.values().cloned().collect();
        for quota in quotas {
            if !quota.enabled {
                continue;
            }
            let usage = self.usage_for(&quota.pool_id).await;
            let fields = project_fields(&quota, &usage, &UsageDelta::default());
            for field in &fields {
                let threshold = alert_threshold(&quota, field.resource);
                if field.is_violation() {
                    self.record_violation(&quota, field, ViolationAction::NotificationSent, "monitoring tick").await;
                } else if field.warning_pct(threshold) {
                    let _ = self.alert_tx.send(ResourceAlert {
                        pool_id: quota.pool_id.clone(),
                        resource: field.resource.to_string(),
                        usage_pct: if field.limit > 0.0 { field.projected / field.limit * 100.0 } else { 0.0 },
                    });
                }
            }
        }
    }

    /// Background scanner (spec §4.4, §5 "quota-service shutdown cancels
    /// monitors and closes alert/violation broadcasts").
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(Duration::from_millis(self.config.monitor_interval_ms));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    debug!("quota monitor tick");
                    self.monitor_tick().await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }
}
