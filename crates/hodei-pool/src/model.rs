//! WorkerPool / Worker / ScalingPolicy data model (spec §3).

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use hodei_core::{Capabilities, Millicores, PoolId, WorkerId, WorkerTemplate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerStatus {
    Provisioning,
    Ready,
    Busy,
    Draining,
    Error,
    Terminated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub pool_id: PoolId,
    pub status: WorkerStatus,
    pub capabilities: Capabilities,
    pub allocated_cpu: Millicores,
    pub last_heartbeat: DateTime<Utc>,
}

impl Worker {
    /// `isHealthy ≡ lastHeartbeat within configured timeout` (spec §3).
    pub fn is_healthy(&self, timeout: ChronoDuration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.last_heartbeat) <= timeout
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerPoolStatus {
    Inactive,
    Active,
    ScalingUp,
    ScalingDown,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScalingStrategy {
    Reactive,
    Predictive,
    ResourceBased,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaleAction {
    pub direction: ScaleDirection,
    pub from_size: u32,
    pub to_size: u32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalingPolicy {
    pub min_workers: u32,
    pub max_workers: u32,
    /// Utilization percentage (0-100) above which scale-up is considered.
    pub scale_up_threshold: f64,
    /// Utilization percentage (0-100) at or below which scale-down is considered.
    pub scale_down_threshold: f64,
    pub scale_up_cooldown: ChronoDuration,
    pub scale_down_cooldown: ChronoDuration,
    pub strategy: ScalingStrategy,
    pub last_scale_action: Option<ScaleAction>,
}

impl ScalingPolicy {
    fn in_cooldown(&self, direction: ScaleDirection, now: DateTime<Utc>) -> bool {
        match &self.last_scale_action {
            Some(action) if action.direction == direction => {
                let cooldown = match direction {
                    ScaleDirection::Up => self.scale_up_cooldown,
                    ScaleDirection::Down => self.scale_down_cooldown,
                };
                now.signed_duration_since(action.timestamp) < cooldown
            }
            _ => false,
        }
    }

    pub fn in_up_cooldown(&self, now: DateTime<Utc>) -> bool {
        self.in_cooldown(ScaleDirection::Up, now)
    }

    pub fn in_down_cooldown(&self, now: DateTime<Utc>) -> bool {
        self.in_cooldown(ScaleDirection::Down, now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerPool {
    pub id: PoolId,
    pub name: String,
    pub template: WorkerTemplate,
    pub current_size: u32,
    pub desired_size: u32,
    pub max_size: u32,
    pub scaling_policy: ScalingPolicy,
    pub workers: Vec<Worker>,
    pub status: WorkerPoolStatus,
}

impl WorkerPool {
    pub fn available_workers(&self) -> u32 {
        self.workers
            .iter()
            .filter(|w| matches!(w.status, WorkerStatus::Ready | WorkerStatus::Busy))
            .count() as u32
    }

    /// "Scale-down selects the first N currently READY workers (never
    /// BUSY)" (spec §4.5).
    pub fn select_scale_down_candidates(&self, n: u32) -> Vec<WorkerId> {
        self.workers
            .iter()
            .filter(|w| w.status == WorkerStatus::Ready)
            .take(n as usize)
            .map(|w| w.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker(status: WorkerStatus) -> Worker {
        Worker {
            id: WorkerId::new(format!("w-{status:?}")).unwrap(),
            pool_id: PoolId::new("pool-1").unwrap(),
            status,
            capabilities: Capabilities::default(),
            allocated_cpu: Millicores::ZERO,
            last_heartbeat: Utc::now(),
        }
    }

    #[test]
    fn scale_down_never_selects_busy_workers() {
        let pool = WorkerPool {
            id: PoolId::new("pool-1").unwrap(),
            name: "pool".into(),
            template: WorkerTemplate {
                image: "img".into(),
                resources: hodei_core::ResourceRequirements {
                    cpu: Millicores::ZERO,
                    memory: hodei_core::Bytes::ZERO,
                    storage: None,
                    gpu_count: 0,
                },
                capabilities: Capabilities::default(),
                labels: Default::default(),
                env: Default::default(),
                scheduling_hints: Default::default(),
                security_context: Default::default(),
                volumes: vec![],
                probes: vec![],
            },
            current_size: 3,
            desired_size: 1,
            max_size: 5,
            scaling_policy: ScalingPolicy {
                min_workers: 1,
                max_workers: 5,
                scale_up_threshold: 80.0,
                scale_down_threshold: 20.0,
                scale_up_cooldown: ChronoDuration::seconds(60),
                scale_down_cooldown: ChronoDuration::seconds(60),
                strategy: ScalingStrategy::Reactive,
                last_scale_action: None,
            },
            workers: vec![worker(WorkerStatus::Busy), worker(WorkerStatus::Ready), worker(WorkerStatus::Ready)],
            status: WorkerPoolStatus::Active,
        };

        let candidates = pool.select_scale_down_candidates(2);
        assert_eq!(candidates.len(), 2);
        assert!(pool
            .workers
            .iter()
            .filter(|w| candidates.contains(&w.id))
            .all(|w| w.status == WorkerStatus::Ready));
    }

    #[test]
    fn worker_health_respects_timeout() {
        let mut w = worker(WorkerStatus::Ready);
        w.last_heartbeat = Utc::now() - ChronoDuration::seconds(120);
        assert!(!w.is_healthy(ChronoDuration::seconds(30), Utc::now()));
        assert!(w.is_healthy(ChronoDuration::seconds(300), Utc::now()));
    }
}
