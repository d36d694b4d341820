//! Resource Monitor value types (spec §4.3).

use chrono::{DateTime, Utc};
use hodei_core::PoolId;
use serde::{Deserialize, Serialize};

/// One container's raw stats delta, as the driver would report it. Kept
/// separate from `ComputeDriver` so this crate can be exercised without a
/// live container runtime — the composition root supplies an adapter that
/// turns driver stats calls into these samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerStatsSample {
    pub cpu_delta_ns: u64,
    pub system_delta_ns: u64,
    pub online_cpus: u32,
    pub memory_usage_bytes: u64,
    pub memory_limit_bytes: u64,
    pub disk_usage_bytes: u64,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// Snapshot of one pool's resource utilization (spec §4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourcePoolUtilization {
    pub pool_id: PoolId,
    pub total_cpu_millicores: u64,
    pub used_cpu_millicores: u64,
    pub total_memory_bytes: u64,
    pub used_memory_bytes: u64,
    pub total_disk_bytes: u64,
    pub used_disk_bytes: u64,
    pub running_jobs: u64,
    pub queued_jobs: u64,
    pub timestamp: DateTime<Utc>,
}

/// `cpuDelta/systemDelta * onlineCpus * 100` (spec §4.3), guarding against
/// the system delta being zero (no time has passed / fresh container).
pub fn cpu_usage_percent(sample: &ContainerStatsSample) -> f64 {
    if sample.system_delta_ns == 0 {
        return 0.0;
    }
    (sample.cpu_delta_ns as f64 / sample.system_delta_ns as f64) * sample.online_cpus as f64 * 100.0
}

/// Sum-of-usage / sum-of-limit memory percentage across a pool's containers.
pub fn memory_usage_percent(samples: &[ContainerStatsSample]) -> f64 {
    let used: u64 = samples.iter().map(|s| s.memory_usage_bytes).sum();
    let limit: u64 = samples.iter().map(|s| s.memory_limit_bytes).sum();
    if limit == 0 {
        return 0.0;
    }
    used as f64 / limit as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_percent_zero_system_delta_is_zero_not_nan() {
        let sample = ContainerStatsSample {
            cpu_delta_ns: 500,
            system_delta_ns: 0,
            online_cpus: 4,
            ..Default::default()
        };
        assert_eq!(cpu_usage_percent(&sample), 0.0);
    }

    #[test]
    fn cpu_percent_formula() {
        let sample = ContainerStatsSample {
            cpu_delta_ns: 50,
            system_delta_ns: 1000,
            online_cpus: 2,
            ..Default::default()
        };
        assert_eq!(cpu_usage_percent(&sample), 10.0);
    }

    #[test]
    fn memory_percent_zero_limit_is_zero() {
        assert_eq!(memory_usage_percent(&[]), 0.0);
    }
}
