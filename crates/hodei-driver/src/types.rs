//! Driver-facing value types (spec §4.1, §3 WorkerTemplate).

use std::collections::HashMap;

use hodei_core::{Bytes, InstanceId, Millicores, PoolId, ProvisioningError};
use serde::{Deserialize, Serialize};

/// Status of a provisioned compute instance, normalized from whatever the
/// underlying driver reports (spec §4.1 mapping table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceStatus {
    Provisioning,
    Running,
    Stopped,
    Failed,
    Terminated,
}

/// Everything needed to provision one instance (spec §4.1, §3 ResourceRequirements).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceSpec {
    pub worker_id: String,
    pub image: String,
    pub cpu: Millicores,
    pub memory: Bytes,
    pub env: HashMap<String, String>,
    pub labels: HashMap<String, String>,
}

/// A single entry returned by `list`/`listAll`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceSummary {
    pub instance_id: InstanceId,
    pub pool_id: PoolId,
    pub status: InstanceStatus,
}

/// Fixed instance-type tiers the driver advertises (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceTypeName {
    Small,
    Medium,
    Large,
    XLarge,
    Custom,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InstanceTypeSpec {
    pub name: InstanceTypeName,
    pub cpu: Millicores,
    pub memory: Bytes,
}

/// The fixed catalogue from spec §4.1: SMALL 1c/2Gi, MEDIUM 2c/4Gi,
/// LARGE 4c/8Gi, XLARGE 8c/16Gi, plus an open-ended CUSTOM tier.
pub fn standard_instance_types() -> Vec<InstanceTypeSpec> {
    vec![
        InstanceTypeSpec {
            name: InstanceTypeName::Small,
            cpu: Millicores(1000),
            memory: Bytes(2 * Bytes::GI),
        },
        InstanceTypeSpec {
            name: InstanceTypeName::Medium,
            cpu: Millicores(2000),
            memory: Bytes(4 * Bytes::GI),
        },
        InstanceTypeSpec {
            name: InstanceTypeName::Large,
            cpu: Millicores(4000),
            memory: Bytes(8 * Bytes::GI),
        },
        InstanceTypeSpec {
            name: InstanceTypeName::XLarge,
            cpu: Millicores(8000),
            memory: Bytes(16 * Bytes::GI),
        },
    ]
}

/// Result of a `scaleTo` call: partial failures accumulate rather than abort
/// the whole operation (spec §4.1).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScaleResult {
    pub requested: u32,
    pub actual: u32,
    pub provisioned: Vec<InstanceId>,
    pub failed: Vec<String>,
}

/// Result of `healthCheck` (spec §4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub daemon_version: String,
    pub container_count: u64,
    pub memory_total_bytes: u64,
}

pub(crate) fn provisioning_unavailable() -> ProvisioningError {
    ProvisioningError::ResourceUnavailable
}
