//! Resource Monitor (spec §4.3): periodic per-pool utilization sampling
//! through the driver, with an expiring cache and a broadcast stream.

pub mod config;
pub mod monitor;
pub mod port;
pub mod types;

pub use config::MonitorConfig;
pub use monitor::ResourceMonitor;
pub use port::PoolStatsSource;
pub use types::{cpu_usage_percent, memory_usage_percent, ContainerStatsSample, ResourcePoolUtilization};
