//! The Compute Driver (spec §4.1): a port trait core logic depends on, plus
//! the reference container-daemon adapter backed by `bollard`.

pub mod config;
pub mod container_daemon;
pub mod port;
pub mod types;

pub use config::DriverConfig;
pub use container_daemon::{ContainerDaemonDriver, DEFAULT_ORCHESTRATOR_HOST};
pub use port::{ComputeDriver, Result};
pub use types::{
    standard_instance_types, HealthCheckResult, InstanceSpec, InstanceStatus, InstanceSummary, InstanceTypeName,
    InstanceTypeSpec, ScaleResult,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_tiers_match_spec_table() {
        let tiers = standard_instance_types();
        assert_eq!(tiers.len(), 4);
        let small = tiers.iter().find(|t| t.name == InstanceTypeName::Small).unwrap();
        assert_eq!(small.cpu.as_cores(), 1.0);
        assert_eq!(small.memory.as_gib(), 2.0);
        let xlarge = tiers.iter().find(|t| t.name == InstanceTypeName::XLarge).unwrap();
        assert_eq!(xlarge.cpu.as_cores(), 8.0);
        assert_eq!(xlarge.memory.as_gib(), 16.0);
    }

    #[test]
    fn config_from_env_defaults() {
        // Clear to avoid bleed from other test processes sharing env.
        std::env::remove_var("HODEI_DRIVER_SOCKET");
        std::env::remove_var("HODEI_DRIVER_TIMEOUT_MS");
        let cfg = DriverConfig::from_env();
        assert_eq!(cfg.socket_path, "unix:///var/run/docker.sock");
        assert_eq!(cfg.timeout_ms, 30_000);
    }
}
