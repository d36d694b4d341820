//! `HODEI_DRIVER_*` runtime configuration (spec §13), mirroring
//! `sem_os_server::main`'s `std::env::var(...).expect(...)` /
//! `.unwrap_or_else(...)` pattern rather than a config-file crate.

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub socket_path: String,
    pub api_version: Option<String>,
    pub timeout_ms: u64,
}

impl DriverConfig {
    pub fn from_env() -> Self {
        Self {
            socket_path: std::env::var("HODEI_DRIVER_SOCKET")
                .unwrap_or_else(|_| "unix:///var/run/docker.sock".to_string()),
            api_version: std::env::var("HODEI_DRIVER_API_VERSION").ok(),
            timeout_ms: std::env::var("HODEI_DRIVER_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30_000),
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            socket_path: "unix:///var/run/docker.sock".to_string(),
            api_version: None,
            timeout_ms: 30_000,
        }
    }
}
