//! `HODEI_MONITOR_*` runtime configuration (spec §13).

#[derive(Debug, Clone, Copy)]
pub struct MonitorConfig {
    pub interval_ms: u64,
    pub cache_expiration_ms: u64,
}

impl MonitorConfig {
    pub fn from_env() -> Self {
        Self {
            interval_ms: std::env::var("HODEI_MONITOR_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(20_000),
            cache_expiration_ms: std::env::var("HODEI_MONITOR_CACHE_EXPIRATION_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5_000),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_ms: 20_000,
            cache_expiration_ms: 5_000,
        }
    }
}
