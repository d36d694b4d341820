//! `HODEI_QUOTA_*` runtime configuration (spec §13).

#[derive(Debug, Clone, Copy)]
pub struct QuotaConfig {
    pub monitor_interval_ms: u64,
}

impl QuotaConfig {
    pub fn from_env() -> Self {
        Self {
            monitor_interval_ms: std::env::var("HODEI_QUOTA_MONITOR_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30_000),
        }
    }
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            monitor_interval_ms: 30_000,
        }
    }
}
