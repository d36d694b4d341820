//! `HODEI_POOL_*` / `HODEI_AUTOSCALER_*` runtime configuration (spec §13).

#[derive(Debug, Clone, Copy)]
pub struct AutoscalerConfig {
    pub tick_interval_ms: u64,
    pub default_cooldown_seconds: i64,
}

impl AutoscalerConfig {
    pub fn from_env() -> Self {
        Self {
            tick_interval_ms: std::env::var("HODEI_AUTOSCALER_TICK_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15_000),
            default_cooldown_seconds: std::env::var("HODEI_AUTOSCALER_DEFAULT_COOLDOWN_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(120),
        }
    }
}

impl Default for AutoscalerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 15_000,
            default_cooldown_seconds: 120,
        }
    }
}
