//! `HODEI_EXECUTION_*` runtime configuration (spec §13).

#[derive(Debug, Clone, Copy)]
pub struct ExecutionConfig {
    /// Grace period between a graceful cancel signal and forced termination
    /// (spec §4.7 "await grace period, forcibly terminate via driver").
    pub cancel_grace_period_ms: u64,
}

impl ExecutionConfig {
    pub fn from_env() -> Self {
        Self {
            cancel_grace_period_ms: std::env::var("HODEI_EXECUTION_CANCEL_GRACE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self { cancel_grace_period_ms: 10_000 }
    }
}
