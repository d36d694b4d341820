//! `HODEI_ORCHESTRATOR_*` runtime configuration (spec §13).

#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    pub processing_tick_interval_ms: u64,
}

impl OrchestratorConfig {
    pub fn from_env() -> Self {
        Self {
            processing_tick_interval_ms: std::env::var("HODEI_ORCHESTRATOR_TICK_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1_000),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self { processing_tick_interval_ms: 1_000 }
    }
}
