//! `HODEI_EVENTS_*` runtime configuration (spec §13).

#[derive(Debug, Clone, Copy)]
pub struct EventsConfig {
    /// PUSH_STREAM inbox size ceiling; exceeding it closes the subscription
    /// with `OverflowError` (spec §5 "Backpressure").
    pub inbox_ceiling: usize,
    pub webhook_max_attempts: u32,
    pub webhook_initial_backoff_ms: u64,
    pub webhook_max_backoff_ms: u64,
}

impl EventsConfig {
    pub fn from_env() -> Self {
        Self {
            inbox_ceiling: std::env::var("HODEI_EVENTS_INBOX_CEILING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
            webhook_max_attempts: std::env::var("HODEI_EVENTS_WEBHOOK_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            webhook_initial_backoff_ms: std::env::var("HODEI_EVENTS_WEBHOOK_INITIAL_BACKOFF_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(500),
            webhook_max_backoff_ms: std::env::var("HODEI_EVENTS_WEBHOOK_MAX_BACKOFF_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60_000),
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            inbox_ceiling: 10_000,
            webhook_max_attempts: 5,
            webhook_initial_backoff_ms: 500,
            webhook_max_backoff_ms: 60_000,
        }
    }
}
