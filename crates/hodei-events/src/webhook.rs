//! Outbound webhook delivery: at-least-once, bounded exponential backoff
//! (spec §4.8, §5 "Cancellation and timeouts").

use std::time::Duration;

use tracing::{error, warn};

use crate::config::EventsConfig;
use crate::model::ExecutionUpdate;

/// Fire-and-forget delivery loop, meant to be `tokio::spawn`ed per update.
/// Retries on both transport errors and non-2xx responses.
pub async fn deliver(client: reqwest::Client, url: String, update: ExecutionUpdate, config: EventsConfig) {
    let mut backoff_ms = config.webhook_initial_backoff_ms;

    for attempt in 1..=config.webhook_max_attempts {
        let outcome = client.post(&url).json(&update).send().await;
        match outcome {
            Ok(resp) if resp.status().is_success() => return,
            Ok(resp) => warn!(status = %resp.status(), attempt, url = %url, "webhook rejected"),
            Err(err) => warn!(error = %err, attempt, url = %url, "webhook delivery failed"),
        }

        if attempt < config.webhook_max_attempts {
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            backoff_ms = (backoff_ms * 2).min(config.webhook_max_backoff_ms);
        }
    }

    error!(url = %url, attempts = config.webhook_max_attempts, "webhook delivery exhausted retries");
}
