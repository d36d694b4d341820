//! Backoff between retry attempts (spec §4.9 "requeue with attempts+1 and a
//! fresh queuedAt"). The source leaves the exact schedule unspecified; this
//! mirrors the bounded-exponential shape `hodei_events::webhook` uses for
//! webhook retries.

use chrono::Duration;

const INITIAL_BACKOFF_SECONDS: i64 = 5;
const MAX_BACKOFF_SECONDS: i64 = 300;

pub fn backoff_duration(attempts: u32) -> Duration {
    let seconds = INITIAL_BACKOFF_SECONDS.saturating_mul(1i64 << attempts.min(10));
    Duration::seconds(seconds.min(MAX_BACKOFF_SECONDS))
}
