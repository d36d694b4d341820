//! Effective-priority arithmetic (spec §4.9). Pure function, no I/O — kept
//! separate the same way `hodei_pool::autoscaler` isolates scaling math
//! from the service that applies it.

use chrono::{DateTime, Utc};

const MAX_AGING_BONUS: f64 = 100.0;
const AGING_RATE_PER_MINUTE: f64 = 0.1;
const DEADLINE_PASSED_BONUS: f64 = 500.0;
const DEADLINE_IMMINENT_BONUS: f64 = 200.0;

/// ```text
/// base = priority.value
/// agingBonus = min(100.0, waitMinutes * 0.1)
/// deadlineBonus = (deadline passed) ? +500 :
///                 (remaining < 2*estimatedDuration) ? +200 : 0
/// effectivePriority = base + agingBonus + deadlineBonus
/// ```
pub fn effective_priority(
    base: f64,
    queued_at: DateTime<Utc>,
    now: DateTime<Utc>,
    deadline: Option<DateTime<Utc>>,
    estimated_duration_secs: Option<i64>,
) -> f64 {
    let wait_minutes = (now - queued_at).num_seconds().max(0) as f64 / 60.0;
    let aging_bonus = (wait_minutes * AGING_RATE_PER_MINUTE).min(MAX_AGING_BONUS);

    let deadline_bonus = match deadline {
        Some(deadline) if now >= deadline => DEADLINE_PASSED_BONUS,
        Some(deadline) => {
            let remaining_secs = (deadline - now).num_seconds().max(0) as f64;
            let estimated_secs = estimated_duration_secs.unwrap_or(0) as f64;
            if remaining_secs < 2.0 * estimated_secs {
                DEADLINE_IMMINENT_BONUS
            } else {
                0.0
            }
        }
        None => 0.0,
    };

    base + aging_bonus + deadline_bonus
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn aging_overtakes_base_priority_ordering_spec_scenario() {
        let t0 = Utc::now();
        let now = t0 + Duration::hours(2);

        let j1 = effective_priority(500.0, t0, now, None, None);
        let j2 = effective_priority(800.0, t0 + Duration::hours(1), now, None, None);

        assert!((j1 - 512.0).abs() < 1e-9);
        assert!((j2 - 806.0).abs() < 1e-9);
        assert!(j2 > j1);
    }

    #[test]
    fn passed_deadline_overrides_base_priority_ordering() {
        let t0 = Utc::now();
        let now = t0 + Duration::hours(2);
        let deadline = t0 + Duration::hours(1);

        let j1 = effective_priority(500.0, t0, now, Some(deadline), None);
        assert!((j1 - 1012.0).abs() < 1e-9);
    }

    #[test]
    fn aging_bonus_is_monotone_non_decreasing_in_wait_time() {
        let t0 = Utc::now();
        let mut last = effective_priority(500.0, t0, t0, None, None);
        for minutes in [1, 5, 30, 60, 120, 600] {
            let now = t0 + Duration::minutes(minutes);
            let current = effective_priority(500.0, t0, now, None, None);
            assert!(current >= last);
            last = current;
        }
    }

    #[test]
    fn aging_bonus_caps_at_100() {
        let t0 = Utc::now();
        let now = t0 + Duration::hours(100);
        assert_eq!(effective_priority(0.0, t0, now, None, None), 100.0);
    }

    #[test]
    fn imminent_deadline_adds_bonus_without_passing_it() {
        let t0 = Utc::now();
        let now = t0;
        let deadline = t0 + Duration::seconds(100);
        let priority = effective_priority(500.0, t0, now, Some(deadline), Some(60));
        assert_eq!(priority, 700.0);
    }
}
