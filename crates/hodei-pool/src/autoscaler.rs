//! Scaling decision math (spec §4.5). Kept as pure functions over a
//! `ScalingContext` snapshot so the formulas are unit-testable without a
//! running pool or driver, mirroring how `hodei_core::version`/`resources`
//! keep parsing pure and separate from any I/O.

use chrono::{DateTime, Utc};

use crate::model::{ScalingPolicy, ScalingStrategy};

/// A point-in-time snapshot an autoscaler tick feeds the decision
/// functions. `worker_utilization` is a 0-100 percentage.
#[derive(Debug, Clone, Copy)]
pub struct ScalingContext {
    pub queue_length: u32,
    pub avg_wait_seconds: f64,
    pub worker_utilization: f64,
    pub current_size: u32,
    pub available_workers: u32,
    pub available_cpu_millicores: u64,
    pub available_memory_bytes: u64,
    pub worker_cpu_millicores: u64,
    pub worker_memory_bytes: u64,
    pub available_nodes: u32,
}

/// Baseline queue-length/wait-time trigger shared by up- and down-scaling
/// gates (spec §4.5 leaves the exact X/T constants unspecified; fixed here
/// as an Open Question decision — see DESIGN.md).
const SCALE_UP_WAIT_SECONDS: f64 = 30.0;

pub fn should_scale_up(policy: &ScalingPolicy, ctx: &ScalingContext, now: DateTime<Utc>) -> bool {
    if ctx.available_workers >= policy.max_workers {
        return false;
    }
    if policy.in_up_cooldown(now) {
        return false;
    }
    let threshold_met = (ctx.queue_length >= 1 || ctx.avg_wait_seconds >= SCALE_UP_WAIT_SECONDS)
        && ctx.worker_utilization >= policy.scale_up_threshold;
    threshold_met
}

pub fn should_scale_down(policy: &ScalingPolicy, ctx: &ScalingContext, now: DateTime<Utc>) -> bool {
    if ctx.available_workers <= policy.min_workers {
        return false;
    }
    if policy.in_down_cooldown(now) {
        return false;
    }
    ctx.queue_length == 0 && ctx.worker_utilization <= policy.scale_down_threshold
}

/// `calculateOptimal` (spec §4.5), clamped to `[min_workers, max_workers]`.
pub fn calculate_optimal(policy: &ScalingPolicy, ctx: &ScalingContext) -> u32 {
    let raw = match policy.strategy {
        ScalingStrategy::Reactive => reactive_target(ctx, policy.min_workers),
        ScalingStrategy::Predictive => predictive_target(ctx, policy.min_workers),
        ScalingStrategy::ResourceBased => resource_based_target(ctx, policy.max_workers),
    };
    raw.clamp(policy.min_workers, policy.max_workers)
}

fn reactive_target(ctx: &ScalingContext, min_workers: u32) -> u32 {
    if ctx.queue_length == 0 {
        min_workers
    } else if ctx.queue_length <= 2 {
        ctx.current_size
    } else if ctx.avg_wait_seconds > 120.0 {
        ctx.current_size + 2
    } else if ctx.avg_wait_seconds > 30.0 {
        ctx.current_size + 1
    } else {
        ctx.current_size
    }
}

fn predictive_target(ctx: &ScalingContext, min_workers: u32) -> u32 {
    let delta = (ctx.queue_length as f64 * 0.5 + ctx.avg_wait_seconds * 0.1).floor();
    let target = ctx.current_size as i64 + delta as i64;
    target.max(min_workers as i64) as u32
}

fn resource_based_target(ctx: &ScalingContext, max_workers: u32) -> u32 {
    let by_queue = (ctx.queue_length as f64 * 1.2).ceil() as u32;
    let by_cpu = if ctx.worker_cpu_millicores == 0 {
        u32::MAX
    } else {
        (ctx.available_cpu_millicores / ctx.worker_cpu_millicores) as u32
    };
    let by_memory = if ctx.worker_memory_bytes == 0 {
        u32::MAX
    } else {
        (ctx.available_memory_bytes / ctx.worker_memory_bytes) as u32
    };
    let by_nodes = ctx.available_nodes.saturating_mul(5);
    let max_by_resources = by_cpu.min(by_memory).min(by_nodes);
    by_queue.min(max_by_resources).min(max_workers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn policy(strategy: ScalingStrategy) -> ScalingPolicy {
        ScalingPolicy {
            min_workers: 1,
            max_workers: 10,
            scale_up_threshold: 70.0,
            scale_down_threshold: 20.0,
            scale_up_cooldown: Duration::seconds(60),
            scale_down_cooldown: Duration::seconds(60),
            strategy,
            last_scale_action: None,
        }
    }

    fn base_ctx() -> ScalingContext {
        ScalingContext {
            queue_length: 0,
            avg_wait_seconds: 0.0,
            worker_utilization: 0.0,
            current_size: 3,
            available_workers: 3,
            available_cpu_millicores: 8000,
            available_memory_bytes: 16 * hodei_core::Bytes::GI,
            worker_cpu_millicores: 1000,
            worker_memory_bytes: 2 * hodei_core::Bytes::GI,
            available_nodes: 4,
        }
    }

    #[test]
    fn zero_queue_length_reactive_yields_min_workers() {
        let p = policy(ScalingStrategy::Reactive);
        let ctx = base_ctx();
        assert_eq!(calculate_optimal(&p, &ctx), p.min_workers);
    }

    #[test]
    fn reactive_small_queue_holds_current() {
        let p = policy(ScalingStrategy::Reactive);
        let ctx = ScalingContext { queue_length: 2, ..base_ctx() };
        assert_eq!(calculate_optimal(&p, &ctx), ctx.current_size);
    }

    #[test]
    fn reactive_long_wait_adds_two() {
        let p = policy(ScalingStrategy::Reactive);
        let ctx = ScalingContext { queue_length: 5, avg_wait_seconds: 150.0, ..base_ctx() };
        assert_eq!(calculate_optimal(&p, &ctx), ctx.current_size + 2);
    }

    #[test]
    fn predictive_floors_and_clamps_to_min() {
        let p = policy(ScalingStrategy::Predictive);
        let ctx = ScalingContext { queue_length: 3, avg_wait_seconds: 5.0, current_size: 1, ..base_ctx() };
        // floor(3*0.5 + 5*0.1) = floor(2.0) = 2 -> 1 + 2 = 3
        assert_eq!(calculate_optimal(&p, &ctx), 3);
    }

    #[test]
    fn resource_based_respects_resource_ceiling() {
        let p = policy(ScalingStrategy::ResourceBased);
        let ctx = ScalingContext {
            queue_length: 100,
            available_cpu_millicores: 3000,
            worker_cpu_millicores: 1000,
            available_memory_bytes: 100 * hodei_core::Bytes::GI,
            worker_memory_bytes: 2 * hodei_core::Bytes::GI,
            available_nodes: 1,
            ..base_ctx()
        };
        // by_queue huge, by_cpu=3, by_memory=50, by_nodes=5 -> ceiling 3
        assert_eq!(calculate_optimal(&p, &ctx), 3);
    }

    #[test]
    fn should_scale_up_requires_utilization_and_trigger() {
        let p = policy(ScalingStrategy::Reactive);
        let now = Utc::now();
        let ctx = ScalingContext { queue_length: 1, worker_utilization: 80.0, ..base_ctx() };
        assert!(should_scale_up(&p, &ctx, now));

        let low_util = ScalingContext { worker_utilization: 10.0, ..ctx };
        assert!(!should_scale_up(&p, &low_util, now));
    }

    #[test]
    fn should_scale_up_respects_cooldown() {
        let mut p = policy(ScalingStrategy::Reactive);
        let now = Utc::now();
        p.last_scale_action = Some(crate::model::ScaleAction {
            direction: crate::model::ScaleDirection::Up,
            from_size: 1,
            to_size: 2,
            timestamp: now,
        });
        let ctx = ScalingContext { queue_length: 1, worker_utilization: 90.0, ..base_ctx() };
        assert!(!should_scale_up(&p, &ctx, now));
    }

    #[test]
    fn should_scale_down_respects_min_workers() {
        let p = policy(ScalingStrategy::Reactive);
        let now = Utc::now();
        let ctx = ScalingContext { available_workers: 1, queue_length: 0, worker_utilization: 5.0, ..base_ctx() };
        assert!(!should_scale_down(&p, &ctx, now));
    }
}
