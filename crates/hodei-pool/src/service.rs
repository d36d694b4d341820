//! Wires scaling decisions to the driver: `driver.scaleTo(poolId, target)`
//! (spec §4.5).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use hodei_core::{HodeiError, PoolId};
use hodei_driver::ComputeDriver;
use tokio::sync::Mutex;
use tracing::info;

use crate::autoscaler::{calculate_optimal, should_scale_down, should_scale_up, ScalingContext};
use crate::model::{ScaleAction, ScaleDirection, ScalingPolicy};

pub struct Autoscaler {
    driver: Arc<dyn ComputeDriver>,
    policies: Mutex<HashMap<String, ScalingPolicy>>,
}

impl Autoscaler {
    pub fn new(driver: Arc<dyn ComputeDriver>) -> Self {
        Self {
            driver,
            policies: Mutex::new(HashMap::new()),
        }
    }

    pub async fn set_policy(&self, pool_id: PoolId, policy: ScalingPolicy) {
        self.policies.lock().await.insert(pool_id.as_str().to_string(), policy);
    }

    /// One evaluate-and-apply step for a single pool. Returns the recorded
    /// `ScaleAction`, or `None` if no scaling was warranted this tick.
    pub async fn evaluate(&self, pool_id: &PoolId, ctx: ScalingContext) -> Result<Option<ScaleAction>, HodeiError> {
        let now = Utc::now();
        let mut policies = self.policies.lock().await;
        let policy = policies
            .get_mut(pool_id.as_str())
            .ok_or_else(|| HodeiError::NotFound(format!("no scaling policy registered for pool {pool_id}")))?;

        let direction = if should_scale_up(policy, &ctx, now) {
            Some(ScaleDirection::Up)
        } else if should_scale_down(policy, &ctx, now) {
            Some(ScaleDirection::Down)
        } else {
            None
        };

        let Some(direction) = direction else {
            return Ok(None);
        };

        let target = calculate_optimal(policy, &ctx);
        if target == ctx.current_size {
            return Ok(None);
        }

        let result = self
            .driver
            .scale_to(pool_id, target)
            .await
            .map_err(HodeiError::from)?;

        let action = ScaleAction {
            direction,
            from_size: ctx.current_size,
            to_size: result.actual,
            timestamp: now,
        };
        info!(pool_id = %pool_id, direction = ?action.direction, from = action.from_size, to = action.to_size, "pool scaled");
        policy.last_scale_action = Some(action.clone());
        Ok(Some(action))
    }
}
