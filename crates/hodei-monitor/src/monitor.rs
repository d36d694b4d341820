//! `ResourceMonitor`: per-pool sampling with expiring cache and a broadcast
//! stream, run as a background tick loop (spec §4.3).
//!
//! The tick loop follows the same shape as the teacher's
//! `OutboxDispatcher`/`ob-workflow` listener loops: a `tokio::select!` over
//! an interval tick and a shutdown watch channel, catching and logging every
//! error a tick produces instead of letting it escape `tokio::spawn`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use hodei_core::{HodeiError, PoolId};
use tokio::sync::{watch, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, error};

use crate::config::MonitorConfig;
use crate::port::PoolStatsSource;
use crate::types::{cpu_usage_percent, memory_usage_percent, ResourcePoolUtilization};

const BROADCAST_CAPACITY: usize = 256;

struct CacheEntry {
    sampled_at: Instant,
    value: ResourcePoolUtilization,
}

pub struct ResourceMonitor {
    source: Arc<dyn PoolStatsSource>,
    config: MonitorConfig,
    cache: Mutex<HashMap<String, CacheEntry>>,
    broadcast_tx: broadcast::Sender<ResourcePoolUtilization>,
}

impl ResourceMonitor {
    pub fn new(source: Arc<dyn PoolStatsSource>, config: MonitorConfig) -> Self {
        let (broadcast_tx, _rx) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            source,
            config,
            cache: Mutex::new(HashMap::new()),
            broadcast_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ResourcePoolUtilization> {
        self.broadcast_tx.subscribe()
    }

    /// Pull-query entry point (spec §4.3: "on a pull query and on a
    /// broadcast stream"). Serves from cache within `cache_expiration_ms`.
    pub async fn sample(&self, pool_id: &PoolId) -> Result<ResourcePoolUtilization, HodeiError> {
        {
            let cache = self.cache.lock().await;
            if let Some(entry) = cache.get(pool_id.as_str()) {
                if entry.sampled_at.elapsed() < Duration::from_millis(self.config.cache_expiration_ms) {
                    return Ok(entry.value.clone());
                }
            }
        }

        let value = self.sample_uncached(pool_id).await?;

        let mut cache = self.cache.lock().await;
        cache.insert(
            pool_id.as_str().to_string(),
            CacheEntry {
                sampled_at: Instant::now(),
                value: value.clone(),
            },
        );
        let _ = self.broadcast_tx.send(value.clone());
        Ok(value)
    }

    async fn sample_uncached(&self, pool_id: &PoolId) -> Result<ResourcePoolUtilization, HodeiError> {
        let samples = self.source.sample_containers(pool_id).await?;
        let (running_jobs, queued_jobs) = self.source.job_counts(pool_id).await?;
        let (total_cpu, total_memory, total_disk) = self.source.capacity(pool_id).await?;

        let used_cpu_fraction = if samples.is_empty() {
            0.0
        } else {
            samples.iter().map(cpu_usage_percent).sum::<f64>() / samples.len() as f64 / 100.0
        };
        let used_disk: u64 = samples.iter().map(|s| s.disk_usage_bytes).sum();

        Ok(ResourcePoolUtilization {
            pool_id: pool_id.clone(),
            total_cpu_millicores: total_cpu,
            used_cpu_millicores: (total_cpu as f64 * used_cpu_fraction) as u64,
            total_memory_bytes: total_memory,
            used_memory_bytes: (total_memory as f64 * memory_usage_percent(&samples) / 100.0) as u64,
            total_disk_bytes: total_disk,
            used_disk_bytes: used_disk,
            running_jobs,
            queued_jobs,
            timestamp: Utc::now(),
        })
    }

    /// Background tick loop: samples every known pool on each interval and
    /// broadcasts the result. Runs until `shutdown` reports `true`.
    pub async fn run(self: Arc<Self>, pools: Vec<PoolId>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(Duration::from_millis(self.config.interval_ms));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    for pool_id in &pools {
                        match self.sample(pool_id).await {
                            Ok(_) => debug!(pool_id = %pool_id, "resource monitor tick sampled pool"),
                            Err(e) => error!(pool_id = %pool_id, error = %e, "resource monitor tick failed"),
                        }
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContainerStatsSample;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PoolStatsSource for FakeSource {
        async fn sample_containers(&self, _pool_id: &PoolId) -> Result<Vec<ContainerStatsSample>, HodeiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![ContainerStatsSample {
                cpu_delta_ns: 10,
                system_delta_ns: 100,
                online_cpus: 1,
                memory_usage_bytes: 50,
                memory_limit_bytes: 100,
                disk_usage_bytes: 10,
                rx_bytes: 0,
                tx_bytes: 0,
            }])
        }

        async fn job_counts(&self, _pool_id: &PoolId) -> Result<(u64, u64), HodeiError> {
            Ok((1, 2))
        }

        async fn capacity(&self, _pool_id: &PoolId) -> Result<(u64, u64, u64), HodeiError> {
            Ok((4000, 8 * hodei_core::Bytes::GI, 100 * hodei_core::Bytes::GI))
        }
    }

    #[tokio::test]
    async fn repeated_sample_within_expiration_hits_cache() {
        let source = Arc::new(FakeSource { calls: AtomicUsize::new(0) });
        let monitor = ResourceMonitor::new(source.clone(), MonitorConfig {
            interval_ms: 1000,
            cache_expiration_ms: 60_000,
        });
        let pool_id = PoolId::new("pool-1").unwrap();
        monitor.sample(&pool_id).await.unwrap();
        monitor.sample(&pool_id).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn sample_publishes_to_subscribers() {
        let source = Arc::new(FakeSource { calls: AtomicUsize::new(0) });
        let monitor = Arc::new(ResourceMonitor::new(source, MonitorConfig::default()));
        let mut rx = monitor.subscribe();
        let pool_id = PoolId::new("pool-1").unwrap();
        monitor.sample(&pool_id).await.unwrap();
        let received = rx.recv().await.unwrap();
        assert_eq!(received.pool_id, pool_id);
    }
}
