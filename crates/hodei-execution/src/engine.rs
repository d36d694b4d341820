//! `ExecutionEngine`: owns a job from `startExecution` until it reaches a
//! terminal status (spec §4.7). The orchestrator hands off and does not
//! re-enter.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use hodei_core::{ExecutionId, HodeiError, Job, ResourcePool, WorkerId, WorkerTemplate};
use hodei_driver::{ComputeDriver, InstanceSpec};
use hodei_events::{EventRegistry, ExecutionEvent, ExecutionUpdate};
use hodei_quota::QuotaEngine;
use hodei_wire::ControlKind;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::ExecutionConfig;
use crate::model::{Execution, ExecutionStatus};
use crate::port::WorkerSignaler;

pub struct ExecutionEngine {
    driver: Arc<dyn ComputeDriver>,
    events: Arc<EventRegistry>,
    quota: Arc<QuotaEngine>,
    signaler: Arc<dyn WorkerSignaler>,
    config: ExecutionConfig,
    executions: Mutex<HashMap<String, Execution>>,
}

impl ExecutionEngine {
    pub fn new(
        driver: Arc<dyn ComputeDriver>,
        events: Arc<EventRegistry>,
        quota: Arc<QuotaEngine>,
        signaler: Arc<dyn WorkerSignaler>,
        config: ExecutionConfig,
    ) -> Self {
        Self {
            driver,
            events,
            quota,
            signaler,
            config,
            executions: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, execution_id: &ExecutionId) -> Option<Execution> {
        self.executions.lock().await.get(execution_id.as_str()).cloned()
    }

    /// `startExecution(job, pool, orchestratorToken) -> execution | error`
    /// (spec §4.7): provisions the instance, registers the execution, and
    /// emits the stream-start event.
    pub async fn start_execution(
        &self,
        job: &Job,
        pool: &ResourcePool,
        template: &WorkerTemplate,
        orchestrator_token: &str,
    ) -> Result<Execution, HodeiError> {
        let execution_id = ExecutionId::new(format!("exec-{}-{}", job.id, Utc::now().timestamp_nanos_opt().unwrap_or(0)))?;
        let worker_id = WorkerId::new(format!("worker-{execution_id}"))?;

        let mut env = template.env.clone();
        env.insert("HODEI_ORCHESTRATOR_TOKEN".into(), orchestrator_token.to_string());
        env.insert("HODEI_JOB_ID".into(), job.id.to_string());

        let spec = InstanceSpec {
            worker_id: worker_id.as_str().to_string(),
            image: template.image.clone(),
            cpu: template.resources.cpu,
            memory: template.resources.memory,
            env,
            labels: template.labels.clone(),
        };

        let instance_id = self.driver.provision(&pool.id, spec).await.map_err(HodeiError::from)?;

        let mut execution = Execution::new(
            execution_id.clone(),
            job.id.clone(),
            pool.id.clone(),
            worker_id,
            template.resources.cpu.0,
            template.resources.memory.as_gib(),
            template.resources.storage.map(|b| b.as_gib()).unwrap_or(0.0),
        );
        execution.instance_id = Some(instance_id);
        execution.transition_to(ExecutionStatus::Running)?;

        self.executions.lock().await.insert(execution_id.as_str().to_string(), execution.clone());
        self.publish_event(&execution_id, "started", "execution started").await;

        info!(execution_id = %execution_id, job_id = %job.id, pool_id = %pool.id, "execution started");
        Ok(execution)
    }

    /// Worker-reported terminal outcome (spec §4.7 "On worker-side failure
    /// (exit≠0) the execution transitions to FAILED with captured exit code
    /// and output tail.").
    pub async fn report_worker_exit(
        &self,
        execution_id: &ExecutionId,
        exit_code: i32,
        output_tail: Vec<String>,
    ) -> Result<Execution, HodeiError> {
        let status = if exit_code == 0 { ExecutionStatus::Completed } else { ExecutionStatus::Failed };
        self.finish(execution_id, status, Some(exit_code), output_tail).await
    }

    /// Graceful cancel: signal the worker, wait out the grace period, then
    /// force-terminate via the driver regardless of whether the worker ever
    /// acknowledged (spec §4.7, §5 "cancellation is cooperative").
    pub async fn cancel(&self, execution_id: &ExecutionId) -> Result<Execution, HodeiError> {
        let worker_id = {
            let executions = self.executions.lock().await;
            let execution = executions
                .get(execution_id.as_str())
                .ok_or_else(|| HodeiError::NotFound(format!("execution {execution_id} not found")))?;
            execution.worker_id.clone()
        };

        if let Err(err) = self.signaler.signal(&worker_id, ControlKind::Cancel).await {
            warn!(execution_id = %execution_id, error = %err, "graceful cancel signal failed, proceeding to forced termination");
        }
        tokio::time::sleep(Duration::from_millis(self.config.cancel_grace_period_ms)).await;

        self.finish(execution_id, ExecutionStatus::Cancelled, None, Vec::new()).await
    }

    /// Shared teardown for every terminal outcome: release the instance,
    /// return the job's resource footprint to the quota engine, and drop
    /// subscriptions. Spec §4.7 names this sequence for normal completion
    /// only; a failed or cancelled execution equally no longer needs its
    /// instance or subscriptions, so the same path covers all three.
    async fn finish(
        &self,
        execution_id: &ExecutionId,
        status: ExecutionStatus,
        exit_code: Option<i32>,
        output_tail: Vec<String>,
    ) -> Result<Execution, HodeiError> {
        let mut execution = {
            let mut executions = self.executions.lock().await;
            let execution = executions
                .get_mut(execution_id.as_str())
                .ok_or_else(|| HodeiError::NotFound(format!("execution {execution_id} not found")))?;
            execution.transition_to(status)?;
            execution.exit_code = exit_code;
            for line in output_tail {
                execution.push_output_line(line);
            }
            execution.clone()
        };

        if let Some(instance_id) = &execution.instance_id {
            if let Err(err) = self.driver.terminate(instance_id).await {
                warn!(execution_id = %execution_id, error = %err, "instance termination failed during teardown");
            }
        }

        self.quota
            .remove_job(&execution.pool_id, execution.cpu_millicores, execution.memory_gb, execution.storage_gb)
            .await;

        let kind = match status {
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::Cancelled => "cancelled",
            _ => "unknown",
        };
        self.publish_event(execution_id, kind, "execution finished").await;
        self.events.cleanup_execution(execution_id).await;

        self.executions
            .lock()
            .await
            .insert(execution_id.as_str().to_string(), execution.clone());
        execution.ended_at = execution.ended_at.or(Some(Utc::now()));
        Ok(execution)
    }

    async fn publish_event(&self, execution_id: &ExecutionId, kind: &str, message: &str) {
        let overflows = self
            .events
            .notify(ExecutionUpdate::EventUpdate(ExecutionEvent {
                execution_id: execution_id.clone(),
                sequence: 0,
                kind: kind.to_string(),
                message: message.to_string(),
                timestamp: Utc::now(),
            }))
            .await;
        for overflow in overflows {
            warn!(execution_id = %execution_id, subscriber_id = %overflow.subscriber_id, "dropped overflowing subscriber");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hodei_core::{
        Bytes, Capabilities, InstanceId, JobDefinition, JobId, JobPriority, JobStatus, Millicores, PoolCapacity,
        PoolId, PoolStatus, ProvisioningError, ResourceRequirements, SchedulingHints, SecurityContext,
    };
    use hodei_driver::{HealthCheckResult, InstanceSummary, ScaleResult};
    use hodei_events::EventsConfig;
    use hodei_quota::QuotaConfig;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FakeDriver {
        terminated: AtomicU32,
    }

    #[async_trait]
    impl ComputeDriver for FakeDriver {
        async fn provision(&self, _pool_id: &PoolId, _spec: InstanceSpec) -> hodei_driver::Result<InstanceId> {
            Ok(InstanceId::new("instance-1").unwrap())
        }
        async fn terminate(&self, _instance_id: &InstanceId) -> hodei_driver::Result<()> {
            self.terminated.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn inspect(&self, _instance_id: &InstanceId) -> hodei_driver::Result<hodei_driver::InstanceStatus> {
            Err(ProvisioningError::ResourceUnavailable)
        }
        async fn list(&self, _pool_id: &PoolId) -> hodei_driver::Result<Vec<InstanceSummary>> {
            Ok(vec![])
        }
        async fn list_all(&self) -> hodei_driver::Result<Vec<InstanceSummary>> {
            Ok(vec![])
        }
        async fn scale_to(&self, _pool_id: &PoolId, _target: u32) -> hodei_driver::Result<ScaleResult> {
            Ok(ScaleResult::default())
        }
        fn available_instance_types(&self, _pool_id: &PoolId) -> Vec<hodei_driver::InstanceTypeSpec> {
            vec![]
        }
        async fn health_check(&self) -> hodei_driver::Result<HealthCheckResult> {
            Err(ProvisioningError::ResourceUnavailable)
        }
    }

    struct FakeSignaler;

    #[async_trait]
    impl WorkerSignaler for FakeSignaler {
        async fn signal(&self, _worker_id: &WorkerId, _signal: ControlKind) -> Result<(), HodeiError> {
            Ok(())
        }
    }

    fn job() -> Job {
        Job {
            id: JobId::new("job-1").unwrap(),
            name: "build".into(),
            namespace: "default".into(),
            status: JobStatus::Scheduled,
            priority: JobPriority::Normal,
            definition: JobDefinition::Inline { spec: serde_json::json!({}) },
            retry_count: 0,
            max_retries: 3,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            completed_at: None,
            created_by: None,
            latest_execution_id: None,
        }
    }

    fn pool() -> ResourcePool {
        ResourcePool {
            id: PoolId::new("pool-1").unwrap(),
            name: "pool-1".into(),
            provider_type: "container-daemon".into(),
            display_name: "pool-1".into(),
            description: String::new(),
            labels: HashMap::new(),
            annotations: HashMap::new(),
            capacity: PoolCapacity {
                total_cpu: Millicores(4000),
                total_memory: Bytes(8 * Bytes::GI),
                total_disk: Bytes::ZERO,
                available_cpu: Millicores(4000),
                available_memory: Bytes(8 * Bytes::GI),
                available_disk: Bytes::ZERO,
            },
            status: PoolStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn template() -> WorkerTemplate {
        WorkerTemplate {
            image: "img".into(),
            resources: ResourceRequirements {
                cpu: Millicores(1000),
                memory: Bytes(2 * Bytes::GI),
                storage: None,
                gpu_count: 0,
            },
            capabilities: Capabilities { languages: vec![], tools: vec![], features: vec![] },
            labels: HashMap::new(),
            env: HashMap::new(),
            scheduling_hints: SchedulingHints::default(),
            security_context: SecurityContext::default(),
            volumes: vec![],
            probes: vec![],
        }
    }

    fn engine(driver: Arc<FakeDriver>) -> ExecutionEngine {
        ExecutionEngine::new(
            driver,
            Arc::new(EventRegistry::new(EventsConfig::default())),
            Arc::new(QuotaEngine::new(QuotaConfig::default())),
            Arc::new(FakeSignaler),
            ExecutionConfig { cancel_grace_period_ms: 0 },
        )
    }

    #[tokio::test]
    async fn start_execution_provisions_and_runs() {
        let driver = Arc::new(FakeDriver { terminated: AtomicU32::new(0) });
        let engine = engine(driver);
        let execution = engine.start_execution(&job(), &pool(), &template(), "token").await.unwrap();
        assert_eq!(execution.status, ExecutionStatus::Running);
        assert!(execution.instance_id.is_some());
    }

    #[tokio::test]
    async fn nonzero_exit_transitions_to_failed_and_terminates_instance() {
        let driver = Arc::new(FakeDriver { terminated: AtomicU32::new(0) });
        let engine = engine(driver.clone());
        let started = engine.start_execution(&job(), &pool(), &template(), "token").await.unwrap();

        let finished = engine
            .report_worker_exit(&started.id, 1, vec!["boom".to_string()])
            .await
            .unwrap();
        assert_eq!(finished.status, ExecutionStatus::Failed);
        assert_eq!(finished.exit_code, Some(1));
        assert_eq!(driver.terminated.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_exit_transitions_to_completed() {
        let driver = Arc::new(FakeDriver { terminated: AtomicU32::new(0) });
        let engine = engine(driver);
        let started = engine.start_execution(&job(), &pool(), &template(), "token").await.unwrap();
        let finished = engine.report_worker_exit(&started.id, 0, vec![]).await.unwrap();
        assert_eq!(finished.status, ExecutionStatus::Completed);
    }

    #[tokio::test]
    async fn cancel_signals_then_force_terminates() {
        let driver = Arc::new(FakeDriver { terminated: AtomicU32::new(0) });
        let engine = engine(driver.clone());
        let started = engine.start_execution(&job(), &pool(), &template(), "token").await.unwrap();
        let cancelled = engine.cancel(&started.id).await.unwrap();
        assert_eq!(cancelled.status, ExecutionStatus::Cancelled);
        assert_eq!(driver.terminated.load(Ordering::SeqCst), 1);
    }
}
