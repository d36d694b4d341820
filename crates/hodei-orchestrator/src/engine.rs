//! `JobOrchestrator`: submission, the single processing loop, and the retry
//! policy that ties scheduler, quota, and execution engine together (spec
//! §4.9). The composition root wires this against concrete adapters; this
//! crate itself never bootstraps a CLI or server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use hodei_core::{HodeiError, Job, JobId, JobPriority, JobStatus, QueueId};
use hodei_execution::{Execution, ExecutionEngine, ExecutionStatus};
use hodei_quota::QuotaEngine;
use hodei_scheduler::{find_placement, JobRequirements, PoolCandidate, SchedulerError};
use tokio::sync::{watch, Mutex};
use tracing::{error, info, warn};

use crate::config::OrchestratorConfig;
use crate::model::{JobQueue, OrchestratorError, QueueDiscipline, QueuedJob};
use crate::port::PoolCatalog;
use crate::retry::backoff_duration;

pub struct JobOrchestrator {
    queues: Mutex<HashMap<String, JobQueue>>,
    jobs: Mutex<HashMap<String, Job>>,
    meta: Mutex<HashMap<String, QueuedJob>>,
    running_counts: Mutex<HashMap<String, u32>>,
    running_executions: Mutex<HashMap<String, hodei_core::ExecutionId>>,
    quota: Arc<QuotaEngine>,
    pool_catalog: Arc<dyn PoolCatalog>,
    execution: Arc<ExecutionEngine>,
    config: OrchestratorConfig,
    is_processing: AtomicBool,
}

impl JobOrchestrator {
    pub fn new(
        quota: Arc<QuotaEngine>,
        pool_catalog: Arc<dyn PoolCatalog>,
        execution: Arc<ExecutionEngine>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            queues: Mutex::new(HashMap::new()),
            jobs: Mutex::new(HashMap::new()),
            meta: Mutex::new(HashMap::new()),
            running_counts: Mutex::new(HashMap::new()),
            running_executions: Mutex::new(HashMap::new()),
            quota,
            pool_catalog,
            execution,
            config,
            is_processing: AtomicBool::new(false),
        }
    }

    pub async fn create_queue(&self, queue: JobQueue) -> Result<(), HodeiError> {
        queue.validate()?;
        self.queues.lock().await.insert(queue.id.as_str().to_string(), queue);
        Ok(())
    }

    pub async fn get_job(&self, job_id: &JobId) -> Option<Job> {
        self.jobs.lock().await.get(job_id.as_str()).cloned()
    }

    /// Submission (spec §4.9 steps 1-4); step 5 ("ensure the processing loop
    /// is running") is the caller's responsibility via `run`.
    pub async fn submit(
        &self,
        mut job: Job,
        queue_id: &QueueId,
        priority: JobPriority,
        max_attempts: u32,
        deadline: Option<DateTime<Utc>>,
        estimated_duration_secs: Option<i64>,
        dependencies: Vec<JobId>,
    ) -> Result<(), OrchestratorError> {
        let queue = {
            let queues = self.queues.lock().await;
            queues
                .get(queue_id.as_str())
                .cloned()
                .ok_or_else(|| OrchestratorError::QueueNotFound(queue_id.clone()))?
        };
        if !queue.is_active {
            return Err(OrchestratorError::QueueInactive(queue_id.clone()));
        }

        if self.meta.lock().await.contains_key(job.id.as_str()) {
            return Err(OrchestratorError::AlreadyQueued(job.id.clone()));
        }

        if let Some(limit) = queue.max_queued_jobs {
            let candidate_ids: Vec<JobId> = self
                .meta
                .lock()
                .await
                .values()
                .filter(|m| m.queue_id == *queue_id)
                .map(|m| m.job_id.clone())
                .collect();
            let current_queued = {
                let jobs = self.jobs.lock().await;
                candidate_ids
                    .iter()
                    .filter(|id| jobs.get(id.as_str()).map(|j| j.status == JobStatus::Queued).unwrap_or(false))
                    .count() as u32
            };
            if current_queued >= limit {
                return Err(OrchestratorError::QueueFull(queue_id.clone()));
            }
        }

        job.transition_to(JobStatus::Queued).map_err(|_| OrchestratorError::AlreadyQueued(job.id.clone()))?;
        let queued_at = Utc::now();
        let queued_job = QueuedJob {
            job_id: job.id.clone(),
            queue_id: queue_id.clone(),
            priority,
            queued_at,
            deadline,
            estimated_duration_secs,
            dependencies,
            attempts: 0,
            max_attempts,
            last_error: None,
            backoff_until: None,
        };

        {
            let mut meta = self.meta.lock().await;
            if meta.contains_key(job.id.as_str()) {
                return Err(OrchestratorError::AlreadyQueued(job.id.clone()));
            }
            meta.insert(job.id.as_str().to_string(), queued_job);
        }
        info!(job_id = %job.id, queue_id = %queue_id, "job submitted");
        self.jobs.lock().await.insert(job.id.as_str().to_string(), job);
        Ok(())
    }

    /// Cancels a job that is still queued or currently running.
    pub async fn cancel(&self, job_id: &JobId) -> Result<(), HodeiError> {
        let status = {
            let jobs = self.jobs.lock().await;
            jobs.get(job_id.as_str()).map(|j| j.status)
        };
        let Some(status) = status else {
            return Err(HodeiError::NotFound(format!("job {job_id} not found")));
        };

        match status {
            JobStatus::Queued => {
                let mut jobs = self.jobs.lock().await;
                if let Some(job) = jobs.get_mut(job_id.as_str()) {
                    job.transition_to(JobStatus::Cancelled)?;
                }
                self.meta.lock().await.remove(job_id.as_str());
                Ok(())
            }
            JobStatus::Running => {
                let execution_id = self.running_executions.lock().await.get(job_id.as_str()).cloned();
                let Some(execution_id) = execution_id else {
                    return Err(HodeiError::NotFound(format!("no running execution for job {job_id}")));
                };
                let execution = self.execution.cancel(&execution_id).await?;
                self.on_execution_finished(job_id, &execution).await;
                Ok(())
            }
            other => Err(HodeiError::Validation(format!("cannot cancel job in status {other:?}"))),
        }
    }

    /// Called once the Execution Engine reports a terminal status for a
    /// job's execution. Completes or retries the job accordingly.
    pub async fn on_execution_finished(&self, job_id: &JobId, execution: &Execution) {
        let queue_id = {
            let meta = self.meta.lock().await;
            meta.get(job_id.as_str()).map(|m| m.queue_id.clone())
        };
        self.running_executions.lock().await.remove(job_id.as_str());
        if let Some(queue_id) = &queue_id {
            let mut counts = self.running_counts.lock().await;
            if let Some(count) = counts.get_mut(queue_id.as_str()) {
                *count = count.saturating_sub(1);
            }
        }

        match execution.status {
            ExecutionStatus::Completed => {
                let mut jobs = self.jobs.lock().await;
                if let Some(job) = jobs.get_mut(job_id.as_str()) {
                    let _ = job.transition_to(JobStatus::Completed);
                }
                self.meta.lock().await.remove(job_id.as_str());
            }
            ExecutionStatus::Cancelled => {
                let mut jobs = self.jobs.lock().await;
                if let Some(job) = jobs.get_mut(job_id.as_str()) {
                    let _ = job.transition_to(JobStatus::Cancelled);
                }
                self.meta.lock().await.remove(job_id.as_str());
            }
            ExecutionStatus::Failed => {
                {
                    let mut jobs = self.jobs.lock().await;
                    if let Some(job) = jobs.get_mut(job_id.as_str()) {
                        let _ = job.transition_to(JobStatus::Failed);
                    }
                }
                let reason = format!("execution failed with exit code {:?}", execution.exit_code);
                self.requeue_or_mark_permanent(job_id, reason).await;
            }
            ExecutionStatus::Provisioning | ExecutionStatus::Running => {
                error!(job_id = %job_id, "on_execution_finished called with a non-terminal execution status");
            }
        }
    }

    /// Never holds more than one of `jobs`/`meta` locked at a time, to keep
    /// the pairwise lock order free-form across methods.
    async fn requeue_or_mark_permanent(&self, job_id: &JobId, reason: String) {
        let (attempts, can_retry) = {
            let mut meta = self.meta.lock().await;
            let Some(queued) = meta.get_mut(job_id.as_str()) else { return };
            queued.attempts += 1;
            queued.last_error = Some(reason);
            (queued.attempts, queued.can_retry())
        };

        if can_retry {
            {
                let mut jobs = self.jobs.lock().await;
                if let Some(job) = jobs.get_mut(job_id.as_str()) {
                    if job.transition_to(JobStatus::Queued).is_ok() {
                        job.completed_at = None;
                    }
                }
            }
            let mut meta = self.meta.lock().await;
            if let Some(queued) = meta.get_mut(job_id.as_str()) {
                queued.queued_at = Utc::now();
                queued.backoff_until = Some(Utc::now() + backoff_duration(attempts));
            }
            info!(job_id = %job_id, attempts, "job requeued for retry");
        } else {
            warn!(job_id = %job_id, attempts, "job permanently failed after exhausting retries");
            self.meta.lock().await.remove(job_id.as_str());
        }
    }

    fn order_candidates(discipline: QueueDiscipline, candidates: &mut [(&QueuedJob, f64)]) {
        match discipline {
            QueueDiscipline::Fifo => candidates.sort_by_key(|(m, _)| m.queued_at),
            QueueDiscipline::Lifo => candidates.sort_by_key(|(m, _)| std::cmp::Reverse(m.queued_at)),
            QueueDiscipline::Priority => candidates.sort_by(|(ma, pa), (mb, pb)| {
                pb.partial_cmp(pa).unwrap_or(std::cmp::Ordering::Equal).then_with(|| ma.queued_at.cmp(&mb.queued_at))
            }),
        }
    }

    /// One processing-loop iteration (spec §4.9 "Processing loop").
    ///
    /// Takes independent snapshots of `meta`, `jobs`, `queues` and
    /// `running_counts` (one lock at a time, each dropped before the next is
    /// taken) and does all selection math against the snapshots, so no two
    /// of these locks are ever held together here.
    async fn tick(&self) {
        let now = Utc::now();

        let meta_snapshot: Vec<QueuedJob> = self.meta.lock().await.values().cloned().collect();
        let job_status: HashMap<String, JobStatus> =
            self.jobs.lock().await.iter().map(|(id, j)| (id.clone(), j.status)).collect();
        let queues_snapshot: HashMap<String, JobQueue> = self.queues.lock().await.clone();
        let running_counts_snapshot: HashMap<String, u32> = self.running_counts.lock().await.clone();

        let ready: Vec<&QueuedJob> = meta_snapshot
            .iter()
            .filter(|m| job_status.get(m.job_id.as_str()).copied() == Some(JobStatus::Queued))
            .filter(|m| !m.is_in_backoff(now))
            .filter(|m| {
                m.dependencies
                    .iter()
                    .all(|dep| job_status.get(dep.as_str()).copied() == Some(JobStatus::Completed))
            })
            .collect();

        let mut by_queue: HashMap<String, Vec<&QueuedJob>> = HashMap::new();
        for m in ready {
            by_queue.entry(m.queue_id.as_str().to_string()).or_default().push(m);
        }

        let mut selected_job_ids = Vec::new();
        for (queue_key, candidates) in by_queue {
            let Some(queue) = queues_snapshot.get(&queue_key) else { continue };
            if !queue.is_active {
                continue;
            }
            let running = running_counts_snapshot.get(&queue_key).copied().unwrap_or(0);
            let available_slots = queue.max_concurrent_jobs.map(|max| max.saturating_sub(running)).unwrap_or(u32::MAX);
            if available_slots == 0 {
                continue;
            }

            let mut scored: Vec<(&QueuedJob, f64)> = candidates
                .into_iter()
                .map(|m| {
                    let priority = crate::priority::effective_priority(
                        m.priority.value(),
                        m.queued_at,
                        now,
                        m.deadline,
                        m.estimated_duration_secs,
                    );
                    (m, priority)
                })
                .collect();
            Self::order_candidates(queue.discipline, &mut scored);

            for (m, _) in scored.into_iter().take(available_slots as usize) {
                selected_job_ids.push(m.job_id.clone());
            }
        }

        for job_id in selected_job_ids {
            self.process_job(&job_id).await;
        }
    }

    /// Per-job processing (spec §4.9 "Per-job processing"): mark SCHEDULED,
    /// ask the scheduler, on success delegate to the Execution Engine, on
    /// failure apply the retry policy.
    async fn process_job(&self, job_id: &JobId) {
        let Some(queue_id) = self.meta.lock().await.get(job_id.as_str()).map(|m| m.queue_id.clone()) else {
            return;
        };
        let Some(queue) = self.queues.lock().await.get(queue_id.as_str()).cloned() else { return };
        let job = {
            let mut jobs = self.jobs.lock().await;
            let Some(job) = jobs.get_mut(job_id.as_str()) else { return };
            if job.transition_to(JobStatus::Scheduled).is_err() {
                return;
            }
            job.clone()
        };

        let Some(standing) = self.pool_catalog.standing_for(&queue.resource_pool_id).await else {
            self.fail_placement(job_id, "no standing pool found for queue's resource pool".into()).await;
            return;
        };

        let requirements = JobRequirements {
            cpu: standing.template.resources.cpu,
            memory: standing.template.resources.memory,
            capabilities: standing.template.capabilities.clone(),
            labels: HashMap::new(),
        };
        let candidate = PoolCandidate {
            pool: standing.pool.clone(),
            template: standing.template.clone(),
            projected_utilization: standing.projected_utilization,
            free_capacity_bytes: standing.free_capacity_bytes,
            cost_weight: standing.cost_weight,
        };

        let placement = find_placement(&requirements, std::slice::from_ref(&candidate), &self.quota).await;
        let chosen_pool_id = match placement {
            Ok(pool_id) => pool_id,
            Err(SchedulerError::NoCandidatePool) => {
                self.fail_placement(job_id, "scheduler found no candidate pool".into()).await;
                return;
            }
        };

        let orchestrator_token = format!("orch-token-{job_id}");
        match self
            .execution
            .start_execution(&job, &standing.pool, &standing.template, &orchestrator_token)
            .await
        {
            Ok(execution) => {
                {
                    let mut jobs = self.jobs.lock().await;
                    if let Some(job) = jobs.get_mut(job_id.as_str()) {
                        let _ = job.transition_to(JobStatus::Running);
                    }
                }
                self.quota
                    .add_job(
                        &chosen_pool_id,
                        standing.template.resources.cpu.0,
                        standing.template.resources.memory.as_gib(),
                        standing.template.resources.storage.map(|b| b.as_gib()).unwrap_or(0.0),
                    )
                    .await;
                self.running_executions.lock().await.insert(job_id.as_str().to_string(), execution.id.clone());
                *self.running_counts.lock().await.entry(queue_id.as_str().to_string()).or_insert(0) += 1;
                info!(job_id = %job_id, pool_id = %chosen_pool_id, "job placed and running");
            }
            Err(err) => {
                self.fail_placement(job_id, format!("execution start failed: {err}")).await;
            }
        }
    }

    async fn fail_placement(&self, job_id: &JobId, reason: String) {
        {
            let mut jobs = self.jobs.lock().await;
            if let Some(job) = jobs.get_mut(job_id.as_str()) {
                let _ = job.transition_to(JobStatus::Failed);
            }
        }
        warn!(job_id = %job_id, reason = %reason, "job placement failed");
        self.requeue_or_mark_permanent(job_id, reason).await;
    }

    /// The single long-running processing task (spec §4.9, §5 "Orchestrator
    /// shutdown cancels the processing loop"). The `isProcessing` guard only
    /// prevents a second concurrent `run` on the same instance; per the
    /// source's own open question it does not re-arm after a crash.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        if self.is_processing.swap(true, Ordering::SeqCst) {
            warn!("processing loop already running, refusing to start a second instance");
            return;
        }

        let mut ticker = tokio::time::interval(StdDuration::from_millis(self.config.processing_tick_interval_ms));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        self.is_processing.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hodei_core::{
        Bytes, Capabilities, InstanceId, JobDefinition, JobPriority, JobStatus, Millicores, PoolCapacity, PoolId,
        PoolStatus, ProvisioningError, ResourceRequirements, ResourcePool, SchedulingHints, SecurityContext,
        WorkerTemplate,
    };
    use hodei_driver::{ComputeDriver, HealthCheckResult, InstanceSpec, InstanceSummary, ScaleResult};
    use hodei_events::{EventRegistry, EventsConfig};
    use hodei_execution::{ExecutionConfig, WorkerSignaler};
    use hodei_quota::{QuotaConfig, QuotaEngine};
    use hodei_wire::ControlKind;

    struct FakeDriver;

    #[async_trait]
    impl ComputeDriver for FakeDriver {
        async fn provision(&self, _pool_id: &PoolId, _spec: InstanceSpec) -> hodei_driver::Result<InstanceId> {
            Ok(InstanceId::new("instance-1").unwrap())
        }
        async fn terminate(&self, _instance_id: &InstanceId) -> hodei_driver::Result<()> {
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

    struct FailingDriver;

    #[async_trait]
    impl ComputeDriver for FailingDriver {
        async fn provision(&self, _pool_id: &PoolId, _spec: InstanceSpec) -> hodei_driver::Result<InstanceId> {
            Err(ProvisioningError::ResourceUnavailable)
        }
        async fn terminate(&self, _instance_id: &InstanceId) -> hodei_driver::Result<()> {
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
        async fn signal(&self, _worker_id: &hodei_core::WorkerId, _signal: ControlKind) -> Result<(), HodeiError> {
            Ok(())
        }
    }

    struct FakeCatalog {
        pool: ResourcePool,
        template: WorkerTemplate,
    }

    #[async_trait]
    impl PoolCatalog for FakeCatalog {
        async fn standing_for(&self, pool_id: &PoolId) -> Option<crate::port::PoolStanding> {
            if pool_id != &self.pool.id {
                return None;
            }
            Some(crate::port::PoolStanding {
                pool: self.pool.clone(),
                template: self.template.clone(),
                projected_utilization: 10.0,
                free_capacity_bytes: u64::MAX,
                cost_weight: 1.0,
            })
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

    fn job(id: &str) -> Job {
        Job {
            id: JobId::new(id).unwrap(),
            name: "build".into(),
            namespace: "default".into(),
            status: JobStatus::Pending,
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

    fn queue() -> JobQueue {
        JobQueue {
            id: QueueId::new("q1").unwrap(),
            name: "default".into(),
            resource_pool_id: pool().id,
            discipline: QueueDiscipline::Fifo,
            base_priority: JobPriority::Normal,
            max_concurrent_jobs: Some(4),
            max_queued_jobs: Some(2),
            is_active: true,
        }
    }

    fn orchestrator(driver: Arc<dyn ComputeDriver>) -> JobOrchestrator {
        let quota = Arc::new(QuotaEngine::new(QuotaConfig::default()));
        let events = Arc::new(EventRegistry::new(EventsConfig::default()));
        let execution = Arc::new(ExecutionEngine::new(
            driver,
            events,
            quota.clone(),
            Arc::new(FakeSignaler),
            ExecutionConfig { cancel_grace_period_ms: 0 },
        ));
        let catalog: Arc<dyn PoolCatalog> = Arc::new(FakeCatalog { pool: pool(), template: template() });
        JobOrchestrator::new(quota, catalog, execution, OrchestratorConfig::default())
    }

    #[tokio::test]
    async fn submit_rejects_unknown_queue() {
        let orch = orchestrator(Arc::new(FakeDriver));
        let err = orch
            .submit(job("job-1"), &QueueId::new("missing").unwrap(), JobPriority::Normal, 3, None, None, vec![])
            .await
            .unwrap_err();
        assert_eq!(err, OrchestratorError::QueueNotFound(QueueId::new("missing").unwrap()));
    }

    #[tokio::test]
    async fn submit_rejects_inactive_queue() {
        let orch = orchestrator(Arc::new(FakeDriver));
        let mut q = queue();
        q.is_active = false;
        orch.create_queue(q.clone()).await.unwrap();
        let err = orch.submit(job("job-1"), &q.id, JobPriority::Normal, 3, None, None, vec![]).await.unwrap_err();
        assert_eq!(err, OrchestratorError::QueueInactive(q.id));
    }

    #[tokio::test]
    async fn submit_then_resubmit_same_job_fails_already_queued() {
        let orch = orchestrator(Arc::new(FakeDriver));
        let q = queue();
        orch.create_queue(q.clone()).await.unwrap();
        orch.submit(job("job-1"), &q.id, JobPriority::Normal, 3, None, None, vec![]).await.unwrap();
        let err = orch.submit(job("job-1"), &q.id, JobPriority::Normal, 3, None, None, vec![]).await.unwrap_err();
        assert_eq!(err, OrchestratorError::AlreadyQueued(JobId::new("job-1").unwrap()));
    }

    #[tokio::test]
    async fn submit_rejects_once_queue_is_full() {
        let orch = orchestrator(Arc::new(FakeDriver));
        let q = queue();
        orch.create_queue(q.clone()).await.unwrap();
        orch.submit(job("job-1"), &q.id, JobPriority::Normal, 3, None, None, vec![]).await.unwrap();
        orch.submit(job("job-2"), &q.id, JobPriority::Normal, 3, None, None, vec![]).await.unwrap();
        let err = orch.submit(job("job-3"), &q.id, JobPriority::Normal, 3, None, None, vec![]).await.unwrap_err();
        assert_eq!(err, OrchestratorError::QueueFull(q.id));
    }

    #[tokio::test]
    async fn tick_places_a_ready_job_and_marks_it_running() {
        let orch = orchestrator(Arc::new(FakeDriver));
        let q = queue();
        orch.create_queue(q.clone()).await.unwrap();
        orch.submit(job("job-1"), &q.id, JobPriority::Normal, 3, None, None, vec![]).await.unwrap();

        orch.tick().await;

        let job = orch.get_job(&JobId::new("job-1").unwrap()).await.unwrap();
        assert_eq!(job.status, JobStatus::Running);
    }

    #[tokio::test]
    async fn cancel_removes_a_still_queued_job() {
        let orch = orchestrator(Arc::new(FakeDriver));
        let q = queue();
        orch.create_queue(q.clone()).await.unwrap();
        orch.submit(job("job-1"), &q.id, JobPriority::Normal, 3, None, None, vec![]).await.unwrap();

        orch.cancel(&JobId::new("job-1").unwrap()).await.unwrap();

        let job = orch.get_job(&JobId::new("job-1").unwrap()).await.unwrap();
        assert_eq!(job.status, JobStatus::Cancelled);
    }

    #[tokio::test]
    async fn placement_failure_requeues_until_attempts_exhausted() {
        let orch = orchestrator(Arc::new(FailingDriver));
        let q = queue();
        orch.create_queue(q.clone()).await.unwrap();
        orch.submit(job("job-1"), &QueueId::new("q1").unwrap(), JobPriority::Normal, 1, None, None, vec![])
            .await
            .unwrap();

        orch.tick().await;
        let job_id = JobId::new("job-1").unwrap();
        let job = orch.get_job(&job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(orch.meta.lock().await.get(job_id.as_str()).is_none());
    }
}
