//! The reference `ComputeDriver` adapter: a container-daemon driver backed
//! by `bollard`, speaking to the local Docker Engine API over a Unix
//! socket (spec §4.1, §6 "Container-driver endpoint").

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, ListContainersOptions, RemoveContainerOptions, StopContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::models::{ContainerStateStatusEnum, HostConfig};
use bollard::Docker;
use futures::StreamExt;
use hodei_core::{InstanceId, PoolId, ProvisioningError};
use tracing::{debug, info, warn};

use crate::config::DriverConfig;
use crate::port::{ComputeDriver, Result};
use crate::types::{
    standard_instance_types, HealthCheckResult, InstanceSpec, InstanceStatus, InstanceSummary, InstanceTypeSpec,
    ScaleResult,
};

const POOL_LABEL: &str = "hodei.pool-id";
const WORKER_LABEL: &str = "hodei.worker-id";
const TERMINATE_GRACE_SECS: i64 = 10;

/// `host.docker.internal`-style default so workers can reach the
/// orchestrator without extra network configuration (spec §4.1).
pub const DEFAULT_ORCHESTRATOR_HOST: &str = "host.docker.internal";

pub struct ContainerDaemonDriver {
    docker: Docker,
    /// Per-pool provisioning template, set by the pool/autoscaler so that
    /// `scale_to` knows what to provision beyond a bare target count. The
    /// spec's `scaleTo(poolId, target)` signature carries no spec of its
    /// own; registering one is this adapter's extension point.
    templates: Mutex<HashMap<PoolId, InstanceSpec>>,
}

impl ContainerDaemonDriver {
    pub fn connect(config: &DriverConfig) -> Result<Self> {
        let docker = Docker::connect_with_unix(
            &config.socket_path,
            config.timeout_ms,
            config
                .api_version
                .as_deref()
                .and_then(|v| v.parse().ok())
                .unwrap_or(bollard::API_DEFAULT_VERSION),
        )
        .map_err(|e| ProvisioningError::ProvisioningFailed(format!("docker connect failed: {e}")))?;
        Ok(Self {
            docker,
            templates: Mutex::new(HashMap::new()),
        })
    }

    /// Registers the instance spec `scale_to` should use when growing a
    /// pool. Must be called at least once per pool before autoscaling up.
    pub fn set_pool_template(&self, pool_id: PoolId, spec: InstanceSpec) {
        self.templates.lock().expect("template lock poisoned").insert(pool_id, spec);
    }

    /// Queries the local image; pulls and blocks until complete if absent.
    /// Pull failures are surfaced as `ImagePullFailure`; never retried here
    /// (spec §4.1 "Ensure-image policy").
    async fn ensure_image(&self, image: &str) -> Result<()> {
        if self.docker.inspect_image(image).await.is_ok() {
            return Ok(());
        }
        info!(image, "pulling image");
        let mut stream = self.docker.create_image(
            Some(CreateImageOptions {
                from_image: image,
                ..Default::default()
            }),
            None,
            None,
        );
        while let Some(progress) = stream.next().await {
            progress.map_err(|e| ProvisioningError::ImagePullFailure(format!("{image}: {e}")))?;
        }
        Ok(())
    }

    fn container_name_for(worker_id: &str) -> String {
        format!("hodei-worker-{worker_id}")
    }

    fn status_from_docker(state: Option<ContainerStateStatusEnum>) -> InstanceStatus {
        // "running->RUNNING, paused/exited->STOPPED, restarting->PROVISIONING,
        // dead->FAILED, exited->TERMINATED, otherwise PROVISIONING" (spec
        // §4.1) names `exited` twice; we treat PAUSED as STOPPED and EXITED
        // as TERMINATED, the only split of the rule that doesn't alias the
        // same input to two outputs. See DESIGN.md.
        match state {
            Some(ContainerStateStatusEnum::RUNNING) => InstanceStatus::Running,
            Some(ContainerStateStatusEnum::PAUSED) => InstanceStatus::Stopped,
            Some(ContainerStateStatusEnum::RESTARTING) => InstanceStatus::Provisioning,
            Some(ContainerStateStatusEnum::DEAD) => InstanceStatus::Failed,
            Some(ContainerStateStatusEnum::EXITED) => InstanceStatus::Terminated,
            _ => InstanceStatus::Provisioning,
        }
    }
}

#[async_trait]
impl ComputeDriver for ContainerDaemonDriver {
    async fn provision(&self, pool_id: &PoolId, spec: InstanceSpec) -> Result<InstanceId> {
        let name = Self::container_name_for(&spec.worker_id);

        if let Ok(existing) = self.docker.inspect_container(&name, None).await {
            if let Some(id) = existing.id {
                debug!(worker_id = %spec.worker_id, "provision is a no-op, container already exists");
                return InstanceId::new(id).map_err(|e| ProvisioningError::InvalidSpec(e.to_string()));
            }
        }

        self.ensure_image(&spec.image).await?;

        let mut labels = spec.labels.clone();
        labels.insert(POOL_LABEL.to_string(), pool_id.as_str().to_string());
        labels.insert(WORKER_LABEL.to_string(), spec.worker_id.clone());

        let mut env: Vec<String> = spec.env.iter().map(|(k, v)| format!("{k}={v}")).collect();
        env.push(format!("HODEI_ORCHESTRATOR_HOST={DEFAULT_ORCHESTRATOR_HOST}"));
        env.push(format!("WORKER_ID={}", spec.worker_id));

        let host_config = HostConfig {
            memory: Some(spec.memory.0 as i64),
            nano_cpus: Some((spec.cpu.as_cores() * 1_000_000_000.0) as i64),
            restart_policy: None, // restart=never
            auto_remove: Some(false),
            ..Default::default()
        };

        let container = self
            .docker
            .create_container(
                Some(CreateContainerOptions {
                    name: name.as_str(),
                    platform: None,
                }),
                Config {
                    image: Some(spec.image.clone()),
                    env: Some(env),
                    labels: Some(labels),
                    host_config: Some(host_config),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| ProvisioningError::ProvisioningFailed(e.to_string()))?;

        self.docker
            .start_container::<String>(&container.id, None)
            .await
            .map_err(|e| ProvisioningError::ProvisioningFailed(e.to_string()))?;

        InstanceId::new(container.id).map_err(|e| ProvisioningError::InvalidSpec(e.to_string()))
    }

    async fn terminate(&self, instance_id: &InstanceId) -> Result<()> {
        let stop = self
            .docker
            .stop_container(
                instance_id.as_str(),
                Some(StopContainerOptions {
                    t: TERMINATE_GRACE_SECS,
                }),
            )
            .await;
        if let Err(e) = stop {
            if !is_not_found(&e) {
                warn!(instance_id = %instance_id, error = %e, "stop_container failed, attempting remove anyway");
            }
        }

        let remove = self
            .docker
            .remove_container(
                instance_id.as_str(),
                Some(RemoveContainerOptions {
                    force: true,
                    v: true,
                    ..Default::default()
                }),
            )
            .await;
        match remove {
            Ok(()) => Ok(()),
            Err(e) if is_not_found(&e) => Ok(()),
            Err(e) => Err(ProvisioningError::ProvisioningFailed(e.to_string())),
        }
    }

    async fn inspect(&self, instance_id: &InstanceId) -> Result<InstanceStatus> {
        let details = self
            .docker
            .inspect_container(instance_id.as_str(), None)
            .await
            .map_err(|e| ProvisioningError::ProvisioningFailed(e.to_string()))?;
        let status = details.state.and_then(|s| s.status);
        Ok(Self::status_from_docker(status))
    }

    async fn list(&self, pool_id: &PoolId) -> Result<Vec<InstanceSummary>> {
        let mut filters = HashMap::new();
        filters.insert("label".to_string(), vec![format!("{POOL_LABEL}={}", pool_id.as_str())]);
        let containers = self
            .docker
            .list_containers(Some(ListContainersOptions {
                all: true,
                filters,
                ..Default::default()
            }))
            .await
            .map_err(|e| ProvisioningError::ProvisioningFailed(e.to_string()))?;

        containers
            .into_iter()
            .map(|c| {
                let id = c.id.unwrap_or_default();
                let status = c
                    .state
                    .as_deref()
                    .and_then(|s| s.parse::<ContainerStateStatusEnum>().ok());
                Ok(InstanceSummary {
                    instance_id: InstanceId::new(id).map_err(|e| ProvisioningError::InvalidSpec(e.to_string()))?,
                    pool_id: pool_id.clone(),
                    status: Self::status_from_docker(status),
                })
            })
            .collect()
    }

    async fn list_all(&self) -> Result<Vec<InstanceSummary>> {
        let containers = self
            .docker
            .list_containers(Some(ListContainersOptions {
                all: true,
                ..Default::default()
            }))
            .await
            .map_err(|e| ProvisioningError::ProvisioningFailed(e.to_string()))?;

        containers
            .into_iter()
            .filter_map(|c| {
                let pool_id = c.labels.as_ref()?.get(POOL_LABEL)?.clone();
                let id = c.id.clone().unwrap_or_default();
                let status = c
                    .state
                    .as_deref()
                    .and_then(|s| s.parse::<ContainerStateStatusEnum>().ok());
                Some((pool_id, id, status))
            })
            .map(|(pool_id, id, status)| {
                Ok(InstanceSummary {
                    instance_id: InstanceId::new(id).map_err(|e| ProvisioningError::InvalidSpec(e.to_string()))?,
                    pool_id: PoolId::new(pool_id).map_err(|e| ProvisioningError::InvalidSpec(e.to_string()))?,
                    status: Self::status_from_docker(status),
                })
            })
            .collect()
    }

    async fn scale_to(&self, pool_id: &PoolId, target: u32) -> Result<ScaleResult> {
        let current = self.list(pool_id).await?;
        let mut result = ScaleResult {
            requested: target,
            actual: current.len() as u32,
            ..Default::default()
        };

        if (current.len() as u32) < target {
            let template = {
                let templates = self.templates.lock().expect("template lock poisoned");
                templates.get(pool_id).cloned()
            };
            let Some(template) = template else {
                return Err(ProvisioningError::InvalidSpec(format!(
                    "no instance template registered for pool {pool_id}"
                )));
            };
            for i in current.len() as u32..target {
                let mut spec = template.clone();
                spec.worker_id = format!("{}-{i}", spec.worker_id);
                match self.provision(pool_id, spec).await {
                    Ok(id) => {
                        result.provisioned.push(id);
                        result.actual += 1;
                    }
                    Err(e) => result.failed.push(e.to_string()),
                }
            }
        } else if (current.len() as u32) > target {
            let excess = current.len() as u32 - target;
            for instance in current.into_iter().take(excess as usize) {
                if let Err(e) = self.terminate(&instance.instance_id).await {
                    result.failed.push(e.to_string());
                } else {
                    result.actual -= 1;
                }
            }
        }

        Ok(result)
    }

    fn available_instance_types(&self, _pool_id: &PoolId) -> Vec<InstanceTypeSpec> {
        standard_instance_types()
    }

    async fn health_check(&self) -> Result<HealthCheckResult> {
        let version = self
            .docker
            .version()
            .await
            .map_err(|e| ProvisioningError::ProvisioningFailed(e.to_string()))?;
        let info = self
            .docker
            .info()
            .await
            .map_err(|e| ProvisioningError::ProvisioningFailed(e.to_string()))?;
        Ok(HealthCheckResult {
            daemon_version: version.version.unwrap_or_default(),
            container_count: info.containers.unwrap_or(0) as u64,
            memory_total_bytes: info.mem_total.unwrap_or(0) as u64,
        })
    }
}

fn is_not_found(err: &bollard::errors::Error) -> bool {
    matches!(err, bollard::errors::Error::DockerResponseServerError { status_code, .. } if *status_code == 404)
}
