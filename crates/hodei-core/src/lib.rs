//! Shared domain primitives: identifiers, the error taxonomy, version and
//! resource-quantity parsing, and the cross-cutting data model (Job,
//! ResourcePool, WorkerTemplate). Every other crate in the workspace depends
//! on this one and none of its siblings, mirroring how `sem_os_core` sits at
//! the bottom of the teacher workspace's dependency graph.

pub mod error;
pub mod ids;
pub mod model;
pub mod resources;
pub mod version;

pub use error::{HodeiError, ProvisioningError, RepositoryError, Result};
pub use ids::{ArtifactId, ExecutionId, InstanceId, JobId, PoolId, QueueId, QuotaId, SubscriberId, ViolationId, WorkerId};
pub use model::{
    Capabilities, Job, JobDefinition, JobPriority, JobStatus, PoolCapacity, PoolStatus, Probe,
    ResourcePool, ResourceRequirements, SchedulingHints, SecurityContext, VolumeMount, WorkerTemplate,
};
pub use resources::{Bytes, Millicores};
pub use version::Version;
