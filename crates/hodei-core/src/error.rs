//! Shared error taxonomy (spec §7).
//!
//! Every fallible operation in the system returns `Result<T, HodeiError>` (or
//! a component-specific error that converts into it via `#[from]`), mirroring
//! how the teacher workspace wraps a narrow `sem_os_core::error::SemOsError`
//! around lower-level failures rather than letting each call site match on
//! raw variants.

use thiserror::Error;

/// The system-wide error taxonomy.
#[derive(Debug, Error)]
pub enum HodeiError {
    /// Contract-violating input: blank name, invalid transition, malformed
    /// resource string. Never retried.
    #[error("validation: {0}")]
    Validation(String),

    /// Missing entity by id. The orchestrator treats this as permanent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate name/id.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Quota engine returned BLOCK.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Driver failed to provision a compute instance.
    #[error("provisioning failed: {0}")]
    Provisioning(#[from] ProvisioningError),

    /// A repository port returned an error.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Uncaught internal error. Never leaked to a caller beyond this
    /// diagnostic string.
    #[error("internal: {0}")]
    Internal(#[from] anyhow::Error),
}

impl HodeiError {
    /// Whether the orchestrator may retry the operation that produced this
    /// error (spec §7 propagation policy).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            HodeiError::Provisioning(ProvisioningError::ResourceUnavailable)
                | HodeiError::Provisioning(ProvisioningError::ProvisioningFailed(_))
        )
    }
}

/// Sub-taxonomy for compute-driver failures (spec §4.1, §7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProvisioningError {
    #[error("invalid instance spec: {0}")]
    InvalidSpec(String),
    #[error("image pull failed: {0}")]
    ImagePullFailure(String),
    #[error("no resources available in pool")]
    ResourceUnavailable,
    #[error("provisioning failed: {0}")]
    ProvisioningFailed(String),
}

/// Sub-taxonomy for repository port failures (spec §6, §7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("operation failed: {0}")]
    OperationFailed(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
}

pub type Result<T> = std::result::Result<T, HodeiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_unavailable_is_retryable() {
        let err = HodeiError::from(ProvisioningError::ResourceUnavailable);
        assert!(err.is_retryable());
    }

    #[test]
    fn validation_is_not_retryable() {
        let err = HodeiError::Validation("blank name".into());
        assert!(!err.is_retryable());
    }
}
