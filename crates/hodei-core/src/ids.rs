//! Opaque entity identifiers.
//!
//! Every identifier in the system is a non-blank, immutable string. We wrap
//! each kind in its own newtype so a `WorkerId` can never be passed where a
//! `PoolId` is expected, while still being cheap to clone and hash.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::HodeiError;

macro_rules! id_type {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Validate and wrap a raw string as this id type.
            pub fn new(raw: impl Into<String>) -> Result<Self, HodeiError> {
                let raw = raw.into();
                if raw.trim().is_empty() {
                    return Err(HodeiError::Validation(format!(
                        "{} must not be blank",
                        stringify!($name)
                    )));
                }
                Ok(Self(raw))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

id_type!(JobId, "Identifier for a Job.");
id_type!(ExecutionId, "Identifier for an Execution.");
id_type!(PoolId, "Identifier for a ResourcePool.");
id_type!(WorkerId, "Identifier for a Worker instance.");
id_type!(QueueId, "Identifier for a JobQueue.");
id_type!(QuotaId, "Identifier for a ResourceQuota.");
id_type!(ViolationId, "Identifier for a QuotaViolation.");
id_type!(ArtifactId, "Identifier for a transported Artifact.");
id_type!(SubscriberId, "Identifier for an event subscriber.");
id_type!(InstanceId, "Identifier for a provisioned compute instance.");
