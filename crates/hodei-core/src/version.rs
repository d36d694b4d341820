//! Semver-ish version strings, compared lexicographically on dotted numeric
//! components (spec §3: "Versions are semver strings compared lexicographically
//! on dotted numeric components").

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::HodeiError;

/// A dotted numeric version string, e.g. `"1.2.10"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version {
    raw: String,
    #[serde(skip)]
    components: Vec<u64>,
}

impl Version {
    pub fn parse(raw: impl Into<String>) -> Result<Self, HodeiError> {
        let raw = raw.into();
        let components = raw
            .split('.')
            .map(|part| {
                part.parse::<u64>().map_err(|_| {
                    HodeiError::Validation(format!("invalid version component: {part:?} in {raw}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if components.is_empty() {
            return Err(HodeiError::Validation(format!("empty version string: {raw:?}")));
        }
        Ok(Self { raw, components })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for i in 0..len {
            let a = self.components.get(i).copied().unwrap_or(0);
            let b = other.components.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }
}
