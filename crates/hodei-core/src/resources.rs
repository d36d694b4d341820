//! Canonical resource-quantity strings (spec §3 WorkerTemplate, §8 boundary
//! behaviour).
//!
//! CPU is expressed either as whole cores (`"2"`) or millicores (`"500m"`),
//! and is always normalized to millicores internally. Memory/storage use the
//! binary `Ki|Mi|Gi|Ti` suffixes, or a bare number of bytes.

use serde::{Deserialize, Serialize};

use crate::error::HodeiError;

/// CPU quantity, stored in millicores (1 core == 1000 millicores).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millicores(pub u64);

impl Millicores {
    pub const ZERO: Millicores = Millicores(0);

    pub fn from_cores(cores: f64) -> Self {
        Millicores((cores * 1000.0).round() as u64)
    }

    pub fn as_cores(&self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// Parse a canonical CPU string: `"<n>m"` for millicores, `"<n>"` for
    /// whole cores (may be fractional, e.g. `"0.5"`).
    pub fn parse(raw: &str) -> Result<Self, HodeiError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(HodeiError::Validation("empty CPU quantity".into()));
        }
        if let Some(digits) = raw.strip_suffix('m') {
            let millis: u64 = digits
                .parse()
                .map_err(|_| HodeiError::Validation(format!("invalid CPU millicore value: {raw:?}")))?;
            Ok(Millicores(millis))
        } else {
            let cores: f64 = raw
                .parse()
                .map_err(|_| HodeiError::Validation(format!("invalid CPU core value: {raw:?}")))?;
            if cores < 0.0 {
                return Err(HodeiError::Validation(format!("negative CPU quantity: {raw:?}")));
            }
            Ok(Millicores::from_cores(cores))
        }
    }
}

/// Byte quantity with binary-unit parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bytes(pub u64);

impl Bytes {
    pub const ZERO: Bytes = Bytes(0);

    pub const KI: u64 = 1024;
    pub const MI: u64 = Self::KI * 1024;
    pub const GI: u64 = Self::MI * 1024;
    pub const TI: u64 = Self::GI * 1024;

    /// Parse `Ki|Mi|Gi|Ti`-suffixed or unit-less byte strings.
    pub fn parse(raw: &str) -> Result<Self, HodeiError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(HodeiError::Validation("empty memory quantity".into()));
        }
        for (suffix, unit) in [("Ki", Self::KI), ("Mi", Self::MI), ("Gi", Self::GI), ("Ti", Self::TI)] {
            if let Some(digits) = raw.strip_suffix(suffix) {
                let count: u64 = digits
                    .parse()
                    .map_err(|_| HodeiError::Validation(format!("invalid memory value: {raw:?}")))?;
                return Ok(Bytes(count * unit));
            }
        }
        // No recognized suffix — must be a bare byte count, not some other
        // unknown unit annotation.
        if raw.chars().all(|c| c.is_ascii_digit()) {
            let count: u64 = raw
                .parse()
                .map_err(|_| HodeiError::Validation(format!("invalid memory value: {raw:?}")))?;
            Ok(Bytes(count))
        } else {
            Err(HodeiError::Validation(format!(
                "unknown memory suffix in {raw:?}; expected Ki|Mi|Gi|Ti or a bare byte count"
            )))
        }
    }

    pub fn as_gib(&self) -> f64 {
        self.0 as f64 / Self::GI as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_zero_variants_parse_without_division() {
        assert_eq!(Millicores::parse("0").unwrap(), Millicores::ZERO);
        assert_eq!(Millicores::parse("0m").unwrap(), Millicores::ZERO);
    }

    #[test]
    fn cpu_whole_cores() {
        assert_eq!(Millicores::parse("2").unwrap(), Millicores(2000));
        assert_eq!(Millicores::parse("0.5").unwrap(), Millicores(500));
    }

    #[test]
    fn cpu_millicores() {
        assert_eq!(Millicores::parse("250m").unwrap(), Millicores(250));
    }

    #[test]
    fn cpu_rejects_negative() {
        assert!(Millicores::parse("-1").is_err());
    }

    #[test]
    fn memory_binary_suffixes() {
        assert_eq!(Bytes::parse("1Ki").unwrap(), Bytes(1024));
        assert_eq!(Bytes::parse("2Mi").unwrap(), Bytes(2 * 1024 * 1024));
        assert_eq!(Bytes::parse("1Gi").unwrap().as_gib(), 1.0);
        assert_eq!(Bytes::parse("1Ti").unwrap(), Bytes(1024 * 1024 * 1024 * 1024));
    }

    #[test]
    fn memory_bare_bytes() {
        assert_eq!(Bytes::parse("4096").unwrap(), Bytes(4096));
    }

    #[test]
    fn memory_unknown_suffix_is_validation_error() {
        let err = Bytes::parse("5Xi").unwrap_err();
        assert!(matches!(err, HodeiError::Validation(_)));
    }
}
