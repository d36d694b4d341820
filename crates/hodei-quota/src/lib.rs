//! Quota Engine (spec §4.4): quota/usage/violation state machine,
//! enforcement decisions, and continuous monitoring.

pub mod config;
pub mod engine;
pub mod model;

pub use config::QuotaConfig;
pub use engine::{CheckDecision, QuotaEngine, ResourceAlert};
pub use model::{
    severity_for_excess_pct, QuotaPolicy, QuotaViolation, ResourceQuota, ResourceUsage, UsageDelta, ViolationAction,
    ViolationSeverity,
};
