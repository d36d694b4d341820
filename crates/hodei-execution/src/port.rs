//! The worker-signaling port (spec §4.7 "signal worker (graceful)"). The
//! transport that actually delivers `ControlSignal` over the wire-protocol
//! stream is an orchestrator concern; the engine only depends on this
//! narrow trait, the same separation `hodei_driver::ComputeDriver` draws
//! from its container adapter.

use async_trait::async_trait;
use hodei_core::{HodeiError, WorkerId};
use hodei_wire::ControlKind;

#[async_trait]
pub trait WorkerSignaler: Send + Sync {
    async fn signal(&self, worker_id: &WorkerId, signal: ControlKind) -> Result<(), HodeiError>;
}
