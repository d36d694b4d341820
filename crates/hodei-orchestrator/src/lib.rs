pub mod config;
pub mod engine;
pub mod model;
pub mod port;
pub mod priority;
pub mod retry;

pub use config::OrchestratorConfig;
pub use engine::JobOrchestrator;
pub use model::{JobQueue, OrchestratorError, QueueDiscipline, QueuedJob};
pub use port::{PoolCatalog, PoolStanding};
