//! Worker <-> orchestrator wire protocol (spec §6).
//!
//! The message shapes are generated from `proto/hodei/worker/v1/worker.proto`
//! via `tonic_build`, the same split the teacher uses in
//! `entity-gateway/build.rs` (`build_server(true).build_client(true)`). This
//! crate owns only the wire types and their mapping to/from the internal
//! domain enums in `hodei_core`; the actual bidirectional-stream service loop
//! is composed by `hodei-execution`, which is where a real server would live.

pub mod hodei {
    pub mod worker {
        pub mod v1 {
            tonic::include_proto!("hodei.worker.v1");
        }
    }
}

pub use hodei::worker::v1::*;

mod mapping;
pub use mapping::{ControlKind, WireJobStatus, WireMappingError};
