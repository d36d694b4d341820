//! Artifact Transfer Engine (spec §4.2): chunked, compressed,
//! checksum-verified artifact shipping with a worker-side content-addressed
//! cache.

pub mod cache;
pub mod protocol;

pub use cache::WorkerCache;
pub use protocol::{
    verify_ack, ArtifactAck, ArtifactCacheQuery, ArtifactCacheResponse, ArtifactChunk, CachedArtifactInfo, Compression,
};
