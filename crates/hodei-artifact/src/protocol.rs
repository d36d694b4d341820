//! The bidirectional artifact-transfer message set (spec §4.2).

use hodei_core::ArtifactId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Compression {
    None,
    Gzip,
    Zstd,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactChunk {
    pub artifact_id: ArtifactId,
    pub sequence: u64,
    pub data: Vec<u8>,
    pub is_last: bool,
    pub compression: Compression,
    pub original_size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactAck {
    pub artifact_id: ArtifactId,
    pub success: bool,
    pub cache_hit: bool,
    pub calculated_checksum: String,
    pub cache_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactCacheQuery {
    pub job_id: String,
    pub artifact_ids: Vec<ArtifactId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedArtifactInfo {
    pub artifact_id: ArtifactId,
    pub cached: bool,
    pub checksum: String,
    pub needs_transfer: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactCacheResponse {
    pub artifact_infos: Vec<CachedArtifactInfo>,
}

/// Sender-side integrity check (spec §4.2: "senders MUST abort the job if
/// the sender's expected checksum disagrees").
pub fn verify_ack(expected_checksum: &str, ack: &ArtifactAck) -> Result<(), hodei_core::HodeiError> {
    if !ack.success {
        return Err(hodei_core::HodeiError::Validation(format!(
            "artifact {} was not accepted",
            ack.artifact_id
        )));
    }
    if ack.calculated_checksum != expected_checksum {
        return Err(hodei_core::HodeiError::Validation(format!(
            "checksum mismatch for artifact {}: expected {}, receiver computed {}",
            ack.artifact_id, expected_checksum, ack.calculated_checksum
        )));
    }
    Ok(())
}
