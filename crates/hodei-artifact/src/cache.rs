//! Worker-side content-addressed artifact cache (spec §4.2).
//!
//! Persisted under `<tmp>/hodei-artifacts-<workerId>/` as one
//! `<artifactId>.artifact` blob per entry plus an `artifact_metadata.txt`
//! index of `id|sha256|size|cachedAt` lines. The whole cache is guarded by
//! a single mutex, matching spec §5's "single-process, guarded by a mutex
//! around the metadata file".

use std::collections::HashMap;
use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use hodei_core::{ArtifactId, HodeiError};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::protocol::{ArtifactAck, ArtifactCacheQuery, ArtifactCacheResponse, ArtifactChunk, CachedArtifactInfo, Compression};

const METADATA_FILE: &str = "artifact_metadata.txt";

#[derive(Debug, Clone)]
struct CacheEntry {
    checksum: String,
    size: u64,
    #[allow(dead_code)]
    cached_at: DateTime<Utc>,
}

struct DownloadState {
    chunks: HashMap<u64, Vec<u8>>,
    max_sequence: u64,
    compression: Compression,
}

struct Inner {
    index: HashMap<String, CacheEntry>,
    downloads: HashMap<String, DownloadState>,
}

/// Directory-backed cache for one worker process. `<workerId>` names the
/// directory so multiple workers on one host never collide.
pub struct WorkerCache {
    base_dir: PathBuf,
    inner: Mutex<Inner>,
}

impl WorkerCache {
    pub fn open(worker_id: &str) -> Result<Self, HodeiError> {
        let base_dir = std::env::temp_dir().join(format!("hodei-artifacts-{worker_id}"));
        fs::create_dir_all(&base_dir)
            .map_err(|e| HodeiError::Internal(anyhow::anyhow!("creating artifact cache dir: {e}")))?;
        let index = load_metadata(&base_dir)?;
        Ok(Self {
            base_dir,
            inner: Mutex::new(Inner {
                index,
                downloads: HashMap::new(),
            }),
        })
    }

    #[cfg(test)]
    fn open_at(base_dir: PathBuf) -> Result<Self, HodeiError> {
        fs::create_dir_all(&base_dir)
            .map_err(|e| HodeiError::Internal(anyhow::anyhow!("creating artifact cache dir: {e}")))?;
        let index = load_metadata(&base_dir)?;
        Ok(Self {
            base_dir,
            inner: Mutex::new(Inner {
                index,
                downloads: HashMap::new(),
            }),
        })
    }

    /// Respond to a cache query without initiating any transfer (spec §4.2).
    pub fn cache_query(&self, query: &ArtifactCacheQuery) -> ArtifactCacheResponse {
        let inner = self.inner.lock().expect("cache lock poisoned");
        let infos = query
            .artifact_ids
            .iter()
            .map(|id| match inner.index.get(id.as_str()) {
                Some(entry) => CachedArtifactInfo {
                    artifact_id: id.clone(),
                    cached: true,
                    checksum: entry.checksum.clone(),
                    needs_transfer: false,
                },
                None => CachedArtifactInfo {
                    artifact_id: id.clone(),
                    cached: false,
                    checksum: String::new(),
                    needs_transfer: true,
                },
            })
            .collect();
        ArtifactCacheResponse { artifact_infos: infos }
    }

    /// Buffer one chunk; on `is_last`, decompress, checksum, persist, and
    /// return the final ack. Returns `None` for a non-final chunk.
    pub fn receive_chunk(&self, chunk: ArtifactChunk) -> Result<Option<ArtifactAck>, HodeiError> {
        let artifact_key = chunk.artifact_id.as_str().to_string();

        if !chunk.is_last {
            let mut inner = self.inner.lock().expect("cache lock poisoned");
            if let Some(cached) = inner.index.get(&artifact_key) {
                // Already cached: still accept and discard the chunk so a
                // sender racing a cacheQuery doesn't hang waiting for acks.
                debug!(artifact_id = %chunk.artifact_id, "dropping chunk for already-cached artifact");
                let _ = cached;
                return Ok(None);
            }
            let state = inner.downloads.entry(artifact_key.clone()).or_insert_with(|| DownloadState {
                chunks: HashMap::new(),
                max_sequence: 0,
                compression: chunk.compression,
            });
            insert_chunk(state, &chunk)?;
            return Ok(None);
        }

        let (assembled, compression) = {
            let mut inner = self.inner.lock().expect("cache lock poisoned");
            let mut state = inner
                .downloads
                .remove(&artifact_key)
                .unwrap_or_else(|| DownloadState {
                    chunks: HashMap::new(),
                    max_sequence: 0,
                    compression: chunk.compression,
                });
            insert_chunk(&mut state, &chunk)?;
            let mut assembled = Vec::with_capacity(chunk.original_size as usize);
            for seq in 0..=state.max_sequence {
                let part = state
                    .chunks
                    .get(&seq)
                    .ok_or_else(|| HodeiError::Validation(format!("missing chunk {seq} for artifact {artifact_key}")))?;
                assembled.extend_from_slice(part);
            }
            (assembled, state.compression)
        };

        let decompressed = decompress(&assembled, compression)?;
        let checksum = sha256_hex(&decompressed);

        let path = self.base_dir.join(format!("{artifact_key}.artifact"));
        fs::write(&path, &decompressed)
            .map_err(|e| HodeiError::Internal(anyhow::anyhow!("persisting artifact {artifact_key}: {e}")))?;

        let entry = CacheEntry {
            checksum: checksum.clone(),
            size: decompressed.len() as u64,
            cached_at: Utc::now(),
        };
        self.append_metadata(&artifact_key, &entry)?;

        {
            let mut inner = self.inner.lock().expect("cache lock poisoned");
            inner.index.insert(artifact_key.clone(), entry);
        }

        info!(artifact_id = %artifact_key, checksum = %checksum, "artifact cached");

        Ok(Some(ArtifactAck {
            artifact_id: chunk.artifact_id,
            success: true,
            cache_hit: false,
            calculated_checksum: checksum,
            cache_status: "stored".to_string(),
        }))
    }

    fn append_metadata(&self, artifact_id: &str, entry: &CacheEntry) -> Result<(), HodeiError> {
        let line = format!(
            "{}|{}|{}|{}\n",
            artifact_id,
            entry.checksum,
            entry.size,
            entry.cached_at.to_rfc3339()
        );
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.base_dir.join(METADATA_FILE))
            .map_err(|e| HodeiError::Internal(anyhow::anyhow!("opening artifact metadata file: {e}")))?;
        file.write_all(line.as_bytes())
            .map_err(|e| HodeiError::Internal(anyhow::anyhow!("appending artifact metadata: {e}")))?;
        Ok(())
    }
}

fn insert_chunk(state: &mut DownloadState, chunk: &ArtifactChunk) -> Result<(), HodeiError> {
    if let Some(existing) = state.chunks.get(&chunk.sequence) {
        if existing != &chunk.data {
            return Err(HodeiError::Validation(format!(
                "duplicate chunk {} for artifact {} carries different bytes",
                chunk.sequence, chunk.artifact_id
            )));
        }
        return Ok(());
    }
    state.max_sequence = state.max_sequence.max(chunk.sequence);
    state.chunks.insert(chunk.sequence, chunk.data.clone());
    Ok(())
}

fn decompress(bytes: &[u8], compression: Compression) -> Result<Vec<u8>, HodeiError> {
    match compression {
        Compression::None => Ok(bytes.to_vec()),
        Compression::Gzip => {
            let mut out = Vec::new();
            GzDecoder::new(bytes)
                .read_to_end(&mut out)
                .map_err(|e| HodeiError::Validation(format!("gzip decompression failed: {e}")))?;
            Ok(out)
        }
        Compression::Zstd => Err(HodeiError::Validation(
            "ZSTD compression is reserved and not yet implemented".to_string(),
        )),
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn load_metadata(base_dir: &PathBuf) -> Result<HashMap<String, CacheEntry>, HodeiError> {
    let path = base_dir.join(METADATA_FILE);
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let contents = fs::read_to_string(&path)
        .map_err(|e| HodeiError::Internal(anyhow::anyhow!("reading artifact metadata: {e}")))?;
    let mut index = HashMap::new();
    for line in contents.lines() {
        let mut parts = line.splitn(4, '|');
        if let (Some(id), Some(checksum), Some(size), Some(cached_at)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        {
            let size: u64 = size.parse().unwrap_or(0);
            let cached_at = DateTime::parse_from_rfc3339(cached_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now());
            index.insert(
                id.to_string(),
                CacheEntry {
                    checksum: checksum.to_string(),
                    size,
                    cached_at,
                },
            );
        }
    }
    Ok(index)
}
