//! Two-tier result cache for finished check runs.
//!
//! Results are kept in memory for fast lookup and also written to per-id
//! files on disk, so a worker that restarts (or a sibling process that does
//! not share the map) can still serve downloads. Entries expire after the
//! configured TTL; disk sweeps are throttled by the cleanup interval unless
//! forced. Disk writes go to a temporary file first and are renamed into
//! place, so a concurrent reader sees either the full payload or nothing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::AppError;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

struct Entry {
    stored_at: SystemTime,
    payload: Value,
}

pub struct ResultCache {
    entries: Mutex<HashMap<String, Entry>>,
    dir: PathBuf,
    ttl: Duration,
    cleanup_interval: Duration,
    last_disk_cleanup: Mutex<SystemTime>,
}

impl ResultCache {
    /// Create a cache rooted at `dir`, creating the directory if needed.
    pub fn new(
        dir: PathBuf,
        ttl: Duration,
        cleanup_interval: Duration,
    ) -> Result<Self, AppError> {
        std::fs::create_dir_all(&dir)
            .map_err(|e| AppError::Internal(format!("cannot create results dir: {e}")))?;
        Ok(Self {
            entries: Mutex::new(HashMap::new()),
            dir,
            ttl,
            cleanup_interval,
            last_disk_cleanup: Mutex::new(SystemTime::UNIX_EPOCH),
        })
    }

    /// Derive the opaque result id for a payload: SHA-256 over its canonical
    /// JSON. Identical runs map to the same entry.
    pub fn result_id(payload: &Value) -> String {
        let mut hasher = Sha256::new();
        hasher.update(payload.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Store a payload in memory and on disk.
    pub async fn save(&self, id: &str, payload: &Value) -> Result<(), AppError> {
        self.cleanup(false).await;

        {
            let mut entries = self.entries.lock().expect("result cache lock poisoned");
            entries.insert(
                id.to_string(),
                Entry {
                    stored_at: SystemTime::now(),
                    payload: payload.clone(),
                },
            );
        }

        // Write-then-publish: the final path only ever holds a complete file.
        let tmp = self.dir.join(format!(
            "{id}.json.tmp{}",
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        let path = self.path_for(id);
        tokio::fs::write(&tmp, payload.to_string())
            .await
            .map_err(|e| AppError::Internal(format!("cannot write result file: {e}")))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| AppError::Internal(format!("cannot publish result file: {e}")))?;
        debug!(id, "result saved");
        Ok(())
    }

    /// Look up a payload by id. A memory miss falls through to disk before
    /// reporting not-found; a disk hit repopulates the memory tier.
    pub async fn load(&self, id: &str) -> Option<Value> {
        self.cleanup(false).await;

        {
            let mut entries = self.entries.lock().expect("result cache lock poisoned");
            if let Some(entry) = entries.get_mut(id) {
                if age(entry.stored_at) <= self.ttl {
                    entry.stored_at = SystemTime::now();
                    return Some(entry.payload.clone());
                }
            }
        }

        let path = self.path_for(id);
        let mtime = tokio::fs::metadata(&path).await.ok()?.modified().ok()?;
        if age(mtime) > self.ttl {
            return None;
        }
        let content = tokio::fs::read_to_string(&path).await.ok()?;
        let payload: Value = serde_json::from_str(&content)
            .inspect_err(|e| warn!(id, error = %e, "corrupt result file"))
            .ok()?;

        let mut entries = self.entries.lock().expect("result cache lock poisoned");
        entries.insert(
            id.to_string(),
            Entry {
                stored_at: SystemTime::now(),
                payload: payload.clone(),
            },
        );
        debug!(id, "result loaded from disk fallback");
        Some(payload)
    }

    /// Remove expired entries from memory, and occasionally sweep stale disk
    /// files. `force` bypasses the interval throttle for deterministic tests.
    pub async fn cleanup(&self, force: bool) {
        let expired: Vec<String> = {
            let mut entries = self.entries.lock().expect("result cache lock poisoned");
            let expired: Vec<String> = entries
                .iter()
                .filter(|(_, e)| age(e.stored_at) > self.ttl)
                .map(|(k, _)| k.clone())
                .collect();
            for key in &expired {
                entries.remove(key);
            }
            expired
        };
        for id in expired {
            let _ = tokio::fs::remove_file(self.path_for(&id)).await;
        }

        {
            let mut last = self
                .last_disk_cleanup
                .lock()
                .expect("result cache lock poisoned");
            if !force && age(*last) < self.cleanup_interval {
                return;
            }
            *last = SystemTime::now();
        }
        self.sweep_disk().await;
    }

    async fn sweep_disk(&self) {
        let Ok(mut dir) = tokio::fs::read_dir(&self.dir).await else {
            return;
        };
        while let Ok(Some(entry)) = dir.next_entry().await {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let stale = entry
                .metadata()
                .await
                .ok()
                .and_then(|m| m.modified().ok())
                .map(|mtime| age(mtime) > self.ttl)
                .unwrap_or(false);
            if stale {
                debug!(path = %path.display(), "removing stale result file");
                let _ = tokio::fs::remove_file(&path).await;
            }
        }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        // Ids are hex digests; reject anything that could traverse paths.
        let safe: String = id.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        self.dir.join(format!("{safe}.json"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Drop the in-memory tier, leaving disk intact. Test hook for the disk
    /// fallback path.
    pub fn forget_memory(&self) {
        self.entries
            .lock()
            .expect("result cache lock poisoned")
            .clear();
    }
}

fn age(t: SystemTime) -> Duration {
    SystemTime::now()
        .duration_since(t)
        .unwrap_or(Duration::ZERO)
}
