use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// One cached resolution. `url` is `None` when no logo was found; misses are
/// cached too so a missing logo is not re-probed before `expires`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoCacheEntry {
    pub url: Option<String>,
    pub timestamp: u64,
    pub expires: u64,
}

impl LogoCacheEntry {
    pub fn is_valid(&self, now_ms: u64) -> bool {
        now_ms < self.expires
    }
}

/// Time-boxed logo cache, optionally mirrored to a single JSON file.
///
/// Storage problems never surface: an unreadable or corrupt file loads as an
/// empty cache and failed writes are dropped.
#[derive(Debug)]
pub struct LogoCache {
    path: Option<PathBuf>,
    ttl: Duration,
    entries: HashMap<String, LogoCacheEntry>,
}

impl LogoCache {
    pub fn in_memory(ttl: Duration) -> Self {
        Self {
            path: None,
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn open(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        let path = path.into();
        let entries = read_entries(&path);
        Self {
            path: Some(path),
            ttl,
            entries,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `None` on a miss (absent or expired), `Some(url)` on a hit.
    pub fn get(&self, key: &str, now_ms: u64) -> Option<Option<String>> {
        let entry = self.entries.get(key)?;
        entry.is_valid(now_ms).then(|| entry.url.clone())
    }

    /// Record a resolution and drop every entry that has expired by `now_ms`.
    /// Nothing is written to disk; see [`Self::snapshot`].
    pub fn insert(&mut self, key: &str, url: Option<String>, now_ms: u64) {
        let ttl_ms = u64::try_from(self.ttl.as_millis()).unwrap_or(u64::MAX);
        self.entries.retain(|_, entry| entry.is_valid(now_ms));
        self.entries.insert(
            key.to_string(),
            LogoCacheEntry {
                url,
                timestamp: now_ms,
                expires: now_ms.saturating_add(ttl_ms),
            },
        );
    }

    /// Serialized copy of the current entries, for file-backed caches only.
    pub fn snapshot(&self) -> Option<CacheSnapshot> {
        let path = self.path.clone()?;
        match serde_json::to_vec(&self.entries) {
            Ok(bytes) => Some(CacheSnapshot { path, bytes }),
            Err(err) => {
                log::debug!("Logo cache serialize failed: {err}");
                None
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        if let Some(path) = &self.path {
            if let Err(err) = std::fs::remove_file(path) {
                if err.kind() != std::io::ErrorKind::NotFound {
                    log::debug!("Logo cache remove failed {}: {err}", path.display());
                }
            }
        }
    }
}

/// Cache contents waiting to be written; written off the lock that produced it.
#[derive(Debug)]
pub struct CacheSnapshot {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl CacheSnapshot {
    /// Write through a temp file and rename. Failures are logged and dropped.
    pub async fn write(self) {
        let path = self.path;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            let _ = tokio::fs::create_dir_all(parent).await;
        }
        let tmp = path.with_extension("json.tmp");
        let written = match tokio::fs::write(&tmp, &self.bytes).await {
            Ok(()) => tokio::fs::rename(&tmp, &path).await,
            Err(err) => Err(err),
        };
        if let Err(err) = written {
            log::debug!("Logo cache write failed {}: {err}", path.display());
            let _ = tokio::fs::remove_file(&tmp).await;
        }
    }
}

fn read_entries(path: &Path) -> HashMap<String, LogoCacheEntry> {
    let Ok(bytes) = std::fs::read(path) else {
        return HashMap::new();
    };
    match serde_json::from_slice(&bytes) {
        Ok(entries) => entries,
        Err(err) => {
            log::warn!("Logo cache corrupted {}: {err}", path.display());
            HashMap::new()
        }
    }
}

pub fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}
