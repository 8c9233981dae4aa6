//! Persistent per-address enrichment cache.
//!
//! The durable form is a JSON object mapping each address to its record.
//! The file is read once before any worker starts and written once after
//! all workers finish; in between, the in-memory map is the only copy and
//! takes concurrent writes under its own lock, last writer wins.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// One cached enrichment result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub country: String,
    pub owner: String,
    /// Epoch seconds at which the record was observed. Records persisted
    /// without a timestamp age out immediately once a TTL applies.
    #[serde(default)]
    pub ts: i64,
}

/// In-memory address cache with TTL filtering at load time.
pub struct IpCache {
    entries: RwLock<HashMap<String, CacheRecord>>,
}

impl IpCache {
    pub fn empty() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Loads the cache from `path`, dropping entries older than
    /// `ttl_secs` (no expiry when `ttl_secs <= 0`).
    ///
    /// A missing or corrupt file yields an empty cache; persistence
    /// problems never fail a run. Expired entries are discarded here and
    /// are never visible to the rest of the system.
    pub fn load(path: &Path, ttl_secs: i64) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "no usable cache file, starting empty");
                return Self::empty();
            }
        };

        let mut parsed: HashMap<String, CacheRecord> = match serde_json::from_str(&contents) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cache file corrupt, starting empty");
                return Self::empty();
            }
        };

        if ttl_secs > 0 {
            let now = Utc::now().timestamp();
            let before = parsed.len();
            parsed.retain(|_, record| now - record.ts <= ttl_secs);
            debug!(
                kept = parsed.len(),
                expired = before - parsed.len(),
                "cache loaded with TTL filter"
            );
        } else {
            debug!(entries = parsed.len(), "cache loaded without expiry");
        }

        Self {
            entries: RwLock::new(parsed),
        }
    }

    pub async fn get(&self, address: &str) -> Option<CacheRecord> {
        self.entries.read().await.get(address).cloned()
    }

    pub async fn insert(&self, address: String, record: CacheRecord) {
        self.entries.write().await.insert(address, record);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Persists the whole map to `path`. Failure is logged and swallowed:
    /// the report must still be produced when the cache cannot be saved.
    pub async fn save(&self, path: &Path) {
        let entries = self.entries.read().await;
        let serialized = match serde_json::to_string(&*entries) {
            Ok(serialized) => serialized,
            Err(err) => {
                warn!(error = %err, "cache not serializable, skipping persistence");
                return;
            }
        };
        match std::fs::write(path, serialized) {
            Ok(()) => debug!(path = %path.display(), entries = entries.len(), "cache saved"),
            Err(err) => warn!(path = %path.display(), error = %err, "cache could not be written"),
        }
    }
}
