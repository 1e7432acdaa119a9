//! Two cache tiers for activated subgraphs.
//!
//! - local: bounded in-process LRU with an optional TTL, the only shared
//!   mutable state in the engine
//! - distributed: a key/value collaborator with per-write expiry, optional

use anyhow::Result;
use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::activation::SubgraphActivation;

/// Cache key shared by both tiers.
pub fn cache_key(user: &str, keyword: &str) -> String {
    format!("{}:{}", user, keyword)
}

#[async_trait]
pub trait DistributedCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
}

struct LocalEntry {
    value: Arc<SubgraphActivation>,
    inserted: Instant,
}

pub struct LocalCache {
    entries: Mutex<LruCache<String, LocalEntry>>,
    ttl: Option<Duration>,
}

impl LocalCache {
    /// A capacity of zero is bumped to one.
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<SubgraphActivation>> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(key) {
            None => return None,
            Some(entry) => self.is_expired(entry),
        };
        if expired {
            entries.pop(key);
            return None;
        }
        entries.get(key).map(|e| e.value.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Later writes replace earlier ones for the same key.
    pub fn insert(&self, key: String, value: Arc<SubgraphActivation>) {
        self.entries.lock().put(
            key,
            LocalEntry {
                value,
                inserted: Instant::now(),
            },
        );
    }

    /// Drop every entry of one user. Returns how many were removed.
    pub fn invalidate_user(&self, user: &str) -> usize {
        let prefix = format!("{}:", user);
        let mut entries = self.entries.lock();
        let doomed: Vec<String> = entries
            .iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &doomed {
            entries.pop(key);
        }
        doomed.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, entry: &LocalEntry) -> bool {
        self.ttl.is_some_and(|ttl| entry.inserted.elapsed() >= ttl)
    }
}
