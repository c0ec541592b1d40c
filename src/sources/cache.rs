use std::{collections::HashMap, sync::RwLock, time::Duration};

use serde_json::Value;
use tokio::time::Instant;

use crate::core::hash::cache_key;

#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub key: String,
    pub value: Value,
    pub inserted_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) > self.ttl
    }
}

/// In-memory TTL cache for raw source payloads.
///
/// Best effort: a miss only means "go fetch"; nothing here can fail a scan.
pub struct ResultCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_hours(hours: u64) -> Self {
        Self::new(Duration::from_secs(hours * 3_600))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn generate_key(source: &str, params: &[(&str, &str)]) -> String {
        cache_key(source, params)
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Live value for `key`; an expired entry is evicted and reads as a miss.
    pub fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        {
            let entries = self.entries.read().ok()?;
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        if let Ok(mut entries) = self.entries.write() {
            if entries.get(key).is_some_and(|e| e.is_expired(now)) {
                entries.remove(key);
                tracing::debug!(key, "evicted expired cache entry");
            }
        }
        None
    }

    pub fn set(&self, key: &str, value: Value) {
        let entry = CacheEntry {
            key: key.to_string(),
            value,
            inserted_at: Instant::now(),
            ttl: self.ttl,
        };
        match self.entries.write() {
            Ok(mut entries) => {
                entries.insert(entry.key.clone(), entry);
            }
            Err(_) => tracing::warn!(key, "cache lock poisoned; skipping store"),
        }
    }

    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let Ok(mut entries) = self.entries.write() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
