//! Cache of resolved pipelines keyed by spec digest.
//!
//! Runs bound to the same spec snapshot share one [`ResolvedPipeline`]
//! instead of resolving it again. Entries are immutable once stored.

use crate::config::CacheConfig;
use crate::resolve::ResolvedPipeline;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// A cached resolution with its lifetime.
#[derive(Debug, Clone)]
pub struct CachedResolution {
    /// The resolved pipeline.
    pub resolved: Arc<ResolvedPipeline>,
    /// When the entry was stored.
    pub created_at: DateTime<Utc>,
    /// When the entry stops being served.
    pub expires_at: DateTime<Utc>,
}

impl CachedResolution {
    /// Returns true if the entry has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// In-memory resolution cache.
#[derive(Debug)]
pub struct ResolutionCache {
    entries: Mutex<HashMap<String, CachedResolution>>,
    ttl: ChronoDuration,
    max_entries: usize,
}

impl ResolutionCache {
    /// Creates a cache from configuration.
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        let ttl_seconds = i64::try_from(config.ttl_seconds).unwrap_or(i64::MAX);
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: ChronoDuration::try_seconds(ttl_seconds).unwrap_or(ChronoDuration::MAX),
            max_entries: config.max_entries,
        }
    }

    /// Returns the cached resolution for a digest, dropping it if expired.
    #[must_use]
    pub fn get(&self, digest: &str) -> Option<Arc<ResolvedPipeline>> {
        self.get_at(digest, Utc::now())
    }

    fn get_at(&self, digest: &str, now: DateTime<Utc>) -> Option<Arc<ResolvedPipeline>> {
        let mut entries = self.entries.lock();

        if let Some(entry) = entries.get(digest) {
            if entry.is_expired_at(now) {
                entries.remove(digest);
                tracing::debug!(digest, "Evicted expired resolution");
                return None;
            }
            return Some(Arc::clone(&entry.resolved));
        }

        None
    }

    /// Stores a resolution, evicting the oldest entry when full.
    pub fn insert(&self, digest: impl Into<String>, resolved: Arc<ResolvedPipeline>) {
        self.insert_at(digest.into(), resolved, Utc::now());
    }

    fn insert_at(&self, digest: String, resolved: Arc<ResolvedPipeline>, now: DateTime<Utc>) {
        if self.max_entries == 0 {
            return;
        }
        let mut entries = self.entries.lock();

        entries.retain(|_, e| !e.is_expired_at(now));
        while entries.len() >= self.max_entries && !entries.contains_key(&digest) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.created_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(key) => {
                    entries.remove(&key);
                    tracing::debug!(digest = %key, "Evicted oldest resolution");
                }
                None => break,
            }
        }

        entries.insert(
            digest,
            CachedResolution {
                resolved,
                created_at: now,
                expires_at: now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
            },
        );
    }

    /// Removes an entry.
    pub fn remove(&self, digest: &str) -> Option<Arc<ResolvedPipeline>> {
        self.entries.lock().remove(digest).map(|e| e.resolved)
    }

    /// Clears all entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
