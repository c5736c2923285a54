//! Tag-grouped read cache.
//!
//! Successful reads are stored under their resource's tag; a mutation drops
//! every entry under the tags it affects so the next read refetches.
//!
//! Each tag carries a generation that every invalidation bumps. A read
//! captures it before going to the backend and only stores its answer if no
//! invalidation happened in between.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;
use serde_json::Value;

use crate::models::ResourceKind;

/// Upper bound on cached reads per tag.
pub const MAX_ENTRIES_PER_TAG: u64 = 1_000;

/// Invalidation count of one tag at the time a read started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

struct TagBucket {
    entries: Cache<String, Value>,
    generation: AtomicU64,
}

impl TagBucket {
    fn new(ttl: Duration) -> Self {
        let entries = if ttl.is_zero() {
            Cache::new(0)
        } else {
            Cache::builder()
                .max_capacity(MAX_ENTRIES_PER_TAG)
                .time_to_live(ttl)
                .build()
        };
        Self {
            entries,
            generation: AtomicU64::new(0),
        }
    }

    fn generation(&self) -> Generation {
        Generation(self.generation.load(Ordering::SeqCst))
    }
}

pub struct TagCache {
    ttl: Duration,
    buckets: HashMap<&'static str, TagBucket>,
}

impl TagCache {
    /// A zero `ttl` disables caching.
    pub fn new(ttl: Duration) -> Self {
        let buckets = ResourceKind::ALL
            .iter()
            .map(|kind| (kind.cache_tag(), TagBucket::new(ttl)))
            .collect();
        Self { ttl, buckets }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub fn generation(&self, tag: &str) -> Generation {
        self.buckets
            .get(tag)
            .map(TagBucket::generation)
            .unwrap_or(Generation(0))
    }

    pub async fn get(&self, tag: &str, key: &str) -> Option<Value> {
        if !self.is_enabled() {
            return None;
        }
        self.buckets.get(tag)?.entries.get(key).await
    }

    /// Store `value` unless `tag` was invalidated since `seen` was captured.
    /// Returns whether the value was kept.
    pub async fn put(&self, tag: &str, key: String, value: Value, seen: Generation) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let Some(bucket) = self.buckets.get(tag) else {
            return false;
        };
        if bucket.generation() != seen {
            return false;
        }

        bucket.entries.insert(key.clone(), value).await;
        // An invalidation may have landed between the check and the insert.
        if bucket.generation() != seen {
            bucket.entries.invalidate(&key).await;
            return false;
        }
        true
    }

    /// Drop every entry under `tags`. Returns how many entries were removed.
    pub async fn invalidate<I, S>(&self, tags: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut removed = 0;
        for tag in tags {
            let Some(bucket) = self.buckets.get(tag.as_ref()) else {
                continue;
            };
            bucket.generation.fetch_add(1, Ordering::SeqCst);
            bucket.entries.run_pending_tasks().await;
            let count = bucket.entries.entry_count();
            bucket.entries.invalidate_all();
            if count > 0 {
                tracing::debug!("Invalidated {} cached reads under tag {}", count, tag.as_ref());
            }
            removed += count as usize;
        }
        removed
    }

    pub async fn len(&self) -> u64 {
        let mut total = 0;
        for bucket in self.buckets.values() {
            bucket.entries.run_pending_tasks().await;
            total += bucket.entries.entry_count();
        }
        total
    }
}
