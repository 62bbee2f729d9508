// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Query result cache keyed by query name and user.

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// How long a cached result is served without refetching.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(60);

/// Cache key: which query, for which user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub name: &'static str,
    pub user_id: Uuid,
}

impl QueryKey {
    pub fn new(name: &'static str, user_id: Uuid) -> Self {
        Self { name, user_id }
    }
}

struct Entry {
    value: serde_json::Value,
    fetched_at: Instant,
}

/// Cached query results. Clones share nothing; wrap in `Arc` to share.
pub struct QueryCache {
    entries: DashMap<QueryKey, Entry>,
    stale_time: Duration,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME)
    }
}

impl QueryCache {
    pub fn new(stale_time: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            stale_time,
        }
    }

    /// Fresh cached value for `key`, if any.
    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let entry = self.entries.get(key)?;
        if entry.fetched_at.elapsed() >= self.stale_time {
            return None;
        }
        serde_json::from_value(entry.value.clone()).ok()
    }

    pub fn insert<T: Serialize>(&self, key: QueryKey, value: &T) {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.entries.insert(
                    key,
                    Entry {
                        value,
                        fetched_at: Instant::now(),
                    },
                );
            }
            Err(e) => tracing::warn!(query = key.name, error = %e, "Result not cacheable"),
        }
    }

    /// Drop every entry of the named query, for all users.
    pub fn invalidate(&self, name: &str) {
        self.entries.retain(|k, _| k.name != name);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
