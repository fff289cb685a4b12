// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! LRU cache for wallet record lookups.
//!
//! Wallet records are immutable once written, so a cached hit can only go
//! stale by expiring. Misses are never cached: a record may appear at any
//! time.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;

use super::{RecordStore, StoreResult, WalletRecord};

/// Cached entry: record + insertion timestamp.
struct CacheEntry {
    record: WalletRecord,
    inserted_at: Instant,
}

/// Read-through cache in front of a [`RecordStore`].
pub struct CachedRecordStore {
    inner: Arc<dyn RecordStore>,
    cache: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
}

impl CachedRecordStore {
    /// Wrap `inner` with a cache of `capacity` records, each kept for `ttl`.
    pub fn new(inner: Arc<dyn RecordStore>, capacity: usize, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            ttl,
        }
    }

    fn cached(&self, id: &str) -> Option<WalletRecord> {
        let mut cache = self.cache.lock().ok()?;
        if let Some(entry) = cache.get(id) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.record.clone());
            }
            cache.pop(id);
        }
        None
    }

    fn remember(&self, record: &WalletRecord) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                record.id.clone(),
                CacheEntry {
                    record: record.clone(),
                    inserted_at: Instant::now(),
                },
            );
        }
    }

    /// Number of live cache entries, expired ones included.
    pub fn cached_len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl RecordStore for CachedRecordStore {
    async fn get_record(&self, id: &str) -> StoreResult<Option<WalletRecord>> {
        if let Some(record) = self.cached(id) {
            tracing::debug!(wallet_id = %id, "record cache hit");
            return Ok(Some(record));
        }

        let record = self.inner.get_record(id).await?;
        if let Some(ref record) = record {
            self.remember(record);
        }
        Ok(record)
    }

    async fn put_if_absent(&self, record: &WalletRecord) -> StoreResult<()> {
        self.inner.put_if_absent(record).await?;
        self.remember(record);
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.inner.health_check().await
    }
}
