//! Result cache keyed by query signature.
//!
//! DESIGN
//! ======
//! One `ResultCache` is created per application and shared through `Arc`
//! by the query client. Entries hold the rows of the most recent successful
//! response plus a version drawn from a cache-wide counter, so later writes
//! always carry a higher version. Failed results are never stored.
//!
//! TRADE-OFFS
//! ==========
//! Without a TTL an entry lives until it is invalidated or the cache is
//! cleared. With a TTL, `lookup` treats old entries as misses but leaves
//! them in place; the next successful fetch overwrites them.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::query::{CountryRow, QueryResult, Signature};

/// Cached rows for one signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub rows: Vec<CountryRow>,
    pub version: u64,
    pub fetched_at: Instant,
}

impl CacheEntry {
    #[must_use]
    pub fn result(&self) -> QueryResult {
        QueryResult::Succeeded { rows: self.rows.clone() }
    }
}

#[derive(Debug, Default)]
pub struct ResultCache {
    entries: Mutex<HashMap<Signature, CacheEntry>>,
    last_version: AtomicU64,
    ttl: Option<Duration>,
}

impl ResultCache {
    /// Cache without expiry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache whose entries stop answering lookups once older than `ttl`.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl: Some(ttl), ..Self::default() }
    }

    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    #[must_use]
    pub fn lookup(&self, signature: &Signature) -> Option<CacheEntry> {
        self.lookup_at(signature, Instant::now())
    }

    /// Internal: lookup against an explicit clock (for testing).
    pub(crate) fn lookup_at(&self, signature: &Signature, now: Instant) -> Option<CacheEntry> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let entry = entries.get(signature)?;
        if let Some(ttl) = self.ttl {
            if now.saturating_duration_since(entry.fetched_at) >= ttl {
                return None;
            }
        }
        Some(entry.clone())
    }

    /// Insert or overwrite the rows for `signature`. Returns the new version.
    pub fn store(&self, signature: Signature, rows: Vec<CountryRow>) -> u64 {
        self.store_at(signature, rows, Instant::now())
    }

    /// Internal: store with an explicit fetch instant (for testing).
    pub(crate) fn store_at(&self, signature: Signature, rows: Vec<CountryRow>, fetched_at: Instant) -> u64 {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        // Versioned under the lock so map order and version order agree.
        let version = self.last_version.fetch_add(1, Ordering::Relaxed) + 1;
        entries.insert(signature, CacheEntry { rows, version, fetched_at });
        version
    }

    /// Remove the entry for `signature`. Returns whether one existed.
    pub fn invalidate(&self, signature: &Signature) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(signature)
            .is_some()
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod tests;
