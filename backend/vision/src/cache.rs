//! Scan result cache.
//!
//! Keyed by image content hash. Exists only to avoid re-billing the vision
//! provider for an identical re-upload; it is process-local and a concurrent
//! duplicate upload may still pay for two calls.

use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::sync::Cache;

use tabsplit_core::ScannedReceipt;

/// A cached scan with the time it was produced.
#[derive(Debug, Clone)]
pub struct CachedScan {
    pub receipt: ScannedReceipt,
    pub scanned_at: DateTime<Utc>,
}

/// Bounded, TTL-evicting cache of scan results.
#[derive(Clone)]
pub struct ScanCache {
    cache: Cache<u32, CachedScan>,
}

impl ScanCache {
    /// `capacity` entries, each living at most `ttl`.
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn get(&self, key: u32) -> Option<CachedScan> {
        self.cache.get(&key)
    }

    pub fn insert(&self, key: u32, receipt: ScannedReceipt) {
        self.cache.insert(
            key,
            CachedScan {
                receipt,
                scanned_at: Utc::now(),
            },
        );
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

impl Default for ScanCache {
    fn default() -> Self {
        Self::new(256, Duration::from_secs(86_400))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_returns_scans() {
        let cache = ScanCache::new(8, Duration::from_secs(60));
        let receipt = ScannedReceipt {
            place: Some("Cafe".into()),
            date: None,
            items: vec![],
            subtotal: 0.0,
            tax: 0.0,
            tip: 0.0,
            total: 0.0,
        };
        cache.insert(42, receipt.clone());
        assert_eq!(cache.get(42).unwrap().receipt, receipt);
        assert!(cache.get(7).is_none());
    }

    #[test]
    fn reset_clears_entries() {
        let cache = ScanCache::default();
        cache.insert(1, ScannedReceipt::default());
        cache.invalidate_all();
        // moka applies invalidation lazily; run pending work before asserting.
        cache.cache.run_pending_tasks();
        assert!(cache.get(1).is_none());
    }
}
