//! Fingerprint-keyed verdict cache.
//!
//! An entry is served only while it is younger than the TTL and stamped
//! with the current rule-corpus version. A corpus change therefore makes
//! every older entry unreachable with no sweep; entries found stale on
//! lookup are dropped on the spot. Capacity is enforced by evicting the
//! least recently used entry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use nyaya_core::{Fingerprint, Verdict};
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry {
    verdict: Verdict,
    stamp: u64,
    inserted_at: Instant,
    last_used: u64,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<Fingerprint, Entry>,
    /// Monotonic access counter for LRU ordering.
    tick: u64,
}

/// Bounded TTL cache for composed verdicts. The cache is best-effort: a
/// poisoned lock degrades every call to a miss rather than an error.
#[derive(Debug, Clone)]
pub struct ResultCache {
    inner: Arc<Mutex<CacheInner>>,
    capacity: usize,
    ttl: Duration,
}

impl ResultCache {
    /// A cache holding at most `capacity` verdicts for at most `ttl` each.
    /// A capacity of zero disables caching entirely.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner::default())),
            capacity,
            ttl,
        }
    }

    /// Look up a verdict. Hits require the stored corpus stamp to equal
    /// `stamp`; an entry that is expired or stamped differently is removed.
    pub fn get(&self, fingerprint: &Fingerprint, stamp: u64) -> Option<Verdict> {
        let mut inner = self.inner.lock().ok()?;
        inner.tick += 1;
        let tick = inner.tick;
        match inner.entries.get_mut(fingerprint) {
            Some(entry) if entry.stamp == stamp && entry.inserted_at.elapsed() < self.ttl => {
                entry.last_used = tick;
                Some(entry.verdict.clone())
            }
            Some(_) => {
                inner.entries.remove(fingerprint);
                debug!(fingerprint = %fingerprint, "dropped stale cache entry");
                None
            }
            None => None,
        }
    }

    /// Store a verdict under a fingerprint, evicting the least recently
    /// used entry if the cache is full.
    pub fn put(&self, fingerprint: Fingerprint, stamp: u64, verdict: Verdict) {
        if self.capacity == 0 {
            return;
        }
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        inner.tick += 1;
        let tick = inner.tick;
        if inner.entries.len() >= self.capacity && !inner.entries.contains_key(&fingerprint) {
            let victim = inner
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone());
            if let Some(victim) = victim {
                inner.entries.remove(&victim);
            }
        }
        inner.entries.insert(
            fingerprint,
            Entry { verdict, stamp, inserted_at: Instant::now(), last_used: tick },
        );
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|i| i.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use nyaya_core::{ChargeCategory, Language, StructuredData, VerdictStatus, DISCLAIMER};

    fn fingerprint(tag: &str) -> Fingerprint {
        let data = StructuredData {
            charge_type: ChargeCategory::Other,
            vendor: Some(tag.into()),
            ..StructuredData::default()
        };
        Fingerprint::compute(&data, None, Language::En, 1).unwrap()
    }

    fn verdict(title: &str) -> Verdict {
        Verdict {
            status: VerdictStatus::Legal,
            title: title.into(),
            explanation: String::new(),
            confidence: 80,
            citations: vec![],
            disclaimer: DISCLAIMER.into(),
        }
    }

    const LONG: Duration = Duration::from_secs(3600);

    #[test]
    fn hit_requires_matching_stamp() {
        let cache = ResultCache::new(8, LONG);
        let fp = fingerprint("a");
        cache.put(fp.clone(), 5, verdict("v"));

        assert!(cache.get(&fp, 5).is_some());
        // A corpus change invalidates without any explicit flush.
        assert!(cache.get(&fp, 6).is_none());
        // The mismatching entry was dropped on touch.
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let cache = ResultCache::new(8, Duration::ZERO);
        let fp = fingerprint("a");
        cache.put(fp.clone(), 1, verdict("v"));
        assert!(cache.get(&fp, 1).is_none());
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = ResultCache::new(2, LONG);
        let (a, b, c) = (fingerprint("a"), fingerprint("b"), fingerprint("c"));
        cache.put(a.clone(), 1, verdict("a"));
        cache.put(b.clone(), 1, verdict("b"));

        // Touch `a` so `b` becomes the eviction victim.
        assert!(cache.get(&a, 1).is_some());
        cache.put(c.clone(), 1, verdict("c"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&a, 1).is_some());
        assert!(cache.get(&b, 1).is_none());
        assert!(cache.get(&c, 1).is_some());
    }

    #[test]
    fn overwriting_does_not_evict_neighbours() {
        let cache = ResultCache::new(2, LONG);
        let (a, b) = (fingerprint("a"), fingerprint("b"));
        cache.put(a.clone(), 1, verdict("a1"));
        cache.put(b.clone(), 1, verdict("b"));
        cache.put(a.clone(), 1, verdict("a2"));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&a, 1).unwrap().title, "a2");
        assert!(cache.get(&b, 1).is_some());
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let cache = ResultCache::new(0, LONG);
        let fp = fingerprint("a");
        cache.put(fp.clone(), 1, verdict("v"));
        assert!(cache.get(&fp, 1).is_none());
        assert!(cache.is_empty());
    }
}
