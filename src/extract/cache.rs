//! Per-domain memory of the last locator that produced a price.
//!
//! The cascade consults this first. Entries expire lazily after the TTL, a
//! locator that stops matching is dropped on its first miss, and the map is
//! bounded by evicting the least recently used 20% once it grows past capacity.

use crate::extract::models::{CachedSelector, Domain, Locator};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, trace};

/// Fraction of entries dropped when the cache overflows.
const EVICTION_RATIO: f64 = 0.2;

/// Time source, injectable so expiry and eviction are testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Storage for the winning locator of each domain.
pub trait SelectorCache: Send + Sync {
    /// Returns the cached locator unless it is absent or expired.
    fn get(&self, domain: &Domain) -> Option<Locator>;

    /// Upserts the winning locator for a domain.
    fn record_success(&self, domain: &Domain, locator: &Locator);

    /// Forgets the domain's locator.
    fn record_failure(&self, domain: &Domain);

    /// Drops the oldest entries when over capacity. Returns how many were removed.
    fn evict_if_oversized(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process [`SelectorCache`].
pub struct MemorySelectorCache {
    entries: Mutex<HashMap<Domain, CachedSelector>>,
    ttl: TimeDelta,
    capacity: usize,
    clock: Arc<dyn Clock>,
}

impl MemorySelectorCache {
    pub fn new(ttl: TimeDelta, capacity: usize) -> Self {
        Self::with_clock(ttl, capacity, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: TimeDelta, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self { entries: Mutex::new(HashMap::new()), ttl, capacity: capacity.max(1), clock }
    }

    /// Returns a copy of the full entry, for diagnostics.
    pub fn entry(&self, domain: &Domain) -> Option<CachedSelector> {
        self.lock().get(domain).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Domain, CachedSelector>> {
        // A panic while holding the lock leaves the map usable; the data is advisory.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn evict_locked(&self, entries: &mut HashMap<Domain, CachedSelector>) -> usize {
        if entries.len() <= self.capacity {
            return 0;
        }

        let count = ((entries.len() as f64 * EVICTION_RATIO).floor() as usize).max(1);

        let mut by_age: Vec<(DateTime<Utc>, Domain)> =
            entries.values().map(|entry| (entry.last_used_at, entry.domain.clone())).collect();
        by_age.sort();

        for (_, domain) in by_age.into_iter().take(count) {
            entries.remove(&domain);
        }

        debug!("Evicted {} cached selectors ({} remain)", count, entries.len());
        count
    }
}

impl SelectorCache for MemorySelectorCache {
    fn get(&self, domain: &Domain) -> Option<Locator> {
        let now = self.clock.now();
        let mut entries = self.lock();

        let expired = entries.get(domain).map(|entry| now - entry.last_used_at > self.ttl)?;
        if expired {
            trace!("Cached selector for {} expired", domain);
            entries.remove(domain);
            return None;
        }

        entries.get(domain).map(|entry| entry.locator.clone())
    }

    fn record_success(&self, domain: &Domain, locator: &Locator) {
        let now = self.clock.now();
        let mut entries = self.lock();

        match entries.get_mut(domain) {
            Some(entry) if entry.locator == *locator => {
                entry.success_count += 1;
                entry.last_used_at = now;
            }
            _ => {
                entries.insert(
                    domain.clone(),
                    CachedSelector {
                        domain: domain.clone(),
                        locator: locator.clone(),
                        last_used_at: now,
                        success_count: 1,
                    },
                );
            }
        }

        self.evict_locked(&mut entries);
    }

    fn record_failure(&self, domain: &Domain) {
        if self.lock().remove(domain).is_some() {
            debug!("Dropped cached selector for {}", domain);
        }
    }

    fn evict_if_oversized(&self) -> usize {
        let mut entries = self.lock();
        self.evict_locked(&mut entries)
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Clock that only moves when told to.
    pub(crate) struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        pub(crate) fn new() -> Self {
            Self { now: Mutex::new(DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()) }
        }

        pub(crate) fn advance(&self, by: TimeDelta) {
            *self.now.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    fn cache_with_clock(capacity: usize) -> (MemorySelectorCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = MemorySelectorCache::with_clock(TimeDelta::hours(24), capacity, clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_get_missing() {
        let (cache, _) = cache_with_clock(10);
        assert!(cache.get(&Domain::new("kabum.com.br")).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_record_success_and_get() {
        let (cache, _) = cache_with_clock(10);
        let domain = Domain::new("kabum.com.br");

        cache.record_success(&domain, &Locator::css(".finalPrice"));
        assert_eq!(cache.get(&domain), Some(Locator::css(".finalPrice")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_same_locator_increments_count() {
        let (cache, _) = cache_with_clock(10);
        let domain = Domain::new("kabum.com.br");

        cache.record_success(&domain, &Locator::css(".finalPrice"));
        cache.record_success(&domain, &Locator::css(".finalPrice"));
        assert_eq!(cache.entry(&domain).unwrap().success_count, 2);

        cache.record_success(&domain, &Locator::css(".price"));
        let entry = cache.entry(&domain).unwrap();
        assert_eq!(entry.success_count, 1);
        assert_eq!(entry.locator, Locator::css(".price"));
    }

    #[test]
    fn test_failure_removes_entry() {
        let (cache, _) = cache_with_clock(10);
        let domain = Domain::new("kabum.com.br");

        cache.record_success(&domain, &Locator::css(".finalPrice"));
        cache.record_failure(&domain);
        assert!(cache.get(&domain).is_none());

        // Removing twice is harmless
        cache.record_failure(&domain);
    }

    #[test]
    fn test_ttl_expiry() {
        let (cache, clock) = cache_with_clock(10);
        let domain = Domain::new("kabum.com.br");

        cache.record_success(&domain, &Locator::css(".finalPrice"));
        clock.advance(TimeDelta::hours(23));
        assert!(cache.get(&domain).is_some());

        clock.advance(TimeDelta::hours(2));
        assert!(cache.get(&domain).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_reuse_refreshes_ttl() {
        let (cache, clock) = cache_with_clock(10);
        let domain = Domain::new("kabum.com.br");

        cache.record_success(&domain, &Locator::css(".finalPrice"));
        clock.advance(TimeDelta::hours(20));
        cache.record_success(&domain, &Locator::css(".finalPrice"));
        clock.advance(TimeDelta::hours(20));
        assert!(cache.get(&domain).is_some());
    }

    #[test]
    fn test_eviction_removes_oldest_fifth() {
        let (cache, clock) = cache_with_clock(9);

        let domains: Vec<Domain> =
            (0..10).map(|i| Domain::new(&format!("loja{i}.com.br"))).collect();

        for domain in &domains {
            cache.record_success(domain, &Locator::css(".price"));
            clock.advance(TimeDelta::seconds(1));
        }

        // 10 entries > 9 triggers removal of floor(10 * 0.2) = 2
        assert_eq!(cache.len(), 8);
        assert!(cache.get(&domains[0]).is_none());
        assert!(cache.get(&domains[1]).is_none());
        for domain in &domains[2..] {
            assert!(cache.get(domain).is_some(), "{domain} should survive");
        }
    }

    #[test]
    fn test_eviction_respects_recent_use() {
        let (cache, clock) = cache_with_clock(4);
        let domains: Vec<Domain> =
            (0..4).map(|i| Domain::new(&format!("loja{i}.com.br"))).collect();

        for domain in &domains {
            cache.record_success(domain, &Locator::css(".price"));
            clock.advance(TimeDelta::seconds(1));
        }

        // Touch the oldest so the second one becomes least recent
        cache.record_success(&domains[0], &Locator::css(".price"));
        clock.advance(TimeDelta::seconds(1));

        cache.record_success(&Domain::new("nova.com.br"), &Locator::css(".price"));
        assert_eq!(cache.len(), 4);
        assert!(cache.get(&domains[0]).is_some());
        assert!(cache.get(&domains[1]).is_none());
    }

    #[test]
    fn test_evict_if_oversized_noop_under_capacity() {
        let (cache, _) = cache_with_clock(5);
        cache.record_success(&Domain::new("a.com.br"), &Locator::css(".price"));
        assert_eq!(cache.evict_if_oversized(), 0);
        assert_eq!(cache.len(), 1);
    }
}
