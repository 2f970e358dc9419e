/* src/cache.rs */

use crate::{payload::Payload, signature::RequestSignature};
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

/// A fetched payload and the moment it was fetched. Both are written together
/// under the shard lock, so readers never see one without the other.
struct CacheEntry {
    payload: Payload,
    fetched_at: Instant,
}

/// TTL-bounded result cache keyed by [`RequestSignature`].
///
/// Staleness is lazy: an expired entry is reported as a miss and left in place
/// until the next store for the same signature overwrites it. There is no
/// background sweep.
pub struct ResultCache {
    ttl: Duration,
    entries: DashMap<RequestSignature, CacheEntry>,
}

impl ResultCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Returns the cached payload if it was fetched less than one TTL before `now`.
    #[must_use]
    pub fn lookup(&self, signature: &RequestSignature, now: Instant) -> Option<Payload> {
        let entry = self.entries.get(signature)?;
        let age = now.saturating_duration_since(entry.fetched_at);
        (age < self.ttl).then(|| entry.payload.clone())
    }

    /// Writes or overwrites the entry for `signature`.
    pub fn store(&self, signature: RequestSignature, payload: Payload, now: Instant) {
        self.entries.insert(
            signature,
            CacheEntry {
                payload,
                fetched_at: now,
            },
        );
    }

    /// Number of entries held, stale ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sig(operation: &'static str, arg: &str) -> RequestSignature {
        RequestSignature::new(operation, vec![arg.to_owned()], BTreeMap::new())
    }

    fn text(body: &str) -> Payload {
        Payload::Text(body.to_owned())
    }

    #[test]
    fn fresh_until_exactly_one_ttl() {
        let cache = ResultCache::new(Duration::from_secs(30));
        let t0 = Instant::now();
        cache.store(sig("tx", "aa"), text("v"), t0);

        assert_eq!(cache.lookup(&sig("tx", "aa"), t0), Some(text("v")));
        assert_eq!(
            cache.lookup(&sig("tx", "aa"), t0 + Duration::from_millis(29_999)),
            Some(text("v"))
        );
        assert_eq!(
            cache.lookup(&sig("tx", "aa"), t0 + Duration::from_secs(30)),
            None
        );
    }

    #[test]
    fn stale_entries_stay_until_overwritten() {
        let cache = ResultCache::new(Duration::from_secs(1));
        let t0 = Instant::now();
        cache.store(sig("tx", "aa"), text("old"), t0);

        let later = t0 + Duration::from_secs(5);
        assert_eq!(cache.lookup(&sig("tx", "aa"), later), None);
        assert_eq!(cache.len(), 1);

        cache.store(sig("tx", "aa"), text("new"), later);
        assert_eq!(cache.lookup(&sig("tx", "aa"), later), Some(text("new")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn zero_ttl_never_hits() {
        let cache = ResultCache::new(Duration::ZERO);
        let t0 = Instant::now();
        cache.store(sig("tx", "aa"), text("v"), t0);
        assert_eq!(cache.lookup(&sig("tx", "aa"), t0), None);
    }

    #[test]
    fn distinct_signatures_do_not_collide() {
        let cache = ResultCache::new(Duration::from_secs(30));
        let t0 = Instant::now();
        cache.store(sig("tx", "aa"), text("tx"), t0);
        cache.store(sig("block", "aa"), text("block"), t0);

        assert_eq!(cache.lookup(&sig("tx", "aa"), t0), Some(text("tx")));
        assert_eq!(cache.lookup(&sig("block", "aa"), t0), Some(text("block")));
        assert_eq!(cache.lookup(&sig("tx", "bb"), t0), None);
    }
}
