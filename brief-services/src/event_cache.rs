//! Bounded event cache
//!
//! Fixed-capacity, insertion-ordered store for canonical liquidation events.
//! Ingestion tasks append continuously; the digest build reads a snapshot.
//! The single lock is held only for the O(1) append or the snapshot copy,
//! never across I/O.

use std::collections::VecDeque;

use chrono::{Duration, Utc};
use parking_lot::Mutex;

use brief_core::CanonicalEvent;

/// Thread-safe bounded store of the most recent liquidation events
///
/// Invariant: `len() <= capacity()` at all times; the retained events are
/// exactly the most recently appended ones, in insertion order.
#[derive(Debug)]
pub struct EventCache {
    events: Mutex<VecDeque<CanonicalEvent>>,
    capacity: usize,
}

impl EventCache {
    /// Create a cache holding at most `capacity` events
    ///
    /// # Panics
    /// Panics if `capacity` is zero. A zero-capacity cache is a programming
    /// error, not a runtime condition.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "event cache capacity must be > 0");
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append an event, evicting the single oldest one if the cache is full
    pub fn append(&self, event: CanonicalEvent) {
        let mut events = self.events.lock();
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Ordered copy of the held events
    ///
    /// With a window, only events observed within `window` of now are
    /// returned. Copy semantics: callers never observe a partial mutation.
    pub fn snapshot(&self, window: Option<Duration>) -> Vec<CanonicalEvent> {
        let events = self.events.lock();
        match window {
            Some(window) => {
                let cutoff = Utc::now() - window;
                events
                    .iter()
                    .filter(|e| e.observed_at >= cutoff)
                    .cloned()
                    .collect()
            }
            None => events.iter().cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        let events = self.events.lock();
        CacheStats {
            len: events.len(),
            capacity: self.capacity,
            oldest: events.front().map(|e| e.observed_at),
            newest: events.back().map(|e| e.observed_at),
        }
    }
}

/// Point-in-time cache statistics for logging
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub len: usize,
    pub capacity: usize,
    pub oldest: Option<chrono::DateTime<Utc>>,
    pub newest: Option<chrono::DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use brief_core::Side;

    fn event(seq: &str) -> CanonicalEvent {
        CanonicalEvent::new("test", "BTC", 100.0, 1.0, Side::Long, seq)
    }

    #[test]
    #[should_panic(expected = "capacity must be > 0")]
    fn zero_capacity_is_fatal() {
        EventCache::new(0);
    }

    #[test]
    fn append_within_capacity_keeps_everything() {
        let cache = EventCache::new(5);
        for i in 0..3 {
            cache.append(event(&i.to_string()));
        }
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn overflow_evicts_oldest_first() {
        let cache = EventCache::new(3);
        for i in 0..10 {
            cache.append(event(&i.to_string()));
        }
        assert_eq!(cache.len(), 3);
        let snap = cache.snapshot(None);
        let seqs: Vec<&str> = snap.iter().map(|e| e.sequence_id.as_str()).collect();
        assert_eq!(seqs, vec!["7", "8", "9"]);
    }

    #[test]
    fn snapshot_preserves_insertion_order() {
        let cache = EventCache::new(10);
        for seq in ["a", "b", "c"] {
            cache.append(event(seq));
        }
        let snap = cache.snapshot(None);
        let seqs: Vec<&str> = snap.iter().map(|e| e.sequence_id.as_str()).collect();
        assert_eq!(seqs, vec!["a", "b", "c"]);
    }

    #[test]
    fn windowed_snapshot_drops_old_events() {
        let cache = EventCache::new(10);
        let mut old = event("old");
        old.observed_at = Utc::now() - Duration::hours(13);
        cache.append(old);
        cache.append(event("fresh"));

        let snap = cache.snapshot(Some(Duration::hours(12)));
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].sequence_id, "fresh");

        // Unwindowed snapshot still sees both
        assert_eq!(cache.snapshot(None).len(), 2);
    }

    #[test]
    fn concurrent_appends_never_exceed_capacity() {
        use std::sync::Arc;

        let cache = Arc::new(EventCache::new(50));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..500 {
                        cache.append(event(&format!("{t}-{i}")));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), 50);
    }
}
