use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

use slab::Slab;

/// Capability contract for cache eviction strategies.
///
/// The policy owns all recency/frequency bookkeeping for the resident key
/// set; [`CacheNode`](crate::CacheNode) never inspects or mutates that state
/// directly. It only ever calls `on_access` (on hit or insert) and `evict`
/// (when storage is full and a new key needs room). The node, not the
/// policy, is responsible for actually removing the evicted key from
/// storage.
pub trait EvictionPolicy<K>: Send {
    /// Records that `key` is now resident and was just touched, whether by
    /// insertion or by a fresh read. Idempotent: calling it twice in a row
    /// for the same key leaves the policy in the same state as calling it
    /// once more recently.
    fn on_access(&mut self, key: &K);

    /// Selects and forgets the current victim, returning its key, or `None`
    /// if the policy holds no keys at all.
    fn evict(&mut self) -> Option<K>;
}

#[derive(Debug)]
struct Slot<K> {
    key: K,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Least-Recently-Used eviction policy.
///
/// Backed by an intrusive doubly linked list over a `slab::Slab<Slot<K>>`
/// arena plus a `HashMap<K, usize>` from key to slot index, so that both
/// `on_access` and `evict` are amortized O(1) regardless of how many keys
/// are resident. The arena hands out and reclaims slot indices itself;
/// there is no separate free list to maintain here.
#[derive(Debug, Default)]
pub struct LruPolicy<K> {
    slots: Slab<Slot<K>>,
    index: HashMap<K, usize>,
    most_recent: Option<usize>,
    least_recent: Option<usize>,
}

impl<K: Eq + Hash + Clone> LruPolicy<K> {
    pub fn new() -> Self {
        Self {
            slots: Slab::new(),
            index: HashMap::new(),
            most_recent: None,
            least_recent: None,
        }
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = {
            let s = &self.slots[slot];
            (s.prev, s.next)
        };
        match prev {
            Some(p) => self.slots[p].next = next,
            None => self.most_recent = next,
        }
        match next {
            Some(n) => self.slots[n].prev = prev,
            None => self.least_recent = prev,
        }
    }

    fn push_front(&mut self, slot: usize) {
        let old_head = self.most_recent;
        {
            let s = &mut self.slots[slot];
            s.prev = None;
            s.next = old_head;
        }
        if let Some(head) = old_head {
            self.slots[head].prev = Some(slot);
        }
        self.most_recent = Some(slot);
        if self.least_recent.is_none() {
            self.least_recent = Some(slot);
        }
    }
}

impl<K: Eq + Hash + Clone + Send> EvictionPolicy<K> for LruPolicy<K> {
    fn on_access(&mut self, key: &K) {
        if let Some(&slot) = self.index.get(key) {
            self.unlink(slot);
            self.push_front(slot);
            return;
        }

        let slot = self.slots.insert(Slot {
            key: key.clone(),
            prev: None,
            next: None,
        });
        self.index.insert(key.clone(), slot);
        self.push_front(slot);
    }

    fn evict(&mut self) -> Option<K> {
        let slot = self.least_recent?;
        self.unlink(slot);
        let entry = self.slots.remove(slot);
        self.index.remove(&entry.key);
        Some(entry.key)
    }
}

/// Least-Frequently-Used eviction policy with strict-LRU tie-breaking.
///
/// Maintains `freq[key] -> count` and, for each observed count, an ordered
/// bucket of keys (oldest-touched first). `min_freq` is cached so `evict`
/// never has to scan for the minimum; it is only recomputed (reset to 1) on
/// the next brand-new key, matching the reference semantics exactly.
#[derive(Debug, Default)]
pub struct LfuPolicy<K> {
    freq: HashMap<K, u64>,
    buckets: HashMap<u64, VecDeque<K>>,
    min_freq: u64,
}

impl<K: Eq + Hash + Clone> LfuPolicy<K> {
    pub fn new() -> Self {
        Self {
            freq: HashMap::new(),
            buckets: HashMap::new(),
            min_freq: 0,
        }
    }
}

impl<K: Eq + Hash + Clone + Send> EvictionPolicy<K> for LfuPolicy<K> {
    fn on_access(&mut self, key: &K) {
        if let Some(&old_freq) = self.freq.get(key) {
            if let Some(bucket) = self.buckets.get_mut(&old_freq) {
                if let Some(pos) = bucket.iter().position(|k| k == key) {
                    bucket.remove(pos);
                }
                if bucket.is_empty() {
                    self.buckets.remove(&old_freq);
                    if self.min_freq == old_freq {
                        self.min_freq = old_freq + 1;
                    }
                }
            }
            let new_freq = old_freq + 1;
            self.freq.insert(key.clone(), new_freq);
            self.buckets.entry(new_freq).or_default().push_back(key.clone());
        } else {
            self.freq.insert(key.clone(), 1);
            self.buckets.entry(1).or_default().push_back(key.clone());
            self.min_freq = 1;
        }
    }

    fn evict(&mut self) -> Option<K> {
        let bucket = self.buckets.get_mut(&self.min_freq)?;
        let victim = bucket.pop_front()?;
        if bucket.is_empty() {
            self.buckets.remove(&self.min_freq);
        }
        self.freq.remove(&victim);
        Some(victim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lru_evicts_least_recently_used() {
        let mut lru = LruPolicy::new();
        lru.on_access(&"a");
        lru.on_access(&"b");
        lru.on_access(&"c");
        lru.on_access(&"a"); // touch a again, b is now least recent
        assert_eq!(lru.evict(), Some("b"));
        assert_eq!(lru.evict(), Some("c"));
        assert_eq!(lru.evict(), Some("a"));
        assert_eq!(lru.evict(), None);
    }

    #[test]
    fn lru_reinsert_does_not_duplicate_slots() {
        let mut lru = LruPolicy::new();
        lru.on_access(&1);
        lru.on_access(&1);
        lru.on_access(&1);
        assert_eq!(lru.evict(), Some(1));
        assert_eq!(lru.evict(), None);
    }

    #[test]
    fn lru_empty_evict_is_none() {
        let mut lru: LruPolicy<&str> = LruPolicy::new();
        assert_eq!(lru.evict(), None);
    }

    #[test]
    fn lfu_evicts_lowest_frequency_with_lru_tiebreak() {
        // Mirrors scenario S2 from the cache's testable-properties scenarios.
        let mut lfu = LfuPolicy::new();
        lfu.on_access(&"a");
        lfu.on_access(&"b");
        lfu.on_access(&"c");
        lfu.on_access(&"a");
        lfu.on_access(&"a");
        lfu.on_access(&"b");
        // frequencies: a=3, b=2, c=1
        assert_eq!(lfu.evict(), Some("c"));

        lfu.on_access(&"d");
        lfu.on_access(&"d");
        lfu.on_access(&"b");
        // frequencies: a=3, b=3, d=2
        assert_eq!(lfu.evict(), Some("d"));
    }

    #[test]
    fn lfu_new_key_resets_min_freq() {
        let mut lfu = LfuPolicy::new();
        lfu.on_access(&"a");
        lfu.on_access(&"a"); // a at freq 2, min_freq stays cached at 1 until evicted
        assert_eq!(lfu.evict(), Some("a"));
        lfu.on_access(&"b");
        assert_eq!(lfu.evict(), Some("b"));
    }

    #[test]
    fn lfu_empty_evict_is_none() {
        let mut lfu: LfuPolicy<&str> = LfuPolicy::new();
        assert_eq!(lfu.evict(), None);
    }
}
