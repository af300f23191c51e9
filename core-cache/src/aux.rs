//! Bounded auxiliary maps used for the audio-key, CDN URL, and head-bytes
//! sub-caches. Unlike the hot track tier these are not strict LRUs: eviction
//! prefers expired entries first, falling back to the oldest 10% by
//! insertion time.

use std::collections::HashMap;
use std::hash::Hash;

struct AuxSlot<V> {
    value: V,
    inserted_unix: i64,
    expiry_unix: Option<i64>,
}

pub struct AuxCache<K, V> {
    slots: HashMap<K, AuxSlot<V>>,
    capacity: usize,
}

impl<K, V> AuxCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: HashMap::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Returns the value for `key`, evicting it first if it carries an
    /// expiry that has already passed.
    pub fn get(&mut self, key: &K, now_unix: i64) -> Option<&V> {
        let expired = self
            .slots
            .get(key)
            .and_then(|slot| slot.expiry_unix)
            .is_some_and(|expiry| expiry <= now_unix);
        if expired {
            self.slots.remove(key);
            return None;
        }
        self.slots.get(key).map(|slot| &slot.value)
    }

    pub fn insert(&mut self, key: K, value: V, now_unix: i64, expiry_unix: Option<i64>) {
        if !self.slots.contains_key(&key) && self.slots.len() >= self.capacity {
            self.make_room(now_unix);
        }
        self.slots.insert(
            key,
            AuxSlot {
                value,
                inserted_unix: now_unix,
                expiry_unix,
            },
        );
    }

    pub fn remove(&mut self, key: &K) {
        self.slots.remove(key);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drops every entry whose expiry has passed. Returns the count removed.
    pub fn cleanup_expired(&mut self, now_unix: i64) -> usize {
        let before = self.slots.len();
        self.slots
            .retain(|_, slot| !slot.expiry_unix.is_some_and(|expiry| expiry <= now_unix));
        before - self.slots.len()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Evicts expired entries first; if the map is still full, evicts the
    /// oldest 10% by insertion time (at least one entry).
    fn make_room(&mut self, now_unix: i64) {
        let removed_expired = self.cleanup_expired(now_unix);
        if removed_expired > 0 || self.slots.len() < self.capacity {
            return;
        }

        let mut by_age: Vec<(K, i64)> = self
            .slots
            .iter()
            .map(|(k, slot)| (k.clone(), slot.inserted_unix))
            .collect();
        by_age.sort_by_key(|(_, inserted)| *inserted);

        let to_evict = (self.capacity / 10).max(1);
        for (key, _) in by_age.into_iter().take(to_evict) {
            self.slots.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_entries_are_preferred_for_eviction() {
        let mut cache: AuxCache<String, u32> = AuxCache::new(4);
        cache.insert("a".into(), 1, 100, Some(50));
        cache.insert("b".into(), 2, 101, None);
        cache.insert("c".into(), 3, 102, None);
        cache.insert("d".into(), 4, 103, None);

        // "a" has already expired relative to now=200; inserting a 5th key
        // should free it without touching the others.
        cache.insert("e".into(), 5, 200, None);

        assert!(cache.get(&"a".to_string(), 200).is_none());
        assert!(cache.get(&"b".to_string(), 200).is_some());
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn oldest_entries_evicted_when_nothing_expired() {
        let mut cache: AuxCache<String, u32> = AuxCache::new(10);
        for i in 0..10 {
            cache.insert(format!("k{i}"), i, 1000 + i as i64, None);
        }
        cache.insert("new".into(), 99, 2000, None);

        // capacity/10 == 1, so exactly the oldest entry ("k0") is evicted.
        assert!(cache.get(&"k0".to_string(), 2000).is_none());
        assert!(cache.get(&"k1".to_string(), 2000).is_some());
        assert_eq!(cache.len(), 10);
    }

    #[test]
    fn get_evicts_lazily_observed_expiry() {
        let mut cache: AuxCache<String, u32> = AuxCache::new(4);
        cache.insert("a".into(), 1, 100, Some(150));
        assert!(cache.get(&"a".to_string(), 120).is_some());
        assert!(cache.get(&"a".to_string(), 200).is_none());
        assert_eq!(cache.len(), 0);
    }
}
