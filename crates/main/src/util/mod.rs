// Shared caches.
//
// Lookups take a read lock. A miss takes the write lock, checks again and
// only then computes the entry, so concurrent misses on one key compute it
// once. A hit moves the entry to the back, so once the capacity is reached
// the least recently used entry is evicted.

use core::hash::Hash;

use indexmap::IndexMap;
use parking_lot::RwLock;

/// Capacity of the caches owned by a factory.
pub(crate) const CACHE_CAPACITY: usize = 100;

pub(crate) struct BoundedCache<K, V> {
    entries: RwLock<IndexMap<K, V>>,
    capacity: usize,
}

impl<K: Hash + Eq + Clone, V: Clone> BoundedCache<K, V> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(IndexMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub(crate) fn get(&self, key: &K) -> Option<V> {
        if !self.entries.read().contains_key(key) {
            return None;
        }
        Self::touch(&mut self.entries.write(), key)
    }

    fn touch(entries: &mut IndexMap<K, V>, key: &K) -> Option<V> {
        let (_, key, value) = entries.shift_remove_full(key)?;
        entries.insert(key, value.clone());
        Some(value)
    }

    pub(crate) fn get_or_try_insert_with<E>(
        &self,
        key: &K,
        f: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let mut entries = self.entries.write();
        if let Some(value) = Self::touch(&mut entries, key) {
            return Ok(value);
        }
        let value = f()?;
        if entries.len() >= self.capacity {
            entries.shift_remove_index(0);
        }
        entries.insert(key.clone(), value.clone());
        Ok(value)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub(crate) fn clear(&self) {
        self.entries.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;

    #[test]
    fn test_computes_once() {
        let cache = BoundedCache::new(4);
        let calls = Cell::new(0);
        for _ in 0..3 {
            let value: Result<i32, ()> = cache.get_or_try_insert_with(&"a", || {
                calls.set(calls.get() + 1);
                Ok(1)
            });
            assert_eq!(value, Ok(1));
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache: BoundedCache<&str, i32> = BoundedCache::new(4);
        assert_eq!(cache.get_or_try_insert_with(&"a", || Err("boom")), Err("boom"));
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.get_or_try_insert_with(&"a", || Ok::<_, ()>(2)), Ok(2));
    }

    #[test]
    fn test_hits_protect_from_eviction() {
        let cache = BoundedCache::new(2);
        for key in ["a", "b"] {
            let _ = cache.get_or_try_insert_with(&key, || Ok::<_, ()>(key.len()));
        }
        assert_eq!(cache.get(&"a"), Some(1));
        let _ = cache.get_or_try_insert_with(&"c", || Ok::<_, ()>(3));
        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.get(&"c"), Some(3));
    }

    #[test]
    fn test_evicts_oldest() {
        let cache = BoundedCache::new(2);
        for key in ["a", "b", "c"] {
            let _ = cache.get_or_try_insert_with(&key, || Ok::<_, ()>(key.len()));
        }
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"c"), Some(1));
        cache.clear();
        assert_eq!(cache.len(), 0);
    }
}
