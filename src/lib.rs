//! A fixed-capacity LRU cache with constant time operations.
//!
//! Entries live in an arena allocated once at construction, linked into a recency list bounded
//! by two sentinel slots, and a [HashMap](https://doc.rust-lang.org/std/collections/struct.HashMap.html)
//! maps each key to its slot. This gives O(1) time complexity for:
//! * `get` / `put`
//! * `peek` / `contains`
//!
//! A cache miss is reported as `None`, so every value of `V` can be stored, including values
//! other caches reserve as "not found" markers.
//!
//! ## Example
//!
//! ```rust
//! use arena_lru::LruCache;
//!
//! let mut cache = LruCache::new(2).unwrap();
//! cache.put(1, 1);
//! cache.put(2, 2);
//! assert_eq!(cache.get(&1), Some(&1));
//!
//! // 2 is now the least recently used key.
//! cache.put(3, 3);
//! assert!(cache.get(&2).is_none());
//!
//! cache.put(4, 4);
//! assert!(cache.get(&1).is_none());
//! assert_eq!(cache.get(&3), Some(&3));
//! assert_eq!(cache.get(&4), Some(&4));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

mod errors;
mod index;
mod list;

pub use errors::Error;

use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};
use std::iter::FusedIterator;

use log::{debug, trace};

use crate::index::{Index, Key};
use crate::list::{RecencyIter, RecencyList};

struct Entry<K, V> {
    key: Key<K>,
    value: V,
}

/// An LRU cache holding at most `capacity` entries.
///
/// Reads through [`get`](LruCache::get) count as a use: they move the entry to the front of the
/// recency order. [`peek`](LruCache::peek) and the other accessors leave the order untouched.
pub struct LruCache<K, V, S = RandomState> {
    index: Index<K, S>,
    storage: RecencyList<Entry<K, V>>,
}

impl<K: Eq + Hash, V> LruCache<K, V> {
    /// Creates a new LRU cache that holds at most `capacity` items.
    ///
    /// Fails with [`Error::ZeroCapacity`] when `capacity` is zero and with
    /// [`Error::CapacityTooLarge`] when the entries for `capacity` items cannot be allocated.
    pub fn new(capacity: usize) -> Result<Self, Error> {
        Self::with_hasher(capacity, RandomState::new())
    }
}

impl<K: Eq + Hash, V, S: BuildHasher> LruCache<K, V, S> {
    /// Creates a new LRU cache that holds at most `capacity` items and uses the provided hash
    /// builder to hash keys.
    ///
    /// Fails with [`Error::ZeroCapacity`] when `capacity` is zero and with
    /// [`Error::CapacityTooLarge`] when the entries for `capacity` items cannot be allocated.
    pub fn with_hasher(capacity: usize, hash_builder: S) -> Result<Self, Error> {
        if capacity == 0 {
            debug!("rejecting LRU cache configuration: zero capacity");
            return Err(Error::ZeroCapacity);
        }
        if capacity.checked_add(2).is_none() {
            debug!("rejecting LRU cache configuration: capacity {} too large", capacity);
            return Err(Error::CapacityTooLarge(capacity));
        }
        let storage = RecencyList::new(capacity).map_err(|err| {
            debug!("rejecting LRU cache configuration: capacity {}: {}", capacity, err);
            Error::CapacityTooLarge(capacity)
        })?;
        let index = Index::with_capacity_and_hasher(capacity, hash_builder).map_err(|err| {
            debug!("rejecting LRU cache configuration: capacity {}: {}", capacity, err);
            Error::CapacityTooLarge(capacity)
        })?;
        Ok(Self { index, storage })
    }

    /// Returns the number of key-value pairs that are currently in the cache.
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.index.len(), self.storage.len());
        self.storage.len()
    }

    /// Returns the maximum number of key-value pairs the cache can hold.
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Returns a bool indicating whether the cache is empty or not.
    pub fn is_empty(&self) -> bool {
        debug_assert_eq!(self.index.len() == 0, self.storage.is_empty());
        self.storage.is_empty()
    }

    /// Returns a bool indicating whether the cache is full or not.
    pub fn is_full(&self) -> bool {
        self.storage.is_full()
    }

    /// Returns the most recently used entry or `None` if the cache is empty.
    /// Like `peek`, `front` does not update the recency order.
    pub fn front(&self) -> Option<(&K, &V)> {
        self.storage
            .front()
            .map(|entry| (entry.key.as_ref(), &entry.value))
    }

    /// Returns the least recently used entry, i.e. the next one to be evicted, or `None` if the
    /// cache is empty. Like `peek`, `back` does not update the recency order.
    pub fn back(&self) -> Option<(&K, &V)> {
        self.storage
            .back()
            .map(|entry| (entry.key.as_ref(), &entry.value))
    }

    /// Puts a key-value pair into the cache and marks it as the most recently used.
    ///
    /// If the key already exists its value is overwritten in place. Otherwise a new entry is
    /// added, evicting the least recently used entry first when the cache is full.
    pub fn put(&mut self, key: K, value: V) {
        if let Some(slot) = self.index.get(&key) {
            match self.storage.get_mut(slot) {
                Some(entry) => entry.value = value,
                None => debug_assert!(false, "indexed slot {} holds no entry", slot),
            }
            self.storage.move_to_front(slot);
            return;
        }

        if self.storage.is_full() {
            if let Some(evicted) = self.storage.pop_back() {
                let unindexed = self.index.remove(evicted.key.as_ref()).is_none();
                debug_assert!(!unindexed, "evicted entry was not indexed");
                trace!(
                    "evicted least recently used entry, {} of {} slots in use",
                    self.storage.len(),
                    self.capacity()
                );
            }
        }

        let key = Key::new(key);
        let shared = key.share();
        match self.storage.push_front(Entry { key, value }) {
            Some(slot) => {
                self.index.insert(shared, slot);
            }
            None => debug_assert!(false, "no free slot left after eviction"),
        }
        debug_assert_eq!(self.index.len(), self.storage.len());
    }

    /// Returns a reference to the value of the key in the cache or `None` if it is not present in
    /// the cache. Moves the key to the front of the recency order if it exists.
    pub fn get<Q: ?Sized>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        let slot = self.index.get(key)?;
        self.storage.move_to_front(slot);
        self.storage.get(slot).map(|entry| &entry.value)
    }

    /// Returns a reference to the value corresponding to the key in the cache or `None` if it is
    /// not present in the cache.
    /// Unlike `get`, `peek` does not update the recency order so the key's position will be
    /// unchanged.
    pub fn peek<Q: ?Sized>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        let slot = self.index.get(key)?;
        self.storage.get(slot).map(|entry| &entry.value)
    }

    /// Returns a bool indicating whether the given key is in the cache.
    /// Does not update the recency order.
    pub fn contains<Q: ?Sized>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        self.index.contains(key)
    }

    /// Returns an iterator visiting all entries from the most to the least recently used.
    /// The iterator element type is `(&'a K, &'a V)`.
    pub fn iter(&self) -> LruCacheIter<'_, K, V> {
        LruCacheIter {
            iter: self.storage.iter(),
        }
    }
}

/// An iterator over the entries of an `LruCache`, from the most to the least recently used.
///
/// This `struct` is created by the [`iter`] method on [`LruCache`].
///
/// [`iter`]: LruCache::iter
pub struct LruCacheIter<'a, K, V> {
    iter: RecencyIter<'a, Entry<K, V>>,
}

impl<'a, K, V> Clone for LruCacheIter<'a, K, V> {
    fn clone(&self) -> Self {
        Self {
            iter: self.iter.clone(),
        }
    }
}

impl<'a, K, V> Iterator for LruCacheIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.iter
            .next()
            .map(|(_, entry)| (entry.key.as_ref(), &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for LruCacheIter<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.iter
            .next_back()
            .map(|(_, entry)| (entry.key.as_ref(), &entry.value))
    }
}

impl<'a, K, V> ExactSizeIterator for LruCacheIter<'a, K, V> {}

impl<'a, K, V> FusedIterator for LruCacheIter<'a, K, V> {}

impl<'a, K: Eq + Hash, V, S: BuildHasher> IntoIterator for &'a LruCache<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = LruCacheIter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
