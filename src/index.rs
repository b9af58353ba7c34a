use std::borrow::Borrow;
use std::collections::{HashMap, TryReserveError};
use std::hash::{BuildHasher, Hash};
use std::rc::Rc;

/// A key shared between the index and the entry stored in the recency list.
#[derive(Debug, Eq, Hash, PartialEq)]
pub(crate) struct Key<K>(Rc<K>);

impl<K> Key<K> {
    pub(crate) fn new(key: K) -> Self {
        Self(Rc::new(key))
    }

    pub(crate) fn share(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<K> AsRef<K> for Key<K> {
    fn as_ref(&self) -> &K {
        &self.0
    }
}

#[derive(Debug, Eq, Hash, PartialEq)]
#[repr(transparent)]
pub(crate) struct KeyRef<Q: ?Sized>(Q);

impl<Q: ?Sized> KeyRef<Q> {
    #[allow(unsafe_code)]
    fn new(key: &Q) -> &Self {
        // Safety: `KeyRef` is a `#[repr(transparent)]` newtype around `Q`.
        unsafe { &*(key as *const Q as *const KeyRef<Q>) }
    }
}

impl<Q: ?Sized, K: Borrow<Q>> Borrow<KeyRef<Q>> for Key<K> {
    fn borrow(&self) -> &KeyRef<Q> {
        KeyRef::new((*self.0).borrow())
    }
}

/// Maps each cached key to the arena slot holding its entry.
pub(crate) struct Index<K, S> {
    slots: HashMap<Key<K>, usize, S>,
}

impl<K: Eq + Hash, S: BuildHasher> Index<K, S> {
    pub(crate) fn with_capacity_and_hasher(
        capacity: usize,
        hash_builder: S,
    ) -> Result<Self, TryReserveError> {
        let mut slots = HashMap::with_hasher(hash_builder);
        slots.try_reserve(capacity)?;
        Ok(Self { slots })
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn contains<Q: ?Sized>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        self.slots.contains_key(KeyRef::new(key))
    }

    pub(crate) fn get<Q: ?Sized>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        self.slots.get(KeyRef::new(key)).copied()
    }

    /// Returns the slot previously recorded for `key`, if any.
    pub(crate) fn insert(&mut self, key: Key<K>, slot: usize) -> Option<usize> {
        self.slots.insert(key, slot)
    }

    pub(crate) fn remove<Q: ?Sized>(&mut self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        self.slots.remove(KeyRef::new(key))
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&K, usize)> + '_ {
        self.slots.iter().map(|(key, &slot)| (key.as_ref(), slot))
    }
}
