use core::fmt;
use std::borrow::Borrow;

use crate::config::{HashIdx, MISSING};
use crate::error::Result;
use crate::hash::{Fx, KeyHash};
use crate::table::{Put, RawIter, RawTable};

/// Hash set over the open-addressing engine.
///
/// Shares the table engine with [`HashMap`](crate::map::HashMap); the
/// value array is zero-sized and vanishes from the layout.
pub struct HashSet<K, H = Fx> {
    strategy: H,
    table: RawTable<K, ()>,
}

impl<K, H: KeyHash<K> + Default> HashSet<K, H> {
    /// Creates an empty set; no allocation happens until the first insert.
    #[inline]
    pub fn new() -> Self {
        Self::with_strategy(H::default())
    }

    /// Creates an empty set with room for `items` elements.
    pub fn with_capacity(items: usize) -> Result<Self> {
        let mut set = Self::new();
        set.reserve(items)?;
        Ok(set)
    }

    /// Creates an empty set with a custom load-factor ceiling.
    ///
    /// Panics unless `0.0 < load_factor < 1.0`.
    pub fn with_load_factor(load_factor: f64) -> Self {
        HashSet {
            strategy: H::default(),
            table: RawTable::with_load_factor(load_factor),
        }
    }
}

impl<K, H: KeyHash<K>> HashSet<K, H> {
    /// Creates an empty set around an explicit strategy instance.
    #[inline]
    pub fn with_strategy(strategy: H) -> Self {
        HashSet {
            strategy,
            table: RawTable::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the bucket count of the underlying table.
    #[inline]
    pub fn buckets(&self) -> usize {
        self.table.buckets()
    }

    /// Removes every element; capacity is retained.
    #[inline]
    pub fn clear(&mut self) {
        self.table.clear();
    }

    fn find_idx<Q>(&self, key: &Q) -> HashIdx
    where
        K: Borrow<Q>,
        H: KeyHash<Q>,
        Q: ?Sized,
    {
        let strategy = &self.strategy;
        self.table
            .find(strategy.hash(key), |k| strategy.eq(k.borrow(), key))
    }

    /// Inserts a key, reporting whether it was new. An equal key already
    /// in the set stays untouched (see [`get`](Self::get) for the stored
    /// instance) and the duplicate is dropped.
    pub fn insert(&mut self, key: K) -> Result<Put> {
        let strategy = &self.strategy;
        let hash = strategy.hash(&key);
        let (idx, put) = self
            .table
            .put(hash, key, |k| strategy.hash(k), |a, b| strategy.eq(a, b))?;
        if put == Put::Inserted {
            unsafe { self.table.write_val(idx, ()) };
        }
        Ok(put)
    }

    /// Inserts every key of an iterator with a single up-front reserve.
    ///
    /// Returns [`Put::Inserted`] iff at least one key was new, otherwise
    /// [`Put::Present`]; any allocation failure aborts the walk.
    pub fn insert_all<I>(&mut self, keys: I) -> Result<Put>
    where
        I: IntoIterator<Item = K>,
        I::IntoIter: ExactSizeIterator,
    {
        let keys = keys.into_iter();
        self.reserve(self.len() + keys.len())?;
        let mut outcome = Put::Present;
        for key in keys {
            if self.insert(key)? == Put::Inserted {
                outcome = Put::Inserted;
            }
        }
        Ok(outcome)
    }

    /// Returns the stored key equal to `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        H: KeyHash<Q>,
        Q: ?Sized,
    {
        let idx = self.find_idx(key);
        if idx == MISSING {
            None
        } else {
            Some(unsafe { self.table.key_at(idx) })
        }
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        H: KeyHash<Q>,
        Q: ?Sized,
    {
        self.find_idx(key) != MISSING
    }

    /// Removes a key, returning the stored instance.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        H: KeyHash<Q>,
        Q: ?Sized,
    {
        let idx = self.find_idx(key);
        if idx == MISSING {
            None
        } else {
            self.table.erase(idx).map(|(k, ())| k)
        }
    }

    /// Whether every element of `other` is also in `self`.
    pub fn is_superset(&self, other: &Self) -> bool {
        other.iter().all(|key| self.contains(key))
    }

    /// Order-independent hash of the whole set: the XOR of the strategy
    /// hash over every key.
    pub fn xor_hash(&self) -> HashIdx {
        let mut acc: HashIdx = 0;
        for key in self.iter() {
            acc ^= self.strategy.hash(key);
        }
        acc
    }

    /// Returns the key at the lowest occupied bucket, if any. Which key
    /// that is depends on the current layout.
    pub fn get_any(&self) -> Option<&K> {
        self.iter().next()
    }

    /// Grows the table so `items` elements fit without rehashing. Never
    /// shrinks.
    pub fn reserve(&mut self, items: usize) -> Result<()> {
        let want = (items as f64 / self.table.load_factor()).ceil() as usize;
        if want > self.table.buckets() {
            let strategy = &self.strategy;
            self.table.try_resize(want, |k| strategy.hash(k))
        } else {
            Ok(())
        }
    }

    /// Rehashes to `buckets` buckets (rounded up to a power of two); may
    /// shrink. A request below the current element count is a no-op.
    pub fn resize(&mut self, buckets: usize) -> Result<()> {
        let strategy = &self.strategy;
        self.table.try_resize(buckets, |k| strategy.hash(k))
    }

    /// Iterates over the keys in unspecified order.
    #[inline]
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            // The unit value slots need no initialization.
            inner: unsafe { self.table.iter() },
        }
    }
}

impl<K, H: KeyHash<K> + Default> Default for HashSet<K, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, H: KeyHash<K>> PartialEq for HashSet<K, H> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.is_superset(other)
    }
}

impl<K, H: KeyHash<K>> Eq for HashSet<K, H> {}

impl<K: fmt::Debug, H: KeyHash<K>> fmt::Debug for HashSet<K, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Iterator over the keys of a [`HashSet`].
pub struct Iter<'a, K> {
    inner: RawIter<'a, K, ()>,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, k, _)| k)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K> ExactSizeIterator for Iter<'a, K> {}
