use core::fmt;
use core::mem;
use std::borrow::Borrow;

use crate::config::{HashIdx, MISSING};
use crate::error::Result;
use crate::hash::{Fx, KeyHash};
use crate::table::{Put, RawIter, RawTable};

/// Hash map over the open-addressing engine.
///
/// `H` is the hashing strategy; the default hashes any `Hash` key with
/// fxhash. The engine guarantees amortized O(1) operations under the
/// configured load factor.
pub struct HashMap<K, V, H = Fx> {
    strategy: H,
    table: RawTable<K, V>,
}

impl<K, V, H: KeyHash<K> + Default> HashMap<K, V, H> {
    /// Creates an empty map; no allocation happens until the first insert.
    #[inline]
    pub fn new() -> Self {
        Self::with_strategy(H::default())
    }

    /// Creates an empty map with room for `items` elements.
    pub fn with_capacity(items: usize) -> Result<Self> {
        let mut map = Self::new();
        map.reserve(items)?;
        Ok(map)
    }

    /// Creates an empty map with a custom load-factor ceiling.
    ///
    /// Panics unless `0.0 < load_factor < 1.0`.
    pub fn with_load_factor(load_factor: f64) -> Self {
        HashMap {
            strategy: H::default(),
            table: RawTable::with_load_factor(load_factor),
        }
    }
}

impl<K, V, H: KeyHash<K>> HashMap<K, V, H> {
    /// Creates an empty map around an explicit strategy instance, e.g. a
    /// [`Runtime`](crate::hash::Runtime) function-pointer pair.
    #[inline]
    pub fn with_strategy(strategy: H) -> Self {
        HashMap {
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

    /// Removes every entry; capacity is retained.
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

    /// Returns a reference to the value stored for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        H: KeyHash<Q>,
        Q: ?Sized,
    {
        let idx = self.find_idx(key);
        if idx == MISSING {
            None
        } else {
            Some(unsafe { self.table.val_at(idx) })
        }
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        H: KeyHash<Q>,
        Q: ?Sized,
    {
        let idx = self.find_idx(key);
        if idx == MISSING {
            None
        } else {
            Some(unsafe { self.table.val_at_mut(idx) })
        }
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        H: KeyHash<Q>,
        Q: ?Sized,
    {
        let idx = self.find_idx(key);
        if idx == MISSING {
            None
        } else {
            Some(unsafe { (self.table.key_at(idx), self.table.val_at(idx)) })
        }
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        H: KeyHash<Q>,
        Q: ?Sized,
    {
        self.find_idx(key) != MISSING
    }

    /// Inserts or overwrites, returning the previous value when the key
    /// was already present. The stored key is never replaced.
    pub fn set(&mut self, key: K, value: V) -> Result<Option<V>> {
        let strategy = &self.strategy;
        let hash = strategy.hash(&key);
        let (idx, put) = self
            .table
            .put(hash, key, |k| strategy.hash(k), |a, b| strategy.eq(a, b))?;
        match put {
            Put::Inserted => {
                unsafe { self.table.write_val(idx, value) };
                Ok(None)
            }
            Put::Present => {
                let prev = mem::replace(unsafe { self.table.val_at_mut(idx) }, value);
                Ok(Some(prev))
            }
        }
    }

    /// Inserts only when the key is absent; otherwise returns the stored
    /// value untouched and drops `value`.
    pub fn add(&mut self, key: K, value: V) -> Result<Option<&V>> {
        let strategy = &self.strategy;
        let hash = strategy.hash(&key);
        let (idx, put) = self
            .table
            .put(hash, key, |k| strategy.hash(k), |a, b| strategy.eq(a, b))?;
        match put {
            Put::Inserted => {
                unsafe { self.table.write_val(idx, value) };
                Ok(None)
            }
            Put::Present => Ok(Some(unsafe { self.table.val_at(idx) })),
        }
    }

    /// Overwrites the value of an existing key, returning the previous
    /// value; `None` (and no insert) when the key is absent.
    pub fn replace<Q>(&mut self, key: &Q, value: V) -> Option<V>
    where
        K: Borrow<Q>,
        H: KeyHash<Q>,
        Q: ?Sized,
    {
        let idx = self.find_idx(key);
        if idx == MISSING {
            None
        } else {
            Some(mem::replace(unsafe { self.table.val_at_mut(idx) }, value))
        }
    }

    /// Removes an entry, returning the stored key and value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        H: KeyHash<Q>,
        Q: ?Sized,
    {
        let idx = self.find_idx(key);
        if idx == MISSING {
            None
        } else {
            self.table.erase(idx)
        }
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

    /// Iterates over `(&key, &value)` pairs in unspecified order.
    #[inline]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            // Value slots are written right after every insert.
            inner: unsafe { self.table.iter() },
        }
    }

    #[inline]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    #[inline]
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }
}

impl<K, V, H: KeyHash<K> + Default> Default for HashMap<K, V, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, H> fmt::Debug for HashMap<K, V, H>
where
    K: fmt::Debug,
    V: fmt::Debug,
    H: KeyHash<K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over the entries of a [`HashMap`].
pub struct Iter<'a, K, V> {
    inner: RawIter<'a, K, V>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, k, v)| (k, v))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> {}

/// Iterator over the keys of a [`HashMap`].
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Iterator over the values of a [`HashMap`].
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
