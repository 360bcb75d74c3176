use core::mem;
use core::mem::MaybeUninit;
use core::ptr;
use std::iter::FusedIterator;

use crate::config::{self, HashIdx, DEFAULT_LOAD_FACTOR, MISSING};
use crate::error::{HashError, Result};
use crate::hint::unlikely;

mod flags;

use self::flags::Flags;

/// Outcome of a [`RawTable::put`] that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Put {
    /// The key was written to a fresh or reclaimed bucket.
    Inserted,
    /// An equal key already occupied the table; nothing was written.
    Present,
}

/// Open-addressing hash table engine with tombstone deletion.
///
/// The table keeps three parallel allocations: packed two-bit bucket
/// states, key slots, and value slots. Only buckets whose state is
/// occupied hold a valid key and value; everything else is uninitialized
/// storage. Collisions are resolved with triangular probing, which visits
/// every bucket exactly once on power-of-two capacities.
///
/// The engine is oblivious to how keys are hashed or compared: callers
/// pass hashes and equality closures per operation, and the convenience
/// layers bind those to a strategy type. Value slots are never touched by
/// [`put`](Self::put); after an insert the caller writes the slot through
/// [`write_val`](Self::write_val).
pub struct RawTable<K, V> {
    // Bucket count; always a power of two >= 4, or 0 before the first
    // allocation.
    n_buckets: HashIdx,
    // Live keys.
    size: HashIdx,
    // Live keys plus tombstones; drives the rehash trigger.
    n_occupied: HashIdx,
    // Cached floor(n_buckets * load_factor + 0.5).
    upper_bound: HashIdx,
    load_factor: f64,
    flags: Flags,
    keys: Vec<MaybeUninit<K>>,
    vals: Vec<MaybeUninit<V>>,
}

/// Extends a slot vector in place without initializing the new tail.
fn grow_slots<T>(slots: &mut Vec<MaybeUninit<T>>, len: usize) -> Result<()> {
    let additional = len - slots.len();
    slots
        .try_reserve_exact(additional)
        .map_err(|_| HashError::Alloc(len))?;
    // The added tail is MaybeUninit and may stay uninitialized.
    unsafe { slots.set_len(len) };
    Ok(())
}

/// Truncates a slot vector and releases the spare allocation.
fn shrink_slots<T>(slots: &mut Vec<MaybeUninit<T>>, len: usize) {
    slots.truncate(len);
    slots.shrink_to_fit();
}

impl<K, V> RawTable<K, V> {
    /// Creates an empty table without allocating. The first insertion (or
    /// an explicit resize) allocates the bucket arrays.
    #[inline]
    pub fn new() -> Self {
        Self::with_load_factor(DEFAULT_LOAD_FACTOR)
    }

    /// Creates an empty table with a custom load-factor ceiling.
    ///
    /// Panics unless `0.0 < load_factor < 1.0`.
    pub fn with_load_factor(load_factor: f64) -> Self {
        assert!(
            load_factor > 0.0 && load_factor < 1.0,
            "Load factor needs to be set between 0.0 and 1.0"
        );
        Self {
            n_buckets: 0,
            size: 0,
            n_occupied: 0,
            upper_bound: 0,
            load_factor,
            flags: Flags::new(),
            keys: Vec::new(),
            vals: Vec::new(),
        }
    }

    /// Returns the number of live keys in the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.size as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the bucket count.
    #[inline]
    pub fn buckets(&self) -> usize {
        self.n_buckets as usize
    }

    /// Returns the number of non-empty buckets, i.e. live keys plus
    /// tombstones left behind by [`erase`](Self::erase).
    #[inline]
    pub fn occupied(&self) -> usize {
        self.n_occupied as usize
    }

    #[inline]
    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }

    /// Whether the bucket at `idx` currently holds a live key. Indices at
    /// or beyond the capacity (the `MISSING` sentinel included) are not
    /// occupied.
    #[inline]
    pub fn is_occupied(&self, idx: HashIdx) -> bool {
        idx < self.n_buckets && self.flags.is_occupied(idx)
    }

    /// Returns the key stored at `idx`.
    ///
    /// # Safety
    ///
    /// The bucket at `idx` must be occupied.
    #[inline]
    pub unsafe fn key_at(&self, idx: HashIdx) -> &K {
        debug_assert!(self.is_occupied(idx));
        &*self.keys[idx as usize].as_ptr()
    }

    /// Returns the value stored at `idx`.
    ///
    /// # Safety
    ///
    /// The bucket at `idx` must be occupied and its value slot must have
    /// been written since the key was inserted.
    #[inline]
    pub unsafe fn val_at(&self, idx: HashIdx) -> &V {
        debug_assert!(self.is_occupied(idx));
        &*self.vals[idx as usize].as_ptr()
    }

    /// Mutable variant of [`val_at`](Self::val_at).
    ///
    /// # Safety
    ///
    /// Same contract as [`val_at`](Self::val_at).
    #[inline]
    pub unsafe fn val_at_mut(&mut self, idx: HashIdx) -> &mut V {
        debug_assert!(self.is_occupied(idx));
        &mut *self.vals[idx as usize].as_mut_ptr()
    }

    /// Writes the value slot of a freshly inserted bucket.
    ///
    /// # Safety
    ///
    /// The bucket at `idx` must be occupied, and its slot must not hold a
    /// live value: the previous value (if any) is overwritten without
    /// being dropped. Replacing a live value goes through
    /// [`val_at_mut`](Self::val_at_mut) and `mem::replace` instead.
    #[inline]
    pub unsafe fn write_val(&mut self, idx: HashIdx, val: V) {
        debug_assert!(self.is_occupied(idx));
        self.vals[idx as usize].as_mut_ptr().write(val);
    }

    /// Searches for a key, returning its bucket index or [`MISSING`].
    ///
    /// Walks the probe sequence from the hash's home bucket: an empty
    /// bucket ends the chain, tombstones are skipped, and the walk gives
    /// up after a full lap. `eq` is only invoked on occupied buckets.
    pub fn find(&self, hash: HashIdx, mut eq: impl FnMut(&K) -> bool) -> HashIdx {
        if self.n_buckets == 0 {
            return MISSING;
        }
        let mask = self.n_buckets - 1;
        let mut i = hash & mask;
        let last = i;
        let mut step: HashIdx = 0;
        while !self.flags.is_empty_at(i)
            && (self.flags.is_deleted(i) || !eq(unsafe { self.key_at(i) }))
        {
            step += 1;
            i = (i + step) & mask;
            if i == last {
                return MISSING;
            }
        }
        if self.flags.is_either(i) {
            MISSING
        } else {
            i
        }
    }

    /// Finds or reserves a bucket for `key`.
    ///
    /// Returns the bucket index together with whether the key was newly
    /// inserted. On [`Put::Present`] the stored key is left untouched and
    /// the duplicate `key` is dropped. On [`Put::Inserted`] the value slot
    /// at the returned index is uninitialized; the caller must write it
    /// (see [`write_val`](Self::write_val)) before anything reads value
    /// slots again.
    ///
    /// `hash` must be `hasher(&key)`; the hasher is also used to relocate
    /// existing entries when the insert has to rehash first. Allocation
    /// failure leaves the table unchanged.
    pub fn put(
        &mut self,
        hash: HashIdx,
        key: K,
        hasher: impl Fn(&K) -> HashIdx,
        mut eq: impl FnMut(&K, &K) -> bool,
    ) -> Result<(HashIdx, Put)> {
        debug_assert_eq!(hash, hasher(&key));
        if unlikely(self.n_occupied >= self.upper_bound) {
            // A table dominated by tombstones is rehashed at the same (or
            // a smaller) capacity to purge them; everything else grows to
            // the next power of two.
            if self.n_buckets as u64 > (self.size as u64) << 1 {
                self.try_resize(self.n_buckets as usize - 1, &hasher)?;
            } else {
                self.try_resize(self.n_buckets as usize + 1, &hasher)?;
            }
        }
        let mask = self.n_buckets - 1;
        let mut target = self.n_buckets;
        let mut site = self.n_buckets;
        let mut i = hash & mask;
        if self.flags.is_empty_at(i) {
            // Home bucket is free.
            target = i;
        } else {
            let last = i;
            let mut step: HashIdx = 0;
            while !self.flags.is_empty_at(i)
                && (self.flags.is_deleted(i) || !eq(unsafe { self.key_at(i) }, &key))
            {
                if self.flags.is_deleted(i) {
                    site = i;
                }
                step += 1;
                i = (i + step) & mask;
                if i == last {
                    // Lapped without meeting an empty bucket; the load
                    // factor guarantees a tombstone was recorded.
                    debug_assert!(site != self.n_buckets);
                    target = site;
                    break;
                }
            }
            if target == self.n_buckets {
                target = if self.flags.is_empty_at(i) && site != self.n_buckets {
                    site
                } else {
                    i
                };
            }
        }
        if self.flags.is_empty_at(target) {
            self.keys[target as usize].write(key);
            self.flags.set_occupied(target);
            self.size += 1;
            self.n_occupied += 1;
            Ok((target, Put::Inserted))
        } else if self.flags.is_deleted(target) {
            // Reclaiming a tombstone leaves `n_occupied` unchanged.
            self.keys[target as usize].write(key);
            self.flags.set_occupied(target);
            self.size += 1;
            Ok((target, Put::Inserted))
        } else {
            Ok((target, Put::Present))
        }
    }

    /// Removes the entry at `idx`, leaving a tombstone behind.
    ///
    /// Returns the moved-out key and value, or `None` when `idx` is out of
    /// range or the bucket holds no live key (a silent no-op).
    pub fn erase(&mut self, idx: HashIdx) -> Option<(K, V)> {
        if idx >= self.n_buckets || !self.flags.is_occupied(idx) {
            return None;
        }
        let entry = unsafe {
            (
                ptr::read(self.keys[idx as usize].as_ptr()),
                ptr::read(self.vals[idx as usize].as_ptr()),
            )
        };
        self.flags.set_deleted(idx);
        self.size -= 1;
        Some(entry)
    }

    /// Rehashes the table to hold at least `requested` buckets, rounded up
    /// to a power of two (minimum 4).
    ///
    /// Shrinks when the rounded capacity is below the current one and the
    /// live keys still fit; a request too small for the live keys is a
    /// no-op that succeeds. Tombstones never survive a rehash.
    ///
    /// Only the flag vector is allocated fresh: keys and values are
    /// reshuffled in place: each live entry is moved to its home under the
    /// new mask, displacing whatever still sits there from the old layout;
    /// displaced entries carry forward until one lands on a bucket free in
    /// both layouts. All allocation happens before the first move, so
    /// failure leaves the table unchanged.
    pub fn try_resize(&mut self, requested: usize, hasher: impl Fn(&K) -> HashIdx) -> Result<()> {
        let new_buckets = config::round_buckets(requested)?;
        if self.size >= config::upper_bound(new_buckets, self.load_factor) {
            // Requested capacity cannot hold the live keys.
            return Ok(());
        }
        let mut new_flags = Flags::try_with_buckets(new_buckets as usize)?;
        if new_buckets > self.n_buckets {
            grow_slots(&mut self.keys, new_buckets as usize)?;
            grow_slots(&mut self.vals, new_buckets as usize)?;
        }

        let new_mask = new_buckets - 1;
        for j in 0..self.n_buckets {
            if !self.flags.is_occupied(j) {
                continue;
            }
            let mut key = unsafe { ptr::read(self.keys[j as usize].as_ptr()) };
            let mut val = unsafe { ptr::read(self.vals[j as usize].as_ptr()) };
            self.flags.set_deleted(j);
            loop {
                let mut i = hasher(&key) & new_mask;
                let mut step: HashIdx = 0;
                while !new_flags.is_empty_at(i) {
                    step += 1;
                    i = (i + step) & new_mask;
                }
                new_flags.set_occupied(i);
                if i < self.n_buckets && self.flags.is_occupied(i) {
                    // Kick out the resident entry and keep it moving.
                    unsafe {
                        ptr::swap(self.keys[i as usize].as_mut_ptr(), &mut key);
                        ptr::swap(self.vals[i as usize].as_mut_ptr(), &mut val);
                    }
                    self.flags.set_deleted(i);
                } else {
                    self.keys[i as usize].write(key);
                    self.vals[i as usize].write(val);
                    break;
                }
            }
        }

        if new_buckets < self.n_buckets {
            shrink_slots(&mut self.keys, new_buckets as usize);
            shrink_slots(&mut self.vals, new_buckets as usize);
        }
        self.flags = new_flags;
        self.n_buckets = new_buckets;
        self.n_occupied = self.size;
        self.upper_bound = config::upper_bound(new_buckets, self.load_factor);
        Ok(())
    }

    /// Drops every live entry and marks all buckets empty; capacity and
    /// allocations are retained.
    pub fn clear(&mut self) {
        self.drop_entries();
        self.flags.reset();
        self.size = 0;
        self.n_occupied = 0;
    }

    /// Returns an iterator over the occupied buckets in index order.
    ///
    /// # Safety
    ///
    /// Every occupied bucket's value slot must have been written since its
    /// key was inserted.
    #[inline]
    pub unsafe fn iter(&self) -> RawIter<'_, K, V> {
        RawIter {
            table: self,
            idx: 0,
            left: self.len(),
        }
    }

    fn drop_entries(&mut self) {
        if !mem::needs_drop::<K>() && !mem::needs_drop::<V>() {
            return;
        }
        for i in 0..self.n_buckets {
            if self.flags.is_occupied(i) {
                unsafe {
                    ptr::drop_in_place(self.keys[i as usize].as_mut_ptr());
                    ptr::drop_in_place(self.vals[i as usize].as_mut_ptr());
                }
            }
        }
    }
}

impl<K, V> Default for RawTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Drop for RawTable<K, V> {
    fn drop(&mut self) {
        self.drop_entries();
    }
}

/// Iterator over the occupied buckets of a [`RawTable`], lowest index
/// first.
pub struct RawIter<'a, K, V> {
    table: &'a RawTable<K, V>,
    idx: HashIdx,
    left: usize,
}

impl<'a, K, V> Iterator for RawIter<'a, K, V> {
    type Item = (HashIdx, &'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while self.idx < self.table.n_buckets {
            let i = self.idx;
            self.idx += 1;
            if self.table.flags.is_occupied(i) {
                self.left -= 1;
                // Occupied per the check above; value slots are valid per
                // the `iter` contract.
                return Some(unsafe { (i, self.table.key_at(i), self.table.val_at(i)) });
            }
        }
        None
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.left, Some(self.left))
    }
}

impl<'a, K, V> ExactSizeIterator for RawIter<'a, K, V> {}
impl<'a, K, V> FusedIterator for RawIter<'a, K, V> {}
