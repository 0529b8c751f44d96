//! An open-addressing hash table with packed bucket state and triangular
//! probing.
//!
//! Every table owns three parallel storages: a state vector with two bits
//! per bucket, a key array, and a value array. A bucket is EMPTY (never
//! held a key since the last clear or rehash), OCCUPIED (holds a live
//! entry), or DELETED (a tombstone left behind by a removal). The encoding
//! puts the empty bit in the high position of each pair so that filling a
//! state word with the byte `0xAA` marks sixteen buckets empty at once,
//! which is how freshly allocated state is initialized.
//!
//! Collisions resolve with triangular probing: starting from
//! `hash & (buckets - 1)`, the k-th step advances by `k`, so the offsets
//! from home are the triangular numbers `1, 3, 6, 10, ...`. Because the
//! bucket count is a power of two, this sequence visits every bucket
//! exactly once before returning to its starting point, so a probe that
//! laps has seen the whole table. Using a mask instead of a modulo is the
//! reason capacities are restricted to powers of two (minimum 4).
//!
//! Removals only flip a bucket to DELETED. Tombstones keep probe chains
//! intact without any entry movement, at the price of counting against the
//! load-factor ceiling: the resize trigger compares the number of non-empty
//! buckets (`used`), not the number of live entries, against
//! `floor(buckets * MAX_LOAD + 0.5)`. When tombstones dominate — more than
//! half of the buckets hold no live entry — the triggered "resize" keeps
//! the same capacity and simply rehashes, purging every tombstone.
//!
//! Rehashing is done in place. Only the state vector is allocated fresh;
//! keys and values are shuffled inside their (possibly grown) arrays by a
//! kick-out pass: each live entry probes the new layout for an empty slot,
//! and if that slot still holds a not-yet-moved entry the two swap and the
//! displaced pair carries on probing. This avoids ever holding a second
//! copy of the key and value arrays, so growing peaks at the new arrays
//! plus one extra state vector. All allocation happens before the first
//! entry moves, so a rehash cannot fail halfway.
//!
//! Keys and values are kept in separate arrays rather than an array of
//! pairs: a probe touches only state words and key slots, so values never
//! pollute the cache during lookups.
//!
//! The table is deliberately low-level. It does not know how to hash; every
//! operation that needs hashing takes the hash value or a hash closure from
//! the caller, and lookups take an equality predicate. The predicate is
//! called on arbitrary live keys along the probe chain, not only on keys
//! equal to the one being searched. Prefer [`HashMap`] or [`HashSet`]
//! unless you are building your own keyed structure.
//!
//! Invariants maintained between calls:
//!
//! 1. `len <= used <= buckets`, and `used <= floor(buckets * MAX_LOAD + 0.5)`.
//! 2. `buckets` is zero or a power of two >= 4, and always below
//!    [`INDEX_MISSING`].
//! 3. A live key is reachable from its home bucket along the probe
//!    sequence without crossing an EMPTY bucket.
//! 4. Key and value slots are initialized exactly for OCCUPIED buckets.
//!
//! [`HashMap`]: crate::hash_map::HashMap
//! [`HashSet`]: crate::hash_set::HashSet

use alloc::vec::Vec;
use core::fmt;
use core::mem;
use core::mem::MaybeUninit;

use crate::HashUint;
use crate::INDEX_MISSING;
use crate::MAX_LOAD;

/// State word that marks sixteen buckets EMPTY (`0xAA` in every byte).
const EMPTY_WORD: u32 = 0xAAAA_AAAA;

/// Error returned when the allocator refuses a request.
///
/// Every fallible operation reports failure before mutating anything, so
/// the table is left exactly as it was before the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError;

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("hash table allocation failed")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AllocError {}

/// Bucket-state vector manipulation.
///
/// State for bucket `i` lives in word `i >> 4` at bit offset `(i & 15) * 2`.
/// The pair is `(empty, deleted)`: EMPTY is `10`, DELETED is `01`, OCCUPIED
/// is `00`. The combination `11` never occurs.
mod flag {
    #[inline(always)]
    fn pos(index: usize) -> (usize, u32) {
        (index >> 4, ((index & 0xF) << 1) as u32)
    }

    #[inline(always)]
    pub(super) fn is_empty(flags: &[u32], index: usize) -> bool {
        let (word, shift) = pos(index);
        flags[word] >> shift & 2 != 0
    }

    #[inline(always)]
    pub(super) fn is_deleted(flags: &[u32], index: usize) -> bool {
        let (word, shift) = pos(index);
        flags[word] >> shift & 1 != 0
    }

    /// True if the bucket holds no live key (EMPTY or DELETED).
    #[inline(always)]
    pub(super) fn is_either(flags: &[u32], index: usize) -> bool {
        let (word, shift) = pos(index);
        flags[word] >> shift & 3 != 0
    }

    /// Transition to OCCUPIED from either non-live state.
    #[inline(always)]
    pub(super) fn set_occupied(flags: &mut [u32], index: usize) {
        let (word, shift) = pos(index);
        flags[word] &= !(3 << shift);
    }

    /// Transition OCCUPIED -> DELETED.
    #[inline(always)]
    pub(super) fn set_deleted(flags: &mut [u32], index: usize) {
        let (word, shift) = pos(index);
        flags[word] |= 1 << shift;
    }

    /// Clear the empty bit: EMPTY -> OCCUPIED, used by the rehash pass to
    /// claim buckets in the new layout.
    #[inline(always)]
    pub(super) fn clear_empty(flags: &mut [u32], index: usize) {
        let (word, shift) = pos(index);
        flags[word] &= !(2 << shift);
    }
}

/// Number of `u32` state words covering `buckets` buckets.
#[inline(always)]
fn flag_words(buckets: HashUint) -> usize {
    if buckets < 16 {
        1
    } else {
        (buckets >> 4) as usize
    }
}

/// Maximum `used` before a table of the given size must resize.
#[inline(always)]
fn upper_bound(buckets: HashUint) -> HashUint {
    (buckets as f64 * MAX_LOAD + 0.5) as HashUint
}

/// Smallest bucket request whose upper bound covers `entries` entries,
/// i.e. `ceil(entries / MAX_LOAD)` with saturating arithmetic.
#[inline]
pub(crate) fn buckets_for(entries: HashUint) -> HashUint {
    // f64::ceil is unavailable without std; truncate and correct instead.
    let exact = entries as f64 / MAX_LOAD;
    let truncated = exact as HashUint;
    if (truncated as f64) < exact {
        truncated.saturating_add(1)
    } else {
        truncated
    }
}

/// Allocates a state vector with every bucket EMPTY.
fn alloc_flags(buckets: HashUint) -> Result<Vec<u32>, AllocError> {
    let words = flag_words(buckets);
    let mut flags = Vec::new();
    flags.try_reserve_exact(words).map_err(|_| AllocError)?;
    flags.resize(words, EMPTY_WORD);
    Ok(flags)
}

/// Extends an uninitialized-slot array to `new_len` slots.
fn grow_uninit<T>(slots: &mut Vec<MaybeUninit<T>>, new_len: usize) -> Result<(), AllocError> {
    let additional = new_len - slots.len();
    slots.try_reserve_exact(additional).map_err(|_| AllocError)?;
    // SAFETY: capacity was just reserved, and uninitialized `MaybeUninit`
    // elements are valid at any length.
    unsafe { slots.set_len(new_len) };
    Ok(())
}

/// An open-addressing hash table storing keys of type `K` and values of
/// type `V`.
///
/// Set-style users instantiate with `V = ()`, which makes the value array
/// zero-sized and free.
///
/// Operations identify entries by a caller-supplied hash and equality
/// predicate and report bucket indices as [`HashUint`], with
/// [`INDEX_MISSING`] standing for absence. Indices remain valid until the
/// next insertion or resize.
pub struct HashTable<K, V> {
    /// Bucket count; a power of two, or 0 before the first allocation.
    buckets: HashUint,
    /// Live (OCCUPIED) buckets.
    live: HashUint,
    /// OCCUPIED plus DELETED buckets; the resize trigger.
    used: HashUint,
    /// Cached `upper_bound(buckets)`.
    limit: HashUint,
    flags: Vec<u32>,
    keys: Vec<MaybeUninit<K>>,
    vals: Vec<MaybeUninit<V>>,
}

impl<K, V> HashTable<K, V> {
    /// Creates an empty table without allocating.
    pub const fn new() -> Self {
        Self {
            buckets: 0,
            live: 0,
            used: 0,
            limit: 0,
            flags: Vec::new(),
            keys: Vec::new(),
            vals: Vec::new(),
        }
    }

    /// Creates a table that can hold at least `capacity` entries before
    /// resizing.
    pub fn with_capacity(capacity: HashUint) -> Result<Self, AllocError> {
        let mut table = Self::new();
        if capacity > 0 {
            // The rehash closure is never consulted: the table is empty.
            table.resize(buckets_for(capacity), |_: &K| 0)?;
        }
        Ok(table)
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> HashUint {
        self.live
    }

    /// Returns `true` if the table holds no live entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of non-empty buckets: live entries plus tombstones.
    #[inline]
    pub fn used(&self) -> HashUint {
        self.used
    }

    /// Current bucket count (a power of two, or 0).
    #[inline]
    pub fn bucket_count(&self) -> HashUint {
        self.buckets
    }

    /// Number of entries the table can hold before it must resize.
    #[inline]
    pub fn capacity(&self) -> HashUint {
        self.limit
    }

    /// Returns `true` if bucket `index` holds a live entry.
    ///
    /// Out-of-range indices (including [`INDEX_MISSING`]) report `false`.
    #[inline]
    pub fn is_occupied(&self, index: HashUint) -> bool {
        index < self.buckets && !flag::is_either(&self.flags, index as usize)
    }

    /// Returns the key stored in bucket `index`.
    ///
    /// # Panics
    ///
    /// Panics if the bucket is not occupied.
    #[inline]
    pub fn key_at(&self, index: HashUint) -> &K {
        assert!(self.is_occupied(index), "bucket is not occupied");
        // SAFETY: occupied buckets hold an initialized key.
        unsafe { self.keys[index as usize].assume_init_ref() }
    }

    /// Returns the value stored in bucket `index`.
    ///
    /// # Panics
    ///
    /// Panics if the bucket is not occupied.
    #[inline]
    pub fn value_at(&self, index: HashUint) -> &V {
        assert!(self.is_occupied(index), "bucket is not occupied");
        // SAFETY: occupied buckets hold an initialized value.
        unsafe { self.vals[index as usize].assume_init_ref() }
    }

    /// Returns the value stored in bucket `index`, mutably.
    ///
    /// # Panics
    ///
    /// Panics if the bucket is not occupied.
    #[inline]
    pub fn value_at_mut(&mut self, index: HashUint) -> &mut V {
        assert!(self.is_occupied(index), "bucket is not occupied");
        // SAFETY: occupied buckets hold an initialized value.
        unsafe { self.vals[index as usize].assume_init_mut() }
    }

    /// Swaps the key stored in bucket `index` for `key`, returning the old
    /// one.
    ///
    /// The new key must compare equal to (and hash like) the stored one,
    /// otherwise the bucket becomes unreachable by lookup.
    ///
    /// # Panics
    ///
    /// Panics if the bucket is not occupied.
    pub fn replace_key_at(&mut self, index: HashUint, key: K) -> K {
        assert!(self.is_occupied(index), "bucket is not occupied");
        // SAFETY: occupied buckets hold an initialized key.
        mem::replace(unsafe { self.keys[index as usize].assume_init_mut() }, key)
    }

    /// Looks up a key by hash and equality predicate.
    ///
    /// Returns the index of the occupied bucket whose key satisfies `eq`,
    /// or [`INDEX_MISSING`]. The predicate is called on live keys along the
    /// probe chain.
    pub fn get(&self, hash: HashUint, mut eq: impl FnMut(&K) -> bool) -> HashUint {
        if self.buckets == 0 {
            return INDEX_MISSING;
        }

        let mask = self.buckets as usize - 1;
        let mut index = hash as usize & mask;
        let home = index;
        let mut step = 0usize;

        loop {
            if flag::is_empty(&self.flags, index) {
                return INDEX_MISSING;
            }
            if !flag::is_deleted(&self.flags, index) {
                // SAFETY: the bucket is occupied, so the key is initialized.
                if eq(unsafe { self.keys[index].assume_init_ref() }) {
                    return index as HashUint;
                }
            }
            step += 1;
            index = (index + step) & mask;
            if index == home {
                return INDEX_MISSING;
            }
        }
    }

    /// Finds the bucket for a key, resizing first if the table is at its
    /// load-factor ceiling.
    ///
    /// Returns [`Entry::Occupied`] when a live key satisfying `eq` exists
    /// (the stored key is never overwritten), or [`Entry::Vacant`] holding
    /// the insertion site — the first tombstone on the probe chain when one
    /// was passed, otherwise the empty bucket that terminated the probe.
    ///
    /// `rehash` recomputes the hash of stored keys and is only consulted
    /// when the call triggers a resize.
    ///
    /// # Errors
    ///
    /// Fails when a required allocation fails; the table is unchanged.
    pub fn entry(
        &mut self,
        hash: HashUint,
        mut eq: impl FnMut(&K) -> bool,
        rehash: impl Fn(&K) -> HashUint,
    ) -> Result<Entry<'_, K, V>, AllocError> {
        if self.used >= self.limit {
            if self.buckets > self.live.saturating_mul(2) {
                // Tombstones dominate: rehash at the same capacity.
                self.resize(self.buckets.saturating_sub(1), &rehash)?;
            } else {
                self.resize(self.buckets.saturating_add(1), &rehash)?;
            }
        }

        let mask = self.buckets as usize - 1;
        let mut index = hash as usize & mask;
        let mut site = usize::MAX;
        let target;
        let mut present = false;

        if flag::is_empty(&self.flags, index) {
            target = index;
        } else {
            let home = index;
            let mut step = 0usize;
            loop {
                if flag::is_empty(&self.flags, index) {
                    target = if site != usize::MAX { site } else { index };
                    break;
                }
                if flag::is_deleted(&self.flags, index) {
                    if site == usize::MAX {
                        site = index;
                    }
                } else {
                    // SAFETY: the bucket is occupied, so the key is
                    // initialized.
                    if eq(unsafe { self.keys[index].assume_init_ref() }) {
                        target = index;
                        present = true;
                        break;
                    }
                }
                step += 1;
                index = (index + step) & mask;
                if index == home {
                    // Full lap without an empty bucket. The load-factor
                    // ceiling leaves a tombstone in this case unless the
                    // index width is saturated.
                    if site == usize::MAX {
                        return Err(AllocError);
                    }
                    target = site;
                    break;
                }
            }
        }

        if present {
            Ok(Entry::Occupied(OccupiedEntry {
                index: target,
                table: self,
            }))
        } else {
            let recycled = flag::is_deleted(&self.flags, target);
            Ok(Entry::Vacant(VacantEntry {
                index: target,
                recycled,
                table: self,
            }))
        }
    }

    /// Removes the entry in bucket `index`, dropping its key and value.
    ///
    /// The bucket becomes a tombstone; `used` is unchanged until the next
    /// rehash. Deleting an empty, deleted, or out-of-range bucket is a
    /// no-op, so the result of [`get`](Self::get) can be passed directly.
    pub fn delete(&mut self, index: HashUint) {
        if self.is_occupied(index) {
            let i = index as usize;
            // SAFETY: the bucket is occupied, so both slots are initialized,
            // and the DELETED mark below prevents any further access.
            unsafe {
                self.keys[i].assume_init_drop();
                self.vals[i].assume_init_drop();
            }
            flag::set_deleted(&mut self.flags, i);
            self.live -= 1;
        }
    }

    /// Removes the entry in bucket `index` and returns its key and value.
    ///
    /// Returns `None` for empty, deleted, or out-of-range buckets.
    pub fn remove_at(&mut self, index: HashUint) -> Option<(K, V)> {
        if !self.is_occupied(index) {
            return None;
        }
        let i = index as usize;
        // SAFETY: the bucket is occupied, so both slots are initialized, and
        // the DELETED mark below transfers ownership to the caller.
        let pair = unsafe { (self.keys[i].assume_init_read(), self.vals[i].assume_init_read()) };
        flag::set_deleted(&mut self.flags, i);
        self.live -= 1;
        Some(pair)
    }

    /// Resizes the table to at least `requested` buckets, rehashing every
    /// live entry and purging all tombstones.
    ///
    /// The request is rounded up to a power of two and clamped to a minimum
    /// of 4; a request too small for the current entries succeeds without
    /// doing anything. Shrinking below the live entry count is therefore
    /// impossible. On success `used == len`.
    ///
    /// # Errors
    ///
    /// Fails when a required allocation fails; the table is unchanged.
    pub fn resize(
        &mut self,
        requested: HashUint,
        rehash: impl Fn(&K) -> HashUint,
    ) -> Result<(), AllocError> {
        // Saturate at the top power of the index width; the bucket count
        // stays below INDEX_MISSING by construction.
        let new_buckets = match requested.checked_next_power_of_two() {
            Some(n) => n.max(4),
            None => (1 as HashUint) << (HashUint::BITS - 1),
        };

        if self.live >= upper_bound(new_buckets) {
            // Requested size is too small.
            return Ok(());
        }

        let mut new_flags = alloc_flags(new_buckets)?;
        if self.buckets < new_buckets {
            grow_uninit(&mut self.keys, new_buckets as usize)?;
            grow_uninit(&mut self.vals, new_buckets as usize)?;
        }

        // Kick-out pass: walk the old buckets, and for each live entry
        // probe the new layout for an empty slot. If that slot still holds
        // an entry that has not moved yet, swap and keep carrying the
        // displaced pair. Entries already in their final position are
        // marked DELETED in the old state vector as they are passed over.
        let old_buckets = self.buckets as usize;
        let new_mask = new_buckets as usize - 1;
        for bucket in 0..old_buckets {
            if flag::is_either(&self.flags, bucket) {
                continue;
            }

            // SAFETY: the bucket is occupied; the DELETED mark transfers
            // ownership of both slots to the local pair.
            let mut key = unsafe { self.keys[bucket].assume_init_read() };
            let mut val = unsafe { self.vals[bucket].assume_init_read() };
            flag::set_deleted(&mut self.flags, bucket);

            loop {
                let mut index = rehash(&key) as usize & new_mask;
                let mut step = 0usize;
                while !flag::is_empty(&new_flags, index) {
                    step += 1;
                    index = (index + step) & new_mask;
                }
                flag::clear_empty(&mut new_flags, index);

                if index < old_buckets && !flag::is_either(&self.flags, index) {
                    // Kick out the resident pair and keep going.
                    // SAFETY: bucket `index` is still occupied in the old
                    // layout, so both slots are initialized.
                    unsafe {
                        mem::swap(&mut key, self.keys[index].assume_init_mut());
                        mem::swap(&mut val, self.vals[index].assume_init_mut());
                    }
                    flag::set_deleted(&mut self.flags, index);
                } else {
                    self.keys[index].write(key);
                    self.vals[index].write(val);
                    break;
                }
            }
        }

        if self.buckets > new_buckets {
            self.keys.truncate(new_buckets as usize);
            self.vals.truncate(new_buckets as usize);
            self.keys.shrink_to_fit();
            self.vals.shrink_to_fit();
        }

        self.flags = new_flags;
        self.buckets = new_buckets;
        self.used = self.live;
        self.limit = upper_bound(new_buckets);
        debug_assert!(self.buckets < INDEX_MISSING);
        Ok(())
    }

    /// Grows the table so that at least `additional` more entries fit
    /// before the next resize.
    pub fn reserve(
        &mut self,
        additional: HashUint,
        rehash: impl Fn(&K) -> HashUint,
    ) -> Result<(), AllocError> {
        let required = self.live.saturating_add(additional);
        if required > self.limit {
            self.resize(buckets_for(required), rehash)?;
        }
        Ok(())
    }

    /// Drops every entry and marks all buckets EMPTY, retaining the
    /// allocated capacity.
    pub fn clear(&mut self) {
        if self.live > 0 && (mem::needs_drop::<K>() || mem::needs_drop::<V>()) {
            for bucket in 0..self.buckets as usize {
                if !flag::is_either(&self.flags, bucket) {
                    // SAFETY: occupied buckets hold initialized contents,
                    // and the wholesale EMPTY reset below forgets them.
                    unsafe {
                        self.keys[bucket].assume_init_drop();
                        self.vals[bucket].assume_init_drop();
                    }
                }
            }
        }
        self.flags.fill(EMPTY_WORD);
        self.live = 0;
        self.used = 0;
    }

    /// Returns an iterator over the live entries, in unspecified order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            table: self,
            bucket: 0,
        }
    }
}

impl<K, V> Default for HashTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Drop for HashTable<K, V> {
    fn drop(&mut self) {
        if self.live > 0 && (mem::needs_drop::<K>() || mem::needs_drop::<V>()) {
            for bucket in 0..self.buckets as usize {
                if !flag::is_either(&self.flags, bucket) {
                    // SAFETY: occupied buckets hold initialized contents;
                    // the table is being dropped, so nothing reads them
                    // afterwards.
                    unsafe {
                        self.keys[bucket].assume_init_drop();
                        self.vals[bucket].assume_init_drop();
                    }
                }
            }
        }
    }
}

impl<K: Clone, V: Clone> Clone for HashTable<K, V> {
    fn clone(&self) -> Self {
        let mut keys: Vec<MaybeUninit<K>> = Vec::with_capacity(self.keys.len());
        let mut vals: Vec<MaybeUninit<V>> = Vec::with_capacity(self.vals.len());
        // SAFETY: capacity was just reserved, and uninitialized
        // `MaybeUninit` elements are valid at any length.
        unsafe {
            keys.set_len(self.keys.len());
            vals.set_len(self.vals.len());
        }

        for bucket in 0..self.buckets as usize {
            if !flag::is_either(&self.flags, bucket) {
                // SAFETY: occupied buckets in the source hold initialized
                // contents. If a clone panics, the partially filled arrays
                // leak their clones but nothing is dropped uninitialized.
                unsafe {
                    keys[bucket].write(self.keys[bucket].assume_init_ref().clone());
                    vals[bucket].write(self.vals[bucket].assume_init_ref().clone());
                }
            }
        }

        Self {
            buckets: self.buckets,
            live: self.live,
            used: self.used,
            limit: self.limit,
            flags: self.flags.clone(),
            keys,
            vals,
        }
    }
}

impl<K, V> fmt::Debug for HashTable<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashTable")
            .field("len", &self.live)
            .field("used", &self.used)
            .field("buckets", &self.buckets)
            .field("capacity", &self.limit)
            .finish_non_exhaustive()
    }
}

/// A view into a single bucket, either holding a matching key or ready for
/// insertion. Produced by [`HashTable::entry`].
pub enum Entry<'a, K, V> {
    /// A live entry whose key matched the lookup.
    Occupied(OccupiedEntry<'a, K, V>),
    /// An insertion site for the looked-up key.
    Vacant(VacantEntry<'a, K, V>),
}

/// An insertion site produced by [`HashTable::entry`] when no matching key
/// exists.
pub struct VacantEntry<'a, K, V> {
    table: &'a mut HashTable<K, V>,
    index: usize,
    /// True when the site is a recycled tombstone, in which case inserting
    /// does not raise `used`.
    recycled: bool,
}

impl<'a, K, V> VacantEntry<'a, K, V> {
    /// Index of the bucket that will receive the entry.
    #[inline]
    pub fn index(&self) -> HashUint {
        self.index as HashUint
    }

    /// Writes the entry and returns its bucket index.
    pub fn insert(self, key: K, value: V) -> HashUint {
        flag::set_occupied(&mut self.table.flags, self.index);
        self.table.keys[self.index].write(key);
        self.table.vals[self.index].write(value);
        self.table.live += 1;
        if !self.recycled {
            self.table.used += 1;
        }
        self.index as HashUint
    }
}

/// A live entry produced by [`HashTable::entry`] when the key is present.
///
/// The stored key is left untouched by the lookup; callers decide whether
/// to read, update, or remove the entry.
pub struct OccupiedEntry<'a, K, V> {
    table: &'a mut HashTable<K, V>,
    index: usize,
}

impl<'a, K, V> OccupiedEntry<'a, K, V> {
    /// Index of the bucket holding the entry.
    #[inline]
    pub fn index(&self) -> HashUint {
        self.index as HashUint
    }

    /// The stored key.
    #[inline]
    pub fn key(&self) -> &K {
        // SAFETY: an OccupiedEntry always points at an occupied bucket.
        unsafe { self.table.keys[self.index].assume_init_ref() }
    }

    /// The stored value.
    #[inline]
    pub fn get(&self) -> &V {
        // SAFETY: an OccupiedEntry always points at an occupied bucket.
        unsafe { self.table.vals[self.index].assume_init_ref() }
    }

    /// The stored value, mutably.
    #[inline]
    pub fn get_mut(&mut self) -> &mut V {
        // SAFETY: an OccupiedEntry always points at an occupied bucket.
        unsafe { self.table.vals[self.index].assume_init_mut() }
    }

    /// Consumes the entry, returning a value reference tied to the table.
    #[inline]
    pub fn into_mut(self) -> &'a mut V {
        // SAFETY: an OccupiedEntry always points at an occupied bucket.
        unsafe { self.table.vals[self.index].assume_init_mut() }
    }

    /// Consumes the entry, returning a key reference tied to the table.
    #[inline]
    pub fn into_key(self) -> &'a K {
        // SAFETY: an OccupiedEntry always points at an occupied bucket.
        unsafe { self.table.keys[self.index].assume_init_ref() }
    }

    /// Replaces the stored value, returning the old one.
    pub fn replace_value(&mut self, value: V) -> V {
        mem::replace(self.get_mut(), value)
    }

    /// Removes the entry, leaving a tombstone, and returns its key and
    /// value.
    pub fn remove(self) -> (K, V) {
        // SAFETY: an OccupiedEntry always points at an occupied bucket; the
        // DELETED mark transfers ownership of both slots to the caller.
        let pair = unsafe {
            (
                self.table.keys[self.index].assume_init_read(),
                self.table.vals[self.index].assume_init_read(),
            )
        };
        flag::set_deleted(&mut self.table.flags, self.index);
        self.table.live -= 1;
        pair
    }
}

/// Iterator over the live entries of a [`HashTable`], created by
/// [`HashTable::iter`].
///
/// The order is unspecified and changes across rehashes.
pub struct Iter<'a, K, V> {
    table: &'a HashTable<K, V>,
    bucket: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while self.bucket < self.table.buckets as usize {
            let bucket = self.bucket;
            self.bucket += 1;
            if !flag::is_either(&self.table.flags, bucket) {
                // SAFETY: occupied buckets hold initialized contents.
                return Some(unsafe {
                    (
                        self.table.keys[bucket].assume_init_ref(),
                        self.table.vals[bucket].assume_init_ref(),
                    )
                });
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.table.live as usize))
    }
}

impl<'a, K, V> IntoIterator for &'a HashTable<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Occupancy snapshot for debugging, behind the `stats` feature.
#[cfg(feature = "stats")]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Live entries.
    pub live: HashUint,
    /// Live entries plus tombstones.
    pub used: HashUint,
    /// Tombstoned buckets.
    pub tombstones: HashUint,
    /// Bucket count.
    pub buckets: HashUint,
    /// Entries the table can hold before resizing.
    pub capacity: HashUint,
    /// `used / buckets`.
    pub load_factor: f64,
    /// `tombstones / buckets`.
    pub tombstone_ratio: f64,
    /// Approximate heap footprint of the three arrays, in bytes.
    pub heap_bytes: usize,
}

#[cfg(feature = "stats")]
impl DebugStats {
    /// Pretty-prints the snapshot.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== hash table stats ===");
        println!(
            "entries: {}/{} ({:.2}% load incl. {} tombstones)",
            self.live,
            self.capacity,
            self.load_factor * 100.0,
            self.tombstones
        );
        println!("buckets: {} ({} bytes on the heap)", self.buckets, self.heap_bytes);
    }
}

/// Distribution of probe distances, behind the `stats` feature.
#[cfg(feature = "stats")]
#[derive(Debug, Clone)]
pub struct ProbeHistogram {
    /// `lengths[d]` is the number of live entries found `d` probe steps
    /// from their home bucket.
    pub lengths: Vec<usize>,
    /// Live entries counted.
    pub live: usize,
}

#[cfg(feature = "stats")]
impl ProbeHistogram {
    /// Pretty-prints the histogram as a bar chart.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        let max = self.lengths.iter().copied().max().unwrap_or(0);
        if max == 0 {
            println!("probe histogram: empty");
            return;
        }
        println!("probe distance over {} entries:", self.live);
        for (distance, &count) in self.lengths.iter().enumerate() {
            let width = (count * 60).div_ceil(max);
            println!("{:>3} | {} ({})", distance, "#".repeat(width), count);
        }
    }
}

#[cfg(feature = "stats")]
impl<K, V> HashTable<K, V> {
    /// Returns an occupancy snapshot.
    pub fn debug_stats(&self) -> DebugStats {
        let tombstones = self.used - self.live;
        let buckets = self.buckets as f64;
        DebugStats {
            live: self.live,
            used: self.used,
            tombstones,
            buckets: self.buckets,
            capacity: self.limit,
            load_factor: if self.buckets == 0 {
                0.0
            } else {
                self.used as f64 / buckets
            },
            tombstone_ratio: if self.buckets == 0 {
                0.0
            } else {
                tombstones as f64 / buckets
            },
            heap_bytes: self.flags.capacity() * mem::size_of::<u32>()
                + self.keys.capacity() * mem::size_of::<K>()
                + self.vals.capacity() * mem::size_of::<V>(),
        }
    }

    /// Computes the distribution of probe distances for every live entry.
    ///
    /// `rehash` must be the hash function the entries were inserted under.
    pub fn probe_histogram(&self, rehash: impl Fn(&K) -> HashUint) -> ProbeHistogram {
        let mut lengths: Vec<usize> = Vec::new();
        if self.buckets > 0 {
            let mask = self.buckets as usize - 1;
            for bucket in 0..self.buckets as usize {
                if flag::is_either(&self.flags, bucket) {
                    continue;
                }
                // SAFETY: the bucket is occupied, so the key is initialized.
                let key = unsafe { self.keys[bucket].assume_init_ref() };
                let mut index = rehash(key) as usize & mask;
                let mut distance = 0usize;
                while index != bucket {
                    distance += 1;
                    index = (index + distance) & mask;
                }
                if lengths.len() <= distance {
                    lengths.resize(distance + 1, 0);
                }
                lengths[distance] += 1;
            }
        }
        ProbeHistogram {
            lengths,
            live: self.live as usize,
        }
    }
}
