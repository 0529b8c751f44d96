use core::fmt;

use crate::hash::Builtin;
use crate::hash::HashPolicy;
use crate::hash_table;
use crate::hash_table::buckets_for;
use crate::hash_table::AllocError;
use crate::hash_table::Entry;
use crate::hash_table::HashTable;
use crate::HashUint;
use crate::INDEX_MISSING;

/// A set over the open-addressing [`HashTable`].
///
/// `HashSet<K, P>` stores each element in a table with zero-sized values,
/// so the value array costs nothing. Elements are hashed and compared
/// through a [`HashPolicy`], [`Builtin`] by default.
///
/// Equality between sets ignores insertion order and capacity: two sets
/// are equal when they hold the same elements.
#[derive(Clone)]
pub struct HashSet<K, P = Builtin> {
    table: HashTable<K, ()>,
    policy: P,
}

impl<K: fmt::Debug, P: HashPolicy<K>> fmt::Debug for HashSet<K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, P: Default> Default for HashSet<K, P> {
    fn default() -> Self {
        Self {
            table: HashTable::new(),
            policy: P::default(),
        }
    }
}

impl<K> HashSet<K, Builtin> {
    /// Creates an empty set using the built-in hash policy.
    ///
    /// No memory is allocated until the first insertion.
    ///
    /// ```rust
    /// use trihash::HashSet;
    ///
    /// let set: HashSet<u32> = HashSet::new();
    /// assert!(set.is_empty());
    /// ```
    pub fn new() -> Self {
        Self {
            table: HashTable::new(),
            policy: Builtin,
        }
    }

    /// Creates a set that can hold at least `capacity` elements before
    /// resizing.
    pub fn with_capacity(capacity: HashUint) -> Result<Self, AllocError> {
        Ok(Self {
            table: HashTable::with_capacity(capacity)?,
            policy: Builtin,
        })
    }
}

impl<K, P: HashPolicy<K>> HashSet<K, P> {
    /// Creates an empty set with the given policy.
    pub fn with_policy(policy: P) -> Self {
        Self {
            table: HashTable::new(),
            policy,
        }
    }

    /// Creates a set with the given policy that can hold at least
    /// `capacity` elements before resizing.
    pub fn with_capacity_and_policy(capacity: HashUint, policy: P) -> Result<Self, AllocError> {
        Ok(Self {
            table: HashTable::with_capacity(capacity)?,
            policy,
        })
    }

    /// Number of elements in the set.
    #[inline]
    pub fn len(&self) -> HashUint {
        self.table.len()
    }

    /// Returns `true` if the set holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Number of elements the set can hold before it must resize.
    #[inline]
    pub fn capacity(&self) -> HashUint {
        self.table.capacity()
    }

    /// Removes every element, retaining the allocated capacity.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Grows the set so that at least `additional` more elements fit
    /// before the next resize.
    pub fn reserve(&mut self, additional: HashUint) -> Result<(), AllocError> {
        let Self { table, policy } = self;
        table.reserve(additional, |k| policy.hash(k))
    }

    /// Returns `true` if the set holds `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.table
            .get(self.policy.hash(key), |k| self.policy.eq(k, key))
            != INDEX_MISSING
    }

    /// Inserts `key`, returning `true` if it was absent.
    ///
    /// A present element is left untouched and the argument is dropped.
    ///
    /// ```rust
    /// use trihash::HashSet;
    ///
    /// let mut set: HashSet<u32> = HashSet::new();
    /// assert!(set.insert(1).unwrap());
    /// assert!(!set.insert(1).unwrap());
    /// assert_eq!(set.len(), 1);
    /// ```
    ///
    /// # Errors
    ///
    /// Fails when growing the set fails; the set is unchanged.
    pub fn insert(&mut self, key: K) -> Result<bool, AllocError> {
        let Self { table, policy } = self;
        let hash = policy.hash(&key);
        match table.entry(hash, |k| policy.eq(k, &key), |k| policy.hash(k))? {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(entry) => {
                entry.insert(key, ());
                Ok(true)
            }
        }
    }

    /// Inserts `key`, returning the already-stored element if there is one.
    ///
    /// # Errors
    ///
    /// Fails when growing the set fails; the set is unchanged.
    pub fn insert_or_get(&mut self, key: K) -> Result<Option<&K>, AllocError> {
        let Self { table, policy } = self;
        let hash = policy.hash(&key);
        match table.entry(hash, |k| policy.eq(k, &key), |k| policy.hash(k))? {
            Entry::Occupied(entry) => Ok(Some(entry.into_key())),
            Entry::Vacant(entry) => {
                entry.insert(key, ());
                Ok(None)
            }
        }
    }

    /// Inserts every element of `items`, pre-sizing the set once up front.
    ///
    /// Returns `true` if at least one element was newly inserted, `false`
    /// when every element was already present.
    ///
    /// ```rust
    /// use trihash::HashSet;
    ///
    /// let mut set: HashSet<u32> = HashSet::new();
    /// assert!(set.insert_all(&[1, 2, 3]).unwrap());
    /// assert!(!set.insert_all(&[1, 2, 3]).unwrap());
    /// assert!(set.insert_all(&[3, 4]).unwrap());
    /// ```
    ///
    /// # Errors
    ///
    /// Fails when an allocation fails; already-inserted elements remain.
    pub fn insert_all(&mut self, items: &[K]) -> Result<bool, AllocError>
    where
        K: Clone,
    {
        let requested = HashUint::try_from(items.len()).unwrap_or(HashUint::MAX);
        {
            let Self { table, policy } = self;
            table.resize(buckets_for(requested), |k| policy.hash(k))?;
        }
        let mut inserted = false;
        for item in items {
            if self.insert(item.clone())? {
                inserted = true;
            }
        }
        Ok(inserted)
    }

    /// Swaps a present element for `key`, returning the old one.
    ///
    /// Elements that compare equal can still be distinguishable (for
    /// example by identity); this replaces the stored one without touching
    /// the rest of the set. An absent key leaves the set unchanged and the
    /// argument is dropped.
    pub fn replace(&mut self, key: K) -> Option<K> {
        let index = self
            .table
            .get(self.policy.hash(&key), |k| self.policy.eq(k, &key));
        if index == INDEX_MISSING {
            return None;
        }
        Some(self.table.replace_key_at(index, key))
    }

    /// Removes `key`, returning `true` if it was present.
    pub fn remove(&mut self, key: &K) -> bool {
        self.take(key).is_some()
    }

    /// Removes `key`, returning the stored element.
    pub fn take(&mut self, key: &K) -> Option<K> {
        let index = self
            .table
            .get(self.policy.hash(key), |k| self.policy.eq(k, key));
        self.table.remove_at(index).map(|(key, ())| key)
    }

    /// Returns `true` if every element of `other` is in `self`.
    ///
    /// ```rust
    /// use trihash::HashSet;
    ///
    /// let mut a: HashSet<u32> = HashSet::new();
    /// let mut b: HashSet<u32> = HashSet::new();
    /// a.insert_all(&[1, 2, 3]).unwrap();
    /// b.insert_all(&[2, 3]).unwrap();
    /// assert!(a.is_superset(&b));
    /// assert!(!b.is_superset(&a));
    /// ```
    pub fn is_superset(&self, other: &Self) -> bool {
        other.iter().all(|key| self.contains(key))
    }

    /// Inserts every element of `other` into `self`.
    ///
    /// # Errors
    ///
    /// Fails when an allocation fails; already-inserted elements remain.
    pub fn union_with(&mut self, other: &Self) -> Result<(), AllocError>
    where
        K: Clone,
    {
        self.reserve(other.len())?;
        for key in other.iter() {
            self.insert(key.clone())?;
        }
        Ok(())
    }

    /// Removes every element of `self` that is not in `other`.
    pub fn intersect_with(&mut self, other: &Self) {
        for index in 0..self.table.bucket_count() {
            if self.table.is_occupied(index) && !other.contains(self.table.key_at(index)) {
                self.table.delete(index);
            }
        }
    }

    /// Order-independent hash of the whole set: the XOR of every element's
    /// hash under the set's policy.
    ///
    /// Equal sets hash equally regardless of insertion order or capacity.
    pub fn hash_value(&self) -> HashUint {
        let mut acc: HashUint = 0;
        for key in self.iter() {
            acc ^= self.policy.hash(key);
        }
        acc
    }

    /// Returns the element stored at the lowest occupied bucket, or `None`
    /// for an empty set.
    ///
    /// Which element that is depends on the current layout; the only
    /// guarantee is that a non-empty set yields something.
    pub fn get_any(&self) -> Option<&K> {
        self.iter().next()
    }

    /// Returns an iterator over the elements, in unspecified order.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            inner: self.table.iter(),
        }
    }
}

impl<K, P: HashPolicy<K>> PartialEq for HashSet<K, P> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.is_superset(other)
    }
}

/// Iterator over the elements of a [`HashSet`], created by
/// [`HashSet::iter`].
pub struct Iter<'a, K> {
    inner: hash_table::Iter<'a, K, ()>,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, ())| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, P: HashPolicy<K>> IntoIterator for &'a HashSet<K, P> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::hash::FnPolicy;
    use crate::hash::TableKey;

    fn filled(range: core::ops::Range<u32>) -> HashSet<u32> {
        let mut set = HashSet::new();
        let items: Vec<u32> = range.collect();
        set.insert_all(&items).unwrap();
        set
    }

    #[test]
    fn insert_reports_novelty() {
        let mut set: HashSet<u32> = HashSet::new();
        for i in 0..100 {
            assert!(set.insert(i).unwrap());
        }
        assert!(!set.insert(0).unwrap());
        assert_eq!(set.len(), 100);

        for i in 0..100 {
            assert_eq!(set.insert_or_get(i).unwrap(), Some(&i));
        }
    }

    #[test]
    fn insert_all_reports_any_novelty() {
        let items: Vec<u32> = (0..100).collect();
        let more: Vec<u32> = (0..101).collect();

        let mut set: HashSet<u32> = HashSet::new();
        assert!(set.insert_all(&items).unwrap());
        assert!(!set.insert_all(&items).unwrap());
        assert!(set.insert_all(&more).unwrap());
        assert_eq!(set.len(), 101);
    }

    #[test]
    fn superset_and_equality() {
        let mut a = filled(0..100);
        let mut b = filled(0..50);

        assert!(a.is_superset(&b));
        assert!(!b.is_superset(&a));
        assert_ne!(a, b);

        let items: Vec<u32> = (0..100).collect();
        b.insert_all(&items).unwrap();
        assert_eq!(a, b);

        // Equality ignores layout: force different capacities.
        a.reserve(10_000).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn remove_and_take() {
        let mut set = filled(0..100);
        assert!(set.contains(&42));
        assert!(set.remove(&42));
        assert!(!set.remove(&42));
        assert!(!set.contains(&42));
        assert_eq!(set.take(&43), Some(43));
        assert_eq!(set.take(&43), None);
        assert_eq!(set.len(), 98);
    }

    #[test]
    fn replace_swaps_the_stored_element() {
        let mut set = filled(0..10);
        assert_eq!(set.replace(3), Some(3));
        assert_eq!(set.replace(11), None);
        assert!(!set.contains(&11));
        assert_eq!(set.len(), 10);
    }

    #[test]
    fn xor_hash_ignores_order() {
        let mut forward: HashSet<u32> = HashSet::new();
        let mut backward: HashSet<u32> = HashSet::new();
        for i in 0..100 {
            forward.insert(i).unwrap();
        }
        for i in (0..100).rev() {
            backward.insert(i).unwrap();
        }
        assert_eq!(forward.hash_value(), backward.hash_value());

        backward.remove(&0);
        assert_ne!(forward.hash_value(), backward.hash_value());

        assert_eq!(HashSet::<u32>::new().hash_value(), 0);
    }

    #[test]
    fn get_any_yields_some_element() {
        let set = filled(0..10);
        let any = *set.get_any().unwrap();
        assert!(set.contains(&any));

        let mut set = set;
        set.clear();
        assert_eq!(set.get_any(), None);
    }

    #[test]
    fn union_accumulates() {
        let mut a = filled(0..50);
        let b = filled(25..75);
        a.union_with(&b).unwrap();
        assert_eq!(a.len(), 75);
        assert!(a.is_superset(&b));
    }

    #[test]
    fn intersection_prunes() {
        let mut a = filled(0..50);
        let b = filled(25..75);
        a.intersect_with(&b);
        assert_eq!(a.len(), 25);
        for i in 25..50 {
            assert!(a.contains(&i));
        }
        for i in 0..25 {
            assert!(!a.contains(&i));
        }
    }

    #[test]
    fn fn_policy_set_behaves_like_builtin() {
        let policy: FnPolicy<u32> = FnPolicy::new(|k| TableKey::hash(k), |a, b| a == b);
        let mut set: HashSet<u32, _> = HashSet::with_policy(policy);
        for i in 0..100 {
            assert!(set.insert(i).unwrap());
        }
        assert!(!set.insert(99).unwrap());
        assert!(set.contains(&0));
        assert_eq!(set.take(&0), Some(0));
        assert_eq!(set.len(), 99);
    }
}
