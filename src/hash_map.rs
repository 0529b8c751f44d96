use core::fmt;
use core::mem;

use crate::hash::Builtin;
use crate::hash::HashPolicy;
use crate::hash_table;
use crate::hash_table::AllocError;
use crate::hash_table::Entry;
use crate::hash_table::HashTable;
use crate::HashUint;
use crate::INDEX_MISSING;

/// A key-value map over the open-addressing [`HashTable`].
///
/// `HashMap<K, V, P>` hashes and compares keys through a [`HashPolicy`].
/// The default policy, [`Builtin`], uses the built-in per-type hash
/// functions and `==`-style equality and compiles down to direct calls; a
/// [`FnPolicy`](crate::hash::FnPolicy) carries function pointers in the map
/// instead.
///
/// Absent keys are not errors; the only failure any operation reports is
/// allocation failure, and a failed operation leaves the map unchanged.
#[derive(Clone)]
pub struct HashMap<K, V, P = Builtin> {
    table: HashTable<K, V>,
    policy: P,
}

impl<K: fmt::Debug, V: fmt::Debug, P> fmt::Debug for HashMap<K, V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in self.table.iter() {
            map.entry(k, v);
        }
        map.finish()
    }
}

impl<K, V, P: Default> Default for HashMap<K, V, P> {
    fn default() -> Self {
        Self {
            table: HashTable::new(),
            policy: P::default(),
        }
    }
}

impl<K, V> HashMap<K, V, Builtin> {
    /// Creates an empty map using the built-in hash policy.
    ///
    /// No memory is allocated until the first insertion.
    ///
    /// ```rust
    /// use trihash::HashMap;
    ///
    /// let map: HashMap<u32, &str> = HashMap::new();
    /// assert!(map.is_empty());
    /// ```
    pub fn new() -> Self {
        Self {
            table: HashTable::new(),
            policy: Builtin,
        }
    }

    /// Creates a map that can hold at least `capacity` entries before
    /// resizing.
    pub fn with_capacity(capacity: HashUint) -> Result<Self, AllocError> {
        Ok(Self {
            table: HashTable::with_capacity(capacity)?,
            policy: Builtin,
        })
    }
}

impl<K, V, P: HashPolicy<K>> HashMap<K, V, P> {
    /// Creates an empty map with the given policy.
    pub fn with_policy(policy: P) -> Self {
        Self {
            table: HashTable::new(),
            policy,
        }
    }

    /// Creates a map with the given policy that can hold at least
    /// `capacity` entries before resizing.
    pub fn with_capacity_and_policy(capacity: HashUint, policy: P) -> Result<Self, AllocError> {
        Ok(Self {
            table: HashTable::with_capacity(capacity)?,
            policy,
        })
    }

    /// Number of entries in the map.
    #[inline]
    pub fn len(&self) -> HashUint {
        self.table.len()
    }

    /// Returns `true` if the map holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Number of entries the map can hold before it must resize.
    #[inline]
    pub fn capacity(&self) -> HashUint {
        self.table.capacity()
    }

    /// Removes every entry, retaining the allocated capacity.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Grows the map so that at least `additional` more entries fit before
    /// the next resize.
    pub fn reserve(&mut self, additional: HashUint) -> Result<(), AllocError> {
        let Self { table, policy } = self;
        table.reserve(additional, |k| policy.hash(k))
    }

    /// Returns the value stored for `key`.
    ///
    /// ```rust
    /// use trihash::HashMap;
    ///
    /// let mut map: HashMap<u32, &str> = HashMap::new();
    /// map.set(1, "one").unwrap();
    /// assert_eq!(map.get(&1), Some(&"one"));
    /// assert_eq!(map.get(&2), None);
    /// ```
    pub fn get(&self, key: &K) -> Option<&V> {
        let index = self
            .table
            .get(self.policy.hash(key), |k| self.policy.eq(k, key));
        if index == INDEX_MISSING {
            None
        } else {
            Some(self.table.value_at(index))
        }
    }

    /// Returns the value stored for `key`, mutably.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let index = self
            .table
            .get(self.policy.hash(key), |k| self.policy.eq(k, key));
        if index == INDEX_MISSING {
            None
        } else {
            Some(self.table.value_at_mut(index))
        }
    }

    /// Returns a copy of the value stored for `key`, or `default` if the
    /// key is absent.
    ///
    /// ```rust
    /// use trihash::HashMap;
    ///
    /// let mut map: HashMap<u32, u32> = HashMap::new();
    /// map.set(1, 10).unwrap();
    /// assert_eq!(map.get_or(&1, u32::MAX), 10);
    /// assert_eq!(map.get_or(&9, u32::MAX), u32::MAX);
    /// ```
    pub fn get_or(&self, key: &K, default: V) -> V
    where
        V: Clone,
    {
        match self.get(key) {
            Some(value) => value.clone(),
            None => default,
        }
    }

    /// Returns `true` if the map holds an entry for `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.table
            .get(self.policy.hash(key), |k| self.policy.eq(k, key))
            != INDEX_MISSING
    }

    /// Stores `value` for `key` unconditionally.
    ///
    /// Returns the previously stored value when the key was already
    /// present; the stored key itself is never replaced.
    ///
    /// ```rust
    /// use trihash::HashMap;
    ///
    /// let mut map: HashMap<u32, &str> = HashMap::new();
    /// assert_eq!(map.set(1, "one").unwrap(), None);
    /// assert_eq!(map.set(1, "ONE").unwrap(), Some("one"));
    /// assert_eq!(map.get(&1), Some(&"ONE"));
    /// ```
    ///
    /// # Errors
    ///
    /// Fails when growing the map fails; the map is unchanged.
    pub fn set(&mut self, key: K, value: V) -> Result<Option<V>, AllocError> {
        let Self { table, policy } = self;
        let hash = policy.hash(&key);
        match table.entry(hash, |k| policy.eq(k, &key), |k| policy.hash(k))? {
            Entry::Occupied(mut entry) => Ok(Some(entry.replace_value(value))),
            Entry::Vacant(entry) => {
                entry.insert(key, value);
                Ok(None)
            }
        }
    }

    /// Stores `value` for `key` only if the key is absent.
    ///
    /// Returns the already-stored value when the key is present, leaving
    /// it untouched.
    ///
    /// ```rust
    /// use trihash::HashMap;
    ///
    /// let mut map: HashMap<u32, &str> = HashMap::new();
    /// assert_eq!(map.add(1, "one").unwrap(), None);
    /// assert_eq!(map.add(1, "ONE").unwrap(), Some(&"one"));
    /// assert_eq!(map.get(&1), Some(&"one"));
    /// ```
    ///
    /// # Errors
    ///
    /// Fails when growing the map fails; the map is unchanged.
    pub fn add(&mut self, key: K, value: V) -> Result<Option<&V>, AllocError> {
        let Self { table, policy } = self;
        let hash = policy.hash(&key);
        match table.entry(hash, |k| policy.eq(k, &key), |k| policy.hash(k))? {
            Entry::Occupied(entry) => Ok(Some(&*entry.into_mut())),
            Entry::Vacant(entry) => {
                entry.insert(key, value);
                Ok(None)
            }
        }
    }

    /// Stores `value` for `key` only if the key is already present,
    /// returning the previous value.
    ///
    /// Unlike [`set`](Self::set) this never allocates, so an absent key is
    /// simply reported as `None`.
    ///
    /// ```rust
    /// use trihash::HashMap;
    ///
    /// let mut map: HashMap<u32, u32> = HashMap::new();
    /// assert_eq!(map.replace(&1, 10), None);
    /// map.set(1, 10).unwrap();
    /// assert_eq!(map.replace(&1, 11), Some(10));
    /// ```
    pub fn replace(&mut self, key: &K, value: V) -> Option<V> {
        let index = self
            .table
            .get(self.policy.hash(key), |k| self.policy.eq(k, key));
        if index == INDEX_MISSING {
            return None;
        }
        Some(mem::replace(self.table.value_at_mut(index), value))
    }

    /// Removes the entry for `key`, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes the entry for `key`, returning the stored key and value.
    ///
    /// ```rust
    /// use trihash::HashMap;
    ///
    /// let mut map: HashMap<u32, &str> = HashMap::new();
    /// map.set(1, "one").unwrap();
    /// assert_eq!(map.remove_entry(&1), Some((1, "one")));
    /// assert_eq!(map.remove_entry(&1), None);
    /// ```
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let index = self
            .table
            .get(self.policy.hash(key), |k| self.policy.eq(k, key));
        self.table.remove_at(index)
    }

    /// Builds a [`HashSet`] of the map's keys, under the same policy.
    ///
    /// # Errors
    ///
    /// Fails when allocating the set fails.
    pub fn key_set(&self) -> Result<crate::hash_set::HashSet<K, P>, AllocError>
    where
        K: Clone,
        P: Clone,
    {
        let mut set =
            crate::hash_set::HashSet::with_capacity_and_policy(self.len(), self.policy.clone())?;
        for (key, _) in self.table.iter() {
            set.insert(key.clone())?;
        }
        Ok(set)
    }

    /// Returns an iterator over the entries, in unspecified order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over the keys, in unspecified order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values, in unspecified order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }
}

/// Iterator over the entries of a [`HashMap`], created by
/// [`HashMap::iter`].
pub struct Iter<'a, K, V> {
    inner: hash_table::Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Iterator over the keys of a [`HashMap`], created by [`HashMap::keys`].
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }
}

/// Iterator over the values of a [`HashMap`], created by
/// [`HashMap::values`].
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }
}

impl<'a, K, V, P: HashPolicy<K>> IntoIterator for &'a HashMap<K, V, P> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec::Vec;

    use super::*;
    use crate::hash::FnPolicy;
    use crate::hash::TableKey;

    #[test]
    fn set_get_and_overwrite() {
        let mut map: HashMap<u32, u32> = HashMap::new();
        for i in 0..100 {
            assert_eq!(map.set(i, i).unwrap(), None);
        }
        assert_eq!(map.len(), 100);

        // PRESENT reports the previous value and stores the new one.
        assert_eq!(map.set(0, 1).unwrap(), Some(0));
        assert_eq!(map.get(&0), Some(&1));
    }

    #[test]
    fn add_keeps_the_stored_value() {
        let mut map: HashMap<u32, u32> = HashMap::new();
        map.set(0, 0).unwrap();
        assert_eq!(map.add(0, 1).unwrap(), Some(&0));
        assert_eq!(map.get(&0), Some(&0));
        assert_eq!(map.add(7, 7).unwrap(), None);
        assert_eq!(map.get(&7), Some(&7));
    }

    #[test]
    fn replace_only_touches_present_keys() {
        let mut map: HashMap<u32, u32> = HashMap::new();
        map.set(0, 0).unwrap();
        assert_eq!(map.replace(&0, 7), Some(0));
        assert_eq!(map.get_or(&0, u32::MAX), 7);
        assert_eq!(map.replace(&123, 1), None);
        assert!(!map.contains_key(&123));
    }

    #[test]
    fn map_calls_compose() {
        // set / add / replace / get_or over the same key behave like
        // independent primitives.
        let mut map: HashMap<u32, u32> = HashMap::new();
        for i in 0..100 {
            map.set(i, i).unwrap();
        }
        assert_eq!(map.set(0, 0).unwrap(), Some(0));
        assert_eq!(map.add(0, 1).unwrap(), Some(&0));
        assert_eq!(map.replace(&0, 7), Some(0));
        assert_eq!(map.get_or(&0, u32::MAX), 7);
    }

    #[test]
    fn remove_and_remove_entry() {
        let mut map: HashMap<u32, u32> = HashMap::new();
        for i in 0..100 {
            map.set(i, i).unwrap();
        }
        assert_eq!(map.remove(&3), Some(3));
        assert_eq!(map.remove(&3), None);
        assert_eq!(map.len(), 99);

        for i in 4..100 {
            assert_eq!(map.remove_entry(&i), Some((i, i)));
        }
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn string_keys_and_values_round_trip() {
        let mut map: HashMap<String, String> = HashMap::new();
        map.set("hello".to_string(), "world".to_string()).unwrap();
        map.set("foo".to_string(), "bar".to_string()).unwrap();

        assert_eq!(map.get(&"hello".to_string()), Some(&"world".to_string()));
        assert_eq!(
            map.remove_entry(&"foo".to_string()),
            Some(("foo".to_string(), "bar".to_string()))
        );
        assert_eq!(map.get(&"foo".to_string()), None);
    }

    #[test]
    fn iteration_covers_every_entry() {
        let mut map: HashMap<u32, u32> = HashMap::new();
        for i in 0..50 {
            map.set(i, i * 3).unwrap();
        }
        let mut pairs: Vec<(u32, u32)> = map.iter().map(|(k, v)| (*k, *v)).collect();
        pairs.sort_unstable();
        assert_eq!(pairs.len(), 50);
        for (i, (k, v)) in pairs.iter().enumerate() {
            assert_eq!(*k, i as u32);
            assert_eq!(*v, k * 3);
        }

        let mut keys: Vec<u32> = map.keys().copied().collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..50).collect::<Vec<u32>>());
        assert_eq!(map.values().copied().sum::<u32>(), (0..50).sum::<u32>() * 3);
    }

    #[test]
    fn key_set_mirrors_the_keys() {
        let mut map: HashMap<u32, u32> = HashMap::new();
        for i in 0..100 {
            map.set(i, i).unwrap();
        }
        let set = map.key_set().unwrap();
        assert_eq!(set.len(), 100);
        for i in 0..100 {
            assert!(set.contains(&i));
        }
        assert!(!set.contains(&100));
    }

    #[test]
    fn clear_then_reuse() {
        let mut map: HashMap<u32, u32> = HashMap::new();
        for i in 0..100 {
            map.set(i, i).unwrap();
        }
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.get(&1), None);
        map.set(1, 1).unwrap();
        assert_eq!(map.get(&1), Some(&1));
    }

    #[test]
    fn with_capacity_avoids_growth() {
        let map: HashMap<u32, u32> = HashMap::with_capacity(100).unwrap();
        assert!(map.capacity() >= 100);

        let mut map: HashMap<u32, u32> = HashMap::new();
        map.reserve(1000).unwrap();
        assert!(map.capacity() >= 1000);
    }

    #[test]
    fn fn_policy_map_behaves_like_builtin() {
        let policy: FnPolicy<u32> = FnPolicy::new(|k| TableKey::hash(k), |a, b| a == b);
        let mut map: HashMap<u32, u32, _> = HashMap::with_policy(policy);
        for i in 0..100 {
            assert_eq!(map.set(i, i).unwrap(), None);
        }
        assert_eq!(map.set(0, 1).unwrap(), Some(0));
        assert_eq!(map.add(0, 2).unwrap(), Some(&1));
        assert_eq!(map.replace(&0, 0), Some(1));
        assert_eq!(map.get_or(&0, u32::MAX), 0);
        for i in 0..100 {
            assert_eq!(map.remove_entry(&i), Some((i, if i == 0 { 0 } else { i })));
        }
        assert!(map.is_empty());
    }
}
