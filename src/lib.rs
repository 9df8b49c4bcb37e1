//! An open-addressing hash map with Robin Hood probing and backward-shift
//! deletion, plus [`FixedMap`], a read-only variant that is built during
//! constant evaluation.
//!
//! ```
//! use flat_hashmap::HashMap;
//!
//! let mut ages: HashMap<String, u32> = HashMap::new();
//! ages.insert("Alice".to_string(), 100);
//! ages.insert("Bob".to_string(), 200);
//!
//! assert_eq!(ages.get("Alice"), Some(&100));
//! *ages.get_or_default("Carol") += 1;
//! assert_eq!(ages["Carol"], 1);
//! assert_eq!(ages.remove("Bob"), Some(200));
//! ```

#[macro_use]
extern crate log;

mod error;
mod fixed;
pub mod hasher;
mod key;
mod probe;
mod table;
mod tiny_string;

#[cfg(test)]
mod map_proptest;

pub use crate::error::Error;
pub use crate::fixed::{FixedIter, FixedMap};
pub use crate::hasher::DefaultBuildHasher;
pub use crate::key::FromKeyView;
pub use crate::probe::fixed_capacity;
pub use crate::tiny_string::TinyString;

use std::borrow::Borrow;
use std::fmt::{self, Debug};
use std::hash::{BuildHasher, Hash};
use std::iter::{FromIterator, FusedIterator};
use std::mem;
use std::ops::Index;

use crate::probe::{max_load, INITIAL_CAPACITY, MAX_CAPACITY};
use crate::table::Fallibility::{self, Fallible, Infallible};
use crate::table::{Probe, RawIntoIter, RawIter, RawIterMut, RawTable};

/// The default behavior of HashMap implements a maximum load factor of 87.5%
/// and grows by half of the current slot count.
#[derive(Clone)]
struct DefaultResizePolicy;

impl DefaultResizePolicy {
    #[inline]
    fn new() -> DefaultResizePolicy {
        DefaultResizePolicy
    }

    /// A hash map's "capacity" is its number of slots; how many of them may
    /// be full at once is `usable`. The raw capacity for `len` elements is
    /// the first size of the growth sequence `8, 12, 18, 27, ...` whose
    /// usable part holds them.
    #[inline]
    fn try_raw_capacity(&self, len: usize) -> Result<usize, Error> {
        self.try_grow_to(0, len)
    }

    #[inline]
    fn raw_capacity(&self, len: usize) -> usize {
        match self.try_raw_capacity(len) {
            Ok(raw_cap) => raw_cap,
            Err(_) => panic!("capacity overflow"),
        }
    }

    /// Walks the growth sequence from `raw_cap` until `len` elements fit.
    fn try_grow_to(&self, mut raw_cap: usize, len: usize) -> Result<usize, Error> {
        while self.usable(raw_cap) < len {
            raw_cap = self.try_grow(raw_cap)?;
        }
        Ok(raw_cap)
    }

    /// The next raw capacity after `raw_cap`.
    #[inline]
    fn try_grow(&self, raw_cap: usize) -> Result<usize, Error> {
        if raw_cap == 0 {
            return Ok(INITIAL_CAPACITY);
        }
        raw_cap
            .checked_mul(3)
            .map(|c| c / 2)
            .filter(|&c| c <= MAX_CAPACITY)
            .ok_or(Error::CapacityOverflow)
    }

    /// The number of elements a table of `raw_cap` slots may hold.
    #[inline]
    fn usable(&self, raw_cap: usize) -> usize {
        max_load(raw_cap)
    }
}

// The main performance trick in this hashmap is called Robin Hood Hashing.
// It gains its excellent performance from one essential operation:
//
//    If an insertion collides with an existing element, and that element's
//    "probe distance" (how far away the element is from its ideal location)
//    is lower than how far we've already probed, swap the elements.
//
// This massively lowers variance in probe distance, and allows us to get very
// high load factors with good performance.
//
// Every slot carries a control entry: the high 32 bits of the key's hash and
// the slot's distance to the ideal bucket (DIB). The ideal bucket is picked
// from those same high bits by multiply-shift, `(fragment * capacity) >> 32`,
// so capacities need not be powers of two. Tables start at 8 slots and grow
// by half whenever an insert would push the load over 7/8.
//
// Lookups stop as soon as they meet an empty slot or an element whose DIB is
// smaller than the distance probed so far: had the key been present, it
// would have displaced that element. Fragments are compared before keys, so
// `Eq` only runs on likely matches.
//
// Removal uses backward shifting instead of tombstones. After taking an
// element out, the following elements of its run are moved one slot back
// (their DIB dropping by one) until an empty slot or an element sitting in
// its ideal bucket is reached. The table is thus always in the state a fresh
// sequence of insertions would have produced, and probe lengths do not decay
// under churn.
//
// Growing moves every element into the new table using the fragment stored
// in its control entry. No key is hashed or compared while rehashing, so user
// code never runs with the map in an intermediate state.
//
// Original Robin Hood paper: Pedro Celis. 1986. Robin Hood Hashing.
// Backward shift deletion: Emmanuel Goossaert. 2013. Robin Hood hashing:
// backward shift deletion.

/// A hash map implemented with Robin Hood probing and backward-shift
/// deletion.
///
/// Keys and values live inline in a single allocation, next to a compact
/// array of per-slot metadata. Lookup accepts any borrowed form `Q` of the
/// key type, as with [`std::collections::HashMap`].
///
/// By default the map hashes with FNV-1a ([`DefaultBuildHasher`]). The
/// hashing algorithm can be replaced per map with [`with_hasher`]; integer
/// keys are best served by [`hasher::IntBuildHasher`].
///
/// Iteration order is the slot order and changes as the map grows.
///
/// [`with_hasher`]: HashMap::with_hasher
pub struct HashMap<K, V, S = DefaultBuildHasher> {
    // Every key and query is hashed with this builder.
    hash_builder: S,

    table: RawTable<K, V>,

    resize_policy: DefaultResizePolicy,
}

/// Displacement figures of a map, see [`HashMap::probe_stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProbeStats {
    /// The largest distance of an element from its ideal bucket.
    pub max_displacement: u32,
    /// The sum of all distances.
    pub total_displacement: u64,
}

impl<K, V> HashMap<K, V, DefaultBuildHasher> {
    /// Creates an empty `HashMap`.
    ///
    /// The hash map is initially created with a capacity of 0, so it will not
    /// allocate until it is first inserted into.
    #[inline]
    pub fn new() -> HashMap<K, V, DefaultBuildHasher> {
        Default::default()
    }

    /// Creates an empty `HashMap` with room for `capacity` elements.
    ///
    /// # Examples
    ///
    /// ```
    /// use flat_hashmap::HashMap;
    /// let map: HashMap<&str, i32> = HashMap::with_capacity(10);
    /// assert!(map.capacity() * 7 / 8 >= 10);
    /// ```
    #[inline]
    pub fn with_capacity(capacity: usize) -> HashMap<K, V, DefaultBuildHasher> {
        HashMap::with_capacity_and_hasher(capacity, Default::default())
    }
}

impl<K, V, S> HashMap<K, V, S> {
    /// Creates an empty `HashMap` which will use the given hash builder to
    /// hash keys. It does not allocate.
    #[inline]
    pub fn with_hasher(hash_builder: S) -> HashMap<K, V, S> {
        HashMap {
            hash_builder,
            resize_policy: DefaultResizePolicy::new(),
            table: RawTable::empty(),
        }
    }

    /// Creates an empty `HashMap` with room for `capacity` elements, using
    /// `hash_builder` to hash the keys.
    ///
    /// # Panics
    ///
    /// Panics if the table for `capacity` elements would have more than
    /// `u32::MAX` slots.
    #[inline]
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> HashMap<K, V, S> {
        let resize_policy = DefaultResizePolicy::new();
        let raw_cap = resize_policy.raw_capacity(capacity);
        HashMap {
            hash_builder,
            resize_policy,
            table: RawTable::new(raw_cap),
        }
    }

    /// Returns a reference to the map's [`BuildHasher`].
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns the number of slots in the table.
    ///
    /// At most `capacity() * 7 / 8` elements are stored before the table
    /// grows.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the number of elements in the map.
    #[inline]
    pub fn len(&self) -> usize {
        self.table.size()
    }

    /// Returns true if the map contains no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears the map, dropping every key-value pair. Keeps the allocated
    /// memory for reuse.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// An iterator visiting all key-value pairs in slot order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// An iterator visiting all key-value pairs in slot order, with mutable
    /// references to the values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.table.iter_mut(),
        }
    }

    /// An iterator visiting all keys in slot order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// An iterator visiting all values in slot order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// An iterator visiting all values mutably in slot order.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// How far elements sit from their ideal buckets.
    ///
    /// ```
    /// use flat_hashmap::HashMap;
    ///
    /// let map: HashMap<u32, u32> = (0..100).map(|i| (i, i)).collect();
    /// let stats = map.probe_stats();
    /// assert!(u64::from(stats.max_displacement) <= stats.total_displacement);
    /// ```
    pub fn probe_stats(&self) -> ProbeStats {
        let (max_displacement, total_displacement) = self.table.displacements();
        ProbeStats {
            max_displacement,
            total_displacement,
        }
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    #[inline]
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: Hash + ?Sized,
    {
        self.hash_builder.hash_one(q)
    }

    /// Index of the element whose key equals `q`.
    #[inline]
    fn search<Q>(&self, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        if self.is_empty() {
            return None;
        }
        let hash = self.make_hash(q);
        self.table.find(hash, |k| q.eq(k.borrow()))
    }

    /// Probes for `q` and, if it is absent, makes sure the returned probe
    /// points at room for one more element. Growing happens only when the
    /// key is missing, so overwrites never resize.
    fn probe_for_insert<Q>(&mut self, hash: u64, q: &Q) -> Probe
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        if self.table.capacity() > 0 {
            let found = self.table.probe(hash, |k| q.eq(k.borrow()));
            if let Probe::Occupied(_) = found {
                return found;
            }
            if self.len() < self.resize_policy.usable(self.table.capacity()) {
                return found;
            }
        }
        self.reserve(1);
        // the key is absent, so only the location in the new table is needed
        self.table.probe(hash, |k| q.eq(k.borrow()))
    }

    /// Reserves capacity for at least `additional` more elements.
    ///
    /// # Panics
    ///
    /// Panics if the new table would have more than `u32::MAX` slots.
    ///
    /// # Examples
    ///
    /// ```
    /// use flat_hashmap::HashMap;
    /// let mut map: HashMap<&str, i32> = HashMap::new();
    /// map.reserve(10);
    /// assert!(map.capacity() >= 12);
    /// ```
    pub fn reserve(&mut self, additional: usize) {
        match self.reserve_internal(additional, Infallible) {
            Err(Error::CapacityOverflow) => panic!("capacity overflow"),
            Err(err) => unreachable!("infallible reserve reported {}", err),
            Ok(()) => {}
        }
    }

    /// Tries to reserve capacity for at least `additional` more elements.
    ///
    /// # Errors
    ///
    /// If the capacity overflows, or the allocator reports a failure, then an
    /// error is returned and the map is left untouched.
    ///
    /// ```
    /// use flat_hashmap::{Error, HashMap};
    /// let mut map: HashMap<&str, isize> = HashMap::new();
    /// map.try_reserve(10).unwrap();
    /// assert_eq!(map.try_reserve(usize::MAX), Err(Error::CapacityOverflow));
    /// ```
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), Error> {
        self.reserve_internal(additional, Fallible).map_err(|err| {
            warn!(
                "failed to reserve {} more slots for a map of {} elements: {}",
                additional,
                self.len(),
                err
            );
            err
        })
    }

    fn reserve_internal(&mut self, additional: usize, fallibility: Fallibility) -> Result<(), Error> {
        let min_len = self
            .len()
            .checked_add(additional)
            .ok_or(Error::CapacityOverflow)?;
        let raw_cap = self.table.capacity();
        if self.resize_policy.usable(raw_cap) < min_len {
            let new_raw_cap = self.resize_policy.try_grow_to(raw_cap, min_len)?;
            self.try_resize(new_raw_cap, fallibility)?;
        }
        Ok(())
    }

    /// Moves every element into a table of `new_raw_cap` slots. The caller
    /// ensures the new table can hold all of them under the load limit.
    #[inline(never)]
    #[cold]
    fn try_resize(&mut self, new_raw_cap: usize, fallibility: Fallibility) -> Result<(), Error> {
        assert!(self.table.size() <= self.resize_policy.usable(new_raw_cap));

        let mut old_table = mem::replace(
            &mut self.table,
            RawTable::try_new(new_raw_cap, fallibility)?,
        );
        let old_size = old_table.size();
        debug!(
            "growing table from {} to {} slots ({} elements)",
            old_table.capacity(),
            new_raw_cap,
            old_size
        );

        old_table.migrate_into(&mut self.table);

        assert_eq!(self.table.size(), old_size);
        Ok(())
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map did not have this key present, [`None`] is returned.
    /// Otherwise the value is updated and the old value is returned; the key
    /// stored in the map is kept.
    pub fn insert(&mut self, k: K, v: V) -> Option<V> {
        let hash = self.make_hash(&k);
        match self.probe_for_insert(hash, &k) {
            Probe::Occupied(index) => Some(mem::replace(&mut self.table.entry_mut(index).1, v)),
            found => {
                self.table.put(found, hash, (k, v));
                None
            }
        }
    }

    /// Inserts a key-value pair unless the key is already present.
    ///
    /// Returns the value stored for the key and whether the insertion took
    /// place. An existing entry is left untouched and `k`/`v` are dropped.
    ///
    /// ```
    /// use flat_hashmap::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// assert_eq!(map.try_insert("a", 1), (&mut 1, true));
    /// assert_eq!(map.try_insert("a", 2), (&mut 1, false));
    /// ```
    pub fn try_insert(&mut self, k: K, v: V) -> (&mut V, bool) {
        let hash = self.make_hash(&k);
        let (index, inserted) = match self.probe_for_insert(hash, &k) {
            Probe::Occupied(index) => (index, false),
            found => (self.table.put(found, hash, (k, v)), true),
        };
        (&mut self.table.entry_mut(index).1, inserted)
    }

    /// Returns the value for `key`, inserting `default()` first if the key is
    /// absent. The owning key is built from `key` only in that case, directly
    /// from the view (see [`FromKeyView`]).
    pub fn get_or_insert_with<Q, F>(&mut self, key: &Q, default: F) -> &mut V
    where
        K: FromKeyView<Q>,
        Q: Eq + Hash + ?Sized,
        F: FnOnce() -> V,
    {
        let hash = self.make_hash(key);
        let index = match self.probe_for_insert(hash, key) {
            Probe::Occupied(index) => index,
            found => {
                let k = K::from_key_view(key);
                let v = default();
                self.table.put(found, hash, (k, v))
            }
        };
        &mut self.table.entry_mut(index).1
    }

    /// Returns the value for `key`, inserting `V::default()` first if the key
    /// is absent.
    ///
    /// ```
    /// use flat_hashmap::HashMap;
    ///
    /// let mut map: HashMap<String, u32> = HashMap::new();
    /// *map.get_or_default("Alice") += 150;
    /// assert_eq!(map["Alice"], 150);
    /// ```
    pub fn get_or_default<Q>(&mut self, key: &Q) -> &mut V
    where
        K: FromKeyView<Q>,
        Q: Eq + Hash + ?Sized,
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the map's key type, but
    /// [`Hash`] and [`Eq`] on the borrowed form *must* match those for
    /// the key type.
    #[inline]
    pub fn get<Q>(&self, k: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.search(k).map(|index| &self.table.entry(index).1)
    }

    /// Returns the key-value pair corresponding to the supplied key.
    pub fn get_key_value<Q>(&self, k: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.search(k).map(|index| {
            let (key, value) = self.table.entry(index);
            (key, value)
        })
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut<Q>(&mut self, k: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let index = self.search(k)?;
        Some(&mut self.table.entry_mut(index).1)
    }

    /// Like [`get`](Self::get), but reports a missing key as
    /// [`Error::KeyNotFound`].
    pub fn at<Q>(&self, k: &Q) -> Result<&V, Error>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.get(k).ok_or(Error::KeyNotFound)
    }

    /// Returns true if the map contains a value for the specified key.
    pub fn contains_key<Q>(&self, k: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.search(k).is_some()
    }

    /// Removes a key from the map, returning the value at the key if the key
    /// was previously in the map.
    pub fn remove<Q>(&mut self, k: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.remove_entry(k).map(|(_, v)| v)
    }

    /// Removes a key from the map, returning the stored key and value if the
    /// key was previously in the map.
    pub fn remove_entry<Q>(&mut self, k: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let index = self.search(k)?;
        Some(self.table.remove(index))
    }

    #[cfg(test)]
    fn assert_invariants(&self) {
        self.table.assert_invariants();
    }
}

impl<K, V, S> PartialEq for HashMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &HashMap<K, V, S>) -> bool {
        if self.len() != other.len() {
            return false;
        }

        self.iter()
            .all(|(key, value)| other.get(key).map_or(false, |v| *value == *v))
    }
}

impl<K, V, S> Eq for HashMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> Debug for HashMap<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Default for HashMap<K, V, S>
where
    S: Default,
{
    /// Creates an empty `HashMap<K, V, S>`, with the `Default` value for the hasher.
    fn default() -> HashMap<K, V, S> {
        HashMap::with_hasher(Default::default())
    }
}

impl<'a, K, Q, V, S> Index<&'a Q> for HashMap<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: Eq + Hash + ?Sized,
    S: BuildHasher,
{
    type Output = V;

    /// # Panics
    ///
    /// Panics if the key is not present in the `HashMap`.
    #[inline]
    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("key not found"),
        }
    }
}

/// An iterator over the entries of a `HashMap`.
///
/// This `struct` is created by the [`iter`](HashMap::iter) method.
pub struct Iter<'a, K: 'a, V: 'a> {
    inner: RawIter<'a, K, V>,
}

impl<'a, K, V> Clone for Iter<'a, K, V> {
    fn clone(&self) -> Iter<'a, K, V> {
        Iter {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K: Debug, V: Debug> Debug for Iter<'a, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// A mutable iterator over the entries of a `HashMap`.
///
/// This `struct` is created by the [`iter_mut`](HashMap::iter_mut) method.
pub struct IterMut<'a, K: 'a, V: 'a> {
    inner: RawIterMut<'a, K, V>,
}

/// An owning iterator over the entries of a `HashMap`.
///
/// This `struct` is created by the `into_iter` method on [`HashMap`].
pub struct IntoIter<K, V> {
    inner: RawIntoIter<K, V>,
}

/// An iterator over the keys of a `HashMap`.
pub struct Keys<'a, K: 'a, V: 'a> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Clone for Keys<'a, K, V> {
    fn clone(&self) -> Keys<'a, K, V> {
        Keys {
            inner: self.inner.clone(),
        }
    }
}

/// An iterator over the values of a `HashMap`.
pub struct Values<'a, K: 'a, V: 'a> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Clone for Values<'a, K, V> {
    fn clone(&self) -> Values<'a, K, V> {
        Values {
            inner: self.inner.clone(),
        }
    }
}

/// A mutable iterator over the values of a `HashMap`.
pub struct ValuesMut<'a, K: 'a, V: 'a> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V, S> IntoIterator for &'a HashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut HashMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

impl<K, V, S> IntoIterator for HashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    /// Creates a consuming iterator, that is, one that moves each key-value
    /// pair out of the map in slot order. The map cannot be used after
    /// calling this.
    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter {
            inner: self.table.into_entries(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        self.inner.next().map(|(k, v)| (k, v))
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> {}
impl<'a, K, V> FusedIterator for Iter<'a, K, V> {}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<(&'a K, &'a mut V)> {
        self.inner.next()
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
impl<'a, K, V> ExactSizeIterator for IterMut<'a, K, V> {}
impl<'a, K, V> FusedIterator for IterMut<'a, K, V> {}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<(K, V)> {
        self.inner.next()
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
impl<'a, K, V> ExactSizeIterator for Keys<'a, K, V> {}
impl<'a, K, V> FusedIterator for Keys<'a, K, V> {}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
impl<'a, K, V> ExactSizeIterator for Values<'a, K, V> {}
impl<'a, K, V> FusedIterator for Values<'a, K, V> {}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    #[inline]
    fn next(&mut self) -> Option<&'a mut V> {
        self.inner.next().map(|(_, v)| v)
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
impl<'a, K, V> ExactSizeIterator for ValuesMut<'a, K, V> {}
impl<'a, K, V> FusedIterator for ValuesMut<'a, K, V> {}

/// Collects pairs into a map. When a key repeats, the first value is kept.
impl<K, V, S> FromIterator<(K, V)> for HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> HashMap<K, V, S> {
        let mut map = HashMap::with_hasher(Default::default());
        map.extend(iter);
        map
    }
}

/// Adds pairs to a map. Keys already present keep their value, as do
/// repeated keys within `iter`.
impl<K, V, S> Extend<(K, V)> for HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        // Keys may be already present or show multiple times in the iterator.
        // Reserve the entire hint lower bound if the map is empty.
        // Otherwise reserve half the hint (rounded up), so the map
        // will only resize twice in the worst case.
        let iter = iter.into_iter();
        let reserve = if self.is_empty() {
            iter.size_hint().0
        } else {
            (iter.size_hint().0 + 1) / 2
        };
        self.reserve(reserve);
        for (k, v) in iter {
            self.try_insert(k, v);
        }
    }
}

impl<'a, K, V, S> Extend<(&'a K, &'a V)> for HashMap<K, V, S>
where
    K: Eq + Hash + Copy,
    V: Copy,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: T) {
        self.extend(iter.into_iter().map(|(&key, &value)| (key, value)));
    }
}

impl<K, V, S, const N: usize> From<[(K, V); N]> for HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    /// ```
    /// use flat_hashmap::HashMap;
    ///
    /// let map: HashMap<&str, u32> = HashMap::from([("Mike", 120), ("Lily", 1000)]);
    /// assert_eq!(map["Lily"], 1000);
    /// ```
    fn from(arr: [(K, V); N]) -> HashMap<K, V, S> {
        arr.into_iter().collect()
    }
}

#[cfg(test)]
mod test_map {
    use super::*;
    use crate::hasher::IntBuildHasher;
    use std::cell::{Cell, RefCell};
    use std::hash::Hasher;

    #[test]
    fn test_zero_capacities() {
        type HM = HashMap<i32, i32>;

        let m = HM::new();
        assert_eq!(m.capacity(), 0);

        let m = HM::default();
        assert_eq!(m.capacity(), 0);

        let m = HM::with_hasher(DefaultBuildHasher::default());
        assert_eq!(m.capacity(), 0);

        let m = HM::with_capacity(0);
        assert_eq!(m.capacity(), 0);

        let mut m = HM::new();
        m.insert(1, 1);
        m.insert(2, 2);
        m.remove(&1);
        m.remove(&2);
        assert_eq!(m.capacity(), INITIAL_CAPACITY);
    }

    #[test]
    fn test_create_capacity_zero() {
        let mut m = HashMap::with_capacity(0);

        assert!(m.insert(1, 1).is_none());

        assert!(m.contains_key(&1));
        assert!(!m.contains_key(&0));
    }

    #[test]
    fn test_insert() {
        let mut m = HashMap::new();
        assert_eq!(m.len(), 0);
        assert!(m.insert(1, 2).is_none());
        assert_eq!(m.len(), 1);
        assert!(m.insert(2, 4).is_none());
        assert_eq!(m.len(), 2);
        assert_eq!(*m.get(&1).unwrap(), 2);
        assert_eq!(*m.get(&2).unwrap(), 4);
    }

    thread_local! { static DROP_VECTOR: RefCell<Vec<i32>> = RefCell::new(Vec::new()) }

    #[derive(Hash, PartialEq, Eq)]
    struct Droppable {
        k: usize,
    }

    impl Droppable {
        fn new(k: usize) -> Droppable {
            DROP_VECTOR.with(|slot| {
                slot.borrow_mut()[k] += 1;
            });

            Droppable { k }
        }
    }

    impl Drop for Droppable {
        fn drop(&mut self) {
            DROP_VECTOR.with(|slot| {
                slot.borrow_mut()[self.k] -= 1;
            });
        }
    }

    fn live(k: usize) -> i32 {
        DROP_VECTOR.with(|v| v.borrow()[k])
    }

    #[test]
    fn test_drops() {
        DROP_VECTOR.with(|slot| {
            *slot.borrow_mut() = vec![0; 200];
        });

        {
            let mut m = HashMap::new();

            for i in 0..100 {
                let d1 = Droppable::new(i);
                let d2 = Droppable::new(i + 100);
                m.insert(d1, d2);
            }
            m.assert_invariants();

            for i in 0..200 {
                assert_eq!(live(i), 1);
            }

            for i in 0..50 {
                let k = Droppable::new(i);
                let v = m.remove(&k);

                assert!(v.is_some());

                assert_eq!(live(i), 1);
                assert_eq!(live(i + 100), 1);
            }
            m.assert_invariants();

            for i in 0..50 {
                assert_eq!(live(i), 0);
                assert_eq!(live(i + 100), 0);
            }

            for i in 50..100 {
                assert_eq!(live(i), 1);
                assert_eq!(live(i + 100), 1);
            }
        }

        for i in 0..200 {
            assert_eq!(live(i), 0);
        }
    }

    #[test]
    fn test_overwrite_and_clear_drop() {
        DROP_VECTOR.with(|slot| {
            *slot.borrow_mut() = vec![0; 20];
        });

        let mut m = HashMap::new();
        for i in 0..10 {
            m.insert(i, Droppable::new(i));
        }
        let old = m.insert(3, Droppable::new(13));
        assert_eq!(old.map(|d| d.k), Some(3));
        assert_eq!(live(3), 0);
        assert_eq!(live(13), 1);

        // a rejected try_insert drops the offered value, not the stored one
        let (kept, inserted) = m.try_insert(4, Droppable::new(14));
        assert!(!inserted);
        assert_eq!(kept.k, 4);
        assert_eq!(live(14), 0);

        m.clear();
        assert!(m.is_empty());
        assert_eq!(m.capacity(), 12);
        for i in 0..20 {
            assert_eq!(live(i), 0);
        }
    }

    #[test]
    fn test_into_iter_drops() {
        DROP_VECTOR.with(|v| {
            *v.borrow_mut() = vec![0; 200];
        });

        let hm = {
            let mut hm = HashMap::new();

            for i in 0..100 {
                let d1 = Droppable::new(i);
                let d2 = Droppable::new(i + 100);
                hm.insert(d1, d2);
            }

            hm
        };

        {
            let mut half = hm.into_iter().take(50);

            for i in 0..200 {
                assert_eq!(live(i), 1);
            }

            for _ in half.by_ref() {}

            let nk = (0..100).filter(|&i| live(i) == 1).count();
            let nv = (0..100).filter(|&i| live(i + 100) == 1).count();

            assert_eq!(nk, 50);
            assert_eq!(nv, 50);
        };

        for i in 0..200 {
            assert_eq!(live(i), 0);
        }
    }

    #[test]
    fn test_empty_remove() {
        let mut m: HashMap<i32, bool> = HashMap::new();
        assert_eq!(m.remove(&0), None);
    }

    #[test]
    fn test_empty_iter() {
        let mut m: HashMap<i32, bool> = HashMap::new();
        assert_eq!(m.keys().next(), None);
        assert_eq!(m.values().next(), None);
        assert_eq!(m.values_mut().next(), None);
        assert_eq!(m.iter().next(), None);
        assert_eq!(m.iter_mut().next(), None);
        assert_eq!(m.len(), 0);
        assert!(m.is_empty());
        assert_eq!(m.into_iter().next(), None);
    }

    #[test]
    fn test_lots_of_insertions() {
        let mut m = HashMap::with_hasher(IntBuildHasher::default());

        // Try this a few times to make sure we never screw up the hashmap's
        // internal state.
        for _ in 0..10 {
            assert!(m.is_empty());

            for i in 1..1001 {
                assert!(m.insert(i, i).is_none());

                for j in 1..i + 1 {
                    let r = m.get(&j);
                    assert_eq!(r, Some(&j));
                }

                for j in i + 1..1001 {
                    let r = m.get(&j);
                    assert_eq!(r, None);
                }
            }
            m.assert_invariants();

            for i in 1001..2001 {
                assert!(!m.contains_key(&i));
            }

            // remove forwards
            for i in 1..1001 {
                assert!(m.remove(&i).is_some());

                for j in 1..i + 1 {
                    assert!(!m.contains_key(&j));
                }

                for j in i + 1..1001 {
                    assert!(m.contains_key(&j));
                }
            }
            m.assert_invariants();

            for i in 1..1001 {
                assert!(!m.contains_key(&i));
            }

            for i in 1..1001 {
                assert!(m.insert(i, i).is_none());
            }

            // remove backwards
            for i in (1..1001).rev() {
                assert!(m.remove(&i).is_some());

                for j in i..1001 {
                    assert!(!m.contains_key(&j));
                }

                for j in 1..i {
                    assert!(m.contains_key(&j));
                }
            }
        }
    }

    #[test]
    fn test_find_mut() {
        let mut m = HashMap::new();
        assert!(m.insert(1, 12).is_none());
        assert!(m.insert(2, 8).is_none());
        assert!(m.insert(5, 14).is_none());
        let new = 100;
        match m.get_mut(&5) {
            None => panic!(),
            Some(x) => *x = new,
        }
        assert_eq!(m.get(&5), Some(&new));
    }

    #[test]
    fn test_insert_overwrite() {
        let mut m = HashMap::new();
        assert!(m.insert(1, 2).is_none());
        assert_eq!(*m.get(&1).unwrap(), 2);
        assert_eq!(m.insert(1, 3), Some(2));
        assert_eq!(*m.get(&1).unwrap(), 3);
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn test_overwrite_never_grows() {
        let mut m = HashMap::new();
        for i in 0..7 {
            m.insert(i, i);
        }
        assert_eq!(m.capacity(), 8);
        for i in 0..7 {
            assert_eq!(m.insert(i, i + 1), Some(i));
            assert!(!m.try_insert(i, 0).1);
            *m.get_or_default(&i) += 1;
        }
        assert_eq!(m.capacity(), 8);
        m.insert(7, 7);
        assert_eq!(m.capacity(), 12);
    }

    #[test]
    fn test_is_empty() {
        let mut m = HashMap::with_capacity(4);
        assert!(m.insert(1, 2).is_none());
        assert!(!m.is_empty());
        assert!(m.remove(&1).is_some());
        assert!(m.is_empty());
    }

    #[test]
    fn test_remove() {
        let mut m = HashMap::new();
        m.insert(1, 2);
        assert_eq!(m.remove(&1), Some(2));
        assert_eq!(m.remove(&1), None);
    }

    #[test]
    fn test_remove_entry() {
        let mut m = HashMap::new();
        m.insert(1, 2);
        assert_eq!(m.remove_entry(&1), Some((1, 2)));
        assert_eq!(m.remove(&1), None);
    }

    #[test]
    fn test_iterate() {
        let mut m = HashMap::with_capacity(4);
        for i in 0..32 {
            assert!(m.insert(i, i * 2).is_none());
        }
        assert_eq!(m.len(), 32);

        let mut observed: u32 = 0;

        for (k, v) in &m {
            assert_eq!(*v, *k * 2);
            observed |= 1 << *k;
        }
        assert_eq!(observed, 0xFFFF_FFFF);
    }

    #[test]
    fn test_keys() {
        let vec = vec![(1, 'a'), (2, 'b'), (3, 'c')];
        let map: HashMap<_, _> = vec.into_iter().collect();
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys.len(), 3);
        assert!(keys.contains(&1));
        assert!(keys.contains(&2));
        assert!(keys.contains(&3));
    }

    #[test]
    fn test_values() {
        let vec = vec![(1, 'a'), (2, 'b'), (3, 'c')];
        let map: HashMap<_, _> = vec.into_iter().collect();
        let values: Vec<_> = map.values().cloned().collect();
        assert_eq!(values.len(), 3);
        assert!(values.contains(&'a'));
        assert!(values.contains(&'b'));
        assert!(values.contains(&'c'));
    }

    #[test]
    fn test_values_mut() {
        let vec = vec![(1, 1), (2, 2), (3, 3)];
        let mut map: HashMap<_, _> = vec.into_iter().collect();
        for value in map.values_mut() {
            *value = (*value) * 2
        }
        let values: Vec<_> = map.values().cloned().collect();
        assert_eq!(values.len(), 3);
        assert!(values.contains(&2));
        assert!(values.contains(&4));
        assert!(values.contains(&6));
    }

    #[test]
    fn test_find() {
        let mut m = HashMap::new();
        assert!(m.get(&1).is_none());
        m.insert(1, 2);
        match m.get(&1) {
            None => panic!(),
            Some(v) => assert_eq!(*v, 2),
        }
    }

    #[test]
    fn test_eq() {
        let mut m1 = HashMap::new();
        m1.insert(1, 2);
        m1.insert(2, 3);
        m1.insert(3, 4);

        let mut m2 = HashMap::new();
        m2.insert(1, 2);
        m2.insert(2, 3);

        assert!(m1 != m2);

        m2.insert(3, 4);

        assert_eq!(m1, m2);
    }

    #[test]
    fn test_show() {
        let mut map = HashMap::new();
        let empty: HashMap<i32, i32> = HashMap::new();

        map.insert(1, 2);
        map.insert(3, 4);

        let map_str = format!("{:?}", map);

        assert!(map_str == "{1: 2, 3: 4}" || map_str == "{3: 4, 1: 2}");
        assert_eq!(format!("{:?}", empty), "{}");
    }

    #[test]
    fn test_resize_policy() {
        let mut m = HashMap::new();

        assert_eq!(m.len(), 0);
        assert_eq!(m.capacity(), 0);
        assert!(m.is_empty());

        m.insert(0, 0);
        m.remove(&0);
        assert!(m.is_empty());
        let initial_raw_cap = m.capacity();
        assert_eq!(initial_raw_cap, INITIAL_CAPACITY);

        let mut caps = vec![initial_raw_cap];
        for i in 0..1000 {
            m.insert(i, i);
            if *caps.last().unwrap() != m.capacity() {
                caps.push(m.capacity());
            }
            assert!(m.len() <= m.capacity() * 7 / 8);
        }
        assert_eq!(&caps[..6], &[8, 12, 18, 27, 40, 60]);

        // removing never shrinks
        let cap = m.capacity();
        for i in 0..1000 {
            m.remove(&i);
        }
        assert_eq!(m.capacity(), cap);
        m.assert_invariants();
    }

    #[test]
    fn test_reserve() {
        let mut m: HashMap<u32, u32> = HashMap::new();
        m.reserve(7);
        assert_eq!(m.capacity(), 8);
        m.reserve(8);
        assert_eq!(m.capacity(), 12);
        for i in 0..10 {
            m.insert(i, i);
        }
        assert_eq!(m.capacity(), 12);

        let m: HashMap<u32, u32> = HashMap::with_capacity(100);
        assert_eq!(m.capacity(), 135);
    }

    #[test]
    fn test_try_reserve() {
        let mut empty_bytes: HashMap<u8, u8> = HashMap::new();

        assert_eq!(
            empty_bytes.try_reserve(usize::MAX),
            Err(Error::CapacityOverflow)
        );
        assert_eq!(
            empty_bytes.try_reserve(MAX_CAPACITY),
            Err(Error::CapacityOverflow)
        );
        assert_eq!(empty_bytes.capacity(), 0);

        empty_bytes.insert(1, 1);
        assert_eq!(
            empty_bytes.try_reserve(usize::MAX),
            Err(Error::CapacityOverflow)
        );
        assert_eq!(empty_bytes.get(&1), Some(&1));
        assert_eq!(empty_bytes.try_reserve(100), Ok(()));
        assert_eq!(empty_bytes.get(&1), Some(&1));
    }

    #[test]
    #[should_panic(expected = "capacity overflow")]
    fn test_reserve_overflow() {
        let mut m: HashMap<u8, u8> = HashMap::new();
        m.reserve(usize::MAX);
    }

    #[test]
    fn test_from_iter_keeps_first_value() {
        let xs = [(1, 1), (2, 2), (2, 20), (3, 3), (1, 10)];

        let map: HashMap<_, _> = xs.iter().cloned().collect();

        assert_eq!(map.len(), 3);
        assert_eq!(map.get(&1), Some(&1));
        assert_eq!(map.get(&2), Some(&2));
        assert_eq!(map.get(&3), Some(&3));
    }

    #[test]
    fn test_size_hint() {
        let xs = [(1, 1), (2, 2), (3, 3), (4, 4), (5, 5), (6, 6)];

        let map: HashMap<_, _> = xs.iter().cloned().collect();

        let mut iter = map.iter();

        for _ in iter.by_ref().take(3) {}

        assert_eq!(iter.size_hint(), (3, Some(3)));
        assert_eq!(iter.len(), 3);
    }

    #[test]
    fn test_iter_mut_len() {
        let xs = [(1, 1), (2, 2), (3, 3), (4, 4), (5, 5), (6, 6)];

        let mut map: HashMap<_, _> = xs.iter().cloned().collect();

        let mut iter = map.iter_mut();

        for _ in iter.by_ref().take(3) {}

        assert_eq!(iter.len(), 3);
    }

    #[test]
    fn test_index() {
        let mut map = HashMap::new();

        map.insert(1, 2);
        map.insert(2, 1);
        map.insert(3, 4);

        assert_eq!(map[&2], 1);
    }

    #[test]
    #[should_panic(expected = "key not found")]
    fn test_index_nonexistent() {
        let mut map = HashMap::new();

        map.insert(1, 2);
        map.insert(2, 1);
        map.insert(3, 4);

        map[&4];
    }

    #[test]
    fn test_at() {
        let map: HashMap<&str, i32> = HashMap::from([("a", 1)]);
        assert_eq!(map.at("a"), Ok(&1));
        assert_eq!(map.at("b"), Err(Error::KeyNotFound));
    }

    #[test]
    fn test_extend_ref() {
        let mut a = HashMap::new();
        a.insert(1, "one");
        let mut b = HashMap::new();
        b.insert(2, "two");
        b.insert(3, "three");
        b.insert(1, "uno");

        a.extend(&b);

        assert_eq!(a.len(), 3);
        assert_eq!(a[&1], "one");
        assert_eq!(a[&2], "two");
        assert_eq!(a[&3], "three");
    }

    #[test]
    fn test_take_empties_source() {
        let mut a: HashMap<String, u32> = (0..50).map(|i| (i.to_string(), i)).collect();
        let b = mem::take(&mut a);

        assert_eq!(a.len(), 0);
        assert_eq!(a.capacity(), 0);
        assert_eq!(a.get("3"), None);
        assert_eq!(b.len(), 50);
        for i in 0..50 {
            assert_eq!(b[i.to_string().as_str()], i);
        }
    }

    #[test]
    fn test_get_or_insert_with_builds_key_on_miss_only() {
        let mut map: HashMap<TinyString, u32> = HashMap::new();
        let calls = Cell::new(0);
        let make = |v: u32| {
            calls.set(calls.get() + 1);
            v
        };
        *map.get_or_insert_with("Alice", || make(100)) += 1;
        *map.get_or_insert_with("Alice", || make(999)) += 1;
        assert_eq!(calls.get(), 1);
        assert_eq!(map["Alice"], 102);
        assert!(map.keys().next().unwrap().is_inline());
    }

    #[test]
    fn test_get_key_value() {
        let mut map: HashMap<String, u32> = HashMap::new();
        map.insert("key".to_string(), 7);
        let (k, v) = map.get_key_value("key").unwrap();
        assert_eq!(k, "key");
        assert_eq!(*v, 7);
    }

    thread_local! { static HASH_CALLS: Cell<usize> = Cell::new(0) }

    #[derive(PartialEq, Eq)]
    struct CountedKey(u32);

    impl Hash for CountedKey {
        fn hash<H: Hasher>(&self, state: &mut H) {
            HASH_CALLS.with(|c| c.set(c.get() + 1));
            self.0.hash(state);
        }
    }

    #[test]
    fn test_growth_does_not_rehash_keys() {
        HASH_CALLS.with(|c| c.set(0));
        let mut map = HashMap::with_hasher(IntBuildHasher::default());
        for i in 0..1000 {
            map.insert(CountedKey(i), i);
        }
        assert!(map.capacity() > 1000);
        assert_eq!(HASH_CALLS.with(Cell::get), 1000);
        map.assert_invariants();
    }

    #[test]
    fn test_probe_stats() {
        let mut map = HashMap::with_hasher(IntBuildHasher::default());
        assert_eq!(map.probe_stats(), ProbeStats::default());
        for i in 0..10_000u64 {
            map.insert(i, ());
        }
        let stats = map.probe_stats();
        assert!(stats.max_displacement > 0);
        assert!(stats.total_displacement < 10_000 * 8);
        assert!(stats.max_displacement < 200);
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HashMap<String, Vec<u8>>>();
        assert_send_sync::<FixedMap<&'static str, u32, 5>>();
    }
}
