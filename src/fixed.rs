//! A read-only Robin Hood map that is built during constant evaluation.

use std::fmt::{self, Debug};
use std::iter::FusedIterator;
use std::mem::MaybeUninit;
use std::ops::Index;
use std::slice;

use crate::error::Error;
use crate::hasher::{fnv1a_64, mix64};
use crate::probe::{fixed_capacity, fragment, ideal_bucket, next_index, Control};

/// A map whose entries are fixed when it is built, usually in a `const` or
/// `static` initializer.
///
/// Entries are stored inline, in `CAP` slots, without any allocation. `CAP`
/// must be [`fixed_capacity`] of the number of entries, which keeps the load
/// at or below 7/8; the [`fixed_map!`](crate::fixed_map) macro computes it.
///
/// Construction and lookup are `const fn` for `&'static str`,
/// `&'static [u8]`, the primitive integers, `char` and `bool` keys. Keys and
/// values are `Copy`.
///
/// ```
/// use flat_hashmap::{fixed_map, FixedMap};
///
/// const LEVELS: FixedMap<&str, u32, 5> = fixed_map!(&str, u32;
///     "trace" => 0,
///     "debug" => 1,
///     "info" => 2,
///     "warn" => 3,
/// );
/// const INFO: u32 = LEVELS.value("info");
///
/// assert_eq!(INFO, 2);
/// assert_eq!(LEVELS.get("error"), None);
/// assert_eq!(LEVELS["warn"], 3);
/// ```
///
/// A repeated key fails constant evaluation:
///
/// ```compile_fail
/// use flat_hashmap::{fixed_map, FixedMap};
///
/// const BAD: FixedMap<&str, u32, 3> = fixed_map!(&str, u32; "a" => 1, "a" => 2);
/// ```
pub struct FixedMap<K, V, const CAP: usize> {
    controls: [Control; CAP],
    slots: [MaybeUninit<(K, V)>; CAP],
    len: usize,
}

impl<K: Copy, V: Copy, const CAP: usize> Clone for FixedMap<K, V, CAP> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: Copy, V: Copy, const CAP: usize> Copy for FixedMap<K, V, CAP> {}

impl<K, V, const CAP: usize> FixedMap<K, V, CAP> {
    /// The number of entries.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the map has no entries.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The number of slots, `CAP`.
    #[inline]
    pub const fn capacity(&self) -> usize {
        CAP
    }

    /// An iterator over the entries in slot order.
    pub fn iter(&self) -> FixedIter<'_, K, V> {
        FixedIter {
            controls: self.controls.iter(),
            slots: self.slots.iter(),
            remaining: self.len,
        }
    }
}

/// `a == b` for byte slices, usable in `const fn`.
const fn bytes_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

// Inherent impls per key type: hashing and equality have to be `const fn`,
// which generic `Hash`/`Eq` bounds cannot express.
macro_rules! const_key_impls {
    ($($key:ty => $query:ty, |$k:ident| $hash:expr, |$a:ident, $b:ident| $eq:expr;)*) => {$(
        impl<V: Copy, const CAP: usize> FixedMap<$key, V, CAP> {
            #[inline]
            const fn hash_key($k: $query) -> u64 {
                $hash
            }

            #[inline]
            const fn key_eq($a: $query, $b: $query) -> bool {
                $eq
            }

            /// Builds the map, or reports [`Error::DuplicateKey`] if a key
            /// repeats.
            ///
            /// # Panics
            ///
            /// Panics if `CAP` is not `fixed_capacity(entries.len())`.
            pub const fn try_new(entries: &[($key, V)]) -> Result<Self, Error> {
                if CAP != fixed_capacity(entries.len()) {
                    panic!("fixed map capacity must be fixed_capacity(entries.len())");
                }

                let mut controls = [Control::EMPTY; CAP];
                let mut slots = [MaybeUninit::<($key, V)>::uninit(); CAP];

                let mut i = 0;
                while i < entries.len() {
                    let mut kv = entries[i];
                    let mut ctrl = Control::new(fragment(Self::hash_key(kv.0)), 0);
                    let mut index = ideal_bucket(ctrl.hash, CAP);

                    loop {
                        let resident = controls[index];
                        if resident.is_empty() {
                            controls[index] = ctrl;
                            slots[index] = MaybeUninit::new(kv);
                            break;
                        }
                        // SAFETY: the control is full.
                        let stored = unsafe { *slots[index].assume_init_ref() };
                        if resident.hash == ctrl.hash && Self::key_eq(stored.0, kv.0) {
                            return Err(Error::DuplicateKey);
                        }
                        if resident.dib < ctrl.dib {
                            controls[index] = ctrl;
                            slots[index] = MaybeUninit::new(kv);
                            ctrl = resident;
                            kv = stored;
                        }
                        index = next_index(index, CAP);
                        ctrl.dib += 1;
                    }
                    i += 1;
                }

                Ok(FixedMap {
                    controls,
                    slots,
                    len: entries.len(),
                })
            }

            /// Builds the map.
            ///
            /// # Panics
            ///
            /// Panics if a key repeats or `CAP` is not
            /// `fixed_capacity(entries.len())`. In a `const` initializer
            /// either is a compile error.
            pub const fn new(entries: &[($key, V)]) -> Self {
                match Self::try_new(entries) {
                    Ok(map) => map,
                    Err(_) => panic!("duplicate keys are not allowed"),
                }
            }

            /// Returns a reference to the value for `key`.
            pub const fn get(&self, key: $query) -> Option<&V> {
                if self.len == 0 {
                    return None;
                }
                let hash = fragment(Self::hash_key(key));
                let mut index = ideal_bucket(hash, CAP);
                let mut dib = 0;

                loop {
                    let resident = self.controls[index];
                    if resident.is_empty() || resident.dib < dib {
                        return None;
                    }
                    if resident.hash == hash {
                        // SAFETY: the control is full.
                        let kv = unsafe { self.slots[index].assume_init_ref() };
                        if Self::key_eq(kv.0, key) {
                            return Some(&kv.1);
                        }
                    }
                    index = next_index(index, CAP);
                    dib += 1;
                }
            }

            /// Whether `key` has an entry.
            pub const fn contains_key(&self, key: $query) -> bool {
                self.get(key).is_some()
            }

            /// Returns a copy of the value for `key`.
            ///
            /// # Panics
            ///
            /// Panics if the key is absent; a compile error in `const`
            /// context.
            pub const fn value(&self, key: $query) -> V {
                match self.get(key) {
                    Some(value) => *value,
                    None => panic!("key not found"),
                }
            }
        }

        impl<V: Copy, const CAP: usize> Index<$query> for FixedMap<$key, V, CAP> {
            type Output = V;

            fn index(&self, key: $query) -> &V {
                match self.get(key) {
                    Some(value) => value,
                    None => panic!("key not found"),
                }
            }
        }
    )*};
}

const_key_impls! {
    &'static str => &str, |k| fnv1a_64(k.as_bytes()), |a, b| bytes_eq(a.as_bytes(), b.as_bytes());
    &'static [u8] => &[u8], |k| fnv1a_64(k), |a, b| bytes_eq(a, b);
    u8 => u8, |k| mix64(k as u64), |a, b| a == b;
    u16 => u16, |k| mix64(k as u64), |a, b| a == b;
    u32 => u32, |k| mix64(k as u64), |a, b| a == b;
    u64 => u64, |k| mix64(k), |a, b| a == b;
    usize => usize, |k| mix64(k as u64), |a, b| a == b;
    i8 => i8, |k| mix64(k as u64), |a, b| a == b;
    i16 => i16, |k| mix64(k as u64), |a, b| a == b;
    i32 => i32, |k| mix64(k as u64), |a, b| a == b;
    i64 => i64, |k| mix64(k as u64), |a, b| a == b;
    isize => isize, |k| mix64(k as u64), |a, b| a == b;
    char => char, |k| mix64(k as u64), |a, b| a == b;
    bool => bool, |k| mix64(k as u64), |a, b| a == b;
}

/// Builds a [`FixedMap`] from `key => value` pairs, computing its capacity.
///
/// The key and value types come first because every supported key type has
/// its own `new`.
///
/// ```
/// use flat_hashmap::fixed_map;
///
/// static PORTS: flat_hashmap::FixedMap<&str, u16, 3> = fixed_map!(&str, u16;
///     "http" => 80,
///     "https" => 443,
/// );
/// assert_eq!(PORTS.get("https"), Some(&443));
/// ```
#[macro_export]
macro_rules! fixed_map {
    (@unit $($t:tt)*) => {
        ()
    };
    ($key:ty, $value:ty; $($k:expr => $v:expr),* $(,)?) => {
        $crate::FixedMap::<
            $key,
            $value,
            { $crate::fixed_capacity(<[()]>::len(&[$($crate::fixed_map!(@unit $k)),*])) },
        >::new(&[$(($k, $v)),*])
    };
}

impl<K: Debug, V: Debug, const CAP: usize> Debug for FixedMap<K, V, CAP> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, const CAP: usize> IntoIterator for &'a FixedMap<K, V, CAP> {
    type Item = (&'a K, &'a V);
    type IntoIter = FixedIter<'a, K, V>;

    fn into_iter(self) -> FixedIter<'a, K, V> {
        self.iter()
    }
}

/// Iterator over the entries of a [`FixedMap`].
pub struct FixedIter<'a, K, V> {
    controls: slice::Iter<'a, Control>,
    slots: slice::Iter<'a, MaybeUninit<(K, V)>>,
    remaining: usize,
}

impl<'a, K, V> Clone for FixedIter<'a, K, V> {
    fn clone(&self) -> Self {
        FixedIter {
            controls: self.controls.clone(),
            slots: self.slots.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for FixedIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        if self.remaining == 0 {
            return None;
        }
        loop {
            let ctrl = self.controls.next()?;
            let slot = self.slots.next()?;
            if !ctrl.is_empty() {
                self.remaining -= 1;
                // SAFETY: the control is full.
                let (k, v) = unsafe { slot.assume_init_ref() };
                return Some((k, v));
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> ExactSizeIterator for FixedIter<'a, K, V> {}
impl<'a, K, V> FusedIterator for FixedIter<'a, K, V> {}
