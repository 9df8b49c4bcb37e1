//! Hash functions for map keys.
//!
//! [`HashMap`](crate::HashMap) hashes through [`BuildHasher`](std::hash::BuildHasher), so any hasher
//! works. The ones here are the defaults:
//!
//! - [`DefaultBuildHasher`]: FNV-1a 64 from the `fnv` crate, fast for short
//!   string keys.
//! - [`IntBuildHasher`]: a SplitMix64 finalizer for integer keys, whose raw
//!   values are usually too regular for multiply-shift bucket selection.
//!
//! [`fnv1a_64`] and [`mix64`] are `const fn` versions of the same functions,
//! used by [`FixedMap`](crate::FixedMap) during constant evaluation.
//!
//! Heterogeneous lookup follows [`Borrow`](std::borrow::Borrow): a key type may
//! be queried through any borrowed view (`TinyString` or `String` through
//! `&str`) as long as the view hashes and compares exactly like the key.

use std::hash::{BuildHasherDefault, Hasher};

/// Hash builder used by [`HashMap`](crate::HashMap) unless another is given.
pub type DefaultBuildHasher = fnv::FnvBuildHasher;

/// A builder for [`IntHasher`].
pub type IntBuildHasher = BuildHasherDefault<IntHasher>;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a over `bytes`.
///
/// ```
/// use flat_hashmap::hasher::fnv1a_64;
///
/// assert_eq!(fnv1a_64(b""), 0xcbf2_9ce4_8422_2325);
/// assert_eq!(fnv1a_64(b"a"), 0xaf63_dc4c_8601_ec8c);
/// ```
pub const fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// SplitMix64 finalizer: spreads every input bit over the whole output.
pub const fn mix64(value: u64) -> u64 {
    let mut hash = value.wrapping_add(0x9e37_79b9_7f4a_7c15);
    hash = (hash ^ (hash >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    hash = (hash ^ (hash >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    hash ^ (hash >> 31)
}

/// Hasher for integer keys.
///
/// A single integer write finishes as `mix64(value)`. Byte writes (strings,
/// slices) are folded FNV-style first, so the hasher stays usable for any
/// `Hash` type, but it is meant for integers.
#[derive(Debug, Clone, Default)]
pub struct IntHasher(u64);

impl IntHasher {
    #[inline]
    fn add(&mut self, value: u64) {
        self.0 = self.0.rotate_left(5) ^ value;
    }
}

impl Hasher for IntHasher {
    #[inline]
    fn finish(&self) -> u64 {
        mix64(self.0)
    }

    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        let mut hash = self.0;
        for &byte in bytes {
            hash = (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME);
        }
        self.0 = hash;
    }

    #[inline]
    fn write_u8(&mut self, i: u8) {
        self.add(u64::from(i));
    }

    #[inline]
    fn write_u16(&mut self, i: u16) {
        self.add(u64::from(i));
    }

    #[inline]
    fn write_u32(&mut self, i: u32) {
        self.add(u64::from(i));
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.add(i);
    }

    #[inline]
    fn write_usize(&mut self, i: usize) {
        self.add(i as u64);
    }
}
