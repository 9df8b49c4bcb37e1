//! Control metadata and probe arithmetic shared by the growable
//! [`HashMap`](crate::HashMap) and the const [`FixedMap`](crate::FixedMap).
//!
//! Everything here is a `const fn` so the fixed map can run the same
//! placement rules during constant evaluation.

/// Displacement value reserved to mark an empty slot.
pub(crate) const EMPTY_DIB: u32 = u32::MAX;

/// Slot count of the first allocation of a growable table.
pub(crate) const INITIAL_CAPACITY: usize = 8;

/// Largest slot count a table can have. Displacements are stored as `u32`
/// and `u32::MAX` is the empty marker, so every displacement must stay below it.
pub(crate) const MAX_CAPACITY: usize = EMPTY_DIB as usize;

/// Metadata for one slot: the high half of the key's hash and the distance
/// from the slot to the key's ideal bucket ("DIB").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Control {
    pub(crate) hash: u32,
    pub(crate) dib: u32,
}

impl Control {
    pub(crate) const EMPTY: Control = Control {
        hash: 0,
        dib: EMPTY_DIB,
    };

    #[inline]
    pub(crate) const fn new(hash: u32, dib: u32) -> Control {
        Control { hash, dib }
    }

    #[inline]
    pub(crate) const fn is_empty(&self) -> bool {
        self.dib == EMPTY_DIB
    }
}

/// The part of a 64-bit hash kept in the control array. The high bits are
/// kept because they also pick the ideal bucket.
#[inline]
pub(crate) const fn fragment(hash: u64) -> u32 {
    (hash >> 32) as u32
}

/// Multiply-shift reduction of a fragment onto `0..capacity`.
#[inline]
pub(crate) const fn ideal_bucket(fragment: u32, capacity: usize) -> usize {
    ((fragment as u64 * capacity as u64) >> 32) as usize
}

#[inline]
pub(crate) const fn next_index(index: usize, capacity: usize) -> usize {
    if index + 1 == capacity {
        0
    } else {
        index + 1
    }
}

/// Number of entries a table of `capacity` slots may hold: `capacity * 7 / 8`,
/// computed without overflowing.
#[inline]
pub(crate) const fn max_load(capacity: usize) -> usize {
    capacity / 8 * 7 + capacity % 8 * 7 / 8
}

/// Slot count of a [`FixedMap`](crate::FixedMap) holding `len` entries:
/// `ceil(len * 8 / 7)`, the smallest capacity whose load stays at or below 7/8.
///
/// ```
/// use flat_hashmap::fixed_capacity;
///
/// assert_eq!(fixed_capacity(0), 0);
/// assert_eq!(fixed_capacity(4), 5);
/// assert_eq!(fixed_capacity(7), 8);
/// ```
pub const fn fixed_capacity(len: usize) -> usize {
    len / 7 * 8 + (len % 7 * 8 + 6) / 7
}
