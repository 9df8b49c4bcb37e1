// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::alloc::{self, Layout};
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::mem::{self, MaybeUninit};
use std::ptr::NonNull;
use std::slice;

use crate::error::Error;
use crate::probe::{self, Control};

use self::Fallibility::*;

/// Storage for one key-value pair.
///
/// A slot never knows whether it holds a value; the paired `Control` entry
/// does. Every method is unsafe for that reason: the caller vouches for the
/// slot's state.
#[repr(transparent)]
pub(crate) struct Slot<K, V>(MaybeUninit<(K, V)>);

impl<K, V> Slot<K, V> {
    /// The slot must be vacant.
    #[inline]
    unsafe fn write(&mut self, kv: (K, V)) {
        self.0 = MaybeUninit::new(kv);
    }

    /// The slot must be full; it is vacant afterwards.
    #[inline]
    unsafe fn take(&mut self) -> (K, V) {
        self.0.assume_init_read()
    }

    /// The slot must be full.
    #[inline]
    unsafe fn replace(&mut self, kv: (K, V)) -> (K, V) {
        mem::replace(self.0.assume_init_mut(), kv)
    }

    /// The slot must be full.
    #[inline]
    unsafe fn get(&self) -> &(K, V) {
        self.0.assume_init_ref()
    }

    /// The slot must be full.
    #[inline]
    unsafe fn get_mut(&mut self) -> &mut (K, V) {
        self.0.assume_init_mut()
    }

    /// The slot must be full; it is vacant afterwards.
    #[inline]
    unsafe fn destroy(&mut self) {
        self.0.assume_init_drop()
    }
}

// Returns a Layout which describes the allocation required for a table,
// and the offset of the array of slots in the allocation.
fn calculate_layout<K, V>(capacity: usize) -> Result<(Layout, usize), Error> {
    let controls = Layout::array::<Control>(capacity).map_err(|_| Error::CapacityOverflow)?;
    let slots = Layout::array::<Slot<K, V>>(capacity).map_err(|_| Error::CapacityOverflow)?;
    let (layout, slots_offset) = controls
        .extend(slots)
        .map_err(|_| Error::CapacityOverflow)?;
    Ok((layout.pad_to_align(), slots_offset))
}

pub(crate) enum Fallibility {
    Fallible,
    Infallible,
}

/// Outcome of walking a probe sequence with [`RawTable::probe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Probe {
    /// The key lives at this index.
    Occupied(usize),
    /// The run ended at an empty slot; a new entry goes there with `dib`.
    Vacant { index: usize, dib: u32 },
    /// The resident at `index` sits closer to its ideal bucket than `dib`,
    /// so the key is absent and a new entry would take this slot over.
    Steal { index: usize, dib: u32 },
}

/// The raw hashtable: an array of controls followed by an array of slots,
/// both `capacity` long, in a single allocation.
///
/// Essential invariants of this structure:
///
///   - a slot is initialized if and only if its control is not empty;
///   - `size` is the number of non-empty controls;
///   - every full control's `dib` is its distance from the key's ideal bucket;
///   - along a run, displacements grow by at most one per slot, and a run
///     only restarts after an empty slot or at a displacement of zero.
///
/// The control array is scanned on every probe, so keeping it apart from the
/// (usually larger) slots keeps probing inside a few cache lines.
pub(crate) struct RawTable<K, V> {
    ptr: NonNull<u8>,
    layout: Layout,
    slots_offset: usize,
    capacity: usize,
    size: usize,

    // Because K/V do not appear directly in any of the types in the struct,
    // inform rustc that in fact instances of K and V are reachable from here.
    marker: PhantomData<(K, V)>,
}

unsafe impl<K: Send, V: Send> Send for RawTable<K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for RawTable<K, V> {}

impl<K, V> RawTable<K, V> {
    /// A table without an allocation.
    pub(crate) const fn empty() -> RawTable<K, V> {
        RawTable {
            ptr: NonNull::dangling(),
            layout: Layout::new::<()>(),
            slots_offset: 0,
            capacity: 0,
            size: 0,
            marker: PhantomData,
        }
    }

    /// Allocates a table with `capacity` empty slots.
    pub(crate) fn try_new(
        capacity: usize,
        fallibility: Fallibility,
    ) -> Result<RawTable<K, V>, Error> {
        if capacity == 0 {
            return Ok(RawTable::empty());
        }
        if capacity > probe::MAX_CAPACITY {
            return Err(Error::CapacityOverflow);
        }

        // Allocating hashmaps is a little tricky. We need two arrays, but
        // since we know their sizes and alignments up front, we allocate a
        // single buffer and have the subarrays point into it.
        let (layout, slots_offset) = calculate_layout::<K, V>(capacity)?;
        // SAFETY: the layout is non-zero sized: `capacity > 0` and `Control`
        // is eight bytes.
        let raw = unsafe { alloc::alloc(layout) };
        let ptr = match NonNull::new(raw) {
            Some(ptr) => ptr,
            None => match fallibility {
                Infallible => alloc::handle_alloc_error(layout),
                Fallible => return Err(Error::AllocError { layout }),
            },
        };

        let controls = ptr.as_ptr() as *mut Control;
        for i in 0..capacity {
            // SAFETY: the control region holds `capacity` entries.
            unsafe { controls.add(i).write(Control::EMPTY) };
        }

        Ok(RawTable {
            ptr,
            layout,
            slots_offset,
            capacity,
            size: 0,
            marker: PhantomData,
        })
    }

    /// Creates a new raw table from a given capacity. All slots are
    /// initially empty.
    pub(crate) fn new(capacity: usize) -> RawTable<K, V> {
        match Self::try_new(capacity, Infallible) {
            Ok(table) => table,
            Err(Error::CapacityOverflow) => panic!("capacity overflow"),
            Err(err) => unreachable!("infallible allocation reported {}", err),
        }
    }

    /// The number of slots.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of full slots.
    #[inline]
    pub(crate) fn size(&self) -> usize {
        self.size
    }

    #[inline]
    fn parts(&self) -> (&[Control], &[Slot<K, V>]) {
        if self.capacity == 0 {
            return (&[], &[]);
        }
        // SAFETY: an allocated table owns `capacity` initialized controls at
        // the start of the buffer and `capacity` slots at `slots_offset`.
        // `Slot` is `MaybeUninit`, so viewing it as a slice is always valid.
        unsafe {
            let base = self.ptr.as_ptr();
            (
                slice::from_raw_parts(base as *const Control, self.capacity),
                slice::from_raw_parts(
                    base.add(self.slots_offset) as *const Slot<K, V>,
                    self.capacity,
                ),
            )
        }
    }

    #[inline]
    fn parts_mut(&mut self) -> (&mut [Control], &mut [Slot<K, V>]) {
        if self.capacity == 0 {
            return (&mut [], &mut []);
        }
        // SAFETY: as in `parts`; the two regions do not overlap.
        unsafe {
            let base = self.ptr.as_ptr();
            (
                slice::from_raw_parts_mut(base as *mut Control, self.capacity),
                slice::from_raw_parts_mut(
                    base.add(self.slots_offset) as *mut Slot<K, V>,
                    self.capacity,
                ),
            )
        }
    }

    /// Walks the probe sequence of `hash` until the key is found, an empty
    /// slot ends the run, or a resident closer to its ideal bucket than the
    /// steps taken proves the key absent. Lookup, insertion and removal all
    /// come through here, so they share one termination rule.
    ///
    /// The table must be allocated.
    pub(crate) fn probe<F>(&self, hash: u64, mut is_match: F) -> Probe
    where
        F: FnMut(&K) -> bool,
    {
        debug_assert!(self.capacity > 0, "probing an unallocated table");
        let (controls, slots) = self.parts();
        let fragment = probe::fragment(hash);
        let mut index = probe::ideal_bucket(fragment, self.capacity);
        let mut dib = 0;

        loop {
            let resident = controls[index];
            if resident.is_empty() {
                return Probe::Vacant { index, dib };
            }
            if resident.dib < dib {
                return Probe::Steal { index, dib };
            }
            // SAFETY: the control is full.
            if resident.hash == fragment && is_match(unsafe { &slots[index].get().0 }) {
                return Probe::Occupied(index);
            }
            index = probe::next_index(index, self.capacity);
            dib += 1;
            debug_assert!((dib as usize) < self.capacity);
        }
    }

    /// Index of the key, if present.
    #[inline]
    pub(crate) fn find<F>(&self, hash: u64, is_match: F) -> Option<usize>
    where
        F: FnMut(&K) -> bool,
    {
        if self.capacity == 0 {
            return None;
        }
        match self.probe(hash, is_match) {
            Probe::Occupied(index) => Some(index),
            Probe::Vacant { .. } | Probe::Steal { .. } => None,
        }
    }

    /// Stores a new entry where [`probe`](Self::probe) found room for it and
    /// returns the entry's index. The caller guarantees a free slot exists.
    pub(crate) fn put(&mut self, found: Probe, hash: u64, kv: (K, V)) -> usize {
        let fragment = probe::fragment(hash);
        let (controls, slots) = self.parts_mut();
        let index = match found {
            Probe::Vacant { index, dib } => {
                controls[index] = Control::new(fragment, dib);
                // SAFETY: the control was empty.
                unsafe { slots[index].write(kv) };
                index
            }
            Probe::Steal { index, dib } => {
                let resident = mem::replace(&mut controls[index], Control::new(fragment, dib));
                // SAFETY: the control was full.
                let displaced = unsafe { slots[index].replace(kv) };
                let next = probe::next_index(index, controls.len());
                robin_hood(
                    controls,
                    slots,
                    next,
                    Control::new(resident.hash, resident.dib + 1),
                    displaced,
                );
                index
            }
            Probe::Occupied(_) => unreachable!("put into an occupied slot"),
        };
        self.size += 1;
        index
    }

    /// Places an entry known to be absent, starting at its ideal bucket.
    fn insert_unique(&mut self, fragment: u32, kv: (K, V)) {
        let index = probe::ideal_bucket(fragment, self.capacity);
        let (controls, slots) = self.parts_mut();
        robin_hood(controls, slots, index, Control::new(fragment, 0), kv);
        self.size += 1;
    }

    /// Moves every entry into `target`, reusing the stored hash fragments,
    /// and leaves `self` empty. `target` must have room for all of them.
    pub(crate) fn migrate_into(&mut self, target: &mut RawTable<K, V>) {
        debug_assert!(self.size + target.size <= probe::max_load(target.capacity));
        let (controls, slots) = self.parts_mut();
        for (ctrl, slot) in controls.iter_mut().zip(slots.iter_mut()) {
            if ctrl.is_empty() {
                continue;
            }
            let fragment = ctrl.hash;
            *ctrl = Control::EMPTY;
            // SAFETY: the control was full.
            let kv = unsafe { slot.take() };
            target.insert_unique(fragment, kv);
        }
        self.size = 0;
    }

    /// Removes the entry at `index` and closes the gap by shifting the rest
    /// of its run one slot back. No tombstone is left behind.
    pub(crate) fn remove(&mut self, mut index: usize) -> (K, V) {
        let capacity = self.capacity;
        let (controls, slots) = self.parts_mut();
        debug_assert!(!controls[index].is_empty());

        controls[index] = Control::EMPTY;
        // SAFETY: the control was full.
        let kv = unsafe { slots[index].take() };

        loop {
            let next = probe::next_index(index, capacity);
            let ctrl = controls[next];
            if ctrl.is_empty() || ctrl.dib == 0 {
                break;
            }
            controls[index] = Control::new(ctrl.hash, ctrl.dib - 1);
            controls[next] = Control::EMPTY;
            // `index` is vacant, so swapping the raw slots moves the entry
            // back and leaves `next` vacant.
            slots.swap(index, next);
            index = next;
        }

        self.size -= 1;
        kv
    }

    /// The entry at a full index.
    #[inline]
    pub(crate) fn entry(&self, index: usize) -> &(K, V) {
        let (controls, slots) = self.parts();
        assert!(!controls[index].is_empty());
        // SAFETY: the control is full.
        unsafe { slots[index].get() }
    }

    /// The entry at a full index.
    #[inline]
    pub(crate) fn entry_mut(&mut self, index: usize) -> &mut (K, V) {
        let (controls, slots) = self.parts_mut();
        assert!(!controls[index].is_empty());
        // SAFETY: the control is full.
        unsafe { slots[index].get_mut() }
    }

    /// Drops every entry, keeping the allocation.
    pub(crate) fn clear(&mut self) {
        let (controls, slots) = self.parts_mut();
        for (ctrl, slot) in controls.iter_mut().zip(slots.iter_mut()) {
            if !ctrl.is_empty() {
                *ctrl = Control::EMPTY;
                // SAFETY: the control was full.
                unsafe { slot.destroy() };
            }
        }
        self.size = 0;
    }

    /// Largest and summed displacement over all entries.
    pub(crate) fn displacements(&self) -> (u32, u64) {
        let (controls, _) = self.parts();
        controls
            .iter()
            .filter(|ctrl| !ctrl.is_empty())
            .fold((0, 0), |(max, total), ctrl| {
                (max.max(ctrl.dib), total + u64::from(ctrl.dib))
            })
    }

    pub(crate) fn iter(&self) -> RawIter<'_, K, V> {
        let (controls, slots) = self.parts();
        RawIter {
            controls: controls.iter(),
            slots: slots.iter(),
            elems_left: self.size,
        }
    }

    pub(crate) fn iter_mut(&mut self) -> RawIterMut<'_, K, V> {
        let elems_left = self.size;
        let (controls, slots) = self.parts_mut();
        RawIterMut {
            controls: controls.iter(),
            slots: slots.iter_mut(),
            elems_left,
        }
    }

    pub(crate) fn into_entries(self) -> RawIntoIter<K, V> {
        RawIntoIter {
            table: self,
            index: 0,
        }
    }
}

/// Carries `ctrl`/`kv` forward from `index`, swapping it with every resident
/// that sits closer to its ideal bucket, until an empty slot takes whatever
/// entry is being carried. Keys are never compared: every carried entry is
/// already known to be unique.
fn robin_hood<K, V>(
    controls: &mut [Control],
    slots: &mut [Slot<K, V>],
    mut index: usize,
    mut ctrl: Control,
    mut kv: (K, V),
) {
    let capacity = controls.len();
    loop {
        let resident = controls[index];
        if resident.is_empty() {
            controls[index] = ctrl;
            // SAFETY: the control was empty.
            unsafe { slots[index].write(kv) };
            return;
        }
        if resident.dib < ctrl.dib {
            // Robin hood! Steal the spot.
            controls[index] = ctrl;
            // SAFETY: the control was full.
            kv = unsafe { slots[index].replace(kv) };
            ctrl = resident;
        }
        index = probe::next_index(index, capacity);
        ctrl.dib += 1;
    }
}

impl<K, V> Drop for RawTable<K, V> {
    fn drop(&mut self) {
        if self.capacity == 0 {
            return;
        }
        if mem::needs_drop::<(K, V)>() {
            self.clear();
        }
        // SAFETY: the buffer was allocated in `try_new` with this layout.
        // Both arrays live in it, so one call frees everything.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

/// Iterator over shared references to the entries of a table.
pub(crate) struct RawIter<'a, K, V> {
    controls: slice::Iter<'a, Control>,
    slots: slice::Iter<'a, Slot<K, V>>,
    elems_left: usize,
}

impl<'a, K, V> Clone for RawIter<'a, K, V> {
    fn clone(&self) -> RawIter<'a, K, V> {
        RawIter {
            controls: self.controls.clone(),
            slots: self.slots.clone(),
            elems_left: self.elems_left,
        }
    }
}

impl<'a, K, V> Iterator for RawIter<'a, K, V> {
    type Item = &'a (K, V);

    fn next(&mut self) -> Option<&'a (K, V)> {
        if self.elems_left == 0 {
            return None;
        }
        loop {
            let ctrl = self.controls.next()?;
            let slot = self.slots.next()?;
            if !ctrl.is_empty() {
                self.elems_left -= 1;
                // SAFETY: the control is full.
                return Some(unsafe { slot.get() });
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.elems_left, Some(self.elems_left))
    }
}

impl<'a, K, V> ExactSizeIterator for RawIter<'a, K, V> {}
impl<'a, K, V> FusedIterator for RawIter<'a, K, V> {}

/// Iterator over the entries of a table with mutable values.
pub(crate) struct RawIterMut<'a, K, V> {
    controls: slice::Iter<'a, Control>,
    slots: slice::IterMut<'a, Slot<K, V>>,
    elems_left: usize,
}

impl<'a, K, V> Iterator for RawIterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<(&'a K, &'a mut V)> {
        if self.elems_left == 0 {
            return None;
        }
        loop {
            let ctrl = self.controls.next()?;
            let slot = self.slots.next()?;
            if !ctrl.is_empty() {
                self.elems_left -= 1;
                // SAFETY: the control is full.
                let kv = unsafe { slot.get_mut() };
                return Some((&kv.0, &mut kv.1));
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.elems_left, Some(self.elems_left))
    }
}

impl<'a, K, V> ExactSizeIterator for RawIterMut<'a, K, V> {}
impl<'a, K, V> FusedIterator for RawIterMut<'a, K, V> {}

/// Iterator moving the entries out of a table. Entries it never reaches are
/// dropped with the table.
pub(crate) struct RawIntoIter<K, V> {
    table: RawTable<K, V>,
    index: usize,
}

impl<K, V> Iterator for RawIntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        while self.index < self.table.capacity {
            let index = self.index;
            self.index += 1;
            let (controls, slots) = self.table.parts_mut();
            if !controls[index].is_empty() {
                controls[index] = Control::EMPTY;
                // SAFETY: the control was full.
                let kv = unsafe { slots[index].take() };
                self.table.size -= 1;
                return Some(kv);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.table.size, Some(self.table.size))
    }
}

impl<K, V> ExactSizeIterator for RawIntoIter<K, V> {}
impl<K, V> FusedIterator for RawIntoIter<K, V> {}

#[cfg(test)]
impl<K, V> RawTable<K, V> {
    /// Panics unless every structural invariant of the table holds.
    pub(crate) fn assert_invariants(&self) {
        let (controls, _) = self.parts();
        let capacity = self.capacity;

        let full = controls.iter().filter(|ctrl| !ctrl.is_empty()).count();
        assert_eq!(full, self.size, "size must equal the number of full slots");
        assert!(
            self.size <= probe::max_load(capacity),
            "{} entries exceed the load limit of {} slots",
            self.size,
            capacity
        );

        for (index, ctrl) in controls.iter().enumerate() {
            if ctrl.is_empty() {
                continue;
            }
            let ideal = probe::ideal_bucket(ctrl.hash, capacity);
            let distance = (index + capacity - ideal) % capacity;
            assert_eq!(ctrl.dib as usize, distance, "slot {} has a wrong displacement", index);

            if ctrl.dib > 0 {
                let prev = controls[(index + capacity - 1) % capacity];
                assert!(!prev.is_empty(), "slot {} is displaced past a hole", index);
            }
            let next = controls[probe::next_index(index, capacity)];
            if !next.is_empty() {
                assert!(
                    next.dib <= ctrl.dib + 1,
                    "slot {} breaks the robin hood ordering",
                    probe::next_index(index, capacity)
                );
            }
        }
    }
}
