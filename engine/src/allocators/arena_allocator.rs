// SPDX-FileCopyrightText: 2025 Ashton Warner
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::{ffi::c_void, ptr};

use bytemuck::Zeroable;

use super::Allocator;

/// How many slots a fresh arena's table has room for.
const INITIAL_SLOT_CAPACITY: usize = 8;

/// One tracked allocation in the arena's slot table.
#[derive(Clone, Copy)]
#[repr(C)]
struct Slot {
    ptr: *mut c_void,
    in_use: bool,
}

// Safety: an all-zero Slot is a null pointer and `in_use: false`, which
// is exactly what an empty slot looks like. This is what lets the table
// be initialized with a plain write_bytes.
unsafe impl Zeroable for Slot {}

/// An [`Allocator`] that records every block it hands out, so the whole
/// set can be released at once when the arena goes away, regardless of
/// whether individual blocks were freed upstream.
///
/// The slot table is scanned linearly on every [`Allocator::free`] and
/// [`Allocator::remap`]. That O(n) lookup is a feature, not an
/// incidental cost: it is what detects double frees and foreign
/// pointers without the callers carrying any per-pointer metadata.
/// Allocation reuses the lowest free slot at or after `first_free_hint`,
/// which is rewound on every free, giving first-fit slot reuse.
///
/// Dropping the arena releases every still-live block and then the slot
/// table itself. Use-after-destroy can't happen: a dropped arena can't
/// be named anymore.
pub struct ArenaAllocator<A: Allocator> {
    backing: A,
    slots: *mut Slot,
    slot_capacity: usize,
    /// Index to start the free-slot scan from in [`Allocator::alloc`].
    /// Always at or below the lowest free slot index.
    first_free_hint: usize,
}

// Safety: `slots` is owned exclusively by this arena (allocated in
// `new`, only ever touched through `&mut self`), so moving the arena to
// another thread moves the whole table with it.
unsafe impl<A: Allocator + Send> Send for ArenaAllocator<A> {}

impl<A: Allocator> ArenaAllocator<A> {
    /// Creates an empty arena which allocates its blocks, and its own
    /// slot table, from `backing`.
    pub fn new(mut backing: A) -> ArenaAllocator<A> {
        let slots = backing.alloc(size_of::<Slot>(), INITIAL_SLOT_CAPACITY) as *mut Slot;
        // Safety: the allocation above is exactly INITIAL_SLOT_CAPACITY
        // slots, and Slot: Zeroable, so all-zero is a valid (empty)
        // state for every one of them.
        unsafe { ptr::write_bytes(slots, 0, INITIAL_SLOT_CAPACITY) };
        ArenaAllocator {
            backing,
            slots,
            slot_capacity: INITIAL_SLOT_CAPACITY,
            first_free_hint: 0,
        }
    }

    /// The current size of the slot table. Grows by 1.5x when exhausted,
    /// never shrinks. Exposed for diagnostics.
    pub fn slot_capacity(&self) -> usize {
        self.slot_capacity
    }

    /// How many blocks this arena has handed out and not yet seen freed.
    pub fn live_allocations(&self) -> usize {
        (0..self.slot_capacity)
            .filter(|&index| self.slot(index).in_use)
            .count()
    }

    /// Returns the slot index currently tracking `ptr`, or None if the
    /// pointer isn't live in this arena. An audit hook: the same lookup
    /// `free` and `remap` do, without the fatality.
    pub fn slot_index_of(&self, ptr: *const c_void) -> Option<usize> {
        (0..self.slot_capacity).find(|&index| {
            let slot = self.slot(index);
            slot.in_use && core::ptr::eq(slot.ptr, ptr)
        })
    }

    fn slot(&self, index: usize) -> &Slot {
        debug_assert!(index < self.slot_capacity);
        // Safety: index is within the table, and the table stays alive
        // and exclusively owned for as long as self does.
        unsafe { &*self.slots.add(index) }
    }

    fn slot_mut(&mut self, index: usize) -> &mut Slot {
        debug_assert!(index < self.slot_capacity);
        // Safety: as in `slot`, plus we have &mut self.
        unsafe { &mut *self.slots.add(index) }
    }

    /// Grows the slot table by 1.5x, copying the existing slot metadata
    /// and zeroing the new tail.
    fn grow_slot_table(&mut self) {
        let new_capacity = self.slot_capacity + self.slot_capacity / 2;
        log::debug!(
            "arena slot table exhausted, growing {} -> {} slots",
            self.slot_capacity,
            new_capacity,
        );
        // Safety: `slots` came from `backing.alloc`/`backing.remap` and
        // is only remapped here, so the old-pointer rules hold. The old
        // pointer is overwritten below and never used again.
        let new_slots = unsafe {
            self.backing
                .remap(self.slots as *mut c_void, size_of::<Slot>(), new_capacity)
        } as *mut Slot;
        // Safety: the tail beyond the old capacity is fresh memory
        // within the remapped block; Slot: Zeroable (see above).
        unsafe {
            ptr::write_bytes(
                new_slots.add(self.slot_capacity),
                0,
                new_capacity - self.slot_capacity,
            )
        };
        self.slots = new_slots;
        self.slot_capacity = new_capacity;
    }
}

impl<A: Allocator> Allocator for ArenaAllocator<A> {
    fn alloc(&mut self, elem_size: usize, count: usize) -> *mut c_void {
        let mut index = self.first_free_hint;
        while index < self.slot_capacity && self.slot(index).in_use {
            index += 1;
        }
        if index == self.slot_capacity {
            // The scan fell off the end: `index` is the first slot of
            // the newly grown tail.
            self.grow_slot_table();
        }

        let block = self.backing.alloc(elem_size, count);
        let slot = self.slot_mut(index);
        slot.ptr = block;
        slot.in_use = true;
        self.first_free_hint = index + 1;
        block
    }

    unsafe fn free(&mut self, ptr: *mut c_void) {
        debug_assert!(!ptr.is_null(), "free() with a null pointer");
        for index in 0..self.slot_capacity {
            if !self.slot(index).in_use || !ptr::eq(self.slot(index).ptr, ptr) {
                continue;
            }
            // Safety: the slot table says this exact pointer is a live
            // block from `backing`, and the caller promises nobody is
            // using the memory anymore.
            unsafe { self.backing.free(ptr) };
            let slot = self.slot_mut(index);
            slot.ptr = ptr::null_mut();
            slot.in_use = false;
            if index < self.first_free_hint {
                self.first_free_hint = index;
            }
            return;
        }
        panic!("pointer {ptr:?} is not managed by this arena (foreign pointer or double free)");
    }

    unsafe fn remap(
        &mut self,
        ptr: *mut c_void,
        elem_size: usize,
        new_count: usize,
    ) -> *mut c_void {
        debug_assert!(!ptr.is_null(), "remap() with a null pointer");
        for index in 0..self.slot_capacity {
            if !self.slot(index).in_use || !ptr::eq(self.slot(index).ptr, ptr) {
                continue;
            }
            // Safety: same lookup-validated delegation as in free().
            let new_ptr = unsafe { self.backing.remap(ptr, elem_size, new_count) };
            // The slot keeps its identity: a later free/remap of the new
            // pointer finds the same slot even if the address changed.
            self.slot_mut(index).ptr = new_ptr;
            return new_ptr;
        }
        panic!("pointer {ptr:?} is not managed by this arena (foreign pointer or double free)");
    }
}

impl<A: Allocator> Drop for ArenaAllocator<A> {
    /// Bulk teardown: callers are not required to have freed every block
    /// individually, anything still live goes back to the backing
    /// allocator here, exactly once.
    fn drop(&mut self) {
        for index in 0..self.slot_capacity {
            let slot = *self.slot(index);
            if !slot.in_use {
                continue;
            }
            // Safety: every in_use slot holds a live block issued by
            // `backing`, and the arena is going away, so nothing can
            // refer to the block through this arena afterwards.
            unsafe { self.backing.free(slot.ptr) };
            let slot = self.slot_mut(index);
            slot.ptr = ptr::null_mut();
            slot.in_use = false;
        }
        // Safety: the table itself was allocated from `backing` in
        // `new` (possibly remapped since), and is never touched again.
        unsafe { self.backing.free(self.slots as *mut c_void) };
    }
}
