// SPDX-FileCopyrightText: 2025 Ashton Warner
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::{ffi::c_void, ptr, slice};

use crate::allocators::Allocator;

/// A geometrically growing array with stack semantics. Starts out with
/// room for [`Stack::DEFAULT_CAPACITY`] elements and grows by 1.5x
/// through the allocator's `remap` whenever a push doesn't fit. Growth
/// is amortized only: popping never shrinks the buffer.
///
/// `T` must not be zero-sized, and its alignment must not exceed what
/// the backing allocator's blocks guarantee (malloc-grade alignment).
pub struct Stack<T> {
    ptr: *mut T,
    len: usize,
    capacity: usize,
}

// Safety: the buffer is exclusively owned by this stack, so sending the
// stack to another thread sends the elements with it.
unsafe impl<T: Send> Send for Stack<T> {}

impl<T> Stack<T> {
    pub const DEFAULT_CAPACITY: usize = 8;

    /// Creates a stack with the default capacity, allocated from
    /// `alloc`. All later operations on this stack must be passed the
    /// same allocator.
    pub fn new(alloc: &mut dyn Allocator) -> Stack<T> {
        debug_assert!(size_of::<T>() > 0, "Stack of a zero-sized type");
        let ptr = alloc.alloc(size_of::<T>(), Self::DEFAULT_CAPACITY) as *mut T;
        Stack {
            ptr,
            len: 0,
            capacity: Self::DEFAULT_CAPACITY,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The current allocated capacity in elements. Only ever grows.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends `value`, growing the buffer by 1.5x first if it's full.
    pub fn push(&mut self, alloc: &mut dyn Allocator, value: T) {
        if self.len == self.capacity {
            let new_capacity = self.capacity + self.capacity / 2;
            // Safety: `ptr` is the live block this stack was created
            // with (or last remapped to), issued by `alloc`.
            self.ptr = unsafe {
                alloc.remap(self.ptr as *mut c_void, size_of::<T>(), new_capacity)
            } as *mut T;
            self.capacity = new_capacity;
        }
        // Safety: len < capacity after the growth check, so the write
        // lands within the allocated block, and the slot at `len` holds
        // no initialized value (pop and destroy move values out before
        // decrementing `len`).
        unsafe { self.ptr.add(self.len).write(value) };
        self.len += 1;
    }

    /// Removes and returns the top element. Popping an empty stack is a
    /// fatal usage error.
    pub fn pop(&mut self) -> T {
        if self.len == 0 {
            panic!("pop() on an empty stack");
        }
        self.len -= 1;
        // Safety: indices below the old `len` are initialized, and
        // decrementing `len` first means this value won't be read (or
        // dropped) through the buffer again.
        unsafe { self.ptr.add(self.len).read() }
    }

    /// Returns the top element, or None if the stack is empty.
    pub fn peek(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        // Safety: index len - 1 is initialized and within the block.
        Some(unsafe { &*self.ptr.add(self.len - 1) })
    }

    /// The elements currently on the stack, bottom first.
    pub fn as_slice(&self) -> &[T] {
        // Safety: the first `len` elements are initialized, within one
        // allocated block, and borrowed for as long as `self` is.
        unsafe { slice::from_raw_parts(self.ptr, self.len) }
    }

    /// Mutable access to the elements currently on the stack, bottom
    /// first.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // Safety: as in as_slice, plus `&mut self` guarantees the
        // borrow is unique.
        unsafe { slice::from_raw_parts_mut(self.ptr, self.len) }
    }

    /// Drops the remaining elements and releases the buffer back to
    /// `alloc`, which must be the allocator this stack was created with.
    pub fn destroy(mut self, alloc: &mut dyn Allocator) {
        while self.len > 0 {
            self.len -= 1;
            // Safety: as in pop(), each initialized element is dropped
            // exactly once.
            unsafe { ptr::drop_in_place(self.ptr.add(self.len)) };
        }
        // Safety: the block belongs to `alloc` per this function's
        // contract, and `self` is consumed so it can't be used again.
        unsafe { alloc.free(self.ptr as *mut c_void) };
    }
}
