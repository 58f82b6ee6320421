// SPDX-FileCopyrightText: 2025 Ashton Warner
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! The memory-ownership layer. Everything downstream of this module that
//! needs heap memory asks an [`Allocator`] for it, which keeps the whole
//! runtime retargetable between the plain platform heap and the
//! tracking [`ArenaAllocator`].

mod arena_allocator;
mod system_allocator;

use core::ffi::c_void;

pub use arena_allocator::ArenaAllocator;
pub use system_allocator::SystemAllocator;

/// Capability for acquiring, releasing, and resizing raw blocks of
/// memory. A block is identified by its address alone; the element size
/// and count are the caller's to remember.
///
/// Blocks are exclusively owned by the allocator instance that issued
/// them: passing a block to a different instance's [`Allocator::free`]
/// or [`Allocator::remap`] is unsupported, and implementations such as
/// [`ArenaAllocator`] are allowed to treat it as a fatal protocol
/// violation.
///
/// The fatal error policy of this whole layer: misuse (zero sizes, null
/// or foreign pointers) aborts in checked builds via `debug_assert!`,
/// and running out of backing memory panics unconditionally. Nothing
/// here returns a recoverable error, so that corrupted allocator state
/// is never operated on further.
pub trait Allocator {
    /// Allocates a block for `count` elements of `elem_size` bytes each.
    /// Never returns null: allocation failure is fatal.
    ///
    /// Both arguments must be positive. This is only checked in builds
    /// with debug assertions.
    fn alloc(&mut self, elem_size: usize, count: usize) -> *mut c_void;

    /// Releases a previously allocated block.
    ///
    /// ## Safety
    ///
    /// - `ptr` must have been returned by [`Allocator::alloc`] or
    ///   [`Allocator::remap`] on this same instance, and not freed
    ///   since. The memory must not be accessed after this call.
    unsafe fn free(&mut self, ptr: *mut c_void);

    /// Grows or shrinks a block to hold `new_count` elements of
    /// `elem_size` bytes, possibly relocating it. The returned pointer
    /// replaces `ptr` entirely: the old pointer is invalid immediately
    /// after this call whether or not the address changed.
    ///
    /// ## Safety
    ///
    /// - Same rules as [`Allocator::free`] for `ptr`.
    unsafe fn remap(&mut self, ptr: *mut c_void, elem_size: usize, new_count: usize)
        -> *mut c_void;
}

/// Computes `elem_size * count` for an allocation, with the fatal
/// error policy of this module on overflow.
fn block_size(elem_size: usize, count: usize) -> usize {
    debug_assert!(elem_size > 0, "allocation with elem_size == 0");
    debug_assert!(count > 0, "allocation with count == 0");
    let Some(size) = elem_size.checked_mul(count) else {
        panic!("allocation size overflows usize ({elem_size} * {count})");
    };
    size
}
