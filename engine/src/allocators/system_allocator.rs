// SPDX-FileCopyrightText: 2025 Ashton Warner
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::ffi::c_void;

use pal::Pal;

use super::{block_size, Allocator};

/// The baseline [`Allocator`]: a thin shim over the platform's heap.
/// Not recommended to use by itself for anything with interesting
/// ownership; it exists to back an [`ArenaAllocator`] and the
/// containers.
///
/// [`ArenaAllocator`]: super::ArenaAllocator
#[derive(Clone, Copy)]
pub struct SystemAllocator<'p> {
    platform: &'p dyn Pal,
}

impl<'p> SystemAllocator<'p> {
    pub fn new(platform: &'p dyn Pal) -> SystemAllocator<'p> {
        SystemAllocator { platform }
    }
}

impl Allocator for SystemAllocator<'_> {
    fn alloc(&mut self, elem_size: usize, count: usize) -> *mut c_void {
        let size = block_size(elem_size, count);
        let ptr = self.platform.malloc(size);
        if ptr.is_null() {
            panic!("platform ran out of memory allocating {size} bytes");
        }
        ptr
    }

    unsafe fn free(&mut self, ptr: *mut c_void) {
        debug_assert!(!ptr.is_null(), "free() with a null pointer");
        // Safety: passed through from the caller, who promises the block
        // came from this allocator, i.e. from this platform's malloc.
        unsafe { self.platform.free(ptr) };
    }

    unsafe fn remap(
        &mut self,
        ptr: *mut c_void,
        elem_size: usize,
        new_count: usize,
    ) -> *mut c_void {
        debug_assert!(!ptr.is_null(), "remap() with a null pointer");
        let size = block_size(elem_size, new_count);
        // Safety: passed through from the caller, same as in free().
        let new_ptr = unsafe { self.platform.realloc(ptr, size) };
        if new_ptr.is_null() {
            panic!("platform ran out of memory remapping a block to {size} bytes");
        }
        new_ptr
    }
}
