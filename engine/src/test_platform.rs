// SPDX-FileCopyrightText: 2025 Ashton Warner
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Deterministic stand-ins for the platform and the backing allocator,
//! shared by the tests across the crate.

use core::{
    ffi::c_void,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use pal::{Axis, Button, Color, HatState, InputDevice, InputDevices, Pal, Rect, Vec2};
use parking_lot::Mutex;

use crate::allocators::Allocator;

/// A plain malloc-backed [`Allocator`] that keeps count of its live
/// blocks, so tests can assert that everything gets freed.
pub(crate) struct TestHeap {
    pub live_blocks: usize,
}

impl TestHeap {
    pub fn new() -> TestHeap {
        TestHeap { live_blocks: 0 }
    }
}

impl Allocator for TestHeap {
    fn alloc(&mut self, elem_size: usize, count: usize) -> *mut c_void {
        // Safety: libc::malloc is safe to call with any size.
        let ptr = unsafe { libc::malloc(elem_size * count) };
        assert!(!ptr.is_null());
        self.live_blocks += 1;
        ptr as *mut c_void
    }

    unsafe fn free(&mut self, ptr: *mut c_void) {
        assert!(self.live_blocks > 0, "free() without a live block");
        self.live_blocks -= 1;
        // Safety: the caller promises ptr came from this allocator's
        // alloc/remap, i.e. from libc::malloc/realloc.
        unsafe { libc::free(ptr as *mut libc::c_void) };
    }

    unsafe fn remap(&mut self, ptr: *mut c_void, elem_size: usize, new_count: usize) -> *mut c_void {
        // Safety: same as free, ptr is a live libc allocation.
        let new_ptr = unsafe { libc::realloc(ptr as *mut libc::c_void, elem_size * new_count) };
        assert!(!new_ptr.is_null());
        new_ptr as *mut c_void
    }
}

/// Every primitive draw call a [`TestPlatform`] has received since the
/// last clear, in order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DrawCall {
    Rectangle(Rect, Color, bool),
    Line(Vec2, Vec2, Color),
    Text(Vec2, String, Color),
}

/// A [`Pal`] with no window behind it: draw calls get recorded instead
/// of rendered, and the clock only advances when a test tells it to.
pub(crate) struct TestPlatform {
    elapsed_millis: AtomicU64,
    draw_calls: Mutex<Vec<DrawCall>>,
}

impl TestPlatform {
    pub fn new() -> TestPlatform {
        TestPlatform {
            elapsed_millis: AtomicU64::new(0),
            draw_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_elapsed_millis(&self, millis: u64) {
        self.elapsed_millis.store(millis, Ordering::Relaxed);
    }

    pub fn draw_calls(&self) -> Vec<DrawCall> {
        self.draw_calls.lock().clone()
    }
}

impl Pal for TestPlatform {
    fn draw_area(&self) -> (f32, f32) {
        (640.0, 480.0)
    }

    fn clear(&self) {
        self.draw_calls.lock().clear();
    }

    fn present(&self) {}

    fn draw_rectangle(&self, rect: Rect, color: Color, fill: bool) {
        self.draw_calls
            .lock()
            .push(DrawCall::Rectangle(rect, color, fill));
    }

    fn draw_line(&self, from: Vec2, to: Vec2, color: Color) {
        self.draw_calls.lock().push(DrawCall::Line(from, to, color));
    }

    fn draw_text(&self, position: Vec2, text: &str, color: Color) {
        self.draw_calls
            .lock()
            .push(DrawCall::Text(position, text.to_string(), color));
    }

    fn input_devices(&self) -> InputDevices {
        let mut devices = InputDevices::new();
        devices.push(InputDevice::new(1));
        devices
    }

    fn button_state(&self, _device: InputDevice, _button: Button) -> bool {
        false
    }

    fn axis_state(&self, _device: InputDevice, _axis: Axis) -> f32 {
        0.0
    }

    fn hat_state(&self, _device: InputDevice) -> HatState {
        HatState::CENTERED
    }

    fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_millis.load(Ordering::Relaxed))
    }

    fn println(&self, message: &str) {
        std::println!("TestPlatform: {message}");
    }

    fn exit(&self, clean: bool) {
        panic!("TestPlatform::exit({clean}) was called");
    }

    fn malloc(&self, size: usize) -> *mut c_void {
        // Safety: libc::malloc is safe to call with any size.
        unsafe { libc::malloc(size) as *mut c_void }
    }

    unsafe fn realloc(&self, ptr: *mut c_void, new_size: usize) -> *mut c_void {
        // Safety: the caller promises ptr came from this platform's
        // malloc/realloc.
        unsafe { libc::realloc(ptr as *mut libc::c_void, new_size) as *mut c_void }
    }

    unsafe fn free(&self, ptr: *mut c_void) {
        // Safety: same as realloc.
        unsafe { libc::free(ptr as *mut libc::c_void) };
    }
}
