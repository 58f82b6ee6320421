// SPDX-FileCopyrightText: 2025 Ashton Warner
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! The narrow interfaces between the runtime core and its collaborators:
//! the windowing/render surface, the physics backend, and the input
//! devices. The core only ever talks to these traits, so any backend can
//! be plugged in, including the deterministic test doubles used by the
//! engine's own tests.

#![no_std]

mod geom;
mod input;
mod physics;

use arrayvec::ArrayVec;

use core::{ffi::c_void, time::Duration};

pub use geom::*;
pub use input::*;
pub use physics::*;

/// The list of currently connected input devices.
pub type InputDevices = ArrayVec<InputDevice, 15>;

/// "Platform abstraction layer": the surface, input, clock, and raw
/// memory features the engine consumes without depending on any backend
/// directly.
///
/// All methods take `&self` so that one platform object can be handed
/// around freely (a platform is about as global an object as you get),
/// and the trait requires [`Sync`] because the render thread and the
/// fixed-rate simulation thread may query it concurrently. None of these
/// functions are hot, so `&dyn Pal` is fine performance-wise and keeps
/// generics out of the engine's public types.
pub trait Pal: Sync {
    /// Returns the current viewport size. The unit is whatever coordinate
    /// system the primitive draw calls use.
    fn draw_area(&self) -> (f32, f32);

    /// Clears the surface to the background color, starting a new frame.
    fn clear(&self);

    /// Presents everything drawn since the last [`Pal::clear`].
    fn present(&self);

    /// Draws a rectangle outline, or a filled rectangle if `fill` is set.
    /// Coordinates are already camera-transformed by the caller.
    fn draw_rectangle(&self, rect: Rect, color: Color, fill: bool);

    /// Draws a line between two already camera-transformed points.
    fn draw_line(&self, from: Vec2, to: Vec2, color: Color);

    /// Draws a small piece of debug text with its top-left corner at the
    /// given position.
    fn draw_text(&self, position: Vec2, text: &str, color: Color);

    /// Returns the currently connected input devices.
    fn input_devices(&self) -> InputDevices;

    /// Returns whether the button is currently held down. Instantaneous
    /// state, no buffering: the engine polls once per update.
    fn button_state(&self, device: InputDevice, button: Button) -> bool;

    /// Returns the instantaneous position of an analog axis in the range
    /// -1..=1.
    fn axis_state(&self, device: InputDevice, axis: Axis) -> f32;

    /// Returns the instantaneous state of a directional hat.
    fn hat_state(&self, device: InputDevice) -> HatState;

    /// Returns the amount of time elapsed since the platform was
    /// initialized.
    fn elapsed(&self) -> Duration;

    /// Print out a string. For very crude debugging.
    fn println(&self, message: &str);

    /// Request the process to exit, with `clean: false` if intending to
    /// signal failure.
    fn exit(&self, clean: bool);

    /// Allocate the given amount of bytes (returning a null pointer on
    /// error). Not called often from the engine, memory is allocated in
    /// big chunks, so this can be slow and defensively implemented.
    fn malloc(&self, size: usize) -> *mut c_void;

    /// Grow or shrink an allocation made by [`Pal::malloc`], possibly
    /// relocating it. The old pointer must not be used afterwards.
    ///
    /// ## Safety
    ///
    /// - `ptr` must have been returned by [`Pal::malloc`] or
    ///   [`Pal::realloc`] on this same platform, and not freed since.
    unsafe fn realloc(&self, ptr: *mut c_void, new_size: usize) -> *mut c_void;

    /// Free the memory allocated by [`Pal::malloc`] or [`Pal::realloc`].
    ///
    /// ## Safety
    ///
    /// - Since the implementation is free to free the memory, the memory
    ///   pointed at by the given pointer shouldn't be accessed after
    ///   calling this.
    unsafe fn free(&self, ptr: *mut c_void);
}
