// SPDX-FileCopyrightText: 2025 Ashton Warner
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Per-frame rendering state. A [`RenderContext`] lives for exactly one
//! frame: the frame loop creates it after clearing the surface, the
//! scene graph pushes and pops camera offsets on it while drawing, and
//! it's destroyed before present.

mod debug_draw;

pub use debug_draw::{DebugRenderer, PIXELS_PER_METER};

use pal::{Pal, Vec2};

use crate::{allocators::SystemAllocator, collections::Stack};

/// The drawing interface handed down through the scene graph: the
/// platform's draw calls plus a stack of accumulated translation
/// offsets, so that every entity draws relative to its parent.
pub struct RenderContext<'p> {
    platform: &'p dyn Pal,
    alloc: SystemAllocator<'p>,
    transforms: Stack<Vec2>,
}

impl<'p> RenderContext<'p> {
    /// Creates a context with an empty transform stack. The stack's
    /// buffer comes from the platform heap and is released by
    /// [`RenderContext::destroy`], not by dropping.
    pub fn new(platform: &'p dyn Pal) -> RenderContext<'p> {
        let mut alloc = SystemAllocator::new(platform);
        let transforms = Stack::new(&mut alloc);
        RenderContext {
            platform,
            alloc,
            transforms,
        }
    }

    pub fn platform(&self) -> &'p dyn Pal {
        self.platform
    }

    /// The currently accumulated translation. With nothing pushed, the
    /// origin.
    pub fn transform(&self) -> Vec2 {
        self.transforms.peek().copied().unwrap_or(Vec2::ZERO)
    }

    /// Pushes an absolute translation that [`RenderContext::transform`]
    /// returns until the matching [`RenderContext::pop_transform`].
    /// Note that `offset` is not relative to the previous transform;
    /// callers add [`RenderContext::transform`] in themselves first.
    pub fn push_transform(&mut self, offset: Vec2) {
        self.transforms.push(&mut self.alloc, offset);
    }

    /// Pops the most recently pushed translation. Popping more than was
    /// pushed is a fatal usage error, as it means some entity's
    /// pre/post render pair is unbalanced.
    pub fn pop_transform(&mut self) {
        self.transforms.pop();
    }

    /// How many transforms are currently pushed.
    pub fn transform_depth(&self) -> usize {
        self.transforms.len()
    }

    /// Releases the transform stack back to the platform heap. The
    /// frame loop calls this once per frame, right before present.
    pub fn destroy(mut self) {
        self.transforms.destroy(&mut self.alloc);
    }
}
