// SPDX-FileCopyrightText: 2025 Ashton Warner
//
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::{Color, Vec2};

/// An opaque physics backend, owned by the simulation loop. The engine
/// never creates bodies or shapes itself: entity specializations do that
/// directly against whatever concrete backend is in use, the core only
/// steps the world and forwards its debug geometry.
///
/// [`Send`] is required because in the dual-thread configuration the
/// world is stepped on the fixed-rate thread but created and destroyed
/// on the thread that owns the engine.
pub trait PhysicsWorld: Send {
    /// Advances the simulation by `timestep` seconds, split into
    /// `substeps` solver iterations.
    fn step(&mut self, timestep: f32, substeps: u32);

    /// Visits the world's debug geometry with the given visitor. The
    /// coordinates passed to the visitor are in world space (meters).
    fn debug_draw(&self, visitor: &mut dyn DebugDraw);
}

/// Visitor for [`PhysicsWorld::debug_draw`]. Implementations translate
/// the world-space geometry into actual draw calls.
pub trait DebugDraw {
    /// A closed polygon outline.
    fn polygon(&mut self, vertices: &[Vec2], color: Color);
    /// A filled convex polygon with its vertices relative to `position`.
    fn solid_polygon(&mut self, position: Vec2, vertices: &[Vec2], color: Color);
    /// A circle outline.
    fn circle(&mut self, center: Vec2, radius: f32, color: Color);
    /// A line segment.
    fn segment(&mut self, from: Vec2, to: Vec2, color: Color);
    /// A point, drawn `size` surface units wide.
    fn point(&mut self, position: Vec2, size: f32, color: Color);
    /// A text label anchored at a world-space position.
    fn label(&mut self, position: Vec2, text: &str, color: Color);
}
