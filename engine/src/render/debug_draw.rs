// SPDX-FileCopyrightText: 2025 Ashton Warner
//
// SPDX-License-Identifier: GPL-3.0-or-later

use pal::{Color, DebugDraw, Rect, Vec2};

use super::RenderContext;

/// Scale factor between physics-world meters and surface pixels.
pub const PIXELS_PER_METER: f32 = 32.0;

/// [`DebugDraw`] visitor that projects the physics world's meter-space
/// geometry onto the surface, through the frame's current camera
/// transform. Point sizes and text stay in pixels.
pub struct DebugRenderer<'a, 'p> {
    ctx: &'a RenderContext<'p>,
}

impl<'a, 'p> DebugRenderer<'a, 'p> {
    pub fn new(ctx: &'a RenderContext<'p>) -> DebugRenderer<'a, 'p> {
        DebugRenderer { ctx }
    }

    fn project(&self, point: Vec2) -> Vec2 {
        let tf = self.ctx.transform();
        Vec2::new(
            point.x * PIXELS_PER_METER + tf.x,
            point.y * PIXELS_PER_METER + tf.y,
        )
    }
}

impl DebugDraw for DebugRenderer<'_, '_> {
    fn polygon(&mut self, vertices: &[Vec2], color: Color) {
        if vertices.len() < 3 {
            return;
        }
        let platform = self.ctx.platform();
        let mut previous = self.project(vertices[vertices.len() - 1]);
        for &vertex in vertices {
            let projected = self.project(vertex);
            platform.draw_line(previous, projected, color);
            previous = projected;
        }
    }

    fn solid_polygon(&mut self, position: Vec2, vertices: &[Vec2], color: Color) {
        if vertices.len() < 3 {
            return;
        }
        // No triangle filling in the platform interface, so the fill is
        // approximated with a translucent outline.
        let platform = self.ctx.platform();
        let color = color.with_alpha(0x7F);
        let offset = self.project(position);
        let at = |v: Vec2| {
            Vec2::new(
                v.x * PIXELS_PER_METER + offset.x,
                v.y * PIXELS_PER_METER + offset.y,
            )
        };
        let mut previous = at(vertices[vertices.len() - 1]);
        for &vertex in vertices {
            let projected = at(vertex);
            platform.draw_line(previous, projected, color);
            previous = projected;
        }
    }

    fn circle(&mut self, _center: Vec2, _radius: f32, _color: Color) {
        // The worlds drawn so far are all boxes and segments, circles
        // aren't rendered yet.
    }

    fn segment(&mut self, from: Vec2, to: Vec2, color: Color) {
        self.ctx
            .platform()
            .draw_line(self.project(from), self.project(to), color);
    }

    fn point(&mut self, position: Vec2, size: f32, color: Color) {
        let half = size / 2.0;
        let tf = self.ctx.transform();
        // Only the position scales, the size is already in pixels.
        let rect = Rect::xywh(
            (position.x - half) * PIXELS_PER_METER + tf.x,
            (position.y - half) * PIXELS_PER_METER + tf.y,
            size,
            size,
        );
        self.ctx.platform().draw_rectangle(rect, color, true);
    }

    fn label(&mut self, position: Vec2, text: &str, color: Color) {
        self.ctx
            .platform()
            .draw_text(self.project(position), text, color);
    }
}
