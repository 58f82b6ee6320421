// SPDX-FileCopyrightText: 2025 Ashton Warner
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! A headless demo of the engine: a toy physics world of falling boxes,
//! a small scene graph with a HUD, and both loop configurations run
//! back to back against a platform that logs instead of opening a
//! window.

use std::{
    ffi::c_void,
    sync::Arc,
    time::{Duration, Instant},
};

use engine::{
    app::{App, AppOptions},
    entities::{Entity, EntityBase, EntityId, EntityTree},
    input::{Action, ActionKind, InputDeviceState},
    render::RenderContext,
};
use enum_map::{enum_map, Enum};
use pal::{
    Axis, Button, Color, DebugDraw, HatState, InputDevice, InputDevices, Pal, PhysicsWorld,
    Rect, Vec2,
};
use parking_lot::Mutex;

const DRAW_AREA: (f32, f32) = (640.0, 480.0);
const SINGLE_THREAD_FRAMES: u32 = 120;
const THREADED_FRAMES: u32 = 240;

// Logging

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            println!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

// Platform

/// A [`Pal`] with no window behind it. Draw calls vanish, the clock is
/// the real monotonic clock, and memory comes straight from libc.
struct HeadlessPlatform {
    start: Instant,
}

impl HeadlessPlatform {
    fn new() -> HeadlessPlatform {
        HeadlessPlatform {
            start: Instant::now(),
        }
    }
}

impl Pal for HeadlessPlatform {
    fn draw_area(&self) -> (f32, f32) {
        DRAW_AREA
    }

    fn clear(&self) {}
    fn present(&self) {}
    fn draw_rectangle(&self, _rect: Rect, _color: Color, _fill: bool) {}
    fn draw_line(&self, _from: Vec2, _to: Vec2, _color: Color) {}
    fn draw_text(&self, _position: Vec2, _text: &str, _color: Color) {}

    fn input_devices(&self) -> InputDevices {
        let mut devices = InputDevices::new();
        devices.push(InputDevice::new(0));
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
        self.start.elapsed()
    }

    fn println(&self, message: &str) {
        println!("{message}");
    }

    fn exit(&self, clean: bool) {
        std::process::exit(if clean { 0 } else { 1 });
    }

    fn malloc(&self, size: usize) -> *mut c_void {
        // Safety: libc::malloc is safe to call with any size.
        unsafe { libc::malloc(size) as *mut c_void }
    }

    unsafe fn realloc(&self, ptr: *mut c_void, new_size: usize) -> *mut c_void {
        // Safety: per the trait contract, ptr is a live libc block.
        unsafe { libc::realloc(ptr as *mut libc::c_void, new_size) as *mut c_void }
    }

    unsafe fn free(&self, ptr: *mut c_void) {
        // Safety: same as realloc.
        unsafe { libc::free(ptr as *mut libc::c_void) };
    }
}

// Physics

#[derive(Clone, Copy)]
struct BoxBody {
    position: Vec2,
    velocity: Vec2,
    half_extent: f32,
}

/// A toy [`PhysicsWorld`]: axis-aligned boxes falling onto a flat
/// ground at y = 0, losing half their speed on every bounce. Units are
/// meters, like a real backend would use.
struct FallingBoxes {
    gravity: Vec2,
    bodies: Vec<BoxBody>,
}

impl FallingBoxes {
    fn new(gravity: Vec2) -> FallingBoxes {
        FallingBoxes {
            gravity,
            bodies: Vec::new(),
        }
    }

    fn spawn(&mut self, position: Vec2, half_extent: f32) {
        self.bodies.push(BoxBody {
            position,
            velocity: Vec2::ZERO,
            half_extent,
        });
    }
}

impl PhysicsWorld for FallingBoxes {
    fn step(&mut self, timestep: f32, substeps: u32) {
        let dt = timestep / substeps as f32;
        for _ in 0..substeps {
            for body in &mut self.bodies {
                body.velocity = body.velocity + Vec2::new(self.gravity.x * dt, self.gravity.y * dt);
                body.position =
                    body.position + Vec2::new(body.velocity.x * dt, body.velocity.y * dt);
                if body.position.y - body.half_extent < 0.0 && body.velocity.y < 0.0 {
                    body.position.y = body.half_extent;
                    body.velocity.y = -body.velocity.y / 2.0;
                }
            }
        }
    }

    fn debug_draw(&self, visitor: &mut dyn DebugDraw) {
        visitor.segment(Vec2::ZERO, Vec2::new(20.0, 0.0), Color::from_hex(0x00FF00));
        for body in &self.bodies {
            let h = body.half_extent;
            let corners = [
                Vec2::new(-h, -h),
                Vec2::new(h, -h),
                Vec2::new(h, h),
                Vec2::new(-h, h),
            ];
            visitor.solid_polygon(body.position, &corners, Color::from_hex(0xFF8800));
            visitor.point(body.position, 3.0, Color::WHITE);
        }
    }
}

// Input

#[derive(Enum)]
enum DemoAction {
    Quit,
    ToggleOverlay,
}

fn demo_input(platform: &dyn Pal) -> Option<InputDeviceState<DemoAction>> {
    let device = platform.input_devices().first().copied()?;
    Some(InputDeviceState {
        device,
        actions: enum_map! {
            DemoAction::Quit => Action::new(ActionKind::Instant, Button::Start),
            DemoAction::ToggleOverlay => Action::new(ActionKind::Toggle, Button::Select),
        },
    })
}

// Scene

/// Root of the demo scene. Owns nothing itself, but shows the shape a
/// real scene takes: children spawned at creation, resources logged
/// away in destroy.
struct SceneRoot {
    base: EntityBase,
}

impl SceneRoot {
    fn spawn(tree: &mut EntityTree) -> EntityId {
        let root = tree.insert(Box::new(SceneRoot {
            base: EntityBase::new(0.0, 0.0, 0.0, 0.0),
        }));
        for i in 0..3 {
            let crate_id = DriftingCrate::spawn(tree, Vec2::new(60.0 * i as f32, -80.0));
            tree.add_child(root, Some(crate_id));
        }
        root
    }
}

impl Entity for SceneRoot {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn destroy(&mut self, tree: &mut EntityTree, id: EntityId) {
        let children = tree.child_ids(id);
        log::info!(
            "scene root going away, destroying {} children",
            children.len(),
        );
        for &child in children.as_slice() {
            tree.destroy(child);
        }
        tree.recycle(children);
    }
}

/// A crate sliding right along the screen, wrapping around the edge.
struct DriftingCrate {
    base: EntityBase,
    speed: f32,
}

impl DriftingCrate {
    fn spawn(tree: &mut EntityTree, position: Vec2) -> EntityId {
        let base = EntityBase::new(position.x, position.y, 24.0, 24.0);
        tree.insert(Box::new(DriftingCrate { base, speed: 40.0 }))
    }
}

impl Entity for DriftingCrate {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn update(&mut self, tree: &mut EntityTree, id: EntityId, delta_seconds: f64) {
        self.base.position.x += self.speed * delta_seconds as f32;
        if self.base.position.x > DRAW_AREA.0 {
            self.base.position.x = -self.base.width;
        }
        let children = tree.child_ids(id);
        for &child in children.as_slice() {
            tree.update(child, delta_seconds);
        }
        tree.recycle(children);
    }

    fn render(&mut self, tree: &mut EntityTree, id: EntityId, ctx: &mut RenderContext) {
        let tf = ctx.transform();
        ctx.platform().draw_rectangle(
            Rect::xywh(tf.x, tf.y, self.base.width, self.base.height),
            Color::from_hex(0xAA6622),
            true,
        );
        let children = tree.child_ids(id);
        for &child in children.as_slice() {
            tree.render(child, ctx);
        }
        tree.recycle(children);
    }
}

#[derive(Default)]
struct FrameStats {
    frame_seconds: f64,
    fps: f64,
}

/// Draws frame timing as text in the top-left corner.
struct Hud {
    base: EntityBase,
    stats: Arc<Mutex<FrameStats>>,
}

impl Hud {
    fn spawn(tree: &mut EntityTree, stats: Arc<Mutex<FrameStats>>) -> EntityId {
        // The scene origin sits at the bottom-left corner; back it out
        // so the HUD lands in screen coordinates.
        let base = EntityBase::new(10.0, 10.0 - DRAW_AREA.1, 0.0, 0.0);
        tree.insert(Box::new(Hud { base, stats }))
    }
}

impl Entity for Hud {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn render(&mut self, _tree: &mut EntityTree, _id: EntityId, ctx: &mut RenderContext) {
        let tf = ctx.transform();
        let stats = self.stats.lock();
        let platform = ctx.platform();
        platform.draw_text(
            tf,
            &format!("{:.4}s", stats.frame_seconds),
            Color::WHITE,
        );
        platform.draw_text(
            Vec2::new(tf.x, tf.y + 20.0),
            &format!("{:.2}fps", stats.fps),
            Color::WHITE,
        );
    }
}

fn main() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Debug);
    }

    let platform = HeadlessPlatform::new();
    let stats = Arc::new(Mutex::new(FrameStats::default()));

    let mut world = FallingBoxes::new(Vec2::new(0.0, -10.0));
    world.spawn(Vec2::new(4.0, 8.0), 0.5);
    world.spawn(Vec2::new(7.0, 12.0), 0.8);

    let mut scene = EntityTree::new(&platform);
    let root = SceneRoot::spawn(&mut scene);
    let hud = Hud::spawn(&mut scene, stats.clone());
    scene.add_child(root, Some(hud));

    let app = App::new(&platform, AppOptions::default(), scene, root, world);
    let mut input = demo_input(&platform);

    // Configuration 1: everything on this thread, step + update +
    // render per iteration, capped to the tick rate.
    log::info!("running {SINGLE_THREAD_FRAMES} single-thread frames");
    let tick = Duration::from_secs_f32(app.options().timestep);
    let mut frame_start = platform.elapsed();
    for _ in 0..SINGLE_THREAD_FRAMES {
        let delta = stats.lock().frame_seconds.max(1.0 / 60.0);
        app.frame(delta);

        if let Some(input) = &mut input {
            input.update(&platform);
            if input.actions[DemoAction::Quit].pressed {
                app.stop();
                break;
            }
        }

        let spent = platform.elapsed().saturating_sub(frame_start);
        if let Some(remaining) = tick.checked_sub(spent) {
            std::thread::sleep(remaining);
        }
        let now = platform.elapsed();
        let frame_seconds = now.saturating_sub(frame_start).as_secs_f64();
        let mut stats = stats.lock();
        stats.frame_seconds = frame_seconds;
        stats.fps = if frame_seconds > 0.0 {
            1.0 / frame_seconds
        } else {
            0.0
        };
        frame_start = now;
    }

    // Configuration 2: the fixed-rate loop on its own thread, this
    // thread rendering as fast as the frame cap allows.
    log::info!("running {THREADED_FRAMES} frames against the fixed-rate thread");
    let mut frames = 0u32;
    let mut frame_start = platform.elapsed();
    app.run_threaded(|app| {
        app.render_frame();

        if let Some(input) = &mut input {
            input.update(app.platform());
            if input.actions[DemoAction::Quit].pressed {
                app.stop();
            }
        }

        let spent = app.platform().elapsed().saturating_sub(frame_start);
        if let Some(remaining) = tick.checked_sub(spent) {
            std::thread::sleep(remaining);
        }
        let now = app.platform().elapsed();
        let frame_seconds = now.saturating_sub(frame_start).as_secs_f64();
        let mut stats = stats.lock();
        stats.frame_seconds = frame_seconds;
        stats.fps = if frame_seconds > 0.0 {
            1.0 / frame_seconds
        } else {
            0.0
        };
        frame_start = now;

        frames += 1;
        if frames >= THREADED_FRAMES {
            app.stop();
        }
    });

    app.shutdown();
    log::info!("demo finished");
}
