// SPDX-FileCopyrightText: 2025 Ashton Warner
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! The outer loops: fixed-rate simulation and display-rate rendering,
//! either interleaved on one thread or split across two.

use core::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};
use std::thread;

use pal::{Pal, PhysicsWorld, Vec2};
use parking_lot::Mutex;

use crate::{
    entities::{EntityId, EntityTree},
    render::{DebugRenderer, RenderContext},
};

/// Knobs the embedder sets once at startup. No singletons: whoever
/// creates the [`App`] decides these and passes them in.
pub struct AppOptions {
    /// Whether to draw the physics world's debug geometry over the
    /// scene each frame (when the world lock can be taken without
    /// waiting).
    pub draw_physics_overlay: bool,
    /// Seconds of simulated time per physics step.
    pub timestep: f32,
    /// Solver iterations within one step.
    pub substeps: u32,
}

impl Default for AppOptions {
    fn default() -> AppOptions {
        AppOptions {
            draw_physics_overlay: true,
            timestep: 1.0 / 60.0,
            substeps: 4,
        }
    }
}

/// The engine's top-level state: the scene graph, the physics world,
/// and the run flag, each shareable across the two threads of the
/// dual-thread configuration.
///
/// Locking discipline: the simulation side takes the world lock
/// blocking, around `step` only, so a step is never skipped. The render
/// side only ever try-locks the world, for the optional debug overlay,
/// and skips the overlay for that one frame on contention. The scene
/// has its own lock; it is held across a whole update or a whole
/// render pass, whichever comes first.
pub struct App<'p, W: PhysicsWorld> {
    platform: &'p dyn Pal,
    options: AppOptions,
    scene: Mutex<EntityTree<'p>>,
    scene_root: EntityId,
    world: Mutex<W>,
    running: AtomicBool,
    tick_interval: Duration,
}

impl<'p, W: PhysicsWorld> App<'p, W> {
    pub fn new(
        platform: &'p dyn Pal,
        options: AppOptions,
        scene: EntityTree<'p>,
        scene_root: EntityId,
        world: W,
    ) -> App<'p, W> {
        let tick_interval = Duration::from_secs_f32(options.timestep);
        log::info!(
            "engine starting, {:?} per simulation tick, {} substeps",
            tick_interval,
            options.substeps,
        );
        App {
            platform,
            options,
            scene: Mutex::new(scene),
            scene_root,
            world: Mutex::new(world),
            running: AtomicBool::new(true),
            tick_interval,
        }
    }

    pub fn platform(&self) -> &'p dyn Pal {
        self.platform
    }

    pub fn options(&self) -> &AppOptions {
        &self.options
    }

    pub fn scene(&self) -> &Mutex<EntityTree<'p>> {
        &self.scene
    }

    pub fn scene_root(&self) -> EntityId {
        self.scene_root
    }

    pub fn world(&self) -> &Mutex<W> {
        &self.world
    }

    pub fn running(&self) -> bool {
        // The run flag is only a stop signal, the mutexes order all the
        // data it guards.
        self.running.load(Ordering::Relaxed)
    }

    /// Requests every loop to wind down. Callable from any thread, any
    /// number of times.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::Relaxed) {
            log::info!("stop requested");
        }
    }

    /// One iteration of the single-thread configuration: physics step,
    /// then the scene update with `delta_seconds` of wall-clock time,
    /// then a rendered frame, in that order.
    pub fn frame(&self, delta_seconds: f64) {
        self.world
            .lock()
            .step(self.options.timestep, self.options.substeps);
        self.scene.lock().update(self.scene_root, delta_seconds);
        self.render_frame();
    }

    /// Renders one frame: the scene pass rooted at the bottom-left
    /// origin, then the best-effort physics overlay, then present.
    pub fn render_frame(&self) {
        self.platform.clear();
        let mut ctx = RenderContext::new(self.platform);
        // World-space y points up, surface y points down. Starting the
        // camera at the bottom edge makes the scene's origin the
        // bottom-left corner.
        let (_, height) = self.platform.draw_area();
        ctx.push_transform(Vec2::new(0.0, height));

        self.scene.lock().render(self.scene_root, &mut ctx);

        if self.options.draw_physics_overlay {
            // Never wait for the simulation thread here. A frame
            // without the overlay beats a late frame.
            match self.world.try_lock() {
                Some(world) => {
                    let mut visitor = DebugRenderer::new(&ctx);
                    world.debug_draw(&mut visitor);
                }
                None => log::debug!("world lock contended, skipping the physics overlay"),
            }
        }

        ctx.pop_transform();
        ctx.destroy();
        self.platform.present();
    }

    /// One simulation tick: steps the world under the blocking lock,
    /// updates the scene outside it, and returns how much of the tick
    /// interval is left over, measured on the platform clock. None when
    /// the tick overran the interval.
    fn run_tick(&self) -> Option<Duration> {
        let tick_start = self.platform.elapsed();
        self.world
            .lock()
            .step(self.options.timestep, self.options.substeps);
        self.scene
            .lock()
            .update(self.scene_root, self.options.timestep as f64);
        let elapsed = self.platform.elapsed().saturating_sub(tick_start);
        self.tick_interval.checked_sub(elapsed)
    }

    /// The fixed-rate simulation loop. Runs until [`App::stop`],
    /// sleeping away whatever each tick leaves of the tick interval.
    pub fn fixed_rate_loop(&self) {
        log::info!("simulation thread entering its fixed-rate loop");
        while self.running() {
            if let Some(remaining) = self.run_tick() {
                thread::sleep(remaining);
            }
        }
        log::info!("simulation thread exiting");
    }

    /// The dual-thread configuration: spawns the fixed-rate loop on its
    /// own thread and runs `render_frame` on the calling thread until
    /// the app is stopped (typically from within `render_frame`, on a
    /// quit input). The simulation thread is joined before this
    /// returns, so the caller may tear the world down immediately
    /// after.
    pub fn run_threaded<F>(&self, mut render_frame: F)
    where
        F: FnMut(&App<'p, W>),
    {
        thread::scope(|scope| {
            scope.spawn(|| self.fixed_rate_loop());
            while self.running() {
                render_frame(self);
            }
            // Leaving the scope joins the simulation thread.
        });
        log::info!("simulation thread joined");
    }

    /// Stops the loops and destroys the scene, entity by entity, so
    /// every entity's destroy runs while the world is still alive. The
    /// world itself is dropped last, as this consumes the app.
    pub fn shutdown(self) {
        self.stop();
        {
            let mut scene = self.scene.lock();
            scene.destroy(self.scene_root);
        }
        log::info!("engine shut down");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use core::time::Duration;

    use pal::{DebugDraw, Pal, PhysicsWorld, Vec2};
    use parking_lot::Mutex;

    use crate::{
        entities::{Entity, EntityBase, EntityId, EntityTree},
        render::RenderContext,
        test_platform::{DrawCall, TestPlatform},
    };

    use super::{App, AppOptions};

    type EventLog = Arc<Mutex<Vec<String>>>;

    struct RecordingWorld {
        events: EventLog,
        drops: Arc<AtomicUsize>,
    }

    impl PhysicsWorld for RecordingWorld {
        fn step(&mut self, _timestep: f32, _substeps: u32) {
            self.events.lock().push("step".to_string());
        }

        fn debug_draw(&self, visitor: &mut dyn DebugDraw) {
            visitor.segment(Vec2::ZERO, Vec2::new(1.0, 0.0), pal::Color::WHITE);
        }
    }

    impl Drop for RecordingWorld {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct RecordingEntity {
        base: EntityBase,
        events: EventLog,
    }

    impl Entity for RecordingEntity {
        fn base(&self) -> &EntityBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut EntityBase {
            &mut self.base
        }

        fn update(&mut self, _tree: &mut EntityTree, _id: EntityId, _delta_seconds: f64) {
            self.events.lock().push("update".to_string());
        }
    }

    fn recording_app<'p>(
        platform: &'p TestPlatform,
        events: &EventLog,
        drops: &Arc<AtomicUsize>,
    ) -> App<'p, RecordingWorld> {
        let mut scene = EntityTree::new(platform);
        let root = scene.insert(Box::new(RecordingEntity {
            base: EntityBase::default(),
            events: events.clone(),
        }));
        let world = RecordingWorld {
            events: events.clone(),
            drops: drops.clone(),
        };
        App::new(platform, AppOptions::default(), scene, root, world)
    }

    #[test]
    fn single_thread_frame_steps_before_updating() {
        let platform = TestPlatform::new();
        let events = EventLog::default();
        let drops = Arc::new(AtomicUsize::new(0));
        let app = recording_app(&platform, &events, &drops);

        app.frame(1.0 / 60.0);
        app.frame(1.0 / 60.0);
        assert_eq!(vec!["step", "update", "step", "update"], *events.lock());
        app.shutdown();
    }

    #[test]
    fn shutdown_joins_and_destroys_the_world_exactly_once() {
        let platform = TestPlatform::new();
        let events = EventLog::default();
        let drops = Arc::new(AtomicUsize::new(0));
        let app = recording_app(&platform, &events, &drops);

        // Stop on the very first rendered frame; run_threaded must
        // still come back with the simulation thread joined.
        app.run_threaded(|app| {
            app.render_frame();
            app.stop();
        });
        assert!(!app.running());
        assert_eq!(0, drops.load(Ordering::SeqCst));
        app.shutdown();
        assert_eq!(1, drops.load(Ordering::SeqCst));
    }

    #[test]
    fn overlay_is_skipped_while_the_world_lock_is_held() {
        let platform = TestPlatform::new();
        let events = EventLog::default();
        let drops = Arc::new(AtomicUsize::new(0));
        let app = recording_app(&platform, &events, &drops);

        let overlay_lines = |platform: &TestPlatform| {
            platform
                .draw_calls()
                .iter()
                .filter(|call| matches!(call, DrawCall::Line(..)))
                .count()
        };

        app.render_frame();
        assert_eq!(1, overlay_lines(&platform), "uncontended overlay should draw");

        let world_guard = app.world().lock();
        app.render_frame();
        assert_eq!(0, overlay_lines(&platform), "contended overlay must be skipped");
        drop(world_guard);

        app.render_frame();
        assert_eq!(1, overlay_lines(&platform));
        app.shutdown();
    }

    #[test]
    fn overlay_respects_the_option() {
        let platform = TestPlatform::new();
        let events = EventLog::default();
        let drops = Arc::new(AtomicUsize::new(0));
        let mut scene = EntityTree::new(&platform);
        let root = scene.insert(Box::new(RecordingEntity {
            base: EntityBase::default(),
            events: events.clone(),
        }));
        let app = App::new(
            &platform,
            AppOptions {
                draw_physics_overlay: false,
                ..AppOptions::default()
            },
            scene,
            root,
            RecordingWorld {
                events: events.clone(),
                drops: drops.clone(),
            },
        );

        app.render_frame();
        assert!(platform.draw_calls().is_empty());
        app.shutdown();
    }

    #[test]
    fn tick_sleeps_only_for_the_unused_part_of_the_interval() {
        /// Charges a configurable amount of platform-clock time per
        /// step, so tick pacing can be tested without real sleeping.
        struct ClockedWorld<'a> {
            platform: &'a TestPlatform,
            step_millis: u64,
        }

        impl PhysicsWorld for ClockedWorld<'_> {
            fn step(&mut self, _timestep: f32, _substeps: u32) {
                let now = self.platform.elapsed().as_millis() as u64 + self.step_millis;
                self.platform.set_elapsed_millis(now);
            }

            fn debug_draw(&self, _visitor: &mut dyn DebugDraw) {}
        }

        let platform = TestPlatform::new();
        let events = EventLog::default();
        let mut scene = EntityTree::new(&platform);
        let root = scene.insert(Box::new(RecordingEntity {
            base: EntityBase::default(),
            events: events.clone(),
        }));
        let app = App::new(
            &platform,
            AppOptions {
                // A quarter second is exact in binary, so the
                // remainders below come out in whole milliseconds.
                timestep: 0.25,
                ..AppOptions::default()
            },
            scene,
            root,
            ClockedWorld {
                platform: &platform,
                step_millis: 0,
            },
        );

        // A free tick leaves the whole interval to sleep away.
        assert_eq!(Some(Duration::from_millis(250)), app.run_tick());

        app.world().lock().step_millis = 100;
        assert_eq!(Some(Duration::from_millis(150)), app.run_tick());

        // An overrunning tick leaves nothing.
        app.world().lock().step_millis = 300;
        assert_eq!(None, app.run_tick());
        app.shutdown();
    }

    #[test]
    fn render_frame_wraps_the_scene_in_the_viewport_transform() {
        struct TransformProbe {
            base: EntityBase,
            seen: Arc<Mutex<Option<Vec2>>>,
        }

        impl Entity for TransformProbe {
            fn base(&self) -> &EntityBase {
                &self.base
            }
            fn base_mut(&mut self) -> &mut EntityBase {
                &mut self.base
            }
            fn render(
                &mut self,
                _tree: &mut EntityTree,
                _id: EntityId,
                ctx: &mut RenderContext,
            ) {
                *self.seen.lock() = Some(ctx.transform());
            }
        }

        let platform = TestPlatform::new();
        let seen = Arc::new(Mutex::new(None));
        let mut scene = EntityTree::new(&platform);
        let root = scene.insert(Box::new(TransformProbe {
            base: EntityBase::default(),
            seen: seen.clone(),
        }));
        let drops = Arc::new(AtomicUsize::new(0));
        let app = App::new(
            &platform,
            AppOptions {
                draw_physics_overlay: false,
                ..AppOptions::default()
            },
            scene,
            root,
            RecordingWorld {
                events: EventLog::default(),
                drops: drops.clone(),
            },
        );

        app.render_frame();
        let (_, height) = platform.draw_area();
        assert_eq!(Some(Vec2::new(0.0, height)), *seen.lock());
        app.shutdown();
    }
}
