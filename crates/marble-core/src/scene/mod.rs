//! Scene/physics engine for a race.
//!
//! [`SceneEngine`] owns the physics world, the render scene, the camera and
//! one [`MarbleBody`] per marble. Its lifecycle is
//! `uninitialized -> idle -> racing -> idle -> ... -> destroyed`:
//!
//! - [`SceneEngine::initialize_scene`] snapshots the roster, builds the
//!   course and starts requesting frames.
//! - [`SceneEngine::frame`] runs once per display refresh: one fixed physics
//!   step, mesh/label sync, finish-line check, camera follow, render.
//! - [`SceneEngine::start_race`] / [`SceneEngine::reset_race`] switch the
//!   marbles between moving and parked on their start slots.
//! - [`SceneEngine::destroy`] stops the frame loop and drops everything.
//!
//! Misuse (starting before initializing, destroying twice, ...) is a no-op.

mod camera;
mod frame;
mod track;

pub use camera::{OrbitControls, follow};
pub use frame::{FrameScheduler, ManualFrames};
pub use track::{MarbleBody, MarbleSnapshot, label_position, track_normal};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::RaceConfig;
use crate::marble::Marble;
use crate::physics::{Motion, PhysicsWorld, Vec3};
use crate::render::{Camera, DirectionalLight, RenderError, RenderScene};

/// Called once with the winner's roster index when a marble crosses the
/// finish line.
pub type FinishCallback = Box<dyn FnMut(usize)>;

/// Error initializing a scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Everything built by `initialize_scene` and dropped by `destroy`.
struct Stage<P, R> {
    world: P,
    scene: R,
    marbles: Vec<MarbleBody>,
    camera: Camera,
    controls: OrbitControls,
    lead: Option<usize>,
}

/// Owns simulation and rendering of one race course.
pub struct SceneEngine<P: PhysicsWorld, R: RenderScene> {
    config: RaceConfig,
    scheduler: Box<dyn FrameScheduler>,
    stage: Option<Stage<P, R>>,
    race_active: bool,
    on_finish: Option<FinishCallback>,
    frames: u64,
}

impl<P: PhysicsWorld, R: RenderScene> std::fmt::Debug for SceneEngine<P, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneEngine")
            .field("initialized", &self.is_initialized())
            .field("race_active", &self.race_active)
            .field("marbles", &self.marble_count())
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

impl<P: PhysicsWorld, R: RenderScene> SceneEngine<P, R> {
    pub fn new(config: RaceConfig, scheduler: impl FrameScheduler + 'static) -> Self {
        Self {
            config,
            scheduler: Box::new(scheduler),
            stage: None,
            race_active: false,
            on_finish: None,
            frames: 0,
        }
    }

    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.stage.is_some()
    }

    pub fn race_active(&self) -> bool {
        self.race_active
    }

    /// Builds the course for `marbles` on a surface attached to `container`
    /// and starts the frame loop. Does nothing when already initialized.
    pub fn initialize_scene(
        &mut self,
        container: &R::Container,
        marbles: &[Marble],
        on_finish: Option<FinishCallback>,
    ) -> Result<(), SceneError> {
        if self.stage.is_some() {
            tracing::debug!("scene already initialized");
            return Ok(());
        }

        let mut scene = R::attach(container)?;
        let config = &self.config;

        let camera_config = &config.camera;
        let mut camera = Camera {
            position: Vec3::from(camera_config.position),
            target: Vec3::zeros(),
            fov: camera_config.fov,
            near: camera_config.near,
            far: camera_config.far,
        };

        let light = &config.light;
        scene.add_light(DirectionalLight {
            color: light.color,
            intensity: light.intensity,
            direction: Vec3::from(light.direction)
                .try_normalize(f32::EPSILON)
                .unwrap_or_else(Vec3::y),
        });

        let mut world = P::new(config.gravity(), config.physics.time_step);
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        track::build_track(config, &mut world, &mut scene);
        let obstacles = track::scatter_obstacles(config, &mut rng, &mut world, &mut scene);
        let bodies = track::place_marbles(config, marbles, &mut world, &mut scene);

        let controls = OrbitControls::default();
        controls.update(&mut camera);

        tracing::info!(marbles = bodies.len(), obstacles, seed, "scene initialized");

        self.stage = Some(Stage {
            world,
            scene,
            marbles: bodies,
            camera,
            controls,
            lead: None,
        });
        self.on_finish = on_finish;
        self.race_active = false;
        self.frames = 0;
        self.scheduler.schedule();
        Ok(())
    }

    /// Per-frame update. Requests the next frame first, then steps physics,
    /// syncs visuals, checks the finish line, moves the camera and renders.
    /// Does nothing when the scene is not initialized, which ends the loop.
    pub fn frame(&mut self) {
        let Some(stage) = self.stage.as_mut() else {
            return;
        };
        self.scheduler.schedule();
        self.frames += 1;

        stage.world.step();

        let mut lead: Option<(usize, Vec3)> = None;
        for (index, marble) in stage.marbles.iter_mut().enumerate() {
            if let Some(position) = stage.world.position(marble.body) {
                marble.position = position;
            }
            stage.scene.set_mesh_position(marble.mesh, marble.position);
            stage
                .scene
                .set_label_position(marble.label, label_position(&self.config, marble.position));

            if lead.is_none_or(|(_, best)| marble.position.z > best.z) {
                lead = Some((index, marble.position));
            }
        }

        let lead_index = lead.map(|(index, _)| index);
        if lead_index != stage.lead {
            tracing::trace!(lead = ?lead_index, frame = self.frames, "lead changed");
            stage.lead = lead_index;
        }

        self.check_winner();

        let Some(stage) = self.stage.as_mut() else {
            return;
        };
        if self.race_active {
            if let Some((_, lead_position)) = lead {
                let camera_config = &self.config.camera;
                follow(
                    &mut stage.camera,
                    lead_position,
                    Vec3::from(camera_config.follow_offset),
                    camera_config.follow_factor,
                );
            }
        }
        stage.scene.render(&stage.camera);
    }

    /// Fires the finish callback for the first marble, in roster order, at
    /// or past the finish line. Only while a race is active and a callback
    /// is registered; the race stops before the callback runs, so it fires
    /// once per race.
    pub fn check_winner(&mut self) {
        if !self.race_active || self.on_finish.is_none() {
            return;
        }
        let Some(stage) = self.stage.as_ref() else {
            return;
        };

        let finish_line = self.config.finish_line_z;
        let Some(winner) = stage
            .marbles
            .iter()
            .position(|marble| marble.position.z >= finish_line)
        else {
            return;
        };

        self.race_active = false;
        tracing::info!(winner, frame = self.frames, "marble crossed the finish line");
        if let Some(on_finish) = self.on_finish.as_mut() {
            on_finish(winner);
        }
    }

    /// Releases every marble with the same launch velocity.
    pub fn start_race(&mut self) {
        let Some(stage) = self.stage.as_mut() else {
            tracing::debug!("start_race before scene initialization");
            return;
        };

        self.race_active = true;
        let launch = self.config.launch_velocity();
        for marble in &stage.marbles {
            stage.world.set_motion(marble.body, Motion::Dynamic);
            stage.world.set_velocity(marble.body, launch);
        }
        tracing::info!(marbles = stage.marbles.len(), "race launched");
    }

    /// Parks every marble back on its start slot, motionless. Meshes and
    /// labels move immediately, without waiting for the next frame.
    pub fn reset_race(&mut self) {
        self.race_active = false;
        let Some(stage) = self.stage.as_mut() else {
            return;
        };

        for marble in &mut stage.marbles {
            stage.world.set_velocity(marble.body, Vec3::zeros());
            stage.world.set_motion(marble.body, Motion::Fixed);
            stage.world.set_position(marble.body, marble.start);

            marble.position = marble.start;
            stage.scene.set_mesh_position(marble.mesh, marble.start);
            stage
                .scene
                .set_label_position(marble.label, label_position(&self.config, marble.start));
        }
        stage.lead = None;
        tracing::info!("race reset to start grid");
    }

    /// Stops the frame loop and releases the scene. Safe to call at any time.
    pub fn destroy(&mut self) {
        self.scheduler.cancel();
        self.race_active = false;
        self.on_finish = None;

        if let Some(mut stage) = self.stage.take() {
            stage.scene.dispose();
            tracing::info!(frames = self.frames, "scene destroyed");
        }
    }

    /// Index of the marble furthest along the track (first index on ties).
    pub fn lead_index(&self) -> Option<usize> {
        let stage = self.stage.as_ref()?;
        stage
            .marbles
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (index, marble)| match best {
                Some((_, z)) if marble.position.z <= z => best,
                _ => Some((index, marble.position.z)),
            })
            .map(|(index, _)| index)
    }

    /// Physics state of the marble at `index`.
    pub fn marble_state(&self, index: usize) -> Option<MarbleSnapshot> {
        let stage = self.stage.as_ref()?;
        let body = stage.marbles.get(index)?.body;
        Some(MarbleSnapshot {
            position: stage.world.position(body)?,
            velocity: stage.world.velocity(body)?,
            motion: stage.world.motion(body)?,
        })
    }

    /// Body/mesh/label record of the marble at `index`.
    pub fn marble_body(&self, index: usize) -> Option<&MarbleBody> {
        self.stage.as_ref()?.marbles.get(index)
    }

    pub fn marble_count(&self) -> usize {
        self.stage.as_ref().map_or(0, |stage| stage.marbles.len())
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.stage.as_ref().map(|stage| &stage.camera)
    }

    /// Rotates the inspection camera around the track origin.
    pub fn orbit_camera(&mut self, yaw: f32, pitch: f32) {
        if let Some(stage) = self.stage.as_mut() {
            stage.controls.rotate(&mut stage.camera, yaw, pitch);
        }
    }

    /// Moves the inspection camera toward (`factor < 1`) or away from the
    /// track origin.
    pub fn zoom_camera(&mut self, factor: f32) {
        if let Some(stage) = self.stage.as_mut() {
            stage.controls.zoom(&mut stage.camera, factor);
        }
    }

    pub fn render_scene(&self) -> Option<&R> {
        self.stage.as_ref().map(|stage| &stage.scene)
    }

    pub fn physics(&self) -> Option<&P> {
        self.stage.as_ref().map(|stage| &stage.world)
    }

    #[cfg(test)]
    pub(crate) fn physics_mut(&mut self) -> Option<&mut P> {
        self.stage.as_mut().map(|stage| &mut stage.world)
    }

    /// Frames run since the scene was initialized.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }
}

impl<P: PhysicsWorld, R: RenderScene> Drop for SceneEngine<P, R> {
    fn drop(&mut self) {
        self.destroy();
    }
}
