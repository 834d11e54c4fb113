//! Physics capability and its `Rapier3D` implementation.
//!
//! The scene engine only talks to [`PhysicsWorld`], so its logic runs the
//! same against Rapier or a scripted stand-in.

use std::fmt;

use rapier3d::prelude::*;

/// Vector type shared by physics, rendering and configuration.
pub type Vec3 = rapier3d::na::Vector3<f32>;

/// Default fixed timestep (60Hz).
pub const PHYSICS_DT: f32 = 1.0 / 60.0;

/// Default gravity vector (downward, in m/s²).
pub fn default_gravity() -> Vec3 {
    Vec3::new(0.0, -9.81, 0.0)
}

/// Opaque handle to a marble body inside a [`PhysicsWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub u64);

/// Whether a body is simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Motion {
    /// Held in place; ignores gravity and collisions.
    #[default]
    Fixed,
    /// Moved by the simulation.
    Dynamic,
}

/// Collision shape of a piece of static geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StaticShape {
    /// Box with the given half extents.
    Cuboid { half_extents: Vec3 },
    /// Y-aligned truncated cone, `radius_top` at `+half_height`.
    Frustum {
        half_height: f32,
        radius_top: f32,
        radius_bottom: f32,
    },
}

/// Vertices around each ring of a frustum hull.
const FRUSTUM_SEGMENTS: usize = 16;

/// Convex hull over a top and a bottom vertex ring. Falls back to a
/// cylinder of the mean radius when the hull is degenerate.
#[allow(clippy::cast_precision_loss)]
fn frustum_collider(half_height: f32, radius_top: f32, radius_bottom: f32) -> ColliderBuilder {
    let ring = |y: f32, radius: f32| {
        (0..FRUSTUM_SEGMENTS).map(move |i| {
            let angle = i as f32 * std::f32::consts::TAU / FRUSTUM_SEGMENTS as f32;
            Point::new(radius * angle.cos(), y, radius * angle.sin())
        })
    };
    let points: Vec<Point<Real>> = ring(half_height, radius_top)
        .chain(ring(-half_height, radius_bottom))
        .collect();

    ColliderBuilder::convex_hull(&points).unwrap_or_else(|| {
        tracing::warn!(radius_top, radius_bottom, "degenerate frustum hull, using a cylinder");
        ColliderBuilder::cylinder(half_height, (radius_top + radius_bottom) / 2.0)
    })
}

/// World placement of static geometry: translation plus axis-angle rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub translation: Vec3,
    /// Rotation axis scaled by the angle in radians.
    pub rotation: Vec3,
}

impl Placement {
    pub fn at(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Vec3::zeros(),
        }
    }

    pub fn rotated(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }
}

/// Rigid-body simulation the scene engine drives.
pub trait PhysicsWorld {
    /// Creates an empty world.
    fn new(gravity: Vec3, time_step: f32) -> Self
    where
        Self: Sized;

    /// Adds immovable collision geometry.
    fn add_fixed(&mut self, shape: StaticShape, placement: Placement);

    /// Adds a ball-shaped marble body in [`Motion::Fixed`] mode.
    fn add_marble(&mut self, radius: f32, position: Vec3) -> BodyHandle;

    fn set_motion(&mut self, body: BodyHandle, motion: Motion);
    fn motion(&self, body: BodyHandle) -> Option<Motion>;

    fn position(&self, body: BodyHandle) -> Option<Vec3>;
    fn set_position(&mut self, body: BodyHandle, position: Vec3);

    fn velocity(&self, body: BodyHandle) -> Option<Vec3>;
    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec3);

    /// Advances the simulation by one fixed timestep.
    fn step(&mut self);

    /// Number of rigid bodies, static geometry included.
    fn body_count(&self) -> usize;
}

/// Physics world containing all `Rapier3D` components.
pub struct RapierWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: BroadPhaseBvh,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub gravity: Vector<Real>,
    pub frame: u64,
}

impl Default for RapierWorld {
    fn default() -> Self {
        <Self as PhysicsWorld>::new(default_gravity(), PHYSICS_DT)
    }
}

impl fmt::Debug for RapierWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RapierWorld")
            .field("frame", &self.frame)
            .field("rigid_body_count", &self.rigid_body_set.len())
            .field("collider_count", &self.collider_set.len())
            .field("gravity", &self.gravity)
            .finish_non_exhaustive()
    }
}

impl RapierWorld {
    /// Returns the current simulation frame number.
    pub fn current_frame(&self) -> u64 {
        self.frame
    }

    #[allow(clippy::cast_possible_truncation)]
    fn handle(body: BodyHandle) -> RigidBodyHandle {
        RigidBodyHandle::from_raw_parts((body.0 >> 32) as u32, body.0 as u32)
    }

    fn wrap(handle: RigidBodyHandle) -> BodyHandle {
        let (index, generation) = handle.into_raw_parts();
        BodyHandle((u64::from(index) << 32) | u64::from(generation))
    }

    fn body(&self, body: BodyHandle) -> Option<&RigidBody> {
        self.rigid_body_set.get(Self::handle(body))
    }

    fn body_mut(&mut self, body: BodyHandle) -> Option<&mut RigidBody> {
        self.rigid_body_set.get_mut(Self::handle(body))
    }
}

impl PhysicsWorld for RapierWorld {
    fn new(gravity: Vec3, time_step: f32) -> Self {
        let integration_parameters = IntegrationParameters {
            dt: time_step,
            ..Default::default()
        };

        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            gravity,
            frame: 0,
        }
    }

    fn add_fixed(&mut self, shape: StaticShape, placement: Placement) {
        let body = RigidBodyBuilder::fixed()
            .translation(placement.translation)
            .rotation(placement.rotation)
            .build();
        let handle = self.rigid_body_set.insert(body);

        let collider = match shape {
            StaticShape::Cuboid { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
            StaticShape::Frustum {
                half_height,
                radius_top,
                radius_bottom,
            } => frustum_collider(half_height, radius_top, radius_bottom),
        }
        .friction(0.3)
        .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
    }

    fn add_marble(&mut self, radius: f32, position: Vec3) -> BodyHandle {
        let body = RigidBodyBuilder::fixed()
            .translation(position)
            .ccd_enabled(true)
            .build();
        let handle = self.rigid_body_set.insert(body);

        let collider = ColliderBuilder::ball(radius)
            .restitution(0.3)
            .friction(0.3)
            .density(1.0)
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);

        Self::wrap(handle)
    }

    fn set_motion(&mut self, body: BodyHandle, motion: Motion) {
        let Some(rb) = self.body_mut(body) else {
            return;
        };
        match motion {
            Motion::Dynamic => rb.set_body_type(RigidBodyType::Dynamic, true),
            Motion::Fixed => {
                // Velocities are only writable while dynamic.
                rb.set_linvel(Vector::zeros(), false);
                rb.set_angvel(Vector::zeros(), false);
                rb.set_body_type(RigidBodyType::Fixed, false);
            }
        }
    }

    fn motion(&self, body: BodyHandle) -> Option<Motion> {
        self.body(body).map(|rb| {
            if rb.is_dynamic() {
                Motion::Dynamic
            } else {
                Motion::Fixed
            }
        })
    }

    fn position(&self, body: BodyHandle) -> Option<Vec3> {
        self.body(body).map(|rb| *rb.translation())
    }

    fn set_position(&mut self, body: BodyHandle, position: Vec3) {
        if let Some(rb) = self.body_mut(body) {
            rb.set_translation(position, true);
        }
    }

    fn velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.body(body).map(|rb| {
            if rb.is_dynamic() {
                *rb.linvel()
            } else {
                Vec3::zeros()
            }
        })
    }

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        if let Some(rb) = self.body_mut(body) {
            rb.set_linvel(velocity, true);
        }
    }

    fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            &(),
            &(),
        );
        self.frame += 1;
    }

    fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }
}
