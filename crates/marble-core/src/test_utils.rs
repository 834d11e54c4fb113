//! Test utilities for exercising the scene engine without Rapier.
//!
//! `ScriptedWorld` integrates dynamic bodies ballistically (no collisions),
//! so tests control exactly when a marble reaches a given depth.

use crate::physics::{BodyHandle, Motion, PhysicsWorld, Placement, StaticShape, Vec3};

#[derive(Debug, Clone, Copy)]
struct ScriptedBody {
    position: Vec3,
    velocity: Vec3,
    motion: Motion,
}

/// Collision-free physics stand-in.
#[derive(Debug, Default)]
pub(crate) struct ScriptedWorld {
    gravity: Vec3,
    time_step: f32,
    fixed: Vec<StaticShape>,
    bodies: Vec<ScriptedBody>,
    steps: u64,
}

impl ScriptedWorld {
    /// Static geometry shapes in insertion order.
    pub fn fixed_shapes(&self) -> &[StaticShape] {
        &self.fixed
    }

    /// Steps taken so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn get(&self, body: BodyHandle) -> Option<&ScriptedBody> {
        usize::try_from(body.0).ok().and_then(|i| self.bodies.get(i))
    }

    fn get_mut(&mut self, body: BodyHandle) -> Option<&mut ScriptedBody> {
        usize::try_from(body.0).ok().and_then(|i| self.bodies.get_mut(i))
    }
}

impl PhysicsWorld for ScriptedWorld {
    fn new(gravity: Vec3, time_step: f32) -> Self {
        Self {
            gravity,
            time_step,
            ..Self::default()
        }
    }

    fn add_fixed(&mut self, shape: StaticShape, _placement: Placement) {
        self.fixed.push(shape);
    }

    fn add_marble(&mut self, _radius: f32, position: Vec3) -> BodyHandle {
        self.bodies.push(ScriptedBody {
            position,
            velocity: Vec3::zeros(),
            motion: Motion::Fixed,
        });
        BodyHandle(self.bodies.len() as u64 - 1)
    }

    fn set_motion(&mut self, body: BodyHandle, motion: Motion) {
        if let Some(b) = self.get_mut(body) {
            b.motion = motion;
            if motion == Motion::Fixed {
                b.velocity = Vec3::zeros();
            }
        }
    }

    fn motion(&self, body: BodyHandle) -> Option<Motion> {
        self.get(body).map(|b| b.motion)
    }

    fn position(&self, body: BodyHandle) -> Option<Vec3> {
        self.get(body).map(|b| b.position)
    }

    fn set_position(&mut self, body: BodyHandle, position: Vec3) {
        if let Some(b) = self.get_mut(body) {
            b.position = position;
        }
    }

    fn velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.get(body).map(|b| b.velocity)
    }

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        if let Some(b) = self.get_mut(body) {
            if b.motion == Motion::Dynamic {
                b.velocity = velocity;
            }
        }
    }

    fn step(&mut self) {
        let (gravity, dt) = (self.gravity, self.time_step);
        for body in &mut self.bodies {
            if body.motion == Motion::Dynamic {
                body.velocity += gravity * dt;
                body.position += body.velocity * dt;
            }
        }
        self.steps += 1;
    }

    fn body_count(&self) -> usize {
        self.fixed.len() + self.bodies.len()
    }
}
