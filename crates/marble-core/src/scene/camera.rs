//! Camera behaviour: following the lead marble during a race and the
//! orbit controller used to inspect the track by hand.

use std::f32::consts::PI;

use crate::physics::Vec3;
use crate::render::Camera;

/// Closest the orbit controller lets the camera get to its target.
const MIN_ORBIT_DISTANCE: f32 = 1.0;

/// Keeps the polar angle away from the poles so `look_at` stays defined.
const POLAR_MARGIN: f32 = 0.01;

/// Moves the camera a fraction `factor` toward `lead + offset` and aims it
/// at `lead`. Repeated every frame this approaches the goal exponentially.
pub fn follow(camera: &mut Camera, lead: Vec3, offset: Vec3, factor: f32) {
    let goal = lead + offset;
    camera.position = camera.position.lerp(&goal, factor);
    camera.look_at(lead);
}

/// Orbit-style manual controller rotating the camera around a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitControls {
    pub target: Vec3,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::zeros(),
        }
    }
}

impl OrbitControls {
    /// Aims the camera at the orbit target.
    pub fn update(&self, camera: &mut Camera) {
        camera.look_at(self.target);
    }

    /// Rotates the camera by `yaw` around the vertical axis and by `pitch`
    /// toward or away from it, keeping the distance to the target.
    pub fn rotate(&self, camera: &mut Camera, yaw: f32, pitch: f32) {
        let (radius, azimuth, polar) = self.spherical(camera);
        let polar = (polar + pitch).clamp(POLAR_MARGIN, PI - POLAR_MARGIN);
        self.place(camera, radius, azimuth + yaw, polar);
    }

    /// Scales the distance to the target; `factor < 1` moves closer.
    pub fn zoom(&self, camera: &mut Camera, factor: f32) {
        if !(factor > 0.0) {
            return;
        }
        let (radius, azimuth, polar) = self.spherical(camera);
        self.place(camera, (radius * factor).max(MIN_ORBIT_DISTANCE), azimuth, polar);
    }

    fn spherical(&self, camera: &Camera) -> (f32, f32, f32) {
        let offset = camera.position - self.target;
        let radius = offset.norm().max(MIN_ORBIT_DISTANCE);
        let azimuth = offset.x.atan2(offset.z);
        let polar = (offset.y / radius).clamp(-1.0, 1.0).acos();
        (radius, azimuth, polar)
    }

    fn place(&self, camera: &mut Camera, radius: f32, azimuth: f32, polar: f32) {
        let offset = Vec3::new(
            radius * polar.sin() * azimuth.sin(),
            radius * polar.cos(),
            radius * polar.sin() * azimuth.cos(),
        );
        camera.position = self.target + offset;
        self.update(camera);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_at(position: Vec3) -> Camera {
        Camera {
            position,
            target: Vec3::zeros(),
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).norm() < 1e-3, "{a:?} != {b:?}");
    }

    #[test]
    fn test_follow_moves_five_percent() {
        let mut camera = camera_at(Vec3::zeros());
        let lead = Vec3::new(0.0, 0.0, 100.0);
        follow(&mut camera, lead, Vec3::new(0.0, 5.0, -10.0), 0.05);

        assert_close(camera.position, Vec3::new(0.0, 0.25, 4.5));
        assert_eq!(camera.target, lead);
    }

    #[test]
    fn test_follow_approaches_but_never_reaches() {
        let mut camera = camera_at(Vec3::zeros());
        let lead = Vec3::new(0.0, 0.0, 100.0);
        let goal = Vec3::new(0.0, 5.0, 90.0);
        let mut last = (goal - camera.position).norm();
        for _ in 0..200 {
            follow(&mut camera, lead, Vec3::new(0.0, 5.0, -10.0), 0.05);
            let remaining = (goal - camera.position).norm();
            assert!(remaining < last);
            last = remaining;
        }
        assert!(last > 0.0);
        assert!(last < 0.01 * 90.0);
    }

    #[test]
    fn test_orbit_keeps_distance() {
        let controls = OrbitControls::default();
        let mut camera = camera_at(Vec3::new(0.0, 10.0, 15.0));
        let distance = camera.position.norm();

        controls.rotate(&mut camera, PI / 2.0, 0.0);
        assert!((camera.position.norm() - distance).abs() < 1e-3);
        assert_close(camera.position, Vec3::new(15.0, 10.0, 0.0));
        assert_eq!(camera.target, Vec3::zeros());
    }

    #[test]
    fn test_orbit_pitch_is_clamped() {
        let controls = OrbitControls::default();
        let mut camera = camera_at(Vec3::new(0.0, 10.0, 15.0));
        controls.rotate(&mut camera, 0.0, -10.0);
        assert!(camera.position.y > 0.0);
        assert!(camera.position.z > 0.0);
    }

    #[test]
    fn test_zoom_scales_distance() {
        let controls = OrbitControls::default();
        let mut camera = camera_at(Vec3::new(0.0, 0.0, 20.0));
        controls.zoom(&mut camera, 0.5);
        assert_close(camera.position, Vec3::new(0.0, 0.0, 10.0));

        controls.zoom(&mut camera, 0.0);
        assert_close(camera.position, Vec3::new(0.0, 0.0, 10.0));

        controls.zoom(&mut camera, 0.001);
        assert_close(camera.position, Vec3::new(0.0, 0.0, MIN_ORBIT_DISTANCE));
    }
}
