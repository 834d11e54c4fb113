//! Static course geometry and the marble starting grid.
//!
//! Every piece is created twice: once as collision geometry in the
//! physics world and once as a mesh in the render scene.

use std::f32::consts::FRAC_PI_2;

use rand::Rng;

use crate::config::RaceConfig;
use crate::marble::{Color, Marble};
use crate::physics::{BodyHandle, Motion, PhysicsWorld, Placement, StaticShape, Vec3};
use crate::render::{Label, LabelId, Mesh, MeshId, MeshShape, RenderScene};

const TRACK_COLOR: Color = Color::rgb(0x00, 0x66, 0x00);
const RAIL_COLOR: Color = Color::rgb(0x44, 0x44, 0x44);
const PEG_COLOR: Color = Color::rgb(0xaa, 0xaa, 0xaa);
const LABEL_COLOR: Color = Color::rgb(0xff, 0xff, 0xff);

/// Half thickness of the slab standing in for the track plane.
const TRACK_HALF_THICKNESS: f32 = 1.0;

/// Physics body, mesh and label of one marble, in roster order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarbleBody {
    pub body: BodyHandle,
    pub mesh: MeshId,
    pub label: LabelId,
    /// Start slot the marble returns to on reset.
    pub start: Vec3,
    /// Position last copied to the mesh.
    pub position: Vec3,
}

/// Position, velocity and mode of a marble body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarbleSnapshot {
    pub position: Vec3,
    pub velocity: Vec3,
    pub motion: Motion,
}

/// Unit normal of the inclined track surface.
///
/// The track mesh is a plane whose local normal (+z) is rotated by `-tilt`
/// about x; the physics slab's top face (+y) has to end up on the same
/// normal, which is a rotation of `PI / 2 - tilt`.
pub fn track_normal(config: &RaceConfig) -> Vec3 {
    let tilt = config.track.tilt;
    Vec3::new(0.0, tilt.sin(), tilt.cos())
}

/// Adds the inclined track and both guardrails.
pub fn build_track<P: PhysicsWorld, R: RenderScene>(
    config: &RaceConfig,
    world: &mut P,
    scene: &mut R,
) {
    let track = &config.track;

    scene.add_mesh(
        Mesh::new(
            MeshShape::Plane {
                width: track.width,
                length: track.length,
            },
            TRACK_COLOR,
            Vec3::zeros(),
        )
        .rotated(Vec3::new(-track.tilt, 0.0, 0.0)),
    );

    // The slab's top face passes through the origin like the plane mesh.
    world.add_fixed(
        StaticShape::Cuboid {
            half_extents: Vec3::new(
                track.rail_offset + track.rail_thickness,
                TRACK_HALF_THICKNESS,
                track.length,
            ),
        },
        Placement::at(-track_normal(config) * TRACK_HALF_THICKNESS)
            .rotated(Vec3::new(FRAC_PI_2 - track.tilt, 0.0, 0.0)),
    );

    for side in [-1.0, 1.0] {
        let position = Vec3::new(side * track.rail_offset, 0.0, 0.0);
        scene.add_mesh(Mesh::new(
            MeshShape::Box {
                size: Vec3::new(track.rail_thickness, track.rail_height, track.length),
            },
            RAIL_COLOR,
            position,
        ));
        world.add_fixed(
            StaticShape::Cuboid {
                half_extents: Vec3::new(
                    track.rail_thickness / 2.0,
                    track.rail_height / 2.0,
                    track.length,
                ),
            },
            Placement::at(position),
        );
    }
}

/// Scatters the obstacle pegs uniformly over the track footprint.
/// Returns how many were placed.
pub fn scatter_obstacles<P: PhysicsWorld, R: RenderScene>(
    config: &RaceConfig,
    rng: &mut impl Rng,
    world: &mut P,
    scene: &mut R,
) -> usize {
    let pegs = &config.obstacles;
    let track = &config.track;

    for _ in 0..pegs.count {
        let position = Vec3::new(
            (rng.random::<f32>() - 0.5) * track.width,
            pegs.center_y,
            rng.random::<f32>() * track.length - track.length / 2.0,
        );

        scene.add_mesh(Mesh::new(
            MeshShape::Cylinder {
                radius_top: pegs.radius_top,
                radius_bottom: pegs.radius_bottom,
                height: pegs.height,
            },
            PEG_COLOR,
            position,
        ));
        world.add_fixed(
            StaticShape::Frustum {
                half_height: pegs.height / 2.0,
                radius_top: pegs.radius_top,
                radius_bottom: pegs.radius_bottom,
            },
            Placement::at(position),
        );
    }

    pegs.count
}

/// Lines the marbles up side by side on their start slots, not yet moving.
pub fn place_marbles<P: PhysicsWorld, R: RenderScene>(
    config: &RaceConfig,
    marbles: &[Marble],
    world: &mut P,
    scene: &mut R,
) -> Vec<MarbleBody> {
    let layout = &config.marbles;

    marbles
        .iter()
        .enumerate()
        .map(|(index, marble)| {
            let start = config.start_position(index);
            let body = world.add_marble(layout.radius, start);
            let mesh = scene.add_mesh(Mesh::new(
                MeshShape::Sphere {
                    radius: layout.radius,
                },
                marble.color,
                start,
            ));
            let label = scene.add_label(Label {
                text: marble.name.clone(),
                color: LABEL_COLOR,
                position: label_position(config, start),
            });

            MarbleBody {
                body,
                mesh,
                label,
                start,
                position: start,
            }
        })
        .collect()
}

/// Where a marble's name label sits for a marble at `position`.
pub fn label_position(config: &RaceConfig, position: Vec3) -> Vec3 {
    position + Vec3::new(0.0, config.marbles.label_height, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{HeadlessScene, HeadlessSurface};
    use crate::test_utils::ScriptedWorld;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn setup() -> (RaceConfig, ScriptedWorld, HeadlessScene) {
        let config = RaceConfig::default();
        let world = ScriptedWorld::new(config.gravity(), config.physics.time_step);
        let scene = HeadlessScene::attach(&HeadlessSurface::new()).unwrap();
        (config, world, scene)
    }

    #[test]
    fn test_track_normal_tilts_toward_finish() {
        let normal = track_normal(&RaceConfig::default());
        assert!((normal.norm() - 1.0).abs() < 1e-6);
        assert!(normal.y > 0.98);
        assert!(normal.z > 0.0, "surface should descend toward +z");
    }

    #[test]
    fn test_track_and_rails() {
        let (config, mut world, mut scene) = setup();
        build_track(&config, &mut world, &mut scene);
        assert_eq!(world.body_count(), 3);
        assert_eq!(scene.mesh_count(), 3);
    }

    #[test]
    fn test_obstacles_stay_on_track_footprint() {
        let (config, mut world, mut scene) = setup();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let placed = scatter_obstacles(&config, &mut rng, &mut world, &mut scene);

        assert_eq!(placed, 100);
        assert_eq!(world.body_count(), 100);
        for mesh in scene.meshes() {
            assert!(mesh.position.x.abs() <= 20.0);
            assert!((-200.0..200.0).contains(&mesh.position.z));
            assert_eq!(mesh.position.y, 1.0);
        }
        assert!(world.fixed_shapes().iter().all(|shape| *shape
            == StaticShape::Frustum {
                half_height: 25.0,
                radius_top: 1.0,
                radius_bottom: 2.0,
            }));
    }

    #[test]
    fn test_marbles_placed_on_slots() {
        let (config, mut world, mut scene) = setup();
        let marbles = [
            Marble::new("Marble 1", Color::RED),
            Marble::new("Marble 2", Color::BLUE),
        ];
        let bodies = place_marbles(&config, &marbles, &mut world, &mut scene);

        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[0].start, Vec3::new(-10.0, 50.0, -200.0));
        assert_eq!(bodies[1].start, Vec3::new(-8.0, 50.0, -200.0));
        assert_eq!(world.motion(bodies[1].body), Some(Motion::Fixed));
        assert_eq!(scene.mesh(bodies[1].mesh).unwrap().color, Color::BLUE);

        let label = scene.label(bodies[0].label).unwrap();
        assert_eq!(label.text, "Marble 1");
        assert_eq!(label.position, Vec3::new(-10.0, 51.0, -200.0));
    }
}
