//! Perspective projection of the race scene onto a 2D canvas.
//!
//! Meshes are flattened into screen-space [`Drawable`]s (shaded polygons,
//! discs and text) sorted back to front, so a 2D context can paint them
//! with the painter's algorithm.

use marble_core::na::Rotation3;
use marble_core::{Camera, Color, DirectionalLight, Label, Mesh, MeshShape, Vec3, Viewport};

/// Share of a face's brightness that does not depend on the light.
const AMBIENT: f32 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

/// Camera basis and projection parameters for one frame.
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    eye: Vec3,
    right: Vec3,
    up: Vec3,
    forward: Vec3,
    focal: f32,
    near: f32,
    far: f32,
    viewport: Viewport,
}

impl Projector {
    pub fn new(camera: &Camera, viewport: Viewport) -> Self {
        let forward = (camera.target - camera.position)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(|| -Vec3::z());
        let right = forward
            .cross(&Vec3::y())
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vec3::x);
        let up = right.cross(&forward);

        Self {
            eye: camera.position,
            right,
            up,
            forward,
            focal: 1.0 / (camera.fov.to_radians() / 2.0).tan(),
            near: camera.near,
            far: camera.far,
            viewport,
        }
    }

    /// Camera-space coordinates: x right, y up, z distance along the view.
    pub fn to_view(&self, point: Vec3) -> Vec3 {
        let d = point - self.eye;
        Vec3::new(d.dot(&self.right), d.dot(&self.up), d.dot(&self.forward))
    }

    /// Screen position of `point`, or `None` outside the clip range.
    pub fn project(&self, point: Vec3) -> Option<ScreenPoint> {
        let view = self.to_view(point);
        (view.z >= self.near && view.z <= self.far).then(|| self.screen(view))
    }

    /// On-screen radius of a sphere at camera depth `depth`.
    pub fn screen_radius(&self, radius: f32, depth: f32) -> f32 {
        self.scale() * radius / depth
    }

    /// Projects a world-space polygon clipped against the near plane.
    /// Returns the screen polygon and its mean depth.
    pub fn polygon(&self, points: &[Vec3]) -> Option<(Vec<ScreenPoint>, f32)> {
        let view: Vec<Vec3> = points.iter().map(|&p| self.to_view(p)).collect();
        let clipped = clip_near(&view, self.near);
        if clipped.len() < 3 {
            return None;
        }

        #[allow(clippy::cast_precision_loss)]
        let depth = clipped.iter().map(|p| p.z).sum::<f32>() / clipped.len() as f32;
        if depth > self.far {
            return None;
        }
        Some((clipped.into_iter().map(|p| self.screen(p)).collect(), depth))
    }

    fn scale(&self) -> f32 {
        self.focal * self.viewport.height / 2.0
    }

    fn screen(&self, view: Vec3) -> ScreenPoint {
        let scale = self.scale() / view.z;
        ScreenPoint {
            x: self.viewport.width / 2.0 + view.x * scale,
            y: self.viewport.height / 2.0 - view.y * scale,
        }
    }
}

/// Sutherland-Hodgman against the single plane `z = near`.
fn clip_near(points: &[Vec3], near: f32) -> Vec<Vec3> {
    let mut out = Vec::with_capacity(points.len() + 1);
    for (i, &current) in points.iter().enumerate() {
        let next = points[(i + 1) % points.len()];
        let current_in = current.z >= near;
        if current_in {
            out.push(current);
        }
        if current_in != (next.z >= near) {
            let t = (near - current.z) / (next.z - current.z);
            let mut crossing = current.lerp(&next, t);
            crossing.z = near;
            out.push(crossing);
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape2d {
    Polygon(Vec<ScreenPoint>),
    Disc { center: ScreenPoint, radius: f32 },
    Text { at: ScreenPoint, text: String },
}

/// One paint operation, `fill` already shaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Drawable {
    pub depth: f32,
    pub shape: Shape2d,
    pub fill: String,
}

/// Flattens the scene into paint operations ordered far to near.
pub fn draw_list<'a>(
    projector: &Projector,
    meshes: impl IntoIterator<Item = &'a Mesh>,
    labels: impl IntoIterator<Item = &'a Label>,
    lights: &[DirectionalLight],
) -> Vec<Drawable> {
    let mut list = Vec::new();
    for mesh in meshes {
        push_mesh(&mut list, projector, mesh, lights);
    }
    for label in labels {
        let view = projector.to_view(label.position);
        if let Some(at) = projector.project(label.position) {
            list.push(Drawable {
                depth: view.z,
                shape: Shape2d::Text {
                    at,
                    text: label.text.clone(),
                },
                fill: label.color.to_string(),
            });
        }
    }
    list.sort_by(|a, b| b.depth.total_cmp(&a.depth));
    list
}

fn push_mesh(list: &mut Vec<Drawable>, projector: &Projector, mesh: &Mesh, lights: &[DirectionalLight]) {
    let rotation = Rotation3::new(mesh.rotation);
    let to_world = |local: Vec3| mesh.position + rotation * local;

    match mesh.shape {
        MeshShape::Plane { width, length } => {
            let (w, l) = (width / 2.0, length / 2.0);
            let corners = [
                Vec3::new(-w, -l, 0.0),
                Vec3::new(w, -l, 0.0),
                Vec3::new(w, l, 0.0),
                Vec3::new(-w, l, 0.0),
            ]
            .map(to_world);
            let normal = rotation * Vec3::z();
            if let Some((points, depth)) = projector.polygon(&corners) {
                list.push(Drawable {
                    depth,
                    shape: Shape2d::Polygon(points),
                    fill: shade(mesh.color, brightness(normal.abs(), lights)),
                });
            }
        }
        MeshShape::Box { size } => {
            let half = size / 2.0;
            for (normal, corners) in box_faces(half) {
                let normal = rotation * normal;
                let corners = corners.map(to_world);
                if normal.dot(&(projector.eye - corners[0])) <= 0.0 {
                    continue;
                }
                if let Some((points, depth)) = projector.polygon(&corners) {
                    list.push(Drawable {
                        depth,
                        shape: Shape2d::Polygon(points),
                        fill: shade(mesh.color, brightness(normal, lights)),
                    });
                }
            }
        }
        MeshShape::Cylinder {
            radius_top,
            radius_bottom,
            height,
        } => {
            // Drawn as a tapered quad facing the camera.
            let axis = rotation * Vec3::y() * (height / 2.0);
            let side = projector.right;
            let corners = [
                mesh.position - axis - side * radius_bottom,
                mesh.position - axis + side * radius_bottom,
                mesh.position + axis + side * radius_top,
                mesh.position + axis - side * radius_top,
            ];
            if let Some((points, depth)) = projector.polygon(&corners) {
                list.push(Drawable {
                    depth,
                    shape: Shape2d::Polygon(points),
                    fill: shade(mesh.color, brightness(-projector.forward, lights)),
                });
            }
        }
        MeshShape::Sphere { radius } => {
            let depth = projector.to_view(mesh.position).z;
            if let Some(center) = projector.project(mesh.position) {
                list.push(Drawable {
                    depth,
                    shape: Shape2d::Disc {
                        center,
                        radius: projector.screen_radius(radius, depth),
                    },
                    fill: mesh.color.to_string(),
                });
            }
        }
    }
}

/// Outward normal and corners of each face of a box with `half` extents.
fn box_faces(half: Vec3) -> [(Vec3, [Vec3; 4]); 6] {
    let (x, y, z) = (half.x, half.y, half.z);
    [
        (Vec3::x(), [Vec3::new(x, -y, -z), Vec3::new(x, y, -z), Vec3::new(x, y, z), Vec3::new(x, -y, z)]),
        (-Vec3::x(), [Vec3::new(-x, -y, z), Vec3::new(-x, y, z), Vec3::new(-x, y, -z), Vec3::new(-x, -y, -z)]),
        (Vec3::y(), [Vec3::new(-x, y, -z), Vec3::new(-x, y, z), Vec3::new(x, y, z), Vec3::new(x, y, -z)]),
        (-Vec3::y(), [Vec3::new(-x, -y, z), Vec3::new(-x, -y, -z), Vec3::new(x, -y, -z), Vec3::new(x, -y, z)]),
        (Vec3::z(), [Vec3::new(-x, -y, z), Vec3::new(x, -y, z), Vec3::new(x, y, z), Vec3::new(-x, y, z)]),
        (-Vec3::z(), [Vec3::new(x, -y, -z), Vec3::new(-x, -y, -z), Vec3::new(-x, y, -z), Vec3::new(x, y, -z)]),
    ]
}

fn brightness(normal: Vec3, lights: &[DirectionalLight]) -> f32 {
    let diffuse: f32 = lights
        .iter()
        .map(|light| normal.dot(&light.direction).max(0.0) * light.intensity)
        .sum();
    (AMBIENT + (1.0 - AMBIENT) * diffuse).min(1.0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn shade(color: Color, factor: f32) -> String {
    let channel = |c: u8| (f32::from(c) * factor).round().clamp(0.0, 255.0) as u8;
    Color::rgb(channel(color.r), channel(color.g), channel(color.b)).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera {
            position: Vec3::new(0.0, 0.0, 10.0),
            target: Vec3::zeros(),
            fov: 90.0,
            near: 0.1,
            far: 1000.0,
        }
    }

    fn projector() -> Projector {
        Projector::new(&camera(), Viewport::new(800.0, 600.0))
    }

    #[test]
    fn test_target_projects_to_center() {
        let point = projector().project(Vec3::zeros()).unwrap();
        assert!((point.x - 400.0).abs() < 1e-3);
        assert!((point.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_axes_map_to_screen_directions() {
        let p = projector();
        let right = p.project(Vec3::new(1.0, 0.0, 0.0)).unwrap();
        let up = p.project(Vec3::new(0.0, 1.0, 0.0)).unwrap();
        assert!(right.x > 400.0);
        assert!(up.y < 300.0);
    }

    #[test]
    fn test_points_behind_camera_are_dropped() {
        assert!(projector().project(Vec3::new(0.0, 0.0, 20.0)).is_none());
    }

    #[test]
    fn test_farther_spheres_are_smaller() {
        let p = projector();
        assert!(p.screen_radius(1.0, 5.0) > p.screen_radius(1.0, 50.0));
    }

    #[test]
    fn test_polygon_clipped_at_near_plane() {
        let p = projector();
        // Floor quad running from in front of the camera to behind it.
        let quad = [
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 20.0),
            Vec3::new(-1.0, -1.0, 20.0),
        ];
        let (points, depth) = p.polygon(&quad).unwrap();
        assert_eq!(points.len(), 4);
        assert!(depth > 0.0);
        assert!(points.iter().all(|pt| pt.x.is_finite() && pt.y.is_finite()));

        let behind = quad.map(|v| v + Vec3::new(0.0, 0.0, 30.0));
        assert!(p.polygon(&behind).is_none());
    }

    #[test]
    fn test_draw_list_is_back_to_front() {
        let near = Mesh::new(MeshShape::Sphere { radius: 1.0 }, Color::RED, Vec3::new(0.0, 0.0, 5.0));
        let far = Mesh::new(MeshShape::Sphere { radius: 1.0 }, Color::BLUE, Vec3::new(0.0, 0.0, -50.0));
        let label = Label {
            text: "Marble 1".to_string(),
            color: Color::rgb(255, 255, 255),
            position: Vec3::new(0.0, 1.0, 0.0),
        };

        let list = draw_list(&projector(), [&near, &far], [&label], &[]);
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].fill, "#0000ff");
        assert!(matches!(list[1].shape, Shape2d::Text { .. }));
        assert_eq!(list[2].fill, "#ff0000");
    }

    #[test]
    fn test_box_shows_only_faces_toward_camera() {
        let cube = Mesh::new(MeshShape::Box { size: Vec3::new(2.0, 2.0, 2.0) }, Color::GREEN, Vec3::zeros());
        let list = draw_list(&projector(), [&cube], [], &[]);
        assert_eq!(list.len(), 1, "camera on the z axis sees only the front face");
    }

    #[test]
    fn test_lit_faces_are_brighter() {
        let light = DirectionalLight {
            color: Color::rgb(255, 255, 255),
            intensity: 1.0,
            direction: Vec3::z(),
        };
        assert_eq!(shade(Color::rgb(200, 100, 0), brightness(Vec3::z(), &[light])), "#c86400");
        assert_eq!(shade(Color::rgb(200, 100, 0), brightness(-Vec3::z(), &[light])), "#462300");
    }
}
