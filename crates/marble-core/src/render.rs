//! Rendering capability plus a headless implementation.
//!
//! The engine describes the scene through [`RenderScene`]: a directional
//! light, meshes (track, rails, pegs, marbles) and text labels, drawn from
//! a [`Camera`] once per frame. Backends decide how that becomes pixels;
//! [`HeadlessScene`] only records it.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::marble::Color;
use crate::physics::Vec3;

/// Error creating a render surface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("no graphics context available")]
    ContextUnavailable,
    #[error("failed to create render surface: {0}")]
    Surface(String),
}

/// Size of the render surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// Perspective camera looking at a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    /// Unit vector pointing toward the light.
    pub direction: Vec3,
}

/// Visual geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeshShape {
    /// Flat rectangle in its local XY plane.
    Plane { width: f32, length: f32 },
    Box { size: Vec3 },
    /// Y-aligned cylinder, possibly tapered.
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
    },
    Sphere { radius: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mesh {
    pub shape: MeshShape,
    pub color: Color,
    pub position: Vec3,
    /// Axis-angle rotation (axis scaled by radians).
    pub rotation: Vec3,
}

impl Mesh {
    pub fn new(shape: MeshShape, color: Color, position: Vec3) -> Self {
        Self {
            shape,
            color,
            position,
            rotation: Vec3::zeros(),
        }
    }

    pub fn rotated(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }
}

/// Billboard text drawn at a world position.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub color: Color,
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MeshId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LabelId(pub u32);

/// Drawing backend owned by the scene engine.
pub trait RenderScene: Sized {
    /// Host element the surface is attached to.
    type Container: ?Sized;

    /// Creates a surface sized to the host viewport and attaches it to
    /// `container`.
    fn attach(container: &Self::Container) -> Result<Self, RenderError>;

    fn add_light(&mut self, light: DirectionalLight);
    fn add_mesh(&mut self, mesh: Mesh) -> MeshId;
    fn add_label(&mut self, label: Label) -> LabelId;

    fn set_mesh_position(&mut self, mesh: MeshId, position: Vec3);
    fn set_label_position(&mut self, label: LabelId, position: Vec3);

    /// Draws the current scene.
    fn render(&mut self, camera: &Camera);

    /// Releases the surface and detaches it from its container.
    fn dispose(&mut self);
}

#[derive(Debug, Default)]
struct SurfaceState {
    viewport: Viewport,
    attached: usize,
    attach_count: usize,
    unavailable: bool,
}

/// Stand-in for a host element; counts the surfaces attached to it.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    state: Rc<RefCell<SurfaceState>>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_viewport(viewport: Viewport) -> Self {
        let surface = Self::default();
        surface.state.borrow_mut().viewport = viewport;
        surface
    }

    /// A surface on which every attach fails, as without a graphics context.
    pub fn unavailable() -> Self {
        let surface = Self::default();
        surface.state.borrow_mut().unavailable = true;
        surface
    }

    /// Surfaces currently attached.
    pub fn attached(&self) -> usize {
        self.state.borrow().attached
    }

    /// Surfaces ever attached.
    pub fn attach_count(&self) -> usize {
        self.state.borrow().attach_count
    }
}

/// Renderer that keeps the scene in memory and counts frames.
#[derive(Debug)]
pub struct HeadlessScene {
    surface: Option<HeadlessSurface>,
    viewport: Viewport,
    lights: Vec<DirectionalLight>,
    meshes: BTreeMap<MeshId, Mesh>,
    labels: BTreeMap<LabelId, Label>,
    next_id: u32,
    last_camera: Option<Camera>,
    frames: u64,
}

impl HeadlessScene {
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn lights(&self) -> &[DirectionalLight] {
        &self.lights
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(&id)
    }

    pub fn meshes(&self) -> impl Iterator<Item = &Mesh> {
        self.meshes.values()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn label(&self, id: LabelId) -> Option<&Label> {
        self.labels.get(&id)
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// Camera used by the most recent [`RenderScene::render`].
    pub fn last_camera(&self) -> Option<&Camera> {
        self.last_camera.as_ref()
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_attached(&self) -> bool {
        self.surface.is_some()
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl RenderScene for HeadlessScene {
    type Container = HeadlessSurface;

    fn attach(container: &HeadlessSurface) -> Result<Self, RenderError> {
        let viewport = {
            let mut state = container.state.borrow_mut();
            if state.unavailable {
                return Err(RenderError::ContextUnavailable);
            }
            state.attached += 1;
            state.attach_count += 1;
            state.viewport
        };

        Ok(Self {
            surface: Some(container.clone()),
            viewport,
            lights: Vec::new(),
            meshes: BTreeMap::new(),
            labels: BTreeMap::new(),
            next_id: 0,
            last_camera: None,
            frames: 0,
        })
    }

    fn add_light(&mut self, light: DirectionalLight) {
        self.lights.push(light);
    }

    fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        let id = MeshId(self.next_id());
        self.meshes.insert(id, mesh);
        id
    }

    fn add_label(&mut self, label: Label) -> LabelId {
        let id = LabelId(self.next_id());
        self.labels.insert(id, label);
        id
    }

    fn set_mesh_position(&mut self, mesh: MeshId, position: Vec3) {
        if let Some(mesh) = self.meshes.get_mut(&mesh) {
            mesh.position = position;
        }
    }

    fn set_label_position(&mut self, label: LabelId, position: Vec3) {
        if let Some(label) = self.labels.get_mut(&label) {
            label.position = position;
        }
    }

    fn render(&mut self, camera: &Camera) {
        if self.surface.is_none() {
            return;
        }
        self.last_camera = Some(*camera);
        self.frames += 1;
    }

    fn dispose(&mut self) {
        if let Some(surface) = self.surface.take() {
            surface.state.borrow_mut().attached -= 1;
        }
        self.lights.clear();
        self.meshes.clear();
        self.labels.clear();
    }
}

impl Drop for HeadlessScene {
    fn drop(&mut self) {
        self.dispose();
    }
}
