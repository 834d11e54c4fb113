//! Canvas 2D rendering backend.

use std::f64::consts::PI;

use marble_core::{
    Camera, DirectionalLight, Label, LabelId, Mesh, MeshId, RenderError, RenderScene, Vec3,
    Viewport,
};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, Element, HtmlCanvasElement};

use crate::projection::{Projector, Shape2d, draw_list};

const BACKGROUND: &str = "#1a1a2e";
const LABEL_FONT: &str = "12px sans-serif";

/// Draws the scene on a `<canvas>` appended to the host element.
pub struct CanvasScene {
    canvas: Option<HtmlCanvasElement>,
    context: CanvasRenderingContext2d,
    viewport: Viewport,
    lights: Vec<DirectionalLight>,
    meshes: Vec<Mesh>,
    labels: Vec<Label>,
}

fn surface_error(err: JsValue) -> RenderError {
    RenderError::Surface(format!("{err:?}"))
}

/// Size of the host element, or of the window when the element has no
/// layout yet.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn host_viewport(container: &Element) -> Viewport {
    let (width, height) = (container.client_width(), container.client_height());
    if width > 0 && height > 0 {
        return Viewport::new(width as f32, height as f32);
    }

    web_sys::window()
        .and_then(|window| {
            let width = window.inner_width().ok()?.as_f64()?;
            let height = window.inner_height().ok()?.as_f64()?;
            Some(Viewport::new(width as f32, height as f32))
        })
        .unwrap_or_default()
}

impl RenderScene for CanvasScene {
    type Container = Element;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn attach(container: &Element) -> Result<Self, RenderError> {
        let document = container
            .owner_document()
            .ok_or_else(|| RenderError::Surface("container is not in a document".to_string()))?;
        let canvas = document
            .create_element("canvas")
            .map_err(surface_error)?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| RenderError::Surface("created element is not a canvas".to_string()))?;

        let viewport = host_viewport(container);
        canvas.set_width(viewport.width as u32);
        canvas.set_height(viewport.height as u32);

        let context = canvas
            .get_context("2d")
            .map_err(surface_error)?
            .ok_or(RenderError::ContextUnavailable)?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| RenderError::ContextUnavailable)?;

        container.append_child(&canvas).map_err(surface_error)?;
        tracing::debug!(width = viewport.width, height = viewport.height, "canvas attached");

        Ok(Self {
            canvas: Some(canvas),
            context,
            viewport,
            lights: Vec::new(),
            meshes: Vec::new(),
            labels: Vec::new(),
        })
    }

    fn add_light(&mut self, light: DirectionalLight) {
        self.lights.push(light);
    }

    #[allow(clippy::cast_possible_truncation)]
    fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() as u32 - 1)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn add_label(&mut self, label: Label) -> LabelId {
        self.labels.push(label);
        LabelId(self.labels.len() as u32 - 1)
    }

    fn set_mesh_position(&mut self, mesh: MeshId, position: Vec3) {
        if let Some(mesh) = self.meshes.get_mut(mesh.0 as usize) {
            mesh.position = position;
        }
    }

    fn set_label_position(&mut self, label: LabelId, position: Vec3) {
        if let Some(label) = self.labels.get_mut(label.0 as usize) {
            label.position = position;
        }
    }

    fn render(&mut self, camera: &Camera) {
        if self.canvas.is_none() {
            return;
        }
        let ctx = &self.context;
        let (width, height) = (f64::from(self.viewport.width), f64::from(self.viewport.height));

        ctx.set_fill_style_str(BACKGROUND);
        ctx.fill_rect(0.0, 0.0, width, height);
        ctx.set_font(LABEL_FONT);
        ctx.set_text_align("center");

        let projector = Projector::new(camera, self.viewport);
        for drawable in draw_list(&projector, &self.meshes, &self.labels, &self.lights) {
            ctx.set_fill_style_str(&drawable.fill);
            match drawable.shape {
                Shape2d::Polygon(points) => {
                    ctx.begin_path();
                    for (i, point) in points.iter().enumerate() {
                        let (x, y) = (f64::from(point.x), f64::from(point.y));
                        if i == 0 {
                            ctx.move_to(x, y);
                        } else {
                            ctx.line_to(x, y);
                        }
                    }
                    ctx.close_path();
                    ctx.fill();
                }
                Shape2d::Disc { center, radius } => {
                    ctx.begin_path();
                    let _ = ctx.arc(
                        f64::from(center.x),
                        f64::from(center.y),
                        f64::from(radius.max(0.5)),
                        0.0,
                        PI * 2.0,
                    );
                    ctx.fill();
                }
                Shape2d::Text { at, text } => {
                    let _ = ctx.fill_text(&text, f64::from(at.x), f64::from(at.y));
                }
            }
        }
    }

    fn dispose(&mut self) {
        if let Some(canvas) = self.canvas.take() {
            canvas.remove();
            tracing::debug!("canvas detached");
        }
        self.lights.clear();
        self.meshes.clear();
        self.labels.clear();
    }
}

impl Drop for CanvasScene {
    fn drop(&mut self) {
        self.dispose();
    }
}
