//! Orbiting wireframe preview of a [`Mesh`].

use eframe::egui::{self, Color32, Pos2, Rect, Sense, Stroke};
use glam::{Mat4, Vec3, Vec4};

use crate::mesh::Mesh;

/// Degrees of rotation per pixel of pointer drag.
pub const DRAG_SENSITIVITY: f32 = 0.5;
/// The ground grid covers -GRID_EXTENT..=GRID_EXTENT on X and Z.
pub const GRID_EXTENT: i32 = 10;
pub const AXIS_LENGTH: f32 = 5.0;

const CAMERA_DISTANCE: f32 = 5.0;
const FOV_DEGREES: f32 = 45.0;
const NEAR: f32 = 0.1;
const FAR: f32 = 100.0;

pub const BACKGROUND_COLOR: Color32 = Color32::from_rgb(26, 31, 41);
pub const GRID_COLOR: Color32 = Color32::from_rgb(77, 77, 77);
pub const X_AXIS_COLOR: Color32 = Color32::from_rgb(255, 0, 0);
pub const Y_AXIS_COLOR: Color32 = Color32::from_rgb(0, 255, 0);
pub const Z_AXIS_COLOR: Color32 = Color32::from_rgb(0, 0, 255);
pub const MESH_COLOR: Color32 = Color32::from_rgb(204, 204, 255);

/// A world-space line to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Vec3,
    pub to: Vec3,
    pub color: Color32,
}

impl Segment {
    fn new(from: impl Into<Vec3>, to: impl Into<Vec3>, color: Color32) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            color,
        }
    }
}

#[derive(Debug, Default)]
pub struct MeshViewer {
    mesh: Mesh,
    /// Rotation about the horizontal axis, degrees.
    x_rot: f32,
    /// Rotation about the vertical axis, degrees.
    y_rot: f32,
}

impl MeshViewer {
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn load_obj(&mut self, text: &str) {
        self.mesh = Mesh::parse(text);
        tracing::debug!(
            vertices = self.mesh.vertex_count(),
            faces = self.mesh.face_count(),
            "preview mesh reloaded"
        );
    }

    pub fn rotation(&self) -> (f32, f32) {
        (self.x_rot, self.y_rot)
    }

    /// Vertical drag tilts around X, horizontal drag spins around Y.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        self.x_rot += dy * DRAG_SENSITIVITY;
        self.y_rot += dx * DRAG_SENSITIVITY;
    }

    pub fn reset_view(&mut self) {
        self.x_rot = 0.0;
        self.y_rot = 0.0;
    }

    /// Grid, then the X/Y/Z axes, then each face as a closed loop.
    pub fn segments(&self) -> Vec<Segment> {
        let extent = GRID_EXTENT as f32;
        let mut segments = Vec::with_capacity((GRID_EXTENT as usize * 2 + 1) * 2 + 3);

        for i in -GRID_EXTENT..=GRID_EXTENT {
            let i = i as f32;
            segments.push(Segment::new([i, 0.0, -extent], [i, 0.0, extent], GRID_COLOR));
            segments.push(Segment::new([-extent, 0.0, i], [extent, 0.0, i], GRID_COLOR));
        }

        segments.push(Segment::new(Vec3::ZERO, Vec3::X * AXIS_LENGTH, X_AXIS_COLOR));
        segments.push(Segment::new(Vec3::ZERO, Vec3::Y * AXIS_LENGTH, Y_AXIS_COLOR));
        segments.push(Segment::new(Vec3::ZERO, Vec3::Z * AXIS_LENGTH, Z_AXIS_COLOR));

        segments.extend(self.mesh.edges().map(|(a, b)| Segment::new(a, b, MESH_COLOR)));
        segments
    }

    pub fn model_view(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, -CAMERA_DISTANCE))
            * Mat4::from_rotation_x(self.x_rot.to_radians())
            * Mat4::from_rotation_y(self.y_rot.to_radians())
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(FOV_DEGREES.to_radians(), aspect, NEAR, FAR) * self.model_view()
    }

    /// Maps a segment into `rect`, clipping the part behind the camera.
    pub fn project_segment(segment: &Segment, view_projection: Mat4, rect: Rect) -> Option<[Pos2; 2]> {
        let mut a = view_projection * segment.from.extend(1.0);
        let mut b = view_projection * segment.to.extend(1.0);

        if a.w < NEAR && b.w < NEAR {
            return None;
        }
        if a.w < NEAR {
            a = clip_to_near(b, a);
        } else if b.w < NEAR {
            b = clip_to_near(a, b);
        }

        Some([to_screen(a, rect), to_screen(b, rect)])
    }

    /// Draws the preview filling the available space and applies drag input.
    pub fn show(&mut self, ui: &mut egui::Ui) -> egui::Response {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::drag());
        if response.dragged() {
            let delta = response.drag_delta();
            self.drag(delta.x, delta.y);
        }

        let rect = response.rect;
        painter.rect_filled(rect, 0.0, BACKGROUND_COLOR);
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return response;
        }

        let view_projection = self.view_projection(rect.width() / rect.height());
        let painter = painter.with_clip_rect(rect);
        for segment in self.segments() {
            if let Some(points) = Self::project_segment(&segment, view_projection, rect) {
                painter.line_segment(points, Stroke::new(1.0, segment.color));
            }
        }
        response
    }
}

fn clip_to_near(inside: Vec4, outside: Vec4) -> Vec4 {
    let t = (NEAR - inside.w) / (outside.w - inside.w);
    inside + (outside - inside) * t
}

fn to_screen(clip: Vec4, rect: Rect) -> Pos2 {
    let ndc = clip.truncate() / clip.w;
    egui::pos2(
        rect.center().x + ndc.x * rect.width() * 0.5,
        rect.center().y - ndc.y * rect.height() * 0.5,
    )
}
