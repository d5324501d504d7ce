//! Renderer-agnostic description of one frame

use bytemuck::{Pod, Zeroable};
use nalgebra::{Matrix4, Point3};

/// A colored vertex used for lines, triangles and point sprites
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SceneVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl SceneVertex {
    /// Create a vertex from a position and an 8-bit RGB color
    pub fn new(position: [f32; 3], color: [u8; 3]) -> Self {
        Self {
            position,
            color: [
                color[0] as f32 / 255.0,
                color[1] as f32 / 255.0,
                color[2] as f32 / 255.0,
            ],
        }
    }

    /// Vertex buffer layout descriptor
    pub fn desc<'a>(step_mode: wgpu::VertexStepMode) -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SceneVertex>() as wgpu::BufferAddress,
            step_mode,
            attributes: &[
                // Position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Color
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Font used for a text label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelFont {
    /// Small proportional font for axis and legend captions
    Caption,
    /// Fixed-width font for the key help block
    Help,
}

/// Text placed at a window position in physical pixels (origin top-left)
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub position: [f32; 2],
    pub text: String,
    pub color: [u8; 3],
    pub font: LabelFont,
}

/// Window size in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height; 1.0 for a collapsed window
    pub fn aspect(&self) -> f32 {
        if self.width == 0 || self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Project a world point through `view_proj` to window pixels.
    ///
    /// Returns `None` for points behind the camera.
    pub fn project(&self, view_proj: &Matrix4<f32>, point: &Point3<f32>) -> Option<[f32; 2]> {
        let clip = view_proj * point.to_homogeneous();
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        Some([
            (ndc_x + 1.0) * 0.5 * self.width as f32,
            (1.0 - ndc_y) * 0.5 * self.height as f32,
        ])
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

/// Everything needed to draw one frame
///
/// Geometry is drawn in the order lines, triangles, points; labels are painted
/// on top of the 3D content.
#[derive(Debug, Clone)]
pub struct Scene {
    pub view_proj: Matrix4<f32>,
    pub viewport: Viewport,
    pub lines: Vec<SceneVertex>,
    pub triangles: Vec<SceneVertex>,
    pub points: Vec<SceneVertex>,
    pub point_size: f32,
    pub labels: Vec<TextLabel>,
    pub timestamp_ns: u64,
}

impl Scene {
    /// An empty scene for the given camera transform
    pub fn new(view_proj: Matrix4<f32>, viewport: Viewport) -> Self {
        Self {
            view_proj,
            viewport,
            lines: Vec::new(),
            triangles: Vec::new(),
            points: Vec::new(),
            point_size: 1.0,
            labels: Vec::new(),
            timestamp_ns: 0,
        }
    }

    /// Add a line segment with a single color
    pub fn push_line(&mut self, from: [f32; 3], to: [f32; 3], color: [u8; 3]) {
        self.lines.push(SceneVertex::new(from, color));
        self.lines.push(SceneVertex::new(to, color));
    }

    /// Add a label anchored at a world position; dropped if behind the camera
    pub fn push_world_label(&mut self, anchor: Point3<f32>, text: &str, color: [u8; 3], font: LabelFont) {
        if let Some(position) = self.viewport.project(&self.view_proj, &anchor) {
            self.labels.push(TextLabel {
                position,
                text: text.to_string(),
                color,
                font,
            });
        }
    }

    /// Check if nothing would be drawn
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.triangles.is_empty() && self.points.is_empty() && self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_vertex_color_normalisation() {
        let v = SceneVertex::new([1.0, 2.0, 3.0], [255, 0, 51]);
        assert_eq!(v.color, [1.0, 0.0, 0.2]);
        assert_eq!(std::mem::size_of::<SceneVertex>(), 24);
    }

    #[test]
    fn test_project_identity() {
        let viewport = Viewport::new(200, 100);
        let center = viewport.project(&Matrix4::identity(), &Point3::origin()).unwrap();
        assert_relative_eq!(center[0], 100.0);
        assert_relative_eq!(center[1], 50.0);

        let corner = viewport.project(&Matrix4::identity(), &Point3::new(-1.0, 1.0, 0.0)).unwrap();
        assert_relative_eq!(corner[0], 0.0);
        assert_relative_eq!(corner[1], 0.0);
    }

    #[test]
    fn test_project_behind_camera() {
        let viewport = Viewport::default();
        let mut flip = Matrix4::identity();
        flip[(3, 3)] = -1.0;
        assert!(viewport.project(&flip, &Point3::origin()).is_none());

        let mut scene = Scene::new(flip, viewport);
        scene.push_world_label(Point3::origin(), "hidden", [255, 255, 255], LabelFont::Caption);
        assert!(scene.labels.is_empty());
        assert!(scene.is_empty());
    }

    #[test]
    fn test_aspect() {
        assert_eq!(Viewport::new(640, 480).aspect(), 640.0 / 480.0);
        assert_eq!(Viewport::new(0, 480).aspect(), 1.0);
    }
}
