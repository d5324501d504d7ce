//! Frame composition: camera transform, overlays and the colored point cloud

use crate::camera::CameraState;
use depthview_core::{ColorTable, PointCloudFrame};
use depthview_gpu::{opengl_to_wgpu_matrix, LabelFont, Scene, SceneVertex, Viewport};
use nalgebra::{Matrix4, Perspective3, Point3, Vector3};

/// Near clip distance
pub const NEAR_PLANE: f32 = 0.01;
/// Half extent of the ground grid in world units
pub const GRID_HALF_EXTENT: i32 = 4;
const GRID_COLOR: [u8; 3] = [128, 128, 128];
const WHITE: [u8; 3] = [255, 255, 255];

const LEGEND_X: f32 = -0.5;
const LEGEND_WIDTH: f32 = 0.1;
const LEGEND_HEIGHT: f32 = 2.0;
/// Legend colors from the top (far) to the bottom (near) of the bar
const LEGEND_STOPS: [[u8; 3]; 5] = [
    [0, 0, 255],
    [0, 255, 255],
    [0, 255, 0],
    [255, 255, 0],
    [255, 0, 0],
];

/// Key help shown in the view
pub const HELP_TEXT: &str = "\
F1/h = Toggle This Help Message
F2/a = Toggle XYZ Axis Display
F3/g = Toggle Grid Display
F4/l = Toggle Color Depth Bar Legend Display
p    = Toggle Point Cloud Display
F7   = Dec Depth Range          F8  = Inc Depth Range
F9   = Dec Dot Size             F10 = Inc Dot Size
F11/Z/WheelUp = Zoom In         F12/z/WheelDown = Zoom Out
PageUp/w = Move Camera Forward  PageDown/r = Move Camera Backward
Left/s   = Move Camera Left     Right/f    = Move Camera Right
Up/e     = Move Camera Up       Down/d     = Move Camera Down
LeftMouseHold = Rotate View
Ctrl/Shift/Alt+LeftMouseHold = Pan XY / Move Camera Z / Pan Z
Home/c/RightMouse = Reset View";

/// Renderer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    Uninitialized,
    Running,
    /// The loop has stopped; the window has been torn down.
    StoppingNoLoop,
}

/// Builds one [`Scene`] per redraw tick from the camera and the latest frame
#[derive(Debug)]
pub struct FrameRenderer {
    viewport: Viewport,
    state: RendererState,
    snapshot: PointCloudFrame,
    last_timestamp_ns: Option<u64>,
    frames_drawn: u64,
}

impl FrameRenderer {
    /// Create a renderer whose snapshot buffer holds `capacity` points
    pub fn new(viewport: Viewport, capacity: usize) -> Self {
        Self {
            viewport,
            state: RendererState::Uninitialized,
            snapshot: PointCloudFrame::with_capacity(capacity),
            last_timestamp_ns: None,
            frames_drawn: 0,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Track a new window size; a collapsed window keeps the previous size
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.viewport = Viewport::new(width, height);
        }
    }

    pub fn state(&self) -> RendererState {
        self.state
    }

    pub fn begin(&mut self) {
        self.state = RendererState::Running;
        self.last_timestamp_ns = None;
        self.frames_drawn = 0;
        self.snapshot.clear();
    }

    pub fn finish(&mut self) {
        if self.state == RendererState::Running {
            tracing::debug!(frames = self.frames_drawn, "frame renderer stopped");
        }
        self.state = RendererState::StoppingNoLoop;
    }

    /// Timestamp of the point cloud in the last composed frame
    pub fn last_timestamp_ns(&self) -> Option<u64> {
        self.last_timestamp_ns
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Copy of the most recently captured frame
    pub fn snapshot(&self) -> &PointCloudFrame {
        &self.snapshot
    }

    /// Replace the snapshot from the shared frame.
    ///
    /// Runs inside the shared frame's lock, so it is a single bounded copy.
    pub fn capture(&mut self, frame: &PointCloudFrame) {
        self.snapshot
            .overwrite(frame.timestamp_ns(), frame.points(), frame.len() as i32);
    }

    /// Projection × look-at × rotation for the current camera
    pub fn view_projection(&self, camera: &CameraState, fov_y_degrees: f32, z_far: f32) -> Matrix4<f32> {
        let projection = Perspective3::new(
            self.viewport.aspect(),
            fov_y_degrees.to_radians(),
            NEAR_PLANE,
            z_far.max(NEAR_PLANE * 2.0),
        );
        let view = Matrix4::look_at_rh(&camera.eye, &camera.view_target(), &Vector3::y());
        opengl_to_wgpu_matrix() * projection.to_homogeneous() * view * camera.rotation.cast::<f32>()
    }

    /// Compose the frame for the current snapshot.
    ///
    /// Draw order is grid, axes, help text, legend, points.
    pub fn compose(&mut self, camera: &CameraState, table: &ColorTable, fov_y_degrees: f32, z_far: f32) -> Scene {
        let view_proj = self.view_projection(camera, fov_y_degrees, z_far);
        let mut scene = Scene::new(view_proj, self.viewport);
        let toggles = camera.toggles;

        if toggles.grid {
            push_grid(&mut scene);
        }
        if toggles.axes {
            push_axes(&mut scene);
        }
        if toggles.help {
            scene.push_world_label(Point3::new(0.0, -0.2, 0.0), HELP_TEXT, WHITE, LabelFont::Help);
        }
        if toggles.legend {
            push_legend(&mut scene);
        }
        if toggles.points {
            self.push_points(&mut scene, camera, table);
        }

        scene.timestamp_ns = self.snapshot.timestamp_ns();
        self.last_timestamp_ns = Some(scene.timestamp_ns);
        self.frames_drawn += 1;
        scene
    }

    fn push_points(&self, scene: &mut Scene, camera: &CameraState, table: &ColorTable) {
        let zoom = camera.zoom as f32;
        let depth_min = camera.depth_min as i64;
        scene.point_size = camera.dot_size as f32;
        scene.points.reserve(self.snapshot.len());
        scene.points.extend(self.snapshot.iter().map(|p| {
            let color = table.lookup((p.z as i64).saturating_add(depth_min));
            let position = p.coords / zoom + camera.pan;
            SceneVertex::new([position.x, position.y, position.z], color)
        }));
    }
}

fn push_grid(scene: &mut Scene) {
    let extent = GRID_HALF_EXTENT as f32;
    for i in -GRID_HALF_EXTENT..=GRID_HALF_EXTENT {
        let i = i as f32;
        scene.push_line([i, 0.0, -extent], [i, 0.0, extent], GRID_COLOR);
        scene.push_line([extent, 0.0, i], [-extent, 0.0, i], GRID_COLOR);
    }
}

fn push_axes(scene: &mut Scene) {
    let axes = [
        ([1.0, 0.0, 0.0], [255, 0, 0], Point3::new(1.1, -0.025, 0.0), "X-axis"),
        ([0.0, 1.0, 0.0], [0, 255, 0], Point3::new(-0.15, 1.1, 0.0), "Y-axis"),
        ([0.0, 0.0, 1.0], [0, 0, 255], Point3::new(-0.15, 0.0, 1.1), "Z-axis"),
    ];
    for (end, color, anchor, text) in axes {
        scene.push_line([0.0, 0.0, 0.0], end, color);
        scene.push_world_label(anchor, text, color, LabelFont::Caption);
    }
}

fn push_legend(scene: &mut Scene) {
    let left = LEGEND_X;
    let right = LEGEND_X + LEGEND_WIDTH;
    let step = LEGEND_HEIGHT / (LEGEND_STOPS.len() - 1) as f32;
    let top = LEGEND_HEIGHT / 2.0;

    for (i, pair) in LEGEND_STOPS.windows(2).enumerate() {
        let y0 = top - step * i as f32;
        let y1 = y0 - step;
        let (c0, c1) = (pair[0], pair[1]);
        scene.triangles.extend_from_slice(&[
            SceneVertex::new([left, y0, 0.0], c0),
            SceneVertex::new([right, y0, 0.0], c0),
            SceneVertex::new([right, y1, 0.0], c1),
            SceneVertex::new([left, y0, 0.0], c0),
            SceneVertex::new([right, y1, 0.0], c1),
            SceneVertex::new([left, y1, 0.0], c1),
        ]);
    }

    let label_x = right + 0.05;
    scene.push_world_label(Point3::new(label_x, -top, 0.0), "Near", WHITE, LabelFont::Caption);
    scene.push_world_label(Point3::new(label_x, top, 0.0), "Far", WHITE, LabelFont::Caption);
}
