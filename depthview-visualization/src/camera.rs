//! Camera and view state for the live viewer

use depthview_core::rotation::{self, drag_rotation, normalized, quat_multiply, quat_to_matrix};
use nalgebra::{Matrix4, Point3, Quaternion, Vector3};

/// Eye position restored by [`CameraState::reset`]
pub const CANONICAL_EYE: [f32; 3] = [1.5, 0.5, -6.0];
/// Reference distance that zoom and drag gain are expressed against
pub const SCALE_REFERENCE: f32 = 600.0;
/// Zoom restored by [`CameraState::reset`]
pub const DEFAULT_ZOOM: i32 = 60;
/// Smallest zoom factor allowed
pub const ZOOM_FLOOR: i32 = 15;
/// Zoom change per wheel notch or zoom key
pub const ZOOM_STEP: i32 = 15;
/// Change in depth bias per key press
pub const DEPTH_MIN_STEP: i32 = 50;
/// Eye movement per key press
pub const EYE_STEP: f32 = 0.1;
pub const DEFAULT_DOT_SIZE: u32 = 1;
pub const MIN_DOT_SIZE: u32 = 1;
pub const MAX_DOT_SIZE: u32 = 100;
/// Multiplier on window-normalized drag distances for pan and dolly
pub const DRAG_GAIN: f32 = 6.0;

/// A display overlay that can be switched on and off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Grid,
    Axes,
    Help,
    Legend,
    Points,
}

/// Independent on/off switches for each part of the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayToggles {
    pub grid: bool,
    pub axes: bool,
    pub help: bool,
    pub legend: bool,
    pub points: bool,
}

impl DisplayToggles {
    /// Flip one switch and return its new value
    pub fn toggle(&mut self, which: Toggle) -> bool {
        let flag = match which {
            Toggle::Grid => &mut self.grid,
            Toggle::Axes => &mut self.axes,
            Toggle::Help => &mut self.help,
            Toggle::Legend => &mut self.legend,
            Toggle::Points => &mut self.points,
        };
        *flag = !*flag;
        *flag
    }

    pub fn is_enabled(&self, which: Toggle) -> bool {
        match which {
            Toggle::Grid => self.grid,
            Toggle::Axes => self.axes,
            Toggle::Help => self.help,
            Toggle::Legend => self.legend,
            Toggle::Points => self.points,
        }
    }
}

impl Default for DisplayToggles {
    fn default() -> Self {
        Self {
            grid: true,
            axes: true,
            help: true,
            legend: true,
            points: true,
        }
    }
}

/// Mutable view parameters of the viewer
///
/// `current` is the committed orientation; `drag` is the orientation shown
/// while a rotation drag is in progress. `rotation` is always the matrix of
/// the orientation being displayed.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraState {
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
    pub current: Quaternion<f64>,
    pub drag: Quaternion<f64>,
    pub rotation: Matrix4<f64>,
    pub zoom: i32,
    pub pan: Vector3<f32>,
    pub depth_min: i32,
    pub dot_size: u32,
    pub toggles: DisplayToggles,
}

impl CameraState {
    pub fn new() -> Self {
        Self {
            eye: Point3::from(CANONICAL_EYE),
            target: Point3::origin(),
            current: rotation::identity(),
            drag: rotation::identity(),
            rotation: Matrix4::identity(),
            zoom: DEFAULT_ZOOM,
            pan: Vector3::zeros(),
            depth_min: 0,
            dot_size: DEFAULT_DOT_SIZE,
            toggles: DisplayToggles::default(),
        }
    }

    /// Restore the canonical pose.
    ///
    /// Display toggles and dot size are left alone.
    pub fn reset(&mut self) {
        self.eye = Point3::from(CANONICAL_EYE);
        self.target = Point3::origin();
        self.zoom = DEFAULT_ZOOM;
        self.pan = Vector3::zeros();
        self.depth_min = 0;
        self.current = rotation::identity();
        self.drag = rotation::identity();
        self.rotation = quat_to_matrix(&self.current);
    }

    /// Change zoom by `steps` increments; negative steps zoom in
    pub fn step_zoom(&mut self, steps: i32) {
        self.zoom = self
            .zoom
            .saturating_add(steps.saturating_mul(ZOOM_STEP))
            .max(ZOOM_FLOOR);
    }

    pub fn move_eye(&mut self, dx: f32, dy: f32, dz: f32) {
        self.eye += Vector3::new(dx, dy, dz);
    }

    /// Move the eye along z; the target follows one unit ahead while the eye
    /// is on the negative side, and sits at the origin otherwise.
    pub fn dolly(&mut self, dz: f32) {
        self.eye.z += dz;
        self.target.z = if self.eye.z < 0.0 { self.eye.z - 1.0 } else { 0.0 };
    }

    pub fn pan_view(&mut self, dx: f32, dy: f32) {
        self.pan.x += dx;
        self.pan.y += dy;
    }

    pub fn shift_depth(&mut self, dz: f32) {
        self.pan.z += dz;
    }

    /// Shift the depth bias by `steps` increments, never below zero
    pub fn adjust_depth_min(&mut self, steps: i32) {
        self.depth_min = self
            .depth_min
            .saturating_add(steps.saturating_mul(DEPTH_MIN_STEP))
            .max(0);
    }

    pub fn adjust_dot_size(&mut self, delta: i32) {
        let size = (self.dot_size as i64 + delta as i64).clamp(MIN_DOT_SIZE as i64, MAX_DOT_SIZE as i64);
        self.dot_size = size as u32;
    }

    /// World units moved per window-normalized unit of drag
    pub fn drag_gain(&self) -> f32 {
        DRAG_GAIN * (SCALE_REFERENCE / self.zoom as f32)
    }

    /// Start a rotation drag from the committed orientation
    pub fn begin_drag_rotation(&mut self) {
        self.drag = self.current;
    }

    /// Update the in-drag orientation from the drag displacement in
    /// window-normalized units. Returns false for a zero displacement.
    pub fn drag_rotation(&mut self, dx: f64, dy: f64) -> bool {
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        let delta = drag_rotation(dx, dy);
        self.drag = normalized(&quat_multiply(&delta, &self.current));
        self.rotation = quat_to_matrix(&self.drag);
        true
    }

    /// Make the in-drag orientation the committed one
    pub fn commit_rotation(&mut self) {
        self.current = self.drag;
        self.rotation = quat_to_matrix(&self.current);
    }

    /// Point the camera looks at: tracks the eye in x and y.
    pub fn view_target(&self) -> Point3<f32> {
        let z = if self.target.z == self.eye.z {
            self.eye.z - 1.0
        } else {
            self.target.z
        };
        Point3::new(self.eye.x, self.eye.y, z)
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self::new()
    }
}
