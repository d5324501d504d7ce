//! Viewer configuration

use crate::frame::DEFAULT_FRAME_CAPACITY;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Plain-value configuration for a viewer instance
///
/// Every field has a default, so a partial serialized config is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Vertical field of view in degrees
    pub fov_y: f32,
    /// Far clip distance
    pub z_far: f32,
    /// Redraw period in milliseconds
    pub refresh_interval_ms: u64,
    /// Maximum number of points a frame can hold
    pub max_points: usize,
    /// Initial window width in logical pixels
    pub window_width: u32,
    /// Initial window height in logical pixels
    pub window_height: u32,
    /// Initial window position in logical pixels
    pub window_position: [i32; 2],
    /// Clear color (RGBA, 0..1)
    pub background: [f64; 4],
}

impl ViewerConfig {
    /// Set the vertical field of view in degrees
    pub fn with_fov_y(mut self, fov_y: f32) -> Self {
        self.fov_y = fov_y;
        self
    }

    /// Set the far clip distance
    pub fn with_z_far(mut self, z_far: f32) -> Self {
        self.z_far = z_far;
        self
    }

    /// Set the redraw period
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval_ms = interval.as_millis().max(1) as u64;
        self
    }

    /// Set the frame capacity
    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = max_points;
        self
    }

    /// Set the initial window size
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    /// Redraw period as a [`Duration`], never zero
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms.max(1))
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            fov_y: 70.0,
            z_far: 9000.0,
            refresh_interval_ms: 30,
            max_points: DEFAULT_FRAME_CAPACITY,
            window_width: 640,
            window_height: 480,
            window_position: [640, 240],
            background: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ViewerConfig::default();
        assert_eq!(config.refresh_interval(), Duration::from_millis(30));
        assert_eq!(config.max_points, 640 * 480 * 2);
        assert_eq!(config.fov_y, 70.0);
        assert_eq!(config.z_far, 9000.0);
    }

    #[test]
    fn test_builder() {
        let config = ViewerConfig::default()
            .with_fov_y(30.0)
            .with_z_far(500.0)
            .with_refresh_interval(Duration::ZERO)
            .with_max_points(16)
            .with_window_size(800, 600);
        assert_eq!(config.fov_y, 30.0);
        assert_eq!(config.z_far, 500.0);
        assert_eq!(config.refresh_interval(), Duration::from_millis(1));
        assert_eq!(config.max_points, 16);
        assert_eq!((config.window_width, config.window_height), (800, 600));
    }
}
