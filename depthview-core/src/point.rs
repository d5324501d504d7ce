//! Point types and related functionality

use nalgebra::{Point3, Vector3};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// Depth assigned to points at or below the near floor.
///
/// The point stays in the frame and indexes the last slot of the color table,
/// so it renders with the far color instead of disappearing.
pub const FAR_SENTINEL: f32 = u16::MAX as f32;

/// Convert one raw sensor sample into a renderable point.
///
/// Samples whose depth does not exceed `depth_min` are pushed to
/// [`FAR_SENTINEL`]; the rest are shifted toward the camera by `depth_min`.
#[inline]
pub fn point_from_raw(x: i16, y: i16, z: i16, depth_min: i32) -> Point3f {
    let depth = if i32::from(z) > depth_min {
        (i32::from(z) - depth_min) as f32
    } else {
        FAR_SENTINEL
    };
    Point3f::new(f32::from(x), f32::from(y), depth)
}
