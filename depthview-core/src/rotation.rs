//! Quaternion rotation engine used by the arcball camera
//!
//! Quaternions are `nalgebra::Quaternion<f64>` in `(w, x, y, z)` order as
//! constructed by [`Quaternion::new`].

use nalgebra::{Matrix3, Matrix4, Quaternion};

/// Angle (radians) swept by a drag across one full normalized window unit.
pub const ARCBALL_ANGULAR_SCALE: f64 = 2.0 * std::f64::consts::PI * 0.0625;

/// The identity rotation `(1, 0, 0, 0)`
pub fn identity() -> Quaternion<f64> {
    Quaternion::new(1.0, 0.0, 0.0, 0.0)
}

/// Hamilton product `p * q`: apply `q` first, then `p`.
pub fn quat_multiply(p: &Quaternion<f64>, q: &Quaternion<f64>) -> Quaternion<f64> {
    Quaternion::new(
        p.w * q.w - p.i * q.i - p.j * q.j - p.k * q.k,
        p.w * q.i + p.i * q.w + p.j * q.k - p.k * q.j,
        p.w * q.j - p.i * q.k + p.j * q.w + p.k * q.i,
        p.w * q.k + p.i * q.j - p.j * q.i + p.k * q.w,
    )
}

/// 3×3 rotation matrix of a unit quaternion
pub fn quat_to_matrix3(q: &Quaternion<f64>) -> Matrix3<f64> {
    let x2 = q.i * q.i * 2.0;
    let y2 = q.j * q.j * 2.0;
    let z2 = q.k * q.k * 2.0;
    let xy = q.i * q.j * 2.0;
    let yz = q.j * q.k * 2.0;
    let zx = q.k * q.i * 2.0;
    let xw = q.i * q.w * 2.0;
    let yw = q.j * q.w * 2.0;
    let zw = q.k * q.w * 2.0;

    Matrix3::new(
        1.0 - y2 - z2, xy - zw, zx + yw,
        xy + zw, 1.0 - z2 - x2, yz - xw,
        zx - yw, yz + xw, 1.0 - x2 - y2,
    )
}

/// Homogeneous 4×4 rotation matrix of a unit quaternion; no translation.
///
/// nalgebra stores matrices column-major, so `as_slice()` yields the layout a
/// GL-style `multMatrix` expects.
pub fn quat_to_matrix(q: &Quaternion<f64>) -> Matrix4<f64> {
    quat_to_matrix3(q).to_homogeneous()
}

/// Delta rotation for an arcball drag of `(dx, dy)` normalized window units.
///
/// Horizontal motion spins about the y axis and vertical motion about the x
/// axis. A zero displacement yields the identity.
pub fn drag_rotation(dx: f64, dy: f64) -> Quaternion<f64> {
    let a = dx.hypot(dy);
    if a == 0.0 {
        return identity();
    }
    let angle = a * ARCBALL_ANGULAR_SCALE;
    let s = angle.sin() / a;
    Quaternion::new(angle.cos(), dy * s, dx * s, 0.0)
}

/// Scale `q` back to unit length, falling back to identity for a zero quaternion
pub fn normalized(q: &Quaternion<f64>) -> Quaternion<f64> {
    let norm = q.norm();
    if norm > f64::EPSILON {
        *q / norm
    } else {
        identity()
    }
}
