//! Core data structures for depthview
//!
//! This crate provides the renderer-independent pieces of the live point
//! cloud viewer: the point cloud frame shared with the capture side, the
//! rainbow depth color table, the quaternion rotation engine and the viewer
//! configuration.

pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod point;
pub mod rotation;

pub use color::*;
pub use config::*;
pub use error::*;
pub use frame::*;
pub use point::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix3, Matrix4, Point3, Quaternion, Vector3};
