//! # depthview GPU
//!
//! wgpu renderer for the depthview point cloud viewer.
//!
//! A frame is described by a [`Scene`] (colored lines, triangles, point
//! sprites and screen-space text labels) and drawn by a [`SceneRenderer`]
//! bound to a winit window.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use depthview_gpu::{RenderConfig, Scene, SceneRenderer, Viewport};
//! use nalgebra::Matrix4;
//! use std::sync::Arc;
//! use winit::window::Window;
//!
//! async fn example(window: Arc<Window>) -> depthview_core::Result<()> {
//!     let mut renderer = SceneRenderer::new(window, RenderConfig::default()).await?;
//!
//!     let mut scene = Scene::new(Matrix4::identity(), Viewport::new(640, 480));
//!     scene.push_line([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [255, 0, 0]);
//!     renderer.render(&scene)?;
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod overlay;
pub mod renderer;
pub mod scene;

// Re-export commonly used items
pub use device::GpuContext;
pub use overlay::TextOverlay;
pub use renderer::{opengl_to_wgpu_matrix, CameraUniform, RenderConfig, SceneRenderer};
pub use scene::{LabelFont, Scene, SceneVertex, TextLabel, Viewport};
