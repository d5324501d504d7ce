//! Live point cloud viewer
//!
//! This crate provides the interactive side of depthview:
//! - Camera state with an arcball rotation and key/mouse navigation
//! - Frame composition (grid, axes, help, depth legend, colored points)
//! - A start/stop lifecycle that capture threads can drive
//! - A winit window driver and a headless driver
//!
//! ```rust,no_run
//! use depthview_core::ViewerConfig;
//! use depthview_visualization::Viewer;
//!
//! let mut viewer = Viewer::new(ViewerConfig::default());
//! let handle = viewer.handle();
//! handle.build_color_table(500, 4000, 1000);
//!
//! std::thread::spawn(move || {
//!     // capture loop
//!     handle.ingest_raw(0, &[0, 0, 1200], 1);
//! });
//!
//! if let Err(e) = viewer.start(70.0, 9000.0, "depthview") {
//!     std::process::exit(e.status_code());
//! }
//! ```

pub mod camera;
pub mod input;
pub mod lifecycle;
pub mod renderer;
pub mod viewer;
pub mod window;

pub use camera::*;
pub use input::{DragClass, DragSession, InputController, InputEvent, Modifiers, MouseButton, SpecialKey};
pub use lifecycle::{LifecycleState, ViewerLifecycle};
pub use renderer::{FrameRenderer, RendererState, HELP_TEXT, NEAR_PLANE};
pub use viewer::*;
pub use window::{ViewerEvent, WindowSurface};
