//! Live point cloud viewer

use crate::camera::CameraState;
use crate::input::{InputController, InputEvent};
use crate::lifecycle::ViewerLifecycle;
use crate::renderer::FrameRenderer;
use depthview_core::{ColorTable, Point3f, Result, SharedFrame, ViewerConfig};
use depthview_gpu::{Scene, Viewport};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

/// Something a composed [`Scene`] can be drawn on
pub trait RenderSurface {
    /// The drawable area changed size
    fn resize(&mut self, width: u32, height: u32);

    /// Draw and present one frame
    fn present(&mut self, scene: &Scene) -> Result<()>;

    /// Release the drawable once the loop has stopped
    fn teardown(&mut self) {}
}

/// Result of one redraw tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Terminate,
}

/// State shared between the render thread and capture threads
#[derive(Debug)]
pub struct SharedState {
    pub lifecycle: ViewerLifecycle,
    pub frame: SharedFrame,
    colors: RwLock<Arc<ColorTable>>,
    depth_bias: AtomicI32,
}

impl SharedState {
    fn new(capacity: usize) -> Self {
        Self {
            lifecycle: ViewerLifecycle::new(),
            frame: SharedFrame::with_capacity(capacity),
            colors: RwLock::new(Arc::new(ColorTable::default())),
            depth_bias: AtomicI32::new(0),
        }
    }

    /// The color table currently used for drawing
    pub fn colors(&self) -> Arc<ColorTable> {
        self.colors.read().clone()
    }

    /// Depth bias currently applied by the render thread
    pub fn depth_bias(&self) -> i32 {
        self.depth_bias.load(Ordering::Acquire)
    }
}

/// Cloneable, thread-safe access to a running [`Viewer`]
#[derive(Debug, Clone)]
pub struct ViewerHandle {
    shared: Arc<SharedState>,
}

impl ViewerHandle {
    /// Replace the displayed point cloud.
    ///
    /// Ignored unless the viewer is running. `count` is clamped to the frame
    /// capacity and to `points.len()`.
    pub fn ingest(&self, timestamp_ns: u64, points: &[Point3f], count: i32) {
        if !self.shared.lifecycle.is_running() {
            return;
        }
        let kept = self.shared.frame.write(timestamp_ns, points, count);
        tracing::trace!(timestamp_ns, count, kept, "ingested frame");
    }

    /// Replace the displayed point cloud from flattened raw `x, y, z` triplets.
    ///
    /// Depths at or below the viewer's current depth bias become the far
    /// sentinel; the rest are shifted down by the bias.
    pub fn ingest_raw(&self, timestamp_ns: u64, xyz: &[i16], count: i32) {
        if !self.shared.lifecycle.is_running() {
            return;
        }
        let depth_min = self.shared.depth_bias();
        let kept = self.shared.frame.write_raw(timestamp_ns, xyz, count, depth_min);
        tracing::trace!(timestamp_ns, count, kept, depth_min, "ingested raw frame");
    }

    /// Ask the viewer to stop; returns immediately
    pub fn request_stop(&self) {
        self.shared.lifecycle.request_stop();
    }

    /// Rebuild the depth color table for a new sensing range
    pub fn build_color_table(&self, range_min: u32, range_max: u32, span: u32) {
        let table = Arc::new(ColorTable::build(range_min, range_max, span));
        *self.shared.colors.write() = table;
        tracing::info!(range_min, range_max, span, "color table rebuilt");
    }

    pub fn is_running(&self) -> bool {
        self.shared.lifecycle.is_running()
    }

    pub fn is_initialized(&self) -> bool {
        self.shared.lifecycle.is_initialized()
    }

    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }
}

/// Interactive viewer for a live point cloud
///
/// The viewer owns the camera and input state and is driven on one thread,
/// either by [`Viewer::start`] (a window) or [`Viewer::run_headless`].
/// Capture threads talk to it through a [`ViewerHandle`].
pub struct Viewer {
    pub(crate) config: ViewerConfig,
    pub(crate) shared: Arc<SharedState>,
    pub(crate) camera: CameraState,
    pub(crate) input: InputController,
    pub(crate) renderer: FrameRenderer,
    pub(crate) fov_y: f32,
    pub(crate) z_far: f32,
    pub(crate) event_loop: Option<crate::window::ViewerEventLoop>,
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> Self {
        let viewport = Viewport::new(config.window_width, config.window_height);
        Self {
            shared: Arc::new(SharedState::new(config.max_points)),
            camera: CameraState::new(),
            input: InputController::new(viewport.width, viewport.height),
            renderer: FrameRenderer::new(viewport, config.max_points),
            fov_y: config.fov_y,
            z_far: config.z_far,
            event_loop: None,
            config,
        }
    }

    pub fn handle(&self) -> ViewerHandle {
        ViewerHandle {
            shared: self.shared.clone(),
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn input(&self) -> &InputController {
        &self.input
    }

    pub fn frame_renderer(&self) -> &FrameRenderer {
        &self.renderer
    }

    pub fn is_running(&self) -> bool {
        self.shared.lifecycle.is_running()
    }

    /// See [`ViewerHandle::ingest`]
    pub fn ingest(&self, timestamp_ns: u64, points: &[Point3f], count: i32) {
        self.handle().ingest(timestamp_ns, points, count);
    }

    /// See [`ViewerHandle::ingest_raw`]
    pub fn ingest_raw(&self, timestamp_ns: u64, xyz: &[i16], count: i32) {
        self.handle().ingest_raw(timestamp_ns, xyz, count);
    }

    /// See [`ViewerHandle::request_stop`]
    pub fn request_stop(&self) {
        self.shared.lifecycle.request_stop();
    }

    /// See [`ViewerHandle::build_color_table`]
    pub fn build_color_table(&self, range_min: u32, range_max: u32, span: u32) {
        self.handle().build_color_table(range_min, range_max, span);
    }

    /// Apply an input event to the camera. Returns true when the view changed.
    pub fn handle_input(&mut self, event: InputEvent) -> bool {
        if let InputEvent::Resize { width, height } = event {
            self.renderer.resize(width, height);
        }
        let changed = self.input.handle_event(&mut self.camera, event);
        self.shared
            .depth_bias
            .store(self.camera.depth_min, Ordering::Release);
        changed
    }

    /// Draw one frame, or tear down the surface once a stop was requested
    pub fn tick<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) -> TickOutcome {
        if !self.shared.lifecycle.is_running() {
            surface.teardown();
            self.renderer.finish();
            return TickOutcome::Terminate;
        }

        let renderer = &mut self.renderer;
        self.shared.frame.read(|frame| renderer.capture(frame));
        let colors = self.shared.colors();
        let scene = self.renderer.compose(&self.camera, &colors, self.fov_y, self.z_far);

        if let Err(e) = surface.present(&scene) {
            tracing::warn!(error = %e, "failed to present frame");
        }
        TickOutcome::Continue
    }

    /// Run the viewer loop on the calling thread without a window system.
    ///
    /// Redraws every refresh interval until a stop is requested, then tears
    /// the surface down and returns.
    pub fn run_headless<S: RenderSurface + ?Sized>(&mut self, surface: &mut S, fov_y: f32, z_far: f32) -> Result<()> {
        self.prepare(fov_y, z_far)?;
        let viewport = self.renderer.viewport();
        surface.resize(viewport.width, viewport.height);

        if !self.shared.lifecycle.mark_running() {
            tracing::info!("stop requested during start, shutting down");
            surface.teardown();
            self.finish();
            return Ok(());
        }
        tracing::info!(fov_y, z_far, "headless viewer running");

        let interval = self.config.refresh_interval();
        while self.tick(surface) == TickOutcome::Continue {
            self.shared.lifecycle.wait_for_stop(interval);
        }

        self.finish();
        Ok(())
    }

    /// Claim the lifecycle and reset the per-run state
    pub(crate) fn prepare(&mut self, fov_y: f32, z_far: f32) -> Result<()> {
        self.shared.lifecycle.begin_start()?;
        self.fov_y = fov_y;
        self.z_far = z_far;
        self.camera.reset();
        self.shared.frame.clear();
        self.shared.depth_bias.store(self.camera.depth_min, Ordering::Release);
        self.renderer.begin();
        Ok(())
    }

    pub(crate) fn finish(&mut self) {
        self.renderer.finish();
        self.shared.lifecycle.finish();
        tracing::info!("viewer stopped");
    }
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}
