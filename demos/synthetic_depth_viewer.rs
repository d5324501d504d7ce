//! Synthetic Depth Viewer
//!
//! Streams a generated depth scene into the live point cloud viewer:
//! - A capture thread produces raw `x, y, z` frames at a fixed rate
//! - The viewer window runs on the main thread
//! - An optional timer stops the viewer from a third thread
//!
//! Run with `RUST_LOG=debug` for lifecycle and renderer logs.

use anyhow::Result;
use clap::Parser;
use depthview_core::{ViewerConfig, DEFAULT_SPAN};
use depthview_visualization::{Viewer, ViewerHandle};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Millimetres between neighbouring synthetic pixels
const PIXEL_PITCH: f64 = 6.0;
/// Pixels this close to the image border report no depth
const DROPOUT_BORDER: usize = 4;

#[derive(Parser, Debug)]
#[command(name = "synthetic_depth_viewer")]
#[command(about = "Live 3D point cloud viewer fed by a synthetic depth sensor")]
struct Args {
    /// Vertical field of view in degrees
    #[arg(long, default_value_t = 30.0)]
    fov: f32,

    /// Far clip distance
    #[arg(long, default_value_t = 9000.0)]
    z_far: f32,

    /// Redraw period in milliseconds
    #[arg(long, default_value_t = 30)]
    refresh_ms: u64,

    /// Near end of the sensing range (mm)
    #[arg(long, default_value_t = 500)]
    near: u32,

    /// Far end of the sensing range (mm)
    #[arg(long, default_value_t = 4000)]
    far: u32,

    /// Synthetic image width in pixels
    #[arg(long, default_value_t = 320)]
    width: usize,

    /// Synthetic image height in pixels
    #[arg(long, default_value_t = 240)]
    height: usize,

    /// Frames produced per second
    #[arg(long, default_value_t = 30.0)]
    capture_fps: f64,

    /// Stop the viewer after this many seconds
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Window title
    #[arg(long, default_value = "depthview")]
    title: String,
}

fn main() -> Result<()> {
    // Set RUST_LOG to control the log level, e.g. RUST_LOG=depthview_visualization=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let args = Args::parse();
    let width = args.width.max(1);
    let height = args.height.max(1);

    let config = ViewerConfig::default()
        .with_fov_y(args.fov)
        .with_z_far(args.z_far)
        .with_refresh_interval(Duration::from_millis(args.refresh_ms))
        .with_max_points(width * height);

    let mut viewer = Viewer::new(config);
    let handle = viewer.handle();
    handle.build_color_table(args.near, args.far, DEFAULT_SPAN);

    let capture_done = Arc::new(AtomicBool::new(false));
    let capture = {
        let handle = handle.clone();
        let done = capture_done.clone();
        let scene = SyntheticScene::new(width, height, args.near, args.far);
        let period = Duration::from_secs_f64(1.0 / args.capture_fps.max(1.0));
        thread::spawn(move || capture_loop(handle, scene, period, done))
    };

    if let Some(secs) = args.duration_secs {
        let handle = handle.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(secs));
            tracing::info!(secs, "run duration elapsed, stopping viewer");
            handle.request_stop();
        });
    }

    let status = match viewer.start(args.fov, args.z_far, &args.title) {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %e, "viewer exited with an error");
            e.status_code()
        }
    };

    capture_done.store(true, Ordering::Release);
    if capture.join().is_err() {
        tracing::error!("capture thread panicked");
    }

    if status != 0 {
        std::process::exit(status);
    }
    Ok(())
}

fn capture_loop(handle: ViewerHandle, scene: SyntheticScene, period: Duration, done: Arc<AtomicBool>) {
    let started = Instant::now();
    let mut rng = rand::thread_rng();
    let mut buffer = Vec::new();
    let mut frames = 0u64;

    while !done.load(Ordering::Acquire) {
        let tick = Instant::now();
        let count = scene.render(&mut buffer, started.elapsed().as_secs_f64(), &mut rng);
        handle.ingest_raw(timestamp_ns(), &buffer, count as i32);
        frames += 1;
        if frames % 300 == 0 {
            tracing::debug!(frames, points = count, "capture progress");
        }

        if let Some(rest) = period.checked_sub(tick.elapsed()) {
            thread::sleep(rest);
        }
    }
    tracing::info!(frames, "capture stopped");
}

fn timestamp_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// A sphere orbiting in front of a tilted wall
struct SyntheticScene {
    width: usize,
    height: usize,
    wall_depth: f64,
    sphere_depth: f64,
    sphere_radius: f64,
}

impl SyntheticScene {
    fn new(width: usize, height: usize, near: u32, far: u32) -> Self {
        let near = near as f64;
        let far = (far as f64).max(near + 1.0);
        Self {
            width,
            height,
            wall_depth: near + (far - near) * 0.8,
            sphere_depth: near + (far - near) * 0.35,
            sphere_radius: (width.min(height) as f64 * PIXEL_PITCH) * 0.25,
        }
    }

    /// Fill `out` with flattened raw triplets for time `t`; returns the point count
    fn render(&self, out: &mut Vec<i16>, t: f64, rng: &mut impl Rng) -> usize {
        out.clear();
        out.reserve(self.width * self.height * 3);

        let half_w = self.width as f64 / 2.0;
        let half_h = self.height as f64 / 2.0;
        let orbit = half_w.min(half_h) * PIXEL_PITCH * 0.5;
        let (cx, cy) = (orbit * t.cos(), orbit * (t * 0.7).sin());

        for row in 0..self.height {
            for col in 0..self.width {
                let x = (col as f64 - half_w) * PIXEL_PITCH;
                let y = (half_h - row as f64) * PIXEL_PITCH;

                let dropout = row < DROPOUT_BORDER
                    || col < DROPOUT_BORDER
                    || row + DROPOUT_BORDER >= self.height
                    || col + DROPOUT_BORDER >= self.width;

                let z = if dropout {
                    0.0
                } else {
                    let wall = self.wall_depth + x * 0.3;
                    let (dx, dy) = (x - cx, y - cy);
                    let inside = self.sphere_radius * self.sphere_radius - dx * dx - dy * dy;
                    let surface = if inside > 0.0 {
                        (self.sphere_depth - inside.sqrt()).min(wall)
                    } else {
                        wall
                    };
                    surface + rng.gen_range(-4.0..4.0)
                };

                out.extend_from_slice(&[to_raw(x), to_raw(y), to_raw(z)]);
            }
        }
        self.width * self.height
    }
}

fn to_raw(value: f64) -> i16 {
    value.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
}
