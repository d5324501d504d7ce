//! Integration tests for depthview-visualization
//!
//! These tests drive the viewer through its public API with the headless
//! loop and a recording surface, so no window system or GPU is needed.

use depthview_core::{Error, Point3f, Result, ViewerConfig, FAR_SENTINEL};
use depthview_gpu::Scene;
use depthview_visualization::*;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// Surface that keeps a summary of every presented scene
#[derive(Debug, Default)]
struct RecordingSurface {
    sizes: Vec<(u32, u32)>,
    frames: Vec<RecordedFrame>,
    torn_down: bool,
}

#[derive(Debug, Clone)]
struct RecordedFrame {
    timestamp_ns: u64,
    points: usize,
    first_point: Option<[f32; 3]>,
}

impl RenderSurface for RecordingSurface {
    fn resize(&mut self, width: u32, height: u32) {
        self.sizes.push((width, height));
    }

    fn present(&mut self, scene: &Scene) -> Result<()> {
        self.frames.push(RecordedFrame {
            timestamp_ns: scene.timestamp_ns,
            points: scene.points.len(),
            first_point: scene.points.first().map(|v| v.position),
        });
        Ok(())
    }

    fn teardown(&mut self) {
        self.torn_down = true;
    }
}

/// Surface whose presents always fail
struct FailingSurface {
    attempts: usize,
}

impl RenderSurface for FailingSurface {
    fn resize(&mut self, _width: u32, _height: u32) {}

    fn present(&mut self, _scene: &Scene) -> Result<()> {
        self.attempts += 1;
        Err(Error::Surface("lost".to_string()))
    }
}

/// Surface that asks the viewer to stop while it is still being set up
struct StopOnResizeSurface {
    handle: ViewerHandle,
    presented: usize,
    torn_down: bool,
}

impl RenderSurface for StopOnResizeSurface {
    fn resize(&mut self, _width: u32, _height: u32) {
        self.handle.request_stop();
    }

    fn present(&mut self, _scene: &Scene) -> Result<()> {
        self.presented += 1;
        Ok(())
    }

    fn teardown(&mut self) {
        self.torn_down = true;
    }
}

fn fast_config() -> ViewerConfig {
    ViewerConfig::default()
        .with_refresh_interval(Duration::from_millis(10))
        .with_max_points(1024)
}

/// Spawn a headless viewer on its own thread and wait until it runs
fn spawn_headless(config: ViewerConfig) -> (ViewerHandle, thread::JoinHandle<(Result<()>, RecordingSurface)>) {
    let (tx, rx) = mpsc::channel();
    let join = thread::spawn(move || {
        let mut viewer = Viewer::new(config);
        tx.send(viewer.handle()).expect("test receiver alive");
        let mut surface = RecordingSurface::default();
        let result = viewer.run_headless(&mut surface, 70.0, 9000.0);
        (result, surface)
    });
    let handle = rx.recv().expect("viewer thread started");

    let deadline = Instant::now() + Duration::from_secs(5);
    while !handle.is_running() {
        assert!(Instant::now() < deadline, "viewer never reached running state");
        thread::sleep(Duration::from_millis(1));
    }
    (handle, join)
}

#[test]
fn test_stop_from_other_thread_terminates_promptly() {
    let config = fast_config().with_refresh_interval(Duration::from_millis(50));
    let refresh = config.refresh_interval();
    let (handle, join) = spawn_headless(config);

    thread::sleep(refresh * 3);
    let requested = Instant::now();
    handle.request_stop();
    let (result, surface) = join.join().expect("viewer thread panicked");
    let elapsed = requested.elapsed();

    assert!(result.is_ok());
    assert!(elapsed <= refresh * 2, "stop took {:?}", elapsed);
    assert!(surface.torn_down);
    assert_eq!(surface.sizes, vec![(640, 480)]);
    assert!(!surface.frames.is_empty());
    assert!(!handle.is_initialized());
}

#[test]
fn test_stop_during_initialization_returns_ok() {
    let mut viewer = Viewer::new(fast_config());
    let mut surface = StopOnResizeSurface {
        handle: viewer.handle(),
        presented: 0,
        torn_down: false,
    };

    let result = viewer.run_headless(&mut surface, 70.0, 9000.0);

    assert!(result.is_ok());
    assert!(surface.torn_down);
    assert_eq!(surface.presented, 0);
    assert!(!viewer.handle().is_initialized());
    assert!(!viewer.is_running());
}

#[test]
fn test_ingested_frames_reach_the_surface() {
    let (handle, join) = spawn_headless(fast_config());

    let points = vec![Point3f::new(60.0, 0.0, 600.0); 4];
    handle.ingest(1234, &points, 4);

    let deadline = Instant::now() + Duration::from_secs(5);
    while handle.shared().frame.read(|f| f.timestamp_ns()) != 1234 {
        assert!(Instant::now() < deadline);
        thread::sleep(Duration::from_millis(1));
    }
    thread::sleep(Duration::from_millis(50));
    handle.request_stop();

    let (result, surface) = join.join().expect("viewer thread panicked");
    assert!(result.is_ok());
    let frame = surface
        .frames
        .iter()
        .find(|f| f.timestamp_ns == 1234)
        .expect("ingested frame was drawn");
    assert_eq!(frame.points, 4);
    assert_eq!(frame.first_point, Some([1.0, 0.0, 10.0]));
}

#[test]
fn test_ingest_raw_zero_depth_becomes_sentinel() {
    let (handle, join) = spawn_headless(fast_config());

    handle.ingest_raw(5, &[1, 2, 300, 4, 5, 0, 7, 8], 5);
    let points = handle.shared().frame.read(|f| f.points().to_vec());
    handle.request_stop();
    join.join().expect("viewer thread panicked").0.unwrap();

    // Only two complete triplets were supplied.
    assert_eq!(points.len(), 2);
    assert_eq!(points[0], Point3f::new(1.0, 2.0, 300.0));
    assert_eq!(points[1], Point3f::new(4.0, 5.0, FAR_SENTINEL));
}

#[test]
fn test_ingest_count_clamped_to_capacity() {
    let (handle, join) = spawn_headless(fast_config().with_max_points(3));

    handle.ingest(1, &vec![Point3f::new(0.0, 0.0, 1.0); 10], 10);
    assert_eq!(handle.shared().frame.read(|f| f.len()), 3);

    handle.ingest(2, &[Point3f::origin(); 2], -4);
    assert_eq!(handle.shared().frame.read(|f| f.len()), 0);

    handle.request_stop();
    join.join().expect("viewer thread panicked").0.unwrap();
}

#[test]
fn test_ingest_before_start_is_ignored() {
    let viewer = Viewer::new(fast_config());
    viewer.ingest(1, &[Point3f::new(1.0, 1.0, 1.0)], 1);
    viewer.ingest_raw(1, &[1, 1, 1], 1);
    assert!(viewer.handle().shared().frame.read(|f| f.is_empty()));
}

#[test]
fn test_second_start_fails_while_running() {
    let (tx, rx) = mpsc::channel();
    let (done_tx, done_rx) = mpsc::channel();
    let join = thread::spawn(move || {
        let mut viewer = Viewer::new(fast_config());
        let handle = viewer.handle();
        let mut surface = RecordingSurface::default();

        let stopper = {
            let handle = handle.clone();
            thread::spawn(move || {
                let deadline = Instant::now() + Duration::from_secs(5);
                while !handle.is_running() && Instant::now() < deadline {
                    thread::sleep(Duration::from_millis(1));
                }
                tx.send(handle.shared().lifecycle.begin_start()).expect("test receiver alive");
                done_rx.recv().expect("test sender alive");
                handle.request_stop();
            })
        };

        let result = viewer.run_headless(&mut surface, 70.0, 9000.0);
        stopper.join().expect("stopper panicked");
        result
    });

    let second = rx.recv().expect("second start attempted");
    assert!(matches!(second, Err(Error::AlreadyStarted)));
    assert_eq!(Error::AlreadyStarted.status_code(), 7);
    done_tx.send(()).expect("stopper alive");
    assert!(join.join().expect("viewer thread panicked").is_ok());
}

#[test]
fn test_viewer_can_restart_after_stop() {
    let mut viewer = Viewer::new(fast_config());
    let handle = viewer.handle();

    for _ in 0..2 {
        let stopper = {
            let handle = handle.clone();
            thread::spawn(move || {
                while !handle.is_running() {
                    thread::sleep(Duration::from_millis(1));
                }
                handle.request_stop();
            })
        };
        let mut surface = RecordingSurface::default();
        viewer.run_headless(&mut surface, 60.0, 5000.0).unwrap();
        stopper.join().unwrap();
        assert!(surface.torn_down);
    }
    assert!(!viewer.is_running());
}

#[test]
fn test_present_errors_do_not_stop_the_loop() {
    let (tx, rx) = mpsc::channel();
    let join = thread::spawn(move || {
        let mut viewer = Viewer::new(fast_config());
        tx.send(viewer.handle()).expect("test receiver alive");
        let mut surface = FailingSurface { attempts: 0 };
        let result = viewer.run_headless(&mut surface, 70.0, 9000.0);
        (result, surface.attempts)
    });
    let handle = rx.recv().unwrap();
    while !handle.is_running() {
        thread::sleep(Duration::from_millis(1));
    }
    thread::sleep(Duration::from_millis(60));
    handle.request_stop();

    let (result, attempts) = join.join().unwrap();
    assert!(result.is_ok());
    assert!(attempts >= 2, "only {} presents attempted", attempts);
}

#[test]
fn test_input_sequence_then_reset() {
    let mut viewer = Viewer::new(fast_config());

    viewer.handle_input(InputEvent::Resize { width: 100, height: 100 });
    viewer.handle_input(InputEvent::ButtonDown {
        button: MouseButton::Primary,
        x: 10.0,
        y: 10.0,
        modifiers: Modifiers::NONE,
    });
    viewer.handle_input(InputEvent::Motion {
        x: 40.0,
        y: 25.0,
        modifiers: Modifiers::NONE,
    });
    viewer.handle_input(InputEvent::ButtonUp {
        button: MouseButton::Primary,
        x: 40.0,
        y: 25.0,
        modifiers: Modifiers::NONE,
    });
    viewer.handle_input(InputEvent::Wheel {
        steps: 2,
        modifiers: Modifiers::NONE,
    });
    viewer.handle_input(InputEvent::Key('s'));
    assert_ne!(viewer.camera(), &CameraState::new());

    viewer.handle_input(InputEvent::Key('c'));
    assert_eq!(viewer.camera(), &CameraState::new());
}
