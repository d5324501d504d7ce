//! Start/stop state of the render loop

use depthview_core::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

/// Phase of the render loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    Idle = 0,
    /// `start` is creating the window and GPU resources
    Initializing = 1,
    Running = 2,
    /// Stop requested; the loop exits on its next wake-up
    Stopping = 3,
}

impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => LifecycleState::Initializing,
            2 => LifecycleState::Running,
            3 => LifecycleState::Stopping,
            _ => LifecycleState::Idle,
        }
    }
}

type Waker = Box<dyn Fn() + Send>;

/// Running/initialized flags of the viewer, safe to use from any thread
///
/// The state is a single atomic word. Stop requests wake a sleeping loop
/// through the condition variable (headless) and the registered waker
/// (window event loop).
pub struct ViewerLifecycle {
    state: AtomicU8,
    waker: Mutex<Option<Waker>>,
    signal: Mutex<()>,
    condvar: Condvar,
}

impl ViewerLifecycle {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(LifecycleState::Idle as u8),
            waker: Mutex::new(None),
            signal: Mutex::new(()),
            condvar: Condvar::new(),
        }
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// True between a successful start and the end of its loop
    pub fn is_initialized(&self) -> bool {
        matches!(self.state(), LifecycleState::Initializing | LifecycleState::Running)
    }

    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    /// Claim the lifecycle for a new run
    pub fn begin_start(&self) -> Result<()> {
        self.transition(LifecycleState::Idle, LifecycleState::Initializing)
            .then_some(())
            .ok_or(Error::AlreadyStarted)
    }

    /// Enter the running phase once initialization is complete.
    ///
    /// Returns false if a stop was requested while initializing.
    pub fn mark_running(&self) -> bool {
        self.transition(LifecycleState::Initializing, LifecycleState::Running)
    }

    /// Ask the loop to stop. Safe to call from any thread and idempotent.
    ///
    /// Returns true if this call moved the lifecycle into `Stopping`.
    pub fn request_stop(&self) -> bool {
        let stopped = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |value| {
                match LifecycleState::from_u8(value) {
                    LifecycleState::Initializing | LifecycleState::Running => {
                        Some(LifecycleState::Stopping as u8)
                    }
                    _ => None,
                }
            })
            .is_ok();

        if stopped {
            tracing::debug!("viewer stop requested");
            self.wake();
        }
        stopped
    }

    /// Return to `Idle` after the loop has exited
    pub fn finish(&self) {
        self.waker.lock().take();
        self.state.store(LifecycleState::Idle as u8, Ordering::Release);
        self.notify();
    }

    /// Register the callback that wakes the window event loop
    pub fn set_waker(&self, waker: impl Fn() + Send + 'static) {
        *self.waker.lock() = Some(Box::new(waker));
    }

    /// Sleep until `timeout` elapses or the lifecycle leaves `Running`.
    ///
    /// Returns true if the lifecycle is no longer running.
    pub fn wait_for_stop(&self, timeout: Duration) -> bool {
        let mut guard = self.signal.lock();
        if !self.is_running() {
            return true;
        }
        self.condvar.wait_for(&mut guard, timeout);
        !self.is_running()
    }

    fn transition(&self, from: LifecycleState, to: LifecycleState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn wake(&self) {
        if let Some(waker) = self.waker.lock().as_ref() {
            waker();
        }
        self.notify();
    }

    fn notify(&self) {
        let _guard = self.signal.lock();
        self.condvar.notify_all();
    }
}

impl Default for ViewerLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ViewerLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewerLifecycle")
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_start_stop_cycle() {
        let lifecycle = ViewerLifecycle::new();
        assert_eq!(lifecycle.state(), LifecycleState::Idle);
        assert!(!lifecycle.is_initialized());

        lifecycle.begin_start().unwrap();
        assert!(lifecycle.is_initialized());
        assert!(!lifecycle.is_running());
        assert!(matches!(lifecycle.begin_start(), Err(Error::AlreadyStarted)));

        assert!(lifecycle.mark_running());
        assert!(lifecycle.is_running());

        assert!(lifecycle.request_stop());
        assert!(!lifecycle.request_stop());
        assert!(!lifecycle.is_initialized());
        assert_eq!(lifecycle.state(), LifecycleState::Stopping);

        lifecycle.finish();
        assert_eq!(lifecycle.state(), LifecycleState::Idle);
        lifecycle.begin_start().unwrap();
    }

    #[test]
    fn test_stop_before_start_is_noop() {
        let lifecycle = ViewerLifecycle::new();
        assert!(!lifecycle.request_stop());
        assert_eq!(lifecycle.state(), LifecycleState::Idle);
    }

    #[test]
    fn test_stop_during_initialization() {
        let lifecycle = ViewerLifecycle::new();
        lifecycle.begin_start().unwrap();
        assert!(lifecycle.request_stop());
        assert!(!lifecycle.mark_running());
        assert!(!lifecycle.is_running());
    }

    #[test]
    fn test_waker_called_on_stop() {
        let lifecycle = ViewerLifecycle::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        lifecycle.set_waker(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        lifecycle.begin_start().unwrap();
        lifecycle.mark_running();
        lifecycle.request_stop();
        lifecycle.request_stop();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        lifecycle.finish();
        lifecycle.begin_start().unwrap();
        lifecycle.request_stop();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_wait_for_stop_wakes_early() {
        let lifecycle = Arc::new(ViewerLifecycle::new());
        lifecycle.begin_start().unwrap();
        lifecycle.mark_running();

        let stopper = {
            let lifecycle = lifecycle.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                lifecycle.request_stop();
            })
        };

        let started = Instant::now();
        while !lifecycle.wait_for_stop(Duration::from_secs(5)) {}
        assert!(started.elapsed() < Duration::from_secs(5));
        stopper.join().unwrap();
    }

    #[test]
    fn test_wait_for_stop_times_out_while_running() {
        let lifecycle = ViewerLifecycle::new();
        lifecycle.begin_start().unwrap();
        lifecycle.mark_running();
        assert!(!lifecycle.wait_for_stop(Duration::from_millis(5)));
    }
}
