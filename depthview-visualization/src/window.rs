//! winit window driver for [`Viewer`]

use crate::input::{self, InputEvent, Modifiers, SpecialKey};
use crate::viewer::{RenderSurface, TickOutcome, Viewer};
use depthview_core::{Error, Result};
use depthview_gpu::{RenderConfig, Scene, SceneRenderer};
use std::sync::Arc;
use std::time::Instant;
use winit::{
    dpi::{LogicalPosition, LogicalSize},
    event::{ElementState, Event, MouseScrollDelta, StartCause, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopBuilder},
    keyboard::{Key, NamedKey},
    platform::run_on_demand::EventLoopExtRunOnDemand,
    window::{Window, WindowBuilder},
};

/// Wake-up sent to the event loop when a stop is requested from another thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerEvent {
    Wake,
}

pub(crate) type ViewerEventLoop = EventLoop<ViewerEvent>;

/// A window together with the GPU renderer drawing into it
pub struct WindowSurface {
    window: Arc<Window>,
    renderer: SceneRenderer,
}

impl WindowSurface {
    pub fn window(&self) -> &Window {
        &self.window
    }
}

impl RenderSurface for WindowSurface {
    fn resize(&mut self, width: u32, height: u32) {
        self.renderer.resize(width, height);
    }

    fn present(&mut self, scene: &Scene) -> Result<()> {
        self.renderer.render(scene)
    }

    fn teardown(&mut self) {
        self.window.set_visible(false);
    }
}

impl Viewer {
    /// Open the viewer window and run the render loop on the calling thread.
    ///
    /// Blocks until [`Viewer::request_stop`] is called from any thread or the
    /// window is closed. Fails with [`Error::AlreadyStarted`] if the viewer
    /// is already running; use [`Error::status_code`] for a process status.
    pub fn start(&mut self, fov_y: f32, z_far: f32, title: &str) -> Result<()> {
        self.prepare(fov_y, z_far)?;

        let result = self.run_window(title);
        if let Err(e) = &result {
            tracing::error!(error = %e, "viewer failed");
        }
        self.finish();
        result
    }

    fn run_window(&mut self, title: &str) -> Result<()> {
        let mut event_loop = match self.event_loop.take() {
            Some(event_loop) => event_loop,
            None => build_event_loop()?,
        };
        let result = self.drive(&mut event_loop, title);
        // winit allows one event loop per process; keep it for the next start.
        self.event_loop = Some(event_loop);
        result
    }

    fn drive(&mut self, event_loop: &mut ViewerEventLoop, title: &str) -> Result<()> {
        let proxy = event_loop.create_proxy();
        self.shared.lifecycle.set_waker(move || {
            let _ = proxy.send_event(ViewerEvent::Wake);
        });

        let [x, y] = self.config.window_position;
        let window = Arc::new(
            WindowBuilder::new()
                .with_title(title)
                .with_inner_size(LogicalSize::new(
                    self.config.window_width as f64,
                    self.config.window_height as f64,
                ))
                .with_position(LogicalPosition::new(x as f64, y as f64))
                .build(event_loop)
                .map_err(|e| Error::Window(format!("Failed to create window: {}", e)))?,
        );

        let render_config = RenderConfig {
            background_color: self.config.background,
            ..Default::default()
        };
        let renderer = pollster::block_on(SceneRenderer::new(window.clone(), render_config))?;
        let mut surface = WindowSurface { window, renderer };

        let size = surface.window.inner_size();
        self.handle_input(InputEvent::Resize {
            width: size.width,
            height: size.height,
        });

        if !self.shared.lifecycle.mark_running() {
            tracing::info!("stop requested during start, shutting down");
            surface.teardown();
            return Ok(());
        }
        tracing::info!(title, width = size.width, height = size.height, "viewer window running");

        let interval = self.config.refresh_interval();
        let mut modifiers = Modifiers::default();
        let mut cursor = [0.0f64; 2];

        event_loop
            .run_on_demand(|event, target| match event {
                Event::NewEvents(StartCause::Init) => {
                    target.set_control_flow(ControlFlow::WaitUntil(Instant::now() + interval));
                }
                Event::NewEvents(StartCause::ResumeTimeReached { .. }) => {
                    surface.window.request_redraw();
                    target.set_control_flow(ControlFlow::WaitUntil(Instant::now() + interval));
                }
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::CloseRequested => {
                        self.request_stop();
                    }
                    WindowEvent::RedrawRequested => {
                        if self.tick(&mut surface) == TickOutcome::Terminate {
                            target.exit();
                        }
                    }
                    WindowEvent::Resized(size) => {
                        surface.resize(size.width, size.height);
                        self.handle_input(InputEvent::Resize {
                            width: size.width,
                            height: size.height,
                        });
                    }
                    WindowEvent::ModifiersChanged(state) => {
                        let state = state.state();
                        modifiers = Modifiers {
                            shift: state.shift_key(),
                            ctrl: state.control_key(),
                            alt: state.alt_key(),
                        };
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        cursor = [position.x, position.y];
                        if self.handle_input(InputEvent::Motion {
                            x: position.x,
                            y: position.y,
                            modifiers,
                        }) {
                            surface.window.request_redraw();
                        }
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        let Some(button) = translate_button(button) else {
                            return;
                        };
                        let [x, y] = cursor;
                        let event = match state {
                            ElementState::Pressed => InputEvent::ButtonDown {
                                button,
                                x,
                                y,
                                modifiers,
                            },
                            ElementState::Released => InputEvent::ButtonUp {
                                button,
                                x,
                                y,
                                modifiers,
                            },
                        };
                        self.handle_input(event);
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        let steps = wheel_steps(delta);
                        self.handle_input(InputEvent::Wheel { steps, modifiers });
                    }
                    WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                        if let Some(input) = translate_key(&event.logical_key) {
                            self.handle_input(input);
                        }
                    }
                    _ => {}
                },
                Event::UserEvent(ViewerEvent::Wake) | Event::AboutToWait => {
                    if !self.is_running() && self.tick(&mut surface) == TickOutcome::Terminate {
                        target.exit();
                    }
                }
                _ => {}
            })
            .map_err(|e| Error::EventLoop(format!("Event loop error: {}", e)))
    }
}

fn build_event_loop() -> Result<ViewerEventLoop> {
    let mut builder = EventLoopBuilder::<ViewerEvent>::with_user_event();
    allow_any_thread(&mut builder);
    builder
        .build()
        .map_err(|e| Error::EventLoop(format!("Failed to create event loop: {}", e)))
}

#[cfg(any(
    target_os = "linux",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd"
))]
fn allow_any_thread(builder: &mut EventLoopBuilder<ViewerEvent>) {
    use winit::platform::x11::EventLoopBuilderExtX11;
    builder.with_any_thread(true);
}

#[cfg(target_os = "windows")]
fn allow_any_thread(builder: &mut EventLoopBuilder<ViewerEvent>) {
    use winit::platform::windows::EventLoopBuilderExtWindows;
    builder.with_any_thread(true);
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "windows"
)))]
fn allow_any_thread(_builder: &mut EventLoopBuilder<ViewerEvent>) {}

fn translate_button(button: winit::event::MouseButton) -> Option<input::MouseButton> {
    match button {
        winit::event::MouseButton::Left => Some(input::MouseButton::Primary),
        winit::event::MouseButton::Right => Some(input::MouseButton::Secondary),
        winit::event::MouseButton::Middle => Some(input::MouseButton::Middle),
        _ => None,
    }
}

fn wheel_steps(delta: MouseScrollDelta) -> i32 {
    let y = match delta {
        MouseScrollDelta::LineDelta(_, y) => y as f64,
        MouseScrollDelta::PixelDelta(position) => position.y,
    };
    if y > 0.0 {
        1
    } else if y < 0.0 {
        -1
    } else {
        0
    }
}

fn translate_key(key: &Key) -> Option<InputEvent> {
    let special = match key {
        Key::Character(text) => return text.chars().next().map(InputEvent::Key),
        Key::Named(named) => match named {
            NamedKey::F1 => SpecialKey::F1,
            NamedKey::F2 => SpecialKey::F2,
            NamedKey::F3 => SpecialKey::F3,
            NamedKey::F4 => SpecialKey::F4,
            NamedKey::F5 => SpecialKey::F5,
            NamedKey::F6 => SpecialKey::F6,
            NamedKey::F7 => SpecialKey::F7,
            NamedKey::F8 => SpecialKey::F8,
            NamedKey::F9 => SpecialKey::F9,
            NamedKey::F10 => SpecialKey::F10,
            NamedKey::F11 => SpecialKey::F11,
            NamedKey::F12 => SpecialKey::F12,
            NamedKey::PageUp => SpecialKey::PageUp,
            NamedKey::PageDown => SpecialKey::PageDown,
            NamedKey::ArrowLeft => SpecialKey::Left,
            NamedKey::ArrowRight => SpecialKey::Right,
            NamedKey::ArrowUp => SpecialKey::Up,
            NamedKey::ArrowDown => SpecialKey::Down,
            NamedKey::Home => SpecialKey::Home,
            _ => return None,
        },
        _ => return None,
    };
    Some(InputEvent::SpecialKey(special))
}
