//! Mapping of pointer and keyboard input onto camera changes

use crate::camera::{CameraState, Toggle, EYE_STEP};

/// Pointer buttons the viewer distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Primary,
    Secondary,
    Middle,
}

/// Modifier keys held during an event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
    };

    /// Drag behavior selected by these modifiers (ctrl > shift > alt)
    pub fn drag_class(&self) -> DragClass {
        if self.ctrl {
            DragClass::Pan
        } else if self.shift {
            DragClass::Dolly
        } else if self.alt {
            DragClass::Depth
        } else {
            DragClass::Rotate
        }
    }
}

/// What a primary-button drag changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragClass {
    /// Arcball rotation
    Rotate,
    /// Pan in x and y
    Pan,
    /// Move the eye along z
    Dolly,
    /// Pan in z
    Depth,
}

/// Non-character keys with a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialKey {
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    PageUp,
    PageDown,
    Left,
    Right,
    Up,
    Down,
    Home,
}

/// A device input event in window pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    ButtonDown {
        button: MouseButton,
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },
    ButtonUp {
        button: MouseButton,
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },
    Motion {
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },
    /// Wheel notches; positive is away from the user
    Wheel { steps: i32, modifiers: Modifiers },
    Key(char),
    SpecialKey(SpecialKey),
    Resize { width: u32, height: u32 },
}

/// State of one primary-button gesture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub class: DragClass,
    pub origin: [f64; 2],
    pub last: [f64; 2],
}

/// Input state machine
///
/// Holds the active drag session and the window-size reciprocals used to
/// normalize pixel deltas.
#[derive(Debug, Clone)]
pub struct InputController {
    drag: Option<DragSession>,
    scale: [f64; 2],
}

impl InputController {
    pub fn new(width: u32, height: u32) -> Self {
        let mut controller = Self {
            drag: None,
            scale: [1.0, 1.0],
        };
        controller.set_window_size(width, height);
        controller
    }

    /// Reciprocals of the current window width and height
    pub fn window_scale(&self) -> [f64; 2] {
        self.scale
    }

    pub fn drag_session(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    /// Apply one event to `camera`. Returns true when the view changed.
    pub fn handle_event(&mut self, camera: &mut CameraState, event: InputEvent) -> bool {
        match event {
            InputEvent::ButtonDown {
                button,
                x,
                y,
                modifiers,
            } => self.button_down(camera, button, [x, y], modifiers),
            InputEvent::ButtonUp { button, .. } => self.button_up(camera, button),
            InputEvent::Motion { x, y, .. } => self.motion(camera, [x, y]),
            InputEvent::Wheel { steps, .. } => {
                if steps == 0 {
                    return false;
                }
                camera.step_zoom(-steps);
                true
            }
            InputEvent::Key(key) => handle_key(camera, key),
            InputEvent::SpecialKey(key) => handle_special_key(camera, key),
            InputEvent::Resize { width, height } => self.set_window_size(width, height),
        }
    }

    fn set_window_size(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.scale = [1.0 / width as f64, 1.0 / height as f64];
        true
    }

    fn button_down(
        &mut self,
        camera: &mut CameraState,
        button: MouseButton,
        position: [f64; 2],
        modifiers: Modifiers,
    ) -> bool {
        match button {
            MouseButton::Primary => {
                let class = modifiers.drag_class();
                if class == DragClass::Rotate {
                    camera.begin_drag_rotation();
                }
                self.drag = Some(DragSession {
                    class,
                    origin: position,
                    last: position,
                });
                false
            }
            MouseButton::Secondary => {
                self.drag = None;
                camera.reset();
                true
            }
            MouseButton::Middle => false,
        }
    }

    fn button_up(&mut self, camera: &mut CameraState, button: MouseButton) -> bool {
        if button != MouseButton::Primary {
            return false;
        }
        match self.drag.take() {
            Some(session) if session.class == DragClass::Rotate => {
                camera.commit_rotation();
                true
            }
            _ => false,
        }
    }

    fn motion(&mut self, camera: &mut CameraState, position: [f64; 2]) -> bool {
        let Some(session) = self.drag.as_mut() else {
            return false;
        };
        let [sx, sy] = self.scale;
        let [x, y] = position;
        let [last_x, last_y] = session.last;
        session.last = position;

        let gain = camera.drag_gain() as f64;
        match session.class {
            DragClass::Rotate => {
                let dx = (x - session.origin[0]) * sx;
                let dy = (y - session.origin[1]) * sy;
                camera.drag_rotation(dx, dy)
            }
            DragClass::Pan => {
                // Screen y grows downward.
                let dx = (x - last_x) * sx * gain;
                let dy = (last_y - y) * sy * gain;
                camera.pan_view(dx as f32, dy as f32);
                dx != 0.0 || dy != 0.0
            }
            DragClass::Dolly => {
                let dz = (last_y - y) * sy * gain;
                camera.dolly(-dz as f32);
                dz != 0.0
            }
            DragClass::Depth => {
                let dz = (last_y - y) * sy * gain;
                camera.shift_depth(dz as f32);
                dz != 0.0
            }
        }
    }
}

impl Default for InputController {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

fn handle_key(camera: &mut CameraState, key: char) -> bool {
    match key {
        'h' => {
            camera.toggles.toggle(Toggle::Help);
        }
        'a' => {
            camera.toggles.toggle(Toggle::Axes);
        }
        'g' => {
            camera.toggles.toggle(Toggle::Grid);
        }
        'l' => {
            camera.toggles.toggle(Toggle::Legend);
        }
        'p' => {
            camera.toggles.toggle(Toggle::Points);
        }
        'w' => camera.move_eye(0.0, 0.0, -EYE_STEP),
        'r' => camera.move_eye(0.0, 0.0, EYE_STEP),
        's' => camera.move_eye(-EYE_STEP, 0.0, 0.0),
        'f' => camera.move_eye(EYE_STEP, 0.0, 0.0),
        'e' => camera.move_eye(0.0, EYE_STEP, 0.0),
        'd' => camera.move_eye(0.0, -EYE_STEP, 0.0),
        'c' => camera.reset(),
        'Z' => camera.step_zoom(-1),
        'z' => camera.step_zoom(1),
        _ => return false,
    }
    true
}

fn handle_special_key(camera: &mut CameraState, key: SpecialKey) -> bool {
    match key {
        SpecialKey::F1 => {
            camera.toggles.toggle(Toggle::Help);
        }
        SpecialKey::F2 => {
            camera.toggles.toggle(Toggle::Axes);
        }
        SpecialKey::F3 => {
            camera.toggles.toggle(Toggle::Grid);
        }
        SpecialKey::F4 => {
            camera.toggles.toggle(Toggle::Legend);
        }
        SpecialKey::F7 => camera.adjust_depth_min(1),
        SpecialKey::F8 => camera.adjust_depth_min(-1),
        SpecialKey::F9 => camera.adjust_dot_size(-1),
        SpecialKey::F10 => camera.adjust_dot_size(1),
        SpecialKey::F11 => camera.step_zoom(-1),
        SpecialKey::F12 => camera.step_zoom(1),
        SpecialKey::PageUp => camera.move_eye(0.0, 0.0, -EYE_STEP),
        SpecialKey::PageDown => camera.move_eye(0.0, 0.0, EYE_STEP),
        SpecialKey::Left => camera.move_eye(-EYE_STEP, 0.0, 0.0),
        SpecialKey::Right => camera.move_eye(EYE_STEP, 0.0, 0.0),
        SpecialKey::Up => camera.move_eye(0.0, EYE_STEP, 0.0),
        SpecialKey::Down => camera.move_eye(0.0, -EYE_STEP, 0.0),
        SpecialKey::Home => camera.reset(),
        SpecialKey::F5 | SpecialKey::F6 => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{DEFAULT_ZOOM, ZOOM_FLOOR};
    use approx::assert_relative_eq;

    fn press(controller: &mut InputController, camera: &mut CameraState, x: f64, y: f64, modifiers: Modifiers) {
        controller.handle_event(
            camera,
            InputEvent::ButtonDown {
                button: MouseButton::Primary,
                x,
                y,
                modifiers,
            },
        );
    }

    fn release(controller: &mut InputController, camera: &mut CameraState, x: f64, y: f64) {
        controller.handle_event(
            camera,
            InputEvent::ButtonUp {
                button: MouseButton::Primary,
                x,
                y,
                modifiers: Modifiers::NONE,
            },
        );
    }

    fn motion(x: f64, y: f64) -> InputEvent {
        InputEvent::Motion {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    #[test]
    fn test_modifier_priority() {
        let all = Modifiers {
            shift: true,
            ctrl: true,
            alt: true,
        };
        assert_eq!(all.drag_class(), DragClass::Pan);
        assert_eq!(
            Modifiers {
                shift: true,
                alt: true,
                ..Default::default()
            }
            .drag_class(),
            DragClass::Dolly
        );
        assert_eq!(
            Modifiers {
                alt: true,
                ..Default::default()
            }
            .drag_class(),
            DragClass::Depth
        );
        assert_eq!(Modifiers::NONE.drag_class(), DragClass::Rotate);
    }

    #[test]
    fn test_rotation_drag_commits_on_release() {
        let mut controller = InputController::new(100, 100);
        let mut camera = CameraState::new();

        press(&mut controller, &mut camera, 10.0, 10.0, Modifiers::NONE);
        assert!(controller.handle_event(&mut camera, motion(30.0, 10.0)));
        assert_eq!(camera.current, depthview_core::rotation::identity());
        assert_ne!(camera.drag, camera.current);

        release(&mut controller, &mut camera, 30.0, 10.0);
        assert_eq!(camera.current, camera.drag);
        assert!(controller.drag_session().is_none());
    }

    #[test]
    fn test_pan_drag_scales_with_window_and_zoom() {
        let mut controller = InputController::new(200, 100);
        let mut camera = CameraState::new();
        let ctrl = Modifiers {
            ctrl: true,
            ..Default::default()
        };

        press(&mut controller, &mut camera, 0.0, 50.0, ctrl);
        controller.handle_event(&mut camera, motion(20.0, 40.0));

        // 20 px / 200 * 6 * (600 / 60) = 6; y inverted: 10 px / 100 * 60 = 6
        assert_relative_eq!(camera.pan.x, 6.0, epsilon = 1e-5);
        assert_relative_eq!(camera.pan.y, 6.0, epsilon = 1e-5);
        assert_eq!(camera.zoom, DEFAULT_ZOOM);
    }

    #[test]
    fn test_modifier_bound_at_button_down() {
        let mut controller = InputController::new(100, 100);
        let mut camera = CameraState::new();
        let alt = Modifiers {
            alt: true,
            ..Default::default()
        };

        press(&mut controller, &mut camera, 0.0, 50.0, alt);
        // Modifiers released mid-drag do not change the gesture.
        controller.handle_event(&mut camera, motion(0.0, 40.0));
        assert_relative_eq!(camera.pan.z, 6.0, epsilon = 1e-5);
        assert_eq!(camera.current, depthview_core::rotation::identity());
    }

    #[test]
    fn test_shift_drag_dollies_eye() {
        let mut controller = InputController::new(100, 100);
        let mut camera = CameraState::new();
        let shift = Modifiers {
            shift: true,
            ..Default::default()
        };

        press(&mut controller, &mut camera, 0.0, 50.0, shift);
        controller.handle_event(&mut camera, motion(0.0, 40.0));
        assert_relative_eq!(camera.eye.z, -12.0, epsilon = 1e-5);
        assert_relative_eq!(camera.target.z, -13.0, epsilon = 1e-5);
    }

    #[test]
    fn test_secondary_button_resets() {
        let mut controller = InputController::default();
        let mut camera = CameraState::new();
        camera.move_eye(1.0, 1.0, 1.0);
        let changed = controller.handle_event(
            &mut camera,
            InputEvent::ButtonDown {
                button: MouseButton::Secondary,
                x: 0.0,
                y: 0.0,
                modifiers: Modifiers {
                    shift: true,
                    ..Default::default()
                },
            },
        );
        assert!(changed);
        assert_eq!(camera, CameraState::new());
    }

    #[test]
    fn test_wheel_zoom() {
        let mut controller = InputController::default();
        let mut camera = CameraState::new();
        let wheel = |steps| InputEvent::Wheel {
            steps,
            modifiers: Modifiers::NONE,
        };

        controller.handle_event(&mut camera, wheel(1));
        assert_eq!(camera.zoom, DEFAULT_ZOOM - 15);
        controller.handle_event(&mut camera, wheel(10));
        assert_eq!(camera.zoom, ZOOM_FLOOR);
        controller.handle_event(&mut camera, wheel(-2));
        assert_eq!(camera.zoom, ZOOM_FLOOR + 30);
        assert!(!controller.handle_event(&mut camera, wheel(0)));
    }

    #[test]
    fn test_key_bindings() {
        let mut controller = InputController::default();
        let mut camera = CameraState::new();

        for key in ['h', 'a', 'g', 'l', 'p'] {
            assert!(controller.handle_event(&mut camera, InputEvent::Key(key)));
        }
        assert_eq!(camera.toggles, crate::camera::DisplayToggles {
            grid: false,
            axes: false,
            help: false,
            legend: false,
            points: false,
        });

        controller.handle_event(&mut camera, InputEvent::Key('f'));
        controller.handle_event(&mut camera, InputEvent::Key('e'));
        controller.handle_event(&mut camera, InputEvent::Key('w'));
        assert_relative_eq!(camera.eye.x, 1.6);
        assert_relative_eq!(camera.eye.y, 0.6);
        assert_relative_eq!(camera.eye.z, -6.1);

        controller.handle_event(&mut camera, InputEvent::Key('Z'));
        assert_eq!(camera.zoom, DEFAULT_ZOOM - 15);
        controller.handle_event(&mut camera, InputEvent::Key('z'));
        assert_eq!(camera.zoom, DEFAULT_ZOOM);

        assert!(!controller.handle_event(&mut camera, InputEvent::Key('q')));
    }

    #[test]
    fn test_special_keys() {
        let mut controller = InputController::default();
        let mut camera = CameraState::new();
        let mut key = |camera: &mut CameraState, k| controller.handle_event(camera, InputEvent::SpecialKey(k));

        key(&mut camera, SpecialKey::F7);
        key(&mut camera, SpecialKey::F7);
        key(&mut camera, SpecialKey::F8);
        assert_eq!(camera.depth_min, 50);
        key(&mut camera, SpecialKey::F10);
        assert_eq!(camera.dot_size, 2);
        key(&mut camera, SpecialKey::F9);
        key(&mut camera, SpecialKey::F9);
        assert_eq!(camera.dot_size, 1);
        key(&mut camera, SpecialKey::F11);
        assert_eq!(camera.zoom, DEFAULT_ZOOM - 15);
        key(&mut camera, SpecialKey::F2);
        assert!(!camera.toggles.axes);
        assert!(!key(&mut camera, SpecialKey::F5));

        key(&mut camera, SpecialKey::Home);
        assert_eq!(camera.depth_min, 0);
        assert_eq!(camera.zoom, DEFAULT_ZOOM);
        assert!(!camera.toggles.axes);
    }

    #[test]
    fn test_resize_updates_scale() {
        let mut controller = InputController::new(640, 480);
        let mut camera = CameraState::new();
        assert!(controller.handle_event(&mut camera, InputEvent::Resize { width: 100, height: 50 }));
        assert_eq!(controller.window_scale(), [0.01, 0.02]);
        assert!(!controller.handle_event(&mut camera, InputEvent::Resize { width: 0, height: 50 }));
        assert_eq!(controller.window_scale(), [0.01, 0.02]);
    }
}
