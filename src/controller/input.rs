/// Input handling: events from the window layer, pressed-key state and key bindings
use std::collections::HashSet;

use winit::keyboard::KeyCode;

use crate::model::MoveDirection;
use crate::view::ShadingMode;

/// Window-layer events reduced to what the viewer cares about
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    MouseMove { dx: f32, dy: f32 },
    MouseClick { button: MouseButton, is_down: bool },
    /// Scroll in lines; positive is away from the user
    MouseWheel { delta_y: f32 },
    FocusLost,
    PointerLockChanged { locked: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn from_winit(button: winit::event::MouseButton) -> Option<Self> {
        match button {
            winit::event::MouseButton::Left => Some(MouseButton::Left),
            winit::event::MouseButton::Right => Some(MouseButton::Right),
            winit::event::MouseButton::Middle => Some(MouseButton::Middle),
            _ => None,
        }
    }
}

/// One-shot commands triggered by a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CycleShading,
    SelectShading(ShadingMode),
    ToggleOverlay,
    ResetCamera,
    ReleasePointer,
    Quit,
}

pub struct InputState {
    pub pressed_keys: HashSet<KeyCode>,
    pub look_delta: (f32, f32),
    pub scroll_delta: f32,
    pub pointer_locked: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            pressed_keys: HashSet::new(),
            look_delta: (0.0, 0.0),
            scroll_delta: 0.0,
            pointer_locked: false,
        }
    }

    /// Process an input event and update state
    pub fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                self.pressed_keys.insert(*key);
            }
            InputEvent::KeyUp(key) => {
                self.pressed_keys.remove(key);
            }
            InputEvent::MouseMove { dx, dy } => {
                if self.pointer_locked {
                    self.look_delta.0 += dx;
                    self.look_delta.1 += dy;
                }
            }
            InputEvent::MouseClick { button, is_down } => {
                if *button == MouseButton::Left && *is_down {
                    self.pointer_locked = true;
                }
            }
            InputEvent::MouseWheel { delta_y } => {
                self.scroll_delta += delta_y;
            }
            InputEvent::FocusLost => {
                self.clear_keys();
                self.pointer_locked = false;
            }
            InputEvent::PointerLockChanged { locked } => {
                self.pointer_locked = *locked;
            }
        }
    }

    /// Whether an event the overlay consumed should stop here. While the
    /// pointer is locked the camera owns all input.
    pub fn overlay_claims(&self, consumed_by_overlay: bool) -> bool {
        consumed_by_overlay && !self.pointer_locked
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    pub fn clear_keys(&mut self) {
        self.pressed_keys.clear();
    }

    pub fn consume_look(&mut self) -> (f32, f32) {
        std::mem::take(&mut self.look_delta)
    }

    pub fn consume_scroll(&mut self) -> f32 {
        std::mem::take(&mut self.scroll_delta)
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

/// Key mapping configuration
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub forward: KeyCode,
    pub backward: KeyCode,
    pub left: KeyCode,
    pub right: KeyCode,
    pub up: KeyCode,
    pub down: KeyCode,
    pub cycle_shading: KeyCode,
    pub toggle_overlay: KeyCode,
    pub reset_camera: KeyCode,
    pub release_pointer: KeyCode,
    pub quit: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: KeyCode::KeyW,
            backward: KeyCode::KeyS,
            left: KeyCode::KeyA,
            right: KeyCode::KeyD,
            up: KeyCode::Space,
            down: KeyCode::ShiftLeft,
            cycle_shading: KeyCode::Tab,
            toggle_overlay: KeyCode::KeyH,
            reset_camera: KeyCode::KeyR,
            release_pointer: KeyCode::Escape,
            quit: KeyCode::KeyQ,
        }
    }
}

const SHADING_KEYS: [KeyCode; 4] = [KeyCode::Digit1, KeyCode::Digit2, KeyCode::Digit3, KeyCode::Digit4];

/// Maps key state to camera commands and actions
#[derive(Debug, Clone, Default)]
pub struct InputProcessor {
    bindings: KeyBindings,
}

impl InputProcessor {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    /// Key → direction table; arrow keys mirror the horizontal bindings
    fn direction_table(&self) -> [(KeyCode, MoveDirection); 10] {
        let b = &self.bindings;
        [
            (b.forward, MoveDirection::Forward),
            (b.backward, MoveDirection::Backward),
            (b.left, MoveDirection::Left),
            (b.right, MoveDirection::Right),
            (b.up, MoveDirection::Up),
            (b.down, MoveDirection::Down),
            (KeyCode::ArrowUp, MoveDirection::Forward),
            (KeyCode::ArrowDown, MoveDirection::Backward),
            (KeyCode::ArrowLeft, MoveDirection::Left),
            (KeyCode::ArrowRight, MoveDirection::Right),
        ]
    }

    /// Directions currently held, each reported once
    pub fn held_directions(&self, input: &InputState) -> Vec<MoveDirection> {
        let mut held = Vec::new();
        for (key, dir) in self.direction_table() {
            if input.is_key_pressed(key) && !held.contains(&dir) {
                held.push(dir);
            }
        }
        held
    }

    pub fn action_for_key(&self, key: KeyCode) -> Option<Action> {
        let b = &self.bindings;
        if let Some(n) = SHADING_KEYS.iter().position(|&k| k == key) {
            return ShadingMode::from_number_key(n + 1).map(Action::SelectShading);
        }
        match key {
            k if k == b.cycle_shading => Some(Action::CycleShading),
            k if k == b.toggle_overlay => Some(Action::ToggleOverlay),
            k if k == b.reset_camera => Some(Action::ResetCamera),
            k if k == b.release_pointer => Some(Action::ReleasePointer),
            k if k == b.quit => Some(Action::Quit),
            _ => None,
        }
    }
}
