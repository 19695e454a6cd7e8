use std::collections::HashSet;

use glam::Vec2;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Identifier for a physical keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    Named(NamedKey),
    Character(char),
}

/// Friendly names for the non-character keys the demos react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedKey {
    Space,
    LeftShift,
    RightShift,
}

/// Identifier for a mouse button (left button is zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MouseButton(u8);

impl MouseButton {
    pub const LEFT: Self = Self(0);

    pub fn new(index: u8) -> Self {
        Self(index)
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

/// Thread-safe input snapshot fed by the window callbacks and polled once
/// per frame by the frame driver.
#[derive(Debug, Default)]
pub struct InputState {
    keys: RwLock<HashSet<KeyCode>>,
    mouse_buttons: RwLock<HashSet<MouseButton>>,
    look: RwLock<LookState>,
    scroll: RwLock<f32>,
}

#[derive(Debug, Default)]
struct LookState {
    last: Option<Vec2>,
    pending: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key_down(&self, key: KeyCode) {
        self.keys.write().insert(key);
    }

    pub fn set_key_up(&self, key: KeyCode) {
        self.keys.write().remove(&key);
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.read().contains(&key)
    }

    pub fn set_mouse_button_down(&self, button: MouseButton) {
        self.mouse_buttons.write().insert(button);
    }

    pub fn set_mouse_button_up(&self, button: MouseButton) {
        self.mouse_buttons.write().remove(&button);
    }

    pub fn is_mouse_button_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons.read().contains(&button)
    }

    /// Records a cursor position sample.
    ///
    /// The first sample only seeds the reference point, so capturing the
    /// cursor never produces a view jump. Later samples accumulate
    /// `(x - last_x, last_y - y)`; the Y axis is reversed because window
    /// coordinates grow downwards.
    pub fn observe_cursor(&self, position: Vec2) {
        let mut look = self.look.write();
        if let Some(last) = look.last {
            look.pending += Vec2::new(position.x - last.x, last.y - position.y);
        }
        look.last = Some(position);
    }

    /// Drains the look delta accumulated since the previous call.
    pub fn take_look_delta(&self) -> Vec2 {
        let mut look = self.look.write();
        std::mem::take(&mut look.pending)
    }

    /// Accumulates a scroll delta (positive away from the user).
    pub fn add_scroll(&self, delta: f32) {
        *self.scroll.write() += delta;
    }

    /// Drains the scroll delta accumulated since the previous call.
    pub fn take_scroll_delta(&self) -> f32 {
        std::mem::take(&mut *self.scroll.write())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_keys() {
        let state = InputState::new();
        state.set_key_down(KeyCode::Character('W'));
        assert!(state.is_key_down(KeyCode::Character('W')));
        state.set_key_up(KeyCode::Character('W'));
        assert!(!state.is_key_down(KeyCode::Character('W')));
    }

    #[test]
    fn tracks_mouse_buttons() {
        let state = InputState::new();
        state.set_mouse_button_down(MouseButton::LEFT);
        assert!(state.is_mouse_button_down(MouseButton::LEFT));
        state.set_mouse_button_up(MouseButton::LEFT);
        assert!(!state.is_mouse_button_down(MouseButton::LEFT));
    }

    #[test]
    fn first_cursor_sample_produces_no_delta() {
        let state = InputState::new();
        state.observe_cursor(Vec2::new(400.0, 300.0));
        assert_eq!(state.take_look_delta(), Vec2::ZERO);
    }

    #[test]
    fn cursor_deltas_reverse_y() {
        let state = InputState::new();
        state.observe_cursor(Vec2::new(400.0, 300.0));
        state.observe_cursor(Vec2::new(410.0, 290.0));
        assert_eq!(state.take_look_delta(), Vec2::new(10.0, 10.0));
        assert_eq!(state.take_look_delta(), Vec2::ZERO);
    }

    #[test]
    fn cursor_deltas_accumulate_between_frames() {
        let state = InputState::new();
        state.observe_cursor(Vec2::new(0.0, 0.0));
        state.observe_cursor(Vec2::new(5.0, 0.0));
        state.observe_cursor(Vec2::new(12.0, 4.0));
        assert_eq!(state.take_look_delta(), Vec2::new(12.0, -4.0));
    }

    #[test]
    fn scroll_accumulates_and_drains() {
        let state = InputState::new();
        state.add_scroll(1.0);
        state.add_scroll(0.5);
        assert_eq!(state.take_scroll_delta(), 1.5);
        assert_eq!(state.take_scroll_delta(), 0.0);
    }
}
