//! Host input recording.
//!
//! The embedding host feeds events in; hooks query the recorded state
//! during a tick. Edge states (pressed, clicked) last exactly one tick
//! and are cleared by the scheduler once the tick completes.

use std::collections::HashSet;

#[derive(Default)]
pub struct InputState {
    keys_down: HashSet<String>,
    keys_pressed: HashSet<String>,
    mouse_position: Option<(i32, i32)>,
    mouse_down: bool,
    mouse_clicked: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    // --- event feed -------------------------------------------------------

    pub fn key_down(&mut self, name: &str) {
        let name = name.to_lowercase();
        if self.keys_down.insert(name.clone()) {
            self.keys_pressed.insert(name);
        }
    }

    pub fn key_up(&mut self, name: &str) {
        self.keys_down.remove(&name.to_lowercase());
    }

    pub fn mouse_moved(&mut self, x: i32, y: i32) {
        self.mouse_position = Some((x, y));
    }

    pub fn mouse_pressed(&mut self, x: i32, y: i32) {
        self.mouse_position = Some((x, y));
        self.mouse_down = true;
    }

    pub fn mouse_released(&mut self, x: i32, y: i32) {
        self.mouse_position = Some((x, y));
        if self.mouse_down {
            self.mouse_clicked = true;
        }
        self.mouse_down = false;
    }

    // --- queries ------------------------------------------------------------

    /// Key names compare case-insensitively ("A" and "a" are the same key).
    pub fn is_key_down(&self, name: &str) -> bool {
        self.keys_down.contains(&name.to_lowercase())
    }

    /// True if the key went down since the last completed tick.
    pub fn was_key_pressed(&self, name: &str) -> bool {
        self.keys_pressed.contains(&name.to_lowercase())
    }

    pub fn is_mouse_down(&self) -> bool {
        self.mouse_down
    }

    /// True if a full press-release happened since the last completed tick.
    pub fn was_mouse_clicked(&self) -> bool {
        self.mouse_clicked
    }

    pub fn mouse_position(&self) -> Option<(i32, i32)> {
        self.mouse_position
    }

    /// Clears the per-tick edge states; held state persists.
    pub fn end_of_tick(&mut self) {
        self.keys_pressed.clear();
        self.mouse_clicked = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_are_case_insensitive() {
        let mut input = InputState::new();
        input.key_down("Space");
        assert!(input.is_key_down("space"));
        assert!(input.is_key_down("SPACE"));
        input.key_up("SPACE");
        assert!(!input.is_key_down("space"));
    }

    #[test]
    fn pressed_edge_clears_at_end_of_tick_but_held_state_persists() {
        let mut input = InputState::new();
        input.key_down("left");
        assert!(input.was_key_pressed("left"));
        input.end_of_tick();
        assert!(!input.was_key_pressed("left"));
        assert!(input.is_key_down("left"));
    }

    #[test]
    fn key_repeat_does_not_retrigger_the_pressed_edge() {
        let mut input = InputState::new();
        input.key_down("a");
        input.end_of_tick();
        input.key_down("a");
        assert!(!input.was_key_pressed("a"));
    }

    #[test]
    fn click_requires_press_then_release() {
        let mut input = InputState::new();
        input.mouse_released(4, 5);
        assert!(!input.was_mouse_clicked());
        input.mouse_pressed(4, 5);
        assert!(input.is_mouse_down());
        input.mouse_released(6, 7);
        assert!(input.was_mouse_clicked());
        assert!(!input.is_mouse_down());
        assert_eq!(input.mouse_position(), Some((6, 7)));
        input.end_of_tick();
        assert!(!input.was_mouse_clicked());
    }
}
