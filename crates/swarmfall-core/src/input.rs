//! Read-only input collaborator.
//!
//! The core never captures devices. It queries an [`InputState`] once per
//! frame for held actions, this frame's edges and the aim point in world
//! space. [`InputSnapshot`] is a plain value implementation used by tests and
//! the headless driver.

use bitflags::bitflags;
use glam::Vec2;

/// Logical input actions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    /// Move toward -y.
    MoveUp,
    /// Move toward +y.
    MoveDown,
    /// Move toward -x.
    MoveLeft,
    /// Move toward +x.
    MoveRight,
    /// Fire manual weapons.
    Attack,
}

impl Action {
    const fn bit(self) -> Actions {
        match self {
            Self::MoveUp => Actions::MOVE_UP,
            Self::MoveDown => Actions::MOVE_DOWN,
            Self::MoveLeft => Actions::MOVE_LEFT,
            Self::MoveRight => Actions::MOVE_RIGHT,
            Self::Attack => Actions::ATTACK,
        }
    }
}

bitflags! {
    /// Set of [`Action`]s.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Actions: u8 {
        /// [`Action::MoveUp`]
        const MOVE_UP = 1;
        /// [`Action::MoveDown`]
        const MOVE_DOWN = 1 << 1;
        /// [`Action::MoveLeft`]
        const MOVE_LEFT = 1 << 2;
        /// [`Action::MoveRight`]
        const MOVE_RIGHT = 1 << 3;
        /// [`Action::Attack`]
        const ATTACK = 1 << 4;
    }
}

/// Queries the core makes of the input collaborator.
pub trait InputState {
    /// Returns `true` while `action` is held.
    fn is_down(&self, action: Action) -> bool;

    /// Returns `true` on the frame `action` went down.
    fn was_pressed(&self, action: Action) -> bool;

    /// Returns `true` on the frame `action` went up.
    fn was_released(&self, action: Action) -> bool;

    /// Aim point in world coordinates.
    fn aim_world(&self) -> Vec2;

    /// Unnormalised movement direction from the held move actions.
    fn move_axis(&self) -> Vec2 {
        let mut axis = Vec2::ZERO;
        if self.is_down(Action::MoveLeft) {
            axis.x -= 1.0;
        }
        if self.is_down(Action::MoveRight) {
            axis.x += 1.0;
        }
        if self.is_down(Action::MoveUp) {
            axis.y -= 1.0;
        }
        if self.is_down(Action::MoveDown) {
            axis.y += 1.0;
        }
        axis
    }
}

/// Input state captured as plain data.
///
/// ```
/// use swarmfall_core::input::{Action, InputSnapshot, InputState};
///
/// let mut input = InputSnapshot::default();
/// input.press(Action::MoveRight);
/// assert!(input.was_pressed(Action::MoveRight));
/// input.end_frame();
/// assert!(input.is_down(Action::MoveRight));
/// assert!(!input.was_pressed(Action::MoveRight));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputSnapshot {
    down: Actions,
    pressed: Actions,
    released: Actions,
    aim: Vec2,
}

impl InputSnapshot {
    /// No actions held, aiming at the origin.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `action` held, recording a press edge if it was up.
    pub fn press(&mut self, action: Action) {
        let bit = action.bit();
        if !self.down.contains(bit) {
            self.pressed.insert(bit);
        }
        self.down.insert(bit);
    }

    /// Marks `action` up, recording a release edge if it was held.
    pub fn release(&mut self, action: Action) {
        let bit = action.bit();
        if self.down.contains(bit) {
            self.released.insert(bit);
        }
        self.down.remove(bit);
    }

    /// Points the aim at `target`.
    pub fn aim_at(&mut self, target: Vec2) {
        self.aim = target;
    }

    /// Clears this frame's edges. Held actions stay held.
    pub fn end_frame(&mut self) {
        self.pressed = Actions::empty();
        self.released = Actions::empty();
    }
}

impl InputState for InputSnapshot {
    fn is_down(&self, action: Action) -> bool {
        self.down.contains(action.bit())
    }

    fn was_pressed(&self, action: Action) -> bool {
        self.pressed.contains(action.bit())
    }

    fn was_released(&self, action: Action) -> bool {
        self.released.contains(action.bit())
    }

    fn aim_world(&self) -> Vec2 {
        self.aim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release_record_edges() {
        let mut input = InputSnapshot::new();
        input.press(Action::Attack);
        input.press(Action::Attack);
        assert!(input.is_down(Action::Attack));
        assert!(input.was_pressed(Action::Attack));
        input.end_frame();
        input.release(Action::Attack);
        assert!(!input.is_down(Action::Attack));
        assert!(input.was_released(Action::Attack));
        assert!(!input.was_pressed(Action::Attack));
    }

    #[test]
    fn releasing_an_idle_action_records_nothing() {
        let mut input = InputSnapshot::new();
        input.release(Action::MoveUp);
        assert!(!input.was_released(Action::MoveUp));
    }

    #[test]
    fn move_axis_combines_directions() {
        let mut input = InputSnapshot::new();
        input.press(Action::MoveRight);
        input.press(Action::MoveUp);
        assert_eq!(input.move_axis(), Vec2::new(1.0, -1.0));
        input.press(Action::MoveLeft);
        assert_eq!(input.move_axis(), Vec2::new(0.0, -1.0));
    }

    #[test]
    fn aim_is_reported_in_world_space() {
        let mut input = InputSnapshot::new();
        input.aim_at(Vec2::new(30.0, -4.0));
        assert_eq!(input.aim_world(), Vec2::new(30.0, -4.0));
    }
}
