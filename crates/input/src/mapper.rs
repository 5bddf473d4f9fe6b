use crate::{Action, Key, MovementIntent};
use std::collections::BTreeSet;

/// Tracks held keys and turns key transitions into [`Action`]s.
///
/// Movement keys produce [`Action::Steer`] on every real transition, so the
/// consumer can re-resolve target velocities immediately instead of waiting
/// for the next frame.
#[derive(Debug, Clone, Default)]
pub struct InputMapper {
    held: BTreeSet<Key>,
    intent: MovementIntent,
}

impl InputMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current movement intent.
    pub fn intent(&self) -> MovementIntent {
        self.intent
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// Handle a key-down event. Returns `None` for keys already held.
    pub fn key_pressed(&mut self, key: Key) -> Option<Action> {
        if key == Key::Other || !self.held.insert(key) {
            return None;
        }
        match key {
            Key::Space => Some(Action::ToggleGravity),
            Key::R => Some(Action::Reset),
            Key::G => Some(Action::ToggleGrid),
            _ => Some(self.recompute()),
        }
    }

    /// Handle an auto-repeat key-down for a key that is already held.
    ///
    /// Held movement keys re-issue the unchanged intent so the consumer
    /// re-resolves target velocities; held state is left as is.
    pub fn key_repeated(&self, key: Key) -> Option<Action> {
        (key.is_movement() && self.held.contains(&key)).then_some(Action::Steer(self.intent))
    }

    /// Handle a key-up event. Only movement keys produce an action.
    pub fn key_released(&mut self, key: Key) -> Option<Action> {
        if !self.held.remove(&key) || !key.is_movement() {
            return None;
        }
        Some(self.recompute())
    }

    /// Forget every held key, e.g. when the window loses focus.
    pub fn release_all(&mut self) -> Option<Action> {
        let had_movement = self.held.iter().any(|k| k.is_movement());
        self.held.clear();
        had_movement.then(|| self.recompute())
    }

    fn recompute(&mut self) -> Action {
        self.intent = MovementIntent {
            forward: self.held.contains(&Key::W),
            backward: self.held.contains(&Key::S),
            turn_left: self.held.contains(&Key::A),
            turn_right: self.held.contains(&Key::D),
        };
        tracing::debug!(intent = %self.intent.label(), "movement intent changed");
        Action::Steer(self.intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release_update_intent() {
        let mut m = InputMapper::new();
        let a = m.key_pressed(Key::W).unwrap();
        assert_eq!(
            a,
            Action::Steer(MovementIntent {
                forward: true,
                ..MovementIntent::IDLE
            })
        );
        assert!(m.intent().forward);

        let a = m.key_released(Key::W).unwrap();
        assert_eq!(a, Action::Steer(MovementIntent::IDLE));
        assert!(m.intent().is_idle());
    }

    #[test]
    fn repeated_press_is_a_noop() {
        let mut m = InputMapper::new();
        assert!(m.key_pressed(Key::A).is_some());
        assert!(m.key_pressed(Key::A).is_none());
        assert!(m.intent().turn_left);
    }

    #[test]
    fn repeat_reissues_held_movement_intent() {
        let mut m = InputMapper::new();
        m.key_pressed(Key::W);
        m.key_pressed(Key::D);
        let held = m.intent();
        assert_eq!(m.key_repeated(Key::W), Some(Action::Steer(held)));
        assert_eq!(m.intent(), held);
        assert!(m.key_pressed(Key::W).is_none());
    }

    #[test]
    fn repeat_ignores_unheld_and_command_keys() {
        let mut m = InputMapper::new();
        assert_eq!(m.key_repeated(Key::S), None);
        m.key_pressed(Key::Space);
        assert_eq!(m.key_repeated(Key::Space), None);
        m.key_pressed(Key::R);
        assert_eq!(m.key_repeated(Key::R), None);
    }

    #[test]
    fn release_of_unheld_key_is_a_noop() {
        let mut m = InputMapper::new();
        assert!(m.key_released(Key::S).is_none());
    }

    #[test]
    fn combined_keys_accumulate() {
        let mut m = InputMapper::new();
        m.key_pressed(Key::W);
        let a = m.key_pressed(Key::A).unwrap();
        assert_eq!(
            a,
            Action::Steer(MovementIntent {
                forward: true,
                turn_left: true,
                ..MovementIntent::IDLE
            })
        );
    }

    #[test]
    fn command_keys_fire_once_per_press() {
        let mut m = InputMapper::new();
        assert_eq!(m.key_pressed(Key::Space), Some(Action::ToggleGravity));
        assert_eq!(m.key_pressed(Key::Space), None);
        assert_eq!(m.key_released(Key::Space), None);
        assert_eq!(m.key_pressed(Key::Space), Some(Action::ToggleGravity));
        assert_eq!(m.key_pressed(Key::R), Some(Action::Reset));
        assert_eq!(m.key_pressed(Key::G), Some(Action::ToggleGrid));
    }

    #[test]
    fn command_keys_do_not_touch_intent() {
        let mut m = InputMapper::new();
        m.key_pressed(Key::D);
        m.key_pressed(Key::R);
        assert!(m.intent().turn_right);
        assert!(!m.intent().forward);
    }

    #[test]
    fn other_keys_are_ignored() {
        let mut m = InputMapper::new();
        assert!(m.key_pressed(Key::Other).is_none());
        assert!(!m.is_held(Key::Other));
    }

    #[test]
    fn release_all_clears_movement() {
        let mut m = InputMapper::new();
        m.key_pressed(Key::W);
        m.key_pressed(Key::D);
        assert_eq!(m.release_all(), Some(Action::Steer(MovementIntent::IDLE)));
        assert_eq!(m.release_all(), None);
    }
}
