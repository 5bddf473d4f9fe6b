use crate::MovementIntent;
use serde::{Deserialize, Serialize};

/// Keys the demo responds to. Everything else maps to [`Key::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    W,
    A,
    S,
    D,
    Space,
    R,
    G,
    Other,
}

impl Key {
    /// Map a typed character, case-insensitively.
    pub fn from_char(c: char) -> Self {
        match c.to_ascii_lowercase() {
            'w' => Self::W,
            'a' => Self::A,
            's' => Self::S,
            'd' => Self::D,
            ' ' => Self::Space,
            'r' => Self::R,
            'g' => Self::G,
            _ => Self::Other,
        }
    }

    pub fn is_movement(self) -> bool {
        matches!(self, Self::W | Self::A | Self::S | Self::D)
    }
}

/// A high-level action produced by the input mapper.
///
/// The simulation and the scene consume actions, never raw key events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Held movement keys changed; carries the new intent.
    Steer(MovementIntent),
    /// Flip gravity on or off.
    ToggleGravity,
    /// Put the vehicle back at the spawn pose and disable gravity.
    Reset,
    /// Show or hide the debug grid overlay. Cosmetic only.
    ToggleGrid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chars_map_case_insensitively() {
        assert_eq!(Key::from_char('W'), Key::W);
        assert_eq!(Key::from_char('d'), Key::D);
        assert_eq!(Key::from_char(' '), Key::Space);
        assert_eq!(Key::from_char('x'), Key::Other);
    }

    #[test]
    fn movement_keys() {
        assert!(Key::A.is_movement());
        assert!(!Key::Space.is_movement());
        assert!(!Key::R.is_movement());
    }

    #[test]
    fn action_steer_carries_intent() {
        let a = Action::Steer(MovementIntent {
            forward: true,
            ..MovementIntent::IDLE
        });
        assert!(matches!(a, Action::Steer(i) if i.forward));
    }
}
