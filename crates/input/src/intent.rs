use serde::{Deserialize, Serialize};

/// Movement flags derived from the currently held movement keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovementIntent {
    pub forward: bool,
    pub backward: bool,
    pub turn_left: bool,
    pub turn_right: bool,
}

impl MovementIntent {
    pub const IDLE: Self = Self {
        forward: false,
        backward: false,
        turn_left: false,
        turn_right: false,
    };

    pub fn is_idle(&self) -> bool {
        *self == Self::IDLE
    }

    /// Compact `WASD`-style rendering, dashes for released keys.
    pub fn label(&self) -> String {
        [
            (self.forward, 'W'),
            (self.turn_left, 'A'),
            (self.backward, 'S'),
            (self.turn_right, 'D'),
        ]
        .iter()
        .map(|&(held, c)| if held { c } else { '-' })
        .collect()
    }
}
