use crate::{MotionParams, VehicleState, integrate, resolve_intent};
use drivescape_input::{Action, MovementIntent};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A record of every mutation applied to a [`Simulation`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// Movement intent changed and the target velocity was re-resolved.
    Steered { intent: MovementIntent },
    /// Gravity was switched to `enabled`.
    GravityToggled { enabled: bool },
    /// Vehicle returned to the spawn pose.
    Reset,
    /// One integration step ran with the (already clamped) `dt`.
    Stepped { tick: u64, dt: f32 },
}

/// User-facing feedback for an applied action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    GravityEnabled,
    GravityDisabled,
    VehicleReset,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::GravityEnabled => "Gravity enabled",
            Self::GravityDisabled => "Gravity disabled",
            Self::VehicleReset => "Vehicle reset",
        })
    }
}

/// The authoritative driving session.
///
/// Owns the vehicle state, the current movement intent and the gravity mode.
/// Every mutation is appended to an event log so a session can be replayed
/// into a fresh one with bit-identical results.
#[derive(Debug, Clone)]
pub struct Simulation {
    params: MotionParams,
    vehicle: Option<VehicleState>,
    intent: MovementIntent,
    gravity: bool,
    tick: u64,
    event_log: Vec<SimEvent>,
}

impl Simulation {
    /// A session with the vehicle at rest at the spawn position, gravity off.
    pub fn new(params: MotionParams) -> Self {
        Self {
            vehicle: Some(VehicleState::at_rest(params.spawn_position)),
            ..Self::without_vehicle(params)
        }
    }

    /// A session with nothing to drive. Steps and resets are no-ops.
    pub fn without_vehicle(params: MotionParams) -> Self {
        Self {
            params,
            vehicle: None,
            intent: MovementIntent::IDLE,
            gravity: false,
            tick: 0,
            event_log: Vec::new(),
        }
    }

    pub fn params(&self) -> &MotionParams {
        &self.params
    }

    pub fn vehicle(&self) -> Option<&VehicleState> {
        self.vehicle.as_ref()
    }

    pub fn intent(&self) -> MovementIntent {
        self.intent
    }

    pub fn gravity(&self) -> bool {
        self.gravity
    }

    /// Number of integration steps run so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Apply a mapped action. Returns a notice for actions the user should
    /// see acknowledged.
    ///
    /// [`Action::ToggleGrid`] is purely cosmetic and ignored here.
    pub fn apply(&mut self, action: &Action) -> Option<Notice> {
        match action {
            Action::Steer(intent) => {
                self.steer(*intent);
                None
            }
            Action::ToggleGravity => Some(if self.toggle_gravity() {
                Notice::GravityEnabled
            } else {
                Notice::GravityDisabled
            }),
            Action::Reset => self.reset().then_some(Notice::VehicleReset),
            Action::ToggleGrid => None,
        }
    }

    /// Replace the movement intent and immediately adopt its target velocity.
    pub fn steer(&mut self, intent: MovementIntent) {
        self.intent = intent;
        if let Some(vehicle) = self.vehicle.as_mut() {
            vehicle.apply_target(resolve_intent(&intent, &self.params));
        }
        tracing::debug!(intent = %intent.label(), "intent changed");
        self.event_log.push(SimEvent::Steered { intent });
    }

    /// Flip gravity. Returns the new mode.
    pub fn toggle_gravity(&mut self) -> bool {
        self.set_gravity(!self.gravity);
        self.gravity
    }

    fn set_gravity(&mut self, enabled: bool) {
        self.gravity = enabled;
        tracing::debug!(enabled, "gravity toggled");
        self.event_log.push(SimEvent::GravityToggled { enabled });
    }

    /// Put the vehicle back at the spawn pose with zero motion and disable
    /// gravity. Held keys stay held but are not re-applied until they change.
    ///
    /// Returns `false` (and changes nothing) when there is no vehicle.
    pub fn reset(&mut self) -> bool {
        let Some(vehicle) = self.vehicle.as_mut() else {
            return false;
        };
        *vehicle = VehicleState::at_rest(self.params.spawn_position);
        self.gravity = false;
        tracing::debug!("vehicle reset");
        self.event_log.push(SimEvent::Reset);
        true
    }

    /// Run one integration step. Returns the clamped `dt` that was applied,
    /// or `0.0` when there is no vehicle.
    pub fn advance(&mut self, dt: f32) -> f32 {
        let Some(vehicle) = self.vehicle.as_mut() else {
            return 0.0;
        };
        let dt = integrate(vehicle, dt, self.gravity, &self.params);
        self.tick += 1;
        self.event_log.push(SimEvent::Stepped {
            tick: self.tick,
            dt,
        });
        dt
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.event_log)
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.event_log
    }

    /// Rebuild a session by applying `events` to a fresh one.
    pub fn replay(params: MotionParams, events: &[SimEvent]) -> Self {
        let mut sim = Self::new(params);
        for event in events {
            match *event {
                SimEvent::Steered { intent } => sim.steer(intent),
                SimEvent::GravityToggled { enabled } => sim.set_gravity(enabled),
                SimEvent::Reset => {
                    sim.reset();
                }
                SimEvent::Stepped { dt, .. } => {
                    sim.advance(dt);
                }
            }
        }
        sim
    }

    /// Deterministic FNV-1a hash of the session state, for comparing runs.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        let mut mix = |bytes: &[u8]| {
            for &b in bytes {
                h ^= b as u64;
                h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(&self.tick.to_le_bytes());
        mix(&[
            self.gravity as u8,
            self.intent.forward as u8,
            self.intent.backward as u8,
            self.intent.turn_left as u8,
            self.intent.turn_right as u8,
        ]);
        if let Some(v) = &self.vehicle {
            for f in v.position.to_array() {
                mix(&f.to_le_bytes());
            }
            for f in v.velocity.to_array() {
                mix(&f.to_le_bytes());
            }
            mix(&v.heading.to_le_bytes());
            mix(&v.angular_velocity.to_le_bytes());
            for spin in v.wheel_spin {
                mix(&spin.to_le_bytes());
            }
        }
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivescape_input::{InputMapper, Key};
    use glam::Vec3;

    fn forward() -> MovementIntent {
        MovementIntent {
            forward: true,
            ..MovementIntent::IDLE
        }
    }

    #[test]
    fn starts_at_spawn_with_gravity_off() {
        let sim = Simulation::new(MotionParams::default());
        let v = sim.vehicle().unwrap();
        assert_eq!(v.position, Vec3::new(0.0, 2.0, 0.0));
        assert!(!sim.gravity());
        assert_eq!(sim.tick(), 0);
    }

    #[test]
    fn steer_applies_target_immediately() {
        let mut sim = Simulation::new(MotionParams::default());
        sim.apply(&Action::Steer(MovementIntent {
            forward: true,
            turn_left: true,
            ..MovementIntent::IDLE
        }));
        let v = sim.vehicle().unwrap();
        assert!((v.velocity.x - -5.6).abs() < 1e-4);
        assert!((v.velocity.z - -5.6).abs() < 1e-4);
        assert_eq!(v.angular_velocity, 3.0);
    }

    #[test]
    fn gravity_toggle_reports_new_mode() {
        let mut sim = Simulation::new(MotionParams::default());
        assert_eq!(sim.apply(&Action::ToggleGravity), Some(Notice::GravityEnabled));
        assert!(sim.gravity());
        assert_eq!(sim.apply(&Action::ToggleGravity), Some(Notice::GravityDisabled));
        assert!(!sim.gravity());
    }

    #[test]
    fn notice_text() {
        assert_eq!(Notice::GravityEnabled.to_string(), "Gravity enabled");
        assert_eq!(Notice::GravityDisabled.to_string(), "Gravity disabled");
        assert_eq!(Notice::VehicleReset.to_string(), "Vehicle reset");
    }

    #[test]
    fn reset_restores_spawn_pose() {
        let mut sim = Simulation::new(MotionParams::default());
        sim.toggle_gravity();
        sim.steer(MovementIntent {
            forward: true,
            turn_right: true,
            ..MovementIntent::IDLE
        });
        for _ in 0..30 {
            sim.advance(0.05);
        }
        assert_eq!(sim.apply(&Action::Reset), Some(Notice::VehicleReset));

        let v = sim.vehicle().unwrap();
        assert_eq!(v.position, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(v.heading, 0.0);
        assert_eq!(v.velocity, Vec3::ZERO);
        assert_eq!(v.angular_velocity, 0.0);
        assert_eq!(v.wheel_spin, [0.0; 4]);
        assert!(!sim.gravity());
    }

    #[test]
    fn grid_toggle_does_not_touch_the_session() {
        let mut sim = Simulation::new(MotionParams::default());
        let before = sim.state_hash();
        assert_eq!(sim.apply(&Action::ToggleGrid), None);
        assert_eq!(sim.state_hash(), before);
        assert!(sim.events().is_empty());
    }

    #[test]
    fn missing_vehicle_is_a_silent_no_op() {
        let mut sim = Simulation::without_vehicle(MotionParams::default());
        assert_eq!(sim.advance(0.016), 0.0);
        assert_eq!(sim.apply(&Action::Reset), None);
        sim.steer(forward());
        assert!(sim.vehicle().is_none());
        assert_eq!(sim.tick(), 0);
    }

    #[test]
    fn advance_clamps_and_counts_ticks() {
        let mut sim = Simulation::new(MotionParams::default());
        assert_eq!(sim.advance(0.5), 0.1);
        assert_eq!(sim.advance(0.02), 0.02);
        assert_eq!(sim.tick(), 2);
    }

    #[test]
    fn events_are_recorded_and_drained() {
        let mut sim = Simulation::new(MotionParams::default());
        sim.steer(forward());
        sim.toggle_gravity();
        sim.advance(0.016);
        sim.reset();
        assert_eq!(sim.events().len(), 4);
        assert!(matches!(sim.events()[3], SimEvent::Reset));
        let drained = sim.drain_events();
        assert_eq!(drained.len(), 4);
        assert!(sim.events().is_empty());
    }

    #[test]
    fn replay_equivalence() {
        let params = MotionParams::default();
        let mut sim = Simulation::new(params);
        sim.toggle_gravity();
        sim.steer(forward());
        for i in 0..120 {
            sim.advance(0.01 + (i % 7) as f32 * 0.004);
        }
        sim.steer(MovementIntent {
            backward: true,
            turn_left: true,
            ..MovementIntent::IDLE
        });
        for _ in 0..40 {
            sim.advance(0.2);
        }
        sim.reset();
        sim.advance(0.016);

        let replayed = Simulation::replay(params, sim.events());
        assert_eq!(replayed.state_hash(), sim.state_hash());
        assert_eq!(replayed.vehicle(), sim.vehicle());
        assert_eq!(replayed.tick(), sim.tick());
        assert_eq!(replayed.events(), sim.events());
    }

    #[test]
    fn held_key_repeats_keep_a_grounded_vehicle_driving() {
        let dt = 1.0 / 60.0;
        let mut sim = Simulation::new(MotionParams::default());
        sim.toggle_gravity();
        for _ in 0..600 {
            sim.advance(dt);
        }
        let settled = *sim.vehicle().unwrap();
        assert_eq!(settled.position.y, -1.5);

        let mut mapper = InputMapper::new();
        let press = mapper.key_pressed(Key::W).unwrap();
        sim.apply(&press);
        for frame in 0..180 {
            if frame % 2 == 0 {
                sim.apply(&mapper.key_repeated(Key::W).unwrap());
            }
            sim.advance(dt);
        }

        let v = *sim.vehicle().unwrap();
        assert!(sim.intent().forward);
        assert_eq!(v.position.y, -1.5);
        let travelled = settled.position.z - v.position.z;
        assert!(travelled > 20.0, "travelled only {travelled}");

        let repeat = mapper.key_repeated(Key::W).unwrap();
        sim.apply(&repeat);
        assert_eq!(sim.vehicle().unwrap().velocity.z, -8.0);
    }

    #[test]
    fn state_hash_tracks_changes() {
        let mut a = Simulation::new(MotionParams::default());
        let b = Simulation::new(MotionParams::default());
        assert_eq!(a.state_hash(), b.state_hash());
        a.steer(forward());
        a.advance(0.016);
        assert_ne!(a.state_hash(), b.state_hash());
    }
}
