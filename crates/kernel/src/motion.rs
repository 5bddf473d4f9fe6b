//! Intent resolution and the per-frame integration step.

use crate::{MotionParams, VehicleState};
use drivescape_input::MovementIntent;
use glam::Vec2;

/// Planar and angular velocity the vehicle should adopt for an intent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetVelocity {
    /// Velocity on the ground plane as `(x, z)`.
    pub planar: Vec2,
    /// Yaw rate, rad/s.
    pub angular: f32,
}

/// Resolve held movement keys into target velocities.
///
/// `-Z` is forward. Branches are evaluated in a fixed order and later matches
/// overwrite earlier ones, so opposing keys resolve to whichever is checked
/// last (backward over forward, right over left). Diagonal combinations
/// replace the planar velocity with a fixed vector in the matching quadrant.
pub fn resolve_intent(intent: &MovementIntent, params: &MotionParams) -> TargetVelocity {
    let speed = params.speed;
    let mut planar = Vec2::ZERO;
    let mut angular = 0.0;

    if intent.forward {
        planar.y = -speed;
    }
    if intent.backward {
        planar.y = speed;
    }

    if intent.turn_left {
        angular = params.turn_speed;
    }
    if intent.turn_right {
        angular = -params.turn_speed;
    }

    let diagonal = speed * params.diagonal_factor;
    if intent.forward && intent.turn_left {
        planar = Vec2::new(-diagonal, -diagonal);
    }
    if intent.forward && intent.turn_right {
        planar = Vec2::new(diagonal, -diagonal);
    }
    if intent.backward && intent.turn_left {
        planar = Vec2::new(-diagonal, diagonal);
    }
    if intent.backward && intent.turn_right {
        planar = Vec2::new(diagonal, diagonal);
    }

    TargetVelocity { planar, angular }
}

impl VehicleState {
    /// Adopt a resolved target. Vertical velocity is left untouched.
    pub fn apply_target(&mut self, target: TargetVelocity) {
        self.velocity.x = target.planar.x;
        self.velocity.z = target.planar.y;
        self.angular_velocity = target.angular;
    }
}

/// Advance `state` by one frame.
///
/// `dt` is clamped to `params.max_dt`. Returns the time actually integrated.
pub fn integrate(state: &mut VehicleState, dt: f32, gravity: bool, params: &MotionParams) -> f32 {
    let dt = dt.max(0.0).min(params.max_dt);
    let ground = params.ground_level;

    if gravity && state.position.y > ground {
        state.velocity.y -= params.gravity * dt;
    }

    state.position += state.velocity * dt;

    let speed = state.planar_speed();
    if speed > params.wheel_spin_min_speed {
        let spin = speed * dt * params.gearing_ratio;
        for wheel in &mut state.wheel_spin {
            *wheel += spin;
        }
    }

    if state.position.y <= ground {
        state.position.y = ground;
        if state.velocity.y.abs() > params.bounce_threshold {
            state.velocity.y = -state.velocity.y * params.bounce_factor;
        } else {
            state.velocity.y = 0.0;
        }
    }

    if state.position.y <= ground + params.ground_contact_band {
        state.velocity.x *= params.friction;
        state.velocity.z *= params.friction;
        if state.velocity.x.abs() < params.stop_threshold {
            state.velocity.x = 0.0;
        }
        if state.velocity.z.abs() < params.stop_threshold {
            state.velocity.z = 0.0;
        }
    }

    if state.angular_velocity != 0.0 {
        state.heading += state.angular_velocity * dt;
    }

    if state.angular_velocity != 0.0
        && state.velocity.x.abs() < params.angular_damping_speed
        && state.velocity.z.abs() < params.angular_damping_speed
    {
        state.angular_velocity *= params.angular_damping;
        if state.angular_velocity.abs() < params.angular_stop_threshold {
            state.angular_velocity = 0.0;
        }
    }

    dt
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    const EPS: f32 = 1e-4;

    fn intent(forward: bool, backward: bool, turn_left: bool, turn_right: bool) -> MovementIntent {
        MovementIntent {
            forward,
            backward,
            turn_left,
            turn_right,
        }
    }

    fn on_ground(params: &MotionParams) -> VehicleState {
        VehicleState::at_rest(Vec3::new(0.0, params.ground_level, 0.0))
    }

    #[test]
    fn forward_alone() {
        let t = resolve_intent(&intent(true, false, false, false), &MotionParams::default());
        assert_eq!(t.planar, Vec2::new(0.0, -8.0));
        assert_eq!(t.angular, 0.0);
    }

    #[test]
    fn backward_alone() {
        let t = resolve_intent(&intent(false, true, false, false), &MotionParams::default());
        assert_eq!(t.planar, Vec2::new(0.0, 8.0));
    }

    #[test]
    fn turning_alone_leaves_planar_zero() {
        let p = MotionParams::default();
        let left = resolve_intent(&intent(false, false, true, false), &p);
        assert_eq!(left.planar, Vec2::ZERO);
        assert_eq!(left.angular, 3.0);
        let right = resolve_intent(&intent(false, false, false, true), &p);
        assert_eq!(right.angular, -3.0);
    }

    #[test]
    fn diagonals_override_cardinal_velocity() {
        let p = MotionParams::default();
        let cases = [
            (intent(true, false, true, false), Vec2::new(-5.6, -5.6), 3.0),
            (intent(true, false, false, true), Vec2::new(5.6, -5.6), -3.0),
            (intent(false, true, true, false), Vec2::new(-5.6, 5.6), 3.0),
            (intent(false, true, false, true), Vec2::new(5.6, 5.6), -3.0),
        ];
        for (i, planar, angular) in cases {
            let t = resolve_intent(&i, &p);
            assert!(t.planar.abs_diff_eq(planar, EPS), "{i:?} -> {:?}", t.planar);
            assert_eq!(t.angular, angular);
        }
    }

    #[test]
    fn idle_intent_targets_zero() {
        let t = resolve_intent(&MovementIntent::IDLE, &MotionParams::default());
        assert_eq!(t.planar, Vec2::ZERO);
        assert_eq!(t.angular, 0.0);
    }

    #[test]
    fn opposing_keys_last_checked_wins() {
        let p = MotionParams::default();
        let t = resolve_intent(&intent(true, true, false, false), &p);
        assert_eq!(t.planar, Vec2::new(0.0, 8.0));
        let t = resolve_intent(&intent(false, false, true, true), &p);
        assert_eq!(t.angular, -3.0);
    }

    #[test]
    fn apply_target_keeps_vertical_velocity() {
        let mut v = VehicleState::at_rest(Vec3::ZERO);
        v.velocity.y = -4.0;
        v.apply_target(TargetVelocity {
            planar: Vec2::new(1.0, 2.0),
            angular: 0.5,
        });
        assert_eq!(v.velocity, Vec3::new(1.0, -4.0, 2.0));
        assert_eq!(v.angular_velocity, 0.5);
    }

    #[test]
    fn large_dt_is_clamped() {
        let p = MotionParams::default();
        let mut a = VehicleState::at_rest(Vec3::new(0.0, 2.0, 0.0));
        a.velocity = Vec3::new(0.0, 0.0, -8.0);
        let mut b = a;
        assert_eq!(integrate(&mut a, 5.0, true, &p), 0.1);
        integrate(&mut b, 0.1, true, &p);
        assert_eq!(a, b);
    }

    #[test]
    fn rest_without_gravity_stays_put() {
        let p = MotionParams::default();
        let mut v = VehicleState::at_rest(p.spawn_position);
        for dt in [0.016, 0.033, 0.5, 0.001] {
            integrate(&mut v, dt, false, &p);
        }
        assert_eq!(v.position, p.spawn_position);
        assert_eq!(v.wheel_spin, [0.0; 4]);
    }

    #[test]
    fn airborne_motion_is_frictionless() {
        let p = MotionParams::default();
        let mut v = VehicleState::at_rest(Vec3::new(0.0, 2.0, 0.0));
        v.velocity.z = -8.0;
        for _ in 0..10 {
            integrate(&mut v, 0.05, false, &p);
        }
        assert_eq!(v.velocity.z, -8.0);
        assert!((v.position.z - -4.0).abs() < EPS);
    }

    #[test]
    fn wheels_spin_with_planar_speed() {
        let p = MotionParams::default();
        let mut v = VehicleState::at_rest(Vec3::new(0.0, 2.0, 0.0));
        v.velocity = Vec3::new(3.0, 0.0, 4.0);
        integrate(&mut v, 0.1, false, &p);
        for spin in v.wheel_spin {
            assert!((spin - 5.0 * 0.1 * 4.0).abs() < EPS);
        }
    }

    #[test]
    fn wheels_hold_below_spin_threshold() {
        let p = MotionParams::default();
        let mut v = VehicleState::at_rest(Vec3::new(0.0, 2.0, 0.0));
        v.velocity = Vec3::new(0.05, 0.0, 0.05);
        integrate(&mut v, 0.1, false, &p);
        assert_eq!(v.wheel_spin, [0.0; 4]);
    }

    #[test]
    fn hard_landing_bounces() {
        let p = MotionParams::default();
        let mut v = VehicleState::at_rest(Vec3::new(0.0, -1.45, 0.0));
        v.velocity.y = -10.0;
        integrate(&mut v, 0.01, true, &p);
        let impact = -10.0 - 9.8 * 0.01;
        assert_eq!(v.position.y, p.ground_level);
        assert!((v.velocity.y - (-impact * 0.6)).abs() < EPS);
    }

    #[test]
    fn soft_landing_stops() {
        let p = MotionParams::default();
        let mut v = VehicleState::at_rest(Vec3::new(0.0, -1.49, 0.0));
        v.velocity.y = -1.0;
        integrate(&mut v, 0.1, false, &p);
        assert_eq!(v.position.y, p.ground_level);
        assert_eq!(v.velocity.y, 0.0);
    }

    #[test]
    fn drop_from_five_settles_on_ground() {
        let p = MotionParams::default();
        let mut v = VehicleState::at_rest(Vec3::new(0.0, 5.0, 0.0));
        let mut bounces = 0;
        let mut last_vy = 0.0;
        for _ in 0..2000 {
            integrate(&mut v, 1.0 / 60.0, true, &p);
            if last_vy < 0.0 && v.velocity.y > 0.0 {
                bounces += 1;
            }
            last_vy = v.velocity.y;
            assert!(v.position.y >= p.ground_level);
        }
        assert!(bounces >= 1);
        assert_eq!(v.position.y, -1.5);
        assert_eq!(v.velocity.y, 0.0);
    }

    #[test]
    fn friction_decays_then_snaps() {
        let p = MotionParams::default();
        let mut v = on_ground(&p);
        v.velocity.x = 10.0;
        let mut expected = 10.0_f32;
        let mut ticks = 0;
        while v.velocity.x != 0.0 {
            integrate(&mut v, 0.0, false, &p);
            expected *= 0.93;
            if expected < 0.05 {
                assert_eq!(v.velocity.x, 0.0);
            } else {
                assert!((v.velocity.x - expected).abs() < EPS);
            }
            ticks += 1;
            assert!(ticks < 200);
        }
        assert!(expected < 0.05);
    }

    #[test]
    fn heading_follows_angular_velocity() {
        let p = MotionParams::default();
        let mut v = VehicleState::at_rest(Vec3::new(0.0, 2.0, 0.0));
        v.velocity.z = -8.0;
        v.angular_velocity = 3.0;
        integrate(&mut v, 0.1, false, &p);
        assert!((v.heading - 0.3).abs() < EPS);
        // Moving, so no damping.
        assert_eq!(v.angular_velocity, 3.0);
    }

    #[test]
    fn spin_in_place_damps_out() {
        let p = MotionParams::default();
        let mut v = VehicleState::at_rest(Vec3::new(0.0, 2.0, 0.0));
        v.angular_velocity = 3.0;
        integrate(&mut v, 0.1, false, &p);
        assert!((v.angular_velocity - 2.7).abs() < EPS);
        for _ in 0..100 {
            integrate(&mut v, 0.1, false, &p);
        }
        assert_eq!(v.angular_velocity, 0.0);
    }
}
