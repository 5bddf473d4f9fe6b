use drivescape_kernel::Simulation;
use glam::Vec3;

/// Read-only view of a [`Simulation`] for debug overlays and the CLI.
pub struct TelemetryInspector;

impl TelemetryInspector {
    /// Snapshot the session. Vehicle fields are `None` when there is no vehicle.
    pub fn summary(sim: &Simulation) -> Telemetry {
        let vehicle = sim.vehicle();
        Telemetry {
            tick: sim.tick(),
            position: vehicle.map(|v| v.position),
            heading_degrees: vehicle.map(|v| v.heading.to_degrees()),
            speed: vehicle.map(|v| v.planar_speed()),
            vertical_speed: vehicle.map(|v| v.velocity.y),
            gravity: sim.gravity(),
            intent: sim.intent().label(),
            pending_events: sim.events().len(),
        }
    }

    /// Control reference shown beside the telemetry.
    pub fn controls() -> &'static [(&'static str, &'static str)] {
        &[
            ("W / S", "forward / backward"),
            ("A / D", "turn left / right"),
            ("Space", "toggle gravity"),
            ("R", "reset vehicle"),
            ("G", "toggle grid"),
            ("F1", "toggle this panel"),
            ("Mouse", "orbit, zoom, pan"),
        ]
    }
}

/// Snapshot of the driving session.
#[derive(Debug, Clone, PartialEq)]
pub struct Telemetry {
    pub tick: u64,
    pub position: Option<Vec3>,
    pub heading_degrees: Option<f32>,
    /// Planar speed, units per second.
    pub speed: Option<f32>,
    pub vertical_speed: Option<f32>,
    pub gravity: bool,
    pub intent: String,
    pub pending_events: usize,
}

impl std::fmt::Display for Telemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Vehicle: tick={} ", self.tick)?;
        match (self.position, self.heading_degrees, self.speed) {
            (Some(p), Some(heading), Some(speed)) => write!(
                f,
                "pos=({:.2}, {:.2}, {:.2}) heading={:.1} speed={:.2}",
                p.x, p.y, p.z, heading, speed
            )?,
            _ => f.write_str("absent")?,
        }
        write!(
            f,
            " gravity={} keys={} pending_events={}",
            if self.gravity { "on" } else { "off" },
            self.intent,
            self.pending_events
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivescape_input::{Action, MovementIntent};
    use drivescape_kernel::MotionParams;

    #[test]
    fn summary_fresh_session() {
        let sim = Simulation::new(MotionParams::default());
        let t = TelemetryInspector::summary(&sim);
        assert_eq!(t.tick, 0);
        assert_eq!(t.position, Some(Vec3::new(0.0, 2.0, 0.0)));
        assert_eq!(t.speed, Some(0.0));
        assert!(!t.gravity);
        assert_eq!(t.intent, "----");
        assert_eq!(t.pending_events, 0);
    }

    #[test]
    fn summary_tracks_driving() {
        let mut sim = Simulation::new(MotionParams::default());
        sim.steer(MovementIntent {
            forward: true,
            ..MovementIntent::IDLE
        });
        sim.apply(&Action::ToggleGravity);
        sim.advance(0.05);

        let t = TelemetryInspector::summary(&sim);
        assert_eq!(t.tick, 1);
        assert!(t.gravity);
        assert_eq!(t.intent, "W---");
        assert!(t.speed.unwrap() > 0.0);
        assert_eq!(t.pending_events, 3);
    }

    #[test]
    fn summary_without_vehicle() {
        let sim = Simulation::without_vehicle(MotionParams::default());
        let t = TelemetryInspector::summary(&sim);
        assert!(t.position.is_none());
        assert!(format!("{t}").contains("absent"));
    }

    #[test]
    fn summary_display() {
        let sim = Simulation::new(MotionParams::default());
        let s = format!("{}", TelemetryInspector::summary(&sim));
        assert!(s.contains("tick=0"));
        assert!(s.contains("gravity=off"));
        assert!(s.contains("pos=(0.00, 2.00, 0.00)"));
    }

    #[test]
    fn controls_cover_every_binding() {
        let keys: Vec<_> = TelemetryInspector::controls().iter().map(|(k, _)| *k).collect();
        for expected in ["W / S", "A / D", "Space", "R", "G"] {
            assert!(keys.contains(&expected));
        }
    }
}
