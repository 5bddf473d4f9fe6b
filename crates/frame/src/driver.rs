use crate::FrameClock;
use drivescape_kernel::Simulation;
use drivescape_render::CameraControl;
use drivescape_scene::{SceneError, SceneGraph, SceneHandles};
use std::time::Instant;

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// 1-based frame counter.
    pub frame: u64,
    /// Seconds the simulation was advanced by; zero without a vehicle.
    pub dt: f32,
}

/// Runs one frame: time, camera, simulation, scene, redraw.
#[derive(Debug, Clone)]
pub struct FrameDriver {
    clock: FrameClock,
    frame: u64,
}

impl FrameDriver {
    pub fn new(max_dt: f32) -> Self {
        Self {
            clock: FrameClock::new(max_dt),
            frame: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frame
    }

    pub fn clock_mut(&mut self) -> &mut FrameClock {
        &mut self.clock
    }

    /// One tick driven by the window's redraw signal.
    ///
    /// Order: sample the clock, ease the camera, integrate the vehicle, mirror
    /// the vehicle onto its nodes, move the follow light, request a redraw.
    /// Without a vehicle the scene is left alone but the redraw still happens;
    /// the redraw is also requested when updating the vehicle nodes fails.
    pub fn tick(
        &mut self,
        now: Instant,
        sim: &mut Simulation,
        scene: &mut SceneGraph,
        handles: &SceneHandles,
        camera: Option<&mut dyn CameraControl>,
        request_redraw: impl FnOnce(),
    ) -> Result<FrameReport, SceneError> {
        let elapsed = self.clock.tick(now);
        let stepped = self.step(elapsed, sim, scene, handles, camera);
        request_redraw();
        let dt = stepped?;
        Ok(FrameReport {
            frame: self.frame,
            dt,
        })
    }

    /// The tick body with an explicit `dt`, for headless stepping.
    pub fn step(
        &mut self,
        dt: f32,
        sim: &mut Simulation,
        scene: &mut SceneGraph,
        handles: &SceneHandles,
        camera: Option<&mut dyn CameraControl>,
    ) -> Result<f32, SceneError> {
        self.frame += 1;
        if let Some(camera) = camera {
            camera.update(dt);
        }
        let applied = sim.advance(dt);
        if let Some(vehicle) = sim.vehicle() {
            handles.vehicle.apply(scene, vehicle)?;
            handles.follow_light.track(scene, vehicle.position)?;
        }
        tracing::trace!(frame = self.frame, dt = applied, "frame");
        Ok(applied)
    }
}
