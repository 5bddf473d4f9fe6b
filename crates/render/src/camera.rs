use crate::RenderView;

/// A controller that produces the view each frame.
///
/// The frame driver calls [`CameraControl::update`] once per tick, before
/// the simulation step, so smoothing advances in lockstep with the frame.
pub trait CameraControl {
    /// Advance any damping or smoothing by `dt` seconds.
    fn update(&mut self, dt: f32);

    /// The view to render with.
    fn view(&self) -> RenderView;

    /// Width over height of the output surface.
    fn set_aspect(&mut self, aspect: f32);
}

/// A camera that never moves. Used when no interactive controller is
/// available.
#[derive(Debug, Clone, Copy)]
pub struct FixedCamera {
    view: RenderView,
}

impl FixedCamera {
    pub fn new(view: RenderView) -> Self {
        Self { view }
    }
}

impl Default for FixedCamera {
    fn default() -> Self {
        Self::new(RenderView::default())
    }
}

impl CameraControl for FixedCamera {
    fn update(&mut self, _dt: f32) {}

    fn view(&self) -> RenderView {
        self.view
    }

    fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.view.aspect = aspect;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_camera_only_tracks_aspect() {
        let mut cam = FixedCamera::default();
        let before = cam.view();
        cam.update(1.0);
        cam.set_aspect(2.0);
        let after = cam.view();
        assert_eq!(after.eye, before.eye);
        assert_eq!(after.target, before.target);
        assert_eq!(after.aspect, 2.0);
    }

    #[test]
    fn degenerate_aspect_is_ignored() {
        let mut cam = FixedCamera::default();
        cam.set_aspect(0.0);
        cam.set_aspect(f32::NAN);
        assert_eq!(cam.view().aspect, RenderView::default().aspect);
    }
}
