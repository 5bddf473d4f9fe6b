use drivescape_render::{CameraControl, RenderView};
use glam::{Mat4, Vec2, Vec3};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Polar angles are kept this far from the poles so the up vector stays
/// well defined.
const POLE_EPSILON: f32 = 1e-6;

/// Errors from constructing an [`OrbitCamera`].
#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("invalid orbit camera setting `{field}`: {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },
}

/// Tuning for the orbit controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitConfig {
    /// Fraction of pending rotation and pan applied per update.
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub eye: Vec3,
    pub target: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            damping_factor: 0.05,
            min_distance: 3.0,
            max_distance: 50.0,
            min_polar_angle: 0.0,
            max_polar_angle: FRAC_PI_2,
            rotate_speed: 0.8,
            zoom_speed: 1.0,
            pan_speed: 0.8,
            eye: Vec3::new(0.0, 8.0, 15.0),
            target: Vec3::ZERO,
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl OrbitConfig {
    pub fn validate(&self) -> Result<(), CameraError> {
        let invalid = |field, reason| Err(CameraError::InvalidConfig { field, reason });
        if !(self.damping_factor > 0.0 && self.damping_factor <= 1.0) {
            return invalid("damping_factor", "must be in (0, 1]");
        }
        if !(self.min_distance > 0.0 && self.min_distance <= self.max_distance) {
            return invalid("min_distance", "must be positive and at most max_distance");
        }
        if !(0.0..=PI).contains(&self.min_polar_angle)
            || !(self.min_polar_angle..=PI).contains(&self.max_polar_angle)
        {
            return invalid("max_polar_angle", "polar range must lie within [0, pi]");
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return invalid("fov_degrees", "must be in (0, 180)");
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return invalid("near", "clip planes must satisfy 0 < near < far");
        }
        if self.eye.distance_squared(self.target) == 0.0 || !self.eye.is_finite() {
            return invalid("eye", "must be finite and distinct from target");
        }
        Ok(())
    }
}

/// Mouse-driven camera that circles a target point.
///
/// Input accumulates into pending deltas; [`CameraControl::update`] applies
/// a `damping_factor` share of them each frame, so motion eases out after
/// the mouse stops. Zoom is applied in full on the next update.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    config: OrbitConfig,
    target: Vec3,
    radius: f32,
    /// Azimuth around +Y, measured from +Z.
    theta: f32,
    /// Angle from +Y.
    phi: f32,
    pending_theta: f32,
    pending_phi: f32,
    pending_pan: Vec3,
    pending_scale: f32,
    aspect: f32,
}

impl OrbitCamera {
    pub fn new(config: OrbitConfig) -> Result<Self, CameraError> {
        config.validate()?;
        let offset = config.eye - config.target;
        let radius = offset.length();
        let mut camera = Self {
            config,
            target: config.target,
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            pending_theta: 0.0,
            pending_phi: 0.0,
            pending_pan: Vec3::ZERO,
            pending_scale: 1.0,
            aspect: 16.0 / 9.0,
        };
        camera.constrain();
        tracing::debug!(radius = camera.radius, "orbit camera ready");
        Ok(camera)
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn distance(&self) -> f32 {
        self.radius
    }

    pub fn polar_angle(&self) -> f32 {
        self.phi
    }

    pub fn eye(&self) -> Vec3 {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        self.target
            + self.radius * Vec3::new(sin_phi * sin_theta, cos_phi, sin_phi * cos_theta)
    }

    /// Drag by `delta` pixels on a viewport `viewport_height` pixels tall.
    /// A drag across the full height turns the camera one full revolution.
    pub fn rotate(&mut self, delta: Vec2, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        self.pending_theta -= TAU * delta.x / height * self.config.rotate_speed;
        self.pending_phi -= TAU * delta.y / height * self.config.rotate_speed;
    }

    /// Scroll by `lines` wheel notches; positive moves closer.
    pub fn zoom(&mut self, lines: f32) {
        self.pending_scale *= 0.95_f32.powf(self.config.zoom_speed * lines);
    }

    /// Screen-space pan: the target slides in the camera's view plane so the
    /// point under the cursor follows the mouse.
    pub fn pan(&mut self, delta: Vec2, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        let half_fov = (self.config.fov_degrees.to_radians() * 0.5).tan();
        let world_per_pixel = 2.0 * self.radius * half_fov / height * self.config.pan_speed;
        let view = Mat4::look_at_rh(self.eye(), self.target, Vec3::Y).inverse();
        let right = view.x_axis.truncate();
        let up = view.y_axis.truncate();
        self.pending_pan += (-delta.x * right + delta.y * up) * world_per_pixel;
    }

    fn constrain(&mut self) {
        let min_phi = self.config.min_polar_angle.max(POLE_EPSILON);
        let max_phi = self.config.max_polar_angle.min(PI - POLE_EPSILON);
        self.phi = self.phi.clamp(min_phi, max_phi.max(min_phi));
        self.radius = self
            .radius
            .clamp(self.config.min_distance, self.config.max_distance);
    }
}

impl CameraControl for OrbitCamera {
    fn update(&mut self, _dt: f32) {
        let damping = self.config.damping_factor;
        self.theta += self.pending_theta * damping;
        self.phi += self.pending_phi * damping;
        self.radius *= self.pending_scale;
        self.target += self.pending_pan * damping;
        self.constrain();

        self.pending_theta *= 1.0 - damping;
        self.pending_phi *= 1.0 - damping;
        self.pending_pan *= 1.0 - damping;
        self.pending_scale = 1.0;
    }

    fn view(&self) -> RenderView {
        RenderView {
            eye: self.eye(),
            target: self.target,
            fov_degrees: self.config.fov_degrees,
            aspect: self.aspect,
            near: self.config.near,
            far: self.config.far,
        }
    }

    fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }
}
