use crate::camera::PerspectiveCamera;
use glam::Vec3;
use std::f32::consts::{PI, TAU};

const EPS: f32 = 1e-6;

/// Orbit camera controller with optional damping.
///
/// Input handlers accumulate rotation and zoom; [`OrbitControls::update`]
/// applies them to the camera once per frame. With damping enabled only a
/// fraction of the pending rotation is applied per update and the rest
/// decays, so the camera glides to a stop.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pending_theta: f32,
    pending_phi: f32,
    pending_scale: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            pending_theta: 0.0,
            pending_phi: 0.0,
            pending_scale: 1.0,
        }
    }
}

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    pub fn with_damping(mut self, factor: f32) -> Self {
        self.enable_damping = true;
        self.damping_factor = factor;
        self
    }

    /// Queue a rotation from a pointer drag of `dx`, `dy` pixels in a
    /// viewport `viewport_height` pixels tall.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let h = viewport_height.max(1.0);
        self.pending_theta -= TAU * dx / h * self.rotate_speed;
        self.pending_phi -= TAU * dy / h * self.rotate_speed;
    }

    /// Queue a zoom step. Positive `steps` move the camera closer.
    pub fn zoom(&mut self, steps: f32) {
        self.pending_scale *= 0.95_f32.powf(steps * self.zoom_speed);
    }

    pub fn is_idle(&self) -> bool {
        self.pending_theta.abs() < EPS
            && self.pending_phi.abs() < EPS
            && (self.pending_scale - 1.0).abs() < EPS
    }

    /// Advance the controller by one frame. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        camera.target = self.target;
        if self.is_idle() {
            self.pending_theta = 0.0;
            self.pending_phi = 0.0;
            self.pending_scale = 1.0;
            return false;
        }

        let offset = camera.position - self.target;
        let radius = offset.length().max(EPS);
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        let step = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        theta += self.pending_theta * step;
        phi = (phi + self.pending_phi * step).clamp(EPS, PI - EPS);
        let radius = (radius * self.pending_scale).clamp(self.min_distance, self.max_distance);

        let offset = Vec3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        camera.position = self.target + offset;

        if self.enable_damping {
            self.pending_theta *= 1.0 - self.damping_factor;
            self.pending_phi *= 1.0 - self.damping_factor;
        } else {
            self.pending_theta = 0.0;
            self.pending_phi = 0.0;
        }
        self.pending_scale = 1.0;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_update_leaves_camera_untouched() {
        let mut controls = OrbitControls::default().with_damping(0.05);
        let mut cam = PerspectiveCamera::default();
        let before = cam;
        assert!(!controls.update(&mut cam));
        assert_eq!(cam, before);
    }

    #[test]
    fn rotation_keeps_distance() {
        let mut controls = OrbitControls::default();
        let mut cam = PerspectiveCamera::default();
        let dist = cam.position.length();
        controls.rotate(100.0, 0.0, 720.0);
        assert!(controls.update(&mut cam));
        assert!((cam.position.length() - dist).abs() < 1e-4);
        assert!(controls.is_idle());
    }

    #[test]
    fn damping_spreads_rotation_over_frames() {
        let mut controls = OrbitControls::default().with_damping(0.05);
        let mut cam = PerspectiveCamera::default();
        controls.rotate(200.0, 0.0, 720.0);

        let start = cam.position;
        controls.update(&mut cam);
        let first = cam.position;
        assert_ne!(first, start);
        assert!(!controls.is_idle());

        controls.update(&mut cam);
        assert_ne!(cam.position, first);
    }

    #[test]
    fn zoom_moves_closer() {
        let mut controls = OrbitControls::default();
        let mut cam = PerspectiveCamera::default();
        let dist = cam.position.length();
        controls.zoom(1.0);
        controls.update(&mut cam);
        assert!(cam.position.length() < dist);
    }
}
