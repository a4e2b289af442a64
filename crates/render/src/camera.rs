use glam::{Mat4, Vec2, Vec3};
use shapefall_common::Ray;

/// Perspective camera looking from `position` at `target`.
///
/// Uses right-handed view space and a `[0, 1]` depth range, matching wgpu.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 5.0, 10.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_degrees: 75.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl PerspectiveCamera {
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov_degrees,
            aspect,
            near,
            far,
            ..Self::default()
        }
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// World-space ray from the camera through a point in normalized device
    /// coordinates (`x` right, `y` up, both in `-1..=1`).
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection().inverse();
        let far_point = inverse.project_point3(ndc.extend(1.0));
        Ray::from_points(self.position, far_point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera() {
        let cam = PerspectiveCamera::default();
        assert!(cam.position.y > 0.0);
        assert_eq!(cam.fov_degrees, 75.0);
        let vp = cam.view_projection();
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn center_ray_points_at_target() {
        let cam = PerspectiveCamera::default();
        let ray = cam.ray_from_ndc(Vec2::ZERO);
        assert_eq!(ray.origin, cam.position);
        assert!((ray.direction - cam.forward()).length() < 1e-4);
    }

    #[test]
    fn top_edge_ray_tilts_up() {
        let cam = PerspectiveCamera::default();
        let center = cam.ray_from_ndc(Vec2::ZERO);
        let top = cam.ray_from_ndc(Vec2::new(0.0, 1.0));
        assert!(top.direction.y > center.direction.y);
        // Half the vertical field of view separates the two rays.
        let angle = center.direction.angle_between(top.direction).to_degrees();
        assert!((angle - 37.5).abs() < 0.1, "angle was {angle}");
    }
}
