use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// A point in world space produced by the input mapper.
pub type WorldPoint = Vec3;

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            scale: Vec3::ONE,
        }
    }

    /// Model matrix for this transform (scale, then rotate, then translate).
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Linear RGB color with alpha, each channel in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Build an opaque color from a `0xRRGGBB` value. Bits above 24 are ignored.
    pub fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xff) as f32 / 255.0;
        let g = ((hex >> 8) & 0xff) as f32 / 255.0;
        let b = (hex & 0xff) as f32 / 255.0;
        Self::rgb(r, g, b)
    }

    /// Inverse of [`Color::from_hex`], rounding each channel to 8 bits.
    pub fn to_hex(&self) -> u32 {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// A half-line in world space. `direction` is unit length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Ray starting at `from` and pointing through `through`.
    pub fn from_points(from: Vec3, through: Vec3) -> Self {
        Self {
            origin: from,
            direction: (through - from).normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Size of the client area that pointer coordinates are measured against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero (or negative), which makes
    /// pointer mapping undefined.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height.max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.to_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn color_hex_roundtrip_of_gray() {
        let c = Color::from_hex(0x808080);
        assert_eq!(c.to_hex(), 0x808080);
        assert!((c.r - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn color_from_hex_ignores_high_bits() {
        assert_eq!(Color::from_hex(0xff00_0000), Color::rgb(0.0, 0.0, 0.0));
    }

    #[test]
    fn ray_from_points_is_normalized() {
        let ray = Ray::from_points(Vec3::ZERO, Vec3::new(0.0, 0.0, -4.0));
        assert_eq!(ray.direction, Vec3::NEG_Z);
        assert_eq!(ray.at(2.0), Vec3::new(0.0, 0.0, -2.0));
    }

    #[test]
    fn empty_viewport() {
        assert!(Viewport::new(0.0, 720.0).is_empty());
        assert!(Viewport::new(1280.0, 0.0).is_empty());
        assert!(!Viewport::new(1280.0, 720.0).is_empty());
    }
}
