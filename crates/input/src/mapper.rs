use crate::pointer::{InputError, PointerEvent, pointer_to_ndc};
use glam::{Vec2, Vec3};
use shapefall_common::{Ray, Viewport, WorldPoint};
use shapefall_render::PerspectiveCamera;

const EPS: f32 = 1e-6;

/// Horizontal, upward-facing rectangle that pointer rays are tested against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundSurface {
    pub height: f32,
    pub min: Vec2,
    pub max: Vec2,
}

impl GroundSurface {
    /// Rectangle centered at `center` (x, z) with the given full size.
    pub fn new(height: f32, center: Vec2, size: Vec2) -> Self {
        Self {
            height,
            min: center - size * 0.5,
            max: center + size * 0.5,
        }
    }

    /// Where `ray` first meets the top of the surface, if it does.
    ///
    /// The returned point's height is exactly the surface height.
    pub fn intersect(&self, ray: &Ray) -> Option<WorldPoint> {
        // Parallel, or travelling upward onto the back face.
        if ray.direction.y > -EPS {
            return None;
        }
        let t = (self.height - ray.origin.y) / ray.direction.y;
        if t <= 0.0 {
            return None;
        }
        let x = ray.origin.x + ray.direction.x * t;
        let z = ray.origin.z + ray.direction.z * t;
        if x < self.min.x || x > self.max.x || z < self.min.y || z > self.max.y {
            return None;
        }
        Some(Vec3::new(x, self.height, z))
    }
}

/// Map a pointer event to the ground point under it.
///
/// Casts a ray from the camera through the pointer and tests it against the
/// ground only. `Ok(None)` means the ray missed the ground.
pub fn map_pointer_to_world(
    event: &PointerEvent,
    viewport: Viewport,
    camera: &PerspectiveCamera,
    ground: &GroundSurface,
) -> Result<Option<WorldPoint>, InputError> {
    let ndc = pointer_to_ndc(event, viewport)?;
    let ray = camera.ray_from_ndc(ndc);
    let hit = ground.intersect(&ray);
    if hit.is_none() {
        tracing::trace!(x = event.x, y = event.y, "pointer ray missed the ground");
    }
    Ok(hit)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 1280.0,
        height: 720.0,
    };

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(75.0, VIEWPORT.width / VIEWPORT.height, 0.1, 1000.0)
    }

    fn ground() -> GroundSurface {
        GroundSurface::new(0.0, Vec2::ZERO, Vec2::splat(20.0))
    }

    #[test]
    fn center_click_hits_origin() {
        let hit = map_pointer_to_world(&PointerEvent::new(640.0, 360.0), VIEWPORT, &camera(), &ground())
            .unwrap()
            .expect("center of the screen looks at the ground");
        assert_eq!(hit.y, 0.0);
        assert!(hit.x.abs() < 1e-3);
        assert!(hit.z.abs() < 1e-3);
    }

    #[test]
    fn ground_hits_have_zero_height() {
        let cam = camera();
        let g = ground();
        let mut hits = 0;
        for ix in 0..=16 {
            for iy in 0..=9 {
                let event = PointerEvent::new(ix as f32 * 80.0, iy as f32 * 80.0);
                if let Some(p) = map_pointer_to_world(&event, VIEWPORT, &cam, &g).unwrap() {
                    assert_eq!(p.y, 0.0);
                    hits += 1;
                }
            }
        }
        assert!(hits > 0);
    }

    #[test]
    fn click_above_horizon_misses() {
        let hit = map_pointer_to_world(&PointerEvent::new(640.0, 0.0), VIEWPORT, &camera(), &ground()).unwrap();
        assert_eq!(hit, None);
    }

    #[test]
    fn click_beyond_ground_extent_misses() {
        // Just below the horizon: the ray comes down about 50 units away.
        let event = PointerEvent::new(640.0, 180.0);
        let hit = map_pointer_to_world(&event, VIEWPORT, &camera(), &ground()).unwrap();
        assert_eq!(hit, None);

        let vast = GroundSurface::new(0.0, Vec2::ZERO, Vec2::splat(1000.0));
        let far = map_pointer_to_world(&event, VIEWPORT, &camera(), &vast)
            .unwrap()
            .expect("an unbounded ground catches the ray");
        assert!(far.z < -10.0);
    }

    #[test]
    fn empty_viewport_is_reported() {
        let res = map_pointer_to_world(&PointerEvent::new(1.0, 1.0), Viewport::new(0.0, 0.0), &camera(), &ground());
        assert!(res.is_err());
    }

    #[test]
    fn ray_from_below_misses() {
        let ray = Ray::from_points(Vec3::new(0.0, -5.0, 0.0), Vec3::ZERO);
        assert_eq!(ground().intersect(&ray), None);
        let parallel = Ray::from_points(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(ground().intersect(&parallel), None);
    }
}
