use glam::Vec2;
use shapefall_common::Viewport;
use thiserror::Error;

/// A pointer click in client-space pixels, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub x: f32,
    pub y: f32,
}

impl PointerEvent {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("viewport has no area ({width}x{height}); pointer mapping is undefined")]
    EmptyViewport { width: f32, height: f32 },
}

/// Normalized device coordinates of a pointer event: `x` right and `y` up,
/// both spanning `-1..=1` across the viewport.
pub fn pointer_to_ndc(event: &PointerEvent, viewport: Viewport) -> Result<Vec2, InputError> {
    if viewport.is_empty() {
        return Err(InputError::EmptyViewport {
            width: viewport.width,
            height: viewport.height,
        });
    }
    Ok(Vec2::new(
        (event.x / viewport.width) * 2.0 - 1.0,
        -(event.y / viewport.height) * 2.0 + 1.0,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_and_center() {
        let vp = Viewport::new(800.0, 600.0);
        assert_eq!(pointer_to_ndc(&PointerEvent::new(0.0, 0.0), vp), Ok(Vec2::new(-1.0, 1.0)));
        assert_eq!(pointer_to_ndc(&PointerEvent::new(800.0, 600.0), vp), Ok(Vec2::new(1.0, -1.0)));
        assert_eq!(pointer_to_ndc(&PointerEvent::new(400.0, 300.0), vp), Ok(Vec2::ZERO));
    }

    #[test]
    fn empty_viewport_is_an_error() {
        let err = pointer_to_ndc(&PointerEvent::new(1.0, 1.0), Viewport::new(0.0, 600.0));
        assert!(matches!(err, Err(InputError::EmptyViewport { .. })));
    }
}
