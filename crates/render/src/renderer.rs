use crate::camera::PerspectiveCamera;
use crate::geometry::Geometry;
use crate::scene::Scene;
use std::fmt::Write;

/// Renderer-agnostic interface. All backends implement this trait.
///
/// The renderer reads the scene and a camera, then produces output. It never
/// mutates either; scene truth belongs to whoever owns the [`Scene`].
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame of `scene` as seen from `camera`.
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Self::Output;
}

/// Text renderer for headless runs.
///
/// Produces a human-readable listing of the scene. Used by the CLI and by
/// tests that drive whole frames without a GPU.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

fn geometry_label(geometry: &Geometry) -> &'static str {
    match geometry {
        Geometry::Box { .. } => "box",
        Geometry::Sphere { .. } => "sphere",
        Geometry::Cylinder { radius_top, .. } if *radius_top == 0.0 => "cone",
        Geometry::Cylinder { .. } => "cylinder",
        Geometry::Plane { .. } => "plane",
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> String {
        self.frames += 1;
        let mut out = String::new();
        let _ = writeln!(out, "=== Frame {} ===", self.frames);
        let _ = writeln!(
            out,
            "Meshes: {}  Lights: {}",
            scene.mesh_count(),
            scene.lights().len()
        );
        let (eye, target) = (camera.position, camera.target);
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}",
            eye.x, eye.y, eye.z, target.x, target.y, target.z, camera.fov_degrees
        );

        for (handle, node) in scene.meshes() {
            let p = node.transform.position;
            let _ = writeln!(
                out,
                "  [{:>4}] {:<8} #{:06x} pos=({:.2}, {:.2}, {:.2})",
                handle.0,
                geometry_label(&node.geometry),
                node.material.color.to_hex(),
                p.x,
                p.y,
                p.z
            );
        }

        out
    }
}
