use glam::Vec3;
use serde::{Deserialize, Serialize};
use shapefall_common::Color;

/// Everything [`SceneContext::bootstrap`](crate::SceneContext::bootstrap)
/// needs to build a scene. The defaults reproduce the stock scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Simulated seconds per sync-loop iteration. There is no catch-up: a
    /// slow frame slows the simulation down.
    pub fixed_step: f32,
    pub gravity: Vec3,
    pub body_mass: f32,

    pub camera_fov_degrees: f32,
    pub camera_near: f32,
    pub camera_far: f32,
    pub camera_position: Vec3,
    pub camera_target: Vec3,
    pub damping_factor: f32,

    /// Side length of the square ground plane.
    pub ground_size: f32,
    pub ground_color: Color,
    pub background: Color,

    pub light_position: Vec3,
    pub light_color: Color,
    pub light_intensity: f32,

    /// Height above the clicked point at which new bodies start.
    pub drop_height: f32,
    /// Oldest pairs are evicted once this many exist. `None` means unbounded.
    pub max_entities: Option<usize>,
    /// Shape factory seed. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            fixed_step: 1.0 / 60.0,
            gravity: Vec3::new(0.0, -9.82, 0.0),
            body_mass: 1.0,
            camera_fov_degrees: 75.0,
            camera_near: 0.1,
            camera_far: 1000.0,
            camera_position: Vec3::new(0.0, 5.0, 10.0),
            camera_target: Vec3::ZERO,
            damping_factor: 0.05,
            ground_size: 20.0,
            ground_color: Color::from_hex(0x808080),
            background: Color::rgb(0.0, 0.0, 0.0),
            light_position: Vec3::new(5.0, 10.0, 5.0),
            light_color: Color::WHITE,
            light_intensity: 1.0,
            drop_height: 1.0,
            max_entities: None,
            seed: None,
        }
    }
}

impl SceneConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_entities(mut self, max: usize) -> Self {
        self.max_entities = Some(max);
        self
    }
}
