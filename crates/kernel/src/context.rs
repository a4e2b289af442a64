use crate::config::SceneConfig;
use crate::registry::{EntityIndex, EntityRegistry};
use crate::session::SessionSummary;
use glam::{Quat, Vec2, Vec3};
use serde::Serialize;
use shapefall_common::{Transform, Viewport, WorldPoint};
use shapefall_input::{GroundSurface, InputError, PointerEvent, map_pointer_to_world};
use shapefall_physics::{BodyHandle, PhysicsConfig, PhysicsWorld};
use shapefall_render::{
    DirectionalLight, Geometry, Material, MeshHandle, MeshNode, OrbitControls, PerspectiveCamera, Renderer,
    Scene,
};
use shapefall_shapes::{ShapeFactory, ShapeKind};
use std::f32::consts::FRAC_PI_2;
use std::fmt;

/// Which half of a paired entity went missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MissingHalf {
    Mesh,
    Body,
}

impl fmt::Display for MissingHalf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mesh => "mesh",
            Self::Body => "body",
        })
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SyncError {
    #[error("entity {index} has no {missing}; scene and physics are out of step")]
    Desynchronized { index: EntityIndex, missing: MissingHalf },
}

/// Result of a successful spawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnedEntity {
    pub index: EntityIndex,
    pub kind: ShapeKind,
    pub mesh: MeshHandle,
    pub body: BodyHandle,
    /// The ground point that was clicked; the mesh starts here.
    pub point: WorldPoint,
    /// Entity removed to stay within `max_entities`, if any.
    pub evicted: Option<EntityIndex>,
}

/// All state of one running scene: render side, physics side, and the
/// registry pairing them.
pub struct SceneContext {
    config: SceneConfig,
    scene: Scene,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    physics: PhysicsWorld,
    factory: ShapeFactory,
    registry: EntityRegistry,
    ground: GroundSurface,
    ground_mesh: MeshHandle,
    ground_body: BodyHandle,
}

impl SceneContext {
    /// Build the static environment. The render ground and the physics ground
    /// share one pose, so what is drawn is what bodies land on.
    pub fn bootstrap(config: SceneConfig, viewport: Viewport) -> Self {
        let mut scene = Scene::new();
        scene.background = config.background;

        let camera = PerspectiveCamera {
            position: config.camera_position,
            target: config.camera_target,
            up: Vec3::Y,
            fov_degrees: config.camera_fov_degrees,
            aspect: viewport.aspect(),
            near: config.camera_near,
            far: config.camera_far,
        };

        scene.add_light(DirectionalLight {
            color: config.light_color,
            intensity: config.light_intensity,
            position: config.light_position,
        });

        // Planes face +Z in their local frame; tip it over to face +Y.
        let ground_pose = Transform::from_position_rotation(Vec3::ZERO, Quat::from_rotation_x(-FRAC_PI_2));
        let ground_node = MeshNode::new(
            Geometry::Plane {
                width: config.ground_size,
                height: config.ground_size,
            },
            Material::standard(config.ground_color),
        )
        .with_transform(ground_pose);
        let ground = GroundSurface::new(
            ground_pose.position.y,
            Vec2::new(ground_pose.position.x, ground_pose.position.z),
            Vec2::splat(config.ground_size),
        );
        let ground_mesh = scene.add(ground_node);

        let mut physics = PhysicsWorld::new(PhysicsConfig {
            gravity: config.gravity,
            timestep: config.fixed_step,
            body_mass: config.body_mass,
        });
        let ground_body = physics.add_static_plane(ground_pose);

        let controls = OrbitControls::new(config.camera_target).with_damping(config.damping_factor);
        let factory = config.seed.map_or_else(ShapeFactory::new, ShapeFactory::with_seed);

        tracing::info!(
            width = viewport.width,
            height = viewport.height,
            seed = ?config.seed,
            max_entities = ?config.max_entities,
            "scene bootstrapped"
        );

        Self {
            config,
            scene,
            camera,
            controls,
            physics,
            factory,
            registry: EntityRegistry::new(),
            ground,
            ground_mesh,
            ground_body,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    #[cfg(test)]
    pub(crate) fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn ground(&self) -> &GroundSurface {
        &self.ground
    }

    pub fn ground_mesh(&self) -> MeshHandle {
        self.ground_mesh
    }

    pub fn ground_body(&self) -> BodyHandle {
        self.ground_body
    }

    /// Ground point under a pointer event, seen through the current camera.
    pub fn map_click(&self, event: &PointerEvent, viewport: Viewport) -> Result<Option<WorldPoint>, InputError> {
        map_pointer_to_world(event, viewport, &self.camera, &self.ground)
    }

    /// Create a random shape at `point`: the mesh exactly at the point, the
    /// body `drop_height` above it. Mesh, body and registry entry are added
    /// together, after any eviction the entity cap calls for.
    pub fn spawn_at(&mut self, point: WorldPoint) -> SpawnedEntity {
        let mut evicted = None;
        if let Some(max) = self.config.max_entities.map(|m| m.max(1)) {
            while self.registry.len() >= max {
                match self.evict_oldest() {
                    Some(index) => evicted = Some(index),
                    None => break,
                }
            }
        }

        let pair = self.factory.create_random_shape();
        let mesh = self.scene.add(
            MeshNode::new(pair.render.geometry, pair.render.material).with_transform(Transform::from_position(point)),
        );
        let body = self
            .physics
            .add_dynamic_body(&pair.collision, point + Vec3::Y * self.config.drop_height);
        let index = self.registry.push(pair.kind(), mesh, body);

        tracing::debug!(
            index = index.0,
            kind = pair.kind().name(),
            x = point.x,
            z = point.z,
            "entity spawned"
        );

        SpawnedEntity {
            index,
            kind: pair.kind(),
            mesh,
            body,
            point,
            evicted,
        }
    }

    fn evict_oldest(&mut self) -> Option<EntityIndex> {
        let entity = self.registry.pop_oldest()?;
        self.scene.remove(entity.mesh);
        self.physics.remove_body(entity.body);
        tracing::debug!(index = entity.index.0, kind = entity.kind.name(), "entity evicted");
        Some(entity.index)
    }

    /// One loop iteration: step physics once, copy every body pose onto its
    /// mesh, advance camera damping, then render.
    ///
    /// Fails without rendering if any registry entry has lost its mesh or
    /// body.
    pub fn sync_frame<R: Renderer>(&mut self, renderer: &mut R) -> Result<R::Output, SyncError> {
        self.physics.step();

        for entity in self.registry.iter() {
            let pose = self
                .physics
                .body_pose(entity.body)
                .ok_or_else(|| desynchronized(entity.index, MissingHalf::Body))?;
            let node = self
                .scene
                .get_mut(entity.mesh)
                .ok_or_else(|| desynchronized(entity.index, MissingHalf::Mesh))?;
            node.transform.position = pose.position;
            node.transform.rotation = pose.rotation;
        }

        self.controls.update(&mut self.camera);
        tracing::trace!(tick = self.physics.tick(), entities = self.registry.len(), "frame synced");
        Ok(renderer.render(&self.scene, &self.camera))
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            tick: self.physics.tick(),
            sim_time: self.physics.sim_time(),
            entity_count: self.registry.len(),
            scene_meshes: self.scene.mesh_count(),
            physics_bodies: self.physics.body_count(),
            torn_down: false,
        }
    }
}

fn desynchronized(index: EntityIndex, missing: MissingHalf) -> SyncError {
    tracing::error!(index = index.0, %missing, "registry entry lost half of its pair");
    SyncError::Desynchronized { index, missing }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapefall_render::DebugTextRenderer;

    const VIEWPORT: Viewport = Viewport {
        width: 1280.0,
        height: 720.0,
    };

    fn context() -> SceneContext {
        SceneContext::bootstrap(SceneConfig::default().with_seed(11), VIEWPORT)
    }

    #[test]
    fn bootstrap_builds_static_environment() {
        let ctx = context();
        assert_eq!(ctx.scene().mesh_count(), 1);
        assert_eq!(ctx.scene().lights().len(), 1);
        assert_eq!(ctx.physics().body_count(), 1);
        assert!(ctx.registry().is_empty());

        let cam = ctx.camera();
        assert_eq!(cam.fov_degrees, 75.0);
        assert_eq!(cam.near, 0.1);
        assert_eq!(cam.far, 1000.0);
        assert!((cam.aspect - 1280.0 / 720.0).abs() < 1e-6);
        assert_eq!(cam.position, Vec3::new(0.0, 5.0, 10.0));

        let light = ctx.scene().lights()[0];
        assert_eq!(light.position, Vec3::new(5.0, 10.0, 5.0));
        assert_eq!(light.intensity, 1.0);
        assert_eq!(ctx.physics().gravity(), Vec3::new(0.0, -9.82, 0.0));
    }

    #[test]
    fn render_and_physics_ground_share_pose() {
        let ctx = context();
        let mesh_pose = ctx.scene().get(ctx.ground_mesh()).unwrap().transform;
        let body_pose = ctx.physics().body_pose(ctx.ground_body()).unwrap();
        assert!((mesh_pose.position - body_pose.position).length() < 1e-6);
        assert!(mesh_pose.rotation.angle_between(body_pose.rotation) < 1e-5);
        assert_eq!(ctx.ground().height, 0.0);
        assert_eq!(ctx.ground().min, Vec2::splat(-10.0));
        assert_eq!(ctx.ground().max, Vec2::splat(10.0));
    }

    #[test]
    fn spawn_places_mesh_at_point_and_body_above() {
        let mut ctx = context();
        let point = Vec3::new(2.0, 0.0, -3.0);
        let spawned = ctx.spawn_at(point);

        assert_eq!(ctx.scene().get(spawned.mesh).unwrap().transform.position, point);
        let body = ctx.physics().body_pose(spawned.body).unwrap();
        assert_eq!(body.position, Vec3::new(2.0, 1.0, -3.0));
        assert_eq!(spawned.index, EntityIndex(0));
        assert_eq!(spawned.evicted, None);
    }

    #[test]
    fn counts_stay_paired() {
        let mut ctx = context();
        let mut renderer = DebugTextRenderer::default();
        for i in 0..12 {
            ctx.spawn_at(Vec3::new(i as f32 - 6.0, 0.0, 0.0));
            if i % 3 == 0 {
                ctx.sync_frame(&mut renderer).unwrap();
            }
            let n = ctx.registry().len();
            assert_eq!(n, i + 1);
            assert_eq!(ctx.scene().mesh_count() - 1, n);
            assert_eq!(ctx.physics().body_count() - 1, n);
        }
    }

    #[test]
    fn one_frame_after_spawn_mesh_takes_body_pose() {
        let mut ctx = context();
        let point = Vec3::new(1.5, 0.0, 2.5);
        let spawned = ctx.spawn_at(point);
        ctx.sync_frame(&mut DebugTextRenderer::default()).unwrap();

        let mesh = ctx.scene().get(spawned.mesh).unwrap().transform;
        let body = ctx.physics().body_pose(spawned.body).unwrap();
        assert_eq!(mesh.position, body.position);
        assert_eq!(mesh.rotation, body.rotation);
        assert!((mesh.position.x - point.x).abs() < 1e-5);
        assert!((mesh.position.z - point.z).abs() < 1e-5);
        assert!(mesh.position.y < point.y + 1.0);
    }

    #[test]
    fn empty_registry_sync_touches_nothing() {
        let mut ctx = context();
        let before: Vec<_> = ctx.scene().meshes().map(|(h, n)| (h, n.transform)).collect();
        ctx.sync_frame(&mut DebugTextRenderer::default()).unwrap();
        let after: Vec<_> = ctx.scene().meshes().map(|(h, n)| (h, n.transform)).collect();
        assert_eq!(before, after);
        assert_eq!(ctx.physics().tick(), 1);
    }

    #[test]
    fn sync_steps_exactly_once_per_frame() {
        let mut ctx = context();
        let mut renderer = DebugTextRenderer::default();
        for _ in 0..5 {
            ctx.sync_frame(&mut renderer).unwrap();
        }
        assert_eq!(ctx.physics().tick(), 5);
        assert_eq!(renderer.frames(), 5);
    }

    #[test]
    fn missing_mesh_is_desync() {
        let mut ctx = context();
        let spawned = ctx.spawn_at(Vec3::ZERO);
        ctx.scene.remove(spawned.mesh);

        let mut renderer = DebugTextRenderer::default();
        let err = ctx.sync_frame(&mut renderer).unwrap_err();
        assert_eq!(
            err,
            SyncError::Desynchronized {
                index: spawned.index,
                missing: MissingHalf::Mesh
            }
        );
        assert_eq!(renderer.frames(), 0);
    }

    #[test]
    fn missing_body_is_desync() {
        let mut ctx = context();
        let spawned = ctx.spawn_at(Vec3::ZERO);
        ctx.physics.remove_body(spawned.body);
        let err = ctx.sync_frame(&mut DebugTextRenderer::default()).unwrap_err();
        assert!(matches!(
            err,
            SyncError::Desynchronized {
                missing: MissingHalf::Body,
                ..
            }
        ));
    }

    #[test]
    fn cap_evicts_oldest_pair() {
        let mut ctx = SceneContext::bootstrap(SceneConfig::default().with_seed(5).with_max_entities(3), VIEWPORT);
        let first = ctx.spawn_at(Vec3::ZERO);
        for i in 1..10 {
            let spawned = ctx.spawn_at(Vec3::new(i as f32, 0.0, 0.0));
            assert!(ctx.registry().len() <= 3);
            assert_eq!(ctx.scene().mesh_count() - 1, ctx.registry().len());
            assert_eq!(ctx.physics().body_count() - 1, ctx.registry().len());
            if i >= 3 {
                assert_eq!(spawned.evicted, Some(EntityIndex(i - 3)));
            }
        }
        assert!(!ctx.scene().contains(first.mesh));
        assert!(!ctx.physics().contains(first.body));
        assert_eq!(ctx.registry().oldest().unwrap().index, EntityIndex(7));
        ctx.sync_frame(&mut DebugTextRenderer::default()).unwrap();
    }

    #[test]
    fn zero_cap_keeps_newest() {
        let mut ctx = SceneContext::bootstrap(SceneConfig::default().with_max_entities(0), VIEWPORT);
        ctx.spawn_at(Vec3::ZERO);
        let second = ctx.spawn_at(Vec3::X);
        assert_eq!(ctx.registry().len(), 1);
        assert_eq!(ctx.registry().oldest().unwrap().index, second.index);
    }

    #[test]
    fn same_seed_same_shapes() {
        let mut a = context();
        let mut b = context();
        for _ in 0..20 {
            assert_eq!(a.spawn_at(Vec3::ZERO).kind, b.spawn_at(Vec3::ZERO).kind);
        }
    }
}
