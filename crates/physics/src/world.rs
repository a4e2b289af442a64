use crate::shape::CollisionShape;
use glam::{Quat, Vec3};
use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::prelude as rapier;
use serde::{Deserialize, Serialize};
use shapefall_common::Transform;

/// Handle to a rigid body in a [`PhysicsWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub(crate) rapier::RigidBodyHandle);

/// Simulation parameters fixed at world creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    pub gravity: Vec3,
    /// Simulated seconds advanced by each [`PhysicsWorld::step`].
    pub timestep: f32,
    /// Mass assigned to every dynamic body.
    pub body_mass: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.82, 0.0),
            timestep: 1.0 / 60.0,
            body_mass: 1.0,
        }
    }
}

/// The rigid-body simulation.
///
/// Owns every rapier set and pipeline stage. Callers only see [`BodyHandle`]s
/// and [`Transform`]s.
pub struct PhysicsWorld {
    config: PhysicsConfig,
    gravity: rapier::Vector<f32>,
    integration_params: rapier::IntegrationParameters,
    pipeline: rapier::PhysicsPipeline,
    islands: rapier::IslandManager,
    broad_phase: rapier::DefaultBroadPhase,
    narrow_phase: rapier::NarrowPhase,
    impulse_joints: rapier::ImpulseJointSet,
    multibody_joints: rapier::MultibodyJointSet,
    ccd_solver: rapier::CCDSolver,
    bodies: rapier::RigidBodySet,
    colliders: rapier::ColliderSet,
    tick: u64,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl PhysicsWorld {
    pub fn new(config: PhysicsConfig) -> Self {
        let mut integration_params = rapier::IntegrationParameters::default();
        integration_params.dt = config.timestep;

        Self {
            config,
            gravity: to_vector(config.gravity),
            integration_params,
            pipeline: rapier::PhysicsPipeline::new(),
            islands: rapier::IslandManager::new(),
            broad_phase: rapier::DefaultBroadPhase::new(),
            narrow_phase: rapier::NarrowPhase::new(),
            impulse_joints: rapier::ImpulseJointSet::new(),
            multibody_joints: rapier::MultibodyJointSet::new(),
            ccd_solver: rapier::CCDSolver::new(),
            bodies: rapier::RigidBodySet::new(),
            colliders: rapier::ColliderSet::new(),
            tick: 0,
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn gravity(&self) -> Vec3 {
        self.config.gravity
    }

    /// Number of steps taken so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds elapsed: `tick * timestep`.
    pub fn sim_time(&self) -> f64 {
        self.tick as f64 * self.config.timestep as f64
    }

    /// Total rigid bodies, static ones included.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle.0)
    }

    /// Add an infinite static plane. In the plane's local frame the solid side
    /// lies below z = 0, so the surface normal is local +Z; `pose` places and
    /// orients that frame.
    pub fn add_static_plane(&mut self, pose: Transform) -> BodyHandle {
        let body = rapier::RigidBodyBuilder::fixed()
            .position(to_isometry(pose.position, pose.rotation))
            .build();
        let handle = self.bodies.insert(body);
        let collider = rapier::ColliderBuilder::halfspace(rapier::Vector::z_axis()).build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        tracing::debug!(position = ?pose.position, "static plane added");
        BodyHandle(handle)
    }

    /// Add a dynamic body of the configured mass with `shape` at `position`.
    pub fn add_dynamic_body(&mut self, shape: &CollisionShape, position: Vec3) -> BodyHandle {
        let body = rapier::RigidBodyBuilder::dynamic()
            .translation(to_vector(position))
            .build();
        let handle = self.bodies.insert(body);
        let collider = shape.collider_builder().mass(self.config.body_mass).build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        BodyHandle(handle)
    }

    /// Remove a body and its colliders. Returns false if it was not present.
    pub fn remove_body(&mut self, handle: BodyHandle) -> bool {
        self.bodies
            .remove(
                handle.0,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    /// Current world-space pose of a body.
    pub fn body_pose(&self, handle: BodyHandle) -> Option<Transform> {
        self.bodies.get(handle.0).map(|body| {
            let t = body.translation();
            let r = body.rotation();
            Transform::from_position_rotation(
                Vec3::new(t.x, t.y, t.z),
                Quat::from_xyzw(r.i, r.j, r.k, r.w),
            )
        })
    }

    /// Advance the simulation by exactly one timestep.
    pub fn step(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
        self.tick += 1;
    }
}

fn to_vector(v: Vec3) -> rapier::Vector<f32> {
    rapier::Vector::new(v.x, v.y, v.z)
}

fn to_isometry(position: Vec3, rotation: Quat) -> rapier::Isometry<f32> {
    let rotation =
        UnitQuaternion::from_quaternion(Quaternion::new(rotation.w, rotation.x, rotation.y, rotation.z));
    rapier::Isometry::from_parts(
        rapier::Translation::new(position.x, position.y, position.z),
        rotation,
    )
}
