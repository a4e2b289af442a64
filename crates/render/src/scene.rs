use crate::geometry::Geometry;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use shapefall_common::{Color, Transform};
use std::collections::BTreeMap;

/// Handle to a mesh node in a [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeshHandle(pub u32);

/// Standard lit surface material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub color: Color,
}

impl Material {
    pub fn standard(color: Color) -> Self {
        Self { color }
    }
}

/// A renderable node: geometry + material placed by a transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshNode {
    pub geometry: Geometry,
    pub material: Material,
    pub transform: Transform,
}

impl MeshNode {
    pub fn new(geometry: Geometry, material: Material) -> Self {
        Self {
            geometry,
            material,
            transform: Transform::default(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// Light arriving from `position` towards the origin, like sunlight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
}

impl DirectionalLight {
    /// Unit vector pointing from the scene towards the light.
    pub fn direction_to_light(&self) -> Vec3 {
        self.position.normalize_or(Vec3::Y)
    }
}

/// Flat scene graph: mesh nodes keyed by handle, plus lights.
///
/// Handles are allocated from a counter and never reused, so a handle kept
/// after `remove` simply stops resolving.
#[derive(Debug, Clone)]
pub struct Scene {
    meshes: BTreeMap<MeshHandle, MeshNode>,
    lights: Vec<DirectionalLight>,
    next_handle: u32,
    pub background: Color,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            meshes: BTreeMap::new(),
            lights: Vec::new(),
            next_handle: 0,
            background: Color::rgb(0.0, 0.0, 0.0),
        }
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a mesh node and return its handle.
    pub fn add(&mut self, node: MeshNode) -> MeshHandle {
        let handle = MeshHandle(self.next_handle);
        self.next_handle += 1;
        self.meshes.insert(handle, node);
        tracing::trace!(handle = handle.0, "mesh added");
        handle
    }

    pub fn remove(&mut self, handle: MeshHandle) -> Option<MeshNode> {
        let removed = self.meshes.remove(&handle);
        if removed.is_some() {
            tracing::trace!(handle = handle.0, "mesh removed");
        }
        removed
    }

    pub fn get(&self, handle: MeshHandle) -> Option<&MeshNode> {
        self.meshes.get(&handle)
    }

    pub fn get_mut(&mut self, handle: MeshHandle) -> Option<&mut MeshNode> {
        self.meshes.get_mut(&handle)
    }

    pub fn contains(&self, handle: MeshHandle) -> bool {
        self.meshes.contains_key(&handle)
    }

    /// Mesh nodes in insertion order.
    pub fn meshes(&self) -> impl Iterator<Item = (MeshHandle, &MeshNode)> {
        self.meshes.iter().map(|(h, n)| (*h, n))
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn add_light(&mut self, light: DirectionalLight) {
        self.lights.push(light);
    }

    pub fn lights(&self) -> &[DirectionalLight] {
        &self.lights
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> MeshNode {
        MeshNode::new(
            Geometry::Box {
                width: 1.0,
                height: 1.0,
                depth: 1.0,
            },
            Material::standard(Color::WHITE),
        )
    }

    #[test]
    fn add_and_remove() {
        let mut scene = Scene::new();
        let h = scene.add(unit_box());
        assert_eq!(scene.mesh_count(), 1);
        assert!(scene.contains(h));

        assert!(scene.remove(h).is_some());
        assert_eq!(scene.mesh_count(), 0);
        assert!(scene.get(h).is_none());
    }

    #[test]
    fn handles_are_not_reused() {
        let mut scene = Scene::new();
        let a = scene.add(unit_box());
        scene.remove(a);
        let b = scene.add(unit_box());
        assert_ne!(a, b);
    }

    #[test]
    fn iteration_is_insertion_order() {
        let mut scene = Scene::new();
        let handles: Vec<MeshHandle> = (0..10).map(|_| scene.add(unit_box())).collect();
        let seen: Vec<MeshHandle> = scene.meshes().map(|(h, _)| h).collect();
        assert_eq!(seen, handles);
    }

    #[test]
    fn get_mut_updates_transform() {
        let mut scene = Scene::new();
        let h = scene.add(unit_box());
        scene.get_mut(h).unwrap().transform.position = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(scene.get(h).unwrap().transform.position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn light_direction_is_normalized() {
        let light = DirectionalLight {
            color: Color::WHITE,
            intensity: 1.0,
            position: Vec3::new(5.0, 10.0, 5.0),
        };
        assert!((light.direction_to_light().length() - 1.0).abs() < 1e-6);
    }
}
