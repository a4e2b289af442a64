use serde::{Deserialize, Serialize};
use shapefall_physics::BodyHandle;
use shapefall_render::MeshHandle;
use shapefall_shapes::ShapeKind;
use std::collections::VecDeque;
use std::fmt;

/// Stable index of a paired entity. Indices are assigned in spawn order and
/// never reused, even after the entity they named has been evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityIndex(pub u64);

impl fmt::Display for EntityIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One spawned shape: its mesh in the scene and its body in the physics world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairedEntity {
    pub index: EntityIndex,
    pub kind: ShapeKind,
    pub mesh: MeshHandle,
    pub body: BodyHandle,
}

/// Arena of paired entities in spawn order.
///
/// Entries only join at the back and only leave from the front, so the
/// entry for index `i` lives at slot `i - base`.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entries: VecDeque<PairedEntity>,
    base: u64,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index the next [`push`](Self::push) will assign.
    pub fn next_index(&self) -> EntityIndex {
        EntityIndex(self.base + self.entries.len() as u64)
    }

    pub(crate) fn push(&mut self, kind: ShapeKind, mesh: MeshHandle, body: BodyHandle) -> EntityIndex {
        let index = self.next_index();
        self.entries.push_back(PairedEntity {
            index,
            kind,
            mesh,
            body,
        });
        index
    }

    /// Remove the oldest entry.
    pub(crate) fn pop_oldest(&mut self) -> Option<PairedEntity> {
        let entry = self.entries.pop_front()?;
        self.base += 1;
        Some(entry)
    }

    pub fn get(&self, index: EntityIndex) -> Option<&PairedEntity> {
        let slot = index.0.checked_sub(self.base)?;
        self.entries.get(usize::try_from(slot).ok()?)
    }

    pub fn oldest(&self) -> Option<&PairedEntity> {
        self.entries.front()
    }

    /// Entries in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &PairedEntity> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use shapefall_physics::{CollisionShape, PhysicsWorld};

    fn fill(registry: &mut EntityRegistry, n: u32) -> Vec<EntityIndex> {
        let mut world = PhysicsWorld::default();
        (0..n)
            .map(|i| {
                let body = world.add_dynamic_body(&CollisionShape::Ball { radius: 0.5 }, Vec3::Y);
                registry.push(ShapeKind::Sphere, MeshHandle(i), body)
            })
            .collect()
    }

    #[test]
    fn indices_follow_spawn_order() {
        let mut registry = EntityRegistry::new();
        let indices = fill(&mut registry, 4);
        assert_eq!(indices, (0..4).map(EntityIndex).collect::<Vec<_>>());
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.get(EntityIndex(2)).unwrap().mesh, MeshHandle(2));
        assert!(registry.get(EntityIndex(4)).is_none());
    }

    #[test]
    fn eviction_keeps_remaining_indices_valid() {
        let mut registry = EntityRegistry::new();
        fill(&mut registry, 3);

        let evicted = registry.pop_oldest().unwrap();
        assert_eq!(evicted.index, EntityIndex(0));
        assert!(registry.get(EntityIndex(0)).is_none());
        assert_eq!(registry.get(EntityIndex(1)).unwrap().mesh, MeshHandle(1));
        assert_eq!(registry.oldest().unwrap().index, EntityIndex(1));
        assert_eq!(registry.next_index(), EntityIndex(3));
    }

    #[test]
    fn popping_empty_registry() {
        let mut registry = EntityRegistry::new();
        assert!(registry.pop_oldest().is_none());
        assert_eq!(registry.next_index(), EntityIndex(0));
    }
}
