//! World wrapper around hecs

use glam::Vec2;
use hecs::Entity;

use super::components::{Health, Transform};

/// Game world containing all entities and components
pub struct World {
    /// The underlying hecs world
    pub inner: hecs::World,
}

impl World {
    /// Create a new empty world
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: hecs::World::new(),
        }
    }

    /// Spawn an entity with the given components
    pub fn spawn(&mut self, components: impl hecs::DynamicBundle) -> Entity {
        self.inner.spawn(components)
    }

    /// Add components to an existing entity
    pub fn insert(
        &mut self,
        entity: Entity,
        components: impl hecs::DynamicBundle,
    ) -> Result<(), hecs::NoSuchEntity> {
        self.inner.insert(entity, components)
    }

    /// Despawn an entity
    pub fn despawn(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        self.inner.despawn(entity)
    }

    /// Get a reference to a component
    pub fn get<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::Ref<'_, T>, hecs::ComponentError> {
        self.inner.get::<&T>(entity)
    }

    /// Get a mutable reference to a component
    pub fn get_mut<T: hecs::Component>(
        &mut self,
        entity: Entity,
    ) -> Result<hecs::RefMut<'_, T>, hecs::ComponentError> {
        self.inner.get::<&mut T>(entity)
    }

    /// Check if an entity exists
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.inner.contains(entity)
    }

    /// World position of an entity, if it has a transform
    #[must_use]
    pub fn world_position(&self, entity: Entity) -> Option<Vec2> {
        self.get::<Transform>(entity).ok().map(|t| t.position)
    }

    /// Check if an entity exists and, when it has health, is not depleted
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        if !self.contains(entity) {
            return false;
        }
        self.get::<Health>(entity)
            .map(|health| health.is_alive())
            .unwrap_or(true)
    }

    /// Get the number of entities
    #[must_use]
    pub fn len(&self) -> u32 {
        self.inner.len()
    }

    /// Check if the world is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Clear all entities from the world
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Query for entities with specific components
    pub fn query<Q: hecs::Query>(&self) -> hecs::QueryBorrow<'_, Q> {
        self.inner.query::<Q>()
    }

    /// Query for entities with specific components (mutable)
    pub fn query_mut<Q: hecs::Query>(&mut self) -> hecs::QueryMut<'_, Q> {
        self.inner.query_mut::<Q>()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
