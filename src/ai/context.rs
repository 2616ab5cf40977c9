//! Everything a controller may touch during one tick

use glam::Vec2;
use hecs::Entity;

use super::sprite::SpriteControl;
use super::target::TargetSystem;
use crate::core::{EventQueue, UpdateContext};
use crate::ecs::World;
use crate::navigation::NavigationSystem;
use crate::physics::{PhysicsAccess, RigidBodyHandle};

/// Borrowed view of the simulation handed to enemy controllers.
///
/// The world and target registry are read-only; bodies, navigation, sprites
/// and events are written through their narrow interfaces.
pub struct AiContext<'a> {
    pub update: UpdateContext,
    pub world: &'a World,
    pub physics: &'a mut dyn PhysicsAccess,
    pub navigation: &'a mut NavigationSystem,
    pub targets: &'a TargetSystem,
    pub sprites: &'a mut dyn SpriteControl,
    pub events: &'a mut EventQueue,
}

impl AiContext<'_> {
    /// World position of an entity, falling back to its body
    #[must_use]
    pub fn position_of(&self, entity: Entity, body: RigidBodyHandle) -> Vec2 {
        self.world
            .world_position(entity)
            .or_else(|| self.physics.body_position(body))
            .unwrap_or(Vec2::ZERO)
    }
}
