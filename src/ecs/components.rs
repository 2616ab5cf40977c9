//! Common ECS components

use glam::Vec2;

use crate::physics::RigidBodyHandle;

/// Transform component for 2D position and rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in world space
    pub position: Vec2,
    /// Rotation in radians, counter-clockwise from +X
    pub rotation: f32,
}

impl Transform {
    /// Create a new transform at the origin
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transform with just a position
    #[must_use]
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Unit vector the transform is facing
    #[must_use]
    pub fn forward(&self) -> Vec2 {
        Vec2::from_angle(self.rotation)
    }

    /// Translate by a delta
    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// Rotate to face a target position. Does nothing if already on it.
    pub fn look_at(&mut self, target: Vec2) {
        let to_target = target - self.position;
        if to_target.length_squared() > f32::EPSILON {
            self.rotation = to_target.y.atan2(to_target.x);
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
        }
    }
}

/// Hit points of a destructible entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}

impl Health {
    #[must_use]
    pub fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    /// Check if the entity has any health left
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    /// Subtract damage, clamped at zero. Returns true if this killed it.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        let was_alive = self.is_alive();
        self.current = (self.current - amount).max(0);
        was_alive && !self.is_alive()
    }
}

/// Link from an entity to its rigid body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicsBody(pub RigidBodyHandle);

/// Name component for debugging
#[derive(Debug, Clone)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}
