//! Narrow interfaces the AI layer uses to read and drive the physics world
//!
//! Navigation and movement code is written against these traits instead of
//! [`Physics`](super::Physics) so it can be exercised with any backend.

use glam::Vec2;
use hecs::Entity;

use super::category::CollisionCategory;
use super::world::RigidBodyHandle;

/// A body reported by a spatial query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryResult {
    /// Body that was hit
    pub body: RigidBodyHandle,
    /// Entity attached to the body, if any
    pub entity: Option<Entity>,
    /// Contact point for ray queries, body position otherwise
    pub point: Vec2,
    /// Category of the collider that was hit
    pub category: CollisionCategory,
}

/// Read-only queries against the physics world
pub trait SpatialQuery {
    /// First body along the segment `a -> b` whose category is in `mask`
    fn query_first(&self, a: Vec2, b: Vec2, mask: CollisionCategory) -> Option<QueryResult>;

    /// Every body within `radius` of `center` whose category is in `mask`
    fn query_radius(&self, center: Vec2, radius: f32, mask: CollisionCategory) -> Vec<QueryResult>;

    /// Nearest body within `radius` of `point`.
    ///
    /// A radius of zero (or less) tests whether `point` lies inside a body.
    fn query_nearest(&self, point: Vec2, radius: f32, mask: CollisionCategory) -> Option<QueryResult> {
        self.query_nearest_filtered(point, radius, mask, &|_: &QueryResult| true)
    }

    /// Like [`query_nearest`](Self::query_nearest), skipping hits `filter` rejects
    fn query_nearest_filtered(
        &self,
        point: Vec2,
        radius: f32,
        mask: CollisionCategory,
        filter: &dyn Fn(&QueryResult) -> bool,
    ) -> Option<QueryResult>;

    /// Check if anything in `mask` blocks the straight line `a -> b`
    fn is_obstructed(&self, a: Vec2, b: Vec2, mask: CollisionCategory) -> bool {
        self.query_first(a, b, mask).is_some()
    }
}

/// Velocity control over bodies owned by the physics world
pub trait BodyControl {
    /// World position of a body
    fn body_position(&self, body: RigidBodyHandle) -> Option<Vec2>;

    /// Linear velocity of a body
    fn body_velocity(&self, body: RigidBodyHandle) -> Option<Vec2>;

    /// Set the linear velocity of a body
    fn set_body_velocity(&mut self, body: RigidBodyHandle, velocity: Vec2);

    /// Enable or disable a body; disabled bodies neither move nor collide
    fn set_body_enabled(&mut self, body: RigidBodyHandle, enabled: bool);
}

/// Everything a controller needs from physics
pub trait PhysicsAccess: SpatialQuery + BodyControl {}

impl<T: SpatialQuery + BodyControl + ?Sized> PhysicsAccess for T {}
