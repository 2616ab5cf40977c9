//! 2D physics world using rapier2d

use glam::Vec2;
use hecs::Entity;
use rapier2d::parry::shape::Ball;
use rapier2d::prelude::*;

use super::category::CollisionCategory;
use super::query::{BodyControl, QueryResult, SpatialQuery};
use crate::ecs::{PhysicsBody, Transform, World};

/// Handle to a rigid body in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RigidBodyHandle(pub rapier2d::dynamics::RigidBodyHandle);

/// Handle to a collider in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderHandle(pub rapier2d::geometry::ColliderHandle);

/// Pack an entity into body user data
fn entity_to_user_data(entity: Entity) -> u128 {
    u128::from(entity.to_bits().get())
}

/// Recover an entity from body user data
fn user_data_to_entity(user_data: u128) -> Option<Entity> {
    u64::try_from(user_data).ok().and_then(Entity::from_bits)
}

/// Physics world manager
pub struct Physics {
    /// Gravity vector
    pub gravity: Vec2,
    /// Physics pipeline
    pipeline: PhysicsPipeline,
    /// Island manager
    island_manager: IslandManager,
    /// Broad phase
    broad_phase: DefaultBroadPhase,
    /// Narrow phase
    narrow_phase: NarrowPhase,
    /// Rigid body set
    rigid_body_set: RigidBodySet,
    /// Collider set
    collider_set: ColliderSet,
    /// Impulse joint set
    impulse_joint_set: ImpulseJointSet,
    /// Multibody joint set
    multibody_joint_set: MultibodyJointSet,
    /// CCD solver
    ccd_solver: CCDSolver,
    /// Query pipeline for spatial queries
    query_pipeline: QueryPipeline,
    /// Integration parameters
    integration_parameters: IntegrationParameters,
}

impl Physics {
    /// Create a new top-down physics world (no gravity)
    #[must_use]
    pub fn new() -> Self {
        Self::with_gravity(Vec2::ZERO)
    }

    /// Create a new physics world with custom gravity
    #[must_use]
    pub fn with_gravity(gravity: Vec2) -> Self {
        Self {
            gravity,
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            integration_parameters: IntegrationParameters::default(),
        }
    }

    /// Step the physics simulation
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;

        self.pipeline.step(
            &vector![self.gravity.x, self.gravity.y],
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Create a static rigid body (level geometry)
    pub fn create_static_body(&mut self, position: Vec2) -> RigidBodyHandle {
        let body = RigidBodyBuilder::fixed()
            .translation(vector![position.x, position.y])
            .build();

        RigidBodyHandle(self.rigid_body_set.insert(body))
    }

    /// Create a dynamic rigid body driven by velocity.
    ///
    /// Rotation is locked; AI code owns the heading. The entity, when
    /// given, is reported back by spatial queries.
    pub fn create_dynamic_body(&mut self, position: Vec2, entity: Option<Entity>) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![position.x, position.y])
            .lock_rotations()
            .user_data(entity.map_or(0, entity_to_user_data))
            .build();

        RigidBodyHandle(self.rigid_body_set.insert(body))
    }

    /// Add a box collider to a rigid body
    pub fn add_box_collider(
        &mut self,
        body: RigidBodyHandle,
        half_extents: Vec2,
        category: CollisionCategory,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y)
            .collision_groups(category.interaction_groups())
            .build();

        self.insert_collider(collider, body)
    }

    /// Add a circle collider to a rigid body
    pub fn add_circle_collider(
        &mut self,
        body: RigidBodyHandle,
        radius: f32,
        category: CollisionCategory,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::ball(radius)
            .collision_groups(category.interaction_groups())
            .build();

        self.insert_collider(collider, body)
    }

    /// Add a convex polygon collider, vertices relative to the body.
    ///
    /// Returns `None` if the points do not form a convex hull.
    pub fn add_polygon_collider(
        &mut self,
        body: RigidBodyHandle,
        vertices: &[Vec2],
        category: CollisionCategory,
    ) -> Option<ColliderHandle> {
        let points: Vec<Point<Real>> = vertices.iter().map(|v| point![v.x, v.y]).collect();
        let collider = ColliderBuilder::convex_hull(&points)?
            .collision_groups(category.interaction_groups())
            .build();

        Some(self.insert_collider(collider, body))
    }

    fn insert_collider(&mut self, collider: Collider, body: RigidBodyHandle) -> ColliderHandle {
        let handle = ColliderHandle(self.collider_set.insert_with_parent(
            collider,
            body.0,
            &mut self.rigid_body_set,
        ));
        // Queries must see new geometry before the next step
        self.query_pipeline.update(&self.collider_set);
        handle
    }

    /// Entity attached to a body
    #[must_use]
    pub fn entity_of(&self, body: RigidBodyHandle) -> Option<Entity> {
        self.rigid_body_set
            .get(body.0)
            .and_then(|rb| user_data_to_entity(rb.user_data))
    }

    /// Number of bodies in the world
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    /// Copy body positions into the transforms of their entities
    pub fn sync_transforms(&self, world: &mut World) {
        for (_, (body, transform)) in world.query_mut::<(&PhysicsBody, &mut Transform)>() {
            if let Some(rb) = self.rigid_body_set.get(body.0.0) {
                let pos = rb.translation();
                transform.position = Vec2::new(pos.x, pos.y);
            }
        }
    }

    /// Remove a rigid body and its colliders
    pub fn remove_body(&mut self, body: RigidBodyHandle) {
        self.rigid_body_set.remove(
            body.0,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        self.query_pipeline.update(&self.collider_set);
    }

    /// Teleport a body, e.g. when spawning or in tests
    pub fn set_body_position(&mut self, body: RigidBodyHandle, position: Vec2) {
        let Some(rb) = self.rigid_body_set.get_mut(body.0) else {
            return;
        };
        rb.set_translation(vector![position.x, position.y], true);

        // Colliders follow on the next step; queries need them now
        let body_pose = *rb.position();
        for &handle in rb.colliders() {
            if let Some(collider) = self.collider_set.get_mut(handle) {
                let pose = collider
                    .position_wrt_parent()
                    .map_or(body_pose, |local| body_pose * local);
                collider.set_position(pose);
            }
        }
        self.query_pipeline.update(&self.collider_set);
    }

    fn filter(mask: CollisionCategory) -> QueryFilter<'static> {
        QueryFilter::new().groups(mask.query_groups())
    }

    fn result_for(&self, handle: rapier2d::geometry::ColliderHandle, point: Option<Vec2>) -> Option<QueryResult> {
        let collider = self.collider_set.get(handle)?;
        let body_handle = collider.parent()?;
        let rb = self.rigid_body_set.get(body_handle)?;
        let body_position = Vec2::new(rb.translation().x, rb.translation().y);

        Some(QueryResult {
            body: RigidBodyHandle(body_handle),
            entity: user_data_to_entity(rb.user_data),
            point: point.unwrap_or(body_position),
            category: CollisionCategory::from_group(collider.collision_groups().memberships),
        })
    }
}

impl Default for Physics {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialQuery for Physics {
    fn query_first(&self, a: Vec2, b: Vec2, mask: CollisionCategory) -> Option<QueryResult> {
        let direction = b - a;
        if direction.length_squared() <= f32::EPSILON {
            return None;
        }

        // Unnormalised direction, so time of impact 1.0 is the far end
        let ray = Ray::new(point![a.x, a.y], vector![direction.x, direction.y]);
        let (handle, toi) = self.query_pipeline.cast_ray(
            &self.rigid_body_set,
            &self.collider_set,
            &ray,
            1.0,
            true,
            Self::filter(mask),
        )?;

        let hit = ray.point_at(toi);
        self.result_for(handle, Some(Vec2::new(hit.x, hit.y)))
    }

    fn query_radius(&self, center: Vec2, radius: f32, mask: CollisionCategory) -> Vec<QueryResult> {
        if radius <= 0.0 {
            return Vec::new();
        }

        let shape = Ball::new(radius);
        let position = Isometry::translation(center.x, center.y);
        let mut results = Vec::new();

        self.query_pipeline.intersections_with_shape(
            &self.rigid_body_set,
            &self.collider_set,
            &position,
            &shape,
            Self::filter(mask),
            |handle| {
                if let Some(result) = self.result_for(handle, None) {
                    results.push(result);
                }
                true
            },
        );

        results
    }

    fn query_nearest_filtered(
        &self,
        point: Vec2,
        radius: f32,
        mask: CollisionCategory,
        filter: &dyn Fn(&QueryResult) -> bool,
    ) -> Option<QueryResult> {
        if radius <= 0.0 {
            let mut found = None;
            self.query_pipeline.intersections_with_point(
                &self.rigid_body_set,
                &self.collider_set,
                &point![point.x, point.y],
                Self::filter(mask),
                |handle| {
                    found = self.result_for(handle, Some(point)).filter(|hit| filter(hit));
                    found.is_none()
                },
            );
            return found;
        }

        self.query_radius(point, radius, mask)
            .into_iter()
            .filter(|hit| filter(hit))
            .min_by(|a, b| {
                a.point
                    .distance_squared(point)
                    .total_cmp(&b.point.distance_squared(point))
            })
    }
}

impl BodyControl for Physics {
    fn body_position(&self, body: RigidBodyHandle) -> Option<Vec2> {
        self.rigid_body_set.get(body.0).map(|rb| {
            let pos = rb.translation();
            Vec2::new(pos.x, pos.y)
        })
    }

    fn body_velocity(&self, body: RigidBodyHandle) -> Option<Vec2> {
        self.rigid_body_set.get(body.0).map(|rb| {
            let vel = rb.linvel();
            Vec2::new(vel.x, vel.y)
        })
    }

    fn set_body_velocity(&mut self, body: RigidBodyHandle, velocity: Vec2) {
        if let Some(rb) = self.rigid_body_set.get_mut(body.0) {
            rb.set_linvel(vector![velocity.x, velocity.y], true);
        }
    }

    fn set_body_enabled(&mut self, body: RigidBodyHandle, enabled: bool) {
        if let Some(rb) = self.rigid_body_set.get_mut(body.0) {
            rb.set_enabled(enabled);
        }
    }
}
