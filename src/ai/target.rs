//! Target registration and acquisition
//!
//! Entities that enemies may hunt register with the [`TargetSystem`].
//! Controllers acquire an [`AcquiredTarget`], a weak handle that resolves
//! the target's live position each time it is asked.

use glam::Vec2;
use hecs::Entity;
use log::debug;
use thiserror::Error;

use crate::ecs::World;
use crate::physics::{CollisionCategory, SpatialQuery};

/// Errors from using a target handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TargetError {
    /// The handle holds no target, or the target is gone
    #[error("target handle is invalid")]
    Invalid,
}

/// What enemies go after
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetingMode {
    /// The closest registered target
    #[default]
    Player,
    /// The designated package, wherever it is
    Package,
}

/// A registered target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetComponent {
    pub entity: Entity,
    /// Category used for line of sight checks
    pub category: CollisionCategory,
    /// Lower values are considered first
    pub priority: i32,
}

/// Snapshot of a target lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FindTargetResult {
    pub entity: Entity,
    pub position: Vec2,
    pub category: CollisionCategory,
}

/// Weak reference to a target entity.
///
/// Never owns the entity. Check [`is_valid`](Self::is_valid) every tick
/// before using it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AcquiredTarget {
    entity: Option<Entity>,
    category: CollisionCategory,
}

impl AcquiredTarget {
    /// A handle that refers to nothing
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Handle to a specific entity
    #[must_use]
    pub fn new(entity: Entity, category: CollisionCategory) -> Self {
        Self {
            entity: Some(entity),
            category,
        }
    }

    /// Target entity, if the handle was ever set
    #[must_use]
    pub fn entity(&self) -> Option<Entity> {
        self.entity
    }

    /// Category of the target
    #[must_use]
    pub fn category(&self) -> CollisionCategory {
        self.category
    }

    /// Check the target still exists and is alive
    #[must_use]
    pub fn is_valid(&self, world: &World) -> bool {
        self.entity.is_some_and(|entity| world.is_alive(entity))
    }

    /// Current world position of the target
    ///
    /// # Errors
    ///
    /// Returns [`TargetError::Invalid`] if the handle is not valid.
    pub fn position(&self, world: &World) -> Result<Vec2, TargetError> {
        self.entity
            .filter(|&entity| world.is_alive(entity))
            .and_then(|entity| world.world_position(entity))
            .ok_or(TargetError::Invalid)
    }

    /// Check the target is within `radius` of `point`
    ///
    /// # Errors
    ///
    /// Returns [`TargetError::Invalid`] if the handle is not valid.
    pub fn is_within_distance(&self, world: &World, point: Vec2, radius: f32) -> Result<bool, TargetError> {
        Ok(self.position(world)?.distance(point) <= radius)
    }

    /// Drop the reference
    pub fn invalidate(&mut self) {
        self.entity = None;
    }
}

/// Registry of everything enemies may target
#[derive(Debug, Default)]
pub struct TargetSystem {
    targets: Vec<TargetComponent>,
    dirty: bool,
    mode: TargetingMode,
    package: Option<(Entity, CollisionCategory)>,
}

impl TargetSystem {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity as a target with priority 0
    pub fn allocate_target(&mut self, entity: Entity, category: CollisionCategory) {
        self.release_target(entity);
        self.targets.push(TargetComponent {
            entity,
            category,
            priority: 0,
        });
        self.dirty = true;
    }

    /// Remove an entity from the registry. Returns true if it was there.
    pub fn release_target(&mut self, entity: Entity) -> bool {
        let before = self.targets.len();
        self.targets.retain(|target| target.entity != entity);
        before != self.targets.len()
    }

    /// Change the priority of a registered target
    pub fn set_target_priority(&mut self, entity: Entity, priority: i32) {
        if let Some(target) = self.targets.iter_mut().find(|t| t.entity == entity) {
            target.priority = priority;
        }
        self.dirty = true;
    }

    /// Re-sort by priority if anything changed
    pub fn update(&mut self) {
        if self.dirty {
            self.targets.sort_by_key(|target| target.priority);
            self.dirty = false;
        }
    }

    /// Registered targets in priority order (as of the last update)
    #[must_use]
    pub fn targets(&self) -> &[TargetComponent] {
        &self.targets
    }

    pub fn set_mode(&mut self, mode: TargetingMode) {
        self.mode = mode;
    }

    #[must_use]
    pub fn mode(&self) -> TargetingMode {
        self.mode
    }

    /// Designate the package targeted in [`TargetingMode::Package`]
    pub fn set_package(&mut self, package: Option<(Entity, CollisionCategory)>) {
        self.package = package;
    }

    /// Closest live target within `max_distance`, or the package in
    /// package mode regardless of distance
    #[must_use]
    pub fn find_target_from_position(
        &self,
        world: &World,
        position: Vec2,
        max_distance: f32,
    ) -> Option<FindTargetResult> {
        match self.mode {
            TargetingMode::Player => {
                let mut best: Option<(FindTargetResult, f32)> = None;

                for target in &self.targets {
                    if !world.is_alive(target.entity) {
                        continue;
                    }
                    let Some(target_position) = world.world_position(target.entity) else {
                        continue;
                    };

                    let distance = target_position.distance(position);
                    if distance >= max_distance {
                        continue;
                    }
                    // Strict less keeps the earlier, higher priority target on ties
                    if best.is_none_or(|(_, best_distance)| distance < best_distance) {
                        best = Some((
                            FindTargetResult {
                                entity: target.entity,
                                position: target_position,
                                category: target.category,
                            },
                            distance,
                        ));
                    }
                }

                best.map(|(result, _)| result)
            }
            TargetingMode::Package => {
                let (entity, category) = self.package?;
                if !world.is_alive(entity) {
                    return None;
                }
                Some(FindTargetResult {
                    entity,
                    position: world.world_position(entity)?,
                    category,
                })
            }
        }
    }

    /// Acquire a handle to the best target; invalid if nothing qualifies
    #[must_use]
    pub fn acquire_target(&self, world: &World, position: Vec2, max_distance: f32) -> AcquiredTarget {
        match self.find_target_from_position(world, position, max_distance) {
            Some(found) => {
                debug!("Acquired target {:?} at {}", found.entity, found.position);
                AcquiredTarget::new(found.entity, found.category)
            }
            None => AcquiredTarget::none(),
        }
    }
}

/// Line of sight from `from` to the target.
///
/// Visible only if the first body on the line belongs to the target's
/// category; static geometry in between blocks the view.
#[must_use]
pub fn sees_target<Q: SpatialQuery + ?Sized>(
    spatial: &Q,
    world: &World,
    from: Vec2,
    target: &AcquiredTarget,
) -> bool {
    let Ok(target_position) = target.position(world) else {
        return false;
    };

    let mask = target.category() | CollisionCategory::STATIC;
    spatial
        .query_first(from, target_position, mask)
        .is_some_and(|hit| hit.category.intersects(target.category()))
}
