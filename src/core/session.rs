//! Headless simulation loop
//!
//! Owns every system the AI core touches and steps them in a fixed order:
//!
//! 1. Physics positions are copied into transforms
//! 2. The event queue swaps; last tick's damage reaches controllers
//! 3. Navigation and the target registry update
//! 4. Enemy controllers run, in spawn order
//! 5. Physics steps
//! 6. Released enemies are removed from the world

use glam::Vec2;
use hecs::Entity;
use log::{debug, info};

use super::damage::{DamageEvent, DamageResult, apply_damage};
use super::debug::DebugOverlay;
use super::events::EventQueue;
use super::time::UpdateContext;
use crate::ai::{AiContext, SpriteLog, TargetSystem};
use crate::config::AiConfig;
use crate::ecs::{Health, Name, PhysicsBody, Transform, World};
use crate::enemies::{EnemyController, EnemyRoster, EyeMonsterController, FlyingMonsterController};
use crate::navigation::{NavigationSystem, Polygon};
use crate::physics::{CollisionCategory, Physics, RigidBodyHandle};

/// Collider radius of the player
pub const PLAYER_RADIUS: f32 = 0.25;
/// Collider radius of spawned enemies
pub const ENEMY_RADIUS: f32 = 0.3;

const PLAYER_HEALTH: i32 = 100;
const EYE_MONSTER_HEALTH: i32 = 50;
const FLYING_MONSTER_HEALTH: i32 = 30;

/// World, physics, navigation and enemies stepped together
pub struct Simulation {
    config: AiConfig,
    world: World,
    physics: Physics,
    navigation: NavigationSystem,
    targets: TargetSystem,
    roster: EnemyRoster,
    events: EventQueue,
    sprites: SpriteLog,
    /// Timing of the last tick, `None` before the first
    update: Option<UpdateContext>,
}

impl Simulation {
    #[must_use]
    pub fn new(config: AiConfig) -> Self {
        Self {
            navigation: NavigationSystem::new(config.navigation),
            config,
            world: World::new(),
            physics: Physics::new(),
            targets: TargetSystem::new(),
            roster: EnemyRoster::new(),
            events: EventQueue::new(),
            sprites: SpriteLog::new(),
            update: None,
        }
    }

    // ------------------------------------------------------------------------
    // Level
    // ------------------------------------------------------------------------

    /// Add an axis aligned static wall
    pub fn add_wall(&mut self, center: Vec2, half_extents: Vec2) -> RigidBodyHandle {
        let body = self.physics.create_static_body(center);
        self.physics
            .add_box_collider(body, half_extents, CollisionCategory::STATIC);
        body
    }

    /// Add a static convex obstacle, vertices in world space
    pub fn add_obstacle(&mut self, polygon: &Polygon) -> Option<RigidBodyHandle> {
        let body = self.physics.create_static_body(Vec2::ZERO);
        self.physics
            .add_polygon_collider(body, &polygon.vertices, CollisionCategory::STATIC)
            .map(|_| body)
    }

    /// Build the navmesh over `[start, end)` from the static geometry
    pub fn build_navmesh(&mut self, start: Vec2, end: Vec2) {
        self.navigation
            .setup_navmesh(start, end, self.config.navigation.density, &self.physics);
    }

    /// Drop the navmesh
    pub fn reset_navmesh(&mut self) {
        self.navigation.reset();
    }

    // ------------------------------------------------------------------------
    // Spawning
    // ------------------------------------------------------------------------

    fn spawn_body(
        &mut self,
        name: &str,
        position: Vec2,
        radius: f32,
        category: CollisionCategory,
        health: i32,
    ) -> (Entity, RigidBodyHandle) {
        let entity = self.world.spawn((
            Name::new(name),
            Transform::from_position(position),
            Health::new(health),
        ));
        let body = self.physics.create_dynamic_body(position, Some(entity));
        self.physics.add_circle_collider(body, radius, category);
        // Entity was spawned just above
        let _ = self.world.insert(entity, (PhysicsBody(body),));
        (entity, body)
    }

    /// Spawn the player and register it as a target
    pub fn spawn_player(&mut self, position: Vec2) -> Entity {
        let (entity, _) = self.spawn_body(
            "player",
            position,
            PLAYER_RADIUS,
            CollisionCategory::PLAYER,
            PLAYER_HEALTH,
        );
        self.targets.allocate_target(entity, CollisionCategory::PLAYER);
        info!("Spawned player {entity:?} at {position}");
        entity
    }

    pub fn spawn_eye_monster(&mut self, position: Vec2) -> Entity {
        let (entity, body) = self.spawn_body(
            "eye_monster",
            position,
            ENEMY_RADIUS,
            CollisionCategory::ENEMY,
            EYE_MONSTER_HEALTH,
        );
        let controller = EyeMonsterController::new(
            entity,
            body,
            &self.config.eye_monster,
            &self.config.movement,
        );
        self.roster.add(Box::new(controller));
        entity
    }

    /// Spawn a flying monster whose random choices come from `seed`
    pub fn spawn_flying_monster(&mut self, position: Vec2, seed: u64) -> Entity {
        let (entity, body) = self.spawn_body(
            "flying_monster",
            position,
            ENEMY_RADIUS,
            CollisionCategory::ENEMY,
            FLYING_MONSTER_HEALTH,
        );
        let controller = FlyingMonsterController::new(
            entity,
            body,
            &self.config.flying_monster,
            &self.config.movement,
            seed,
        );
        self.roster.add(Box::new(controller));
        entity
    }

    /// Add a controller for an entity spawned by the caller
    pub fn add_enemy(&mut self, controller: Box<dyn EnemyController>) {
        self.roster.add(controller);
    }

    /// Teleport an entity and its body
    pub fn set_position(&mut self, entity: Entity, position: Vec2) {
        if let Ok(body) = self.world.get::<PhysicsBody>(entity).map(|body| body.0) {
            self.physics.set_body_position(body, position);
        }
        if let Ok(mut transform) = self.world.get_mut::<Transform>(entity) {
            transform.position = position;
        }
    }

    /// Damage an entity; controllers hear about it on the next tick
    pub fn damage(
        &mut self,
        target: Entity,
        amount: i32,
        source: Option<Entity>,
        weapon_id: u32,
    ) -> Option<DamageResult> {
        apply_damage(&mut self.world, &mut self.events, target, amount, source, weapon_id)
    }

    // ------------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------------

    /// Advance everything by `delta_s` seconds
    pub fn tick(&mut self, delta_s: f32) {
        let update = match self.update {
            Some(previous) => previous.advance(delta_s),
            None => UpdateContext::new(delta_s),
        };
        self.update = Some(update);

        self.physics.sync_transforms(&mut self.world);
        self.events.swap();

        let damage: Vec<DamageEvent> = self.events.damage_events().copied().collect();

        self.navigation.update(&update);
        self.targets.update();

        let released = {
            let mut ctx = AiContext {
                update,
                world: &self.world,
                physics: &mut self.physics,
                navigation: &mut self.navigation,
                targets: &self.targets,
                sprites: &mut self.sprites,
                events: &mut self.events,
            };

            for event in &damage {
                self.roster.dispatch_damage(event, &mut ctx);
            }
            self.roster.update(&mut ctx)
        };

        self.physics.step(delta_s);
        self.navigation.sync();

        for entity in released {
            self.remove_entity(entity);
        }
    }

    fn remove_entity(&mut self, entity: Entity) {
        if let Ok(body) = self.world.get::<PhysicsBody>(entity).map(|body| body.0) {
            self.physics.remove_body(body);
        }
        self.targets.release_target(entity);
        if self.world.despawn(entity).is_ok() {
            debug!("Removed {entity:?}");
        }
    }

    /// Fill an overlay with the navmesh, recent paths and enemy states
    pub fn collect_debug(&self, overlay: &mut DebugOverlay) {
        overlay.clear();
        if !overlay.enabled {
            return;
        }

        overlay.edges.extend(self.navigation.debug_edges());
        overlay
            .paths
            .extend(self.navigation.recent_paths().map(|recent| recent.points.clone()));
        for controller in self.roster.iter() {
            overlay.add_line(format!(
                "{} {:?}: {}",
                controller.name(),
                controller.entity(),
                controller.state_name()
            ));
        }
        overlay.add_line(self.navigation.stats().format_stats());
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Active state name of an enemy, `None` once it is removed
    #[must_use]
    pub fn state_of(&self, entity: Entity) -> Option<&'static str> {
        self.roster.state_of(entity)
    }

    #[must_use]
    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    #[must_use]
    pub fn physics(&self) -> &Physics {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut Physics {
        &mut self.physics
    }

    #[must_use]
    pub fn navigation(&self) -> &NavigationSystem {
        &self.navigation
    }

    pub fn navigation_mut(&mut self) -> &mut NavigationSystem {
        &mut self.navigation
    }

    #[must_use]
    pub fn targets(&self) -> &TargetSystem {
        &self.targets
    }

    pub fn targets_mut(&mut self) -> &mut TargetSystem {
        &mut self.targets
    }

    #[must_use]
    pub fn roster(&self) -> &EnemyRoster {
        &self.roster
    }

    #[must_use]
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    #[must_use]
    pub fn sprites(&self) -> &SpriteLog {
        &self.sprites
    }

    /// Timing of the last tick
    #[must_use]
    pub fn update_context(&self) -> Option<&UpdateContext> {
        self.update.as_ref()
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(AiConfig::default())
    }
}
