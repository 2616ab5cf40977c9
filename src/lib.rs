//! Navigation and enemy AI for a 2D action game
//!
//! This crate provides:
//! - Waypoint navmesh generation and A* path search
//! - Target acquisition with line of sight over rapier2d queries
//! - Homing and path tracking movement models
//! - Enum driven state machines for enemy controllers
//! - A headless simulation loop tying it all together

pub mod ai;
pub mod config;
pub mod core;
pub mod ecs;
pub mod enemies;
pub mod error;
pub mod logging;
pub mod navigation;
pub mod physics;

// Re-exports for convenience
pub use glam;
pub use hecs;
pub use rapier2d;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::ai::{
        AcquiredTarget, AiContext, HomingMovement, StateBehaviour, StateId, StateMachine,
        TargetSystem, TrackingMovement, TrackingState, Transition,
    };
    pub use crate::config::AiConfig;
    pub use crate::core::{DamageEvent, DamageResult, EventQueue, GameEvent, Simulation, UpdateContext};
    pub use crate::ecs::{Health, Name, Transform, World};
    pub use crate::enemies::{EnemyController, EnemyRoster, EyeMonsterController, FlyingMonsterController};
    pub use crate::navigation::{NavigationSystem, NavmeshContext, PathError};
    pub use crate::physics::{CollisionCategory, Physics, RigidBodyHandle, SpatialQuery};
    pub use glam::Vec2;
}
