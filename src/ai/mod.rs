//! AI module
//!
//! The building blocks enemy controllers are made of: a generic state
//! machine, target acquisition, homing and path tracking movement, and the
//! outbound sprite and weapon interfaces.

mod context;
mod fsm;
mod sprite;
mod steering;
mod target;
mod tracking;
mod weapon;

pub use context::AiContext;
pub use fsm::{MAX_CHAINED_TRANSITIONS, StateBehaviour, StateId, StateMachine, Transition};
pub use sprite::{SpriteCommand, SpriteControl, SpriteLog};
pub use steering::{HomingMovement, HomingResult, StuckDetector, heading_towards, wrap_angle};
pub use target::{
    AcquiredTarget, FindTargetResult, TargetComponent, TargetError, TargetSystem, TargetingMode,
    sees_target,
};
pub use tracking::{TrackingMovement, TrackingResult, TrackingState};
pub use weapon::{SimpleWeapon, Weapon, WeaponState};
