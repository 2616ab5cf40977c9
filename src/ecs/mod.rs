//! Entity Component System module
//!
//! Built on top of the hecs ECS library

mod components;
mod world;

pub use components::{Health, Name, PhysicsBody, Transform};
pub use world::World;
