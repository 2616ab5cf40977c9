//! Physics simulation module
//!
//! Built on top of rapier2d. The AI layer only sees the [`SpatialQuery`]
//! and [`BodyControl`] traits.

mod category;
mod query;
mod world;

pub use category::CollisionCategory;
pub use query::{BodyControl, PhysicsAccess, QueryResult, SpatialQuery};
pub use world::{ColliderHandle, Physics, RigidBodyHandle};
