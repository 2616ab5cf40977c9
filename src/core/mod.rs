//! Core module
//!
//! Per-tick timing, the event queue, damage plumbing, debug data and the
//! headless simulation loop tying the systems together.

mod damage;
mod debug;
mod events;
mod session;
mod time;

pub use damage::{DamageEvent, DamageResult, apply_damage};
pub use debug::{DebugOverlay, SearchStats};
pub use events::{EventQueue, GameEvent};
pub use session::{ENEMY_RADIUS, PLAYER_RADIUS, Simulation};
pub use time::UpdateContext;
