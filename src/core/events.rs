//! Event queue for decoupled communication
//!
//! A double-buffered queue: events pushed during one tick become readable
//! after the `swap()` at the start of the next tick. Damage reaches enemy
//! controllers this way, and controllers report their own state changes
//! back out through it.
//!
//! # Example
//!
//! ```ignore
//! // Tick N, weapon system
//! events.push(GameEvent::Damage(event));
//!
//! // Tick N + 1, after swap
//! for event in events.iter() {
//!     if let GameEvent::Damage(damage) = event {
//!         roster.dispatch_damage(damage);
//!     }
//! }
//! ```

use std::collections::VecDeque;

use glam::Vec2;
use hecs::Entity;

use super::damage::DamageEvent;

// ============================================================================
// Event Types
// ============================================================================

/// Gameplay events for inter-system communication.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum GameEvent {
    // -------------------------------------------------------------------------
    // Combat Events
    // -------------------------------------------------------------------------
    /// An entity took damage or was destroyed.
    Damage(DamageEvent),

    /// A weapon fired a shot.
    WeaponFired {
        /// Entity holding the weapon
        entity: Entity,
        /// Weapon identifier
        weapon_id: u32,
        /// Muzzle position
        from: Vec2,
        /// Aim position
        to: Vec2,
    },

    // -------------------------------------------------------------------------
    // AI Events
    // -------------------------------------------------------------------------
    /// An enemy controller entered a new state.
    StateChanged {
        /// Controlled entity
        entity: Entity,
        /// Controller name
        controller: &'static str,
        /// Name of the state entered
        state: &'static str,
    },

    /// An enemy finished dying and its entity is about to be removed.
    EnemyReleased {
        /// Released entity
        entity: Entity,
    },
}

// ============================================================================
// Event Queue
// ============================================================================

/// Double-buffered event queue for frame-consistent event processing.
///
/// Events pushed during tick N are available for reading during tick N+1,
/// independent of the order systems update in.
#[derive(Debug)]
pub struct EventQueue {
    /// Events being written this tick
    pending: VecDeque<GameEvent>,
    /// Events from the previous tick, ready for processing
    processing: VecDeque<GameEvent>,
}

impl EventQueue {
    const DEFAULT_CAPACITY: usize = 64;

    /// Create a new event queue with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a new event queue with specified initial capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity),
            processing: VecDeque::with_capacity(capacity),
        }
    }

    /// Push an event to be processed next tick.
    #[inline]
    pub fn push(&mut self, event: GameEvent) {
        self.pending.push_back(event);
    }

    /// Swap the pending and processing queues.
    ///
    /// Call once per tick, before any system reads events.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pending, &mut self.processing);
        self.pending.clear();
    }

    /// Iterate over events from the previous tick.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.processing.iter()
    }

    /// Damage events from the previous tick, in push order.
    pub fn damage_events(&self) -> impl Iterator<Item = &DamageEvent> {
        self.processing.iter().filter_map(|event| match event {
            GameEvent::Damage(damage) => Some(damage),
            _ => None,
        })
    }

    /// Drain all events from the previous tick.
    #[inline]
    pub fn drain(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.processing.drain(..)
    }

    /// Check if there are any events to process.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.processing.is_empty()
    }

    /// Number of events ready for processing.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.processing.len()
    }

    /// Number of events pending for next tick.
    #[must_use]
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Iterate over events pushed this tick, not yet swapped in.
    pub fn pending(&self) -> impl Iterator<Item = &GameEvent> {
        self.pending.iter()
    }

    /// Clear both buffers, e.g. on level reset.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.processing.clear();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
