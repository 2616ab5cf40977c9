//! Damage events and their application to [`Health`]

use hecs::Entity;

use super::events::{EventQueue, GameEvent};
use crate::ecs::{Health, World};

/// Outcome of a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageResult {
    /// Health was reduced but is above zero
    Damaged,
    /// This hit took the last of the health
    Destroyed,
}

/// A hit reported to whoever owns the damaged entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageEvent {
    pub damaged: Entity,
    pub who_did_damage: Option<Entity>,
    pub weapon_id: u32,
    pub damage: i32,
    pub result: DamageResult,
}

/// Subtract `amount` from the target's health and queue a [`DamageEvent`].
///
/// Returns `None` and queues nothing if the target has no [`Health`] or is
/// already dead.
pub fn apply_damage(
    world: &mut World,
    events: &mut EventQueue,
    target: Entity,
    amount: i32,
    source: Option<Entity>,
    weapon_id: u32,
) -> Option<DamageResult> {
    let mut health = world.get_mut::<Health>(target).ok()?;
    if !health.is_alive() {
        return None;
    }

    let result = if health.take_damage(amount) {
        DamageResult::Destroyed
    } else {
        DamageResult::Damaged
    };
    drop(health);

    events.push(GameEvent::Damage(DamageEvent {
        damaged: target,
        who_did_damage: source,
        weapon_id,
        damage: amount,
        result,
    }));

    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_then_destroy() {
        let mut world = World::new();
        let mut events = EventQueue::new();
        let target = world.spawn((Health::new(5),));
        let source = world.spawn(());

        assert_eq!(
            apply_damage(&mut world, &mut events, target, 2, Some(source), 7),
            Some(DamageResult::Damaged)
        );
        assert_eq!(
            apply_damage(&mut world, &mut events, target, 10, Some(source), 7),
            Some(DamageResult::Destroyed)
        );
        // Dead targets take no more hits
        assert_eq!(apply_damage(&mut world, &mut events, target, 1, None, 7), None);

        events.swap();
        let results: Vec<_> = events.damage_events().map(|d| d.result).collect();
        assert_eq!(results, vec![DamageResult::Damaged, DamageResult::Destroyed]);
        assert!(events.damage_events().all(|d| d.who_did_damage == Some(source)));
    }

    #[test]
    fn test_no_health_no_event() {
        let mut world = World::new();
        let mut events = EventQueue::new();
        let wall = world.spawn(());

        assert_eq!(apply_damage(&mut world, &mut events, wall, 1, None, 0), None);
        assert_eq!(events.pending_count(), 0);
    }
}
