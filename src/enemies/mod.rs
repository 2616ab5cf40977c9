//! Enemy controllers
//!
//! Each archetype owns a [`StateMachine`](crate::ai::StateMachine) and the
//! movement models it drives. The [`EnemyRoster`] updates them one after
//! another, in spawn order, so a tick is deterministic.

mod eye_monster;
mod flying_monster;

pub use eye_monster::{EyeMonsterController, EyeMonsterState};
pub use flying_monster::{FlyingMonsterController, FlyingMonsterState};

use hecs::Entity;
use log::debug;

use crate::ai::AiContext;
use crate::core::{DamageEvent, GameEvent};

/// Shade used when an enemy is not telegraphing anything
pub const SHADE_WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// An enemy brain driven once per tick
pub trait EnemyController {
    /// The controlled entity
    fn entity(&self) -> Entity;

    /// Archetype name, used in logs and events
    fn name(&self) -> &'static str;

    /// Run one tick. Returns true if the state changed.
    fn update(&mut self, ctx: &mut AiContext<'_>) -> bool;

    /// React to damage dealt to [`entity`](Self::entity). Returns true if
    /// the state changed.
    fn on_damaged(&mut self, event: &DamageEvent, ctx: &mut AiContext<'_>) -> bool;

    /// Name of the active state
    fn state_name(&self) -> &'static str;

    /// The entity can be removed from the world
    fn is_released(&self) -> bool;
}

/// All live enemy controllers, in update order
#[derive(Default)]
pub struct EnemyRoster {
    controllers: Vec<Box<dyn EnemyController>>,
}

impl EnemyRoster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a controller; it updates after every controller added before it
    pub fn add(&mut self, controller: Box<dyn EnemyController>) {
        debug!("Roster: added {} {:?}", controller.name(), controller.entity());
        self.controllers.push(controller);
    }

    /// Controller for an entity
    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&dyn EnemyController> {
        self.controllers
            .iter()
            .find(|controller| controller.entity() == entity)
            .map(|controller| controller.as_ref())
    }

    /// Active state of an entity's controller
    #[must_use]
    pub fn state_of(&self, entity: Entity) -> Option<&'static str> {
        self.get(entity).map(|controller| controller.state_name())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn EnemyController> {
        self.controllers.iter().map(|controller| controller.as_ref())
    }

    /// Forward a damage event to the controller owning the damaged entity
    pub fn dispatch_damage(&mut self, event: &DamageEvent, ctx: &mut AiContext<'_>) {
        let Some(controller) = self
            .controllers
            .iter_mut()
            .find(|controller| controller.entity() == event.damaged)
        else {
            return;
        };

        if controller.on_damaged(event, ctx) {
            report_state(controller.as_ref(), ctx);
        }
    }

    /// Update every controller in order, then drop the released ones.
    ///
    /// Returns the entities whose controllers were released; the caller
    /// removes them from the world.
    pub fn update(&mut self, ctx: &mut AiContext<'_>) -> Vec<Entity> {
        for controller in &mut self.controllers {
            if controller.update(ctx) {
                report_state(controller.as_ref(), ctx);
            }
        }

        let mut released = Vec::new();
        self.controllers.retain(|controller| {
            if controller.is_released() {
                ctx.events.push(GameEvent::EnemyReleased {
                    entity: controller.entity(),
                });
                released.push(controller.entity());
                false
            } else {
                true
            }
        });

        if !released.is_empty() {
            debug!("Roster: released {} enemies", released.len());
        }
        released
    }
}

fn report_state(controller: &dyn EnemyController, ctx: &mut AiContext<'_>) {
    ctx.events.push(GameEvent::StateChanged {
        entity: controller.entity(),
        controller: controller.name(),
        state: controller.state_name(),
    });
}
