//! Flying monster
//!
//! Keeps a few meters from its target, repositions around it and fires
//! short bursts. Choices between repositioning and attacking are random,
//! drawn from a seeded generator so runs replay exactly.

use glam::Vec2;
use hecs::Entity;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{EnemyController, SHADE_WHITE};
use crate::ai::{
    AcquiredTarget, AiContext, HomingMovement, SimpleWeapon, StateBehaviour, StateId,
    StateMachine, TrackingMovement, TrackingState, Transition, Weapon, WeaponState, sees_target,
};
use crate::config::{FlyingMonsterTuning, MovementConfig};
use crate::core::{DamageEvent, DamageResult, GameEvent};
use crate::physics::RigidBodyHandle;

/// Repositioning is done within this distance of the chosen spot
const REPOSITION_ARRIVAL: f32 = 0.1;

/// Tint while winding up an attack
const SHADE_ANTICIPATION: [f32; 4] = [1.0, 0.25, 0.25, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlyingMonsterState {
    Idle,
    Tracking,
    Reposition,
    AttackAnticipation,
    Attacking,
    Dead,
}

impl StateId for FlyingMonsterState {
    fn name(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Tracking => "TRACKING",
            Self::Reposition => "REPOSITION",
            Self::AttackAnticipation => "ATTACK_ANTICIPATION",
            Self::Attacking => "ATTACKING",
            Self::Dead => "DEAD",
        }
    }
}

/// State machine plus the flying monster's per-state behaviour
pub struct FlyingMonsterController {
    machine: StateMachine<FlyingMonsterState>,
    brain: FlyingMonsterBrain,
}

struct FlyingMonsterBrain {
    entity: Entity,
    body: RigidBodyHandle,
    tuning: FlyingMonsterTuning,
    target: AcquiredTarget,
    timer_s: f32,
    bullets_fired: u32,
    homing: HomingMovement,
    tracking: TrackingMovement,
    weapon: Box<dyn Weapon>,
    rng: StdRng,
    released: bool,
}

impl FlyingMonsterController {
    /// Controller with a [`SimpleWeapon`] built from the tuning
    #[must_use]
    pub fn new(
        entity: Entity,
        body: RigidBodyHandle,
        tuning: &FlyingMonsterTuning,
        movement: &MovementConfig,
        seed: u64,
    ) -> Self {
        let weapon = SimpleWeapon::new(
            tuning.weapon_id,
            tuning.magazine_size,
            tuning.weapon_cooldown_ms,
            tuning.weapon_reload_ms,
        );
        Self::with_weapon(entity, body, tuning, movement, seed, Box::new(weapon))
    }

    #[must_use]
    pub fn with_weapon(
        entity: Entity,
        body: RigidBodyHandle,
        tuning: &FlyingMonsterTuning,
        movement: &MovementConfig,
        seed: u64,
        weapon: Box<dyn Weapon>,
    ) -> Self {
        let mut homing = HomingMovement::new(movement);
        homing.set_body(body);
        homing.set_forward_velocity(tuning.move_speed);
        homing.set_angular_velocity(tuning.degrees_per_second);

        Self {
            machine: StateMachine::new("FlyingMonster", FlyingMonsterState::Idle),
            brain: FlyingMonsterBrain {
                entity,
                body,
                tuning: *tuning,
                target: AcquiredTarget::none(),
                timer_s: 0.0,
                bullets_fired: 0,
                homing,
                tracking: TrackingMovement::new(movement),
                weapon,
                rng: StdRng::seed_from_u64(seed),
                released: false,
            },
        }
    }

    #[must_use]
    pub fn state(&self) -> FlyingMonsterState {
        self.machine.active_state()
    }

    #[must_use]
    pub fn target(&self) -> &AcquiredTarget {
        &self.brain.target
    }

    /// Where the monster is steering while tracking
    #[must_use]
    pub fn tracking_position(&self) -> Vec2 {
        self.brain.tracking.tracking_position()
    }
}

impl EnemyController for FlyingMonsterController {
    fn entity(&self) -> Entity {
        self.brain.entity
    }

    fn name(&self) -> &'static str {
        "FlyingMonster"
    }

    fn update(&mut self, ctx: &mut AiContext<'_>) -> bool {
        let changed = self.machine.update(&mut self.brain, ctx);

        // Face the target whatever the state
        if self.machine.is_in_state(FlyingMonsterState::Dead) {
            return changed;
        }
        if let Some(target_position) = self.brain.target_position(ctx) {
            let position = self.brain.position(ctx);
            ctx.sprites
                .set_flip_horizontal(self.brain.entity, position.x >= target_position.x);
        }

        changed
    }

    fn on_damaged(&mut self, event: &DamageEvent, ctx: &mut AiContext<'_>) -> bool {
        if event.result != DamageResult::Destroyed || self.machine.is_in_state(FlyingMonsterState::Dead) {
            return false;
        }
        self.machine.transition_to(FlyingMonsterState::Dead, &mut self.brain, ctx);
        true
    }

    fn state_name(&self) -> &'static str {
        self.machine.state_name()
    }

    fn is_released(&self) -> bool {
        self.brain.released
    }
}

impl FlyingMonsterBrain {
    fn position(&self, ctx: &AiContext<'_>) -> Vec2 {
        ctx.position_of(self.entity, self.body)
    }

    fn target_position(&self, ctx: &AiContext<'_>) -> Option<Vec2> {
        self.target.position(ctx.world).ok()
    }

    fn can_see_target(&self, ctx: &AiContext<'_>) -> bool {
        sees_target(&*ctx.physics, ctx.world, self.position(ctx), &self.target)
    }

    fn stop(&self, ctx: &mut AiContext<'_>) {
        ctx.physics.set_body_velocity(self.body, Vec2::ZERO);
    }

    /// Halfway toward the target, or sideways when already close
    fn reposition_point(&mut self, position: Vec2, target_position: Vec2) -> Vec2 {
        let delta = target_position - position;
        let halfway = delta / 2.0;

        if delta.length() < self.tuning.attack_distance {
            let side = if self.rng.gen_bool(0.5) { -1.0 } else { 1.0 };
            position + halfway.perp() * side
        } else {
            position + halfway
        }
    }
}

impl<'a> StateBehaviour<FlyingMonsterState, AiContext<'a>> for FlyingMonsterBrain {
    fn enter(&mut self, state: FlyingMonsterState, ctx: &mut AiContext<'a>) -> Transition<FlyingMonsterState> {
        self.timer_s = 0.0;

        match state {
            FlyingMonsterState::Idle => {
                self.stop(ctx);
                ctx.sprites.set_shade(self.entity, SHADE_WHITE);
            }
            FlyingMonsterState::Tracking => {
                self.tracking.init(self.body);
                self.tracking.set_tracking_speed(self.tuning.move_speed);
                if let Some(target_position) = self.target_position(ctx) {
                    self.tracking
                        .update_path(ctx.navigation, &*ctx.physics, target_position);
                }
            }
            FlyingMonsterState::Reposition => {
                let Some(target_position) = self.target_position(ctx) else {
                    return Transition::To(FlyingMonsterState::Idle);
                };
                let position = self.position(ctx);
                let spot = self.reposition_point(position, target_position);
                self.homing.set_target_position(spot);
                self.homing.reset_progress();
            }
            FlyingMonsterState::AttackAnticipation => {
                let Some(target_position) = self.target_position(ctx) else {
                    return Transition::To(FlyingMonsterState::Idle);
                };
                if self.position(ctx).distance(target_position) > self.tuning.max_attack_distance {
                    return Transition::To(FlyingMonsterState::Idle);
                }
                ctx.sprites.set_shade(self.entity, SHADE_ANTICIPATION);
            }
            FlyingMonsterState::Attacking => {
                self.bullets_fired = 0;
            }
            FlyingMonsterState::Dead => {
                self.target.invalidate();
                self.tracking.release(&mut *ctx.physics);
                self.stop(ctx);
                ctx.physics.set_body_enabled(self.body, false);
                ctx.sprites.set_shade(self.entity, SHADE_WHITE);
                ctx.sprites.set_animation(self.entity, "dead");
                debug!("FlyingMonster {:?} died", self.entity);
            }
        }

        Transition::None
    }

    fn run(&mut self, state: FlyingMonsterState, ctx: &mut AiContext<'a>) -> Transition<FlyingMonsterState> {
        match state {
            FlyingMonsterState::Idle => {
                self.timer_s += ctx.update.delta_s;
                if self.timer_s < self.tuning.idle_time_s {
                    return Transition::None;
                }
                self.timer_s = 0.0;

                let position = self.position(ctx);
                self.target = ctx.targets.acquire_target(
                    ctx.world,
                    position,
                    self.tuning.track_to_player_distance,
                );
                let Some(target_position) = self.target_position(ctx) else {
                    return Transition::None;
                };
                if !self.can_see_target(ctx) {
                    return Transition::None;
                }

                let distance = position.distance(target_position);
                if distance < self.tuning.attack_distance {
                    Transition::To(FlyingMonsterState::Reposition)
                } else if distance < self.tuning.max_attack_distance {
                    if self.rng.gen_bool(0.5) {
                        Transition::To(FlyingMonsterState::Reposition)
                    } else {
                        Transition::To(FlyingMonsterState::AttackAnticipation)
                    }
                } else if distance < self.tuning.track_to_player_distance {
                    Transition::To(FlyingMonsterState::Tracking)
                } else {
                    Transition::None
                }
            }
            FlyingMonsterState::Tracking => {
                let Some(target_position) = self.target_position(ctx) else {
                    return Transition::To(FlyingMonsterState::Idle);
                };

                let distance = self.position(ctx).distance(target_position);
                if distance > self.tuning.loose_interest_distance {
                    return Transition::To(FlyingMonsterState::Idle);
                }
                if distance < self.tuning.attack_distance && self.can_see_target(ctx) {
                    return Transition::To(FlyingMonsterState::AttackAnticipation);
                }

                let result = self.tracking.run(
                    &ctx.update,
                    ctx.navigation,
                    &mut *ctx.physics,
                    Some(target_position),
                );
                match result.state {
                    TrackingState::NoPath | TrackingState::AtTarget => {
                        Transition::To(FlyingMonsterState::Idle)
                    }
                    TrackingState::Tracking => Transition::None,
                }
            }
            FlyingMonsterState::Reposition => {
                let result = self.homing.run(&ctx.update, &mut *ctx.physics);

                if result.distance_to_target < REPOSITION_ARRIVAL {
                    let attack = self.target.is_valid(ctx.world)
                        && self.rng.gen_bool(0.75)
                        && self.can_see_target(ctx);
                    if attack {
                        Transition::To(FlyingMonsterState::AttackAnticipation)
                    } else {
                        Transition::To(FlyingMonsterState::Idle)
                    }
                } else if result.is_stuck {
                    Transition::To(FlyingMonsterState::Idle)
                } else {
                    Transition::None
                }
            }
            FlyingMonsterState::AttackAnticipation => {
                self.timer_s += ctx.update.delta_s;
                if self.timer_s > self.tuning.attack_start_delay_s {
                    Transition::To(FlyingMonsterState::Attacking)
                } else {
                    Transition::None
                }
            }
            FlyingMonsterState::Attacking => {
                let Some(target_position) = self.target_position(ctx) else {
                    return Transition::To(FlyingMonsterState::Idle);
                };
                if self.bullets_fired >= self.tuning.bullets_to_emit {
                    return Transition::To(FlyingMonsterState::Idle);
                }

                let position = self.position(ctx);
                let timestamp_ms = ctx.update.timestamp_ms;
                match self.weapon.fire(position, target_position, timestamp_ms) {
                    WeaponState::Fire => {
                        self.bullets_fired += 1;
                        ctx.events.push(GameEvent::WeaponFired {
                            entity: self.entity,
                            weapon_id: self.weapon.weapon_id(),
                            from: position,
                            to: target_position,
                        });
                    }
                    WeaponState::OutOfAmmo => self.weapon.reload(timestamp_ms),
                    WeaponState::Cooldown => {}
                }
                Transition::None
            }
            FlyingMonsterState::Dead => {
                self.timer_s += ctx.update.delta_s;
                if !self.released && self.timer_s >= self.tuning.release_delay_s {
                    self.released = true;
                }
                Transition::None
            }
        }
    }

    fn exit(&mut self, state: FlyingMonsterState, ctx: &mut AiContext<'a>) {
        match state {
            FlyingMonsterState::Tracking => self.tracking.release(&mut *ctx.physics),
            FlyingMonsterState::Reposition => self.stop(ctx),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AiConfig;
    use crate::core::Simulation;

    const DT: f32 = 1.0 / 60.0;

    fn level() -> Simulation {
        let mut config = AiConfig::default();
        config.flying_monster.idle_time_s = 0.0;
        let mut sim = Simulation::new(config);
        sim.build_navmesh(Vec2::ZERO, Vec2::new(12.0, 12.0));
        sim
    }

    fn fired_by(sim: &Simulation, entity: Entity) -> usize {
        sim.events()
            .pending()
            .filter(|event| matches!(event, GameEvent::WeaponFired { entity: e, .. } if *e == entity))
            .count()
    }

    #[test]
    fn test_idle_without_target() {
        let mut sim = level();
        let flyer = sim.spawn_flying_monster(Vec2::new(2.0, 2.0), 7);

        for _ in 0..20 {
            sim.tick(DT);
            assert_eq!(sim.state_of(flyer), Some("IDLE"));
        }
    }

    #[test]
    fn test_close_target_repositions() {
        let mut sim = level();
        let flyer = sim.spawn_flying_monster(Vec2::new(2.0, 2.0), 7);
        sim.spawn_player(Vec2::new(3.5, 2.0));

        sim.tick(DT);
        assert_eq!(sim.state_of(flyer), Some("REPOSITION"));
    }

    #[test]
    fn test_medium_target_is_tracked() {
        let mut sim = level();
        let flyer = sim.spawn_flying_monster(Vec2::new(2.0, 2.0), 7);
        sim.spawn_player(Vec2::new(5.5, 2.0));

        sim.tick(DT);
        assert_eq!(sim.state_of(flyer), Some("TRACKING"));
    }

    #[test]
    fn test_far_target_is_ignored() {
        let mut sim = level();
        let flyer = sim.spawn_flying_monster(Vec2::new(2.0, 2.0), 7);
        sim.spawn_player(Vec2::new(6.5, 2.0));

        for _ in 0..10 {
            sim.tick(DT);
        }
        assert_eq!(sim.state_of(flyer), Some("IDLE"));
    }

    #[test]
    fn test_same_seed_same_choices() {
        let run = |seed: u64| {
            let mut sim = level();
            let flyer = sim.spawn_flying_monster(Vec2::new(2.0, 2.0), seed);
            sim.spawn_player(Vec2::new(4.75, 2.0));
            let mut states = Vec::new();
            for _ in 0..120 {
                sim.tick(DT);
                states.push(sim.state_of(flyer));
            }
            states
        };

        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_attack_fires_burst() {
        let mut sim = level();
        let flyer = sim.spawn_flying_monster(Vec2::new(2.0, 2.0), 7);
        sim.spawn_player(Vec2::new(4.75, 2.0));

        let mut fired = 0;
        let mut attacked = false;
        for _ in 0..600 {
            sim.tick(DT);
            fired += fired_by(&sim, flyer);
            if sim.state_of(flyer) == Some("ATTACKING") {
                attacked = true;
            }
        }

        assert!(attacked);
        assert!(fired >= 2);
    }

    #[test]
    fn test_destroyed_goes_dead() {
        let mut sim = level();
        let flyer = sim.spawn_flying_monster(Vec2::new(2.0, 2.0), 7);

        sim.damage(flyer, 1000, None, 1);
        sim.tick(DT);
        assert_eq!(sim.state_of(flyer), Some("DEAD"));

        for _ in 0..70 {
            sim.tick(DT);
        }
        assert!(!sim.world().contains(flyer));
    }
}
