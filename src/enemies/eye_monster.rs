//! Eye monster
//!
//! Sleeps with its eye closed and looks around every so often. A target in
//! sight wakes it up; after a short telegraph it homes in on the target. A
//! target in range but out of sight is tracked over the navmesh until it is
//! close enough to hunt.

use glam::Vec2;
use hecs::Entity;
use log::debug;

use super::EnemyController;
use crate::ai::{
    AcquiredTarget, AiContext, HomingMovement, StateBehaviour, StateId, StateMachine,
    TrackingMovement, TrackingState, Transition, heading_towards, sees_target,
};
use crate::config::{EyeMonsterTuning, MovementConfig};
use crate::core::{DamageEvent, DamageResult};
use crate::physics::RigidBodyHandle;

/// Distance inside engage range at which tracking gives way to hunting
const TRACKING_HUNT_MARGIN: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EyeMonsterState {
    Sleeping,
    Awake,
    Retarget,
    Tracking,
    Hunt,
    Dead,
}

impl StateId for EyeMonsterState {
    fn name(self) -> &'static str {
        match self {
            Self::Sleeping => "SLEEPING",
            Self::Awake => "AWAKE",
            Self::Retarget => "RETARGET",
            Self::Tracking => "TRACKING",
            Self::Hunt => "HUNT",
            Self::Dead => "DEAD",
        }
    }
}

/// State machine plus the eye monster's per-state behaviour
pub struct EyeMonsterController {
    machine: StateMachine<EyeMonsterState>,
    brain: EyeMonsterBrain,
}

struct EyeMonsterBrain {
    entity: Entity,
    body: RigidBodyHandle,
    tuning: EyeMonsterTuning,
    target: AcquiredTarget,
    /// Shared by the timed states, reset on enter
    timer_s: f32,
    homing: HomingMovement,
    tracking: TrackingMovement,
    released: bool,
}

impl EyeMonsterController {
    #[must_use]
    pub fn new(
        entity: Entity,
        body: RigidBodyHandle,
        tuning: &EyeMonsterTuning,
        movement: &MovementConfig,
    ) -> Self {
        let mut homing = HomingMovement::new(movement);
        homing.set_body(body);
        homing.set_forward_velocity(tuning.move_speed);
        homing.set_angular_velocity(tuning.degrees_per_second);

        Self {
            machine: StateMachine::new("EyeMonster", EyeMonsterState::Sleeping),
            brain: EyeMonsterBrain {
                entity,
                body,
                tuning: *tuning,
                target: AcquiredTarget::none(),
                timer_s: 0.0,
                homing,
                tracking: TrackingMovement::new(movement),
                released: false,
            },
        }
    }

    #[must_use]
    pub fn state(&self) -> EyeMonsterState {
        self.machine.active_state()
    }

    #[must_use]
    pub fn previous_state(&self) -> EyeMonsterState {
        self.machine.previous_state()
    }

    /// Current target handle, possibly invalid
    #[must_use]
    pub fn target(&self) -> &AcquiredTarget {
        &self.brain.target
    }

    /// Waypoints being followed while tracking
    #[must_use]
    pub fn tracking_path(&self) -> &[Vec2] {
        self.brain.tracking.path()
    }
}

impl EnemyController for EyeMonsterController {
    fn entity(&self) -> Entity {
        self.brain.entity
    }

    fn name(&self) -> &'static str {
        "EyeMonster"
    }

    fn update(&mut self, ctx: &mut AiContext<'_>) -> bool {
        self.machine.update(&mut self.brain, ctx)
    }

    fn on_damaged(&mut self, event: &DamageEvent, ctx: &mut AiContext<'_>) -> bool {
        if event.result != DamageResult::Destroyed || self.machine.is_in_state(EyeMonsterState::Dead) {
            return false;
        }
        self.machine.transition_to(EyeMonsterState::Dead, &mut self.brain, ctx);
        true
    }

    fn state_name(&self) -> &'static str {
        self.machine.state_name()
    }

    fn is_released(&self) -> bool {
        self.brain.released
    }
}

impl EyeMonsterBrain {
    fn position(&self, ctx: &AiContext<'_>) -> Vec2 {
        ctx.position_of(self.entity, self.body)
    }

    fn target_position(&self, ctx: &AiContext<'_>) -> Option<Vec2> {
        self.target.position(ctx.world).ok()
    }

    fn stop(&self, ctx: &mut AiContext<'_>) {
        ctx.physics.set_body_velocity(self.body, Vec2::ZERO);
    }

    fn acquire(&mut self, ctx: &AiContext<'_>) {
        let position = self.position(ctx);
        self.target = ctx
            .targets
            .acquire_target(ctx.world, position, self.tuning.engage_distance);
    }
}

impl<'a> StateBehaviour<EyeMonsterState, AiContext<'a>> for EyeMonsterBrain {
    fn enter(&mut self, state: EyeMonsterState, ctx: &mut AiContext<'a>) -> Transition<EyeMonsterState> {
        self.timer_s = 0.0;

        match state {
            EyeMonsterState::Sleeping => {
                self.target.invalidate();
                self.stop(ctx);
                ctx.sprites.set_animation(self.entity, "close_eye");
            }
            EyeMonsterState::Awake => {
                let Some(target_position) = self.target_position(ctx) else {
                    return Transition::To(EyeMonsterState::Sleeping);
                };
                let position = self.position(ctx);
                self.homing.set_heading(heading_towards(position, target_position));
                ctx.sprites.set_animation(self.entity, "open_eye");
            }
            EyeMonsterState::Retarget => {
                self.stop(ctx);
            }
            EyeMonsterState::Tracking => {
                self.tracking.init(self.body);
                self.tracking.set_tracking_speed(self.tuning.tracking_speed);
                if let Some(target_position) = self.target_position(ctx) {
                    self.tracking
                        .update_path(ctx.navigation, &*ctx.physics, target_position);
                }
            }
            EyeMonsterState::Hunt => {
                let Some(target_position) = self.target_position(ctx) else {
                    return Transition::To(EyeMonsterState::Retarget);
                };
                let position = self.position(ctx);
                self.homing.set_body(self.body);
                self.homing.set_heading(heading_towards(position, target_position));
                self.homing.set_target_position(target_position);
                ctx.sprites.set_animation(self.entity, "idle");
            }
            EyeMonsterState::Dead => {
                self.target.invalidate();
                self.tracking.release(&mut *ctx.physics);
                self.stop(ctx);
                ctx.physics.set_body_enabled(self.body, false);
                ctx.sprites.set_animation(self.entity, "dead");
                debug!("EyeMonster {:?} died", self.entity);
            }
        }

        Transition::None
    }

    fn run(&mut self, state: EyeMonsterState, ctx: &mut AiContext<'a>) -> Transition<EyeMonsterState> {
        let delta_s = ctx.update.delta_s;

        match state {
            EyeMonsterState::Sleeping => {
                self.timer_s += delta_s;
                if self.timer_s < self.tuning.visibility_check_interval_s {
                    return Transition::None;
                }
                self.timer_s = 0.0;

                self.acquire(ctx);
                if !self.target.is_valid(ctx.world) {
                    return Transition::None;
                }

                let position = self.position(ctx);
                if sees_target(&*ctx.physics, ctx.world, position, &self.target) {
                    Transition::To(EyeMonsterState::Awake)
                } else {
                    Transition::To(EyeMonsterState::Tracking)
                }
            }
            EyeMonsterState::Awake => {
                if !self.target.is_valid(ctx.world) {
                    return Transition::To(EyeMonsterState::Sleeping);
                }
                self.timer_s += delta_s;
                if self.timer_s >= self.tuning.time_before_hunt_s {
                    Transition::To(EyeMonsterState::Hunt)
                } else {
                    Transition::None
                }
            }
            EyeMonsterState::Retarget => {
                self.timer_s += delta_s;
                if self.timer_s < self.tuning.retarget_delay_s {
                    return Transition::None;
                }

                self.acquire(ctx);
                if self.target.is_valid(ctx.world) {
                    Transition::To(EyeMonsterState::Hunt)
                } else {
                    Transition::To(EyeMonsterState::Sleeping)
                }
            }
            EyeMonsterState::Tracking => {
                let Some(target_position) = self.target_position(ctx) else {
                    return Transition::To(EyeMonsterState::Sleeping);
                };

                let result = self.tracking.run(
                    &ctx.update,
                    ctx.navigation,
                    &mut *ctx.physics,
                    Some(target_position),
                );
                let hunt_distance = self.tuning.engage_distance - TRACKING_HUNT_MARGIN;

                match result.state {
                    TrackingState::NoPath => Transition::To(EyeMonsterState::Sleeping),
                    TrackingState::AtTarget => Transition::To(EyeMonsterState::Hunt),
                    TrackingState::Tracking if result.distance_to_target < hunt_distance => {
                        Transition::To(EyeMonsterState::Hunt)
                    }
                    TrackingState::Tracking => Transition::None,
                }
            }
            EyeMonsterState::Hunt => {
                let Some(target_position) = self.target_position(ctx) else {
                    return Transition::To(EyeMonsterState::Retarget);
                };

                self.homing.set_target_position(target_position);
                let result = self.homing.run(&ctx.update, &mut *ctx.physics);

                // Sprite follows the turn, not the target
                let facing_left = result.new_heading.cos() < 0.0;
                ctx.sprites.set_flip_horizontal(self.entity, facing_left);

                if result.distance_to_target > self.tuning.disengage_distance {
                    Transition::To(EyeMonsterState::Sleeping)
                } else {
                    Transition::None
                }
            }
            EyeMonsterState::Dead => {
                self.timer_s += delta_s;
                if !self.released && self.timer_s >= self.tuning.release_delay_s {
                    self.released = true;
                }
                Transition::None
            }
        }
    }

    fn exit(&mut self, state: EyeMonsterState, ctx: &mut AiContext<'a>) {
        match state {
            EyeMonsterState::Tracking => self.tracking.release(&mut *ctx.physics),
            EyeMonsterState::Hunt => {
                self.stop(ctx);
                self.target.invalidate();
            }
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

    fn eager_config() -> AiConfig {
        let mut config = AiConfig::default();
        config.eye_monster.visibility_check_interval_s = 0.0;
        config
    }

    fn open_level(config: AiConfig) -> Simulation {
        let mut sim = Simulation::new(config);
        sim.build_navmesh(Vec2::ZERO, Vec2::new(12.0, 12.0));
        sim
    }

    #[test]
    fn test_sleeps_without_target() {
        let mut sim = open_level(eager_config());
        let eye = sim.spawn_eye_monster(Vec2::new(2.0, 2.0));
        sim.spawn_player(Vec2::new(11.0, 11.0));

        for _ in 0..30 {
            sim.tick(DT);
            assert_eq!(sim.state_of(eye), Some("SLEEPING"));
        }
        assert_eq!(sim.sprites().current_animation(eye), Some("close_eye"));
    }

    #[test]
    fn test_polls_on_interval() {
        let mut sim = open_level(AiConfig::default());
        let eye = sim.spawn_eye_monster(Vec2::new(2.0, 2.0));
        sim.spawn_player(Vec2::new(4.0, 2.0));

        // Interval is one second
        for _ in 0..50 {
            sim.tick(DT);
        }
        assert_eq!(sim.state_of(eye), Some("SLEEPING"));

        for _ in 0..15 {
            sim.tick(DT);
        }
        assert_eq!(sim.state_of(eye), Some("AWAKE"));
    }

    #[test]
    fn test_wakes_then_hunts() {
        let mut sim = open_level(eager_config());
        let eye = sim.spawn_eye_monster(Vec2::new(2.0, 2.0));
        sim.spawn_player(Vec2::new(5.0, 2.0));

        sim.tick(DT);
        assert_eq!(sim.state_of(eye), Some("AWAKE"));
        assert_eq!(sim.sprites().current_animation(eye), Some("open_eye"));

        // Telegraph is 0.3 s
        for _ in 0..17 {
            sim.tick(DT);
        }
        assert_eq!(sim.state_of(eye), Some("AWAKE"));
        for _ in 0..2 {
            sim.tick(DT);
        }
        assert_eq!(sim.state_of(eye), Some("HUNT"));
    }

    #[test]
    fn test_hunt_moves_toward_target() {
        let mut sim = open_level(eager_config());
        let eye = sim.spawn_eye_monster(Vec2::new(2.0, 2.0));
        let player = sim.spawn_player(Vec2::new(5.0, 2.0));

        for _ in 0..30 {
            sim.tick(DT);
        }
        assert_eq!(sim.state_of(eye), Some("HUNT"));

        let before = sim.world().world_position(eye).unwrap();
        for _ in 0..30 {
            sim.tick(DT);
        }
        let after = sim.world().world_position(eye).unwrap();
        let target = sim.world().world_position(player).unwrap();
        assert!(after.distance(target) < before.distance(target));
    }

    #[test]
    fn test_hunt_flip_follows_heading() {
        let mut sim = open_level(eager_config());
        let eye = sim.spawn_eye_monster(Vec2::new(4.0, 6.0));
        let player = sim.spawn_player(Vec2::new(7.0, 6.0));

        for _ in 0..30 {
            sim.tick(DT);
        }
        assert_eq!(sim.state_of(eye), Some("HUNT"));
        assert_eq!(sim.sprites().flipped(eye), Some(false));

        // Target jumps behind; the turn is rate limited so the sprite lags
        sim.set_position(player, Vec2::new(1.5, 6.0));
        sim.tick(DT);
        assert_eq!(sim.state_of(eye), Some("HUNT"));
        assert_eq!(sim.sprites().flipped(eye), Some(false));

        // 180 deg/s needs a second to turn around
        for _ in 0..90 {
            sim.tick(DT);
        }
        assert_eq!(sim.state_of(eye), Some("HUNT"));
        assert_eq!(sim.sprites().flipped(eye), Some(true));
    }

    #[test]
    fn test_disengages_when_target_leaves() {
        let mut sim = open_level(eager_config());
        let eye = sim.spawn_eye_monster(Vec2::new(2.0, 2.0));
        let player = sim.spawn_player(Vec2::new(5.0, 2.0));

        for _ in 0..30 {
            sim.tick(DT);
        }
        assert_eq!(sim.state_of(eye), Some("HUNT"));

        sim.set_position(player, Vec2::new(11.0, 11.0));
        sim.tick(DT);
        assert_eq!(sim.state_of(eye), Some("SLEEPING"));
    }

    #[test]
    fn test_hidden_target_is_tracked() {
        let mut sim = Simulation::new(eager_config());
        // Wall between the two, with room to walk around it
        sim.add_wall(Vec2::new(4.0, 4.0), Vec2::new(0.25, 2.0));
        sim.build_navmesh(Vec2::ZERO, Vec2::new(12.0, 12.0));

        let eye = sim.spawn_eye_monster(Vec2::new(2.0, 4.0));
        sim.spawn_player(Vec2::new(5.5, 4.0));

        sim.tick(DT);
        assert_eq!(sim.state_of(eye), Some("TRACKING"));

        let controller = sim.roster().get(eye).unwrap();
        assert_eq!(controller.state_name(), "TRACKING");
    }

    #[test]
    fn test_tracking_without_navmesh_falls_back_to_sleep() {
        let mut sim = Simulation::new(eager_config());
        sim.add_wall(Vec2::new(4.0, 4.0), Vec2::new(0.25, 2.0));

        let eye = sim.spawn_eye_monster(Vec2::new(2.0, 4.0));
        sim.spawn_player(Vec2::new(5.5, 4.0));

        sim.tick(DT);
        // TRACKING is entered and left again in the same tick or the next
        sim.tick(DT);
        assert_eq!(sim.state_of(eye), Some("SLEEPING"));
    }

    #[test]
    fn test_target_death_retargets() {
        let mut sim = open_level(eager_config());
        let eye = sim.spawn_eye_monster(Vec2::new(2.0, 2.0));
        let player = sim.spawn_player(Vec2::new(5.0, 2.0));

        for _ in 0..30 {
            sim.tick(DT);
        }
        assert_eq!(sim.state_of(eye), Some("HUNT"));

        sim.damage(player, 1000, None, 0);
        sim.tick(DT);
        assert_eq!(sim.state_of(eye), Some("RETARGET"));

        // Nothing else to hunt
        for _ in 0..40 {
            sim.tick(DT);
        }
        assert_eq!(sim.state_of(eye), Some("SLEEPING"));
    }

    #[test]
    fn test_destroyed_goes_dead_then_released() {
        let mut sim = open_level(eager_config());
        let eye = sim.spawn_eye_monster(Vec2::new(2.0, 2.0));

        sim.tick(DT);
        sim.damage(eye, 1000, None, 3);
        // Damage events are delivered on the next tick
        sim.tick(DT);
        assert_eq!(sim.state_of(eye), Some("DEAD"));
        assert_eq!(sim.sprites().current_animation(eye), Some("dead"));

        // Further damage is ignored
        sim.damage(eye, 10, None, 3);
        sim.tick(DT);
        assert_eq!(sim.state_of(eye), Some("DEAD"));

        for _ in 0..61 {
            sim.tick(DT);
        }
        assert_eq!(sim.state_of(eye), None);
        assert!(!sim.world().contains(eye));
    }

    #[test]
    fn test_survivable_damage_keeps_state() {
        let mut sim = open_level(eager_config());
        let eye = sim.spawn_eye_monster(Vec2::new(2.0, 2.0));

        sim.tick(DT);
        sim.damage(eye, 1, None, 3);
        sim.tick(DT);
        assert_eq!(sim.state_of(eye), Some("SLEEPING"));
    }
}
