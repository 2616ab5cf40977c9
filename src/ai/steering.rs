//! Homing movement
//!
//! Drives a body at constant forward speed while turning toward a target
//! at a bounded rate. The body never snaps to a new heading; a target
//! behind it is reached by a turning arc.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use log::trace;

use crate::config::MovementConfig;
use crate::core::UpdateContext;
use crate::physics::{BodyControl, RigidBodyHandle};

/// Wrap an angle into `[-PI, PI]`
#[must_use]
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped < -PI { wrapped + TAU } else { wrapped }
}

/// Heading in radians pointing from `from` to `to`
#[must_use]
pub fn heading_towards(from: Vec2, to: Vec2) -> f32 {
    let delta = to - from;
    delta.y.atan2(delta.x)
}

// ============================================================================
// Stuck detection
// ============================================================================

/// Flags a body that moved less than a minimum distance over a time window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StuckDetector {
    window_s: f32,
    min_progress: f32,
    elapsed_s: f32,
    anchor: Option<Vec2>,
    stuck: bool,
}

impl StuckDetector {
    #[must_use]
    pub fn new(window_s: f32, min_progress: f32) -> Self {
        Self {
            window_s,
            min_progress,
            elapsed_s: 0.0,
            anchor: None,
            stuck: false,
        }
    }

    #[must_use]
    pub fn from_config(config: &MovementConfig) -> Self {
        Self::new(config.stuck_window_s, config.stuck_min_progress)
    }

    /// Feed the current position; returns whether the body is stuck
    pub fn update(&mut self, position: Vec2, delta_s: f32) -> bool {
        let Some(anchor) = self.anchor else {
            self.anchor = Some(position);
            self.elapsed_s = 0.0;
            return self.stuck;
        };

        self.elapsed_s += delta_s;
        if self.elapsed_s >= self.window_s {
            self.stuck = anchor.distance(position) < self.min_progress;
            self.anchor = Some(position);
            self.elapsed_s = 0.0;
        }
        self.stuck
    }

    /// Start measuring from scratch
    pub fn reset(&mut self) {
        self.elapsed_s = 0.0;
        self.anchor = None;
        self.stuck = false;
    }

    #[must_use]
    pub fn is_stuck(&self) -> bool {
        self.stuck
    }
}

impl Default for StuckDetector {
    fn default() -> Self {
        Self::from_config(&MovementConfig::default())
    }
}

// ============================================================================
// Homing
// ============================================================================

/// Outcome of one homing tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HomingResult {
    /// Heading after this tick's turn, radians
    pub new_heading: f32,
    /// Distance from the body to the target before moving
    pub distance_to_target: f32,
    /// The body has not made progress for a while
    pub is_stuck: bool,
}

/// Rate-limited turning toward a target at constant speed
#[derive(Debug, Clone)]
pub struct HomingMovement {
    body: Option<RigidBodyHandle>,
    /// Meters per second along the heading
    forward_velocity: f32,
    /// Turn rate, degrees per second
    angular_velocity: f32,
    /// Radians, 0 along +X
    heading: f32,
    target_position: Vec2,
    stuck: StuckDetector,
}

impl HomingMovement {
    #[must_use]
    pub fn new(config: &MovementConfig) -> Self {
        Self {
            body: None,
            forward_velocity: 1.0,
            angular_velocity: 180.0,
            heading: 0.0,
            target_position: Vec2::ZERO,
            stuck: StuckDetector::from_config(config),
        }
    }

    pub fn set_body(&mut self, body: RigidBodyHandle) {
        self.body = Some(body);
        self.stuck.reset();
    }

    pub fn set_forward_velocity(&mut self, meters_per_second: f32) {
        self.forward_velocity = meters_per_second;
    }

    /// Turn rate in degrees per second
    pub fn set_angular_velocity(&mut self, degrees_per_second: f32) {
        self.angular_velocity = degrees_per_second;
    }

    pub fn set_heading(&mut self, heading: f32) {
        self.heading = wrap_angle(heading);
    }

    pub fn set_target_position(&mut self, position: Vec2) {
        self.target_position = position;
    }

    #[must_use]
    pub fn heading(&self) -> f32 {
        self.heading
    }

    #[must_use]
    pub fn target_position(&self) -> Vec2 {
        self.target_position
    }

    /// Forget previous progress, e.g. after picking a new target
    pub fn reset_progress(&mut self) {
        self.stuck.reset();
    }

    /// Turn toward the target and push the body along the new heading.
    ///
    /// The turn is clamped to `angular_velocity * delta_s`. Without a body
    /// nothing moves and the distance is infinite.
    pub fn run<B: BodyControl + ?Sized>(&mut self, update: &UpdateContext, bodies: &mut B) -> HomingResult {
        let position = self.body.and_then(|body| bodies.body_position(body).map(|p| (body, p)));
        let Some((body, position)) = position else {
            return HomingResult {
                new_heading: self.heading,
                distance_to_target: f32::INFINITY,
                is_stuck: false,
            };
        };

        let distance_to_target = position.distance(self.target_position);
        if distance_to_target > f32::EPSILON {
            let wanted = heading_towards(position, self.target_position);
            let difference = wrap_angle(wanted - self.heading);
            let max_turn = self.angular_velocity.to_radians() * update.delta_s;
            self.heading = wrap_angle(self.heading + difference.clamp(-max_turn, max_turn));
        }

        bodies.set_body_velocity(body, Vec2::from_angle(self.heading) * self.forward_velocity);
        let is_stuck = self.stuck.update(position, update.delta_s);

        trace!(
            "homing: heading {:.3} distance {:.3} stuck {}",
            self.heading, distance_to_target, is_stuck
        );

        HomingResult {
            new_heading: self.heading,
            distance_to_target,
            is_stuck,
        }
    }
}

impl Default for HomingMovement {
    fn default() -> Self {
        Self::new(&MovementConfig::default())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Integrates a single body by hand
    #[derive(Debug, Default)]
    pub(crate) struct PointBody {
        pub position: Vec2,
        pub velocity: Vec2,
        pub enabled: bool,
    }

    impl PointBody {
        pub(crate) fn at(position: Vec2) -> Self {
            Self {
                position,
                velocity: Vec2::ZERO,
                enabled: true,
            }
        }

        pub(crate) fn handle() -> RigidBodyHandle {
            RigidBodyHandle(rapier2d::dynamics::RigidBodyHandle::from_raw_parts(0, 0))
        }

        pub(crate) fn integrate(&mut self, delta_s: f32) {
            self.position += self.velocity * delta_s;
        }
    }

    impl BodyControl for PointBody {
        fn body_position(&self, _body: RigidBodyHandle) -> Option<Vec2> {
            Some(self.position)
        }

        fn body_velocity(&self, _body: RigidBodyHandle) -> Option<Vec2> {
            Some(self.velocity)
        }

        fn set_body_velocity(&mut self, _body: RigidBodyHandle, velocity: Vec2) {
            self.velocity = velocity;
        }

        fn set_body_enabled(&mut self, _body: RigidBodyHandle, enabled: bool) {
            self.enabled = enabled;
        }
    }

    #[test]
    fn test_wrap_angle() {
        assert_relative_eq!(wrap_angle(0.0), 0.0);
        assert_relative_eq!(wrap_angle(3.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-5);
        assert_relative_eq!(wrap_angle(-3.0 * PI / 2.0), PI / 2.0, epsilon = 1e-5);
        assert_relative_eq!(wrap_angle(5.0 * TAU + 0.25), 0.25, epsilon = 1e-4);
    }

    #[test]
    fn test_turn_is_rate_limited() {
        let mut body = PointBody::at(Vec2::ZERO);
        let mut homing = HomingMovement::default();
        homing.set_body(PointBody::handle());
        homing.set_angular_velocity(90.0);
        homing.set_heading(0.0);
        homing.set_target_position(Vec2::new(0.0, 10.0));

        let result = homing.run(&UpdateContext::new(0.5), &mut body);

        // 90 deg/s for half a second
        assert_relative_eq!(result.new_heading, PI / 4.0, epsilon = 1e-5);
        assert_relative_eq!(result.distance_to_target, 10.0);
        assert_relative_eq!(body.velocity.length(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_turn_takes_shorter_side() {
        let mut body = PointBody::at(Vec2::ZERO);
        let mut homing = HomingMovement::default();
        homing.set_body(PointBody::handle());
        homing.set_heading(PI - 0.1);
        homing.set_target_position(Vec2::new(-10.0, -1.0));

        let result = homing.run(&UpdateContext::new(0.1), &mut body);

        // Crossing PI rather than turning all the way round
        assert!(result.new_heading < -PI + 0.2 || result.new_heading > PI - 0.1);
    }

    #[test]
    fn test_heading_converges_without_overshoot() {
        let mut body = PointBody::at(Vec2::ZERO);
        let mut homing = HomingMovement::default();
        homing.set_body(PointBody::handle());
        homing.set_forward_velocity(0.0);
        homing.set_angular_velocity(180.0);
        homing.set_heading(-PI / 2.0 + 0.2);

        let target = Vec2::new(0.0, 5.0);
        homing.set_target_position(target);
        let wanted = heading_towards(body.position, target);
        let update = UpdateContext::new(1.0 / 60.0);
        let budget = 180f32.to_radians() / 60.0;

        let mut previous_error = wrap_angle(wanted - homing.heading()).abs();
        for _ in 0..120 {
            let result = homing.run(&update, &mut body);
            let error = wrap_angle(wanted - result.new_heading).abs();
            assert!(error <= previous_error + 1e-5);
            assert!(previous_error - error <= budget + 1e-5);
            previous_error = error;
        }
        assert!(previous_error < 1e-4);
    }

    #[test]
    fn test_reaches_stationary_target() {
        let mut body = PointBody::at(Vec2::ZERO);
        let mut homing = HomingMovement::default();
        homing.set_body(PointBody::handle());
        homing.set_forward_velocity(1.0);
        homing.set_angular_velocity(720.0);
        homing.set_target_position(Vec2::new(2.0, 1.0));

        let update = UpdateContext::new(1.0 / 60.0);
        let mut closest = f32::INFINITY;
        for _ in 0..240 {
            let result = homing.run(&update, &mut body);
            closest = closest.min(result.distance_to_target);
            body.integrate(update.delta_s);
        }
        assert!(closest < 0.1);
    }

    #[test]
    fn test_no_body_is_infinitely_far() {
        let mut body = PointBody::at(Vec2::ZERO);
        let mut homing = HomingMovement::default();

        let result = homing.run(&UpdateContext::new(0.1), &mut body);

        assert!(result.distance_to_target.is_infinite());
        assert_eq!(body.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_stuck_detector() {
        let mut detector = StuckDetector::new(1.0, 0.5);

        assert!(!detector.update(Vec2::ZERO, 0.0));
        assert!(!detector.update(Vec2::new(0.1, 0.0), 0.5));
        // Window over with 0.2 m of progress
        assert!(detector.update(Vec2::new(0.2, 0.0), 0.5));
        // Next window moves far enough
        assert!(!detector.update(Vec2::new(1.0, 0.0), 1.0));

        detector.reset();
        assert!(!detector.is_stuck());
    }
}
