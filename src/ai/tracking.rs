//! Path following over the navmesh
//!
//! [`TrackingMovement`] asks the [`NavigationSystem`] for a path and steers
//! its body from waypoint to waypoint. It replans while following when the
//! target wanders off or the plan gets old, but never retries a failed
//! plan on its own; the caller decides when to try again.

use glam::Vec2;
use log::{debug, trace};

use super::steering::StuckDetector;
use crate::config::MovementConfig;
use crate::core::UpdateContext;
use crate::navigation::NavigationSystem;
use crate::physics::{BodyControl, RigidBodyHandle};

/// Where the follower is relative to its path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    /// No path was ever planned, or the last plan failed
    NoPath,
    /// Moving along the path
    Tracking,
    /// Within arrival distance of the last waypoint
    AtTarget,
}

/// Outcome of one tracking tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingResult {
    pub state: TrackingState,
    /// Distance from the body to the target, or to the path end when no
    /// target was given
    pub distance_to_target: f32,
    /// The body has not made progress for a while
    pub is_stuck: bool,
}

impl TrackingResult {
    fn no_path() -> Self {
        Self {
            state: TrackingState::NoPath,
            distance_to_target: f32::INFINITY,
            is_stuck: false,
        }
    }
}

/// Follows navmesh paths toward a target
#[derive(Debug, Clone)]
pub struct TrackingMovement {
    config: MovementConfig,
    body: Option<RigidBodyHandle>,
    meters_per_second: f32,
    path: Vec<Vec2>,
    /// Index of the waypoint being approached
    cursor: usize,
    /// Target position the current path was planned for
    planned_target: Vec2,
    /// Time since the current path was planned
    plan_age_ms: u32,
    tracking_position: Vec2,
    stuck: StuckDetector,
}

impl TrackingMovement {
    #[must_use]
    pub fn new(config: &MovementConfig) -> Self {
        Self {
            config: *config,
            body: None,
            meters_per_second: 1.0,
            path: Vec::new(),
            cursor: 0,
            planned_target: Vec2::ZERO,
            plan_age_ms: 0,
            tracking_position: Vec2::ZERO,
            stuck: StuckDetector::from_config(config),
        }
    }

    /// Bind to a body and drop any previous path
    pub fn init(&mut self, body: RigidBodyHandle) {
        self.body = Some(body);
        self.path.clear();
        self.cursor = 0;
        self.plan_age_ms = 0;
        self.stuck.reset();
    }

    pub fn set_tracking_speed(&mut self, meters_per_second: f32) {
        self.meters_per_second = meters_per_second;
    }

    /// Plan a path from the body to `target`.
    ///
    /// Returns false, and leaves no path, when the body is unknown or no
    /// path exists.
    pub fn update_path<B: BodyControl + ?Sized>(
        &mut self,
        navigation: &mut NavigationSystem,
        bodies: &B,
        target: Vec2,
    ) -> bool {
        self.path.clear();
        self.cursor = 0;
        self.plan_age_ms = 0;
        self.planned_target = target;

        let Some(position) = self.body.and_then(|body| bodies.body_position(body)) else {
            return false;
        };

        match navigation.find_path(position, target) {
            Ok(points) => {
                // First point is the body position itself
                self.cursor = 1.min(points.len().saturating_sub(1));
                self.path = points;
                true
            }
            Err(err) => {
                debug!("Tracking path to {target} failed: {err}");
                false
            }
        }
    }

    /// Stop the body and forget the body and path
    pub fn release<B: BodyControl + ?Sized>(&mut self, bodies: &mut B) {
        if let Some(body) = self.body.take() {
            bodies.set_body_velocity(body, Vec2::ZERO);
        }
        self.path.clear();
        self.cursor = 0;
    }

    /// Waypoint currently steered toward
    #[must_use]
    pub fn tracking_position(&self) -> Vec2 {
        self.tracking_position
    }

    /// The active path, empty when there is none
    #[must_use]
    pub fn path(&self) -> &[Vec2] {
        &self.path
    }

    #[must_use]
    pub fn has_path(&self) -> bool {
        !self.path.is_empty()
    }

    /// Advance along the path.
    ///
    /// With a `target`, the path is replanned once the target moved more
    /// than the repath distance from where it was planned, or when the plan
    /// is older than the repath interval.
    pub fn run<B: BodyControl + ?Sized>(
        &mut self,
        update: &UpdateContext,
        navigation: &mut NavigationSystem,
        bodies: &mut B,
        target: Option<Vec2>,
    ) -> TrackingResult {
        let Some(body) = self.body else {
            return TrackingResult::no_path();
        };

        self.plan_age_ms = self.plan_age_ms.saturating_add(update.delta_ms);

        if let Some(target) = target.filter(|_| self.has_path()) {
            let moved = target.distance(self.planned_target) > self.config.repath_distance;
            let stale = self.plan_age_ms >= self.config.repath_interval_ms;
            if moved || stale {
                self.update_path(navigation, &*bodies, target);
            }
        }

        let (Some(position), Some(&end)) = (bodies.body_position(body), self.path.last()) else {
            bodies.set_body_velocity(body, Vec2::ZERO);
            return TrackingResult::no_path();
        };

        let distance_to_target = target.unwrap_or(end).distance(position);

        if position.distance(end) <= self.config.arrival_distance {
            bodies.set_body_velocity(body, Vec2::ZERO);
            self.tracking_position = end;
            return TrackingResult {
                state: TrackingState::AtTarget,
                distance_to_target,
                is_stuck: false,
            };
        }

        let last = self.path.len() - 1;
        while self.cursor < last && position.distance(self.path[self.cursor]) <= self.config.waypoint_tolerance {
            self.cursor += 1;
        }
        let waypoint = self.path[self.cursor.min(last)];
        self.tracking_position = waypoint;

        let to_waypoint = waypoint - position;
        let mut speed = self.meters_per_second;
        if update.delta_s > 0.0 {
            // Do not step past the waypoint
            speed = speed.min(to_waypoint.length() / update.delta_s);
        }
        bodies.set_body_velocity(body, to_waypoint.normalize_or_zero() * speed);

        let is_stuck = self.stuck.update(position, update.delta_s);

        trace!(
            "tracking: waypoint {}/{} distance {:.3} stuck {}",
            self.cursor, last, distance_to_target, is_stuck
        );

        TrackingResult {
            state: TrackingState::Tracking,
            distance_to_target,
            is_stuck,
        }
    }
}

impl Default for TrackingMovement {
    fn default() -> Self {
        Self::new(&MovementConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::steering::tests::PointBody;
    use crate::config::NavigationConfig;
    use crate::navigation::{NavmeshContext, generate_grid_points, generate_mesh_nodes};
    use approx::assert_relative_eq;

    fn open_grid() -> NavigationSystem {
        let points = generate_grid_points(Vec2::ZERO, 10.0, 10.0, 1.0);
        let nodes = generate_mesh_nodes(&points, 1.5, |_, _| false);
        let mut navigation = NavigationSystem::new(NavigationConfig::default());
        navigation.set_navmesh(NavmeshContext::new(points, nodes));
        navigation
    }

    fn follow(
        tracking: &mut TrackingMovement,
        navigation: &mut NavigationSystem,
        body: &mut PointBody,
        target: Vec2,
        ticks: usize,
    ) -> TrackingResult {
        let mut update = UpdateContext::new(1.0 / 60.0);
        let mut result = TrackingResult::no_path();
        for _ in 0..ticks {
            result = tracking.run(&update, navigation, body, Some(target));
            if result.state != TrackingState::Tracking {
                break;
            }
            body.integrate(update.delta_s);
            update = update.advance(1.0 / 60.0);
        }
        result
    }

    #[test]
    fn test_no_path_before_planning() {
        let mut navigation = open_grid();
        let mut body = PointBody::at(Vec2::ZERO);
        let mut tracking = TrackingMovement::default();

        // Never initialised
        let result = tracking.run(&UpdateContext::new(0.1), &mut navigation, &mut body, None);
        assert_eq!(result.state, TrackingState::NoPath);

        // Initialised but never planned
        tracking.init(PointBody::handle());
        let result = tracking.run(&UpdateContext::new(0.1), &mut navigation, &mut body, Some(Vec2::ONE));
        assert_eq!(result.state, TrackingState::NoPath);
        assert_eq!(body.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_no_path_after_failed_plan() {
        let mut navigation = NavigationSystem::new(NavigationConfig::default());
        let mut body = PointBody::at(Vec2::ZERO);
        let mut tracking = TrackingMovement::default();
        tracking.init(PointBody::handle());

        assert!(!tracking.update_path(&mut navigation, &body, Vec2::new(5.0, 5.0)));

        let result = tracking.run(&UpdateContext::new(0.1), &mut navigation, &mut body, Some(Vec2::new(5.0, 5.0)));
        assert_eq!(result.state, TrackingState::NoPath);
    }

    #[test]
    fn test_follows_path_to_target() {
        let mut navigation = open_grid();
        let mut body = PointBody::at(Vec2::new(0.2, 0.1));
        let mut tracking = TrackingMovement::default();
        tracking.init(PointBody::handle());
        tracking.set_tracking_speed(2.0);

        let target = Vec2::new(7.0, 4.0);
        assert!(tracking.update_path(&mut navigation, &body, target));
        assert_eq!(tracking.path().first(), Some(&Vec2::new(0.2, 0.1)));

        let result = follow(&mut tracking, &mut navigation, &mut body, target, 600);

        assert_eq!(result.state, TrackingState::AtTarget);
        assert!(body.position.distance(target) <= MovementConfig::default().arrival_distance + 1e-4);
        assert_eq!(body.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_replans_when_target_moves() {
        let mut navigation = open_grid();
        let mut body = PointBody::at(Vec2::ZERO);
        let mut tracking = TrackingMovement::default();
        tracking.init(PointBody::handle());

        assert!(tracking.update_path(&mut navigation, &body, Vec2::new(9.0, 0.0)));
        assert_eq!(tracking.path().last(), Some(&Vec2::new(9.0, 0.0)));

        let update = UpdateContext::new(1.0 / 60.0);
        tracking.run(&update, &mut navigation, &mut body, Some(Vec2::new(0.0, 9.0)));

        assert_eq!(tracking.path().last(), Some(&Vec2::new(0.0, 9.0)));
    }

    #[test]
    fn test_replans_when_plan_is_stale() {
        let mut navigation = open_grid();
        let mut body = PointBody::at(Vec2::ZERO);
        let mut tracking = TrackingMovement::default();
        tracking.init(PointBody::handle());
        let target = Vec2::new(9.0, 9.0);
        assert!(tracking.update_path(&mut navigation, &body, target));
        navigation.sync();

        // Half a second later, same target: no replan
        tracking.run(&UpdateContext::new(0.5), &mut navigation, &mut body, Some(target));
        assert_eq!(navigation.find_path_count(), 0);

        // Past the interval
        tracking.run(&UpdateContext::new(2.0), &mut navigation, &mut body, Some(target));
        assert_eq!(navigation.find_path_count(), 1);
    }

    #[test]
    fn test_speed_does_not_overshoot_waypoint() {
        let mut navigation = open_grid();
        let mut body = PointBody::at(Vec2::new(8.95, 9.0));
        let mut tracking = TrackingMovement::default();
        tracking.init(PointBody::handle());
        tracking.set_tracking_speed(10.0);

        assert!(tracking.update_path(&mut navigation, &body, Vec2::new(9.0, 9.0)));
        // Trivial path: straight to the end, already within arrival distance
        let result = tracking.run(&UpdateContext::new(0.1), &mut navigation, &mut body, None);
        assert_eq!(result.state, TrackingState::AtTarget);

        let mut body = PointBody::at(Vec2::new(8.0, 9.0));
        tracking.init(PointBody::handle());
        assert!(tracking.update_path(&mut navigation, &body, Vec2::new(9.0, 9.0)));
        tracking.run(&UpdateContext::new(0.5), &mut navigation, &mut body, None);
        assert_relative_eq!(body.velocity.length() * 0.5, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_release_stops_body() {
        let mut navigation = open_grid();
        let mut body = PointBody::at(Vec2::ZERO);
        let mut tracking = TrackingMovement::default();
        tracking.init(PointBody::handle());
        assert!(tracking.update_path(&mut navigation, &body, Vec2::new(5.0, 0.0)));
        tracking.run(&UpdateContext::new(0.1), &mut navigation, &mut body, None);
        assert!(body.velocity.length() > 0.0);

        tracking.release(&mut body);

        assert_eq!(body.velocity, Vec2::ZERO);
        assert!(!tracking.has_path());
        let result = tracking.run(&UpdateContext::new(0.1), &mut navigation, &mut body, None);
        assert_eq!(result.state, TrackingState::NoPath);
    }
}
