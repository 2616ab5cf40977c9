//! Navigation system
//!
//! Owns the level navmesh and answers path requests from AI controllers.
//! The navmesh is built once per level and only read during ticks.

use std::time::Instant;

use glam::Vec2;
use log::{debug, info, warn};

use super::astar::{NavigationPath, PathError, astar};
use super::geometry::Polygon;
use super::navmesh::{
    NavmeshContext, find_closest_index, generate_grid_points, generate_mesh_nodes,
    generate_mesh_nodes_with_obstacles, generate_mesh_points, path_to_points,
};
use crate::config::NavigationConfig;
use crate::core::{SearchStats, UpdateContext};
use crate::physics::{CollisionCategory, SpatialQuery};

/// Number of successful searches kept for the debug overlay
pub const NUM_RECENT_PATHS: usize = 10;

/// A successful search kept for diagnostics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecentPath {
    /// Simulation time of the request
    pub timestamp_ms: u32,
    /// Wall-clock time spent searching
    pub time_ms: f32,
    /// Nodes expanded by A*
    pub nodes_evaluated: usize,
    /// Resulting world points
    pub points: Vec<Vec2>,
}

/// Builds the navmesh and serves path requests
#[derive(Debug, Default)]
pub struct NavigationSystem {
    config: NavigationConfig,
    navmesh: NavmeshContext,
    timestamp_ms: u32,
    recent_paths: Vec<RecentPath>,
    next_recent: usize,
    find_path_this_frame: u32,
    stats: SearchStats,
}

impl NavigationSystem {
    /// Create a system without a navmesh
    #[must_use]
    pub fn new(config: NavigationConfig) -> Self {
        Self {
            config,
            recent_paths: Vec::with_capacity(NUM_RECENT_PATHS),
            ..Default::default()
        }
    }

    /// Build the navmesh over `[start, end)` from the physics world.
    ///
    /// Points inside static geometry are dropped and two points are only
    /// linked if no static body lies between them.
    pub fn setup_navmesh<Q: SpatialQuery + ?Sized>(
        &mut self,
        start: Vec2,
        end: Vec2,
        density: f32,
        spatial: &Q,
    ) {
        let size = end - start;
        let mut points = generate_grid_points(start, size.x, size.y, density);
        points.retain(|&point| {
            spatial
                .query_nearest(point, 0.0, CollisionCategory::STATIC)
                .is_none()
        });

        let nodes = generate_mesh_nodes(&points, self.config.connection_distance(density), |a, b| {
            spatial.is_obstructed(a, b, CollisionCategory::STATIC)
        });

        self.navmesh = NavmeshContext::new(points, nodes);
        self.log_built();
    }

    /// Build the navmesh over `[start, end)` from obstacle polygons
    pub fn setup_navmesh_from_polygons(
        &mut self,
        start: Vec2,
        end: Vec2,
        density: f32,
        obstacles: &[Polygon],
    ) {
        let size = end - start;
        let points = generate_mesh_points(start, size.x, size.y, density, obstacles);
        let nodes = generate_mesh_nodes_with_obstacles(
            &points,
            self.config.connection_distance(density),
            obstacles,
        );

        self.navmesh = NavmeshContext::new(points, nodes);
        self.log_built();
    }

    /// Use an already built navmesh
    pub fn set_navmesh(&mut self, navmesh: NavmeshContext) {
        self.navmesh = navmesh;
        self.log_built();
    }

    fn log_built(&self) {
        info!(
            "Navmesh built: {} points, {} nodes, {} edges",
            self.navmesh.points.len(),
            self.navmesh.nodes.len(),
            self.navmesh.edge_count()
        );
    }

    /// Drop the navmesh, e.g. on level reset
    pub fn reset(&mut self) {
        self.navmesh.clear();
        self.recent_paths.clear();
        self.next_recent = 0;
        info!("Navmesh reset");
    }

    /// The current navmesh, if one has been built
    #[must_use]
    pub fn navmesh(&self) -> Option<&NavmeshContext> {
        (!self.navmesh.is_empty()).then_some(&self.navmesh)
    }

    /// Record the tick time
    pub fn update(&mut self, update: &UpdateContext) {
        self.timestamp_ms = update.timestamp_ms;
    }

    /// End of tick bookkeeping
    pub fn sync(&mut self) {
        self.find_path_this_frame = 0;
    }

    /// Find a path between two world positions.
    ///
    /// The first point is replaced by `start_position` itself. When both
    /// ends snap to the same node the path is the straight segment
    /// `[start_position, end_position]`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::EmptyNavmesh`] before a navmesh is built and
    /// [`PathError::NoPath`] when the ends are not connected.
    pub fn find_path(
        &mut self,
        start_position: Vec2,
        end_position: Vec2,
    ) -> Result<Vec<Vec2>, PathError> {
        self.find_path_this_frame += 1;

        if self.navmesh.is_empty() {
            warn!("Path requested without a navmesh");
            return Err(PathError::EmptyNavmesh);
        }

        let start = find_closest_index(&self.navmesh, start_position).ok_or(PathError::EmptyNavmesh)?;
        let end = find_closest_index(&self.navmesh, end_position).ok_or(PathError::EmptyNavmesh)?;

        let started = Instant::now();
        let result = astar(&self.navmesh, start, end);
        let elapsed = started.elapsed();
        let time_ms = elapsed.as_secs_f32() * 1000.0;

        self.stats.record_search(elapsed, result.is_ok());
        if time_ms > self.config.slow_search_ms {
            warn!(
                "Slow path search: {time_ms:.2}ms over {} nodes",
                self.navmesh.len()
            );
        }

        let path = match result {
            Ok(path) => path,
            Err(err) => {
                debug!("Path {start} -> {end} failed: {err}");
                return Err(err);
            }
        };

        let points = self.path_points(&path, start_position, end_position);
        debug!(
            "Path {start} -> {end}: {} points, {} evaluated, {time_ms:.3}ms",
            points.len(),
            path.nodes_evaluated
        );

        self.remember(RecentPath {
            timestamp_ms: self.timestamp_ms,
            time_ms,
            nodes_evaluated: path.nodes_evaluated,
            points: points.clone(),
        });

        Ok(points)
    }

    fn path_points(&self, path: &NavigationPath, start_position: Vec2, end_position: Vec2) -> Vec<Vec2> {
        if path.is_trivial() {
            return vec![start_position, end_position];
        }

        let mut points = path_to_points(&self.navmesh, &path.indices);
        if let Some(first) = points.first_mut() {
            *first = start_position;
        }
        points
    }

    fn remember(&mut self, recent: RecentPath) {
        if self.recent_paths.len() < NUM_RECENT_PATHS {
            self.recent_paths.push(recent);
        } else {
            self.recent_paths[self.next_recent] = recent;
        }
        self.next_recent = (self.next_recent + 1) % NUM_RECENT_PATHS;
    }

    /// Recent successful searches, oldest first
    pub fn recent_paths(&self) -> impl Iterator<Item = &RecentPath> {
        let split = if self.recent_paths.len() < NUM_RECENT_PATHS {
            0
        } else {
            self.next_recent
        };
        self.recent_paths[split..]
            .iter()
            .chain(self.recent_paths[..split].iter())
    }

    /// Path requests since the last [`sync`](Self::sync)
    #[must_use]
    pub fn find_path_count(&self) -> u32 {
        self.find_path_this_frame
    }

    /// Search timing statistics
    #[must_use]
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Every navmesh link, for the debug overlay
    pub fn debug_edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        self.navmesh.edges()
    }
}
