//! Navigation module
//!
//! Waypoint navmesh generation, A* search and the system that owns the
//! level navmesh.

mod astar;
mod geometry;
mod navmesh;
mod system;

pub use astar::{
    Heuristic, NavigationPath, PathError, astar, astar_with_heuristic, find_path_points,
};
pub use geometry::{Polygon, point_inside_polygon, segment_intersects_polygon, segments_intersect};
pub use navmesh::{
    MAX_GRID_POINTS, MAX_NEIGHBOURS, NavmeshContext, NavmeshNode, find_closest_index,
    generate_grid_points, generate_mesh_nodes, generate_mesh_nodes_with_obstacles,
    generate_mesh_points, path_to_points,
};
pub use system::{NUM_RECENT_PATHS, NavigationSystem, RecentPath};
