//! A* search over the navmesh graph

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use glam::Vec2;
use rustc_hash::FxHashMap;
use thiserror::Error;

use super::navmesh::{NavmeshContext, find_closest_index, path_to_points};

/// Reasons a path search can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PathError {
    /// The navmesh has not been built or was reset
    #[error("navmesh is empty")]
    EmptyNavmesh,
    /// A node index is outside the navmesh
    #[error("node {0} is not part of the navmesh")]
    InvalidNode(usize),
    /// The open set emptied before reaching the end node
    #[error("no path from node {start} to node {end}")]
    NoPath {
        /// Start node
        start: usize,
        /// Unreachable end node
        end: usize,
    },
}

/// Heuristic used to order the open set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Heuristic {
    /// Straight line distance; admissible, paths are shortest on the graph
    #[default]
    Euclidean,
    /// Squared distance. Cheaper and greedier, but overestimates so the
    /// returned path is connected yet not guaranteed shortest
    SquaredEuclidean,
}

impl Heuristic {
    fn estimate(self, from: Vec2, to: Vec2) -> f32 {
        match self {
            Self::Euclidean => from.distance(to),
            Self::SquaredEuclidean => from.distance_squared(to),
        }
    }
}

/// A successful search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationPath {
    /// Node indices from start to end inclusive; empty when start == end
    pub indices: Vec<usize>,
    /// Number of nodes expanded by the search
    pub nodes_evaluated: usize,
}

impl NavigationPath {
    /// Check if the path is the trivial start == end path
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Open set entry
#[derive(Debug, Clone, Copy)]
struct OpenNode {
    index: usize,
    f_score: f32,
    /// Insertion order, breaks f-score ties first come first served
    sequence: u64,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap on f, then on sequence
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find a path between two nodes using the Euclidean heuristic
///
/// # Errors
///
/// Returns [`PathError`] if the navmesh is empty, an index is invalid or
/// `end` cannot be reached from `start`.
pub fn astar(context: &NavmeshContext, start: usize, end: usize) -> Result<NavigationPath, PathError> {
    astar_with_heuristic(context, start, end, Heuristic::Euclidean)
}

/// Find a path between two nodes with an explicit heuristic
///
/// The whole search runs to completion in this call.
///
/// # Errors
///
/// Returns [`PathError`] if the navmesh is empty, an index is invalid or
/// `end` cannot be reached from `start`.
pub fn astar_with_heuristic(
    context: &NavmeshContext,
    start: usize,
    end: usize,
    heuristic: Heuristic,
) -> Result<NavigationPath, PathError> {
    if context.is_empty() {
        return Err(PathError::EmptyNavmesh);
    }
    let node_count = context.len();
    if start >= node_count {
        return Err(PathError::InvalidNode(start));
    }
    if end >= node_count {
        return Err(PathError::InvalidNode(end));
    }
    if start == end {
        return Ok(NavigationPath::default());
    }

    let end_point = context.points[end];

    let mut g_score = vec![f32::INFINITY; node_count];
    let mut closed = vec![false; node_count];
    let mut came_from: FxHashMap<usize, usize> = FxHashMap::default();
    let mut open_set = BinaryHeap::new();
    let mut sequence = 0_u64;
    let mut nodes_evaluated = 0;

    g_score[start] = 0.0;
    open_set.push(OpenNode {
        index: start,
        f_score: heuristic.estimate(context.points[start], end_point),
        sequence,
    });

    while let Some(current) = open_set.pop() {
        if closed[current.index] {
            continue;
        }

        if current.index == end {
            return Ok(NavigationPath {
                indices: reconstruct_path(&came_from, start, end),
                nodes_evaluated,
            });
        }

        closed[current.index] = true;
        nodes_evaluated += 1;

        let current_point = context.points[current.index];
        let current_g = g_score[current.index];

        for &neighbour in context.nodes[current.index].neighbours() {
            if neighbour >= node_count || closed[neighbour] {
                continue;
            }

            let neighbour_point = context.points[neighbour];
            let tentative_g = current_g + current_point.distance(neighbour_point);

            if tentative_g < g_score[neighbour] {
                came_from.insert(neighbour, current.index);
                g_score[neighbour] = tentative_g;

                sequence += 1;
                open_set.push(OpenNode {
                    index: neighbour,
                    f_score: tentative_g + heuristic.estimate(neighbour_point, end_point),
                    sequence,
                });
            }
        }
    }

    // Open set exhausted, nothing to walk back
    Err(PathError::NoPath { start, end })
}

/// Walk `came_from` back from `end`. Only called once `end` was reached.
fn reconstruct_path(came_from: &FxHashMap<usize, usize>, start: usize, end: usize) -> Vec<usize> {
    let mut path = vec![end];
    let mut current = end;

    while current != start {
        match came_from.get(&current) {
            Some(&previous) => {
                path.push(previous);
                current = previous;
            }
            None => break,
        }
    }

    path.reverse();
    path
}

/// Search between two world positions.
///
/// Snaps both ends to their closest node, searches and converts to points.
/// When both ends snap to the same node the result is empty.
///
/// # Errors
///
/// Returns [`PathError`] if the navmesh is empty or no path exists.
pub fn find_path_points(
    context: &NavmeshContext,
    start_position: Vec2,
    end_position: Vec2,
) -> Result<(Vec<Vec2>, NavigationPath), PathError> {
    let start = find_closest_index(context, start_position).ok_or(PathError::EmptyNavmesh)?;
    let end = find_closest_index(context, end_position).ok_or(PathError::EmptyNavmesh)?;

    let path = astar(context, start, end)?;
    Ok((path_to_points(context, &path.indices), path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::geometry::Polygon;
    use crate::navigation::navmesh::{
        NavmeshNode, generate_mesh_nodes, generate_mesh_nodes_with_obstacles, generate_mesh_points,
    };

    fn grid(size: f32, obstacles: &[Polygon]) -> NavmeshContext {
        let points = generate_mesh_points(Vec2::ZERO, size, size, 1.0, obstacles);
        let nodes = generate_mesh_nodes_with_obstacles(&points, 1.5, obstacles);
        NavmeshContext::new(points, nodes)
    }

    fn index_of(context: &NavmeshContext, point: Vec2) -> usize {
        find_closest_index(context, point).unwrap()
    }

    fn assert_connected(context: &NavmeshContext, indices: &[usize]) {
        for pair in indices.windows(2) {
            assert!(
                context.nodes[pair[0]].neighbours().contains(&pair[1]),
                "{} -> {} is not an edge",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_same_node_is_trivial_success() {
        let context = grid(5.0, &[]);
        let path = astar(&context, 7, 7).unwrap();

        assert!(path.is_trivial());
        assert_eq!(path.nodes_evaluated, 0);
    }

    #[test]
    fn test_corner_to_corner() {
        let context = grid(10.0, &[]);
        let start = index_of(&context, Vec2::new(0.0, 0.0));
        let end = index_of(&context, Vec2::new(9.0, 9.0));

        let path = astar(&context, start, end).unwrap();

        assert_eq!(path.indices.first(), Some(&start));
        assert_eq!(path.indices.last(), Some(&end));
        assert!(path.indices.len() >= 10 && path.indices.len() <= 18);
        // Straight diagonal is optimal with the admissible heuristic
        assert_eq!(path.indices.len(), 10);
        assert_connected(&context, &path.indices);
    }

    #[test]
    fn test_squared_heuristic_still_connects() {
        let context = grid(10.0, &[]);
        let start = index_of(&context, Vec2::new(0.0, 9.0));
        let end = index_of(&context, Vec2::new(9.0, 2.0));

        let path = astar_with_heuristic(&context, start, end, Heuristic::SquaredEuclidean).unwrap();

        assert_eq!(path.indices.first(), Some(&start));
        assert_eq!(path.indices.last(), Some(&end));
        assert_connected(&context, &path.indices);
    }

    #[test]
    fn test_goes_around_wall() {
        let wall = Polygon::rect(Vec2::new(4.5, -1.0), Vec2::new(5.5, 7.5));
        let context = grid(10.0, &[wall.clone()]);
        let start = index_of(&context, Vec2::new(2.0, 2.0));
        let end = index_of(&context, Vec2::new(8.0, 2.0));

        let path = astar(&context, start, end).unwrap();
        let points = path_to_points(&context, &path.indices);

        assert_connected(&context, &path.indices);
        assert!(points.iter().any(|p| p.y >= 7.5), "path should pass above the wall");
        for pair in points.windows(2) {
            assert!(!wall.intersects_segment(pair[0], pair[1]));
        }
    }

    #[test]
    fn test_isolated_end_fails_without_hanging() {
        // Regression: a failed search must never walk the predecessor map
        let mut points = generate_mesh_points(Vec2::ZERO, 5.0, 5.0, 1.0, &[]);
        let mut nodes = generate_mesh_nodes(&points, 1.5, |_, _| false);
        let island = points.len();
        points.push(Vec2::new(50.0, 50.0));
        nodes.push(NavmeshNode::new(island));
        let context = NavmeshContext::new(points, nodes);

        let result = astar(&context, 0, island);
        assert_eq!(result, Err(PathError::NoPath { start: 0, end: island }));
    }

    #[test]
    fn test_walled_off_region_fails() {
        let wall = Polygon::rect(Vec2::new(4.5, -1.0), Vec2::new(5.5, 11.0));
        let context = grid(10.0, &[wall]);
        let start = index_of(&context, Vec2::new(1.0, 1.0));
        let end = index_of(&context, Vec2::new(8.0, 8.0));

        assert!(matches!(astar(&context, start, end), Err(PathError::NoPath { .. })));
    }

    #[test]
    fn test_invalid_inputs() {
        let context = grid(3.0, &[]);

        assert_eq!(astar(&context, 0, 99), Err(PathError::InvalidNode(99)));
        assert_eq!(astar(&context, 42, 0), Err(PathError::InvalidNode(42)));
        assert_eq!(
            astar(&NavmeshContext::default(), 0, 1),
            Err(PathError::EmptyNavmesh)
        );
    }

    #[test]
    fn test_path_to_points_matches_indices() {
        let context = grid(10.0, &[]);
        let path = astar(&context, 0, 99).unwrap();
        let points = path_to_points(&context, &path.indices);

        assert_eq!(points.len(), path.indices.len());
        for (point, &index) in points.iter().zip(&path.indices) {
            assert_eq!(*point, context.points[index]);
        }
    }

    #[test]
    fn test_find_path_points_between_positions() {
        let context = grid(10.0, &[]);
        let (points, path) =
            find_path_points(&context, Vec2::new(0.1, 0.2), Vec2::new(6.2, 0.1)).unwrap();

        assert_eq!(points.first(), Some(&Vec2::new(0.0, 0.0)));
        assert_eq!(points.last(), Some(&Vec2::new(6.0, 0.0)));
        assert_eq!(points.len(), path.indices.len());
    }
}
