//! Navmesh construction
//!
//! A navmesh here is a sparse waypoint graph: a regular grid of points with
//! obstacle points removed, and each point linked to at most
//! [`MAX_NEIGHBOURS`] reachable points nearby.
//!
//! Building the node links scans every pair of points, O(n²) in the point
//! count. Levels are bounded in size so this runs once at level load; very
//! large regions should be split before they reach this code.

use glam::Vec2;
use log::warn;
use smallvec::SmallVec;

use super::geometry::Polygon;

/// Maximum number of links per navmesh node
pub const MAX_NEIGHBOURS: usize = 8;

/// Largest grid a single navmesh may sample
pub const MAX_GRID_POINTS: usize = 1 << 16;

/// A node in the navmesh graph.
///
/// `data_index` is the identity of the node and indexes into
/// [`NavmeshContext::points`]. A node never lists itself as a neighbour.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NavmeshNode {
    /// Index of this node's point
    pub data_index: usize,
    /// Linked node indices, unordered
    neighbours: SmallVec<[usize; MAX_NEIGHBOURS]>,
}

impl NavmeshNode {
    /// Create a node without links
    #[must_use]
    pub fn new(data_index: usize) -> Self {
        Self {
            data_index,
            neighbours: SmallVec::new(),
        }
    }

    /// Linked node indices
    #[must_use]
    pub fn neighbours(&self) -> &[usize] {
        &self.neighbours
    }

    /// Link another node.
    ///
    /// Returns false if the node is full, the index is this node, or it is
    /// already linked.
    pub fn add_neighbour(&mut self, index: usize) -> bool {
        if self.is_full() || index == self.data_index || self.neighbours.contains(&index) {
            return false;
        }
        self.neighbours.push(index);
        true
    }

    /// Check if the fan-out cap has been reached
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.neighbours.len() >= MAX_NEIGHBOURS
    }
}

/// Points and nodes of a built navmesh.
///
/// `points` and `nodes` are parallel; index `i` in one matches index `i` in
/// the other.
#[derive(Debug, Clone, Default)]
pub struct NavmeshContext {
    /// Waypoint positions, index = node identity
    pub points: Vec<Vec2>,
    /// Graph nodes
    pub nodes: Vec<NavmeshNode>,
}

impl NavmeshContext {
    /// Build a context from points and nodes
    #[must_use]
    pub fn new(points: Vec<Vec2>, nodes: Vec<NavmeshNode>) -> Self {
        debug_assert_eq!(points.len(), nodes.len());
        Self { points, nodes }
    }

    /// Number of nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the navmesh holds no nodes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() || self.points.is_empty()
    }

    /// Position of a node
    #[must_use]
    pub fn point(&self, index: usize) -> Option<Vec2> {
        self.points.get(index).copied()
    }

    /// Node by index
    #[must_use]
    pub fn node(&self, index: usize) -> Option<&NavmeshNode> {
        self.nodes.get(index)
    }

    /// Drop all points and nodes
    pub fn clear(&mut self) {
        self.points.clear();
        self.nodes.clear();
    }

    /// Iterate over every directed link as world-space segments
    pub fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        self.nodes.iter().flat_map(move |node| {
            let from = self.points[node.data_index];
            node.neighbours()
                .iter()
                .filter_map(move |&n| self.points.get(n).map(|&to| (from, to)))
        })
    }

    /// Total number of directed links
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|node| node.neighbours().len()).sum()
    }
}

/// Generate a regular grid of candidate points and remove the ones inside
/// any obstacle.
///
/// Produces `floor(width / density) * floor(height / density)` candidates,
/// iterating columns first. Non-positive (or NaN) extents or density yield
/// an empty sequence.
#[must_use]
pub fn generate_mesh_points(
    start: Vec2,
    width: f32,
    height: f32,
    density: f32,
    obstacles: &[Polygon],
) -> Vec<Vec2> {
    let mut points = generate_grid_points(start, width, height, density);
    if !obstacles.is_empty() {
        points.retain(|&point| !obstacles.iter().any(|polygon| polygon.contains(point)));
    }
    points
}

/// Generate the unfiltered point grid.
///
/// A grid of more than [`MAX_GRID_POINTS`] points is refused with a
/// warning and yields an empty sequence.
#[must_use]
pub fn generate_grid_points(start: Vec2, width: f32, height: f32, density: f32) -> Vec<Vec2> {
    if !(density > 0.0 && width > 0.0 && height > 0.0) {
        return Vec::new();
    }

    // Float to int casts saturate, so huge ratios end up rejected below
    let n_width_points = (width / density).floor() as usize;
    let n_height_points = (height / density).floor() as usize;

    let Some(count) = n_width_points
        .checked_mul(n_height_points)
        .filter(|&count| count <= MAX_GRID_POINTS)
    else {
        warn!(
            "Navmesh grid of {n_width_points}x{n_height_points} points at density {density} exceeds {MAX_GRID_POINTS}"
        );
        return Vec::new();
    };

    let mut points = Vec::with_capacity(count);
    for width_index in 0..n_width_points {
        for height_index in 0..n_height_points {
            points.push(start + Vec2::new(width_index as f32, height_index as f32) * density);
        }
    }

    points
}

/// Link every point to at most [`MAX_NEIGHBOURS`] nearby points.
///
/// Candidates within `connection_distance` are considered nearest first
/// (scan order on equal distance); `is_blocked(a, b)` rejects pairs whose
/// straight line is obstructed. Zero-distance pairs are skipped.
#[must_use]
pub fn generate_mesh_nodes<F>(
    points: &[Vec2],
    connection_distance: f32,
    is_blocked: F,
) -> Vec<NavmeshNode>
where
    F: Fn(Vec2, Vec2) -> bool,
{
    let mut nodes = Vec::with_capacity(points.len());
    let mut candidates: Vec<(f32, usize)> = Vec::new();

    for (index, &point) in points.iter().enumerate() {
        let mut node = NavmeshNode::new(index);

        candidates.clear();
        for (inner_index, &inner_point) in points.iter().enumerate() {
            let distance = point.distance(inner_point);
            if distance == 0.0 || distance > connection_distance {
                continue;
            }
            candidates.push((distance, inner_index));
        }

        // Stable sort keeps scan order for equal distances
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

        for &(_, inner_index) in &candidates {
            if node.is_full() {
                break;
            }
            if is_blocked(point, points[inner_index]) {
                continue;
            }
            node.add_neighbour(inner_index);
        }

        nodes.push(node);
    }

    nodes
}

/// Link points, rejecting pairs whose segment touches an obstacle polygon
#[must_use]
pub fn generate_mesh_nodes_with_obstacles(
    points: &[Vec2],
    connection_distance: f32,
    obstacles: &[Polygon],
) -> Vec<NavmeshNode> {
    generate_mesh_nodes(points, connection_distance, |a, b| {
        obstacles.iter().any(|polygon| polygon.intersects_segment(a, b))
    })
}

/// Index of the node closest to `point`.
///
/// Returns `None` for an empty navmesh. Equal distances keep the first
/// node in scan order.
#[must_use]
pub fn find_closest_index(context: &NavmeshContext, point: Vec2) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;

    for (index, candidate) in context.points.iter().enumerate() {
        let distance = candidate.distance_squared(point);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((index, distance)),
        }
    }

    best.map(|(index, _)| index)
}

/// Map node indices to world positions, preserving order.
///
/// Indices outside the navmesh are skipped.
#[must_use]
pub fn path_to_points(context: &NavmeshContext, path_indices: &[usize]) -> Vec<Vec2> {
    path_indices
        .iter()
        .filter_map(|&index| context.point(index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid(size: f32) -> NavmeshContext {
        let points = generate_mesh_points(Vec2::ZERO, size, size, 1.0, &[]);
        let nodes = generate_mesh_nodes(&points, 1.5, |_, _| false);
        NavmeshContext::new(points, nodes)
    }

    #[test]
    fn test_point_count_without_obstacles() {
        let points = generate_mesh_points(Vec2::ZERO, 10.0, 10.0, 1.0, &[]);
        assert_eq!(points.len(), 100);

        let points = generate_mesh_points(Vec2::new(-3.0, 2.0), 7.5, 4.2, 0.5, &[]);
        assert_eq!(points.len(), 15 * 8);
    }

    #[test]
    fn test_points_are_deterministic() {
        let a = generate_mesh_points(Vec2::new(1.0, 1.0), 5.0, 3.0, 1.0, &[]);
        let b = generate_mesh_points(Vec2::new(1.0, 1.0), 5.0, 3.0, 1.0, &[]);
        assert_eq!(a, b);
        assert_eq!(a[0], Vec2::new(1.0, 1.0));
        assert_eq!(a[1], Vec2::new(1.0, 2.0));
    }

    #[test]
    fn test_degenerate_inputs_produce_nothing() {
        assert!(generate_mesh_points(Vec2::ZERO, 10.0, 10.0, 0.0, &[]).is_empty());
        assert!(generate_mesh_points(Vec2::ZERO, 10.0, 10.0, -1.0, &[]).is_empty());
        assert!(generate_mesh_points(Vec2::ZERO, 0.0, 10.0, 1.0, &[]).is_empty());
        assert!(generate_mesh_points(Vec2::ZERO, 10.0, -5.0, 1.0, &[]).is_empty());
        assert!(generate_mesh_points(Vec2::ZERO, 10.0, 10.0, f32::NAN, &[]).is_empty());
    }

    #[test]
    fn test_oversized_grid_is_refused() {
        assert!(generate_mesh_points(Vec2::ZERO, 1.0e6, 1.0e6, 1.0e-4, &[]).is_empty());
        assert!(generate_grid_points(Vec2::ZERO, f32::INFINITY, 10.0, 1.0).is_empty());
        assert!(generate_grid_points(Vec2::ZERO, 1000.0, 1000.0, 1.0).is_empty());

        // Exactly at the limit is still built
        let points = generate_grid_points(Vec2::ZERO, 256.0, 256.0, 1.0);
        assert_eq!(points.len(), MAX_GRID_POINTS);
    }

    #[test]
    fn test_covering_obstacle_removes_everything() {
        let cover = Polygon::rect(Vec2::splat(-1.0), Vec2::splat(11.0));
        let points = generate_mesh_points(Vec2::ZERO, 10.0, 10.0, 1.0, &[cover]);
        assert!(points.is_empty());
    }

    #[test]
    fn test_obstacle_removes_inner_points() {
        let block = Polygon::rect(Vec2::new(2.5, 2.5), Vec2::new(4.5, 4.5));
        let points = generate_mesh_points(Vec2::ZERO, 10.0, 10.0, 1.0, &[block]);

        assert_eq!(points.len(), 96);
        assert!(!points.contains(&Vec2::new(3.0, 3.0)));
    }

    #[test]
    fn test_nodes_never_link_themselves() {
        let context = open_grid(10.0);

        for node in &context.nodes {
            assert!(!node.neighbours().contains(&node.data_index));
            assert!(node.neighbours().len() <= MAX_NEIGHBOURS);

            let point = context.points[node.data_index];
            for &n in node.neighbours() {
                assert!(point.distance(context.points[n]) <= 1.5);
            }
        }
    }

    #[test]
    fn test_interior_node_has_eight_neighbours() {
        let context = open_grid(10.0);

        // (5, 5) is index 5 * 10 + 5 with column-major generation
        let node = &context.nodes[55];
        assert_eq!(node.neighbours().len(), 8);

        // Corner only reaches three
        assert_eq!(context.nodes[0].neighbours().len(), 3);
    }

    #[test]
    fn test_fan_out_is_capped_nearest_first() {
        // 13 points around the origin: 4 at distance 1, 4 at sqrt(2), 4 at 2
        let mut points = vec![Vec2::ZERO];
        for &(x, y) in &[
            (1.0, 0.0),
            (0.0, 1.0),
            (-1.0, 0.0),
            (0.0, -1.0),
            (2.0, 0.0),
            (0.0, 2.0),
            (-2.0, 0.0),
            (0.0, -2.0),
            (1.0, 1.0),
            (-1.0, 1.0),
            (1.0, -1.0),
            (-1.0, -1.0),
        ] {
            points.push(Vec2::new(x, y));
        }

        let nodes = generate_mesh_nodes(&points, 3.0, |_, _| false);
        let centre = &nodes[0];

        assert_eq!(centre.neighbours().len(), MAX_NEIGHBOURS);
        for &n in centre.neighbours() {
            assert!(points[n].length() < 1.5, "kept a far neighbour {n}");
        }
    }

    #[test]
    fn test_blocked_pairs_are_not_linked() {
        let points = generate_mesh_points(Vec2::ZERO, 3.0, 1.0, 1.0, &[]);
        let wall = Polygon::rect(Vec2::new(0.4, -1.0), Vec2::new(0.6, 2.0));
        let nodes = generate_mesh_nodes_with_obstacles(&points, 1.5, &[wall]);

        // Points: (0,0) (1,0) (2,0); the wall splits 0 from 1
        assert!(nodes[0].neighbours().is_empty());
        assert_eq!(nodes[1].neighbours(), &[2]);
    }

    #[test]
    fn test_find_closest_index() {
        let context = open_grid(10.0);

        let index = find_closest_index(&context, Vec2::new(3.2, 6.9)).unwrap();
        assert_eq!(context.points[index], Vec2::new(3.0, 7.0));

        assert_eq!(find_closest_index(&NavmeshContext::default(), Vec2::ZERO), None);
    }

    #[test]
    fn test_path_to_points_preserves_order() {
        let context = open_grid(4.0);
        let points = path_to_points(&context, &[0, 5, 10, 15]);

        assert_eq!(
            points,
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(2.0, 2.0),
                Vec2::new(3.0, 3.0)
            ]
        );
    }

    #[test]
    fn test_edges_match_neighbour_count() {
        let context = open_grid(3.0);
        assert_eq!(context.edges().count(), context.edge_count());
        assert!(context.edge_count() > 0);
    }
}
