//! Polygon helpers used when building a navmesh from level geometry

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A closed polygon in world space.
///
/// Vertices are listed in order (either winding); the last vertex connects
/// back to the first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    /// Polygon vertices
    pub vertices: Vec<Vec2>,
}

impl Polygon {
    /// Create a polygon from its vertices
    #[must_use]
    pub fn new(vertices: Vec<Vec2>) -> Self {
        Self { vertices }
    }

    /// Axis aligned rectangle spanning `min` to `max`
    #[must_use]
    pub fn rect(min: Vec2, max: Vec2) -> Self {
        Self {
            vertices: vec![
                Vec2::new(min.x, min.y),
                Vec2::new(max.x, min.y),
                Vec2::new(max.x, max.y),
                Vec2::new(min.x, max.y),
            ],
        }
    }

    /// Check if a point lies inside this polygon
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point_inside_polygon(point, &self.vertices)
    }

    /// Check if the segment `a -> b` touches this polygon
    #[must_use]
    pub fn intersects_segment(&self, a: Vec2, b: Vec2) -> bool {
        segment_intersects_polygon(a, b, &self.vertices)
    }

    /// Iterate over the polygon edges
    pub fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let count = self.vertices.len();
        (0..count).map(move |i| (self.vertices[i], self.vertices[(i + 1) % count]))
    }
}

/// Even-odd point in polygon test.
///
/// Degenerate polygons (fewer than three vertices) contain nothing.
#[must_use]
pub fn point_inside_polygon(point: Vec2, vertices: &[Vec2]) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = vertices.len() - 1;

    for i in 0..vertices.len() {
        let vi = vertices[i];
        let vj = vertices[j];

        if (vi.y > point.y) != (vj.y > point.y) {
            let x_cross = (vj.x - vi.x) * (point.y - vi.y) / (vj.y - vi.y) + vi.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }

        j = i;
    }

    inside
}

/// Check if two segments intersect (touching counts)
#[must_use]
pub fn segments_intersect(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> bool {
    let d1 = orientation(b1, b2, a1);
    let d2 = orientation(b1, b2, a2);
    let d3 = orientation(a1, a2, b1);
    let d4 = orientation(a1, a2, b2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(b1, b2, a1))
        || (d2 == 0.0 && on_segment(b1, b2, a2))
        || (d3 == 0.0 && on_segment(a1, a2, b1))
        || (d4 == 0.0 && on_segment(a1, a2, b2))
}

/// Check if a segment crosses a polygon edge or lies inside it
#[must_use]
pub fn segment_intersects_polygon(a: Vec2, b: Vec2, vertices: &[Vec2]) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    if point_inside_polygon(a, vertices) || point_inside_polygon(b, vertices) {
        return true;
    }

    let count = vertices.len();
    (0..count).any(|i| segments_intersect(a, b, vertices[i], vertices[(i + 1) % count]))
}

/// Cross product sign of `(b - a) x (c - a)`
fn orientation(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a)
}

/// `c` is collinear with `a -> b`; check it lies within the bounding box
fn on_segment(a: Vec2, b: Vec2, c: Vec2) -> bool {
    c.x >= a.x.min(b.x) && c.x <= a.x.max(b.x) && c.y >= a.y.min(b.y) && c.y <= a.y.max(b.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_inside_rect() {
        let rect = Polygon::rect(Vec2::ZERO, Vec2::new(2.0, 2.0));

        assert!(rect.contains(Vec2::new(1.0, 1.0)));
        assert!(!rect.contains(Vec2::new(3.0, 1.0)));
        assert!(!rect.contains(Vec2::new(-0.5, 1.0)));
    }

    #[test]
    fn test_point_inside_concave() {
        // L-shape
        let l_shape = Polygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(3.0, 0.0),
            Vec2::new(3.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 3.0),
            Vec2::new(0.0, 3.0),
        ]);

        assert!(l_shape.contains(Vec2::new(0.5, 2.5)));
        assert!(l_shape.contains(Vec2::new(2.5, 0.5)));
        assert!(!l_shape.contains(Vec2::new(2.0, 2.0)));
    }

    #[test]
    fn test_degenerate_polygon_contains_nothing() {
        let line = Polygon::new(vec![Vec2::ZERO, Vec2::ONE]);
        assert!(!line.contains(Vec2::new(0.5, 0.5)));
    }

    #[test]
    fn test_segments_intersect() {
        assert!(segments_intersect(
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(0.0, 2.0),
            Vec2::new(2.0, 0.0),
        ));
        assert!(!segments_intersect(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
        ));
    }

    #[test]
    fn test_segment_through_polygon() {
        let wall = Polygon::rect(Vec2::new(4.0, -1.0), Vec2::new(5.0, 1.0));

        assert!(wall.intersects_segment(Vec2::new(0.0, 0.0), Vec2::new(8.0, 0.0)));
        assert!(!wall.intersects_segment(Vec2::new(0.0, 3.0), Vec2::new(8.0, 3.0)));
    }
}
