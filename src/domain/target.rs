//! The scoring-area polygon.

use super::geometry::{
    self, closest_point_on_polygon, point_in_polygon, polygon_bbox, polygon_centroid, Point,
};

/// Ordered vertex list describing the scoring area in frame-pixel space.
///
/// Set opportunistically from detection events or the startup bootstrap;
/// a camera without a target still tracks arrows but can only report
/// target-less verdicts.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetPolygon {
    vertices: Vec<Point>,
}

impl TargetPolygon {
    /// Wrap an ordered vertex list. Degenerate inputs (< 3 vertices) are
    /// accepted but contain nothing.
    pub fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    /// Borrow the vertex list.
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Whether `p` lies inside the polygon.
    pub fn contains(&self, p: Point) -> bool {
        point_in_polygon(p, &self.vertices)
    }

    /// Area-moment centroid, `None` for zero-area polygons.
    pub fn centroid(&self) -> Option<Point> {
        polygon_centroid(&self.vertices)
    }

    /// Closest point to `p` on the polygon boundary.
    pub fn closest_boundary_point(&self, p: Point) -> Option<Point> {
        closest_point_on_polygon(p, &self.vertices)
    }

    /// Axis-aligned bounding box (min_x, min_y, max_x, max_y).
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        polygon_bbox(&self.vertices)
    }

    /// Largest y coordinate of any vertex (the visually lowest edge).
    pub fn bottom_y(&self) -> Option<f64> {
        self.vertices
            .iter()
            .map(|v| v[1])
            .fold(None, |acc, y| Some(acc.map_or(y, |m: f64| m.max(y))))
    }

    /// Project every vertex into a viewer's render space.
    pub fn to_render(&self, frame_size: (u32, u32), render_size: (u32, u32)) -> Vec<Point> {
        self.vertices
            .iter()
            .map(|&v| geometry::to_render_coords(v, frame_size, render_size))
            .collect()
    }
}
