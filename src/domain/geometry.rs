//! Frame-pixel-space geometry primitives.
//!
//! All coordinates are in frame pixels (origin top-left, y grows
//! downward). Polygons are ordered vertex lists; no self-intersection
//! handling is attempted beyond what the ray-casting test tolerates.

/// A 2-D point in frame-pixel space.
pub type Point = [f64; 2];

/// Point-in-polygon test via ray casting.
///
/// Returns `false` for degenerate polygons (< 3 vertices). Points
/// exactly on an edge may land on either side; callers that care about
/// boundary points should not.
pub fn point_in_polygon(p: Point, vertices: &[Point]) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    let [x, y] = p;
    let mut inside = false;
    let n = vertices.len();
    let mut j = n - 1;
    for i in 0..n {
        let [xi, yi] = vertices[i];
        let [xj, yj] = vertices[j];
        if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Closest point to `p` on the polygon boundary.
///
/// Walks every edge, projects `p` onto it (clamped to the segment), and
/// keeps the nearest candidate. Zero-length edges are skipped; returns
/// `None` when no edge yields a projection.
pub fn closest_point_on_polygon(p: Point, vertices: &[Point]) -> Option<Point> {
    let [px, py] = p;
    let mut min_dist = f64::INFINITY;
    let mut closest: Option<Point> = None;

    let n = vertices.len();
    for i in 0..n {
        let [x1, y1] = vertices[i];
        let [x2, y2] = vertices[(i + 1) % n];

        let dx = x2 - x1;
        let dy = y2 - y1;
        if dx == 0.0 && dy == 0.0 {
            continue;
        }

        let t = (((px - x1) * dx + (py - y1) * dy) / (dx * dx + dy * dy)).clamp(0.0, 1.0);
        let cx = x1 + t * dx;
        let cy = y1 + t * dy;

        let dist = ((px - cx).powi(2) + (py - cy).powi(2)).sqrt();
        if dist < min_dist {
            min_dist = dist;
            closest = Some([cx, cy]);
        }
    }

    closest
}

/// Polygon centroid from area moments.
///
/// Uses the shoelace moments m00, m10, m01:
///
/// ```text
/// m00 = ½ Σ (xᵢ·yᵢ₊₁ − xᵢ₊₁·yᵢ)
/// m10 = ⅙ Σ (xᵢ + xᵢ₊₁)(xᵢ·yᵢ₊₁ − xᵢ₊₁·yᵢ)
/// m01 = ⅙ Σ (yᵢ + yᵢ₊₁)(xᵢ·yᵢ₊₁ − xᵢ₊₁·yᵢ)
/// ```
///
/// centroid = (m10/m00, m01/m00). Returns `None` when |m00| ≈ 0
/// (degenerate polygon with no area).
pub fn polygon_centroid(vertices: &[Point]) -> Option<Point> {
    if vertices.len() < 3 {
        return None;
    }
    let n = vertices.len();
    let mut m00 = 0.0;
    let mut m10 = 0.0;
    let mut m01 = 0.0;
    for i in 0..n {
        let [xi, yi] = vertices[i];
        let [xj, yj] = vertices[(i + 1) % n];
        let cross = xi * yj - xj * yi;
        m00 += cross;
        m10 += (xi + xj) * cross;
        m01 += (yi + yj) * cross;
    }
    m00 /= 2.0;
    if m00.abs() < 1e-9 {
        return None;
    }
    Some([m10 / (6.0 * m00), m01 / (6.0 * m00)])
}

/// Intersection of the infinite lines through (p1, p2) and (q1, q2).
///
/// Returns `None` for (near-)parallel lines (|denominator| < 1e-6).
pub fn line_intersection(p1: Point, p2: Point, q1: Point, q2: Point) -> Option<Point> {
    let [x1, y1] = p1;
    let [x2, y2] = p2;
    let [x3, y3] = q1;
    let [x4, y4] = q2;

    let denom = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
    if denom.abs() < 1e-6 {
        return None;
    }

    let px = ((x1 * y2 - y1 * x2) * (x3 - x4) - (x1 - x2) * (x3 * y4 - y3 * x4)) / denom;
    let py = ((x1 * y2 - y1 * x2) * (y3 - y4) - (y1 - y2) * (x3 * y4 - y3 * x4)) / denom;

    Some([px, py])
}

/// Axis-aligned bounding box of a polygon: (min_x, min_y, max_x, max_y).
pub fn polygon_bbox(vertices: &[Point]) -> Option<(f64, f64, f64, f64)> {
    let first = vertices.first()?;
    let mut min_x = first[0];
    let mut max_x = first[0];
    let mut min_y = first[1];
    let mut max_y = first[1];
    for &[x, y] in vertices.iter().skip(1) {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    Some((min_x, min_y, max_x, max_y))
}

/// Map a frame-space point into a viewer's letterboxed render space.
///
/// ```text
/// scale = min(render_w / frame_w, render_h / frame_h)
/// pad   = (render − frame·scale) / 2       (per axis)
/// out   = frame_point · scale + pad
/// ```
pub fn to_render_coords(p: Point, frame_size: (u32, u32), render_size: (u32, u32)) -> Point {
    let (frame_w, frame_h) = (frame_size.0 as f64, frame_size.1 as f64);
    let (render_w, render_h) = (render_size.0 as f64, render_size.1 as f64);

    let scale = (render_w / frame_w).min(render_h / frame_h);
    let pad_x = (render_w - frame_w * scale) / 2.0;
    let pad_y = (render_h - frame_h * scale) / 2.0;

    [p[0] * scale + pad_x, p[1] * scale + pad_y]
}

/// Whether a point lies inside an axis-aligned rectangle (x1, y1, x2, y2),
/// boundary inclusive.
pub fn point_in_rect(p: Point, rect: [f64; 4]) -> bool {
    let [x, y] = p;
    let [x1, y1, x2, y2] = rect;
    x1 <= x && x <= x2 && y1 <= y && y <= y2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point> {
        vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]
    }

    #[test]
    fn test_point_in_polygon() {
        let poly = square();
        assert!(point_in_polygon([5.0, 5.0], &poly));
        assert!(!point_in_polygon([15.0, 5.0], &poly));
        assert!(!point_in_polygon([-1.0, 5.0], &poly));
    }

    #[test]
    fn test_degenerate_polygon_contains_nothing() {
        let line = vec![[0.0, 0.0], [10.0, 0.0]];
        assert!(!point_in_polygon([5.0, 0.0], &line));
    }

    /// The polygon's own centroid always reports inside.
    #[test]
    fn test_centroid_is_inside() {
        let poly = vec![[100.0, 50.0], [300.0, 60.0], [320.0, 240.0], [90.0, 230.0]];
        let c = polygon_centroid(&poly).unwrap();
        assert!(point_in_polygon(c, &poly));
    }

    #[test]
    fn test_centroid_of_square() {
        let c = polygon_centroid(&square()).unwrap();
        assert!((c[0] - 5.0).abs() < 1e-9);
        assert!((c[1] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_centroid_degenerate() {
        assert!(polygon_centroid(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]).is_none());
    }

    #[test]
    fn test_closest_point_on_polygon() {
        let poly = square();
        // Point to the right of the square projects onto the right edge.
        let c = closest_point_on_polygon([20.0, 5.0], &poly).unwrap();
        assert!((c[0] - 10.0).abs() < 1e-9);
        assert!((c[1] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_line_intersection() {
        // Diagonals of the unit square cross at its center.
        let p = line_intersection([0.0, 0.0], [1.0, 1.0], [0.0, 1.0], [1.0, 0.0]).unwrap();
        assert!((p[0] - 0.5).abs() < 1e-9);
        assert!((p[1] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_line_intersection_parallel() {
        assert!(line_intersection([0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]).is_none());
    }

    /// Identity transform when render size equals frame size.
    #[test]
    fn test_render_coords_identity() {
        let p = to_render_coords([123.0, 456.0], (1280, 720), (1280, 720));
        assert!((p[0] - 123.0).abs() < 1e-9);
        assert!((p[1] - 456.0).abs() < 1e-9);
    }

    #[test]
    fn test_render_coords_letterbox() {
        // 1280x720 frame into a 640x480 viewer: scale 0.5, vertical pad 60.
        let p = to_render_coords([0.0, 0.0], (1280, 720), (640, 480));
        assert!((p[0] - 0.0).abs() < 1e-9);
        assert!((p[1] - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_point_in_rect() {
        let rect = [640.0, 280.0, 700.0, 410.0];
        assert!(point_in_rect([650.0, 300.0], rect));
        assert!(point_in_rect([640.0, 280.0], rect));
        assert!(!point_in_rect([639.0, 300.0], rect));
    }
}
