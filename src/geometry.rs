//! Geometry primitives: rectangle and segment math.
//!
//! Leaf module with no dependency on the spec model. All functions are
//! total over well-formed rectangles (w >= 0, h >= 0) and never panic.

/// A 2D point in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// An axis-aligned rectangle `{x, y, w, h}`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Right edge x-coordinate.
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    /// Bottom edge y-coordinate.
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    /// Check if this rectangle contains a point (boundary inclusive).
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Check if this rectangle intersects another (shared boundary does not count).
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Grow the rectangle by `pad` on every side.
    pub fn expand(&self, pad: f64) -> Rect {
        Rect::new(self.x - pad, self.y - pad, self.w + 2.0 * pad, self.h + 2.0 * pad)
    }

    /// Minimum distance from any edge of this rectangle to the nearest
    /// canvas edge. Negative when the rectangle sticks out.
    pub fn min_margin(&self, canvas_w: f64, canvas_h: f64) -> f64 {
        let left = self.x;
        let top = self.y;
        let right = canvas_w - self.right();
        let bottom = canvas_h - self.bottom();
        left.min(top).min(right).min(bottom)
    }

    /// Whether any part of the rectangle lies outside `[0,canvas_w]x[0,canvas_h]`.
    pub fn outside_canvas(&self, canvas_w: f64, canvas_h: f64) -> bool {
        self.x < 0.0 || self.y < 0.0 || self.right() > canvas_w || self.bottom() > canvas_h
    }
}

/// Overlap ratio of two rectangles: intersection area divided by the
/// smaller rectangle's area. 0.0 when disjoint or either is degenerate,
/// 1.0 when the smaller is fully covered.
pub fn pair_overlap_ratio(a: &Rect, b: &Rect) -> f64 {
    let ix = (a.right().min(b.right()) - a.x.max(b.x)).max(0.0);
    let iy = (a.bottom().min(b.bottom()) - a.y.max(b.y)).max(0.0);
    let inter = ix * iy;
    if inter <= 0.0 {
        return 0.0;
    }
    let min_area = a.area().min(b.area());
    if min_area <= 0.0 {
        return 0.0;
    }
    (inter / min_area).min(1.0)
}

/// True geometric intersection of a segment with a rectangle: either an
/// endpoint is inside, or the segment crosses one of the four edges.
pub fn segment_intersects_rect(p1: Point, p2: Point, rect: &Rect) -> bool {
    if rect.contains(p1) || rect.contains(p2) {
        return true;
    }

    let tl = Point::new(rect.x, rect.y);
    let tr = Point::new(rect.right(), rect.y);
    let bl = Point::new(rect.x, rect.bottom());
    let br = Point::new(rect.right(), rect.bottom());

    segments_intersect(p1, p2, tl, tr)
        || segments_intersect(p1, p2, bl, br)
        || segments_intersect(p1, p2, tl, bl)
        || segments_intersect(p1, p2, tr, br)
}

/// Parametric segment intersection test (endpoint touches count).
/// Parallel segments are treated as non-intersecting.
pub fn segments_intersect(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    segment_params(a1, a2, b1, b2)
        .map(|(t, u)| (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u))
        .unwrap_or(false)
}

/// Proper interior crossing of two segments: intersection strictly inside
/// both, so shared endpoints and T-touches do not count.
pub fn segments_properly_cross(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    const EPS: f64 = 1e-9;
    segment_params(a1, a2, b1, b2)
        .map(|(t, u)| t > EPS && t < 1.0 - EPS && u > EPS && u < 1.0 - EPS)
        .unwrap_or(false)
}

/// Proper interior crossing specialized for axis-aligned segments, the
/// common case for orthogonal polylines. One segment must be horizontal
/// and the other vertical to cross; collinear overlaps do not count.
pub fn axis_aligned_proper_cross(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    const EPS: f64 = 1e-9;
    let a_horizontal = (a1.y - a2.y).abs() < EPS;
    let b_horizontal = (b1.y - b2.y).abs() < EPS;
    if a_horizontal == b_horizontal {
        return false;
    }
    let (h1, h2, v1, v2) = if a_horizontal { (a1, a2, b1, b2) } else { (b1, b2, a1, a2) };
    let (hx_min, hx_max) = (h1.x.min(h2.x), h1.x.max(h2.x));
    let (vy_min, vy_max) = (v1.y.min(v2.y), v1.y.max(v2.y));
    v1.x > hx_min + EPS && v1.x < hx_max - EPS && h1.y > vy_min + EPS && h1.y < vy_max - EPS
}

/// Minimum Euclidean distance from any point of the segment to the
/// rectangle (boundary or interior). 0.0 if they already intersect.
pub fn dist_segment_to_rect(p1: Point, p2: Point, rect: &Rect) -> f64 {
    if segment_intersects_rect(p1, p2, rect) {
        return 0.0;
    }

    let tl = Point::new(rect.x, rect.y);
    let tr = Point::new(rect.right(), rect.y);
    let bl = Point::new(rect.x, rect.bottom());
    let br = Point::new(rect.right(), rect.bottom());

    let edges = [(tl, tr), (bl, br), (tl, bl), (tr, br)];
    let mut best = f64::INFINITY;
    for (e1, e2) in edges {
        best = best.min(dist_segment_to_segment(p1, p2, e1, e2));
    }
    best
}

/// Distance from a point to a segment.
pub fn dist_point_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len_sq = abx * abx + aby * aby;
    if len_sq <= 0.0 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / len_sq).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * abx, a.y + t * aby))
}

fn dist_segment_to_segment(a1: Point, a2: Point, b1: Point, b2: Point) -> f64 {
    if segments_intersect(a1, a2, b1, b2) {
        return 0.0;
    }
    dist_point_to_segment(a1, b1, b2)
        .min(dist_point_to_segment(a2, b1, b2))
        .min(dist_point_to_segment(b1, a1, a2))
        .min(dist_point_to_segment(b2, a1, a2))
}

/// Total length of a polyline.
pub fn polyline_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Number of direction changes in a polyline.
pub fn polyline_turns(points: &[Point]) -> usize {
    const EPS: f64 = 1e-9;
    let mut turns = 0;
    for w in points.windows(3) {
        let d1 = (w[1].x - w[0].x, w[1].y - w[0].y);
        let d2 = (w[2].x - w[1].x, w[2].y - w[1].y);
        let cross = d1.0 * d2.1 - d1.1 * d2.0;
        if cross.abs() > EPS {
            turns += 1;
        }
    }
    turns
}

/// Solve for the intersection parameters of two segments. None when
/// parallel (or degenerate).
fn segment_params(a1: Point, a2: Point, b1: Point, b2: Point) -> Option<(f64, f64)> {
    let d1x = a2.x - a1.x;
    let d1y = a2.y - a1.y;
    let d2x = b2.x - b1.x;
    let d2y = b2.y - b1.y;

    let denom = d1x * d2y - d1y * d2x;
    if denom.abs() < 1e-10 {
        return None;
    }

    let dx = b1.x - a1.x;
    let dy = b1.y - a1.y;
    let t = (dx * d2y - dy * d2x) / denom;
    let u = (dx * d1y - dy * d1x) / denom;
    Some((t, u))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges() {
        let r = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(r.right(), 110.0);
        assert_eq!(r.bottom(), 70.0);
        assert_eq!(r.center(), Point::new(60.0, 45.0));
    }

    #[test]
    fn test_overlap_ratio_symmetric() {
        let a = Rect::new(0.0, 0.0, 100.0, 60.0);
        let b = Rect::new(50.0, 0.0, 100.0, 60.0);
        assert_eq!(pair_overlap_ratio(&a, &b), pair_overlap_ratio(&b, &a));
        assert!((pair_overlap_ratio(&a, &b) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_overlap_ratio_disjoint_is_zero() {
        let a = Rect::new(0.0, 0.0, 50.0, 50.0);
        let b = Rect::new(100.0, 100.0, 50.0, 50.0);
        assert_eq!(pair_overlap_ratio(&a, &b), 0.0);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_overlap_ratio_contained_is_one() {
        let a = Rect::new(0.0, 0.0, 200.0, 200.0);
        let b = Rect::new(50.0, 50.0, 20.0, 20.0);
        assert_eq!(pair_overlap_ratio(&a, &b), 1.0);
    }

    #[test]
    fn test_overlap_ratio_near_full() {
        // Two 100x60 rects with centers 10px apart horizontally.
        let a = Rect::new(0.0, 0.0, 100.0, 60.0);
        let b = Rect::new(10.0, 0.0, 100.0, 60.0);
        let ratio = pair_overlap_ratio(&a, &b);
        assert!(ratio >= 0.9, "expected near-full overlap, got {}", ratio);
    }

    #[test]
    fn test_overlap_ratio_degenerate_rect() {
        let a = Rect::new(0.0, 0.0, 0.0, 0.0);
        let b = Rect::new(0.0, 0.0, 50.0, 50.0);
        assert_eq!(pair_overlap_ratio(&a, &b), 0.0);
    }

    #[test]
    fn test_segment_crosses_rect() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(segment_intersects_rect(
            Point::new(0.0, 20.0),
            Point::new(40.0, 20.0),
            &r
        ));
    }

    #[test]
    fn test_segment_misses_rect() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(!segment_intersects_rect(
            Point::new(0.0, 0.0),
            Point::new(5.0, 5.0),
            &r
        ));
    }

    #[test]
    fn test_segment_endpoint_inside_rect() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(segment_intersects_rect(
            Point::new(15.0, 15.0),
            Point::new(50.0, 50.0),
            &r
        ));
    }

    #[test]
    fn test_proper_cross_detects_interior_crossing() {
        assert!(segments_properly_cross(
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 0.0),
        ));
    }

    #[test]
    fn test_proper_cross_ignores_shared_endpoint() {
        assert!(!segments_properly_cross(
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(20.0, 0.0),
        ));
    }

    #[test]
    fn test_axis_aligned_proper_cross() {
        // Horizontal through vertical.
        assert!(axis_aligned_proper_cross(
            Point::new(0.0, 5.0),
            Point::new(10.0, 5.0),
            Point::new(5.0, 0.0),
            Point::new(5.0, 10.0),
        ));
        // T-touch at the horizontal's endpoint does not count.
        assert!(!axis_aligned_proper_cross(
            Point::new(0.0, 5.0),
            Point::new(5.0, 5.0),
            Point::new(5.0, 0.0),
            Point::new(5.0, 10.0),
        ));
        // Two horizontals never cross.
        assert!(!axis_aligned_proper_cross(
            Point::new(0.0, 5.0),
            Point::new(10.0, 5.0),
            Point::new(0.0, 5.0),
            Point::new(10.0, 5.0),
        ));
    }

    #[test]
    fn test_dist_segment_to_rect_zero_when_intersecting() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        let d = dist_segment_to_rect(Point::new(0.0, 20.0), Point::new(40.0, 20.0), &r);
        assert_eq!(d, 0.0);
    }

    #[test]
    fn test_dist_segment_to_rect_parallel_edge() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        // Horizontal segment 5px above the top edge.
        let d = dist_segment_to_rect(Point::new(0.0, 5.0), Point::new(40.0, 5.0), &r);
        assert!((d - 5.0).abs() < 1e-9, "got {}", d);
    }

    #[test]
    fn test_dist_point_to_segment() {
        let d = dist_point_to_segment(
            Point::new(5.0, 5.0),
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
        );
        assert!((d - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_polyline_length_and_turns() {
        let path = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 20.0),
        ];
        assert!((polyline_length(&path) - 30.0).abs() < 1e-9);
        assert_eq!(polyline_turns(&path), 2);
    }

    #[test]
    fn test_min_margin_negative_outside() {
        let r = Rect::new(-5.0, 10.0, 50.0, 50.0);
        assert!(r.min_margin(100.0, 100.0) < 0.0);
        assert!(r.outside_canvas(100.0, 100.0));
    }
}
