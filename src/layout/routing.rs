//! Connector routing between node rectangles.
//!
//! For each edge the router generates a bounded set of candidate
//! polylines — a mid-line family swept around the literal midpoint and a
//! corridor family that escapes sideways around both rectangles — scores
//! each as `(obstacle_hits, turns, length, center_bias)` and picks the
//! lexicographically smallest. The router never fails: when no candidate
//! is collision-free the best-scoring one is returned and the collision
//! is surfaced later by the measurement layer.

use crate::geometry::{polyline_length, polyline_turns, segment_intersects_rect, Point, Rect};
use crate::spec::{DiagramSpec, Direction, EdgeKind, RouteMode};

use super::config::LayoutConfig;

/// Routing mode after `auto` resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutingMode {
    /// One segment between rectangle centers.
    Straight,
    /// Axis-aligned segments with obstacle avoidance.
    #[default]
    Orthogonal,
}

/// Side of a rectangle used for connector attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

/// A routed edge: the polyline plus the mode that produced it.
#[derive(Debug, Clone)]
pub struct RoutedEdge {
    /// Index into `DiagramSpec::edges`.
    pub edge: usize,
    pub mode: RoutingMode,
    pub path: Vec<Point>,
}

/// Everything the router needs for one edge.
pub struct RouteRequest<'a> {
    pub from: Rect,
    pub to: Rect,
    pub direction: Direction,
    pub mode: RoutingMode,
    pub edge_kind: EdgeKind,
    /// Obstacle rectangles, already excluding the endpoint nodes and
    /// already expanded by the obstacle padding.
    pub obstacles: &'a [Rect],
    pub canvas: (f64, f64),
    pub config: &'a LayoutConfig,
    /// Explicit waypoints bypass the candidate search.
    pub waypoints: Option<&'a [(f64, f64)]>,
}

/// Resolve the requested route mode against the configured default.
pub fn resolve_mode(requested: RouteMode) -> RoutingMode {
    match requested {
        RouteMode::Straight => RoutingMode::Straight,
        RouteMode::Orthogonal => RoutingMode::Orthogonal,
        RouteMode::Auto => RoutingMode::default(),
    }
}

/// Route one edge. Always returns a polyline with at least two points.
pub fn route_edge(req: &RouteRequest) -> Vec<Point> {
    if let Some(waypoints) = req.waypoints {
        return route_via_waypoints(req, waypoints);
    }

    match req.mode {
        RoutingMode::Straight => vec![req.from.center(), req.to.center()],
        RoutingMode::Orthogonal => route_orthogonal(req),
    }
}

/// Short stub for a self-loop edge. The defect itself is the critique
/// engine's business; the router only guarantees a valid polyline.
pub fn self_loop_stub(rect: &Rect, direction: Direction) -> Vec<Point> {
    let (exit, _) = flow_sides(direction);
    let start = attachment_point(rect, exit);
    let stub = 20.0;
    let end = match exit {
        Side::Bottom => Point::new(start.x, start.y + stub),
        Side::Top => Point::new(start.x, start.y - stub),
        Side::Right => Point::new(start.x + stub, start.y),
        Side::Left => Point::new(start.x - stub, start.y),
    };
    vec![start, end]
}

/// Route every edge in a resolved spec. Obstacles for each edge are all
/// other node rectangles expanded by the configured padding.
pub fn route_all(spec: &DiagramSpec, config: &LayoutConfig) -> Vec<RoutedEdge> {
    let canvas = (spec.canvas_w, spec.canvas_h);
    spec.edges
        .iter()
        .enumerate()
        .map(|(ix, edge)| {
            let mode = resolve_mode(edge.route);
            if edge.from == edge.to {
                return RoutedEdge {
                    edge: ix,
                    mode,
                    path: self_loop_stub(&spec.nodes[edge.from].rect, spec.direction),
                };
            }

            let obstacles: Vec<Rect> = spec
                .nodes
                .iter()
                .enumerate()
                .filter(|(nix, _)| *nix != edge.from && *nix != edge.to)
                .map(|(_, n)| n.rect.expand(config.obstacle_padding))
                .collect();

            let req = RouteRequest {
                from: spec.nodes[edge.from].rect,
                to: spec.nodes[edge.to].rect,
                direction: spec.direction,
                mode,
                edge_kind: edge.kind,
                obstacles: &obstacles,
                canvas,
                config,
                waypoints: edge.waypoints.as_deref(),
            };
            RoutedEdge {
                edge: ix,
                mode,
                path: route_edge(&req),
            }
        })
        .collect()
}

// ── Attachment ────────────────────────────────────────────────────

fn attachment_point(rect: &Rect, side: Side) -> Point {
    match side {
        Side::Top => Point::new(rect.x + rect.w / 2.0, rect.y),
        Side::Bottom => Point::new(rect.x + rect.w / 2.0, rect.bottom()),
        Side::Left => Point::new(rect.x, rect.y + rect.h / 2.0),
        Side::Right => Point::new(rect.right(), rect.y + rect.h / 2.0),
    }
}

/// Exit/entry sides implied by the diagram direction.
fn flow_sides(direction: Direction) -> (Side, Side) {
    match direction {
        Direction::TopToBottom => (Side::Bottom, Side::Top),
        Direction::BottomToTop => (Side::Top, Side::Bottom),
        Direction::LeftToRight => (Side::Right, Side::Left),
    }
}

/// Pick exit and entry sides. The flow direction wins when the target
/// actually lies that way; otherwise fall back to the dominant axis so
/// back-edges and degenerate placements still attach sensibly.
fn attachment_sides(direction: Direction, from: &Rect, to: &Rect) -> (Side, Side) {
    let dx = to.center().x - from.center().x;
    let dy = to.center().y - from.center().y;

    match direction {
        Direction::TopToBottom if dy > 0.0 => return flow_sides(direction),
        Direction::BottomToTop if dy < 0.0 => return flow_sides(direction),
        Direction::LeftToRight if dx > 0.0 => return flow_sides(direction),
        _ => {}
    }

    if dx.abs() >= dy.abs() {
        if dx >= 0.0 {
            (Side::Right, Side::Left)
        } else {
            (Side::Left, Side::Right)
        }
    } else if dy >= 0.0 {
        (Side::Bottom, Side::Top)
    } else {
        (Side::Top, Side::Bottom)
    }
}

fn is_vertical(side: Side) -> bool {
    matches!(side, Side::Top | Side::Bottom)
}

// ── Candidate search ──────────────────────────────────────────────

struct Candidate {
    path: Vec<Point>,
    hits: usize,
    turns: usize,
    length: f64,
    center_bias: f64,
}

impl Candidate {
    fn build(path: Vec<Point>, req: &RouteRequest) -> Self {
        let path = simplify(path);
        let hits = obstacle_hits(&path, req.obstacles);
        let turns = polyline_turns(&path);
        let length = polyline_length(&path);
        let center_bias = center_bias(&path, req);
        Candidate {
            path,
            hits,
            turns,
            length,
            center_bias,
        }
    }

    /// Lexicographic comparison: fewer hits, then fewer turns, then
    /// shorter, then bias.
    fn better_than(&self, other: &Candidate) -> bool {
        self.hits
            .cmp(&other.hits)
            .then(self.turns.cmp(&other.turns))
            .then(self.length.total_cmp(&other.length))
            .then(self.center_bias.total_cmp(&other.center_bias))
            .is_lt()
    }
}

/// Count distinct obstacles touched by any segment of the path.
fn obstacle_hits(path: &[Point], obstacles: &[Rect]) -> usize {
    obstacles
        .iter()
        .filter(|ob| {
            path.windows(2)
                .any(|seg| segment_intersects_rect(seg[0], seg[1], ob))
        })
        .count()
}

/// Tie-break bias. For `aux`/`risk` edges paths farther from the canvas
/// center are preferred, keeping the primary flow uncluttered; all other
/// edges are bias-neutral.
fn center_bias(path: &[Point], req: &RouteRequest) -> f64 {
    if !matches!(req.edge_kind, EdgeKind::Aux | EdgeKind::Risk) {
        return 0.0;
    }
    let center = Point::new(req.canvas.0 / 2.0, req.canvas.1 / 2.0);
    let mid = path_midpoint(path);
    // Negated so that farther from center compares as smaller.
    -mid.distance(center)
}

fn path_midpoint(path: &[Point]) -> Point {
    if path.is_empty() {
        return Point::new(0.0, 0.0);
    }
    let half = polyline_length(path) / 2.0;
    let mut walked = 0.0;
    for seg in path.windows(2) {
        let len = seg[0].distance(seg[1]);
        if walked + len >= half && len > 0.0 {
            let t = (half - walked) / len;
            return Point::new(
                seg[0].x + t * (seg[1].x - seg[0].x),
                seg[0].y + t * (seg[1].y - seg[0].y),
            );
        }
        walked += len;
    }
    path[path.len() - 1]
}

/// Drop repeated and collinear interior points.
fn simplify(path: Vec<Point>) -> Vec<Point> {
    const EPS: f64 = 1e-9;
    let mut out: Vec<Point> = Vec::with_capacity(path.len());
    for p in path {
        if let Some(last) = out.last() {
            if (last.x - p.x).abs() < EPS && (last.y - p.y).abs() < EPS {
                continue;
            }
        }
        while out.len() >= 2 {
            let a = out[out.len() - 2];
            let b = out[out.len() - 1];
            let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
            if cross.abs() < EPS {
                out.pop();
            } else {
                break;
            }
        }
        out.push(p);
    }
    out
}

fn route_orthogonal(req: &RouteRequest) -> Vec<Point> {
    let (exit, entry) = attachment_sides(req.direction, &req.from, &req.to);
    let start = attachment_point(&req.from, exit);
    let end = attachment_point(&req.to, entry);

    let mut best: Option<Candidate> = None;
    let mut consider = |path: Vec<Point>| {
        if path.len() < 2 {
            return;
        }
        let cand = Candidate::build(path, req);
        if cand.path.len() < 2 {
            return;
        }
        match &best {
            Some(b) if !cand.better_than(b) => {}
            _ => best = Some(cand),
        }
    };

    // Mid-line family: exit perpendicular, cross at a swept coordinate,
    // enter perpendicular. Offsets fan out around the literal midpoint.
    let step = req.config.route_step;
    let sweep = req.config.route_sweep as i64;
    let vertical = is_vertical(exit);
    let literal_mid = if vertical {
        (start.y + end.y) / 2.0
    } else {
        (start.x + end.x) / 2.0
    };
    for k in mid_sweep_offsets(sweep) {
        let mid = literal_mid + k as f64 * step;
        let path = if vertical {
            vec![
                start,
                Point::new(start.x, mid),
                Point::new(end.x, mid),
                end,
            ]
        } else {
            vec![
                start,
                Point::new(mid, start.y),
                Point::new(mid, end.y),
                end,
            ]
        };
        consider(path);
    }

    // Corridor family: escape from the exit side, travel along a fixed
    // corridor beside both rectangles (or hugging the canvas edge), then
    // approach the entry side.
    for corridor in corridor_coordinates(req, vertical) {
        consider(corridor_path(req, start, end, exit, entry, corridor));
    }

    match best {
        Some(c) => c.path,
        // Degenerate inputs collapse every candidate; still return a
        // valid two-point polyline.
        None => vec![start, Point::new(end.x + 1e-6, end.y)],
    }
}

/// Sweep order 0, -1, +1, -2, +2, … so the literal midpoint wins ties.
fn mid_sweep_offsets(sweep: i64) -> Vec<i64> {
    let mut offsets = Vec::with_capacity((2 * sweep + 1) as usize);
    offsets.push(0);
    for k in 1..=sweep {
        offsets.push(-k);
        offsets.push(k);
    }
    offsets
}

/// Cross-axis coordinates for corridor candidates: beside both
/// rectangles on either side, and along both canvas margins.
fn corridor_coordinates(req: &RouteRequest, vertical_flow: bool) -> Vec<f64> {
    let escape = req.config.corridor_escape;
    let margin = req.config.corridor_margin;
    if vertical_flow {
        vec![
            req.from.x.min(req.to.x) - escape,
            req.from.right().max(req.to.right()) + escape,
            margin,
            req.canvas.0 - margin,
        ]
    } else {
        vec![
            req.from.y.min(req.to.y) - escape,
            req.from.bottom().max(req.to.bottom()) + escape,
            margin,
            req.canvas.1 - margin,
        ]
    }
}

/// Build one corridor polyline: escape out of the exit side, run along
/// the corridor, come back level with the entry side, then enter.
fn corridor_path(
    req: &RouteRequest,
    start: Point,
    end: Point,
    exit: Side,
    entry: Side,
    corridor: f64,
) -> Vec<Point> {
    let escape = req.config.corridor_escape;

    let escape_point = |p: Point, side: Side| match side {
        Side::Bottom => Point::new(p.x, p.y + escape),
        Side::Top => Point::new(p.x, p.y - escape),
        Side::Right => Point::new(p.x + escape, p.y),
        Side::Left => Point::new(p.x - escape, p.y),
    };

    let s2 = escape_point(start, exit);
    let e2 = escape_point(end, opposite(entry));

    if is_vertical(exit) {
        // Vertical flow: the corridor is a vertical line at x = corridor.
        vec![
            start,
            s2,
            Point::new(corridor, s2.y),
            Point::new(corridor, e2.y),
            e2,
            end,
        ]
    } else {
        vec![
            start,
            s2,
            Point::new(s2.x, corridor),
            Point::new(e2.x, corridor),
            e2,
            end,
        ]
    }
}

fn opposite(side: Side) -> Side {
    match side {
        Side::Top => Side::Bottom,
        Side::Bottom => Side::Top,
        Side::Left => Side::Right,
        Side::Right => Side::Left,
    }
}

fn route_via_waypoints(req: &RouteRequest, waypoints: &[(f64, f64)]) -> Vec<Point> {
    let (exit, entry) = attachment_sides(req.direction, &req.from, &req.to);
    let mut path = vec![attachment_point(&req.from, exit)];
    path.extend(waypoints.iter().map(|&(x, y)| Point::new(x, y)));
    path.push(attachment_point(&req.to, entry));
    simplify(path)
}
