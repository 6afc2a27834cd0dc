//! Edge measurement over routed polylines.
//!
//! Crossings and node proximity are computed on the paths the router
//! actually produced, not on straight from-center lines, so orthogonal
//! detours are measured as drawn.

use serde::Serialize;

use crate::critique::config::CritiqueConfig;
use crate::geometry::{
    axis_aligned_proper_cross, dist_segment_to_rect, polyline_length, segments_properly_cross,
    Point,
};
use crate::layout::routing::{RoutedEdge, RoutingMode};
use crate::spec::DiagramSpec;

/// A crossing between two routed edges that share no endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CrossingFact {
    pub edge_a: String,
    pub edge_b: String,
}

/// A routed edge passing through or too close to a node that is not one
/// of its endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct IntrusionFact {
    pub edge: String,
    pub node: String,
    /// Distance from the polyline to the node rectangle; 0 when the
    /// path passes through it.
    pub distance: f64,
    pub intersects: bool,
}

/// A straight-mode edge measured for diagonal-ness.
#[derive(Debug, Clone, Serialize)]
pub struct DiagonalFact {
    pub edge: String,
    /// min(|dx|, |dy|) / max(|dx|, |dy|) in [0, 1]; 1 is a perfect 45°.
    pub diag_ratio: f64,
    pub length: f64,
    /// Length as a fraction of the canvas diagonal.
    pub canvas_diag_fraction: f64,
}

/// All edge facts for one evaluation, with the thresholds echoed.
#[derive(Debug, Clone, Serialize)]
pub struct EdgeFacts {
    /// Dangling references are rejected structurally before measurement,
    /// so this is zero for any spec that reaches this collector; kept so
    /// external consumers of the bundle see the check happened.
    pub missing_endpoints: usize,
    pub self_loops: Vec<String>,
    pub crossings: Vec<CrossingFact>,
    pub intrusions: Vec<IntrusionFact>,
    pub avg_length: f64,
    pub max_length: f64,
    pub diagonals: Vec<DiagonalFact>,
    pub edge_node_min_dist_px: f64,
    pub diag_ratio_min: f64,
    pub long_edge_canvas_ratio: f64,
}

/// Measure all edges of a resolved spec over their routed polylines.
pub fn collect_edges(
    spec: &DiagramSpec,
    config: &CritiqueConfig,
    routed: &[RoutedEdge],
) -> EdgeFacts {
    let self_loops: Vec<String> = spec
        .edges
        .iter()
        .filter(|e| e.from == e.to)
        .map(|e| e.id.clone())
        .collect();

    let crossings = collect_crossings(spec, routed);
    let intrusions = collect_intrusions(spec, config, routed);

    let lengths: Vec<f64> = routed.iter().map(|r| polyline_length(&r.path)).collect();
    let max_length = lengths.iter().copied().fold(0.0, f64::max);
    let avg_length = if lengths.is_empty() {
        0.0
    } else {
        lengths.iter().sum::<f64>() / lengths.len() as f64
    };

    let canvas_diag = (spec.canvas_w.powi(2) + spec.canvas_h.powi(2)).sqrt();
    let diagonals = routed
        .iter()
        .filter(|r| r.mode == RoutingMode::Straight && r.path.len() >= 2)
        .map(|r| {
            let a = r.path[0];
            let b = r.path[r.path.len() - 1];
            let dx = (b.x - a.x).abs();
            let dy = (b.y - a.y).abs();
            let max = dx.max(dy);
            let length = a.distance(b);
            DiagonalFact {
                edge: spec.edges[r.edge].id.clone(),
                diag_ratio: if max > 0.0 { dx.min(dy) / max } else { 0.0 },
                length,
                canvas_diag_fraction: if canvas_diag > 0.0 {
                    length / canvas_diag
                } else {
                    0.0
                },
            }
        })
        .collect();

    EdgeFacts {
        missing_endpoints: 0,
        self_loops,
        crossings,
        intrusions,
        avg_length,
        max_length,
        diagonals,
        edge_node_min_dist_px: config.thresholds.edge_node_min_dist_px,
        diag_ratio_min: config.thresholds.diag_ratio_min,
        long_edge_canvas_ratio: config.thresholds.long_edge_canvas_ratio,
    }
}

/// Crossings between routed polylines. Two polylines only count when
/// their edges share no endpoint node, and each pair counts once.
fn collect_crossings(spec: &DiagramSpec, routed: &[RoutedEdge]) -> Vec<CrossingFact> {
    let mut crossings = Vec::new();
    for i in 0..routed.len() {
        for j in (i + 1)..routed.len() {
            let ea = &spec.edges[routed[i].edge];
            let eb = &spec.edges[routed[j].edge];
            if ea.from == eb.from || ea.from == eb.to || ea.to == eb.from || ea.to == eb.to {
                continue;
            }
            if polylines_cross(&routed[i], &routed[j]) {
                crossings.push(CrossingFact {
                    edge_a: ea.id.clone(),
                    edge_b: eb.id.clone(),
                });
            }
        }
    }
    crossings
}

fn polylines_cross(a: &RoutedEdge, b: &RoutedEdge) -> bool {
    let both_orthogonal =
        a.mode == RoutingMode::Orthogonal && b.mode == RoutingMode::Orthogonal;
    for sa in a.path.windows(2) {
        for sb in b.path.windows(2) {
            let hit = if both_orthogonal {
                axis_aligned_proper_cross(sa[0], sa[1], sb[0], sb[1])
            } else {
                segments_properly_cross(sa[0], sa[1], sb[0], sb[1])
            };
            if hit {
                return true;
            }
        }
    }
    false
}

/// Routed paths passing through or within the configured clearance of a
/// node that is not one of the edge's endpoints.
fn collect_intrusions(
    spec: &DiagramSpec,
    config: &CritiqueConfig,
    routed: &[RoutedEdge],
) -> Vec<IntrusionFact> {
    let min_dist = config.thresholds.edge_node_min_dist_px;
    let mut intrusions = Vec::new();

    for r in routed {
        let edge = &spec.edges[r.edge];
        for (nix, node) in spec.nodes.iter().enumerate() {
            if nix == edge.from || nix == edge.to {
                continue;
            }
            let distance = path_to_rect_distance(&r.path, &node.rect);
            if distance <= min_dist {
                intrusions.push(IntrusionFact {
                    edge: edge.id.clone(),
                    node: node.id.clone(),
                    distance,
                    intersects: distance == 0.0,
                });
            }
        }
    }
    intrusions
}

fn path_to_rect_distance(path: &[Point], rect: &crate::geometry::Rect) -> f64 {
    path.windows(2)
        .map(|seg| dist_segment_to_rect(seg[0], seg[1], rect))
        .fold(f64::INFINITY, f64::min)
}
