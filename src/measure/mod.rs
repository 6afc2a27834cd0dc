//! Measurement collectors.
//!
//! Collectors turn a resolved spec, its routed edges, and an optional
//! raster into plain serializable facts. They never judge: every fact
//! carries the threshold that will later gate it, so the measurement
//! bundle reads as an audit trail for the critique that follows.

pub mod color;
pub mod edges;
pub mod raster;

use serde::Serialize;

use crate::critique::config::CritiqueConfig;
use crate::geometry::pair_overlap_ratio;
use crate::layout::routing::RoutedEdge;
use crate::spec::DiagramSpec;
use crate::text::TextMeasurer;

pub use color::{collect_contrast, contrast_ratio, parse_hex, ContrastFacts, KindContrast};
pub use edges::{collect_edges, CrossingFact, DiagonalFact, EdgeFacts, IntrusionFact};
pub use raster::{collect_raster, Raster, RasterError, RasterFacts, RasterStats};

/// Canvas dimensions echoed into the bundle.
#[derive(Debug, Clone, Serialize)]
pub struct CanvasFacts {
    pub width: f64,
    pub height: f64,
}

/// Estimated text fit for one node label.
#[derive(Debug, Clone, Serialize)]
pub struct TextFitFact {
    pub node_id: String,
    pub estimated_lines: usize,
    /// Vertical space the wrapped label needs.
    pub required_h: f64,
    /// Vertical space the node offers after padding.
    pub available_h: f64,
    /// How far the label spills past the node, 0 when it fits.
    pub overflow_px: f64,
}

/// Text fit for every node, unlabeled ones included.
#[derive(Debug, Clone, Serialize)]
pub struct TextFitFacts {
    pub entries: Vec<TextFitFact>,
    pub font_px: f64,
    pub line_height_px: f64,
}

/// One overlapping node pair, worst first.
#[derive(Debug, Clone, Serialize)]
pub struct OverlapFact {
    pub node_a: String,
    pub node_b: String,
    /// Intersection area over the smaller node's area, in `(0, 1]`.
    pub ratio: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverlapFacts {
    pub pairs: Vec<OverlapFact>,
    pub overlap_p0: f64,
}

/// A node outside the canvas or hugging its edge.
#[derive(Debug, Clone, Serialize)]
pub struct BoundsFact {
    pub node_id: String,
    /// Smallest distance from the node to any canvas edge; negative when
    /// the node extends past it.
    pub min_margin: f64,
    pub outside: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoundsFacts {
    pub entries: Vec<BoundsFact>,
    pub node_margin_warn_px: f64,
}

/// Area-weighted center-of-mass offset from the canvas center.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceFacts {
    /// Horizontal offset as a fraction of canvas width, signed.
    pub offset_x_ratio: f64,
    /// Vertical offset as a fraction of canvas height, signed.
    pub offset_y_ratio: f64,
    pub balance_warn_ratio: f64,
}

/// Everything measured about one diagram, ready to serialize.
#[derive(Debug, Clone, Serialize)]
pub struct MeasurementBundle {
    pub canvas: CanvasFacts,
    pub text_fit: TextFitFacts,
    pub overlap: OverlapFacts,
    pub bounds: BoundsFacts,
    pub balance: BalanceFacts,
    pub edges: EdgeFacts,
    pub raster: RasterFacts,
    pub contrast: ContrastFacts,
}

/// Run every collector over a resolved spec.
pub fn collect(
    spec: &DiagramSpec,
    config: &CritiqueConfig,
    routed: &[RoutedEdge],
    raster: Option<&Raster>,
    measurer: &dyn TextMeasurer,
) -> MeasurementBundle {
    MeasurementBundle {
        canvas: CanvasFacts {
            width: spec.canvas_w,
            height: spec.canvas_h,
        },
        text_fit: collect_text_fit(spec, config, measurer),
        overlap: collect_overlap(spec, config),
        bounds: collect_bounds(spec, config),
        balance: collect_balance(spec, config),
        edges: collect_edges(spec, config, routed),
        raster: collect_raster(raster, config),
        contrast: collect_contrast(spec, config),
    }
}

/// Estimate wrapped label height per node against the space the node
/// actually offers.
pub fn collect_text_fit(
    spec: &DiagramSpec,
    config: &CritiqueConfig,
    measurer: &dyn TextMeasurer,
) -> TextFitFacts {
    let font_px = config.font.base_px;
    let pad = config.font.node_text_padding_px;
    let line_height = measurer.line_height(font_px);

    let entries = spec
        .nodes
        .iter()
        .map(|n| {
            let inner_w = (n.rect.w - 2.0 * pad).max(0.0);
            let available_h = (n.rect.h - 2.0 * pad).max(0.0);
            let lines = measurer.estimated_lines(&n.label, inner_w, font_px);
            let required_h = lines as f64 * line_height;
            TextFitFact {
                node_id: n.id.clone(),
                estimated_lines: lines,
                required_h,
                available_h,
                overflow_px: (required_h - available_h).max(0.0),
            }
        })
        .collect();

    TextFitFacts {
        entries,
        font_px,
        line_height_px: line_height,
    }
}

/// Every overlapping node pair, sorted worst first with a stable id
/// tie-break.
pub fn collect_overlap(spec: &DiagramSpec, config: &CritiqueConfig) -> OverlapFacts {
    let mut pairs = Vec::new();
    for i in 0..spec.nodes.len() {
        for j in (i + 1)..spec.nodes.len() {
            let ratio = pair_overlap_ratio(&spec.nodes[i].rect, &spec.nodes[j].rect);
            if ratio > 0.0 {
                pairs.push(OverlapFact {
                    node_a: spec.nodes[i].id.clone(),
                    node_b: spec.nodes[j].id.clone(),
                    ratio,
                });
            }
        }
    }
    pairs.sort_by(|a, b| {
        b.ratio
            .total_cmp(&a.ratio)
            .then_with(|| a.node_a.cmp(&b.node_a))
            .then_with(|| a.node_b.cmp(&b.node_b))
    });
    OverlapFacts {
        pairs,
        overlap_p0: config.thresholds.overlap_p0,
    }
}

/// Nodes outside the canvas or closer to its edge than the warn margin.
pub fn collect_bounds(spec: &DiagramSpec, config: &CritiqueConfig) -> BoundsFacts {
    let warn = config.thresholds.node_margin_warn_px;
    let entries = spec
        .nodes
        .iter()
        .filter_map(|n| {
            let outside = n.rect.outside_canvas(spec.canvas_w, spec.canvas_h);
            let min_margin = n.rect.min_margin(spec.canvas_w, spec.canvas_h);
            if outside || min_margin < warn {
                Some(BoundsFact {
                    node_id: n.id.clone(),
                    min_margin,
                    outside,
                })
            } else {
                None
            }
        })
        .collect();
    BoundsFacts {
        entries,
        node_margin_warn_px: warn,
    }
}

/// Area-weighted center of mass of all nodes, as signed offsets from the
/// canvas center.
pub fn collect_balance(spec: &DiagramSpec, config: &CritiqueConfig) -> BalanceFacts {
    let total_area: f64 = spec.nodes.iter().map(|n| n.rect.area()).sum();
    let (offset_x_ratio, offset_y_ratio) = if total_area > 0.0 {
        let cx: f64 = spec
            .nodes
            .iter()
            .map(|n| n.rect.center().x * n.rect.area())
            .sum::<f64>()
            / total_area;
        let cy: f64 = spec
            .nodes
            .iter()
            .map(|n| n.rect.center().y * n.rect.area())
            .sum::<f64>()
            / total_area;
        (
            (cx - spec.canvas_w / 2.0) / spec.canvas_w,
            (cy - spec.canvas_h / 2.0) / spec.canvas_h,
        )
    } else {
        (0.0, 0.0)
    };
    BalanceFacts {
        offset_x_ratio,
        offset_y_ratio,
        balance_warn_ratio: config.thresholds.balance_warn_ratio,
    }
}
