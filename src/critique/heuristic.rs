//! Heuristic defect rules and scoring.
//!
//! Each rule reads facts out of the measurement bundle and emits
//! defects; the thresholds were already echoed into the bundle by the
//! collectors, so a report is self-describing.

use crate::critique::config::CritiqueConfig;
use crate::critique::{
    CanvasSize, CritiqueReport, Defect, DefectCounts, Dimension, EvalMode, EvalSource, Location,
    Severity,
};
use crate::layout::routing::{resolve_mode, RoutingMode};
use crate::measure::{MeasurementBundle, RasterFacts};
use crate::spec::DiagramSpec;

/// Run the full rule battery and assemble a scored report. The bundle is
/// moved into the report as its `metrics` section.
pub fn run_heuristic(
    spec: &DiagramSpec,
    config: &CritiqueConfig,
    bundle: MeasurementBundle,
) -> CritiqueReport {
    let mut defects = Vec::new();

    check_overlap(&bundle, config, &mut defects);
    check_bounds(&bundle, config, &mut defects);
    check_font(config, &mut defects);
    check_text_fit(&bundle, &mut defects);
    check_edges(spec, &bundle, &mut defects);
    check_balance(&bundle, config, &mut defects);
    check_raster(spec, &bundle, config, &mut defects);
    check_contrast(&bundle, config, &mut defects);

    defects.sort_by(|a, b| a.severity.cmp(&b.severity));

    let visual_score = visual_sub_score(&bundle, config);
    let mut report = CritiqueReport {
        score: 0.0,
        heuristic_score: 0.0,
        visual_score,
        score_rationale: None,
        canvas: CanvasSize {
            width: bundle.canvas.width,
            height: bundle.canvas.height,
        },
        metrics: bundle,
        counts: DefectCounts {
            nodes: spec.nodes.len(),
            groups: spec.groups.len(),
            edges: spec.edges.len(),
            p0: 0,
            p1: 0,
            p2: 0,
        },
        defects,
        font: config.font.clone(),
        evaluation_mode_requested: EvalMode::Heuristic,
        evaluation_source: EvalSource::Heuristic,
    };
    rescore(&mut report, config);
    report
}

/// Recompute counts, the heuristic score, and the blended score from the
/// report's current defect list. Used after any defect filtering.
pub fn rescore(report: &mut CritiqueReport, config: &CritiqueConfig) {
    report.counts.p0 = count(&report.defects, Severity::P0);
    report.counts.p1 = count(&report.defects, Severity::P1);
    report.counts.p2 = count(&report.defects, Severity::P2);

    let penalty = report.counts.p0 as f64 * config.weights.p0
        + report.counts.p1 as f64 * config.weights.p1
        + report.counts.p2 as f64 * config.weights.p2;
    report.heuristic_score = (100.0 - penalty).clamp(0.0, 100.0);

    report.score = match report.visual_score {
        Some(visual) => {
            (report.heuristic_score * config.weights.heuristic + visual * config.weights.visual)
                .clamp(0.0, 100.0)
        }
        None => report.heuristic_score,
    };
}

fn count(defects: &[Defect], severity: Severity) -> usize {
    defects.iter().filter(|d| d.severity == severity).count()
}

/// Raster density sub-score: full marks inside the comfortable band,
/// proportional falloff toward empty or saturated canvases. None without
/// a raster.
fn visual_sub_score(bundle: &MeasurementBundle, config: &CritiqueConfig) -> Option<f64> {
    let stats = bundle.raster.stats()?;
    let density = stats.density_overall;
    let lo = config.thresholds.ideal_density_min;
    let hi = config.thresholds.crowded_density_p1;
    let score = if density < lo {
        100.0 * density / lo
    } else if density > hi {
        100.0 * (1.0 - (density - hi) / (1.0 - hi))
    } else {
        100.0
    };
    Some(score.clamp(0.0, 100.0))
}

// ── Rules ───────────────────────────────────────────────────────────────

fn check_overlap(bundle: &MeasurementBundle, config: &CritiqueConfig, out: &mut Vec<Defect>) {
    for pair in &bundle.overlap.pairs {
        let severity = if pair.ratio > config.thresholds.overlap_p0 {
            Severity::P0
        } else {
            Severity::P1
        };
        out.push(Defect {
            severity,
            location: Location::Node(pair.node_a.clone()),
            dimension: Dimension::Overlap,
            message: format!(
                "node '{}' overlaps '{}' by {:.0}% of the smaller node",
                pair.node_a,
                pair.node_b,
                pair.ratio * 100.0
            ),
            suggestion: Some("increase node spacing or canvas size".to_string()),
        });
    }
}

fn check_bounds(bundle: &MeasurementBundle, config: &CritiqueConfig, out: &mut Vec<Defect>) {
    for entry in &bundle.bounds.entries {
        if entry.outside {
            out.push(Defect {
                severity: Severity::P0,
                location: Location::Node(entry.node_id.clone()),
                dimension: Dimension::Bounds,
                message: format!("node '{}' extends outside the canvas", entry.node_id),
                suggestion: Some("enlarge the canvas or move the node inward".to_string()),
            });
        } else if entry.min_margin < config.thresholds.node_margin_warn_px {
            out.push(Defect {
                severity: Severity::P2,
                location: Location::Node(entry.node_id.clone()),
                dimension: Dimension::Bounds,
                message: format!(
                    "node '{}' sits {:.0}px from the canvas edge",
                    entry.node_id, entry.min_margin
                ),
                suggestion: None,
            });
        }
    }
}

fn check_font(config: &CritiqueConfig, out: &mut Vec<Defect>) {
    let base = config.font.base_px;
    if base < config.font.min_px {
        out.push(Defect {
            severity: Severity::P0,
            location: Location::Global,
            dimension: Dimension::FontSize,
            message: format!("base font {base}px is below the {}px minimum", config.font.min_px),
            suggestion: Some("raise the base font size".to_string()),
        });
    } else if base < config.font.warn_px {
        out.push(Defect {
            severity: Severity::P1,
            location: Location::Global,
            dimension: Dimension::FontSize,
            message: format!("base font {base}px is hard to read"),
            suggestion: Some("raise the base font size".to_string()),
        });
    }
}

fn check_text_fit(bundle: &MeasurementBundle, out: &mut Vec<Defect>) {
    let line_height = bundle.text_fit.line_height_px;
    for fit in &bundle.text_fit.entries {
        if fit.overflow_px <= 0.0 {
            continue;
        }
        // A full clipped line means the label is visibly truncated.
        let severity = if fit.overflow_px >= line_height {
            Severity::P0
        } else {
            Severity::P1
        };
        out.push(Defect {
            severity,
            location: Location::Node(fit.node_id.clone()),
            dimension: Dimension::TextOverflow,
            message: format!(
                "label on '{}' needs {:.0}px but the node offers {:.0}px",
                fit.node_id, fit.required_h, fit.available_h
            ),
            suggestion: Some("widen the node or shorten the label".to_string()),
        });
    }
}

fn check_edges(spec: &DiagramSpec, bundle: &MeasurementBundle, out: &mut Vec<Defect>) {
    for id in &bundle.edges.self_loops {
        out.push(Defect {
            severity: Severity::P1,
            location: edge_location(spec, id),
            dimension: Dimension::EdgeRouting,
            message: format!("edge '{id}' loops back to its own node"),
            suggestion: None,
        });
    }

    for crossing in &bundle.edges.crossings {
        out.push(Defect {
            severity: Severity::P1,
            location: Location::Global,
            dimension: Dimension::EdgeCrossings,
            message: format!(
                "edges '{}' and '{}' cross",
                crossing.edge_a, crossing.edge_b
            ),
            suggestion: Some("reorder nodes to untangle the flow".to_string()),
        });
    }

    for intrusion in &bundle.edges.intrusions {
        let straight = spec
            .edges
            .iter()
            .find(|e| e.id == intrusion.edge)
            .map(|e| resolve_mode(e.route) == RoutingMode::Straight)
            .unwrap_or(false);
        let (severity, message) = if intrusion.intersects {
            (
                if straight { Severity::P0 } else { Severity::P1 },
                format!(
                    "edge '{}' passes through node '{}'",
                    intrusion.edge, intrusion.node
                ),
            )
        } else {
            (
                Severity::P1,
                format!(
                    "edge '{}' passes {:.0}px from node '{}'",
                    intrusion.edge, intrusion.distance, intrusion.node
                ),
            )
        };
        out.push(Defect {
            severity,
            location: edge_location(spec, &intrusion.edge),
            dimension: Dimension::EdgeRouting,
            message,
            suggestion: None,
        });
    }

    for diag in &bundle.edges.diagonals {
        if diag.diag_ratio >= bundle.edges.diag_ratio_min
            && diag.canvas_diag_fraction > bundle.edges.long_edge_canvas_ratio
        {
            out.push(Defect {
                severity: Severity::P1,
                location: edge_location(spec, &diag.edge),
                dimension: Dimension::LongDiagonal,
                message: format!(
                    "edge '{}' is a long diagonal spanning {:.0}% of the canvas",
                    diag.edge,
                    diag.canvas_diag_fraction * 100.0
                ),
                suggestion: Some("route the edge orthogonally or move the nodes closer".to_string()),
            });
        }
    }
}

fn edge_location(spec: &DiagramSpec, edge_id: &str) -> Location {
    match spec.edges.iter().find(|e| e.id == edge_id) {
        Some(edge) => Location::Edge {
            from: spec.nodes[edge.from].id.clone(),
            to: spec.nodes[edge.to].id.clone(),
        },
        None => Location::Unknown(format!("edge:{edge_id}")),
    }
}

fn check_balance(bundle: &MeasurementBundle, config: &CritiqueConfig, out: &mut Vec<Defect>) {
    let warn = config.thresholds.balance_warn_ratio;
    let bx = bundle.balance.offset_x_ratio;
    let by = bundle.balance.offset_y_ratio;
    if bx.abs() > warn || by.abs() > warn {
        out.push(Defect {
            severity: Severity::P2,
            location: Location::Global,
            dimension: Dimension::Balance,
            message: format!(
                "content center of mass is off-center by ({:.0}%, {:.0}%)",
                bx * 100.0,
                by * 100.0
            ),
            suggestion: Some("redistribute nodes toward the canvas center".to_string()),
        });
    }
}

fn check_raster(
    spec: &DiagramSpec,
    bundle: &MeasurementBundle,
    config: &CritiqueConfig,
    out: &mut Vec<Defect>,
) {
    let stats = match &bundle.raster {
        RasterFacts::Measured(stats) => stats,
        RasterFacts::Unavailable => {
            out.push(Defect {
                severity: Severity::P2,
                location: Location::Global,
                dimension: Dimension::RenderIntegrity,
                message: "no rendered image supplied; visual checks skipped".to_string(),
                suggestion: Some("pass the rendered raster to enable visual checks".to_string()),
            });
            return;
        }
    };

    if stats.density_overall > config.thresholds.crowded_density_p1 {
        out.push(Defect {
            severity: Severity::P1,
            location: Location::Global,
            dimension: Dimension::Density,
            message: format!(
                "canvas is {:.0}% covered; crowded past the {:.0}% threshold",
                stats.density_overall * 100.0,
                config.thresholds.crowded_density_p1 * 100.0
            ),
            suggestion: Some("enlarge the canvas or split the diagram".to_string()),
        });
    }

    if stats.density_overall < config.thresholds.near_blank_density
        && spec.nodes.len() >= config.thresholds.near_blank_min_nodes
    {
        out.push(Defect {
            severity: Severity::P0,
            location: Location::Global,
            dimension: Dimension::RenderIntegrity,
            message: format!(
                "render is nearly blank ({:.1}% coverage) despite {} nodes; suspected render failure",
                stats.density_overall * 100.0,
                spec.nodes.len()
            ),
            suggestion: None,
        });
    }
}

fn check_contrast(bundle: &MeasurementBundle, config: &CritiqueConfig, out: &mut Vec<Defect>) {
    for entry in &bundle.contrast.entries {
        if let Some(ratio) = entry.fill_text_ratio {
            if ratio < config.thresholds.wcag_contrast_p0 {
                let severity = if entry.kind == "primary" || entry.kind == "critical" {
                    Severity::P0
                } else {
                    Severity::P2
                };
                out.push(Defect {
                    severity,
                    location: Location::ColorScheme(entry.kind.clone()),
                    dimension: Dimension::VisualContrast,
                    message: format!(
                        "'{}' text on its fill has contrast {:.2}; unreadable",
                        entry.kind, ratio
                    ),
                    suggestion: Some("pick a darker text or lighter fill".to_string()),
                });
            }
        }
        if let Some(ratio) = entry.fill_background_ratio {
            if ratio < config.thresholds.wcag_contrast_p2 {
                out.push(Defect {
                    severity: Severity::P2,
                    location: Location::ColorScheme(entry.kind.clone()),
                    dimension: Dimension::VisualContrast,
                    message: format!(
                        "'{}' fill blends into the background (contrast {:.2})",
                        entry.kind, ratio
                    ),
                    suggestion: Some("darken the fill or add a border".to_string()),
                });
            }
        }
    }
}
