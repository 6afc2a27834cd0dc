//! End-to-end critique tests through the public evaluate API. These are
//! NOT rule unit tests — they check that a JSON spec flows through
//! layout, routing, measurement, and scoring into the report shape
//! external consumers parse.

use pretty_assertions::assert_eq;

use diagram_critic::{
    evaluate, evaluate_with_config, CritiqueConfig, Dimension, EvalConfig, EvalError, EvalMode,
    EvalSource, Raster, Severity,
};

#[test]
fn heavy_overlap_is_a_p0_with_near_full_ratio() {
    // Two 100x60 nodes 10px apart horizontally overlap by 90% of the
    // smaller node.
    let report = evaluate(
        r#"{"groups": [{"id": "g", "children": [
            {"id": "a", "x": 100, "y": 100, "w": 100, "h": 60},
            {"id": "b", "x": 110, "y": 100, "w": 100, "h": 60}
        ]}]}"#,
    )
    .unwrap();

    assert_eq!(report.metrics.overlap.pairs.len(), 1);
    let pair = &report.metrics.overlap.pairs[0];
    assert!((pair.ratio - 0.9).abs() < 1e-9, "got ratio {}", pair.ratio);
    assert!(report
        .defects
        .iter()
        .any(|d| d.dimension == Dimension::Overlap && d.severity == Severity::P0));
    assert_eq!(report.counts.p0, 1);
}

#[test]
fn dangling_edge_fails_before_any_measurement() {
    let result = evaluate(
        r#"{"groups": [{"id": "g", "children": [{"id": "api"}, {"id": "db"}]}],
            "edges": [{"from": "api", "to": "databse"}]}"#,
    );
    let err = match result {
        Err(EvalError::Spec(e)) => e.to_string(),
        other => panic!("expected a spec error, got {:?}", other.map(|r| r.score)),
    };
    assert!(err.contains("databse"), "error should name the bad id: {err}");
}

#[test]
fn evaluation_is_idempotent() {
    let json = r#"{"title": "checkout flow",
        "direction": "left-to-right",
        "groups": [
            {"id": "entry", "children": [{"id": "cart"}, {"id": "login"}]},
            {"id": "core", "children": [{"id": "payment", "kind": "critical"}]},
            {"id": "exit", "children": [{"id": "receipt"}]}
        ],
        "edges": [
            {"from": "cart", "to": "payment"},
            {"from": "login", "to": "payment"},
            {"from": "payment", "to": "receipt"},
            {"from": "payment", "to": "cart", "kind": "risk"}
        ]}"#;
    let first = serde_json::to_value(evaluate(json).unwrap()).unwrap();
    let second = serde_json::to_value(evaluate(json).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn adding_a_defect_never_raises_the_score() {
    let clean = evaluate(
        r#"{"groups": [{"id": "g", "children": [{"id": "a"}, {"id": "b"}]}]}"#,
    )
    .unwrap();
    let with_outlier = evaluate(
        r#"{"groups": [{"id": "g", "children": [
            {"id": "a"}, {"id": "b"},
            {"id": "stray", "x": 1300, "y": 100, "w": 100, "h": 60}
        ]}]}"#,
    )
    .unwrap();
    assert!(with_outlier.score < clean.score);
}

#[test]
fn long_diagonal_straight_edge_is_flagged() {
    let report = evaluate(
        r#"{"canvas": {"width": 1000, "height": 1000},
            "groups": [{"id": "g", "children": [
            {"id": "a", "x": 40,  "y": 40,  "w": 80, "h": 50},
            {"id": "b", "x": 820, "y": 840, "w": 80, "h": 50}
        ]}],
        "edges": [{"from": "a", "to": "b", "route": "straight"}]}"#,
    )
    .unwrap();
    let diag: Vec<_> = report
        .defects
        .iter()
        .filter(|d| d.dimension == Dimension::LongDiagonal)
        .collect();
    assert_eq!(diag.len(), 1);
    assert_eq!(diag[0].severity, Severity::P1);
}

#[test]
fn washed_out_palette_yields_contrast_p2() {
    let mut critique = CritiqueConfig::with_defaults();
    critique.palette.insert(
        "secondary".to_string(),
        diagram_critic::critique::config::KindColors {
            fill: "#fefefe".to_string(),
            text: "#1a1a1a".to_string(),
        },
    );
    let config = EvalConfig::new().with_critique(critique);
    let report = evaluate_with_config(
        r#"{"groups": [{"id": "g", "children": [
            {"id": "a", "kind": "secondary"}
        ]}]}"#,
        None,
        &config,
    )
    .unwrap();
    assert!(report
        .defects
        .iter()
        .any(|d| d.dimension == Dimension::VisualContrast && d.severity == Severity::P2));
}

#[test]
fn hybrid_mode_without_response_reports_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let config = EvalConfig::new()
        .with_mode(EvalMode::AiHybrid)
        .with_run_dir(dir.path().to_path_buf());
    let report = evaluate_with_config(
        r#"{"groups": [{"id": "g", "children": [{"id": "a"}, {"id": "b"}]}],
            "edges": [{"from": "a", "to": "b"}]}"#,
        None,
        &config,
    )
    .unwrap();
    assert_eq!(report.evaluation_mode_requested, EvalMode::AiHybrid);
    assert_eq!(report.evaluation_source, EvalSource::HeuristicFallback);
    assert!(dir.path().join("measurements.json").exists());
    assert!(dir.path().join("critique_request.md").exists());

    // The written measurements are themselves valid JSON.
    let measurements =
        std::fs::read_to_string(dir.path().join("measurements.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&measurements).unwrap();
    assert_eq!(value["raster"]["status"], "unavailable");
}

#[test]
fn hybrid_mode_accepts_a_valid_response() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("critique_response.json"),
        r#"{"score": 63, "defects": [
            {"severity": "P1", "where": "node:a", "dimension": "text_overflow",
             "message": "label clipped", "suggestion": "widen the node"}
        ]}"#,
    )
    .unwrap();
    let config = EvalConfig::new()
        .with_mode(EvalMode::AiHybrid)
        .with_run_dir(dir.path().to_path_buf());
    let report = evaluate_with_config(
        r#"{"groups": [{"id": "g", "children": [{"id": "a"}, {"id": "b"}]}],
            "edges": [{"from": "a", "to": "b"}]}"#,
        None,
        &config,
    )
    .unwrap();
    assert_eq!(report.evaluation_source, EvalSource::AiResponse);
    assert_eq!(report.score, 63.0);
    assert_eq!(report.defects.len(), 1);
    assert_eq!(report.counts.p1, 1);
    assert_eq!(
        report.defects[0].suggestion.as_deref(),
        Some("widen the node")
    );
}

#[test]
fn near_blank_raster_with_enough_nodes_is_a_render_failure() {
    // A pure white 64x64 PPM: every pixel equals the background
    // reference, so measured density is zero.
    let mut ppm = b"P6\n64 64\n255\n".to_vec();
    ppm.extend(std::iter::repeat(0xffu8).take(64 * 64 * 3));
    let raster = Raster::from_bytes(&ppm).unwrap();

    let report = evaluate_with_config(
        r#"{"groups": [{"id": "g", "children": [
            {"id": "a"}, {"id": "b"}, {"id": "c"}
        ]}]}"#,
        Some(&raster),
        &EvalConfig::new(),
    )
    .unwrap();
    assert!(report.defects.iter().any(|d| {
        d.dimension == Dimension::RenderIntegrity
            && d.severity == Severity::P0
            && d.message.contains("render failure")
    }));
    assert!(report.visual_score.is_some());
}

#[test]
fn report_shape_is_stable() {
    let report = evaluate(
        r#"{"groups": [{"id": "g", "children": [{"id": "a"}, {"id": "b"}]}],
            "edges": [{"from": "a", "to": "b"}]}"#,
    )
    .unwrap();
    let value = serde_json::to_value(&report).unwrap();
    for key in [
        "score",
        "heuristic_score",
        "metrics",
        "counts",
        "defects",
        "canvas",
        "font",
        "evaluation_mode_requested",
        "evaluation_source",
    ] {
        assert!(value.get(key).is_some(), "missing report key '{key}'");
    }
    assert_eq!(value["evaluation_mode_requested"], "heuristic");
    assert_eq!(value["evaluation_source"], "heuristic");
    assert_eq!(value["canvas"]["width"], 1200.0);
    // No raster, so no visual sub-score key at all.
    assert!(value.get("visual_score").is_none());
}

#[test]
fn duplicate_node_ids_fail_structurally() {
    let result = evaluate(
        r#"{"groups": [
            {"id": "g1", "children": [{"id": "a"}]},
            {"id": "g2", "children": [{"id": "a"}]}
        ]}"#,
    );
    assert!(matches!(result, Err(EvalError::Spec(_))));
}
