//! AI-hybrid evaluation over run-directory documents.
//!
//! The hybrid path never talks to a model directly. It writes the
//! measurement bundle and a review brief into a run directory, then looks
//! for a `critique_response.json` some external reviewer left there. A
//! usable response overrules the heuristic verdict; anything else keeps
//! the heuristic result and marks the report as a fallback.

use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use crate::critique::config::CritiqueConfig;
use crate::critique::{
    heuristic, CritiqueReport, Defect, Dimension, EvalMode, EvalSource, Location, Severity,
};
use crate::measure::MeasurementBundle;
use crate::spec::DiagramSpec;

const MEASUREMENTS_FILE: &str = "measurements.json";
const REQUEST_FILE: &str = "critique_request.md";
const RESPONSE_FILE: &str = "critique_response.json";

/// Errors writing the run-directory documents. A bad or missing response
/// is not an error; it downgrades to the heuristic result.
#[derive(Error, Debug)]
pub enum HybridError {
    #[error("failed to write run directory document: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize measurements: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Run the hybrid pipeline against `run_dir`.
pub fn run_hybrid(
    spec: &DiagramSpec,
    config: &CritiqueConfig,
    bundle: MeasurementBundle,
    run_dir: &Path,
) -> Result<CritiqueReport, HybridError> {
    std::fs::create_dir_all(run_dir)?;
    std::fs::write(
        run_dir.join(MEASUREMENTS_FILE),
        serde_json::to_string_pretty(&bundle)?,
    )?;

    let mut report = heuristic::run_heuristic(spec, config, bundle);
    report.evaluation_mode_requested = EvalMode::AiHybrid;

    std::fs::write(run_dir.join(REQUEST_FILE), request_document(spec, &report))?;

    match read_response(&run_dir.join(RESPONSE_FILE)) {
        Some(response) => {
            let baseline = report.heuristic_score;
            report.defects = response.defects;
            heuristic::rescore(&mut report, config);
            // The heuristic baseline stays visible; the reviewer's
            // overall score is authoritative.
            report.heuristic_score = baseline;
            report.score = response.score;
            report.score_rationale = response.rationale;
            report.evaluation_source = EvalSource::AiResponse;
        }
        None => {
            report.evaluation_source = EvalSource::HeuristicFallback;
        }
    }
    Ok(report)
}

struct ReviewerVerdict {
    score: f64,
    rationale: Option<String>,
    defects: Vec<Defect>,
}

/// Parse and validate the reviewer's response. None for a missing file,
/// unreadable JSON, a non-integer or out-of-range score, or defects that
/// are not a list.
fn read_response(path: &Path) -> Option<ReviewerVerdict> {
    let content = std::fs::read_to_string(path).ok()?;
    let value: Value = serde_json::from_str(&content).ok()?;

    let score = value.get("score")?.as_i64()?;
    if !(0..=100).contains(&score) {
        return None;
    }
    let defects = value.get("defects")?.as_array()?;
    let rationale = value
        .get("score_rationale")
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(ReviewerVerdict {
        score: score as f64,
        rationale,
        defects: defects.iter().filter_map(normalize_defect).collect(),
    })
}

/// Normalize one reviewer defect. Entries without a message are dropped;
/// unknown severities degrade to P2 and unknown dimensions are kept as
/// strings.
fn normalize_defect(value: &Value) -> Option<Defect> {
    let message = value.get("message")?.as_str()?.to_string();
    let severity = match value.get("severity").and_then(Value::as_str) {
        Some(s) => match s.to_ascii_uppercase().as_str() {
            "P0" => Severity::P0,
            "P1" => Severity::P1,
            _ => Severity::P2,
        },
        None => Severity::P2,
    };
    let location = value
        .get("where")
        .or_else(|| value.get("location"))
        .and_then(Value::as_str)
        .map(Location::parse)
        .unwrap_or(Location::Global);
    let dimension = value
        .get("dimension")
        .and_then(Value::as_str)
        .map(Dimension::parse)
        .unwrap_or(Dimension::Unknown("unspecified".to_string()));
    let suggestion = value
        .get("suggestion")
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(Defect {
        severity,
        location,
        dimension,
        message,
        suggestion,
    })
}

/// The review brief left beside the measurements for the external
/// reviewer.
fn request_document(spec: &DiagramSpec, report: &CritiqueReport) -> String {
    let mut doc = String::new();
    doc.push_str("# Diagram critique request\n\n");
    doc.push_str(&format!("Diagram: {}\n", spec.title));
    doc.push_str(&format!(
        "Canvas: {}x{} — {} nodes, {} groups, {} edges\n\n",
        report.canvas.width,
        report.canvas.height,
        report.counts.nodes,
        report.counts.groups,
        report.counts.edges
    ));
    doc.push_str(&format!(
        "Heuristic baseline: score {:.0} with {} P0, {} P1, {} P2 defects.\n",
        report.heuristic_score, report.counts.p0, report.counts.p1, report.counts.p2
    ));
    doc.push_str(&format!(
        "Full measurements are in `{MEASUREMENTS_FILE}` next to this file.\n\n"
    ));
    doc.push_str("## Response format\n\n");
    doc.push_str(&format!(
        "Write `{RESPONSE_FILE}` into this directory as a JSON object with:\n\n"
    ));
    doc.push_str("- `score`: integer 0-100, your overall verdict\n");
    doc.push_str("- `score_rationale`: optional one-line justification for the score\n");
    doc.push_str(
        "- `defects`: list of objects with `severity` (P0|P1|P2), `where` \
         (`global`, `node:<id>`, `edge:<from>-><to>`, `color_scheme:<kind>`), \
         `dimension`, `message`, and optional `suggestion`\n\n",
    );
    doc.push_str("An unusable response keeps the heuristic verdict.\n");
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{self, LayoutConfig};
    use crate::measure;
    use crate::text::ApproxTextMeasurer;

    fn setup() -> (DiagramSpec, CritiqueConfig, MeasurementBundle) {
        let mut spec = DiagramSpec::from_json(
            r#"{"title": "pipeline",
                "groups": [{"id": "g", "children": [{"id": "a"}, {"id": "b"}]}],
                "edges": [{"from": "a", "to": "b"}]}"#,
            (1200.0, 900.0),
        )
        .expect("valid spec");
        let layout_config = LayoutConfig::default();
        layout::resolve(&mut spec, &layout_config);
        let routed = layout::routing::route_all(&spec, &layout_config);
        let config = CritiqueConfig::with_defaults();
        let bundle =
            measure::collect(&spec, &config, &routed, None, &ApproxTextMeasurer::default());
        (spec, config, bundle)
    }

    #[test]
    fn test_no_response_falls_back() {
        let (spec, config, bundle) = setup();
        let dir = tempfile::tempdir().expect("tempdir");
        let report = run_hybrid(&spec, &config, bundle, dir.path()).expect("hybrid runs");
        assert_eq!(report.evaluation_mode_requested, EvalMode::AiHybrid);
        assert_eq!(report.evaluation_source, EvalSource::HeuristicFallback);
        assert!(report.score_rationale.is_none());
        assert!(dir.path().join(MEASUREMENTS_FILE).exists());
        assert!(dir.path().join(REQUEST_FILE).exists());
    }

    #[test]
    fn test_valid_response_wins() {
        let (spec, config, bundle) = setup();
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join(RESPONSE_FILE),
            r#"{"score": 42,
                "score_rationale": "cramped but legible",
                "defects": [
                {"severity": "p1", "where": "node:a", "dimension": "overlap",
                 "message": "a bit cramped"}
            ]}"#,
        )
        .expect("write response");
        let report = run_hybrid(&spec, &config, bundle, dir.path()).expect("hybrid runs");
        assert_eq!(report.evaluation_source, EvalSource::AiResponse);
        assert_eq!(report.score, 42.0);
        assert_eq!(report.score_rationale.as_deref(), Some("cramped but legible"));
        assert_eq!(report.defects.len(), 1);
        assert_eq!(report.defects[0].severity, Severity::P1);
        assert_eq!(report.defects[0].location, Location::Node("a".to_string()));
        assert_eq!(report.counts.p1, 1);
    }

    #[test]
    fn test_out_of_range_score_falls_back() {
        let (spec, config, bundle) = setup();
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join(RESPONSE_FILE),
            r#"{"score": 250, "defects": []}"#,
        )
        .expect("write response");
        let report = run_hybrid(&spec, &config, bundle, dir.path()).expect("hybrid runs");
        assert_eq!(report.evaluation_source, EvalSource::HeuristicFallback);
    }

    #[test]
    fn test_fractional_score_falls_back() {
        let (spec, config, bundle) = setup();
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join(RESPONSE_FILE),
            r#"{"score": 88.5, "defects": []}"#,
        )
        .expect("write response");
        let report = run_hybrid(&spec, &config, bundle, dir.path()).expect("hybrid runs");
        assert_eq!(report.evaluation_source, EvalSource::HeuristicFallback);
    }

    #[test]
    fn test_defects_not_a_list_falls_back() {
        let (spec, config, bundle) = setup();
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join(RESPONSE_FILE),
            r#"{"score": 80, "defects": "none"}"#,
        )
        .expect("write response");
        let report = run_hybrid(&spec, &config, bundle, dir.path()).expect("hybrid runs");
        assert_eq!(report.evaluation_source, EvalSource::HeuristicFallback);
    }

    #[test]
    fn test_unknown_severity_degrades_to_p2() {
        let (spec, config, bundle) = setup();
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join(RESPONSE_FILE),
            r#"{"score": 70, "defects": [
                {"severity": "catastrophic", "dimension": "vibes",
                 "message": "something felt off"}
            ]}"#,
        )
        .expect("write response");
        let report = run_hybrid(&spec, &config, bundle, dir.path()).expect("hybrid runs");
        assert_eq!(report.evaluation_source, EvalSource::AiResponse);
        assert_eq!(report.defects[0].severity, Severity::P2);
        assert_eq!(
            report.defects[0].dimension,
            Dimension::Unknown("vibes".to_string())
        );
        assert_eq!(report.defects[0].location, Location::Global);
    }

    #[test]
    fn test_garbage_json_falls_back() {
        let (spec, config, bundle) = setup();
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(RESPONSE_FILE), "not json at all")
            .expect("write response");
        let report = run_hybrid(&spec, &config, bundle, dir.path()).expect("hybrid runs");
        assert_eq!(report.evaluation_source, EvalSource::HeuristicFallback);
    }
}
