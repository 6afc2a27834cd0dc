//! Diagram Critic - layout, routing, and critique for diagram specs
//!
//! This library resolves a JSON diagram spec into geometry, routes its
//! edges around obstacles, measures the result, and scores it with a
//! severity-ranked defect report.
//!
//! # Example
//!
//! ```rust
//! use diagram_critic::evaluate;
//!
//! let report = evaluate(
//!     r#"{"groups": [{"id": "g", "children": [{"id": "a"}, {"id": "b"}]}],
//!         "edges": [{"from": "a", "to": "b"}]}"#,
//! )
//! .unwrap();
//! assert!(report.score <= 100.0);
//! ```

pub mod critique;
pub mod geometry;
pub mod layout;
pub mod measure;
pub mod spec;
pub mod text;

pub use critique::config::{ConfigError, CritiqueConfig};
pub use critique::hybrid::HybridError;
pub use critique::{
    CritiqueDimension, CritiqueReport, Defect, Dimension, EvalMode, EvalSource, Location, Severity,
};
pub use layout::{LayoutConfig, RoutedEdge};
pub use measure::{MeasurementBundle, Raster, RasterError};
pub use spec::{DiagramSpec, ParseSpecError, SpecError};
pub use text::{ApproxTextMeasurer, TextMeasurer};

use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during the evaluation pipeline
#[derive(Debug, Error)]
pub enum EvalError {
    /// The spec could not be parsed or failed structural validation
    #[error("invalid diagram spec: {0}")]
    Spec(#[from] ParseSpecError),

    /// Critique configuration could not be loaded
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The supplied raster could not be decoded
    #[error("raster error: {0}")]
    Raster(#[from] RasterError),

    /// The hybrid run directory could not be written
    #[error("hybrid error: {0}")]
    Hybrid(#[from] HybridError),

    /// AI-hybrid mode was requested without a run directory
    #[error("ai_hybrid mode requires a run directory")]
    MissingRunDir,

    /// The dimension worker pool could not be built
    #[error("worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Configuration for the complete evaluation pipeline
#[derive(Debug, Clone, Default)]
pub struct EvalConfig {
    /// Layout and routing configuration
    pub layout: LayoutConfig,
    /// Thresholds, weights, and palette for the critique
    pub critique: CritiqueConfig,
    /// Which evaluation pipeline to run
    pub mode: Option<EvalMode>,
    /// Run directory for ai_hybrid document exchange
    pub run_dir: Option<PathBuf>,
}

impl EvalConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            critique: CritiqueConfig::with_defaults(),
            ..Self::default()
        }
    }

    /// Set the layout configuration
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    /// Set the critique configuration
    pub fn with_critique(mut self, critique: CritiqueConfig) -> Self {
        self.critique = critique;
        self
    }

    /// Request a specific evaluation mode
    pub fn with_mode(mut self, mode: EvalMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Set the run directory for ai_hybrid mode
    pub fn with_run_dir(mut self, run_dir: PathBuf) -> Self {
        self.run_dir = Some(run_dir);
        self
    }
}

/// Evaluate a JSON diagram spec with the heuristic pipeline and default
/// configuration. This is the main entry point for the library.
pub fn evaluate(json: &str) -> Result<CritiqueReport, EvalError> {
    evaluate_with_config(json, None, &EvalConfig::new())
}

/// Evaluate a JSON diagram spec with custom configuration and an optional
/// rendered raster.
///
/// The pipeline resolves layout for nodes without explicit geometry,
/// routes every edge, runs the measurement collectors, and scores the
/// result. `ai_hybrid` mode additionally exchanges documents through the
/// configured run directory.
pub fn evaluate_with_config(
    json: &str,
    raster: Option<&Raster>,
    config: &EvalConfig,
) -> Result<CritiqueReport, EvalError> {
    let (spec, bundle) = prepare(json, raster, config)?;

    match config.mode.unwrap_or(EvalMode::Heuristic) {
        EvalMode::Heuristic => Ok(critique::run_heuristic(&spec, &config.critique, bundle)),
        EvalMode::AiHybrid => {
            let run_dir = config.run_dir.as_ref().ok_or(EvalError::MissingRunDir)?;
            Ok(critique::run_hybrid(
                &spec,
                &config.critique,
                bundle,
                run_dir,
            )?)
        }
    }
}

/// Evaluate once per critique dimension (structure, readability, visual)
/// on a bounded worker pool. Always heuristic; dimensions share no state.
pub fn evaluate_by_dimension(
    json: &str,
    raster: Option<&Raster>,
    config: &EvalConfig,
) -> Result<BTreeMap<CritiqueDimension, CritiqueReport>, EvalError> {
    let (spec, bundle) = prepare(json, raster, config)?;
    Ok(critique::critique_by_dimension(
        &spec,
        &config.critique,
        &bundle,
    )?)
}

fn prepare(
    json: &str,
    raster: Option<&Raster>,
    config: &EvalConfig,
) -> Result<(DiagramSpec, MeasurementBundle), EvalError> {
    let mut spec = DiagramSpec::from_json(json, config.layout.default_canvas)?;
    layout::resolve(&mut spec, &config.layout);
    let routed = layout::routing::route_all(&spec, &config.layout);
    let measurer = ApproxTextMeasurer::default();
    let bundle = measure::collect(&spec, &config.critique, &routed, raster, &measurer);
    Ok((spec, bundle))
}
