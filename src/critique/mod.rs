//! Critique engine: defects, scoring, and report assembly.
//!
//! The heuristic battery turns a measurement bundle into severity-ranked
//! defects and a numeric score; the hybrid mode lets an external reviewer
//! overrule the heuristic through run-directory documents, falling back
//! to the heuristic when the response is unusable.

pub mod config;
pub mod heuristic;
pub mod hybrid;

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::critique::config::CritiqueConfig;
use crate::measure::MeasurementBundle;
use crate::spec::DiagramSpec;

pub use config::ConfigError;
pub use heuristic::run_heuristic;
pub use hybrid::run_hybrid;

/// Defect severity, worst first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    P0,
    P1,
    P2,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::P0 => "P0",
            Severity::P1 => "P1",
            Severity::P2 => "P2",
        }
    }
}

/// What aspect of the diagram a defect concerns.
///
/// Closed set plus `Unknown` so dimensions coming back from an external
/// reviewer survive round-trips instead of being silently dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dimension {
    Overlap,
    Bounds,
    FontSize,
    TextOverflow,
    EdgeRouting,
    EdgeCrossings,
    LongDiagonal,
    Balance,
    Density,
    RenderIntegrity,
    VisualContrast,
    Unknown(String),
}

impl Dimension {
    pub fn as_str(&self) -> &str {
        match self {
            Dimension::Overlap => "overlap",
            Dimension::Bounds => "bounds",
            Dimension::FontSize => "font_size",
            Dimension::TextOverflow => "text_overflow",
            Dimension::EdgeRouting => "edge_routing",
            Dimension::EdgeCrossings => "edge_crossings",
            Dimension::LongDiagonal => "long_diagonal",
            Dimension::Balance => "balance",
            Dimension::Density => "density",
            Dimension::RenderIntegrity => "render_integrity",
            Dimension::VisualContrast => "visual_contrast",
            Dimension::Unknown(s) => s,
        }
    }

    pub fn parse(s: &str) -> Dimension {
        match s {
            "overlap" => Dimension::Overlap,
            "bounds" => Dimension::Bounds,
            "font_size" => Dimension::FontSize,
            "text_overflow" => Dimension::TextOverflow,
            "edge_routing" => Dimension::EdgeRouting,
            "edge_crossings" => Dimension::EdgeCrossings,
            "long_diagonal" => Dimension::LongDiagonal,
            "balance" => Dimension::Balance,
            "density" => Dimension::Density,
            "render_integrity" => Dimension::RenderIntegrity,
            "visual_contrast" => Dimension::VisualContrast,
            other => Dimension::Unknown(other.to_string()),
        }
    }
}

impl Serialize for Dimension {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Dimension {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct V;
        impl Visitor<'_> for V {
            type Value = Dimension;
            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a dimension name")
            }
            fn visit_str<E: de::Error>(self, v: &str) -> Result<Dimension, E> {
                Ok(Dimension::parse(v))
            }
        }
        deserializer.deserialize_str(V)
    }
}

/// Where in the diagram a defect points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Global,
    Node(String),
    Edge { from: String, to: String },
    ColorScheme(String),
    Unknown(String),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Location::Global => f.write_str("global"),
            Location::Node(id) => write!(f, "node:{id}"),
            Location::Edge { from, to } => write!(f, "edge:{from}->{to}"),
            Location::ColorScheme(kind) => write!(f, "color_scheme:{kind}"),
            Location::Unknown(s) => f.write_str(s),
        }
    }
}

impl Location {
    pub fn parse(s: &str) -> Location {
        if s == "global" {
            return Location::Global;
        }
        if let Some(id) = s.strip_prefix("node:") {
            return Location::Node(id.to_string());
        }
        if let Some(rest) = s.strip_prefix("edge:") {
            if let Some((from, to)) = rest.split_once("->") {
                return Location::Edge {
                    from: from.to_string(),
                    to: to.to_string(),
                };
            }
        }
        if let Some(kind) = s.strip_prefix("color_scheme:") {
            return Location::ColorScheme(kind.to_string());
        }
        Location::Unknown(s.to_string())
    }
}

impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Location {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct V;
        impl Visitor<'_> for V {
            type Value = Location;
            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a location string")
            }
            fn visit_str<E: de::Error>(self, v: &str) -> Result<Location, E> {
                Ok(Location::parse(v))
            }
        }
        deserializer.deserialize_str(V)
    }
}

/// One concrete problem found in the diagram.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defect {
    pub severity: Severity,
    #[serde(rename = "where")]
    pub location: Location,
    pub dimension: Dimension,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Which evaluation pipeline the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalMode {
    Heuristic,
    AiHybrid,
}

/// Which pipeline actually produced the final verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalSource {
    Heuristic,
    AiResponse,
    HeuristicFallback,
}

/// Entity and defect tallies for the report header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefectCounts {
    pub nodes: usize,
    pub groups: usize,
    pub edges: usize,
    pub p0: usize,
    pub p1: usize,
    pub p2: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

/// The complete critique verdict for one diagram.
#[derive(Debug, Clone, Serialize)]
pub struct CritiqueReport {
    /// Blended final score in `0..=100`.
    pub score: f64,
    pub heuristic_score: f64,
    /// Raster-derived sub-score; absent without a raster.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual_score: Option<f64>,
    /// The external reviewer's justification for its score; only present
    /// when an AI-hybrid response supplied one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_rationale: Option<String>,
    pub metrics: MeasurementBundle,
    pub counts: DefectCounts,
    pub defects: Vec<Defect>,
    pub canvas: CanvasSize,
    pub font: config::FontConfig,
    pub evaluation_mode_requested: EvalMode,
    pub evaluation_source: EvalSource,
}

/// Independent critique dimensions for split evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CritiqueDimension {
    Structure,
    Readability,
    Visual,
}

impl CritiqueDimension {
    pub fn all() -> [CritiqueDimension; 3] {
        [
            CritiqueDimension::Structure,
            CritiqueDimension::Readability,
            CritiqueDimension::Visual,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CritiqueDimension::Structure => "structure",
            CritiqueDimension::Readability => "readability",
            CritiqueDimension::Visual => "visual",
        }
    }

    /// Whether a defect dimension belongs to this critique dimension.
    pub fn covers(&self, dim: &Dimension) -> bool {
        match self {
            CritiqueDimension::Structure => matches!(
                dim,
                Dimension::Overlap
                    | Dimension::Bounds
                    | Dimension::EdgeRouting
                    | Dimension::EdgeCrossings
            ),
            CritiqueDimension::Readability => matches!(
                dim,
                Dimension::FontSize
                    | Dimension::TextOverflow
                    | Dimension::VisualContrast
                    | Dimension::LongDiagonal
            ),
            CritiqueDimension::Visual => matches!(
                dim,
                Dimension::Balance | Dimension::Density | Dimension::RenderIntegrity
            ),
        }
    }
}

/// Run the heuristic once per critique dimension on a bounded worker
/// pool, keeping only the defects that dimension covers and rescoring
/// from the filtered set. Dimensions share no state.
pub fn critique_by_dimension(
    spec: &DiagramSpec,
    config: &CritiqueConfig,
    bundle: &MeasurementBundle,
) -> Result<BTreeMap<CritiqueDimension, CritiqueReport>, rayon::ThreadPoolBuildError> {
    let pool = rayon::ThreadPoolBuilder::new().num_threads(3).build()?;
    let reports = pool.install(|| {
        use rayon::prelude::*;
        CritiqueDimension::all()
            .into_par_iter()
            .map(|dim| {
                let mut report = run_heuristic(spec, config, bundle.clone());
                report.defects.retain(|d| dim.covers(&d.dimension));
                // The raster sub-score only blends into the visual
                // dimension's verdict.
                if dim != CritiqueDimension::Visual {
                    report.visual_score = None;
                }
                heuristic::rescore(&mut report, config);
                (dim, report)
            })
            .collect::<Vec<_>>()
    });
    Ok(reports.into_iter().collect())
}
