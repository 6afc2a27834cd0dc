//! Critique configuration: thresholds, score weights, and the per-kind
//! color palette.
//!
//! Every numeric threshold the collectors and the heuristic rules consult
//! lives here, loadable from TOML with documented defaults. Collectors
//! echo the values they used back into their output so a consumer can
//! audit why a fact was or was not flagged.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading critique configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Complete critique configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CritiqueConfig {
    pub font: FontConfig,
    pub thresholds: Thresholds,
    pub weights: ScoreWeights,
    pub colors: CanvasColors,
    /// Fill/text colors per node kind, keyed by kind name.
    pub palette: BTreeMap<String, KindColors>,
}

/// Font sizing expectations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FontConfig {
    /// Font size the renderer is configured to use.
    pub base_px: f64,
    /// Below this the diagram is unreadable (P0).
    pub min_px: f64,
    /// Below this the diagram is hard to read (P1).
    pub warn_px: f64,
    /// Horizontal padding inside a node before text starts.
    pub node_text_padding_px: f64,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            base_px: 14.0,
            min_px: 10.0,
            warn_px: 12.0,
            node_text_padding_px: 10.0,
        }
    }
}

/// Numeric thresholds for turning measurements into defects.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Thresholds {
    /// Overlap ratio above which a node pair is a P0.
    pub overlap_p0: f64,
    /// Warn when a node sits closer than this to a canvas edge.
    pub node_margin_warn_px: f64,
    /// Minimum clearance between a routed edge and a foreign node.
    pub edge_node_min_dist_px: f64,
    /// Raster occupancy above which the canvas counts as crowded.
    pub crowded_density_p1: f64,
    /// Raster occupancy below which a render is suspected to have failed.
    pub near_blank_density: f64,
    /// Minimum expected node count for the near-blank check to apply.
    pub near_blank_min_nodes: usize,
    /// Diagonal-ness ratio (min/max axis delta) above which a straight
    /// edge counts as diagonal.
    pub diag_ratio_min: f64,
    /// Fraction of the canvas diagonal above which an edge counts as long.
    pub long_edge_canvas_ratio: f64,
    /// Center-of-mass offset ratio above which balance is flagged.
    pub balance_warn_ratio: f64,
    /// Fill-vs-text contrast below this is a readability P0.
    pub wcag_contrast_p0: f64,
    /// Fill-vs-background contrast below this is a polish P2.
    pub wcag_contrast_p2: f64,
    /// Lower bound of the comfortable raster density band.
    pub ideal_density_min: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            overlap_p0: 0.10,
            node_margin_warn_px: 16.0,
            edge_node_min_dist_px: 6.0,
            crowded_density_p1: 0.45,
            near_blank_density: 0.02,
            near_blank_min_nodes: 3,
            diag_ratio_min: 0.35,
            long_edge_canvas_ratio: 0.35,
            balance_warn_ratio: 0.18,
            wcag_contrast_p0: 1.5,
            wcag_contrast_p2: 1.3,
            ideal_density_min: 0.05,
        }
    }
}

/// Severity penalty weights and the heuristic/visual blend.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub p0: f64,
    pub p1: f64,
    pub p2: f64,
    /// Share of the blended score from the structural heuristic.
    pub heuristic: f64,
    /// Share of the blended score from the raster-derived sub-score.
    pub visual: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            p0: 25.0,
            p1: 8.0,
            p2: 2.0,
            heuristic: 0.7,
            visual: 0.3,
        }
    }
}

/// Canvas-level colors.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CanvasColors {
    pub background: String,
    /// Default text color when a kind declares none.
    pub text: String,
}

impl Default for CanvasColors {
    fn default() -> Self {
        Self {
            background: "#ffffff".to_string(),
            text: "#1a1a1a".to_string(),
        }
    }
}

/// Fill and text color for one node kind.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KindColors {
    pub fill: String,
    pub text: String,
}

/// Default palette: Material-ish fills with readable text colors.
pub fn default_palette() -> BTreeMap<String, KindColors> {
    let entries = [
        ("primary", "#2196f3", "#ffffff"),
        ("secondary", "#e3f2fd", "#1a1a1a"),
        ("decision", "#fff3e0", "#1a1a1a"),
        ("critical", "#f44336", "#ffffff"),
        ("risk", "#ffebee", "#b71c1c"),
        ("auxiliary", "#f5f5f5", "#666666"),
    ];
    entries
        .into_iter()
        .map(|(kind, fill, text)| {
            (
                kind.to_string(),
                KindColors {
                    fill: fill.to_string(),
                    text: text.to_string(),
                },
            )
        })
        .collect()
}

impl CritiqueConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string. Missing sections and keys
    /// take their documented defaults.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: CritiqueConfig = toml::from_str(content)?;
        // An absent palette section means the default palette, not an
        // empty one.
        if config.palette.is_empty() {
            config.palette = default_palette();
        }
        Ok(config)
    }

    /// Colors for a node kind, falling back to the default palette and
    /// finally to neutral grays.
    pub fn kind_colors(&self, kind: &str) -> KindColors {
        if let Some(c) = self.palette.get(kind) {
            return c.clone();
        }
        if let Some(c) = default_palette().get(kind) {
            return c.clone();
        }
        KindColors {
            fill: "#f0f0f0".to_string(),
            text: self.colors.text.clone(),
        }
    }

    /// Like `Default`, but with the default palette populated.
    pub fn with_defaults() -> Self {
        Self {
            palette: default_palette(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = CritiqueConfig::with_defaults();
        assert_eq!(config.thresholds.overlap_p0, 0.10);
        assert_eq!(config.weights.heuristic, 0.7);
        assert_eq!(config.weights.visual, 0.3);
        assert_eq!(config.font.min_px, 10.0);
    }

    #[test]
    fn test_empty_toml_gets_defaults() {
        let config = CritiqueConfig::from_str("").expect("empty config is valid");
        assert_eq!(config.thresholds.near_blank_min_nodes, 3);
        assert!(config.palette.contains_key("primary"));
    }

    #[test]
    fn test_partial_override() {
        let config = CritiqueConfig::from_str(
            r#"
            [thresholds]
            overlap_p0 = 0.25

            [weights]
            p0 = 40.0
            "#,
        )
        .expect("valid config");
        assert_eq!(config.thresholds.overlap_p0, 0.25);
        assert_eq!(config.weights.p0, 40.0);
        // Untouched keys keep defaults.
        assert_eq!(config.weights.p1, 8.0);
        assert_eq!(config.thresholds.node_margin_warn_px, 16.0);
    }

    #[test]
    fn test_palette_override() {
        let config = CritiqueConfig::from_str(
            r##"
            [palette.primary]
            fill = "#000000"
            text = "#ffffff"
            "##,
        )
        .expect("valid config");
        assert_eq!(config.kind_colors("primary").fill, "#000000");
        // Unlisted kinds fall back to the default palette.
        assert_eq!(config.kind_colors("risk").fill, "#ffebee");
    }

    #[test]
    fn test_unknown_kind_falls_back_to_neutral() {
        let config = CritiqueConfig::with_defaults();
        assert_eq!(config.kind_colors("mystery").fill, "#f0f0f0");
    }

    #[test]
    fn test_invalid_toml_error() {
        let result = CritiqueConfig::from_str("not toml {{{{");
        assert!(result.is_err());
    }
}
