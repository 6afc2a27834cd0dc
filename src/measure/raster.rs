//! Raster measurement: pixel density and contrast statistics for a
//! rendered diagram.
//!
//! The engine never renders; it only measures bitmaps handed to it. A
//! missing raster is explicitly representable and distinct from a blank
//! one, so downstream consumers can tell "empty image" from "not
//! measured".

use serde::Serialize;
use thiserror::Error;

use crate::critique::config::CritiqueConfig;

/// Fixed occupancy grid resolution for density sampling.
pub const DENSITY_GRID: usize = 16;

/// Per-channel difference from the background reference above which a
/// pixel counts as content.
pub const BACKGROUND_TOLERANCE: u8 = 12;

/// An RGB bitmap at the diagram's logical canvas resolution.
#[derive(Debug, Clone)]
pub struct Raster {
    width: usize,
    height: usize,
    /// Interleaved RGB, row-major.
    data: Vec<u8>,
}

/// Errors when ingesting raster bytes.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("failed to decode raster image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("raster data truncated: expected {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },
    #[error("raster dimensions must be positive")]
    EmptyDimensions,
}

impl Raster {
    /// Build from an interleaved RGB buffer.
    pub fn from_rgb8(width: usize, height: usize, data: Vec<u8>) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::EmptyDimensions);
        }
        let expected = width * height * 3;
        if data.len() != expected {
            return Err(RasterError::Truncated {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build from a single-channel grayscale buffer.
    pub fn from_luma8(width: usize, height: usize, data: Vec<u8>) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::EmptyDimensions);
        }
        if data.len() != width * height {
            return Err(RasterError::Truncated {
                expected: width * height,
                got: data.len(),
            });
        }
        let rgb = data.iter().flat_map(|&v| [v, v, v]).collect();
        Self::from_rgb8(width, height, rgb)
    }

    /// Decode encoded image bytes; the format (PNG, JPEG, GIF, PNM) is
    /// sniffed from the magic number.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RasterError> {
        let decoded = image::load_from_memory(bytes)?.into_rgb8();
        let (width, height) = decoded.dimensions();
        Self::from_rgb8(width as usize, height as usize, decoded.into_raw())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn pixel(&self, x: usize, y: usize) -> (u8, u8, u8) {
        let i = (y * self.width + x) * 3;
        (self.data[i], self.data[i + 1], self.data[i + 2])
    }
}

// ── Facts ─────────────────────────────────────────────────────────

/// Raster facts; absence is explicit, never silently zero.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RasterFacts {
    Unavailable,
    Measured(RasterStats),
}

impl RasterFacts {
    pub fn stats(&self) -> Option<&RasterStats> {
        match self {
            RasterFacts::Unavailable => None,
            RasterFacts::Measured(stats) => Some(stats),
        }
    }
}

/// Density and contrast statistics over a fixed occupancy grid.
#[derive(Debug, Clone, Serialize)]
pub struct RasterStats {
    pub width: usize,
    pub height: usize,
    pub grid: usize,
    /// Fraction of non-background pixels over the whole image.
    pub density_overall: f64,
    /// Density by horizontal thirds (top, middle, bottom).
    pub thirds: [f64; 3],
    /// Density by quadrant (tl, tr, bl, br).
    pub quadrants: [f64; 4],
    /// Per-cell occupancy of the fixed grid, row-major.
    pub cells: Vec<f64>,
    /// Standard deviation of grayscale values in [0, 255].
    pub gray_stddev: f64,
    /// Background reference color sampled from the top-left pixel.
    pub background_ref: String,
    pub background_tolerance: u8,
    // Thresholds the critique engine will apply, echoed for audit.
    pub crowded_density_p1: f64,
    pub near_blank_density: f64,
    pub ideal_density_min: f64,
}

/// Measure a raster if present; otherwise report explicit unavailability.
pub fn collect_raster(raster: Option<&Raster>, config: &CritiqueConfig) -> RasterFacts {
    match raster {
        Some(r) => RasterFacts::Measured(measure(r, config)),
        None => RasterFacts::Unavailable,
    }
}

fn measure(raster: &Raster, config: &CritiqueConfig) -> RasterStats {
    let (w, h) = (raster.width, raster.height);
    let bg = raster.pixel(0, 0);

    let mut non_bg_total = 0usize;
    let mut thirds_counts = [0usize; 3];
    let mut thirds_totals = [0usize; 3];
    let mut quad_counts = [0usize; 4];
    let mut quad_totals = [0usize; 4];
    let mut cell_counts = vec![0usize; DENSITY_GRID * DENSITY_GRID];
    let mut cell_totals = vec![0usize; DENSITY_GRID * DENSITY_GRID];
    let mut gray_sum = 0.0f64;
    let mut gray_sq_sum = 0.0f64;

    for y in 0..h {
        let third = (y * 3 / h).min(2);
        let qrow = if y * 2 < h { 0 } else { 1 };
        let cell_row = (y * DENSITY_GRID / h).min(DENSITY_GRID - 1);
        for x in 0..w {
            let p = raster.pixel(x, y);
            let content = is_content(p, bg);

            let qcol = if x * 2 < w { 0 } else { 1 };
            let quad = qrow * 2 + qcol;
            let cell = cell_row * DENSITY_GRID + (x * DENSITY_GRID / w).min(DENSITY_GRID - 1);

            thirds_totals[third] += 1;
            quad_totals[quad] += 1;
            cell_totals[cell] += 1;
            if content {
                non_bg_total += 1;
                thirds_counts[third] += 1;
                quad_counts[quad] += 1;
                cell_counts[cell] += 1;
            }

            let gray = 0.2126 * p.0 as f64 + 0.7152 * p.1 as f64 + 0.0722 * p.2 as f64;
            gray_sum += gray;
            gray_sq_sum += gray * gray;
        }
    }

    let total = (w * h) as f64;
    let mean = gray_sum / total;
    let variance = (gray_sq_sum / total - mean * mean).max(0.0);

    let frac = |count: usize, denom: usize| {
        if denom == 0 {
            0.0
        } else {
            count as f64 / denom as f64
        }
    };

    RasterStats {
        width: w,
        height: h,
        grid: DENSITY_GRID,
        density_overall: non_bg_total as f64 / total,
        thirds: [
            frac(thirds_counts[0], thirds_totals[0]),
            frac(thirds_counts[1], thirds_totals[1]),
            frac(thirds_counts[2], thirds_totals[2]),
        ],
        quadrants: [
            frac(quad_counts[0], quad_totals[0]),
            frac(quad_counts[1], quad_totals[1]),
            frac(quad_counts[2], quad_totals[2]),
            frac(quad_counts[3], quad_totals[3]),
        ],
        cells: cell_counts
            .iter()
            .zip(&cell_totals)
            .map(|(&c, &t)| frac(c, t))
            .collect(),
        gray_stddev: variance.sqrt(),
        background_ref: format!("#{:02x}{:02x}{:02x}", bg.0, bg.1, bg.2),
        background_tolerance: BACKGROUND_TOLERANCE,
        crowded_density_p1: config.thresholds.crowded_density_p1,
        near_blank_density: config.thresholds.near_blank_density,
        ideal_density_min: config.thresholds.ideal_density_min,
    }
}

fn is_content(p: (u8, u8, u8), bg: (u8, u8, u8)) -> bool {
    let diff = |a: u8, b: u8| a.abs_diff(b);
    diff(p.0, bg.0) > BACKGROUND_TOLERANCE
        || diff(p.1, bg.1) > BACKGROUND_TOLERANCE
        || diff(p.2, bg.2) > BACKGROUND_TOLERANCE
}
