//! Color math and contrast measurement.
//!
//! WCAG-style contrast ratios computed from relative luminance on
//! sRGB-decoded channels. The collector measures every node kind present
//! in the spec; deciding what counts as a problem is the critique
//! engine's job.

use serde::Serialize;

use crate::critique::config::CritiqueConfig;
use crate::spec::DiagramSpec;

/// Parse `#rgb` or `#rrggbb` into channels. Returns None for anything
/// else (named colors are not resolved here).
pub fn parse_hex(s: &str) -> Option<(u8, u8, u8)> {
    let hex = s.strip_prefix('#')?;
    match hex.len() {
        3 => {
            let mut it = hex.chars();
            let r = it.next()?.to_digit(16)? as u8;
            let g = it.next()?.to_digit(16)? as u8;
            let b = it.next()?.to_digit(16)? as u8;
            Some((r * 17, g * 17, b * 17))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some((r, g, b))
        }
        _ => None,
    }
}

/// WCAG relative luminance of an sRGB color.
pub fn relative_luminance(rgb: (u8, u8, u8)) -> f64 {
    fn channel(c: u8) -> f64 {
        let c = c as f64 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }
    0.2126 * channel(rgb.0) + 0.7152 * channel(rgb.1) + 0.0722 * channel(rgb.2)
}

/// WCAG contrast ratio between two colors, in `[1, 21]`.
pub fn contrast_ratio(a: (u8, u8, u8), b: (u8, u8, u8)) -> f64 {
    let la = relative_luminance(a);
    let lb = relative_luminance(b);
    let (lighter, darker) = if la >= lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

/// Contrast measurements for one node kind.
#[derive(Debug, Clone, Serialize)]
pub struct KindContrast {
    pub kind: String,
    pub fill: String,
    pub text: String,
    /// None when a color string could not be parsed.
    pub fill_text_ratio: Option<f64>,
    pub fill_background_ratio: Option<f64>,
}

/// Contrast facts for every node kind present in the spec, with the
/// thresholds that will gate them echoed alongside.
#[derive(Debug, Clone, Serialize)]
pub struct ContrastFacts {
    pub background: String,
    pub wcag_contrast_p0: f64,
    pub wcag_contrast_p2: f64,
    pub entries: Vec<KindContrast>,
}

/// Measure contrast for each node kind present in the spec, in kind
/// declaration order for determinism.
pub fn collect_contrast(spec: &DiagramSpec, config: &CritiqueConfig) -> ContrastFacts {
    let background = parse_hex(&config.colors.background);

    let mut entries = Vec::new();
    for kind in crate::spec::NodeKind::all() {
        if !spec.nodes.iter().any(|n| n.kind == kind) {
            continue;
        }
        let colors = config.kind_colors(kind.as_str());
        let fill = parse_hex(&colors.fill);
        let text = parse_hex(&colors.text);
        entries.push(KindContrast {
            kind: kind.as_str().to_string(),
            fill_text_ratio: fill.zip(text).map(|(f, t)| contrast_ratio(f, t)),
            fill_background_ratio: fill.zip(background).map(|(f, b)| contrast_ratio(f, b)),
            fill: colors.fill,
            text: colors.text,
        });
    }

    ContrastFacts {
        background: config.colors.background.clone(),
        wcag_contrast_p0: config.thresholds.wcag_contrast_p0,
        wcag_contrast_p2: config.thresholds.wcag_contrast_p2,
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_long() {
        assert_eq!(parse_hex("#2196f3"), Some((0x21, 0x96, 0xf3)));
        assert_eq!(parse_hex("#FFFFFF"), Some((255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_short() {
        assert_eq!(parse_hex("#fff"), Some((255, 255, 255)));
        assert_eq!(parse_hex("#f00"), Some((255, 0, 0)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert_eq!(parse_hex("red"), None);
        assert_eq!(parse_hex("#12345"), None);
        assert_eq!(parse_hex("#gggggg"), None);
    }

    #[test]
    fn test_luminance_endpoints() {
        assert!((relative_luminance((255, 255, 255)) - 1.0).abs() < 1e-6);
        assert!(relative_luminance((0, 0, 0)) < 1e-6);
    }

    #[test]
    fn test_contrast_black_white_is_21() {
        let ratio = contrast_ratio((0, 0, 0), (255, 255, 255));
        assert!((ratio - 21.0).abs() < 0.01, "got {}", ratio);
    }

    #[test]
    fn test_contrast_symmetric() {
        let a = (0x21, 0x96, 0xf3);
        let b = (0xff, 0xff, 0xff);
        assert_eq!(contrast_ratio(a, b), contrast_ratio(b, a));
    }

    #[test]
    fn test_white_on_near_white_below_1_3() {
        let ratio = contrast_ratio(
            parse_hex("#FFFFFF").unwrap(),
            parse_hex("#F5F5F5").unwrap(),
        );
        assert!(ratio < 1.3, "got {}", ratio);
        assert!(ratio >= 1.0);
    }
}
