//! Text measurement capability.
//!
//! Glyph metrics are approximate by default and injected as a trait so a
//! real font-shaping backend can be substituted without touching the
//! measurement or routing logic.

/// Measures text extents for a given font size in pixels.
pub trait TextMeasurer: Sync {
    /// Average advance width of one character.
    fn char_width(&self, font_px: f64) -> f64;

    /// Height of one wrapped line, including leading.
    fn line_height(&self, font_px: f64) -> f64;

    /// How many characters fit on one line of `width` pixels. Always at
    /// least 1 so wrapping terminates.
    fn chars_per_line(&self, width: f64, font_px: f64) -> usize {
        let cw = self.char_width(font_px);
        if cw <= 0.0 {
            return 1;
        }
        ((width / cw).floor() as usize).max(1)
    }

    /// Estimated number of lines `text` occupies when wrapped to `width`.
    fn estimated_lines(&self, text: &str, width: f64, font_px: f64) -> usize {
        let chars = text.chars().count();
        if chars == 0 {
            return 0;
        }
        let per_line = self.chars_per_line(width, font_px);
        chars.div_ceil(per_line)
    }
}

/// Default measurer: a fixed width-to-size ratio per glyph and a fixed
/// leading factor. Matches what diagram renderers assume for sans-serif
/// UI fonts.
#[derive(Debug, Clone)]
pub struct ApproxTextMeasurer {
    /// Glyph width as a fraction of the font size.
    pub width_ratio: f64,
    /// Line height as a fraction of the font size.
    pub height_ratio: f64,
}

impl Default for ApproxTextMeasurer {
    fn default() -> Self {
        Self {
            width_ratio: 0.58,
            height_ratio: 1.35,
        }
    }
}

impl TextMeasurer for ApproxTextMeasurer {
    fn char_width(&self, font_px: f64) -> f64 {
        font_px * self.width_ratio
    }

    fn line_height(&self, font_px: f64) -> f64 {
        font_px * self.height_ratio
    }
}
