//! Page layout configuration
//!
//! There is no configuration file: layouts start from [`LayoutConfig::default`]
//! and command-line overrides are merged on top (see [`merge`]).

pub mod merge;

pub use merge::{merge_layout_overrides, LayoutOverrides};

use crate::error::{ExportError, Result};
use serde::{Deserialize, Serialize};

/// Points per millimetre.
const PT_PER_MM: f32 = 72.0 / 25.4;

/// Advance width of every Courier glyph, in em.
pub const COURIER_ADVANCE: f32 = 0.6;

/// Columns between tab stops when expanding tabs.
pub const TAB_WIDTH: usize = 4;

pub fn mm(value: f32) -> f32 {
    value * PT_PER_MM
}

/// Supported paper sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    A4,
    Letter,
}

impl PageSize {
    /// Width and height in points.
    pub fn dimensions(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
        }
    }
}

impl std::str::FromStr for PageSize {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a4" => Ok(PageSize::A4),
            "letter" => Ok(PageSize::Letter),
            invalid => Err(format!("Invalid page size '{invalid}'. Use: a4|letter")),
        }
    }
}

/// Geometry of one PDF page. All lengths are in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub page_size: PageSize,
    pub margin: f32,
    pub font_size: f32,
    pub line_height: f32,
    /// Widest advance of the text font, in em. Sets how many columns fit.
    #[serde(default = "default_glyph_advance")]
    pub glyph_advance: f32,
}

fn default_glyph_advance() -> f32 {
    COURIER_ADVANCE
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            margin: mm(10.0),
            font_size: 8.0,
            line_height: mm(5.0),
            glyph_advance: COURIER_ADVANCE,
        }
    }
}

impl LayoutConfig {
    pub fn page_width(&self) -> f32 {
        self.page_size.dimensions().0
    }

    pub fn page_height(&self) -> f32 {
        self.page_size.dimensions().1
    }

    /// Characters that fit on one line of the text area.
    pub fn chars_per_line(&self) -> usize {
        let usable = self.page_width() - 2.0 * self.margin;
        (usable / (self.font_size * self.glyph_advance)).floor().max(0.0) as usize
    }

    /// Lines that fit in the text area of one page.
    pub fn lines_per_page(&self) -> usize {
        let usable = self.page_height() - 2.0 * self.margin;
        (usable / self.line_height).floor().max(0.0) as usize
    }

    /// Baseline of the first line, measured from the bottom of the page.
    pub fn first_baseline(&self) -> f32 {
        self.page_height() - self.margin - self.font_size
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.font_size > 0.0) || !(self.line_height > 0.0) || self.margin < 0.0 {
            return Err(ExportError::InvalidLayout(format!(
                "font size {}pt, line height {}pt and margin {}pt must be positive",
                self.font_size, self.line_height, self.margin
            )));
        }
        if !(self.glyph_advance > 0.0) {
            return Err(ExportError::InvalidLayout(format!(
                "glyph advance {} em must be positive",
                self.glyph_advance
            )));
        }
        if self.chars_per_line() == 0 || self.lines_per_page() == 0 {
            return Err(ExportError::InvalidLayout(format!(
                "{}pt text on a {:?} page with {}pt margins leaves no room for text",
                self.font_size, self.page_size, self.margin
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_matches_a4_at_eight_points() {
        let layout = LayoutConfig::default();
        assert_eq!(layout.page_size, PageSize::A4);
        assert_eq!(layout.chars_per_line(), 112);
        assert_eq!(layout.lines_per_page(), 55);
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn letter_is_wider_and_shorter() {
        let layout = LayoutConfig { page_size: PageSize::Letter, ..LayoutConfig::default() };
        let a4 = LayoutConfig::default();
        assert!(layout.chars_per_line() > a4.chars_per_line());
        assert!(layout.lines_per_page() < a4.lines_per_page());
    }

    #[test]
    fn oversized_font_is_rejected() {
        let layout = LayoutConfig { font_size: 2000.0, ..LayoutConfig::default() };
        assert!(matches!(layout.validate(), Err(ExportError::InvalidLayout(_))));

        let layout = LayoutConfig { font_size: 0.0, ..LayoutConfig::default() };
        assert!(matches!(layout.validate(), Err(ExportError::InvalidLayout(_))));
    }

    #[test]
    fn wider_glyphs_fit_fewer_columns() {
        let layout = LayoutConfig { glyph_advance: 0.602, ..LayoutConfig::default() };
        assert_eq!(layout.chars_per_line(), 111);

        let layout = LayoutConfig { glyph_advance: 0.0, ..LayoutConfig::default() };
        assert!(matches!(layout.validate(), Err(ExportError::InvalidLayout(_))));
    }

    #[test]
    fn page_size_parses_case_insensitively() {
        assert_eq!("Letter".parse::<PageSize>(), Ok(PageSize::Letter));
        assert_eq!("a4".parse::<PageSize>(), Ok(PageSize::A4));
        assert!("legal".parse::<PageSize>().is_err());
    }
}
