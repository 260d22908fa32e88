//! CLI layout overrides merged onto the default layout

use super::{LayoutConfig, PageSize};

#[derive(Debug, Default, Clone)]
pub struct LayoutOverrides {
    pub page_size: Option<PageSize>,
    pub font_size: Option<f32>,
    pub line_height: Option<f32>,
    pub margin: Option<f32>,
}

/// Apply every override that is set. When only the font size changes, the
/// line height keeps its ratio to the font so text does not overlap.
pub fn merge_layout_overrides(mut base: LayoutConfig, cli: LayoutOverrides) -> LayoutConfig {
    if let Some(page_size) = cli.page_size {
        base.page_size = page_size;
    }
    if let Some(margin) = cli.margin {
        base.margin = margin;
    }

    match (cli.font_size, cli.line_height) {
        (Some(font_size), None) => {
            let ratio = base.line_height / base.font_size;
            base.font_size = font_size;
            base.line_height = font_size * ratio;
        }
        (font_size, line_height) => {
            if let Some(font_size) = font_size {
                base.font_size = font_size;
            }
            if let Some(line_height) = line_height {
                base.line_height = line_height;
            }
        }
    }

    base
}
