//! TrueType fonts for the text layer
//!
//! An embedded TrueType font lets the document show any character the font
//! has a glyph for. Without one the renderer falls back to the built-in
//! Courier font, which only covers WinAnsi.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use ttf_parser::{name_id, Face};

use crate::error::{ExportError, Result};

/// Monospaced fonts tried in order when no font is given
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu-sans-mono-fonts/DejaVuSansMono.ttf",
    "/usr/local/share/fonts/DejaVuSansMono.ttf",
    "/Library/Fonts/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/usr/share/fonts/liberation-mono/LiberationMono-Regular.ttf",
    "/usr/share/fonts/TTF/LiberationMono-Regular.ttf",
    "C:\\Windows\\Fonts\\consola.ttf",
];

/// Which font the text layer uses
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FontChoice {
    /// First monospaced system font found, else built-in Courier
    #[default]
    Auto,
    /// Built-in Courier
    Builtin,
    /// A TrueType file; failing to load it is fatal
    File(PathBuf),
}

impl FontChoice {
    /// Load the chosen font. `None` means built-in Courier.
    pub fn resolve(&self) -> Result<Option<TrueTypeFont>> {
        match self {
            FontChoice::Auto => Ok(discover_system_font()),
            FontChoice::Builtin => Ok(None),
            FontChoice::File(path) => TrueTypeFont::load(path).map(Some),
        }
    }
}

/// First usable monospaced TrueType font installed on this machine.
pub fn discover_system_font() -> Option<TrueTypeFont> {
    SYSTEM_FONT_CANDIDATES.iter().map(Path::new).filter(|path| path.is_file()).find_map(|path| {
        match TrueTypeFont::load(path) {
            Ok(font) => Some(font),
            Err(err) => {
                debug!(error = %err, "ignoring system font");
                None
            }
        }
    })
}

/// Metrics in font units, read once at load time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontMetrics {
    pub units_per_em: u16,
    /// Widest advance among printable ASCII glyphs
    pub advance: u16,
    pub ascent: i16,
    pub descent: i16,
    pub cap_height: i16,
    /// `[x_min, y_min, x_max, y_max]`
    pub bbox: [i16; 4],
    pub monospaced: bool,
}

impl FontMetrics {
    fn read(face: &Face<'_>) -> Option<Self> {
        let advance = (' '..='~')
            .filter_map(|ch| face.glyph_index(ch))
            .filter_map(|glyph| face.glyph_hor_advance(glyph))
            .max()?;
        let bbox = face.global_bounding_box();
        Some(Self {
            units_per_em: face.units_per_em(),
            advance,
            ascent: face.ascender(),
            descent: face.descender(),
            cap_height: face.capital_height().unwrap_or_else(|| face.ascender()),
            bbox: [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max],
            monospaced: face.is_monospaced(),
        })
    }
}

/// A TrueType font program to embed in full
#[derive(Debug, Clone)]
pub struct TrueTypeFont {
    /// PostScript name used as `BaseFont`
    pub name: String,
    pub path: PathBuf,
    pub data: Vec<u8>,
    pub metrics: FontMetrics,
}

impl TrueTypeFont {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path).map_err(|err| ExportError::font(path, err))?;
        match data.get(..4) {
            Some(b"ttcf") => {
                return Err(ExportError::font(path, "font collections are not supported"))
            }
            Some(b"OTTO") => {
                return Err(ExportError::font(path, "CFF-based OpenType fonts are not supported"))
            }
            _ => {}
        }

        let face = Face::parse(&data, 0).map_err(|err| ExportError::font(path, err))?;
        let metrics = FontMetrics::read(&face)
            .ok_or_else(|| ExportError::font(path, "font has no printable ASCII glyphs"))?;
        let name = postscript_name(&face).unwrap_or_else(|| file_stem_name(path));

        Ok(Self { name, path: path.to_path_buf(), data, metrics })
    }

    pub(crate) fn face(&self) -> Result<Face<'_>> {
        Face::parse(&self.data, 0).map_err(|err| ExportError::font(&self.path, err))
    }

    /// Column width in em, as used by the line layout.
    pub fn advance_em(&self) -> f32 {
        f32::from(self.metrics.advance) / f32::from(self.metrics.units_per_em)
    }

    /// Convert font units to the PDF's 1/1000 em glyph space.
    pub fn to_pdf_units(&self, value: i32) -> i64 {
        (value as f32 * 1000.0 / f32::from(self.metrics.units_per_em)).round() as i64
    }
}

fn postscript_name(face: &Face<'_>) -> Option<String> {
    face.names()
        .into_iter()
        .filter(|name| name.name_id == name_id::POST_SCRIPT_NAME)
        .find_map(|name| name.to_string())
        .map(|name| pdf_name(&name))
        .filter(|name| !name.is_empty())
}

fn file_stem_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| pdf_name(&stem.to_string_lossy()))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "EmbeddedFont".to_string())
}

fn pdf_name(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_')).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn builtin_needs_no_font_file() {
        assert!(FontChoice::Builtin.resolve().expect("builtin").is_none());
    }

    #[test]
    fn missing_font_file_is_an_error() {
        let choice = FontChoice::File(PathBuf::from("/nonexistent/Mono.ttf"));
        let err = choice.resolve().expect_err("missing font");
        assert!(matches!(err, ExportError::Font { .. }));
        assert!(err.to_string().contains("/nonexistent/Mono.ttf"));
    }

    #[test]
    fn non_font_and_collection_files_are_rejected() {
        let temp = TempDir::new().expect("temp dir");
        let text = temp.path().join("notes.ttf");
        fs::write(&text, "not a font").expect("write text");
        assert!(matches!(TrueTypeFont::load(&text), Err(ExportError::Font { .. })));

        let collection = temp.path().join("fonts.ttc");
        fs::write(&collection, b"ttcf\0\x01\0\0").expect("write ttc");
        let err = TrueTypeFont::load(&collection).expect_err("collection");
        assert!(err.to_string().contains("collections"));
    }

    #[test]
    fn system_font_is_monospaced_and_near_courier_width() {
        let Some(font) = discover_system_font() else {
            eprintln!("no monospaced system font installed, skipping");
            return;
        };
        assert!(!font.name.is_empty());
        assert!(font.metrics.monospaced);
        let advance = font.advance_em();
        assert!((0.5..0.7).contains(&advance), "advance {advance}");
        assert_eq!(font.to_pdf_units(i32::from(font.metrics.units_per_em)), 1000);
    }

    #[test]
    fn names_are_reduced_to_pdf_safe_characters() {
        assert_eq!(pdf_name("DejaVu Sans Mono/Book"), "DejaVuSansMonoBook");
        assert_eq!(file_stem_name(Path::new("/fonts/Liberation Mono.ttf")), "LiberationMono");
    }
}
