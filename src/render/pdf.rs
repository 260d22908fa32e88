//! PDF serialisation with lopdf
//!
//! With a [`TrueTypeFont`] the text is set through a Type0 font with
//! Identity-H encoding: every character becomes its two-byte glyph id, and a
//! ToUnicode map keeps the text extractable. Without one the standard Courier
//! font is used with WinAnsi encoding, and characters outside it print as `?`.

use chrono::{DateTime, Utc};
use encoding_rs::WINDOWS_1252;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::BTreeMap;
use ttf_parser::{Face, GlyphId};

use super::font::TrueTypeFont;
use super::layout::{paginate, Sheet};
use crate::config::{LayoutConfig, COURIER_ADVANCE};
use crate::domain::OutputDocument;
use crate::error::{ExportError, Result};

const FONT_NAME: &str = "F1";
const PRODUCER: &str = concat!("export-tool ", env!("CARGO_PKG_VERSION"));

/// ToUnicode allows at most 100 entries per `bfchar` block.
const BFCHAR_BLOCK: usize = 100;

const CMAP_HEADER: &str = "/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
";

const CMAP_FOOTER: &str = "endcmap
CMapName currentdict /CMap defineresource pop
end
end
";

/// Serialised document
#[derive(Debug)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    /// Physical pages in the file
    pub pages: usize,
}

pub struct PdfRenderer {
    layout: LayoutConfig,
    title: String,
    created_at: Option<DateTime<Utc>>,
    font: Option<TrueTypeFont>,
}

impl PdfRenderer {
    pub fn new(layout: LayoutConfig) -> Self {
        Self { layout, title: String::new(), created_at: None, font: None }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn created_at(mut self, created_at: Option<DateTime<Utc>>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Embed `font`, or use built-in Courier for `None`. Line width follows the font.
    pub fn font(mut self, font: Option<TrueTypeFont>) -> Self {
        self.layout.glyph_advance =
            font.as_ref().map_or(COURIER_ADVANCE, TrueTypeFont::advance_em);
        self.font = font;
        self
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn render(&self, document: &OutputDocument) -> Result<RenderedPdf> {
        self.layout.validate()?;

        let mut encoder = match &self.font {
            Some(font) => TextEncoder::Glyphs(Box::new(GlyphEncoder::new(font)?)),
            None => TextEncoder::WinAnsi,
        };

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.new_object_id();
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { FONT_NAME => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for page in document.pages() {
            for sheet in paginate(page, &self.layout) {
                let page_id = self.add_sheet(&mut doc, pages_id, &sheet, &mut encoder)?;
                kids.push(page_id.into());
            }
        }
        let page_count = kids.len();

        let font = match encoder {
            TextEncoder::WinAnsi => courier_font(),
            TextEncoder::Glyphs(glyphs) => (*glyphs).into_font(&mut doc),
        };
        doc.objects.insert(font_id, Object::Dictionary(font));

        let (width, height) = self.layout.page_size.dimensions();
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![Object::Integer(0), Object::Integer(0), width.into(), height.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut info = dictionary! {
            "Producer" => Object::string_literal(PRODUCER),
        };
        if !self.title.is_empty() {
            info.set("Title", text_string(&self.title));
        }
        if let Some(created_at) = self.created_at {
            let stamp = created_at.format("D:%Y%m%d%H%M%SZ").to_string();
            info.set("CreationDate", Object::string_literal(stamp));
        }
        let info_id = doc.add_object(info);
        doc.trailer.set("Info", info_id);

        doc.compress();
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).map_err(|err| ExportError::Render(err.to_string()))?;

        Ok(RenderedPdf { bytes, pages: page_count })
    }

    fn add_sheet(
        &self,
        doc: &mut Document,
        parent: ObjectId,
        sheet: &Sheet,
        encoder: &mut TextEncoder<'_>,
    ) -> Result<ObjectId> {
        let content = self.sheet_content(sheet, encoder);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        Ok(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => parent,
            "Contents" => content_id,
        }))
    }

    fn sheet_content(&self, sheet: &Sheet, encoder: &mut TextEncoder<'_>) -> Content {
        let layout = &self.layout;
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![FONT_NAME.into(), layout.font_size.into()]),
            Operation::new("TL", vec![layout.line_height.into()]),
            Operation::new("Td", vec![layout.margin.into(), layout.first_baseline().into()]),
        ];
        for line in sheet {
            if !line.is_empty() {
                operations.push(Operation::new("Tj", vec![encoder.encode(line)]));
            }
            operations.push(Operation::new("T*", vec![]));
        }
        operations.push(Operation::new("ET", vec![]));
        Content { operations }
    }
}

enum TextEncoder<'f> {
    WinAnsi,
    Glyphs(Box<GlyphEncoder<'f>>),
}

impl TextEncoder<'_> {
    fn encode(&mut self, text: &str) -> Object {
        match self {
            TextEncoder::WinAnsi => Object::String(encode_win_ansi(text), StringFormat::Literal),
            TextEncoder::Glyphs(glyphs) => {
                Object::String(glyphs.encode(text), StringFormat::Hexadecimal)
            }
        }
    }
}

/// Maps characters to glyph ids and remembers every glyph it handed out.
struct GlyphEncoder<'f> {
    font: &'f TrueTypeFont,
    face: Face<'f>,
    /// Printed for control characters and characters the font lacks
    fallback: GlyphId,
    /// glyph id -> (character it stands for, advance in font units)
    used: BTreeMap<u16, (char, u16)>,
}

impl<'f> GlyphEncoder<'f> {
    fn new(font: &'f TrueTypeFont) -> Result<Self> {
        let face = font.face()?;
        let fallback = face.glyph_index('?').unwrap_or(GlyphId(0));
        Ok(Self { font, face, fallback, used: BTreeMap::new() })
    }

    /// Two big-endian bytes per character.
    fn encode(&mut self, text: &str) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(text.len() * 2);
        for ch in text.chars() {
            let glyph = if ch.is_control() { None } else { self.face.glyph_index(ch) };
            let (ch, glyph) = match glyph {
                Some(glyph) => (ch, glyph),
                None => ('?', self.fallback),
            };
            let advance = self.face.glyph_hor_advance(glyph).unwrap_or(self.font.metrics.advance);
            self.used.entry(glyph.0).or_insert((ch, advance));
            bytes.extend_from_slice(&glyph.0.to_be_bytes());
        }
        bytes
    }

    /// Add the font program, descriptor and descendant CIDFont to `doc`,
    /// returning the Type0 font dictionary.
    fn into_font(self, doc: &mut Document) -> Dictionary {
        let font = self.font;
        let metrics = &font.metrics;
        let base_font = Object::Name(font.name.clone().into_bytes());

        let file_id = doc.add_object(Stream::new(
            dictionary! { "Length1" => font.data.len() as i64 },
            font.data.clone(),
        ));
        // FixedPitch | Nonsymbolic
        let flags: i64 = if metrics.monospaced { 1 | 32 } else { 32 };
        let bbox: Vec<Object> =
            metrics.bbox.iter().map(|&v| Object::Integer(font.to_pdf_units(v.into()))).collect();
        let descriptor_id = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => base_font.clone(),
            "Flags" => flags,
            "FontBBox" => bbox,
            "ItalicAngle" => 0i64,
            "Ascent" => font.to_pdf_units(metrics.ascent.into()),
            "Descent" => font.to_pdf_units(metrics.descent.into()),
            "CapHeight" => font.to_pdf_units(metrics.cap_height.into()),
            "StemV" => 80i64,
            "FontFile2" => file_id,
        });

        let mut widths: Vec<Object> = Vec::with_capacity(self.used.len() * 2);
        for (&glyph, &(_, advance)) in &self.used {
            widths.push(Object::Integer(glyph.into()));
            widths.push(Object::Array(vec![Object::Integer(font.to_pdf_units(advance.into()))]));
        }
        let cid_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => base_font.clone(),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0i64,
            },
            "FontDescriptor" => descriptor_id,
            "DW" => font.to_pdf_units(metrics.advance.into()),
            "W" => widths,
            "CIDToGIDMap" => "Identity",
        });

        let to_unicode = to_unicode_cmap(&self.used);
        let to_unicode_id = doc.add_object(Stream::new(dictionary! {}, to_unicode));

        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => base_font,
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(cid_font_id)],
            "ToUnicode" => to_unicode_id,
        }
    }
}

fn courier_font() -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    }
}

fn to_unicode_cmap(used: &BTreeMap<u16, (char, u16)>) -> Vec<u8> {
    let mut cmap = String::from(CMAP_HEADER);
    let entries: Vec<(u16, char)> = used.iter().map(|(&glyph, &(ch, _))| (glyph, ch)).collect();
    for block in entries.chunks(BFCHAR_BLOCK) {
        cmap.push_str(&format!("{} beginbfchar\n", block.len()));
        for &(glyph, ch) in block {
            let mut units = [0u16; 2];
            let utf16: String =
                ch.encode_utf16(&mut units).iter().map(|unit| format!("{unit:04X}")).collect();
            cmap.push_str(&format!("<{glyph:04X}> <{utf16}>\n"));
        }
        cmap.push_str("endbfchar\n");
    }
    cmap.push_str(CMAP_FOOTER);
    cmap.into_bytes()
}

/// Document info text: plain ASCII as is, anything else as UTF-16BE with a BOM.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Encode `text` for a WinAnsi base font, one byte per character.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    let mut buf = [0u8; 4];
    text.chars()
        .map(|ch| {
            if ch.is_ascii() {
                return if ch.is_ascii_control() { b'?' } else { ch as u8 };
            }
            if ch.is_control() {
                return b'?';
            }
            let (bytes, _, unmappable) = WINDOWS_1252.encode(ch.encode_utf8(&mut buf));
            match (unmappable, bytes.as_ref()) {
                (false, [byte]) => *byte,
                _ => b'?',
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HeaderPath, SourceFile};
    use crate::render::font::discover_system_font;
    use std::path::PathBuf;

    fn document(files: &[(&str, &str)]) -> OutputDocument {
        let mut doc = OutputDocument::new();
        for (name, body) in files {
            doc.push(
                SourceFile {
                    path: PathBuf::from(name),
                    relative_path: name.to_string(),
                    content: body.to_string(),
                },
                HeaderPath::Relative,
            );
        }
        doc
    }

    #[test]
    fn win_ansi_maps_latin1_and_replaces_the_rest() {
        assert_eq!(encode_win_ansi("class B"), b"class B".to_vec());
        assert_eq!(encode_win_ansi("café"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(encode_win_ansi("€"), vec![0x80]);
        assert_eq!(encode_win_ansi("日本"), b"??".to_vec());
        assert_eq!(encode_win_ansi("a\rb"), b"a?b".to_vec());
    }

    #[test]
    fn one_sheet_per_short_file() {
        let doc = document(&[("a.kt", "fun main() {}"), ("b.kt", "class B")]);
        let pdf = PdfRenderer::new(LayoutConfig::default()).render(&doc).expect("render");

        assert_eq!(pdf.pages, 2);
        assert!(pdf.bytes.starts_with(b"%PDF-1.5"));
        let reloaded = Document::load_mem(&pdf.bytes).expect("reload");
        assert_eq!(reloaded.get_pages().len(), 2);
    }

    #[test]
    fn empty_document_is_still_a_pdf() {
        let pdf = PdfRenderer::new(LayoutConfig::default())
            .render(&OutputDocument::new())
            .expect("render");
        assert_eq!(pdf.pages, 0);
        let reloaded = Document::load_mem(&pdf.bytes).expect("reload");
        assert!(reloaded.get_pages().is_empty());
    }

    #[test]
    fn rendering_is_deterministic_without_timestamp() {
        let doc = document(&[("a.kt", "fun main() {}")]);
        let renderer = PdfRenderer::new(LayoutConfig::default()).title("app");
        let first = renderer.render(&doc).expect("first");
        let second = renderer.render(&doc).expect("second");
        assert_eq!(first.bytes, second.bytes);
    }

    #[test]
    fn invalid_layout_is_rejected_before_rendering() {
        let layout = LayoutConfig { font_size: 5000.0, ..LayoutConfig::default() };
        let result = PdfRenderer::new(layout).render(&OutputDocument::new());
        assert!(matches!(result, Err(ExportError::InvalidLayout(_))));
    }

    fn type0_font(doc: &Document) -> Option<&Dictionary> {
        doc.objects.values().filter_map(|object| object.as_dict().ok()).find(|dict| {
            dict.get(b"Subtype").and_then(Object::as_name).map_or(false, |name| name == b"Type0")
        })
    }

    #[test]
    fn embedded_font_keeps_unicode_text() {
        let Some(font) = discover_system_font() else {
            eprintln!("no monospaced system font installed, skipping");
            return;
        };
        let doc = document(&[("Nav.kt", "// ← back")]);
        let pdf = PdfRenderer::new(LayoutConfig::default())
            .font(Some(font))
            .render(&doc)
            .expect("render");

        let reloaded = Document::load_mem(&pdf.bytes).expect("reload");
        let type0 = type0_font(&reloaded).expect("type0 font");
        assert_eq!(type0.get(b"Encoding").and_then(Object::as_name).ok(), Some(&b"Identity-H"[..]));

        let cmap_id = type0.get(b"ToUnicode").and_then(Object::as_reference).expect("ToUnicode");
        let stream = reloaded.get_object(cmap_id).and_then(Object::as_stream).expect("cmap");
        let cmap = stream.decompressed_content().unwrap_or_else(|_| stream.content.clone());
        let cmap = String::from_utf8(cmap).expect("ascii cmap");
        assert!(cmap.contains("<2190>"), "no mapping for the arrow in {cmap}");
    }

    #[test]
    fn font_sets_the_column_count() {
        let Some(font) = discover_system_font() else {
            eprintln!("no monospaced system font installed, skipping");
            return;
        };
        let advance = font.advance_em();
        let renderer = PdfRenderer::new(LayoutConfig::default()).font(Some(font));
        assert_eq!(renderer.layout().glyph_advance, advance);

        let renderer = renderer.font(None);
        assert_eq!(renderer.layout().chars_per_line(), 112);
    }

    #[test]
    fn missing_glyphs_fall_back_to_question_mark() {
        let Some(font) = discover_system_font() else {
            eprintln!("no monospaced system font installed, skipping");
            return;
        };
        let mut glyphs = GlyphEncoder::new(&font).expect("face");
        let question = glyphs.encode("?");
        let bell = glyphs.encode("\u{7}");
        assert_eq!(question.len(), 2);
        assert_eq!(bell, question);
        assert_eq!(glyphs.used.len(), 1);
    }

    #[test]
    fn non_ascii_titles_are_utf16() {
        assert_eq!(text_string("app"), Object::string_literal("app"));
        assert_eq!(
            text_string("é"),
            Object::String(vec![0xFE, 0xFF, 0x00, 0xE9], StringFormat::Hexadecimal)
        );
    }
}
